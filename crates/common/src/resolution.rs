//! Tagged result for mappings that may have several equally valid answers
//!
//! Engines never pick one of several tied candidates on their own. They return
//! a [`Resolution`] and the caller decides how to consume the ambiguity.

use serde::{Deserialize, Serialize};

/// One candidate, or every tied candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resolution", content = "candidates", rename_all = "snake_case")]
pub enum Resolution<T> {
    Unique(T),
    /// Two or more candidates with identical minimum cost
    Ambiguous(Vec<T>),
}

impl<T> Resolution<T> {
    /// Wrap a candidate list; `None` when there is no candidate at all
    #[must_use]
    pub fn from_candidates(mut candidates: Vec<T>) -> Option<Self> {
        match candidates.len() {
            0 => None,
            1 => candidates.pop().map(Self::Unique),
            _ => Some(Self::Ambiguous(candidates)),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }

    /// All candidates in a uniform view
    #[must_use]
    pub fn candidates(&self) -> &[T] {
        match self {
            Self::Unique(one) => std::slice::from_ref(one),
            Self::Ambiguous(many) => many,
        }
    }

    #[must_use]
    pub fn into_candidates(self) -> Vec<T> {
        match self {
            Self::Unique(one) => vec![one],
            Self::Ambiguous(many) => many,
        }
    }

    /// The single candidate, if there is no ambiguity
    #[must_use]
    pub const fn unique(&self) -> Option<&T> {
        match self {
            Self::Unique(one) => Some(one),
            Self::Ambiguous(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates().len()
    }

    /// Always false; a resolution holds at least one candidate
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates().is_empty()
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Resolution<U> {
        match self {
            Self::Unique(one) => Resolution::Unique(f(one)),
            Self::Ambiguous(many) => Resolution::Ambiguous(many.into_iter().map(f).collect()),
        }
    }
}
