//! Output records handed to the persistence collaborator
//!
//! Records are immutable once built and carry a deterministic `id`. A re-run
//! with different parameters yields new ids, so earlier results stay
//! comparable next to the new ones.

use crate::geometry::PixelBox;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Word:token ratio of one alignment segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1:1")]
    OneToOne,
    /// One word spans several tokens
    #[serde(rename = "1:N")]
    OneToMany,
    /// Several words map to one token
    #[serde(rename = "N:1")]
    ManyToOne,
}

impl Cardinality {
    /// Classify a segment by its side counts
    ///
    /// Returns `None` for empty sides and for N:M segments, which are not
    /// valid alignment segments.
    #[must_use]
    pub const fn classify(left: usize, right: usize) -> Option<Self> {
        match (left, right) {
            (1, 1) => Some(Self::OneToOne),
            (1, n) if n > 1 => Some(Self::OneToMany),
            (n, 1) if n > 1 => Some(Self::ManyToOne),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:N",
            Self::ManyToOne => "N:1",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transcription line paired with an image line band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub line_number: usize,
    pub image_line: usize,
}

/// Mapping between image words and transcription tokens on one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordAlignment {
    pub id: String,
    pub folio: String,
    /// Line number of the transcription line
    pub line_number: usize,
    /// Index of the image line band the words came from
    pub image_line: usize,
    /// Which tied candidate this segment belongs to (0 when unique)
    pub candidate: usize,
    pub word_indices: Vec<usize>,
    pub token_indices: Vec<usize>,
    /// Token contents in order, for downstream consumers
    pub tokens: Vec<String>,
    pub cardinality: Cardinality,
    /// In `[0, 1]`; 1.0 is a perfect 1:1 segment
    pub score: f64,
    pub ambiguous: bool,
}

/// Reference to one glyph candidate on a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlyphRef {
    pub word_index: usize,
    pub glyph_index: usize,
}

/// Mapping between a glyph candidate and one transcription symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphAlignment {
    pub id: String,
    pub folio: String,
    pub line_number: usize,
    /// Word-level candidate this glyph alignment was derived from
    pub word_candidate: usize,
    /// Tied glyph-level candidate (0 when unique)
    pub candidate: usize,
    pub glyph: GlyphRef,
    /// Position of the symbol within the segment's symbol string
    pub symbol_index: usize,
    pub symbol: String,
    /// In `[0, 1]`
    pub score: f64,
    /// Set when `score` is below the configured floor; the score is kept as is
    pub low_confidence: bool,
    pub ambiguous: bool,
}

/// Numeric features of a detected region
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionFeatures {
    /// Ink pixels over region area
    pub ink_density: f64,
    /// Region area over page area
    pub area_fraction: f64,
    /// Fraction of the region covered by word boxes
    pub text_coverage: f64,
    /// Ink components inside the region
    pub component_count: usize,
}

/// A detected spatial zone
///
/// The detection method is part of the identity; regions from different
/// methods coexist and are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub folio: String,
    pub method: String,
    pub scale: u32,
    pub index: usize,
    pub bbox: PixelBox,
    pub features: RegionFeatures,
}

/// What an edge weight measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Length in pixels of the boundary both regions share
    SharedBoundary,
    /// Center distance divided by the page diagonal
    NormalizedDistance,
}

/// Directed half of an undirected region adjacency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionEdge {
    pub id: String,
    pub folio: String,
    pub method: String,
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub weight: f64,
}

/// Text structure on the source side of an anchor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnchorSource {
    Line {
        line_number: usize,
    },
    Word {
        line_number: usize,
        word_indices: Vec<usize>,
        /// Tokens of the aligned segment joined with `.`
        text: String,
    },
}

impl AnchorSource {
    #[must_use]
    pub const fn line_number(&self) -> usize {
        match self {
            Self::Line { line_number } | Self::Word { line_number, .. } => *line_number,
        }
    }
}

/// Scored association between a text structure and a region
///
/// Several methods may anchor the same pair; those records are kept apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: String,
    pub folio: String,
    pub source: AnchorSource,
    /// Target region id
    pub target: String,
    pub method: String,
    /// In `[0, 1]`
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_classify() {
        assert_eq!(Cardinality::classify(1, 1), Some(Cardinality::OneToOne));
        assert_eq!(Cardinality::classify(1, 3), Some(Cardinality::OneToMany));
        assert_eq!(Cardinality::classify(2, 1), Some(Cardinality::ManyToOne));
        assert_eq!(Cardinality::classify(2, 2), None);
        assert_eq!(Cardinality::classify(0, 1), None);
    }

    #[test]
    fn test_cardinality_serde_uses_ratio_labels() {
        let json = serde_json::to_string(&Cardinality::OneToMany).unwrap();
        assert_eq!(json, r#""1:N""#);
        let back: Cardinality = serde_json::from_str(r#""N:1""#).unwrap();
        assert_eq!(back, Cardinality::ManyToOne);
    }

    #[test]
    fn test_anchor_source_line_number() {
        let word = AnchorSource::Word {
            line_number: 4,
            word_indices: vec![0],
            text: "daiin".to_string(),
        };
        assert_eq!(word.line_number(), 4);
        assert_eq!(AnchorSource::Line { line_number: 2 }.line_number(), 2);
    }
}
