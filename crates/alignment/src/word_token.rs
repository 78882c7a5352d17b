//! Word <-> token alignment on one line
//!
//! The cost of a segment only looks at counts: how many items were split or
//! merged, and, for those segments, how far the estimated symbol extent of
//! the words is from the symbol count of the tokens. Glyph geometry carries no symbol identity, so
//! token content never enters the cost.

#![allow(clippy::cast_precision_loss)]

use crate::dp::{self, Infeasible, Limits, SequenceAlignment};
use scriptorium_common::{AlignmentMismatch, IdBuilder, RunContext, WordAlignment};
use scriptorium_segmentation::LineGeometry;
use scriptorium_transliteration::ParsedLine;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Word alignment cost model and search bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Cost per extra token when one word spans several tokens
    /// Default: 1.0
    pub split_penalty: f64,

    /// Cost per extra word when several words map to one token
    /// Default: 1.0
    pub merge_penalty: f64,

    /// Weight of the relative symbol count mismatch of a segment
    /// Default: 1.0
    pub length_weight: f64,

    /// Largest side of a 1:N or N:1 segment
    /// Default: 4
    pub max_span: usize,

    /// Most tied candidates kept for one line
    /// Default: 16
    pub max_candidates: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            split_penalty: 1.0,
            merge_penalty: 1.0,
            length_weight: 1.0,
            max_span: 4,
            max_candidates: 16,
        }
    }
}

impl AlignmentConfig {
    /// Cost of aligning `words` with `tokens` as one segment
    ///
    /// Sides hold estimated symbol counts; `None` is an unknown extent and
    /// drops the length term for the segment. A 1:1 segment costs nothing:
    /// the length term only places the boundary of a split or merge.
    #[must_use]
    pub fn segment_cost(&self, words: &[Option<u32>], tokens: &[Option<u32>]) -> f64 {
        let structural = if tokens.len() > 1 {
            self.split_penalty * (tokens.len() - 1) as f64
        } else if words.len() > 1 {
            self.merge_penalty * (words.len() - 1) as f64
        } else {
            0.0
        };
        if words.len() == 1 && tokens.len() == 1 {
            return structural;
        }
        let image: Option<u32> = words.iter().copied().sum();
        let text: Option<u32> = tokens.iter().copied().sum();
        let length = match (image, text) {
            (Some(a), Some(b)) if a.max(b) > 0 => {
                self.length_weight * f64::from(a.abs_diff(b)) / f64::from(a.max(b))
            }
            _ => 0.0,
        };
        structural + length
    }

    pub(crate) const fn limits(&self) -> Limits {
        Limits {
            max_span: self.max_span,
            max_candidates: self.max_candidates,
        }
    }
}

/// Records for one line, or the mismatch that prevented them
#[derive(Debug, Clone, PartialEq)]
pub struct LineResult {
    pub records: Vec<WordAlignment>,
    pub alignment: Option<SequenceAlignment>,
    pub mismatch: Option<AlignmentMismatch>,
}

/// Aligns image words with transcription tokens
#[derive(Debug, Clone, Default)]
pub struct WordTokenAligner {
    config: AlignmentConfig,
}

impl WordTokenAligner {
    #[must_use]
    pub const fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Align two count sequences
    ///
    /// # Errors
    ///
    /// Returns [`Infeasible`] when either side is empty or no path fits
    /// within `max_span`.
    pub fn align_counts(
        &self,
        words: &[Option<u32>],
        tokens: &[Option<u32>],
    ) -> Result<SequenceAlignment, Infeasible> {
        dp::align(words.len(), tokens.len(), self.config.limits(), |w, t| {
            self.config.segment_cost(&words[w], &tokens[t])
        })
    }

    /// Align one image line with one transcription line
    ///
    /// Every tied candidate yields its own records, numbered by `candidate`
    /// and flagged `ambiguous`.
    #[must_use]
    pub fn align_line(
        &self,
        run: &RunContext,
        image: &LineGeometry,
        text: &ParsedLine,
    ) -> LineResult {
        let words: Vec<Option<u32>> = image
            .words
            .iter()
            .map(|w| Some(w.features.estimated_symbols))
            .collect();
        let tokens: Vec<Option<u32>> = text
            .tokens
            .iter()
            .map(|t| u32::try_from(t.symbol_count()).ok())
            .collect();

        let alignment = match self.align_counts(&words, &tokens) {
            Ok(alignment) => alignment,
            Err(reason) => {
                debug!(
                    "{}.{}: no alignment for {} words / {} tokens ({:?})",
                    text.folio,
                    text.line_number,
                    words.len(),
                    tokens.len(),
                    reason
                );
                return LineResult {
                    records: Vec::new(),
                    alignment: None,
                    mismatch: Some(AlignmentMismatch {
                        folio: text.folio.clone(),
                        line_number: Some(text.line_number),
                        reason: reason.into(),
                        image_count: words.len(),
                        text_count: tokens.len(),
                    }),
                };
            }
        };

        let ambiguous = alignment.is_ambiguous();
        let mut records = Vec::new();
        for (candidate, path) in alignment.resolution.candidates().iter().enumerate() {
            for step in &path.steps {
                let word_indices: Vec<usize> = step.left.clone().collect();
                let token_indices: Vec<usize> = step.right.clone().collect();
                let id = IdBuilder::new("word_alignment")
                    .part(&run.config_digest)
                    .part(&text.folio)
                    .part(text.line_number)
                    .part(image.index)
                    .part(candidate)
                    .indices(&word_indices)
                    .indices(&token_indices)
                    .finish();
                records.push(WordAlignment {
                    id,
                    folio: text.folio.clone(),
                    line_number: text.line_number,
                    image_line: image.index,
                    candidate,
                    tokens: step
                        .right
                        .clone()
                        .map(|t| text.tokens[t].content.clone())
                        .collect(),
                    word_indices,
                    token_indices,
                    cardinality: step.cardinality,
                    score: step.score(),
                    ambiguous,
                });
            }
        }
        debug!(
            "{}.{}: {} candidate(s), {} records{}",
            text.folio,
            text.line_number,
            alignment.resolution.len(),
            records.len(),
            if alignment.truncated { " (truncated)" } else { "" }
        );

        LineResult {
            records,
            alignment: Some(alignment),
            mismatch: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_common::Cardinality;

    fn known(counts: &[u32]) -> Vec<Option<u32>> {
        counts.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_segment_cost_terms() {
        let config = AlignmentConfig::default();
        assert!(config.segment_cost(&known(&[4]), &known(&[4])).abs() < 1e-12);
        assert!(config.segment_cost(&known(&[6]), &known(&[2])).abs() < 1e-12);
        assert!((config.segment_cost(&known(&[8]), &known(&[2, 6])) - 1.0).abs() < 1e-12);
        assert!((config.segment_cost(&known(&[2, 2]), &known(&[8])) - 1.5).abs() < 1e-12);
        assert!((config.segment_cost(&[None], &known(&[2, 3, 4])) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_matching_line_is_unique_one_to_one() {
        let aligner = WordTokenAligner::default();
        let counts = known(&[4, 3, 6, 2, 5]);
        let alignment = aligner.align_counts(&counts, &counts).unwrap();
        let path = alignment.resolution.unique().unwrap();
        assert_eq!(path.steps.len(), 5);
        assert!(path
            .steps
            .iter()
            .all(|s| s.cardinality == Cardinality::OneToOne && (s.score() - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_extent_mismatch_keeps_one_to_one_scores() {
        let aligner = WordTokenAligner::default();
        let alignment = aligner
            .align_counts(&known(&[4, 3, 6, 2, 5]), &known(&[2, 3, 5, 2, 5]))
            .unwrap();
        let path = alignment.resolution.unique().unwrap();
        assert_eq!(path.steps.len(), 5);
        assert!(path
            .steps
            .iter()
            .all(|s| s.cardinality == Cardinality::OneToOne && (s.score() - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_glyph_extent_resolves_split() {
        // qoke | dyqokedy | ol  against  qoke dy qokedy ol
        let aligner = WordTokenAligner::default();
        let alignment = aligner
            .align_counts(&known(&[4, 8, 2]), &known(&[4, 2, 6, 2]))
            .unwrap();
        assert!(!alignment.is_ambiguous());
        let path = alignment.resolution.unique().unwrap();
        let shapes: Vec<_> = path
            .steps
            .iter()
            .map(|s| (s.left.clone(), s.right.clone(), s.cardinality))
            .collect();
        assert_eq!(
            shapes,
            vec![
                (0..1, 0..1, Cardinality::OneToOne),
                (1..2, 1..3, Cardinality::OneToMany),
                (2..3, 3..4, Cardinality::OneToOne),
            ]
        );
    }

    #[test]
    fn test_unknown_extents_leave_ties_open() {
        let aligner = WordTokenAligner::default();
        let alignment = aligner.align_counts(&[None; 3], &[None; 4]).unwrap();
        assert!(alignment.is_ambiguous());
        assert_eq!(alignment.resolution.len(), 3);
    }

    #[test]
    fn test_merge_when_words_outnumber_tokens() {
        let aligner = WordTokenAligner::default();
        let alignment = aligner
            .align_counts(&known(&[3, 3, 5]), &known(&[6, 5]))
            .unwrap();
        let path = alignment.resolution.unique().unwrap();
        assert_eq!(path.steps[0].cardinality, Cardinality::ManyToOne);
        assert_eq!(path.steps[0].left, 0..2);
    }

    #[test]
    fn test_infeasible_lines() {
        let aligner = WordTokenAligner::default();
        assert_eq!(
            aligner.align_counts(&[], &known(&[1])),
            Err(Infeasible::EmptyLine)
        );
        assert_eq!(
            aligner.align_counts(&known(&[9]), &known(&[1, 1, 1, 1, 1])),
            Err(Infeasible::SpanExceeded)
        );
    }
}
