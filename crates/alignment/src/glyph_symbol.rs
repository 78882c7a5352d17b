//! Glyph <-> symbol alignment inside one word alignment segment
//!
//! The glyphs of the segment's words meet the symbols of its tokens. A
//! glyph flagged as merged ink may cover several symbols (1:N); broken ink
//! may need several glyphs for one symbol (N:1). Cost grows with the gap
//! between a segment's estimated glyph count and its symbol count, and with
//! how far its width strays from the page median per symbol.

#![allow(clippy::cast_precision_loss)]

use crate::dp::{self, Infeasible, Limits, SequenceAlignment};
use scriptorium_common::{
    AlignmentMismatch, GlyphAlignment, GlyphRef, IdBuilder, RunContext, WordAlignment,
};
use scriptorium_segmentation::LineGeometry;
use scriptorium_transliteration::ParsedLine;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphConfig {
    /// Cost per unit of glyph multiplicity vs symbol count mismatch
    /// Default: 1.0
    pub count_penalty: f64,

    /// Weight of `|ln(width / (symbols * median width))|`
    /// Default: 0.5
    pub width_weight: f64,

    /// Largest side of a 1:N or N:1 segment
    /// Default: 4
    pub max_span: usize,

    /// Most tied candidates kept per word segment
    /// Default: 8
    pub max_candidates: usize,

    /// Scores below this are flagged `low_confidence`
    /// Default: 0.5
    pub low_confidence_threshold: f64,
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            count_penalty: 1.0,
            width_weight: 0.5,
            max_span: 4,
            max_candidates: 8,
            low_confidence_threshold: 0.5,
        }
    }
}

/// What the glyph aligner needs to know about one glyph candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphShape {
    pub glyph: GlyphRef,
    pub width: u32,
    pub multiplicity: u32,
}

impl GlyphConfig {
    /// Cost of aligning `glyphs` with `symbols` symbols as one segment
    #[must_use]
    pub fn segment_cost(&self, glyphs: &[GlyphShape], symbols: usize, median: Option<f64>) -> f64 {
        let multiplicity: u32 = glyphs.iter().map(|g| g.multiplicity).sum();
        let count = self.count_penalty * (f64::from(multiplicity) - symbols as f64).abs();
        let width: u32 = glyphs.iter().map(|g| g.width).sum();
        let shape = match median {
            Some(median) if median > 0.0 && width > 0 && symbols > 0 => {
                self.width_weight * (f64::from(width) / (symbols as f64 * median)).ln().abs()
            }
            _ => 0.0,
        };
        count + shape
    }

    const fn limits(&self) -> Limits {
        Limits {
            max_span: self.max_span,
            max_candidates: self.max_candidates,
        }
    }
}

/// Glyph records of one word segment, or the mismatch that prevented them
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphResult {
    pub records: Vec<GlyphAlignment>,
    pub mismatch: Option<AlignmentMismatch>,
}

/// Aligns glyph candidates with transcription symbols
#[derive(Debug, Clone, Default)]
pub struct GlyphSymbolAligner {
    config: GlyphConfig,
}

impl GlyphSymbolAligner {
    #[must_use]
    pub const fn new(config: GlyphConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &GlyphConfig {
        &self.config
    }

    /// Align glyph shapes with a symbol count
    ///
    /// # Errors
    ///
    /// Returns [`Infeasible`] when a side is empty or no path fits `max_span`.
    pub fn align_shapes(
        &self,
        glyphs: &[GlyphShape],
        symbols: usize,
        median: Option<f64>,
    ) -> Result<SequenceAlignment, Infeasible> {
        dp::align(glyphs.len(), symbols, self.config.limits(), |g, s| {
            self.config.segment_cost(&glyphs[g], s.len(), median)
        })
    }

    /// Align the glyphs and symbols of one word alignment record
    ///
    /// `image` and `text` must be the lines `segment` was computed from.
    #[must_use]
    pub fn align_segment(
        &self,
        run: &RunContext,
        image: &LineGeometry,
        text: &ParsedLine,
        segment: &WordAlignment,
        median: Option<f64>,
    ) -> GlyphResult {
        let glyphs: Vec<GlyphShape> = segment
            .word_indices
            .iter()
            .filter_map(|&w| image.words.get(w).map(|word| (w, word)))
            .flat_map(|(w, word)| {
                word.glyphs.iter().map(move |g| GlyphShape {
                    glyph: GlyphRef {
                        word_index: w,
                        glyph_index: g.index,
                    },
                    width: g.bbox.width,
                    multiplicity: g.multiplicity,
                })
            })
            .collect();
        let symbols: Vec<String> = segment
            .token_indices
            .iter()
            .filter_map(|&t| text.tokens.get(t))
            .flat_map(|token| token.symbols.iter().map(ToString::to_string))
            .collect();

        let alignment = match self.align_shapes(&glyphs, symbols.len(), median) {
            Ok(alignment) => alignment,
            Err(reason) => {
                debug!(
                    "{}.{}: no glyph alignment for words {:?} ({:?})",
                    segment.folio, segment.line_number, segment.word_indices, reason
                );
                return GlyphResult {
                    records: Vec::new(),
                    mismatch: Some(AlignmentMismatch {
                        folio: segment.folio.clone(),
                        line_number: Some(segment.line_number),
                        reason: reason.into(),
                        image_count: glyphs.len(),
                        text_count: symbols.len(),
                    }),
                };
            }
        };

        let ambiguous = alignment.is_ambiguous();
        let threshold = self.config.low_confidence_threshold;
        let mut records = Vec::new();
        for (candidate, path) in alignment.resolution.candidates().iter().enumerate() {
            for step in &path.steps {
                let score = step.score();
                for shape in &glyphs[step.left.clone()] {
                    for symbol_index in step.right.clone() {
                        records.push(GlyphAlignment {
                            id: IdBuilder::new("glyph_alignment")
                                .part(&run.config_digest)
                                .part(&segment.id)
                                .part(candidate)
                                .part(shape.glyph.word_index)
                                .part(shape.glyph.glyph_index)
                                .part(symbol_index)
                                .finish(),
                            folio: segment.folio.clone(),
                            line_number: segment.line_number,
                            word_candidate: segment.candidate,
                            candidate,
                            glyph: shape.glyph,
                            symbol_index,
                            symbol: symbols[symbol_index].clone(),
                            score,
                            low_confidence: score < threshold,
                            ambiguous,
                        });
                    }
                }
            }
        }
        GlyphResult {
            records,
            mismatch: None,
        }
    }
}
