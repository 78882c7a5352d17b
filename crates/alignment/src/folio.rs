//! Word and glyph alignment of a whole folio

use crate::glyph_symbol::{GlyphConfig, GlyphSymbolAligner};
use crate::keying::key_lines;
use crate::word_token::{AlignmentConfig, WordTokenAligner};
use scriptorium_common::{
    AlignmentMismatch, AnomalyLog, GlyphAlignment, LineKey, MismatchReason, RunContext,
    WordAlignment,
};
use scriptorium_segmentation::Segmentation;
use scriptorium_transliteration::ParsedLine;
use tracing::info;

/// Everything aligned on one folio
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolioAlignment {
    /// Every keyed line pair, aligned or not
    pub lines: Vec<LineKey>,
    pub words: Vec<WordAlignment>,
    pub glyphs: Vec<GlyphAlignment>,
    pub anomalies: AnomalyLog,
    /// Lines were paired by position after a count disagreement
    pub rekeyed: bool,
    /// Lines whose word alignment had tied candidates
    pub ambiguous_lines: usize,
}

/// Word then glyph alignment over every keyed line of a folio
#[derive(Debug, Clone, Default)]
pub struct FolioAligner {
    words: WordTokenAligner,
    glyphs: GlyphSymbolAligner,
}

impl FolioAligner {
    #[must_use]
    pub const fn new(words: AlignmentConfig, glyphs: GlyphConfig) -> Self {
        Self {
            words: WordTokenAligner::new(words),
            glyphs: GlyphSymbolAligner::new(glyphs),
        }
    }

    /// Align a segmented page with the transcription lines of its folio
    ///
    /// `text` holds the folio's lines in transcription order.
    #[must_use]
    pub fn align(
        &self,
        run: &RunContext,
        segmentation: &Segmentation,
        text: &[&ParsedLine],
    ) -> FolioAlignment {
        let folio = segmentation.page.folio.as_str();
        let mut out = FolioAlignment::default();

        if text.is_empty() {
            out.anomalies.push(AlignmentMismatch {
                folio: folio.to_string(),
                line_number: None,
                reason: MismatchReason::MissingFolio,
                image_count: segmentation.lines.len(),
                text_count: 0,
            });
            return out;
        }

        let keying = key_lines(folio, &segmentation.lines, text);
        out.rekeyed = keying.rekeyed;
        for mismatch in keying.mismatches {
            out.anomalies.push(mismatch);
        }

        for pair in &keying.pairs {
            out.lines.push(LineKey {
                line_number: pair.text.line_number,
                image_line: pair.image.index,
            });
            let line = self.words.align_line(run, pair.image, pair.text);
            if let Some(mismatch) = line.mismatch {
                out.anomalies.push(mismatch);
                continue;
            }
            if line.alignment.as_ref().is_some_and(|a| a.is_ambiguous()) {
                out.ambiguous_lines += 1;
            }
            for record in &line.records {
                let glyphs = self.glyphs.align_segment(
                    run,
                    pair.image,
                    pair.text,
                    record,
                    segmentation.median_glyph_width,
                );
                if let Some(mismatch) = glyphs.mismatch {
                    out.anomalies.push(mismatch);
                }
                out.glyphs.extend(glyphs.records);
            }
            out.words.extend(line.records);
        }

        info!(
            "Aligned {}: {} line pairs, {} word records, {} glyph records, {} ambiguous lines",
            folio,
            keying.pairs.len(),
            out.words.len(),
            out.glyphs.len(),
            out.ambiguous_lines
        );
        out
    }
}
