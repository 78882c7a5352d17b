//! Segmentation thresholds

use serde::{Deserialize, Serialize};

/// Configuration for page segmentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Fixed binarization threshold (0-255); Otsu's level when unset
    pub ink_threshold: Option<u8>,

    /// Rows with less ink than this fraction of the densest row are troughs
    /// between line bands
    /// Default: 0.05
    pub line_trough_ratio: f64,

    /// Bands shorter than this (pixels) are logged as noise
    /// Default: 4
    pub min_line_height: u32,

    /// Minimum blank columns separating two words (pixels)
    /// Default: 3
    pub min_word_gap: u32,

    /// Word gap relative to band height; the larger of the two gaps applies
    /// Default: 0.3
    pub word_gap_ratio: f64,

    /// Ink components with fewer pixels are noise specks
    /// Default: 6
    pub min_glyph_area: u64,

    /// Components overlapping horizontally by this fraction of the narrower
    /// one are one glyph (stacked strokes, dots)
    /// Default: 0.6
    pub stack_overlap_ratio: f64,

    /// Glyphs wider than this multiple of the page median are flagged merged
    /// Default: 1.7
    pub merged_width_ratio: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            ink_threshold: None,
            line_trough_ratio: 0.05,
            min_line_height: 4,
            min_word_gap: 3,
            word_gap_ratio: 0.3,
            min_glyph_area: 6,
            stack_overlap_ratio: 0.6,
            merged_width_ratio: 1.7,
        }
    }
}

impl SegmentationConfig {
    /// Blank columns needed to split words in a band of `band_height`
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn word_gap(&self, band_height: u32) -> u32 {
        let relative = (f64::from(band_height) * self.word_gap_ratio).round() as u32;
        self.min_word_gap.max(relative).max(1)
    }
}
