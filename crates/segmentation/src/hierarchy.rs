//! Page -> Line -> Word -> GlyphCandidate hierarchy
//!
//! Geometry only: nothing here knows which symbol a box shows.

use scriptorium_common::{AnomalyLog, PixelBox};
use serde::{Deserialize, Serialize};

/// One image-segmented glyph box
///
/// Touching or merged ink stays a single candidate; `multiplicity` estimates
/// how many glyphs it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphCandidate {
    /// 0-based index within the word, left to right
    pub index: usize,
    pub bbox: PixelBox,
    /// Ink pixels of the candidate
    pub ink_pixels: u64,
    /// Estimated glyph count, 1 unless `merged`
    pub multiplicity: u32,
    /// Wider than the merge threshold, likely touching glyphs
    pub merged: bool,
}

/// Pixel features of a word box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelFeatures {
    pub ink_pixels: u64,
    /// Ink pixels over box area
    pub ink_density: f64,
    /// Width over height
    pub aspect_ratio: f64,
    pub glyph_count: usize,
    /// Sum of glyph multiplicities
    pub estimated_symbols: u32,
}

/// One image-segmented word box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordGeometry {
    /// Index of the line band holding the word
    pub line_index: usize,
    /// 0-based index within the line, left to right
    pub index: usize,
    pub bbox: PixelBox,
    pub features: PixelFeatures,
    pub glyphs: Vec<GlyphCandidate>,
}

/// One line band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineGeometry {
    /// 0-based index, top to bottom
    pub index: usize,
    pub bbox: PixelBox,
    pub words: Vec<WordGeometry>,
}

/// Page dimensions and identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub folio: String,
    pub width: u32,
    pub height: u32,
}

impl PageGeometry {
    #[must_use]
    pub fn bbox(&self) -> PixelBox {
        PixelBox::new(0, 0, self.width, self.height)
    }

    /// Length of the page diagonal in pixels
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        f64::from(self.width).hypot(f64::from(self.height))
    }
}

/// Result of segmenting one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segmentation {
    pub page: PageGeometry,
    pub lines: Vec<LineGeometry>,
    /// Median glyph width on the page, if any glyph was found
    pub median_glyph_width: Option<f64>,
    pub anomalies: AnomalyLog,
}

impl Segmentation {
    #[must_use]
    pub fn line(&self, index: usize) -> Option<&LineGeometry> {
        self.lines.get(index)
    }

    /// Every word on the page, line by line
    pub fn words(&self) -> impl Iterator<Item = &WordGeometry> {
        self.lines.iter().flat_map(|l| l.words.iter())
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.lines.iter().map(|l| l.words.len()).sum()
    }

    #[must_use]
    pub fn glyph_count(&self) -> usize {
        self.words().map(|w| w.glyphs.len()).sum()
    }
}
