//! Synthetic page rasters
//!
//! Draws black-on-white pages out of rectangles. Used by the test suites and
//! benches of the workspace to build pages with known geometry.

use image::{DynamicImage, GrayImage, Luma};

const PAPER: u8 = 255;
const INK: u8 = 0;

/// Builder for a white page with black rectangles
#[derive(Debug, Clone)]
pub struct PageCanvas {
    image: GrayImage,
}

impl PageCanvas {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::from_pixel(width, height, Luma([PAPER])),
        }
    }

    /// Paint a filled rectangle, clipped to the page
    #[must_use]
    pub fn fill_rect(mut self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x1 = (x + width).min(self.image.width());
        let y1 = (y + height).min(self.image.height());
        for py in y..y1 {
            for px in x..x1 {
                self.image.put_pixel(px, py, Luma([INK]));
            }
        }
        self
    }

    /// Paint a word as a row of glyph blocks
    ///
    /// Glyphs start at `x`, are `height` tall and separated by `spacing` columns.
    #[must_use]
    pub fn word(mut self, x: u32, y: u32, glyph_widths: &[u32], height: u32, spacing: u32) -> Self {
        let mut cursor = x;
        for &w in glyph_widths {
            self = self.fill_rect(cursor, y, w, height);
            cursor += w + spacing;
        }
        self
    }

    /// Horizontal extent a word drawn with [`word`](Self::word) occupies
    #[must_use]
    pub fn word_width(glyph_widths: &[u32], spacing: u32) -> u32 {
        let inner: u32 = glyph_widths.iter().sum();
        inner + spacing * (glyph_widths.len().saturating_sub(1) as u32)
    }

    #[must_use]
    pub fn into_gray(self) -> GrayImage {
        self.image
    }

    #[must_use]
    pub fn into_image(self) -> DynamicImage {
        DynamicImage::ImageLuma8(self.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_drawing() {
        let canvas = PageCanvas::new(40, 10).word(2, 1, &[3, 3, 5], 4, 2);
        let image = canvas.into_gray();
        assert_eq!(image.get_pixel(2, 1)[0], INK);
        assert_eq!(image.get_pixel(5, 1)[0], PAPER);
        assert_eq!(image.get_pixel(7, 4)[0], INK);
        assert_eq!(image.get_pixel(16, 1)[0], INK);
        assert_eq!(image.get_pixel(17, 1)[0], PAPER);
        assert_eq!(PageCanvas::word_width(&[3, 3, 5], 2), 15);
    }

    #[test]
    fn test_fill_rect_clips() {
        let image = PageCanvas::new(5, 5).fill_rect(3, 3, 10, 10).into_gray();
        assert_eq!(image.pixels().filter(|p| p[0] == INK).count(), 4);
    }
}
