//! Page loading and binarization
//!
//! Every later stage works on an [`InkMask`]: a grayscale image where ink
//! pixels are 255 and background pixels are 0.

use crate::SegmentationError;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::region_labelling::{connected_components, Connectivity};
use scriptorium_common::PixelBox;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Mask value for ink pixels
pub const INK: u8 = 255;

/// Load a page scan (TIFF, JPEG, PNG, ...)
///
/// # Errors
///
/// Returns [`SegmentationError::Io`] if the file cannot be read and
/// [`SegmentationError::Decode`] if it is not a decodable raster.
pub fn load_page(path: &Path) -> Result<DynamicImage, SegmentationError> {
    image::open(path).map_err(|err| match err {
        image::ImageError::IoError(source) => SegmentationError::Io {
            path: path.display().to_string(),
            source,
        },
        other => SegmentationError::Decode {
            path: path.display().to_string(),
            message: other.to_string(),
        },
    })
}

/// One 8-connected ink component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Bounding box of the counted ink, in the coordinates of the labelled image
    pub bbox: PixelBox,
    /// Counted ink pixels
    pub pixels: u64,
}

/// Label the components of `grouping` and measure the `ink` inside each one
///
/// Both images must have the same size. Passing the same image twice gives
/// plain connected components; passing a dilated copy as `grouping` joins
/// nearby ink while boxes and counts still describe the undilated ink.
/// Components without any counted ink are omitted. Order follows label order.
#[must_use]
pub fn components(grouping: &GrayImage, ink: &GrayImage) -> Vec<Component> {
    let labels = connected_components(grouping, Connectivity::Eight, Luma([0u8]));
    let mut extents: BTreeMap<u32, (u32, u32, u32, u32, u64)> = BTreeMap::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let id = label[0];
        if id == 0 || ink.get_pixel(x, y)[0] == 0 {
            continue;
        }
        let e = extents.entry(id).or_insert((x, y, x + 1, y + 1, 0));
        e.0 = e.0.min(x);
        e.1 = e.1.min(y);
        e.2 = e.2.max(x + 1);
        e.3 = e.3.max(y + 1);
        e.4 += 1;
    }
    extents
        .into_values()
        .map(|(x0, y0, x1, y1, pixels)| Component {
            bbox: PixelBox::from_extents(x0, y0, x1, y1),
            pixels,
        })
        .collect()
}

/// Binary ink mask of a page
#[derive(Debug, Clone)]
pub struct InkMask {
    mask: GrayImage,
    threshold: u8,
}

impl InkMask {
    /// Binarize a page image
    ///
    /// Pixels at or below the threshold are ink. Without a fixed threshold the
    /// Otsu level of the page is used.
    #[must_use]
    pub fn from_image(image: &DynamicImage, threshold: Option<u8>) -> Self {
        let gray = image.to_luma8();
        let threshold = threshold.unwrap_or_else(|| otsu_level(&gray));
        let mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            if gray.get_pixel(x, y)[0] <= threshold {
                Luma([INK])
            } else {
                Luma([0])
            }
        });
        debug!(
            "Binarized {}x{} page at threshold {}",
            gray.width(),
            gray.height(),
            threshold
        );
        Self { mask, threshold }
    }

    /// Wrap an existing mask (non-zero pixels are ink)
    #[must_use]
    pub fn from_mask(mask: GrayImage) -> Self {
        Self { mask, threshold: 0 }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    /// Threshold used for binarization
    #[inline]
    #[must_use]
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    #[inline]
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.mask
    }

    #[inline]
    #[must_use]
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        self.mask.get_pixel(x, y)[0] != 0
    }

    /// Ink pixels per row over the columns `x0..x1`
    #[must_use]
    pub fn row_profile(&self, x0: u32, x1: u32, y0: u32, y1: u32) -> Vec<u32> {
        (y0..y1)
            .map(|y| (x0..x1).filter(|&x| self.is_ink(x, y)).count() as u32)
            .collect()
    }

    /// Ink pixels per column over the rows `y0..y1`
    #[must_use]
    pub fn column_profile(&self, x0: u32, x1: u32, y0: u32, y1: u32) -> Vec<u32> {
        (x0..x1)
            .map(|x| (y0..y1).filter(|&y| self.is_ink(x, y)).count() as u32)
            .collect()
    }

    /// Ink pixels inside a box, clipped to the page
    #[must_use]
    pub fn count_in(&self, bbox: &PixelBox) -> u64 {
        let x1 = bbox.right().min(self.width());
        let y1 = bbox.bottom().min(self.height());
        let mut count = 0u64;
        for y in bbox.y.min(y1)..y1 {
            for x in bbox.x.min(x1)..x1 {
                if self.is_ink(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Total ink pixels on the page
    #[must_use]
    pub fn total_ink(&self) -> u64 {
        self.mask.pixels().filter(|p| p[0] != 0).count() as u64
    }

    /// Copy of the mask inside `bbox`
    #[must_use]
    pub fn crop(&self, bbox: &PixelBox) -> GrayImage {
        image::imageops::crop_imm(&self.mask, bbox.x, bbox.y, bbox.width, bbox.height).to_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::PageCanvas;

    #[test]
    fn test_fixed_threshold_binarization() {
        let image = PageCanvas::new(10, 10).fill_rect(2, 3, 4, 2).into_image();
        let mask = InkMask::from_image(&image, Some(128));
        assert_eq!(mask.threshold(), 128);
        assert_eq!(mask.total_ink(), 8);
        assert!(mask.is_ink(2, 3));
        assert!(!mask.is_ink(6, 3));
    }

    #[test]
    fn test_otsu_on_two_tone_page() {
        let image = PageCanvas::new(20, 20).fill_rect(0, 0, 5, 5).into_image();
        let mask = InkMask::from_image(&image, None);
        assert_eq!(mask.total_ink(), 25);
    }

    #[test]
    fn test_blank_page_has_no_ink() {
        let image = PageCanvas::new(16, 16).into_image();
        let mask = InkMask::from_image(&image, None);
        assert_eq!(mask.total_ink(), 0);
    }

    #[test]
    fn test_profiles_and_counts() {
        let image = PageCanvas::new(10, 6).fill_rect(1, 1, 3, 2).into_image();
        let mask = InkMask::from_image(&image, Some(128));
        assert_eq!(mask.row_profile(0, 10, 0, 4), vec![0, 3, 3, 0]);
        assert_eq!(mask.column_profile(0, 5, 0, 6), vec![0, 2, 2, 2, 0]);
        assert_eq!(mask.count_in(&PixelBox::new(2, 0, 20, 20)), 4);
        assert_eq!(mask.crop(&PixelBox::new(1, 1, 3, 2)).len(), 6);
    }

    #[test]
    fn test_components_of_mask() {
        let image = PageCanvas::new(20, 10)
            .fill_rect(1, 1, 3, 3)
            .fill_rect(4, 4, 1, 1)
            .fill_rect(10, 2, 2, 5)
            .into_image();
        let mask = InkMask::from_image(&image, Some(128));
        let found = components(mask.as_image(), mask.as_image());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].bbox, PixelBox::new(1, 1, 4, 4));
        assert_eq!(found[0].pixels, 10);
        assert_eq!(found[1].bbox, PixelBox::new(10, 2, 2, 5));
    }

    #[test]
    fn test_components_grouped_by_other_image() {
        let image = PageCanvas::new(20, 10)
            .fill_rect(1, 1, 2, 2)
            .fill_rect(6, 1, 2, 2)
            .into_image();
        let mask = InkMask::from_image(&image, Some(128));
        let bridge = PageCanvas::new(20, 10).fill_rect(1, 1, 7, 2).into_image();
        let grouping = InkMask::from_image(&bridge, Some(128));
        let found = components(grouping.as_image(), mask.as_image());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].bbox, PixelBox::new(1, 1, 7, 2));
        assert_eq!(found[0].pixels, 8);
    }

    #[test]
    fn test_load_missing_page_is_io_error() {
        let err = load_page(Path::new("/nonexistent/f1r.tif")).expect_err("must fail");
        assert!(matches!(err, SegmentationError::Io { .. }));
    }

    #[test]
    fn test_load_corrupt_page_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f1r.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = load_page(&path).expect_err("must fail");
        assert!(matches!(err, SegmentationError::Decode { .. }));
    }
}
