//! What a region method sees of a page

use scriptorium_common::{AnomalyLog, GeometryAnomaly, GeometryIssue, PixelBox};
use scriptorium_segmentation::{InkMask, PageGeometry, Segmentation};

/// A page with its ink mask and, optionally, its word boxes
#[derive(Debug, Clone)]
pub struct RegionInput<'a> {
    pub page: &'a PageGeometry,
    pub mask: &'a InkMask,
    words: Vec<PixelBox>,
}

impl<'a> RegionInput<'a> {
    #[must_use]
    pub const fn new(page: &'a PageGeometry, mask: &'a InkMask) -> Self {
        Self {
            page,
            mask,
            words: Vec::new(),
        }
    }

    /// Input carrying the word boxes of a segmentation
    #[must_use]
    pub fn from_segmentation(segmentation: &'a Segmentation, mask: &'a InkMask) -> Self {
        Self {
            page: &segmentation.page,
            mask,
            words: segmentation.words().map(|w| w.bbox).collect(),
        }
    }

    /// Attach word boxes
    ///
    /// Empty boxes and boxes reaching past the page are not kept; each one is
    /// recorded in `anomalies`.
    #[must_use]
    pub fn with_words(mut self, words: &[PixelBox], anomalies: &mut AnomalyLog) -> Self {
        let (width, height) = (self.page.width, self.page.height);
        self.words = words
            .iter()
            .filter(|bbox| {
                if bbox.is_valid() && bbox.fits_within(width, height) {
                    return true;
                }
                anomalies.push(GeometryAnomaly {
                    folio: self.page.folio.clone(),
                    issue: GeometryIssue::InvalidBox,
                    bbox: Some(**bbox),
                    detail: format!("word box outside {width}x{height} page or empty"),
                });
                false
            })
            .copied()
            .collect();
        self
    }

    #[must_use]
    pub fn words(&self) -> &[PixelBox] {
        &self.words
    }

    #[must_use]
    pub fn folio(&self) -> &str {
        &self.page.folio
    }
}
