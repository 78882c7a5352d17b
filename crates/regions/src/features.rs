//! Region feature measurement

#![allow(clippy::cast_precision_loss)]

use scriptorium_common::{PixelBox, RegionFeatures};
use scriptorium_segmentation::{components, InkMask};

/// Measure a zone of a page
///
/// Word boxes are assumed not to overlap each other, so their intersections
/// with the zone are summed for text coverage.
#[must_use]
pub fn measure(mask: &InkMask, zone: &PixelBox, words: &[PixelBox]) -> RegionFeatures {
    let area = zone.area();
    if area == 0 {
        return RegionFeatures::default();
    }
    let page_area = u64::from(mask.width()) * u64::from(mask.height());
    let covered: u64 = words.iter().map(|w| w.intersection_area(zone)).sum();
    let crop = mask.crop(zone);

    RegionFeatures {
        ink_density: mask.count_in(zone) as f64 / area as f64,
        area_fraction: if page_area == 0 {
            0.0
        } else {
            area as f64 / page_area as f64
        },
        text_coverage: (covered as f64 / area as f64).min(1.0),
        component_count: components(&crop, &crop).len(),
    }
}
