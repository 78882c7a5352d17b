//! Connected ink blobs
//!
//! Ink is dilated so that strokes of one drawing join, then labelled. With
//! `exclude_text` the word boxes are blanked first and the blobs that remain
//! are illustration ink.

use crate::input::RegionInput;
use crate::method::{Adjacency, RegionMethod};
use crate::RegionError;
use image::Luma;
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use scriptorium_common::{EdgeKind, PixelBox};
use scriptorium_segmentation::components;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Method id of blob regions
pub const BLOB_METHOD: &str = "blob";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentMethod {
    /// Dilation radius in pixels (chessboard norm)
    /// Default: 3
    pub dilation: u8,

    /// Blobs whose box is smaller than this area (pixels) are dropped
    /// Default: 400
    pub min_area: u64,

    /// Blank word boxes before labelling
    /// Default: true
    pub exclude_text: bool,

    /// Maximum center distance, as a fraction of the page diagonal, for two
    /// blobs to be adjacent
    /// Default: 0.25
    pub max_edge_distance: f64,
}

impl Default for ComponentMethod {
    fn default() -> Self {
        Self {
            dilation: 3,
            min_area: 400,
            exclude_text: true,
            max_edge_distance: 0.25,
        }
    }
}

impl ComponentMethod {
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidMethod`] when `max_edge_distance` is not
    /// a finite, non-negative fraction.
    pub fn validate(&self) -> Result<(), RegionError> {
        if !self.max_edge_distance.is_finite() || self.max_edge_distance < 0.0 {
            return Err(RegionError::InvalidMethod {
                method: BLOB_METHOD.to_string(),
                reason: format!("max_edge_distance {} is not a distance", self.max_edge_distance),
            });
        }
        Ok(())
    }
}

impl RegionMethod for ComponentMethod {
    fn id(&self) -> &'static str {
        BLOB_METHOD
    }

    fn scale(&self) -> u32 {
        u32::from(self.dilation)
    }

    fn signature(&self) -> String {
        format!(
            "dilation={},min_area={},exclude_text={},max_edge_distance={}",
            self.dilation, self.min_area, self.exclude_text, self.max_edge_distance
        )
    }

    fn zones(&self, input: &RegionInput<'_>) -> Vec<PixelBox> {
        let mut ink = input.mask.as_image().clone();
        if self.exclude_text {
            for word in input.words() {
                for y in word.y..word.bottom() {
                    for x in word.x..word.right() {
                        ink.put_pixel(x, y, Luma([0]));
                    }
                }
            }
        }

        let grouping = if self.dilation > 0 {
            dilate(&ink, Norm::LInf, self.dilation)
        } else {
            ink.clone()
        };

        let mut blobs: Vec<PixelBox> = components(&grouping, &ink)
            .into_iter()
            .map(|c| c.bbox)
            .filter(|bbox| bbox.area() >= self.min_area)
            .collect();
        blobs.sort_by_key(|b| (b.y, b.x));
        debug!(
            "{}: {} blobs at dilation {}",
            input.folio(),
            blobs.len(),
            self.dilation
        );
        blobs
    }

    fn adjacency(&self, input: &RegionInput<'_>, zones: &[PixelBox]) -> Vec<Adjacency> {
        let diagonal = input.page.diagonal();
        if diagonal <= 0.0 {
            return Vec::new();
        }
        let mut edges = Vec::new();
        for (a, first) in zones.iter().enumerate() {
            for (b, second) in zones.iter().enumerate().skip(a + 1) {
                let distance = first.center_distance(second) / diagonal;
                if distance <= self.max_edge_distance {
                    edges.push(Adjacency {
                        a,
                        b,
                        kind: EdgeKind::NormalizedDistance,
                        weight: distance,
                    });
                }
            }
        }
        edges
    }
}
