//! Anchor method descriptors and their scoring rules

use crate::AnchorError;
use scriptorium_common::{PixelBox, Region};
use serde::{Deserialize, Serialize};

/// Region method whose cells a [`AnchorKind::GridCell`] method scores against
pub const GRID_REGION_METHOD: &str = "grid";

/// How a method scores a (text structure, region) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnchorKind {
    /// `1 - d / max_distance`, with `d` the center distance over the page
    /// diagonal; pairs farther than `max_distance` do not qualify
    Proximity { max_distance: f64 },
    /// Fraction of the structure's area inside the region; pairs below
    /// `min_overlap` do not qualify
    Containment { min_overlap: f64 },
    /// Fraction of the structure's area inside a grid cell
    GridCell,
}

/// A named, parameterized anchoring algorithm
///
/// Descriptors are immutable; a changed algorithm gets a new `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorMethod {
    pub id: String,
    #[serde(flatten)]
    pub kind: AnchorKind,
    /// Fewest qualifying samples across a cohort for a scored outcome
    pub min_samples: usize,
}

impl AnchorMethod {
    /// # Errors
    ///
    /// Returns [`AnchorError::InvalidMethod`] for an empty id or out of range
    /// parameters.
    pub fn new(id: impl Into<String>, kind: AnchorKind, min_samples: usize) -> Result<Self, AnchorError> {
        let method = Self {
            id: id.into(),
            kind,
            min_samples,
        };
        method.validate()?;
        Ok(method)
    }

    /// # Errors
    ///
    /// Returns [`AnchorError::InvalidMethod`] for an empty id or out of range
    /// parameters.
    pub fn validate(&self) -> Result<(), AnchorError> {
        let invalid = |reason: String| AnchorError::InvalidMethod {
            method: self.id.clone(),
            reason,
        };
        if self.id.trim().is_empty() {
            return Err(invalid("method id is empty".to_string()));
        }
        if self.min_samples == 0 {
            return Err(invalid("min_samples must be at least 1".to_string()));
        }
        match self.kind {
            AnchorKind::Proximity { max_distance } if !(max_distance > 0.0 && max_distance <= 1.0) => {
                Err(invalid(format!("max_distance {max_distance} outside (0, 1]")))
            }
            AnchorKind::Containment { min_overlap } if !(min_overlap > 0.0 && min_overlap <= 1.0) => {
                Err(invalid(format!("min_overlap {min_overlap} outside (0, 1]")))
            }
            _ => Ok(()),
        }
    }

    /// Canonical parameter string, part of every anchor id
    #[must_use]
    pub fn parameters(&self) -> String {
        (match self.kind {
            AnchorKind::Proximity { max_distance } => format!("proximity:max_distance={max_distance}"),
            AnchorKind::Containment { min_overlap } => format!("containment:min_overlap={min_overlap}"),
            AnchorKind::GridCell => "grid_cell".to_string(),
        }) + &format!(";min_samples={}", self.min_samples)
    }

    /// Score a structure box against a region, `None` when the pair does not
    /// qualify under this method
    #[must_use]
    pub fn score(&self, source: &PixelBox, region: &Region, diagonal: f64) -> Option<f64> {
        match self.kind {
            AnchorKind::Proximity { max_distance } => {
                if diagonal <= 0.0 {
                    return None;
                }
                let d = source.center_distance(&region.bbox) / diagonal;
                (d <= max_distance).then(|| (1.0 - d / max_distance).clamp(0.0, 1.0))
            }
            AnchorKind::Containment { min_overlap } => {
                let fraction = area_fraction(source, &region.bbox)?;
                (fraction >= min_overlap).then_some(fraction)
            }
            AnchorKind::GridCell => {
                if region.method != GRID_REGION_METHOD {
                    return None;
                }
                area_fraction(source, &region.bbox).filter(|&f| f > 0.0)
            }
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn area_fraction(source: &PixelBox, target: &PixelBox) -> Option<f64> {
    let area = source.area();
    (area > 0).then(|| source.intersection_area(target) as f64 / area as f64)
}

/// Proximity, containment and grid-cell methods at their default parameters
#[must_use]
pub fn default_methods() -> Vec<AnchorMethod> {
    vec![
        AnchorMethod {
            id: "proximity-v1".to_string(),
            kind: AnchorKind::Proximity { max_distance: 0.15 },
            min_samples: 30,
        },
        AnchorMethod {
            id: "containment-v1".to_string(),
            kind: AnchorKind::Containment { min_overlap: 0.5 },
            min_samples: 30,
        },
        AnchorMethod {
            id: "grid-cell-v1".to_string(),
            kind: AnchorKind::GridCell,
            min_samples: 30,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_common::RegionFeatures;

    fn region(method: &str, bbox: PixelBox) -> Region {
        Region {
            id: format!("{method}-0"),
            folio: "f1r".to_string(),
            method: method.to_string(),
            scale: 1,
            index: 0,
            bbox,
            features: RegionFeatures::default(),
        }
    }

    #[test]
    fn test_proximity_score_falls_with_distance() {
        let method = AnchorMethod::new("p", AnchorKind::Proximity { max_distance: 0.5 }, 1).unwrap();
        let source = PixelBox::new(0, 0, 10, 10);
        let same = region("blob", PixelBox::new(0, 0, 10, 10));
        let near = region("blob", PixelBox::new(20, 0, 10, 10));
        let far = region("blob", PixelBox::new(90, 90, 10, 10));

        let diagonal = 100.0;
        assert_eq!(method.score(&source, &same, diagonal), Some(1.0));
        let near_score = method.score(&source, &near, diagonal).unwrap();
        assert!((near_score - 0.6).abs() < 1e-12);
        assert_eq!(method.score(&source, &far, diagonal), None);
    }

    #[test]
    fn test_containment_requires_overlap() {
        let method = AnchorMethod::new("c", AnchorKind::Containment { min_overlap: 0.5 }, 1).unwrap();
        let source = PixelBox::new(0, 0, 10, 10);
        let half = region("blob", PixelBox::new(5, 0, 50, 50));
        let sliver = region("blob", PixelBox::new(8, 0, 50, 50));
        assert_eq!(method.score(&source, &half, 100.0), Some(0.5));
        assert_eq!(method.score(&source, &sliver, 100.0), None);
    }

    #[test]
    fn test_grid_cell_only_scores_grid_regions() {
        let method = AnchorMethod::new("g", AnchorKind::GridCell, 1).unwrap();
        let source = PixelBox::new(40, 0, 20, 10);
        let cell = region("grid", PixelBox::new(0, 0, 50, 50));
        let blob = region("blob", PixelBox::new(0, 0, 50, 50));
        assert_eq!(method.score(&source, &cell, 100.0), Some(0.5));
        assert_eq!(method.score(&source, &blob, 100.0), None);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(AnchorMethod::new("p", AnchorKind::Proximity { max_distance: 0.0 }, 1).is_err());
        assert!(AnchorMethod::new("c", AnchorKind::Containment { min_overlap: 1.5 }, 1).is_err());
        assert!(AnchorMethod::new(" ", AnchorKind::GridCell, 1).is_err());
        assert!(AnchorMethod::new("g", AnchorKind::GridCell, 0).is_err());
    }

    #[test]
    fn test_parameters_distinguish_configurations() {
        let a = AnchorMethod::new("p", AnchorKind::Proximity { max_distance: 0.2 }, 5).unwrap();
        let b = AnchorMethod::new("p", AnchorKind::Proximity { max_distance: 0.3 }, 5).unwrap();
        assert_ne!(a.parameters(), b.parameters());
    }

    #[test]
    fn test_descriptor_round_trips_through_toml_shape() {
        let json = r#"{"id":"near","kind":"proximity","max_distance":0.1,"min_samples":4}"#;
        let method: AnchorMethod = serde_json::from_str(json).unwrap();
        assert_eq!(method.kind, AnchorKind::Proximity { max_distance: 0.1 });
        assert_eq!(method.min_samples, 4);
    }
}
