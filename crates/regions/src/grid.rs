//! Fixed grid partition of the page

use crate::input::RegionInput;
use crate::method::{Adjacency, RegionMethod};
use crate::RegionError;
use scriptorium_common::{EdgeKind, PixelBox};
use serde::{Deserialize, Serialize};

/// Method id of grid regions
pub const GRID_METHOD: &str = "grid";

/// Cuts the page into `rows` x `cols` cells
///
/// Cells are listed row-major. Cell edges fall on `i * width / cols`, so the
/// cells tile the page exactly. Neighbouring cells are joined by an edge
/// weighted with the length of their shared boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMethod {
    pub rows: u32,
    pub cols: u32,
}

impl Default for GridMethod {
    fn default() -> Self {
        Self { rows: 4, cols: 4 }
    }
}

impl GridMethod {
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidMethod`] for a zero row or column count.
    pub fn new(rows: u32, cols: u32) -> Result<Self, RegionError> {
        let method = Self { rows, cols };
        method.validate()?;
        Ok(method)
    }

    /// # Errors
    ///
    /// Returns [`RegionError::InvalidMethod`] for a zero row or column count.
    pub fn validate(&self) -> Result<(), RegionError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(RegionError::InvalidMethod {
                method: GRID_METHOD.to_string(),
                reason: format!("grid needs at least one cell, got {}x{}", self.rows, self.cols),
            });
        }
        Ok(())
    }

    /// Cell edges along one axis
    ///
    /// More parts than pixels would only add empty cells, so the count is
    /// capped at the extent.
    #[allow(clippy::cast_possible_truncation)]
    fn cuts(extent: u32, parts: u32) -> Vec<u32> {
        let parts = parts.min(extent.max(1));
        (0..=parts)
            .map(|i| (u64::from(extent) * u64::from(i) / u64::from(parts)) as u32)
            .collect()
    }
}

impl RegionMethod for GridMethod {
    fn id(&self) -> &'static str {
        GRID_METHOD
    }

    fn scale(&self) -> u32 {
        self.rows
    }

    fn signature(&self) -> String {
        format!("rows={},cols={}", self.rows, self.cols)
    }

    fn zones(&self, input: &RegionInput<'_>) -> Vec<PixelBox> {
        let xs = Self::cuts(input.page.width, self.cols);
        let ys = Self::cuts(input.page.height, self.rows);
        let mut cells = Vec::new();
        for row in ys.windows(2) {
            for col in xs.windows(2) {
                let cell = PixelBox::from_extents(col[0], row[0], col[1], row[1]);
                if cell.is_valid() {
                    cells.push(cell);
                }
            }
        }
        cells
    }

    fn adjacency(&self, _input: &RegionInput<'_>, zones: &[PixelBox]) -> Vec<Adjacency> {
        let mut edges = Vec::new();
        for (a, first) in zones.iter().enumerate() {
            for (b, second) in zones.iter().enumerate().skip(a + 1) {
                let shared = first.shared_boundary(second);
                if shared > 0 {
                    edges.push(Adjacency {
                        a,
                        b,
                        kind: EdgeKind::SharedBoundary,
                        weight: f64::from(shared),
                    });
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_segmentation::{InkMask, PageCanvas, PageGeometry};

    fn page(width: u32, height: u32) -> (PageGeometry, InkMask) {
        let geometry = PageGeometry {
            folio: "f1r".to_string(),
            width,
            height,
        };
        let mask = InkMask::from_image(&PageCanvas::new(width, height).into_image(), Some(128));
        (geometry, mask)
    }

    #[test]
    fn test_cells_tile_the_page() {
        let (geometry, mask) = page(100, 61);
        let input = RegionInput::new(&geometry, &mask);
        let cells = GridMethod::new(3, 2).unwrap().zones(&input);
        assert_eq!(cells.len(), 6);
        let area: u64 = cells.iter().map(PixelBox::area).sum();
        assert_eq!(area, 100 * 61);
        assert_eq!(cells[0], PixelBox::new(0, 0, 50, 20));
        assert_eq!(cells[5], PixelBox::new(50, 40, 50, 21));
    }

    #[test]
    fn test_four_neighbour_edges() {
        let (geometry, mask) = page(90, 90);
        let input = RegionInput::new(&geometry, &mask);
        let grid = GridMethod::new(3, 3).unwrap();
        let cells = grid.zones(&input);
        let edges = grid.adjacency(&input, &cells);
        // 3 rows x 2 horizontal + 3 cols x 2 vertical neighbours
        assert_eq!(edges.len(), 12);
        assert!(edges.iter().all(|e| e.a < e.b && e.weight == 30.0));
        assert!(!edges.iter().any(|e| e.a == 0 && e.b == 4));
    }

    #[test]
    fn test_zero_cells_rejected() {
        assert!(GridMethod::new(0, 3).is_err());
        assert!(GridMethod::new(2, 0).is_err());
    }

    #[test]
    fn test_tiny_page_skips_empty_cells() {
        let (geometry, mask) = page(2, 10);
        let input = RegionInput::new(&geometry, &mask);
        let cells = GridMethod::new(1, 4).unwrap().zones(&input);
        assert_eq!(cells.len(), 2);
    }

    #[test]
    fn test_oversized_grid_stops_at_pixels() {
        let (geometry, mask) = page(6, 4);
        let input = RegionInput::new(&geometry, &mask);
        let cells = GridMethod::new(u32::MAX, u32::MAX).unwrap().zones(&input);
        assert_eq!(cells.len(), 24);
        assert!(cells.iter().all(|c| c.area() == 1));
        assert_eq!(GridMethod::new(u32::MAX, 2).unwrap().zones(&input).len(), 8);
    }
}
