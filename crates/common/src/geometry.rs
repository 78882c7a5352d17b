//! Axis-aligned boxes in page-pixel coordinates
//!
//! All geometry produced by segmentation and region detection uses the page's
//! own pixel grid: origin at the top-left corner, `x` to the right, `y` down.
//! Boxes are half-open: a box covers columns `x..x + width`.

use serde::{Deserialize, Serialize};

/// Bounding box in page-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBox {
    /// Left coordinate (x)
    pub x: u32,
    /// Top coordinate (y)
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl PixelBox {
    /// Create a new bounding box
    #[inline]
    #[must_use = "bounding box is created but not used"]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a box from half-open extents `[x0, x1) x [y0, y1)`
    ///
    /// Inverted extents collapse to an empty box at `(x0, y0)`.
    #[inline]
    #[must_use]
    pub const fn from_extents(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }

    /// Get the right edge coordinate (exclusive)
    #[inline]
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Get the bottom edge coordinate (exclusive)
    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Area in pixels
    #[inline]
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Center point
    #[inline]
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }

    /// A box with zero width or height carries no geometry
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Whether the box lies fully inside a `width` x `height` page
    #[inline]
    #[must_use]
    pub const fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }

    /// Smallest box covering both
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::from_extents(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Overlapping part of two boxes, if any
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        (x1 > x0 && y1 > y0).then(|| Self::from_extents(x0, y0, x1, y1))
    }

    /// Area shared by two boxes
    #[inline]
    #[must_use]
    pub fn intersection_area(&self, other: &Self) -> u64 {
        self.intersection(other).map_or(0, |b| b.area())
    }

    /// Number of columns covered by both boxes
    #[inline]
    #[must_use]
    pub fn horizontal_overlap(&self, other: &Self) -> u32 {
        self.right()
            .min(other.right())
            .saturating_sub(self.x.max(other.x))
    }

    /// Number of rows covered by both boxes
    #[inline]
    #[must_use]
    pub fn vertical_overlap(&self, other: &Self) -> u32 {
        self.bottom()
            .min(other.bottom())
            .saturating_sub(self.y.max(other.y))
    }

    /// Length of the edge two touching boxes share
    ///
    /// Returns 0 unless the boxes abut along a vertical or horizontal edge.
    #[must_use]
    pub fn shared_boundary(&self, other: &Self) -> u32 {
        if self.right() == other.x || other.right() == self.x {
            self.vertical_overlap(other)
        } else if self.bottom() == other.y || other.bottom() == self.y {
            self.horizontal_overlap(other)
        } else {
            0
        }
    }

    /// Euclidean distance between box centers
    #[must_use]
    pub fn center_distance(&self, other: &Self) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).hypot(ay - by)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_box_edges() {
        let b = PixelBox::new(10, 20, 100, 50);
        assert_eq!(b.right(), 110);
        assert_eq!(b.bottom(), 70);
        assert_eq!(b.area(), 5000);
        assert_eq!(b.center(), (60.0, 45.0));
        assert!(b.is_valid());
        assert!(!PixelBox::new(0, 0, 0, 5).is_valid());
    }

    #[test]
    fn test_from_extents_inverted_is_empty() {
        let b = PixelBox::from_extents(10, 10, 5, 20);
        assert_eq!(b.width, 0);
        assert!(!b.is_valid());
    }

    #[test]
    fn test_union_and_intersection() {
        let a = PixelBox::new(0, 0, 10, 10);
        let b = PixelBox::new(5, 5, 10, 10);
        assert_eq!(a.union(&b), PixelBox::new(0, 0, 15, 15));
        assert_eq!(a.intersection(&b), Some(PixelBox::new(5, 5, 5, 5)));
        assert_eq!(a.intersection_area(&b), 25);

        let far = PixelBox::new(50, 50, 5, 5);
        assert_eq!(a.intersection(&far), None);
        assert_eq!(a.intersection_area(&far), 0);
    }

    #[test]
    fn test_shared_boundary() {
        let left = PixelBox::new(0, 0, 10, 20);
        let right = PixelBox::new(10, 5, 10, 20);
        assert_eq!(left.shared_boundary(&right), 15);

        let below = PixelBox::new(2, 20, 4, 4);
        assert_eq!(left.shared_boundary(&below), 4);

        let apart = PixelBox::new(30, 0, 5, 5);
        assert_eq!(left.shared_boundary(&apart), 0);
    }

    #[test]
    fn test_overlaps() {
        let a = PixelBox::new(0, 0, 10, 10);
        let b = PixelBox::new(6, 8, 10, 10);
        assert_eq!(a.horizontal_overlap(&b), 4);
        assert_eq!(a.vertical_overlap(&b), 2);
        assert!((a.center_distance(&b) - (6.0f64.hypot(8.0))).abs() < 1e-9);
    }
}
