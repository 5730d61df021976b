//! World-space boxes for hit-testing and layout.
//!
//! Nodes may be rotated by their transforms, so world-space bounds are always
//! the axis-aligned hull of the transformed corners. Hit-testing and fitting
//! imported content both work on these hulls.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned box; `min` is the corner nearest the canvas origin.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    /// Takes the corners as given. See [`from_corners`](Self::from_corners)
    /// for unordered input.
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// A negative size extends the box the other way from `origin`.
    pub fn from_origin_size(origin: DVec2, size: DVec2) -> Self {
        Self::from_corners(origin, origin + size)
    }

    pub fn from_center_size(center: DVec2, size: DVec2) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn from_corners(a: DVec2, b: DVec2) -> Self {
        Self::new(a.min(b), a.max(b))
    }

    /// Smallest bounds containing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = DVec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |acc, p| {
            Self::new(acc.min.min(p), acc.max.max(p))
        }))
    }

    pub fn zero() -> Self {
        Self::new(DVec2::ZERO, DVec2::ZERO)
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn width(&self) -> f64 {
        self.size().x
    }

    pub fn height(&self) -> f64 {
        self.size().y
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Edges count as inside.
    pub fn contains_point(&self, point: DVec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Corners in winding order starting at `min`.
    pub fn corners(&self) -> [DVec2; 4] {
        let Self { min, max } = *self;
        [min, DVec2::new(max.x, min.y), max, DVec2::new(min.x, max.y)]
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_size_and_center() {
        let bounds = Bounds::from_origin_size(DVec2::new(10.0, 20.0), DVec2::new(100.0, 50.0));
        assert_eq!(bounds.min, DVec2::new(10.0, 20.0));
        assert_eq!(bounds.max, DVec2::new(110.0, 70.0));
        assert_eq!(bounds.size(), DVec2::new(100.0, 50.0));
        assert_eq!(bounds.center(), DVec2::new(60.0, 45.0));
    }

    #[test]
    fn test_negative_size_is_normalized() {
        let bounds = Bounds::from_origin_size(DVec2::new(10.0, 10.0), DVec2::new(-10.0, -5.0));
        assert_eq!(bounds.min, DVec2::new(0.0, 5.0));
        assert_eq!(bounds.max, DVec2::new(10.0, 10.0));
    }

    #[test]
    fn test_from_points() {
        assert!(Bounds::from_points(Vec::<DVec2>::new()).is_none());

        let bounds = Bounds::from_points([
            DVec2::new(3.0, -1.0),
            DVec2::new(-2.0, 4.0),
            DVec2::new(0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(bounds.min, DVec2::new(-2.0, -1.0));
        assert_eq!(bounds.max, DVec2::new(3.0, 4.0));
    }

    #[test]
    fn test_union_covers_both() {
        let left = Bounds::new(DVec2::new(-5.0, 0.0), DVec2::new(5.0, 10.0));
        let right = Bounds::new(DVec2::new(2.0, -3.0), DVec2::new(12.0, 4.0));
        assert_eq!(
            left.union(&right),
            Bounds::new(DVec2::new(-5.0, -3.0), DVec2::new(12.0, 10.0))
        );
    }

    #[test]
    fn test_contains_point_includes_edges() {
        let bounds = Bounds::new(DVec2::new(10.0, 20.0), DVec2::new(110.0, 70.0));
        for corner in bounds.corners() {
            assert!(bounds.contains_point(corner));
        }
        assert!(bounds.contains_point(bounds.center()));
        assert!(!bounds.contains_point(DVec2::new(5.0, 40.0)));
        assert!(!bounds.contains_point(DVec2::new(60.0, 70.5)));
    }
}
