//! Axis-aligned bounding boxes.

use super::{Point, Polygon};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis-aligned bounding box in scaled coordinates.
///
/// A default-constructed box is undefined (empty) until a point is merged into it.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
    pub defined: bool,
}

impl BoundingBox {
    /// Create an empty (undefined) bounding box.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bounding box from two corners.
    pub fn from_corners(min: Point, max: Point) -> Self {
        Self {
            min: Point::new(min.x.min(max.x), min.y.min(max.y)),
            max: Point::new(min.x.max(max.x), min.y.max(max.y)),
            defined: true,
        }
    }

    /// Smallest box containing all points.
    pub fn from_points(points: &[Point]) -> Self {
        let mut bbox = Self::new();
        for p in points {
            bbox.merge_point(*p);
        }
        bbox
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.defined
    }

    /// Extend the box to include a point.
    pub fn merge_point(&mut self, p: Point) {
        if self.defined {
            self.min.x = self.min.x.min(p.x);
            self.min.y = self.min.y.min(p.y);
            self.max.x = self.max.x.max(p.x);
            self.max.y = self.max.y.max(p.y);
        } else {
            self.min = p;
            self.max = p;
            self.defined = true;
        }
    }

    /// Extend the box to include another box.
    pub fn merge(&mut self, other: &BoundingBox) {
        if other.defined {
            self.merge_point(other.min);
            self.merge_point(other.max);
        }
    }

    #[inline]
    pub fn width(&self) -> Coord {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> Coord {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn size(&self) -> Point {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            self.min.x + (self.max.x - self.min.x) / 2,
            self.min.y + (self.max.y - self.min.y) / 2,
        )
    }

    /// Length of the diagonal.
    #[inline]
    pub fn diagonal(&self) -> CoordF {
        self.min.distance(&self.max)
    }

    /// Check whether a point lies inside or on the border of the box.
    pub fn contains(&self, p: &Point) -> bool {
        self.defined
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
    }

    /// Check whether two boxes overlap (touching counts).
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.defined
            && other.defined
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Grow (or shrink, for negative deltas) the box on every side.
    pub fn offset(&mut self, delta: Coord) {
        if self.defined {
            self.min.x -= delta;
            self.min.y -= delta;
            self.max.x += delta;
            self.max.y += delta;
        }
    }

    /// The box outline as a counter-clockwise polygon.
    pub fn polygon(&self) -> Polygon {
        Polygon::from_points(vec![
            self.min,
            Point::new(self.max.x, self.min.y),
            self.max,
            Point::new(self.min.x, self.max.y),
        ])
    }
}

impl fmt::Debug for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.defined {
            write!(f, "BoundingBox({:?} - {:?})", self.min, self.max)
        } else {
            write!(f, "BoundingBox(empty)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_from_points() {
        let bbox = BoundingBox::from_points(&[
            Point::new(10, 20),
            Point::new(-5, 40),
            Point::new(30, 0),
        ]);
        assert_eq!(bbox.min, Point::new(-5, 0));
        assert_eq!(bbox.max, Point::new(30, 40));
        assert_eq!(bbox.width(), 35);
        assert_eq!(bbox.height(), 40);
    }

    #[test]
    fn test_bounding_box_empty_merge() {
        let mut a = BoundingBox::new();
        assert!(a.is_empty());
        a.merge(&BoundingBox::new());
        assert!(a.is_empty());
        a.merge(&BoundingBox::from_corners(Point::new(0, 0), Point::new(10, 10)));
        assert!(!a.is_empty());
        assert!(a.contains(&Point::new(10, 5)));
        assert!(!a.contains(&Point::new(11, 5)));
    }

    #[test]
    fn test_bounding_box_offset() {
        let mut bbox = BoundingBox::from_corners(Point::new(0, 0), Point::new(10, 10));
        bbox.offset(5);
        assert_eq!(bbox.min, Point::new(-5, -5));
        assert_eq!(bbox.max, Point::new(15, 15));
        assert_eq!(bbox.polygon().len(), 4);
    }
}
