//! Line segment type.
//!
//! A [`Line`] is a directed segment from `a` to `b`. [`ThickLine`] additionally
//! carries an extrusion width at each endpoint and is produced by the medial axis.

use super::{directions_parallel, Point, PointF, Polyline, Vector};
use crate::{unscale, Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// A line segment defined by two endpoints.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    pub a: Point,
    pub b: Point,
}

impl Line {
    /// Create a new line segment from two points.
    #[inline]
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Create a line from coordinates.
    #[inline]
    pub const fn from_coords(ax: Coord, ay: Coord, bx: Coord, by: Coord) -> Self {
        Self {
            a: Point::new(ax, ay),
            b: Point::new(bx, by),
        }
    }

    /// Get the direction vector (b - a).
    #[inline]
    pub fn vector(&self) -> Vector {
        self.b - self.a
    }

    /// Get the direction vector as floating-point.
    #[inline]
    pub fn vector_f(&self) -> PointF {
        self.b.to_f64() - self.a.to_f64()
    }

    /// Get the normal vector `(dy, -dx)`, pointing to the right of the line.
    #[inline]
    pub fn normal(&self) -> Vector {
        let v = self.vector();
        Point::new(v.y, -v.x)
    }

    /// Get the midpoint of the line segment.
    #[inline]
    pub fn midpoint(&self) -> Point {
        Point::new((self.a.x + self.b.x) / 2, (self.a.y + self.b.y) / 2)
    }

    #[inline]
    pub fn length(&self) -> CoordF {
        self.a.distance(&self.b)
    }

    /// Check if this line segment is a point (zero length).
    #[inline]
    pub fn is_point(&self) -> bool {
        self.a == self.b
    }

    /// Return the segment with swapped endpoints.
    #[inline]
    pub fn reversed(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
        }
    }

    /// Swap the endpoints in place.
    #[inline]
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.a, &mut self.b);
    }

    /// Point at `distance` from `a` along the line. Negative distances and
    /// distances beyond the length extrapolate.
    pub fn point_at(&self, distance: CoordF) -> Point {
        let len = self.length();
        if len == 0.0 {
            return self.a;
        }
        let t = distance / len;
        Point::from_f64_round(
            self.a.x as CoordF + (self.b.x - self.a.x) as CoordF * t,
            self.a.y as CoordF + (self.b.y - self.a.y) as CoordF * t,
        )
    }

    /// Distance from a point to this segment.
    #[inline]
    pub fn distance_to(&self, p: &Point) -> CoordF {
        p.distance_to_line(self)
    }

    /// Check whether both endpoints coincide exactly with another line's.
    #[inline]
    pub fn coincides_with(&self, other: &Line) -> bool {
        self.a == other.a && self.b == other.b
    }

    /// Check if a point lies on this segment within `tolerance`.
    pub fn contains_point(&self, p: &Point, tolerance: Coord) -> bool {
        self.distance_to(p) <= tolerance as CoordF
    }

    /// Check whether this segment fully contains `other` (both endpoints within
    /// `tolerance` of this segment, and no shared endpoint).
    pub fn contains_line(&self, other: &Line, tolerance: Coord) -> bool {
        if self.coincides_with(other) {
            return false;
        }
        let on_self = |p: &Point| {
            self.contains_point(p, tolerance)
                && !p.coincides_with(&self.a, tolerance)
                && !p.coincides_with(&self.b, tolerance)
        };
        on_self(&other.a) && on_self(&other.b)
    }

    /// Overlapping part of two collinear segments, if they overlap over a
    /// non-zero length and are not identical.
    pub fn overlap_with(&self, other: &Line, tolerance: Coord) -> Option<Line> {
        if self.coincides_with(other) {
            return None;
        }
        let tol = tolerance as CoordF;
        let a = if other.distance_to(&self.a) < tol {
            self.a
        } else if self.distance_to(&other.a) < tol {
            other.a
        } else {
            return None;
        };
        let b = if other.distance_to(&self.b) < tol {
            self.b
        } else if self.distance_to(&other.b) < tol {
            other.b
        } else {
            return None;
        };
        let overlap = Line::new(a, b);
        if overlap.is_point() {
            None
        } else {
            Some(overlap)
        }
    }

    /// Intersection point of two segments (endpoints included).
    pub fn intersection(&self, other: &Line) -> Option<Point> {
        let d1 = self.vector();
        let d2 = other.vector();

        let cross = d1.cross(&d2);
        if cross == 0 {
            return None;
        }

        let diff = other.a - self.a;
        let t = diff.cross(&d2) as CoordF / cross as CoordF;
        let u = diff.cross(&d1) as CoordF / cross as CoordF;

        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(Point::from_f64_round(
                self.a.x as CoordF + t * d1.x as CoordF,
                self.a.y as CoordF + t * d1.y as CoordF,
            ))
        } else {
            None
        }
    }

    /// Intersection point of the two infinite lines through the segments.
    pub fn intersection_infinite(&self, other: &Line) -> Option<Point> {
        let d1 = self.vector();
        let d2 = other.vector();

        let cross = d1.cross(&d2);
        if cross == 0 {
            return None;
        }

        let diff = other.a - self.a;
        let t = diff.cross(&d2) as CoordF / cross as CoordF;

        Some(Point::from_f64_round(
            self.a.x as CoordF + t * d1.x as CoordF,
            self.a.y as CoordF + t * d1.y as CoordF,
        ))
    }

    /// Angle from the positive x-axis in `(-π, π]`.
    #[inline]
    pub fn angle(&self) -> CoordF {
        let dir = self.vector();
        (dir.y as CoordF).atan2(dir.x as CoordF)
    }

    /// Angle normalised to `[0, 2π)`.
    pub fn orientation(&self) -> CoordF {
        let angle = self.angle();
        if angle < 0.0 {
            angle + 2.0 * PI
        } else {
            angle
        }
    }

    /// Undirected angle normalised to `[0, π)`.
    pub fn direction_angle(&self) -> CoordF {
        let angle = self.angle();
        if (angle - PI).abs() < 1e-12 {
            0.0
        } else if angle < 0.0 {
            angle + PI
        } else {
            angle
        }
    }

    /// Check whether the line runs along the given undirected angle.
    #[inline]
    pub fn parallel_to(&self, angle: CoordF) -> bool {
        directions_parallel(self.direction_angle(), angle, 0.0)
    }

    #[inline]
    pub fn parallel_to_line(&self, other: &Line) -> bool {
        self.parallel_to(other.direction_angle())
    }

    /// Orientation of a point relative to this line; positive to the left.
    #[inline]
    pub fn ccw(&self, p: &Point) -> i128 {
        p.ccw(&self.a, &self.b)
    }

    /// Move `a` backwards along the line by `distance`.
    pub fn extend_start(&mut self, distance: CoordF) {
        self.a = self.point_at(-distance);
    }

    /// Move `b` forwards along the line by `distance`.
    pub fn extend_end(&mut self, distance: CoordF) {
        self.b = self.reversed().point_at(-distance);
    }

    pub fn translate(&mut self, v: Vector) {
        self.a.translate(v);
        self.b.translate(v);
    }

    pub fn scale(&mut self, factor: CoordF) {
        self.a.scale(factor);
        self.b.scale(factor);
    }

    /// Rotate both endpoints about a center point.
    pub fn rotate(&mut self, angle: CoordF, center: Point) {
        self.a = self.a.rotate_around(angle, center);
        self.b = self.b.rotate_around(angle, center);
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line({:?} -> {:?})", self.a, self.b)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[({:.6}, {:.6}) -> ({:.6}, {:.6})]",
            unscale(self.a.x),
            unscale(self.a.y),
            unscale(self.b.x),
            unscale(self.b.y)
        )
    }
}

impl From<(Point, Point)> for Line {
    #[inline]
    fn from((a, b): (Point, Point)) -> Self {
        Self { a, b }
    }
}

impl From<Line> for Polyline {
    fn from(line: Line) -> Self {
        Polyline::from_points(vec![line.a, line.b])
    }
}

/// Type alias for a collection of lines.
pub type Lines = Vec<Line>;

/// A line segment with an extrusion width at each endpoint (scaled units).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThickLine {
    pub line: Line,
    pub a_width: CoordF,
    pub b_width: CoordF,
}

impl ThickLine {
    pub fn new(a: Point, b: Point, a_width: CoordF, b_width: CoordF) -> Self {
        Self {
            line: Line::new(a, b),
            a_width,
            b_width,
        }
    }
}

pub type ThickLines = Vec<ThickLine>;
