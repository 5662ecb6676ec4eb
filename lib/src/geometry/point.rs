//! Point and vector types.
//!
//! [`Point`] stores scaled integer coordinates and doubles as a vector
//! (coordinate difference). [`PointF`] is the unscaled floating-point form.

use super::Line;
use crate::{scale, unscale, Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A 2D point with scaled integer coordinates.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

/// A vector is a coordinate difference between two points.
pub type Vector = Point;

impl Point {
    /// Create a new point from scaled coordinates.
    #[inline]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Create a point from millimetre coordinates using the default scaling factor.
    #[inline]
    pub fn new_scale(x: CoordF, y: CoordF) -> Self {
        Self {
            x: scale(x),
            y: scale(y),
        }
    }

    /// Create a point from floating-point scaled coordinates, rounding to the grid.
    #[inline]
    pub fn from_f64_round(x: CoordF, y: CoordF) -> Self {
        Self {
            x: x.round() as Coord,
            y: y.round() as Coord,
        }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_squared(&self, other: &Point) -> i128 {
        let dx = (other.x - self.x) as i128;
        let dy = (other.y - self.y) as i128;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point) -> CoordF {
        (self.distance_squared(other) as CoordF).sqrt()
    }

    /// Distance from this point to a line segment.
    #[inline]
    pub fn distance_to_line(&self, line: &Line) -> CoordF {
        self.distance(&self.project_onto_segment(line.a, line.b))
    }

    /// Length of this point interpreted as a vector.
    #[inline]
    pub fn length(&self) -> CoordF {
        (self.length_squared() as CoordF).sqrt()
    }

    #[inline]
    pub fn length_squared(&self) -> i128 {
        self.x as i128 * self.x as i128 + self.y as i128 * self.y as i128
    }

    /// 2D cross product of two vectors.
    #[inline]
    pub fn cross(&self, other: &Point) -> i128 {
        self.x as i128 * other.y as i128 - self.y as i128 * other.x as i128
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(&self, other: &Point) -> i128 {
        self.x as i128 * other.x as i128 + self.y as i128 * other.y as i128
    }

    /// Orientation of this point relative to the directed segment `a -> b`.
    ///
    /// Positive when the point lies to the left of the segment.
    #[inline]
    pub fn ccw(&self, a: &Point, b: &Point) -> i128 {
        (*b - *a).cross(&(*self - *a))
    }

    /// Check whether two points are within `tolerance` of each other on both axes.
    #[inline]
    pub fn coincides_with(&self, other: &Point, tolerance: Coord) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }

    /// Rotate about the origin.
    pub fn rotate(&self, angle: CoordF) -> Self {
        let (s, c) = angle.sin_cos();
        let x = self.x as CoordF;
        let y = self.y as CoordF;
        Self::from_f64_round(c * x - s * y, s * x + c * y)
    }

    /// Rotate about a center point.
    pub fn rotate_around(&self, angle: CoordF, center: Point) -> Self {
        (*self - center).rotate(angle) + center
    }

    /// Rotate by 90° counter-clockwise (exact).
    #[inline]
    pub fn rotate_90_ccw(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Project onto the segment `a -> b`, clamping to its endpoints.
    pub fn project_onto_segment(&self, a: Point, b: Point) -> Point {
        let ab = b - a;
        let len_sq = ab.length_squared();
        if len_sq == 0 {
            return a;
        }
        let t = (*self - a).dot(&ab) as CoordF / len_sq as CoordF;
        if t <= 0.0 {
            a
        } else if t >= 1.0 {
            b
        } else {
            Point::from_f64_round(
                a.x as CoordF + t * ab.x as CoordF,
                a.y as CoordF + t * ab.y as CoordF,
            )
        }
    }

    #[inline]
    pub fn translate(&mut self, v: Vector) {
        self.x += v.x;
        self.y += v.y;
    }

    /// Scale both coordinates by a factor about the origin.
    #[inline]
    pub fn scale(&mut self, factor: CoordF) {
        *self = *self * factor;
    }

    #[inline]
    pub fn to_f64(&self) -> PointF {
        PointF::new(self.x as CoordF, self.y as CoordF)
    }

    /// Convert to millimetres with the default scaling factor.
    #[inline]
    pub fn to_unscaled(&self) -> PointF {
        PointF::new(unscale(self.x), unscale(self.y))
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    #[inline]
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    #[inline]
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Point {
    type Output = Point;

    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<CoordF> for Point {
    type Output = Point;

    #[inline]
    fn mul(self, rhs: CoordF) -> Point {
        Point::from_f64_round(self.x as CoordF * rhs, self.y as CoordF * rhs)
    }
}

impl From<(Coord, Coord)> for Point {
    #[inline]
    fn from((x, y): (Coord, Coord)) -> Self {
        Self::new(x, y)
    }
}

/// A 2D point with floating-point coordinates.
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: CoordF,
    pub y: CoordF,
}

impl PointF {
    #[inline]
    pub const fn new(x: CoordF, y: CoordF) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance_squared(&self, other: &PointF) -> CoordF {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn distance(&self, other: &PointF) -> CoordF {
        self.distance_squared(other).sqrt()
    }

    #[inline]
    pub fn length(&self) -> CoordF {
        self.x.hypot(self.y)
    }

    #[inline]
    pub fn perp(&self) -> PointF {
        PointF::new(-self.y, self.x)
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalize(&self) -> PointF {
        let len = self.length();
        if len > 0.0 {
            PointF::new(self.x / len, self.y / len)
        } else {
            PointF::default()
        }
    }

    /// Round to the scaled integer grid.
    #[inline]
    pub fn to_point(&self) -> Point {
        Point::from_f64_round(self.x, self.y)
    }
}

impl fmt::Debug for PointF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

impl Add for PointF {
    type Output = PointF;

    #[inline]
    fn add(self, rhs: PointF) -> PointF {
        PointF::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for PointF {
    type Output = PointF;

    #[inline]
    fn sub(self, rhs: PointF) -> PointF {
        PointF::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<CoordF> for PointF {
    type Output = PointF;

    #[inline]
    fn mul(self, rhs: CoordF) -> PointF {
        PointF::new(self.x * rhs, self.y * rhs)
    }
}

/// Type alias for a collection of points.
pub type Points = Vec<Point>;
