//! Closed polygon type.
//!
//! A [`Polygon`] is a closed ring of points. The closing segment from the last
//! point back to the first is implicit; the first point is never repeated.

use super::{Line, Lines, MultiPoint, Point, Polyline};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};

#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Axis-aligned rectangle with counter-clockwise winding.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::from_points(vec![
            min,
            Point::new(max.x, min.y),
            max,
            Point::new(min.x, max.y),
        ])
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Twice the signed area as an exact integer. Positive for counter-clockwise rings.
    pub fn signed_area_2x(&self) -> i128 {
        let n = self.points.len();
        if n < 3 {
            return 0;
        }
        (0..n)
            .map(|i| self.points[i].cross(&self.points[(i + 1) % n]))
            .sum()
    }

    /// Signed area in scaled units squared.
    #[inline]
    pub fn area(&self) -> CoordF {
        self.signed_area_2x() as CoordF / 2.0
    }

    #[inline]
    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area_2x() > 0
    }

    #[inline]
    pub fn is_clockwise(&self) -> bool {
        self.signed_area_2x() < 0
    }

    /// Reverse if clockwise. Returns true if the ring was reversed.
    pub fn make_counter_clockwise(&mut self) -> bool {
        if self.is_clockwise() {
            self.points.reverse();
            true
        } else {
            false
        }
    }

    /// Reverse if counter-clockwise. Returns true if the ring was reversed.
    pub fn make_clockwise(&mut self) -> bool {
        if self.is_counter_clockwise() {
            self.points.reverse();
            true
        } else {
            false
        }
    }

    /// Even-odd point containment. Points exactly on the boundary may go either way.
    pub fn contains_point(&self, p: &Point) -> bool {
        let n = self.points.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let pi = self.points[i];
            let pj = self.points[j];
            if (pi.y > p.y) != (pj.y > p.y) {
                // x of the edge at p.y, compared without division.
                let lhs = (p.x - pi.x) as i128 * (pj.y - pi.y) as i128;
                let rhs = (pj.x - pi.x) as i128 * (p.y - pi.y) as i128;
                if (pj.y > pi.y) == (lhs < rhs) {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Open the ring at point `index`, returning a polyline that starts and
    /// ends at that point.
    pub fn split_at_index(&self, index: usize) -> Polyline {
        let mut points = Vec::with_capacity(self.points.len() + 1);
        points.extend_from_slice(&self.points[index..]);
        points.extend_from_slice(&self.points[..=index]);
        Polyline::from_points(points)
    }

    #[inline]
    pub fn split_at_first_point(&self) -> Polyline {
        self.split_at_index(0)
    }

    /// Mean of the vertices.
    pub fn centroid(&self) -> Point {
        if self.points.is_empty() {
            return Point::zero();
        }
        let n = self.points.len() as i128;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0i128, 0i128), |(sx, sy), p| (sx + p.x as i128, sy + p.y as i128));
        Point::new((sx / n) as i64, (sy / n) as i64)
    }
}

impl MultiPoint for Polygon {
    #[inline]
    fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.points
    }

    fn lines(&self) -> Lines {
        let n = self.points.len();
        if n < 2 {
            return Vec::new();
        }
        (0..n)
            .map(|i| Line::new(self.points[i], self.points[(i + 1) % n]))
            .collect()
    }

    #[inline]
    fn last_point(&self) -> Point {
        self.points[0]
    }
}

impl fmt::Debug for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polygon({} points)", self.points.len())
    }
}

impl Deref for Polygon {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl DerefMut for Polygon {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.points
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

impl FromIterator<Point> for Polygon {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

pub type Polygons = Vec<Polygon>;
