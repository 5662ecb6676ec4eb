//! Open paths.
//!
//! [`Polyline`] is an open chain of points. [`ThickPolyline`] adds a width at
//! every point and records which endpoints are free (not attached to anything).

use super::{douglas_peucker, Line, Lines, MultiPoint, Point, ThickLine, ThickLines};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut, Index, IndexMut};

/// An open polyline defined by a sequence of points.
///
/// Unlike a Polygon, a Polyline is not implicitly closed - it's a path from
/// the first point to the last point.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    /// Create a new empty polyline.
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a polyline from a vector of points.
    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Create a polyline with the given capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.points
    }

    #[inline]
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    #[inline]
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Get the line segment at the given index (from point[i] to point[i+1]).
    #[inline]
    pub fn edge(&self, index: usize) -> Line {
        Line::new(self.points[index], self.points[index + 1])
    }

    /// Return a reversed copy of the polyline.
    pub fn reversed(&self) -> Self {
        let mut result = self.clone();
        result.points.reverse();
        result
    }

    /// Point at `distance` along the path. Clamped to the endpoints.
    pub fn point_at(&self, distance: CoordF) -> Option<Point> {
        let mut remaining = distance.max(0.0);
        for line in self.lines() {
            let len = line.length();
            if remaining <= len {
                return Some(line.point_at(remaining));
            }
            remaining -= len;
        }
        self.points.last().copied()
    }

    /// Prolong the first segment backwards by `distance`.
    pub fn extend_start(&mut self, distance: CoordF) {
        if self.points.len() < 2 {
            return;
        }
        let mut first = Line::new(self.points[0], self.points[1]);
        first.extend_start(distance);
        self.points[0] = first.a;
    }

    /// Prolong the last segment forwards by `distance`.
    pub fn extend_end(&mut self, distance: CoordF) {
        let n = self.points.len();
        if n < 2 {
            return;
        }
        let mut last = Line::new(self.points[n - 2], self.points[n - 1]);
        last.extend_end(distance);
        self.points[n - 1] = last.b;
    }

    /// Remove `distance` of path from the start.
    ///
    /// A path shorter than `distance` collapses to its last point.
    pub fn clip_start(&mut self, distance: CoordF) {
        if distance <= 0.0 || self.points.len() < 2 {
            return;
        }
        let mut walked = 0.0;
        let cut = self.lines().into_iter().enumerate().find_map(|(i, seg)| {
            let len = seg.length();
            walked += len;
            (walked > distance).then(|| (i, seg.point_at(distance - (walked - len))))
        });
        match cut {
            Some((i, at)) => {
                self.points.drain(..i);
                self.points[0] = at;
            }
            None => {
                let tail = self.points[self.points.len() - 1];
                self.points.truncate(1);
                self.points[0] = tail;
            }
        }
    }

    /// Remove `distance` of path from the end.
    pub fn clip_end(&mut self, distance: CoordF) {
        self.points.reverse();
        self.clip_start(distance);
        self.points.reverse();
    }

    /// Split at point index, returning two polylines sharing that point.
    pub fn split_at(&self, index: usize) -> (Self, Self) {
        if index == 0 {
            return (Self::new(), self.clone());
        }
        if index >= self.points.len() {
            return (self.clone(), Self::new());
        }

        let first = Self::from_points(self.points[..=index].to_vec());
        let second = Self::from_points(self.points[index..].to_vec());

        (first, second)
    }

    /// Douglas-Peucker simplification in scaled units.
    pub fn simplify(&mut self, tolerance: CoordF) {
        self.points = douglas_peucker(&self.points, tolerance);
    }
}

impl MultiPoint for Polyline {
    #[inline]
    fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.points
    }

    fn lines(&self) -> Lines {
        self.points
            .windows(2)
            .map(|w| Line::new(w[0], w[1]))
            .collect()
    }

    #[inline]
    fn last_point(&self) -> Point {
        self.points[self.points.len() - 1]
    }
}

impl fmt::Debug for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polyline({} points)", self.points.len())
    }
}

impl fmt::Display for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polyline[")?;
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, "]")
    }
}

impl Deref for Polyline {
    type Target = [Point];

    fn deref(&self) -> &Self::Target {
        &self.points
    }
}

impl DerefMut for Polyline {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.points
    }
}

impl Index<usize> for Polyline {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl IndexMut<usize> for Polyline {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.points[index]
    }
}

impl FromIterator<Point> for Polyline {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Polyline {
    type Item = Point;
    type IntoIter = std::vec::IntoIter<Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a> IntoIterator for &'a Polyline {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a mut Polyline {
    type Item = &'a mut Point;
    type IntoIter = std::slice::IterMut<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter_mut()
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

impl From<Polyline> for Vec<Point> {
    fn from(polyline: Polyline) -> Self {
        polyline.into_points()
    }
}

/// Type alias for a collection of polylines.
pub type Polylines = Vec<Polyline>;

/// A polyline with a width (scaled units) at every point.
///
/// `endpoints.0` / `endpoints.1` are true when the first / last point is a
/// free end rather than a junction with other paths.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThickPolyline {
    pub points: Vec<Point>,
    pub width: Vec<CoordF>,
    pub endpoints: (bool, bool),
}

impl ThickPolyline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: Point, width: CoordF) {
        self.points.push(point);
        self.width.push(width);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn first_point(&self) -> Point {
        self.points[0]
    }

    #[inline]
    pub fn last_point(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn length(&self) -> CoordF {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    /// Reverse points, widths and endpoint flags together.
    pub fn reverse(&mut self) {
        self.points.reverse();
        self.width.reverse();
        self.endpoints = (self.endpoints.1, self.endpoints.0);
    }

    /// Segments with the widths at their two ends.
    pub fn thicklines(&self) -> ThickLines {
        self.points
            .windows(2)
            .zip(self.width.windows(2))
            .map(|(p, w)| ThickLine::new(p[0], p[1], w[0], w[1]))
            .collect()
    }

    /// Drop the width annotation.
    pub fn to_polyline(&self) -> Polyline {
        Polyline::from_points(self.points.clone())
    }

    /// Append `other`, which must start where this one ends.
    pub fn append(&mut self, other: &ThickPolyline) {
        let skip = usize::from(!self.points.is_empty());
        self.points.extend(other.points.iter().skip(skip));
        self.width.extend(other.width.iter().skip(skip));
        self.endpoints.1 = other.endpoints.1;
    }
}

pub type ThickPolylines = Vec<ThickPolyline>;

#[cfg(test)]
mod tests {
    use super::*;

    fn make_polyline() -> Polyline {
        Polyline::from_points(vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
        ])
    }

    #[test]
    fn test_polyline_from_points() {
        let pl = make_polyline();
        assert_eq!(pl.len(), 4);
        assert!(pl.is_valid());
        assert!(!Polyline::from_points(vec![Point::new(0, 0)]).is_valid());
    }

    #[test]
    fn test_polyline_lines_and_length() {
        let pl = make_polyline();
        assert_eq!(pl.lines().len(), 3);
        assert!((pl.length() - 300.0).abs() < 1e-9);
        assert_eq!(pl.edge(0), Line::from_coords(0, 0, 100, 0));
    }

    #[test]
    fn test_polyline_reverse() {
        let mut pl = make_polyline();
        pl.reverse();
        assert_eq!(pl.first_point(), Point::new(0, 100));
        assert_eq!(pl.last_point(), Point::new(0, 0));
    }

    #[test]
    fn test_polyline_clip() {
        let mut pl = make_polyline();
        pl.clip_start(50.0);
        assert_eq!(pl.first_point(), Point::new(50, 0));
        assert_eq!(pl.len(), 4);
        pl.clip_end(120.0);
        assert_eq!(pl.last_point(), Point::new(100, 80));
        assert_eq!(pl.len(), 3);

        let mut short = Polyline::from_points(vec![Point::new(0, 0), Point::new(10, 0)]);
        short.clip_end(20.0);
        assert_eq!(short.len(), 1);
        assert!(!short.is_valid());
    }

    #[test]
    fn test_polyline_extend() {
        let mut pl = Polyline::from_points(vec![Point::new(0, 0), Point::new(100, 0)]);
        pl.extend_start(10.0);
        pl.extend_end(5.0);
        assert_eq!(pl.first_point(), Point::new(-10, 0));
        assert_eq!(pl.last_point(), Point::new(105, 0));
    }

    #[test]
    fn test_polyline_split() {
        let pl = make_polyline();
        let (first, second) = pl.split_at(2);
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 2);
        assert_eq!(first.last_point(), second.first_point());
    }

    #[test]
    fn test_polyline_point_at() {
        let pl = make_polyline();
        assert_eq!(pl.point_at(150.0), Some(Point::new(100, 50)));
        assert_eq!(pl.point_at(1000.0), Some(Point::new(0, 100)));
    }

    #[test]
    fn test_polyline_simplify() {
        let mut pl = Polyline::from_points(vec![
            Point::new(0, 0),
            Point::new(50, 1),
            Point::new(100, 0),
        ]);
        pl.simplify(5.0);
        assert_eq!(pl.len(), 2);
    }

    #[test]
    fn test_thick_polyline() {
        let mut tp = ThickPolyline::new();
        tp.push(Point::new(0, 0), 10.0);
        tp.push(Point::new(100, 0), 20.0);
        tp.endpoints = (true, false);

        let mut tail = ThickPolyline::new();
        tail.push(Point::new(100, 0), 20.0);
        tail.push(Point::new(100, 50), 30.0);
        tail.endpoints = (false, true);

        tp.append(&tail);
        assert_eq!(tp.len(), 3);
        assert_eq!(tp.endpoints, (true, true));
        assert!((tp.length() - 150.0).abs() < 1e-9);

        let lines = tp.thicklines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].a_width, 20.0);
        assert_eq!(lines[1].b_width, 30.0);

        tp.endpoints = (true, false);
        tp.reverse();
        assert_eq!(tp.first_point(), Point::new(100, 50));
        assert_eq!(tp.width[0], 30.0);
        assert_eq!(tp.endpoints, (false, true));
    }
}
