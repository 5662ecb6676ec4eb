//! Behaviour shared by open and closed point chains.
//!
//! [`MultiPoint`] is implemented by [`Polyline`](super::Polyline) and
//! [`Polygon`](super::Polygon). Implementors supply storage access and their
//! segment list; everything else has a default built on those.

use super::{BoundingBox, Line, Lines, Point, Vector};
use crate::{Coord, CoordF};

pub trait MultiPoint {
    fn points(&self) -> &[Point];

    fn points_mut(&mut self) -> &mut Vec<Point>;

    /// Segments of the chain. Closed chains include the closing segment.
    fn lines(&self) -> Lines;

    /// Point where traversal ends. Closed chains end at their first point.
    fn last_point(&self) -> Point;

    #[inline]
    fn first_point(&self) -> Point {
        self.points()[0]
    }

    /// At least two points.
    #[inline]
    fn is_valid(&self) -> bool {
        self.points().len() >= 2
    }

    fn length(&self) -> CoordF {
        self.lines().iter().map(Line::length).sum()
    }

    fn reverse(&mut self) {
        self.points_mut().reverse();
    }

    /// Index of the first point exactly equal to `point`.
    fn find_point(&self, point: &Point) -> Option<usize> {
        self.points().iter().position(|p| p == point)
    }

    /// Check whether `point` lies on any segment within `tolerance`.
    fn has_boundary_point(&self, point: &Point, tolerance: Coord) -> bool {
        self.lines()
            .iter()
            .any(|line| line.contains_point(point, tolerance))
    }

    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.points())
    }

    /// Check for consecutive exact duplicates.
    fn has_duplicate_points(&self) -> bool {
        self.points().windows(2).any(|w| w[0] == w[1])
    }

    /// Remove consecutive exact duplicates. Returns true if any were removed.
    fn remove_duplicate_points(&mut self) -> bool {
        let points = self.points_mut();
        let before = points.len();
        points.dedup();
        points.len() != before
    }

    #[inline]
    fn append(&mut self, point: Point) {
        self.points_mut().push(point);
    }

    fn append_points(&mut self, points: &[Point]) {
        self.points_mut().extend_from_slice(points);
    }

    /// Insert `point` into the segment it lies on (within `tolerance`).
    /// Returns false if no segment contains it.
    fn insert(&mut self, point: Point, tolerance: Coord) -> bool {
        let hit = self
            .lines()
            .iter()
            .position(|line| line.contains_point(&point, tolerance));
        match hit {
            Some(i) => {
                self.points_mut().insert(i + 1, point);
                true
            }
            None => false,
        }
    }

    /// Any intersection of the chain with `line`.
    fn intersection(&self, line: &Line) -> Option<Point> {
        self.lines().iter().find_map(|seg| seg.intersection(line))
    }

    /// Intersection closest to `line.a`, with a flag that is true when
    /// `line.a` lies to the left of the segment that was hit.
    fn first_intersection(&self, line: &Line) -> Option<(Point, bool)> {
        let mut best: Option<(Point, bool, i128)> = None;
        for seg in self.lines() {
            if let Some(p) = seg.intersection(line) {
                let dist = line.a.distance_squared(&p);
                if best.map_or(true, |(_, _, d)| dist < d) {
                    best = Some((p, seg.ccw(&line.a) > 0, dist));
                }
            }
        }
        best.map(|(p, ccw, _)| (p, ccw))
    }

    /// Subdivide every segment longer than `max_segment_length` into equal
    /// parts. Returns true if any point was inserted.
    fn upsample(&mut self, max_segment_length: CoordF) -> bool {
        if max_segment_length <= 0.0 {
            return false;
        }
        let lines = self.lines();
        let closed = lines.len() == self.points().len();
        let mut out = Vec::with_capacity(self.points().len());
        let mut inserted = false;

        for line in &lines {
            out.push(line.a);
            let len = line.length();
            let pieces = (len / max_segment_length).ceil() as usize;
            for k in 1..pieces {
                out.push(line.point_at(len * k as CoordF / pieces as CoordF));
                inserted = true;
            }
        }
        if !closed {
            if let Some(last) = lines.last() {
                out.push(last.b);
            }
        }
        if inserted {
            *self.points_mut() = out;
        }
        inserted
    }

    fn scale(&mut self, factor: CoordF) {
        for p in self.points_mut().iter_mut() {
            p.scale(factor);
        }
    }

    fn translate(&mut self, v: Vector) {
        for p in self.points_mut().iter_mut() {
            p.translate(v);
        }
    }

    /// Rotate about the origin.
    fn rotate(&mut self, angle: CoordF) {
        for p in self.points_mut().iter_mut() {
            *p = p.rotate(angle);
        }
    }

    fn rotate_around(&mut self, angle: CoordF, center: Point) {
        for p in self.points_mut().iter_mut() {
            *p = p.rotate_around(angle, center);
        }
    }
}
