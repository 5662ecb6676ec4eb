//! Geometry primitives.
//!
//! - [`Point`] / [`PointF`]: scaled integer and floating-point points
//! - [`Line`] / [`ThickLine`]: segments, optionally with endpoint widths
//! - [`MultiPoint`]: behaviour shared by [`Polygon`] and [`Polyline`]
//! - [`ExPolygon`] / [`ExPolygonCollection`]: regions with holes
//! - [`BoundingBox`]: axis-aligned bounds
//! - [`MedialAxis`]: width-bounded skeleton extraction over a [`voronoi`] diagram
//!
//! ## Coordinate System
//!
//! Coordinates are scaled integers (`SCALING_FACTOR` units per millimetre).
//! Use `scale()` / `unscale()` at the crate root, or a `Tolerances` value, to convert.

mod bounding_box;
mod expolygon;
mod expolygon_collection;
mod line;
pub mod medial_axis;
mod multi_point;
mod point;
mod polygon;
mod polyline;
pub mod simplify;
pub mod voronoi;

pub use bounding_box::BoundingBox;
pub use expolygon::{ExPolygon, ExPolygons};
pub use expolygon_collection::{BoundaryHit, BoundaryRef, ExPolygonCollection};
pub use line::{Line, Lines, ThickLine, ThickLines};
pub use medial_axis::MedialAxis;
pub use multi_point::MultiPoint;
pub use point::{Point, PointF, Points, Vector};
pub use polygon::{Polygon, Polygons};
pub use polyline::{Polyline, Polylines, ThickPolyline, ThickPolylines};
pub use simplify::{douglas_peucker, douglas_peucker_polygon};

use crate::{Coord, CoordF};
use std::f64::consts::PI;

/// Calculate the cross product of two 2D vectors (returns a scalar).
#[inline]
pub fn cross2(v1: Point, v2: Point) -> i128 {
    v1.x as i128 * v2.y as i128 - v1.y as i128 * v2.x as i128
}

/// Linear interpolation between two points.
#[inline]
pub fn lerp(a: Point, b: Point, t: CoordF) -> Point {
    Point::new(
        (a.x as CoordF + (b.x - a.x) as CoordF * t).round() as Coord,
        (a.y as CoordF + (b.y - a.y) as CoordF * t).round() as Coord,
    )
}

/// Check if a value is approximately equal to another within epsilon.
#[inline]
pub fn approx_eq(a: CoordF, b: CoordF, epsilon: CoordF) -> bool {
    (a - b).abs() < epsilon
}

#[inline]
pub fn deg2rad(degrees: CoordF) -> CoordF {
    degrees * PI / 180.0
}

#[inline]
pub fn rad2deg(radians: CoordF) -> CoordF {
    radians * 180.0 / PI
}

/// Check whether two undirected angles in `[0, π)` describe parallel directions,
/// within `max_diff` radians.
pub fn directions_parallel(angle1: CoordF, angle2: CoordF, max_diff: CoordF) -> bool {
    let max_diff = max_diff + 1e-9;
    let diff = (angle1 - angle2).abs();
    diff < max_diff || (diff - PI).abs() < max_diff
}

/// Orientation of three points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Counter-clockwise (left turn)
    CounterClockwise,
    /// Clockwise (right turn)
    Clockwise,
    /// Collinear (no turn)
    Collinear,
}

/// Determine the orientation of three points.
pub fn orientation(p1: Point, p2: Point, p3: Point) -> Orientation {
    let cross = cross2(p2 - p1, p3 - p2);
    if cross > 0 {
        Orientation::CounterClockwise
    } else if cross < 0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

/// Counter-clockwise convex hull (monotone chain). Collinear points are dropped.
pub fn convex_hull(points: &[Point]) -> Polygon {
    let mut pts = points.to_vec();
    pts.sort();
    pts.dedup();
    if pts.len() < 3 {
        return Polygon::from_points(pts);
    }

    let mut hull: Vec<Point> = Vec::with_capacity(pts.len() * 2);
    for pass in 0..2 {
        let start = hull.len();
        let iter: Box<dyn Iterator<Item = &Point>> = if pass == 0 {
            Box::new(pts.iter())
        } else {
            Box::new(pts.iter().rev())
        };
        for &p in iter {
            while hull.len() >= start + 2
                && orientation(hull[hull.len() - 2], hull[hull.len() - 1], p)
                    != Orientation::CounterClockwise
            {
                hull.pop();
            }
            hull.push(p);
        }
        // The last point of each chain starts the next one.
        hull.pop();
    }
    Polygon::from_points(hull)
}

/// Greedy nearest-neighbour visiting order of `points`, starting from the
/// point closest to `start_near`, or from the first point.
pub fn chained_path(points: &[Point], start_near: Option<Point>) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut order = Vec::with_capacity(points.len());
    let mut current = match start_near {
        Some(p) => p,
        None => match points.first() {
            Some(&p) => p,
            None => return order,
        },
    };
    while !remaining.is_empty() {
        let mut best = 0;
        for pos in 1..remaining.len() {
            if points[remaining[pos]].distance_squared(&current)
                < points[remaining[best]].distance_squared(&current)
            {
                best = pos;
            }
        }
        let idx = remaining.remove(best);
        current = points[idx];
        order.push(idx);
    }
    order
}
