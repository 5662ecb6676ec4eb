//! Polygons with holes.

use super::medial_axis::MedialAxis;
use super::{
    douglas_peucker_polygon, BoundingBox, Line, Lines, MultiPoint, Point, Polygon, Polygons,
    Polyline, Polylines, ThickPolylines, Vector,
};
use crate::clipper;
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};

/// Tolerance for treating a point as lying on a boundary when testing segment
/// containment. One grid unit absorbs the rounding of computed points.
const ON_BOUNDARY: Coord = 1;

/// An outer contour plus zero or more holes.
///
/// Holes are expected to lie fully inside the contour. Simplicity of the rings
/// is assumed, not checked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExPolygon {
    pub contour: Polygon,
    pub holes: Polygons,
}

impl ExPolygon {
    pub fn new(contour: Polygon) -> Self {
        Self {
            contour,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(contour: Polygon, holes: Polygons) -> Self {
        Self { contour, holes }
    }

    /// Unsigned area of the contour minus the holes.
    pub fn area(&self) -> CoordF {
        let holes: CoordF = self.holes.iter().map(|h| h.area().abs()).sum();
        self.contour.area().abs() - holes
    }

    pub fn is_valid(&self) -> bool {
        self.contour.len() >= 3 && self.holes.iter().all(|h| h.len() >= 3)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }

    /// Contour followed by the holes.
    pub fn rings(&self) -> impl Iterator<Item = &Polygon> {
        std::iter::once(&self.contour).chain(self.holes.iter())
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        self.contour.contains_point(p) && !self.holes.iter().any(|h| h.contains_point(p))
    }

    /// Point containment including points within `tolerance` of a boundary.
    pub fn contains_b(&self, p: &Point, tolerance: Coord) -> bool {
        self.contains_point(p) || self.has_boundary_point(p, tolerance)
    }

    pub fn has_boundary_point(&self, p: &Point, tolerance: Coord) -> bool {
        self.rings().any(|r| r.has_boundary_point(p, tolerance))
    }

    /// Check whether the segment lies inside the region. Endpoints may touch
    /// the boundary; crossing it is not allowed.
    pub fn contains_line(&self, line: &Line) -> bool {
        if !self.contains_b(&line.a, ON_BOUNDARY) || !self.contains_b(&line.b, ON_BOUNDARY) {
            return false;
        }
        let crosses = self
            .rings()
            .flat_map(|r| r.lines())
            .any(|edge| segments_cross(line, &edge));
        if crosses {
            return false;
        }
        let mid = line.midpoint();
        self.contains_b(&mid, ON_BOUNDARY)
    }

    pub fn contains_polyline(&self, polyline: &Polyline) -> bool {
        polyline.lines().iter().all(|l| self.contains_line(l))
    }

    /// Boundary segments of the contour and every hole.
    pub fn lines(&self) -> Lines {
        self.rings().flat_map(|r| r.lines()).collect()
    }

    /// Douglas-Peucker on every ring, dropping holes that degenerate.
    pub fn simplify_p(&self, tolerance: CoordF) -> Polygons {
        let mut out = Vec::with_capacity(self.holes.len() + 1);
        let mut contour = douglas_peucker_polygon(&self.contour, tolerance);
        contour.make_counter_clockwise();
        out.push(contour);
        for hole in &self.holes {
            let mut hole = douglas_peucker_polygon(hole, tolerance);
            if hole.len() >= 3 {
                hole.make_clockwise();
                out.push(hole);
            }
        }
        out
    }

    /// Simplify and re-normalize into well-formed regions.
    pub fn simplify(&self, tolerance: CoordF) -> Vec<ExPolygon> {
        clipper::union_polygons_ex(&self.simplify_p(tolerance))
    }

    /// Width-annotated skeleton of the region.
    pub fn medial_axis(&self, min_width: CoordF, max_width: CoordF) -> ThickPolylines {
        MedialAxis::new(self, min_width, max_width).build()
    }

    /// Skeleton without width annotation.
    pub fn medial_axis_polylines(&self, min_width: CoordF, max_width: CoordF) -> Polylines {
        MedialAxis::new(self, min_width, max_width).build_polylines()
    }

    pub fn translate(&mut self, v: Vector) {
        self.contour.translate(v);
        for h in &mut self.holes {
            h.translate(v);
        }
    }

    pub fn scale(&mut self, factor: CoordF) {
        self.contour.scale(factor);
        for h in &mut self.holes {
            h.scale(factor);
        }
    }

    pub fn rotate(&mut self, angle: CoordF, center: Point) {
        self.contour.rotate_around(angle, center);
        for h in &mut self.holes {
            h.rotate_around(angle, center);
        }
    }

    /// Every ring as a plain polygon.
    pub fn to_polygons(&self) -> Polygons {
        self.rings().cloned().collect()
    }
}

impl From<Polygon> for ExPolygon {
    fn from(contour: Polygon) -> Self {
        Self::new(contour)
    }
}

/// True when the segments cross at a single interior point of both.
fn segments_cross(s: &Line, t: &Line) -> bool {
    let d1 = s.ccw(&t.a).signum();
    let d2 = s.ccw(&t.b).signum();
    let d3 = t.ccw(&s.a).signum();
    let d4 = t.ccw(&s.b).signum();
    d1 * d2 < 0 && d3 * d4 < 0
}

pub type ExPolygons = Vec<ExPolygon>;
