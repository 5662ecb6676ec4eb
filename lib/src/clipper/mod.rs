//! Polygon boolean operations and offsets.
//!
//! Thin layer over `geo-clipper`. Coordinates are handed to Clipper as the raw
//! scaled integers (factor 1.0), so every distance here is in scaled units and
//! results land back on the same integer grid without rescaling.
//!
//! The `*_safe` variants apply a tiny outward offset first, following the usual
//! slicer convention: `union` grows the subject so touching regions merge,
//! while `difference` and `intersection` grow the clip so slivers along shared
//! edges disappear.

use crate::geometry::{ExPolygon, ExPolygons, Point, Polygon, Polygons};
use crate::{Coord, CoordF};
use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};

/// Clipper works on the scaled grid directly.
const FACTOR: f64 = 1.0;

/// Miter limit for mitered offsets, as a multiple of the delta.
const MITER_LIMIT: f64 = 3.0;

/// Join type for offset corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetJoinType {
    /// Square corners
    Square,
    /// Round corners
    #[default]
    Round,
    /// Mitered corners
    Miter,
}

impl OffsetJoinType {
    fn to_clipper(self, delta: CoordF) -> JoinType {
        match self {
            OffsetJoinType::Square => JoinType::Square,
            // Arc tolerance in grid units; proportional so large offsets stay cheap.
            OffsetJoinType::Round => JoinType::Round((delta.abs() * 0.005).max(0.25)),
            OffsetJoinType::Miter => JoinType::Miter(MITER_LIMIT),
        }
    }
}

fn ring_to_geo(points: &[Point], counter_clockwise: bool) -> LineString<f64> {
    let mut ring: Vec<GeoCoord<f64>> = points
        .iter()
        .map(|p| GeoCoord {
            x: p.x as f64,
            y: p.y as f64,
        })
        .collect();
    let reversed = Polygon::from_points(points.to_vec()).is_counter_clockwise() != counter_clockwise;
    if reversed {
        ring.reverse();
    }
    if let Some(&first) = ring.first() {
        ring.push(first);
    }
    LineString::new(ring)
}

/// Convert a Polygon to geo with counter-clockwise winding.
fn polygon_to_geo(poly: &Polygon) -> GeoPolygon<f64> {
    GeoPolygon::new(ring_to_geo(poly.points(), true), vec![])
}

/// Convert an ExPolygon to geo with a counter-clockwise contour and clockwise holes.
fn expolygon_to_geo(expoly: &ExPolygon) -> GeoPolygon<f64> {
    let holes = expoly
        .holes
        .iter()
        .map(|hole| ring_to_geo(hole.points(), false))
        .collect();
    GeoPolygon::new(ring_to_geo(expoly.contour.points(), true), holes)
}

fn geo_to_ring(ring: &LineString<f64>) -> Polygon {
    let mut points: Vec<Point> = ring
        .coords()
        .map(|c| Point::from_f64_round(c.x * FACTOR, c.y * FACTOR))
        .collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Polygon::from_points(points)
}

fn geo_to_expolygon(geo_poly: &GeoPolygon<f64>) -> Option<ExPolygon> {
    let mut contour = geo_to_ring(geo_poly.exterior());
    if contour.len() < 3 || contour.area() == 0.0 {
        return None;
    }
    contour.make_counter_clockwise();
    let holes = geo_poly
        .interiors()
        .iter()
        .map(geo_to_ring)
        .filter(|h| h.len() >= 3 && h.area() != 0.0)
        .map(|mut h| {
            h.make_clockwise();
            h
        })
        .collect();
    Some(ExPolygon::with_holes(contour, holes))
}

fn geo_multi_to_expolygons(multi: &MultiPolygon<f64>) -> ExPolygons {
    multi.0.iter().filter_map(geo_to_expolygon).collect()
}

fn polygons_to_geo_multi(polys: &[Polygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(polys.iter().map(polygon_to_geo).collect())
}

fn expolygons_to_geo_multi(expolys: &[ExPolygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(expolys.iter().map(expolygon_to_geo).collect())
}

// ============================================================================
// Boolean Operations
// ============================================================================

/// Compute the union of two sets of regions.
pub fn union(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() && clip.is_empty() {
        return vec![];
    }
    let result = expolygons_to_geo_multi(subject).union(&expolygons_to_geo_multi(clip), FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Merge a set of potentially overlapping regions.
pub fn union_ex(expolygons: &[ExPolygon]) -> ExPolygons {
    union(expolygons, &[])
}

/// Merge plain polygons into regions. Clockwise rings inside counter-clockwise
/// ones become holes.
pub fn union_polygons_ex(polygons: &[Polygon]) -> ExPolygons {
    if polygons.is_empty() {
        return vec![];
    }
    // Holes keep their winding so the nonzero fill rule subtracts them.
    let multi = MultiPolygon::new(
        polygons
            .iter()
            .map(|p| {
                GeoPolygon::new(
                    ring_to_geo(p.points(), p.is_counter_clockwise()),
                    vec![],
                )
            })
            .collect(),
    );
    geo_multi_to_expolygons(&multi.union(&MultiPolygon::new(vec![]), FACTOR))
}

/// Compute the intersection of two sets of regions.
pub fn intersection(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() || clip.is_empty() {
        return vec![];
    }
    let result =
        expolygons_to_geo_multi(subject).intersection(&expolygons_to_geo_multi(clip), FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Compute the difference of two sets of regions (subject - clip).
pub fn difference(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return vec![];
    }
    if clip.is_empty() {
        return union_ex(subject);
    }
    let result =
        expolygons_to_geo_multi(subject).difference(&expolygons_to_geo_multi(clip), FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Compute the XOR of two sets of regions.
pub fn xor(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return union_ex(clip);
    }
    if clip.is_empty() {
        return union_ex(subject);
    }
    let result = expolygons_to_geo_multi(subject).xor(&expolygons_to_geo_multi(clip), FACTOR);
    geo_multi_to_expolygons(&result)
}

/// Grow regions by a tiny mitered offset.
pub fn safety_offset(expolygons: &[ExPolygon], delta: Coord) -> ExPolygons {
    offset_expolygons(expolygons, delta as CoordF, OffsetJoinType::Miter)
}

/// Union with the subject grown by `safety`.
pub fn union_safe(expolygons: &[ExPolygon], safety: Coord) -> ExPolygons {
    union_ex(&safety_offset(expolygons, safety))
}

/// Difference with the clip grown by `safety`.
pub fn difference_safe(subject: &[ExPolygon], clip: &[ExPolygon], safety: Coord) -> ExPolygons {
    difference(subject, &safety_offset(clip, safety))
}

/// Intersection with the clip grown by `safety`.
pub fn intersection_safe(subject: &[ExPolygon], clip: &[ExPolygon], safety: Coord) -> ExPolygons {
    intersection(subject, &safety_offset(clip, safety))
}

// ============================================================================
// Offset Operations
// ============================================================================

/// Offset a polygon by `delta` scaled units (positive grows, negative shrinks).
pub fn offset_polygon(polygon: &Polygon, delta: CoordF, join_type: OffsetJoinType) -> ExPolygons {
    let result = polygon_to_geo(polygon).offset(
        delta,
        join_type.to_clipper(delta),
        EndType::ClosedPolygon,
        FACTOR,
    );
    geo_multi_to_expolygons(&result)
}

/// Offset a region, moving the contour and the holes together.
pub fn offset_expolygon(
    expolygon: &ExPolygon,
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    offset_expolygons(std::slice::from_ref(expolygon), delta, join_type)
}

/// Offset multiple regions. Overlapping results are merged.
pub fn offset_expolygons(
    expolygons: &[ExPolygon],
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if expolygons.is_empty() {
        return vec![];
    }
    let result = expolygons_to_geo_multi(expolygons).offset(
        delta,
        join_type.to_clipper(delta),
        EndType::ClosedPolygon,
        FACTOR,
    );
    geo_multi_to_expolygons(&result)
}

/// Offset multiple polygons.
pub fn offset_polygons(
    polygons: &[Polygon],
    delta: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if polygons.is_empty() {
        return vec![];
    }
    let result = polygons_to_geo_multi(polygons).offset(
        delta,
        join_type.to_clipper(delta),
        EndType::ClosedPolygon,
        FACTOR,
    );
    geo_multi_to_expolygons(&result)
}

/// Shrink (inset) regions by a given distance.
pub fn shrink(expolygons: &[ExPolygon], distance: CoordF, join_type: OffsetJoinType) -> ExPolygons {
    offset_expolygons(expolygons, -distance.abs(), join_type)
}

/// Grow (outset) regions by a given distance.
pub fn grow(expolygons: &[ExPolygon], distance: CoordF, join_type: OffsetJoinType) -> ExPolygons {
    offset_expolygons(expolygons, distance.abs(), join_type)
}

/// Offset by `delta1`, then offset the result by `delta2`.
///
/// With `delta1 < 0 < delta2` this removes every part of the region narrower
/// than `2 * |delta1|`.
pub fn offset2(
    expolygons: &[ExPolygon],
    delta1: CoordF,
    delta2: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    let first = offset_expolygons(expolygons, delta1, join_type);
    if first.is_empty() {
        return vec![];
    }
    offset_expolygons(&first, delta2, join_type)
}

/// Morphological opening: shrink then grow by the same amount.
pub fn opening(
    expolygons: &[ExPolygon],
    distance: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if expolygons.is_empty() || distance <= 0.0 {
        return expolygons.to_vec();
    }
    offset2(expolygons, -distance, distance, join_type)
}

/// Morphological closing: grow then shrink by the same amount.
pub fn closing(
    expolygons: &[ExPolygon],
    distance: CoordF,
    join_type: OffsetJoinType,
) -> ExPolygons {
    if expolygons.is_empty() || distance <= 0.0 {
        return expolygons.to_vec();
    }
    offset2(expolygons, distance, -distance, join_type)
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Drop regions with an area at or below `min_area` (scaled units squared).
pub fn remove_small(expolygons: &[ExPolygon], min_area: CoordF) -> ExPolygons {
    expolygons
        .iter()
        .filter(|expoly| expoly.area() > min_area)
        .cloned()
        .collect()
}

/// Check if two sets of regions overlap.
pub fn polygons_overlap(a: &[ExPolygon], b: &[ExPolygon]) -> bool {
    !intersection(a, b).is_empty()
}

/// Compute the total area of a set of regions.
pub fn total_area(expolygons: &[ExPolygon]) -> CoordF {
    expolygons.iter().map(ExPolygon::area).sum()
}

/// Every contour and hole as a plain polygon.
pub fn to_polygons(expolygons: &[ExPolygon]) -> Polygons {
    expolygons.iter().flat_map(ExPolygon::to_polygons).collect()
}
