//! A set of regions forming one possibly-disjoint area.

use super::{
    convex_hull, ExPolygon, ExPolygons, Line, Lines, MultiPoint, Point, Points, Polygon, Polygons,
    Polyline, Vector,
};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};

/// Which ring of a region a [`BoundaryHit`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundaryRef {
    Contour,
    Hole(usize),
}

/// Result of [`ExPolygonCollection::first_intersection`].
///
/// The indices stay valid until the collection is restructured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryHit {
    pub point: Point,
    /// True when the ray start lies to the left of the boundary segment hit.
    pub ccw: bool,
    pub expolygon_index: usize,
    pub boundary: BoundaryRef,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExPolygonCollection {
    pub expolygons: ExPolygons,
}

impl ExPolygonCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_expolygons(expolygons: ExPolygons) -> Self {
        Self { expolygons }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.expolygons.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.expolygons.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExPolygon> {
        self.expolygons.iter()
    }

    pub fn append(&mut self, expolygons: &[ExPolygon]) {
        self.expolygons.extend_from_slice(expolygons);
    }

    pub fn push(&mut self, expolygon: ExPolygon) {
        self.expolygons.push(expolygon);
    }

    pub fn clear(&mut self) {
        self.expolygons.clear();
    }

    pub fn scale(&mut self, factor: CoordF) {
        for e in &mut self.expolygons {
            e.scale(factor);
        }
    }

    pub fn translate(&mut self, v: Vector) {
        for e in &mut self.expolygons {
            e.translate(v);
        }
    }

    pub fn rotate(&mut self, angle: CoordF, center: Point) {
        for e in &mut self.expolygons {
            e.rotate(angle, center);
        }
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        self.expolygons.iter().any(|e| e.contains_point(p))
    }

    pub fn contains_line(&self, line: &Line) -> bool {
        self.expolygons.iter().any(|e| e.contains_line(line))
    }

    pub fn contains_polyline(&self, polyline: &Polyline) -> bool {
        self.expolygons.iter().any(|e| e.contains_polyline(polyline))
    }

    /// Boundary-inclusive point containment.
    pub fn contains_b(&self, p: &Point, tolerance: Coord) -> bool {
        self.expolygons.iter().any(|e| e.contains_b(p, tolerance))
    }

    /// Intersection of `line` with any region boundary that lies closest to
    /// `line.a`. Ties keep the first boundary found in collection order.
    pub fn first_intersection(&self, line: &Line) -> Option<BoundaryHit> {
        let mut best: Option<(BoundaryHit, i128)> = None;
        for (expolygon_index, expolygon) in self.expolygons.iter().enumerate() {
            let rings = std::iter::once((BoundaryRef::Contour, &expolygon.contour)).chain(
                expolygon
                    .holes
                    .iter()
                    .enumerate()
                    .map(|(i, h)| (BoundaryRef::Hole(i), h)),
            );
            for (boundary, ring) in rings {
                if let Some((point, ccw)) = ring.first_intersection(line) {
                    let dist = line.a.distance_squared(&point);
                    if best.map_or(true, |(_, d)| dist < d) {
                        let hit = BoundaryHit {
                            point,
                            ccw,
                            expolygon_index,
                            boundary,
                        };
                        best = Some((hit, dist));
                    }
                }
            }
        }
        best.map(|(hit, _)| hit)
    }

    /// Resolve the ring a hit refers to.
    pub fn boundary(&self, hit: &BoundaryHit) -> Option<&Polygon> {
        let expolygon = self.expolygons.get(hit.expolygon_index)?;
        match hit.boundary {
            BoundaryRef::Contour => Some(&expolygon.contour),
            BoundaryRef::Hole(i) => expolygon.holes.get(i),
        }
    }

    pub fn simplify(&mut self, tolerance: CoordF) {
        self.expolygons = self
            .expolygons
            .iter()
            .flat_map(|e| e.simplify(tolerance))
            .collect();
    }

    /// Convex hull of all contour points.
    pub fn convex_hull(&self) -> Polygon {
        let points: Points = self
            .expolygons
            .iter()
            .flat_map(|e| e.contour.points().iter().copied())
            .collect();
        convex_hull(&points)
    }

    pub fn lines(&self) -> Lines {
        self.expolygons.iter().flat_map(|e| e.lines()).collect()
    }

    pub fn contours(&self) -> Polygons {
        self.expolygons.iter().map(|e| e.contour.clone()).collect()
    }

    pub fn holes(&self) -> Polygons {
        self.expolygons
            .iter()
            .flat_map(|e| e.holes.iter().cloned())
            .collect()
    }

    /// Every ring of every region.
    pub fn polygons(&self) -> Polygons {
        self.expolygons.iter().flat_map(|e| e.to_polygons()).collect()
    }

    /// Every vertex of every ring.
    pub fn points(&self) -> Points {
        self.expolygons
            .iter()
            .flat_map(|e| e.rings().flat_map(|r| r.points().iter().copied()).collect::<Vec<_>>())
            .collect()
    }
}

impl From<ExPolygons> for ExPolygonCollection {
    fn from(expolygons: ExPolygons) -> Self {
        Self { expolygons }
    }
}

impl From<ExPolygon> for ExPolygonCollection {
    fn from(expolygon: ExPolygon) -> Self {
        Self {
            expolygons: vec![expolygon],
        }
    }
}

impl<'a> IntoIterator for &'a ExPolygonCollection {
    type Item = &'a ExPolygon;
    type IntoIter = std::slice::Iter<'a, ExPolygon>;

    fn into_iter(self) -> Self::IntoIter {
        self.expolygons.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square(x: Coord, y: Coord, size: Coord) -> ExPolygon {
        ExPolygon::new(Polygon::rectangle(
            Point::new(x, y),
            Point::new(x + size, y + size),
        ))
    }

    fn make_collection() -> ExPolygonCollection {
        let mut hole = Polygon::rectangle(Point::new(40, 40), Point::new(60, 60));
        hole.make_clockwise();
        let mut with_hole = square(0, 0, 100);
        with_hole.holes.push(hole);
        ExPolygonCollection::from_expolygons(vec![with_hole, square(200, 0, 100)])
    }

    #[test]
    fn test_first_intersection_hits_hole() {
        let coll = make_collection();
        let ray = Line::from_coords(50, 50, 50, 500);
        let hit = coll.first_intersection(&ray).unwrap();
        assert_eq!(hit.point, Point::new(50, 60));
        assert_eq!(hit.expolygon_index, 0);
        assert_eq!(hit.boundary, BoundaryRef::Hole(0));
        assert_eq!(coll.boundary(&hit).unwrap().len(), 4);
    }

    #[test]
    fn test_first_intersection_across_regions() {
        let coll = make_collection();
        let ray = Line::from_coords(400, 50, 150, 50);
        let hit = coll.first_intersection(&ray).unwrap();
        assert_eq!(hit.point, Point::new(300, 50));
        assert_eq!(hit.expolygon_index, 1);
        assert_eq!(hit.boundary, BoundaryRef::Contour);
        // The right edge of a CCW square runs upward; the ray start is to its right.
        assert!(!hit.ccw);

        let miss = Line::from_coords(0, 500, 300, 500);
        assert!(coll.first_intersection(&miss).is_none());
    }

    #[test]
    fn test_collection_queries() {
        let coll = make_collection();
        assert!(coll.contains_point(&Point::new(20, 20)));
        assert!(!coll.contains_point(&Point::new(50, 50)));
        assert!(coll.contains_point(&Point::new(250, 50)));
        assert!(coll.contains_b(&Point::new(300, 50), 1));
        assert_eq!(coll.contours().len(), 2);
        assert_eq!(coll.holes().len(), 1);
        assert_eq!(coll.lines().len(), 12);
        assert_eq!(coll.points().len(), 12);

        let hull = coll.convex_hull();
        assert!((hull.area() - 300.0 * 100.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn first_intersection_is_nearest(
            ax in -500i64..800, ay in -300i64..400,
            bx in -500i64..800, by in -300i64..400,
        ) {
            let coll = make_collection();
            let ray = Line::from_coords(ax, ay, bx, by);
            let hits: Vec<Point> = coll
                .lines()
                .iter()
                .filter_map(|l| l.intersection(&ray))
                .collect();
            match coll.first_intersection(&ray) {
                None => prop_assert!(hits.is_empty()),
                Some(hit) => {
                    let best = hit.point.distance_squared(&ray.a);
                    prop_assert!(hits.iter().all(|p| p.distance_squared(&ray.a) >= best));
                }
            }
        }
    }
}
