//! Concentric fill: loops offset inwards from the boundary.

use super::{adjust_solid_spacing, fill_area, Fill, FillParams};
use crate::clipper::{offset2, to_polygons, OffsetJoinType};
use crate::geometry::{MultiPoint, Point, Polygon, Polylines};
use crate::slice::Surface;
use crate::{Coord, CoordF};
use log::trace;

/// Concentric loops, printed from the outermost inwards.
///
/// Each loop is opened at the vertex nearest to where the previous one ended
/// and shortened by the loop clipping distance so the nozzle never lands
/// exactly on the starting point.
#[derive(Clone, Debug, Default)]
pub struct Concentric {
    spacing: CoordF,
}

impl Concentric {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Fill for Concentric {
    fn fill_surface(&mut self, surface: &Surface, params: &FillParams) -> Polylines {
        self.spacing = params.min_spacing;
        if params.density <= 0.0 || params.min_spacing <= 0.0 {
            return Vec::new();
        }
        let tol = &params.tolerances;
        let min_spacing = tol.scale(params.min_spacing);
        let mut distance = (min_spacing as CoordF / params.density).round() as Coord;
        if distance <= 0 {
            return Vec::new();
        }

        let mut out = Vec::new();
        let mut last_pos = Point::new(0, 0);
        for area in fill_area(surface, params) {
            if params.density > 0.9999 && !params.dont_adjust {
                distance = adjust_solid_spacing(area.contour.bounding_box().width(), distance);
                self.spacing = tol.unscale(distance as CoordF);
            }

            let mut loops = area.to_polygons();
            let mut last = vec![area];
            loop {
                last = offset2(
                    &last,
                    -((distance + min_spacing / 2) as CoordF),
                    (min_spacing / 2) as CoordF,
                    OffsetJoinType::Miter,
                );
                if last.is_empty() {
                    break;
                }
                loops.extend(to_polygons(&last));
            }
            trace!("concentric: {} loops at distance {}", loops.len(), distance);

            for ring in &loops {
                let mut polyline = ring.split_at_index(nearest_point_index(ring, last_pos));
                polyline.clip_end(params.loop_clipping);
                if polyline.is_valid() {
                    last_pos = polyline.last_point();
                    out.push(polyline);
                }
            }
        }
        out
    }

    fn spacing(&self) -> CoordF {
        self.spacing
    }

    fn can_solid(&self) -> bool {
        true
    }

    fn no_sort(&self) -> bool {
        true
    }
}

fn nearest_point_index(ring: &Polygon, target: Point) -> usize {
    ring.points()
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| p.distance_squared(&target))
        .map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tolerances;
    use crate::geometry::ExPolygon;
    use crate::slice::SurfaceType;

    fn params(density: CoordF) -> FillParams {
        FillParams {
            min_spacing: 1.0,
            density,
            loop_clipping: 15.0,
            tolerances: Tolerances::new(100.0),
            ..Default::default()
        }
    }

    fn square_surface() -> Surface {
        Surface::new(
            SurfaceType::INTERNAL_SOLID,
            Polygon::rectangle(Point::new(0, 0), Point::new(1000, 1000)).into(),
        )
    }

    #[test]
    fn test_solid_square_loops() {
        let mut fill = Concentric::new();
        let polylines = fill.fill_surface(&square_surface(), &params(1.0));
        // Sides 900, 700, 500, 300. The next shrink collapses the 300 square.
        assert_eq!(polylines.len(), 4);
        let expected = [3600.0, 2800.0, 2000.0, 1200.0];
        for (polyline, full) in polylines.iter().zip(expected) {
            assert!((polyline.length() - (full - 15.0)).abs() < 1.5);
            assert_ne!(polyline.first_point(), polyline.last_point());
        }
        assert!((fill.spacing() - 1.0).abs() < 1e-9);
        assert!(fill.can_solid());
        assert!(fill.no_sort());
    }

    #[test]
    fn test_sparse_loops_are_further_apart() {
        let polylines = Concentric::new().fill_surface(&square_surface(), &params(0.5));
        // Sides 900 and 500.
        assert_eq!(polylines.len(), 2);
    }

    #[test]
    fn test_loops_start_near_previous_end() {
        let polylines = Concentric::new().fill_surface(&square_surface(), &params(1.0));
        for pair in polylines.windows(2) {
            let end = pair[0].last_point();
            let next = pair[1].first_point();
            // The nearest corner of the next loop is one spacing away diagonally.
            assert!(end.distance(&next) < 200.0, "{end:?} -> {next:?}");
        }
    }

    #[test]
    fn test_hole_loops_included() {
        let outer = Polygon::rectangle(Point::new(0, 0), Point::new(1000, 1000));
        let mut hole = Polygon::rectangle(Point::new(450, 450), Point::new(550, 550));
        hole.make_clockwise();
        let surface = Surface::new(
            SurfaceType::INTERNAL,
            ExPolygon::with_holes(outer, vec![hole]),
        );
        let polylines = Concentric::new().fill_surface(&surface, &params(1.0));
        // Contour and hole loops on two levels.
        assert_eq!(polylines.len(), 4);
        assert!(polylines.iter().all(|p| p.is_valid()));
    }
}
