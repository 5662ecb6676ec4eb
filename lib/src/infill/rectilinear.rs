//! Scanline fills.
//!
//! Every layout is one or more passes of parallel lines. A pass rotates the
//! area so its lines become horizontal, intersects it with evenly spaced
//! scanlines, links adjacent lines into zigzags where the link stays inside
//! the surface, then rotates the result back.

use super::{adjust_solid_spacing, fill_area, infill_direction, Fill, FillParams};
use crate::geometry::{ExPolygon, Line, MultiPoint, Point, Polyline, Polylines};
use crate::slice::Surface;
use crate::{Coord, CoordF};
use log::trace;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_3};

/// `(angle offset, shift as a fraction of the line spacing)` for each pass.
type Pass = (CoordF, CoordF);

static SINGLE: [Pass; 1] = [(0.0, 0.0)];
static GRID: [Pass; 2] = [(0.0, 0.0), (FRAC_PI_2, 0.0)];
static TRIANGLES: [Pass; 3] = [(0.0, 0.0), (FRAC_PI_3, 0.0), (2.0 * FRAC_PI_3, 0.0)];
static STARS: [Pass; 3] = [(0.0, 0.0), (FRAC_PI_3, 0.0), (2.0 * FRAC_PI_3, 0.5)];

/// Arrangement of the scanline passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// One direction, turned by 90° on alternate layers.
    #[default]
    Rectilinear,
    /// One direction, the same on every layer.
    Aligned,
    /// Two crossing directions.
    Grid,
    /// Three directions 60° apart, meeting in common points.
    Triangles,
    /// Three directions 60° apart, the last shifted by half a spacing.
    Stars,
}

impl Layout {
    fn passes(self) -> &'static [Pass] {
        match self {
            Layout::Rectilinear | Layout::Aligned => &SINGLE,
            Layout::Grid => &GRID,
            Layout::Triangles => &TRIANGLES,
            Layout::Stars => &STARS,
        }
    }
}

/// Scanline generator for every [`Layout`].
#[derive(Clone, Debug, Default)]
pub struct Rectilinear {
    layout: Layout,
    spacing: CoordF,
}

impl Rectilinear {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: Layout) -> Self {
        Self {
            layout,
            spacing: 0.0,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// One pass of parallel lines at `angle` over `area`. Links are checked
    /// against `boundary`, the uninset surface.
    #[allow(clippy::too_many_arguments)]
    fn fill_single_direction(
        &mut self,
        area: &ExPolygon,
        boundary: &ExPolygon,
        angle: CoordF,
        reference: Point,
        shift: CoordF,
        density: CoordF,
        params: &FillParams,
        out: &mut Polylines,
    ) {
        let tol = &params.tolerances;
        let min_spacing = tol.scale(params.min_spacing);
        if min_spacing <= 0 || density <= 0.0 {
            return;
        }
        let mut line_spacing = (min_spacing as CoordF / density).round() as Coord;

        let mut area = area.clone();
        area.rotate(-angle, reference);
        let mut boundary = boundary.clone();
        boundary.rotate(-angle, reference);

        let mut bbox = area.contour.bounding_box();
        // Rounded rotation can leave a line grazing the extreme vertex.
        bbox.offset(-1);
        if bbox.is_empty() || bbox.min.y > bbox.max.y {
            return;
        }

        let first_y = if density > 0.9999 && !params.dont_adjust {
            line_spacing = adjust_solid_spacing(bbox.height(), line_spacing);
            self.spacing = tol.unscale(line_spacing as CoordF);
            bbox.min.y
        } else {
            // Align to a grid through the reference point so layers line up.
            let origin = reference.y + (shift * line_spacing as CoordF).round() as Coord;
            let mut y = origin + (bbox.min.y - origin).div_euclid(line_spacing) * line_spacing;
            if y < bbox.min.y {
                y += line_spacing;
            }
            y
        };
        if line_spacing <= 0 {
            return;
        }

        let min_length = tol.scaled_epsilon();
        let mut rows: Vec<(Coord, Vec<(Coord, Coord)>)> = Vec::new();
        let mut y = first_y;
        while y <= bbox.max.y {
            let segments = scanline_crossings(&area, y)
                .chunks_exact(2)
                .filter(|pair| pair[1] - pair[0] >= min_length)
                .map(|pair| (pair[0], pair[1]))
                .collect();
            rows.push((y, segments));
            y += line_spacing;
        }

        let mut polylines = link_rows(&rows, &boundary, params.link_max_length);
        trace!(
            "scanline pass at {:.3} rad: {} rows, {} polylines, spacing {}",
            angle,
            rows.len(),
            polylines.len(),
            line_spacing
        );

        for polyline in &mut polylines {
            if params.endpoints_overlap > 0.0 {
                polyline.extend_start(params.endpoints_overlap);
                polyline.extend_end(params.endpoints_overlap);
            }
            polyline.rotate_around(angle, reference);
        }
        out.extend(polylines);
    }
}

impl Fill for Rectilinear {
    fn fill_surface(&mut self, surface: &Surface, params: &FillParams) -> Polylines {
        self.spacing = params.min_spacing;
        if params.density <= 0.0 || params.min_spacing <= 0.0 {
            return Vec::new();
        }
        let passes = self.layout.passes();
        let density = params.density / passes.len() as CoordF;
        let aligned = self.layout != Layout::Rectilinear;
        let (angle, reference) = infill_direction(surface, params, aligned);

        let mut out = Vec::new();
        for area in fill_area(surface, params) {
            for &(offset, shift) in passes {
                self.fill_single_direction(
                    &area,
                    &surface.expolygon,
                    angle + offset,
                    reference,
                    shift,
                    density,
                    params,
                    &mut out,
                );
            }
        }
        out
    }

    fn spacing(&self) -> CoordF {
        self.spacing
    }

    fn can_solid(&self) -> bool {
        self.layout.passes().len() == 1
    }
}

/// Sorted x coordinates where the horizontal line at `y` crosses the
/// boundary. Edges count as half-open in y so every crossing is seen once
/// and the result has even length.
fn scanline_crossings(area: &ExPolygon, y: Coord) -> Vec<Coord> {
    let mut xs: Vec<Coord> = area
        .rings()
        .flat_map(|ring| ring.lines())
        .filter(|edge| (edge.a.y <= y) != (edge.b.y <= y))
        .map(|edge| {
            let t = (y - edge.a.y) as CoordF / (edge.b.y - edge.a.y) as CoordF;
            (edge.a.x as CoordF + t * (edge.b.x - edge.a.x) as CoordF).round() as Coord
        })
        .collect();
    xs.sort_unstable();
    xs
}

/// Turn rows of segments into polylines, alternating direction per row.
/// A segment continues a polyline that ended on the previous row when the
/// link is no longer than `link_max_length` and its midpoint is inside
/// `boundary`.
fn link_rows(
    rows: &[(Coord, Vec<(Coord, Coord)>)],
    boundary: &ExPolygon,
    link_max_length: Coord,
) -> Polylines {
    let mut polylines: Polylines = Vec::new();
    let mut open_ends: Vec<usize> = Vec::new();

    for (row, (y, segments)) in rows.iter().enumerate() {
        let y = *y;
        let ordered: Vec<(Point, Point)> = if row % 2 == 0 {
            segments
                .iter()
                .map(|&(a, b)| (Point::new(a, y), Point::new(b, y)))
                .collect()
        } else {
            segments
                .iter()
                .rev()
                .map(|&(a, b)| (Point::new(b, y), Point::new(a, y)))
                .collect()
        };

        let mut touched: Vec<usize> = Vec::with_capacity(ordered.len());
        for (start, end) in ordered {
            let target = if link_max_length > 0 {
                open_ends
                    .iter()
                    .copied()
                    .filter(|i| !touched.contains(i))
                    .map(|i| (i, polylines[i].last_point()))
                    .filter(|(_, last)| {
                        last.distance(&start) <= link_max_length as CoordF
                            && boundary.contains_point(&Line::new(*last, start).midpoint())
                    })
                    .min_by_key(|(_, last)| last.distance_squared(&start))
                    .map(|(i, _)| i)
            } else {
                None
            };
            match target {
                Some(i) => {
                    polylines[i].push(start);
                    polylines[i].push(end);
                    touched.push(i);
                }
                None => {
                    polylines.push(Polyline::from_points(vec![start, end]));
                    touched.push(polylines.len() - 1);
                }
            }
        }
        open_ends = touched;
    }
    polylines
}
