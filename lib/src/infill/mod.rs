//! Infill pattern generation.
//!
//! A pattern generator implements [`Fill`]: given one [`Surface`] and a set
//! of [`FillParams`] it produces ordered polylines. Generators are created by
//! a [`FillRegistry`] keyed by [`InfillPattern`], so new patterns can be added
//! without touching the orchestrator.
//!
//! # Algorithm
//!
//! 1. Inset the surface by half the minimum spacing so the outermost lines
//!    sit half a line width inside the boundary
//! 2. Generate the pattern over the inset area (scanlines or offset loops)
//! 3. Link or clip the resulting lines and extend free ends into the perimeters
//!
//! The per-layer orchestration lives in [`make_fill`].

pub mod concentric;
mod orchestrator;
pub mod rectilinear;
mod registry;

pub use crate::config::InfillPattern;
pub use concentric::Concentric;
pub use orchestrator::{make_fill, merge_surfaces, rescue_narrow_surfaces, FillContext};
pub use rectilinear::Rectilinear;
pub use registry::{FillFactory, FillRegistry};

use crate::clipper::{offset_expolygon, OffsetJoinType};
use crate::config::Tolerances;
use crate::geometry::{BoundingBox, ExPolygon, Point, Polylines};
use crate::slice::Surface;
use crate::{Coord, CoordF};
use std::f64::consts::PI;

/// Length of the gap left where a concentric loop closes, relative to the nozzle diameter.
pub const LOOP_CLIPPING_LENGTH_OVER_NOZZLE_DIAMETER: CoordF = 0.15;

/// Largest factor by which a solid fill may widen its spacing to fit the area.
const SOLID_SPACING_FACTOR_MAX: CoordF = 1.2;

/// Parameters for one generator invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct FillParams {
    /// Bounding box of the whole object, used to align patterns across layers.
    /// An undefined box falls back to the surface's own bounds.
    pub bounding_box: BoundingBox,
    /// Spacing between adjacent lines at full density (mm).
    pub min_spacing: CoordF,
    /// How far free line ends reach past the inset boundary (scaled).
    pub endpoints_overlap: CoordF,
    pub layer_id: usize,
    /// Print height of the layer (mm).
    pub z: CoordF,
    /// Base fill angle (radians).
    pub angle: CoordF,
    /// Longest link allowed between two adjacent lines (scaled). Zero disables linking.
    pub link_max_length: Coord,
    /// Gap left where a loop closes (scaled).
    pub loop_clipping: CoordF,
    /// Fill density in `[0, 1]`.
    pub density: CoordF,
    /// Keep `min_spacing` exactly, even for solid fills.
    pub dont_adjust: bool,
    pub tolerances: Tolerances,
}

impl Default for FillParams {
    fn default() -> Self {
        Self {
            bounding_box: BoundingBox::new(),
            min_spacing: 0.0,
            endpoints_overlap: 0.0,
            layer_id: 0,
            z: 0.0,
            angle: 0.0,
            link_max_length: 0,
            loop_clipping: 0.0,
            density: 0.0,
            dont_adjust: false,
            tolerances: Tolerances::default(),
        }
    }
}

/// A pattern generator.
pub trait Fill: Send {
    /// Fill one surface. Implementations record the spacing they actually used.
    fn fill_surface(&mut self, surface: &Surface, params: &FillParams) -> Polylines;

    /// Spacing used by the last call to [`Fill::fill_surface`] (mm).
    fn spacing(&self) -> CoordF;

    /// Whether the pattern can produce a 100 % fill.
    fn can_solid(&self) -> bool {
        false
    }

    /// Whether the pattern should always be printed with bridge flow.
    fn use_bridge_flow(&self) -> bool {
        false
    }

    /// Whether consumers must keep the generated order.
    fn no_sort(&self) -> bool {
        false
    }
}

/// Regions to fill: the surface inset by half the minimum spacing.
pub fn fill_area(surface: &Surface, params: &FillParams) -> Vec<ExPolygon> {
    let half = params.tolerances.scale_f(params.min_spacing) / 2.0;
    offset_expolygon(&surface.expolygon, -half, OffsetJoinType::Miter)
}

/// Direction of the fill lines and the point patterns are aligned to.
///
/// A surface with a detected bridge angle is filled along it. Otherwise the
/// base angle is used, turned by 90° on every other layer unless `aligned`.
pub fn infill_direction(surface: &Surface, params: &FillParams, aligned: bool) -> (CoordF, Point) {
    let reference = if params.bounding_box.is_empty() {
        surface.expolygon.bounding_box().center()
    } else {
        params.bounding_box.center()
    };
    let angle = match surface.bridge_angle {
        Some(angle) => angle,
        None if aligned => params.angle,
        None => {
            let layers = CoordF::from(surface.thickness_layers.max(1));
            let index = (params.layer_id as CoordF / layers).floor() as usize;
            params.angle + if index % 2 == 1 { PI / 2.0 } else { 0.0 }
        }
    };
    (angle, reference)
}

/// Widen `distance` so a whole number of intervals fits `width`, by at most
/// [`SOLID_SPACING_FACTOR_MAX`].
pub fn adjust_solid_spacing(width: Coord, distance: Coord) -> Coord {
    if distance <= 0 || width <= 0 {
        return distance;
    }
    let intervals = width / distance;
    if intervals == 0 {
        return distance;
    }
    let adjusted = width / intervals;
    if adjusted as CoordF / distance as CoordF > SOLID_SPACING_FACTOR_MAX {
        (distance as CoordF * SOLID_SPACING_FACTOR_MAX).round() as Coord
    } else {
        adjusted
    }
}
