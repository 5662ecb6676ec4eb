//! # Layer Fill
//!
//! The 2D core of a layer-based slicer: everything between a layer region's
//! classified cross-section and its printable fill paths.
//!
//! - Geometry primitives, regions with holes and region collections
//! - Polygon booleans and offsets
//! - Classified surfaces, layers and layer regions
//! - Medial-axis extraction for variable-width gap fill
//! - Pattern generators behind a registry, and the fill orchestrator that
//!   merges surfaces, rescues narrow regions and dispatches each surface
//!
//! ## Example
//!
//! ```rust,ignore
//! use layer_fill::{FillConfig, FillRegistry, FlowConfig, Layer, Surface, SurfaceType, Tolerances};
//!
//! let mut layer = Layer::new(0, 0.2, 0.2, 0.1);
//! let region = layer.add_region(0, FillConfig::default(), FlowConfig::default());
//! region.fill_surfaces.push(Surface::new(SurfaceType::INTERNAL, square));
//! layer.make_fills(&FillRegistry::new(), &Tolerances::default())?;
//! ```

pub mod clipper;
pub mod config;
pub mod extrusion;
pub mod flow;
pub mod geometry;
pub mod infill;
pub mod slice;

pub use config::{FillConfig, FloatOrPercent, FlowConfig, InfillPattern, Tolerances};
pub use extrusion::{
    ExtrusionEntity, ExtrusionEntityCollection, ExtrusionLoop, ExtrusionPath, ExtrusionRole,
};
pub use flow::{Flow, FlowError, FlowResolver, FlowResult, FlowRole, RegionFlowResolver};
pub use geometry::{
    BoundingBox, ExPolygon, ExPolygonCollection, ExPolygons, Line, MultiPoint, Point, Polygon,
    Polyline, ThickPolyline,
};
pub use infill::{make_fill, Fill, FillContext, FillParams, FillRegistry};
pub use slice::{Layer, LayerKind, LayerRegion, Surface, SurfaceCollection, SurfaceKind, SurfaceType};

/// Integer coordinate, in scaled units.
pub type Coord = i64;

/// Floating-point coordinate for unscaled values.
pub type CoordF = f64;

/// Scaled units per millimetre: 1 unit = 1 nanometre.
pub const SCALING_FACTOR: f64 = 1_000_000.0;

/// Millimetres to scaled units with the default factor.
#[inline]
pub fn scale(v: CoordF) -> Coord {
    (v * SCALING_FACTOR).round() as Coord
}

/// Scaled units to millimetres with the default factor.
#[inline]
pub fn unscale(v: Coord) -> CoordF {
    v as CoordF / SCALING_FACTOR
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid geometry: {0}")]
    Geometry(String),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Pattern error: {0}")]
    Pattern(String),
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
