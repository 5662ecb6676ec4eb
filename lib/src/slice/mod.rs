//! Per-layer state: classified surfaces, layer regions and layers.
//!
//! - [`Surface`] / [`SurfaceCollection`] - regions tagged with how they are filled
//! - [`LayerRegion`] - one print region's slices, surfaces and extrusions on a layer
//! - [`Layer`] - the islands of a layer and its regions, normal or support

mod layer;
mod surface;

pub use layer::{Layer, LayerKind, LayerRegion, SupportData};
pub use surface::{Surface, SurfaceCollection, SurfaceKind, SurfaceType, Surfaces};
