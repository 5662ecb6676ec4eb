//! Configuration types.
//!
//! - [`FillConfig`]: infill density, patterns, angle and overlap
//! - [`FlowConfig`]: nozzle and extrusion widths used to resolve flows
//! - [`Tolerances`]: grid resolution and numeric tolerances

mod fill_config;

pub use fill_config::{FillConfig, FloatOrPercent, FlowConfig, InfillPattern, Tolerances};
