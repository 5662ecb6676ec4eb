//! Extrusion flow math.
//!
//! A [`Flow`] describes the cross-section of one extruded line: its width and
//! height, the nozzle it comes from, and whether it is a bridge. Normal
//! extrusions are modelled as a rectangle with semicircular ends, bridges as a
//! round thread.
//!
//! Widths are resolved per [`FlowRole`] from a [`FlowConfig`] by a
//! [`FlowResolver`]; [`RegionFlowResolver`] is the default implementation.

use crate::config::{FloatOrPercent, FlowConfig, Tolerances};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

/// Extra spacing between adjacent bridge threads (mm).
pub const BRIDGE_EXTRA_SPACING: CoordF = 0.05;

/// Errors produced while resolving a flow.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    #[error("invalid flow height {0}")]
    InvalidHeight(CoordF),

    #[error("invalid extrusion width {0}")]
    InvalidWidth(CoordF),

    #[error("invalid nozzle diameter {0}")]
    InvalidNozzle(CoordF),

    #[error("flow spacing {0} too small for height {1}")]
    NegativeSpacing(CoordF, CoordF),
}

pub type FlowResult<T> = std::result::Result<T, FlowError>;

/// What an extrusion is used for. Selects the configured width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowRole {
    ExternalPerimeter,
    Perimeter,
    Infill,
    SolidInfill,
    TopSolidInfill,
    SupportMaterial,
    SupportMaterialInterface,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Extrusion width (mm).
    pub width: CoordF,
    /// Extrusion height (mm). Equal to the width for bridges.
    pub height: CoordF,
    pub nozzle_diameter: CoordF,
    pub bridge: bool,
}

impl Flow {
    /// A normal (non-bridge) flow.
    pub fn new(width: CoordF, height: CoordF, nozzle_diameter: CoordF) -> FlowResult<Self> {
        if !(width > 0.0) {
            return Err(FlowError::InvalidWidth(width));
        }
        if !(height > 0.0) {
            return Err(FlowError::InvalidHeight(height));
        }
        if !(nozzle_diameter > 0.0) {
            return Err(FlowError::InvalidNozzle(nozzle_diameter));
        }
        Ok(Self {
            width,
            height,
            nozzle_diameter,
            bridge: false,
        })
    }

    /// A round bridge thread of diameter `dmr`.
    pub fn bridging_flow(dmr: CoordF, nozzle_diameter: CoordF) -> Self {
        Self {
            width: dmr,
            height: dmr,
            nozzle_diameter,
            bridge: true,
        }
    }

    /// Build a flow from a configured width. `None` selects the automatic width.
    /// A positive `bridge_flow_ratio` produces a bridge flow instead.
    pub fn new_from_config_width(
        role: FlowRole,
        width: Option<FloatOrPercent>,
        nozzle_diameter: CoordF,
        height: CoordF,
        bridge_flow_ratio: CoordF,
    ) -> FlowResult<Self> {
        if !(nozzle_diameter > 0.0) {
            return Err(FlowError::InvalidNozzle(nozzle_diameter));
        }
        if bridge_flow_ratio > 0.0 {
            let dmr = bridge_width(nozzle_diameter, bridge_flow_ratio);
            return Ok(Self::bridging_flow(dmr, nozzle_diameter));
        }
        if !(height > 0.0) {
            return Err(FlowError::InvalidHeight(height));
        }
        let w = match width {
            Some(w) if w.get_abs_value(height) > 0.0 => w.get_abs_value(height),
            _ => auto_width(role, nozzle_diameter, height),
        };
        Self::new(w, height, nozzle_diameter)
    }

    /// Build a flow whose spacing equals `spacing` (mm).
    pub fn new_from_spacing(
        spacing: CoordF,
        nozzle_diameter: CoordF,
        height: CoordF,
        bridge: bool,
    ) -> FlowResult<Self> {
        if bridge {
            let w = spacing - BRIDGE_EXTRA_SPACING;
            if !(w > 0.0) {
                return Err(FlowError::InvalidWidth(w));
            }
            return Ok(Self::bridging_flow(w, nozzle_diameter));
        }
        if !(height > 0.0) {
            return Err(FlowError::InvalidHeight(height));
        }
        let w = spacing + height * (1.0 - 0.25 * PI);
        Self::new(w, height, nozzle_diameter)
    }

    /// Centre-to-centre distance between adjacent extrusions (mm).
    pub fn spacing(&self) -> CoordF {
        if self.bridge {
            self.width + BRIDGE_EXTRA_SPACING
        } else {
            self.width - self.height * (1.0 - 0.25 * PI)
        }
    }

    /// Spacing between this flow and a neighbouring `other` flow (mm).
    pub fn spacing_to(&self, other: &Flow) -> CoordF {
        0.5 * (self.spacing() + other.spacing())
    }

    /// Volume extruded per millimetre of path (mm³/mm).
    pub fn mm3_per_mm(&self) -> CoordF {
        if self.bridge {
            self.width * self.width * 0.25 * PI
        } else {
            self.height * (self.width - self.height * (1.0 - 0.25 * PI))
        }
    }

    pub fn scaled_width(&self, tol: &Tolerances) -> Coord {
        tol.scale(self.width)
    }

    pub fn scaled_spacing(&self, tol: &Tolerances) -> Coord {
        tol.scale(self.spacing())
    }

    /// Check that the spacing is positive.
    pub fn validate(&self) -> FlowResult<()> {
        if self.spacing() <= 0.0 {
            return Err(FlowError::NegativeSpacing(self.spacing(), self.height));
        }
        Ok(())
    }
}

/// Width matching the nozzle's volumetric output for a layer of `height`,
/// clamped per role.
pub fn auto_width(role: FlowRole, nozzle_diameter: CoordF, height: CoordF) -> CoordF {
    let width = (nozzle_diameter * nozzle_diameter * PI + height * height * (4.0 - PI))
        / (4.0 * height);
    let (min, max) = match role {
        FlowRole::ExternalPerimeter
        | FlowRole::SupportMaterial
        | FlowRole::SupportMaterialInterface => (nozzle_diameter * 1.1, Some(nozzle_diameter * 1.1)),
        // Sparse infill keeps the full native flow.
        FlowRole::Infill => (nozzle_diameter * 1.05, None),
        _ => (nozzle_diameter * 1.05, Some(nozzle_diameter * 1.7)),
    };
    let width = max.map_or(width, |max| width.min(max));
    width.max(min)
}

/// Diameter of a bridge thread.
pub fn bridge_width(nozzle_diameter: CoordF, bridge_flow_ratio: CoordF) -> CoordF {
    bridge_flow_ratio.sqrt() * nozzle_diameter
}

/// Resolves the flow used for a role at a given height.
pub trait FlowResolver {
    /// `width` overrides the configured width when set.
    fn flow(
        &self,
        role: FlowRole,
        layer_height: CoordF,
        bridge: bool,
        first_layer: bool,
        width: Option<CoordF>,
    ) -> FlowResult<Flow>;

    fn nozzle_diameter(&self, role: FlowRole) -> CoordF;
}

/// Resolves flows from a region's [`FlowConfig`].
#[derive(Clone, Debug, Default)]
pub struct RegionFlowResolver {
    pub config: FlowConfig,
}

impl RegionFlowResolver {
    pub fn new(config: FlowConfig) -> Self {
        Self { config }
    }

    fn configured_width(&self, role: FlowRole, first_layer: bool) -> Option<FloatOrPercent> {
        let positive = |w: &Option<FloatOrPercent>| {
            w.filter(|w| match w {
                FloatOrPercent::Absolute(v) | FloatOrPercent::Percent(v) => *v > 0.0,
            })
        };
        if first_layer {
            if let Some(w) = positive(&self.config.first_layer_extrusion_width) {
                return Some(w);
            }
        }
        let by_role = match role {
            FlowRole::ExternalPerimeter => &self.config.external_perimeter_extrusion_width,
            FlowRole::Perimeter => &self.config.perimeter_extrusion_width,
            FlowRole::Infill => &self.config.infill_extrusion_width,
            FlowRole::SolidInfill => &self.config.solid_infill_extrusion_width,
            FlowRole::TopSolidInfill => &self.config.top_infill_extrusion_width,
            FlowRole::SupportMaterial | FlowRole::SupportMaterialInterface => {
                &self.config.extrusion_width
            }
        };
        positive(by_role).or_else(|| positive(&self.config.extrusion_width))
    }
}

impl FlowResolver for RegionFlowResolver {
    fn flow(
        &self,
        role: FlowRole,
        layer_height: CoordF,
        bridge: bool,
        first_layer: bool,
        width: Option<CoordF>,
    ) -> FlowResult<Flow> {
        let config_width = match width {
            Some(w) => Some(FloatOrPercent::Absolute(w)),
            None => self.configured_width(role, first_layer),
        };
        let ratio = if bridge {
            self.config.bridge_flow_ratio
        } else {
            0.0
        };
        Flow::new_from_config_width(
            role,
            config_width,
            self.config.nozzle_diameter,
            layer_height,
            ratio,
        )
    }

    fn nozzle_diameter(&self, _role: FlowRole) -> CoordF {
        self.config.nozzle_diameter
    }
}
