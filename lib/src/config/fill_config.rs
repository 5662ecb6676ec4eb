//! Fill and flow configuration.

use crate::{Coord, CoordF, SCALING_FACTOR};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An absolute value in millimetres or a percentage of some base value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatOrPercent {
    Absolute(CoordF),
    Percent(CoordF),
}

impl FloatOrPercent {
    /// Resolve against `base`. Percentages scale the base; absolute values
    /// are returned unchanged.
    pub fn get_abs_value(&self, base: CoordF) -> CoordF {
        match *self {
            FloatOrPercent::Absolute(v) => v,
            FloatOrPercent::Percent(p) => base * p / 100.0,
        }
    }

    pub fn is_percent(&self) -> bool {
        matches!(self, FloatOrPercent::Percent(_))
    }
}

impl Default for FloatOrPercent {
    fn default() -> Self {
        FloatOrPercent::Absolute(0.0)
    }
}

impl fmt::Display for FloatOrPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloatOrPercent::Absolute(v) => write!(f, "{}", v),
            FloatOrPercent::Percent(p) => write!(f, "{}%", p),
        }
    }
}

/// Infill pattern identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfillPattern {
    /// Parallel lines, rotated 90° on every other layer.
    #[default]
    Rectilinear,
    /// Parallel lines in the same direction on every layer.
    AlignedRectilinear,
    /// Two crossing line sets.
    Grid,
    /// Three line sets at 60°.
    Triangles,
    /// Three line sets at 60°, offset to form stars.
    Stars,
    /// Inward offset loops.
    Concentric,
}

impl InfillPattern {
    pub const ALL: [InfillPattern; 6] = [
        InfillPattern::Rectilinear,
        InfillPattern::AlignedRectilinear,
        InfillPattern::Grid,
        InfillPattern::Triangles,
        InfillPattern::Stars,
        InfillPattern::Concentric,
    ];

    /// Identifier used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            InfillPattern::Rectilinear => "rectilinear",
            InfillPattern::AlignedRectilinear => "alignedrectilinear",
            InfillPattern::Grid => "grid",
            InfillPattern::Triangles => "triangles",
            InfillPattern::Stars => "stars",
            InfillPattern::Concentric => "concentric",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }
}

impl fmt::Display for InfillPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-region fill settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillConfig {
    /// Sparse infill density in percent (0-100).
    pub fill_density: CoordF,
    /// Pattern for sparse infill.
    pub fill_pattern: InfillPattern,
    /// Pattern for top solid surfaces.
    pub top_infill_pattern: InfillPattern,
    /// Pattern for bottom solid surfaces.
    pub bottom_infill_pattern: InfillPattern,
    /// Base fill angle (degrees).
    pub fill_angle: CoordF,
    /// How far infill lines reach into the perimeters.
    pub infill_overlap: FloatOrPercent,
    pub top_solid_layers: u32,
    pub bottom_solid_layers: u32,
    /// Sparse regions smaller than this (mm²) are filled solid.
    pub solid_infill_below_area: CoordF,
    /// Leave internal regions without infill when no top layers are printed.
    pub infill_only_where_needed: bool,
}

impl FillConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set infill density (percent).
    pub fn fill_density(mut self, density: CoordF) -> Self {
        self.fill_density = density;
        self
    }

    /// Builder method: set sparse infill pattern.
    pub fn fill_pattern(mut self, pattern: InfillPattern) -> Self {
        self.fill_pattern = pattern;
        self
    }

    pub fn top_infill_pattern(mut self, pattern: InfillPattern) -> Self {
        self.top_infill_pattern = pattern;
        self
    }

    pub fn bottom_infill_pattern(mut self, pattern: InfillPattern) -> Self {
        self.bottom_infill_pattern = pattern;
        self
    }

    /// Builder method: set fill angle (degrees).
    pub fn fill_angle(mut self, angle: CoordF) -> Self {
        self.fill_angle = angle;
        self
    }

    pub fn infill_overlap(mut self, overlap: FloatOrPercent) -> Self {
        self.infill_overlap = overlap;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.fill_density) {
            return Err(format!(
                "Fill density must be between 0 and 100, got {}",
                self.fill_density
            ));
        }
        if !self.fill_angle.is_finite() {
            return Err("Fill angle must be finite".into());
        }
        if self.solid_infill_below_area < 0.0 {
            return Err("Solid infill threshold area must not be negative".into());
        }
        match self.infill_overlap {
            FloatOrPercent::Absolute(v) | FloatOrPercent::Percent(v) if v < 0.0 => {
                Err("Infill overlap must not be negative".into())
            }
            _ => Ok(()),
        }
    }
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            fill_density: 20.0,
            fill_pattern: InfillPattern::Stars,
            top_infill_pattern: InfillPattern::Rectilinear,
            bottom_infill_pattern: InfillPattern::Rectilinear,
            fill_angle: 45.0,
            infill_overlap: FloatOrPercent::Percent(55.0),
            top_solid_layers: 3,
            bottom_solid_layers: 3,
            solid_infill_below_area: 70.0,
            infill_only_where_needed: false,
        }
    }
}

impl fmt::Display for FillConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FillConfig(density={:.0}%, pattern={}, angle={:.0}°)",
            self.fill_density, self.fill_pattern, self.fill_angle
        )
    }
}

/// Extrusion width settings used to resolve flows.
///
/// Widths given as percentages are relative to the layer height. Unset widths
/// fall back to `extrusion_width`, then to an automatic width derived from the
/// nozzle diameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Nozzle diameter (mm).
    pub nozzle_diameter: CoordF,
    /// Default width for every role.
    pub extrusion_width: Option<FloatOrPercent>,
    pub perimeter_extrusion_width: Option<FloatOrPercent>,
    pub external_perimeter_extrusion_width: Option<FloatOrPercent>,
    pub infill_extrusion_width: Option<FloatOrPercent>,
    pub solid_infill_extrusion_width: Option<FloatOrPercent>,
    pub top_infill_extrusion_width: Option<FloatOrPercent>,
    /// Overrides every role on the first layer.
    pub first_layer_extrusion_width: Option<FloatOrPercent>,
    /// Multiplier applied to the bridge cross-section.
    pub bridge_flow_ratio: CoordF,
}

impl FlowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set nozzle diameter.
    pub fn nozzle_diameter(mut self, diameter: CoordF) -> Self {
        self.nozzle_diameter = diameter;
        self
    }

    pub fn extrusion_width(mut self, width: FloatOrPercent) -> Self {
        self.extrusion_width = Some(width);
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.nozzle_diameter <= 0.0 {
            return Err("Nozzle diameter must be positive".into());
        }
        if self.bridge_flow_ratio <= 0.0 {
            return Err("Bridge flow ratio must be positive".into());
        }
        Ok(())
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            nozzle_diameter: 0.4,
            extrusion_width: None,
            perimeter_extrusion_width: None,
            external_perimeter_extrusion_width: None,
            infill_extrusion_width: None,
            solid_infill_extrusion_width: None,
            top_infill_extrusion_width: None,
            first_layer_extrusion_width: None,
            bridge_flow_ratio: 1.0,
        }
    }
}

/// Numeric tolerances, carried explicitly through every operation that needs them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Scaled units per millimetre.
    pub scaling_factor: CoordF,
    /// Geometric epsilon (mm).
    pub epsilon: CoordF,
    /// Outward offset applied before booleans that must absorb rounding (scaled units).
    pub safety_offset: Coord,
}

impl Tolerances {
    pub const EPSILON: CoordF = 1e-4;
    /// Safety offset in millimetres before scaling.
    pub const SAFETY_OFFSET_MM: CoordF = 1e-5;

    /// Tolerances for a given grid resolution. The safety offset never drops
    /// below one grid unit.
    pub fn new(scaling_factor: CoordF) -> Self {
        let safety_offset = ((Self::SAFETY_OFFSET_MM * scaling_factor).round() as Coord).max(1);
        Self {
            scaling_factor,
            epsilon: Self::EPSILON,
            safety_offset,
        }
    }

    #[inline]
    pub fn scale(&self, mm: CoordF) -> Coord {
        (mm * self.scaling_factor).round() as Coord
    }

    /// Millimetres to scaled units without rounding.
    #[inline]
    pub fn scale_f(&self, mm: CoordF) -> CoordF {
        mm * self.scaling_factor
    }

    #[inline]
    pub fn unscale(&self, units: CoordF) -> CoordF {
        units / self.scaling_factor
    }

    /// Epsilon in scaled units, at least one grid unit.
    pub fn scaled_epsilon(&self) -> Coord {
        self.scale(self.epsilon).max(1)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.scaling_factor <= 0.0 || !self.scaling_factor.is_finite() {
            return Err("Scaling factor must be positive".into());
        }
        if self.epsilon < 0.0 || self.safety_offset < 0 {
            return Err("Tolerances must not be negative".into());
        }
        Ok(())
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::new(SCALING_FACTOR)
    }
}
