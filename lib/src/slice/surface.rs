//! Classified surfaces within a layer region.
//!
//! A [`Surface`] is a region tagged with how it must be filled. The tag is a
//! [`SurfaceType`]: one primary [`SurfaceKind`] plus optional bridge and
//! nonplanar modifiers.
//!
//! - **Top**: visible from above
//! - **Bottom**: visible from below, or on the first layer
//! - **Internal**: covered on both sides, gets sparse infill
//! - **InternalSolid**: internal but must be solid
//! - **InternalVoid**: internal area that receives no infill

use crate::geometry::{ExPolygon, ExPolygons, Polygons, Polyline};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary classification of a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceKind {
    Top,
    Bottom,
    #[default]
    Internal,
    InternalVoid,
    InternalSolid,
}

impl SurfaceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SurfaceKind::Top => "top",
            SurfaceKind::Bottom => "bottom",
            SurfaceKind::Internal => "internal",
            SurfaceKind::InternalVoid => "internal void",
            SurfaceKind::InternalSolid => "internal solid",
        }
    }
}

/// A primary kind with its modifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceType {
    pub kind: SurfaceKind,
    /// Printed over air or sparse infill.
    pub bridge: bool,
    /// Follows a non-flat top surface.
    pub nonplanar: bool,
}

impl SurfaceType {
    pub const TOP: SurfaceType = SurfaceType::plain(SurfaceKind::Top);
    pub const BOTTOM: SurfaceType = SurfaceType::plain(SurfaceKind::Bottom);
    pub const BOTTOM_BRIDGE: SurfaceType = SurfaceType::plain(SurfaceKind::Bottom).with_bridge();
    pub const INTERNAL: SurfaceType = SurfaceType::plain(SurfaceKind::Internal);
    pub const INTERNAL_SOLID: SurfaceType = SurfaceType::plain(SurfaceKind::InternalSolid);
    pub const INTERNAL_BRIDGE: SurfaceType =
        SurfaceType::plain(SurfaceKind::InternalSolid).with_bridge();
    pub const INTERNAL_VOID: SurfaceType = SurfaceType::plain(SurfaceKind::InternalVoid);
    pub const TOP_NONPLANAR: SurfaceType = SurfaceType::plain(SurfaceKind::Top).with_nonplanar();
    pub const INTERNAL_SOLID_NONPLANAR: SurfaceType =
        SurfaceType::plain(SurfaceKind::InternalSolid).with_nonplanar();

    pub const fn plain(kind: SurfaceKind) -> Self {
        Self {
            kind,
            bridge: false,
            nonplanar: false,
        }
    }

    pub const fn with_bridge(mut self) -> Self {
        self.bridge = true;
        self
    }

    pub const fn with_nonplanar(mut self) -> Self {
        self.nonplanar = true;
        self
    }

    #[inline]
    pub fn is_top(&self) -> bool {
        self.kind == SurfaceKind::Top
    }

    #[inline]
    pub fn is_bottom(&self) -> bool {
        self.kind == SurfaceKind::Bottom
    }

    #[inline]
    pub fn is_bridge(&self) -> bool {
        self.bridge
    }

    #[inline]
    pub fn is_nonplanar(&self) -> bool {
        self.nonplanar
    }

    /// Check if this surface type requires solid infill.
    #[inline]
    pub fn is_solid(&self) -> bool {
        matches!(
            self.kind,
            SurfaceKind::Top | SurfaceKind::Bottom | SurfaceKind::InternalSolid
        ) || self.bridge
            || self.nonplanar
    }

    #[inline]
    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind,
            SurfaceKind::Internal | SurfaceKind::InternalSolid | SurfaceKind::InternalVoid
        )
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_top() || self.is_bottom()
    }
}

impl From<SurfaceKind> for SurfaceType {
    fn from(kind: SurfaceKind) -> Self {
        Self::plain(kind)
    }
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.name())?;
        if self.bridge {
            f.write_str(" bridge")?;
        }
        if self.nonplanar {
            f.write_str(" nonplanar")?;
        }
        Ok(())
    }
}

/// A classified region.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub expolygon: ExPolygon,
    pub surface_type: SurfaceType,
    /// Material thickness (mm). `None` means the layer height.
    pub thickness: Option<CoordF>,
    /// Number of layers this surface spans.
    pub thickness_layers: u16,
    /// Bridging direction in radians, when one was detected.
    pub bridge_angle: Option<CoordF>,
    pub extra_perimeters: u16,
}

impl Surface {
    pub fn new(surface_type: SurfaceType, expolygon: ExPolygon) -> Self {
        Self {
            expolygon,
            surface_type,
            thickness: None,
            thickness_layers: 1,
            bridge_angle: None,
            extra_perimeters: 0,
        }
    }

    /// Copy every attribute of `template` onto new geometry.
    pub fn from_template(template: &Surface, expolygon: ExPolygon) -> Self {
        Self {
            expolygon,
            ..template.clone()
        }
    }

    /// Create a bridge over `kind` with an optional direction.
    pub fn bridge(kind: SurfaceKind, expolygon: ExPolygon, angle: Option<CoordF>) -> Self {
        Self {
            bridge_angle: angle,
            ..Self::new(SurfaceType::plain(kind).with_bridge(), expolygon)
        }
    }

    #[inline]
    pub fn area(&self) -> CoordF {
        self.expolygon.area()
    }

    #[inline]
    pub fn is_top(&self) -> bool {
        self.surface_type.is_top()
    }

    #[inline]
    pub fn is_bottom(&self) -> bool {
        self.surface_type.is_bottom()
    }

    #[inline]
    pub fn is_bridge(&self) -> bool {
        self.surface_type.is_bridge()
    }

    #[inline]
    pub fn is_nonplanar(&self) -> bool {
        self.surface_type.is_nonplanar()
    }

    #[inline]
    pub fn is_solid(&self) -> bool {
        self.surface_type.is_solid()
    }

    #[inline]
    pub fn is_internal(&self) -> bool {
        self.surface_type.is_internal()
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.surface_type.is_external()
    }

    /// A bridge with a known direction.
    #[inline]
    pub fn is_oriented_bridge(&self) -> bool {
        self.is_bridge() && self.bridge_angle.is_some()
    }

    /// Exact equality of the attributes surfaces are grouped by.
    pub fn same_attributes(&self, other: &Surface) -> bool {
        self.surface_type == other.surface_type
            && self.thickness == other.thickness
            && self.thickness_layers == other.thickness_layers
            && self.bridge_angle == other.bridge_angle
    }

    /// Contour and holes as plain polygons.
    pub fn to_polygons(&self) -> Polygons {
        self.expolygon.to_polygons()
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Surface({}, area={:.0}, angle={:?})",
            self.surface_type,
            self.area(),
            self.bridge_angle
        )
    }
}

pub type Surfaces = Vec<Surface>;

/// An ordered set of surfaces.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceCollection {
    pub surfaces: Surfaces,
}

impl SurfaceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_surfaces(surfaces: Surfaces) -> Self {
        Self { surfaces }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Surface> {
        self.surfaces.iter()
    }

    pub fn push(&mut self, surface: Surface) {
        self.surfaces.push(surface);
    }

    pub fn clear(&mut self) {
        self.surfaces.clear();
    }

    /// Append one surface per region, each copying the attributes of `template`.
    pub fn append_from_template(&mut self, expolygons: ExPolygons, template: &Surface) {
        self.surfaces.extend(
            expolygons
                .into_iter()
                .map(|e| Surface::from_template(template, e)),
        );
    }

    /// Append one surface of `surface_type` per region, with default attributes.
    pub fn append_with_type(&mut self, expolygons: ExPolygons, surface_type: SurfaceType) {
        self.surfaces.extend(
            expolygons
                .into_iter()
                .map(|e| Surface::new(surface_type, e)),
        );
    }

    pub fn append(&mut self, other: &SurfaceCollection) {
        self.surfaces.extend_from_slice(&other.surfaces);
    }

    /// Partition into groups with equal type, thickness, layer count and
    /// bridge angle. Groups appear in order of their first member; members
    /// keep their collection order.
    pub fn group(&self) -> Vec<Vec<&Surface>> {
        let mut groups: Vec<Vec<&Surface>> = Vec::new();
        for surface in &self.surfaces {
            match groups
                .iter_mut()
                .find(|g| g[0].same_attributes(surface))
            {
                Some(group) => group.push(surface),
                None => groups.push(vec![surface]),
            }
        }
        groups
    }

    pub fn filter_by_type(&self, surface_type: SurfaceType) -> Vec<&Surface> {
        self.surfaces
            .iter()
            .filter(|s| s.surface_type == surface_type)
            .collect()
    }

    pub fn filter_by_types(&self, types: &[SurfaceType]) -> Vec<&Surface> {
        self.surfaces
            .iter()
            .filter(|s| types.contains(&s.surface_type))
            .collect()
    }

    /// Every ring of every surface of `surface_type`.
    pub fn polygons_by_type(&self, surface_type: SurfaceType) -> Polygons {
        self.filter_by_type(surface_type)
            .into_iter()
            .flat_map(Surface::to_polygons)
            .collect()
    }

    /// Regions of every surface of `surface_type`.
    pub fn expolygons_by_type(&self, surface_type: SurfaceType) -> ExPolygons {
        self.filter_by_type(surface_type)
            .into_iter()
            .map(|s| s.expolygon.clone())
            .collect()
    }

    pub fn any_top(&self) -> bool {
        self.surfaces.iter().any(Surface::is_top)
    }

    pub fn any_bottom(&self) -> bool {
        self.surfaces.iter().any(Surface::is_bottom)
    }

    pub fn any_internal(&self) -> bool {
        self.surfaces.iter().any(Surface::is_internal)
    }

    /// Whether an internal surface fully contains `polyline`.
    pub fn any_internal_contains(&self, polyline: &Polyline) -> bool {
        self.surfaces
            .iter()
            .any(|s| s.is_internal() && s.expolygon.contains_polyline(polyline))
    }

    /// Whether a bottom surface fully contains `polyline`.
    pub fn any_bottom_contains(&self, polyline: &Polyline) -> bool {
        self.surfaces
            .iter()
            .any(|s| s.is_bottom() && s.expolygon.contains_polyline(polyline))
    }

    /// Retag every surface.
    pub fn set_type(&mut self, surface_type: SurfaceType) {
        for s in &mut self.surfaces {
            s.surface_type = surface_type;
        }
    }

    pub fn keep_type(&mut self, surface_type: SurfaceType) {
        self.surfaces.retain(|s| s.surface_type == surface_type);
    }

    pub fn keep_types(&mut self, types: &[SurfaceType]) {
        self.surfaces.retain(|s| types.contains(&s.surface_type));
    }

    pub fn remove_type(&mut self, surface_type: SurfaceType) {
        self.surfaces.retain(|s| s.surface_type != surface_type);
    }

    pub fn remove_types(&mut self, types: &[SurfaceType]) {
        self.surfaces.retain(|s| !types.contains(&s.surface_type));
    }

    /// Number of rings (contours and holes) across all surfaces.
    pub fn polygons_count(&self) -> usize {
        self.surfaces
            .iter()
            .map(|s| 1 + s.expolygon.holes.len())
            .sum()
    }

    pub fn to_expolygons(&self) -> ExPolygons {
        self.surfaces.iter().map(|s| s.expolygon.clone()).collect()
    }

    pub fn to_polygons(&self) -> Polygons {
        self.surfaces.iter().flat_map(Surface::to_polygons).collect()
    }

    pub fn total_area(&self) -> CoordF {
        self.surfaces.iter().map(Surface::area).sum()
    }
}

impl From<Surfaces> for SurfaceCollection {
    fn from(surfaces: Surfaces) -> Self {
        Self { surfaces }
    }
}

impl<'a> IntoIterator for &'a SurfaceCollection {
    type Item = &'a Surface;
    type IntoIter = std::slice::Iter<'a, Surface>;

    fn into_iter(self) -> Self::IntoIter {
        self.surfaces.iter()
    }
}

impl fmt::Display for SurfaceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceCollection({} surfaces)", self.surfaces.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Polygon};

    fn square(x: i64, size: i64) -> ExPolygon {
        Polygon::rectangle(Point::new(x, 0), Point::new(x + size, size)).into()
    }

    #[test]
    fn test_surface_type_predicates() {
        assert!(SurfaceType::TOP.is_solid());
        assert!(SurfaceType::BOTTOM_BRIDGE.is_solid());
        assert!(SurfaceType::BOTTOM_BRIDGE.is_bottom());
        assert!(SurfaceType::INTERNAL_BRIDGE.is_bridge());
        assert!(SurfaceType::INTERNAL_BRIDGE.is_internal());
        assert!(!SurfaceType::INTERNAL.is_solid());
        assert!(!SurfaceType::INTERNAL_VOID.is_solid());
        assert!(SurfaceType::TOP_NONPLANAR.is_nonplanar());
        assert!(SurfaceType::TOP_NONPLANAR.is_top());
        assert!(SurfaceType::INTERNAL_SOLID_NONPLANAR.is_solid());
        assert!(SurfaceType::TOP.is_external());
        assert!(!SurfaceType::INTERNAL_SOLID.is_external());
        assert_ne!(SurfaceType::TOP, SurfaceType::TOP_NONPLANAR);
        assert_eq!(SurfaceType::BOTTOM_BRIDGE.to_string(), "bottom bridge");
    }

    #[test]
    fn test_group_by_attributes() {
        let mut coll = SurfaceCollection::new();
        coll.append_with_type(vec![square(0, 10)], SurfaceType::TOP);
        coll.append_with_type(vec![square(20, 10)], SurfaceType::INTERNAL);
        coll.append_with_type(vec![square(40, 10)], SurfaceType::TOP);
        coll.push(Surface::bridge(SurfaceKind::Bottom, square(60, 10), Some(0.5)));
        coll.push(Surface::bridge(SurfaceKind::Bottom, square(80, 10), Some(1.0)));
        let mut thick = Surface::new(SurfaceType::TOP, square(100, 10));
        thick.thickness = Some(0.4);
        coll.push(thick);

        let groups = coll.group();
        assert_eq!(groups.len(), 5);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][0].expolygon, square(0, 10));
        assert_eq!(groups[0][1].expolygon, square(40, 10));
        assert_eq!(groups[1][0].surface_type, SurfaceType::INTERNAL);
        assert!(groups[2][0].is_oriented_bridge());
        assert_eq!(groups[4][0].thickness, Some(0.4));
    }

    #[test]
    fn test_template_append() {
        let mut template = Surface::bridge(SurfaceKind::InternalSolid, square(0, 10), Some(0.25));
        template.thickness = Some(0.6);
        template.thickness_layers = 3;
        let mut coll = SurfaceCollection::new();
        coll.append_from_template(vec![square(20, 5), square(40, 5)], &template);
        assert_eq!(coll.len(), 2);
        for s in &coll {
            assert!(s.same_attributes(&template));
            assert!((s.area() - 25.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_filter_keep_remove() {
        let mut coll = SurfaceCollection::new();
        coll.append_with_type(vec![square(0, 10), square(20, 10)], SurfaceType::INTERNAL);
        coll.append_with_type(vec![square(40, 10)], SurfaceType::INTERNAL_VOID);
        coll.append_with_type(vec![square(60, 10)], SurfaceType::TOP);

        assert_eq!(coll.filter_by_type(SurfaceType::INTERNAL).len(), 2);
        assert_eq!(
            coll.filter_by_types(&[SurfaceType::INTERNAL_VOID, SurfaceType::TOP])
                .len(),
            2
        );
        assert_eq!(coll.polygons_by_type(SurfaceType::INTERNAL_VOID).len(), 1);
        assert!(coll.any_top());
        assert!(!coll.any_bottom());
        assert!(coll.any_internal());
        assert_eq!(coll.polygons_count(), 4);
        assert!((coll.total_area() - 400.0).abs() < 1e-9);

        let mut kept = coll.clone();
        kept.keep_type(SurfaceType::INTERNAL);
        assert_eq!(kept.len(), 2);

        coll.remove_types(&[SurfaceType::INTERNAL, SurfaceType::TOP]);
        assert_eq!(coll.len(), 1);
        coll.set_type(SurfaceType::INTERNAL_SOLID);
        assert_eq!(coll.surfaces[0].surface_type, SurfaceType::INTERNAL_SOLID);
        assert_eq!(coll.to_expolygons(), vec![square(40, 10)]);
    }

    #[test]
    fn test_contains_polyline_by_type() {
        let mut coll = SurfaceCollection::new();
        coll.append_with_type(vec![square(0, 100)], SurfaceType::INTERNAL_SOLID);
        coll.append_with_type(vec![square(200, 100)], SurfaceType::BOTTOM_BRIDGE);

        let inside_first = Polyline::from_points(vec![Point::new(10, 10), Point::new(90, 50)]);
        let inside_second = Polyline::from_points(vec![Point::new(210, 10), Point::new(290, 90)]);
        let across = Polyline::from_points(vec![Point::new(50, 50), Point::new(250, 50)]);

        assert!(coll.any_internal_contains(&inside_first));
        assert!(!coll.any_bottom_contains(&inside_first));
        assert!(coll.any_bottom_contains(&inside_second));
        assert!(!coll.any_internal_contains(&inside_second));
        assert!(!coll.any_internal_contains(&across));
        assert!(!coll.any_bottom_contains(&across));
    }
}
