//! Extrusion entities.
//!
//! Paths produced by the fill stage, tagged with what they are for and how
//! much material they carry:
//! - [`ExtrusionPath`]: an open polyline with a role and a cross-section
//! - [`ExtrusionLoop`]: a closed chain of paths
//! - [`ExtrusionEntityCollection`]: an ordered group, optionally pinned to its
//!   order with `no_sort`

use crate::config::Tolerances;
use crate::flow::Flow;
use crate::geometry::{Line, MultiPoint, Point, Polygon, Polyline, Polylines, ThickPolyline};
use crate::CoordF;
use serde::{Deserialize, Serialize};

/// Width granularity for variable-width paths (mm). Adjacent segments whose
/// widths differ by less than this share one path.
pub const VARIABLE_WIDTH_TOLERANCE: CoordF = 0.05;

/// Type of extrusion for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtrusionRole {
    /// External (outer) perimeter.
    ExternalPerimeter,
    /// Internal perimeter.
    Perimeter,
    /// Perimeter printed over air.
    OverhangPerimeter,
    /// Sparse infill.
    InternalInfill,
    /// Solid infill inside the part or on bottom surfaces.
    SolidInfill,
    /// Top solid infill (visible surface).
    TopSolidInfill,
    /// Bridge infill (over gaps).
    BridgeInfill,
    /// Variable-width fill of thin areas.
    GapFill,
    Skirt,
    SupportMaterial,
    SupportMaterialInterface,
}

impl ExtrusionRole {
    /// Check if this role is a perimeter.
    pub fn is_perimeter(&self) -> bool {
        matches!(
            self,
            ExtrusionRole::ExternalPerimeter
                | ExtrusionRole::Perimeter
                | ExtrusionRole::OverhangPerimeter
        )
    }

    /// Check if this role is infill.
    pub fn is_infill(&self) -> bool {
        matches!(
            self,
            ExtrusionRole::InternalInfill
                | ExtrusionRole::SolidInfill
                | ExtrusionRole::TopSolidInfill
                | ExtrusionRole::BridgeInfill
        )
    }

    pub fn is_solid_infill(&self) -> bool {
        matches!(
            self,
            ExtrusionRole::SolidInfill | ExtrusionRole::TopSolidInfill | ExtrusionRole::BridgeInfill
        )
    }

    pub fn is_bridge(&self) -> bool {
        matches!(
            self,
            ExtrusionRole::BridgeInfill | ExtrusionRole::OverhangPerimeter
        )
    }

    /// Check if this role is support.
    pub fn is_support(&self) -> bool {
        matches!(
            self,
            ExtrusionRole::SupportMaterial | ExtrusionRole::SupportMaterialInterface
        )
    }

    /// Get a descriptive name for this role.
    pub fn name(&self) -> &'static str {
        match self {
            ExtrusionRole::ExternalPerimeter => "external perimeter",
            ExtrusionRole::Perimeter => "perimeter",
            ExtrusionRole::OverhangPerimeter => "overhang perimeter",
            ExtrusionRole::InternalInfill => "internal infill",
            ExtrusionRole::SolidInfill => "solid infill",
            ExtrusionRole::TopSolidInfill => "top solid infill",
            ExtrusionRole::BridgeInfill => "bridge infill",
            ExtrusionRole::GapFill => "gap fill",
            ExtrusionRole::Skirt => "skirt",
            ExtrusionRole::SupportMaterial => "support material",
            ExtrusionRole::SupportMaterialInterface => "support interface",
        }
    }
}

/// An open extrusion with a constant cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrusionPath {
    pub polyline: Polyline,
    pub role: ExtrusionRole,
    /// Volume per unit of length (mm³/mm).
    pub mm3_per_mm: CoordF,
    /// Extrusion width (mm).
    pub width: CoordF,
    /// Extrusion height (mm).
    pub height: CoordF,
}

impl ExtrusionPath {
    /// An empty path, used as a template for [`ExtrusionEntityCollection::append_polylines`].
    pub fn new(role: ExtrusionRole) -> Self {
        Self {
            polyline: Polyline::new(),
            role,
            mm3_per_mm: 0.0,
            width: 0.0,
            height: 0.0,
        }
    }

    /// An empty path carrying the cross-section of `flow`.
    pub fn from_flow(role: ExtrusionRole, flow: &Flow) -> Self {
        Self {
            polyline: Polyline::new(),
            role,
            mm3_per_mm: flow.mm3_per_mm(),
            width: flow.width,
            height: flow.height,
        }
    }

    /// Copy this path's attributes onto new geometry.
    pub fn with_polyline(&self, polyline: Polyline) -> Self {
        Self {
            polyline,
            ..self.clone()
        }
    }

    pub fn first_point(&self) -> Option<Point> {
        self.polyline.points().first().copied()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.polyline.points().last().copied()
    }

    /// Path length in scaled units.
    pub fn length(&self) -> CoordF {
        self.polyline.length()
    }

    pub fn is_bridge(&self) -> bool {
        self.role.is_bridge()
    }

    /// Extruded volume (mm³).
    pub fn volume(&self, tol: &Tolerances) -> CoordF {
        tol.unscale(self.length()) * self.mm3_per_mm
    }

    pub fn reverse(&mut self) {
        self.polyline.reverse();
    }
}

/// A closed chain of paths. The last point of each path is the first of the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrusionLoop {
    pub paths: Vec<ExtrusionPath>,
}

impl ExtrusionLoop {
    pub fn new(paths: Vec<ExtrusionPath>) -> Self {
        Self { paths }
    }

    /// A single-path loop around `polygon`, closed back to its first point.
    pub fn from_polygon(polygon: &Polygon, template: &ExtrusionPath) -> Self {
        Self::new(vec![template.with_polyline(polygon.split_at_first_point())])
    }

    pub fn first_point(&self) -> Option<Point> {
        self.paths.first().and_then(ExtrusionPath::first_point)
    }

    pub fn length(&self) -> CoordF {
        self.paths.iter().map(ExtrusionPath::length).sum()
    }

    /// The loop outline without the duplicated closing point.
    pub fn polygon(&self) -> Polygon {
        let mut points: Vec<Point> = Vec::new();
        for path in &self.paths {
            let pts = path.polyline.points();
            let skip = usize::from(!points.is_empty() && points.last() == pts.first());
            points.extend_from_slice(&pts[skip.min(pts.len())..]);
        }
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Polygon::from_points(points)
    }
}

/// Anything a collection can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtrusionEntity {
    Path(ExtrusionPath),
    Loop(ExtrusionLoop),
    Collection(ExtrusionEntityCollection),
}

impl ExtrusionEntity {
    /// Length in scaled units.
    pub fn length(&self) -> CoordF {
        match self {
            ExtrusionEntity::Path(p) => p.length(),
            ExtrusionEntity::Loop(l) => l.length(),
            ExtrusionEntity::Collection(c) => c.total_length(),
        }
    }

    pub fn first_point(&self) -> Option<Point> {
        match self {
            ExtrusionEntity::Path(p) => p.first_point(),
            ExtrusionEntity::Loop(l) => l.first_point(),
            ExtrusionEntity::Collection(c) => c.entities.first().and_then(|e| e.first_point()),
        }
    }

    /// Role of a path or the first path of a loop. Collections have no single role.
    pub fn role(&self) -> Option<ExtrusionRole> {
        match self {
            ExtrusionEntity::Path(p) => Some(p.role),
            ExtrusionEntity::Loop(l) => l.paths.first().map(|p| p.role),
            ExtrusionEntity::Collection(_) => None,
        }
    }
}

impl From<ExtrusionPath> for ExtrusionEntity {
    fn from(path: ExtrusionPath) -> Self {
        ExtrusionEntity::Path(path)
    }
}

impl From<ExtrusionLoop> for ExtrusionEntity {
    fn from(l: ExtrusionLoop) -> Self {
        ExtrusionEntity::Loop(l)
    }
}

impl From<ExtrusionEntityCollection> for ExtrusionEntity {
    fn from(c: ExtrusionEntityCollection) -> Self {
        ExtrusionEntity::Collection(c)
    }
}

/// An ordered group of entities. With `no_sort` set, consumers keep the order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtrusionEntityCollection {
    pub entities: Vec<ExtrusionEntity>,
    pub no_sort: bool,
}

impl ExtrusionEntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtrusionEntity> {
        self.entities.iter()
    }

    pub fn append_entity(&mut self, entity: impl Into<ExtrusionEntity>) {
        self.entities.push(entity.into());
    }

    /// One path per polyline, each a copy of `template` with the polyline's geometry.
    pub fn append_polylines(&mut self, polylines: Polylines, template: &ExtrusionPath) {
        self.entities.extend(
            polylines
                .into_iter()
                .map(|pl| ExtrusionEntity::Path(template.with_polyline(pl))),
        );
    }

    pub fn append_paths(&mut self, paths: Vec<ExtrusionPath>) {
        self.entities.extend(paths.into_iter().map(ExtrusionEntity::Path));
    }

    /// Every path, with nested collections and loops expanded in order.
    pub fn flatten(&self) -> Vec<ExtrusionPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths(&self, out: &mut Vec<ExtrusionPath>) {
        for entity in &self.entities {
            match entity {
                ExtrusionEntity::Path(p) => out.push(p.clone()),
                ExtrusionEntity::Loop(l) => out.extend(l.paths.iter().cloned()),
                ExtrusionEntity::Collection(c) => c.collect_paths(out),
            }
        }
    }

    /// Total length in scaled units.
    pub fn total_length(&self) -> CoordF {
        self.entities.iter().map(ExtrusionEntity::length).sum()
    }

    /// Total extruded volume (mm³).
    pub fn total_volume(&self, tol: &Tolerances) -> CoordF {
        self.flatten().iter().map(|p| p.volume(tol)).sum()
    }
}

impl<'a> IntoIterator for &'a ExtrusionEntityCollection {
    type Item = &'a ExtrusionEntity;
    type IntoIter = std::slice::Iter<'a, ExtrusionEntity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

/// Split a width-annotated polyline into constant-width paths.
///
/// Segments whose widths differ by more than [`VARIABLE_WIDTH_TOLERANCE`]
/// are subdivided first. Each path takes the larger width of its first
/// segment; its volume comes from `flow` with that width. A chain that closes
/// on itself becomes a loop.
pub fn thick_polyline_to_entity(
    polyline: &ThickPolyline,
    role: ExtrusionRole,
    flow: &Flow,
    tol: &Tolerances,
) -> Option<ExtrusionEntity> {
    let tolerance = tol.scale_f(VARIABLE_WIDTH_TOLERANCE);
    let min_len = tol.scaled_epsilon() as CoordF;

    let mut paths: Vec<ExtrusionPath> = Vec::new();
    let mut current: Option<(ExtrusionPath, CoordF)> = None;

    for line in subdivide_thick_lines(polyline, tolerance) {
        let Line { a, b } = line.0;
        if a.distance(&b) < min_len {
            continue;
        }
        let width = line.1.max(line.2);
        match current.as_mut() {
            Some((path, w)) if (*w - width).abs() <= tolerance => path.polyline.push(b),
            _ => {
                if let Some((path, _)) = current.take() {
                    paths.push(path);
                }
                let seg_flow = Flow {
                    width: tol.unscale(width),
                    ..*flow
                };
                let mut path = ExtrusionPath::from_flow(role, &seg_flow);
                path.polyline = Polyline::from_points(vec![a, b]);
                current = Some((path, width));
            }
        }
    }
    if let Some((path, _)) = current {
        paths.push(path);
    }

    let first = paths.first()?.first_point();
    let last = paths.last()?.last_point();
    if first == last {
        Some(ExtrusionEntity::Loop(ExtrusionLoop::new(paths)))
    } else if paths.len() == 1 {
        paths.pop().map(ExtrusionEntity::Path)
    } else {
        let mut coll = ExtrusionEntityCollection::new();
        coll.append_paths(paths);
        Some(ExtrusionEntity::Collection(coll))
    }
}

/// Segments of `polyline` with start and end widths, split so that no segment
/// changes width by more than `tolerance`.
fn subdivide_thick_lines(polyline: &ThickPolyline, tolerance: CoordF) -> Vec<(Line, CoordF, CoordF)> {
    let mut out = Vec::new();
    for tl in polyline.thicklines() {
        let delta = (tl.a_width - tl.b_width).abs();
        if delta <= tolerance || tolerance <= 0.0 {
            out.push((tl.line, tl.a_width, tl.b_width));
            continue;
        }
        let segments = (delta / tolerance).ceil() as usize;
        let len = tl.line.length();
        let mut prev = tl.line.a;
        let mut prev_w = tl.a_width;
        for j in 1..=segments {
            let t = j as CoordF / segments as CoordF;
            let p = if j == segments {
                tl.line.b
            } else {
                tl.line.point_at(len * t)
            };
            let w = tl.a_width + (tl.b_width - tl.a_width) * t;
            out.push((Line::new(prev, p), prev_w, w));
            prev = p;
            prev_w = w;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tol() -> Tolerances {
        Tolerances::new(1000.0)
    }

    fn infill_template() -> ExtrusionPath {
        let flow = Flow::new(0.45, 0.2, 0.4).unwrap();
        ExtrusionPath::from_flow(ExtrusionRole::InternalInfill, &flow)
    }

    #[test]
    fn test_role_predicates() {
        assert!(ExtrusionRole::ExternalPerimeter.is_perimeter());
        assert!(ExtrusionRole::BridgeInfill.is_infill());
        assert!(ExtrusionRole::BridgeInfill.is_bridge());
        assert!(ExtrusionRole::TopSolidInfill.is_solid_infill());
        assert!(!ExtrusionRole::InternalInfill.is_solid_infill());
        assert!(!ExtrusionRole::GapFill.is_infill());
        assert!(ExtrusionRole::SupportMaterialInterface.is_support());
        assert_eq!(ExtrusionRole::GapFill.name(), "gap fill");
    }

    #[test]
    fn test_append_polylines_copies_template() {
        let mut coll = ExtrusionEntityCollection::new();
        let template = infill_template();
        coll.append_polylines(
            vec![
                Polyline::from_points(vec![Point::new(0, 0), Point::new(1000, 0)]),
                Polyline::from_points(vec![Point::new(0, 500), Point::new(2000, 500)]),
            ],
            &template,
        );
        assert_eq!(coll.len(), 2);
        assert!((coll.total_length() - 3000.0).abs() < 1e-9);
        for path in coll.flatten() {
            assert_eq!(path.role, ExtrusionRole::InternalInfill);
            assert!((path.width - 0.45).abs() < 1e-12);
            assert!((path.mm3_per_mm - template.mm3_per_mm).abs() < 1e-12);
        }
        // 3mm of path at the template's volume rate.
        assert!((coll.total_volume(&tol()) - 3.0 * template.mm3_per_mm).abs() < 1e-9);
    }

    #[test]
    fn test_flatten_nested() {
        let template = infill_template();
        let mut inner = ExtrusionEntityCollection::new();
        inner.append_polylines(
            vec![Polyline::from_points(vec![Point::new(0, 0), Point::new(10, 0)])],
            &template,
        );
        let square = Polygon::rectangle(Point::new(0, 0), Point::new(100, 100));
        let mut outer = ExtrusionEntityCollection::new();
        outer.append_entity(inner);
        outer.append_entity(ExtrusionLoop::from_polygon(&square, &template));
        assert_eq!(outer.len(), 2);
        assert_eq!(outer.flatten().len(), 2);
        assert!((outer.total_length() - 410.0).abs() < 1e-9);
        assert_eq!(outer.entities[0].first_point(), Some(Point::new(0, 0)));
        assert_eq!(outer.entities[0].role(), None);
        assert_eq!(outer.entities[1].role(), Some(ExtrusionRole::InternalInfill));
    }

    #[test]
    fn test_loop_polygon() {
        let square = Polygon::rectangle(Point::new(0, 0), Point::new(100, 100));
        let l = ExtrusionLoop::from_polygon(&square, &infill_template());
        assert_eq!(l.polygon(), square);
        assert!((l.length() - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_thick_polyline_constant_width() {
        let mut thick = ThickPolyline::new();
        thick.push(Point::new(0, 0), 300.0);
        thick.push(Point::new(5000, 0), 300.0);
        thick.push(Point::new(10000, 0), 310.0);
        let flow = Flow::new(0.3, 0.2, 0.4).unwrap();
        let entity = thick_polyline_to_entity(&thick, ExtrusionRole::GapFill, &flow, &tol()).unwrap();
        match entity {
            ExtrusionEntity::Path(path) => {
                assert_eq!(path.polyline.len(), 3);
                assert!((path.width - 0.3).abs() < 1e-9);
                assert_eq!(path.role, ExtrusionRole::GapFill);
            }
            other => panic!("expected a single path, got {:?}", other),
        }
    }

    #[test]
    fn test_thick_polyline_width_steps() {
        let mut thick = ThickPolyline::new();
        thick.push(Point::new(0, 0), 200.0);
        thick.push(Point::new(10000, 0), 400.0);
        let flow = Flow::new(0.3, 0.2, 0.4).unwrap();
        let entity = thick_polyline_to_entity(&thick, ExtrusionRole::GapFill, &flow, &tol()).unwrap();
        let ExtrusionEntity::Collection(coll) = entity else {
            panic!("expected a collection");
        };
        let paths = coll.flatten();
        assert!(paths.len() >= 2);
        let widths: Vec<CoordF> = paths.iter().map(|p| p.width).collect();
        assert!(widths.windows(2).all(|w| w[0] < w[1]));
        assert!(widths.iter().all(|w| (0.2..=0.4 + 1e-9).contains(w)));
        assert!((coll.total_length() - 10000.0).abs() < 1.0);
    }

    #[test]
    fn test_thick_polyline_loop() {
        let mut thick = ThickPolyline::new();
        for p in [(0, 0), (1000, 0), (1000, 1000), (0, 1000), (0, 0)] {
            thick.push(Point::new(p.0, p.1), 100.0);
        }
        let flow = Flow::new(0.1, 0.2, 0.4).unwrap();
        let entity = thick_polyline_to_entity(&thick, ExtrusionRole::GapFill, &flow, &tol()).unwrap();
        assert!(matches!(entity, ExtrusionEntity::Loop(_)));

        assert!(thick_polyline_to_entity(&ThickPolyline::new(), ExtrusionRole::GapFill, &flow, &tol())
            .is_none());
    }
}
