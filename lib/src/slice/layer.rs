//! Layers and the per-region state they own.

use super::{SurfaceCollection, SurfaceKind, SurfaceType};
use crate::clipper::{union_ex, union_safe};
use crate::config::{FillConfig, FlowConfig, Tolerances};
use crate::extrusion::{thick_polyline_to_entity, ExtrusionEntityCollection, ExtrusionRole};
use crate::flow::{Flow, FlowResolver, FlowRole, RegionFlowResolver};
use crate::geometry::{
    chained_path, BoundingBox, ExPolygon, ExPolygonCollection, MultiPoint, Polygons, Polyline,
    Polylines,
};
use crate::infill::{make_fill, FillContext, FillRegistry};
use crate::{CoordF, Result};
use log::debug;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;

/// Support-only geometry of a support layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SupportData {
    pub support_islands: ExPolygonCollection,
    pub support_fills: ExtrusionEntityCollection,
    pub support_interface_fills: ExtrusionEntityCollection,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum LayerKind {
    #[default]
    Normal,
    Support(SupportData),
}

/// One print region's share of a layer.
///
/// Created by [`Layer::add_region`] and carried through slicing, surface
/// classification, perimeters and fill. The raw slices sit behind a lock so
/// readers on other threads never observe a half-merged collection.
pub struct LayerRegion {
    pub region_id: usize,
    layer_id: usize,
    layer_height: CoordF,
    print_z: CoordF,
    pub fill_config: FillConfig,
    pub flow_resolver: RegionFlowResolver,
    slices: RwLock<SurfaceCollection>,
    /// Surfaces to fill, as classified upstream.
    pub fill_surfaces: SurfaceCollection,
    /// Variable-width paths for regions too thin for perimeters.
    pub thin_fills: ExtrusionEntityCollection,
    pub perimeters: ExtrusionEntityCollection,
    /// Output of [`LayerRegion::make_fill`]: one collection per filled surface.
    pub fills: ExtrusionEntityCollection,
    /// Areas printed as bridges, which need no support.
    pub bridged: Polygons,
    pub unsupported_bridge_edges: Polylines,
}

impl LayerRegion {
    fn new(
        region_id: usize,
        layer: &Layer,
        fill_config: FillConfig,
        flow_config: FlowConfig,
    ) -> Self {
        Self {
            region_id,
            layer_id: layer.id,
            layer_height: layer.height,
            print_z: layer.print_z,
            fill_config,
            flow_resolver: RegionFlowResolver::new(flow_config),
            slices: RwLock::new(SurfaceCollection::new()),
            fill_surfaces: SurfaceCollection::new(),
            thin_fills: ExtrusionEntityCollection::new(),
            perimeters: ExtrusionEntityCollection::new(),
            fills: ExtrusionEntityCollection::new(),
            bridged: Vec::new(),
            unsupported_bridge_edges: Vec::new(),
        }
    }

    #[inline]
    pub fn layer_id(&self) -> usize {
        self.layer_id
    }

    #[inline]
    pub fn layer_height(&self) -> CoordF {
        self.layer_height
    }

    #[inline]
    pub fn print_z(&self) -> CoordF {
        self.print_z
    }

    pub fn slices(&self) -> RwLockReadGuard<'_, SurfaceCollection> {
        self.slices.read()
    }

    pub fn slices_mut(&self) -> RwLockWriteGuard<'_, SurfaceCollection> {
        self.slices.write()
    }

    pub fn set_slices(&self, slices: SurfaceCollection) {
        *self.slices.write() = slices;
    }

    /// Flow for `role` at this layer's height.
    pub fn flow(&self, role: FlowRole, bridge: bool, width: Option<CoordF>) -> Result<Flow> {
        Ok(self.flow_resolver.flow(
            role,
            self.layer_height,
            bridge,
            self.layer_id == 0,
            width,
        )?)
    }

    /// Merge the slices into plain internal surfaces.
    pub fn merge_slices(&self, tol: &Tolerances) {
        let mut slices = self.slices.write();
        let merged = union_safe(&slices.to_expolygons(), tol.safety_offset);
        slices.clear();
        slices.append_with_type(merged, SurfaceType::INTERNAL);
    }

    /// Retag fill surfaces according to the solid layer counts and the
    /// small-area threshold.
    pub fn prepare_fill_surfaces(&mut self, tol: &Tolerances) {
        let config = &self.fill_config;
        let min_area = tol.scale_f(tol.scale_f(config.solid_infill_below_area));
        let sparse = config.fill_density > 0.0 && config.fill_density < 100.0;
        let mut retagged = 0usize;

        for surface in &mut self.fill_surfaces.surfaces {
            let before = surface.surface_type;
            if config.top_solid_layers == 0 && surface.surface_type.kind == SurfaceKind::Top {
                surface.surface_type = if config.infill_only_where_needed {
                    SurfaceType::INTERNAL_VOID
                } else {
                    SurfaceType::INTERNAL
                };
            }
            if config.bottom_solid_layers == 0 && surface.surface_type.is_bottom() {
                surface.surface_type = SurfaceType::INTERNAL;
            }
            if sparse && surface.surface_type == SurfaceType::INTERNAL && surface.area() <= min_area
            {
                surface.surface_type = SurfaceType::INTERNAL_SOLID;
            }
            if surface.surface_type != before {
                retagged += 1;
            }
        }
        debug!(
            "region {} layer {}: retagged {} fill surfaces",
            self.region_id, self.layer_id, retagged
        );
    }

    /// Smallest area worth filling (scaled units squared).
    pub fn infill_area_threshold(&self, tol: &Tolerances) -> Result<CoordF> {
        let spacing = self.flow(FlowRole::SolidInfill, false, None)?.scaled_spacing(tol) as CoordF;
        Ok(spacing * spacing)
    }

    /// Fill the region's surfaces, replacing `fills`.
    pub fn make_fill(
        &mut self,
        registry: &FillRegistry,
        bounding_box: BoundingBox,
        tol: &Tolerances,
    ) -> Result<()> {
        let ctx = FillContext {
            layer_id: self.layer_id,
            layer_height: self.layer_height,
            print_z: self.print_z,
            bounding_box,
            config: &self.fill_config,
            flows: &self.flow_resolver,
            registry,
            tolerances: *tol,
        };
        self.fills = make_fill(&ctx, &self.fill_surfaces, &self.thin_fills)?;
        Ok(())
    }

    /// Add gap fill along the medial axis of `expolygons`. Widths are in mm.
    /// Returns the number of entities added.
    pub fn add_thin_fills(
        &mut self,
        expolygons: &[ExPolygon],
        min_width: CoordF,
        max_width: CoordF,
        tol: &Tolerances,
    ) -> Result<usize> {
        let flow = self.flow(FlowRole::Perimeter, false, None)?;
        let (min, max) = (tol.scale_f(min_width), tol.scale_f(max_width));
        let before = self.thin_fills.len();
        for expolygon in expolygons {
            for polyline in expolygon.medial_axis(min, max) {
                if let Some(entity) =
                    thick_polyline_to_entity(&polyline, ExtrusionRole::GapFill, &flow, tol)
                {
                    self.thin_fills.append_entity(entity);
                }
            }
        }
        Ok(self.thin_fills.len() - before)
    }
}

impl fmt::Debug for LayerRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LayerRegion(region_id={}, {} slices, {} fill surfaces, {} fills)",
            self.region_id,
            self.slices.read().len(),
            self.fill_surfaces.len(),
            self.fills.len()
        )
    }
}

/// A horizontal slice of an object.
#[derive(Debug)]
pub struct Layer {
    id: usize,
    /// Layer height (mm). Mirrored into every region.
    height: CoordF,
    /// Top of the layer (mm). Mirrored into every region.
    print_z: CoordF,
    /// Height the mesh was cut at (mm).
    pub slice_z: CoordF,
    /// Islands: every region and surface type merged.
    pub slices: ExPolygonCollection,
    regions: Vec<LayerRegion>,
    pub lower_layer_id: Option<usize>,
    pub upper_layer_id: Option<usize>,
    pub slicing_errors: bool,
    /// Bounding box of the whole object, used to align fill patterns.
    pub bounding_box: BoundingBox,
    pub kind: LayerKind,
}

impl Layer {
    pub fn new(id: usize, height: CoordF, print_z: CoordF, slice_z: CoordF) -> Self {
        Self {
            id,
            height,
            print_z,
            slice_z,
            slices: ExPolygonCollection::new(),
            regions: Vec::new(),
            lower_layer_id: None,
            upper_layer_id: None,
            slicing_errors: false,
            bounding_box: BoundingBox::new(),
            kind: LayerKind::Normal,
        }
    }

    pub fn support(
        id: usize,
        height: CoordF,
        print_z: CoordF,
        slice_z: CoordF,
        data: SupportData,
    ) -> Self {
        Self {
            kind: LayerKind::Support(data),
            ..Self::new(id, height, print_z, slice_z)
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn set_id(&mut self, id: usize) {
        self.id = id;
        for region in &mut self.regions {
            region.layer_id = id;
        }
    }

    #[inline]
    pub fn height(&self) -> CoordF {
        self.height
    }

    pub fn set_height(&mut self, height: CoordF) {
        self.height = height;
        for region in &mut self.regions {
            region.layer_height = height;
        }
    }

    #[inline]
    pub fn print_z(&self) -> CoordF {
        self.print_z
    }

    pub fn set_print_z(&mut self, print_z: CoordF) {
        self.print_z = print_z;
        for region in &mut self.regions {
            region.print_z = print_z;
        }
    }

    pub fn is_support(&self) -> bool {
        matches!(self.kind, LayerKind::Support(_))
    }

    pub fn support_data(&self) -> Option<&SupportData> {
        match &self.kind {
            LayerKind::Support(data) => Some(data),
            LayerKind::Normal => None,
        }
    }

    #[inline]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn regions(&self) -> &[LayerRegion] {
        &self.regions
    }

    pub fn get_region(&self, idx: usize) -> Option<&LayerRegion> {
        self.regions.get(idx)
    }

    pub fn get_region_mut(&mut self, idx: usize) -> Option<&mut LayerRegion> {
        self.regions.get_mut(idx)
    }

    /// Attach a print region to this layer.
    pub fn add_region(
        &mut self,
        region_id: usize,
        fill_config: FillConfig,
        flow_config: FlowConfig,
    ) -> &mut LayerRegion {
        let region = LayerRegion::new(region_id, self, fill_config, flow_config);
        self.regions.push(region);
        let last = self.regions.len() - 1;
        &mut self.regions[last]
    }

    pub fn clear_regions(&mut self) {
        self.regions.clear();
    }

    pub fn delete_region(&mut self, idx: usize) -> Option<LayerRegion> {
        (idx < self.regions.len()).then(|| self.regions.remove(idx))
    }

    /// Rebuild the islands from the region slices, ordered so consecutive
    /// islands are close to each other.
    pub fn make_slices(&mut self) {
        let islands = match self.regions.as_slice() {
            [region] => region.slices().to_expolygons(),
            regions => {
                let all: Vec<ExPolygon> = regions
                    .iter()
                    .flat_map(|r| r.slices().to_expolygons())
                    .collect();
                union_ex(&all)
            }
        };
        let starts: Vec<_> = islands.iter().map(|e| e.contour.first_point()).collect();
        let ordered = chained_path(&starts, None)
            .into_iter()
            .map(|i| islands[i].clone())
            .collect();
        self.slices = ExPolygonCollection::from_expolygons(ordered);
    }

    /// Merge the slices of every region. A single region takes the islands
    /// directly.
    pub fn merge_slices(&self, tol: &Tolerances) {
        if let [region] = self.regions.as_slice() {
            let mut slices = region.slices_mut();
            slices.clear();
            slices.append_with_type(self.slices.iter().cloned().collect(), SurfaceType::INTERNAL);
        } else {
            for region in &self.regions {
                region.merge_slices(tol);
            }
        }
    }

    /// Generate the fills of every region.
    pub fn make_fills(&mut self, registry: &FillRegistry, tol: &Tolerances) -> Result<()> {
        let bounding_box = self.bounding_box;
        for region in &mut self.regions {
            region.make_fill(registry, bounding_box, tol)?;
        }
        debug!(
            "layer {}: filled {} regions, {} collections",
            self.id,
            self.regions.len(),
            self.regions.iter().map(|r| r.fills.len()).sum::<usize>()
        );
        Ok(())
    }

    pub fn any_internal_region_slice_contains(&self, polyline: &Polyline) -> bool {
        self.regions
            .iter()
            .any(|r| r.slices().any_internal_contains(polyline))
    }

    pub fn any_bottom_region_slice_contains(&self, polyline: &Polyline) -> bool {
        self.regions
            .iter()
            .any(|r| r.slices().any_bottom_contains(polyline))
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layer {} at z={:.3}mm (height={:.3}mm, {} regions)",
            self.id,
            self.print_z,
            self.height,
            self.regions.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Polygon};
    use crate::slice::Surface;

    fn tol() -> Tolerances {
        Tolerances::new(100.0)
    }

    fn square(x: i64, y: i64, size: i64) -> ExPolygon {
        Polygon::rectangle(Point::new(x, y), Point::new(x + size, y + size)).into()
    }

    fn layer_with_region(id: usize) -> Layer {
        let mut layer = Layer::new(id, 0.2, 0.2 * (id + 1) as CoordF, 0.2 * id as CoordF + 0.1);
        layer.add_region(0, FillConfig::default(), FlowConfig::default());
        layer
    }

    #[test]
    fn test_regions() {
        let mut layer = layer_with_region(3);
        layer.add_region(7, FillConfig::default(), FlowConfig::default());
        assert_eq!(layer.region_count(), 2);
        assert_eq!(layer.get_region(1).map(|r| r.region_id), Some(7));
        assert_eq!(layer.get_region(1).map(LayerRegion::layer_id), Some(3));

        layer.set_id(5);
        assert!(layer.regions().iter().all(|r| r.layer_id() == 5));

        assert_eq!(layer.delete_region(0).map(|r| r.region_id), Some(0));
        assert!(layer.delete_region(4).is_none());
        assert_eq!(layer.region_count(), 1);
        layer.clear_regions();
        assert_eq!(layer.region_count(), 0);
        assert!(!layer.is_support());
    }

    #[test]
    fn test_height_changes_reach_regions() {
        let mut layer = layer_with_region(1);
        layer.add_region(1, FillConfig::default(), FlowConfig::default());
        layer.set_height(0.3);
        layer.set_print_z(0.7);
        assert_eq!(layer.height(), 0.3);
        assert_eq!(layer.print_z(), 0.7);
        for region in layer.regions() {
            assert_eq!(region.layer_height(), 0.3);
            assert_eq!(region.print_z(), 0.7);
            let flow = region.flow(FlowRole::Infill, false, None).expect("flow");
            assert!((flow.height - 0.3).abs() < 1e-9);
        }

        // Regions added afterwards pick up the current values.
        let added = layer.add_region(2, FillConfig::default(), FlowConfig::default());
        assert_eq!(added.layer_height(), 0.3);
        assert_eq!(added.print_z(), 0.7);
    }

    #[test]
    fn test_support_layer() {
        let mut data = SupportData::default();
        data.support_islands.push(square(0, 0, 100));
        let layer = Layer::support(2, 0.2, 0.6, 0.5, data);
        assert!(layer.is_support());
        assert_eq!(layer.support_data().map(|d| d.support_islands.len()), Some(1));
    }

    #[test]
    fn test_make_slices_single_region_is_chained() {
        let mut layer = layer_with_region(0);
        layer.regions[0].set_slices(SurfaceCollection::from_surfaces(vec![
            Surface::new(SurfaceType::INTERNAL, square(0, 0, 100)),
            Surface::new(SurfaceType::TOP, square(2000, 0, 100)),
            Surface::new(SurfaceType::INTERNAL, square(1000, 0, 100)),
        ]));
        layer.make_slices();
        let xs: Vec<_> = layer.slices.iter().map(|e| e.contour.first_point().x).collect();
        assert_eq!(xs, vec![0, 1000, 2000]);
    }

    #[test]
    fn test_make_slices_unions_regions() {
        let mut layer = layer_with_region(0);
        layer.add_region(1, FillConfig::default(), FlowConfig::default());
        layer.regions[0].set_slices(SurfaceCollection::from_surfaces(vec![Surface::new(
            SurfaceType::INTERNAL,
            square(0, 0, 1000),
        )]));
        layer.regions[1].set_slices(SurfaceCollection::from_surfaces(vec![Surface::new(
            SurfaceType::TOP,
            square(500, 0, 1000),
        )]));
        layer.make_slices();
        assert_eq!(layer.slices.len(), 1);
        let area: CoordF = layer.slices.iter().map(ExPolygon::area).sum();
        assert!((area - 1_500_000.0).abs() < 1.0);
    }

    #[test]
    fn test_merge_slices() {
        let layer = layer_with_region(0);
        layer.regions[0].set_slices(SurfaceCollection::from_surfaces(vec![
            Surface::new(SurfaceType::TOP, square(0, 0, 1000)),
            Surface::new(SurfaceType::INTERNAL, square(1000, 0, 1000)),
        ]));
        layer.regions[0].merge_slices(&tol());
        let slices = layer.regions[0].slices();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices.surfaces[0].surface_type, SurfaceType::INTERNAL);
        assert!((slices.total_area() - 2_000_000.0).abs() < 10_000.0);
    }

    #[test]
    fn test_layer_merge_slices_uses_islands() {
        let mut layer = layer_with_region(0);
        layer.slices = ExPolygonCollection::from_expolygons(vec![square(0, 0, 500)]);
        layer.merge_slices(&tol());
        let slices = layer.regions[0].slices();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices.surfaces[0].expolygon, square(0, 0, 500));
    }

    #[test]
    fn test_prepare_fill_surfaces() {
        let tol = tol();
        let mut layer = layer_with_region(1);
        let region = &mut layer.regions[0];
        region.fill_config.top_solid_layers = 0;
        region.fill_config.bottom_solid_layers = 0;
        region.fill_surfaces = SurfaceCollection::from_surfaces(vec![
            Surface::new(SurfaceType::TOP, square(0, 0, 2000)),
            Surface::new(SurfaceType::BOTTOM_BRIDGE, square(3000, 0, 2000)),
            // 5 x 5 mm is below the default 70 mm² threshold.
            Surface::new(SurfaceType::INTERNAL, square(6000, 0, 500)),
            Surface::new(SurfaceType::INTERNAL, square(7000, 0, 1000)),
        ]);
        region.prepare_fill_surfaces(&tol);
        let types: Vec<_> = region.fill_surfaces.iter().map(|s| s.surface_type).collect();
        assert_eq!(
            types,
            vec![
                SurfaceType::INTERNAL,
                SurfaceType::INTERNAL,
                SurfaceType::INTERNAL_SOLID,
                SurfaceType::INTERNAL,
            ]
        );

        region.fill_config.infill_only_where_needed = true;
        region.fill_surfaces = SurfaceCollection::from_surfaces(vec![Surface::new(
            SurfaceType::TOP,
            square(0, 0, 2000),
        )]);
        region.prepare_fill_surfaces(&tol);
        assert_eq!(region.fill_surfaces.surfaces[0].surface_type, SurfaceType::INTERNAL_VOID);
    }

    #[test]
    fn test_infill_area_threshold() {
        let layer = layer_with_region(2);
        // Solid infill spacing at 0.2 mm is about 0.628 mm, 63 units.
        let threshold = layer.regions[0].infill_area_threshold(&tol()).expect("flow");
        assert!((threshold - 3969.0).abs() < 1e-9);
    }

    #[test]
    fn test_make_fills() {
        let tol = tol();
        let mut layer = layer_with_region(2);
        layer.regions[0].fill_config = FillConfig::default()
            .fill_density(30.0)
            .fill_pattern(crate::config::InfillPattern::Rectilinear);
        layer.regions[0].fill_surfaces = SurfaceCollection::from_surfaces(vec![
            Surface::new(SurfaceType::INTERNAL, square(0, 0, 1000)),
            Surface::new(SurfaceType::TOP, square(2000, 0, 1000)),
        ]);
        layer.make_fills(&FillRegistry::new(), &tol).expect("fill");

        let fills = &layer.regions[0].fills;
        assert_eq!(fills.len(), 2);
        let roles: Vec<_> = fills.flatten().iter().map(|p| p.role).collect();
        assert!(roles.contains(&ExtrusionRole::InternalInfill));
        assert!(roles.contains(&ExtrusionRole::TopSolidInfill));
    }

    #[test]
    fn test_thin_fills_follow_medial_axis() {
        let tol = tol();
        let mut layer = layer_with_region(1);
        let mut hole = Polygon::rectangle(Point::new(100, 100), Point::new(1900, 1900));
        hole.make_clockwise();
        let frame = ExPolygon::with_holes(
            Polygon::rectangle(Point::new(0, 0), Point::new(2000, 2000)),
            vec![hole],
        );
        let region = &mut layer.regions[0];
        let added = region.add_thin_fills(&[frame], 1.0, 8.0, &tol).expect("flow");
        assert_eq!(added, 4);
        for path in region.thin_fills.flatten() {
            assert_eq!(path.role, ExtrusionRole::GapFill);
            assert!((path.width - 1.0).abs() < 0.2, "width {}", path.width);
        }

        // Thin fills are passed through the fill stage one per collection.
        region.fill_surfaces = SurfaceCollection::new();
        region.make_fill(&FillRegistry::new(), BoundingBox::new(), &tol).expect("fill");
        assert_eq!(region.fills.len(), 4);
    }

    #[test]
    fn test_region_slice_queries() {
        let layer = layer_with_region(0);
        layer.regions[0].set_slices(SurfaceCollection::from_surfaces(vec![
            Surface::new(SurfaceType::INTERNAL, square(0, 0, 1000)),
            Surface::new(SurfaceType::BOTTOM, square(2000, 0, 1000)),
        ]));
        let inner = Polyline::from_points(vec![Point::new(100, 100), Point::new(900, 900)]);
        let lower = Polyline::from_points(vec![Point::new(2100, 100), Point::new(2900, 500)]);
        assert!(layer.any_internal_region_slice_contains(&inner));
        assert!(!layer.any_bottom_region_slice_contains(&inner));
        assert!(layer.any_bottom_region_slice_contains(&lower));
    }
}
