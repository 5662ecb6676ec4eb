//! Turns a layer region's classified fill surfaces into extrusions.
//!
//! Three stages:
//!
//! 1. [`merge_surfaces`]: group surfaces with equal attributes, merge solid
//!    groups that would be printed identically, and make the groups disjoint.
//!    Bridges with a known direction are placed first.
//! 2. [`rescue_narrow_surfaces`]: regions too thin to survive the line
//!    spacing are grown into neighbouring void and refilled solid.
//! 3. Dispatch every surface to its pattern generator and wrap the lines in
//!    role-tagged collections.

use super::{FillParams, FillRegistry, InfillPattern, LOOP_CLIPPING_LENGTH_OVER_NOZZLE_DIAMETER};
use crate::clipper::{
    difference_safe, intersection_safe, offset2, offset_expolygons, union_ex, union_safe,
    OffsetJoinType,
};
use crate::config::{FillConfig, Tolerances};
use crate::extrusion::{ExtrusionEntityCollection, ExtrusionPath, ExtrusionRole};
use crate::flow::{Flow, FlowResolver, FlowRole};
use crate::geometry::{deg2rad, BoundingBox, ExPolygons};
use crate::slice::{Surface, SurfaceCollection, SurfaceKind, SurfaceType};
use crate::{Coord, CoordF, Result};
use log::{debug, trace};

/// Everything the orchestrator needs to know about the layer being filled.
pub struct FillContext<'a> {
    pub layer_id: usize,
    /// Layer height (mm), used for surfaces without their own thickness.
    pub layer_height: CoordF,
    /// Print height of the layer (mm).
    pub print_z: CoordF,
    /// Bounding box of the whole object.
    pub bounding_box: BoundingBox,
    pub config: &'a FillConfig,
    pub flows: &'a dyn FlowResolver,
    pub registry: &'a FillRegistry,
    pub tolerances: Tolerances,
}

impl FillContext<'_> {
    /// Flow for `role` at the layer height, without bridging.
    fn layer_flow(&self, role: FlowRole) -> Result<Flow> {
        Ok(self
            .flows
            .flow(role, self.layer_height, false, self.layer_id == 0, None)?)
    }
}

/// Attributes deciding whether two solid groups can be filled as one.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SolidGroupKey {
    width: CoordF,
    pattern: InfillPattern,
}

fn solid_group_key(
    surface: &Surface,
    config: &FillConfig,
    solid_width: CoordF,
    top_solid_width: CoordF,
) -> Option<SolidGroupKey> {
    if !surface.is_solid() || surface.is_bridge() {
        return None;
    }
    let key = if surface.is_top() {
        SolidGroupKey {
            width: top_solid_width,
            pattern: config.top_infill_pattern,
        }
    } else if surface.is_bottom() {
        SolidGroupKey {
            width: solid_width,
            pattern: config.bottom_infill_pattern,
        }
    } else {
        SolidGroupKey {
            width: solid_width,
            pattern: InfillPattern::Rectilinear,
        }
    };
    Some(key)
}

/// Merge and separate the fill surfaces of one region.
///
/// Each emitted surface copies the attributes of the first member of its
/// group. Bridges with a known direction are processed first and subtracted
/// from every other group. All area emitted earlier in the pass is
/// subtracted as well, so those bridges are removed twice from later groups;
/// both subtractions use the safety offset and the result stays disjoint.
pub fn merge_surfaces(
    fill_surfaces: &SurfaceCollection,
    config: &FillConfig,
    solid_width: CoordF,
    top_solid_width: CoordF,
    tol: &Tolerances,
) -> SurfaceCollection {
    let bridged: ExPolygons = union_ex(
        &fill_surfaces
            .iter()
            .filter(|s| s.is_oriented_bridge())
            .map(|s| s.expolygon.clone())
            .collect::<Vec<_>>(),
    );

    let mut groups = fill_surfaces.group();
    let mut keys: Vec<Option<SolidGroupKey>> = groups
        .iter()
        .map(|g| solid_group_key(g[0], config, solid_width, top_solid_width))
        .collect();

    for i in 0..groups.len() {
        if keys[i].is_none() {
            continue;
        }
        let mut j = i + 1;
        while j < groups.len() {
            if keys[j] == keys[i] {
                let merged = groups.remove(j);
                keys.remove(j);
                groups[i].extend(merged);
            } else {
                j += 1;
            }
        }
    }

    let mut out = SurfaceCollection::new();
    for oriented_round in [true, false] {
        for group in &groups {
            let template = group[0];
            if template.is_oriented_bridge() != oriented_round {
                continue;
            }
            let members: ExPolygons = group.iter().map(|s| s.expolygon.clone()).collect();
            let mut area = union_safe(&members, tol.safety_offset);
            if !oriented_round && !bridged.is_empty() {
                area = difference_safe(&area, &bridged, tol.safety_offset);
            }
            let remainder = difference_safe(&area, &out.to_expolygons(), tol.safety_offset);
            out.append_from_template(remainder, template);
        }
    }
    debug!(
        "merged {} fill surfaces in {} groups into {} surfaces",
        fill_surfaces.len(),
        groups.len(),
        out.len()
    );
    out
}

/// Find regions that an opening by `distance` would erase, grow them by
/// `distance` into themselves and any internal void, and append the result
/// as internal solid surfaces. Returns the number of surfaces appended.
pub fn rescue_narrow_surfaces(
    surfaces: &mut SurfaceCollection,
    distance: Coord,
    tol: &Tolerances,
) -> usize {
    if distance <= 0 || surfaces.is_empty() {
        return 0;
    }
    let d = distance as CoordF;
    let all = surfaces.to_expolygons();
    let opened = offset2(&all, -d / 2.0, d / 2.0, OffsetJoinType::Miter);
    let collapsed = difference_safe(&all, &opened, tol.safety_offset);
    if collapsed.is_empty() {
        return 0;
    }

    let mut targets = surfaces.expolygons_by_type(SurfaceType::INTERNAL_VOID);
    targets.extend(collapsed.iter().cloned());
    let grown = offset_expolygons(&collapsed, d, OffsetJoinType::Miter);
    let rescued = intersection_safe(&grown, &targets, tol.safety_offset);
    let count = rescued.len();
    surfaces.append_with_type(rescued, SurfaceType::INTERNAL_SOLID);
    debug!("rescued {} narrow regions at distance {}", count, distance);
    count
}

/// Generate the fills of one layer region.
///
/// Returns one collection per filled surface, followed by one collection per
/// entity of `thin_fills`.
pub fn make_fill(
    ctx: &FillContext<'_>,
    fill_surfaces: &SurfaceCollection,
    thin_fills: &ExtrusionEntityCollection,
) -> Result<ExtrusionEntityCollection> {
    let tol = &ctx.tolerances;
    let config = ctx.config;

    let infill_flow = ctx.layer_flow(FlowRole::Infill)?;
    let solid_infill_flow = ctx.layer_flow(FlowRole::SolidInfill)?;
    let top_solid_infill_flow = ctx.layer_flow(FlowRole::TopSolidInfill)?;
    let perimeter_spacing = ctx.layer_flow(FlowRole::Perimeter)?.spacing();

    let mut surfaces = merge_surfaces(
        fill_surfaces,
        config,
        solid_infill_flow.width,
        top_solid_infill_flow.width,
        tol,
    );

    let distance = infill_flow
        .scaled_spacing(tol)
        .min(solid_infill_flow.scaled_spacing(tol))
        .min(top_solid_infill_flow.scaled_spacing(tol));
    rescue_narrow_surfaces(&mut surfaces, distance, tol);

    let mut fills = ExtrusionEntityCollection::new();
    for surface in &surfaces {
        if surface.surface_type.kind == SurfaceKind::InternalVoid {
            continue;
        }
        let is_bridge = ctx.layer_id > 0 && surface.is_bridge();
        let role = if surface.is_top() {
            FlowRole::TopSolidInfill
        } else if surface.is_solid() {
            FlowRole::SolidInfill
        } else {
            FlowRole::Infill
        };

        let mut density = config.fill_density;
        let mut pattern = config.fill_pattern;
        if surface.is_solid() {
            density = 100.0;
            pattern = if surface.surface_type == SurfaceType::TOP {
                config.top_infill_pattern
            } else if surface.is_bottom() && !is_bridge {
                config.bottom_infill_pattern
            } else {
                InfillPattern::Rectilinear
            };
        } else if density <= 0.0 {
            continue;
        }

        let mut filler = ctx.registry.create(pattern)?;
        if (density > 99.0 && !filler.can_solid()) || surface.is_nonplanar() {
            filler = ctx.registry.create(InfillPattern::Rectilinear)?;
        }

        let h = surface.thickness.unwrap_or(ctx.layer_height);
        let bridge_flow = is_bridge || filler.use_bridge_flow();
        let mut flow = ctx
            .flows
            .flow(role, h, bridge_flow, ctx.layer_id == 0, None)?;

        // Sparse infill spacing ignores first-layer and bridge overrides so
        // lines stay aligned between layers.
        let using_internal_flow = !surface.is_solid() && !is_bridge;
        let min_spacing = if using_internal_flow {
            ctx.flows.flow(FlowRole::Infill, h, false, false, None)?.spacing()
        } else {
            flow.spacing()
        };

        let overlap_base = (perimeter_spacing + min_spacing) / 2.0;
        let params = FillParams {
            bounding_box: ctx.bounding_box,
            min_spacing,
            endpoints_overlap: tol.scale_f(config.infill_overlap.get_abs_value(overlap_base)),
            layer_id: ctx.layer_id,
            z: ctx.print_z,
            angle: deg2rad(config.fill_angle),
            link_max_length: if !is_bridge && density > 80.0 {
                tol.scale(3.0 * min_spacing)
            } else {
                0
            },
            loop_clipping: tol.scale_f(flow.nozzle_diameter)
                * LOOP_CLIPPING_LENGTH_OVER_NOZZLE_DIAMETER,
            density: density / 100.0,
            dont_adjust: false,
            tolerances: *tol,
        };

        let polylines = filler.fill_surface(surface, &params);
        if polylines.is_empty() {
            continue;
        }

        if !using_internal_flow {
            flow = Flow::new_from_spacing(filler.spacing(), flow.nozzle_diameter, h, bridge_flow)?;
        }

        let extrusion_role = if is_bridge {
            ExtrusionRole::BridgeInfill
        } else if surface.is_solid() {
            if surface.is_top() {
                ExtrusionRole::TopSolidInfill
            } else {
                ExtrusionRole::SolidInfill
            }
        } else {
            ExtrusionRole::InternalInfill
        };
        trace!(
            "{} surface: {} with {}, {} lines, spacing {:.4}",
            surface.surface_type,
            extrusion_role.name(),
            pattern,
            polylines.len(),
            filler.spacing()
        );

        let mut collection = ExtrusionEntityCollection::new();
        collection.no_sort = filler.no_sort();
        collection.append_polylines(polylines, &ExtrusionPath::from_flow(extrusion_role, &flow));
        fills.append_entity(collection);
    }

    for thin_fill in thin_fills {
        let mut collection = ExtrusionEntityCollection::new();
        collection.append_entity(thin_fill.clone());
        fills.append_entity(collection);
    }

    debug!(
        "layer {}: {} fill collections from {} surfaces",
        ctx.layer_id,
        fills.len(),
        surfaces.len()
    );
    Ok(fills)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipper::{intersection, total_area};
    use crate::config::FlowConfig;
    use crate::extrusion::ExtrusionEntity;
    use crate::flow::RegionFlowResolver;
    use crate::geometry::{ExPolygon, MultiPoint, Point, Polygon};
    use std::f64::consts::{FRAC_PI_4, PI};

    fn tol() -> Tolerances {
        Tolerances::new(100.0)
    }

    fn rect(x0: i64, y0: i64, x1: i64, y1: i64) -> ExPolygon {
        Polygon::rectangle(Point::new(x0, y0), Point::new(x1, y1)).into()
    }

    fn surfaces(items: Vec<Surface>) -> SurfaceCollection {
        SurfaceCollection::from_surfaces(items)
    }

    fn run(
        config: &FillConfig,
        layer_id: usize,
        fill_surfaces: &SurfaceCollection,
        thin_fills: &ExtrusionEntityCollection,
    ) -> ExtrusionEntityCollection {
        let flows = RegionFlowResolver::new(FlowConfig::default());
        let registry = FillRegistry::new();
        let ctx = FillContext {
            layer_id,
            layer_height: 0.2,
            print_z: 0.2 * (layer_id + 1) as CoordF,
            bounding_box: BoundingBox::new(),
            config,
            flows: &flows,
            registry: &registry,
            tolerances: tol(),
        };
        make_fill(&ctx, fill_surfaces, thin_fills).expect("fill")
    }

    /// Directions in [0, pi) of every segment longer than `min_length`.
    fn long_segment_directions(paths: &[ExtrusionPath], min_length: CoordF) -> Vec<CoordF> {
        paths
            .iter()
            .flat_map(|p| p.polyline.lines())
            .filter(|l| l.length() > min_length)
            .map(|l| l.direction_angle())
            .collect()
    }

    fn same_direction(a: CoordF, b: CoordF) -> bool {
        let d = (a - b).abs();
        d.min(PI - d) < 0.02
    }

    fn paths(entity: &ExtrusionEntity) -> Vec<ExtrusionPath> {
        match entity {
            ExtrusionEntity::Collection(c) => c.flatten(),
            ExtrusionEntity::Path(p) => vec![p.clone()],
            ExtrusionEntity::Loop(l) => l.paths.clone(),
        }
    }

    #[test]
    fn test_sparse_square_density() {
        let config = FillConfig::default()
            .fill_density(50.0)
            .fill_pattern(InfillPattern::Rectilinear)
            .fill_angle(45.0);
        let input = surfaces(vec![Surface::new(SurfaceType::INTERNAL, rect(0, 0, 1000, 1000))]);
        let fills = run(&config, 0, &input, &ExtrusionEntityCollection::new());

        assert_eq!(fills.len(), 1);
        let paths = paths(&fills.entities[0]);
        assert!(!paths.is_empty());
        let mut covered = 0.0;
        for path in &paths {
            assert_eq!(path.role, ExtrusionRole::InternalInfill);
            let (a, b) = (path.polyline[0], path.polyline[path.polyline.len() - 1]);
            if path.length() > 100.0 {
                let angle = ((b.y - a.y) as CoordF).atan2((b.x - a.x) as CoordF).rem_euclid(PI);
                assert!((angle - FRAC_PI_4).abs() < 0.02);
            }
            covered += path.length();
        }
        // Sparse infill spacing of a 0.4 mm nozzle at 0.2 mm is about 0.6283 mm.
        let ratio = covered * 62.83 / 1_000_000.0;
        assert!(ratio > 0.4 && ratio < 0.6, "ratio {ratio}");
    }

    #[test]
    fn test_deterministic() {
        let config = FillConfig::default().fill_density(35.0);
        let input = surfaces(vec![
            Surface::new(SurfaceType::INTERNAL, rect(0, 0, 1500, 800)),
            Surface::new(SurfaceType::TOP, rect(1500, 0, 2200, 800)),
        ]);
        let empty = ExtrusionEntityCollection::new();
        assert_eq!(run(&config, 3, &input, &empty), run(&config, 3, &input, &empty));
    }

    #[test]
    fn test_zero_density_skips_sparse_only() {
        let config = FillConfig::default().fill_density(0.0);
        let empty = ExtrusionEntityCollection::new();
        let sparse = surfaces(vec![Surface::new(SurfaceType::INTERNAL, rect(0, 0, 1000, 1000))]);
        assert!(run(&config, 2, &sparse, &empty).is_empty());

        let solid = surfaces(vec![Surface::new(SurfaceType::TOP, rect(0, 0, 1000, 1000))]);
        let fills = run(&config, 2, &solid, &empty);
        assert_eq!(fills.len(), 1);
        assert!(paths(&fills.entities[0])
            .iter()
            .all(|p| p.role == ExtrusionRole::TopSolidInfill));
    }

    #[test]
    fn test_solid_uses_adjusted_flow() {
        let config = FillConfig::default();
        let input = surfaces(vec![Surface::new(
            SurfaceType::INTERNAL_SOLID,
            rect(0, 0, 1000, 1000),
        )]);
        let fills = run(&config, 2, &input, &ExtrusionEntityCollection::new());
        assert_eq!(fills.len(), 1);
        let paths = paths(&fills.entities[0]);
        let solid_width = 0.671_238;
        for path in &paths {
            assert_eq!(path.role, ExtrusionRole::SolidInfill);
            // The spacing may only grow to fit the area.
            assert!(path.width >= solid_width - 1e-6);
            assert!(path.width <= solid_width * 1.25);
        }
        // Density above 80 links the rows into few paths.
        assert!(paths.len() < 5);
    }

    #[test]
    fn test_internal_void_and_thin_fills() {
        let config = FillConfig::default();
        let input = surfaces(vec![Surface::new(
            SurfaceType::INTERNAL_VOID,
            rect(0, 0, 1000, 1000),
        )]);
        let mut thin = ExtrusionEntityCollection::new();
        let mut gap = ExtrusionPath::new(ExtrusionRole::GapFill);
        gap.polyline = vec![Point::new(0, 2000), Point::new(500, 2000)].into();
        thin.append_entity(gap.clone());
        thin.append_entity(gap.with_polyline(vec![Point::new(0, 2100), Point::new(500, 2100)].into()));

        let fills = run(&config, 1, &input, &thin);
        assert_eq!(fills.len(), 2);
        for entity in &fills {
            match entity {
                ExtrusionEntity::Collection(c) => {
                    assert_eq!(c.len(), 1);
                    assert_eq!(c.entities[0].role(), Some(ExtrusionRole::GapFill));
                }
                other => panic!("expected a collection, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_bridge_follows_angle() {
        let config = FillConfig::default();
        let input = surfaces(vec![Surface::bridge(
            SurfaceKind::Bottom,
            rect(0, 0, 1000, 1000),
            Some(0.0),
        )]);
        let fills = run(&config, 1, &input, &ExtrusionEntityCollection::new());
        assert_eq!(fills.len(), 1);
        let paths = paths(&fills.entities[0]);
        for path in &paths {
            assert_eq!(path.role, ExtrusionRole::BridgeInfill);
            assert!((path.width - 0.4).abs() < 0.4 * 0.2 + 1e-9);
            assert_eq!(path.polyline[0].y, path.polyline[1].y);
        }
    }

    #[test]
    fn test_first_layer_bridge_is_solid_bottom() {
        let config = FillConfig::default();
        let input = surfaces(vec![Surface::bridge(
            SurfaceKind::Bottom,
            rect(0, 0, 1000, 1000),
            Some(0.0),
        )]);
        let fills = run(&config, 0, &input, &ExtrusionEntityCollection::new());
        assert_eq!(fills.len(), 1);
        assert!(paths(&fills.entities[0])
            .iter()
            .all(|p| p.role == ExtrusionRole::SolidInfill));
    }

    #[test]
    fn test_concentric_keeps_order() {
        let config = FillConfig::default()
            .fill_density(40.0)
            .fill_pattern(InfillPattern::Concentric);
        let input = surfaces(vec![Surface::new(SurfaceType::INTERNAL, rect(0, 0, 1000, 1000))]);
        let fills = run(&config, 1, &input, &ExtrusionEntityCollection::new());
        match &fills.entities[0] {
            ExtrusionEntity::Collection(c) => assert!(c.no_sort),
            other => panic!("expected a collection, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_pass_top_pattern_falls_back_to_single_direction() {
        let config = FillConfig::default().top_infill_pattern(InfillPattern::Grid);
        let input = surfaces(vec![Surface::new(SurfaceType::TOP, rect(0, 0, 1000, 1000))]);
        let fills = run(&config, 2, &input, &ExtrusionEntityCollection::new());
        assert_eq!(fills.len(), 1);
        let paths = paths(&fills.entities[0]);
        assert!(paths.iter().all(|p| p.role == ExtrusionRole::TopSolidInfill));

        let directions = long_segment_directions(&paths, 200.0);
        assert!(!directions.is_empty());
        assert!(
            directions.iter().all(|&d| same_direction(d, directions[0])),
            "{directions:?}"
        );
    }

    #[test]
    fn test_nonplanar_surface_uses_rectilinear() {
        let config = FillConfig::default()
            .fill_density(40.0)
            .fill_pattern(InfillPattern::Concentric);
        let nonplanar = SurfaceType::plain(SurfaceKind::Internal).with_nonplanar();
        let input = surfaces(vec![Surface::new(nonplanar, rect(0, 0, 1000, 1000))]);
        let fills = run(&config, 1, &input, &ExtrusionEntityCollection::new());
        assert_eq!(fills.len(), 1);
        let ExtrusionEntity::Collection(collection) = &fills.entities[0] else {
            panic!("expected a collection, got {:?}", fills.entities[0]);
        };
        assert!(!collection.no_sort);

        let paths = collection.flatten();
        assert!(paths.iter().all(|p| p.role == ExtrusionRole::InternalInfill));
        let directions = long_segment_directions(&paths, 200.0);
        assert!(!directions.is_empty());
        assert!(directions.iter().all(|&d| same_direction(d, directions[0])));
    }

    #[test]
    fn test_overlapping_oriented_bridges_keep_first_claim() {
        let input = surfaces(vec![
            Surface::bridge(SurfaceKind::Bottom, rect(0, 0, 1000, 1000), Some(0.0)),
            Surface::bridge(SurfaceKind::Bottom, rect(500, 0, 1500, 1000), Some(1.0)),
            Surface::new(SurfaceType::INTERNAL, rect(0, 0, 2000, 1000)),
        ]);
        let merged = merge_surfaces(&input, &FillConfig::default(), 0.67, 0.67, &tol());

        let area_with = |angle: Option<CoordF>, surface_type: SurfaceType| -> CoordF {
            merged
                .surfaces
                .iter()
                .filter(|s| s.bridge_angle == angle && s.surface_type == surface_type)
                .map(|s| s.area())
                .sum()
        };
        let bridge = SurfaceType::BOTTOM_BRIDGE;
        let first = area_with(Some(0.0), bridge);
        let second = area_with(Some(1.0), bridge);
        let internal = area_with(None, SurfaceType::INTERNAL);
        assert!((first - 1_000_000.0).abs() < 10_000.0, "first {first}");
        assert!((second - 500_000.0).abs() < 10_000.0, "second {second}");
        assert!((internal - 500_000.0).abs() < 10_000.0, "internal {internal}");

        let exps = merged.to_expolygons();
        for i in 0..exps.len() {
            for j in (i + 1)..exps.len() {
                let overlap = total_area(&intersection(&exps[i..=i], &exps[j..=j]));
                assert!(overlap < 1.0, "surfaces {i} and {j} overlap by {overlap}");
            }
        }
    }

    #[test]
    fn test_merge_is_disjoint() {
        let input = surfaces(vec![
            Surface::new(SurfaceType::TOP, rect(0, 0, 1000, 1000)),
            Surface::new(SurfaceType::INTERNAL, rect(500, 0, 1500, 1000)),
            Surface::new(SurfaceType::INTERNAL_VOID, rect(0, 500, 1500, 1500)),
        ]);
        let merged = merge_surfaces(&input, &FillConfig::default(), 0.67, 0.67, &tol());
        let exps = merged.to_expolygons();
        for i in 0..exps.len() {
            for j in (i + 1)..exps.len() {
                let overlap = total_area(&intersection(&exps[i..=i], &exps[j..=j]));
                assert!(overlap < 1.0, "surfaces {i} and {j} overlap by {overlap}");
            }
        }
        // The union is 1500 x 1500; the safety offset grows it slightly.
        let area = merged.total_area();
        assert!((area - 2_250_000.0).abs() < 20_000.0, "area {area}");
        assert!(merged.any_top());
    }

    #[test]
    fn test_oriented_bridge_takes_priority() {
        let input = surfaces(vec![
            Surface::new(SurfaceType::INTERNAL, rect(0, 0, 1000, 1000)),
            Surface::bridge(SurfaceKind::Bottom, rect(500, 0, 1500, 1000), Some(0.3)),
        ]);
        let merged = merge_surfaces(&input, &FillConfig::default(), 0.67, 0.67, &tol());
        assert_eq!(merged.surfaces[0].bridge_angle, Some(0.3));
        assert!((merged.surfaces[0].area() - 1_000_000.0).abs() < 10_000.0);
        let internal: CoordF = merged
            .filter_by_type(SurfaceType::INTERNAL)
            .iter()
            .map(|s| s.area())
            .sum();
        assert!((internal - 500_000.0).abs() < 10_000.0, "internal {internal}");
    }

    #[test]
    fn test_compatible_solid_groups_merge() {
        let input = surfaces(vec![
            Surface::new(SurfaceType::TOP, rect(0, 0, 1000, 1000)),
            Surface::new(SurfaceType::INTERNAL, rect(3000, 0, 4000, 1000)),
            Surface::new(SurfaceType::INTERNAL_SOLID, rect(1000, 0, 2000, 1000)),
        ]);
        let merged = merge_surfaces(&input, &FillConfig::default(), 0.67, 0.67, &tol());
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.surfaces[0].surface_type, SurfaceType::TOP);
        assert!((merged.surfaces[0].area() - 2_000_000.0).abs() < 10_000.0);

        // Different widths keep the groups apart.
        let split = merge_surfaces(&input, &FillConfig::default(), 0.67, 0.5, &tol());
        assert_eq!(split.len(), 3);
    }

    #[test]
    fn test_rescue_narrow_strip() {
        let mut collection = surfaces(vec![
            Surface::new(SurfaceType::INTERNAL, rect(0, 0, 1000, 40)),
            Surface::new(SurfaceType::INTERNAL_VOID, rect(0, 41, 1000, 1000)),
        ]);
        let appended = rescue_narrow_surfaces(&mut collection, 63, &tol());
        assert_eq!(appended, 1);
        let rescued = &collection.surfaces[2];
        assert_eq!(rescued.surface_type, SurfaceType::INTERNAL_SOLID);
        // The strip grows into the void by about one spacing.
        let bbox = rescued.expolygon.bounding_box();
        assert!(bbox.max.y > 90 && bbox.max.y <= 105, "{bbox:?}");
    }

    #[test]
    fn test_wide_surfaces_need_no_rescue() {
        let mut collection = surfaces(vec![Surface::new(
            SurfaceType::INTERNAL,
            rect(0, 0, 1000, 1000),
        )]);
        assert_eq!(rescue_narrow_surfaces(&mut collection, 63, &tol()), 0);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_first_point_is_inside_surface() {
        let config = FillConfig::default().fill_density(30.0);
        let area = rect(0, 0, 2000, 1000);
        let input = surfaces(vec![Surface::new(SurfaceType::INTERNAL, area.clone())]);
        let fills = run(&config, 4, &input, &ExtrusionEntityCollection::new());
        for entity in &fills {
            for path in paths(entity) {
                let p = path.polyline.first_point();
                assert!(area.contains_b(&p, 40), "{p:?}");
            }
        }
    }
}
