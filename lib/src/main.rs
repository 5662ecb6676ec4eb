//! layer-fill CLI - run the fill pipeline and the medial-axis extractor on
//! generated test regions
//!
//! Usage:
//!   layer-fill fill --size 20 --density 30 --pattern grid
//!   layer-fill fill --size 20 --hole 12 --surface top --json
//!   layer-fill fill --config region.json
//!   layer-fill medial-axis --size 20 --wall 1 --min-width 0.5 --max-width 4

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use layer_fill::{
    ExPolygon, FillConfig, FillRegistry, FlowConfig, InfillPattern, Layer, Point,
    Polygon, Surface, SurfaceKind, SurfaceType, Tolerances,
};
use log::{info, LevelFilter};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Surface classification and infill generation for one layer region
#[derive(Parser, Debug)]
#[command(name = "layer-fill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fill a square (optionally with a centred square hole)
    Fill {
        /// Side of the square in mm
        #[arg(long, default_value = "20")]
        size: f64,

        /// Side of the centred hole in mm
        #[arg(long)]
        hole: Option<f64>,

        /// Classification of the region
        #[arg(long, value_enum, default_value = "internal")]
        surface: SurfaceArg,

        /// Bridge direction in degrees, for bridge surfaces
        #[arg(long)]
        bridge_angle: Option<f64>,

        /// Fill configuration file (JSON); flags below override it
        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Infill density (0-100)
        #[arg(long)]
        density: Option<f64>,

        /// Infill pattern
        #[arg(long, value_parser = parse_pattern)]
        pattern: Option<InfillPattern>,

        /// Fill angle in degrees
        #[arg(long)]
        angle: Option<f64>,

        /// Layer index
        #[arg(long, default_value = "1")]
        layer: usize,

        /// Layer height in mm
        #[arg(long, default_value = "0.2")]
        layer_height: f64,

        /// Nozzle diameter in mm
        #[arg(long, default_value = "0.4")]
        nozzle: f64,

        /// Print the generated paths as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract the skeleton of a square frame
    MedialAxis {
        /// Outer side of the frame in mm
        #[arg(long, default_value = "20")]
        size: f64,

        /// Wall thickness in mm
        #[arg(long, default_value = "1")]
        wall: f64,

        /// Narrowest width kept, in mm
        #[arg(long, default_value = "0.5")]
        min_width: f64,

        /// Widest width kept, in mm
        #[arg(long, default_value = "4")]
        max_width: f64,

        /// Print the skeleton as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SurfaceArg {
    Top,
    Bottom,
    Internal,
    Solid,
    Bridge,
    Void,
}

impl SurfaceArg {
    fn surface(self, expolygon: ExPolygon, bridge_angle: Option<f64>) -> Surface {
        let surface_type = match self {
            SurfaceArg::Top => SurfaceType::TOP,
            SurfaceArg::Bottom => SurfaceType::BOTTOM,
            SurfaceArg::Internal => SurfaceType::INTERNAL,
            SurfaceArg::Solid => SurfaceType::INTERNAL_SOLID,
            SurfaceArg::Void => SurfaceType::INTERNAL_VOID,
            SurfaceArg::Bridge => {
                return Surface::bridge(
                    SurfaceKind::Bottom,
                    expolygon,
                    bridge_angle.map(f64::to_radians),
                )
            }
        };
        Surface::new(surface_type, expolygon)
    }
}

fn parse_pattern(name: &str) -> std::result::Result<InfillPattern, String> {
    InfillPattern::from_name(name).ok_or_else(|| {
        let known: Vec<_> = InfillPattern::ALL.iter().map(InfillPattern::name).collect();
        format!("unknown pattern '{}' (expected one of: {})", name, known.join(", "))
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    match cli.command {
        Commands::Fill {
            size,
            hole,
            surface,
            bridge_angle,
            config,
            density,
            pattern,
            angle,
            layer,
            layer_height,
            nozzle,
            json,
        } => {
            let mut fill_config = match config {
                Some(path) => load_config(&path)?,
                None => FillConfig::default(),
            };
            if let Some(density) = density {
                fill_config.fill_density = density;
            }
            if let Some(pattern) = pattern {
                fill_config.fill_pattern = pattern;
            }
            if let Some(angle) = angle {
                fill_config.fill_angle = angle;
            }
            fill_config
                .validate()
                .map_err(layer_fill::Error::Config)
                .context("Invalid fill configuration")?;
            let flow_config = FlowConfig::default().nozzle_diameter(nozzle);
            flow_config
                .validate()
                .map_err(layer_fill::Error::Config)
                .context("Invalid flow configuration")?;

            let tol = Tolerances::default();
            let region = square_region(size, hole, &tol)?;
            cmd_fill(
                surface.surface(region.clone(), bridge_angle),
                region,
                fill_config,
                flow_config,
                layer,
                layer_height,
                json,
                &tol,
            )
        }
        Commands::MedialAxis {
            size,
            wall,
            min_width,
            max_width,
            json,
        } => cmd_medial_axis(size, wall, min_width, max_width, json),
    }
}

fn load_config(path: &Path) -> Result<FillConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// A square of side `size` mm at the origin, with an optional centred hole.
fn square_region(size: f64, hole: Option<f64>, tol: &Tolerances) -> Result<ExPolygon> {
    if size <= 0.0 {
        bail!("Size must be positive, got {}", size);
    }
    let side = tol.scale(size);
    let contour = Polygon::rectangle(Point::new(0, 0), Point::new(side, side));
    let Some(hole) = hole else {
        return Ok(ExPolygon::new(contour));
    };
    if hole <= 0.0 || hole >= size {
        bail!("Hole must be between 0 and {} mm, got {}", size, hole);
    }
    let margin = tol.scale((size - hole) / 2.0);
    let mut inner = Polygon::rectangle(
        Point::new(margin, margin),
        Point::new(side - margin, side - margin),
    );
    inner.make_clockwise();
    Ok(ExPolygon::with_holes(contour, vec![inner]))
}

#[allow(clippy::too_many_arguments)]
fn cmd_fill(
    surface: Surface,
    region: ExPolygon,
    fill_config: FillConfig,
    flow_config: FlowConfig,
    layer_id: usize,
    layer_height: f64,
    json: bool,
    tol: &Tolerances,
) -> Result<()> {
    info!("Filling {} with {}", surface.surface_type, fill_config);

    let print_z = layer_height * (layer_id + 1) as f64;
    let mut layer = Layer::new(layer_id, layer_height, print_z, print_z - layer_height / 2.0);
    layer.bounding_box = region.bounding_box();
    let layer_region = layer.add_region(0, fill_config, flow_config);
    layer_region.fill_surfaces.push(surface);
    layer
        .make_fills(&FillRegistry::new(), tol)
        .context("Failed to generate fills")?;

    let fills = layer
        .get_region(0)
        .map(|r| r.fills.clone())
        .unwrap_or_default();

    if json {
        println!("{}", serde_json::to_string_pretty(&fills)?);
        return Ok(());
    }

    let mut by_role: BTreeMap<&'static str, (usize, f64)> = BTreeMap::new();
    for path in fills.flatten() {
        let entry = by_role.entry(path.role.name()).or_default();
        entry.0 += 1;
        entry.1 += tol.unscale(path.length());
    }
    println!("Layer {} ({:.2} mm), {} collections", layer_id, print_z, fills.len());
    for (role, (count, length)) in &by_role {
        println!("  {:<18} {:>5} paths {:>10.2} mm", role, count, length);
    }
    println!("  Extruded volume: {:.3} mm³", fills.total_volume(tol));
    Ok(())
}

fn cmd_medial_axis(size: f64, wall: f64, min_width: f64, max_width: f64, json: bool) -> Result<()> {
    if wall <= 0.0 || 2.0 * wall >= size {
        bail!("Wall must be between 0 and {} mm, got {}", size / 2.0, wall);
    }
    if min_width > max_width {
        bail!("Minimum width {} exceeds maximum width {}", min_width, max_width);
    }
    let tol = Tolerances::default();
    let frame = square_region(size, Some(size - 2.0 * wall), &tol)?;
    let skeleton = frame.medial_axis(tol.scale_f(min_width), tol.scale_f(max_width));
    info!("Extracted {} skeleton paths", skeleton.len());

    if json {
        println!("{}", serde_json::to_string_pretty(&skeleton)?);
        return Ok(());
    }

    println!("{} skeleton paths", skeleton.len());
    for (i, path) in skeleton.iter().enumerate() {
        let (lo, hi) = path
            .width
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &w| (lo.min(w), hi.max(w)));
        println!(
            "  #{:<3} {:>3} points {:>9.3} mm  width {:.3}-{:.3} mm",
            i,
            path.points.len(),
            tol.unscale(path.length()),
            tol.unscale(lo),
            tol.unscale(hi)
        );
    }
    Ok(())
}
