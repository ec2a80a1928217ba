use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use std::path::PathBuf;
use std::time::Instant;

use water_surface::prelude::*;

/// Command-line tool to generate a tiled water surface animated with Gerstner octaves
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON configuration file (octaves, density, batch size, schedule)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of tiles along X
    #[arg(long, default_value_t = 2)]
    tiles_x: usize,

    /// Number of tiles along Z
    #[arg(long, default_value_t = 2)]
    tiles_z: usize,

    /// Side length of each tile's source plane
    #[arg(long, default_value_t = 10.0)]
    tile_size: f32,

    /// Object scale along X applied to every tile
    #[arg(long, default_value_t = 1.0)]
    scale_x: f32,

    /// Object scale along Z applied to every tile
    #[arg(long, default_value_t = 1.0)]
    scale_z: f32,

    /// Grid vertices per world unit (ignored with --config)
    #[arg(long, default_value_t = 4)]
    verts_per_unit: u32,

    /// Number of random octaves (ignored with --config)
    #[arg(long, default_value_t = 4)]
    octaves: usize,

    /// Wavelength of the first random octave
    #[arg(long, default_value_t = 8.0)]
    wavelength: f32,

    /// Base steepness of the random octaves (0.0-1.0)
    #[arg(long, default_value_t = 0.4)]
    steepness: f32,

    /// Base wave direction in degrees
    #[arg(long, default_value_t = 30.0)]
    direction: f32,

    /// Maximum direction jitter in degrees
    #[arg(long, default_value_t = 25.0)]
    spread: f32,

    /// Random seed for octave generation
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of frames to animate
    #[arg(short, long, default_value_t = 60)]
    frames: usize,

    /// Time step between frames in seconds
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Evaluate the kernel on the calling thread only
    #[arg(long)]
    sequential: bool,

    /// Output file path for the final frame
    #[arg(short, long, default_value = "water_surface.glb")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let sources = grid_layout(
        args.tiles_x,
        args.tiles_z,
        args.tile_size,
        Vec3::new(args.scale_x, 1.0, args.scale_z),
    );
    log::info!(
        "Building {}x{} tiles at {} verts/unit with {} octaves",
        args.tiles_x,
        args.tiles_z,
        config.verts_per_unit,
        config.octaves.len()
    );

    let mut meshes = TileMeshes::new();
    let mut animator = WaveAnimator::setup(&sources, &config, &mut meshes)
        .context("failed to set up water surface")?;

    let start = Instant::now();
    for frame in 0..args.frames {
        let time = frame as f32 * args.dt;
        animator
            .tick(time, &mut meshes)
            .with_context(|| format!("frame {} failed", frame))?;

        if frame % 10 == 0 {
            if let Some((min, max)) = meshes.height_range() {
                log::info!(
                    "Frame {}/{}: height range {:.4}..{:.4}",
                    frame + 1,
                    args.frames,
                    min,
                    max
                );
            }
        }
    }
    log::info!("Animated {} frames in {:.2?}", args.frames, start.elapsed());

    meshes
        .save_glb(&args.output)
        .with_context(|| format!("failed to export {}", args.output.display()))?;
    log::info!("Mesh exported to: {}", args.output.display());

    Ok(())
}

fn load_config(args: &Args) -> Result<WaterConfig> {
    let mut config = match &args.config {
        Some(path) => WaterConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => WaterConfig {
            octaves: generate_octaves(
                args.octaves,
                args.wavelength,
                args.steepness,
                args.direction,
                args.spread,
                args.seed,
            ),
            verts_per_unit: args.verts_per_unit,
            ..Default::default()
        },
    };
    if args.sequential {
        config.schedule = Schedule::Sequential;
    }
    config.validate()?;
    Ok(config)
}
