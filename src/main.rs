use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use colony_mapgen::ascii::{self, AsciiMode};
use colony_mapgen::logging::{init_tracing, LoggingConfig};
use colony_mapgen::map_export;
use colony_mapgen::{GenerationParameters, MapGenerator, Result};

#[derive(Parser, Debug)]
#[command(name = "colony_mapgen")]
#[command(about = "Generate procedural colony tile maps with caves, rivers, ore and flora")]
struct Args {
    /// Width of the map in tiles (overrides the config file)
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Height of the map in tiles (overrides the config file)
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON generation parameters; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Export the map as text (e.g., "map.txt")
    #[arg(long)]
    ascii: Option<PathBuf>,

    /// Export the map as a PNG image (e.g., "map.png")
    #[arg(long)]
    png: Option<PathBuf>,

    /// Pixels per tile in the PNG export
    #[arg(long, default_value = "4")]
    png_scale: u32,

    /// Print the terrain view to stdout when done
    #[arg(long)]
    print: bool,

    /// Print the effective parameters as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn load_params(args: &Args) -> Result<GenerationParameters> {
    let mut params = match &args.config {
        Some(path) => GenerationParameters::from_json_file(path)?,
        None => GenerationParameters::default(),
    };
    if let Some(width) = args.width {
        params.width = width;
    }
    if let Some(height) = args.height {
        params.height = height;
    }
    params.validate()?;
    Ok(params)
}

fn run(args: Args) -> Result<()> {
    let params = load_params(&args)?;
    if args.dump_config {
        println!("{}", params.to_json_pretty()?);
        return Ok(());
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, width = params.width, height = params.height, "generating map");

    let mut generator = MapGenerator::new(params, seed)?;
    while !generator.is_finished() {
        let step = generator.process_next_step()?;
        info!(
            progress = generator.progress(),
            stage = generator.stage().name(),
            "{}",
            step.label()
        );
    }
    let map = generator.into_map()?;
    let stats = map.stats();
    println!(
        "Generated {}x{} map (seed {}): {} mountain, {} cave, {} river tiles; {} trees, {} shrubs, {} mushrooms; {} ore, {} gem tiles",
        map.width(),
        map.height(),
        seed,
        stats.mountain_tiles,
        stats.cave_tiles,
        stats.river_tiles,
        stats.trees,
        stats.shrubs,
        stats.mushrooms,
        stats.ore_tiles,
        stats.gem_tiles,
    );

    if args.print {
        ascii::print_ascii(&map, AsciiMode::Terrain);
    }
    if let Some(path) = &args.ascii {
        ascii::export_ascii(&map, seed, path)?;
        println!("Exported ASCII map to {}", path.display());
    }
    if let Some(path) = &args.png {
        map_export::export_png(&map, path, args.png_scale)?;
        println!("Exported PNG map to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    init_tracing(&LoggingConfig::default());
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "map generation failed");
            ExitCode::FAILURE
        }
    }
}
