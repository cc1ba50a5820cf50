//! grid-from-shp: filter a shapefile and burn it into a GeoTIFF.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing::info;

use grid_from_shp::ShapeToRasterConfig;

#[derive(Parser, Debug)]
#[command(name = "grid-from-shp")]
#[command(about = "Rasterize the features of a shapefile matching one attribute value")]
struct Args {
    /// Run configuration (YAML). Without it the Africa mask run is used.
    #[arg(short, long, env = "GRID_FROM_SHP_CONFIG")]
    config: Option<PathBuf>,

    /// Override the input shapefile
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Override the output GeoTIFF
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the attribute value to keep
    #[arg(long)]
    value: Option<String>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn main() {
    let args = Args::parse();
    geo_common::logging::init(args.verbose, args.log_json);

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ShapeToRasterConfig::from_file(path)?,
        None => ShapeToRasterConfig::default(),
    };
    if let Some(input) = args.input {
        config.input = input;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(value) = args.value {
        config.filter_value = value;
    }

    info!(
        input = %config.input.display(),
        field = %config.filter_field,
        value = %config.filter_value,
        "Starting rasterization"
    );
    let summary = grid_from_shp::run(&config)?;
    info!(?summary, "Done");
    Ok(())
}
