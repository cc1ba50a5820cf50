//! basemap-raster: render a raster overview as a lon/lat PNG map.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing::info;

use basemap_raster::PlotConfig;

#[derive(Parser, Debug)]
#[command(name = "basemap-raster")]
#[command(about = "Render a georeferenced raster as a colour-coded PNG map")]
struct Args {
    /// Plot configuration (YAML). Without it the built-in
    /// areas-of-compromise preset is used.
    #[arg(short, long, env = "BASEMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Override the input GeoTIFF
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Override the output PNG
    #[arg(short, long)]
    output: Option<PathBuf>,

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
        Some(path) => PlotConfig::from_file(path)?,
        None => PlotConfig::default(),
    };
    if let Some(input) = args.input {
        config.input = input;
    }
    if let Some(output) = args.output {
        config.output = output;
    }

    info!(title = %config.title, input = %config.input.display(), "Starting plot");
    let summary = basemap_raster::run(&config)?;
    info!(?summary, "Done");
    Ok(())
}
