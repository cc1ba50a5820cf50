//! The shapefile-to-raster run: filter, reproject, rasterize, write.

use anyhow::{Context, Result};
use projection::SpatialRef;
use raster::{rasterize_layer, GeoTiffWriter};
use tracing::info;
use vector::{create_filtered_shapefile, reproject_layer, Layer};

use crate::config::ShapeToRasterConfig;

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSummary {
    pub features: usize,
    pub width: usize,
    pub height: usize,
    pub burned_pixels: usize,
}

/// Run all three steps, writing the filtered shapefile, the reprojected
/// shapefile and the GeoTIFF named in `config`.
pub fn run(config: &ShapeToRasterConfig) -> Result<GridSummary> {
    let filtered = create_filtered_shapefile(
        &config.filter_value,
        &config.filter_field,
        &config.input,
        &config.filtered_output,
    )
    .with_context(|| {
        format!(
            "Failed to filter {} on {} = '{}'",
            config.input.display(),
            config.filter_field,
            config.filter_value
        )
    })?;
    info!(
        path = %config.filtered_output.display(),
        features = filtered.len(),
        "Wrote filtered shapefile"
    );

    let source = resolve_source_srs(config, &filtered)?;
    let target = SpatialRef::parse(&config.target_srs)
        .with_context(|| format!("Invalid target_srs '{}'", config.target_srs))?;

    let reprojected = reproject_layer(&filtered, &source, &target, &config.reprojected_layer)
        .with_context(|| format!("Failed to reproject layer '{}'", filtered.name()))?;
    reprojected
        .write(&config.reprojected_output)
        .with_context(|| format!("Failed to write {}", config.reprojected_output.display()))?;
    info!(
        path = %config.reprojected_output.display(),
        srs = %target,
        "Wrote reprojected shapefile"
    );

    let grid = rasterize_layer(&reprojected, &config.rasterize)
        .with_context(|| format!("Failed to rasterize layer '{}'", reprojected.name()))?;
    GeoTiffWriter::new()
        .compression(config.compression)
        .sample_type(config.sample_type)
        .write(&grid, &config.output)
        .with_context(|| format!("Failed to write {}", config.output.display()))?;

    let nodata = config.rasterize.nodata as f32;
    let burned_pixels = grid.data.iter().filter(|&&v| v != nodata).count();
    info!(
        path = %config.output.display(),
        width = grid.width,
        height = grid.height,
        burned_pixels,
        "Wrote GeoTIFF"
    );

    Ok(GridSummary {
        features: reprojected.len(),
        width: grid.width,
        height: grid.height,
        burned_pixels,
    })
}

fn resolve_source_srs(config: &ShapeToRasterConfig, layer: &Layer) -> Result<SpatialRef> {
    match &config.source_srs {
        Some(definition) => {
            SpatialRef::parse(definition).with_context(|| format!("Invalid source_srs '{}'", definition))
        }
        None => layer.srs().cloned().with_context(|| {
            format!(
                "{} has no usable .prj; set source_srs",
                config.input.display()
            )
        }),
    }
}
