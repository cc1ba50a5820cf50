//! The plotting run: overview, pixel centres, reprojection, rendering.

use anyhow::{Context, Result};
use projection::{reproject_grid, CoordinateGrid, SpatialRef};
use raster::{build_overview, Raster};
use renderer::{render_mesh, Colormap, MapView, Mesh};
use tracing::info;

use crate::config::PlotConfig;

const TITLE_COLOR: [u8; 4] = [0, 0, 0, 255];

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSummary {
    pub overview_width: usize,
    pub overview_height: usize,
    pub image_width: usize,
    pub image_height: usize,
    pub png_bytes: usize,
}

/// Render `config.input` to `config.output`.
pub fn run(config: &PlotConfig) -> Result<PlotSummary> {
    let raster = Raster::open(&config.input)
        .with_context(|| format!("Failed to open raster {}", config.input.display()))?;
    info!(
        path = %config.input.display(),
        width = raster.width,
        height = raster.height,
        "Opened raster"
    );

    let source = match &config.source_srs {
        Some(definition) => SpatialRef::parse(definition)
            .with_context(|| format!("Invalid source_srs '{}'", definition))?,
        None => raster.srs.clone().with_context(|| {
            format!(
                "{} has no spatial reference; set source_srs",
                config.input.display()
            )
        })?,
    };
    let target = SpatialRef::parse(&config.target_srs)
        .with_context(|| format!("Invalid target_srs '{}'", config.target_srs))?;

    let overview = build_overview(&raster, config.overview.factor, config.overview.resampling)
        .context("Failed to build overview")?;
    drop(raster);
    info!(
        factor = config.overview.factor,
        width = overview.width,
        height = overview.height,
        "Built overview"
    );

    let centers = CoordinateGrid::pixel_centers(&overview.geotransform, overview.height, overview.width);
    let mesh_grid = reproject_grid(&centers, &source, &target).context("Failed to reproject pixel centres")?;

    let colormap = Colormap::from_config(&config.colormap).context("Invalid colormap")?;
    let (r, g, b, a) = config.view.background.try_to_rgba()?;
    let view = MapView::new(config.view.extent, config.view.width, config.view.resolved_height())
        .context("Invalid map view")?
        .with_background([r, g, b, a]);

    let nodata = if config.mask_nodata { overview.nodata } else { None };
    let mut image = render_mesh(&Mesh::from(&mesh_grid), &overview.data, nodata, &colormap, &view)
        .context("Failed to render map")?;
    image
        .draw_title(&config.title, config.title_size, TITLE_COLOR)
        .context("Failed to draw title")?;

    let png = image
        .encode_png(&[("Title", config.title.as_str()), ("Software", "basemap-raster")])
        .context("Failed to encode PNG")?;
    std::fs::write(&config.output, &png)
        .with_context(|| format!("Failed to write {}", config.output.display()))?;

    info!(
        path = %config.output.display(),
        width = view.width,
        height = view.height,
        bytes = png.len(),
        "Wrote map"
    );

    Ok(PlotSummary {
        overview_width: overview.width,
        overview_height: overview.height,
        image_width: view.width,
        image_height: view.height,
        png_bytes: png.len(),
    })
}
