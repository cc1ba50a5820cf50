//! Burning vector layers into rasters.

use geo_common::GeoTransform;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vector::{Geometry, Layer};

use crate::scanline::{fill_polygon, trace_segment, visit_point};
use crate::{Raster, RasterError, RasterResult};

/// Output grid and burn settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterizeOptions {
    /// Pixel size in layer units, used for both axes.
    pub pixel_size: f64,
    /// Value of pixels no geometry touches.
    pub nodata: f64,
    /// Value written into burned pixels.
    pub burn_value: f64,
}

impl Default for RasterizeOptions {
    fn default() -> Self {
        Self {
            pixel_size: 1000.0,
            nodata: 0.0,
            burn_value: 1.0,
        }
    }
}

/// Rasterize every feature of `layer` onto a grid covering its extent.
///
/// The grid has `ceil((x_max - x_min) / pixel)` x `ceil((y_max - y_min) / pixel)`
/// pixels with its origin at the top-left corner `(x_min, y_max)`. It
/// starts filled with `nodata` and carries the layer's spatial reference.
pub fn rasterize_layer(layer: &Layer, options: &RasterizeOptions) -> RasterResult<Raster> {
    let pixel = options.pixel_size;
    if !(pixel.is_finite() && pixel > 0.0) {
        return Err(RasterError::InvalidPixelSize(pixel));
    }
    let (x_min, x_max, y_min, y_max) = layer
        .extent()
        .ok_or_else(|| RasterError::EmptyLayer(layer.name().to_string()))?;

    let width = (((x_max - x_min) / pixel).ceil() as usize).max(1);
    let height = (((y_max - y_min) / pixel).ceil() as usize).max(1);
    let geotransform = GeoTransform::north_up(x_min, y_max, pixel, -pixel);

    let mut raster = Raster::filled(width, height, geotransform, options.nodata as f32)
        .with_srs(layer.srs().cloned())
        .with_nodata(Some(options.nodata));

    let mut burned = 0usize;
    for feature in layer.features() {
        burned += burn_geometry(&mut raster, &feature.geometry, options.burn_value)?;
    }

    info!(
        layer = %layer.name(),
        width,
        height,
        pixel_size = pixel,
        features = layer.len(),
        burned,
        "Rasterized layer"
    );
    Ok(raster)
}

/// Burn one geometry into `raster`, returning the number of pixel writes.
///
/// Polygons burn pixels whose centre is inside (even-odd). Lines burn
/// every pixel they pass through, points the pixel containing them.
pub fn burn_geometry(raster: &mut Raster, geometry: &Geometry, value: f64) -> RasterResult<usize> {
    let gt = raster.geotransform;
    let (width, height) = (raster.width, raster.height);
    let value = value as f32;
    let mut writes = 0usize;

    let to_pixel = |p: &vector::Point| gt.world_to_pixel(p.x, p.y);
    let mut burn = |col: usize, row: usize| {
        raster.data[row * width + col] = value;
        writes += 1;
    };

    match geometry {
        Geometry::Null => {}
        Geometry::Point(p) => visit_point(to_pixel(p)?, width, height, &mut burn),
        Geometry::MultiPoint(points) => {
            for p in points {
                visit_point(to_pixel(p)?, width, height, &mut burn);
            }
        }
        Geometry::PolyLine(parts) => {
            for part in parts {
                let pixels = part.iter().map(to_pixel).collect::<Result<Vec<_>, _>>()?;
                if let [only] = pixels.as_slice() {
                    visit_point(*only, width, height, &mut burn);
                }
                for segment in pixels.windows(2) {
                    trace_segment(segment[0], segment[1], width, height, &mut burn);
                }
            }
        }
        Geometry::Polygon(rings) => {
            let rings = rings
                .iter()
                .map(|ring| ring.iter().map(to_pixel).collect::<Result<Vec<_>, _>>())
                .collect::<Result<Vec<_>, _>>()?;
            fill_polygon(&rings, width, height, &mut burn);
        }
    }

    debug!(shape = ?geometry.shape_type(), writes, "Burned geometry");
    Ok(writes)
}
