//! Error types for raster operations.

use thiserror::Error;

pub type RasterResult<T> = Result<T, RasterError>;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Geometry error: {0}")]
    Geo(#[from] geo_common::GeoError),

    #[error("Unsupported raster: {0}")]
    Unsupported(String),

    #[error("Invalid raster data: {0}")]
    InvalidData(String),

    #[error("Invalid overview factor {0}: must be at least 1")]
    InvalidFactor(usize),

    #[error("Cannot rasterize layer '{0}': it has no features")]
    EmptyLayer(String),

    #[error("Invalid pixel size {0}: must be positive and finite")]
    InvalidPixelSize(f64),
}
