//! Error types shared by the geogrid crates.

use thiserror::Error;

/// Result type alias using GeoError.
pub type GeoResult<T> = Result<T, GeoError>;

/// Primary error type for shared geometry, style and config operations.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid color '{0}': expected #rrggbb or #rrggbbaa")]
    InvalidColor(String),

    #[error("Invalid colormap: {0}")]
    InvalidColormap(String),

    #[error("Geotransform is not invertible: {0:?}")]
    SingularGeoTransform([f64; 6]),

    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for GeoError {
    fn from(err: serde_yaml::Error) -> Self {
        GeoError::ConfigError(format!("YAML error: {}", err))
    }
}

impl From<serde_json::Error> for GeoError {
    fn from(err: serde_json::Error) -> Self {
        GeoError::ConfigError(format!("JSON error: {}", err))
    }
}
