//! Error types for rendering.

use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] geo_common::GeoError),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Invalid map view: {0}")]
    InvalidView(String),
}
