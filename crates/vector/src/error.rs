//! Error types for shapefile I/O and layer operations.

use projection::ProjectionError;
use thiserror::Error;

pub type VectorResult<T> = Result<T, VectorError>;

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    #[error("dBase error: {0}")]
    Dbase(#[from] shapefile::dbase::Error),

    #[error("Malformed .dbf data: {0}")]
    InvalidDbf(String),

    #[error("Unsupported shape type code {0}")]
    UnsupportedShapeType(i32),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Invalid attribute filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Value '{value}' does not fit field {field}")]
    ValueOverflow { field: String, value: String },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}
