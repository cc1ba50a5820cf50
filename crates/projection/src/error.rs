//! Error types for projection operations.

use thiserror::Error;

pub type ProjectionResult<T> = Result<T, ProjectionError>;

#[derive(Error, Debug)]
pub enum ProjectionError {
    /// The definition could not be parsed into a projection.
    #[error("invalid spatial reference '{definition}': {reason}")]
    InvalidDefinition { definition: String, reason: String },

    /// EPSG code not present in the definitions database.
    #[error("EPSG:{0} is not in the crs-definitions database")]
    UnknownEpsg(u32),

    /// WKT that is neither a resolvable EPSG authority nor a WKT1
    /// definition we can convert.
    #[error("unsupported WKT: {0}")]
    UnsupportedWkt(String),

    /// Projection method that has no parameter description.
    #[error("unsupported projection method '{0}'")]
    UnsupportedProjection(String),

    /// The transform is undefined for a point.
    #[error("transform failed at point {index} ({x}, {y}): {reason}")]
    TransformFailed {
        index: usize,
        x: f64,
        y: f64,
        reason: String,
    },

    /// Grid planes have inconsistent dimensions.
    #[error("grid shape mismatch: {0}")]
    ShapeMismatch(String),
}
