//! Coordinate reference system handling and grid reprojection.
//!
//! Projection math is delegated to `proj4rs` (pure Rust, no PROJ C
//! library); EPSG codes resolve through the `crs-definitions` database.

pub mod error;
pub mod grid;
pub mod params;
pub mod spatial_ref;
pub mod transform;
mod wkt;

pub use error::{ProjectionError, ProjectionResult};
pub use grid::{reproject_grid, CoordinateGrid, TransformedGrid};
pub use params::{CrsParams, Ellipsoid, Geodetic, Method, Param, Projected};
pub use spatial_ref::SpatialRef;
pub use transform::CoordinateTransform;
