//! Turn one attribute class of a shapefile into a GeoTIFF mask.
//!
//! Three steps, each leaving its output on disk: a filtered copy of the
//! shapefile, the same features reprojected into the target reference,
//! and the rasterized grid.

pub mod config;
pub mod pipeline;

pub use config::ShapeToRasterConfig;
pub use pipeline::{run, GridSummary};
