//! Draw a georeferenced class raster as a colour-coded map.
//!
//! The raster is decimated to an overview, its pixel centres are projected
//! into the display reference, and the resulting mesh is drawn with flat
//! shading onto a PNG.

pub mod config;
pub mod pipeline;

pub use config::{OverviewConfig, PlotConfig, ViewConfig};
pub use pipeline::{run, PlotSummary};
