//! Raster handling: a single-band in-memory [`Raster`], GeoTIFF read and
//! write, decimated overviews, and burning vector layers into pixels.

pub mod error;
mod geokeys;
pub mod geotiff;
pub mod overview;
pub mod rasterize;
pub mod scanline;
pub mod types;

pub use error::{RasterError, RasterResult};
pub use geotiff::{Compression, GeoTiffWriter, SampleType};
pub use overview::{build_overview, Resampling};
pub use rasterize::{burn_geometry, rasterize_layer, RasterizeOptions};
pub use types::Raster;
