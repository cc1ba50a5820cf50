//! Common types and utilities shared across the geogrid crates and tools.

pub mod bbox;
pub mod error;
pub mod geotransform;
pub mod logging;
pub mod style;

pub use bbox::BoundingBox;
pub use error::{GeoError, GeoResult};
pub use geotransform::GeoTransform;
pub use style::{Color, ColorStop, ColormapConfig, ColormapKind, ListedConfig, SegmentedConfig};
