//! Vector data handling for ESRI Shapefiles.
//!
//! A shapefile is read into an in-memory [`Layer`] through the `shapefile`
//! crate: geometries from `.shp`, attributes from `.dbf`, and the spatial
//! reference from a WKT `.prj`. Layers can be filtered by attribute,
//! reprojected, and written back out as `.shp`/`.shx`/`.dbf`/`.prj`.

pub mod dbf;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod layer;
pub mod reproject;
pub mod shp;

pub use dbf::{FieldDef, FieldType, FieldValue};
pub use error::{VectorError, VectorResult};
pub use filter::{create_filtered_shapefile, AttributeFilter, CompareOp, Literal};
pub use geometry::{Geometry, Point, ShapeType};
pub use layer::{Feature, Layer};
pub use reproject::reproject_layer;
