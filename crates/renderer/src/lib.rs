//! Rendering of gridded values into map images.
//!
//! - [`colormap`]: listed and segmented colormaps with value normalization
//! - [`mesh`]: flat-shaded quad mesh rendering into an RGBA canvas
//! - [`png`]: indexed / RGBA PNG encoding
//! - [`text`]: title overlay drawn with an embedded font

pub mod colormap;
pub mod error;
pub mod mesh;
pub mod png;
pub mod text;

pub use colormap::{Colormap, ListedColormap, Normalize, Palette, SegmentedColormap};
pub use error::{RenderError, RenderResult};
pub use mesh::{render_mesh, MapView, Mesh, RgbaImage};
