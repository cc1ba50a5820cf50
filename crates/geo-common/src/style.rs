//! Colormap configuration for rendering raster values.
//!
//! Colormaps are described in YAML (or JSON) and turned into concrete
//! lookup tables by the renderer crate. Two kinds exist:
//!
//! - `listed`: N discrete colors, one per class (categorical rasters)
//! - `segmented`: piecewise-linear color stops over the normalized range [0, 1]
//!
//! Values are normalized with `vmin`/`vmax` before lookup. When either is
//! omitted the renderer uses the finite min/max of the data.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{GeoError, GeoResult};

/// A colormap plus its normalization range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColormapConfig {
    /// The colormap kind and its colors
    #[serde(flatten)]
    pub kind: ColormapKind,

    /// Value mapped to the bottom of the colormap
    #[serde(default)]
    pub vmin: Option<f64>,

    /// Value mapped to the top of the colormap
    #[serde(default)]
    pub vmax: Option<f64>,

    /// Color for NaN and no-data cells
    #[serde(default = "default_bad_color")]
    pub bad_color: Color,
}

fn default_bad_color() -> Color {
    Color::transparent()
}

impl ColormapConfig {
    /// Load a colormap from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> GeoResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a colormap from a YAML string. JSON is valid YAML, so this
    /// also accepts JSON documents.
    pub fn from_yaml(yaml: &str) -> GeoResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GeoResult<()> {
        self.kind.validate()?;
        self.bad_color.try_to_rgba()?;
        if let (Some(lo), Some(hi)) = (self.vmin, self.vmax) {
            if !(lo < hi) {
                return Err(GeoError::InvalidColormap(format!(
                    "vmin ({}) must be below vmax ({})",
                    lo, hi
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for the different colormap kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColormapKind {
    /// Discrete colors, one per class
    Listed(ListedConfig),

    /// Continuous color stops
    Segmented(SegmentedConfig),
}

impl ColormapKind {
    pub fn validate(&self) -> GeoResult<()> {
        match self {
            ColormapKind::Listed(l) => l.validate(),
            ColormapKind::Segmented(s) => s.validate(),
        }
    }
}

/// Discrete color list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedConfig {
    pub colors: Vec<Color>,

    /// Optional class labels, parallel to `colors`
    #[serde(default)]
    pub labels: Vec<String>,
}

impl ListedConfig {
    pub fn validate(&self) -> GeoResult<()> {
        if self.colors.is_empty() {
            return Err(GeoError::InvalidColormap(
                "listed colormap must have at least 1 color".to_string(),
            ));
        }
        if !self.labels.is_empty() && self.labels.len() != self.colors.len() {
            return Err(GeoError::InvalidColormap(format!(
                "{} labels for {} colors",
                self.labels.len(),
                self.colors.len()
            )));
        }
        for color in &self.colors {
            color.try_to_rgba()?;
        }
        Ok(())
    }
}

/// Continuous gradient color mapping over the normalized range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentedConfig {
    /// Color stops defining the gradient
    pub stops: Vec<ColorStop>,
}

impl SegmentedConfig {
    pub fn validate(&self) -> GeoResult<()> {
        if self.stops.len() < 2 {
            return Err(GeoError::InvalidColormap(
                "segmented colormap must have at least 2 color stops".to_string(),
            ));
        }

        for i in 1..self.stops.len() {
            if self.stops[i].value <= self.stops[i - 1].value {
                return Err(GeoError::InvalidColormap(
                    "color stops must be in ascending value order".to_string(),
                ));
            }
        }

        let first = self.stops[0].value;
        let last = self.stops[self.stops.len() - 1].value;
        if first != 0.0 || last != 1.0 {
            return Err(GeoError::InvalidColormap(format!(
                "color stops must span 0.0 to 1.0, got {} to {}",
                first, last
            )));
        }

        for stop in &self.stops {
            stop.color.try_to_rgba()?;
        }
        Ok(())
    }
}

/// A color stop in a gradient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorStop {
    /// Position in the normalized range [0, 1]
    pub value: f64,

    /// The color at this stop
    pub color: Color,
}

/// Color representation supporting multiple formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    /// Explicit RGBA
    Rgba { r: u8, g: u8, b: u8, a: u8 },

    /// RGB array: [r, g, b] or [r, g, b, a]
    Array(Vec<u8>),

    /// Hex string "#RRGGBB" / "#RRGGBBAA", or a named color
    Text(String),
}

impl Color {
    pub fn transparent() -> Self {
        Color::Rgba {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn hex(s: &str) -> Self {
        Color::Text(s.to_string())
    }

    /// Convert to an RGBA tuple, rejecting malformed colors.
    pub fn try_to_rgba(&self) -> GeoResult<(u8, u8, u8, u8)> {
        match self {
            Color::Rgba { r, g, b, a } => Ok((*r, *g, *b, *a)),
            Color::Array(arr) => match arr.as_slice() {
                [r, g, b] => Ok((*r, *g, *b, 255)),
                [r, g, b, a] => Ok((*r, *g, *b, *a)),
                _ => Err(GeoError::InvalidColor(format!("{:?}", arr))),
            },
            Color::Text(s) if s.starts_with('#') => parse_hex_color(s),
            Color::Text(s) => {
                named_color(s).ok_or_else(|| GeoError::InvalidColor(s.clone()))
            }
        }
    }

    /// Convert to RGBA, falling back to opaque black for malformed input.
    ///
    /// Colormaps are validated when loaded, so this only matters for
    /// hand-built values.
    pub fn to_rgba(&self) -> (u8, u8, u8, u8) {
        self.try_to_rgba().unwrap_or((0, 0, 0, 255))
    }
}

fn parse_hex_color(s: &str) -> GeoResult<(u8, u8, u8, u8)> {
    let hex = s.trim_start_matches('#');
    if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GeoError::InvalidColor(s.to_string()));
    }

    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| GeoError::InvalidColor(s.to_string()))
    };

    let a = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok((channel(0)?, channel(2)?, channel(4)?, a))
}

fn named_color(name: &str) -> Option<(u8, u8, u8, u8)> {
    let rgba = match name.to_lowercase().as_str() {
        "transparent" | "none" => (0, 0, 0, 0),
        "black" => (0, 0, 0, 255),
        "white" => (255, 255, 255, 255),
        "red" => (255, 0, 0, 255),
        "green" => (0, 128, 0, 255),
        "blue" => (0, 0, 255, 255),
        "yellow" => (255, 255, 0, 255),
        "cyan" => (0, 255, 255, 255),
        "magenta" => (255, 0, 255, 255),
        "orange" => (255, 165, 0, 255),
        "purple" => (128, 0, 128, 255),
        "gray" | "grey" => (128, 128, 128, 255),
        "darkgray" | "darkgrey" => (169, 169, 169, 255),
        "lightgray" | "lightgrey" => (211, 211, 211, 255),
        _ => return None,
    };
    Some(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_with_alpha() {
        assert_eq!(Color::hex("#ffffff00").try_to_rgba().unwrap(), (255, 255, 255, 0));
        assert_eq!(Color::hex("#006d2c").try_to_rgba().unwrap(), (0, 109, 44, 255));
    }

    #[test]
    fn test_invalid_colors() {
        assert!(Color::hex("#12345").try_to_rgba().is_err());
        assert!(Color::hex("#gggggg").try_to_rgba().is_err());
        assert!(Color::Text("chartreuse-ish".into()).try_to_rgba().is_err());
        assert!(Color::Array(vec![1, 2]).try_to_rgba().is_err());
    }

    #[test]
    fn test_named_color() {
        assert_eq!(
            Color::Text("darkgrey".into()).try_to_rgba().unwrap(),
            (169, 169, 169, 255)
        );
    }

    #[test]
    fn test_parse_listed_yaml() {
        let yaml = r##"
type: listed
colors: ["#ffffff00", "#006d2c", [49, 163, 84]]
vmin: 0
vmax: 2
"##;
        let config = ColormapConfig::from_yaml(yaml).unwrap();
        match &config.kind {
            ColormapKind::Listed(l) => assert_eq!(l.colors.len(), 3),
            other => panic!("expected listed, got {:?}", other),
        }
        assert_eq!(config.vmin, Some(0.0));
        assert_eq!(config.bad_color, Color::transparent());
    }

    #[test]
    fn test_segmented_must_span_unit_range() {
        let yaml = r##"
type: segmented
stops:
  - { value: 0.0, color: "#000000" }
  - { value: 0.5, color: "#ffffff" }
"##;
        assert!(ColormapConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_vmin_vmax_order() {
        let yaml = r##"
type: listed
colors: ["#000000"]
vmin: 3
vmax: 1
"##;
        assert!(ColormapConfig::from_yaml(yaml).is_err());
    }
}
