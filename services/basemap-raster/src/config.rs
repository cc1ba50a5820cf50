//! Plot configuration.
//!
//! Every field has a default, and the defaults reproduce the "areas of
//! compromise" map, so running without `--config` draws that map. Presets
//! in `config/presets/` override what differs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geo_common::{BoundingBox, Color, ColormapConfig, ColormapKind, ListedConfig};
use raster::Resampling;
use serde::{Deserialize, Serialize};

/// Top-level plot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    /// Map title, drawn along the top edge and stored in the PNG `Title`
    /// text chunk
    #[serde(default = "default_title")]
    pub title: String,

    /// Title font size in pixels; 0 keeps the title out of the image
    #[serde(default = "default_title_size")]
    pub title_size: f32,

    /// Source GeoTIFF
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Output PNG
    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(default)]
    pub overview: OverviewConfig,

    /// Overrides the raster's own spatial reference (EPSG:n, PROJ4 or WKT)
    #[serde(default)]
    pub source_srs: Option<String>,

    /// Display reference the pixel centres are projected into
    #[serde(default = "default_target_srs")]
    pub target_srs: String,

    #[serde(default)]
    pub view: ViewConfig,

    #[serde(default = "default_colormap")]
    pub colormap: ColormapConfig,

    /// Draw the raster's no-data cells with the bad colour instead of
    /// classifying them like any other value
    #[serde(default)]
    pub mask_nodata: bool,
}

/// Overview level drawn instead of the full-resolution raster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OverviewConfig {
    #[serde(default = "default_factor")]
    pub factor: usize,

    #[serde(default)]
    pub resampling: Resampling,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            factor: default_factor(),
            resampling: Resampling::Nearest,
        }
    }
}

/// The visible map window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Window in target coordinates
    #[serde(default = "default_extent")]
    pub extent: BoundingBox,

    /// Image width in pixels
    #[serde(default = "default_width")]
    pub width: usize,

    /// Image height in pixels; derived from the extent's aspect ratio
    /// when omitted
    #[serde(default)]
    pub height: Option<usize>,

    /// Colour under the data (the land fill of the map)
    #[serde(default = "default_background")]
    pub background: Color,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            extent: default_extent(),
            width: default_width(),
            height: None,
            background: default_background(),
        }
    }
}

impl ViewConfig {
    /// Output height, keeping square pixels when not configured.
    pub fn resolved_height(&self) -> usize {
        self.height.unwrap_or_else(|| {
            let aspect = self.extent.height() / self.extent.width();
            ((self.width as f64 * aspect).round() as usize).max(1)
        })
    }
}

fn default_title() -> String {
    "Areas of compromise".to_string()
}

fn default_title_size() -> f32 {
    16.0
}

fn default_input() -> PathBuf {
    PathBuf::from("areas_of_compromise.tif")
}

fn default_output() -> PathBuf {
    PathBuf::from("areas_of_compromise.png")
}

fn default_factor() -> usize {
    5
}

fn default_target_srs() -> String {
    "EPSG:4326".to_string()
}

fn default_extent() -> BoundingBox {
    BoundingBox::new(-20.0, -28.0, 52.0, 13.0)
}

fn default_width() -> usize {
    2400
}

fn default_background() -> Color {
    Color::Text("darkgrey".to_string())
}

fn default_colormap() -> ColormapConfig {
    let classes = [
        ("#ffffff00", "not_suitable"),
        ("#006d2c", "HL"),
        ("#31a354", "ML"),
        ("#bae4b3", "LL"),
        ("#2b8cbe", "HM"),
        ("#a6bddb", "MM"),
        ("#ece7f2", "LM"),
        ("#a50f15", "HH"),
        ("#de2d26", "MH"),
        ("#fcae91", "LH"),
        ("#ff00ff", "PA"),
    ];
    ColormapConfig {
        kind: ColormapKind::Listed(ListedConfig {
            colors: classes.iter().map(|(c, _)| Color::hex(c)).collect(),
            labels: classes.iter().map(|(_, l)| l.to_string()).collect(),
        }),
        vmin: Some(0.0),
        vmax: Some(10.0),
        bad_color: Color::transparent(),
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            title_size: default_title_size(),
            input: default_input(),
            output: default_output(),
            overview: OverviewConfig::default(),
            source_srs: None,
            target_srs: default_target_srs(),
            view: ViewConfig::default(),
            colormap: default_colormap(),
            mask_nodata: false,
        }
    }
}

impl PlotConfig {
    /// Load from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.overview.factor >= 1, "overview.factor must be at least 1");
        anyhow::ensure!(self.view.width >= 1, "view.width must be at least 1");
        self.view.extent.validate().context("view.extent")?;
        self.view.background.try_to_rgba().context("view.background")?;
        self.colormap.validate().context("colormap")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reproduce_areas_of_compromise() {
        let config = PlotConfig::default();
        config.validate().unwrap();
        assert_eq!(config.overview.factor, 5);
        assert_eq!(config.overview.resampling, Resampling::Nearest);
        assert_eq!(config.target_srs, "EPSG:4326");
        assert_eq!(config.view.background.try_to_rgba().unwrap(), (169, 169, 169, 255));
        match &config.colormap.kind {
            ColormapKind::Listed(l) => {
                assert_eq!(l.colors.len(), 11);
                assert_eq!(l.colors[0].try_to_rgba().unwrap(), (255, 255, 255, 0));
            }
            other => panic!("expected listed colormap, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = PlotConfig::from_yaml("{}").unwrap();
        assert_eq!(config.input, PathBuf::from("areas_of_compromise.tif"));
        assert_eq!(config.view.resolved_height(), 1367);
    }

    #[test]
    fn test_partial_override() {
        let yaml = r##"
title: Forest cover
input: forest.tif
overview:
  factor: 2
view:
  width: 720
  height: 400
colormap:
  type: listed
  colors: ["#ffffff00", "#74c476", "#006d2c"]
"##;
        let config = PlotConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.overview.factor, 2);
        assert_eq!(config.overview.resampling, Resampling::Nearest);
        assert_eq!(config.view.resolved_height(), 400);
        assert_eq!(config.view.extent, BoundingBox::new(-20.0, -28.0, 52.0, 13.0));
        assert_eq!(config.colormap.vmin, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(PlotConfig::from_yaml("overview: { factor: 0 }").is_err());
        assert!(PlotConfig::from_yaml("view: { background: '#12' }").is_err());
        assert!(PlotConfig::from_yaml("unknown_resampling: 1\noverview: { resampling: cubic }").is_err());
    }
}
