//! Shapefile-to-raster configuration.
//!
//! The defaults reproduce the Africa mask run.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use raster::{Compression, RasterizeOptions, SampleType};
use serde::{Deserialize, Serialize};

const AEA_AFRICA: &str = "+proj=aea +lat_1=20 +lat_2=-23 +lat_0=0 +lon_0=25 +x_0=0 +y_0=0 \
                          +ellps=WGS84 +datum=WGS84 +units=m no_defs";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeToRasterConfig {
    /// Source shapefile
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Attribute the filter compares
    #[serde(default = "default_filter_field")]
    pub filter_field: String,

    /// Value features must have to be kept; also names the filtered layer
    #[serde(default = "default_filter_value")]
    pub filter_value: String,

    /// Where the filtered copy is written
    #[serde(default = "default_filtered_output")]
    pub filtered_output: PathBuf,

    /// Reference of the input geometries. When unset, the input's `.prj`
    /// is used.
    #[serde(default = "default_source_srs")]
    pub source_srs: Option<String>,

    /// Reference the features are reprojected into before rasterizing
    #[serde(default = "default_target_srs")]
    pub target_srs: String,

    /// Name of the reprojected layer
    #[serde(default = "default_reprojected_layer")]
    pub reprojected_layer: String,

    /// Where the reprojected shapefile is written
    #[serde(default = "default_reprojected_output")]
    pub reprojected_output: PathBuf,

    #[serde(default)]
    pub rasterize: RasterizeOptions,

    #[serde(default)]
    pub compression: Compression,

    #[serde(default)]
    pub sample_type: SampleType,

    /// Output GeoTIFF
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_input() -> PathBuf {
    PathBuf::from("continents/continent.shp")
}

fn default_filter_field() -> String {
    "CONTINENT".to_string()
}

fn default_filter_value() -> String {
    "Africa".to_string()
}

fn default_filtered_output() -> PathBuf {
    PathBuf::from("continents/africa.shp")
}

fn default_source_srs() -> Option<String> {
    Some("EPSG:4326".to_string())
}

fn default_target_srs() -> String {
    AEA_AFRICA.to_string()
}

fn default_reprojected_layer() -> String {
    "africa_aea".to_string()
}

fn default_reprojected_output() -> PathBuf {
    PathBuf::from("continents/africa_aea.shp")
}

fn default_output() -> PathBuf {
    PathBuf::from("continents/africa.tif")
}

impl Default for ShapeToRasterConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            filter_field: default_filter_field(),
            filter_value: default_filter_value(),
            filtered_output: default_filtered_output(),
            source_srs: default_source_srs(),
            target_srs: default_target_srs(),
            reprojected_layer: default_reprojected_layer(),
            reprojected_output: default_reprojected_output(),
            rasterize: RasterizeOptions::default(),
            compression: Compression::Lzw,
            sample_type: SampleType::U8,
            output: default_output(),
        }
    }
}

impl ShapeToRasterConfig {
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
        anyhow::ensure!(!self.filter_field.is_empty(), "filter_field must not be empty");
        anyhow::ensure!(!self.reprojected_layer.is_empty(), "reprojected_layer must not be empty");
        let pixel = self.rasterize.pixel_size;
        anyhow::ensure!(
            pixel.is_finite() && pixel > 0.0,
            "rasterize.pixel_size must be positive, got {}",
            pixel
        );
        Ok(())
    }
}
