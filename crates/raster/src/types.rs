//! Core raster type.

use geo_common::{BoundingBox, GeoTransform};
use projection::SpatialRef;

use crate::{RasterError, RasterResult};

/// A single band of `f32` samples, row-major, with its georeferencing.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub geotransform: GeoTransform,
    pub srs: Option<SpatialRef>,
    pub nodata: Option<f64>,
}

impl Raster {
    /// Wrap existing samples. `data` must hold `width * height` values.
    pub fn from_data(
        data: Vec<f32>,
        width: usize,
        height: usize,
        geotransform: GeoTransform,
    ) -> RasterResult<Self> {
        if data.len() != width * height {
            return Err(RasterError::InvalidData(format!(
                "{} samples for a {}x{} raster",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            geotransform,
            srs: None,
            nodata: None,
        })
    }

    /// A raster with every sample set to `value`.
    pub fn filled(width: usize, height: usize, geotransform: GeoTransform, value: f32) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
            geotransform,
            srs: None,
            nodata: None,
        }
    }

    pub fn with_srs(mut self, srs: Option<SpatialRef>) -> Self {
        self.srs = srs;
        self
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(self.data[row * self.width + col])
    }

    pub fn set(&mut self, col: usize, row: usize, value: f32) {
        if col < self.width && row < self.height {
            self.data[row * self.width + col] = value;
        }
    }

    /// NaN, or equal to the no-data value.
    pub fn is_nodata(&self, value: f32) -> bool {
        value.is_nan() || self.nodata.is_some_and(|nd| value as f64 == nd)
    }

    /// Minimum and maximum of the valid samples.
    pub fn valid_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite() && !self.is_nodata(*v))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Outer extent in world coordinates.
    pub fn extent(&self) -> BoundingBox {
        self.geotransform.extent(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Raster {
        Raster::from_data(
            vec![0.0, 1.0, 2.0, f32::NAN, 5.0, 0.0],
            3,
            2,
            GeoTransform::north_up(0.0, 2.0, 1.0, -1.0),
        )
        .unwrap()
        .with_nodata(Some(0.0))
    }

    #[test]
    fn test_from_data_checks_length() {
        let gt = GeoTransform::north_up(0.0, 0.0, 1.0, -1.0);
        assert!(Raster::from_data(vec![0.0; 5], 3, 2, gt).is_err());
    }

    #[test]
    fn test_valid_range_skips_nodata_and_nan() {
        assert_eq!(sample().valid_range(), Some((1.0, 5.0)));
    }

    #[test]
    fn test_get_set_bounds() {
        let mut r = sample();
        r.set(2, 1, 9.0);
        r.set(3, 0, 9.0);
        assert_eq!(r.get(2, 1), Some(9.0));
        assert_eq!(r.get(3, 0), None);
    }

    #[test]
    fn test_extent() {
        let e = sample().extent();
        assert_eq!((e.min_x, e.min_y, e.max_x, e.max_y), (0.0, 0.0, 3.0, 2.0));
    }
}
