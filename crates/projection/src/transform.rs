//! Point transformation between two spatial references.

use std::fmt;

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::{ProjectionError, ProjectionResult, SpatialRef};

/// A prepared transform from one spatial reference to another.
///
/// Both projections are parsed once in [`CoordinateTransform::new`]; every
/// subsequent call reuses them. Geographic coordinates are exchanged in
/// degrees and converted to radians around the `proj4rs` call.
pub struct CoordinateTransform {
    source: SpatialRef,
    target: SpatialRef,
    source_proj: Proj,
    target_proj: Proj,
    source_geographic: bool,
    target_geographic: bool,
}

impl CoordinateTransform {
    pub fn new(source: &SpatialRef, target: &SpatialRef) -> ProjectionResult<Self> {
        Ok(Self {
            source_proj: source.to_proj()?,
            target_proj: target.to_proj()?,
            source_geographic: source.is_geographic(),
            target_geographic: target.is_geographic(),
            source: source.clone(),
            target: target.clone(),
        })
    }

    pub fn source(&self) -> &SpatialRef {
        &self.source
    }

    pub fn target(&self) -> &SpatialRef {
        &self.target
    }

    /// Transform a single point.
    pub fn transform_point(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        self.transform_one(0, x, y)
    }

    /// Transform points in place, one `proj4rs` call per point.
    ///
    /// Fails on the first point the transform is undefined for, reporting
    /// its index. Points before it are already overwritten; callers treat
    /// the whole slice as failed.
    pub fn transform_points(&self, points: &mut [(f64, f64)]) -> ProjectionResult<()> {
        for (index, point) in points.iter_mut().enumerate() {
            *point = self.transform_one(index, point.0, point.1)?;
        }
        Ok(())
    }

    fn transform_one(&self, index: usize, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        let failed = |reason: String| ProjectionError::TransformFailed {
            index,
            x,
            y,
            reason,
        };

        if !x.is_finite() || !y.is_finite() {
            return Err(failed("non-finite input coordinate".to_string()));
        }

        let mut point = if self.source_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        transform(&self.source_proj, &self.target_proj, &mut point)
            .map_err(|e| failed(format!("{e:?}")))?;

        let (out_x, out_y) = if self.target_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(failed(format!(
                "projection {} is undefined here",
                self.target
            )));
        }

        Ok((out_x, out_y))
    }
}

impl fmt::Debug for CoordinateTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinateTransform")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}
