//! Affine pixel-to-world transforms.
//!
//! Coefficients follow the GDAL ordering:
//! `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`
//!
//! ```text
//! x = origin_x + col * pixel_width  + row * row_rotation
//! y = origin_y + col * col_rotation + row * pixel_height
//! ```
//!
//! North-up rasters have zero rotation terms and a negative `pixel_height`.

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, GeoError, GeoResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform anchored at the top-left corner.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y,
            col_rotation: 0.0,
            pixel_height,
        }
    }

    pub fn from_array(c: [f64; 6]) -> Self {
        Self {
            origin_x: c[0],
            pixel_width: c[1],
            row_rotation: c[2],
            origin_y: c[3],
            col_rotation: c[4],
            pixel_height: c[5],
        }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    pub fn is_north_up(&self) -> bool {
        self.row_rotation == 0.0 && self.col_rotation == 0.0
    }

    /// World coordinates of a fractional pixel position (col, row).
    ///
    /// `(0, 0)` is the outer top-left corner of the first pixel; add 0.5 to
    /// both for its centre.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// World coordinates of the centre of pixel (col, row).
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.pixel_to_world(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Fractional pixel position of a world coordinate.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> GeoResult<(f64, f64)> {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;
        if det.abs() < 1e-15 {
            return Err(GeoError::SingularGeoTransform(self.to_array()));
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (self.pixel_width * dy - self.col_rotation * dx) / det;
        Ok((col, row))
    }

    /// Scale the pixel size, keeping the origin. Used for overviews where
    /// one output pixel covers `sx` by `sy` input pixels.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            origin_x: self.origin_x,
            pixel_width: self.pixel_width * sx,
            row_rotation: self.row_rotation * sy,
            origin_y: self.origin_y,
            col_rotation: self.col_rotation * sx,
            pixel_height: self.pixel_height * sy,
        }
    }

    /// Outer extent of a `width` x `height` raster.
    pub fn extent(&self, width: usize, height: usize) -> BoundingBox {
        let corners = [
            self.pixel_to_world(0.0, 0.0),
            self.pixel_to_world(width as f64, 0.0),
            self.pixel_to_world(0.0, height as f64),
            self.pixel_to_world(width as f64, height as f64),
        ];
        // Four corners are always present.
        BoundingBox::from_points(corners).unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }
}
