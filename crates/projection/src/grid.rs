//! Coordinate grids and the grid reprojector.
//!
//! A [`CoordinateGrid`] holds two stacked H x W planes (x-plane, y-plane)
//! of pixel-centre coordinates in a source reference. [`reproject_grid`]
//! maps the whole grid into a target reference in one batched transform
//! and returns a [`TransformedGrid`] with the same (row, col) indexing,
//! ready to be used as a rendering mesh.
//!
//! Both planes are stored row-major. Flattening to point pairs and
//! reshaping back use that same order, so cell (r, c) of the output is
//! always the image of cell (r, c) of the input.

use geo_common::GeoTransform;
use tracing::debug;

use crate::{CoordinateTransform, ProjectionError, ProjectionResult, SpatialRef};

/// A rectangular grid of (x, y) pairs indexed by (row, col).
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateGrid {
    rows: usize,
    cols: usize,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl CoordinateGrid {
    /// Build from two row-major planes of `rows * cols` values each.
    pub fn new(rows: usize, cols: usize, x: Vec<f64>, y: Vec<f64>) -> ProjectionResult<Self> {
        let expected = rows * cols;
        if x.len() != expected || y.len() != expected {
            return Err(ProjectionError::ShapeMismatch(format!(
                "expected {}x{} = {} values per plane, got x={} y={}",
                rows,
                cols,
                expected,
                x.len(),
                y.len()
            )));
        }
        Ok(Self { rows, cols, x, y })
    }

    /// Build from a stacked 2 x H x W buffer: the x-plane followed by the
    /// y-plane, each row-major.
    pub fn from_stacked(data: &[f64], rows: usize, cols: usize) -> ProjectionResult<Self> {
        let plane = rows * cols;
        if data.len() != 2 * plane {
            return Err(ProjectionError::ShapeMismatch(format!(
                "stacked buffer of {} values cannot be 2x{}x{}",
                data.len(),
                rows,
                cols
            )));
        }
        Self::new(rows, cols, data[..plane].to_vec(), data[plane..].to_vec())
    }

    /// Build from nested rows (`x[row][col]`, `y[row][col]`).
    pub fn from_rows(x: &[Vec<f64>], y: &[Vec<f64>]) -> ProjectionResult<Self> {
        let rows = x.len();
        let cols = x.first().map(Vec::len).unwrap_or(0);

        if y.len() != rows {
            return Err(ProjectionError::ShapeMismatch(format!(
                "x has {} rows, y has {}",
                rows,
                y.len()
            )));
        }
        if x.iter().chain(y.iter()).any(|row| row.len() != cols) {
            return Err(ProjectionError::ShapeMismatch(
                "ragged rows: every row must have the same length".to_string(),
            ));
        }

        Self::new(rows, cols, x.concat(), y.concat())
    }

    /// Pixel-centre coordinates of a `rows` x `cols` raster.
    ///
    /// Centre (r, c) sits at pixel position (c + 0.5, r + 0.5) of the
    /// geotransform, i.e. the raster edge plus half a pixel.
    pub fn pixel_centers(geotransform: &GeoTransform, rows: usize, cols: usize) -> Self {
        let mut x = Vec::with_capacity(rows * cols);
        let mut y = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let (px, py) = geotransform.pixel_center(col, row);
                x.push(px);
                y.push(py);
            }
        }
        Self { rows, cols, x, y }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<(f64, f64)> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let idx = row * self.cols + col;
        Some((self.x[idx], self.y[idx]))
    }

    pub fn x_plane(&self) -> &[f64] {
        &self.x
    }

    pub fn y_plane(&self) -> &[f64] {
        &self.y
    }

    /// Flatten to (x, y) pairs in row-major order.
    fn to_pairs(&self) -> Vec<(f64, f64)> {
        self.x.iter().copied().zip(self.y.iter().copied()).collect()
    }
}

/// Target-reference coordinates for every cell of a [`CoordinateGrid`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedGrid {
    rows: usize,
    cols: usize,
    xx: Vec<f64>,
    yy: Vec<f64>,
}

impl TransformedGrid {
    /// Split transformed pairs back into x and y planes.
    fn from_pairs(rows: usize, cols: usize, pairs: Vec<(f64, f64)>) -> Self {
        let (xx, yy) = pairs.into_iter().unzip();
        Self { rows, cols, xx, yy }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<(f64, f64)> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let idx = row * self.cols + col;
        Some((self.xx[idx], self.yy[idx]))
    }

    /// Row-major x plane.
    pub fn xx(&self) -> &[f64] {
        &self.xx
    }

    /// Row-major y plane.
    pub fn yy(&self) -> &[f64] {
        &self.yy
    }

    pub fn into_planes(self) -> (Vec<f64>, Vec<f64>) {
        (self.xx, self.yy)
    }

    /// Reinterpret as a coordinate grid, e.g. to reproject it again.
    pub fn into_grid(self) -> CoordinateGrid {
        CoordinateGrid {
            rows: self.rows,
            cols: self.cols,
            x: self.xx,
            y: self.yy,
        }
    }
}

/// Reproject a coordinate grid from `source` to `target`.
///
/// The grid is flattened to point pairs, transformed in one batch, and
/// reshaped to its original (rows, cols). Identical references still take
/// the full transform path, so output shape and type never depend on
/// whether a conversion was needed.
pub fn reproject_grid(
    grid: &CoordinateGrid,
    source: &SpatialRef,
    target: &SpatialRef,
) -> ProjectionResult<TransformedGrid> {
    let (rows, cols) = grid.shape();
    let transform = CoordinateTransform::new(source, target)?;

    let mut pairs = grid.to_pairs();
    transform.transform_points(&mut pairs)?;

    debug!(rows, cols, source = %source, target = %target, "Reprojected coordinate grid");

    Ok(TransformedGrid::from_pairs(rows, cols, pairs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(CoordinateGrid::new(2, 3, vec![0.0; 6], vec![0.0; 5]).is_err());
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let x = vec![vec![0.0, 1.0], vec![0.0]];
        let y = vec![vec![0.0, 1.0], vec![0.0, 1.0]];
        assert!(CoordinateGrid::from_rows(&x, &y).is_err());
    }

    #[test]
    fn test_from_stacked_splits_planes() {
        let data = [1.0, 2.0, 3.0, 4.0, 10.0, 20.0, 30.0, 40.0];
        let grid = CoordinateGrid::from_stacked(&data, 2, 2).unwrap();
        assert_eq!(grid.get(0, 1), Some((2.0, 20.0)));
        assert_eq!(grid.get(1, 0), Some((3.0, 30.0)));
        assert_eq!(grid.get(2, 0), None);
    }

    #[test]
    fn test_pixel_centers_half_pixel_offset() {
        let gt = GeoTransform::north_up(0.0, 100.0, 10.0, -10.0);
        let grid = CoordinateGrid::pixel_centers(&gt, 3, 4);
        assert_eq!(grid.shape(), (3, 4));
        assert_eq!(grid.get(0, 0), Some((5.0, 95.0)));
        assert_eq!(grid.get(2, 3), Some((35.0, 75.0)));
    }

    #[test]
    fn test_pairs_are_row_major() {
        let grid = CoordinateGrid::new(2, 2, vec![0.0, 1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0, 7.0])
            .unwrap();
        assert_eq!(
            grid.to_pairs(),
            vec![(0.0, 4.0), (1.0, 5.0), (2.0, 6.0), (3.0, 7.0)]
        );
        let back = TransformedGrid::from_pairs(2, 2, grid.to_pairs());
        assert_eq!(back.into_grid(), grid);
    }
}
