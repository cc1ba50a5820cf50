//! Test data generators for coordinate grids and rasters.
//!
//! Every generator is deterministic, so tests can assert exact values.

/// Creates a raster whose cell value encodes its position.
///
/// Each cell value is `col * 1000 + row`, in row-major order, so
/// `data[row * width + col] == col * 1000 + row`.
///
/// ```
/// use test_utils::create_index_raster;
///
/// let data = create_index_raster(10, 5);
/// assert_eq!(data.len(), 50);
/// assert_eq!(data[1], 1000.0);  // col=1, row=0
/// assert_eq!(data[10], 1.0);    // col=0, row=1
/// ```
pub fn create_index_raster(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a categorical raster cycling through `classes` values in
/// diagonal bands: `(row + col) % classes`.
pub fn create_class_raster(width: usize, height: usize, classes: u32) -> Vec<f32> {
    let classes = classes.max(1) as usize;
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(((row + col) % classes) as f32);
        }
    }
    data
}

/// Creates x and y planes (row-major) of a regular lon/lat grid.
///
/// Row 0 is the northern edge, so latitude decreases with the row index,
/// matching a north-up raster.
pub fn create_lonlat_planes(
    rows: usize,
    cols: usize,
    west: f64,
    north: f64,
    step: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(rows * cols);
    let mut ys = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            xs.push(west + col as f64 * step);
            ys.push(north - row as f64 * step);
        }
    }
    (xs, ys)
}

/// Creates planes where every cell is distinct: x = `col + row / 1000`,
/// y = `row + col / 1000`, offset by `origin`.
///
/// Useful for checking that (row, col) survive a flatten/reshape cycle.
pub fn create_distinct_planes(rows: usize, cols: usize, origin: (f64, f64)) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(rows * cols);
    let mut ys = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            xs.push(origin.0 + col as f64 + row as f64 / 1000.0);
            ys.push(origin.1 + row as f64 + col as f64 / 1000.0);
        }
    }
    (xs, ys)
}

/// Closed square ring (first vertex repeated), clockwise as shapefiles
/// expect for outer rings.
pub fn square_ring(min_x: f64, min_y: f64, size: f64) -> Vec<(f64, f64)> {
    vec![
        (min_x, min_y),
        (min_x, min_y + size),
        (min_x + size, min_y + size),
        (min_x + size, min_y),
        (min_x, min_y),
    ]
}
