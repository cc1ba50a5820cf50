//! Test helpers shared by the geogrid crates.
//!
//! - `paths`: workspace, preset and optional test-data locations
//! - `generators`: synthetic rasters, coordinate planes and rings
//! - `fixtures`: spatial reference strings and map extents
//! - assertion macros for coordinates and coordinate planes
//!
//! Shapefiles and GeoTIFFs are generated per test into a temporary
//! directory; the only on-disk data read from outside is the optional
//! continents shapefile under `TEST_DATA_DIR`.

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Return the path of an optional test data file, or skip the test.
///
/// ```ignore
/// let shp = test_utils::require_test_file!("continent.shp");
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!("SKIPPED: '{}' not found (set TEST_DATA_DIR)", $name);
                return;
            }
        }
    }};
}

/// Scalar approximate equality, reporting both values and the difference.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "values differ: left `{:?}`, right `{:?}`, diff `{:?}` > `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Approximate equality of `(x, y)` pairs.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (x1, y1): (f64, f64) = $left;
        let (x2, y2): (f64, f64) = $right;
        $crate::assert_approx_eq!(x1, x2, $epsilon);
        $crate::assert_approx_eq!(y1, y2, $epsilon);
    }};
}

/// Macro for element-wise approximate equality of two coordinate planes.
///
/// Reports the first (flat) index that differs, which maps back to a
/// (row, col) through the grid's column count.
///
/// ```ignore
/// use test_utils::assert_planes_approx_eq;
///
/// assert_planes_approx_eq!(&[1.0, 2.0], &[1.0, 2.0000001], 1e-6);
/// ```
#[macro_export]
macro_rules! assert_planes_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: &[f64] = $left;
        let right: &[f64] = $right;
        assert_eq!(left.len(), right.len(), "plane lengths differ");
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            let diff = (l - r).abs();
            if !(diff <= $epsilon as f64) {
                panic!(
                    "planes differ at index {}: left `{:?}`, right `{:?}`, diff `{:?}`",
                    i, l, r, diff
                );
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "values differ")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "values differ")]
    fn test_assert_approx_eq_rejects_nan() {
        assert_approx_eq!(f64::NAN, 1.0, 0.001);
    }

    #[test]
    fn test_assert_planes_approx_eq_passes() {
        assert_planes_approx_eq!(&[1.0, 2.0, 3.0], &[1.0, 2.0000001, 3.0], 1e-6);
    }

    #[test]
    #[should_panic(expected = "planes differ at index 1")]
    fn test_assert_planes_approx_eq_reports_index() {
        assert_planes_approx_eq!(&[1.0, 2.0], &[1.0, 2.5], 1e-6);
    }

    #[test]
    fn test_assert_coords_approx_eq_passes() {
        let lonlat = (25.0000001, -0.0000001);
        assert_coords_approx_eq!(lonlat, (25.0, 0.0), 1e-6);
    }
}
