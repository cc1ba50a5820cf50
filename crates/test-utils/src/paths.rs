//! Locations of presets, optional test data and scratch directories.

use std::path::PathBuf;

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(|p| p.to_path_buf())
        .unwrap_or(manifest_dir)
}

/// `config/presets/` under the workspace root.
pub fn presets_dir() -> PathBuf {
    workspace_root().join("config").join("presets")
}

/// Path of a shipped preset, e.g. `preset_path("africa_grid.yaml")`.
pub fn preset_path(name: &str) -> PathBuf {
    presets_dir().join(name)
}

/// Look for real data that is too large to ship: `$TEST_DATA_DIR/<name>`
/// first, then `testdata/<name>` under the workspace root.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    std::env::var_os("TEST_DATA_DIR")
        .map(|dir| PathBuf::from(dir).join(name))
        .into_iter()
        .chain(std::iter::once(workspace_root().join("testdata").join(name)))
        .find(|path| path.exists())
}

/// Scratch directory removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("geogrid_")
        .tempdir()
        .expect("Failed to create temporary test directory")
}
