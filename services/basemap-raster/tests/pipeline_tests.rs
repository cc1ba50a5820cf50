//! End-to-end runs of the plotting pipeline on small generated rasters.

use basemap_raster::{run, PlotConfig};
use geo_common::{BoundingBox, GeoTransform};
use projection::SpatialRef;
use raster::{Compression, GeoTiffWriter, Raster, SampleType};
use test_utils::{create_class_raster, preset_path, srs, temp_test_dir};

/// A 100 x 60 class raster in Albers metres, 10 km pixels, centred on the
/// projection origin.
fn write_albers_classes(path: &std::path::Path) {
    let gt = GeoTransform::north_up(-500_000.0, 300_000.0, 10_000.0, -10_000.0);
    let raster = Raster::from_data(create_class_raster(100, 60, 11), 100, 60, gt)
        .unwrap()
        .with_srs(Some(SpatialRef::from_proj4(srs::AEA_AFRICA).unwrap()))
        .with_nodata(Some(0.0));
    GeoTiffWriter::new()
        .compression(Compression::Lzw)
        .sample_type(SampleType::U8)
        .write(&raster, path)
        .unwrap();
}

#[test]
fn test_default_preset_renders_png() {
    let dir = temp_test_dir();
    let input = dir.path().join("areas_of_compromise.tif");
    let output = dir.path().join("areas_of_compromise.png");
    write_albers_classes(&input);

    // Antialiased title pixels would push the colour count past a palette.
    let config = PlotConfig {
        input,
        output: output.clone(),
        title_size: 0.0,
        ..PlotConfig::default()
    };
    let summary = run(&config).unwrap();

    assert_eq!((summary.overview_width, summary.overview_height), (20, 12));
    assert_eq!((summary.image_width, summary.image_height), (2400, 1367));

    let png = std::fs::read(&output).unwrap();
    assert_eq!(png.len(), summary.png_bytes);
    assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    // 11 classes plus the background fit a palette.
    assert_eq!(png[25], 3);
}

#[test]
fn test_title_is_drawn_into_the_image() {
    let dir = temp_test_dir();
    let input = dir.path().join("classes.tif");
    write_albers_classes(&input);

    let render = |title_size: f32, name: &str| {
        let output = dir.path().join(name);
        let config = PlotConfig {
            input: input.clone(),
            output: output.clone(),
            title_size,
            ..PlotConfig::default()
        };
        run(&config).unwrap();
        std::fs::read(output).unwrap()
    };

    let plain = render(0.0, "plain.png");
    let titled = render(24.0, "titled.png");
    assert_ne!(plain, titled);
}

#[test]
fn test_source_srs_override_and_small_view() {
    let dir = temp_test_dir();
    let input = dir.path().join("lonlat.tif");
    let output = dir.path().join("lonlat.png");

    // No spatial reference in the file; the config supplies it.
    let gt = GeoTransform::north_up(-20.0, 13.0, 1.0, -1.0);
    let raster = Raster::from_data(create_class_raster(72, 41, 11), 72, 41, gt).unwrap();
    GeoTiffWriter::new().write(&raster, &input).unwrap();

    let mut config = PlotConfig::from_yaml(
        r#"
title: Lon/lat classes
source_srs: "EPSG:4326"
overview: { factor: 1 }
view:
  extent: { min_x: -20, min_y: -28, max_x: 52, max_y: 13 }
  width: 144
"#,
    )
    .unwrap();
    config.input = input;
    config.output = output.clone();

    let summary = run(&config).unwrap();
    assert_eq!((summary.overview_width, summary.overview_height), (72, 41));
    assert_eq!((summary.image_width, summary.image_height), (144, 82));
    assert!(output.exists());
}

#[test]
fn test_missing_spatial_reference_is_an_error() {
    let dir = temp_test_dir();
    let input = dir.path().join("nosrs.tif");
    let gt = GeoTransform::north_up(0.0, 10.0, 1.0, -1.0);
    GeoTiffWriter::new()
        .write(&Raster::from_data(vec![1.0; 100], 10, 10, gt).unwrap(), &input)
        .unwrap();

    let config = PlotConfig {
        input,
        output: dir.path().join("out.png"),
        ..PlotConfig::default()
    };
    let err = run(&config).unwrap_err();
    assert!(format!("{err:#}").contains("no spatial reference"));
}

#[test]
fn test_missing_input_names_the_file() {
    let dir = temp_test_dir();
    let config = PlotConfig {
        input: dir.path().join("absent.tif"),
        output: dir.path().join("out.png"),
        ..PlotConfig::default()
    };
    let err = run(&config).unwrap_err();
    assert!(format!("{err:#}").contains("absent.tif"));
    assert!(!dir.path().join("out.png").exists());
}

#[test]
fn test_bundled_presets_load() {
    for name in ["areas_of_compromise", "forest_cover", "deforestation_risk"] {
        let config = PlotConfig::from_file(preset_path(&format!("{name}.yaml")))
            .unwrap_or_else(|e| panic!("{name}: {e:#}"));
        assert_eq!(config.view.extent, BoundingBox::new(-20.0, -28.0, 52.0, 13.0));
    }

    let areas = PlotConfig::from_file(preset_path("areas_of_compromise.yaml")).unwrap();
    assert_eq!(areas.overview.factor, 5);
    let risk = PlotConfig::from_file(preset_path("deforestation_risk.yaml")).unwrap();
    assert_eq!(risk.overview.factor, 10);
}
