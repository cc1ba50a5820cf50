//! Integration tests for shapefile I/O and the filter/reproject pipeline.

use std::path::{Path, PathBuf};

use projection::SpatialRef;
use test_utils::{square_ring, srs, temp_test_dir};
use vector::{
    create_filtered_shapefile, reproject_layer, AttributeFilter, Feature, FieldDef, FieldValue,
    Geometry, Layer, Point, ShapeType, VectorError,
};

fn polygon(min_x: f64, min_y: f64, size: f64) -> Geometry {
    let ring = square_ring(min_x, min_y, size).into_iter().map(Point::from).collect();
    Geometry::Polygon(vec![ring])
}

/// Three "continents" as lon/lat squares.
fn continents() -> Layer {
    let mut layer = Layer::new(
        "continent",
        ShapeType::Polygon,
        vec![FieldDef::character("CONTINENT", 16), FieldDef::numeric("RANK", 4, 0)],
    );
    for (name, rank, geometry) in [
        ("Africa", 1.0, polygon(10.0, -10.0, 20.0)),
        ("Europe", 2.0, polygon(0.0, 40.0, 10.0)),
        ("Oceania", 3.0, polygon(120.0, -30.0, 15.0)),
    ] {
        layer
            .push(Feature {
                geometry,
                attributes: vec![
                    FieldValue::Character(name.to_string()),
                    FieldValue::Numeric(Some(rank)),
                ],
            })
            .unwrap();
    }
    layer
}

fn write_continents(dir: &Path) -> PathBuf {
    let path = dir.join("continent.shp");
    continents().write(&path).unwrap();
    path
}

#[test]
fn test_written_shapefile_reopens_identically() {
    let dir = temp_test_dir();
    let path = write_continents(dir.path());

    assert!(path.with_extension("shx").exists());
    assert!(path.with_extension("dbf").exists());

    let layer = Layer::open(&path).unwrap();
    let original = continents();
    assert_eq!(layer.name(), "continent");
    assert_eq!(layer.shape_type(), ShapeType::Polygon);
    assert_eq!(layer.fields(), original.fields());
    assert_eq!(layer.features(), original.features());
    assert!(layer.srs().is_none());
}

#[test]
fn test_filtered_copy_keeps_matching_features() {
    let dir = temp_test_dir();
    let input = write_continents(dir.path());
    let output = dir.path().join("africa.shp");

    let filtered = create_filtered_shapefile("Africa", "CONTINENT", &input, &output).unwrap();
    assert_eq!(filtered.name(), "Africa");
    assert_eq!(filtered.len(), 1);

    let reopened = Layer::open(&output).unwrap();
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.features()[0].attributes[0].as_str(), Some("Africa"));
    assert_eq!(reopened.extent(), Some((10.0, 30.0, -10.0, 10.0)));
}

#[test]
fn test_filter_matching_nothing_gives_valid_empty_layer() {
    let dir = temp_test_dir();
    let input = write_continents(dir.path());
    let output = dir.path().join("atlantis.shp");

    let filtered = create_filtered_shapefile("Atlantis", "CONTINENT", &input, &output).unwrap();
    assert!(filtered.is_empty());

    let reopened = Layer::open(&output).unwrap();
    assert!(reopened.is_empty());
    assert_eq!(reopened.fields(), continents().fields());
    assert!(reopened.extent().is_none());
    // An empty file carries no shape to take the type from.
    assert!(matches!(reopened.shape_type(), ShapeType::Polygon | ShapeType::Null));
}

#[test]
fn test_filter_on_unknown_field_is_an_error() {
    let dir = temp_test_dir();
    let input = write_continents(dir.path());
    let output = dir.path().join("out.shp");

    let err = create_filtered_shapefile("Africa", "REGION", &input, &output).unwrap_err();
    assert!(matches!(err, VectorError::FieldNotFound(ref f) if f == "REGION"));
    assert!(!output.exists());
}

#[test]
fn test_parsed_filter_on_numeric_field() {
    let filter: AttributeFilter = "RANK <> 2".parse().unwrap();
    let out = filter.apply(&continents(), "not_europe").unwrap();
    let names: Vec<_> = out
        .features()
        .iter()
        .map(|f| f.attributes[0].to_string())
        .collect();
    assert_eq!(names, vec!["Africa", "Oceania"]);
}

#[test]
fn test_prj_with_epsg_authority_sets_srs() {
    let dir = temp_test_dir();
    let path = write_continents(dir.path());
    std::fs::write(path.with_extension("prj"), srs::UTM33N_WKT).unwrap();

    let layer = Layer::open(&path).unwrap();
    assert_eq!(layer.srs().and_then(|s| s.epsg()), Some(32633));
}

#[test]
fn test_prj_without_authority_is_converted() {
    let dir = temp_test_dir();
    let path = write_continents(dir.path());
    let wkt = r#"PROJCS["Africa_Albers",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Albers"],PARAMETER["False_Easting",0.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",25.0],PARAMETER["Standard_Parallel_1",20.0],PARAMETER["Standard_Parallel_2",-23.0],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;
    std::fs::write(path.with_extension("prj"), wkt).unwrap();

    let layer = Layer::open(&path).unwrap();
    let albers = SpatialRef::from_proj4(srs::AEA_AFRICA).unwrap();
    assert_eq!(layer.srs().unwrap().params().unwrap(), albers.params().unwrap());
}

#[test]
fn test_unreadable_prj_is_ignored() {
    let dir = temp_test_dir();
    let path = write_continents(dir.path());
    std::fs::write(path.with_extension("prj"), r#"GEOGCS["unnamed"]"#).unwrap();

    let layer = Layer::open(&path).unwrap();
    assert!(layer.srs().is_none());
}

#[test]
fn test_missing_dbf_is_an_error() {
    let dir = temp_test_dir();
    let path = write_continents(dir.path());
    std::fs::remove_file(path.with_extension("dbf")).unwrap();

    assert!(matches!(Layer::open(&path), Err(VectorError::Io(_))));
}

#[test]
fn test_written_prj_reads_back() {
    let dir = temp_test_dir();
    let wgs84 = SpatialRef::from_epsg(4326).unwrap();
    let albers = SpatialRef::from_proj4(srs::AEA_AFRICA).unwrap();

    let lonlat_path = dir.path().join("lonlat.shp");
    continents().with_srs(wgs84.clone()).write(&lonlat_path).unwrap();
    assert!(lonlat_path.with_extension("prj").exists());
    assert_eq!(Layer::open(&lonlat_path).unwrap().srs(), Some(&wgs84));

    let albers_path = dir.path().join("albers.shp");
    continents().with_srs(albers.clone()).write(&albers_path).unwrap();
    let reopened = Layer::open(&albers_path).unwrap();
    assert_eq!(reopened.srs().unwrap().params().unwrap(), albers.params().unwrap());
}

#[test]
fn test_layer_without_srs_writes_no_prj() {
    let dir = temp_test_dir();
    let path = write_continents(dir.path());
    assert!(!path.with_extension("prj").exists());
}

fn dbf_header_len(dbf: &[u8]) -> usize {
    u16::from_le_bytes([dbf[8], dbf[9]]) as usize
}

#[test]
fn test_deleted_record_drops_its_shape() {
    let dir = temp_test_dir();
    let path = write_continents(dir.path());
    let dbf_path = path.with_extension("dbf");
    let mut dbf = std::fs::read(&dbf_path).unwrap();
    let first_record = dbf_header_len(&dbf);
    dbf[first_record] = b'*';
    std::fs::write(&dbf_path, &dbf).unwrap();

    let layer = Layer::open(&path).unwrap();
    let names: Vec<_> = layer.features().iter().map(|f| f.attributes[0].to_string()).collect();
    assert_eq!(names, vec!["Europe", "Oceania"]);
    assert_eq!(layer.features()[0].geometry, polygon(0.0, 40.0, 10.0));
}

#[test]
fn test_record_count_beyond_file_is_invalid() {
    let dir = temp_test_dir();
    let path = write_continents(dir.path());
    let dbf_path = path.with_extension("dbf");
    let mut dbf = std::fs::read(&dbf_path).unwrap();
    dbf[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
    std::fs::write(&dbf_path, &dbf).unwrap();

    assert!(matches!(Layer::open(&path), Err(VectorError::InvalidDbf(_))));
}

#[test]
fn test_point_line_and_multipoint_layers_reopen() {
    let dir = temp_test_dir();
    let geometries = [
        (ShapeType::Point, Geometry::Point(Point::new(3.5, -2.0))),
        (
            ShapeType::PolyLine,
            Geometry::PolyLine(vec![
                vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
                vec![Point::new(5.0, 5.0), Point::new(6.0, 5.0), Point::new(7.0, 4.0)],
            ]),
        ),
        (
            ShapeType::MultiPoint,
            Geometry::MultiPoint(vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]),
        ),
    ];
    for (shape_type, geometry) in geometries {
        let mut layer = Layer::new("shapes", shape_type, vec![FieldDef::logical("KEEP")]);
        layer
            .push(Feature {
                geometry: geometry.clone(),
                attributes: vec![FieldValue::Logical(Some(true))],
            })
            .unwrap();
        let path = dir.path().join(format!("{:?}.shp", shape_type));
        layer.write(&path).unwrap();

        let reopened = Layer::open(&path).unwrap();
        assert_eq!(reopened.shape_type(), shape_type);
        assert_eq!(reopened.features(), layer.features());
    }
}

#[test]
fn test_polygon_hole_survives_round_trip() {
    let dir = temp_test_dir();
    let outer: Vec<Point> = square_ring(0.0, 0.0, 10.0).into_iter().map(Point::from).collect();
    let mut hole: Vec<Point> = square_ring(2.0, 2.0, 2.0).into_iter().map(Point::from).collect();
    hole.reverse();
    let geometry = Geometry::Polygon(vec![outer, hole]);

    let mut layer = Layer::new("holed", ShapeType::Polygon, vec![FieldDef::numeric("ID", 3, 0)]);
    layer
        .push(Feature {
            geometry: geometry.clone(),
            attributes: vec![FieldValue::Numeric(Some(7.0))],
        })
        .unwrap();
    let path = dir.path().join("holed.shp");
    layer.write(&path).unwrap();

    assert_eq!(Layer::open(&path).unwrap().features()[0].geometry, geometry);
}

#[test]
fn test_oversized_numeric_fails_before_writing() {
    let dir = temp_test_dir();
    let mut layer = Layer::new("big", ShapeType::Point, vec![FieldDef::numeric("POP", 3, 0)]);
    layer
        .push(Feature {
            geometry: Geometry::Point(Point::new(0.0, 0.0)),
            attributes: vec![FieldValue::Numeric(Some(12345.0))],
        })
        .unwrap();
    let path = dir.path().join("big.shp");

    assert!(matches!(layer.write(&path), Err(VectorError::ValueOverflow { .. })));
    assert!(!path.exists());
}

#[test]
fn test_reproject_to_albers_moves_extent_into_metres() {
    let wgs84 = SpatialRef::from_epsg(4326).unwrap();
    let albers = SpatialRef::from_proj4(srs::AEA_AFRICA).unwrap();
    let africa = AttributeFilter::equals("CONTINENT", "Africa")
        .apply(&continents(), "Africa")
        .unwrap();

    let projected = reproject_layer(&africa, &wgs84, &albers, "africa_aea").unwrap();
    let (x_min, x_max, y_min, y_max) = projected.extent().unwrap();

    // A 20 degree square straddling the equator is roughly 2000 km a side.
    assert!(x_max - x_min > 1.5e6 && x_max - x_min < 2.5e6);
    assert!(y_max - y_min > 1.5e6 && y_max - y_min < 2.5e6);
    assert_eq!(projected.srs(), Some(&albers));
    assert_eq!(projected.features()[0].attributes, africa.features()[0].attributes);
}
