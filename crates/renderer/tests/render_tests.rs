//! End-to-end rendering: raster pixel centres reprojected into a lon/lat
//! view and drawn as a class map.

use geo_common::{BoundingBox, ColormapConfig, GeoTransform};
use projection::{reproject_grid, CoordinateGrid, SpatialRef};
use raster::{build_overview, Raster, Resampling};
use renderer::{render_mesh, Colormap, MapView, Mesh};
use test_utils::{create_class_raster, extent, srs};

const CLASSES_YAML: &str = r##"
type: listed
colors: ['#ffffff00', '#006d2c', '#31a354', '#bae4b3',
         '#2b8cbe', '#a6bddb', '#ece7f2', '#a50f15',
         '#de2d26', '#fcae91', '#ff00ff']
vmin: 0
vmax: 10
"##;

fn colormap() -> Colormap {
    Colormap::from_config(&ColormapConfig::from_yaml(CLASSES_YAML).unwrap()).unwrap()
}

#[test]
fn test_identity_mesh_draws_cell_colours_in_place() {
    // 5 x 5 lon/lat cells of 1 degree; view matches the centres exactly.
    let gt = GeoTransform::north_up(0.0, 5.0, 1.0, -1.0);
    let values: Vec<f32> = (0..25).map(|i| if i % 5 == 4 || i >= 20 { 0.0 } else { 1.0 }).collect();
    let grid = CoordinateGrid::pixel_centers(&gt, 5, 5);
    let wgs84 = SpatialRef::from_epsg(4326).unwrap();
    let mesh_grid = reproject_grid(&grid, &wgs84, &wgs84).unwrap();

    let view = MapView::new(BoundingBox::new(0.5, 0.5, 4.5, 4.5), 4, 4)
        .unwrap()
        .with_background([169, 169, 169, 255]);
    let image = render_mesh(&Mesh::from(&mesh_grid), &values, None, &colormap(), &view).unwrap();

    // Each of the 4 x 4 quads covers exactly one output pixel.
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(image.get(x, y), Some([0x00, 0x6d, 0x2c, 255]), "pixel ({x}, {y})");
        }
    }
}

#[test]
fn test_albers_overview_renders_inside_africa_view() {
    // A 200 km square of class 7 around the Albers origin (25E, 0N).
    let albers = SpatialRef::from_proj4(srs::AEA_AFRICA).unwrap();
    let gt = GeoTransform::north_up(-100_000.0, 100_000.0, 1000.0, -1000.0);
    let src = Raster::from_data(vec![7.0; 200 * 200], 200, 200, gt)
        .unwrap()
        .with_srs(Some(albers.clone()));

    let ov = build_overview(&src, 5, Resampling::Nearest).unwrap();
    assert_eq!((ov.width, ov.height), (40, 40));

    let grid = CoordinateGrid::pixel_centers(&ov.geotransform, ov.height, ov.width);
    let wgs84 = SpatialRef::from_epsg(4326).unwrap();
    let lonlat = reproject_grid(&grid, &albers, &wgs84).unwrap();

    let (w, s, e, n) = extent::AFRICA_VIEW;
    let view = MapView::new(BoundingBox::new(w, s, e, n), 720, 410).unwrap();
    let image = render_mesh(&Mesh::from(&lonlat), &ov.data, ov.nodata, &colormap(), &view).unwrap();

    let (px, py) = view.to_pixel(25.0, 0.0);
    assert_eq!(image.get(px as usize, py as usize), Some([0xa5, 0x0f, 0x15, 255]));
    // Far corners of the view stay background.
    assert_eq!(image.get(0, 0), Some([0, 0, 0, 0]));
    assert_eq!(image.get(719, 409), Some([0, 0, 0, 0]));

    let png = image.encode_png(&[("Title", "Areas of compromise")]).unwrap();
    assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
}

#[test]
fn test_class_raster_palette_fits_indexed_png() {
    let gt = GeoTransform::north_up(-20.0, 13.0, 1.0, -1.0);
    let values = create_class_raster(72, 41, 11);
    let grid = CoordinateGrid::pixel_centers(&gt, 41, 72);

    let (w, s, e, n) = extent::AFRICA_VIEW;
    let view = MapView::new(BoundingBox::new(w, s, e, n), 144, 82)
        .unwrap()
        .with_background([169, 169, 169, 255]);
    let image = render_mesh(&Mesh::from(&grid), &values, None, &colormap(), &view).unwrap();

    let png = image.encode_png(&[]).unwrap();
    // Color type byte of IHDR: 8 (signature) + 8 (length, type) + 9.
    assert_eq!(png[25], 3);
}
