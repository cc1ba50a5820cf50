//! Layer reprojection.

use projection::{CoordinateTransform, SpatialRef};
use tracing::{info, warn};

use crate::layer::{Feature, Layer};
use crate::VectorResult;

/// Transform every geometry of `layer` from `source` to `target`.
///
/// The returned layer is named `name`, has the same fields and attribute
/// values, and carries `target` as its spatial reference. One transform is
/// prepared for the whole layer; each geometry's vertices go through it as
/// one batch.
pub fn reproject_layer(
    layer: &Layer,
    source: &SpatialRef,
    target: &SpatialRef,
    name: &str,
) -> VectorResult<Layer> {
    let transform = CoordinateTransform::new(source, target)?;
    let mut out = Layer::new(name, layer.shape_type(), layer.fields().to_vec()).with_srs(target.clone());

    let mut vertices = 0usize;
    for (index, feature) in layer.features().iter().enumerate() {
        let mut geometry = feature.geometry.clone();

        let mut coords: Vec<(f64, f64)> = geometry.points().map(|p| (p.x, p.y)).collect();
        if let Err(e) = transform.transform_points(&mut coords) {
            warn!(feature = index, error = %e, "Geometry cannot be reprojected");
            return Err(e.into());
        }
        for (point, (x, y)) in geometry.points_mut().zip(coords) {
            point.x = x;
            point.y = y;
        }
        vertices += geometry.num_points();

        out.push(Feature {
            geometry,
            attributes: feature.attributes.clone(),
        })?;
    }

    info!(
        layer = %name,
        features = out.len(),
        vertices,
        source = %source,
        target = %target,
        "Reprojected layer"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbf::{FieldDef, FieldValue};
    use crate::geometry::{Geometry, Point, ShapeType};
    use test_utils::assert_approx_eq;

    fn point_layer(points: &[(f64, f64)]) -> Layer {
        let mut layer = Layer::new("pts", ShapeType::Point, vec![FieldDef::numeric("ID", 4, 0)]);
        for (i, &p) in points.iter().enumerate() {
            layer
                .push(Feature {
                    geometry: Geometry::Point(Point::from(p)),
                    attributes: vec![FieldValue::Numeric(Some(i as f64))],
                })
                .unwrap();
        }
        layer
    }

    #[test]
    fn test_reprojects_and_keeps_attributes() {
        let wgs84 = SpatialRef::from_epsg(4326).unwrap();
        let mercator = SpatialRef::from_epsg(3857).unwrap();
        let layer = point_layer(&[(0.0, 0.0), (180.0, 0.0)]);

        let out = reproject_layer(&layer, &wgs84, &mercator, "pts_3857").unwrap();

        assert_eq!(out.name(), "pts_3857");
        assert_eq!(out.srs(), Some(&mercator));
        assert_eq!(out.fields(), layer.fields());
        assert_eq!(out.features()[1].attributes, layer.features()[1].attributes);
        match &out.features()[1].geometry {
            Geometry::Point(p) => assert_approx_eq!(p.x, 20_037_508.342789244, 1e-3),
            other => panic!("unexpected geometry {other:?}"),
        }
    }

    #[test]
    fn test_undefined_point_fails_whole_layer() {
        let wgs84 = SpatialRef::from_epsg(4326).unwrap();
        let mercator = SpatialRef::from_epsg(3857).unwrap();
        let layer = point_layer(&[(0.0, 0.0), (0.0, 90.0)]);
        assert!(reproject_layer(&layer, &wgs84, &mercator, "x").is_err());
    }
}
