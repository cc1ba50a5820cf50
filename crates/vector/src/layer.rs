//! In-memory vector layers and their shapefile representation.

use std::fs;
use std::path::{Path, PathBuf};

use geo_common::BoundingBox;
use projection::SpatialRef;
use tracing::{debug, info, warn};

use crate::dbf::{self, FieldDef, FieldValue};
use crate::geometry::{Geometry, ShapeType};
use crate::shp;
use crate::{VectorError, VectorResult};

/// One geometry plus one value per layer field.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub attributes: Vec<FieldValue>,
}

/// A named collection of features sharing one schema.
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    shape_type: ShapeType,
    fields: Vec<FieldDef>,
    features: Vec<Feature>,
    srs: Option<SpatialRef>,
}

impl Layer {
    pub fn new(name: impl Into<String>, shape_type: ShapeType, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            shape_type,
            fields,
            features: Vec::new(),
            srs: None,
        }
    }

    /// Same schema and spatial reference, no features.
    pub fn empty_like(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape_type: self.shape_type,
            fields: self.fields.clone(),
            features: Vec::new(),
            srs: self.srs.clone(),
        }
    }

    pub fn with_srs(mut self, srs: SpatialRef) -> Self {
        self.srs = Some(srs);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Column index of a field. dBase names are upper case by convention,
    /// so the lookup ignores case.
    pub fn field_index(&self, name: &str) -> VectorResult<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| VectorError::FieldNotFound(name.to_string()))
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut [Feature] {
        &mut self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn srs(&self) -> Option<&SpatialRef> {
        self.srs.as_ref()
    }

    pub fn set_srs(&mut self, srs: Option<SpatialRef>) {
        self.srs = srs;
    }

    /// Append a feature, checking it against the schema.
    pub fn push(&mut self, feature: Feature) -> VectorResult<()> {
        if feature.attributes.len() != self.fields.len() {
            return Err(VectorError::SchemaMismatch(format!(
                "feature has {} attributes, layer {} has {} fields",
                feature.attributes.len(),
                self.name,
                self.fields.len()
            )));
        }
        if !feature.geometry.is_null() && feature.geometry.shape_type() != self.shape_type {
            return Err(VectorError::SchemaMismatch(format!(
                "{:?} geometry in {:?} layer {}",
                feature.geometry.shape_type(),
                self.shape_type,
                self.name
            )));
        }
        self.features.push(feature);
        Ok(())
    }

    /// Bounding box of every vertex in the layer.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(
            self.features
                .iter()
                .flat_map(|f| f.geometry.points())
                .map(|p| (p.x, p.y)),
        )
    }

    /// Layer extent as `(x_min, x_max, y_min, y_max)`.
    pub fn extent(&self) -> Option<(f64, f64, f64, f64)> {
        self.bounding_box()
            .map(|b| (b.min_x, b.max_x, b.min_y, b.max_y))
    }

    /// Read a shapefile given the path of its `.shp` member.
    ///
    /// The `.dbf` is required. Records flagged deleted in the `.dbf` are
    /// dropped together with their shapes. A readable `.prj` sets the
    /// layer's spatial reference; any other `.prj` is ignored with a warning.
    pub fn open(path: impl AsRef<Path>) -> VectorResult<Self> {
        let shp_path = path.as_ref();
        let name = shp_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let shapes = shp::read_shapes(shp_path)?;
        let table = dbf::read_table(&sibling(shp_path, "dbf"))?;

        if shapes.geometries.len() != table.records.len() {
            return Err(VectorError::SchemaMismatch(format!(
                "{} shapes but {} attribute records",
                shapes.geometries.len(),
                table.records.len()
            )));
        }
        let deleted = table.records.len() - table.live_count();
        if deleted > 0 {
            debug!(path = %shp_path.display(), deleted, "Skipping deleted records");
        }

        let srs = read_prj(&sibling(shp_path, "prj"));

        let features = shapes
            .geometries
            .into_iter()
            .zip(table.records)
            .zip(table.deleted)
            .filter(|(_, deleted)| !deleted)
            .map(|((geometry, attributes), _)| Feature {
                geometry,
                attributes,
            })
            .collect::<Vec<_>>();

        info!(
            path = %shp_path.display(),
            features = features.len(),
            fields = table.fields.len(),
            shape_type = ?shapes.shape_type,
            "Opened shapefile"
        );

        Ok(Self {
            name,
            shape_type: shapes.shape_type,
            fields: table.fields,
            features,
            srs,
        })
    }

    /// Write `.shp`, `.shx` and `.dbf` next to `path`, plus a WKT `.prj`
    /// when the layer has a spatial reference.
    pub fn write(&self, path: impl AsRef<Path>) -> VectorResult<()> {
        let shp_path = path.as_ref();
        let records = self
            .features
            .iter()
            .map(|f| dbf::encode_record(&self.fields, &f.attributes))
            .collect::<VectorResult<Vec<_>>>()?;

        let mut writer = shapefile::Writer::from_path(shp_path, dbf::table_builder(&self.fields)?)?;
        for (feature, record) in self.features.iter().zip(&records) {
            shp::write_geometry(&mut writer, self.shape_type, &feature.geometry, record)?;
        }
        drop(writer);

        let prj_path = sibling(shp_path, "prj");
        match self.srs.as_ref().map(SpatialRef::to_wkt) {
            Some(Ok(wkt)) => fs::write(&prj_path, wkt)?,
            Some(Err(e)) => {
                warn!(path = %prj_path.display(), error = %e, "Spatial reference has no WKT form, no .prj written")
            }
            None => {}
        }

        info!(
            path = %shp_path.display(),
            layer = %self.name,
            features = self.features.len(),
            "Wrote shapefile"
        );
        Ok(())
    }
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}

fn read_prj(path: &Path) -> Option<SpatialRef> {
    let wkt = fs::read_to_string(path).ok()?;
    match SpatialRef::from_wkt(&wkt) {
        Ok(srs) => {
            debug!(path = %path.display(), srs = %srs, "Read .prj");
            Some(srs)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable .prj");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn square_layer() -> Layer {
        let mut layer = Layer::new(
            "squares",
            ShapeType::Polygon,
            vec![FieldDef::character("NAME", 8)],
        );
        for (i, origin) in [(0.0, 0.0), (10.0, -5.0)].into_iter().enumerate() {
            let ring = test_utils::square_ring(origin.0, origin.1, 2.0)
                .into_iter()
                .map(Point::from)
                .collect();
            layer
                .push(Feature {
                    geometry: Geometry::Polygon(vec![ring]),
                    attributes: vec![FieldValue::Character(format!("sq{}", i))],
                })
                .unwrap();
        }
        layer
    }

    #[test]
    fn test_extent_order_matches_ogr() {
        let (x_min, x_max, y_min, y_max) = square_layer().extent().unwrap();
        assert_eq!((x_min, x_max, y_min, y_max), (0.0, 12.0, -5.0, 2.0));
    }

    #[test]
    fn test_empty_layer_has_no_extent() {
        assert!(square_layer().empty_like("none").extent().is_none());
    }

    #[test]
    fn test_field_index_ignores_case() {
        let layer = square_layer();
        assert_eq!(layer.field_index("name").unwrap(), 0);
        assert!(matches!(
            layer.field_index("CONTINENT"),
            Err(VectorError::FieldNotFound(_))
        ));
    }

    #[test]
    fn test_push_checks_schema() {
        let mut layer = square_layer();
        let bad = Feature {
            geometry: Geometry::Null,
            attributes: vec![],
        };
        assert!(layer.push(bad).is_err());

        let wrong_type = Feature {
            geometry: Geometry::Point(Point::new(0.0, 0.0)),
            attributes: vec![FieldValue::Character("pt".into())],
        };
        assert!(layer.push(wrong_type).is_err());
    }
}
