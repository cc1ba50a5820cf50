//! Conversion between `shapefile` records and layer geometries.
//!
//! Z and M ordinates are dropped on read, so PointZ, PolylineM and the like
//! come back as their 2D base types. Polygon rings are written outer when
//! clockwise and inner otherwise.

use std::io::{Seek, Write};
use std::path::Path;

use shapefile::dbase::Record;
use shapefile::{Multipoint, PolygonRing, Polyline, Shape, ShapeReader};

use crate::geometry::{Geometry, Point, ShapeType};
use crate::{VectorError, VectorResult};

const MULTIPATCH_CODE: i32 = 31;

/// Shape type and geometries read from a `.shp` file.
#[derive(Debug, Clone)]
pub struct ShpContents {
    pub shape_type: ShapeType,
    pub geometries: Vec<Geometry>,
}

/// Read every record of a `.shp` file.
///
/// The header type wins; a file whose header says Null but holds shapes
/// takes the type of its first non-null shape.
pub fn read_shapes(path: &Path) -> VectorResult<ShpContents> {
    let reader = ShapeReader::from_path(path)?;
    let header_type = shape_type_of(reader.header().shape_type)?;
    let geometries = reader
        .read()?
        .into_iter()
        .map(from_shape)
        .collect::<VectorResult<Vec<_>>>()?;

    let shape_type = match header_type {
        ShapeType::Null => geometries
            .iter()
            .map(Geometry::shape_type)
            .find(|t| *t != ShapeType::Null)
            .unwrap_or(ShapeType::Null),
        other => other,
    };

    Ok(ShpContents {
        shape_type,
        geometries,
    })
}

fn shape_type_of(shape_type: shapefile::ShapeType) -> VectorResult<ShapeType> {
    use shapefile::ShapeType as S;
    Ok(match shape_type {
        S::NullShape => ShapeType::Null,
        S::Point | S::PointM | S::PointZ => ShapeType::Point,
        S::Polyline | S::PolylineM | S::PolylineZ => ShapeType::PolyLine,
        S::Polygon | S::PolygonM | S::PolygonZ => ShapeType::Polygon,
        S::Multipoint | S::MultipointM | S::MultipointZ => ShapeType::MultiPoint,
        S::Multipatch => return Err(VectorError::UnsupportedShapeType(MULTIPATCH_CODE)),
    })
}

fn parts<P>(parts: &[Vec<P>], xy: impl Fn(&P) -> Point) -> Vec<Vec<Point>> {
    parts.iter().map(|part| part.iter().map(&xy).collect()).collect()
}

fn rings<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Point) -> Vec<Vec<Point>> {
    rings
        .iter()
        .map(|ring| ring.points().iter().map(&xy).collect())
        .collect()
}

fn from_shape(shape: Shape) -> VectorResult<Geometry> {
    let geometry = match shape {
        Shape::NullShape => Geometry::Null,
        Shape::Point(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointM(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointZ(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::Polyline(l) => Geometry::PolyLine(parts(l.parts(), |p| Point::new(p.x, p.y))),
        Shape::PolylineM(l) => Geometry::PolyLine(parts(l.parts(), |p| Point::new(p.x, p.y))),
        Shape::PolylineZ(l) => Geometry::PolyLine(parts(l.parts(), |p| Point::new(p.x, p.y))),
        Shape::Polygon(g) => Geometry::Polygon(rings(g.rings(), |p| Point::new(p.x, p.y))),
        Shape::PolygonM(g) => Geometry::Polygon(rings(g.rings(), |p| Point::new(p.x, p.y))),
        Shape::PolygonZ(g) => Geometry::Polygon(rings(g.rings(), |p| Point::new(p.x, p.y))),
        Shape::Multipoint(m) => {
            Geometry::MultiPoint(m.points().iter().map(|p| Point::new(p.x, p.y)).collect())
        }
        Shape::MultipointM(m) => {
            Geometry::MultiPoint(m.points().iter().map(|p| Point::new(p.x, p.y)).collect())
        }
        Shape::MultipointZ(m) => {
            Geometry::MultiPoint(m.points().iter().map(|p| Point::new(p.x, p.y)).collect())
        }
        Shape::Multipatch(_) => return Err(VectorError::UnsupportedShapeType(MULTIPATCH_CODE)),
    };
    Ok(geometry)
}

fn to_shp_points(points: &[Point]) -> Vec<shapefile::Point> {
    points
        .iter()
        .map(|p| shapefile::Point::new(p.x, p.y))
        .collect()
}

/// Twice the signed area; negative for clockwise rings.
fn signed_area(ring: &[Point]) -> f64 {
    ring.iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum()
}

/// Write one geometry and its attribute record.
///
/// Null geometries are read but never written.
pub fn write_geometry<W: Write + Seek>(
    writer: &mut shapefile::Writer<W>,
    shape_type: ShapeType,
    geometry: &Geometry,
    record: &Record,
) -> VectorResult<()> {
    if !geometry.is_null() && geometry.shape_type() != shape_type {
        return Err(VectorError::SchemaMismatch(format!(
            "{:?} geometry in a {:?} file",
            geometry.shape_type(),
            shape_type
        )));
    }

    match geometry {
        Geometry::Null => {
            return Err(VectorError::SchemaMismatch(
                "null geometries cannot be written".to_string(),
            ))
        }
        Geometry::Point(p) => {
            writer.write_shape_and_record(&shapefile::Point::new(p.x, p.y), record)?
        }
        Geometry::MultiPoint(points) => {
            writer.write_shape_and_record(&Multipoint::new(to_shp_points(points)), record)?
        }
        Geometry::PolyLine(lines) => {
            if lines.is_empty() || lines.iter().any(|l| l.len() < 2) {
                return Err(VectorError::SchemaMismatch(
                    "polyline parts need at least two points".to_string(),
                ));
            }
            let polyline = Polyline::with_parts(lines.iter().map(|l| to_shp_points(l)).collect());
            writer.write_shape_and_record(&polyline, record)?
        }
        Geometry::Polygon(ring_list) => {
            if ring_list.is_empty() || ring_list.iter().any(|r| r.len() < 3) {
                return Err(VectorError::SchemaMismatch(
                    "polygon rings need at least three points".to_string(),
                ));
            }
            let any_outer = ring_list.iter().any(|r| signed_area(r) < 0.0);
            let polygon_rings = ring_list
                .iter()
                .map(|ring| {
                    let points = to_shp_points(ring);
                    if !any_outer || signed_area(ring) < 0.0 {
                        PolygonRing::Outer(points)
                    } else {
                        PolygonRing::Inner(points)
                    }
                })
                .collect();
            let polygon = shapefile::Polygon::with_rings(polygon_rings);
            writer.write_shape_and_record(&polygon, record)?
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(points: &[(f64, f64)]) -> Vec<Point> {
        points.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn test_signed_area_orientation() {
        let clockwise = ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);
        let mut counter = clockwise.clone();
        counter.reverse();
        assert_eq!(signed_area(&clockwise), -2.0);
        assert_eq!(signed_area(&counter), 2.0);
    }

    #[test]
    fn test_measured_shapes_read_as_2d() {
        let point = Shape::PointZ(shapefile::PointZ::new(3.0, 4.0, 100.0, 0.0));
        assert_eq!(from_shape(point).unwrap(), Geometry::Point(Point::new(3.0, 4.0)));

        let line = shapefile::PolylineM::new(vec![
            shapefile::PointM::new(0.0, 0.0, 1.0),
            shapefile::PointM::new(5.0, 5.0, 2.0),
        ]);
        assert_eq!(
            from_shape(Shape::PolylineM(line)).unwrap(),
            Geometry::PolyLine(vec![ring(&[(0.0, 0.0), (5.0, 5.0)])])
        );
    }

    #[test]
    fn test_measured_header_types_collapse() {
        assert_eq!(shape_type_of(shapefile::ShapeType::PolygonZ).unwrap(), ShapeType::Polygon);
        assert_eq!(shape_type_of(shapefile::ShapeType::MultipointM).unwrap(), ShapeType::MultiPoint);
        assert!(matches!(
            shape_type_of(shapefile::ShapeType::Multipatch),
            Err(VectorError::UnsupportedShapeType(31))
        ));
    }

    #[test]
    fn test_rejects_missing_file() {
        assert!(read_shapes(Path::new("/nonexistent/none.shp")).is_err());
    }
}
