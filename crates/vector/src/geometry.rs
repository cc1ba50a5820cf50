//! 2-D geometries as stored in shapefiles.

use geo_common::BoundingBox;

use crate::{VectorError, VectorResult};

/// A 2-D vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Shapefile shape type.
///
/// Z and M variants are accepted on read and collapse to their 2-D type;
/// only 2-D types are ever written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
}

impl ShapeType {
    /// Map a shape type code from a `.shp` header or record.
    pub fn from_code(code: i32) -> VectorResult<Self> {
        match code {
            0 => Ok(ShapeType::Null),
            1 | 11 | 21 => Ok(ShapeType::Point),
            3 | 13 | 23 => Ok(ShapeType::PolyLine),
            5 | 15 | 25 => Ok(ShapeType::Polygon),
            8 | 18 | 28 => Ok(ShapeType::MultiPoint),
            other => Err(VectorError::UnsupportedShapeType(other)),
        }
    }

    /// The 2-D code written to `.shp` files.
    pub fn code(&self) -> i32 {
        match self {
            ShapeType::Null => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
            ShapeType::MultiPoint => 8,
        }
    }
}

/// One feature geometry.
///
/// Polygons keep their rings flat, outer rings and holes alike. Containment
/// is decided with the even-odd rule, so ring roles never need resolving.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Null,
    Point(Point),
    MultiPoint(Vec<Point>),
    PolyLine(Vec<Vec<Point>>),
    Polygon(Vec<Vec<Point>>),
}

impl Geometry {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Geometry::Null => ShapeType::Null,
            Geometry::Point(_) => ShapeType::Point,
            Geometry::MultiPoint(_) => ShapeType::MultiPoint,
            Geometry::PolyLine(_) => ShapeType::PolyLine,
            Geometry::Polygon(_) => ShapeType::Polygon,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Geometry::Null)
    }

    /// Parts of a multi-part geometry (lines or rings). Empty for points.
    pub fn parts(&self) -> &[Vec<Point>] {
        match self {
            Geometry::PolyLine(parts) | Geometry::Polygon(parts) => parts,
            _ => &[],
        }
    }

    /// Every vertex, in storage order.
    pub fn points(&self) -> Box<dyn Iterator<Item = &Point> + '_> {
        match self {
            Geometry::Null => Box::new(std::iter::empty()),
            Geometry::Point(p) => Box::new(std::iter::once(p)),
            Geometry::MultiPoint(points) => Box::new(points.iter()),
            Geometry::PolyLine(parts) | Geometry::Polygon(parts) => {
                Box::new(parts.iter().flatten())
            }
        }
    }

    /// Every vertex, mutably, in storage order.
    pub fn points_mut(&mut self) -> Box<dyn Iterator<Item = &mut Point> + '_> {
        match self {
            Geometry::Null => Box::new(std::iter::empty()),
            Geometry::Point(p) => Box::new(std::iter::once(p)),
            Geometry::MultiPoint(points) => Box::new(points.iter_mut()),
            Geometry::PolyLine(parts) | Geometry::Polygon(parts) => {
                Box::new(parts.iter_mut().flatten())
            }
        }
    }

    pub fn num_points(&self) -> usize {
        self.points().count()
    }

    /// Bounding box of all vertices, `None` for null or empty geometries.
    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.points().map(|p| (p.x, p.y)))
    }
}
