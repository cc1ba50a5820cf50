//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::{GeoError, GeoResult};

/// A geographic or projected bounding box.
///
/// For geographic references (EPSG:4326), coordinates are in degrees.
/// For projected references, coordinates are in the projection's linear unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build the box from a map-corner style description:
    /// lower-left (lon, lat) and upper-right (lon, lat).
    pub fn from_corners(ll: (f64, f64), ur: (f64, f64)) -> GeoResult<Self> {
        let bbox = Self::new(ll.0, ll.1, ur.0, ur.1);
        bbox.validate()?;
        Ok(bbox)
    }

    /// Parse a "minx,miny,maxx,maxy" string.
    pub fn parse(s: &str) -> GeoResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GeoError::InvalidBbox(format!(
                "{}. Expected 'minx,miny,maxx,maxy'",
                s
            )));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| GeoError::InvalidBbox(format!("invalid number '{}'", part)))?;
        }

        let bbox = Self::new(values[0], values[1], values[2], values[3]);
        bbox.validate()?;
        Ok(bbox)
    }

    /// Reject empty, inverted or non-finite boxes.
    pub fn validate(&self) -> GeoResult<()> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(GeoError::InvalidBbox(format!("non-finite corner in {:?}", self)));
        }
        if self.min_x >= self.max_x || self.min_y >= self.max_y {
            return Err(GeoError::InvalidBbox(format!(
                "min must be below max, got {:?}",
                self
            )));
        }
        Ok(())
    }

    /// Smallest box containing every point, or None for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let mut bbox = Self::new(x0, y0, x0, y0);
        for (x, y) in iter {
            bbox.expand_to(x, y);
        }
        Some(bbox)
    }

    /// Grow the box so it contains (x, y).
    pub fn expand_to(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Compute the intersection of two bounding boxes.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = BoundingBox::parse("-20.0,-28.0,52.0,13.0").unwrap();
        assert_eq!(bbox.min_x, -20.0);
        assert_eq!(bbox.min_y, -28.0);
        assert_eq!(bbox.max_x, 52.0);
        assert_eq!(bbox.max_y, 13.0);
    }

    #[test]
    fn test_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let intersection = a.intersection(&b).unwrap();
        assert_eq!(intersection.min_x, 5.0);
        assert_eq!(intersection.min_y, 5.0);
        assert_eq!(intersection.max_x, 10.0);
        assert_eq!(intersection.max_y, 10.0);
    }

    #[test]
    fn test_from_points() {
        let bbox = BoundingBox::from_points(vec![(1.0, 5.0), (-2.0, 3.0), (4.0, -1.0)]).unwrap();
        assert_eq!(bbox, BoundingBox::new(-2.0, -1.0, 4.0, 5.0));
        assert!(BoundingBox::from_points(Vec::new()).is_none());
    }
}
