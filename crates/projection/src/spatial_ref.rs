//! Spatial reference definitions.
//!
//! A [`SpatialRef`] is an immutable, validated description of a coordinate
//! system. It can be built from an EPSG code, a PROJ4 string, or WKT.
//! Internally everything is normalised to a PROJ4 definition, which is what
//! `proj4rs` consumes.

use std::fmt;

use proj4rs::proj::Proj;

use crate::params::CrsParams;
use crate::{wkt, ProjectionError, ProjectionResult};

/// Projection names whose coordinates are longitude/latitude in degrees.
const GEOGRAPHIC_PROJ_NAMES: &[&str] = &["longlat", "latlong", "lonlat", "latlon"];

#[derive(Debug, Clone, PartialEq)]
pub struct SpatialRef {
    proj4: String,
    epsg: Option<u16>,
}

impl SpatialRef {
    /// Resolve an EPSG code through the crs-definitions database.
    pub fn from_epsg(code: u32) -> ProjectionResult<Self> {
        let def = u16::try_from(code)
            .ok()
            .and_then(crs_definitions::from_code)
            .ok_or(ProjectionError::UnknownEpsg(code))?;

        let mut srs = Self::from_proj4(def.proj4)?;
        srs.epsg = Some(code as u16);
        Ok(srs)
    }

    /// Build from a PROJ4 string.
    ///
    /// Bare tokens are given their missing `+` prefix, so
    /// `"+proj=aea ... units=m no_defs"` is accepted.
    pub fn from_proj4(definition: &str) -> ProjectionResult<Self> {
        let proj4 = normalize_proj4(definition);
        if proj4.is_empty() {
            return Err(ProjectionError::InvalidDefinition {
                definition: definition.to_string(),
                reason: "empty definition".to_string(),
            });
        }

        // Parse once up front so malformed strings fail here, not mid-transform.
        Proj::from_proj_string(&proj4).map_err(|e| ProjectionError::InvalidDefinition {
            definition: definition.to_string(),
            reason: format!("{e:?}"),
        })?;

        Ok(Self { proj4, epsg: None })
    }

    /// Build from WKT.
    ///
    /// A top-level EPSG authority (WKT1 `AUTHORITY["EPSG","n"]` or WKT2
    /// `ID["EPSG",n]`) resolves through the EPSG database. Nested
    /// authorities describe components, not the CRS. Without a usable
    /// authority, WKT1 `GEOGCS`/`PROJCS` is converted from its projection
    /// parameters.
    pub fn from_wkt(text: &str) -> ProjectionResult<Self> {
        if let Some(code) = top_level_epsg(text) {
            match Self::from_epsg(code) {
                Ok(srs) => return Ok(srs),
                Err(ProjectionError::UnknownEpsg(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let params = wkt::parse(text)
            .and_then(|root| wkt::to_params(&root))
            .map_err(|e| match e {
                ProjectionError::UnsupportedWkt(reason) => ProjectionError::UnsupportedWkt(
                    format!("{} in {}", reason, truncate(text, 80)),
                ),
                other => other,
            })?;
        Self::from_params(&params)
    }

    /// Build from a parameter description.
    pub fn from_params(params: &CrsParams) -> ProjectionResult<Self> {
        Self::from_proj4(&params.to_proj4())
    }

    /// Auto-detect the definition form.
    ///
    /// Accepts `EPSG:4326`, `4326`, `+proj=...` and WKT.
    pub fn parse(s: &str) -> ProjectionResult<Self> {
        let s = s.trim();
        let upper = s.to_ascii_uppercase();

        if let Some(code) = upper.strip_prefix("EPSG:") {
            let code = code.trim().parse().map_err(|_| ProjectionError::InvalidDefinition {
                definition: s.to_string(),
                reason: "EPSG code must be an integer".to_string(),
            })?;
            return Self::from_epsg(code);
        }

        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            let code = s.parse().map_err(|_| ProjectionError::InvalidDefinition {
                definition: s.to_string(),
                reason: "EPSG code out of range".to_string(),
            })?;
            return Self::from_epsg(code);
        }

        if s.starts_with('+') || s.contains("proj=") {
            return Self::from_proj4(s);
        }

        if s.contains('[') || s.contains('(') {
            return Self::from_wkt(s);
        }

        Err(ProjectionError::InvalidDefinition {
            definition: s.to_string(),
            reason: "not an EPSG code, PROJ4 string or WKT".to_string(),
        })
    }

    /// WGS84 geographic (EPSG:4326).
    pub fn wgs84() -> ProjectionResult<Self> {
        Self::from_epsg(4326)
    }

    /// The normalised PROJ4 definition.
    pub fn to_proj4(&self) -> &str {
        &self.proj4
    }

    /// EPSG code, when the reference came from one.
    pub fn epsg(&self) -> Option<u16> {
        self.epsg
    }

    /// True when coordinates are longitude/latitude in degrees.
    pub fn is_geographic(&self) -> bool {
        self.proj4
            .split_whitespace()
            .filter_map(|t| t.strip_prefix("+proj="))
            .any(|name| GEOGRAPHIC_PROJ_NAMES.contains(&name))
    }

    /// Projection parameters of this reference.
    ///
    /// Fails for methods outside [`crate::Method`].
    pub fn params(&self) -> ProjectionResult<CrsParams> {
        CrsParams::from_proj4(&self.proj4)
    }

    /// WKT1 text, with a top-level EPSG authority when the reference has a
    /// code.
    pub fn to_wkt(&self) -> ProjectionResult<String> {
        Ok(wkt::from_params(&self.params()?, self.epsg))
    }

    /// Build the `proj4rs` projection for this reference.
    pub(crate) fn to_proj(&self) -> ProjectionResult<Proj> {
        Proj::from_proj_string(&self.proj4).map_err(|e| ProjectionError::InvalidDefinition {
            definition: self.proj4.clone(),
            reason: format!("{e:?}"),
        })
    }
}

impl fmt::Display for SpatialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epsg {
            Some(code) => write!(f, "EPSG:{}", code),
            None => write!(f, "{}", self.proj4),
        }
    }
}

fn normalize_proj4(definition: &str) -> String {
    definition
        .split_whitespace()
        .map(|token| {
            if token.starts_with('+') {
                token.to_string()
            } else {
                format!("+{}", token)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find the EPSG code of the outermost AUTHORITY/ID node of a WKT string.
fn top_level_epsg(wkt: &str) -> Option<u32> {
    let bytes = wkt.as_bytes();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut found = None;

    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b'"' => in_quotes = !in_quotes,
            b'[' | b'(' if !in_quotes => {
                if depth == 1 {
                    if let Some(keyword) = keyword_before(wkt, i) {
                        if keyword.eq_ignore_ascii_case("AUTHORITY")
                            || keyword.eq_ignore_ascii_case("ID")
                        {
                            if let Some(code) = parse_authority_body(&wkt[i + 1..]) {
                                found = Some(code);
                            }
                        }
                    }
                }
                depth += 1;
            }
            b']' | b')' if !in_quotes => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }

    found
}

fn keyword_before(wkt: &str, bracket: usize) -> Option<&str> {
    let head = &wkt[..bracket];
    let start = head
        .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .map(|p| p + 1)
        .unwrap_or(0);
    let keyword = &head[start..];
    (!keyword.is_empty()).then_some(keyword)
}

/// Parse `"EPSG","4326"]` or `"EPSG",4326]`.
fn parse_authority_body(body: &str) -> Option<u32> {
    let end = body.find([']', ')'])?;
    let mut parts = body[..end].split(',');
    let authority = parts.next()?.trim().trim_matches('"');
    if !authority.eq_ignore_ascii_case("EPSG") {
        return None;
    }
    parts.next()?.trim().trim_matches('"').parse().ok()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTM33_WKT: &str = r#"PROJCS["WGS 84 / UTM zone 33N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],PARAMETER["central_meridian",15],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","32633"]]"#;

    #[test]
    fn test_from_epsg() {
        let srs = SpatialRef::from_epsg(4326).unwrap();
        assert_eq!(srs.epsg(), Some(4326));
        assert!(srs.is_geographic());
        assert_eq!(srs.to_string(), "EPSG:4326");
    }

    #[test]
    fn test_unknown_epsg() {
        assert!(matches!(
            SpatialRef::from_epsg(99999),
            Err(ProjectionError::UnknownEpsg(99999))
        ));
    }

    #[test]
    fn test_proj4_bare_tokens_are_normalized() {
        let srs = SpatialRef::from_proj4(
            "+proj=aea +lat_1=20 +lat_2=-23 +lat_0=0 +lon_0=25 +x_0=0 +y_0=0 \
             +ellps=WGS84 +datum=WGS84 +units=m no_defs",
        )
        .unwrap();
        assert!(srs.to_proj4().ends_with("+units=m +no_defs"));
        assert!(!srs.is_geographic());
        assert_eq!(srs.epsg(), None);
    }

    #[test]
    fn test_top_level_authority_wins() {
        assert_eq!(top_level_epsg(UTM33_WKT), Some(32633));
        let srs = SpatialRef::from_wkt(UTM33_WKT).unwrap();
        assert_eq!(srs.epsg(), Some(32633));
    }

    #[test]
    fn test_wkt2_id_node() {
        let wkt = r#"GEOGCRS["WGS 84",DATUM["World Geodetic System 1984",ELLIPSOID["WGS 84",6378137,298.257223563]],ID["EPSG",4326]]"#;
        assert_eq!(top_level_epsg(wkt), Some(4326));
    }

    #[test]
    fn test_wkt_without_authority() {
        let wkt = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137,298.257223563]],PRIMEM["Greenwich",0],UNIT["Degree",0.0174532925199433]]"#;
        let srs = SpatialRef::from_wkt(wkt).unwrap();
        assert!(srs.is_geographic());
        assert_eq!(srs.epsg(), None);
        assert_eq!(srs.to_proj4(), "+proj=longlat +datum=WGS84 +no_defs");
    }

    #[test]
    fn test_gdal_albers_without_authority() {
        let wkt = r#"PROJCS["unnamed",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]],PROJECTION["Albers_Conic_Equal_Area"],PARAMETER["standard_parallel_1",20],PARAMETER["standard_parallel_2",-23],PARAMETER["latitude_of_center",0],PARAMETER["longitude_of_center",25],PARAMETER["false_easting",0],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]]]"#;
        let srs = SpatialRef::parse(wkt).unwrap();
        assert!(!srs.is_geographic());
        assert_eq!(srs.epsg(), None);
        let africa = SpatialRef::from_proj4(
            "+proj=aea +lat_1=20 +lat_2=-23 +lat_0=0 +lon_0=25 +x_0=0 +y_0=0 +datum=WGS84 +units=m",
        )
        .unwrap();
        assert_eq!(srs.params().unwrap(), africa.params().unwrap());
    }

    #[test]
    fn test_unknown_authority_falls_back_to_parameters() {
        let wkt = UTM33_WKT.replace("\"32633\"]]", "\"99999\"]]");
        let srs = SpatialRef::from_wkt(&wkt).unwrap();
        assert_eq!(srs.epsg(), None);
        assert!(srs.to_proj4().starts_with("+proj=tmerc +lat_0=0 +lon_0=15"));
    }

    #[test]
    fn test_wkt_export_reads_back() {
        let utm = SpatialRef::from_epsg(32633).unwrap();
        assert_eq!(SpatialRef::from_wkt(&utm.to_wkt().unwrap()).unwrap(), utm);

        let africa = SpatialRef::from_proj4(
            "+proj=aea +lat_1=20 +lat_2=-23 +lat_0=0 +lon_0=25 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs",
        )
        .unwrap();
        let back = SpatialRef::from_wkt(&africa.to_wkt().unwrap()).unwrap();
        assert_eq!(back, africa);
    }

    #[test]
    fn test_parse_detects_forms() {
        assert_eq!(SpatialRef::parse("EPSG:3857").unwrap().epsg(), Some(3857));
        assert_eq!(SpatialRef::parse("epsg:4326").unwrap().epsg(), Some(4326));
        assert_eq!(SpatialRef::parse("4326").unwrap().epsg(), Some(4326));
        assert!(SpatialRef::parse("+proj=longlat +datum=WGS84").unwrap().is_geographic());
        assert_eq!(SpatialRef::parse(UTM33_WKT).unwrap().epsg(), Some(32633));
        assert!(SpatialRef::parse("definitely not a crs").is_err());
        assert!(SpatialRef::parse("EPSG:abc").is_err());
    }
}
