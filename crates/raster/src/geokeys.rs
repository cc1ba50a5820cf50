//! GeoKey directory decoding and encoding.
//!
//! A GeoTIFF spatial reference is spread over three tags: the key
//! directory (34735), a double parameter array (34736) and an ASCII
//! parameter string (34737). [`GeoKeys`] gathers all three, resolves them
//! into a [`SpatialRef`] and builds them back from one.

use std::collections::BTreeMap;

use projection::{CrsParams, Ellipsoid, Geodetic, Method, Param, Projected, SpatialRef};
use tracing::{debug, warn};

pub(crate) const GEO_KEY_DIRECTORY: u16 = 34735;
pub(crate) const GEO_DOUBLE_PARAMS: u16 = 34736;
pub(crate) const GEO_ASCII_PARAMS: u16 = 34737;

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GT_CITATION: u16 = 1026;
const GEOGRAPHIC_TYPE: u16 = 2048;
const GEOG_GEODETIC_DATUM: u16 = 2050;
const GEOG_ANGULAR_UNITS: u16 = 2054;
const GEOG_ELLIPSOID: u16 = 2056;
const GEOG_SEMI_MAJOR_AXIS: u16 = 2057;
const GEOG_SEMI_MINOR_AXIS: u16 = 2058;
const GEOG_INV_FLATTENING: u16 = 2059;
const PROJECTED_CS_TYPE: u16 = 3072;
const PROJECTION: u16 = 3074;
const PROJ_COORD_TRANS: u16 = 3075;
const PROJ_LINEAR_UNITS: u16 = 3076;
const PROJ_LINEAR_UNIT_SIZE: u16 = 3077;
const PROJ_STD_PARALLEL_1: u16 = 3078;
const PROJ_STD_PARALLEL_2: u16 = 3079;
const PROJ_NAT_ORIGIN_LONG: u16 = 3080;
const PROJ_NAT_ORIGIN_LAT: u16 = 3081;
const PROJ_FALSE_EASTING: u16 = 3082;
const PROJ_FALSE_NORTHING: u16 = 3083;
const PROJ_FALSE_ORIGIN_LONG: u16 = 3084;
const PROJ_FALSE_ORIGIN_LAT: u16 = 3085;
const PROJ_FALSE_ORIGIN_EASTING: u16 = 3086;
const PROJ_FALSE_ORIGIN_NORTHING: u16 = 3087;
const PROJ_CENTER_LONG: u16 = 3088;
const PROJ_CENTER_LAT: u16 = 3089;
const PROJ_SCALE_AT_NAT_ORIGIN: u16 = 3092;
const PROJ_SCALE_AT_CENTER: u16 = 3093;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const ANGULAR_DEGREE: u16 = 9102;
pub(crate) const USER_DEFINED: u16 = 32767;

// ProjCoordTransGeoKey codes
const CT_TRANSVERSE_MERCATOR: u16 = 1;
const CT_MERCATOR: u16 = 7;
const CT_LAMBERT_CONF_CONIC_2SP: u16 = 8;
const CT_LAMBERT_CONF_CONIC_1SP: u16 = 9;
const CT_LAMBERT_AZIM_EQUAL_AREA: u16 = 10;
const CT_ALBERS_EQUAL_AREA: u16 = 11;

/// EPSG geographic CRS, datum and ellipsoid codes of the known datums.
const DATUM_CODES: &[(&str, u16, u16, u16)] = &[
    ("WGS84", 4326, 6326, 7030),
    ("NAD83", 4269, 6269, 7019),
    ("NAD27", 4267, 6267, 7008),
    ("OSGB36", 4277, 6277, 7001),
];

/// EPSG ellipsoid codes by PROJ ellipsoid id.
const ELLIPSOID_CODES: &[(&str, u16)] = &[
    ("WGS84", 7030),
    ("GRS80", 7019),
    ("clrk66", 7008),
    ("airy", 7001),
    ("bessel", 7004),
    ("intl", 7022),
    ("krass", 7024),
    ("WGS72", 7043),
];

/// EPSG linear unit codes with their metre factor.
const LINEAR_UNITS: &[(u16, f64)] = &[
    (9001, 1.0),
    (9002, 0.3048),
    (9003, 1200.0 / 3937.0),
    (9036, 1000.0),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct GeoKeys {
    shorts: BTreeMap<u16, u16>,
    doubles: BTreeMap<u16, Vec<f64>>,
    ascii: BTreeMap<u16, String>,
}

impl GeoKeys {
    /// Decode the three GeoTIFF tags. Entries pointing outside their
    /// parameter arrays are skipped.
    pub fn parse(directory: &[u16], doubles: &[f64], ascii: &str) -> Self {
        let mut keys = GeoKeys::default();
        if directory.len() < 4 {
            return keys;
        }
        let count = directory[3] as usize;
        for entry in directory[4..].chunks_exact(4).take(count) {
            let (id, location, n, value) = (entry[0], entry[1], entry[2] as usize, entry[3] as usize);
            match location {
                0 => {
                    keys.shorts.insert(id, entry[3]);
                }
                GEO_DOUBLE_PARAMS => match doubles.get(value..value + n) {
                    Some(v) => {
                        keys.doubles.insert(id, v.to_vec());
                    }
                    None => warn!(key = id, "GeoKey double out of range"),
                },
                GEO_ASCII_PARAMS => match ascii.get(value..value + n) {
                    Some(s) => {
                        let s = s.trim_end_matches(['|', '\0']).to_string();
                        keys.ascii.insert(id, s);
                    }
                    None => warn!(key = id, "GeoKey ASCII out of range"),
                },
                other => debug!(key = id, location = other, "GeoKey in unsupported tag skipped"),
            }
        }
        keys
    }

    fn short(&self, id: u16) -> Option<u16> {
        self.shorts.get(&id).copied()
    }

    fn double(&self, id: u16) -> Option<f64> {
        self.doubles.get(&id).and_then(|v| v.first()).copied()
    }

    /// Code stored for `id`, unless it is missing or user-defined.
    fn code(&self, id: u16) -> Option<u16> {
        self.short(id).filter(|&c| c != 0 && c != USER_DEFINED)
    }

    /// Resolve the spatial reference.
    ///
    /// EPSG codes win when they agree with the model type. The base
    /// geographic code of a projected model never stands for the whole
    /// reference. After that, a PROJ string in a citation (as written by
    /// this crate) and then the projection parameter keys are used.
    pub fn to_srs(&self) -> Option<SpatialRef> {
        let model = self.short(GT_MODEL_TYPE);

        if model != Some(MODEL_TYPE_GEOGRAPHIC) {
            if let Some(srs) = self.code(PROJECTED_CS_TYPE).and_then(from_epsg) {
                return Some(srs);
            }
        }
        if model == Some(MODEL_TYPE_GEOGRAPHIC)
            || (model.is_none() && self.short(PROJECTED_CS_TYPE).is_none())
        {
            if let Some(srs) = self.code(GEOGRAPHIC_TYPE).and_then(from_epsg) {
                return Some(srs);
            }
        }

        if let Some(srs) = self.citation_proj4() {
            return Some(srs);
        }

        let params = match model {
            Some(MODEL_TYPE_PROJECTED) => {
                let projected = self.projected()?;
                CrsParams {
                    geodetic: self.geodetic(),
                    projected: Some(projected),
                }
            }
            Some(MODEL_TYPE_GEOGRAPHIC) => CrsParams {
                geodetic: self.geodetic(),
                projected: None,
            },
            _ => {
                debug!("No spatial reference found in GeoTIFF keys");
                return None;
            }
        };
        match SpatialRef::from_params(&params) {
            Ok(srs) => Some(srs),
            Err(e) => {
                warn!(error = %e, "GeoKey projection parameters not usable");
                None
            }
        }
    }

    fn citation_proj4(&self) -> Option<SpatialRef> {
        let proj = self.ascii.values().find(|s| s.contains("+proj="))?;
        match SpatialRef::from_proj4(proj) {
            Ok(srs) => Some(srs),
            Err(e) => {
                warn!(error = %e, "PROJ string in GeoTIFF citation not usable");
                None
            }
        }
    }

    fn geodetic(&self) -> Geodetic {
        if let Some(code) = self.code(GEOGRAPHIC_TYPE) {
            match SpatialRef::from_epsg(u32::from(code)).and_then(|s| s.params()) {
                Ok(params) => return params.geodetic,
                Err(e) => warn!(code, error = %e, "Geographic code in GeoKeys not usable"),
            }
        }
        if let Some(code) = self.code(GEOG_GEODETIC_DATUM) {
            if let Some(geodetic) = DATUM_CODES
                .iter()
                .find(|d| d.2 == code)
                .and_then(|d| Geodetic::from_datum(d.0))
            {
                return geodetic;
            }
        }
        let ellipsoid = self
            .code(GEOG_ELLIPSOID)
            .and_then(|code| ELLIPSOID_CODES.iter().find(|e| e.1 == code))
            .and_then(|e| Ellipsoid::from_proj_id(e.0))
            .or_else(|| {
                let a = self.double(GEOG_SEMI_MAJOR_AXIS)?;
                let inv_flattening = match self.double(GEOG_INV_FLATTENING) {
                    Some(rf) => rf,
                    None => {
                        let b = self.double(GEOG_SEMI_MINOR_AXIS)?;
                        if a == b {
                            0.0
                        } else {
                            a / (a - b)
                        }
                    }
                };
                Some(Ellipsoid {
                    semi_major: a,
                    inv_flattening,
                })
            });
        match ellipsoid {
            Some(ellipsoid) => Geodetic {
                datum: None,
                ellipsoid,
                towgs84: None,
                prime_meridian: 0.0,
            },
            None => {
                debug!("No geodetic keys, assuming WGS84");
                Geodetic::wgs84()
            }
        }
    }

    fn projected(&self) -> Option<Projected> {
        let Some(ct) = self.short(PROJ_COORD_TRANS) else {
            warn!("User-defined projected GeoTIFF without ProjCoordTransGeoKey");
            return None;
        };
        let method = match ct {
            CT_TRANSVERSE_MERCATOR => Method::TransverseMercator,
            CT_MERCATOR if self.double(PROJ_STD_PARALLEL_1).is_some() => Method::Mercator2SP,
            CT_MERCATOR => Method::Mercator1SP,
            CT_LAMBERT_CONF_CONIC_2SP => Method::LambertConformal2SP,
            CT_LAMBERT_CONF_CONIC_1SP => Method::LambertConformal1SP,
            CT_LAMBERT_AZIM_EQUAL_AREA => Method::LambertAzimuthalEqualArea,
            CT_ALBERS_EQUAL_AREA => Method::AlbersEqualArea,
            other => {
                warn!(coord_trans = other, "Unsupported GeoTIFF coordinate transformation");
                return None;
            }
        };

        let to_meter = match self.short(PROJ_LINEAR_UNITS) {
            None => 1.0,
            Some(USER_DEFINED) => self.double(PROJ_LINEAR_UNIT_SIZE).unwrap_or(1.0),
            Some(code) => match LINEAR_UNITS.iter().find(|u| u.0 == code) {
                Some(unit) => unit.1,
                None => {
                    warn!(code, "Unsupported linear unit code");
                    return None;
                }
            },
        };

        let mut projected = Projected::new(method);
        projected.to_meter = to_meter;
        for &param in method.params() {
            let value = read_keys(param)
                .iter()
                .find_map(|&key| self.double(key));
            if let Some(value) = value {
                let value = if param.is_linear() { value * to_meter } else { value };
                projected.params.insert(param, value);
            }
        }
        Some(projected)
    }

    /// Build the keys for `srs`. The PROJ string always goes into the
    /// citation; EPSG references are stored by code, others by their
    /// projection parameters.
    pub fn from_srs(srs: &SpatialRef) -> Self {
        let mut keys = GeoKeys::default();
        let geographic = srs.is_geographic();
        keys.shorts.insert(
            GT_MODEL_TYPE,
            if geographic { MODEL_TYPE_GEOGRAPHIC } else { MODEL_TYPE_PROJECTED },
        );
        keys.shorts.insert(GT_RASTER_TYPE, RASTER_PIXEL_IS_AREA);
        keys.ascii.insert(GT_CITATION, srs.to_proj4().to_string());

        if let Some(code) = srs.epsg() {
            let crs_key = if geographic { GEOGRAPHIC_TYPE } else { PROJECTED_CS_TYPE };
            keys.shorts.insert(crs_key, code);
            return keys;
        }

        let params = match srs.params() {
            Ok(params) => params,
            Err(e) => {
                warn!(srs = %srs, error = %e, "Reference written as a PROJ citation only");
                let crs_key = if geographic { GEOGRAPHIC_TYPE } else { PROJECTED_CS_TYPE };
                keys.shorts.insert(crs_key, USER_DEFINED);
                return keys;
            }
        };

        keys.insert_geodetic(&params.geodetic);
        if let Some(projected) = &params.projected {
            keys.insert_projected(projected);
        }
        keys
    }

    fn insert_geodetic(&mut self, geodetic: &Geodetic) {
        self.shorts.insert(GEOG_ANGULAR_UNITS, ANGULAR_DEGREE);
        let plain = geodetic.towgs84.is_none() && geodetic.prime_meridian == 0.0;
        let known = geodetic
            .datum
            .as_deref()
            .and_then(|id| DATUM_CODES.iter().find(|d| d.0.eq_ignore_ascii_case(id)));
        if let (true, Some(&(_, gcs, _, _))) = (plain, known) {
            self.shorts.insert(GEOGRAPHIC_TYPE, gcs);
            return;
        }

        self.shorts.insert(GEOGRAPHIC_TYPE, USER_DEFINED);
        self.shorts
            .insert(GEOG_GEODETIC_DATUM, known.map_or(USER_DEFINED, |d| d.2));
        let ellipsoid_code = geodetic
            .ellipsoid
            .known()
            .and_then(|(id, _)| ELLIPSOID_CODES.iter().find(|e| e.0 == id))
            .map(|e| e.1);
        match ellipsoid_code {
            Some(code) => {
                self.shorts.insert(GEOG_ELLIPSOID, code);
            }
            None => {
                self.shorts.insert(GEOG_ELLIPSOID, USER_DEFINED);
                self.doubles
                    .insert(GEOG_SEMI_MAJOR_AXIS, vec![geodetic.ellipsoid.semi_major]);
                self.doubles
                    .insert(GEOG_INV_FLATTENING, vec![geodetic.ellipsoid.inv_flattening]);
            }
        }
    }

    fn insert_projected(&mut self, projected: &Projected) {
        let ct = match projected.method {
            Method::TransverseMercator => CT_TRANSVERSE_MERCATOR,
            Method::Mercator1SP | Method::Mercator2SP => CT_MERCATOR,
            Method::LambertConformal2SP => CT_LAMBERT_CONF_CONIC_2SP,
            Method::LambertConformal1SP => CT_LAMBERT_CONF_CONIC_1SP,
            Method::LambertAzimuthalEqualArea => CT_LAMBERT_AZIM_EQUAL_AREA,
            Method::AlbersEqualArea => CT_ALBERS_EQUAL_AREA,
        };
        self.shorts.insert(PROJECTED_CS_TYPE, USER_DEFINED);
        self.shorts.insert(PROJECTION, USER_DEFINED);
        self.shorts.insert(PROJ_COORD_TRANS, ct);

        match LINEAR_UNITS.iter().find(|u| (u.1 - projected.to_meter).abs() < 1e-12) {
            Some(unit) => {
                self.shorts.insert(PROJ_LINEAR_UNITS, unit.0);
            }
            None => {
                self.shorts.insert(PROJ_LINEAR_UNITS, USER_DEFINED);
                self.doubles
                    .insert(PROJ_LINEAR_UNIT_SIZE, vec![projected.to_meter]);
            }
        }

        for &param in projected.method.params() {
            let mut value = projected.get(param);
            if param.is_linear() {
                value /= projected.to_meter;
            }
            self.doubles
                .insert(write_key(projected.method, param), vec![value]);
        }
    }

    /// Encode as `(directory, doubles, ascii)`. The directory header is
    /// `[version, revision, minor, count]` followed by
    /// `[key, location, count, value]` entries sorted by key.
    pub fn encode(&self) -> (Vec<u16>, Vec<f64>, String) {
        let mut entries: BTreeMap<u16, [u16; 4]> = BTreeMap::new();
        for (&id, &value) in &self.shorts {
            entries.insert(id, [id, 0, 1, value]);
        }
        let mut doubles = Vec::new();
        for (&id, values) in &self.doubles {
            entries.insert(
                id,
                [id, GEO_DOUBLE_PARAMS, values.len() as u16, doubles.len() as u16],
            );
            doubles.extend_from_slice(values);
        }
        let mut ascii = String::new();
        for (&id, text) in &self.ascii {
            let offset = ascii.len() as u16;
            ascii.push_str(text);
            ascii.push('|');
            entries.insert(
                id,
                [id, GEO_ASCII_PARAMS, (text.len() + 1) as u16, offset],
            );
        }

        let mut directory = vec![1, 1, 0, entries.len() as u16];
        for entry in entries.values() {
            directory.extend_from_slice(entry);
        }
        (directory, doubles, ascii)
    }
}

fn from_epsg(code: u16) -> Option<SpatialRef> {
    match SpatialRef::from_epsg(u32::from(code)) {
        Ok(srs) => Some(srs),
        Err(e) => {
            warn!(code, error = %e, "EPSG code in GeoKeyDirectory not usable");
            None
        }
    }
}

/// Keys a parameter may be stored under, in order of preference.
fn read_keys(param: Param) -> &'static [u16] {
    match param {
        Param::StandardParallel1 => &[PROJ_STD_PARALLEL_1],
        Param::StandardParallel2 => &[PROJ_STD_PARALLEL_2],
        Param::LatitudeOfOrigin => &[PROJ_NAT_ORIGIN_LAT, PROJ_FALSE_ORIGIN_LAT, PROJ_CENTER_LAT],
        Param::CentralMeridian => &[PROJ_NAT_ORIGIN_LONG, PROJ_FALSE_ORIGIN_LONG, PROJ_CENTER_LONG],
        Param::ScaleFactor => &[PROJ_SCALE_AT_NAT_ORIGIN, PROJ_SCALE_AT_CENTER],
        Param::FalseEasting => &[PROJ_FALSE_EASTING, PROJ_FALSE_ORIGIN_EASTING],
        Param::FalseNorthing => &[PROJ_FALSE_NORTHING, PROJ_FALSE_ORIGIN_NORTHING],
    }
}

/// Key a parameter is written under for a method.
fn write_key(method: Method, param: Param) -> u16 {
    match (method, param) {
        (_, Param::StandardParallel1) => PROJ_STD_PARALLEL_1,
        (_, Param::StandardParallel2) => PROJ_STD_PARALLEL_2,
        (Method::LambertConformal2SP, Param::LatitudeOfOrigin) => PROJ_FALSE_ORIGIN_LAT,
        (Method::LambertConformal2SP, Param::CentralMeridian) => PROJ_FALSE_ORIGIN_LONG,
        (Method::LambertConformal2SP, Param::FalseEasting) => PROJ_FALSE_ORIGIN_EASTING,
        (Method::LambertConformal2SP, Param::FalseNorthing) => PROJ_FALSE_ORIGIN_NORTHING,
        (Method::LambertAzimuthalEqualArea, Param::LatitudeOfOrigin) => PROJ_CENTER_LAT,
        (Method::LambertAzimuthalEqualArea, Param::CentralMeridian) => PROJ_CENTER_LONG,
        (_, Param::LatitudeOfOrigin) => PROJ_NAT_ORIGIN_LAT,
        (_, Param::CentralMeridian) => PROJ_NAT_ORIGIN_LONG,
        (_, Param::ScaleFactor) => PROJ_SCALE_AT_NAT_ORIGIN,
        (_, Param::FalseEasting) => PROJ_FALSE_EASTING,
        (_, Param::FalseNorthing) => PROJ_FALSE_NORTHING,
    }
}
