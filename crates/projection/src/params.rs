//! Parameter model of a coordinate reference system.
//!
//! [`CrsParams`] is the common ground between the three ways a reference
//! is stored on disk: PROJ4 strings, WKT1 and GeoTIFF GeoKeys. Angles are
//! in degrees and false easting/northing in metres, as in PROJ4.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::{ProjectionError, ProjectionResult};

/// Ellipsoid shape. An inverse flattening of zero is a sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub semi_major: f64,
    pub inv_flattening: f64,
}

/// Known ellipsoids: PROJ id, WKT name, semi-major axis, inverse flattening.
const ELLIPSOIDS: &[(&str, &str, f64, f64)] = &[
    ("WGS84", "WGS 84", 6_378_137.0, 298.257_223_563),
    ("GRS80", "GRS 1980", 6_378_137.0, 298.257_222_101),
    ("WGS72", "WGS 72", 6_378_135.0, 298.26),
    ("intl", "International 1924", 6_378_388.0, 297.0),
    ("bessel", "Bessel 1841", 6_377_397.155, 299.152_812_8),
    ("clrk66", "Clarke 1866", 6_378_206.4, 294.978_698_213_898),
    ("clrk80", "Clarke 1880 mod.", 6_378_249.145, 293.4663),
    ("krass", "Krassowsky 1940", 6_378_245.0, 298.3),
    ("airy", "Airy 1830", 6_377_563.396, 299.324_964_6),
];

/// Known datums: PROJ id, WKT name, PROJ ellipsoid id.
const DATUMS: &[(&str, &str, &str)] = &[
    ("WGS84", "WGS_1984", "WGS84"),
    ("NAD83", "North_American_Datum_1983", "GRS80"),
    ("NAD27", "North_American_Datum_1927", "clrk66"),
    ("OSGB36", "OSGB_1936", "airy"),
    ("potsdam", "Deutsches_Hauptdreiecksnetz", "bessel"),
    ("GGRS87", "Greek_Geodetic_Reference_System_1987", "GRS80"),
];

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major: 6_378_137.0,
        inv_flattening: 298.257_223_563,
    };

    /// Look up a PROJ ellipsoid id such as `WGS84` or `intl`.
    pub fn from_proj_id(id: &str) -> Option<Self> {
        ELLIPSOIDS
            .iter()
            .find(|e| e.0.eq_ignore_ascii_case(id))
            .map(|e| Ellipsoid {
                semi_major: e.2,
                inv_flattening: e.3,
            })
    }

    /// PROJ id and WKT name of a known ellipsoid with this shape.
    pub fn known(&self) -> Option<(&'static str, &'static str)> {
        ELLIPSOIDS
            .iter()
            .find(|e| {
                (e.2 - self.semi_major).abs() < 1e-3 && (e.3 - self.inv_flattening).abs() < 1e-7
            })
            .map(|e| (e.0, e.1))
    }

    pub fn is_sphere(&self) -> bool {
        self.inv_flattening == 0.0
    }
}

/// Geodetic basis shared by geographic and projected references.
#[derive(Debug, Clone, PartialEq)]
pub struct Geodetic {
    /// PROJ datum id (`WGS84`, `NAD83`, ...), when the datum is a known one.
    pub datum: Option<String>,
    pub ellipsoid: Ellipsoid,
    pub towgs84: Option<Vec<f64>>,
    /// Prime meridian longitude in degrees east of Greenwich.
    pub prime_meridian: f64,
}

impl Default for Geodetic {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Geodetic {
    pub fn wgs84() -> Self {
        Self {
            datum: Some("WGS84".to_string()),
            ellipsoid: Ellipsoid::WGS84,
            towgs84: None,
            prime_meridian: 0.0,
        }
    }

    /// Known datum by PROJ id, with its ellipsoid.
    pub fn from_datum(id: &str) -> Option<Self> {
        let (datum, _, ellps) = DATUMS.iter().find(|d| d.0.eq_ignore_ascii_case(id))?;
        Some(Self {
            datum: Some(datum.to_string()),
            ellipsoid: Ellipsoid::from_proj_id(ellps)?,
            towgs84: None,
            prime_meridian: 0.0,
        })
    }

    /// Known datum by WKT name. Matches `WGS_1984`, `D_WGS_1984` and
    /// `WGS 1984` alike.
    pub fn from_wkt_datum_name(name: &str) -> Option<Self> {
        let wanted = normalize_name(name.strip_prefix("D_").unwrap_or(name));
        let (id, _, _) = DATUMS
            .iter()
            .find(|d| normalize_name(d.1) == wanted || normalize_name(d.0) == wanted)?;
        Self::from_datum(id)
    }

    /// WKT name of the datum, when known.
    pub fn wkt_datum_name(&self) -> Option<&'static str> {
        let id = self.datum.as_deref()?;
        DATUMS
            .iter()
            .find(|d| d.0.eq_ignore_ascii_case(id))
            .map(|d| d.1)
    }
}

/// Projection methods that can be carried through WKT1 and GeoKeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    AlbersEqualArea,
    TransverseMercator,
    LambertConformal1SP,
    LambertConformal2SP,
    Mercator1SP,
    Mercator2SP,
    LambertAzimuthalEqualArea,
}

impl Method {
    pub fn proj_name(self) -> &'static str {
        match self {
            Method::AlbersEqualArea => "aea",
            Method::TransverseMercator => "tmerc",
            Method::LambertConformal1SP | Method::LambertConformal2SP => "lcc",
            Method::Mercator1SP | Method::Mercator2SP => "merc",
            Method::LambertAzimuthalEqualArea => "laea",
        }
    }

    pub fn wkt_name(self) -> &'static str {
        match self {
            Method::AlbersEqualArea => "Albers_Conic_Equal_Area",
            Method::TransverseMercator => "Transverse_Mercator",
            Method::LambertConformal1SP => "Lambert_Conformal_Conic_1SP",
            Method::LambertConformal2SP => "Lambert_Conformal_Conic_2SP",
            Method::Mercator1SP => "Mercator_1SP",
            Method::Mercator2SP => "Mercator_2SP",
            Method::LambertAzimuthalEqualArea => "Lambert_Azimuthal_Equal_Area",
        }
    }

    /// Match a WKT1 (OGC or ESRI flavour) projection name.
    pub fn from_wkt_name(name: &str) -> Option<Self> {
        let method = match normalize_name(name).as_str() {
            "albersconicequalarea" | "albers" => Method::AlbersEqualArea,
            "transversemercator" | "gausskruger" => Method::TransverseMercator,
            "lambertconformalconic1sp" => Method::LambertConformal1SP,
            "lambertconformalconic2sp" | "lambertconformalconic" => Method::LambertConformal2SP,
            "mercator1sp" | "mercator" => Method::Mercator1SP,
            "mercator2sp" => Method::Mercator2SP,
            "lambertazimuthalequalarea" => Method::LambertAzimuthalEqualArea,
            _ => return None,
        };
        Some(method)
    }

    /// Parameters the method is defined by, in WKT order.
    pub fn params(self) -> &'static [Param] {
        use Param::*;
        match self {
            Method::AlbersEqualArea | Method::LambertConformal2SP => &[
                StandardParallel1,
                StandardParallel2,
                LatitudeOfOrigin,
                CentralMeridian,
                FalseEasting,
                FalseNorthing,
            ],
            Method::TransverseMercator | Method::LambertConformal1SP => &[
                LatitudeOfOrigin,
                CentralMeridian,
                ScaleFactor,
                FalseEasting,
                FalseNorthing,
            ],
            Method::Mercator1SP => &[CentralMeridian, ScaleFactor, FalseEasting, FalseNorthing],
            Method::Mercator2SP => &[StandardParallel1, CentralMeridian, FalseEasting, FalseNorthing],
            Method::LambertAzimuthalEqualArea => {
                &[LatitudeOfOrigin, CentralMeridian, FalseEasting, FalseNorthing]
            }
        }
    }

    /// WKT1 parameter name used for `param` by this method.
    pub fn wkt_param_name(self, param: Param) -> &'static str {
        let centred = matches!(
            self,
            Method::AlbersEqualArea | Method::LambertAzimuthalEqualArea
        );
        match param {
            Param::StandardParallel1 => "standard_parallel_1",
            Param::StandardParallel2 => "standard_parallel_2",
            Param::LatitudeOfOrigin if centred => "latitude_of_center",
            Param::LatitudeOfOrigin => "latitude_of_origin",
            Param::CentralMeridian if centred => "longitude_of_center",
            Param::CentralMeridian => "central_meridian",
            Param::ScaleFactor => "scale_factor",
            Param::FalseEasting => "false_easting",
            Param::FalseNorthing => "false_northing",
        }
    }
}

/// Projection parameters. Angles in degrees, offsets in metres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Param {
    StandardParallel1,
    StandardParallel2,
    LatitudeOfOrigin,
    CentralMeridian,
    ScaleFactor,
    FalseEasting,
    FalseNorthing,
}

impl Param {
    /// Match a WKT1 parameter name.
    pub fn from_wkt_name(name: &str) -> Option<Self> {
        let param = match normalize_name(name).as_str() {
            "standardparallel1" => Param::StandardParallel1,
            "standardparallel2" => Param::StandardParallel2,
            "latitudeoforigin" | "latitudeofcenter" | "latitudeofcentre" => {
                Param::LatitudeOfOrigin
            }
            "centralmeridian" | "longitudeofcenter" | "longitudeofcentre" => {
                Param::CentralMeridian
            }
            "scalefactor" => Param::ScaleFactor,
            "falseeasting" => Param::FalseEasting,
            "falsenorthing" => Param::FalseNorthing,
            _ => return None,
        };
        Some(param)
    }

    /// True for parameters in linear units (scaled by the unit factor).
    pub fn is_linear(self) -> bool {
        matches!(self, Param::FalseEasting | Param::FalseNorthing)
    }

    fn default_value(self) -> f64 {
        match self {
            Param::ScaleFactor => 1.0,
            _ => 0.0,
        }
    }
}

/// Projection method, its parameters and the linear unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Projected {
    pub method: Method,
    pub params: BTreeMap<Param, f64>,
    /// Metres per linear unit.
    pub to_meter: f64,
}

impl Projected {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            params: BTreeMap::new(),
            to_meter: 1.0,
        }
    }

    #[must_use]
    pub fn with(mut self, param: Param, value: f64) -> Self {
        self.params.insert(param, value);
        self
    }

    /// Value of a parameter, or its default when unset.
    pub fn get(&self, param: Param) -> f64 {
        self.params
            .get(&param)
            .copied()
            .unwrap_or_else(|| param.default_value())
    }
}

/// Full parameter description of a reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrsParams {
    pub geodetic: Geodetic,
    /// `None` for a geographic (longitude/latitude) reference.
    pub projected: Option<Projected>,
}

impl CrsParams {
    /// Render as a normalised PROJ4 string.
    pub fn to_proj4(&self) -> String {
        let mut out = String::new();
        match &self.projected {
            None => out.push_str("+proj=longlat"),
            Some(p) => {
                let _ = write!(out, "+proj={}", p.method.proj_name());
                let mut push = |key: &str, value: f64| {
                    let _ = write!(out, " +{}={}", key, value);
                };
                use Param::*;
                match p.method {
                    Method::AlbersEqualArea | Method::LambertConformal2SP => {
                        push("lat_1", p.get(StandardParallel1));
                        push("lat_2", p.get(StandardParallel2));
                        push("lat_0", p.get(LatitudeOfOrigin));
                        push("lon_0", p.get(CentralMeridian));
                    }
                    Method::TransverseMercator => {
                        push("lat_0", p.get(LatitudeOfOrigin));
                        push("lon_0", p.get(CentralMeridian));
                        push("k", p.get(ScaleFactor));
                    }
                    Method::LambertConformal1SP => {
                        push("lat_1", p.get(LatitudeOfOrigin));
                        push("lat_0", p.get(LatitudeOfOrigin));
                        push("lon_0", p.get(CentralMeridian));
                        push("k", p.get(ScaleFactor));
                    }
                    Method::Mercator1SP => {
                        push("lon_0", p.get(CentralMeridian));
                        push("k", p.get(ScaleFactor));
                    }
                    Method::Mercator2SP => {
                        push("lat_ts", p.get(StandardParallel1));
                        push("lon_0", p.get(CentralMeridian));
                    }
                    Method::LambertAzimuthalEqualArea => {
                        push("lat_0", p.get(LatitudeOfOrigin));
                        push("lon_0", p.get(CentralMeridian));
                    }
                }
                push("x_0", p.get(FalseEasting));
                push("y_0", p.get(FalseNorthing));
            }
        }

        let g = &self.geodetic;
        if let Some(datum) = &g.datum {
            let _ = write!(out, " +datum={}", datum);
        } else if g.ellipsoid.is_sphere() {
            let _ = write!(out, " +R={}", g.ellipsoid.semi_major);
        } else if let Some((id, _)) = g.ellipsoid.known() {
            let _ = write!(out, " +ellps={}", id);
        } else {
            let _ = write!(
                out,
                " +a={} +rf={}",
                g.ellipsoid.semi_major, g.ellipsoid.inv_flattening
            );
        }
        if let Some(towgs84) = &g.towgs84 {
            let values: Vec<String> = towgs84.iter().map(|v| v.to_string()).collect();
            let _ = write!(out, " +towgs84={}", values.join(","));
        }
        if g.prime_meridian != 0.0 {
            let _ = write!(out, " +pm={}", g.prime_meridian);
        }

        if let Some(p) = &self.projected {
            match unit_name(p.to_meter) {
                Some(name) => {
                    let _ = write!(out, " +units={}", name);
                }
                None => {
                    let _ = write!(out, " +to_meter={}", p.to_meter);
                }
            }
        }
        out.push_str(" +no_defs");
        out
    }

    /// Read the parameters out of a PROJ4 string.
    pub fn from_proj4(proj4: &str) -> ProjectionResult<Self> {
        let tokens: Vec<(&str, Option<&str>)> = proj4
            .split_whitespace()
            .map(|t| {
                let t = t.trim_start_matches('+');
                match t.split_once('=') {
                    Some((k, v)) => (k, Some(v)),
                    None => (t, None),
                }
            })
            .collect();
        let value = |key: &str| tokens.iter().find(|t| t.0 == key).and_then(|t| t.1);
        let flag = |key: &str| tokens.iter().any(|t| t.0 == key);
        let invalid = |reason: String| ProjectionError::InvalidDefinition {
            definition: proj4.to_string(),
            reason,
        };
        let number = |key: &str| -> ProjectionResult<Option<f64>> {
            value(key)
                .map(|v| {
                    v.parse::<f64>()
                        .map_err(|_| invalid(format!("+{} is not a number", key)))
                })
                .transpose()
        };

        let geodetic = geodetic_from_proj4(&value, &number, &invalid)?;

        let name = value("proj").ok_or_else(|| invalid("missing +proj".to_string()))?;
        use Param::*;
        let mut projected = match name {
            "longlat" | "latlong" | "lonlat" | "latlon" => {
                return Ok(Self {
                    geodetic,
                    projected: None,
                })
            }
            "aea" => Projected::new(Method::AlbersEqualArea)
                .with(StandardParallel1, number("lat_1")?.unwrap_or(0.0))
                .with(StandardParallel2, number("lat_2")?.unwrap_or(0.0))
                .with(LatitudeOfOrigin, number("lat_0")?.unwrap_or(0.0))
                .with(CentralMeridian, number("lon_0")?.unwrap_or(0.0)),
            "tmerc" | "etmerc" => Projected::new(Method::TransverseMercator)
                .with(LatitudeOfOrigin, number("lat_0")?.unwrap_or(0.0))
                .with(CentralMeridian, number("lon_0")?.unwrap_or(0.0))
                .with(ScaleFactor, scale_factor(&number)?),
            "utm" => {
                let zone = number("zone")?.ok_or_else(|| invalid("+proj=utm needs +zone".to_string()))?;
                if !(1.0..=60.0).contains(&zone) || zone.fract() != 0.0 {
                    return Err(invalid(format!("invalid UTM zone {}", zone)));
                }
                let false_northing = if flag("south") { 10_000_000.0 } else { 0.0 };
                let projected = Projected::new(Method::TransverseMercator)
                    .with(LatitudeOfOrigin, 0.0)
                    .with(CentralMeridian, zone * 6.0 - 183.0)
                    .with(ScaleFactor, 0.9996)
                    .with(FalseEasting, 500_000.0)
                    .with(FalseNorthing, false_northing);
                return Ok(Self {
                    geodetic,
                    projected: Some(Projected {
                        to_meter: to_meter(&value, &number, &invalid)?,
                        ..projected
                    }),
                });
            }
            "lcc" => {
                let lat_1 = number("lat_1")?.unwrap_or(0.0);
                let lat_2 = number("lat_2")?;
                let lat_0 = number("lat_0")?;
                let one_sp = lat_2.map_or(true, |l| l == lat_1) && lat_0.map_or(true, |l| l == lat_1);
                if one_sp {
                    Projected::new(Method::LambertConformal1SP)
                        .with(LatitudeOfOrigin, lat_1)
                        .with(CentralMeridian, number("lon_0")?.unwrap_or(0.0))
                        .with(ScaleFactor, scale_factor(&number)?)
                } else {
                    Projected::new(Method::LambertConformal2SP)
                        .with(StandardParallel1, lat_1)
                        .with(StandardParallel2, lat_2.unwrap_or(lat_1))
                        .with(LatitudeOfOrigin, lat_0.unwrap_or(0.0))
                        .with(CentralMeridian, number("lon_0")?.unwrap_or(0.0))
                }
            }
            "merc" => match number("lat_ts")? {
                Some(lat_ts) if lat_ts != 0.0 => Projected::new(Method::Mercator2SP)
                    .with(StandardParallel1, lat_ts)
                    .with(CentralMeridian, number("lon_0")?.unwrap_or(0.0)),
                _ => Projected::new(Method::Mercator1SP)
                    .with(CentralMeridian, number("lon_0")?.unwrap_or(0.0))
                    .with(ScaleFactor, scale_factor(&number)?),
            },
            "laea" => Projected::new(Method::LambertAzimuthalEqualArea)
                .with(LatitudeOfOrigin, number("lat_0")?.unwrap_or(0.0))
                .with(CentralMeridian, number("lon_0")?.unwrap_or(0.0)),
            other => return Err(ProjectionError::UnsupportedProjection(other.to_string())),
        };

        projected = projected
            .with(FalseEasting, number("x_0")?.unwrap_or(0.0))
            .with(FalseNorthing, number("y_0")?.unwrap_or(0.0));
        projected.to_meter = to_meter(&value, &number, &invalid)?;

        Ok(Self {
            geodetic,
            projected: Some(projected),
        })
    }
}

fn scale_factor(
    number: &dyn Fn(&str) -> ProjectionResult<Option<f64>>,
) -> ProjectionResult<f64> {
    Ok(number("k")?
        .or(number("k0")?)
        .or(number("k_0")?)
        .unwrap_or(1.0))
}

fn geodetic_from_proj4<'a>(
    value: &dyn Fn(&str) -> Option<&'a str>,
    number: &dyn Fn(&str) -> ProjectionResult<Option<f64>>,
    invalid: &dyn Fn(String) -> ProjectionError,
) -> ProjectionResult<Geodetic> {
    let ellipsoid = if let Some(r) = number("R")? {
        Some(Ellipsoid {
            semi_major: r,
            inv_flattening: 0.0,
        })
    } else if let Some(id) = value("ellps") {
        Some(
            Ellipsoid::from_proj_id(id)
                .ok_or_else(|| invalid(format!("unknown ellipsoid '{}'", id)))?,
        )
    } else if let Some(a) = number("a")? {
        let inv_flattening = if let Some(rf) = number("rf")? {
            rf
        } else if let Some(b) = number("b")? {
            if a == b {
                0.0
            } else {
                a / (a - b)
            }
        } else if let Some(f) = number("f")? {
            if f == 0.0 {
                0.0
            } else {
                1.0 / f
            }
        } else {
            0.0
        };
        Some(Ellipsoid {
            semi_major: a,
            inv_flattening,
        })
    } else {
        None
    };

    let mut geodetic = match value("datum") {
        Some(id) => Geodetic::from_datum(id)
            .ok_or_else(|| invalid(format!("unknown datum '{}'", id)))?,
        None => Geodetic {
            datum: None,
            ellipsoid: ellipsoid.unwrap_or(Ellipsoid::WGS84),
            towgs84: None,
            prime_meridian: 0.0,
        },
    };

    if let Some(towgs84) = value("towgs84") {
        let values = towgs84
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid("+towgs84 is not a number list".to_string()))?;
        geodetic.towgs84 = Some(values);
    }
    if let Some(pm) = value("pm") {
        geodetic.prime_meridian = match pm {
            "greenwich" => 0.0,
            "paris" => 2.337_229_166_666_667,
            _ => pm
                .parse()
                .map_err(|_| invalid(format!("unsupported prime meridian '{}'", pm)))?,
        };
    }
    Ok(geodetic)
}

/// Linear units recognised by name, with their metre factor.
const UNITS: &[(&str, f64)] = &[
    ("m", 1.0),
    ("km", 1000.0),
    ("ft", 0.3048),
    ("us-ft", 1200.0 / 3937.0),
];

fn unit_name(to_meter: f64) -> Option<&'static str> {
    UNITS
        .iter()
        .find(|u| (u.1 - to_meter).abs() < 1e-12)
        .map(|u| u.0)
}

fn to_meter<'a>(
    value: &dyn Fn(&str) -> Option<&'a str>,
    number: &dyn Fn(&str) -> ProjectionResult<Option<f64>>,
    invalid: &dyn Fn(String) -> ProjectionError,
) -> ProjectionResult<f64> {
    if let Some(name) = value("units") {
        return UNITS
            .iter()
            .find(|u| u.0 == name)
            .map(|u| u.1)
            .ok_or_else(|| invalid(format!("unsupported units '{}'", name)));
    }
    Ok(number("to_meter")?.unwrap_or(1.0))
}

/// Lowercase and strip everything but letters and digits.
pub(crate) fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AEA_AFRICA: &str = "+proj=aea +lat_1=20 +lat_2=-23 +lat_0=0 +lon_0=25 +x_0=0 +y_0=0 \
                              +ellps=WGS84 +datum=WGS84 +units=m +no_defs";

    #[test]
    fn test_albers_from_proj4() {
        let params = CrsParams::from_proj4(AEA_AFRICA).unwrap();
        let p = params.projected.as_ref().unwrap();
        assert_eq!(p.method, Method::AlbersEqualArea);
        assert_eq!(p.get(Param::StandardParallel1), 20.0);
        assert_eq!(p.get(Param::StandardParallel2), -23.0);
        assert_eq!(p.get(Param::CentralMeridian), 25.0);
        assert_eq!(p.to_meter, 1.0);
        assert_eq!(params.geodetic, Geodetic::wgs84());
        assert_eq!(
            params.to_proj4(),
            "+proj=aea +lat_1=20 +lat_2=-23 +lat_0=0 +lon_0=25 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs"
        );
    }

    #[test]
    fn test_utm_expands_to_transverse_mercator() {
        let params = CrsParams::from_proj4("+proj=utm +zone=33 +south +datum=WGS84 +units=m").unwrap();
        let p = params.projected.unwrap();
        assert_eq!(p.method, Method::TransverseMercator);
        assert_eq!(p.get(Param::CentralMeridian), 15.0);
        assert_eq!(p.get(Param::ScaleFactor), 0.9996);
        assert_eq!(p.get(Param::FalseEasting), 500_000.0);
        assert_eq!(p.get(Param::FalseNorthing), 10_000_000.0);
    }

    #[test]
    fn test_lcc_picks_one_or_two_standard_parallels() {
        let one = CrsParams::from_proj4("+proj=lcc +lat_1=45 +lat_0=45 +lon_0=3 +k=0.9995").unwrap();
        assert_eq!(one.projected.unwrap().method, Method::LambertConformal1SP);

        let two = CrsParams::from_proj4("+proj=lcc +lat_1=44 +lat_2=49 +lat_0=46.5 +lon_0=3").unwrap();
        let p = two.projected.unwrap();
        assert_eq!(p.method, Method::LambertConformal2SP);
        assert_eq!(p.get(Param::StandardParallel2), 49.0);
    }

    #[test]
    fn test_custom_ellipsoid_and_feet() {
        let params =
            CrsParams::from_proj4("+proj=tmerc +lon_0=-81 +a=6378000 +rf=300 +units=us-ft").unwrap();
        assert_eq!(params.geodetic.datum, None);
        assert_eq!(params.geodetic.ellipsoid.semi_major, 6_378_000.0);
        assert_eq!(params.geodetic.ellipsoid.inv_flattening, 300.0);
        assert!((params.projected.unwrap().to_meter - 0.304_800_609_6).abs() < 1e-9);
    }

    #[test]
    fn test_sphere_from_equal_axes() {
        let params = CrsParams::from_proj4(
            "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs",
        )
        .unwrap();
        assert!(params.geodetic.ellipsoid.is_sphere());
        assert_eq!(params.projected.as_ref().unwrap().method, Method::Mercator1SP);
        assert!(params.to_proj4().contains("+R=6378137"));
    }

    #[test]
    fn test_unsupported_method() {
        assert!(matches!(
            CrsParams::from_proj4("+proj=moll +lon_0=0"),
            Err(ProjectionError::UnsupportedProjection(name)) if name == "moll"
        ));
    }

    #[test]
    fn test_wkt_datum_names() {
        assert_eq!(
            Geodetic::from_wkt_datum_name("D_WGS_1984").unwrap().datum.as_deref(),
            Some("WGS84")
        );
        assert_eq!(
            Geodetic::from_wkt_datum_name("North American Datum 1983").unwrap().ellipsoid,
            Ellipsoid::from_proj_id("GRS80").unwrap()
        );
        assert!(Geodetic::from_wkt_datum_name("Hypothetical_Datum").is_none());
    }
}
