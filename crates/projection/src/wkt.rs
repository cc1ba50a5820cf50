//! WKT1 reading and writing.
//!
//! Reads OGC and ESRI flavoured `GEOGCS`/`PROJCS` definitions into
//! [`CrsParams`] and writes them back out, which is what `.prj` files
//! and GDAL projections carry.

use std::fmt::Write;

use crate::params::{CrsParams, Ellipsoid, Geodetic, Method, Param, Projected};
use crate::{ProjectionError, ProjectionResult};

/// One `KEYWORD[arg, ...]` node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node {
    pub keyword: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Text(String),
    Number(f64),
    Node(Node),
}

impl Node {
    /// The quoted name that WKT puts first.
    fn name(&self) -> Option<&str> {
        match self.args.first() {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    fn number(&self, index: usize) -> Option<f64> {
        match self.args.get(index) {
            Some(Value::Number(v)) => Some(*v),
            _ => None,
        }
    }

    fn children(&self, keyword: &'static str) -> impl Iterator<Item = &Node> {
        self.args.iter().filter_map(move |v| match v {
            Value::Node(n) if n.keyword.eq_ignore_ascii_case(keyword) => Some(n),
            _ => None,
        })
    }

    fn child(&self, keyword: &'static str) -> Option<&Node> {
        self.children(keyword).next()
    }
}

fn unsupported(reason: impl Into<String>) -> ProjectionError {
    ProjectionError::UnsupportedWkt(reason.into())
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        while let Some(c) = self.text[self.pos..].chars().next() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.text[self.pos..].chars().next()
    }

    fn expect_any(&mut self, options: &[char]) -> ProjectionResult<char> {
        match self.peek() {
            Some(c) if options.contains(&c) => {
                self.pos += c.len_utf8();
                Ok(c)
            }
            other => Err(unsupported(format!(
                "expected one of {:?} at offset {}, found {:?}",
                options, self.pos, other
            ))),
        }
    }

    fn node(&mut self) -> ProjectionResult<Node> {
        self.skip_ws();
        let start = self.pos;
        let len = self.text[start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(self.text.len() - start);
        if len == 0 {
            return Err(unsupported(format!("expected a keyword at offset {}", start)));
        }
        let keyword = self.text[start..start + len].to_string();
        self.pos += len;

        let open = self.expect_any(&['[', '('])?;
        let close = if open == '[' { ']' } else { ')' };
        let mut args = Vec::new();
        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(Node { keyword, args });
        }
        loop {
            args.push(self.value()?);
            if self.expect_any(&[',', close])? == close {
                break;
            }
        }
        Ok(Node { keyword, args })
    }

    fn value(&mut self) -> ProjectionResult<Value> {
        match self.peek() {
            Some('"') => {
                self.pos += 1;
                let rest = &self.text[self.pos..];
                let end = rest
                    .find('"')
                    .ok_or_else(|| unsupported("unterminated string"))?;
                let text = rest[..end].to_string();
                self.pos += end + 1;
                Ok(Value::Text(text))
            }
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                let rest = &self.text[self.pos..];
                let len = rest
                    .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
                    .unwrap_or(rest.len());
                let number = rest[..len]
                    .parse()
                    .map_err(|_| unsupported(format!("bad number '{}'", &rest[..len])))?;
                self.pos += len;
                Ok(Value::Number(number))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                // Either a nested node or a bare enum such as `EAST`.
                let rest = &self.text[self.pos..];
                let len = rest
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len());
                let after = rest[len..].trim_start();
                if after.starts_with('[') || after.starts_with('(') {
                    Ok(Value::Node(self.node()?))
                } else {
                    self.pos += len;
                    Ok(Value::Text(rest[..len].to_string()))
                }
            }
            other => Err(unsupported(format!(
                "unexpected {:?} at offset {}",
                other, self.pos
            ))),
        }
    }
}

/// Parse WKT text into its node tree.
pub(crate) fn parse(wkt: &str) -> ProjectionResult<Node> {
    let mut parser = Parser { text: wkt, pos: 0 };
    let node = parser.node()?;
    if parser.peek().is_some() {
        return Err(unsupported(format!(
            "trailing text after offset {}",
            parser.pos
        )));
    }
    Ok(node)
}

/// Convert a `GEOGCS` or `PROJCS` tree into parameters.
pub(crate) fn to_params(root: &Node) -> ProjectionResult<CrsParams> {
    match root.keyword.to_ascii_uppercase().as_str() {
        "GEOGCS" => Ok(CrsParams {
            geodetic: geodetic(root)?,
            projected: None,
        }),
        "PROJCS" => {
            let geogcs = root
                .child("GEOGCS")
                .ok_or_else(|| unsupported("PROJCS without GEOGCS"))?;
            Ok(CrsParams {
                geodetic: geodetic(geogcs)?,
                projected: Some(projected(root)?),
            })
        }
        other => Err(unsupported(format!("{} is not a WKT1 GEOGCS or PROJCS", other))),
    }
}

fn geodetic(geogcs: &Node) -> ProjectionResult<Geodetic> {
    let datum = geogcs
        .child("DATUM")
        .ok_or_else(|| unsupported("GEOGCS without DATUM"))?;

    let mut geodetic = match datum.name().and_then(Geodetic::from_wkt_datum_name) {
        Some(known) => known,
        None => {
            let spheroid = datum
                .child("SPHEROID")
                .or_else(|| datum.child("ELLIPSOID"))
                .ok_or_else(|| unsupported("DATUM without SPHEROID"))?;
            let (semi_major, inv_flattening) = spheroid
                .number(1)
                .zip(spheroid.number(2))
                .ok_or_else(|| unsupported("SPHEROID needs a semi-major axis and inverse flattening"))?;
            Geodetic {
                datum: None,
                ellipsoid: Ellipsoid {
                    semi_major,
                    inv_flattening,
                },
                towgs84: None,
                prime_meridian: 0.0,
            }
        }
    };

    if let Some(towgs84) = datum.child("TOWGS84") {
        let values: Vec<f64> = towgs84
            .args
            .iter()
            .filter_map(|v| match v {
                Value::Number(n) => Some(*n),
                _ => None,
            })
            .collect();
        if values.iter().any(|v| *v != 0.0) || geodetic.datum.is_none() {
            geodetic.towgs84 = Some(values);
        }
    }
    if let Some(pm) = geogcs.child("PRIMEM") {
        geodetic.prime_meridian = pm.number(1).unwrap_or(0.0);
    }
    if let Some(unit) = geogcs.child("UNIT") {
        let factor = unit.number(1).unwrap_or(0.0);
        if (factor - 1f64.to_radians()).abs() > 1e-12 {
            return Err(unsupported(format!(
                "angular unit {} is not degrees",
                unit.name().unwrap_or("?")
            )));
        }
    }
    Ok(geodetic)
}

fn projected(projcs: &Node) -> ProjectionResult<Projected> {
    let name = projcs
        .child("PROJECTION")
        .and_then(Node::name)
        .ok_or_else(|| unsupported("PROJCS without PROJECTION"))?;
    let mut method =
        Method::from_wkt_name(name).ok_or_else(|| unsupported(format!("projection {}", name)))?;

    let to_meter = projcs
        .child("UNIT")
        .and_then(|u| u.number(1))
        .unwrap_or(1.0);
    if !(to_meter.is_finite() && to_meter > 0.0) {
        return Err(unsupported(format!("linear unit factor {}", to_meter)));
    }

    let mut projected = Projected::new(method);
    projected.to_meter = to_meter;
    for parameter in projcs.children("PARAMETER") {
        let (Some(param_name), Some(value)) = (parameter.name(), parameter.number(1)) else {
            return Err(unsupported("PARAMETER needs a name and a value"));
        };
        let param = Param::from_wkt_name(param_name)
            .ok_or_else(|| unsupported(format!("parameter {} of {}", param_name, name)))?;
        let value = if param.is_linear() { value * to_meter } else { value };
        projected.params.insert(param, value);
    }

    // ESRI writes one-parallel Lambert as "Lambert_Conformal_Conic" with a
    // scale factor and no second parallel.
    if method == Method::LambertConformal2SP
        && !projected.params.contains_key(&Param::StandardParallel2)
    {
        method = Method::LambertConformal1SP;
        if let Some(sp1) = projected.params.remove(&Param::StandardParallel1) {
            projected.params.insert(Param::LatitudeOfOrigin, sp1);
        }
        projected.method = method;
    }
    // Mercator_1SP has no latitude of origin
    if method == Method::Mercator1SP {
        projected.params.remove(&Param::LatitudeOfOrigin);
    }

    Ok(projected)
}

/// Write parameters as WKT1, tagging the top level with an EPSG authority
/// when one is known.
pub(crate) fn from_params(params: &CrsParams, epsg: Option<u16>) -> String {
    let authority = epsg.map(|code| format!(",AUTHORITY[\"EPSG\",\"{}\"]", code));
    let mut geogcs = String::new();
    write_geogcs(&mut geogcs, &params.geodetic);

    match &params.projected {
        None => {
            if let Some(authority) = authority {
                geogcs.insert_str(geogcs.len() - 1, &authority);
            }
            geogcs
        }
        Some(p) => {
            let mut out = String::new();
            let _ = write!(out, "PROJCS[\"unnamed\",{}", geogcs);
            let _ = write!(out, ",PROJECTION[\"{}\"]", p.method.wkt_name());
            for &param in p.method.params() {
                let mut value = p.get(param);
                if param.is_linear() {
                    value /= p.to_meter;
                }
                let _ = write!(
                    out,
                    ",PARAMETER[\"{}\",{}]",
                    p.method.wkt_param_name(param),
                    value
                );
            }
            let unit = if p.to_meter == 1.0 { "metre" } else { "unnamed" };
            let _ = write!(out, ",UNIT[\"{}\",{}]", unit, p.to_meter);
            if let Some(authority) = authority {
                out.push_str(&authority);
            }
            out.push(']');
            out
        }
    }
}

fn write_geogcs(out: &mut String, g: &Geodetic) {
    let (ellps_name, datum_name) = match (g.ellipsoid.known(), g.wkt_datum_name()) {
        (_, Some(datum)) if datum == "WGS_1984" => ("WGS 84", datum.to_string()),
        (known, Some(datum)) => (known.map_or("unnamed", |k| k.1), datum.to_string()),
        (known, None) => (known.map_or("unnamed", |k| k.1), "unknown".to_string()),
    };
    let geog_name = if datum_name == "WGS_1984" { "WGS 84" } else { "unnamed" };

    let _ = write!(
        out,
        "GEOGCS[\"{}\",DATUM[\"{}\",SPHEROID[\"{}\",{},{}]",
        geog_name, datum_name, ellps_name, g.ellipsoid.semi_major, g.ellipsoid.inv_flattening
    );
    if let Some(towgs84) = &g.towgs84 {
        let values: Vec<String> = towgs84.iter().map(|v| v.to_string()).collect();
        let _ = write!(out, ",TOWGS84[{}]", values.join(","));
    }
    let _ = write!(
        out,
        "],PRIMEM[\"Greenwich\",{}],UNIT[\"degree\",0.0174532925199433]]",
        g.prime_meridian
    );
}
