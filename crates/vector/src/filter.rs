//! Attribute filters of the form `FIELD = 'value'`.
//!
//! Grammar:
//!
//! ```text
//! filter  := field op literal
//! field   := identifier | "quoted identifier"
//! op      := '=' | '<>' | '!='
//! literal := 'single quoted text' ('' escapes a quote) | number
//! ```
//!
//! Comparisons follow SQL: a blank (NULL) cell matches neither `=` nor `<>`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::info;

use crate::dbf::FieldValue;
use crate::layer::Layer;
use crate::{VectorError, VectorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Number(f64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A single-comparison attribute filter.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeFilter {
    field: String,
    op: CompareOp,
    value: Literal,
}

impl AttributeFilter {
    /// `field = 'value'` without going through the parser.
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: CompareOp::Eq,
            value: Literal::Text(value.into()),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn value(&self) -> &Literal {
        &self.value
    }

    /// Copy the features that match into a new layer named `name`.
    ///
    /// The result keeps the source schema and spatial reference. Matching
    /// nothing yields an empty layer, not an error.
    pub fn apply(&self, layer: &Layer, name: &str) -> VectorResult<Layer> {
        let index = layer.field_index(&self.field)?;
        let mut out = layer.empty_like(name);
        for feature in layer.features() {
            if self.matches_value(&feature.attributes[index]) {
                out.push(feature.clone())?;
            }
        }

        info!(
            filter = %self,
            matched = out.len(),
            total = layer.len(),
            "Applied attribute filter"
        );
        Ok(out)
    }

    fn matches_value(&self, cell: &FieldValue) -> bool {
        let equal = match (cell, &self.value) {
            (FieldValue::Character(s) | FieldValue::Date(s), Literal::Text(t)) => Some(s == t),
            (FieldValue::Character(s), Literal::Number(n)) => {
                s.trim().parse::<f64>().ok().map(|v| v == *n)
            }
            (FieldValue::Numeric(Some(v)), Literal::Number(n)) => Some(v == n),
            (FieldValue::Numeric(Some(v)), Literal::Text(t)) => {
                t.trim().parse::<f64>().ok().map(|n| *v == n)
            }
            (FieldValue::Logical(Some(b)), Literal::Text(t)) => match t.as_str() {
                "T" | "t" | "Y" | "y" => Some(*b),
                "F" | "f" | "N" | "n" => Some(!*b),
                _ => Some(false),
            },
            (FieldValue::Numeric(None) | FieldValue::Logical(None), _) => None,
            (FieldValue::Date(_), Literal::Number(_)) | (FieldValue::Logical(_), Literal::Number(_)) => {
                Some(false)
            }
        };

        match (equal, self.op) {
            (None, _) => false,
            (Some(eq), CompareOp::Eq) => eq,
            (Some(eq), CompareOp::Ne) => !eq,
        }
    }
}

impl fmt::Display for AttributeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
        };
        write!(f, "{} {} {}", self.field, op, self.value)
    }
}

impl FromStr for AttributeFilter {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| VectorError::InvalidFilter {
            filter: s.to_string(),
            reason: reason.to_string(),
        };

        let rest = s.trim_start();
        let (field, rest) = parse_field(rest).ok_or_else(|| invalid("expected a field name"))?;

        let rest = rest.trim_start();
        let (op, rest) = if let Some(r) = rest.strip_prefix("<>") {
            (CompareOp::Ne, r)
        } else if let Some(r) = rest.strip_prefix("!=") {
            (CompareOp::Ne, r)
        } else if let Some(r) = rest.strip_prefix('=') {
            (CompareOp::Eq, r)
        } else {
            return Err(invalid("expected '=', '<>' or '!='"));
        };

        let rest = rest.trim();
        let value = if let Some(quoted) = rest.strip_prefix('\'') {
            parse_text_literal(quoted).ok_or_else(|| invalid("unterminated string literal"))?
        } else {
            let n = rest
                .parse::<f64>()
                .map_err(|_| invalid("expected a quoted string or a number"))?;
            Literal::Number(n)
        };

        Ok(Self { field, op, value })
    }
}

fn parse_field(s: &str) -> Option<(String, &str)> {
    if let Some(rest) = s.strip_prefix('"') {
        let end = rest.find('"')?;
        let name = &rest[..end];
        if name.is_empty() {
            return None;
        }
        return Some((name.to_string(), &rest[end + 1..]));
    }

    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((s[..end].to_string(), &s[end..]))
}

/// Parse the body of a single-quoted literal (opening quote already
/// consumed). Nothing but whitespace may follow the closing quote.
fn parse_text_literal(s: &str) -> Option<Literal> {
    let mut value = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                value.push('\'');
                continue;
            }
            let trailing: String = chars.collect();
            return trailing.trim().is_empty().then_some(Literal::Text(value));
        }
        value.push(c);
    }
    None
}

/// Copy the features of `input` whose `field` equals `value` into a new
/// shapefile at `output`, in a layer named after the value.
///
/// Returns the filtered layer. A value that matches nothing still writes
/// a valid, empty shapefile.
pub fn create_filtered_shapefile(
    value: &str,
    field: &str,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> VectorResult<Layer> {
    let source = Layer::open(input)?;
    let filtered = AttributeFilter::equals(field, value).apply(&source, value)?;
    filtered.write(output)?;
    Ok(filtered)
}
