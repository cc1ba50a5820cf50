//! dBase `.dbf` attribute tables, read and written through the `dbase`
//! crate that `shapefile` re-exports.
//!
//! Supports the field types shapefiles use in practice: Character,
//! Numeric, Float, Logical and Date. Dates stay as their `YYYYMMDD` text.
//! Two things `dbase` does not report are taken from the file header
//! directly: the decimal count of numeric fields and the deletion flag of
//! each record.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use shapefile::dbase::{self, FieldName, Record, TableWriterBuilder};
use tracing::warn;

use crate::{VectorError, VectorResult};

const HEADER_LEN: u64 = 32;
const FIELD_DESCRIPTOR_LEN: usize = 32;
const HEADER_TERMINATOR: u8 = 0x0D;
const DELETED_FLAG: u8 = b'*';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Character,
    Numeric,
    Float,
    Logical,
    Date,
}

/// Column definition of an attribute table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub length: u8,
    pub decimals: u8,
}

impl FieldDef {
    pub fn character(name: &str, length: u8) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Character,
            length,
            decimals: 0,
        }
    }

    pub fn numeric(name: &str, length: u8, decimals: u8) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Numeric,
            length,
            decimals,
        }
    }

    pub fn logical(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Logical,
            length: 1,
            decimals: 0,
        }
    }

    pub fn date(name: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Date,
            length: 8,
            decimals: 0,
        }
    }
}

/// One attribute value. Blank numeric and logical cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Character(String),
    Numeric(Option<f64>),
    Logical(Option<bool>),
    Date(String),
}

impl FieldValue {
    /// The blank value for a column type.
    pub fn blank(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Character => FieldValue::Character(String::new()),
            FieldType::Numeric | FieldType::Float => FieldValue::Numeric(None),
            FieldType::Logical => FieldValue::Logical(None),
            FieldType::Date => FieldValue::Date(String::new()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Character(s) | FieldValue::Date(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Numeric(v) => *v,
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Character(s) | FieldValue::Date(s) => write!(f, "{}", s),
            FieldValue::Numeric(Some(v)) => write!(f, "{}", v),
            FieldValue::Logical(Some(b)) => write!(f, "{}", b),
            FieldValue::Numeric(None) | FieldValue::Logical(None) => Ok(()),
        }
    }
}

/// A decoded attribute table.
#[derive(Debug, Clone, PartialEq)]
pub struct DbfTable {
    pub fields: Vec<FieldDef>,
    /// Every record in file order, deleted ones included, so that record
    /// `i` still pairs with shape `i`.
    pub records: Vec<Vec<FieldValue>>,
    /// Deletion flag per record.
    pub deleted: Vec<bool>,
}

impl DbfTable {
    pub fn live_count(&self) -> usize {
        self.deleted.iter().filter(|&&d| !d).count()
    }
}

/// Layout facts read straight from the header.
#[derive(Debug, Clone, PartialEq)]
struct HeaderScan {
    decimals: Vec<(String, u8)>,
    deleted: Vec<bool>,
}

/// Read the header and the per-record deletion flags.
///
/// The declared record count is checked against the file size before
/// anything is sized from it.
fn scan_header(path: &Path) -> VectorResult<HeaderScan> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let mut header = [0u8; HEADER_LEN as usize];
    reader
        .read_exact(&mut header)
        .map_err(|_| VectorError::InvalidDbf(format!("{} bytes is too short for a header", file_len)))?;
    let num_records = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as u64;
    let header_len = u16::from_le_bytes([header[8], header[9]]) as u64;
    let record_len = u16::from_le_bytes([header[10], header[11]]) as u64;

    if header_len < HEADER_LEN + 1 || record_len == 0 {
        return Err(VectorError::InvalidDbf(format!(
            "header length {} and record length {} are not a dBase layout",
            header_len, record_len
        )));
    }
    let needed = header_len + num_records * record_len;
    if needed > file_len {
        return Err(VectorError::InvalidDbf(format!(
            "{} records of {} bytes need {} bytes, file has {}",
            num_records, record_len, needed, file_len
        )));
    }

    let mut descriptors = vec![0u8; (header_len - HEADER_LEN) as usize];
    reader.read_exact(&mut descriptors)?;
    let decimals = descriptors
        .chunks_exact(FIELD_DESCRIPTOR_LEN)
        .take_while(|d| d[0] != HEADER_TERMINATOR)
        .map(|d| {
            let end = d[..11].iter().position(|&b| b == 0).unwrap_or(11);
            let name = String::from_utf8_lossy(&d[..end]).trim_end().to_string();
            (name, d[17])
        })
        .collect();

    let mut deleted = Vec::new();
    let mut flag = [0u8; 1];
    for index in 0..num_records {
        reader.seek(SeekFrom::Start(header_len + index * record_len))?;
        reader.read_exact(&mut flag)?;
        deleted.push(flag[0] == DELETED_FLAG);
    }

    Ok(HeaderScan { decimals, deleted })
}

/// Read a `.dbf` file.
pub fn read_table(path: &Path) -> VectorResult<DbfTable> {
    let scan = scan_header(path)?;

    let mut reader = dbase::Reader::from_path(path)?;
    let fields = reader
        .fields()
        .iter()
        .map(|info| {
            let field_type = match info.field_type() {
                dbase::FieldType::Character => FieldType::Character,
                dbase::FieldType::Numeric => FieldType::Numeric,
                dbase::FieldType::Float => FieldType::Float,
                dbase::FieldType::Logical => FieldType::Logical,
                dbase::FieldType::Date => FieldType::Date,
                other => {
                    return Err(VectorError::InvalidDbf(format!(
                        "unsupported field type {:?} for {}",
                        other,
                        info.name()
                    )))
                }
            };
            let decimals = scan
                .decimals
                .iter()
                .find(|(name, _)| name == info.name())
                .map_or(0, |(_, d)| *d);
            Ok(FieldDef {
                name: info.name().to_string(),
                field_type,
                length: info.length(),
                decimals,
            })
        })
        .collect::<VectorResult<Vec<_>>>()?;

    let records = reader
        .read()?
        .into_iter()
        .map(|record| decode_record(&fields, record))
        .collect::<VectorResult<Vec<_>>>()?;

    // Deleted records may or may not come back from the reader; either way
    // the table is re-aligned with the header flags.
    let live = scan.deleted.iter().filter(|&&d| !d).count();
    let records = if records.len() == scan.deleted.len() {
        records
    } else if records.len() == live {
        let mut live_records = records.into_iter();
        scan.deleted
            .iter()
            .map(|&deleted| {
                if deleted {
                    Some(fields.iter().map(|f| FieldValue::blank(f.field_type)).collect())
                } else {
                    live_records.next()
                }
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| VectorError::InvalidDbf("record count changed while reading".to_string()))?
    } else {
        return Err(VectorError::InvalidDbf(format!(
            "{} records read, header declares {} ({} live)",
            records.len(),
            scan.deleted.len(),
            live
        )));
    };

    Ok(DbfTable {
        fields,
        records,
        deleted: scan.deleted,
    })
}

fn decode_record(fields: &[FieldDef], record: Record) -> VectorResult<Vec<FieldValue>> {
    fields
        .iter()
        .map(|field| {
            let value = match record.get(&field.name).cloned() {
                None => FieldValue::blank(field.field_type),
                Some(dbase::FieldValue::Character(s)) => {
                    FieldValue::Character(s.map(|s| s.trim_end().to_string()).unwrap_or_default())
                }
                Some(dbase::FieldValue::Numeric(v)) => FieldValue::Numeric(v),
                Some(dbase::FieldValue::Float(v)) => FieldValue::Numeric(v.map(f64::from)),
                Some(dbase::FieldValue::Logical(v)) => FieldValue::Logical(v),
                Some(dbase::FieldValue::Date(d)) => FieldValue::Date(
                    d.map(|d| format!("{:04}{:02}{:02}", d.year(), d.month(), d.day()))
                        .unwrap_or_default(),
                ),
                Some(other) => {
                    return Err(VectorError::InvalidDbf(format!(
                        "unexpected value {:?} in field {}",
                        other, field.name
                    )))
                }
            };
            Ok(value)
        })
        .collect()
}

/// Table layout for the `dbase` writer.
pub fn table_builder(fields: &[FieldDef]) -> VectorResult<TableWriterBuilder> {
    let mut builder = TableWriterBuilder::new();
    for field in fields {
        let name = FieldName::try_from(field.name.as_str()).map_err(|_| {
            VectorError::SchemaMismatch(format!(
                "field name '{}' must be 1 to 10 bytes",
                field.name
            ))
        })?;
        builder = match field.field_type {
            FieldType::Character => builder.add_character_field(name, field.length),
            FieldType::Numeric => builder.add_numeric_field(name, field.length, field.decimals),
            FieldType::Float => builder.add_float_field(name, field.length, field.decimals),
            FieldType::Logical => builder.add_logical_field(name),
            FieldType::Date => builder.add_date_field(name),
        };
    }
    Ok(builder)
}

/// Convert one row of values into a `dbase` record.
pub fn encode_record(fields: &[FieldDef], values: &[FieldValue]) -> VectorResult<Record> {
    if values.len() != fields.len() {
        return Err(VectorError::SchemaMismatch(format!(
            "{} values for {} fields",
            values.len(),
            fields.len()
        )));
    }
    let mut record = Record::default();
    for (field, value) in fields.iter().zip(values) {
        record.insert(field.name.clone(), encode_value(field, value)?);
    }
    Ok(record)
}

fn encode_value(field: &FieldDef, value: &FieldValue) -> VectorResult<dbase::FieldValue> {
    let width = field.length as usize;
    let overflow = || VectorError::ValueOverflow {
        field: field.name.clone(),
        value: value.to_string(),
    };

    let encoded = match (field.field_type, value) {
        (FieldType::Character, FieldValue::Character(s)) => {
            // Truncate on a char boundary.
            let mut end = s.len().min(width);
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            dbase::FieldValue::Character(Some(s[..end].to_string()))
        }
        (FieldType::Numeric | FieldType::Float, FieldValue::Numeric(v)) => {
            if let Some(v) = v {
                let text = format!("{:.prec$}", v, prec = field.decimals as usize);
                if text.len() > width || !v.is_finite() {
                    return Err(overflow());
                }
            }
            match field.field_type {
                FieldType::Float => dbase::FieldValue::Float(v.map(|v| v as f32)),
                _ => dbase::FieldValue::Numeric(*v),
            }
        }
        (FieldType::Logical, FieldValue::Logical(v)) => dbase::FieldValue::Logical(*v),
        (FieldType::Date, FieldValue::Date(s)) => dbase::FieldValue::Date(parse_date(s).ok_or_else(overflow)?),
        _ => {
            return Err(VectorError::SchemaMismatch(format!(
                "value {:?} does not match {:?} field {}",
                value, field.field_type, field.name
            )))
        }
    };
    Ok(encoded)
}

/// `YYYYMMDD` text as a `dbase` date; blank text is a blank date.
fn parse_date(text: &str) -> Option<Option<dbase::Date>> {
    let text = text.trim();
    if text.is_empty() {
        return Some(None);
    }
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        warn!(value = text, "Date is not YYYYMMDD");
        return None;
    }
    let year = text[..4].parse().ok()?;
    let month = text[4..6].parse().ok()?;
    let day = text[6..].parse().ok()?;
    Some(Some(dbase::Date::new(day, month, year)))
}
