//! Attribute rows and the id-indexed data table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{MapError, MapResult};

/// Column holding the join key in every attribute row.
pub const ID_COLUMN: &str = "id";

/// One attribute row: column name -> value, in source column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeRow(Map<String, Value>);

impl AttributeRow {
    pub fn new(columns: Map<String, Value>) -> Self {
        Self(columns)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Join key of this row, if it has a usable `id`.
    pub fn id(&self) -> Option<String> {
        self.0.get(ID_COLUMN).and_then(join_key)
    }

    /// Numeric value of a column, `NaN` when missing or not numeric.
    ///
    /// Strings are read by their leading numeric prefix, so `"12 km"` is 12.
    pub fn number(&self, column: &str) -> f64 {
        match self.0.get(column) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
            Some(Value::String(s)) => parse_float(s),
            _ => f64::NAN,
        }
    }

    /// Columns in natural order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for AttributeRow {
    fn from(columns: Map<String, Value>) -> Self {
        Self(columns)
    }
}

/// Normalize an `id` value to the string it is joined on.
///
/// Numbers join on their shortest decimal text (`1`, `1.0` -> `"1"`).
pub fn join_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().map(format_number)
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// Parse the longest numeric prefix of a string, after leading whitespace.
///
/// Returns `NaN` when there is no numeric prefix.
pub fn parse_float(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return f64::NAN;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(f64::NAN)
}

/// Attribute rows indexed by their join key.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    rows: HashMap<String, AttributeRow>,
}

impl DataTable {
    /// Index rows by `id`. Rows without an id are dropped; a repeated id
    /// keeps the last row.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = AttributeRow>,
    {
        let mut indexed = HashMap::new();
        for row in rows {
            match row.id() {
                Some(id) => {
                    indexed.insert(id, row);
                }
                None => debug!("Dropping attribute row without id"),
            }
        }
        Self { rows: indexed }
    }

    /// Index a JSON array of row objects.
    pub fn from_json(payload: &Value) -> MapResult<Self> {
        let items = payload.as_array().ok_or_else(|| {
            MapError::DataReadError("attribute data must be an array of rows".to_string())
        })?;

        let rows = items.iter().filter_map(|item| match item {
            Value::Object(columns) => Some(AttributeRow::new(columns.clone())),
            _ => {
                debug!("Skipping non-object attribute row");
                None
            }
        });
        Ok(Self::from_rows(rows))
    }

    pub fn get(&self, id: &str) -> Option<&AttributeRow> {
        self.rows.get(id)
    }

    /// Row joined to a feature `id` property value.
    pub fn lookup(&self, id: &Value) -> Option<&AttributeRow> {
        join_key(id).and_then(|key| self.rows.get(&key))
    }

    /// Numeric values of a column across all rows (may contain `NaN`).
    pub fn values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.rows.values().map(move |row| row.number(column))
    }

    /// Minimum and maximum of a column, ignoring non-numeric values.
    pub fn extent(&self, column: &str) -> Option<(f64, f64)> {
        self.values(column)
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((min, max)) => Some((min.min(v), max.max(v))),
            })
    }

    /// Maximum of a column, ignoring non-numeric values.
    pub fn max(&self, column: &str) -> Option<f64> {
        self.extent(column).map(|(_, max)| max)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
