use crate::error::{ChartError, Result};
use crate::temporal;
use chrono::NaiveDateTime;
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// A single cell of a dataset.
///
/// Loaders deliver `Text` (CSV/TSV) or JSON scalars; coercion rewrites a
/// column into `Number` or `Date`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    Null,
    /// A key absent from a record
    Missing,
}

impl Value {
    /// Permissive numeric conversion.
    ///
    /// Blank text and `Null` become 0, booleans 1/0, dates their epoch
    /// milliseconds. Text may be decimal or carry a `0x`/`0o`/`0b` prefix.
    /// A missing key and anything else that is not a number become NaN
    /// rather than an error.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Date(dt) => temporal::to_epoch_millis(dt),
            Value::Null => 0.0,
            Value::Missing => f64::NAN,
            Value::Text(s) => parse_number_text(s),
        }
    }

    /// A value is numeric-like when it converts to a number that is neither
    /// zero nor NaN.
    pub fn is_numeric_like(&self) -> bool {
        let n = self.to_number();
        !n.is_nan() && n != 0.0
    }

    /// Display string, used as the category label for ordinal scales.
    pub fn label(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Bool(b) => b.to_string(),
            Value::Date(dt) => temporal::format_label(dt),
            Value::Null | Value::Missing => String::new(),
        }
    }

    pub fn as_date(&self) -> Option<&NaiveDateTime> {
        match self {
            Value::Date(dt) => Some(dt),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn parse_number_text(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    // Rust also accepts "inf" and "nan" spellings, which are not numbers here
    let lower = trimmed.to_ascii_lowercase();
    if let Some(n) = parse_radix_literal(&lower) {
        return n;
    }
    if lower.contains("inf") || lower.contains("nan") {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Unsigned `0x`, `0o` and `0b` integer literals. A malformed digit string is
/// NaN; text without one of these prefixes is left to the decimal parser.
fn parse_radix_literal(lower: &str) -> Option<f64> {
    let (radix, digits) = if let Some(d) = lower.strip_prefix("0x") {
        (16, d)
    } else if let Some(d) = lower.strip_prefix("0o") {
        (8, d)
    } else if let Some(d) = lower.strip_prefix("0b") {
        (2, d)
    } else {
        return None;
    };

    if digits.is_empty() {
        return Some(f64::NAN);
    }
    let mut n = 0.0f64;
    for c in digits.chars() {
        match c.to_digit(radix) {
            Some(d) => n = n * radix as f64 + d as f64,
            None => return Some(f64::NAN),
        }
    }
    Some(n)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        n.to_string()
    }
}

static MISSING: Value = Value::Missing;

/// Tabular data: named columns in declaration order and rows of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { headers, rows }
    }

    /// Create a Dataset from delimited text already split by the reader
    pub fn from_csv_data(csv: crate::csv_reader::CsvData) -> Self {
        let rows = csv
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(Value::Text).collect())
            .collect();
        Self {
            headers: csv.headers,
            rows,
        }
    }

    /// Create a Dataset from a JSON array of objects, or from a single object
    /// which becomes a one-row dataset.
    pub fn from_json(value: &JsonValue) -> Result<Self> {
        match value {
            JsonValue::Array(items) => {
                let mut objects = Vec::with_capacity(items.len());
                for item in items {
                    let obj = item.as_object().ok_or_else(|| {
                        ChartError::InvalidData("Items in array must be objects".to_string())
                    })?;
                    objects.push(obj);
                }
                Self::from_objects(&objects)
            }
            JsonValue::Object(obj) => Self::from_record(obj),
            _ => Err(ChartError::InvalidData(
                "Input data must be a JSON array of objects or a single object".to_string(),
            )),
        }
    }

    /// A single record treated as a one-row dataset.
    pub fn from_record(record: &Map<String, JsonValue>) -> Result<Self> {
        Self::from_objects(&[record])
    }

    fn from_objects(objects: &[&Map<String, JsonValue>]) -> Result<Self> {
        // Headers follow the first record's key order; keys first seen later are appended
        let mut headers: Vec<String> = Vec::new();
        for obj in objects {
            for key in obj.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }

        let mut rows = Vec::with_capacity(objects.len());
        for obj in objects {
            let mut row = Vec::with_capacity(headers.len());
            for header in &headers {
                row.push(json_to_value(header, obj.get(header))?);
            }
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column: exact name first, then ASCII case-insensitive.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .or_else(|| self.headers.iter().position(|h| h.eq_ignore_ascii_case(name)))
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| ChartError::ColumnNotFound(name.to_string()))
    }

    /// Values of one column in row order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(move |row| row.get(idx).unwrap_or(&MISSING)))
    }

    /// The value of `name` in the first record, if any.
    pub fn first_value(&self, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.first().and_then(|row| row.get(idx))
    }

    /// Copy of this dataset with one column replaced.
    pub(crate) fn with_column(&self, idx: usize, values: Vec<Value>) -> Self {
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                if idx < row.len() {
                    row[idx] = value;
                }
                row
            })
            .collect();
        Self {
            headers: self.headers.clone(),
            rows,
        }
    }
}

fn json_to_value(field: &str, value: Option<&JsonValue>) -> Result<Value> {
    match value {
        Some(JsonValue::String(s)) => Ok(Value::Text(s.clone())),
        Some(JsonValue::Number(n)) => Ok(n.as_f64().map(Value::Number).unwrap_or(Value::Null)),
        Some(JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
        Some(JsonValue::Null) => Ok(Value::Null),
        None => Ok(Value::Missing),
        Some(_) => Err(ChartError::InvalidData(format!(
            "Unsupported value type for field '{}'",
            field
        ))),
    }
}
