//! Column type inference.
//!
//! A column is classified from a single representative value: its value in
//! the first record. Later rows are not inspected, so a column whose first
//! value is misleading (a leading `"0"`, a stray label over numbers) is
//! classified from that value alone and later coercion deals with the rest.

use crate::data::{Dataset, Value};
use crate::temporal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// The kind of scale a column's values call for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainKind {
    Ordinal,
    Linear,
    Temporal,
    Unknown,
}

impl fmt::Display for DomainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DomainKind::Ordinal => "ordinal",
            DomainKind::Linear => "linear",
            DomainKind::Temporal => "temporal",
            DomainKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Classify a column. Temporal wins over ordinal, anything else is linear.
/// A missing column or an empty dataset is `Unknown`.
pub fn classify(data: &Dataset, column: &str, format: Option<&str>) -> DomainKind {
    let Some(sample) = data.first_value(column) else {
        return DomainKind::Unknown;
    };

    let kind = if is_time_value(sample, format) {
        DomainKind::Temporal
    } else if !sample.is_numeric_like() {
        DomainKind::Ordinal
    } else {
        DomainKind::Linear
    };

    debug!(column, sample = %sample, %kind, "classified column");
    kind
}

/// True when the column's representative value is not numeric-like.
/// Missing columns count as ordinal, matching a lookup of an absent key.
pub fn is_ordinal(data: &Dataset, column: &str) -> bool {
    match data.first_value(column) {
        Some(sample) => !sample.is_numeric_like(),
        None => true,
    }
}

pub fn is_time(data: &Dataset, column: &str, format: Option<&str>) -> bool {
    data.first_value(column)
        .map(|sample| is_time_value(sample, format))
        .unwrap_or(false)
}

/// Neither ordinal nor temporal.
pub fn is_linear(data: &Dataset, column: &str) -> bool {
    !is_ordinal(data, column) && !is_time(data, column, None)
}

/// Whether a single value reads as a date.
///
/// With a format the value must parse under it. Without one, the text must
/// contain a space, `/` or `-` and then parse as a date.
pub fn is_time_value(value: &Value, format: Option<&str>) -> bool {
    if value.as_date().is_some() {
        return true;
    }
    let text = value.label();
    match format {
        Some(fmt) => temporal::parse_with_format(&text, fmt).is_some(),
        None => temporal::has_date_separator(&text) && temporal::parse_generic(&text).is_some(),
    }
}

/// First column, in declaration order, that reads as ordinal.
pub fn first_ordinal_column(data: &Dataset) -> Option<&str> {
    data.headers
        .iter()
        .map(String::as_str)
        .find(|name| is_ordinal(data, name))
}

pub fn first_linear_column(data: &Dataset) -> Option<&str> {
    data.headers
        .iter()
        .map(String::as_str)
        .find(|name| is_linear(data, name))
}

pub fn first_time_column<'a>(data: &'a Dataset, format: Option<&str>) -> Option<&'a str> {
    data.headers
        .iter()
        .map(String::as_str)
        .find(|name| is_time(data, name, format))
}
