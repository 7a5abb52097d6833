//! Error types surfaced by the chart pipeline.

use crate::infer::DomainKind;
use thiserror::Error;

/// Result type alias using [`ChartError`].
pub type Result<T> = std::result::Result<T, ChartError>;

/// Errors that can occur while loading, typing and laying out chart data.
#[derive(Error, Debug)]
pub enum ChartError {
    /// The data location does not end in `json`, `tsv` or `csv`.
    #[error("Unsupported data source '{location}': expected a .json, .tsv or .csv file")]
    UnsupportedSource { location: String },

    /// The loader could not fetch or parse the data.
    #[error("Failed to load '{location}': {reason}")]
    Load { location: String, reason: String },

    /// A value in a temporal column did not parse under the active format.
    #[error("Column '{column}' row {row}: '{value}' is not a valid date")]
    DateCoercion {
        column: String,
        row: usize,
        value: String,
    },

    /// The grid cannot be allocated (zero square value, zero total, empty grid).
    #[error("Degenerate waffle layout: {0}")]
    DegenerateLayout(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    /// Column inference found nothing of the requested kind.
    #[error("No {kind} column found in dataset")]
    NoColumnOfKind { kind: DomainKind },

    /// A scale domain was requested for a column that has no usable values.
    #[error("Cannot resolve a {kind} domain for column '{column}'")]
    UnresolvedDomain { column: String, kind: DomainKind },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Rendering error: {0}")]
    Render(String),
}
