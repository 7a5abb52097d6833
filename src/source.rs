//! Data acquisition.
//!
//! A chart's data is either handed over in memory or named by a location
//! that a [`DataLoader`] fetches asynchronously. The location's extension is
//! checked before any loading starts: [`acquire`] fails synchronously for
//! anything but `json`, `tsv` or `csv`, and only otherwise hands back the
//! future that performs the load.

use crate::csv_reader;
use crate::data::Dataset;
use crate::error::{ChartError, Result};
use serde_json::{Map, Value as JsonValue};
use std::future::Future;
use std::path::PathBuf;
use tracing::{debug, info};

/// Where a chart's data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Records(Dataset),
    /// A single record, treated as a one-row dataset
    Record(Map<String, JsonValue>),
    Location(String),
}

impl DataSource {
    /// Interpret user input: JSON text is inline data, anything else is a
    /// location.
    pub fn from_raw(raw: &str) -> Result<Self> {
        match serde_json::from_str::<JsonValue>(raw) {
            Ok(JsonValue::Object(map)) => Ok(DataSource::Record(map)),
            Ok(json @ JsonValue::Array(_)) => Ok(DataSource::Records(Dataset::from_json(&json)?)),
            Ok(_) => Err(ChartError::InvalidData(format!(
                "Inline data must be a JSON array or object, got '{}'",
                raw
            ))),
            Err(_) => Ok(DataSource::Location(raw.to_string())),
        }
    }
}

impl From<Dataset> for DataSource {
    fn from(data: Dataset) -> Self {
        DataSource::Records(data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Tsv,
    Csv,
}

impl SourceFormat {
    /// Format named by the text after the last `.` of `location`.
    pub fn from_location(location: &str) -> Result<Self> {
        let extension = location.rsplit('.').next().unwrap_or_default();
        match extension {
            "json" => Ok(SourceFormat::Json),
            "tsv" => Ok(SourceFormat::Tsv),
            "csv" => Ok(SourceFormat::Csv),
            _ => Err(ChartError::UnsupportedSource {
                location: location.to_string(),
            }),
        }
    }

    /// Parse loaded text in this format.
    pub fn parse(self, text: &str) -> Result<Dataset> {
        match self {
            SourceFormat::Json => {
                let json: JsonValue = serde_json::from_str(text)
                    .map_err(|e| ChartError::InvalidData(format!("Malformed JSON: {}", e)))?;
                Dataset::from_json(&json)
            }
            SourceFormat::Csv => Ok(Dataset::from_csv_data(csv_reader::read_csv(text.as_bytes())?)),
            SourceFormat::Tsv => Ok(Dataset::from_csv_data(csv_reader::read_tsv(text.as_bytes())?)),
        }
    }
}

/// Fetches and parses a dataset from a location.
pub trait DataLoader {
    fn load(&self, location: &str, format: SourceFormat) -> impl Future<Output = Result<Dataset>>;
}

/// Loads datasets from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    base_dir: Option<PathBuf>,
}

impl FileLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative locations against `dir`.
    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    fn path_for(&self, location: &str) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.join(location),
            None => PathBuf::from(location),
        }
    }
}

impl DataLoader for FileLoader {
    async fn load(&self, location: &str, format: SourceFormat) -> Result<Dataset> {
        let path = self.path_for(location);
        debug!(path = %path.display(), ?format, "reading data file");

        let load_error = |reason: String| ChartError::Load {
            location: location.to_string(),
            reason,
        };

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| load_error(e.to_string()))?;
        format.parse(&text).map_err(|e| load_error(e.to_string()))
    }
}

/// Start acquiring `source`.
///
/// The outer `Result` is decided immediately: an unsupported location fails
/// here and the loader is never called. The returned future resolves to the
/// dataset, loading it through `loader` when the source is a location.
pub fn acquire<'a, L>(
    source: DataSource,
    loader: &'a L,
) -> Result<impl Future<Output = Result<Dataset>> + 'a>
where
    L: DataLoader,
{
    let (ready, fetch) = match source {
        DataSource::Records(data) => (Some(data), None),
        DataSource::Record(map) => (Some(Dataset::from_record(&map)?), None),
        DataSource::Location(location) => {
            let format = SourceFormat::from_location(&location)?;
            (None, Some((location, format)))
        }
    };

    Ok(async move {
        match (ready, fetch) {
            (Some(data), _) => Ok(data),
            (None, Some((location, format))) => {
                info!(%location, ?format, "loading dataset");
                let data = loader.load(&location, format).await?;
                info!(%location, rows = data.len(), "dataset loaded");
                Ok(data)
            }
            (None, None) => Err(ChartError::InvalidData("No data source given".to_string())),
        }
    })
}
