//! Chart configuration.
//!
//! `ChartConfig` is a plain value. Each `with_*` step consumes the config and
//! returns the changed copy, so options chain without any shared chart state:
//!
//! ```
//! use wafflegraph::config::ChartConfig;
//!
//! let config = ChartConfig::default()
//!     .with_value_column("count")
//!     .with_category_column("fruit")
//!     .with_num_columns(10)
//!     .with_square_size(20.0);
//! assert_eq!(config.num_columns, Some(10));
//! ```

use crate::error::{ChartError, Result};
use crate::parser::parse_color;
use crate::waffle::Extent;
use serde::Deserialize;

/// Columns used when neither a count nor a container width is given.
pub const DEFAULT_COLUMNS: u32 = 20;
pub const DEFAULT_ROWS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartConfig {
    pub num_columns: Option<u32>,
    pub num_rows: Option<u32>,
    /// Container width in pixels
    pub width: Option<f64>,
    /// Container height in pixels
    pub height: Option<f64>,
    pub square_size: f64,
    pub gap: f64,
    pub square_value: Option<f64>,
    pub colors: Option<Vec<String>>,
    pub value_column: Option<String>,
    pub category_column: Option<String>,
    pub time_format: Option<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            num_columns: None,
            num_rows: None,
            width: None,
            height: None,
            square_size: 25.0,
            gap: 1.0,
            square_value: None,
            colors: None,
            value_column: None,
            category_column: None,
            time_format: None,
        }
    }
}

impl ChartConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| ChartError::InvalidConfig(format!("Failed to parse config: {}", e)))
    }

    pub fn with_num_columns(mut self, columns: u32) -> Self {
        self.num_columns = Some(columns);
        self
    }

    pub fn with_num_rows(mut self, rows: u32) -> Self {
        self.num_rows = Some(rows);
        self
    }

    /// Size the grid from a container width. Clears an explicit column count.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self.num_columns = None;
        self
    }

    /// Size the grid from a container height. Clears an explicit row count.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self.num_rows = None;
        self
    }

    pub fn with_square_size(mut self, size: f64) -> Self {
        self.square_size = size;
        self
    }

    pub fn with_gap(mut self, gap: f64) -> Self {
        self.gap = gap;
        self
    }

    pub fn with_square_value(mut self, value: f64) -> Self {
        self.square_value = Some(value);
        self
    }

    pub fn with_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors = Some(colors.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_value_column(mut self, column: impl Into<String>) -> Self {
        self.value_column = Some(column.into());
        self
    }

    pub fn with_category_column(mut self, column: impl Into<String>) -> Self {
        self.category_column = Some(column.into());
        self
    }

    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = Some(format.into());
        self
    }

    /// Grid extent along the horizontal axis: explicit count, else container
    /// width, else the default column count.
    pub fn column_extent(&self) -> Extent {
        match (self.num_columns, self.width) {
            (Some(n), _) => Extent::Cells(n),
            (None, Some(w)) => Extent::Pixels(w),
            (None, None) => Extent::Cells(DEFAULT_COLUMNS),
        }
    }

    pub fn row_extent(&self) -> Extent {
        match (self.num_rows, self.height) {
            (Some(n), _) => Extent::Cells(n),
            (None, Some(h)) => Extent::Pixels(h),
            (None, None) => Extent::Cells(DEFAULT_ROWS),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_columns == Some(0) {
            return Err(invalid("numColumns must be greater than 0"));
        }
        if self.num_rows == Some(0) {
            return Err(invalid("numRows must be greater than 0"));
        }
        if !self.square_size.is_finite() || self.square_size <= 0.0 {
            return Err(invalid("squareSize must be a positive number"));
        }
        if !self.gap.is_finite() || self.gap < 0.0 {
            return Err(invalid("gap must be 0 or more"));
        }
        if self.gap >= self.square_size {
            return Err(invalid("gap must be smaller than squareSize"));
        }
        if let Some(v) = self.square_value {
            if !v.is_finite() || v <= 0.0 {
                return Err(invalid("squareValue must be a positive number"));
            }
        }
        for (name, dim) in [("width", self.width), ("height", self.height)] {
            if let Some(px) = dim {
                if !px.is_finite() || px < 0.0 {
                    return Err(invalid(&format!("{} must be a non-negative number", name)));
                }
            }
        }
        if let Some(colors) = &self.colors {
            if colors.is_empty() {
                return Err(invalid("colors must not be empty"));
            }
            if let Some(bad) = colors.iter().find(|c| parse_color(c).is_none()) {
                return Err(invalid(&format!("'{}' is not a colour", bad)));
            }
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ChartError {
    ChartError::InvalidConfig(msg.to_string())
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

/// Options for the image renderer
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RenderOptions {
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
    #[serde(default = "default_legend")]
    pub legend: bool,
    #[serde(default = "default_legend_width")]
    pub legend_width: u32,
}

fn default_legend() -> bool { true }
fn default_legend_width() -> u32 { 160 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            legend: true,
            legend_width: 160,
        }
    }
}
