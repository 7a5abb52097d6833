// Library exports for wafflegraph

pub mod csv_reader;
pub mod data;
pub mod error;
pub mod graph;
pub mod palette;
pub mod parser;
pub mod source;
pub mod temporal;

// Typing and layout
pub mod infer;
pub mod coerce;
pub mod scale;
pub mod waffle;

// Composition
pub mod config;
pub mod chart;

pub use chart::{Chart, ColumnRoles, Frame, LayoutStrategy, Renderer, WaffleStrategy};
pub use config::{ChartConfig, OutputFormat, RenderOptions};
pub use data::{Dataset, Value};
pub use error::{ChartError, Result};
pub use graph::PlottersRenderer;
pub use infer::DomainKind;
pub use palette::CategoryColorMap;
pub use scale::ScaleDomain;
pub use source::{acquire, DataLoader, DataSource, FileLoader, SourceFormat};
pub use waffle::WaffleGrid;
