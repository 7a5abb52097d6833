use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wafflegraph::parser::parse_color_list;
use wafflegraph::{
    csv_reader, Chart, ChartConfig, DataSource, Dataset, FileLoader, OutputFormat,
    PlottersRenderer, RenderOptions,
};

#[derive(Parser, Debug)]
#[command(name = "wafflegraph")]
#[command(about = "Generate waffle charts from CSV, TSV or JSON data", long_about = None)]
struct Args {
    /// Data file (.csv, .tsv, .json) or inline JSON records. Reads CSV from stdin when omitted or '-'
    input: Option<String>,

    /// JSON file with chart options (numColumns, squareSize, colors, ...)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Column holding the values
    #[arg(long)]
    value: Option<String>,

    /// Column holding the categories
    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    columns: Option<u32>,

    #[arg(long)]
    rows: Option<u32>,

    /// Container width in pixels; the column count is derived from it
    #[arg(long)]
    width: Option<f64>,

    /// Container height in pixels; the row count is derived from it
    #[arg(long)]
    height: Option<f64>,

    #[arg(long)]
    square_size: Option<f64>,

    #[arg(long)]
    gap: Option<f64>,

    /// Value each square stands for (default: total / squares)
    #[arg(long)]
    square_value: Option<f64>,

    /// Comma-separated colours, e.g. '#1f77b4, orange, rgb(0, 128, 0)'
    #[arg(long)]
    colors: Option<String>,

    /// chrono format for temporal category columns, e.g. '%Y-%m-%d'
    #[arg(long)]
    time_format: Option<String>,

    #[arg(long, value_enum, default_value_t = ImageFormat::Png)]
    format: ImageFormat,

    #[arg(long)]
    no_legend: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ImageFormat {
    Png,
    Svg,
}

impl From<ImageFormat> for OutputFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => OutputFormat::Png,
            ImageFormat::Svg => OutputFormat::Svg,
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the image
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;
    debug!(?config, "chart configuration");

    let options = RenderOptions {
        format: args.format.into(),
        legend: !args.no_legend,
        ..Default::default()
    };
    let mut chart = Chart::waffle(config, PlottersRenderer::new(options));

    match args.input.as_deref() {
        None | Some("-") => {
            let csv_data =
                csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin")?;
            chart
                .build(Dataset::from_csv_data(csv_data))
                .context("Failed to build chart")?;
        }
        Some(input) => {
            let source = DataSource::from_raw(input).context("Failed to read input")?;
            let loader = FileLoader::new();
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to start runtime")?;

            let pending = chart
                .build_from(source, &loader)
                .with_context(|| format!("Cannot load '{}'", input))?;
            runtime.block_on(pending).context("Failed to build chart")?;
        }
    }

    let image_bytes = chart
        .into_renderer()
        .take_output()
        .context("Renderer produced no output")?;

    // Write image to stdout
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(&image_bytes)
        .context("Failed to write image to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

/// Config file first, then command line flags on top
fn build_config(args: &Args) -> Result<ChartConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            ChartConfig::from_json_str(&text)?
        }
        None => ChartConfig::default(),
    };

    if let Some(value) = &args.value {
        config = config.with_value_column(value);
    }
    if let Some(category) = &args.category {
        config = config.with_category_column(category);
    }
    if let Some(width) = args.width {
        config = config.with_width(width);
    }
    if let Some(height) = args.height {
        config = config.with_height(height);
    }
    if let Some(columns) = args.columns {
        config = config.with_num_columns(columns);
    }
    if let Some(rows) = args.rows {
        config = config.with_num_rows(rows);
    }
    if let Some(size) = args.square_size {
        config = config.with_square_size(size);
    }
    if let Some(gap) = args.gap {
        config = config.with_gap(gap);
    }
    if let Some(square_value) = args.square_value {
        config = config.with_square_value(square_value);
    }
    if let Some(colors) = &args.colors {
        config = config.with_colors(parse_color_list(colors)?);
    }
    if let Some(format) = &args.time_format {
        config = config.with_time_format(format);
    }

    config.validate()?;
    Ok(config)
}
