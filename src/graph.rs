use crate::chart::{Frame, Renderer};
use crate::config::{OutputFormat, RenderOptions};
use crate::error::ChartError;
use crate::parser::parse_color;
use crate::waffle::WaffleGrid;
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;

const LEGEND_PADDING: i32 = 10;
const LEGEND_ROW_HEIGHT: i32 = 20;
const SWATCH_SIZE: i32 = 12;

/// Largest canvas the renderer allocates, in pixels
pub const MAX_CANVAS_PIXELS: u64 = 40_000_000;

/// Draws waffle frames with plotters and keeps the last encoded image
#[derive(Debug, Clone, Default)]
pub struct PlottersRenderer {
    options: RenderOptions,
    output: Option<Vec<u8>>,
}

impl PlottersRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            output: None,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// The image produced by the last successful draw
    pub fn output(&self) -> Option<&[u8]> {
        self.output.as_deref()
    }

    pub fn take_output(&mut self) -> Option<Vec<u8>> {
        self.output.take()
    }

    /// Canvas size: the grid, plus a legend column on the right when enabled.
    /// Fails when the canvas would exceed [`MAX_CANVAS_PIXELS`].
    pub fn canvas_size(&self, frame: &Frame<WaffleGrid>) -> Result<(u32, u32)> {
        let grid = &frame.geometry;
        let too_large = || {
            anyhow::anyhow!(
                "Canvas for a {} x {} px grid exceeds the limit of {} pixels",
                grid.width,
                grid.height,
                MAX_CANVAS_PIXELS
            )
        };
        let to_pixels = |v: f64| -> Result<u32> {
            if v.is_finite() && v >= 0.0 && v <= u32::MAX as f64 {
                Ok(v.ceil() as u32)
            } else {
                Err(too_large())
            }
        };

        let mut width = to_pixels(grid.width)?;
        let mut height = to_pixels(grid.height)?;

        if self.options.legend {
            width = width
                .checked_add(self.options.legend_width)
                .ok_or_else(too_large)?;
            let rows = u32::try_from(frame.colors.len()).map_err(|_| too_large())?;
            let legend_height = rows
                .checked_mul(LEGEND_ROW_HEIGHT as u32)
                .and_then(|h| h.checked_add(2 * LEGEND_PADDING as u32))
                .ok_or_else(too_large)?;
            height = height.max(legend_height);
        }

        match (width as u64).checked_mul(height as u64) {
            Some(pixels) if pixels <= MAX_CANVAS_PIXELS => Ok((width, height)),
            _ => Err(too_large()),
        }
    }

    /// Encode `frame` in the configured format
    pub fn render(&self, frame: &Frame<WaffleGrid>) -> Result<Vec<u8>> {
        let (width, height) = self.canvas_size(frame)?;
        match self.options.format {
            OutputFormat::Png => self.render_png(frame, width, height),
            OutputFormat::Svg => self.render_svg(frame, width, height),
        }
    }

    fn render_png(&self, frame: &Frame<WaffleGrid>, width: u32, height: u32) -> Result<Vec<u8>> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .context("Canvas buffer size overflows")?;
        let mut buffer = vec![0u8; len];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            draw_waffle(&root, frame, self.options.legend)?;
            root.present().context("Failed to present drawing")?;
        }

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, width, height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }

    fn render_svg(&self, frame: &Frame<WaffleGrid>, width: u32, height: u32) -> Result<Vec<u8>> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
            draw_waffle(&root, frame, self.options.legend)?;
            root.present().context("Failed to present drawing")?;
        }
        Ok(svg.into_bytes())
    }
}

impl Renderer<WaffleGrid> for PlottersRenderer {
    fn draw(&mut self, frame: &Frame<WaffleGrid>) -> crate::error::Result<()> {
        let bytes = self
            .render(frame)
            .map_err(|e| ChartError::Render(format!("{:#}", e)))?;
        self.output = Some(bytes);
        Ok(())
    }
}

fn draw_waffle<DB>(
    root: &DrawingArea<DB, Shift>,
    frame: &Frame<WaffleGrid>,
    legend: bool,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    let grid = &frame.geometry;
    for square in &grid.squares {
        let color = category_color(frame, &square.category)?;
        let x0 = square.x.round() as i32;
        let y0 = square.y.round() as i32;
        let x1 = (square.x + square.size).round() as i32;
        let y1 = (square.y + square.size).round() as i32;
        root.draw(&Rectangle::new([(x0, y0), (x1, y1)], color.filled()))
            .context("Failed to draw square")?;
    }

    // Legend rows follow the grid's fill order
    if legend {
        let left = grid.width.ceil() as i32 + LEGEND_PADDING;
        for (i, category) in grid.categories().enumerate() {
            let color = category_color(frame, category)?;
            let top = LEGEND_PADDING + i as i32 * LEGEND_ROW_HEIGHT;
            root.draw(&Rectangle::new(
                [(left, top), (left + SWATCH_SIZE, top + SWATCH_SIZE)],
                color.filled(),
            ))
            .context("Failed to draw legend swatch")?;
            root.draw(&Text::new(
                category.to_string(),
                (left + SWATCH_SIZE + 6, top),
                ("sans-serif", 14).into_font(),
            ))
            .context("Failed to draw legend label")?;
        }
    }

    Ok(())
}

fn category_color(frame: &Frame<WaffleGrid>, category: &str) -> Result<RGBColor> {
    let text = frame
        .colors
        .color_of(category)
        .with_context(|| format!("No colour assigned to category '{}'", category))?;
    let rgb = parse_color(text).with_context(|| format!("Invalid colour '{}'", text))?;
    Ok(RGBColor(rgb.r, rgb.g, rgb.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Chart;
    use crate::config::ChartConfig;
    use crate::data::Dataset;
    use serde_json::json;

    fn fruit() -> Dataset {
        Dataset::from_json(&json!([
            {"fruit": "apple", "count": 6},
            {"fruit": "pear", "count": 3},
            {"fruit": "plum", "count": 1},
        ]))
        .unwrap()
    }

    fn config() -> ChartConfig {
        ChartConfig::default()
            .with_num_columns(5)
            .with_num_rows(2)
            .with_square_size(10.0)
    }

    #[test]
    fn test_render_png_without_legend() {
        let renderer = PlottersRenderer::new(RenderOptions {
            legend: false,
            ..Default::default()
        });
        let mut chart = Chart::waffle(config(), renderer);
        chart.build(fruit()).unwrap();

        let bytes = chart.renderer().output().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let img = image::load_from_memory(bytes).unwrap();
        assert_eq!(img.width(), 50);
        assert_eq!(img.height(), 20);
    }

    #[test]
    fn test_render_svg_with_legend() {
        let renderer = PlottersRenderer::new(RenderOptions {
            format: OutputFormat::Svg,
            ..Default::default()
        });
        let mut chart = Chart::waffle(config(), renderer);
        chart.build(fruit()).unwrap();

        let svg = String::from_utf8(chart.into_renderer().take_output().unwrap()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("apple"));
        assert!(svg.contains("plum"));
        // background + ten squares + three swatches
        assert!(svg.matches("<rect").count() >= 14);
    }

    #[test]
    fn test_canvas_size_fits_legend() {
        let renderer = PlottersRenderer::new(RenderOptions {
            format: OutputFormat::Svg,
            ..Default::default()
        });
        let mut chart = Chart::waffle(config().with_num_rows(1), renderer);
        let frame = chart.build(fruit()).unwrap().clone();

        let (w, h) = chart.renderer().canvas_size(&frame).unwrap();
        assert_eq!(w, 50 + 160);
        // three legend rows are taller than a single grid row
        assert_eq!(h, (2 * LEGEND_PADDING + 3 * LEGEND_ROW_HEIGHT) as u32);
    }

    #[test]
    fn test_oversized_canvas_is_an_error() {
        // 200 x 40 squares of 1000 px: a valid grid, far too many pixels
        let config = ChartConfig::default()
            .with_num_columns(200)
            .with_num_rows(40)
            .with_square_size(1000.0);
        assert!(config.validate().is_ok());

        let mut chart = Chart::waffle(config, PlottersRenderer::new(RenderOptions::default()));
        let res = chart.build(fruit());
        match res {
            Err(ChartError::Render(msg)) => assert!(msg.contains("exceeds the limit")),
            other => panic!("Expected Render error, got {:?}", other),
        }
        assert!(chart.frame().is_none());
        assert!(chart.renderer().output().is_none());
    }

    #[test]
    fn test_legend_follows_grid_order() {
        let renderer = PlottersRenderer::new(RenderOptions {
            format: OutputFormat::Svg,
            ..Default::default()
        });
        let mut chart = Chart::waffle(config(), renderer);
        chart.build(fruit()).unwrap();

        // Same categories, pear seen first this time
        let reordered = Dataset::from_json(&json!([
            {"fruit": "pear", "count": 3},
            {"fruit": "apple", "count": 6},
            {"fruit": "plum", "count": 1},
        ]))
        .unwrap();
        let frame = chart.build(reordered).unwrap();
        assert_eq!(frame.geometry.category_at(0, 0), Some("pear"));

        let svg = String::from_utf8(chart.renderer().output().unwrap().to_vec()).unwrap();
        let pear = svg.find("pear").unwrap();
        let apple = svg.find("apple").unwrap();
        assert!(pear < apple, "legend should list pear before apple");
    }

    #[test]
    fn test_category_color_rejects_unknown() {
        let mut chart = Chart::waffle(
            config(),
            PlottersRenderer::new(RenderOptions {
                format: OutputFormat::Svg,
                legend: false,
                ..Default::default()
            }),
        );
        let frame = chart.build(fruit()).unwrap();
        assert!(category_color(frame, "apple").is_ok());
        assert!(category_color(frame, "kiwi").is_err());
    }
}
