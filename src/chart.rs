//! Chart pipeline.
//!
//! A [`Chart`] owns a configuration, a layout strategy and a renderer. Each
//! build types the data, resolves the domains, lays out the geometry and
//! draws it. Nothing is committed until every step has succeeded, so a
//! failing build or update leaves the previous frame in place.

use crate::coerce;
use crate::config::ChartConfig;
use crate::data::Dataset;
use crate::error::{ChartError, Result};
use crate::infer::{self, DomainKind};
use crate::palette::CategoryColorMap;
use crate::scale::{self, ScaleDomain};
use crate::source::{acquire, DataLoader, DataSource};
use crate::waffle::{self, WaffleGrid, WaffleParams};
use std::fmt::Debug;
use std::future::Future;
use tracing::{debug, info};

/// The columns a chart reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    pub category: String,
    pub value: String,
}

impl ColumnRoles {
    /// Take the columns named in `config`, or infer them: the first ordinal
    /// column is the category and the first linear column the value.
    pub fn resolve(data: &Dataset, config: &ChartConfig) -> Result<Self> {
        let category = match &config.category_column {
            Some(name) => data.headers[data.require_column(name)?].clone(),
            None => infer::first_ordinal_column(data)
                .ok_or(ChartError::NoColumnOfKind {
                    kind: DomainKind::Ordinal,
                })?
                .to_string(),
        };
        let value = match &config.value_column {
            Some(name) => data.headers[data.require_column(name)?].clone(),
            None => infer::first_linear_column(data)
                .ok_or(ChartError::NoColumnOfKind {
                    kind: DomainKind::Linear,
                })?
                .to_string(),
        };
        debug!(%category, %value, "resolved column roles");
        Ok(Self { category, value })
    }
}

/// Everything a renderer needs for one drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<G> {
    pub roles: ColumnRoles,
    pub category_domain: ScaleDomain,
    pub value_domain: ScaleDomain,
    pub geometry: G,
    pub colors: CategoryColorMap,
}

/// Turns typed data into chart geometry.
pub trait LayoutStrategy {
    type Geometry: Clone + Debug;

    fn name(&self) -> &'static str;

    fn layout(
        &self,
        data: &Dataset,
        roles: &ColumnRoles,
        config: &ChartConfig,
    ) -> Result<Self::Geometry>;
}

/// Draws a frame.
pub trait Renderer<G> {
    fn draw(&mut self, frame: &Frame<G>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WaffleStrategy;

impl LayoutStrategy for WaffleStrategy {
    type Geometry = WaffleGrid;

    fn name(&self) -> &'static str {
        "waffle"
    }

    fn layout(
        &self,
        data: &Dataset,
        roles: &ColumnRoles,
        config: &ChartConfig,
    ) -> Result<WaffleGrid> {
        let params = WaffleParams {
            columns: config.column_extent(),
            rows: config.row_extent(),
            square_size: config.square_size,
            gap: config.gap,
            square_value: config.square_value,
            value_column: &roles.value,
            category_column: &roles.category,
        };
        waffle::layout(data, &params)
    }
}

pub struct Chart<S: LayoutStrategy, R> {
    config: ChartConfig,
    strategy: S,
    renderer: R,
    /// Data as handed to `build`; relayouts start from it
    source: Option<Dataset>,
    /// Typed data behind the current frame
    data: Option<Dataset>,
    frame: Option<Frame<S::Geometry>>,
}

impl<R> Chart<WaffleStrategy, R>
where
    R: Renderer<WaffleGrid>,
{
    pub fn waffle(config: ChartConfig, renderer: R) -> Self {
        Self::new(config, WaffleStrategy, renderer)
    }
}

impl<S, R> Chart<S, R>
where
    S: LayoutStrategy,
    R: Renderer<S::Geometry>,
{
    pub fn new(config: ChartConfig, strategy: S, renderer: R) -> Self {
        Self {
            config,
            strategy,
            renderer,
            source: None,
            data: None,
            frame: None,
        }
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// The last committed frame
    pub fn frame(&self) -> Option<&Frame<S::Geometry>> {
        self.frame.as_ref()
    }

    /// The typed dataset behind the last committed frame
    pub fn data(&self) -> Option<&Dataset> {
        self.data.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Build and draw a chart for `data`.
    pub fn build(&mut self, data: Dataset) -> Result<&Frame<S::Geometry>> {
        let (typed, frame) = self.prepare(&data, &self.config)?;
        self.renderer.draw(&frame)?;
        info!(
            strategy = self.strategy.name(),
            rows = typed.len(),
            categories = frame.colors.len(),
            "chart built"
        );
        self.source = Some(data);
        self.data = Some(typed);
        Ok(&*self.frame.insert(frame))
    }

    /// Acquire `source` through `loader`, then build.
    ///
    /// An unsupported location fails here, before the loader is called.
    pub fn build_from<'a, L>(
        &'a mut self,
        source: DataSource,
        loader: &'a L,
    ) -> Result<impl Future<Output = Result<&'a Frame<S::Geometry>>> + 'a>
    where
        L: DataLoader,
    {
        let pending = acquire(source, loader)?;
        Ok(async move {
            let data = pending.await?;
            self.build(data)
        })
    }

    pub fn set_num_columns(&mut self, columns: u32) -> Result<Option<&Frame<S::Geometry>>> {
        let config = self.config.clone().with_num_columns(columns);
        self.apply(config)
    }

    pub fn set_num_rows(&mut self, rows: u32) -> Result<Option<&Frame<S::Geometry>>> {
        let config = self.config.clone().with_num_rows(rows);
        self.apply(config)
    }

    pub fn set_square_size(&mut self, size: f64) -> Result<Option<&Frame<S::Geometry>>> {
        let config = self.config.clone().with_square_size(size);
        self.apply(config)
    }

    /// Derive the column count from a container width
    pub fn set_container_width(&mut self, width: f64) -> Result<Option<&Frame<S::Geometry>>> {
        let config = self.config.clone().with_width(width);
        self.apply(config)
    }

    pub fn set_container_height(&mut self, height: f64) -> Result<Option<&Frame<S::Geometry>>> {
        let config = self.config.clone().with_height(height);
        self.apply(config)
    }

    /// Replace the configuration through `f` and rebuild from scratch.
    pub fn reconfigure<F>(&mut self, f: F) -> Result<Option<&Frame<S::Geometry>>>
    where
        F: FnOnce(ChartConfig) -> ChartConfig,
    {
        let config = f(self.config.clone());
        self.apply(config)
    }

    /// Recolour the current categories, keeping their order. The geometry is
    /// redrawn as is.
    pub fn set_colors<I, C>(&mut self, colors: I) -> Result<Option<&Frame<S::Geometry>>>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let config = self.config.clone().with_colors(colors);
        config.validate()?;

        let Some(current) = self.frame.as_ref() else {
            self.config = config;
            return Ok(None);
        };

        let palette = config.colors.as_deref().unwrap_or_default();
        let frame = Frame {
            colors: current.colors.recolor(palette)?,
            ..current.clone()
        };
        self.renderer.draw(&frame)?;
        self.config = config;
        Ok(Some(&*self.frame.insert(frame)))
    }

    /// Commit `config`, relaying out the current data if there is any.
    fn apply(&mut self, config: ChartConfig) -> Result<Option<&Frame<S::Geometry>>> {
        config.validate()?;
        let Some(data) = self.source.as_ref() else {
            self.config = config;
            return Ok(None);
        };

        let (typed, frame) = self.prepare(data, &config)?;
        self.renderer.draw(&frame)?;
        debug!(strategy = self.strategy.name(), "chart relaid out");
        self.config = config;
        self.data = Some(typed);
        Ok(Some(&*self.frame.insert(frame)))
    }

    /// Run every step short of drawing, without touching chart state.
    fn prepare(
        &self,
        data: &Dataset,
        config: &ChartConfig,
    ) -> Result<(Dataset, Frame<S::Geometry>)> {
        config.validate()?;
        let roles = ColumnRoles::resolve(data, config)?;
        let format = config.time_format.as_deref();

        let mut typed = coerce::coerce_numbers(data, &roles.value)?;
        if infer::classify(&typed, &roles.category, format) == DomainKind::Temporal {
            typed = coerce::coerce_dates(&typed, &roles.category, format)?;
        }

        let category_domain = scale::resolve(&typed, &roles.category, DomainKind::Ordinal)?;
        let value_domain = scale::resolve(&typed, &roles.value, DomainKind::Linear)?;
        let colors = self.assign_colors(category_domain.categories(), config)?;
        let geometry = self.strategy.layout(&typed, &roles, config)?;

        let frame = Frame {
            roles,
            category_domain,
            value_domain,
            geometry,
            colors,
        };
        Ok((typed, frame))
    }

    /// Keep the previous colour assignment when the categories are the same,
    /// otherwise assign afresh; configured colours override the palette.
    fn assign_colors(&self, categories: &[String], config: &ChartConfig) -> Result<CategoryColorMap> {
        let base = match &self.frame {
            Some(previous) => previous.colors.reconcile(categories),
            None => CategoryColorMap::initialize(categories),
        };
        match &config.colors {
            Some(colors) if colors.as_slice() != base.palette() => base.recolor(colors),
            _ => Ok(base),
        }
    }
}
