//! Waffle grid layout.
//!
//! A waffle chart is a grid of equal squares, each standing for a fixed
//! amount of the value column. Squares are handed to categories in
//! first-seen order and filled row-major, so category one occupies the first
//! cells, category two the next ones, and so on.

use crate::data::Dataset;
use crate::error::{ChartError, Result};
use crate::infer::DomainKind;
use crate::scale::{self, ScaleDomain};
use std::collections::HashMap;
use tracing::{debug, info};

/// Largest grid `layout` will build, in squares.
pub const MAX_SQUARES: usize = 1_000_000;

/// How many squares fit along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    /// An explicit number of squares
    Cells(u32),
    /// Container pixels; the count is `floor(pixels / square_size)`
    Pixels(f64),
}

/// Inputs of a single layout run.
#[derive(Debug, Clone, PartialEq)]
pub struct WaffleParams<'a> {
    pub columns: Extent,
    pub rows: Extent,
    pub square_size: f64,
    pub gap: f64,
    /// Value represented by one square; `None` spreads the total over the grid
    pub square_value: Option<f64>,
    pub value_column: &'a str,
    pub category_column: &'a str,
}

/// Squares handed to one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub category: String,
    /// Sum of the value column over the category's records
    pub total: f64,
    pub squares: usize,
}

/// One cell of the grid, in row-major position `index`.
#[derive(Debug, Clone, PartialEq)]
pub struct Square {
    pub index: usize,
    pub row: u32,
    pub column: u32,
    /// Top-left corner in pixels
    pub x: f64,
    pub y: f64,
    /// Drawn side length (square size minus gap)
    pub size: f64,
    pub category: String,
    /// Data value this square stands for
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaffleGrid {
    pub columns: u32,
    pub rows: u32,
    pub square_size: f64,
    pub gap: f64,
    pub square_value: f64,
    pub width: f64,
    pub height: f64,
    pub allocations: Vec<Allocation>,
    pub squares: Vec<Square>,
}

impl WaffleGrid {
    pub fn total_squares(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Number of squares assigned to `category`
    pub fn count_for(&self, category: &str) -> usize {
        self.allocations
            .iter()
            .find(|a| a.category == category)
            .map(|a| a.squares)
            .unwrap_or(0)
    }

    pub fn category_at(&self, row: u32, column: u32) -> Option<&str> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        let index = row as usize * self.columns as usize + column as usize;
        self.squares.get(index).map(|s| s.category.as_str())
    }

    /// Categories in allocation order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.allocations.iter().map(|a| a.category.as_str())
    }
}

/// Lay out a waffle grid for `data`.
///
/// The value column is read numerically (NaN values are skipped) and the
/// category column supplies the ordinal domain. The run is a pure function
/// of its inputs: the same data and parameters always give the same grid.
pub fn layout(data: &Dataset, params: &WaffleParams<'_>) -> Result<WaffleGrid> {
    let square_size = params.square_size;
    if !square_size.is_finite() || square_size <= 0.0 {
        return Err(ChartError::InvalidConfig(format!(
            "Square size must be positive, got {}",
            square_size
        )));
    }
    if !params.gap.is_finite() || params.gap < 0.0 || params.gap >= square_size {
        return Err(ChartError::InvalidConfig(format!(
            "Gap must be at least 0 and smaller than the square size, got {}",
            params.gap
        )));
    }

    let columns = resolve_extent(params.columns, square_size, "columns")?;
    let rows = resolve_extent(params.rows, square_size, "rows")?;
    let total_squares = (columns as usize)
        .checked_mul(rows as usize)
        .filter(|&n| n <= MAX_SQUARES)
        .ok_or_else(|| {
            ChartError::InvalidConfig(format!(
                "Grid of {} x {} squares exceeds the limit of {} squares",
                columns, rows, MAX_SQUARES
            ))
        })?;

    let domain = scale::resolve(data, params.category_column, DomainKind::Ordinal)?;
    let totals = category_totals(data, params, &domain)?;
    let total_value: f64 = totals.iter().sum();

    if !(total_value > 0.0) {
        return Err(ChartError::DegenerateLayout(format!(
            "Total of column '{}' is {}; nothing to allocate",
            params.value_column, total_value
        )));
    }

    let square_value = params
        .square_value
        .unwrap_or(total_value / total_squares as f64);
    if !square_value.is_finite() || square_value <= 0.0 {
        return Err(ChartError::DegenerateLayout(format!(
            "Square value must be positive, got {}",
            square_value
        )));
    }

    let counts = allocate(&totals, square_value, total_squares);
    let allocations: Vec<Allocation> = domain
        .categories()
        .iter()
        .zip(totals.iter().zip(&counts))
        .map(|(category, (&total, &squares))| Allocation {
            category: category.clone(),
            total,
            squares,
        })
        .collect();

    let squares = place_squares(&allocations, columns, square_size, params.gap, square_value);

    info!(
        columns,
        rows,
        total_squares,
        square_value,
        categories = allocations.len(),
        "laid out waffle grid"
    );

    Ok(WaffleGrid {
        columns,
        rows,
        square_size,
        gap: params.gap,
        square_value,
        width: columns as f64 * square_size,
        height: rows as f64 * square_size,
        allocations,
        squares,
    })
}

fn resolve_extent(extent: Extent, square_size: f64, axis: &str) -> Result<u32> {
    let count = match extent {
        Extent::Cells(n) => n,
        Extent::Pixels(px) => {
            if !px.is_finite() || px < 0.0 {
                return Err(ChartError::InvalidConfig(format!(
                    "Container size for {} must be a non-negative number, got {}",
                    axis, px
                )));
            }
            (px / square_size).floor() as u32
        }
    };

    if count == 0 {
        return Err(ChartError::DegenerateLayout(format!(
            "Grid has no {} ({:?} at square size {})",
            axis, extent, square_size
        )));
    }
    Ok(count)
}

/// Per-category sums of the value column, indexed like the ordinal domain.
fn category_totals(
    data: &Dataset,
    params: &WaffleParams<'_>,
    domain: &ScaleDomain,
) -> Result<Vec<f64>> {
    let cat_idx = data.require_column(params.category_column)?;
    let val_idx = data.require_column(params.value_column)?;

    let positions: HashMap<&str, usize> = domain
        .categories()
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let mut totals = vec![0.0; positions.len()];
    for row in &data.rows {
        let (Some(cat), Some(val)) = (row.get(cat_idx), row.get(val_idx)) else {
            continue;
        };
        let value = val.to_number();
        if value.is_nan() {
            continue;
        }
        if let Some(&i) = positions.get(cat.label().as_str()) {
            totals[i] += value;
        }
    }

    debug!(?totals, "category totals");
    Ok(totals)
}

/// Squares per category: `round(total / square_value)` in order, never past
/// the grid, with the last category taking whatever remains so the counts sum
/// to `total_squares` exactly.
fn allocate(totals: &[f64], square_value: f64, total_squares: usize) -> Vec<usize> {
    let mut allocated = 0usize;
    let last = totals.len().saturating_sub(1);

    totals
        .iter()
        .enumerate()
        .map(|(i, &total)| {
            let remaining = total_squares - allocated;
            let count = if i == last {
                remaining
            } else {
                let raw = (total / square_value).round();
                let raw = if raw.is_finite() && raw > 0.0 { raw as usize } else { 0 };
                raw.min(remaining)
            };
            allocated += count;
            count
        })
        .collect()
}

fn place_squares(
    allocations: &[Allocation],
    columns: u32,
    square_size: f64,
    gap: f64,
    square_value: f64,
) -> Vec<Square> {
    let owners = allocations
        .iter()
        .flat_map(|a| std::iter::repeat(a.category.as_str()).take(a.squares));

    owners
        .enumerate()
        .map(|(index, category)| {
            let row = (index / columns as usize) as u32;
            let column = (index % columns as usize) as u32;
            Square {
                index,
                row,
                column,
                x: column as f64 * square_size,
                y: row as f64 * square_size,
                size: square_size - gap,
                category: category.to_string(),
                value: square_value,
            }
        })
        .collect()
}
