use crate::data::{Dataset, Value};
use crate::error::{ChartError, Result};
use crate::infer::DomainKind;
use chrono::NaiveDateTime;
use std::collections::HashSet;
use tracing::debug;

/// Concrete domain of a scale, ready for axis construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleDomain {
    /// Distinct values in first-seen order
    Ordinal(Vec<String>),
    Linear { min: f64, max: f64 },
    Temporal { min: NaiveDateTime, max: NaiveDateTime },
}

impl ScaleDomain {
    pub fn kind(&self) -> DomainKind {
        match self {
            ScaleDomain::Ordinal(_) => DomainKind::Ordinal,
            ScaleDomain::Linear { .. } => DomainKind::Linear,
            ScaleDomain::Temporal { .. } => DomainKind::Temporal,
        }
    }

    /// Categories of an ordinal domain; empty for continuous domains.
    pub fn categories(&self) -> &[String] {
        match self {
            ScaleDomain::Ordinal(cats) => cats,
            _ => &[],
        }
    }
}

/// Compute the domain of `column` for a scale of `kind`.
///
/// Linear domains read values numerically and temporal domains expect the
/// column to be coerced to dates; values that do not convert (NaN, non-dates)
/// are skipped. A continuous column with no usable value, or a request for
/// an `Unknown` kind, is an error.
pub fn resolve(data: &Dataset, column: &str, kind: DomainKind) -> Result<ScaleDomain> {
    let values = data.column(column)?;

    let domain = match kind {
        DomainKind::Ordinal => ScaleDomain::Ordinal(distinct_labels(values)),
        DomainKind::Linear => {
            let mm = calculate_min_max(values.map(Value::to_number).filter(|n| !n.is_nan()));
            let (min, max) = mm.ok_or_else(|| unresolved(column, kind))?;
            ScaleDomain::Linear { min, max }
        }
        DomainKind::Temporal => {
            let mut range: Option<(NaiveDateTime, NaiveDateTime)> = None;
            for dt in values.filter_map(Value::as_date) {
                range = Some(match range {
                    Some((min, max)) => (min.min(*dt), max.max(*dt)),
                    None => (*dt, *dt),
                });
            }
            let (min, max) = range.ok_or_else(|| unresolved(column, kind))?;
            ScaleDomain::Temporal { min, max }
        }
        DomainKind::Unknown => return Err(unresolved(column, kind)),
    };

    debug!(column, %kind, ?domain, "resolved scale domain");
    Ok(domain)
}

fn unresolved(column: &str, kind: DomainKind) -> ChartError {
    ChartError::UnresolvedDomain {
        column: column.to_string(),
        kind,
    }
}

fn distinct_labels<'a, I>(values: I) -> Vec<String>
where
    I: Iterator<Item = &'a Value>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut order = Vec::new();
    for value in values {
        let label = value.label();
        if seen.insert(label.clone()) {
            order.push(label);
        }
    }
    order
}

fn calculate_min_max<I>(iter: I) -> Option<(f64, f64)>
where
    I: Iterator<Item = f64>,
{
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut any = false;

    for val in iter {
        any = true;
        if val < min { min = val; }
        if val > max { max = val; }
    }

    if any { Some((min, max)) } else { None }
}
