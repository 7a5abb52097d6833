//! Column coercion into typed values.
//!
//! Both coercions return a new dataset. Date coercion converts the whole
//! column before building the result, so a failure leaves the caller's
//! dataset exactly as it was.

use crate::data::{Dataset, Value};
use crate::error::{ChartError, Result};
use crate::temporal;
use tracing::{debug, warn};

/// Replace every value in `column` with its numeric form. Values that are not
/// numbers become NaN.
pub fn coerce_numbers(data: &Dataset, column: &str) -> Result<Dataset> {
    let idx = data.require_column(column)?;
    let values: Vec<Value> = data
        .column(column)?
        .map(|v| match v {
            Value::Number(_) => v.clone(),
            other => Value::Number(other.to_number()),
        })
        .collect();

    let nan_count = values
        .iter()
        .filter(|v| matches!(v, Value::Number(n) if n.is_nan()))
        .count();
    debug!(column, rows = values.len(), nan_count, "coerced column to numbers");

    Ok(data.with_column(idx, values))
}

/// Replace every value in `column` with a parsed date.
///
/// With `format` each value is parsed under it; otherwise the generic parser
/// is used and numbers are read as epoch milliseconds. Values that are
/// already dates are kept.
pub fn coerce_dates(data: &Dataset, column: &str, format: Option<&str>) -> Result<Dataset> {
    let idx = data.require_column(column)?;

    let mut values = Vec::with_capacity(data.len());
    for (row, value) in data.column(column)?.enumerate() {
        match parse_date(value, format) {
            Some(dt) => values.push(Value::Date(dt)),
            None => {
                warn!(column, row, value = %value, "value is not a valid date");
                return Err(ChartError::DateCoercion {
                    column: column.to_string(),
                    row,
                    value: value.label(),
                });
            }
        }
    }

    debug!(column, rows = values.len(), ?format, "coerced column to dates");
    Ok(data.with_column(idx, values))
}

fn parse_date(value: &Value, format: Option<&str>) -> Option<chrono::NaiveDateTime> {
    match (value, format) {
        (Value::Date(dt), _) => Some(*dt),
        (other, Some(fmt)) => temporal::parse_with_format(&other.label(), fmt),
        (Value::Number(ms), None) => temporal::from_epoch_millis(*ms),
        (other, None) => temporal::parse_generic(&other.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset() -> Dataset {
        Dataset::from_json(&json!([
            {"cat": "a", "val": "10", "when": "2020-01-01"},
            {"cat": "b", "val": "x", "when": "not-a-date"},
        ]))
        .unwrap()
    }

    #[test]
    fn test_coerce_numbers() {
        let data = dataset();
        let coerced = coerce_numbers(&data, "val").unwrap();
        assert_eq!(coerced.rows[0][1], Value::Number(10.0));
        assert!(matches!(coerced.rows[1][1], Value::Number(n) if n.is_nan()));
        // Other columns untouched, original untouched
        assert_eq!(coerced.rows[0][0], Value::Text("a".to_string()));
        assert_eq!(data.rows[0][1], Value::Text("10".to_string()));
    }

    #[test]
    fn test_coerce_numbers_idempotent() {
        let data = Dataset::from_json(&json!([{"v": "1.5"}, {"v": 2}])).unwrap();
        let once = coerce_numbers(&data, "v").unwrap();
        let twice = coerce_numbers(&once, "v").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_coerce_numbers_missing_column() {
        let res = coerce_numbers(&dataset(), "nope");
        assert!(matches!(res, Err(ChartError::ColumnNotFound(_))));
    }

    #[test]
    fn test_coerce_dates_failure_is_atomic() {
        let data = dataset();
        let before = data.clone();
        let err = coerce_dates(&data, "when", None).unwrap_err();
        match err {
            ChartError::DateCoercion { column, row, value } => {
                assert_eq!(column, "when");
                assert_eq!(row, 1);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("Expected DateCoercion, got {:?}", other),
        }
        assert_eq!(data, before);
    }

    #[test]
    fn test_coerce_dates_generic() {
        let data = Dataset::from_json(&json!([
            {"d": "2020-01-01"},
            {"d": "2020/02/01"},
        ]))
        .unwrap();
        let coerced = coerce_dates(&data, "d", None).unwrap();
        let first = coerced.rows[0][0].as_date().unwrap();
        assert_eq!(first.to_string(), "2020-01-01 00:00:00");
        assert!(coerced.rows[1][0].as_date().is_some());
    }

    #[test]
    fn test_coerce_dates_with_format() {
        let data = Dataset::from_json(&json!([{"d": "02/01/2020"}])).unwrap();
        let coerced = coerce_dates(&data, "d", Some("%d/%m/%Y")).unwrap();
        assert_eq!(coerced.rows[0][0].label(), "2020-01-02");

        let res = coerce_dates(&data, "d", Some("%Y-%m-%d"));
        assert!(matches!(res, Err(ChartError::DateCoercion { .. })));
    }

    #[test]
    fn test_coerce_dates_idempotent() {
        let data = Dataset::from_json(&json!([{"d": "2021-06-01"}])).unwrap();
        let once = coerce_dates(&data, "d", None).unwrap();
        let twice = coerce_dates(&once, "d", Some("%Y")).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_coerce_dates_from_epoch_millis() {
        let data = Dataset::from_json(&json!([{"d": 1577836800000_i64}])).unwrap();
        let coerced = coerce_dates(&data, "d", None).unwrap();
        assert_eq!(coerced.rows[0][0].label(), "2020-01-01");
    }
}
