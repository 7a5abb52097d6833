//! Date parsing for temporal columns.
//!
//! Two entry points mirror the two ways a column can be read as dates:
//! [`parse_with_format`] for an explicit strftime-style format (the `%`
//! directives of d3's time format are the same), and [`parse_generic`] which
//! accepts the common ISO, RFC and US-style spellings a browser date
//! constructor would.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d %b %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%a %b %d %Y",
];

/// Parse `input` with an explicit format string.
///
/// Formats that only describe part of a date are completed the way d3 does:
/// a missing day is the 1st, a missing month is January, and a time-only
/// format lands on 1900-01-01.
pub fn parse_with_format(input: &str, format: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, format) {
        return date.and_hms_opt(0, 0, 0);
    }

    // Partial dates: supply the day, then month and day.
    let with_day = NaiveDate::parse_from_str(&format!("{input}-01"), &format!("{format}-%d"));
    if let Ok(date) = with_day {
        return date.and_hms_opt(0, 0, 0);
    }
    let with_month = NaiveDate::parse_from_str(
        &format!("{input}-01-01"),
        &format!("{format}-%m-%d"),
    );
    if let Ok(date) = with_month {
        return date.and_hms_opt(0, 0, 0);
    }

    if let Ok(time) = NaiveTime::parse_from_str(input, format) {
        return NaiveDate::from_ymd_opt(1900, 1, 1).map(|d| d.and_time(time));
    }

    None
}

/// Parse `input` without a format, trying the usual textual date spellings.
pub fn parse_generic(input: &str) -> Option<NaiveDateTime> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    // ISO year-month and bare four digit years
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year: i32 = s.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
    }

    None
}

/// True when the text carries one of the separators a date string needs
/// before the generic parser is even attempted (space, `/` or `-`).
pub fn has_date_separator(s: &str) -> bool {
    s.contains(' ') || s.contains('/') || s.contains('-')
}

pub fn to_epoch_millis(dt: &NaiveDateTime) -> f64 {
    dt.and_utc().timestamp_millis() as f64
}

pub fn from_epoch_millis(ms: f64) -> Option<NaiveDateTime> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64).map(|dt| dt.naive_utc())
}

/// Display form of a date: the bare day when there is no time component.
pub fn format_label(dt: &NaiveDateTime) -> String {
    if dt.hour() == 0 && dt.minute() == 0 && dt.second() == 0 && dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_generic_iso_date() {
        assert_eq!(parse_generic("2020-01-01"), Some(ymd(2020, 1, 1)));
        assert_eq!(parse_generic(" 2020/02/03 "), Some(ymd(2020, 2, 3)));
        assert_eq!(parse_generic("03/04/2021"), Some(ymd(2021, 3, 4)));
    }

    #[test]
    fn test_generic_datetime() {
        let dt = parse_generic("2020-01-01 12:30:00").unwrap();
        assert_eq!(dt.hour(), 12);
        assert_eq!(dt.minute(), 30);

        let dt = parse_generic("2020-01-01T08:00:00Z").unwrap();
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn test_generic_partial_and_named() {
        assert_eq!(parse_generic("2020-05"), Some(ymd(2020, 5, 1)));
        assert_eq!(parse_generic("1999"), Some(ymd(1999, 1, 1)));
        assert_eq!(parse_generic("Jan 05 2021"), Some(ymd(2021, 1, 5)));
    }

    #[test]
    fn test_generic_rejects_garbage() {
        assert_eq!(parse_generic("not-a-date"), None);
        assert_eq!(parse_generic(""), None);
        assert_eq!(parse_generic("red"), None);
        assert_eq!(parse_generic("2020-13-45"), None);
    }

    #[test]
    fn test_with_format() {
        assert_eq!(
            parse_with_format("01/02/2020", "%d/%m/%Y"),
            Some(ymd(2020, 2, 1))
        );
        assert_eq!(parse_with_format("2020", "%Y"), Some(ymd(2020, 1, 1)));
        assert_eq!(parse_with_format("2020-07", "%Y-%m"), Some(ymd(2020, 7, 1)));
        assert_eq!(parse_with_format("2020-01-01", "%d/%m/%Y"), None);
    }

    #[test]
    fn test_with_time_only_format() {
        let dt = parse_with_format("13:45", "%H:%M").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(1900, 1, 1).unwrap());
        assert_eq!(dt.hour(), 13);
    }

    #[test]
    fn test_epoch_round_trip() {
        let dt = ymd(2020, 1, 1);
        let ms = to_epoch_millis(&dt);
        assert_eq!(ms, 1_577_836_800_000.0);
        assert_eq!(from_epoch_millis(ms), Some(dt));
        assert_eq!(from_epoch_millis(f64::NAN), None);
    }

    #[test]
    fn test_separator() {
        assert!(has_date_separator("2020-01-01"));
        assert!(has_date_separator("1/2/2020"));
        assert!(has_date_separator("Jan 5"));
        assert!(!has_date_separator("20200101"));
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(&ymd(2020, 1, 1)), "2020-01-01");
        let dt = parse_generic("2020-01-01 06:07:08").unwrap();
        assert_eq!(format_label(&dt), "2020-01-01 06:07:08");
    }
}
