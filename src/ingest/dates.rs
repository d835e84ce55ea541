//! Lenient date/time parsing for spreadsheet cells
//!
//! Anything unparsable becomes `None`; ingestion never fails on a date.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%m/%d/%Y", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// Combine a date cell and an optional time cell into a UTC timestamp
///
/// The time of day comes only from the time cell; a missing time cell
/// means midnight. A present but unreadable time cell discards the whole
/// timestamp.
pub fn parse_timestamp(date: Option<&Value>, time: Option<&Value>) -> Option<DateTime<Utc>> {
    let date = parse_date(date?)?;
    let midnight = NaiveTime::from_hms_opt(0, 0, 0)?;

    let time = match time {
        None | Some(Value::Null) => midnight,
        Some(Value::String(s)) if is_blank(s) => midnight,
        Some(cell) => parse_time(cell)?,
    };

    Some(date.and_time(time).and_utc())
}

fn is_blank(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("nat")
}

fn parse_date(cell: &Value) -> Option<NaiveDate> {
    match cell {
        Value::String(s) => {
            let s = s.trim();
            if is_blank(s) {
                return None;
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.date_naive());
            }
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
                .or_else(|| {
                    DATE_FORMATS
                        .iter()
                        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                })
        }
        // Spreadsheet serial date (days since 1899-12-30)
        Value::Number(n) => {
            let serial = n.as_f64()?;
            if !(1.0..=2_958_465.0).contains(&serial) {
                return None;
            }
            let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
            epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
        }
        _ => None,
    }
}

fn parse_time(cell: &Value) -> Option<NaiveTime> {
    match cell {
        Value::String(s) => {
            let s = s.trim();
            TIME_FORMATS
                .iter()
                .find_map(|f| NaiveTime::parse_from_str(s, f).ok())
                .or_else(|| {
                    // Some exports put a full datetime in the time column
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                        .map(|dt| dt.time())
                })
        }
        // Spreadsheet fraction of a day
        Value::Number(n) => {
            let fraction = n.as_f64()?;
            if !(0.0..1.0).contains(&fraction) {
                return None;
            }
            let secs = (fraction * 86_400.0).round() as u32;
            NaiveTime::from_num_seconds_from_midnight_opt(secs.min(86_399), 0)
        }
        _ => None,
    }
}
