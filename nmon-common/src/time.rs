//! Timestamp utilities
//!
//! Every timestamp is persisted as UTC text in the canonical form
//! `YYYY-MM-DDTHH:MM:SSZ`, so lexical order equals chronological order
//! and range filters can be pushed down to SQL string comparisons.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::{Error, Result};

/// Canonical storage format
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp in the canonical storage form
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp in any of the forms found in seed data and requests
///
/// Accepts RFC 3339 (any offset, converted to UTC) and naive
/// `YYYY-MM-DD HH:MM:SS[.fff]` / `YYYY-MM-DDTHH:MM:SS[.fff]`, which are
/// taken to be UTC already.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(Error::InvalidInput(format!("Unrecognized timestamp: {:?}", raw)))
}

/// Parse a date bound used by range filters
///
/// A bare `YYYY-MM-DD` expands to the start of the day, or to its last
/// second when `end_of_day` is set so the end date is inclusive.
pub fn parse_date_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        let time = if end_of_day {
            date.and_hms_opt(23, 59, 59)
        } else {
            date.and_hms_opt(0, 0, 0)
        };
        return time
            .map(|naive| Utc.from_utc_datetime(&naive))
            .ok_or_else(|| Error::InvalidInput(format!("Invalid date: {:?}", raw)));
    }
    parse_timestamp(raw)
}

/// Re-encode any accepted timestamp into the canonical storage form
pub fn normalize_timestamp(raw: &str) -> Result<String> {
    parse_timestamp(raw).map(format_timestamp)
}
