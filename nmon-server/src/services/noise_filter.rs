//! Observation filters parsed from query strings
//!
//! Parameters may repeat (`zones=Z01&zones=Z02`) or carry comma separated
//! lists (`zones=Z01,Z02`); both forms are accepted everywhere.

use chrono::{DateTime, Duration, Utc};
use nmon_common::models::NoiseSource;
use nmon_common::time::parse_date_bound;
use nmon_common::{normalize, Error, Result};

/// Preset look-back windows offered by the explore page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecentWindow {
    Last24Hours,
    Last7Days,
    Last4Weeks,
}

impl RecentWindow {
    /// Parse a preset label; unknown labels fall back to seven days
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "last 24 hours" => RecentWindow::Last24Hours,
            "last 4 weeks" => RecentWindow::Last4Weeks,
            _ => RecentWindow::Last7Days,
        }
    }

    pub fn duration(self) -> Duration {
        match self {
            RecentWindow::Last24Hours => Duration::hours(24),
            RecentWindow::Last7Days => Duration::days(7),
            RecentWindow::Last4Weeks => Duration::weeks(4),
        }
    }
}

/// Time restriction applied to observations
#[derive(Debug, Clone, PartialEq)]
pub enum DateRange {
    All,
    /// Window ending at the newest matching observation
    Recent(RecentWindow),
    /// Inclusive bounds
    Between {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoiseFilter {
    pub zones: Vec<String>,
    pub categories: Vec<String>,
    /// `None` means both sources
    pub source: Option<NoiseSource>,
    pub range: DateRange,
    pub limit: Option<i64>,
}

impl Default for NoiseFilter {
    fn default() -> Self {
        Self {
            zones: Vec::new(),
            categories: Vec::new(),
            source: None,
            range: DateRange::All,
            limit: None,
        }
    }
}

impl NoiseFilter {
    /// Build a filter from raw query pairs
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self> {
        let zones = multi_values(pairs, &["zones", "zone_id"])
            .iter()
            .map(|z| normalize::zone_id(z))
            .collect();
        let categories = multi_values(pairs, &["categories", "category"])
            .iter()
            .map(|c| normalize::category(c))
            .collect();

        let source = match single_value(pairs, "source") {
            Some(raw) => parse_source(raw)?,
            None => None,
        };

        let range = match single_value(pairs, "time_window") {
            Some(label) => DateRange::Recent(RecentWindow::from_label(label)),
            None => parse_date_range(
                single_value(pairs, "start_date"),
                single_value(pairs, "end_date"),
            )?,
        };

        let limit = match single_value(pairs, "limit") {
            Some(raw) => Some(parse_limit(raw)?),
            None => None,
        };

        Ok(Self {
            zones,
            categories,
            source,
            range,
            limit,
        })
    }
}

/// Collect every value given for any of `keys`, splitting comma lists
pub fn multi_values(pairs: &[(String, String)], keys: &[&str]) -> Vec<String> {
    pairs
        .iter()
        .filter(|(key, _)| keys.contains(&key.as_str()))
        .flat_map(|(_, value)| value.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// First non-blank value for `key`
pub fn single_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, v)| k == key && !v.trim().is_empty())
        .map(|(_, v)| v.trim())
}

fn parse_source(raw: &str) -> Result<Option<NoiseSource>> {
    match raw.trim().to_lowercase().as_str() {
        "both" | "all" => Ok(None),
        "sensor" | "sensors" => Ok(Some(NoiseSource::Sensor)),
        "report" | "reports" => Ok(Some(NoiseSource::Report)),
        other => Err(Error::InvalidInput(format!(
            "Invalid source {:?}: expected Both, Sensor or Reports",
            other
        ))),
    }
}

fn parse_date_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange> {
    match (start, end) {
        (None, None) => Ok(DateRange::All),
        (Some(start), Some(end)) => {
            let start = parse_date_bound(start, false)?;
            let end = parse_date_bound(end, true)?;
            if end < start {
                return Err(Error::InvalidInput(
                    "end_date must not be before start_date".to_string(),
                ));
            }
            Ok(DateRange::Between { start, end })
        }
        _ => Err(Error::InvalidInput(
            "start_date and end_date must be given together".to_string(),
        )),
    }
}

fn parse_limit(raw: &str) -> Result<i64> {
    match raw.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidInput(format!(
            "limit must be a positive integer, got {:?}",
            raw
        ))),
    }
}
