//! Time-of-day buckets used by hotspot ranking and incident reports

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Time-of-day bucket
///
/// Variant order is chronological through the day and is used as the
/// final tie-break when ranking hotspots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "night(00-06)")]
    Night,
    #[serde(rename = "morning(06-09)")]
    Morning,
    #[serde(rename = "day(09-17)")]
    Day,
    #[serde(rename = "evening(17-22)")]
    Evening,
    #[serde(rename = "late(22-24)")]
    Late,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 5] = [
        TimeWindow::Night,
        TimeWindow::Morning,
        TimeWindow::Day,
        TimeWindow::Evening,
        TimeWindow::Late,
    ];

    /// Bucket for an hour of the day (0-23)
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=8 => TimeWindow::Morning,
            9..=16 => TimeWindow::Day,
            17..=21 => TimeWindow::Evening,
            22..=23 => TimeWindow::Late,
            _ => TimeWindow::Night,
        }
    }

    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        Self::from_hour(ts.hour())
    }

    /// Canonical label, e.g. `morning(06-09)`
    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::Night => "night(00-06)",
            TimeWindow::Morning => "morning(06-09)",
            TimeWindow::Day => "day(09-17)",
            TimeWindow::Evening => "evening(17-22)",
            TimeWindow::Late => "late(22-24)",
        }
    }

    /// Parse a loose label as typed by users or found in older seed files
    ///
    /// Returns `None` for blank or unknown labels so the caller can fall
    /// back to the bucket of the submission timestamp.
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let value = raw.trim().to_lowercase();
        match value.as_str() {
            "morning" | "morning(06-09)" => Some(TimeWindow::Morning),
            "afternoon" | "day" | "day(09-17)" => Some(TimeWindow::Day),
            "evening" | "evening(17-22)" => Some(TimeWindow::Evening),
            "late" | "late(22-24)" => Some(TimeWindow::Late),
            "night" | "night(00-06)" => Some(TimeWindow::Night),
            _ => None,
        }
    }

    /// Resolve an optional user-supplied label, defaulting to the bucket of `ts`
    pub fn resolve(raw: Option<&str>, ts: DateTime<Utc>) -> Self {
        raw.and_then(Self::parse_loose)
            .unwrap_or_else(|| Self::from_timestamp(ts))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_loose(s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown time window: {:?}", s)))
    }
}
