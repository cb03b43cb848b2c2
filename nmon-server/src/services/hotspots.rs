//! Hotspot ranking
//!
//! Buckets readings by zone and time window, scores every bucket that has
//! at least one reading, and ranks the buckets by severity:
//!
//! `severity = mean dB + 0.8 × validated reports`
//!
//! Nothing is stored; rankings are recomputed for every request.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use nmon_common::TimeWindow;
use serde::Serialize;

/// Severity added per validated report
pub const VALIDATED_REPORT_WEIGHT: f64 = 0.8;

/// Aggregated readings of one zone for one hour of the day
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyNoise {
    pub zone_id: String,
    pub hour: u32,
    pub total_db: f64,
    pub readings: i64,
}

/// Report counts of one zone for one time window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowReports {
    pub zone_id: String,
    pub time_window: TimeWindow,
    pub reports: i64,
    pub validated: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Hotspot {
    pub hotspot_id: String,
    pub zone_id: String,
    pub zone_name: String,
    pub time_window: TimeWindow,
    pub severity_score: f64,
    pub avg_noise_db: f64,
    pub observation_count: i64,
    pub report_count: i64,
    pub validated_report_count: i64,
    pub rationale: String,
}

#[derive(Default)]
struct Bucket {
    total_db: f64,
    readings: i64,
    reports: i64,
    validated: i64,
}

/// Rank zone/time-window buckets and return the `top` most severe
///
/// Sorted by severity descending, then zone id, then time of day.
pub fn rank_hotspots(
    noise: &[HourlyNoise],
    reports: &[WindowReports],
    zone_names: &HashMap<String, String>,
    top: usize,
) -> Vec<Hotspot> {
    let mut buckets: BTreeMap<(String, TimeWindow), Bucket> = BTreeMap::new();

    for row in noise {
        let bucket = buckets
            .entry((row.zone_id.clone(), TimeWindow::from_hour(row.hour)))
            .or_default();
        bucket.total_db += row.total_db;
        bucket.readings += row.readings;
    }

    for row in reports {
        // Report-only buckets are never ranked
        if let Some(bucket) = buckets.get_mut(&(row.zone_id.clone(), row.time_window)) {
            bucket.reports += row.reports;
            bucket.validated += row.validated;
        }
    }

    let mut ranked: Vec<Hotspot> = buckets
        .into_iter()
        .filter(|(_, bucket)| bucket.readings > 0)
        .map(|((zone_id, time_window), bucket)| {
            let avg_noise_db = round2(bucket.total_db / bucket.readings as f64);
            let severity_score = round2(
                bucket.total_db / bucket.readings as f64
                    + VALIDATED_REPORT_WEIGHT * bucket.validated as f64,
            );
            Hotspot {
                hotspot_id: String::new(),
                zone_name: zone_names
                    .get(&zone_id)
                    .cloned()
                    .unwrap_or_else(|| zone_id.clone()),
                rationale: format!(
                    "Average noise: {:.2} dB across {} readings | Validated reports: {}",
                    avg_noise_db, bucket.readings, bucket.validated
                ),
                zone_id,
                time_window,
                severity_score,
                avg_noise_db,
                observation_count: bucket.readings,
                report_count: bucket.reports,
                validated_report_count: bucket.validated,
            }
        })
        .collect();

    ranked.sort_by(compare_severity);
    ranked.truncate(top);

    for (rank, hotspot) in ranked.iter_mut().enumerate() {
        hotspot.hotspot_id = format!("H{:02}", rank + 1);
    }

    ranked
}

fn compare_severity(a: &Hotspot, b: &Hotspot) -> Ordering {
    b.severity_score
        .total_cmp(&a.severity_score)
        .then_with(|| a.zone_id.cmp(&b.zone_id))
        .then_with(|| a.time_window.cmp(&b.time_window))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(zone: &str, hour: u32, values: &[f64]) -> HourlyNoise {
        HourlyNoise {
            zone_id: zone.to_string(),
            hour,
            total_db: values.iter().sum(),
            readings: values.len() as i64,
        }
    }

    fn reports(zone: &str, window: TimeWindow, all: i64, validated: i64) -> WindowReports {
        WindowReports {
            zone_id: zone.to_string(),
            time_window: window,
            reports: all,
            validated,
        }
    }

    fn names() -> HashMap<String, String> {
        [("Z01", "Harbour"), ("Z02", "Market"), ("Z03", "Campus")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_severity_combines_noise_and_validated_reports() {
        let hotspots = rank_hotspots(
            &[noise("Z01", 7, &[60.0, 62.0])],
            &[reports("Z01", TimeWindow::Morning, 4, 3)],
            &names(),
            10,
        );
        assert_eq!(hotspots.len(), 1);
        let h = &hotspots[0];
        assert_eq!(h.hotspot_id, "H01");
        assert_eq!(h.zone_name, "Harbour");
        assert_eq!(h.time_window, TimeWindow::Morning);
        assert_eq!(h.avg_noise_db, 61.0);
        assert_eq!(h.severity_score, 63.4);
        assert_eq!(h.report_count, 4);
        assert_eq!(h.validated_report_count, 3);
        assert_eq!(
            h.rationale,
            "Average noise: 61.00 dB across 2 readings | Validated reports: 3"
        );
    }

    #[test]
    fn test_hours_merge_into_their_window() {
        // 09:00 and 16:00 are both in day(09-17)
        let hotspots = rank_hotspots(
            &[noise("Z02", 9, &[50.0]), noise("Z02", 16, &[70.0, 60.0])],
            &[],
            &names(),
            10,
        );
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].time_window, TimeWindow::Day);
        assert_eq!(hotspots[0].observation_count, 3);
        assert_eq!(hotspots[0].avg_noise_db, 60.0);
    }

    #[test]
    fn test_sorted_descending_with_zone_tie_break() {
        let hotspots = rank_hotspots(
            &[
                noise("Z03", 1, &[65.0]),
                noise("Z01", 12, &[65.0]),
                noise("Z02", 18, &[70.0]),
                noise("Z01", 2, &[65.0]),
            ],
            &[],
            &names(),
            10,
        );
        let order: Vec<(&str, TimeWindow)> = hotspots
            .iter()
            .map(|h| (h.zone_id.as_str(), h.time_window))
            .collect();
        assert_eq!(
            order,
            vec![
                ("Z02", TimeWindow::Evening),
                ("Z01", TimeWindow::Night),
                ("Z01", TimeWindow::Day),
                ("Z03", TimeWindow::Night),
            ]
        );
        for pair in hotspots.windows(2) {
            assert!(pair[0].severity_score >= pair[1].severity_score);
        }
        let ids: Vec<&str> = hotspots.iter().map(|h| h.hotspot_id.as_str()).collect();
        assert_eq!(ids, vec!["H01", "H02", "H03", "H04"]);
    }

    #[test]
    fn test_reports_without_readings_are_not_ranked() {
        let hotspots = rank_hotspots(
            &[noise("Z01", 20, &[55.0])],
            &[reports("Z02", TimeWindow::Evening, 9, 9)],
            &names(),
            10,
        );
        assert_eq!(hotspots.len(), 1);
        assert_eq!(hotspots[0].zone_id, "Z01");
        assert_eq!(hotspots[0].validated_report_count, 0);
    }

    #[test]
    fn test_top_truncates() {
        let data: Vec<HourlyNoise> = (0..24).map(|h| noise("Z01", h, &[40.0 + h as f64])).collect();
        let hotspots = rank_hotspots(&data, &[], &names(), 2);
        assert_eq!(hotspots.len(), 2);
        assert_eq!(hotspots[0].time_window, TimeWindow::Late);
    }

    #[test]
    fn test_unknown_zone_falls_back_to_id() {
        let hotspots = rank_hotspots(&[noise("Z77", 3, &[50.0])], &[], &HashMap::new(), 5);
        assert_eq!(hotspots[0].zone_name, "Z77");
    }

    #[test]
    fn test_no_readings_no_hotspots() {
        assert!(rank_hotspots(&[], &[], &names(), 10).is_empty());
    }
}
