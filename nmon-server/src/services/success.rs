//! Service success measures

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::hotspots::Hotspot;

/// Size of the loudest-zone reference set
pub const LOUDEST_ZONES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessMeasures {
    /// Share of ranked hotspot zones that are among the loudest zones
    pub hotspot_validity: f64,
    /// Share of moderation decisions that found a duplicate
    pub reporting_quality: f64,
    /// Share of quest answers that were correct
    pub community_understanding: f64,
}

/// The `n` zones with the highest mean level (ties by zone id)
pub fn loudest_zones(zone_levels: &HashMap<String, f64>, n: usize) -> Vec<String> {
    let mut levels: Vec<(&String, f64)> = zone_levels.iter().map(|(z, l)| (z, *l)).collect();
    levels.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    levels.into_iter().take(n).map(|(z, _)| z.clone()).collect()
}

/// Fraction of distinct hotspot zones found among the loudest zones
pub fn hotspot_validity(hotspots: &[Hotspot], zone_levels: &HashMap<String, f64>) -> f64 {
    let hotspot_zones: HashSet<&str> = hotspots.iter().map(|h| h.zone_id.as_str()).collect();
    let loudest = loudest_zones(zone_levels, LOUDEST_ZONES);
    let hits = loudest
        .iter()
        .filter(|z| hotspot_zones.contains(z.as_str()))
        .count();
    ratio(hits as i64, hotspot_zones.len() as i64)
}

/// `part / whole`, or 0 when `whole` is 0
pub fn ratio(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
