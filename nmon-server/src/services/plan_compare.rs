//! Side-by-side comparison of intervention plans
//!
//! Joins each plan with the reduction ranges of its interventions and the
//! current mean level of its zone to give a before/after table.

use std::collections::{HashMap, HashSet};

use nmon_common::models::{Intervention, Plan, PlanStatus};
use nmon_common::{Error, Result};
use serde::Serialize;

use super::noise_filter::multi_values;

/// Minimum number of distinct plans in a comparison
pub const MIN_PLANS: usize = 2;

#[derive(Debug, Clone, Serialize)]
pub struct PlanImpactRow {
    pub plan_id: String,
    pub zone_id: String,
    pub zone_name: String,
    pub status: PlanStatus,
    pub budget: f64,
    pub interventions: Vec<String>,
    pub impact_low_db: f64,
    pub impact_high_db: f64,
    pub impact_mid_db: f64,
    /// Mean observed level of the zone; `None` without readings
    pub current_avg_db: Option<f64>,
    pub expected_avg_db: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonSummary {
    pub total_cost: f64,
    pub total_expected_impact_db: f64,
    pub zones_covered: usize,
    pub total_zones: usize,
    pub coverage_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanComparison {
    pub plans: Vec<PlanImpactRow>,
    pub summary: ComparisonSummary,
}

/// Requested plan ids, in order, without repeats
///
/// Accepts `plan_ids=P1,P2` and `plan_ids=P1&plan_ids=P2`.
pub fn parse_plan_ids(pairs: &[(String, String)]) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let ids: Vec<String> = multi_values(pairs, &["plan_ids", "plan_id"])
        .into_iter()
        .map(|id| id.to_uppercase())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    if ids.len() < MIN_PLANS {
        return Err(Error::InvalidInput(format!(
            "Select at least {} different plans to compare (got {})",
            MIN_PLANS,
            ids.len()
        )));
    }
    Ok(ids)
}

/// Build the comparison table for `plans`, kept in the given order
///
/// Interventions missing from the catalog contribute no impact.
pub fn compare_plans(
    plans: &[Plan],
    catalog: &HashMap<String, Intervention>,
    zone_levels: &HashMap<String, f64>,
    zone_names: &HashMap<String, String>,
) -> PlanComparison {
    let rows: Vec<PlanImpactRow> = plans
        .iter()
        .map(|plan| {
            let (low, high) = plan
                .interventions_selected
                .iter()
                .filter_map(|id| catalog.get(id))
                .fold((0.0, 0.0), |(low, high), i| {
                    (low + i.impact_range.low_db, high + i.impact_range.high_db)
                });
            let mid = (low + high) / 2.0;
            let current = zone_levels.get(&plan.zone_id).copied();

            PlanImpactRow {
                plan_id: plan.plan_id.clone(),
                zone_id: plan.zone_id.clone(),
                zone_name: zone_names
                    .get(&plan.zone_id)
                    .cloned()
                    .unwrap_or_else(|| plan.zone_id.clone()),
                status: plan.status,
                budget: plan.budget,
                interventions: plan.interventions_selected.clone(),
                impact_low_db: round2(low),
                impact_high_db: round2(high),
                impact_mid_db: round2(mid),
                current_avg_db: current.map(round2),
                expected_avg_db: current.map(|level| round2((level - mid).max(0.0))),
            }
        })
        .collect();

    let zones_covered = rows
        .iter()
        .map(|r| r.zone_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let total_zones = zone_names.len();
    let coverage_pct = if total_zones == 0 {
        0.0
    } else {
        round2(zones_covered as f64 * 100.0 / total_zones as f64)
    };

    let summary = ComparisonSummary {
        total_cost: rows.iter().map(|r| r.budget).sum(),
        total_expected_impact_db: round2(rows.iter().map(|r| r.impact_mid_db).sum()),
        zones_covered,
        total_zones,
        coverage_pct,
    };

    PlanComparison {
        plans: rows,
        summary,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
