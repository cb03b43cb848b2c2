//! CSV seed import
//!
//! Reads whichever seed files exist in a folder. Identifiers, categories,
//! timestamps and time windows are normalized on the way in so older
//! exports (space separated timestamps, `z3` zone ids, `afternoon`
//! windows) load cleanly. The intervention catalog and quest missions fall
//! back to the built-in ones when their files are missing.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use nmon_common::models::{
    ImpactRange, IncidentReport, Intervention, Mission, ModerationDecision, NoiseObservation, Plan,
    Zone,
};
use nmon_common::normalize;
use nmon_common::time::parse_timestamp;
use nmon_common::TimeWindow;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::{synthetic, SeedData};
use crate::db::missions::split_options;

#[derive(Debug, Deserialize)]
struct ZoneRecord {
    zone_id: String,
    name: String,
    #[serde(default)]
    geometry_stub: String,
    #[serde(default)]
    tags: String,
}

#[derive(Debug, Deserialize)]
struct AdjacencyRecord {
    zone_id: String,
    neighbor_id: String,
}

#[derive(Debug, Deserialize)]
struct ObservationRecord {
    obs_id: String,
    zone_id: String,
    timestamp: String,
    source: String,
    value_db: f64,
    category_tag: String,
}

#[derive(Debug, Deserialize)]
struct ReportRecord {
    report_id: String,
    zone_id: String,
    timestamp: String,
    category: String,
    #[serde(default)]
    time_window: Option<String>,
    #[serde(default, alias = "description")]
    description_stub: String,
    status: String,
    #[serde(default)]
    moderation_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DecisionRecord {
    decision_id: String,
    report_id: String,
    decision: String,
    reason: String,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct InterventionRecord {
    intervention_id: String,
    #[serde(rename = "type")]
    kind: String,
    cost_band: String,
    feasibility_score: i64,
    /// `low-high`, e.g. `2-5`
    #[serde(default)]
    impact_range_db: Option<String>,
    #[serde(default)]
    impact_low_db: Option<f64>,
    #[serde(default)]
    impact_high_db: Option<f64>,
    #[serde(default)]
    notes: String,
}

#[derive(Debug, Deserialize)]
struct PlanRecord {
    plan_id: String,
    zone_id: String,
    interventions_selected: String,
    budget: f64,
    status: String,
    expected_impact: f64,
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MissionRecord {
    mission_id: String,
    tier: i64,
    title: String,
    question: String,
    options: String,
    answer_key: String,
    #[serde(default)]
    grading_type: Option<String>,
    #[serde(default)]
    hint: String,
    #[serde(default)]
    explanation: String,
}

/// Load every seed file present in `dir`
pub fn load_seed_dir(dir: &Path) -> Result<SeedData> {
    if !dir.is_dir() {
        return Err(anyhow!("Seed folder {} does not exist", dir.display()));
    }

    let mut zones: Vec<Zone> = read_records::<ZoneRecord>(dir, "zones.csv")?
        .unwrap_or_default()
        .into_iter()
        .map(|r| Zone {
            zone_id: normalize::zone_id(&r.zone_id),
            name: r.name,
            geometry_stub: r.geometry_stub,
            tags: r.tags,
            adjacent: Vec::new(),
        })
        .collect();

    if let Some(pairs) = read_records::<AdjacencyRecord>(dir, "zone_adjacency.csv")? {
        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        for pair in pairs {
            adjacency
                .entry(normalize::zone_id(&pair.zone_id))
                .or_default()
                .push(normalize::zone_id(&pair.neighbor_id));
        }
        for zone in &mut zones {
            if let Some(neighbors) = adjacency.remove(&zone.zone_id) {
                zone.adjacent = neighbors;
            }
        }
    }

    let observations = read_records::<ObservationRecord>(dir, "noise_observations.csv")?
        .unwrap_or_default()
        .into_iter()
        .map(|r| -> Result<NoiseObservation> {
            Ok(NoiseObservation {
                timestamp: parse_timestamp(&r.timestamp)
                    .with_context(|| format!("Observation {}", r.obs_id))?,
                source: r
                    .source
                    .parse()
                    .with_context(|| format!("Observation {}", r.obs_id))?,
                zone_id: normalize::zone_id(&r.zone_id),
                category_tag: normalize::category(&r.category_tag),
                value_db: r.value_db,
                obs_id: r.obs_id,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let reports = read_records::<ReportRecord>(dir, "incident_reports.csv")?
        .unwrap_or_default()
        .into_iter()
        .map(report_from_record)
        .collect::<Result<Vec<_>>>()?;

    let decisions = read_records::<DecisionRecord>(dir, "moderation_decisions.csv")?
        .unwrap_or_default()
        .into_iter()
        .map(|r| -> Result<ModerationDecision> {
            Ok(ModerationDecision {
                decision: r
                    .decision
                    .parse()
                    .with_context(|| format!("Decision {}", r.decision_id))?,
                timestamp: parse_timestamp(&r.timestamp)
                    .with_context(|| format!("Decision {}", r.decision_id))?,
                decision_id: r.decision_id,
                report_id: r.report_id,
                reason: r.reason,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let interventions = match read_records::<InterventionRecord>(dir, "interventions.csv")? {
        Some(records) => records
            .into_iter()
            .map(intervention_from_record)
            .collect::<Result<Vec<_>>>()?,
        None => {
            info!("No interventions.csv, using built-in catalog");
            synthetic::intervention_catalog()
        }
    };

    let plans = read_records::<PlanRecord>(dir, "plans.csv")?
        .unwrap_or_default()
        .into_iter()
        .map(|r| -> Result<Plan> {
            Ok(Plan {
                status: r
                    .status
                    .parse()
                    .with_context(|| format!("Plan {}", r.plan_id))?,
                zone_id: normalize::zone_id(&r.zone_id),
                interventions_selected: parse_id_list(&r.interventions_selected),
                budget: r.budget,
                expected_impact: r.expected_impact,
                created_by: r
                    .created_by
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| "planner".to_string()),
                notes: r.notes.unwrap_or_default(),
                plan_id: r.plan_id,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let missions = match read_records::<MissionRecord>(dir, "missions.csv")? {
        Some(records) => records
            .into_iter()
            .map(mission_from_record)
            .collect::<Result<Vec<_>>>()?,
        None => {
            info!("No missions.csv, using built-in quest");
            synthetic::quest_missions()
        }
    };

    Ok(SeedData {
        zones,
        observations,
        reports,
        decisions,
        interventions,
        plans,
        missions,
    })
}

/// Deserialize `dir/file`, or `None` when the file does not exist
fn read_records<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Option<Vec<T>>> {
    let path = dir.join(file);
    if !path.exists() {
        debug!("Seed file {} not present", path.display());
        return Ok(None);
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    info!("Read {} rows from {}", records.len(), file);
    Ok(Some(records))
}

fn report_from_record(r: ReportRecord) -> Result<IncidentReport> {
    let timestamp =
        parse_timestamp(&r.timestamp).with_context(|| format!("Report {}", r.report_id))?;
    let category = normalize::category(&r.category);
    let zone_id = normalize::zone_id(&r.zone_id);
    let time_window = TimeWindow::resolve(r.time_window.as_deref(), timestamp);
    let description = if r.description_stub.trim().is_empty() {
        format!("Report of {} noise in {} during {}", category, zone_id, time_window)
    } else {
        r.description_stub
    };

    Ok(IncidentReport {
        status: r
            .status
            .parse()
            .with_context(|| format!("Report {}", r.report_id))?,
        moderation_reason: r.moderation_reason.filter(|s| !s.trim().is_empty()),
        report_id: r.report_id,
        zone_id,
        timestamp,
        category,
        time_window,
        description,
    })
}

fn intervention_from_record(r: InterventionRecord) -> Result<Intervention> {
    let impact_range = match (r.impact_low_db, r.impact_high_db, r.impact_range_db.as_deref()) {
        (Some(low), Some(high), _) => ImpactRange::new(low, high),
        (_, _, Some(range)) => ImpactRange::parse(range),
        _ => {
            return Err(anyhow!(
                "Intervention {} has no impact range",
                r.intervention_id
            ))
        }
    }
    .with_context(|| format!("Intervention {}", r.intervention_id))?;

    Ok(Intervention {
        cost_band: r
            .cost_band
            .parse()
            .with_context(|| format!("Intervention {}", r.intervention_id))?,
        intervention_id: r.intervention_id,
        kind: r.kind,
        feasibility_score: r.feasibility_score,
        impact_range,
        notes: r.notes,
    })
}

fn mission_from_record(r: MissionRecord) -> Result<Mission> {
    let grading_type = match r.grading_type.as_deref().map(str::trim) {
        None | Some("") => nmon_common::models::GradingType::Choice,
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Mission {}", r.mission_id))?,
    };
    Ok(Mission {
        mission_id: r.mission_id,
        tier: r.tier,
        title: r.title,
        question: r.question,
        options: split_options(&r.options),
        answer_key: r.answer_key,
        grading_type,
        hint: r.hint,
        explanation: r.explanation,
    })
}

/// Parse a list of ids written as JSON (`["I01","I02"]`), as a Python
/// list (`['I01', 'I02']`) or as a plain `I01,I02` / `I01|I02` string
fn parse_id_list(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split([',', '|'])
        .map(|id| id.trim().trim_matches(|c| c == '\'' || c == '"').trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmon_common::models::{PlanStatus, ReportStatus};
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, file: &str, content: &str) {
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_parse_id_list_forms() {
        assert_eq!(parse_id_list("['I01', 'I02']"), vec!["I01", "I02"]);
        assert_eq!(parse_id_list("[\"I03\",\"I04\"]"), vec!["I03", "I04"]);
        assert_eq!(parse_id_list("I05|I06"), vec!["I05", "I06"]);
        assert!(parse_id_list("[]").is_empty());
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_seed_dir(&temp_dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_loads_and_normalizes_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        write(
            dir,
            "zones.csv",
            "zone_id,name,geometry_stub,tags\nz1,Harbour,,residential\n2,Market,,event\n",
        );
        write(dir, "zone_adjacency.csv", "zone_id,neighbor_id\nZ01,Z02\nZ02,Z01\n");
        write(
            dir,
            "noise_observations.csv",
            "obs_id,zone_id,timestamp,source,value_db,category_tag\n\
             O00001,Z01,2023-01-05 07:03:00,sensor,61.5,Nightlife\n",
        );
        write(
            dir,
            "incident_reports.csv",
            "report_id,zone_id,timestamp,category,time_window,description_stub,status\n\
             R001,z2,2023-01-06 14:00:00,general,afternoon,Loud,valid\n\
             R002,Z01,2023-01-06 23:30:00,music,,,pending\n",
        );
        write(
            dir,
            "moderation_decisions.csv",
            "decision_id,report_id,decision,reason,timestamp\n\
             D001,R001,valid,Reason for valid,2023-01-07 10:00:00.123456\n",
        );
        write(
            dir,
            "plans.csv",
            "plan_id,zone_id,interventions_selected,budget,status,expected_impact,created_by,notes\n\
             P001,Z01,\"['I01', 'I04']\",2000,in_progress,9.5,planner,\n",
        );

        let data = load_seed_dir(dir).unwrap();

        assert_eq!(data.zones[0].zone_id, "Z01");
        assert_eq!(data.zones[1].zone_id, "Z02");
        assert_eq!(data.zones[0].adjacent, vec!["Z02"]);

        let obs = &data.observations[0];
        assert_eq!(obs.category_tag, "music");
        assert_eq!(
            nmon_common::time::format_timestamp(obs.timestamp),
            "2023-01-05T07:03:00Z"
        );

        let r1 = &data.reports[0];
        assert_eq!(r1.zone_id, "Z02");
        assert_eq!(r1.category, "other");
        assert_eq!(r1.time_window, TimeWindow::Day);
        assert_eq!(r1.status, ReportStatus::Valid);
        let r2 = &data.reports[1];
        assert_eq!(r2.time_window, TimeWindow::Late);
        assert!(r2.description.contains("music"));

        assert_eq!(data.decisions.len(), 1);
        assert_eq!(data.plans[0].interventions_selected, vec!["I01", "I04"]);
        assert_eq!(data.plans[0].status, PlanStatus::InProgress);

        // Fallbacks for absent files
        assert_eq!(data.interventions.len(), 15);
        assert_eq!(data.missions.len(), 9);
    }

    #[test]
    fn test_intervention_range_column() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path(),
            "interventions.csv",
            "intervention_id,type,cost_band,feasibility_score,impact_range_db,notes\n\
             I01,signage,low,8,2-5,Install quiet zone signs\n",
        );
        let data = load_seed_dir(temp_dir.path()).unwrap();
        assert_eq!(data.interventions.len(), 1);
        assert_eq!(data.interventions[0].impact_range.midpoint(), 3.5);
    }

    #[test]
    fn test_bad_status_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path(),
            "incident_reports.csv",
            "report_id,zone_id,timestamp,category,description_stub,status\n\
             R001,Z01,2023-01-06 14:00:00,music,x,archived\n",
        );
        let err = load_seed_dir(temp_dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("R001"));
    }

    #[test]
    fn test_missions_file() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path(),
            "missions.csv",
            "mission_id,tier,title,question,options,answer_key,grading_type,hint,explanation\n\
             M01,1,Basics,How loud?,30 dB|60 dB,60 dB,,Think,Explained\n",
        );
        let data = load_seed_dir(temp_dir.path()).unwrap();
        assert_eq!(data.missions.len(), 1);
        assert_eq!(data.missions[0].options, vec!["30 dB", "60 dB"]);
        assert!(data.missions[0].is_correct("60 dB"));
    }
}
