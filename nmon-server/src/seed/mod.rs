//! Database seeding
//!
//! An empty database is filled on startup, either from a folder of CSV
//! files or from the deterministic synthetic generator.

pub mod csv_import;
pub mod synthetic;

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use nmon_common::db::clear_all_tables;
use nmon_common::models::{
    IncidentReport, Intervention, Mission, ModerationDecision, NoiseObservation, Plan, Zone,
};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db;

/// Everything needed to populate the database
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub zones: Vec<Zone>,
    pub observations: Vec<NoiseObservation>,
    pub reports: Vec<IncidentReport>,
    pub decisions: Vec<ModerationDecision>,
    pub interventions: Vec<Intervention>,
    pub plans: Vec<Plan>,
    pub missions: Vec<Mission>,
}

/// Row counts written by a seed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub zones: usize,
    pub observations: usize,
    pub reports: usize,
    pub decisions: usize,
    pub interventions: usize,
    pub plans: usize,
    pub missions: usize,
}

/// Seed the database if it has no zones yet (or always, with `reset`)
///
/// Returns `None` when existing data was kept.
pub async fn seed_database(
    pool: &SqlitePool,
    seed_dir: Option<&Path>,
    reset: bool,
) -> Result<Option<SeedSummary>> {
    if reset {
        clear_all_tables(pool).await?;
        info!("Existing data cleared (--reset-data)");
    } else {
        let zones = db::count_rows(pool, "zones").await?;
        if zones > 0 {
            info!("Database already seeded ({} zones), keeping existing data", zones);
            return Ok(None);
        }
    }

    let data = match seed_dir {
        Some(dir) => {
            info!("Loading seed data from {}", dir.display());
            csv_import::load_seed_dir(dir)?
        }
        None => {
            info!("Generating synthetic seed data (seed {})", synthetic::SEED);
            synthetic::generate()
        }
    };

    let summary = write_seed_data(pool, &data)
        .await
        .context("Failed to write seed data")?;
    info!(
        zones = summary.zones,
        observations = summary.observations,
        reports = summary.reports,
        decisions = summary.decisions,
        interventions = summary.interventions,
        plans = summary.plans,
        missions = summary.missions,
        "Seed data written"
    );
    Ok(Some(summary))
}

/// Insert seed data in one transaction
///
/// Rows referring to unknown zones or reports are skipped with a warning
/// rather than failing the whole seed.
pub async fn write_seed_data(pool: &SqlitePool, data: &SeedData) -> Result<SeedSummary> {
    let mut tx = db::begin_write(pool).await?;
    let mut summary = SeedSummary::default();

    let zone_ids: HashSet<&str> = data.zones.iter().map(|z| z.zone_id.as_str()).collect();
    for zone in &data.zones {
        db::zones::insert_zone(&mut tx, zone)
            .await
            .with_context(|| format!("Insert zone {}", zone.zone_id))?;
        summary.zones += 1;
    }
    for zone in &data.zones {
        for neighbor in &zone.adjacent {
            if zone_ids.contains(neighbor.as_str()) {
                db::zones::insert_adjacency(&mut tx, &zone.zone_id, neighbor).await?;
            } else {
                warn!("Skipping adjacency {} -> unknown zone {}", zone.zone_id, neighbor);
            }
        }
    }

    let mut skipped = 0usize;
    for obs in &data.observations {
        if !zone_ids.contains(obs.zone_id.as_str()) {
            skipped += 1;
            continue;
        }
        db::observations::insert_observation(&mut tx, obs)
            .await
            .with_context(|| format!("Insert observation {}", obs.obs_id))?;
        summary.observations += 1;
    }

    for intervention in &data.interventions {
        db::interventions::insert_intervention(&mut tx, intervention)
            .await
            .with_context(|| format!("Insert intervention {}", intervention.intervention_id))?;
        summary.interventions += 1;
    }

    let mut report_ids = HashSet::new();
    for report in &data.reports {
        if !zone_ids.contains(report.zone_id.as_str()) {
            skipped += 1;
            continue;
        }
        db::reports::insert_report(&mut tx, report)
            .await
            .with_context(|| format!("Insert report {}", report.report_id))?;
        report_ids.insert(report.report_id.as_str());
        summary.reports += 1;
    }

    for decision in &data.decisions {
        if !report_ids.contains(decision.report_id.as_str()) {
            skipped += 1;
            continue;
        }
        db::reports::insert_decision(&mut tx, decision)
            .await
            .with_context(|| format!("Insert decision {}", decision.decision_id))?;
        summary.decisions += 1;
    }

    for plan in &data.plans {
        if !zone_ids.contains(plan.zone_id.as_str()) {
            skipped += 1;
            continue;
        }
        db::plans::insert_plan(&mut tx, plan)
            .await
            .with_context(|| format!("Insert plan {}", plan.plan_id))?;
        summary.plans += 1;
    }

    for mission in &data.missions {
        db::missions::insert_mission(&mut tx, mission)
            .await
            .with_context(|| format!("Insert mission {}", mission.mission_id))?;
        summary.missions += 1;
    }

    tx.commit().await?;

    if skipped > 0 {
        warn!("Skipped {} seed rows referring to unknown zones or reports", skipped);
    }
    Ok(summary)
}
