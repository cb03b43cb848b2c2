//! Database initialization
//!
//! Creates the database file on first run and the tables idempotently on
//! every start.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How long a writer waits for another writer to commit
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Tables in dependency order (parents before children)
pub const TABLES: [&str; 9] = [
    "zones",
    "zone_adjacency",
    "noise_observations",
    "incident_reports",
    "moderation_decisions",
    "interventions",
    "plans",
    "missions",
    "quest_progress",
];

/// Open (creating if needed) the database file and its tables
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Set per connection: every pooled connection waits for the write lock
    // and enforces foreign keys, not only the first one
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_tables(&pool).await?;

    Ok(pool)
}

/// In-memory database with the full schema
///
/// Limited to one connection that is never recycled: every SQLite
/// `:memory:` connection is a separate database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create every table and index (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_zones_tables(pool).await?;
    create_noise_observations_table(pool).await?;
    create_incident_reports_table(pool).await?;
    create_moderation_decisions_table(pool).await?;
    create_interventions_table(pool).await?;
    create_plans_table(pool).await?;
    create_missions_tables(pool).await?;
    Ok(())
}

/// Delete all rows, children first
pub async fn clear_all_tables(pool: &SqlitePool) -> Result<()> {
    for table in TABLES.iter().rev() {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(pool)
            .await?;
    }
    info!("Cleared all tables");
    Ok(())
}

async fn create_zones_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS zones (
            zone_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            geometry_stub TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS zone_adjacency (
            zone_id TEXT NOT NULL REFERENCES zones(zone_id) ON DELETE CASCADE,
            neighbor_id TEXT NOT NULL REFERENCES zones(zone_id) ON DELETE CASCADE,
            PRIMARY KEY (zone_id, neighbor_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_noise_observations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS noise_observations (
            obs_id TEXT PRIMARY KEY,
            zone_id TEXT NOT NULL REFERENCES zones(zone_id),
            timestamp TEXT NOT NULL,
            source TEXT NOT NULL CHECK (source IN ('sensor', 'report')),
            value_db REAL NOT NULL,
            category_tag TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_noise_observations_zone_time
         ON noise_observations(zone_id, timestamp)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_noise_observations_time
         ON noise_observations(timestamp)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_incident_reports_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS incident_reports (
            report_id TEXT PRIMARY KEY,
            zone_id TEXT NOT NULL REFERENCES zones(zone_id),
            timestamp TEXT NOT NULL,
            category TEXT NOT NULL,
            time_window TEXT NOT NULL,
            description_stub TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'under_review', 'valid', 'duplicate', 'invalid')),
            moderation_reason TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Dedup looks up recent reports per zone
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_incident_reports_zone_time
         ON incident_reports(zone_id, timestamp)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_moderation_decisions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS moderation_decisions (
            decision_id TEXT PRIMARY KEY,
            report_id TEXT NOT NULL REFERENCES incident_reports(report_id),
            decision TEXT NOT NULL CHECK (decision IN ('valid', 'duplicate', 'invalid')),
            reason TEXT NOT NULL,
            timestamp TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_interventions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS interventions (
            intervention_id TEXT PRIMARY KEY,
            type TEXT NOT NULL,
            cost_band TEXT NOT NULL CHECK (cost_band IN ('low', 'medium', 'high')),
            feasibility_score INTEGER NOT NULL,
            impact_low_db REAL NOT NULL,
            impact_high_db REAL NOT NULL,
            notes TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_plans_table(pool: &SqlitePool) -> Result<()> {
    // interventions_selected holds a JSON array of intervention ids
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plans (
            plan_id TEXT PRIMARY KEY,
            zone_id TEXT NOT NULL REFERENCES zones(zone_id),
            interventions_selected TEXT NOT NULL DEFAULT '[]',
            budget REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'planned'
                CHECK (status IN ('planned', 'in_progress', 'done')),
            expected_impact REAL NOT NULL,
            created_by TEXT NOT NULL DEFAULT 'planner',
            notes TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_missions_tables(pool: &SqlitePool) -> Result<()> {
    // options are '|' separated, as in the mission seed files
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS missions (
            mission_id TEXT PRIMARY KEY,
            tier INTEGER NOT NULL CHECK (tier BETWEEN 1 AND 3),
            title TEXT NOT NULL,
            question TEXT NOT NULL,
            options TEXT NOT NULL,
            answer_key TEXT NOT NULL,
            grading_type TEXT NOT NULL DEFAULT 'choice',
            hint TEXT NOT NULL DEFAULT '',
            explanation TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quest_progress (
            user_id TEXT NOT NULL,
            mission_id TEXT NOT NULL REFERENCES missions(mission_id) ON DELETE CASCADE,
            tier INTEGER NOT NULL,
            correct INTEGER NOT NULL,
            user_answer TEXT NOT NULL,
            answered_at TEXT NOT NULL,
            PRIMARY KEY (user_id, mission_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
