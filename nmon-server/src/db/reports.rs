//! Incident report and moderation persistence

use chrono::{DateTime, Duration, Utc};
use nmon_common::models::{Decision, IncidentReport, ModerationDecision, ReportStatus};
use nmon_common::time::{format_timestamp, parse_timestamp};
use nmon_common::{Error, Result, TimeWindow};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;

use super::{begin_write, next_id};
use crate::services::dedup::{check_duplicate, window_start, Candidate, DedupVerdict, Submission};
use crate::services::hotspots::WindowReports;

const REPORT_COLUMNS: &str =
    "report_id, zone_id, timestamp, category, time_window, description_stub, status, moderation_reason";

/// A validated, normalized report ready to be stored
#[derive(Debug, Clone)]
pub struct NewReport {
    pub zone_id: String,
    pub category: String,
    pub time_window: TimeWindow,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of a submission
#[derive(Debug)]
pub enum SubmitOutcome {
    Stored(IncidentReport),
    /// Nothing was written
    Rejected(DedupVerdict),
}

/// List reports, optionally restricted to one status, oldest first
pub async fn list_reports(
    pool: &SqlitePool,
    status: Option<ReportStatus>,
) -> Result<Vec<IncidentReport>> {
    let rows = match status {
        Some(status) => {
            sqlx::query(&format!(
                "SELECT {} FROM incident_reports WHERE status = ? ORDER BY timestamp, report_id",
                REPORT_COLUMNS
            ))
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM incident_reports ORDER BY timestamp, report_id",
                REPORT_COLUMNS
            ))
            .fetch_all(pool)
            .await?
        }
    };
    rows.iter().map(row_to_report).collect()
}

pub async fn get_report(pool: &SqlitePool, report_id: &str) -> Result<Option<IncidentReport>> {
    let mut conn = pool.acquire().await?;
    fetch_report(&mut conn, report_id).await
}

async fn fetch_report(
    conn: &mut SqliteConnection,
    report_id: &str,
) -> Result<Option<IncidentReport>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM incident_reports WHERE report_id = ?",
        REPORT_COLUMNS
    ))
    .bind(report_id)
    .fetch_optional(&mut *conn)
    .await?;
    row.as_ref().map(row_to_report).transpose()
}

/// Moderation history of a report, oldest first
pub async fn decisions_for_report(
    pool: &SqlitePool,
    report_id: &str,
) -> Result<Vec<ModerationDecision>> {
    let rows = sqlx::query(
        r#"
        SELECT decision_id, report_id, decision, reason, timestamp
        FROM moderation_decisions
        WHERE report_id = ?
        ORDER BY timestamp, decision_id
        "#,
    )
    .bind(report_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(row_to_decision).collect()
}

/// Store a report unless it duplicates a recent one
///
/// The duplicate check and the insert share one write-locked transaction,
/// so concurrent identical submissions are checked one after the other and
/// only the first is stored.
pub async fn submit_report(
    pool: &SqlitePool,
    report: &NewReport,
    window: Duration,
) -> Result<SubmitOutcome> {
    let mut tx = begin_write(pool).await?;

    let rows = sqlx::query(
        r#"
        SELECT report_id, category, description_stub, timestamp
        FROM incident_reports
        WHERE zone_id = ? AND status != 'invalid' AND timestamp >= ?
        "#,
    )
    .bind(&report.zone_id)
    .bind(format_timestamp(window_start(report.timestamp, window)))
    .fetch_all(&mut *tx)
    .await?;

    let candidates = rows
        .iter()
        .map(|row| -> Result<Candidate> {
            let timestamp: String = row.try_get("timestamp")?;
            Ok(Candidate {
                report_id: row.try_get("report_id")?,
                category: row.try_get("category")?,
                description: row.try_get("description_stub")?,
                timestamp: parse_timestamp(&timestamp)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let verdict = check_duplicate(
        &Submission {
            category: &report.category,
            description: &report.description,
            timestamp: report.timestamp,
        },
        &candidates,
        window,
    );
    if verdict.is_duplicate() {
        // Dropping the transaction rolls it back
        debug!(zone_id = %report.zone_id, ?verdict, "Report rejected as duplicate");
        return Ok(SubmitOutcome::Rejected(verdict));
    }

    let stored = IncidentReport {
        report_id: next_id(&mut tx, "incident_reports", "report_id", "R", 3).await?,
        zone_id: report.zone_id.clone(),
        timestamp: report.timestamp,
        category: report.category.clone(),
        time_window: report.time_window,
        description: report.description.clone(),
        status: ReportStatus::Pending,
        moderation_reason: None,
    };
    insert_report(&mut tx, &stored).await?;
    tx.commit().await?;

    Ok(SubmitOutcome::Stored(stored))
}

/// Apply a moderation decision to an open report
///
/// The status change is a conditional update that only matches open
/// reports, so a report leaves the open states at most once.
pub async fn moderate_report(
    pool: &SqlitePool,
    report_id: &str,
    decision: Decision,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(IncidentReport, ModerationDecision)> {
    let mut tx = begin_write(pool).await?;

    let updated = sqlx::query(
        r#"
        UPDATE incident_reports
        SET status = ?, moderation_reason = ?
        WHERE report_id = ? AND status IN ('pending', 'under_review')
        "#,
    )
    .bind(decision.status().as_str())
    .bind(reason)
    .bind(report_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM incident_reports WHERE report_id = ?")
                .bind(report_id)
                .fetch_optional(&mut *tx)
                .await?;
        return Err(match current {
            None => Error::NotFound(format!("Report {} not found", report_id)),
            Some(status) => Error::Conflict(format!(
                "Report {} was already moderated (status: {})",
                report_id, status
            )),
        });
    }

    let record = ModerationDecision {
        decision_id: next_id(&mut tx, "moderation_decisions", "decision_id", "D", 4).await?,
        report_id: report_id.to_string(),
        decision,
        reason: reason.to_string(),
        timestamp: now,
    };
    insert_decision(&mut tx, &record).await?;

    let report = fetch_report(&mut tx, report_id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Report {} vanished during moderation", report_id)))?;
    tx.commit().await?;

    Ok((report, record))
}

/// Report counts per zone and time window
pub async fn window_report_counts(pool: &SqlitePool) -> Result<Vec<WindowReports>> {
    let rows = sqlx::query(
        r#"
        SELECT zone_id,
               time_window,
               COUNT(*) AS reports,
               SUM(CASE WHEN status = 'valid' THEN 1 ELSE 0 END) AS validated
        FROM incident_reports
        GROUP BY zone_id, time_window
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<WindowReports> {
            let label: String = row.try_get("time_window")?;
            Ok(WindowReports {
                zone_id: row.try_get("zone_id")?,
                time_window: TimeWindow::parse_loose(&label).unwrap_or(TimeWindow::Day),
                reports: row.try_get("reports")?,
                validated: row.try_get("validated")?,
            })
        })
        .collect()
}

/// (duplicate decisions, all decisions)
pub async fn decision_counts(pool: &SqlitePool) -> Result<(i64, i64)> {
    let counts: (i64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(CASE WHEN decision = 'duplicate' THEN 1 ELSE 0 END), 0),
               COUNT(*)
        FROM moderation_decisions
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(counts)
}

pub async fn insert_report(conn: &mut SqliteConnection, report: &IncidentReport) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO incident_reports
            (report_id, zone_id, timestamp, category, time_window, description_stub, status, moderation_reason)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&report.report_id)
    .bind(&report.zone_id)
    .bind(format_timestamp(report.timestamp))
    .bind(&report.category)
    .bind(report.time_window.label())
    .bind(&report.description)
    .bind(report.status.as_str())
    .bind(&report.moderation_reason)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_decision(
    conn: &mut SqliteConnection,
    decision: &ModerationDecision,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO moderation_decisions (decision_id, report_id, decision, reason, timestamp)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&decision.decision_id)
    .bind(&decision.report_id)
    .bind(decision.decision.as_str())
    .bind(&decision.reason)
    .bind(format_timestamp(decision.timestamp))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn row_to_report(row: &SqliteRow) -> Result<IncidentReport> {
    let timestamp = parse_timestamp(&row.try_get::<String, _>("timestamp")?)?;
    let window: String = row.try_get("time_window")?;
    let status: String = row.try_get("status")?;
    Ok(IncidentReport {
        report_id: row.try_get("report_id")?,
        zone_id: row.try_get("zone_id")?,
        timestamp,
        category: row.try_get("category")?,
        time_window: TimeWindow::resolve(Some(&window), timestamp),
        description: row.try_get("description_stub")?,
        status: status.parse()?,
        moderation_reason: row.try_get("moderation_reason")?,
    })
}

fn row_to_decision(row: &SqliteRow) -> Result<ModerationDecision> {
    let decision: String = row.try_get("decision")?;
    let timestamp: String = row.try_get("timestamp")?;
    Ok(ModerationDecision {
        decision_id: row.try_get("decision_id")?,
        report_id: row.try_get("report_id")?,
        decision: decision.parse()?,
        reason: row.try_get("reason")?,
        timestamp: parse_timestamp(&timestamp)?,
    })
}
