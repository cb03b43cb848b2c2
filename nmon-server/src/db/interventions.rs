//! Intervention catalog

use std::collections::HashMap;

use nmon_common::models::{ImpactRange, Intervention};
use nmon_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

pub async fn list_interventions(pool: &SqlitePool) -> Result<Vec<Intervention>> {
    let rows = sqlx::query(
        r#"
        SELECT intervention_id, type, cost_band, feasibility_score, impact_low_db, impact_high_db, notes
        FROM interventions
        ORDER BY intervention_id
        "#,
    )
    .fetch_all(pool)
    .await?;
    rows.iter().map(row_to_intervention).collect()
}

/// Catalog keyed by intervention id
pub async fn intervention_map(pool: &SqlitePool) -> Result<HashMap<String, Intervention>> {
    Ok(list_interventions(pool)
        .await?
        .into_iter()
        .map(|i| (i.intervention_id.clone(), i))
        .collect())
}

pub async fn insert_intervention(
    conn: &mut SqliteConnection,
    intervention: &Intervention,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO interventions
            (intervention_id, type, cost_band, feasibility_score, impact_low_db, impact_high_db, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&intervention.intervention_id)
    .bind(&intervention.kind)
    .bind(intervention.cost_band.as_str())
    .bind(intervention.feasibility_score)
    .bind(intervention.impact_range.low_db)
    .bind(intervention.impact_range.high_db)
    .bind(&intervention.notes)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn row_to_intervention(row: &SqliteRow) -> Result<Intervention> {
    let cost_band: String = row.try_get("cost_band")?;
    Ok(Intervention {
        intervention_id: row.try_get("intervention_id")?,
        kind: row.try_get("type")?,
        cost_band: cost_band.parse()?,
        feasibility_score: row.try_get("feasibility_score")?,
        impact_range: ImpactRange::new(row.try_get("impact_low_db")?, row.try_get("impact_high_db")?)?,
        notes: row.try_get("notes")?,
    })
}
