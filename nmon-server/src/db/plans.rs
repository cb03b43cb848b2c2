//! Intervention plan persistence

use nmon_common::models::{Plan, PlanStatus};
use nmon_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use super::{begin_write, next_id};

const SELECT_PLANS: &str = "SELECT plan_id, zone_id, interventions_selected, budget, status, expected_impact, created_by, notes FROM plans";

/// List plans with optional zone and status filters
pub async fn list_plans(
    pool: &SqlitePool,
    zone_id: Option<&str>,
    status: Option<PlanStatus>,
) -> Result<Vec<Plan>> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_PLANS);
    qb.push(" WHERE 1 = 1");
    if let Some(zone_id) = zone_id {
        qb.push(" AND zone_id = ");
        qb.push_bind(zone_id.to_string());
    }
    if let Some(status) = status {
        qb.push(" AND status = ");
        qb.push_bind(status.as_str());
    }
    qb.push(" ORDER BY plan_id");

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(row_to_plan).collect()
}

pub async fn get_plan(pool: &SqlitePool, plan_id: &str) -> Result<Option<Plan>> {
    let row = sqlx::query(&format!("{} WHERE plan_id = ?", SELECT_PLANS))
        .bind(plan_id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(row_to_plan).transpose()
}

/// Store a new plan under the next `P###` id and return it
pub async fn create_plan(pool: &SqlitePool, mut plan: Plan) -> Result<Plan> {
    let mut tx = begin_write(pool).await?;
    plan.plan_id = next_id(&mut tx, "plans", "plan_id", "P", 3).await?;
    insert_plan(&mut tx, &plan).await?;
    tx.commit().await?;
    Ok(plan)
}

/// Change status and/or notes; returns the updated plan
pub async fn update_plan(
    pool: &SqlitePool,
    plan_id: &str,
    status: Option<PlanStatus>,
    notes: Option<&str>,
) -> Result<Plan> {
    let result = sqlx::query(
        r#"
        UPDATE plans
        SET status = COALESCE(?, status),
            notes = COALESCE(?, notes)
        WHERE plan_id = ?
        "#,
    )
    .bind(status.map(PlanStatus::as_str))
    .bind(notes)
    .bind(plan_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Plan {} not found", plan_id)));
    }

    get_plan(pool, plan_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Plan {} not found", plan_id)))
}

pub async fn insert_plan(conn: &mut SqliteConnection, plan: &Plan) -> Result<()> {
    let interventions = serde_json::to_string(&plan.interventions_selected)
        .map_err(|e| Error::Internal(format!("Encode interventions failed: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO plans
            (plan_id, zone_id, interventions_selected, budget, status, expected_impact, created_by, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&plan.plan_id)
    .bind(&plan.zone_id)
    .bind(interventions)
    .bind(plan.budget)
    .bind(plan.status.as_str())
    .bind(plan.expected_impact)
    .bind(&plan.created_by)
    .bind(&plan.notes)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn row_to_plan(row: &SqliteRow) -> Result<Plan> {
    let interventions: String = row.try_get("interventions_selected")?;
    let status: String = row.try_get("status")?;
    Ok(Plan {
        plan_id: row.try_get("plan_id")?,
        zone_id: row.try_get("zone_id")?,
        interventions_selected: serde_json::from_str(&interventions).map_err(|e| {
            Error::Internal(format!("Corrupt interventions list {:?}: {}", interventions, e))
        })?,
        budget: row.try_get("budget")?,
        status: status.parse()?,
        expected_impact: row.try_get("expected_impact")?,
        created_by: row.try_get("created_by")?,
        notes: row.try_get("notes")?,
    })
}
