//! Noise observation queries

use std::collections::HashMap;

use nmon_common::models::{NoiseObservation, NoiseSource};
use nmon_common::time::{format_timestamp, parse_timestamp};
use nmon_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use crate::services::hotspots::HourlyNoise;
use crate::services::noise_filter::{DateRange, NoiseFilter};

const SELECT_OBSERVATIONS: &str =
    "SELECT obs_id, zone_id, timestamp, source, value_db, category_tag FROM noise_observations WHERE 1 = 1";

/// Observations matching `filter`, ordered by timestamp then id
pub async fn query_observations(
    pool: &SqlitePool,
    filter: &NoiseFilter,
) -> Result<Vec<NoiseObservation>> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_OBSERVATIONS);
    push_filters(&mut qb, filter);

    match &filter.range {
        DateRange::All => {}
        DateRange::Recent(window) => {
            // Anchor on the newest row the other filters select
            let Some(newest) = newest_timestamp(pool, filter).await? else {
                return Ok(Vec::new());
            };
            let start = parse_timestamp(&newest)? - window.duration();
            qb.push(" AND timestamp >= ");
            qb.push_bind(format_timestamp(start));
        }
        DateRange::Between { start, end } => {
            qb.push(" AND timestamp >= ");
            qb.push_bind(format_timestamp(*start));
            qb.push(" AND timestamp <= ");
            qb.push_bind(format_timestamp(*end));
        }
    }

    qb.push(" ORDER BY timestamp, obs_id");
    if let Some(limit) = filter.limit {
        qb.push(" LIMIT ");
        qb.push_bind(limit);
    }

    let rows = qb.build().fetch_all(pool).await?;
    rows.iter().map(row_to_observation).collect()
}

async fn newest_timestamp(pool: &SqlitePool, filter: &NoiseFilter) -> Result<Option<String>> {
    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT MAX(timestamp) FROM noise_observations WHERE 1 = 1",
    );
    push_filters(&mut qb, filter);
    let newest: Option<String> = qb.build_query_scalar().fetch_one(pool).await?;
    Ok(newest)
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &NoiseFilter) {
    if !filter.zones.is_empty() {
        qb.push(" AND zone_id IN (");
        let mut separated = qb.separated(", ");
        for zone in &filter.zones {
            separated.push_bind(zone.clone());
        }
        separated.push_unseparated(")");
    }
    if !filter.categories.is_empty() {
        qb.push(" AND category_tag IN (");
        let mut separated = qb.separated(", ");
        for category in &filter.categories {
            separated.push_bind(category.clone());
        }
        separated.push_unseparated(")");
    }
    if let Some(source) = filter.source {
        qb.push(" AND source = ");
        qb.push_bind(source.as_str());
    }
}

fn row_to_observation(row: &SqliteRow) -> Result<NoiseObservation> {
    let timestamp: String = row.try_get("timestamp")?;
    let source: String = row.try_get("source")?;
    Ok(NoiseObservation {
        obs_id: row.try_get("obs_id")?,
        zone_id: row.try_get("zone_id")?,
        timestamp: parse_timestamp(&timestamp)?,
        source: source.parse::<NoiseSource>()?,
        value_db: row.try_get("value_db")?,
        category_tag: row.try_get("category_tag")?,
    })
}

/// Per zone and hour of day: sum of readings and their count
///
/// Canonical timestamps keep the hour at characters 12-13.
pub async fn hourly_noise(pool: &SqlitePool) -> Result<Vec<HourlyNoise>> {
    let rows = sqlx::query(
        r#"
        SELECT zone_id,
               CAST(substr(timestamp, 12, 2) AS INTEGER) AS hour,
               SUM(value_db) AS total_db,
               COUNT(*) AS readings
        FROM noise_observations
        GROUP BY zone_id, hour
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<HourlyNoise> {
            let hour: i64 = row.try_get("hour")?;
            Ok(HourlyNoise {
                zone_id: row.try_get("zone_id")?,
                hour: hour.clamp(0, 23) as u32,
                total_db: row.try_get("total_db")?,
                readings: row.try_get("readings")?,
            })
        })
        .collect()
}

/// Mean observed level per zone
pub async fn zone_mean_levels(pool: &SqlitePool) -> Result<HashMap<String, f64>> {
    let rows: Vec<(String, f64)> = sqlx::query_as(
        "SELECT zone_id, AVG(value_db) FROM noise_observations GROUP BY zone_id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}

pub async fn insert_observation(
    conn: &mut SqliteConnection,
    obs: &NoiseObservation,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO noise_observations (obs_id, zone_id, timestamp, source, value_db, category_tag)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&obs.obs_id)
    .bind(&obs.zone_id)
    .bind(format_timestamp(obs.timestamp))
    .bind(obs.source.as_str())
    .bind(obs.value_db)
    .bind(&obs.category_tag)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
