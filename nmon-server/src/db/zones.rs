//! Zone and adjacency persistence

use std::collections::HashMap;

use nmon_common::models::Zone;
use nmon_common::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Load all zones with their neighbours, ordered by id
pub async fn list_zones(pool: &SqlitePool) -> Result<Vec<Zone>> {
    let rows = sqlx::query(
        "SELECT zone_id, name, geometry_stub, tags FROM zones ORDER BY zone_id",
    )
    .fetch_all(pool)
    .await?;

    let mut adjacency = load_adjacency(pool).await?;

    rows.into_iter()
        .map(|row| -> Result<Zone> {
            let zone_id: String = row.try_get("zone_id")?;
            let adjacent = adjacency.remove(&zone_id).unwrap_or_default();
            Ok(Zone {
                zone_id,
                name: row.try_get("name")?,
                geometry_stub: row.try_get("geometry_stub")?,
                tags: row.try_get("tags")?,
                adjacent,
            })
        })
        .collect()
}

/// Load one zone by id
pub async fn get_zone(pool: &SqlitePool, zone_id: &str) -> Result<Option<Zone>> {
    let row = sqlx::query(
        "SELECT zone_id, name, geometry_stub, tags FROM zones WHERE zone_id = ?",
    )
    .bind(zone_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let adjacent: Vec<String> = sqlx::query_scalar(
        "SELECT neighbor_id FROM zone_adjacency WHERE zone_id = ? ORDER BY neighbor_id",
    )
    .bind(zone_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(Zone {
        zone_id: row.try_get("zone_id")?,
        name: row.try_get("name")?,
        geometry_stub: row.try_get("geometry_stub")?,
        tags: row.try_get("tags")?,
        adjacent,
    }))
}

pub async fn zone_exists(pool: &SqlitePool, zone_id: &str) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM zones WHERE zone_id = ?")
        .bind(zone_id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Map of zone id to display name
pub async fn zone_names(pool: &SqlitePool) -> Result<HashMap<String, String>> {
    let rows: Vec<(String, String)> = sqlx::query_as("SELECT zone_id, name FROM zones")
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().collect())
}

async fn load_adjacency(pool: &SqlitePool) -> Result<HashMap<String, Vec<String>>> {
    let pairs: Vec<(String, String)> = sqlx::query_as(
        "SELECT zone_id, neighbor_id FROM zone_adjacency ORDER BY zone_id, neighbor_id",
    )
    .fetch_all(pool)
    .await?;

    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    for (zone_id, neighbor_id) in pairs {
        adjacency.entry(zone_id).or_default().push(neighbor_id);
    }
    Ok(adjacency)
}

/// Insert a zone and its adjacency rows
///
/// Neighbours must already exist, so seeders insert every zone first and
/// the adjacency afterwards via [`insert_adjacency`].
pub async fn insert_zone(conn: &mut SqliteConnection, zone: &Zone) -> Result<()> {
    sqlx::query("INSERT INTO zones (zone_id, name, geometry_stub, tags) VALUES (?, ?, ?, ?)")
        .bind(&zone.zone_id)
        .bind(&zone.name)
        .bind(&zone.geometry_stub)
        .bind(&zone.tags)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Record that two zones are neighbours (both directions)
pub async fn insert_adjacency(conn: &mut SqliteConnection, a: &str, b: &str) -> Result<()> {
    for (from, to) in [(a, b), (b, a)] {
        sqlx::query(
            "INSERT OR IGNORE INTO zone_adjacency (zone_id, neighbor_id) VALUES (?, ?)",
        )
        .bind(from)
        .bind(to)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmon_common::db::init_memory_database;

    fn zone(id: &str, name: &str) -> Zone {
        Zone {
            zone_id: id.to_string(),
            name: name.to_string(),
            geometry_stub: String::new(),
            tags: "residential".to_string(),
            adjacent: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_zones_with_adjacency() {
        let pool = init_memory_database().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        insert_zone(&mut conn, &zone("Z02", "Market")).await.unwrap();
        insert_zone(&mut conn, &zone("Z01", "Harbour")).await.unwrap();
        insert_adjacency(&mut conn, "Z01", "Z02").await.unwrap();
        insert_adjacency(&mut conn, "Z02", "Z01").await.unwrap();
        drop(conn);

        let zones = list_zones(&pool).await.unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].zone_id, "Z01");
        assert_eq!(zones[0].adjacent, vec!["Z02".to_string()]);
        assert_eq!(zones[1].adjacent, vec!["Z01".to_string()]);

        let one = get_zone(&pool, "Z02").await.unwrap().unwrap();
        assert_eq!(one.name, "Market");
        assert!(get_zone(&pool, "Z09").await.unwrap().is_none());
        assert!(zone_exists(&pool, "Z01").await.unwrap());
        assert_eq!(zone_names(&pool).await.unwrap()["Z01"], "Harbour");
    }
}
