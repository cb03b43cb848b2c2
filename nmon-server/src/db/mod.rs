//! Database access for nmon-server
//!
//! Plain async functions over the schema created by `nmon_common::db`.
//! Reads take the pool; writes take a connection so callers can group
//! them in a transaction.

pub mod interventions;
pub mod missions;
pub mod observations;
pub mod plans;
pub mod reports;
pub mod zones;

use nmon_common::normalize::next_sequential_id;
use nmon_common::Result;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

/// Transaction that holds the write lock from its first statement
///
/// Required for transactions that read before they write (dedup checks,
/// id allocation). A deferred transaction in WAL mode that later tries to
/// write fails with `SQLITE_BUSY` instead of waiting for the other writer.
pub(crate) async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Next sequential id for `table.column`, e.g. `R601` after `R600`
///
/// `table` and `column` are always compile-time constants.
pub(crate) async fn next_id(
    conn: &mut SqliteConnection,
    table: &str,
    column: &str,
    prefix: &str,
    width: usize,
) -> Result<String> {
    let ids: Vec<String> = sqlx::query_scalar(&format!("SELECT {} FROM {}", column, table))
        .fetch_all(&mut *conn)
        .await?;
    Ok(next_sequential_id(ids.iter().map(String::as_str), prefix, width))
}

/// Count rows of a table
pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await?;
    Ok(count)
}
