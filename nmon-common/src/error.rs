//! Error type shared by the nmon crates
//!
//! The server maps each variant to an HTTP status: `NotFound` to 404,
//! `InvalidInput` to 400, `Conflict` to 409 and the rest to 500.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// SQLite failure, including lock timeouts and constraint violations
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data folder, config file or seed file access
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable config file or out-of-range setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown zone, report, plan or mission id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed filter, label, timestamp or request field
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Change refused by the record's current state, e.g. moderating a
    /// report that already has a decision
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data that no longer decodes, or a broken internal assumption
    #[error("Internal error: {0}")]
    Internal(String),
}
