//! # nmon Common Library
//!
//! Shared code for the noise monitoring service:
//! - Domain models (zones, observations, reports, plans, missions)
//! - Time window bucketing and timestamp helpers
//! - Identifier normalization
//! - Configuration loading
//! - Database schema and connection setup

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod normalize;
pub mod time;
pub mod time_window;

pub use error::{Error, Result};
pub use time_window::TimeWindow;
