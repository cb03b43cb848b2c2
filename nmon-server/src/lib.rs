//! nmon-server library
//!
//! HTTP API and dashboard pages of the noise monitoring service, plus the
//! engines behind them (hotspot ranking, duplicate report filter, plan
//! comparison) and database seeding.

use std::time::Instant;

use axum::Router;
use nmon_common::config::ServerConfig;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cli;
pub mod db;
pub mod error;
pub mod seed;
pub mod services;

/// Request-time settings taken from the resolved configuration
#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    /// Look-back period of the duplicate report filter
    pub dedup_window: chrono::Duration,
    /// Hotspots returned when a request gives no `top`
    pub hotspot_default_top: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            dedup_window: chrono::Duration::minutes(services::dedup::DEFAULT_WINDOW_MINUTES),
            hotspot_default_top: 10,
        }
    }
}

impl From<&ServerConfig> for ServiceSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            dedup_window: chrono::Duration::minutes(config.dedup_window_minutes),
            hotspot_default_top: config.hotspot_default_top,
        }
    }
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub settings: ServiceSettings,
    /// Reported as uptime by `/health`
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(db: SqlitePool, settings: ServiceSettings) -> Self {
        Self {
            db,
            settings,
            startup_time: Instant::now(),
        }
    }
}

/// Build application router
///
/// JSON endpoints live under `/api`; pages, static assets and `/health`
/// are served from the root.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api::api_routes())
        .merge(api::ui_routes())
        .merge(api::health_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
