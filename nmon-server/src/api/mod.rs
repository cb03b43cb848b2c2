//! HTTP API handlers
//!
//! JSON endpoints are mounted under `/api`. Role checks are extractors
//! (see [`role`]) so each handler states the role it needs in its
//! signature.

pub mod buildinfo;
pub mod export;
pub mod health;
pub mod noise;
pub mod plans;
pub mod quest;
pub mod reports;
pub mod role;
pub mod success;
pub mod ui;
pub mod zones;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::AppState;

pub use health::health_routes;
pub use ui::ui_routes;

/// Routes mounted under `/api`
///
/// Every route except `/buildinfo` passes the role check.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/zones", get(zones::list_zones))
        .route("/zones/:id", get(zones::get_zone))
        .route("/noise_data", get(noise::get_noise_data))
        .route("/hotspots", get(noise::get_hotspots))
        .route(
            "/reports",
            get(reports::list_reports).post(reports::submit_report),
        )
        .route(
            "/reports/:id",
            get(reports::get_report).put(reports::moderate_report),
        )
        .route("/plans", get(plans::list_plans).post(plans::create_plan))
        .route("/plans/compare", get(plans::compare))
        .route(
            "/plans/:id",
            get(plans::get_plan)
                .put(plans::update_plan)
                .patch(plans::update_plan),
        )
        .route("/interventions", get(plans::list_interventions))
        .route(
            "/missions",
            get(quest::list_missions).post(quest::create_mission),
        )
        .route("/missions/:id/answer", post(quest::submit_answer))
        .route("/quest/progress", get(quest::get_progress))
        .route("/quest/reset", post(quest::reset_progress))
        .route("/export/csv", get(export::export_csv))
        .route("/success_measures", get(success::get_success_measures))
        .route_layer(middleware::from_fn(role::role_middleware))
        // Build info is read by every page footer, whatever its role
        .route("/buildinfo", get(buildinfo::get_build_info))
}
