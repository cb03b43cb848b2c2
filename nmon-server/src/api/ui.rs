//! Dashboard pages and static assets
//!
//! Embedded at compile time so the binary serves the UI on its own.

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

use crate::AppState;

const INDEX_HTML: &str = include_str!("../../ui/index.html");
const EXPLORE_HTML: &str = include_str!("../../ui/explore.html");
const REPORT_HTML: &str = include_str!("../../ui/report.html");
const MODERATE_HTML: &str = include_str!("../../ui/moderate.html");
const HOTSPOTS_HTML: &str = include_str!("../../ui/hotspots.html");
const PLAN_HTML: &str = include_str!("../../ui/plan.html");
const QUEST_HTML: &str = include_str!("../../ui/quest.html");
const APP_JS: &str = include_str!("../../ui/app.js");
const APP_CSS: &str = include_str!("../../ui/app.css");

fn asset(content_type: &'static str, body: &'static str) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// GET /static/app.js
pub async fn serve_app_js() -> Response {
    asset("application/javascript", APP_JS)
}

/// GET /static/app.css
pub async fn serve_app_css() -> Response {
    asset("text/css", APP_CSS)
}

/// Page routes plus their shared assets
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/explore", get(|| async { Html(EXPLORE_HTML) }))
        .route("/report", get(|| async { Html(REPORT_HTML) }))
        .route("/moderate", get(|| async { Html(MODERATE_HTML) }))
        .route("/hotspots", get(|| async { Html(HOTSPOTS_HTML) }))
        .route("/plan", get(|| async { Html(PLAN_HTML) }))
        .route("/quest", get(|| async { Html(QUEST_HTML) }))
        .route("/static/app.js", get(serve_app_js))
        .route("/static/app.css", get(serve_app_css))
}
