//! Zone endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use nmon_common::models::Zone;
use nmon_common::normalize;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/zones
pub async fn list_zones(State(state): State<AppState>) -> ApiResult<Json<Vec<Zone>>> {
    Ok(Json(db::zones::list_zones(&state.db).await?))
}

/// GET /api/zones/:id
///
/// Accepts loose ids (`z3`, `3`).
pub async fn get_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
) -> ApiResult<Json<Zone>> {
    let zone_id = normalize::zone_id(&zone_id);
    db::zones::get_zone(&state.db, &zone_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Zone {} not found", zone_id)))
}
