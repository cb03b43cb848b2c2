//! Noise observation and hotspot endpoints

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use nmon_common::models::NoiseObservation;
use serde::Serialize;
use tracing::debug;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::services::hotspots::{rank_hotspots, Hotspot};
use crate::services::noise_filter::{single_value, NoiseFilter};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct NoiseDataResponse {
    pub count: usize,
    pub observations: Vec<NoiseObservation>,
}

/// GET /api/noise_data
///
/// Query: `zones`, `categories`, `source`, `time_window` or
/// `start_date` + `end_date`, `limit`.
pub async fn get_noise_data(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<NoiseDataResponse>> {
    let Query(pairs) = query?;
    let filter = NoiseFilter::from_pairs(&pairs)?;
    debug!(?filter, "Noise query");

    let observations = db::observations::query_observations(&state.db, &filter).await?;
    Ok(Json(NoiseDataResponse {
        count: observations.len(),
        observations,
    }))
}

#[derive(Debug, Serialize)]
pub struct HotspotsResponse {
    pub top: usize,
    pub hotspots: Vec<Hotspot>,
}

/// Compute the hotspot ranking from current data
pub async fn current_hotspots(state: &AppState, top: usize) -> ApiResult<Vec<Hotspot>> {
    let noise = db::observations::hourly_noise(&state.db).await?;
    let reports = db::reports::window_report_counts(&state.db).await?;
    let zone_names = db::zones::zone_names(&state.db).await?;
    Ok(rank_hotspots(&noise, &reports, &zone_names, top))
}

/// GET /api/hotspots?top=N
pub async fn get_hotspots(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<HotspotsResponse>> {
    let Query(pairs) = query?;
    let top = match single_value(&pairs, "top") {
        None => state.settings.hotspot_default_top,
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(ApiError::BadRequest(format!(
                    "top must be a positive integer, got {:?}",
                    raw
                )))
            }
        },
    };

    let hotspots = current_hotspots(&state, top).await?;
    Ok(Json(HotspotsResponse { top, hotspots }))
}
