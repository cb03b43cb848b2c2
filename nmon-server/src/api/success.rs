//! Service success measures

use axum::{extract::State, Json};

use super::noise::current_hotspots;
use super::role::RequireMetricsViewer;
use crate::db;
use crate::error::ApiResult;
use crate::services::success::{hotspot_validity, ratio, SuccessMeasures};
use crate::AppState;

/// GET /api/success_measures (maintainer or planner)
pub async fn get_success_measures(
    _viewer: RequireMetricsViewer,
    State(state): State<AppState>,
) -> ApiResult<Json<SuccessMeasures>> {
    let hotspots = current_hotspots(&state, state.settings.hotspot_default_top).await?;
    let zone_levels = db::observations::zone_mean_levels(&state.db).await?;
    let (duplicates, decisions) = db::reports::decision_counts(&state.db).await?;
    let (correct, answers) = db::missions::answer_counts(&state.db).await?;

    Ok(Json(SuccessMeasures {
        hotspot_validity: hotspot_validity(&hotspots, &zone_levels),
        reporting_quality: ratio(duplicates, decisions),
        community_understanding: ratio(correct, answers),
    }))
}
