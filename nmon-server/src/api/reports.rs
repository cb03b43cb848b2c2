//! Incident report submission and moderation endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use nmon_common::models::{Decision, IncidentReport, ModerationDecision, ReportStatus};
use nmon_common::{normalize, time, TimeWindow};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::role::RequirePlanner;
use crate::db;
use crate::db::reports::{NewReport, SubmitOutcome};
use crate::error::{ApiError, ApiResult};
use crate::services::dedup::DedupVerdict;
use crate::services::noise_filter::single_value;
use crate::AppState;

/// Reason stored when a moderator gives none
pub const DEFAULT_MODERATION_REASON: &str = "unspecified";

/// GET /api/reports?status=
pub async fn list_reports(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<Vec<IncidentReport>>> {
    let Query(pairs) = query?;
    let status = single_value(&pairs, "status")
        .map(str::parse::<ReportStatus>)
        .transpose()?;
    Ok(Json(db::reports::list_reports(&state.db, status).await?))
}

#[derive(Debug, Serialize)]
pub struct ReportDetail {
    #[serde(flatten)]
    pub report: IncidentReport,
    pub decisions: Vec<ModerationDecision>,
}

/// GET /api/reports/:id
pub async fn get_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
) -> ApiResult<Json<ReportDetail>> {
    let report = db::reports::get_report(&state.db, &report_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Report {} not found", report_id)))?;
    let decisions = db::reports::decisions_for_report(&state.db, &report_id).await?;
    Ok(Json(ReportDetail { report, decisions }))
}

#[derive(Debug, Deserialize)]
pub struct SubmitReportRequest {
    pub zone_id: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub time_window: Option<String>,
}

/// POST /api/reports
///
/// 201 with the stored report, or 409 `DUPLICATE_REPORT` naming the
/// earlier report when the submission repeats a recent one.
pub async fn submit_report(
    State(state): State<AppState>,
    body: Result<Json<SubmitReportRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IncidentReport>)> {
    let Json(request) = body?;

    let zone_id = normalize::zone_id(&request.zone_id);
    let category = normalize::category(&request.category);
    if zone_id.is_empty() || category.is_empty() {
        return Err(ApiError::BadRequest(
            "Missing required fields: zone_id and category".to_string(),
        ));
    }
    if !normalize::is_known_category(&category) {
        return Err(ApiError::BadRequest(format!(
            "Unknown category {:?}; expected one of {}",
            category,
            normalize::CATEGORIES.join(", ")
        )));
    }
    if !db::zones::zone_exists(&state.db, &zone_id).await? {
        return Err(ApiError::BadRequest(format!("Unknown zone {}", zone_id)));
    }

    let timestamp = time::now();
    let time_window = TimeWindow::resolve(request.time_window.as_deref(), timestamp);
    let description = match request.description.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => format!(
            "Report of {} noise in {} during {}.",
            category, zone_id, time_window
        ),
    };

    let new_report = NewReport {
        zone_id,
        category,
        time_window,
        description,
        timestamp,
    };

    match db::reports::submit_report(&state.db, &new_report, state.settings.dedup_window).await? {
        SubmitOutcome::Stored(report) => {
            info!(report_id = %report.report_id, zone_id = %report.zone_id, "Report stored");
            Ok((StatusCode::CREATED, Json(report)))
        }
        SubmitOutcome::Rejected(DedupVerdict::Duplicate { report_id, .. }) => {
            info!(zone_id = %new_report.zone_id, duplicate_of = %report_id, "Duplicate report rejected");
            Err(ApiError::DuplicateReport {
                duplicate_of: report_id,
            })
        }
        SubmitOutcome::Rejected(DedupVerdict::Unique) => Err(ApiError::Internal(
            "Report rejected without a matching report".to_string(),
        )),
    }
}

#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    pub decision: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModerateResponse {
    pub report: IncidentReport,
    pub decision: ModerationDecision,
}

/// PUT /api/reports/:id (planner)
///
/// Only open reports can be moderated; anything else is 409.
pub async fn moderate_report(
    _planner: RequirePlanner,
    State(state): State<AppState>,
    Path(report_id): Path<String>,
    body: Result<Json<ModerateRequest>, JsonRejection>,
) -> ApiResult<Json<ModerateResponse>> {
    let Json(request) = body?;
    let decision: Decision = request.decision.parse()?;
    let reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_MODERATION_REASON);

    let (report, decision) =
        db::reports::moderate_report(&state.db, &report_id, decision, reason, time::now()).await?;
    info!(
        report_id = %report.report_id,
        decision = %decision.decision,
        "Report moderated"
    );
    Ok(Json(ModerateResponse { report, decision }))
}
