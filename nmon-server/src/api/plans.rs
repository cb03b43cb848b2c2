//! Intervention catalog, plan tracking and plan comparison endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use nmon_common::models::{Intervention, Plan, PlanStatus};
use nmon_common::normalize;
use serde::Deserialize;
use tracing::info;

use super::role::RequirePlanner;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::services::noise_filter::single_value;
use crate::services::plan_compare::{compare_plans, parse_plan_ids, PlanComparison};
use crate::AppState;

/// GET /api/interventions
pub async fn list_interventions(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Intervention>>> {
    Ok(Json(db::interventions::list_interventions(&state.db).await?))
}

/// GET /api/plans?zone_id=&status=
pub async fn list_plans(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<Vec<Plan>>> {
    let Query(pairs) = query?;
    let zone_id = single_value(&pairs, "zone_id").map(normalize::zone_id);
    let status = single_value(&pairs, "status")
        .map(str::parse::<PlanStatus>)
        .transpose()?;

    let plans = db::plans::list_plans(&state.db, zone_id.as_deref(), status).await?;
    Ok(Json(plans))
}

/// GET /api/plans/:id
pub async fn get_plan(
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
) -> ApiResult<Json<Plan>> {
    db::plans::get_plan(&state.db, &plan_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Plan {} not found", plan_id)))
}

#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    pub zone_id: String,
    pub interventions: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// POST /api/plans (planner)
///
/// Budget is the sum of the cost band prices of the selected
/// interventions and expected impact the sum of their range midpoints.
pub async fn create_plan(
    _planner: RequirePlanner,
    State(state): State<AppState>,
    body: Result<Json<CreatePlanRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Plan>)> {
    let Json(request) = body?;

    let zone_id = normalize::zone_id(&request.zone_id);
    if !db::zones::zone_exists(&state.db, &zone_id).await? {
        return Err(ApiError::NotFound(format!("Zone {} not found", zone_id)));
    }

    let mut selected: Vec<String> = Vec::new();
    for id in &request.interventions {
        let id = id.trim().to_uppercase();
        if !id.is_empty() && !selected.contains(&id) {
            selected.push(id);
        }
    }
    if selected.is_empty() {
        return Err(ApiError::BadRequest(
            "interventions must be a non-empty list".to_string(),
        ));
    }

    let catalog = db::interventions::intervention_map(&state.db).await?;
    let mut budget = 0.0;
    let mut expected_impact = 0.0;
    for id in &selected {
        let intervention = catalog
            .get(id)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown intervention {}", id)))?;
        budget += intervention.cost_band.price();
        expected_impact += intervention.impact_range.midpoint();
    }

    let plan = db::plans::create_plan(
        &state.db,
        Plan {
            plan_id: String::new(),
            zone_id,
            interventions_selected: selected,
            budget,
            status: PlanStatus::Planned,
            expected_impact,
            created_by: "planner".to_string(),
            notes: request.notes.unwrap_or_default(),
        },
    )
    .await?;

    info!(plan_id = %plan.plan_id, zone_id = %plan.zone_id, budget = plan.budget, "Plan created");
    Ok((StatusCode::CREATED, Json(plan)))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlanRequest {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// PUT/PATCH /api/plans/:id (planner)
pub async fn update_plan(
    _planner: RequirePlanner,
    State(state): State<AppState>,
    Path(plan_id): Path<String>,
    body: Result<Json<UpdatePlanRequest>, JsonRejection>,
) -> ApiResult<Json<Plan>> {
    let Json(request) = body?;
    if request.status.is_none() && request.notes.is_none() {
        return Err(ApiError::BadRequest(
            "Provide status and/or notes".to_string(),
        ));
    }
    let status = request
        .status
        .as_deref()
        .map(str::parse::<PlanStatus>)
        .transpose()?;

    let plan =
        db::plans::update_plan(&state.db, &plan_id, status, request.notes.as_deref()).await?;
    info!(plan_id = %plan.plan_id, status = %plan.status, "Plan updated");
    Ok(Json(plan))
}

/// GET /api/plans/compare?plan_ids=P001,P002
///
/// At least two distinct plans; an unknown id is 404.
pub async fn compare(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<PlanComparison>> {
    let Query(pairs) = query?;
    let ids = parse_plan_ids(&pairs)?;

    let mut plans = Vec::with_capacity(ids.len());
    for id in &ids {
        let plan = db::plans::get_plan(&state.db, id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Plan {} not found", id)))?;
        plans.push(plan);
    }

    let catalog = db::interventions::intervention_map(&state.db).await?;
    let zone_levels = db::observations::zone_mean_levels(&state.db).await?;
    let zone_names = db::zones::zone_names(&state.db).await?;

    Ok(Json(compare_plans(&plans, &catalog, &zone_levels, &zone_names)))
}
