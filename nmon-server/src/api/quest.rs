//! Quest missions and per-user progress

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use nmon_common::models::{GradingType, Mission, QuestAnswer};
use nmon_common::time;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::role::{RequirePlanner, UserId};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Mission as shown to players; the answer key stays server-side
#[derive(Debug, Serialize)]
pub struct MissionView {
    pub mission_id: String,
    pub tier: i64,
    pub title: String,
    pub question: String,
    pub options: Vec<String>,
    pub grading_type: GradingType,
    pub hint: String,
    pub completed: bool,
    /// `None` until the user has answered
    pub correct: Option<bool>,
}

impl MissionView {
    fn new(mission: Mission, answer: Option<&QuestAnswer>) -> Self {
        Self {
            mission_id: mission.mission_id,
            tier: mission.tier,
            title: mission.title,
            question: mission.question,
            options: mission.options,
            grading_type: mission.grading_type,
            hint: mission.hint,
            completed: answer.is_some(),
            correct: answer.map(|a| a.correct),
        }
    }
}

/// GET /api/missions
///
/// Missions grouped by tier (`"1"`, `"2"`, `"3"`), annotated with the
/// caller's progress.
pub async fn list_missions(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> ApiResult<Json<BTreeMap<String, Vec<MissionView>>>> {
    let missions = db::missions::list_missions(&state.db).await?;
    let progress = db::missions::progress_for_user(&state.db, &user_id).await?;

    let mut tiers: BTreeMap<String, Vec<MissionView>> = BTreeMap::new();
    for mission in missions {
        let answer = progress.iter().find(|a| a.mission_id == mission.mission_id);
        tiers
            .entry(mission.tier.to_string())
            .or_default()
            .push(MissionView::new(mission, answer));
    }
    Ok(Json(tiers))
}

#[derive(Debug, Deserialize)]
pub struct CreateMissionRequest {
    pub tier: i64,
    pub title: String,
    pub question: String,
    pub options: Vec<String>,
    pub answer_key: String,
    #[serde(default)]
    pub grading_type: Option<String>,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub explanation: String,
}

/// POST /api/missions (planner)
pub async fn create_mission(
    _planner: RequirePlanner,
    State(state): State<AppState>,
    body: Result<Json<CreateMissionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MissionView>)> {
    let Json(request) = body?;

    if !(1..=3).contains(&request.tier) {
        return Err(ApiError::BadRequest(format!(
            "tier must be 1, 2 or 3, got {}",
            request.tier
        )));
    }
    if request.title.trim().is_empty() || request.question.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "title and question are required".to_string(),
        ));
    }
    let options: Vec<String> = request
        .options
        .iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if options.is_empty() {
        return Err(ApiError::BadRequest("options must not be empty".to_string()));
    }
    if options.iter().any(|o| o.contains(db::missions::OPTION_SEPARATOR)) {
        return Err(ApiError::BadRequest(format!(
            "options may not contain {:?}",
            db::missions::OPTION_SEPARATOR
        )));
    }
    let grading_type = match request.grading_type.as_deref().map(str::trim) {
        None | Some("") => GradingType::Choice,
        Some(raw) => raw.parse()?,
    };
    let answer_key = request.answer_key.trim().to_string();
    if grading_type == GradingType::Choice && !options.contains(&answer_key) {
        return Err(ApiError::BadRequest(
            "answer_key must be one of the options".to_string(),
        ));
    }

    let mission = db::missions::create_mission(
        &state.db,
        Mission {
            mission_id: String::new(),
            tier: request.tier,
            title: request.title.trim().to_string(),
            question: request.question.trim().to_string(),
            options,
            answer_key,
            grading_type,
            hint: request.hint,
            explanation: request.explanation,
        },
    )
    .await?;

    info!(mission_id = %mission.mission_id, tier = mission.tier, "Mission created");
    Ok((StatusCode::CREATED, Json(MissionView::new(mission, None))))
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub correct: bool,
    pub correct_answer: String,
    pub explanation: String,
}

/// POST /api/missions/:id/answer
///
/// Grades the answer and records it; a later answer replaces the earlier.
pub async fn submit_answer(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path(mission_id): Path<String>,
    body: Result<Json<AnswerRequest>, JsonRejection>,
) -> ApiResult<Json<AnswerResponse>> {
    let mission = db::missions::get_mission(&state.db, &mission_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Mission {} not found", mission_id)))?;

    let Json(request) = body?;
    let answer = request.answer.trim();
    if answer.is_empty() {
        return Err(ApiError::BadRequest("No answer provided".to_string()));
    }

    let correct = mission.is_correct(answer);
    db::missions::record_answer(
        &state.db,
        &user_id,
        &QuestAnswer {
            mission_id: mission.mission_id.clone(),
            tier: mission.tier,
            correct,
            user_answer: answer.to_string(),
        },
        time::now(),
    )
    .await?;
    debug!(%user_id, mission_id = %mission.mission_id, correct, "Answer recorded");

    Ok(Json(AnswerResponse {
        correct,
        correct_answer: mission.answer_key,
        explanation: mission.explanation,
    }))
}

#[derive(Debug, Serialize)]
pub struct CompletedMission {
    pub correct: bool,
    pub tier: i64,
    pub user_answer: String,
}

#[derive(Debug, Serialize)]
pub struct QuestProgress {
    pub completed: BTreeMap<String, CompletedMission>,
    /// Correct answers per tier, keyed `"1"`..`"3"`
    pub tier_progress: BTreeMap<String, i64>,
    pub total_correct: i64,
}

/// GET /api/quest/progress
pub async fn get_progress(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> ApiResult<Json<QuestProgress>> {
    let answers = db::missions::progress_for_user(&state.db, &user_id).await?;

    let mut tier_progress: BTreeMap<String, i64> =
        (1..=3).map(|tier: i64| (tier.to_string(), 0)).collect();
    let mut completed = BTreeMap::new();
    for answer in answers {
        if answer.correct {
            if let Some(count) = tier_progress.get_mut(&answer.tier.to_string()) {
                *count += 1;
            }
        }
        completed.insert(
            answer.mission_id,
            CompletedMission {
                correct: answer.correct,
                tier: answer.tier,
                user_answer: answer.user_answer,
            },
        );
    }
    let total_correct = tier_progress.values().sum();

    Ok(Json(QuestProgress {
        completed,
        tier_progress,
        total_correct,
    }))
}

/// POST /api/quest/reset
pub async fn reset_progress(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> ApiResult<Json<Value>> {
    let cleared = db::missions::reset_progress(&state.db, &user_id).await?;
    info!(%user_id, cleared, "Quest progress reset");
    Ok(Json(json!({ "status": "reset", "cleared": cleared })))
}
