//! Integration tests for the nmon-server API
//!
//! Each test builds the router over a fresh in-memory database holding a
//! small fixture:
//! - Z01 morning: 70 and 72 dB, Z03 evening: 71 dB, so the two tie at 71.00
//! - Z02 evening: 65 dB plus two validated reports (severity 66.60)
//! - Z03 day: 50 dB
//! - R003 is the only open report
//! - P001 (Z01, I01) and P002 (Z02, I01 + I02)

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use nmon_common::db::init_memory_database;
use nmon_common::models::{
    Decision, IncidentReport, ModerationDecision, NoiseObservation, NoiseSource, Plan, PlanStatus,
    ReportStatus, Zone,
};
use nmon_common::TimeWindow;
use nmon_server::seed::{synthetic, write_seed_data, SeedData};
use nmon_server::{build_router, AppState, ServiceSettings};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

fn zone(id: &str, name: &str) -> Zone {
    Zone {
        zone_id: id.to_string(),
        name: name.to_string(),
        geometry_stub: String::new(),
        tags: "residential".to_string(),
        adjacent: Vec::new(),
    }
}

fn observation(id: &str, zone_id: &str, hour: u32, value_db: f64) -> NoiseObservation {
    NoiseObservation {
        obs_id: id.to_string(),
        zone_id: zone_id.to_string(),
        timestamp: Utc.with_ymd_and_hms(2023, 1, 2, hour, 15, 0).unwrap(),
        source: NoiseSource::Sensor,
        value_db,
        category_tag: "traffic".to_string(),
    }
}

fn report(id: &str, zone_id: &str, window: TimeWindow, status: ReportStatus) -> IncidentReport {
    IncidentReport {
        report_id: id.to_string(),
        zone_id: zone_id.to_string(),
        timestamp: Utc.with_ymd_and_hms(2023, 1, 2, 20, 10, 0).unwrap(),
        category: "music".to_string(),
        time_window: window,
        description: format!("Fixture report {}", id),
        status,
        moderation_reason: None,
    }
}

fn decision(id: &str, report_id: &str, decision: Decision) -> ModerationDecision {
    ModerationDecision {
        decision_id: id.to_string(),
        report_id: report_id.to_string(),
        decision,
        reason: "fixture".to_string(),
        timestamp: Utc.with_ymd_and_hms(2023, 1, 3, 9, 0, 0).unwrap(),
    }
}

fn plan(id: &str, zone_id: &str, interventions: &[&str]) -> Plan {
    Plan {
        plan_id: id.to_string(),
        zone_id: zone_id.to_string(),
        interventions_selected: interventions.iter().map(|s| s.to_string()).collect(),
        budget: 1000.0,
        status: PlanStatus::Planned,
        expected_impact: 3.5,
        created_by: "planner".to_string(),
        notes: String::new(),
    }
}

fn fixture() -> SeedData {
    SeedData {
        zones: vec![zone("Z01", "Harbour"), zone("Z02", "Market"), zone("Z03", "Campus")],
        observations: vec![
            observation("O00001", "Z01", 7, 70.0),
            observation("O00002", "Z01", 8, 72.0),
            observation("O00003", "Z02", 20, 65.0),
            observation("O00004", "Z03", 12, 50.0),
            observation("O00005", "Z03", 18, 71.0),
        ],
        reports: vec![
            report("R001", "Z02", TimeWindow::Evening, ReportStatus::Valid),
            report("R002", "Z02", TimeWindow::Evening, ReportStatus::Valid),
            report("R003", "Z01", TimeWindow::Morning, ReportStatus::Pending),
            report("R004", "Z03", TimeWindow::Day, ReportStatus::Invalid),
            report("R005", "Z03", TimeWindow::Day, ReportStatus::Duplicate),
        ],
        decisions: vec![
            decision("D0001", "R001", Decision::Valid),
            decision("D0002", "R002", Decision::Valid),
            decision("D0003", "R004", Decision::Invalid),
            decision("D0004", "R005", Decision::Duplicate),
        ],
        interventions: synthetic::intervention_catalog(),
        plans: vec![plan("P001", "Z01", &["I01"]), plan("P002", "Z02", &["I01", "I02"])],
        missions: synthetic::quest_missions(),
    }
}

/// Test helper: router over a seeded in-memory database
async fn setup_app() -> Router {
    let pool = init_memory_database().await.expect("Should create database");
    write_seed_data(&pool, &fixture())
        .await
        .expect("Should write fixture");
    build_router(AppState::new(pool, ServiceSettings::default()))
}

/// Test helper: request with optional role, user and JSON body
fn request(method: &str, uri: &str, role: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
        builder = builder.header("Role", role);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn get(uri: &str) -> Request<Body> {
    request("GET", uri, None, None)
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

// =============================================================================
// Health, zones
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app().await;
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "nmon-server");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_zone_lookup_normalizes_id() {
    let app = setup_app().await;

    let (status, zones) = send(&app, get("/api/zones")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(zones.as_array().unwrap().len(), 3);

    let (status, zone) = send(&app, get("/api/zones/z2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(zone["name"], "Market");

    let (status, body) = send(&app, get("/api/zones/Z99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// Noise data
// =============================================================================

#[tokio::test]
async fn test_noise_data_filters_by_zone() {
    let app = setup_app().await;
    let (status, body) = send(&app, get("/api/noise_data?zones=Z03&source=Sensor")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    let ids: Vec<&str> = body["observations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["obs_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["O00004", "O00005"]);
}

#[tokio::test]
async fn test_noise_data_rejects_bad_source_and_half_range() {
    let app = setup_app().await;

    let (status, _) = send(&app, get("/api/noise_data?source=satellite")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/noise_data?start_date=2023-01-01")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Hotspots
// =============================================================================

#[tokio::test]
async fn test_hotspots_sorted_by_severity_then_zone() {
    let app = setup_app().await;
    let (status, body) = send(&app, get("/api/hotspots")).await;
    assert_eq!(status, StatusCode::OK);

    let hotspots = body["hotspots"].as_array().unwrap();
    let ranking: Vec<(&str, &str, f64)> = hotspots
        .iter()
        .map(|h| {
            (
                h["zone_id"].as_str().unwrap(),
                h["time_window"].as_str().unwrap(),
                h["severity_score"].as_f64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        ranking,
        vec![
            ("Z01", "morning(06-09)", 71.0),
            ("Z03", "evening(17-22)", 71.0),
            ("Z02", "evening(17-22)", 66.6),
            ("Z03", "day(09-17)", 50.0),
        ]
    );

    assert_eq!(hotspots[0]["hotspot_id"], "H01");
    assert_eq!(hotspots[2]["validated_report_count"], 2);
    assert_eq!(
        hotspots[2]["rationale"],
        "Average noise: 65.00 dB across 1 readings | Validated reports: 2"
    );
}

#[tokio::test]
async fn test_hotspots_top_limits_and_zero_is_rejected() {
    let app = setup_app().await;

    let (status, body) = send(&app, get("/api/hotspots?top=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hotspots"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, get("/api/hotspots?top=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// =============================================================================
// Reports and deduplication
// =============================================================================

#[tokio::test]
async fn test_similar_report_within_window_is_duplicate() {
    let app = setup_app().await;
    let first = json!({"zone_id": "z1", "category": "Traffic", "time_window": "morning"});

    let (status, stored) = send(&app, request("POST", "/api/reports", None, Some(first))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(stored["report_id"], "R006");
    assert_eq!(stored["zone_id"], "Z01");
    assert_eq!(stored["status"], "pending");
    assert_eq!(stored["time_window"], "morning(06-09)");

    let second = json!({"zone_id": "Z01", "category": "traffic"});
    let (status, body) = send(&app, request("POST", "/api/reports", None, Some(second))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "DUPLICATE_REPORT");
    assert_eq!(body["error"]["duplicate_of"], "R006");

    // Rejected submissions are not stored
    let (_, reports) = send(&app, get("/api/reports")).await;
    assert_eq!(reports.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_report_in_other_zone_is_not_duplicate() {
    let app = setup_app().await;
    let a = json!({"zone_id": "Z01", "category": "traffic"});
    let b = json!({"zone_id": "Z02", "category": "traffic"});

    let (status, _) = send(&app, request("POST", "/api/reports", None, Some(a))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, request("POST", "/api/reports", None, Some(b))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_report_validation() {
    let app = setup_app().await;

    let unknown_zone = json!({"zone_id": "Z42", "category": "traffic"});
    let (status, _) = send(&app, request("POST", "/api/reports", None, Some(unknown_zone))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown_category = json!({"zone_id": "Z01", "category": "fireworks"});
    let (status, _) =
        send(&app, request("POST", "/api/reports", None, Some(unknown_category))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing_field = json!({"zone_id": "Z01"});
    let (status, body) =
        send(&app, request("POST", "/api/reports", None, Some(missing_field))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_list_reports_by_status() {
    let app = setup_app().await;

    let (status, reports) = send(&app, get("/api/reports?status=valid")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reports.as_array().unwrap().len(), 2);

    let (status, _) = send(&app, get("/api/reports?status=archived")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Moderation
// =============================================================================

#[tokio::test]
async fn test_moderated_report_cannot_be_moderated_again() {
    let app = setup_app().await;
    let body = json!({"decision": "valid", "reason": "confirmed by sensor"});

    let (status, result) = send(
        &app,
        request("PUT", "/api/reports/R003", Some("planner"), Some(body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["report"]["status"], "valid");
    assert_eq!(result["report"]["moderation_reason"], "confirmed by sensor");
    assert_eq!(result["decision"]["decision_id"], "D0005");

    let again = json!({"decision": "invalid"});
    let (status, result) = send(
        &app,
        request("PUT", "/api/reports/R003", Some("planner"), Some(again)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(result["error"]["code"], "CONFLICT");

    let (status, detail) = send(&app, get("/api/reports/R003")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["status"], "valid");
    assert_eq!(detail["decisions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_moderation_requires_planner() {
    let app = setup_app().await;
    let body = json!({"decision": "valid"});

    let (status, result) =
        send(&app, request("PUT", "/api/reports/R003", None, Some(body.clone()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(result["error"]["code"], "FORBIDDEN");

    let (status, _) = send(
        &app,
        request("PUT", "/api/reports/R003", Some("superuser"), Some(body.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        request("PUT", "/api/reports/R999", Some("planner"), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let bad = json!({"decision": "maybe"});
    let (status, _) = send(
        &app,
        request("PUT", "/api/reports/R003", Some("planner"), Some(bad)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_role_is_rejected_on_open_routes() {
    let app = setup_app().await;

    let (status, body) = send(&app, request("GET", "/api/zones", Some("hacker"), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let report = json!({"zone_id": "Z01", "category": "traffic"});
    let (status, _) = send(
        &app,
        request("POST", "/api/reports", Some("hacker"), Some(report)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Nothing was stored
    let (_, reports) = send(&app, get("/api/reports")).await;
    assert_eq!(reports.as_array().unwrap().len(), 5);

    let (status, _) = send(
        &app,
        request("GET", "/api/hotspots", Some("hacker"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_known_roles_pass_open_routes_and_buildinfo_skips_check() {
    let app = setup_app().await;

    for role in ["community", "Planner", "maintainer"] {
        let (status, _) = send(&app, request("GET", "/api/zones", Some(role), None)).await;
        assert_eq!(status, StatusCode::OK, "{}", role);
    }

    let (status, body) =
        send(&app, request("GET", "/api/buildinfo", Some("hacker"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_moderation_reason_defaults() {
    let app = setup_app().await;
    let (status, result) = send(
        &app,
        request(
            "PUT",
            "/api/reports/R003",
            Some("planner"),
            Some(json!({"decision": "duplicate"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["decision"]["reason"], "unspecified");
}

// =============================================================================
// Plans
// =============================================================================

#[tokio::test]
async fn test_compare_two_plans() {
    let app = setup_app().await;
    let (status, body) = send(&app, get("/api/plans/compare?plan_ids=P001,P002")).await;
    assert_eq!(status, StatusCode::OK);

    let plans = body["plans"].as_array().unwrap();
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0]["plan_id"], "P001");
    assert_eq!(plans[1]["plan_id"], "P002");
    for plan in plans {
        assert!(plan["impact_mid_db"].as_f64().unwrap() >= 0.0);
        assert!(plan["expected_avg_db"].as_f64().unwrap() >= 0.0);
    }
    assert_eq!(plans[0]["impact_mid_db"], 3.5);
    assert_eq!(plans[0]["expected_avg_db"], 67.5);
    assert_eq!(plans[1]["impact_low_db"], 7.0);
    assert_eq!(plans[1]["impact_high_db"], 15.0);

    assert_eq!(body["summary"]["zones_covered"], 2);
    assert_eq!(body["summary"]["total_zones"], 3);
}

#[tokio::test]
async fn test_compare_needs_two_known_plans() {
    let app = setup_app().await;

    let (status, _) = send(&app, get("/api/plans/compare?plan_ids=P001")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Repeats collapse to one plan
    let (status, _) = send(&app, get("/api/plans/compare?plan_ids=P001&plan_ids=P001")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/plans/compare?plan_ids=P001,P404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_planner_creates_and_updates_plan() {
    let app = setup_app().await;
    let body = json!({"zone_id": "Z03", "interventions": ["I01", "i02"], "notes": "pilot"});

    let (status, _) = send(&app, request("POST", "/api/plans", None, Some(body.clone()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, plan) =
        send(&app, request("POST", "/api/plans", Some("planner"), Some(body))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(plan["plan_id"], "P003");
    assert_eq!(plan["budget"], 6000.0);
    assert_eq!(plan["expected_impact"], 11.0);
    assert_eq!(plan["status"], "planned");
    assert_eq!(plan["interventions_selected"], json!(["I01", "I02"]));

    let (status, updated) = send(
        &app,
        request(
            "PATCH",
            "/api/plans/P003",
            Some("planner"),
            Some(json!({"status": "in_progress"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "in_progress");
    assert_eq!(updated["notes"], "pilot");

    let (status, plans) = send(&app, get("/api/plans?status=in_progress")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plans.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_plan_validation() {
    let app = setup_app().await;

    let unknown_zone = json!({"zone_id": "Z77", "interventions": ["I01"]});
    let (status, _) = send(
        &app,
        request("POST", "/api/plans", Some("planner"), Some(unknown_zone)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let unknown_intervention = json!({"zone_id": "Z01", "interventions": ["I99"]});
    let (status, _) = send(
        &app,
        request("POST", "/api/plans", Some("planner"), Some(unknown_intervention)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let empty = json!({"zone_id": "Z01", "interventions": []});
    let (status, _) =
        send(&app, request("POST", "/api/plans", Some("planner"), Some(empty))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request("PUT", "/api/plans/P001", Some("planner"), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request(
            "PUT",
            "/api/plans/P999",
            Some("planner"),
            Some(json!({"status": "done"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Quest
// =============================================================================

fn as_user(mut req: Request<Body>, user: &str) -> Request<Body> {
    req.headers_mut()
        .insert("x-user-id", user.parse().unwrap());
    req
}

#[tokio::test]
async fn test_quest_answer_progress_and_reset() {
    let app = setup_app().await;

    let (status, tiers) = send(&app, as_user(get("/api/missions"), "alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tiers["1"].as_array().unwrap().len(), 3);
    assert!(tiers["1"][0].get("answer_key").is_none());
    assert_eq!(tiers["1"][0]["completed"], false);

    let answer = request("POST", "/api/missions/M01/answer", None, Some(json!({"answer": "60 dB"})));
    let (status, result) = send(&app, as_user(answer, "alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["correct"], true);
    assert_eq!(result["correct_answer"], "60 dB");

    let wrong = request("POST", "/api/missions/M02/answer", None, Some(json!({"answer": "10 dB"})));
    let (_, result) = send(&app, as_user(wrong, "alice")).await;
    assert_eq!(result["correct"], false);

    let (_, progress) = send(&app, as_user(get("/api/quest/progress"), "alice")).await;
    assert_eq!(progress["tier_progress"]["1"], 1);
    assert_eq!(progress["total_correct"], 1);
    assert_eq!(progress["completed"]["M02"]["user_answer"], "10 dB");

    // Progress is per user
    let (_, other) = send(&app, as_user(get("/api/quest/progress"), "bob")).await;
    assert_eq!(other["total_correct"], 0);

    let reset = request("POST", "/api/quest/reset", None, None);
    let (status, _) = send(&app, as_user(reset, "alice")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, progress) = send(&app, as_user(get("/api/quest/progress"), "alice")).await;
    assert_eq!(progress["total_correct"], 0);
}

#[tokio::test]
async fn test_quest_answer_errors() {
    let app = setup_app().await;

    let empty = request("POST", "/api/missions/M01/answer", None, Some(json!({"answer": "  "})));
    let (status, _) = send(&app, empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = request("POST", "/api/missions/M99/answer", None, Some(json!({"answer": "x"})));
    let (status, _) = send(&app, unknown).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_planner_creates_mission() {
    let app = setup_app().await;
    let mission = json!({
        "tier": 2,
        "title": "Night limits",
        "question": "Which window is quietest?",
        "options": ["night", "day"],
        "answer_key": "night",
        "hint": "Most people sleep",
        "explanation": "Night levels are lowest"
    });

    let (status, _) =
        send(&app, request("POST", "/api/missions", None, Some(mission.clone()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) =
        send(&app, request("POST", "/api/missions", Some("planner"), Some(mission))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["mission_id"], "M10");

    let bad_key = json!({
        "tier": 1, "title": "t", "question": "q",
        "options": ["a", "b"], "answer_key": "c"
    });
    let (status, _) =
        send(&app, request("POST", "/api/missions", Some("planner"), Some(bad_key))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Export and success measures
// =============================================================================

#[tokio::test]
async fn test_export_reports_csv() {
    let app = setup_app().await;
    let response = app
        .clone()
        .oneshot(get("/api/export/csv?type=reports&status=valid"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"reports.csv\""
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("report_id,zone_id,timestamp"));
    assert!(lines[1].starts_with("R001,Z02,"));
}

#[tokio::test]
async fn test_export_rejects_unknown_type() {
    let app = setup_app().await;
    let (status, _) = send(&app, get("/api/export/csv?type=pdf")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_success_measures_for_maintainer_only() {
    let app = setup_app().await;

    let (status, _) = send(&app, get("/api/success_measures")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request("GET", "/api/success_measures", Some("maintainer"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hotspot_validity"], 1.0);
    assert_eq!(body["reporting_quality"], 0.25);
    assert_eq!(body["community_understanding"], 0.0);
}

// =============================================================================
// UI
// =============================================================================

#[tokio::test]
async fn test_pages_and_assets_served() {
    let app = setup_app().await;
    for uri in ["/", "/explore", "/report", "/moderate", "/hotspots", "/plan", "/quest"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }

    let response = app.clone().oneshot(get("/static/app.js")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/javascript"
    );
}
