//! Deterministic synthetic seed data
//!
//! Twelve zones on a 3×4 grid, eight weeks of readings from 2023-01-01,
//! a report backlog with moderation history, the intervention catalog,
//! pre-built plans and the quest missions. The same seed always yields
//! the same data.

use chrono::{DateTime, Duration, TimeZone, Utc};
use nmon_common::models::{
    CostBand, Decision, GradingType, ImpactRange, IncidentReport, Intervention, Mission,
    ModerationDecision, NoiseObservation, NoiseSource, Plan, PlanStatus, ReportStatus, Zone,
};
use nmon_common::normalize::CATEGORIES;
use nmon_common::TimeWindow;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::SeedData;

pub const SEED: u64 = 42;

const GRID_ROWS: usize = 3;
const GRID_COLS: usize = 4;
const OBSERVATIONS: usize = 10_000;
const REPORTS: usize = 600;
const PLANS: usize = 200;
/// Days covered by generated timestamps (eight weeks)
const SPAN_DAYS: i64 = 56;

const ZONE_TAGS: [&str; 3] = ["residential", "campus", "event"];
const SOURCES: [NoiseSource; 2] = [NoiseSource::Sensor, NoiseSource::Report];
const REPORT_STATUSES: [ReportStatus; 5] = [
    ReportStatus::Pending,
    ReportStatus::UnderReview,
    ReportStatus::Valid,
    ReportStatus::Duplicate,
    ReportStatus::Invalid,
];
const PLAN_STATUSES: [PlanStatus; 3] = [PlanStatus::Planned, PlanStatus::InProgress, PlanStatus::Done];

/// Generate the full synthetic data set
pub fn generate() -> SeedData {
    let mut rng = StdRng::seed_from_u64(SEED);

    let zones = zones(&mut rng);
    let zone_ids: Vec<String> = zones.iter().map(|z| z.zone_id.clone()).collect();
    let observations = observations(&mut rng, &zone_ids);
    let (reports, decisions) = reports(&mut rng, &zone_ids);
    let interventions = intervention_catalog();
    let plans = plans(&mut rng, &zone_ids, &interventions);

    SeedData {
        zones,
        observations,
        reports,
        decisions,
        interventions,
        plans,
        missions: quest_missions(),
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn pick<'a, T>(rng: &mut StdRng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

/// Normally distributed sample (Box-Muller)
fn normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>(); // (0, 1], keeps ln finite
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn random_timestamp(rng: &mut StdRng) -> DateTime<Utc> {
    start()
        + Duration::days(rng.gen_range(0..SPAN_DAYS))
        + Duration::hours(rng.gen_range(0..24))
        + Duration::minutes(rng.gen_range(0..60))
}

fn zones(rng: &mut StdRng) -> Vec<Zone> {
    let id = |row: usize, col: usize| format!("Z{:02}", row * GRID_COLS + col + 1);

    let mut zones = Vec::with_capacity(GRID_ROWS * GRID_COLS);
    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            let mut adjacent = Vec::new();
            if row > 0 {
                adjacent.push(id(row - 1, col));
            }
            if col > 0 {
                adjacent.push(id(row, col - 1));
            }
            if col + 1 < GRID_COLS {
                adjacent.push(id(row, col + 1));
            }
            if row + 1 < GRID_ROWS {
                adjacent.push(id(row + 1, col));
            }
            adjacent.sort();

            let number = row * GRID_COLS + col + 1;
            zones.push(Zone {
                zone_id: id(row, col),
                name: format!("Zone {}", number),
                geometry_stub: format!("grid cell r{}c{}", row + 1, col + 1),
                tags: pick(rng, &ZONE_TAGS).to_string(),
                adjacent,
            });
        }
    }
    zones
}

fn observations(rng: &mut StdRng, zone_ids: &[String]) -> Vec<NoiseObservation> {
    (1..=OBSERVATIONS)
        .map(|n| NoiseObservation {
            obs_id: format!("O{:05}", n),
            zone_id: pick(rng, zone_ids).clone(),
            timestamp: random_timestamp(rng),
            source: *pick(rng, &SOURCES),
            value_db: (normal(rng, 60.0, 10.0).max(0.0) * 100.0).round() / 100.0,
            category_tag: pick(rng, &CATEGORIES).to_string(),
        })
        .collect()
}

/// Reports plus one decision for every report already in a terminal state
fn reports(
    rng: &mut StdRng,
    zone_ids: &[String],
) -> (Vec<IncidentReport>, Vec<ModerationDecision>) {
    let mut reports = Vec::with_capacity(REPORTS);
    let mut decisions = Vec::new();

    for n in 1..=REPORTS {
        let zone_id = pick(rng, zone_ids).clone();
        let timestamp = random_timestamp(rng);
        let category = pick(rng, &CATEGORIES).to_string();
        let status = *pick(rng, &REPORT_STATUSES);
        let report_id = format!("R{:03}", n);

        let decision = match status {
            ReportStatus::Valid => Some(Decision::Valid),
            ReportStatus::Duplicate => Some(Decision::Duplicate),
            ReportStatus::Invalid => Some(Decision::Invalid),
            ReportStatus::Pending | ReportStatus::UnderReview => None,
        };
        let moderation_reason = decision.map(|d| format!("Reason for {}", d));

        if let Some(decision) = decision {
            decisions.push(ModerationDecision {
                decision_id: format!("D{:04}", decisions.len() + 1),
                report_id: report_id.clone(),
                decision,
                reason: format!("Reason for {}", decision),
                timestamp: timestamp + Duration::hours(rng.gen_range(1..=48)),
            });
        }

        reports.push(IncidentReport {
            description: format!("Anonymous report of {} noise in {}", category, zone_id),
            report_id,
            zone_id,
            timestamp,
            category,
            time_window: TimeWindow::from_timestamp(timestamp),
            status,
            moderation_reason,
        });
    }

    (reports, decisions)
}

/// The fixed intervention catalog
pub fn intervention_catalog() -> Vec<Intervention> {
    const CATALOG: [(&str, &str, CostBand, i64, f64, f64, &str); 15] = [
        ("I01", "signage", CostBand::Low, 8, 2.0, 5.0, "Install quiet zone signs"),
        ("I02", "barriers", CostBand::Medium, 6, 5.0, 10.0, "Noise barriers"),
        ("I03", "scheduling_changes", CostBand::Low, 7, 3.0, 7.0, "Adjust event times"),
        ("I04", "quiet_hours", CostBand::Low, 9, 4.0, 8.0, "Enforce quiet hours"),
        ("I05", "maintenance", CostBand::Medium, 5, 1.0, 3.0, "Equipment maintenance"),
        ("I06", "education", CostBand::Low, 8, 1.0, 4.0, "Community education"),
        ("I07", "zoning", CostBand::High, 4, 5.0, 15.0, "Change zoning laws"),
        ("I08", "monitoring", CostBand::Medium, 7, 0.0, 2.0, "Increase monitoring"),
        ("I09", "insulation", CostBand::High, 5, 6.0, 12.0, "Building insulation"),
        ("I10", "traffic_control", CostBand::Medium, 6, 4.0, 9.0, "Traffic calming"),
        ("I11", "green_spaces", CostBand::High, 6, 2.0, 6.0, "Add green buffers"),
        ("I12", "curfews", CostBand::Low, 8, 3.0, 7.0, "Event curfews"),
        ("I13", "subsidies", CostBand::Medium, 7, 1.0, 5.0, "Subsidize quiet tech"),
        ("I14", "partnerships", CostBand::Low, 9, 0.0, 3.0, "Community partnerships"),
        ("I15", "regulations", CostBand::High, 3, 7.0, 20.0, "New noise regulations"),
    ];

    CATALOG
        .iter()
        .map(|&(id, kind, cost_band, feasibility, low, high, notes)| Intervention {
            intervention_id: id.to_string(),
            kind: kind.to_string(),
            cost_band,
            feasibility_score: feasibility,
            impact_range: ImpactRange {
                low_db: low,
                high_db: high,
            },
            notes: notes.to_string(),
        })
        .collect()
}

/// Plans whose budget and impact follow from their interventions
fn plans(rng: &mut StdRng, zone_ids: &[String], catalog: &[Intervention]) -> Vec<Plan> {
    (1..=PLANS)
        .map(|n| {
            let count = rng.gen_range(1..=5);
            let selected: Vec<&Intervention> = catalog.choose_multiple(rng, count).collect();
            let budget: f64 = selected.iter().map(|i| i.cost_band.price()).sum();
            let impact: f64 = selected.iter().map(|i| i.impact_range.midpoint()).sum();

            Plan {
                plan_id: format!("P{:03}", n),
                zone_id: pick(rng, zone_ids).clone(),
                interventions_selected: selected
                    .iter()
                    .map(|i| i.intervention_id.clone())
                    .collect(),
                budget,
                status: *pick(rng, &PLAN_STATUSES),
                expected_impact: (impact * 100.0).round() / 100.0,
                created_by: "planner".to_string(),
                notes: String::new(),
            }
        })
        .collect()
}

/// The built-in quest: three missions per tier
pub fn quest_missions() -> Vec<Mission> {
    let choice = |id: &str,
                  tier: i64,
                  title: &str,
                  question: &str,
                  options: &[&str],
                  answer: &str,
                  hint: &str,
                  explanation: &str| Mission {
        mission_id: id.to_string(),
        tier,
        title: title.to_string(),
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        answer_key: answer.to_string(),
        grading_type: GradingType::Choice,
        hint: hint.to_string(),
        explanation: explanation.to_string(),
    };

    let mut missions = vec![
        choice(
            "M01",
            1,
            "Decibel basics",
            "Roughly how loud is normal conversation?",
            &["30 dB", "60 dB", "90 dB", "120 dB"],
            "60 dB",
            "Quieter than traffic, louder than a library.",
            "Conversation at one metre sits around 60 dB.",
        ),
        choice(
            "M02",
            1,
            "Doubling the noise",
            "How many decibels louder is a sound with twice the acoustic energy?",
            &["1 dB", "3 dB", "10 dB", "20 dB"],
            "3 dB",
            "The decibel scale is logarithmic.",
            "Doubling the energy adds about 3 dB.",
        ),
        choice(
            "M03",
            1,
            "Quiet hours",
            "Which time window usually has the lowest background noise?",
            &["morning(06-09)", "day(09-17)", "evening(17-22)", "night(00-06)"],
            "night(00-06)",
            "Think about when traffic is lightest.",
            "Night hours carry the least traffic and activity.",
        ),
        choice(
            "M04",
            2,
            "Reading hotspots",
            "A hotspot score is the average noise plus what?",
            &[
                "0.8 per validated report",
                "1 per pending report",
                "The number of sensors",
                "The zone area",
            ],
            "0.8 per validated report",
            "Only moderated reports count.",
            "Each validated report adds 0.8 to the severity score.",
        ),
        choice(
            "M05",
            2,
            "Duplicate reports",
            "Two reports of music noise in the same zone 20 minutes apart are treated as?",
            &["Two incidents", "A duplicate", "Invalid", "A hotspot"],
            "A duplicate",
            "Look at the recency window.",
            "Same zone and category within an hour counts as a duplicate.",
        ),
        choice(
            "M06",
            2,
            "Cheap wins",
            "Which intervention has the best feasibility score?",
            &["Zoning", "Quiet hours", "Regulations", "Insulation"],
            "Quiet hours",
            "Low cost measures tend to be easiest.",
            "Enforcing quiet hours scores 9 for feasibility at low cost.",
        ),
        choice(
            "M07",
            3,
            "Plan trade-offs",
            "Which intervention offers the largest possible reduction?",
            &["Signage", "Barriers", "New noise regulations", "Monitoring"],
            "New noise regulations",
            "Check the upper end of each impact range.",
            "New regulations can reduce noise by up to 20 dB, at high cost.",
        ),
        choice(
            "M08",
            3,
            "Moderation",
            "Can a report marked valid be moderated again?",
            &["Yes", "No"],
            "No",
            "Decisions are one-way.",
            "Once a report reaches a final status it cannot change again.",
        ),
    ];

    missions.push(Mission {
        mission_id: "M09".to_string(),
        tier: 3,
        title: "Name the measure".to_string(),
        question: "What do we call a zone and time window flagged as high severity?".to_string(),
        options: vec!["hotspot".to_string()],
        answer_key: "hotspot".to_string(),
        grading_type: GradingType::Text,
        hint: "It appears at the top of the ranking page.".to_string(),
        explanation: "A hotspot is a zone/time-window pair ranked by severity.".to_string(),
    });

    missions
}
