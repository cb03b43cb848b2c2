//! Domain models shared by the database layer and the HTTP API

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, TimeWindow};

/// Declares a string-backed enum with `as_str`, `Display` and `FromStr`
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::InvalidInput(format!(
                        concat!("Invalid ", stringify!($name), ": {:?}"),
                        other
                    ))),
                }
            }
        }
    };
}

string_enum! {
    /// Caller role, taken from the `Role` request header
    Role {
        Community => "community",
        Planner => "planner",
        Maintainer => "maintainer",
    }
}

impl Role {
    /// Planners moderate reports and manage plans and missions
    pub fn can_plan(self) -> bool {
        self == Role::Planner
    }

    /// Maintainers (and planners) may read service success measures
    pub fn can_view_metrics(self) -> bool {
        matches!(self, Role::Maintainer | Role::Planner)
    }
}

string_enum! {
    /// Where an observation came from
    NoiseSource {
        Sensor => "sensor",
        Report => "report",
    }
}

string_enum! {
    /// Incident report lifecycle state
    ReportStatus {
        Pending => "pending",
        UnderReview => "under_review",
        Valid => "valid",
        Duplicate => "duplicate",
        Invalid => "invalid",
    }
}

impl ReportStatus {
    /// Open reports are still waiting for a moderation decision
    pub fn is_open(self) -> bool {
        matches!(self, ReportStatus::Pending | ReportStatus::UnderReview)
    }
}

string_enum! {
    /// Outcome of moderating a report
    Decision {
        Valid => "valid",
        Duplicate => "duplicate",
        Invalid => "invalid",
    }
}

impl Decision {
    pub fn status(self) -> ReportStatus {
        match self {
            Decision::Valid => ReportStatus::Valid,
            Decision::Duplicate => ReportStatus::Duplicate,
            Decision::Invalid => ReportStatus::Invalid,
        }
    }
}

string_enum! {
    /// Rough intervention price class
    CostBand {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl CostBand {
    /// Budget contribution of one intervention in this band
    pub fn price(self) -> f64 {
        match self {
            CostBand::Low => 1000.0,
            CostBand::Medium => 5000.0,
            CostBand::High => 10000.0,
        }
    }
}

string_enum! {
    /// Intervention plan progress
    PlanStatus {
        Planned => "planned",
        InProgress => "in_progress",
        Done => "done",
    }
}

string_enum! {
    /// How a mission answer is compared with its key
    GradingType {
        Choice => "choice",
        Text => "text",
    }
}

impl GradingType {
    /// `choice` needs the exact option; `text` ignores case and spacing
    pub fn grade(self, answer: &str, key: &str) -> bool {
        match self {
            GradingType::Choice => answer.trim() == key.trim(),
            GradingType::Text => {
                crate::normalize::description(answer) == crate::normalize::description(key)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub zone_id: String,
    pub name: String,
    pub geometry_stub: String,
    pub tags: String,
    /// Ids of neighbouring zones
    pub adjacent: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseObservation {
    pub obs_id: String,
    pub zone_id: String,
    pub timestamp: DateTime<Utc>,
    pub source: NoiseSource,
    pub value_db: f64,
    pub category_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentReport {
    pub report_id: String,
    pub zone_id: String,
    pub timestamp: DateTime<Utc>,
    pub category: String,
    pub time_window: TimeWindow,
    pub description: String,
    pub status: ReportStatus,
    pub moderation_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationDecision {
    pub decision_id: String,
    pub report_id: String,
    pub decision: Decision,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Expected noise reduction of an intervention, in dB
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactRange {
    pub low_db: f64,
    pub high_db: f64,
}

impl ImpactRange {
    pub fn new(low_db: f64, high_db: f64) -> Result<Self> {
        if !(low_db.is_finite() && high_db.is_finite()) || low_db < 0.0 || high_db < low_db {
            return Err(Error::InvalidInput(format!(
                "Invalid impact range: {}-{}",
                low_db, high_db
            )));
        }
        Ok(Self { low_db, high_db })
    }

    /// Parse the `low-high` form used in the intervention catalog, e.g. `2-5`
    pub fn parse(raw: &str) -> Result<Self> {
        let (low, high) = raw
            .split_once('-')
            .ok_or_else(|| Error::InvalidInput(format!("Invalid impact range: {:?}", raw)))?;
        let parse = |s: &str| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| Error::InvalidInput(format!("Invalid impact range: {:?}", raw)))
        };
        Self::new(parse(low)?, parse(high)?)
    }

    pub fn midpoint(&self) -> f64 {
        (self.low_db + self.high_db) / 2.0
    }
}

impl fmt::Display for ImpactRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low_db, self.high_db)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intervention {
    pub intervention_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub cost_band: CostBand,
    pub feasibility_score: i64,
    pub impact_range: ImpactRange,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,
    pub zone_id: String,
    pub interventions_selected: Vec<String>,
    pub budget: f64,
    pub status: PlanStatus,
    pub expected_impact: f64,
    pub created_by: String,
    pub notes: String,
}

/// Quest mission, including its answer key
///
/// Not serialized directly: the API exposes missions through views that
/// leave the key out.
#[derive(Debug, Clone)]
pub struct Mission {
    pub mission_id: String,
    pub tier: i64,
    pub title: String,
    pub question: String,
    pub options: Vec<String>,
    pub answer_key: String,
    pub grading_type: GradingType,
    pub hint: String,
    pub explanation: String,
}

impl Mission {
    pub fn is_correct(&self, answer: &str) -> bool {
        self.grading_type.grade(answer, &self.answer_key)
    }
}

/// One recorded mission answer for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestAnswer {
    pub mission_id: String,
    pub tier: i64,
    pub correct: bool,
    pub user_answer: String,
}
