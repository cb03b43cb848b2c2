//! Incident report deduplication
//!
//! A new report duplicates an earlier one when both concern the same zone,
//! the earlier one was submitted inside the recency window and was not
//! ruled invalid, and either the categories or the normalized descriptions
//! match.

use chrono::{DateTime, Duration, Utc};
use nmon_common::normalize;

/// Default look-back period
pub const DEFAULT_WINDOW_MINUTES: i64 = 60;

/// Recent report of the same zone, as seen by the filter
#[derive(Debug, Clone)]
pub struct Candidate {
    pub report_id: String,
    pub category: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// Fields of the report being submitted (already normalized)
#[derive(Debug, Clone)]
pub struct Submission<'a> {
    pub category: &'a str,
    pub description: &'a str,
    pub timestamp: DateTime<Utc>,
}

/// Why a candidate matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    SameCategory,
    SameDescription,
}

/// Outcome of the duplicate check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupVerdict {
    /// No recent report matches
    Unique,
    /// Matches an earlier report
    Duplicate {
        report_id: String,
        reason: MatchReason,
    },
}

impl DedupVerdict {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DedupVerdict::Duplicate { .. })
    }
}

/// Earliest timestamp a candidate may have
pub fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now - window
}

/// Check `submission` against candidates of the same zone
///
/// Candidates outside the window are skipped. The most recent matching
/// candidate wins.
pub fn check_duplicate(
    submission: &Submission<'_>,
    candidates: &[Candidate],
    window: Duration,
) -> DedupVerdict {
    let start = window_start(submission.timestamp, window);
    let description = normalize::description(submission.description);

    let mut recent: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.timestamp >= start)
        .collect();
    recent.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.report_id.cmp(&a.report_id))
    });

    for candidate in recent {
        let reason = if candidate.category == submission.category {
            MatchReason::SameCategory
        } else if !description.is_empty()
            && normalize::description(&candidate.description) == description
        {
            MatchReason::SameDescription
        } else {
            continue;
        };

        return DedupVerdict::Duplicate {
            report_id: candidate.report_id.clone(),
            reason,
        };
    }

    DedupVerdict::Unique
}
