//! Priority scoring for the "today" view.
//!
//! A small explainable heuristic: a base score from the pipeline status plus
//! fixed adjustments, each adjustment recorded as a reason tag.

use crate::derive::follow_up::FollowUp;
use crate::derive::reapply::Reapply;
use crate::model::{Application, LegacyStatus, MatchDecision, MatchingBlock, PriorityBlock};
use crate::util::Timestamp;

/// Score an application for the today view.
///
/// Takes the freshly computed matching, follow-up and re-apply results as
/// explicit inputs rather than reading possibly stale copies off the
/// document.
#[must_use]
pub fn compute_priority(
    app: &Application,
    matching: Option<&MatchingBlock>,
    follow_up: &FollowUp,
    reapply: &Reapply,
    t: Timestamp,
) -> PriorityBlock {
    let mut reasons = Vec::new();
    let mut score: i64 = match app.process.status {
        LegacyStatus::Saved => {
            reasons.push("saved_new");
            75
        }
        LegacyStatus::Planned => {
            reasons.push("planned");
            70
        }
        LegacyStatus::Applied => {
            reasons.push("applied");
            60
        }
        LegacyStatus::Viewed => {
            reasons.push("viewed");
            58
        }
        LegacyStatus::Interview1 => {
            reasons.push("interview");
            52
        }
        LegacyStatus::Interview2 => {
            reasons.push("interview_2");
            45
        }
        LegacyStatus::TestTask => {
            reasons.push("test_task");
            50
        }
        LegacyStatus::Offer => {
            reasons.push("offer");
            30
        }
        LegacyStatus::Rejected | LegacyStatus::NoResponse => {
            reasons.push("closed");
            10
        }
    };

    if app.job.vacancy_url.is_some() {
        score += 5;
        reasons.push("has_url");
    }
    if follow_up.needs_follow_up {
        score += 10;
        reasons.push("followup_due");
    }
    if reapply.needs_reapply_suggestion {
        score += 6;
        reasons.push("reapply_possible");
    }
    match matching.map(|m| m.decision) {
        Some(MatchDecision::Match) => {
            score += 6;
            reasons.push("strong_match");
        }
        Some(MatchDecision::Skip) => {
            score -= 8;
            reasons.push("weak_match");
        }
        _ => {}
    }

    PriorityBlock {
        score: score.clamp(0, 100),
        reasons: reasons.into_iter().map(str::to_string).collect(),
        computed_at: t,
    }
}
