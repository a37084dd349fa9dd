//! Follow-up nudges for applications sitting in the active pipeline.

use crate::model::Application;
use crate::util::{Timestamp, days_between};

/// Days with no follow-up activity considered "not recent".
const NO_FOLLOW_UP_SENTINEL: i64 = 999;

/// Follow-up verdict for one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    pub needs_follow_up: bool,
    /// Set only when a follow-up is actually due.
    pub follow_up_due_at: Option<Timestamp>,
    /// Carried through unchanged; bumped by the caller when a follow-up is
    /// actually sent.
    pub follow_up_level: i64,
}

/// Decide whether the application needs a follow-up nudge.
///
/// A nudge fires only for active-pipeline statuses when the last contact
/// (or, failing that, the last status change) is at least `follow_up_days`
/// old and no follow-up was sent within that window.
#[must_use]
pub fn compute_follow_up(app: &Application, t: Timestamp, follow_up_days: i64) -> FollowUp {
    let level = app.process.follow_up_level;

    if !app.process.status.in_active_pipeline() {
        return FollowUp {
            needs_follow_up: false,
            follow_up_due_at: None,
            follow_up_level: level,
        };
    }

    let reference = app
        .process
        .last_contact_at
        .unwrap_or(app.process.last_status_change_at);
    let days_since_ref = days_between(reference, t);
    let days_since_follow = app
        .process
        .last_follow_up_at
        .map_or(NO_FOLLOW_UP_SENTINEL, |f| days_between(f, t));

    let due_at = reference.add_days(follow_up_days);
    let due = t.to_millis() >= due_at.to_millis();

    let needs = days_since_ref >= follow_up_days && days_since_follow >= follow_up_days && due;
    FollowUp {
        needs_follow_up: needs,
        follow_up_due_at: needs.then_some(due_at),
        follow_up_level: level,
    }
}
