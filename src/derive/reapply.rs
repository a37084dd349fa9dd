//! Re-apply suggestions for closed applications past the cooldown window.

use crate::model::Application;
use crate::util::Timestamp;

/// Reason string stored when the cooldown has elapsed.
pub const REASON_COOLDOWN_ELAPSED: &str = "cooldown_elapsed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reapply {
    pub needs_reapply_suggestion: bool,
    pub reapply_eligible_at: Option<Timestamp>,
    pub reapply_reason: Option<String>,
}

impl Reapply {
    const fn none() -> Self {
        Self {
            needs_reapply_suggestion: false,
            reapply_eligible_at: None,
            reapply_reason: None,
        }
    }
}

/// Suggest re-applying when the application is closed (rejected or ghosted)
/// and the last status change is at least `cooldown_days` old.
#[must_use]
pub fn compute_reapply(app: &Application, t: Timestamp, cooldown_days: i64) -> Reapply {
    if !app.process.status.is_closed() {
        return Reapply::none();
    }

    let eligible_at = app.process.last_status_change_at.add_days(cooldown_days);
    if t.to_millis() < eligible_at.to_millis() {
        return Reapply::none();
    }

    Reapply {
        needs_reapply_suggestion: true,
        reapply_eligible_at: Some(eligible_at),
        reapply_reason: Some(REASON_COOLDOWN_ELAPSED.to_string()),
    }
}
