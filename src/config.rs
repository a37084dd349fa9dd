//! Tuning knobs for the derivation pipeline and maintenance automation.

use serde::{Deserialize, Serialize};

/// Days of silence before a follow-up is suggested.
pub const FOLLOW_UP_DAYS: i64 = 7;

/// Cooldown after a rejection / no-response before re-apply is suggested.
pub const REAPPLY_COOLDOWN_DAYS: i64 = 30;

/// Days after `appliedAt` before an application counts as ghosted.
pub const GHOSTING_DAYS: i64 = 30;

/// Repository tuning. Defaults match the documented constants; callers that
/// load configuration from a file can deserialize straight into this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Tuning {
    pub follow_up_days: i64,
    pub reapply_cooldown_days: i64,
    pub ghosting_days: i64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            follow_up_days: FOLLOW_UP_DAYS,
            reapply_cooldown_days: REAPPLY_COOLDOWN_DAYS,
            ghosting_days: GHOSTING_DAYS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let t = Tuning::default();
        assert_eq!(t.follow_up_days, 7);
        assert_eq!(t.reapply_cooldown_days, 30);
        assert_eq!(t.ghosting_days, 30);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let t: Tuning = serde_json::from_str(r#"{"follow_up_days": 10}"#).unwrap();
        assert_eq!(t.follow_up_days, 10);
        assert_eq!(t.ghosting_days, 30);
    }
}
