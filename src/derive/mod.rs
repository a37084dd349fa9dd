//! Derivation pipeline.
//!
//! Runs in a fixed order: fingerprint, matching, follow-up, re-apply,
//! priority. Later stages take the earlier results as explicit typed
//! arguments, so the ordering is enforced at the call site instead of by
//! convention.

pub mod fingerprint;
pub mod follow_up;
pub mod matching;
pub mod priority;
pub mod reapply;

use tracing::debug;

use crate::config::Tuning;
use crate::error::Result;
use crate::model::{Application, MatchingBlock, PriorityBlock, UserProfile};
use crate::patch::{DotPatch, to_doc};
use crate::util::Timestamp;

pub use fingerprint::{compute_role_fingerprint, with_role_fingerprint};
pub use follow_up::{FollowUp, compute_follow_up};
pub use matching::compute_matching;
pub use priority::compute_priority;
pub use reapply::{Reapply, compute_reapply};

/// Output of one run of the derivation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    pub role_fingerprint: String,
    /// `None` until a user profile with skills exists.
    pub matching: Option<MatchingBlock>,
    pub follow_up: FollowUp,
    pub reapply: Reapply,
    pub priority: PriorityBlock,
}

/// Run the full pipeline against one application.
///
/// An existing fingerprint on the document is kept; it only depends on
/// immutable vacancy facts, so recomputing would be a no-op anyway.
#[must_use]
pub fn compute_derived(
    user: Option<&UserProfile>,
    app: &Application,
    t: Timestamp,
    tuning: &Tuning,
) -> Derived {
    let role_fingerprint = app
        .vacancy
        .as_ref()
        .and_then(|v| v.role_fingerprint.clone())
        .unwrap_or_else(|| compute_role_fingerprint(app));

    let base = with_role_fingerprint(app, &role_fingerprint);
    let matching = compute_matching(user, &base, t);
    let follow_up = compute_follow_up(&base, t, tuning.follow_up_days);
    let reapply = compute_reapply(&base, t, tuning.reapply_cooldown_days);
    let priority = compute_priority(&base, matching.as_ref(), &follow_up, &reapply, t);

    debug!(
        fingerprint = %role_fingerprint,
        matched = matching.is_some(),
        needs_follow_up = follow_up.needs_follow_up,
        priority = priority.score,
        "derived fields computed"
    );

    Derived {
        role_fingerprint,
        matching,
        follow_up,
        reapply,
        priority,
    }
}

/// Dot-path patch writing the derived fields back onto the document.
///
/// Absent optionals become `Missing` entries, which the store strips before
/// writing; a previously stored value is then left untouched rather than
/// cleared.
///
/// # Errors
///
/// Returns an error when the matching or priority block fails to encode.
pub fn build_derived_patch(d: &Derived) -> Result<DotPatch> {
    let mut patch = DotPatch::new();
    patch.set("vacancy.roleFingerprint", d.role_fingerprint.as_str());
    patch.set_opt(
        "matching",
        d.matching.as_ref().map(to_doc).transpose()?,
    );
    patch.set("priority", to_doc(&d.priority)?);
    patch.set("process.needsFollowUp", d.follow_up.needs_follow_up);
    patch.set_opt("process.followUpDueAt", d.follow_up.follow_up_due_at);
    patch.set("process.followUpLevel", d.follow_up.follow_up_level);
    patch.set(
        "process.needsReapplySuggestion",
        d.reapply.needs_reapply_suggestion,
    );
    patch.set_opt("process.reapplyEligibleAt", d.reapply.reapply_eligible_at);
    patch.set_opt(
        "process.reapplyReason",
        d.reapply.reapply_reason.as_deref(),
    );
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Job, LegacyStatus, UserSkill};
    use crate::patch::DocValue;
    use crate::util::DAY_MS;

    fn app() -> Application {
        let mut app = Application {
            job: Job {
                company_name: "Acme".to_string(),
                role_title: "React Developer".to_string(),
                ..Job::default()
            },
            ..Application::default()
        };
        app.process.status = LegacyStatus::Applied;
        app.process.last_status_change_at = Timestamp::from_millis(0);
        app
    }

    fn profile() -> UserProfile {
        let mut p = UserProfile::with_defaults(Timestamp::from_millis(0));
        p.skills = vec![UserSkill {
            key: "react".to_string(),
            label: "React".to_string(),
            level: 5,
            years: None,
            evidence: None,
        }];
        p
    }

    #[test]
    fn pipeline_without_profile_skips_matching() {
        let d = compute_derived(
            None,
            &app(),
            Timestamp::from_millis(DAY_MS),
            &Tuning::default(),
        );
        assert!(d.matching.is_none());
        assert!(d.role_fingerprint.starts_with("rf_"));
        // no strong/weak match reason when matching is absent
        assert!(!d.priority.reasons.iter().any(|r| r.contains("match")));
    }

    #[test]
    fn pipeline_with_profile_feeds_priority() {
        let d = compute_derived(
            Some(&profile()),
            &app(),
            Timestamp::from_millis(DAY_MS),
            &Tuning::default(),
        );
        let m = d.matching.as_ref().unwrap();
        assert!(m.score >= 70);
        assert!(d.priority.reasons.contains(&"strong_match".to_string()));
    }

    #[test]
    fn existing_fingerprint_is_kept() {
        let mut a = app();
        a.vacancy = Some(crate::model::Vacancy {
            raw_description: None,
            role_fingerprint: Some("rf_existing".to_string()),
        });
        let d = compute_derived(None, &a, Timestamp::from_millis(0), &Tuning::default());
        assert_eq!(d.role_fingerprint, "rf_existing");
    }

    #[test]
    fn patch_marks_absent_optionals_missing() {
        let d = compute_derived(None, &app(), Timestamp::from_millis(0), &Tuning::default());
        assert!(!d.follow_up.needs_follow_up);

        let patch = build_derived_patch(&d).unwrap();
        let entries: std::collections::BTreeMap<_, _> =
            patch.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        assert_eq!(entries["matching"], DocValue::Missing);
        assert_eq!(entries["process.followUpDueAt"], DocValue::Missing);
        assert_eq!(entries["process.needsFollowUp"], DocValue::Bool(false));
        assert!(matches!(entries["priority"], DocValue::Map(_)));
        assert_eq!(
            entries["vacancy.roleFingerprint"],
            DocValue::Str(d.role_fingerprint.clone())
        );
    }

    #[test]
    fn stale_applied_gets_followup_bump() {
        let d = compute_derived(
            None,
            &app(),
            Timestamp::from_millis(10 * DAY_MS),
            &Tuning::default(),
        );
        assert!(d.follow_up.needs_follow_up);
        assert!(d.priority.reasons.contains(&"followup_due".to_string()));
        // 60 applied + 10 followup_due
        assert_eq!(d.priority.score, 70);
    }
}
