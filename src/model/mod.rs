//! Document types for `jobpipe`.
//!
//! Field names serialize in camelCase so stored documents keep the wire
//! shape of the original schema and dot-patch paths line up with serialized
//! names (`process.lastStatusChangeAt`, `vacancy.roleFingerprint`).
//!
//! `process.subStatus` and `process.stage` are stored as plain strings:
//! legacy documents may carry values outside today's taxonomy, and the
//! normalization in [`status`] is the only component allowed to interpret
//! them.

pub mod status;

use serde::{Deserialize, Serialize};

use crate::util::Timestamp;

pub use status::{
    LegacyStatus, NormalizedStatus, Stage, StatusColor, StatusMeta, SubStatus,
    all_statuses_ordered, default_status_for_column, normalize_status_key,
    normalize_status_parts, statuses_for_stage,
};

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Work arrangement advertised by the vacancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkMode {
    Remote,
    Hybrid,
    OnSite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
}

/// Channel the application was submitted through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedVia {
    CompanySite,
    Linkedin,
    Indeed,
    Stepstone,
    Email,
    Referral,
    Other,
}

/// Job opportunity facts as entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub company_name: String,
    pub role_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancy_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_mode: Option<WorkMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<EmploymentType>,
}

/// Pipeline state of one application.
///
/// `status` is the legacy projection, `stage`/`sub_status` the newer pair;
/// `sub_status` is canonical and the other two are derived from it on every
/// write. `needs_follow_up`, `follow_up_due_at`, `needs_reapply_suggestion`,
/// `reapply_eligible_at` and `reapply_reason` are pipeline-derived, never
/// user-edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(default)]
    pub status: LegacyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_status: Option<String>,

    pub last_status_change_at: Timestamp,

    /// Set once on the first transition into "applied"; never overwritten.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_via: Option<AppliedVia>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action_text: Option<String>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub contact_attempts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_contact_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_follow_up_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub follow_up_level: i64,

    #[serde(default, skip_serializing_if = "is_false")]
    pub needs_follow_up: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_due_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub needs_reapply_suggestion: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reapply_eligible_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reapply_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Notes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Vacancy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_description: Option<String>,
    /// Derived stable hash of company + role + location; a dedupe hint, not
    /// a uniqueness guarantee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_fingerprint: Option<String>,
}

/// "match" / "maybe" / "skip" verdict of the matching heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchDecision {
    Match,
    Maybe,
    Skip,
}

/// Per-dimension match scores. Only `skills` is populated today; the other
/// dimensions are kept at 0 for future weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MatchingBreakdown {
    pub skills: i64,
    pub experience: i64,
    pub language: i64,
    pub location: i64,
    pub domain: i64,
    pub salary: i64,
}

/// Derived matching block; absent until a user profile with skills exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingBlock {
    pub decision: MatchDecision,
    /// 0..=100
    pub score: i64,
    pub breakdown: MatchingBreakdown,
    #[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub hard_filter_flags: std::collections::BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_skills_top: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps_top: Vec<String>,
    pub computed_at: Timestamp,
    /// 0.0..=1.0
    pub confidence: f64,
}

/// Derived priority block for the "today" view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBlock {
    /// 0..=100
    pub score: i64,
    /// Explainability tags, e.g. `"followup_due"`, `"strong_match"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    pub computed_at: Timestamp,
}

/// One job application, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Owner user id. Immutable.
    pub created_by: String,
    /// Soft-delete flag; archived applications are excluded from all
    /// active-pipeline queries.
    #[serde(default, skip_serializing_if = "is_false")]
    pub archived: bool,

    pub job: Job,
    pub process: Process,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Notes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancy: Option<Vacancy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching: Option<MatchingBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<PriorityBlock>,
}

impl Application {
    /// Normalize this document's status fields; see
    /// [`status::normalize_status_parts`].
    #[must_use]
    pub fn normalize_status(&self) -> NormalizedStatus {
        normalize_status_parts(
            self.process.stage.as_deref(),
            self.process.sub_status.as_deref(),
            Some(self.process.status.as_str()),
        )
    }
}

/// Kind of a history event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryKind {
    StatusChange,
    FieldChange,
    Comment,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    User,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackType {
    HrReply,
    TechFeedback,
    SelfNote,
    FollowUp,
    InterviewNote,
    RejectionReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    SkillsGap,
    SeniorityMismatch,
    LanguageLevel,
    SalaryMismatch,
    LocationRemote,
    NoResponse,
    CultureFit,
    InternalCandidate,
    Other,
}

/// Append-only audit record on an application. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEvent {
    /// Filled at commit time when the caller leaves it empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    pub actor: Actor,
    #[serde(rename = "type")]
    pub kind: HistoryKind,

    // STATUS_CHANGE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_status: Option<LegacyStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_status: Option<LegacyStatus>,

    // FIELD_CHANGE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<serde_json::Value>,

    // COMMENT / SYSTEM narrative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_type: Option<FeedbackType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason_code: Option<RejectionReason>,
}

impl HistoryEvent {
    /// Bare event of the given kind; callers fill in the relevant payload.
    #[must_use]
    pub fn new(actor: Actor, kind: HistoryKind) -> Self {
        Self {
            created_at: None,
            actor,
            kind,
            from_status: None,
            to_status: None,
            field_path: None,
            old_value: None,
            new_value: None,
            comment: None,
            feedback_type: None,
            sentiment: None,
            rejection_reason_code: None,
        }
    }

    #[must_use]
    pub fn status_change(actor: Actor, from: LegacyStatus, to: LegacyStatus) -> Self {
        Self {
            from_status: Some(from),
            to_status: Some(to),
            ..Self::new(actor, HistoryKind::StatusChange)
        }
    }

    #[must_use]
    pub fn system_note(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            ..Self::new(Actor::System, HistoryKind::System)
        }
    }
}

/// One skill on the user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSkill {
    pub key: String,
    pub label: String,
    /// Proficiency 0..=5.
    pub level: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

/// Relative weights of the matching dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchWeights {
    pub skills: i64,
    pub experience: i64,
    pub language: i64,
    pub location: i64,
    pub domain: i64,
    pub salary: i64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            skills: 45,
            experience: 20,
            language: 10,
            location: 10,
            domain: 10,
            salary: 5,
        }
    }
}

/// Hard exclusion filters; any failed filter costs a flat score penalty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_german_level: Option<String>,
    pub allow_on_site: bool,
    pub allow_hybrid: bool,
    pub allow_remote: bool,
}

impl Default for HardFilters {
    fn default() -> Self {
        Self {
            min_german_level: None,
            allow_on_site: true,
            allow_hybrid: true,
            allow_remote: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MatchSettings {
    #[serde(default)]
    pub weights: MatchWeights,
    #[serde(default)]
    pub hard_filters: HardFilters,
    #[serde(default)]
    pub skill_synonyms_version: i64,
}

/// Per-user profile; created lazily with defaults on first application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<UserSkill>,
    #[serde(default)]
    pub match_settings: MatchSettings,
}

impl UserProfile {
    /// Fresh profile with the documented default weights and permissive
    /// hard filters.
    #[must_use]
    pub fn with_defaults(t: Timestamp) -> Self {
        Self {
            created_at: t,
            updated_at: t,
            skills: Vec::new(),
            match_settings: MatchSettings {
                weights: MatchWeights::default(),
                hard_filters: HardFilters::default(),
                skill_synonyms_version: 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_serializes_camel_case() {
        let mut app = Application::default();
        app.created_by = "user-1".to_string();
        app.process.status = LegacyStatus::Applied;
        app.process.sub_status = Some("APPLIED".to_string());

        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["createdBy"], "user-1");
        assert_eq!(json["process"]["status"], "APPLIED");
        assert_eq!(json["process"]["subStatus"], "APPLIED");
        // derived flags default to false and are skipped
        assert!(json["process"].get("needsFollowUp").is_none());
    }

    #[test]
    fn application_deserialize_defaults_missing_fields() {
        let json = r#"{
            "createdAt": {"$time": 1},
            "updatedAt": {"$time": 1},
            "createdBy": "user-1",
            "job": {"companyName": "Acme", "roleTitle": "Dev"},
            "process": {"status": "SAVED", "lastStatusChangeAt": {"$time": 1}}
        }"#;
        let app: Application = serde_json::from_str(json).unwrap();
        assert!(!app.archived);
        assert!(app.notes.is_none());
        assert!(app.matching.is_none());
        assert_eq!(app.process.contact_attempts, 0);
    }

    #[test]
    fn history_event_wire_shape() {
        let ev = HistoryEvent::status_change(
            Actor::User,
            LegacyStatus::Applied,
            LegacyStatus::Interview1,
        );
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "STATUS_CHANGE");
        assert_eq!(json["actor"], "user");
        assert_eq!(json["fromStatus"], "APPLIED");
        assert_eq!(json["toStatus"], "INTERVIEW_1");
        assert!(json.get("comment").is_none());
    }

    #[test]
    fn default_profile_weights() {
        let p = UserProfile::with_defaults(Timestamp::from_millis(5));
        assert_eq!(p.match_settings.weights.skills, 45);
        assert!(p.match_settings.hard_filters.allow_remote);
        assert_eq!(p.match_settings.skill_synonyms_version, 1);
    }

    #[test]
    fn normalize_status_prefers_sub_status() {
        let mut app = Application::default();
        app.process.status = LegacyStatus::Offer;
        app.process.stage = Some("ACTIVE".to_string());
        app.process.sub_status = Some("NEGOTIATING".to_string());

        let n = app.normalize_status();
        assert_eq!(n.sub_status, SubStatus::Negotiating);
        assert_eq!(n.stage, Stage::Offer);
        assert!(n.changed);
    }
}
