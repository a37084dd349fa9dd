//! Status taxonomy: stages, sub-statuses, their metadata, and normalization.
//!
//! The tables in this module are the single source of truth for
//! sub-status → stage / color / board column / sort order. UI and analytics
//! must read through them; duplicating a mapping elsewhere is a correctness
//! bug.
//!
//! Canonical representation: `SubStatus`. The coarse `Stage` and the legacy
//! ten-value status are derived projections, written alongside so older
//! documents and queries keep working.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::JobpipeError;

/// Coarse pipeline phase. Stable: used in filters, queries, and charts.
/// Doubles as the board column key (the board groups by stage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    #[default]
    Active,
    Interview,
    Offer,
    Hired,
    Rejected,
    NoResponse,
    Archived,
}

impl Stage {
    pub const ALL: [Self; 7] = [
        Self::Active,
        Self::Interview,
        Self::Offer,
        Self::Hired,
        Self::Rejected,
        Self::NoResponse,
        Self::Archived,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Interview => "INTERVIEW",
            Self::Offer => "OFFER",
            Self::Hired => "HIRED",
            Self::Rejected => "REJECTED",
            Self::NoResponse => "NO_RESPONSE",
            Self::Archived => "ARCHIVED",
        }
    }

    /// One color per stage, shared by dots, charts, and badges.
    #[must_use]
    pub const fn color(self) -> StatusColor {
        match self {
            Self::Active => StatusColor::Info,
            Self::Interview => StatusColor::Purple,
            Self::Offer => StatusColor::Warning,
            Self::Hired => StatusColor::Success,
            Self::Rejected => StatusColor::Danger,
            Self::NoResponse | Self::Archived => StatusColor::Neutral,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Stage {
    type Err = JobpipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|stage| stage.as_str() == s)
            .copied()
            .ok_or_else(|| JobpipeError::InvalidStatus {
                status: s.to_string(),
            })
    }
}

/// Display color family for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Neutral,
    Info,
    Warning,
    Success,
    Danger,
    Purple,
}

impl StatusColor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Success => "success",
            Self::Danger => "danger",
            Self::Purple => "purple",
        }
    }

    /// The only hex mapping in the system.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Neutral => "#64748b",
            Self::Info => "#2563eb",
            Self::Warning => "#d97706",
            Self::Success => "#059669",
            Self::Danger => "#dc2626",
            Self::Purple => "#7c3aed",
        }
    }
}

/// Fine-grained concrete step within a stage. Canonical status of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubStatus {
    // ACTIVE (prep + applied + waiting)
    #[default]
    Saved,
    Reviewed,
    CvAdapting,
    CoverLetterWriting,
    ReadyToApply,
    Applied,
    Reapplied,
    WaitingResponse,
    AutoReplyReceived,
    ResponseReceived,
    MoreInfoRequested,
    FollowUpRequired,
    WontApply,
    // INTERVIEW
    HrCallScheduled,
    HrPassed,
    HrFailed,
    TechScheduled,
    TechPassed,
    TechFailed,
    FinalInterview,
    TestTaskReceived,
    TestTaskSubmitted,
    WaitingDecision,
    // OFFER
    OfferReceived,
    OfferReviewing,
    Negotiating,
    OfferAccepted,
    OfferDeclined,
    OfferRescinded,
    // HIRED
    StartPlanned,
    Started,
    // REJECTED / NO_RESPONSE / ARCHIVED
    RejectedPreInterview,
    RejectedAfterInterview,
    RoleClosed,
    Ghosting,
    ArchivedGeneral,
    KeepInTouch,
    WithdrewBeforeStart,
}

/// Static metadata for one sub-status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMeta {
    pub key: SubStatus,
    pub stage: Stage,
    pub color: StatusColor,
    /// Sort order inside the board; ties broken by declaration order.
    pub order: u16,
}

macro_rules! status_table {
    ($(($key:ident, $stage:ident, $color:ident, $order:expr)),+ $(,)?) => {
        /// Declaration order doubles as the tie-break for equal `order`.
        static META: [StatusMeta; 38] = [$(StatusMeta {
            key: SubStatus::$key,
            stage: Stage::$stage,
            color: StatusColor::$color,
            order: $order,
        }),+];

        impl SubStatus {
            pub const ALL: [Self; 38] = [$(Self::$key),+];
        }
    };
}

status_table![
        (Saved, Active, Neutral, 10),
        (Reviewed, Active, Neutral, 20),
        (CvAdapting, Active, Info, 30),
        (CoverLetterWriting, Active, Info, 40),
        (ReadyToApply, Active, Info, 50),
        (Applied, Active, Warning, 60),
        (Reapplied, Active, Warning, 70),
        (WaitingResponse, Active, Warning, 80),
        (AutoReplyReceived, Active, Warning, 90),
        (ResponseReceived, Active, Info, 100),
        (MoreInfoRequested, Active, Info, 110),
        (FollowUpRequired, Active, Warning, 120),
        (WontApply, Rejected, Danger, 900),
        (HrCallScheduled, Interview, Purple, 200),
        (HrPassed, Interview, Purple, 210),
        (HrFailed, Rejected, Danger, 910),
        (TechScheduled, Interview, Purple, 220),
        (TechPassed, Interview, Purple, 230),
        (TechFailed, Rejected, Danger, 920),
        (FinalInterview, Interview, Purple, 240),
        (TestTaskReceived, Interview, Purple, 250),
        (TestTaskSubmitted, Interview, Purple, 260),
        (WaitingDecision, Interview, Purple, 270),
        (OfferReceived, Offer, Success, 300),
        (OfferReviewing, Offer, Success, 310),
        (Negotiating, Offer, Success, 320),
        (OfferAccepted, Hired, Success, 330),
        (OfferDeclined, Archived, Neutral, 800),
        (OfferRescinded, Rejected, Danger, 930),
        (StartPlanned, Hired, Success, 400),
        (Started, Hired, Success, 410),
        (RejectedPreInterview, Rejected, Danger, 940),
        (RejectedAfterInterview, Rejected, Danger, 950),
        (RoleClosed, Rejected, Danger, 960),
        (Ghosting, NoResponse, Danger, 970),
        (ArchivedGeneral, Archived, Neutral, 980),
        (KeepInTouch, Archived, Neutral, 990),
        (WithdrewBeforeStart, Archived, Neutral, 995),
];

impl SubStatus {
    #[must_use]
    pub fn meta(self) -> &'static StatusMeta {
        &META[self as usize]
    }

    #[must_use]
    pub fn stage(self) -> Stage {
        self.meta().stage
    }

    #[must_use]
    pub fn color(self) -> StatusColor {
        self.meta().color
    }

    #[must_use]
    pub fn order(self) -> u16 {
        self.meta().order
    }

    /// Board column of this status. Columns group by stage.
    #[must_use]
    pub fn board_column(self) -> Stage {
        self.stage()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Saved => "SAVED",
            Self::Reviewed => "REVIEWED",
            Self::CvAdapting => "CV_ADAPTING",
            Self::CoverLetterWriting => "COVER_LETTER_WRITING",
            Self::ReadyToApply => "READY_TO_APPLY",
            Self::Applied => "APPLIED",
            Self::Reapplied => "REAPPLIED",
            Self::WaitingResponse => "WAITING_RESPONSE",
            Self::AutoReplyReceived => "AUTO_REPLY_RECEIVED",
            Self::ResponseReceived => "RESPONSE_RECEIVED",
            Self::MoreInfoRequested => "MORE_INFO_REQUESTED",
            Self::FollowUpRequired => "FOLLOW_UP_REQUIRED",
            Self::WontApply => "WONT_APPLY",
            Self::HrCallScheduled => "HR_CALL_SCHEDULED",
            Self::HrPassed => "HR_PASSED",
            Self::HrFailed => "HR_FAILED",
            Self::TechScheduled => "TECH_SCHEDULED",
            Self::TechPassed => "TECH_PASSED",
            Self::TechFailed => "TECH_FAILED",
            Self::FinalInterview => "FINAL_INTERVIEW",
            Self::TestTaskReceived => "TEST_TASK_RECEIVED",
            Self::TestTaskSubmitted => "TEST_TASK_SUBMITTED",
            Self::WaitingDecision => "WAITING_DECISION",
            Self::OfferReceived => "OFFER_RECEIVED",
            Self::OfferReviewing => "OFFER_REVIEWING",
            Self::Negotiating => "NEGOTIATING",
            Self::OfferAccepted => "OFFER_ACCEPTED",
            Self::OfferDeclined => "OFFER_DECLINED",
            Self::OfferRescinded => "OFFER_RESCINDED",
            Self::StartPlanned => "START_PLANNED",
            Self::Started => "STARTED",
            Self::RejectedPreInterview => "REJECTED_PRE_INTERVIEW",
            Self::RejectedAfterInterview => "REJECTED_AFTER_INTERVIEW",
            Self::RoleClosed => "ROLE_CLOSED",
            Self::Ghosting => "GHOSTING",
            Self::ArchivedGeneral => "ARCHIVED_GENERAL",
            Self::KeepInTouch => "KEEP_IN_TOUCH",
            Self::WithdrewBeforeStart => "WITHDREW_BEFORE_START",
        }
    }

    /// Projection onto the legacy ten-value enum. Total: every sub-status
    /// has a legacy counterpart so older readers never see a gap.
    #[must_use]
    pub const fn legacy_projection(self) -> LegacyStatus {
        match self {
            Self::Saved | Self::Reviewed => LegacyStatus::Saved,
            Self::CvAdapting | Self::CoverLetterWriting | Self::ReadyToApply => {
                LegacyStatus::Planned
            }
            Self::Applied
            | Self::Reapplied
            | Self::WaitingResponse
            | Self::AutoReplyReceived
            | Self::FollowUpRequired => LegacyStatus::Applied,
            Self::ResponseReceived | Self::MoreInfoRequested => LegacyStatus::Viewed,
            Self::HrCallScheduled | Self::HrPassed => LegacyStatus::Interview1,
            Self::TechScheduled
            | Self::TechPassed
            | Self::FinalInterview
            | Self::WaitingDecision => LegacyStatus::Interview2,
            Self::TestTaskReceived | Self::TestTaskSubmitted => LegacyStatus::TestTask,
            Self::OfferReceived
            | Self::OfferReviewing
            | Self::Negotiating
            | Self::OfferAccepted
            | Self::StartPlanned
            | Self::Started => LegacyStatus::Offer,
            Self::WontApply
            | Self::HrFailed
            | Self::TechFailed
            | Self::OfferRescinded
            | Self::RejectedPreInterview
            | Self::RejectedAfterInterview
            | Self::RoleClosed
            | Self::OfferDeclined
            | Self::ArchivedGeneral
            | Self::KeepInTouch
            | Self::WithdrewBeforeStart => LegacyStatus::Rejected,
            Self::Ghosting => LegacyStatus::NoResponse,
        }
    }
}

impl fmt::Display for SubStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SubStatus {
    type Err = JobpipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|key| key.as_str() == s)
            .copied()
            .ok_or_else(|| JobpipeError::InvalidStatus {
                status: s.to_string(),
            })
    }
}

/// Older ten-value status enum, kept for backward compatibility. Derivation
/// gates (follow-up, re-apply, priority base) still key off this projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegacyStatus {
    #[default]
    Saved,
    Planned,
    Applied,
    Viewed,
    #[serde(rename = "INTERVIEW_1")]
    Interview1,
    #[serde(rename = "INTERVIEW_2")]
    Interview2,
    TestTask,
    Offer,
    Rejected,
    NoResponse,
}

impl LegacyStatus {
    pub const ALL: [Self; 10] = [
        Self::Saved,
        Self::Planned,
        Self::Applied,
        Self::Viewed,
        Self::Interview1,
        Self::Interview2,
        Self::TestTask,
        Self::Offer,
        Self::Rejected,
        Self::NoResponse,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Saved => "SAVED",
            Self::Planned => "PLANNED",
            Self::Applied => "APPLIED",
            Self::Viewed => "VIEWED",
            Self::Interview1 => "INTERVIEW_1",
            Self::Interview2 => "INTERVIEW_2",
            Self::TestTask => "TEST_TASK",
            Self::Offer => "OFFER",
            Self::Rejected => "REJECTED",
            Self::NoResponse => "NO_RESPONSE",
        }
    }

    /// Fixed legacy → canonical table. Used for migration and normalization
    /// of old documents only.
    #[must_use]
    pub const fn to_sub_status(self) -> SubStatus {
        match self {
            Self::Saved => SubStatus::Saved,
            Self::Planned => SubStatus::ReadyToApply,
            Self::Applied => SubStatus::Applied,
            Self::Viewed => SubStatus::ResponseReceived,
            Self::Interview1 => SubStatus::HrCallScheduled,
            Self::Interview2 => SubStatus::TechScheduled,
            Self::TestTask => SubStatus::TestTaskReceived,
            Self::Offer => SubStatus::OfferReceived,
            Self::Rejected => SubStatus::RejectedPreInterview,
            Self::NoResponse => SubStatus::Ghosting,
        }
    }

    /// Statuses that count as the active applied pipeline for follow-ups.
    #[must_use]
    pub const fn in_active_pipeline(self) -> bool {
        matches!(
            self,
            Self::Applied | Self::Viewed | Self::Interview1 | Self::Interview2 | Self::TestTask
        )
    }

    /// Terminal closed statuses eligible for a re-apply suggestion.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Rejected | Self::NoResponse)
    }
}

impl fmt::Display for LegacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LegacyStatus {
    type Err = JobpipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let up = s.trim().to_uppercase();
        Self::ALL
            .iter()
            .find(|status| status.as_str() == up)
            .copied()
            .ok_or_else(|| JobpipeError::InvalidStatus {
                status: s.to_string(),
            })
    }
}

/// All sub-statuses sorted by `order` (ties keep declaration order).
#[must_use]
pub fn all_statuses_ordered() -> Vec<SubStatus> {
    let mut all = SubStatus::ALL.to_vec();
    all.sort_by_key(|s| s.order());
    all
}

/// Sub-statuses belonging to a stage, in board order.
#[must_use]
pub fn statuses_for_stage(stage: Stage) -> Vec<SubStatus> {
    all_statuses_ordered()
        .into_iter()
        .filter(|s| s.stage() == stage)
        .collect()
}

/// Safe default status for a board column: the lowest-order sub-status in
/// that column.
#[must_use]
pub fn default_status_for_column(column: Stage) -> SubStatus {
    statuses_for_stage(column)
        .first()
        .copied()
        .unwrap_or_default()
}

/// Normalize a raw status value (canonical key, legacy enum, or board column
/// key; tolerant to casing, surrounding whitespace, spaces, hyphens) into a
/// `SubStatus`. Returns `None` if unrecognized — callers must not guess
/// further.
#[must_use]
pub fn normalize_status_key(raw: &str) -> Option<SubStatus> {
    // 1) Already a valid canonical key.
    if let Ok(key) = raw.parse::<SubStatus>() {
        return Some(key);
    }

    // 2) Legacy enum values (older documents).
    if let Ok(legacy) = raw.parse::<LegacyStatus>() {
        return Some(legacy.to_sub_status());
    }

    // 3) Tolerate different casing / spaces / hyphens.
    let up = raw.trim().to_uppercase();
    let mut normalized = String::with_capacity(up.len());
    let mut last_was_sep = false;
    for c in up.chars() {
        if c.is_whitespace() || c == '-' {
            if !last_was_sep {
                normalized.push('_');
            }
            last_was_sep = true;
        } else {
            normalized.push(c);
            last_was_sep = false;
        }
    }
    if let Ok(key) = normalized.parse::<SubStatus>() {
        return Some(key);
    }

    // 4) A board column key stored where a sub-status belongs: map it to the
    // column's default so the board and analytics stay consistent.
    if let Ok(column) = normalized.parse::<Stage>() {
        return Some(default_status_for_column(column));
    }

    None
}

/// Result of normalizing a document's status fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedStatus {
    pub stage: Stage,
    pub sub_status: SubStatus,
    /// The document should be rewritten with the corrected pair.
    pub changed: bool,
}

/// Normalize raw status fields of a stored document.
///
/// Resolution order: trust a valid `(stage, subStatus)` pair, recomputing
/// `stage` from `subStatus` when they disagree (`subStatus` wins); fall back
/// to the legacy enum; fall back to the hard default `(ACTIVE, SAVED)`.
#[must_use]
pub fn normalize_status_parts(
    stage: Option<&str>,
    sub_status: Option<&str>,
    legacy: Option<&str>,
) -> NormalizedStatus {
    if let (Some(stage_in), Some(sub_in)) = (stage, sub_status) {
        if let Ok(sub) = sub_in.parse::<SubStatus>() {
            return NormalizedStatus {
                stage: sub.stage(),
                sub_status: sub,
                changed: stage_in != sub.stage().as_str(),
            };
        }
    }

    if let Some(Ok(legacy)) = legacy.map(str::parse::<LegacyStatus>) {
        let sub = legacy.to_sub_status();
        return NormalizedStatus {
            stage: sub.stage(),
            sub_status: sub,
            changed: true,
        };
    }

    NormalizedStatus {
        stage: Stage::Active,
        sub_status: SubStatus::Saved,
        changed: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_table_aligned_with_declaration_order() {
        for (i, key) in SubStatus::ALL.iter().enumerate() {
            assert_eq!(key.meta().key, *key, "META[{i}] out of order");
        }
    }

    #[test]
    fn stage_always_derivable_from_sub_status() {
        for key in SubStatus::ALL {
            let normalized = normalize_status_parts(
                Some(key.stage().as_str()),
                Some(key.as_str()),
                None,
            );
            assert_eq!(normalized.stage, key.stage());
            assert_eq!(normalized.sub_status, key);
            assert!(!normalized.changed);
        }
    }

    #[test]
    fn sub_status_wins_over_disagreeing_stage() {
        let normalized =
            normalize_status_parts(Some("OFFER"), Some("HR_CALL_SCHEDULED"), None);
        assert_eq!(normalized.stage, Stage::Interview);
        assert_eq!(normalized.sub_status, SubStatus::HrCallScheduled);
        assert!(normalized.changed);
    }

    #[test]
    fn legacy_fallback_and_hard_default() {
        let legacy = normalize_status_parts(None, None, Some("INTERVIEW_2"));
        assert_eq!(legacy.sub_status, SubStatus::TechScheduled);
        assert_eq!(legacy.stage, Stage::Interview);
        assert!(legacy.changed);

        let fallback = normalize_status_parts(None, Some("garbage"), Some("garbage"));
        assert_eq!(fallback.stage, Stage::Active);
        assert_eq!(fallback.sub_status, SubStatus::Saved);
        assert!(fallback.changed);
    }

    #[test]
    fn normalize_key_tolerates_case_space_hyphen() {
        for raw in ["hr call scheduled", "HR-CALL-SCHEDULED", "HR_CALL_SCHEDULED"] {
            assert_eq!(normalize_status_key(raw), Some(SubStatus::HrCallScheduled));
        }
    }

    #[test]
    fn normalize_key_maps_legacy_and_columns() {
        assert_eq!(normalize_status_key("planned"), Some(SubStatus::ReadyToApply));
        assert_eq!(
            normalize_status_key("INTERVIEW"),
            Some(SubStatus::HrCallScheduled)
        );
        assert_eq!(normalize_status_key("ARCHIVED"), Some(SubStatus::OfferDeclined));
        assert_eq!(normalize_status_key("definitely not a status"), None);
    }

    #[test]
    fn legacy_roundtrip_through_canonical() {
        for legacy in LegacyStatus::ALL {
            assert_eq!(legacy.to_sub_status().legacy_projection(), legacy);
        }
    }

    #[test]
    fn default_status_per_column() {
        assert_eq!(default_status_for_column(Stage::Active), SubStatus::Saved);
        assert_eq!(
            default_status_for_column(Stage::Interview),
            SubStatus::HrCallScheduled
        );
        assert_eq!(
            default_status_for_column(Stage::Offer),
            SubStatus::OfferReceived
        );
        assert_eq!(
            default_status_for_column(Stage::Hired),
            SubStatus::OfferAccepted
        );
        assert_eq!(default_status_for_column(Stage::Rejected), SubStatus::WontApply);
        assert_eq!(
            default_status_for_column(Stage::NoResponse),
            SubStatus::Ghosting
        );
        assert_eq!(
            default_status_for_column(Stage::Archived),
            SubStatus::OfferDeclined
        );
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&SubStatus::HrCallScheduled).unwrap();
        assert_eq!(json, "\"HR_CALL_SCHEDULED\"");
        let back: SubStatus = serde_json::from_str("\"TEST_TASK_SUBMITTED\"").unwrap();
        assert_eq!(back, SubStatus::TestTaskSubmitted);

        let legacy = serde_json::to_string(&LegacyStatus::Interview1).unwrap();
        assert_eq!(legacy, "\"INTERVIEW_1\"");
    }
}
