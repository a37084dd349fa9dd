//! Application repository: the write and query surface over the store.
//!
//! Every mutation goes through one atomic batch that writes the document
//! change together with its audit events, then recomputes the derived
//! blocks. Queries decode whole collections and filter in memory; per-user
//! collections are small enough that this beats maintaining extra indexes.

use tracing::{debug, info};

use crate::config::Tuning;
use crate::derive::{compute_derived, with_role_fingerprint};
use crate::error::{JobpipeError, Result};
use crate::model::{
    Actor, Application, EmploymentType, FeedbackType, HistoryEvent, HistoryKind, Job,
    LegacyStatus, MatchSettings, Notes, RejectionReason, Sentiment, SubStatus, UserProfile,
    UserSkill, Vacancy, WorkMode,
};
use crate::patch::{DotPatch, apply_dot_patch, from_doc, to_doc, validate_patch_roots};
use crate::store::{SqliteStore, WriteBatch, paths};
use crate::util::DAY_MS;

/// Input for [`ApplicationRepository::create_application`].
#[derive(Debug, Clone, Default)]
pub struct NewApplication {
    pub company_name: String,
    pub role_title: String,
    pub vacancy_url: Option<String>,
    pub source: Option<String>,
    /// Defaults to [`SubStatus::Saved`].
    pub status: Option<SubStatus>,
    pub location_text: Option<String>,
    pub work_mode: Option<WorkMode>,
    pub employment_type: Option<EmploymentType>,
    pub tags: Vec<String>,
    pub current_note: Option<String>,
    pub raw_description: Option<String>,
}

/// Input for [`ApplicationRepository::add_comment`].
#[derive(Debug, Clone, Default)]
pub struct NewComment {
    pub text: String,
    pub feedback_type: Option<FeedbackType>,
    pub sentiment: Option<Sentiment>,
    pub rejection_reason_code: Option<RejectionReason>,
}

pub struct ApplicationRepository {
    store: SqliteStore,
    tuning: Tuning,
}

impl ApplicationRepository {
    #[must_use]
    pub fn new(store: SqliteStore) -> Self {
        Self::with_tuning(store, Tuning::default())
    }

    #[must_use]
    pub fn with_tuning(store: SqliteStore, tuning: Tuning) -> Self {
        Self { store, tuning }
    }

    // ---- user profile ----

    /// Fetch the user profile, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the store read or decode fails.
    pub fn get_user_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        self.store
            .get(paths::USERS, user_id)?
            .map(|doc| from_doc(&doc))
            .transpose()
    }

    /// Fetch the user profile, creating it with defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error when the store read or write fails.
    pub fn ensure_user_profile(&mut self, user_id: &str) -> Result<UserProfile> {
        if let Some(profile) = self.get_user_profile(user_id)? {
            return Ok(profile);
        }

        let profile = UserProfile::with_defaults(self.store.server_now());
        let mut batch = WriteBatch::new();
        batch.set(paths::USERS, user_id, to_doc(&profile)?);
        self.store.commit(batch)?;
        info!(user_id, "user profile created with defaults");
        Ok(profile)
    }

    /// Replace the user's skills and match settings. `created_at` of an
    /// existing profile is preserved; `updated_at` is stamped.
    ///
    /// # Errors
    ///
    /// Returns an error when the store read or write fails.
    pub fn save_user_profile(
        &mut self,
        user_id: &str,
        skills: Vec<UserSkill>,
        match_settings: MatchSettings,
    ) -> Result<UserProfile> {
        let t = self.store.server_now();
        let mut profile = self
            .get_user_profile(user_id)?
            .unwrap_or_else(|| UserProfile::with_defaults(t));
        profile.skills = skills;
        profile.match_settings = match_settings;
        profile.updated_at = t;

        let mut batch = WriteBatch::new();
        batch.set(paths::USERS, user_id, to_doc(&profile)?);
        self.store.commit(batch)?;
        Ok(profile)
    }

    // ---- applications ----

    /// Create an application with its derived blocks and an initial SYSTEM
    /// audit event, in one atomic batch. Returns the new document id.
    ///
    /// # Errors
    ///
    /// Returns an error when the store read or write fails.
    pub fn create_application(&mut self, user_id: &str, input: NewApplication) -> Result<String> {
        let profile = self.ensure_user_profile(user_id)?;

        let t = self.store.server_now();
        let app_id = self.store.new_id();
        let sub = input.status.unwrap_or(SubStatus::Saved);
        let legacy = sub.legacy_projection();

        let mut app = Application {
            created_at: t,
            updated_at: t,
            created_by: user_id.to_string(),
            archived: false,
            job: Job {
                company_name: input.company_name,
                role_title: input.role_title,
                location_text: input.location_text,
                vacancy_url: input.vacancy_url,
                source: input.source,
                work_mode: input.work_mode,
                employment_type: input.employment_type,
            },
            notes: Some(Notes {
                current_note: input.current_note,
                tags: input.tags,
            }),
            vacancy: input.raw_description.map(|raw| Vacancy {
                raw_description: Some(raw),
                role_fingerprint: None,
            }),
            ..Application::default()
        };
        app.process.status = legacy;
        app.process.stage = Some(sub.stage().as_str().to_string());
        app.process.sub_status = Some(sub.as_str().to_string());
        app.process.last_status_change_at = t;
        if legacy == LegacyStatus::Applied {
            app.process.applied_at = Some(t);
        }

        let derived = compute_derived(Some(&profile), &app, t, &self.tuning);
        let mut app = with_role_fingerprint(&app, &derived.role_fingerprint);
        app.matching = derived.matching;
        app.priority = Some(derived.priority);
        app.process.needs_follow_up = derived.follow_up.needs_follow_up;
        app.process.follow_up_due_at = derived.follow_up.follow_up_due_at;
        app.process.follow_up_level = derived.follow_up.follow_up_level;
        app.process.needs_reapply_suggestion = derived.reapply.needs_reapply_suggestion;
        app.process.reapply_eligible_at = derived.reapply.reapply_eligible_at;
        app.process.reapply_reason = derived.reapply.reapply_reason;

        let mut event = HistoryEvent::system_note("Application created");
        event.created_at = Some(t);

        let mut batch = WriteBatch::new();
        batch.set(paths::applications(user_id), &app_id, to_doc(&app)?);
        batch.set(
            paths::history(user_id, &app_id),
            self.store.new_id(),
            to_doc(&event)?,
        );
        self.store.commit(batch)?;

        info!(user_id, %app_id, status = sub.as_str(), "application created");
        Ok(app_id)
    }

    /// Fetch one application.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the document does not exist.
    pub fn get_application(&self, user_id: &str, app_id: &str) -> Result<Application> {
        let doc = self
            .store
            .get(&paths::applications(user_id), app_id)?
            .ok_or_else(|| JobpipeError::not_found(app_id))?;
        from_doc(&doc)
    }

    /// Latest audit events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the store read or decode fails.
    pub fn get_history(
        &self,
        user_id: &str,
        app_id: &str,
        take: usize,
    ) -> Result<Vec<HistoryEvent>> {
        let mut events: Vec<HistoryEvent> = self
            .store
            .list(&paths::history(user_id, app_id))?
            .iter()
            .map(|(_, doc)| from_doc(doc))
            .collect::<Result<_>>()?;
        events.sort_by_key(|e| std::cmp::Reverse(e.created_at.map_or(0, |t| t.to_millis())));
        events.truncate(take);
        Ok(events)
    }

    /// Apply a dot-path patch and append audit events in one atomic batch,
    /// then recompute the derived blocks against the patched document.
    ///
    /// `build_history` sees the pre-patch document, so events can record
    /// old values. Events without `created_at` are stamped with the write
    /// time.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the application does not exist and
    /// `UnknownPatchRoot` when the patch addresses a key outside the
    /// document schema.
    pub fn update_with_history(
        &mut self,
        user_id: &str,
        app_id: &str,
        patch: DotPatch,
        build_history: impl FnOnce(&Application) -> Vec<HistoryEvent>,
    ) -> Result<()> {
        validate_patch_roots(&patch)?;

        let collection = paths::applications(user_id);
        let current_doc = self
            .store
            .get(&collection, app_id)?
            .ok_or_else(|| JobpipeError::not_found(app_id))?;
        let current: Application = from_doc(&current_doc)?;

        let t = self.store.server_now();
        let mut full_patch = patch;
        full_patch.set("updatedAt", t);

        let next: Application = from_doc(&apply_dot_patch(&current_doc, &full_patch))?;
        let profile = self.get_user_profile(user_id)?;
        let derived = compute_derived(profile.as_ref(), &next, t, &self.tuning);
        full_patch.merge(crate::derive::build_derived_patch(&derived)?);

        let mut batch = WriteBatch::new();
        batch.update(&collection, app_id, full_patch);
        for mut event in build_history(&current) {
            event.created_at.get_or_insert(t);
            batch.set(
                paths::history(user_id, app_id),
                self.store.new_id(),
                to_doc(&event)?,
            );
        }
        debug!(user_id, app_id, ops = batch.len(), "committing update batch");
        self.store.commit(batch)
    }

    /// Move the application to a new status. Writes the canonical
    /// sub-status together with its stage and legacy projections, stamps
    /// `lastStatusChangeAt`, sets `appliedAt` on the first transition into
    /// the applied family, and records a STATUS_CHANGE event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the application does not exist.
    pub fn change_status(&mut self, user_id: &str, app_id: &str, to: SubStatus) -> Result<()> {
        let current = self.get_application(user_id, app_id)?;
        let from_legacy = current.process.status;
        let to_legacy = to.legacy_projection();
        let t = self.store.server_now();

        let mut patch = DotPatch::new();
        patch.set("process.status", to_legacy.as_str());
        patch.set("process.stage", to.stage().as_str());
        patch.set("process.subStatus", to.as_str());
        patch.set("process.lastStatusChangeAt", t);
        if to_legacy == LegacyStatus::Applied && current.process.applied_at.is_none() {
            patch.set("process.appliedAt", t);
        }

        info!(
            user_id,
            app_id,
            from = from_legacy.as_str(),
            to = to.as_str(),
            "status change"
        );
        self.update_with_history(user_id, app_id, patch, |_| {
            vec![HistoryEvent::status_change(
                Actor::User,
                from_legacy,
                to_legacy,
            )]
        })
    }

    /// Status change addressed by a legacy status value; resolves to the
    /// representative sub-status first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the application does not exist.
    pub fn change_legacy_status(
        &mut self,
        user_id: &str,
        app_id: &str,
        to: LegacyStatus,
    ) -> Result<()> {
        self.change_status(user_id, app_id, to.to_sub_status())
    }

    /// Append a COMMENT audit event. The document itself only gets a fresh
    /// `updatedAt` and recomputed derived blocks.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the application does not exist.
    pub fn add_comment(&mut self, user_id: &str, app_id: &str, comment: NewComment) -> Result<()> {
        self.update_with_history(user_id, app_id, DotPatch::new(), |_| {
            vec![HistoryEvent {
                comment: Some(comment.text),
                feedback_type: comment.feedback_type,
                sentiment: comment.sentiment,
                rejection_reason_code: comment.rejection_reason_code,
                ..HistoryEvent::new(Actor::User, HistoryKind::Comment)
            }]
        })
    }

    /// Archive or unarchive an application, with a FIELD_CHANGE event
    /// recording the flip.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the application does not exist.
    pub fn set_archived(&mut self, user_id: &str, app_id: &str, archived: bool) -> Result<()> {
        let mut patch = DotPatch::new();
        patch.set("archived", archived);
        self.update_with_history(user_id, app_id, patch, |current| {
            vec![HistoryEvent {
                field_path: Some("archived".to_string()),
                old_value: Some(serde_json::Value::Bool(current.archived)),
                new_value: Some(serde_json::Value::Bool(archived)),
                ..HistoryEvent::new(Actor::User, HistoryKind::FieldChange)
            }]
        })
    }

    /// Sweep the user's applications and mark the ones whose `appliedAt`
    /// is older than the ghosting window as NO_RESPONSE / GHOSTING, each
    /// with a system STATUS_CHANGE event, all in one batch. Returns how
    /// many were marked.
    ///
    /// Derived blocks are not recomputed here; the next regular update
    /// refreshes them.
    ///
    /// # Errors
    ///
    /// Returns an error when the store read or write fails.
    pub fn auto_mark_ghosting(&mut self, user_id: &str) -> Result<usize> {
        let rows = self.list_applications(user_id)?;
        let now = self.store.server_now();
        let cutoff = now.to_millis() - self.tuning.ghosting_days * DAY_MS;

        let stale: Vec<(String, Application)> = rows
            .into_iter()
            .filter(|(_, app)| {
                !app.archived
                    && app.process.status != LegacyStatus::NoResponse
                    && app
                        .process
                        .applied_at
                        .is_some_and(|applied| applied.to_millis() <= cutoff)
            })
            .collect();
        if stale.is_empty() {
            return Ok(0);
        }

        let t = self.store.server_now();
        let collection = paths::applications(user_id);
        let mut batch = WriteBatch::new();
        for (app_id, app) in &stale {
            let mut patch = DotPatch::new();
            patch.set("process.status", LegacyStatus::NoResponse.as_str());
            patch.set("process.stage", SubStatus::Ghosting.stage().as_str());
            patch.set("process.subStatus", SubStatus::Ghosting.as_str());
            patch.set("process.lastStatusChangeAt", t);
            patch.set("updatedAt", t);
            batch.update(&collection, app_id, patch);

            let mut event = HistoryEvent::status_change(
                Actor::System,
                app.process.status,
                LegacyStatus::NoResponse,
            );
            event.created_at = Some(t);
            event.comment = Some(format!(
                "Auto-marked as GHOSTING (no response > {} days)",
                self.tuning.ghosting_days
            ));
            batch.set(paths::history(user_id, app_id), self.store.new_id(), to_doc(&event)?);
        }
        self.store.commit(batch)?;
        info!(user_id, marked = stale.len(), "ghosting sweep");
        Ok(stale.len())
    }

    // ---- queries ----

    fn list_applications(&self, user_id: &str) -> Result<Vec<(String, Application)>> {
        self.store
            .list(&paths::applications(user_id))?
            .iter()
            .map(|(id, doc)| Ok((id.clone(), from_doc(doc)?)))
            .collect()
    }

    /// Unarchived applications in the given legacy status, most recently
    /// changed first.
    ///
    /// # Errors
    ///
    /// Returns an error when the store read or decode fails.
    pub fn query_pipeline_by_status(
        &self,
        user_id: &str,
        status: LegacyStatus,
        take: usize,
    ) -> Result<Vec<(String, Application)>> {
        let mut rows: Vec<_> = self
            .list_applications(user_id)?
            .into_iter()
            .filter(|(_, app)| !app.archived && app.process.status == status)
            .collect();
        rows.sort_by_key(|(_, app)| {
            std::cmp::Reverse(app.process.last_status_change_at.to_millis())
        });
        rows.truncate(take);
        Ok(rows)
    }

    /// Unarchived applications by descending priority score. Applications
    /// without a priority block are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error when the store read or decode fails.
    pub fn query_today_top_priority(
        &self,
        user_id: &str,
        take: usize,
    ) -> Result<Vec<(String, Application)>> {
        let mut rows: Vec<_> = self
            .list_applications(user_id)?
            .into_iter()
            .filter(|(_, app)| !app.archived && app.priority.is_some())
            .collect();
        rows.sort_by_key(|(_, app)| {
            std::cmp::Reverse(app.priority.as_ref().map_or(0, |p| p.score))
        });
        rows.truncate(take);
        Ok(rows)
    }

    /// Unarchived applications flagged for follow-up, earliest due first.
    ///
    /// # Errors
    ///
    /// Returns an error when the store read or decode fails.
    pub fn query_followups_due(
        &self,
        user_id: &str,
        take: usize,
    ) -> Result<Vec<(String, Application)>> {
        let mut rows: Vec<_> = self
            .list_applications(user_id)?
            .into_iter()
            .filter(|(_, app)| !app.archived && app.process.needs_follow_up)
            .collect();
        rows.sort_by_key(|(_, app)| app.process.follow_up_due_at.map_or(0, |t| t.to_millis()));
        rows.truncate(take);
        Ok(rows)
    }

    /// All unarchived applications, unsorted.
    ///
    /// # Errors
    ///
    /// Returns an error when the store read or decode fails.
    pub fn query_all_active(
        &self,
        user_id: &str,
        take: usize,
    ) -> Result<Vec<(String, Application)>> {
        let mut rows: Vec<_> = self
            .list_applications(user_id)?
            .into_iter()
            .filter(|(_, app)| !app.archived)
            .collect();
        rows.truncate(take);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> ApplicationRepository {
        ApplicationRepository::new(SqliteStore::open_memory().unwrap())
    }

    fn saved(company: &str, role: &str) -> NewApplication {
        NewApplication {
            company_name: company.to_string(),
            role_title: role.to_string(),
            ..NewApplication::default()
        }
    }

    #[test]
    fn create_seeds_profile_document_and_history() {
        let mut repo = repo();
        let id = repo.create_application("u1", saved("Acme", "Dev")).unwrap();

        assert!(repo.get_user_profile("u1").unwrap().is_some());

        let app = repo.get_application("u1", &id).unwrap();
        assert_eq!(app.created_by, "u1");
        assert_eq!(app.process.status, LegacyStatus::Saved);
        assert_eq!(app.process.sub_status.as_deref(), Some("SAVED"));
        assert!(app.priority.is_some());
        assert!(app.vacancy.unwrap().role_fingerprint.is_some());

        let history = repo.get_history("u1", &id, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, HistoryKind::System);
        assert_eq!(history[0].comment.as_deref(), Some("Application created"));
    }

    #[test]
    fn get_application_missing_is_not_found() {
        let repo = repo();
        let err = repo.get_application("u1", "nope").unwrap_err();
        assert!(matches!(err, JobpipeError::NotFound { .. }));
    }

    #[test]
    fn change_status_writes_all_three_projections() {
        let mut repo = repo();
        let id = repo.create_application("u1", saved("Acme", "Dev")).unwrap();
        repo.change_status("u1", &id, SubStatus::HrCallScheduled)
            .unwrap();

        let app = repo.get_application("u1", &id).unwrap();
        assert_eq!(app.process.status, LegacyStatus::Interview1);
        assert_eq!(app.process.stage.as_deref(), Some("INTERVIEW"));
        assert_eq!(app.process.sub_status.as_deref(), Some("HR_CALL_SCHEDULED"));

        let history = repo.get_history("u1", &id, 10).unwrap();
        assert_eq!(history[0].kind, HistoryKind::StatusChange);
        assert_eq!(history[0].from_status, Some(LegacyStatus::Saved));
        assert_eq!(history[0].to_status, Some(LegacyStatus::Interview1));
    }

    #[test]
    fn applied_at_is_set_once() {
        let mut repo = repo();
        let id = repo.create_application("u1", saved("Acme", "Dev")).unwrap();

        repo.change_status("u1", &id, SubStatus::Applied).unwrap();
        let first = repo
            .get_application("u1", &id)
            .unwrap()
            .process
            .applied_at
            .unwrap();

        repo.change_status("u1", &id, SubStatus::Ghosting).unwrap();
        repo.change_status("u1", &id, SubStatus::Reapplied).unwrap();
        let again = repo
            .get_application("u1", &id)
            .unwrap()
            .process
            .applied_at
            .unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn unknown_patch_root_is_rejected() {
        let mut repo = repo();
        let id = repo.create_application("u1", saved("Acme", "Dev")).unwrap();

        let mut patch = DotPatch::new();
        patch.set("loopLinkage.loopId", "x");
        let err = repo
            .update_with_history("u1", &id, patch, |_| Vec::new())
            .unwrap_err();
        assert!(matches!(err, JobpipeError::UnknownPatchRoot { .. }));
    }

    #[test]
    fn comment_only_touches_updated_at() {
        let mut repo = repo();
        let id = repo.create_application("u1", saved("Acme", "Dev")).unwrap();
        let before = repo.get_application("u1", &id).unwrap();

        repo.add_comment(
            "u1",
            &id,
            NewComment {
                text: "HR answered".to_string(),
                feedback_type: Some(FeedbackType::HrReply),
                sentiment: Some(Sentiment::Positive),
                ..NewComment::default()
            },
        )
        .unwrap();

        let after = repo.get_application("u1", &id).unwrap();
        assert_eq!(after.process.status, before.process.status);
        assert!(after.updated_at.to_millis() > before.updated_at.to_millis());

        let history = repo.get_history("u1", &id, 10).unwrap();
        assert_eq!(history[0].kind, HistoryKind::Comment);
        assert_eq!(history[0].comment.as_deref(), Some("HR answered"));
        assert_eq!(history[0].sentiment, Some(Sentiment::Positive));
    }

    #[test]
    fn archived_apps_drop_out_of_queries() {
        let mut repo = repo();
        let a = repo.create_application("u1", saved("Acme", "Dev")).unwrap();
        let b = repo.create_application("u1", saved("Beta", "Dev")).unwrap();
        repo.set_archived("u1", &a, true).unwrap();

        let active = repo.query_all_active("u1", 50).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].0, b);

        let pipeline = repo
            .query_pipeline_by_status("u1", LegacyStatus::Saved, 50)
            .unwrap();
        assert_eq!(pipeline.len(), 1);

        let history = repo.get_history("u1", &a, 10).unwrap();
        assert_eq!(history[0].kind, HistoryKind::FieldChange);
        assert_eq!(history[0].new_value, Some(serde_json::Value::Bool(true)));
    }

    #[test]
    fn save_profile_triggers_matching_on_next_update() {
        let mut repo = repo();
        let id = repo
            .create_application("u1", saved("Acme", "React Developer"))
            .unwrap();
        assert!(repo.get_application("u1", &id).unwrap().matching.is_none());

        repo.save_user_profile(
            "u1",
            vec![UserSkill {
                key: "react".to_string(),
                label: "React".to_string(),
                level: 5,
                years: None,
                evidence: None,
            }],
            MatchSettings::default(),
        )
        .unwrap();

        // any update recomputes derived blocks against the new profile
        repo.change_status("u1", &id, SubStatus::Applied).unwrap();
        let matching = repo.get_application("u1", &id).unwrap().matching.unwrap();
        assert!(matching.score >= 70);
    }
}
