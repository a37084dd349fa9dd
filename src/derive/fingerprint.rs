//! Role fingerprint: stable hash of company + role + location.

use crate::model::{Application, Vacancy};
use crate::util::{djb2_hash, normalize_text};

/// Compute the dedupe fingerprint for an application's role.
#[must_use]
pub fn compute_role_fingerprint(app: &Application) -> String {
    let location = app.job.location_text.as_deref().unwrap_or("");
    let base = format!("{}::{}::{}", app.job.company_name, app.job.role_title, location);
    format!("rf_{}", djb2_hash(&normalize_text(&base)))
}

/// Copy of the application with the fingerprint written into `vacancy`.
#[must_use]
pub fn with_role_fingerprint(app: &Application, role_fingerprint: &str) -> Application {
    let mut out = app.clone();
    let vacancy = out.vacancy.get_or_insert_with(Vacancy::default);
    vacancy.role_fingerprint = Some(role_fingerprint.to_string());
    out
}
