//! Error types for `jobpipe`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Structured variants for the cases callers branch on (`NotFound`,
//!   validation), `Other` for wrapped anyhow errors
//! - Store-level failures propagate with the original message preserved;
//!   the repository never swallows them

use thiserror::Error;

/// Primary error type for `jobpipe` operations.
#[derive(Error, Debug)]
pub enum JobpipeError {
    // === Document errors ===
    /// Application with the specified ID was not found.
    #[error("Application not found: {id}")]
    NotFound { id: String },

    /// Referenced user profile is absent where one is required.
    #[error("User profile not found: {user_id}")]
    ProfileNotFound { user_id: String },

    // === Validation errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Invalid status value.
    #[error("Invalid status: {status}")]
    InvalidStatus { status: String },

    /// Patch addressed a document root the schema does not know.
    #[error("Unknown patch root: {key}")]
    UnknownPatchRoot { key: String },

    // === Store errors ===
    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Wrapped errors ===
    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JobpipeError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::ProfileNotFound { .. }
                | Self::Validation { .. }
                | Self::InvalidStatus { .. }
                | Self::UnknownPatchRoot { .. }
        )
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error for an application id.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}

/// Result type using `JobpipeError`.
pub type Result<T> = std::result::Result<T, JobpipeError>;
