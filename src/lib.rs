//! Job-application pipeline core.
//!
//! Tracks applications through a two-level status taxonomy (seven stages,
//! fine-grained sub-statuses, plus a legacy flat status kept as a
//! projection), recomputes derived blocks (role fingerprint, skill
//! matching, follow-up nudges, re-apply suggestions, priority score) on
//! every write, and persists documents with an append-only audit trail in
//! SQLite. Every mutation commits the document change and its audit events
//! in one transaction.

pub mod config;
pub mod derive;
pub mod error;
pub mod logging;
pub mod model;
pub mod patch;
pub mod repo;
pub mod store;
pub mod util;

pub use config::Tuning;
pub use error::{JobpipeError, Result};
pub use model::{Application, HistoryEvent, LegacyStatus, Stage, SubStatus, UserProfile};
pub use repo::{ApplicationRepository, NewApplication, NewComment};
pub use store::SqliteStore;
