//! Shared utilities: text normalization, fingerprint hashing, day arithmetic.

pub mod text;
pub mod time;

pub use text::{djb2_hash, normalize_text};
pub use time::{DAY_MS, Timestamp, days_between};
