//! SQLite-backed document store.
//!
//! The repository treats this as an opaque document store: point reads,
//! collection scans, and an atomic multi-document batch commit. A batch is
//! one SQLite transaction — it is durable or it fails entirely; there is no
//! partial success for callers to handle. Timestamps are store-assigned and
//! monotonic per store handle.

pub mod schema;

use std::cell::Cell;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{JobpipeError, Result};
use crate::patch::{DocValue, DotPatch, apply_dot_patch, strip_missing_deep};
use crate::util::Timestamp;
use crate::util::text::djb2_hash;

/// Collection paths, the single place that knows the document layout.
pub mod paths {
    pub const USERS: &str = "users";

    #[must_use]
    pub fn applications(user_id: &str) -> String {
        format!("users/{user_id}/applications")
    }

    #[must_use]
    pub fn history(user_id: &str, app_id: &str) -> String {
        format!("users/{user_id}/applications/{app_id}/history")
    }
}

/// One operation in a write batch.
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Create or replace a whole document.
    Set {
        collection: String,
        id: String,
        doc: DocValue,
    },
    /// Merge a dot-path patch into an existing document. `Missing` entries
    /// are skipped, leaving the stored field untouched. Fails the whole
    /// batch when the document is absent.
    Update {
        collection: String,
        id: String,
        patch: DotPatch,
    },
}

/// An atomic multi-document write.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, collection: impl Into<String>, id: impl Into<String>, doc: DocValue) {
        self.ops.push(WriteOp::Set {
            collection: collection.into(),
            id: id.into(),
            doc,
        });
    }

    pub fn update(
        &mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        patch: DotPatch,
    ) {
        self.ops.push(WriteOp::Update {
            collection: collection.into(),
            id: id.into(),
            patch,
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// SQLite-backed store handle.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    last_issued_millis: Cell<i64>,
    id_counter: Cell<u64>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema
    /// application fails.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::apply_schema(&conn)?;
        Ok(Self::from_conn(conn))
    }

    /// Open an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::apply_schema(&conn)?;
        Ok(Self::from_conn(conn))
    }

    fn from_conn(conn: Connection) -> Self {
        Self {
            conn,
            last_issued_millis: Cell::new(0),
            id_counter: Cell::new(0),
        }
    }

    /// Store-assigned timestamp, strictly monotonic per handle.
    #[must_use]
    pub fn server_now(&self) -> Timestamp {
        let wall = Timestamp::now().to_millis();
        let next = wall.max(self.last_issued_millis.get() + 1);
        self.last_issued_millis.set(next);
        Timestamp::from_millis(next)
    }

    /// Store-generated opaque document id.
    #[must_use]
    pub fn new_id(&self) -> String {
        let n = self.id_counter.get().wrapping_add(1);
        self.id_counter.set(n);
        let seed = format!("{}:{n}", self.server_now().to_millis());
        format!("{}{}", djb2_hash(&seed), djb2_hash(&format!("{seed}:salt")))
    }

    /// Point read by (collection, id).
    ///
    /// # Errors
    ///
    /// Returns an error on a store failure or an unreadable body.
    pub fn get(&self, collection: &str, id: &str) -> Result<Option<DocValue>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ? AND id = ?",
                [collection, id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| decode_body(&b)).transpose()
    }

    /// Scan a whole collection. Queries filter and sort in memory; the
    /// store keeps no secondary indexes over document bodies.
    ///
    /// # Errors
    ///
    /// Returns an error on a store failure or an unreadable body.
    pub fn list(&self, collection: &str) -> Result<Vec<(String, DocValue)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, body FROM documents WHERE collection = ? ORDER BY id")?;
        let rows = stmt.query_map([collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, body) = row?;
            out.push((id, decode_body(&body)?));
        }
        Ok(out)
    }

    /// Commit a batch atomically. Every payload is sanitized before it is
    /// written; an `Update` of a missing document aborts the whole batch
    /// with `NotFound` and nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if any operation fails; the transaction rolls back.
    pub fn commit(&mut self, batch: WriteBatch) -> Result<()> {
        let t = self.server_now().to_millis();
        let tx = self.conn.transaction()?;

        for op in batch.ops {
            match op {
                WriteOp::Set { collection, id, doc } => {
                    let body = encode_body(&doc)?;
                    tx.execute(
                        "INSERT OR REPLACE INTO documents (collection, id, body, committed_at)
                         VALUES (?, ?, ?, ?)",
                        rusqlite::params![collection, id, body, t],
                    )?;
                }
                WriteOp::Update { collection, id, patch } => {
                    let current: Option<String> = tx
                        .query_row(
                            "SELECT body FROM documents WHERE collection = ? AND id = ?",
                            [collection.as_str(), id.as_str()],
                            |row| row.get(0),
                        )
                        .optional()?;
                    let Some(current) = current else {
                        return Err(JobpipeError::not_found(id));
                    };
                    // Missing entries mean "leave the stored field alone";
                    // merging them would delete it on the sanitize pass.
                    let next = apply_dot_patch(&decode_body(&current)?, &patch.without_missing());
                    let body = encode_body(&next)?;
                    tx.execute(
                        "UPDATE documents SET body = ?, committed_at = ?
                         WHERE collection = ? AND id = ?",
                        rusqlite::params![body, t, collection, id],
                    )?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}

fn encode_body(doc: &DocValue) -> Result<String> {
    let clean = strip_missing_deep(doc.clone());
    Ok(serde_json::to_string(&clean.to_json()?)?)
}

fn decode_body(body: &str) -> Result<DocValue> {
    let json: serde_json::Value = serde_json::from_str(body)?;
    Ok(DocValue::from_json(&json))
}
