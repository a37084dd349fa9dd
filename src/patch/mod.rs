//! Dot-path patching over document trees.
//!
//! Documents cross the store boundary as [`DocValue`] trees. Two variants
//! carry the semantics the rest of the crate leans on:
//!
//! - [`DocValue::Time`] is an opaque leaf. Cloning, patching, and
//!   sanitization pass it through whole and never descend into it.
//! - [`DocValue::Missing`] marks a value that must not reach the store.
//!   [`strip_missing_deep`] removes it everywhere; the store rejects any
//!   payload still carrying one.

use std::collections::BTreeMap;

use crate::error::{JobpipeError, Result};
use crate::util::Timestamp;
use crate::util::time::TIME_KEY;

/// A node in a document tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DocValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<DocValue>),
    Map(BTreeMap<String, DocValue>),
    /// Opaque store timestamp. Never treated as a plain map.
    Time(Timestamp),
    /// Equivalent of an absent value; stripped before persistence.
    Missing,
}

impl DocValue {
    /// Opaque leaves are passed through whole by every tree walker.
    #[must_use]
    pub const fn is_opaque(&self) -> bool {
        matches!(self, Self::Time(_))
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, DocValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Walk a dot path, returning the addressed node if present.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Self> {
        let mut cur = self;
        for part in path.split('.') {
            cur = cur.as_map()?.get(part)?;
        }
        Some(cur)
    }

    /// Convert to plain JSON. Time leaves become `{"$time": millis}`.
    ///
    /// # Errors
    ///
    /// Returns an error when the tree still contains `Missing` nodes; strip
    /// first.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Float(f) => serde_json::Value::from(*f),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Array(items) => serde_json::Value::Array(
                items.iter().map(Self::to_json).collect::<Result<_>>()?,
            ),
            Self::Map(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), v.to_json()?);
                }
                serde_json::Value::Object(out)
            }
            Self::Time(t) => serde_json::to_value(t)?,
            Self::Missing => {
                return Err(JobpipeError::validation(
                    "document",
                    "missing value reached the JSON boundary; strip first",
                ));
            }
        })
    }

    /// Parse plain JSON back into a tree, re-wrapping `{"$time": millis}`
    /// objects as opaque Time leaves.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(0.0)), Self::Int),
            serde_json::Value::String(s) => Self::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Self::Array(items.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                if map.len() == 1 {
                    if let Some(millis) = map.get(TIME_KEY).and_then(serde_json::Value::as_i64) {
                        return Self::Time(Timestamp::from_millis(millis));
                    }
                }
                Self::Map(
                    map.iter()
                        .map(|(k, v)| (k.clone(), Self::from_json(v)))
                        .collect(),
                )
            }
        }
    }
}

impl From<Timestamp> for DocValue {
    fn from(t: Timestamp) -> Self {
        Self::Time(t)
    }
}

impl From<bool> for DocValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for DocValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for DocValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for DocValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// Encode any serializable value as a document tree.
///
/// # Errors
///
/// Returns an error when serialization fails.
pub fn to_doc<T: serde::Serialize>(value: &T) -> Result<DocValue> {
    Ok(DocValue::from_json(&serde_json::to_value(value)?))
}

/// Decode a document tree into a typed value. Missing nodes are stripped
/// before decoding, mirroring absent fields.
///
/// # Errors
///
/// Returns an error when the tree does not match the target type.
pub fn from_doc<T: serde::de::DeserializeOwned>(doc: &DocValue) -> Result<T> {
    let json = strip_missing_deep(doc.clone()).to_json()?;
    Ok(serde_json::from_value(json)?)
}

/// A flat/dot-path partial update. Insertion order is irrelevant: later
/// writes to the same leaf win, which `BTreeMap` makes deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DotPatch {
    entries: BTreeMap<String, DocValue>,
}

impl DotPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a leaf at a flat or dot-separated path.
    pub fn set(&mut self, path: impl Into<String>, value: impl Into<DocValue>) -> &mut Self {
        self.entries.insert(path.into(), value.into());
        self
    }

    /// Set a leaf when `value` is present; otherwise record Missing so
    /// sanitization drops the key and the stored field stays untouched.
    pub fn set_opt(
        &mut self,
        path: impl Into<String>,
        value: Option<impl Into<DocValue>>,
    ) -> &mut Self {
        self.entries.insert(
            path.into(),
            value.map_or(DocValue::Missing, Into::into),
        );
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DocValue)> {
        self.entries.iter()
    }

    /// Merge another patch on top of this one (its leaves win).
    pub fn merge(&mut self, other: Self) -> &mut Self {
        self.entries.extend(other.entries);
        self
    }

    /// Copy of this patch without `Missing` entries. Under update
    /// semantics a `Missing` leaf means "leave the stored field as it is",
    /// so it must never reach the document merge.
    #[must_use]
    pub fn without_missing(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(_, v)| !matches!(v, DocValue::Missing))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// First segment of every path, deduplicated.
    pub fn root_keys(&self) -> impl Iterator<Item = &str> {
        let mut seen = std::collections::BTreeSet::new();
        self.entries
            .keys()
            .filter_map(move |k| {
                let root = k.split('.').next().unwrap_or(k);
                seen.insert(root).then_some(root)
            })
    }
}

impl<'a> IntoIterator for &'a DotPatch {
    type Item = (&'a String, &'a DocValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, DocValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<P: Into<String>, V: Into<DocValue>> FromIterator<(P, V)> for DotPatch {
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(p, v)| (p.into(), v.into()))
                .collect(),
        }
    }
}

/// Apply a dot-path patch onto a document snapshot, returning the patched
/// copy. The base is deep-copied structurally; opaque leaves are carried
/// over unchanged. Dot-separated keys create intermediate maps as needed
/// and replace non-map intermediates; the leaf is overwritten.
#[must_use]
pub fn apply_dot_patch(base: &DocValue, patch: &DotPatch) -> DocValue {
    let mut root = match base {
        DocValue::Map(map) => map.clone(),
        _ => BTreeMap::new(),
    };

    for (path, value) in patch.iter() {
        let mut map = &mut root;
        let mut parts = path.split('.').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                map.insert(part.to_string(), value.clone());
                break;
            }
            let slot = map
                .entry(part.to_string())
                .or_insert_with(|| DocValue::Map(BTreeMap::new()));
            if !matches!(slot, DocValue::Map(_)) {
                *slot = DocValue::Map(BTreeMap::new());
            }
            let DocValue::Map(next) = slot else { break };
            map = next;
        }
    }
    DocValue::Map(root)
}

/// Recursively remove Missing entries from maps and arrays. Opaque leaves
/// pass through untouched. Idempotent.
#[must_use]
pub fn strip_missing_deep(value: DocValue) -> DocValue {
    match value {
        DocValue::Array(items) => DocValue::Array(
            items
                .into_iter()
                .filter(|v| !matches!(v, DocValue::Missing))
                .map(strip_missing_deep)
                .collect(),
        ),
        DocValue::Map(map) => DocValue::Map(
            map.into_iter()
                .filter(|(_, v)| !matches!(v, DocValue::Missing))
                .map(|(k, v)| (k, strip_missing_deep(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Document roots a patch may touch. Anything else is rejected before the
/// store sees it.
const KNOWN_ROOTS: [&str; 11] = [
    "createdAt",
    "updatedAt",
    "createdBy",
    "archived",
    "job",
    "process",
    "notes",
    "vacancy",
    "tags",
    "matching",
    "priority",
];

/// Reject patches that address document roots outside the schema.
///
/// # Errors
///
/// Returns `UnknownPatchRoot` for the first offending key.
pub fn validate_patch_roots(patch: &DotPatch) -> Result<()> {
    for root in patch.root_keys() {
        if !KNOWN_ROOTS.contains(&root) {
            return Err(JobpipeError::UnknownPatchRoot {
                key: root.to_string(),
            });
        }
    }
    Ok(())
}
