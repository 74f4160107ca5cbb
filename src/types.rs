//! Entry, list, and atomic-commit records exchanged with the transport.

use std::time::Duration;

use kvstore_crypto::KvKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Entries
// ============================================================================

/// A record as the transport returns it. When `encrypted` is set, `value`
/// holds an envelope (`{ciphertext, iv, kid}`) instead of the plain value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    pub key: KvKey,
    #[serde(default)]
    pub value: Value,
    /// Opaque version token. `None` means the key does not exist.
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub encrypted: bool,
    /// Milliseconds left before the store expires the record, if it expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_in_ms: Option<u64>,
}

impl RawEntry {
    /// Placeholder for a key the store has no value for.
    pub fn missing(key: KvKey) -> Self {
        Self {
            key,
            value: Value::Null,
            version: None,
            encrypted: false,
            expire_in_ms: None,
        }
    }
}

/// A caller-facing entry holding the plain value. `encrypted` reports how the
/// value was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    pub key: KvKey,
    pub value: T,
    pub version: Option<String>,
    pub encrypted: bool,
}

impl<T> Entry<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Entry<U> {
        Entry {
            key: self.key,
            value: f(self.value),
            version: self.version,
            encrypted: self.encrypted,
        }
    }
}

// ============================================================================
// Listing
// ============================================================================

/// Which keys a list call covers. `start` is inclusive, `end` exclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListSelector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<KvKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<KvKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<KvKey>,
}

impl ListSelector {
    pub fn prefix(prefix: impl Into<KvKey>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Default::default()
        }
    }

    pub fn range(start: impl Into<KvKey>, end: impl Into<KvKey>) -> Self {
        Self {
            prefix: None,
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    pub fn contains(&self, key: &KvKey) -> bool {
        if let Some(prefix) = &self.prefix {
            if !key.starts_with(prefix) || key == prefix {
                return false;
            }
        }
        if let Some(start) = &self.start {
            if key < start {
                return false;
            }
        }
        if let Some(end) = &self.end {
            if key >= end {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Cursor from a previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(default)]
    pub reverse: bool,
}

/// One page of raw records. `cursor` is `None` on the last page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawListPage {
    pub entries: Vec<RawEntry>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub entries: Vec<Entry<T>>,
    pub cursor: Option<String>,
}

// ============================================================================
// Atomic commits
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Ask the server to expire the value after this long.
    pub expire_in: Option<Duration>,
}

/// Optimistic-concurrency check: the key's current version must equal
/// `version` (`None` = the key must not exist).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub key: KvKey,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    Set {
        key: KvKey,
        value: Value,
        encrypted: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expire_in_ms: Option<u64>,
    },
    Delete {
        key: KvKey,
    },
}

impl Mutation {
    pub fn key(&self) -> &KvKey {
        match self {
            Mutation::Set { key, .. } | Mutation::Delete { key } => key,
        }
    }
}

/// Checks and mutations the server applies all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtomicBatch {
    pub checks: Vec<Check>,
    pub mutations: Vec<Mutation>,
}

/// Outcome of a commit. `ok == false` means a check failed and nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResult {
    pub ok: bool,
    #[serde(default)]
    pub version: Option<String>,
}
