//! In-memory `KvTransport` with versioned records and atomic checks.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use kvstore_client::{
    AtomicBatch, CommitResult, KeyMaterial, KeyRegistry, KvClient, KvKey, KvTransport,
    ListOptions, ListSelector, Mutation, RawEntry, RawListPage, TransportError,
};
use parking_lot::Mutex;
use serde_json::Value;

/// A record as the fake server stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored {
    pub value: Value,
    pub version: String,
    pub encrypted: bool,
    pub expire_in_ms: Option<u64>,
}

#[derive(Default)]
struct State {
    records: BTreeMap<KvKey, Stored>,
    next_version: u64,
    commits: Vec<AtomicBatch>,
}

impl State {
    fn bump_version(&mut self) -> String {
        self.next_version += 1;
        format!("{:020}", self.next_version)
    }
}

pub struct MemoryTransport {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::with_page_size(100)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size,
        }
    }

    pub fn stored(&self, key: impl Into<KvKey>) -> Option<Stored> {
        self.state.lock().records.get(&key.into()).cloned()
    }

    pub fn commits(&self) -> Vec<AtomicBatch> {
        self.state.lock().commits.clone()
    }

    /// Plant a record directly, bypassing the client.
    pub fn insert_raw(&self, key: impl Into<KvKey>, value: Value, encrypted: bool) -> String {
        let mut state = self.state.lock();
        let version = state.bump_version();
        state.records.insert(
            key.into(),
            Stored {
                value,
                version: version.clone(),
                encrypted,
                expire_in_ms: None,
            },
        );
        version
    }

    fn raw_entry(key: &KvKey, stored: &Stored) -> RawEntry {
        RawEntry {
            key: key.clone(),
            value: stored.value.clone(),
            version: Some(stored.version.clone()),
            encrypted: stored.encrypted,
            // No clock: the remaining time is what the write asked for.
            expire_in_ms: stored.expire_in_ms,
        }
    }
}

#[async_trait]
impl KvTransport for MemoryTransport {
    async fn get_many(&self, keys: &[KvKey]) -> Result<Vec<RawEntry>, TransportError> {
        let state = self.state.lock();
        Ok(keys
            .iter()
            .map(|key| match state.records.get(key) {
                Some(stored) => Self::raw_entry(key, stored),
                None => RawEntry::missing(key.clone()),
            })
            .collect())
    }

    async fn list(
        &self,
        selector: &ListSelector,
        options: &ListOptions,
    ) -> Result<RawListPage, TransportError> {
        let after: Option<KvKey> = match &options.cursor {
            Some(cursor) => Some(
                serde_json::from_str(cursor)
                    .map_err(|e| TransportError::new(format!("bad cursor: {e}")))?,
            ),
            None => None,
        };

        let state = self.state.lock();
        let mut matching: Vec<(&KvKey, &Stored)> = state
            .records
            .iter()
            .filter(|(key, _)| selector.contains(key))
            .collect();
        if options.reverse {
            matching.reverse();
        }
        if let Some(after) = &after {
            matching.retain(|(key, _)| {
                if options.reverse {
                    *key < after
                } else {
                    *key > after
                }
            });
        }

        let limit = options.limit.unwrap_or(self.page_size).min(self.page_size);
        let has_more = matching.len() > limit;
        let entries: Vec<RawEntry> = matching
            .into_iter()
            .take(limit)
            .map(|(key, stored)| Self::raw_entry(key, stored))
            .collect();
        let cursor = match (has_more, entries.last()) {
            (true, Some(last)) => Some(
                serde_json::to_string(&last.key).map_err(|e| TransportError::new(e.to_string()))?,
            ),
            _ => None,
        };
        Ok(RawListPage { entries, cursor })
    }

    async fn commit(&self, batch: &AtomicBatch) -> Result<CommitResult, TransportError> {
        let mut state = self.state.lock();
        state.commits.push(batch.clone());

        let checks_pass = batch.checks.iter().all(|check| {
            state.records.get(&check.key).map(|s| s.version.clone()) == check.version
        });
        if !checks_pass {
            return Ok(CommitResult {
                ok: false,
                version: None,
            });
        }

        let version = state.bump_version();
        for mutation in &batch.mutations {
            match mutation {
                Mutation::Set {
                    key,
                    value,
                    encrypted,
                    expire_in_ms,
                } => {
                    state.records.insert(
                        key.clone(),
                        Stored {
                            value: value.clone(),
                            version: version.clone(),
                            encrypted: *encrypted,
                            expire_in_ms: *expire_in_ms,
                        },
                    );
                }
                Mutation::Delete { key } => {
                    state.records.remove(key);
                }
            }
        }
        Ok(CommitResult {
            ok: true,
            version: Some(version),
        })
    }
}

/// Client over a fresh `MemoryTransport`, without encryption.
pub fn plain_client() -> (KvClient, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new());
    (KvClient::new(transport.clone()), transport)
}

/// Client over a fresh `MemoryTransport` with `kid` registered as the active key.
pub fn encrypted_client(kid: &str) -> (KvClient, Arc<MemoryTransport>, Arc<KeyRegistry>) {
    let transport = Arc::new(MemoryTransport::new());
    let registry = Arc::new(KeyRegistry::new());
    registry
        .add_key(KeyMaterial::generate(kid).expect("generate key"), true)
        .expect("add key");
    let client = KvClient::new(transport.clone()).with_key_registry(registry.clone());
    (client, transport, registry)
}
