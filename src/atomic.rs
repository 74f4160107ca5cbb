//! Atomic operations: optimistic-concurrency checks plus mutations.

use kvstore_crypto::KvKey;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::client::KvClient;
use crate::codec::seal_value;
use crate::error::{KvError, Result};
use crate::types::{AtomicBatch, Check, CommitResult, Mutation, SetOptions};

enum PendingMutation {
    Set {
        key: KvKey,
        value: Value,
        options: SetOptions,
    },
    Delete {
        key: KvKey,
    },
}

/// Builder for one atomic commit.
///
/// Values are sealed at `commit`, so the encryption policy in force at commit
/// time applies to every `set` in the batch.
///
/// ```ignore
/// let entry = client.get::<u64>(["counter"]).await?;
/// let result = client
///     .atomic()
///     .check(["counter"], entry.version)
///     .set(["counter"], &(entry.value.unwrap_or(0) + 1))
///     .commit()
///     .await?;
/// ```
#[must_use = "an atomic operation does nothing until committed"]
pub struct AtomicOperation<'a> {
    client: &'a KvClient,
    checks: Vec<Check>,
    mutations: Vec<PendingMutation>,
    /// First serialization failure; reported by `commit`.
    error: Option<serde_json::Error>,
}

impl<'a> AtomicOperation<'a> {
    pub(crate) fn new(client: &'a KvClient) -> Self {
        Self {
            client,
            checks: Vec::new(),
            mutations: Vec::new(),
            error: None,
        }
    }

    /// Require `key` to be at `version` (`None`: the key must not exist).
    pub fn check(mut self, key: impl Into<KvKey>, version: Option<String>) -> Self {
        self.checks.push(Check {
            key: key.into(),
            version,
        });
        self
    }

    pub fn set<T: Serialize + ?Sized>(self, key: impl Into<KvKey>, value: &T) -> Self {
        self.set_with(key, value, SetOptions::default())
    }

    pub fn set_with<T: Serialize + ?Sized>(
        mut self,
        key: impl Into<KvKey>,
        value: &T,
        options: SetOptions,
    ) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => self.mutations.push(PendingMutation::Set {
                key: key.into(),
                value,
                options,
            }),
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    pub fn delete(mut self, key: impl Into<KvKey>) -> Self {
        self.mutations
            .push(PendingMutation::Delete { key: key.into() });
        self
    }

    /// Seal values under the current policy and build the wire batch.
    fn into_batch(self) -> Result<AtomicBatch> {
        if let Some(e) = self.error {
            return Err(KvError::Json(e));
        }
        let registry = self.client.registry();
        let mutations = self
            .mutations
            .into_iter()
            .map(|pending| -> Result<Mutation> {
                Ok(match pending {
                    PendingMutation::Set {
                        key,
                        value,
                        options,
                    } => {
                        let sealed = seal_value(registry, &key, value)?;
                        Mutation::Set {
                            key,
                            value: sealed.value,
                            encrypted: sealed.encrypted,
                            expire_in_ms: options
                                .expire_in
                                .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
                        }
                    }
                    PendingMutation::Delete { key } => Mutation::Delete { key },
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(AtomicBatch {
            checks: self.checks,
            mutations,
        })
    }

    /// Send the batch. `ok == false` in the result means a check failed.
    pub async fn commit(self) -> Result<CommitResult> {
        let client = self.client;
        let batch = self.into_batch()?;
        debug!(
            checks = batch.checks.len(),
            mutations = batch.mutations.len(),
            "committing atomic batch"
        );
        let result = client.transport().commit(&batch).await?;
        if !result.ok {
            debug!("atomic commit rejected by check");
        }
        Ok(result)
    }
}
