//! `KvClient`: typed get/set/delete/list over a [`KvTransport`], with
//! client-side encryption when a [`KeyRegistry`] is attached.

use std::sync::Arc;

use kvstore_crypto::{KeyRegistry, KvKey};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::atomic::AtomicOperation;
use crate::codec::{open_optional, open_typed};
use crate::config::ClientConfig;
use crate::error::{KvError, Result};
use crate::transport::KvTransport;
use crate::types::{
    CommitResult, Entry, ListOptions, ListPage, ListSelector, RawListPage, SetOptions,
};

/// Client for the remote store.
///
/// Cloning is cheap; clones share the transport and the key registry.
#[derive(Clone)]
pub struct KvClient {
    transport: Arc<dyn KvTransport>,
    keys: Option<Arc<KeyRegistry>>,
}

impl KvClient {
    /// A client without encryption. Encrypted records fail to read with
    /// `NoKeyManagerAvailable`.
    pub fn new(transport: Arc<dyn KvTransport>) -> Self {
        Self {
            transport,
            keys: None,
        }
    }

    pub fn with_key_registry(mut self, registry: Arc<KeyRegistry>) -> Self {
        self.keys = Some(registry);
        self
    }

    /// Build a client from configuration. A configured encryption key is
    /// registered as the active key.
    pub fn from_config(transport: Arc<dyn KvTransport>, config: &ClientConfig) -> Result<Self> {
        let client = Self::new(transport);
        Ok(match config.key_registry()? {
            Some(registry) => client.with_key_registry(Arc::new(registry)),
            None => client,
        })
    }

    pub fn key_registry(&self) -> Option<&Arc<KeyRegistry>> {
        self.keys.as_ref()
    }

    pub(crate) fn registry(&self) -> Option<&KeyRegistry> {
        self.keys.as_deref()
    }

    pub(crate) fn transport(&self) -> &dyn KvTransport {
        self.transport.as_ref()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get<T: DeserializeOwned>(&self, key: impl Into<KvKey>) -> Result<Entry<Option<T>>> {
        let key = key.into();
        let mut entries = self.get_many::<T>(std::slice::from_ref(&key)).await?;
        entries
            .pop()
            .ok_or_else(|| KvError::UnexpectedResponse(format!("no entry returned for {}", key)))
    }

    /// Read several keys in one round trip. Results are in `keys` order.
    pub async fn get_many<T: DeserializeOwned>(
        &self,
        keys: &[KvKey],
    ) -> Result<Vec<Entry<Option<T>>>> {
        let raw = self.transport.get_many(keys).await?;
        if raw.len() != keys.len() {
            return Err(KvError::UnexpectedResponse(format!(
                "requested {} keys, got {} entries",
                keys.len(),
                raw.len()
            )));
        }
        raw.into_iter()
            .zip(keys)
            .map(|(entry, key)| {
                if &entry.key != key {
                    return Err(KvError::UnexpectedResponse(format!(
                        "expected entry for {}, got {}",
                        key, entry.key
                    )));
                }
                open_optional(self.registry(), entry)
            })
            .collect()
    }

    /// Fetch one page of entries.
    pub async fn list<T: DeserializeOwned>(
        &self,
        selector: &ListSelector,
        options: &ListOptions,
    ) -> Result<ListPage<T>> {
        let RawListPage { entries, cursor } = self.transport.list(selector, options).await?;
        let entries = entries
            .into_iter()
            .map(|raw| open_typed(self.registry(), raw))
            .collect::<Result<Vec<_>>>()?;
        Ok(ListPage { entries, cursor })
    }

    /// Fetch every entry matching `selector`, following cursors to the end.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        selector: &ListSelector,
    ) -> Result<Vec<Entry<T>>> {
        let mut options = ListOptions::default();
        let mut all = Vec::new();
        loop {
            let page = self.list::<T>(selector, &options).await?;
            all.extend(page.entries);
            match page.cursor {
                Some(cursor) => {
                    debug!(fetched = all.len(), "following list cursor");
                    options.cursor = Some(cursor);
                }
                None => return Ok(all),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: impl Into<KvKey>,
        value: &T,
    ) -> Result<CommitResult> {
        self.set_with(key, value, SetOptions::default()).await
    }

    pub async fn set_with<T: Serialize + ?Sized>(
        &self,
        key: impl Into<KvKey>,
        value: &T,
        options: SetOptions,
    ) -> Result<CommitResult> {
        self.atomic().set_with(key, value, options).commit().await
    }

    pub async fn delete(&self, key: impl Into<KvKey>) -> Result<()> {
        let result = self.atomic().delete(key).commit().await?;
        if !result.ok {
            return Err(KvError::UnexpectedResponse(
                "unconditional delete was rejected".into(),
            ));
        }
        Ok(())
    }

    /// Start an atomic operation: checks plus mutations, committed together.
    pub fn atomic(&self) -> AtomicOperation<'_> {
        AtomicOperation::new(self)
    }
}

impl std::fmt::Debug for KvClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvClient")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
