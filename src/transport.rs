//! The network layer the client talks through.
//!
//! Implementations own HTTP, auth headers, retries, and URL building. They
//! move raw records; encryption happens in the client before and after.

use async_trait::async_trait;
use kvstore_crypto::KvKey;
use thiserror::Error;

use crate::types::{AtomicBatch, CommitResult, ListOptions, ListSelector, RawEntry, RawListPage};

/// User-implemented transport to the remote store.
#[async_trait]
pub trait KvTransport: Send + Sync {
    /// Fetch records for `keys`, one per key and in the same order. Keys with
    /// no value come back as [`RawEntry::missing`].
    async fn get_many(&self, keys: &[KvKey]) -> Result<Vec<RawEntry>, TransportError>;

    /// Fetch one page of records matching `selector`.
    async fn list(
        &self,
        selector: &ListSelector,
        options: &ListOptions,
    ) -> Result<RawListPage, TransportError>;

    /// Apply a batch atomically. A failed check is `Ok(CommitResult { ok: false, .. })`.
    async fn commit(&self, batch: &AtomicBatch) -> Result<CommitResult, TransportError>;
}

/// Why a transport call failed, so callers can decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Timeouts, dropped connections and 5xx responses.
    Transient,
    /// The store rejected the request itself; resending it will not help.
    Permanent,
    /// The access token is missing, expired or lacks permission.
    Auth,
    /// The store is throttling this client or its quota is spent.
    Capacity,
}

/// Failure reported by a [`KvTransport`] implementation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub kind: TransportErrorKind,
}

impl TransportError {
    /// A [`TransportErrorKind::Transient`] failure.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(message, TransportErrorKind::Transient)
    }

    pub fn with_kind(message: impl Into<String>, kind: TransportErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Classify a failed HTTP response from the store.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let kind = match status {
            401 | 403 => TransportErrorKind::Auth,
            429 => TransportErrorKind::Capacity,
            408 | 500..=599 => TransportErrorKind::Transient,
            _ => TransportErrorKind::Permanent,
        };
        Self::with_kind(message, kind)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Transient | TransportErrorKind::Capacity
        )
    }
}
