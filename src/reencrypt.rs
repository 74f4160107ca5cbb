//! Re-seal stored values after a key rotation.
//!
//! Entries encrypted under a kid other than the active one are decrypted and
//! written back under the active key. Plaintext entries that the current
//! policy covers are encrypted. Encrypted entries are never downgraded to
//! plaintext. Every rewrite is guarded by a version check, so a concurrent
//! writer wins and the entry is counted as a conflict. A rewrite keeps the
//! record's remaining expiry.
//!
//! Entries that cannot be opened (their kid was removed, the envelope is
//! corrupt) are counted as failures and left untouched; the pass carries on.

use kvstore_crypto::{encrypt, EncryptedEnvelope, KeyRegistry};
use tracing::{debug, info, warn};

use crate::client::KvClient;
use crate::codec::open_entry;
use crate::error::{KvError, Result};
use crate::types::{AtomicBatch, Check, ListOptions, ListSelector, Mutation, RawEntry};

/// Counts from one [`KvClient::reencrypt`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReencryptReport {
    pub scanned: usize,
    pub rewritten: usize,
    pub skipped: usize,
    pub conflicts: usize,
    /// Entries that could not be decrypted and were left as stored.
    pub failed: usize,
}

fn needs_reseal(registry: &KeyRegistry, raw: &RawEntry, active_kid: &str) -> Result<bool> {
    if raw.encrypted {
        let envelope = EncryptedEnvelope::from_value(raw.value.clone())?;
        Ok(envelope.kid != active_kid)
    } else {
        Ok(registry.should_encrypt(&raw.key))
    }
}

impl KvClient {
    /// Rewrite every entry under `selector` that is not sealed with the
    /// active key but should be.
    ///
    /// # Errors
    /// `NoKeyManagerAvailable` without a registry, `NoActiveKey` without an
    /// active key, and transport errors. Unreadable entries are reported in
    /// [`ReencryptReport::failed`] instead.
    pub async fn reencrypt(&self, selector: &ListSelector) -> Result<ReencryptReport> {
        let registry = self.registry().ok_or(KvError::NoKeyManagerAvailable)?;
        let active = registry.get_active_key()?;

        let mut report = ReencryptReport::default();
        let mut options = ListOptions::default();
        loop {
            let page = self.transport().list(selector, &options).await?;
            for raw in page.entries {
                report.scanned += 1;
                match needs_reseal(registry, &raw, active.kid()) {
                    Ok(true) => {}
                    Ok(false) => {
                        report.skipped += 1;
                        continue;
                    }
                    Err(e) => {
                        warn!(key = %raw.key, error = %e, "unreadable entry skipped");
                        report.failed += 1;
                        continue;
                    }
                }
                let key = raw.key.clone();
                let expire_in_ms = raw.expire_in_ms;
                let entry = match open_entry(Some(registry), raw) {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(key = %key, error = %e, "unreadable entry skipped");
                        report.failed += 1;
                        continue;
                    }
                };
                let envelope = encrypt(&active, &entry.value)?;
                let batch = AtomicBatch {
                    checks: vec![Check {
                        key: entry.key.clone(),
                        version: entry.version.clone(),
                    }],
                    mutations: vec![Mutation::Set {
                        key: entry.key.clone(),
                        value: envelope.to_value()?,
                        encrypted: true,
                        expire_in_ms,
                    }],
                };
                if self.transport().commit(&batch).await?.ok {
                    debug!(key = %entry.key, kid = active.kid(), "entry re-sealed");
                    report.rewritten += 1;
                } else {
                    warn!(key = %entry.key, "entry changed during re-encryption; left as is");
                    report.conflicts += 1;
                }
            }
            match page.cursor {
                Some(cursor) => options.cursor = Some(cursor),
                None => break,
            }
        }

        info!(
            kid = active.kid(),
            scanned = report.scanned,
            rewritten = report.rewritten,
            conflicts = report.conflicts,
            failed = report.failed,
            "re-encryption finished"
        );
        Ok(report)
    }
}
