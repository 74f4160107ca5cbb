//! Write and read hooks between the client and the transport.
//!
//! Write: value → policy check → (envelope | plain value) → transport
//! Read: transport → `encrypted` flag → (decrypt | plain value) → caller

use kvstore_crypto::{encrypt, EncryptedEnvelope, KeyRegistry, KvKey};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{KvError, Result};
use crate::types::{Entry, RawEntry};

/// A value ready to send, plus whether it is an envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct SealedValue {
    pub value: Value,
    pub encrypted: bool,
}

/// Encrypt `value` with the active key if the registry's policy covers `key`.
pub fn seal_value(registry: Option<&KeyRegistry>, key: &KvKey, value: Value) -> Result<SealedValue> {
    let Some(material) = registry.and_then(|r| r.encryption_key_for(key)) else {
        return Ok(SealedValue {
            value,
            encrypted: false,
        });
    };
    let envelope = encrypt(&material, &value)?;
    Ok(SealedValue {
        value: envelope.to_value()?,
        encrypted: true,
    })
}

/// Turn a raw record into a plain-value entry.
///
/// Encrypted records are always decrypted, whatever the current policy says.
pub fn open_entry(registry: Option<&KeyRegistry>, raw: RawEntry) -> Result<Entry<Value>> {
    let RawEntry {
        key,
        value,
        version,
        encrypted,
        ..
    } = raw;
    let value = if encrypted {
        let registry = registry.ok_or(KvError::NoKeyManagerAvailable)?;
        let envelope = EncryptedEnvelope::from_value(value)?;
        kvstore_crypto::decrypt(registry, &envelope)?
    } else {
        value
    };
    Ok(Entry {
        key,
        value,
        version,
        encrypted,
    })
}

/// [`open_entry`] for a point read: missing keys yield `value: None`.
pub fn open_optional<T: DeserializeOwned>(
    registry: Option<&KeyRegistry>,
    raw: RawEntry,
) -> Result<Entry<Option<T>>> {
    if raw.version.is_none() {
        return Ok(Entry {
            key: raw.key,
            value: None,
            version: None,
            encrypted: false,
        });
    }
    Ok(open_typed(registry, raw)?.map(Some))
}

/// [`open_entry`] followed by deserialization into `T`.
pub fn open_typed<T: DeserializeOwned>(
    registry: Option<&KeyRegistry>,
    raw: RawEntry,
) -> Result<Entry<T>> {
    let entry = open_entry(registry, raw)?;
    let value = serde_json::from_value(entry.value)?;
    Ok(Entry {
        key: entry.key,
        value,
        version: entry.version,
        encrypted: entry.encrypted,
    })
}
