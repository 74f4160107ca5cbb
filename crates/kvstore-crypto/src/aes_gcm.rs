//! AES-256-GCM value envelopes.
//!
//! Wire format (JSON):
//! `{"ciphertext": base64(ciphertext + tag), "iv": base64(12 bytes), "kid": "<key id>"}`
//!
//! The plaintext is the compact JSON serialization of the stored value.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use zeroize::Zeroizing;

use crate::base64url::{base64_decode, base64_encode};
use crate::error::CryptoError;
use crate::key_material::KeyMaterial;
use crate::registry::KeyRegistry;
use crate::types::{AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH};

/// Ciphertext bundle carrying the id of the key that sealed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub ciphertext: String,
    #[serde(with = "iv_base64")]
    pub iv: [u8; AES_GCM_IV_LENGTH],
    pub kid: String,
}

impl EncryptedEnvelope {
    /// Parse an envelope out of a stored JSON value.
    pub fn from_value(value: Value) -> Result<Self, CryptoError> {
        serde_json::from_value(value)
            .map_err(|e| CryptoError::DecryptionFailed(format!("malformed envelope: {}", e)))
    }

    pub fn to_value(&self) -> Result<Value, CryptoError> {
        serde_json::to_value(self).map_err(|e| CryptoError::SerializationError(e.to_string()))
    }
}

mod iv_base64 {
    use super::*;
    use serde::de::Error as _;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(iv: &[u8; AES_GCM_IV_LENGTH], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64_encode(iv))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<[u8; AES_GCM_IV_LENGTH], D::Error> {
        let encoded = String::deserialize(d)?;
        let bytes = base64_decode(&encoded).map_err(D::Error::custom)?;
        bytes.as_slice().try_into().map_err(|_| {
            D::Error::custom(format!(
                "iv must be {} bytes, got {}",
                AES_GCM_IV_LENGTH,
                bytes.len()
            ))
        })
    }
}

/// Generate a random 12-byte IV for AES-GCM.
pub fn generate_iv() -> Result<[u8; AES_GCM_IV_LENGTH], CryptoError> {
    let mut iv = [0u8; AES_GCM_IV_LENGTH];
    getrandom::getrandom(&mut iv).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
    Ok(iv)
}

fn cipher_for(material: &KeyMaterial) -> Result<Aes256Gcm, CryptoError> {
    Aes256Gcm::new_from_slice(material.key_bytes())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
}

/// Encrypt `value` under `material` with a fresh random IV.
pub fn encrypt(material: &KeyMaterial, value: &Value) -> Result<EncryptedEnvelope, CryptoError> {
    encrypt_with_iv(material, value, generate_iv()?)
}

/// Encrypt with a caller-chosen IV. An IV must never be reused with the same key.
pub(crate) fn encrypt_with_iv(
    material: &KeyMaterial,
    value: &Value,
    iv: [u8; AES_GCM_IV_LENGTH],
) -> Result<EncryptedEnvelope, CryptoError> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(value).map_err(|e| CryptoError::SerializationError(e.to_string()))?,
    );
    let cipher = cipher_for(material)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_slice())
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    debug!(kid = material.kid(), bytes = plaintext.len(), "value encrypted");
    Ok(EncryptedEnvelope {
        ciphertext: base64_encode(&ciphertext),
        iv,
        kid: material.kid().to_string(),
    })
}

/// Decrypt an envelope with whichever registered key its `kid` names.
///
/// # Errors
/// `KeyNotFound` when the kid is not registered, `DecryptionFailed` when the
/// tag does not verify or the plaintext is not valid JSON.
pub fn decrypt(registry: &KeyRegistry, envelope: &EncryptedEnvelope) -> Result<Value, CryptoError> {
    let material = registry.get_key(&envelope.kid)?;
    decrypt_with_key(&material, envelope)
}

/// Decrypt with explicit key material. The envelope kid must match.
pub fn decrypt_with_key(
    material: &KeyMaterial,
    envelope: &EncryptedEnvelope,
) -> Result<Value, CryptoError> {
    if material.kid() != envelope.kid {
        return Err(CryptoError::KeyNotFound(envelope.kid.clone()));
    }
    let ciphertext = base64_decode(&envelope.ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(format!("ciphertext base64: {}", e)))?;
    if ciphertext.len() < AES_GCM_TAG_LENGTH {
        return Err(CryptoError::DecryptionFailed(
            "encrypted data too short".into(),
        ));
    }

    let cipher = Aes256Gcm::new_from_slice(material.key_bytes())
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&envelope.iv), ciphertext.as_slice())
            .map_err(|_| CryptoError::DecryptionFailed("authentication failed".into()))?,
    );

    debug!(kid = %envelope.kid, bytes = plaintext.len(), "value decrypted");
    serde_json::from_slice(&plaintext)
        .map_err(|e| CryptoError::DecryptionFailed(format!("plaintext is not JSON: {}", e)))
}
