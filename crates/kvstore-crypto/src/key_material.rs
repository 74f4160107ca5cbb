//! Symmetric key material identified by a key id (`kid`).

use std::fmt;

use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::types::AES_KEY_LENGTH;

/// A 256-bit AES key and the id envelopes use to refer to it.
///
/// Key bytes are zeroized on drop and redacted from `Debug` output.
#[derive(Clone)]
pub struct KeyMaterial {
    kid: String,
    key: Zeroizing<[u8; AES_KEY_LENGTH]>,
}

impl KeyMaterial {
    /// Build key material from raw bytes.
    ///
    /// # Errors
    /// `InvalidKeyMaterial` for an empty kid, `InvalidKeyLength` unless `key` is 32 bytes.
    pub fn new(kid: impl Into<String>, key: &[u8]) -> Result<Self, CryptoError> {
        let kid = kid.into();
        if kid.is_empty() {
            return Err(CryptoError::InvalidKeyMaterial("kid is required"));
        }
        let bytes: [u8; AES_KEY_LENGTH] =
            key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: AES_KEY_LENGTH,
                got: key.len(),
            })?;
        Ok(Self {
            kid,
            key: Zeroizing::new(bytes),
        })
    }

    /// Generate a random 256-bit key under `kid`.
    pub fn generate(kid: impl Into<String>) -> Result<Self, CryptoError> {
        let mut bytes = Zeroizing::new([0u8; AES_KEY_LENGTH]);
        getrandom::getrandom(&mut bytes[..]).map_err(|e| CryptoError::RngFailed(e.to_string()))?;
        Self::new(kid, &bytes[..])
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn key_bytes(&self) -> &[u8] {
        &self.key[..]
    }
}

impl PartialEq for KeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.kid == other.kid && self.key[..] == other.key[..]
    }
}

impl Eq for KeyMaterial {}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("kid", &self.kid)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_kid() {
        let err = KeyMaterial::new("", &[0u8; 32]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyMaterial(_)));
    }

    #[test]
    fn rejects_short_key() {
        let err = KeyMaterial::new("k1", &[0u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::InvalidKeyLength {
                expected: 32,
                got: 16
            }
        ));
    }

    #[test]
    fn generated_keys_are_unique() {
        let a = KeyMaterial::generate("a").unwrap();
        let b = KeyMaterial::generate("a").unwrap();
        assert_eq!(a.key_bytes().len(), AES_KEY_LENGTH);
        assert_ne!(a, b);
    }

    #[test]
    fn debug_redacts_key_bytes() {
        let key = KeyMaterial::new("k1", &[0xab; 32]).unwrap();
        let out = format!("{:?}", key);
        assert!(out.contains("k1"));
        assert!(out.contains("redacted"));
        assert!(!out.contains("171"));
    }
}
