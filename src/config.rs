//! Client configuration sourced from environment variables.

use kvstore_crypto::{import_key, CryptoError, KeyRegistry};
use thiserror::Error;
use tracing::info;

/// Base URL of the store, handed to transports.
pub const ENDPOINT_ENV: &str = "KV_ENDPOINT";
/// Bearer token, handed to transports.
pub const ACCESS_TOKEN_ENV: &str = "KV_ACCESS_TOKEN";
/// One exported key (see `kvstore_crypto::export_key`), registered as active.
pub const ENCRYPTION_KEY_ENV: &str = "KV_ENCRYPTION_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {var}: {source}")]
    InvalidEncryptionKey {
        var: &'static str,
        #[source]
        source: CryptoError,
    },
}

#[derive(Clone, Default)]
pub struct ClientConfig {
    pub endpoint: Option<String>,
    pub access_token: Option<String>,
    pub encryption_key: Option<String>,
}

impl ClientConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            endpoint: get(ENDPOINT_ENV),
            access_token: get(ACCESS_TOKEN_ENV),
            encryption_key: get(ENCRYPTION_KEY_ENV),
        }
    }

    /// Build a key registry holding the configured key as the active key, or
    /// `None` when no key is configured.
    pub fn key_registry(&self) -> Result<Option<KeyRegistry>, ConfigError> {
        let Some(exported) = self.encryption_key.as_deref() else {
            return Ok(None);
        };
        let invalid = |source| ConfigError::InvalidEncryptionKey {
            var: ENCRYPTION_KEY_ENV,
            source,
        };
        let material = import_key(exported).map_err(invalid)?;
        info!(kid = material.kid(), "encryption key loaded from environment");
        let registry = KeyRegistry::new();
        registry.add_key(material, true).map_err(invalid)?;
        Ok(Some(registry))
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("access_token", &redact(&self.access_token))
            .field("encryption_key", &redact(&self.encryption_key))
            .finish()
    }
}
