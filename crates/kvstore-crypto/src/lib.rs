//! Client-side encryption for kvstore values.
//!
//! - `key_path`: structured keys and one-segment wildcard patterns
//! - `registry`: registered keys, the active key, and the only/except policy
//! - `aes_gcm`: AES-256-GCM envelopes tagged with the sealing key id
//! - `jwk`: exported key strings (`base64(JSON oct JWK)`)

pub mod aes_gcm;
pub mod base64url;
pub mod error;
pub mod jwk;
pub mod key_material;
pub mod key_path;
pub mod registry;
pub mod types;

pub use aes_gcm::{decrypt, decrypt_with_key, encrypt, generate_iv, EncryptedEnvelope};
pub use base64url::{base64_decode, base64_encode, base64url_decode, base64url_encode};
pub use error::CryptoError;
pub use jwk::{export_key, import_key, OctJwk};
pub use key_material::KeyMaterial;
pub use key_path::{matches, KeyPattern, KvKey, PatternSegment};
pub use registry::KeyRegistry;
pub use types::{AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH, AES_KEY_LENGTH, WILDCARD};
