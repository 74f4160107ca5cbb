//! Client for a remote key-value store.
//!
//! Values are JSON. Reads and writes go through a user-supplied
//! [`KvTransport`]; when a [`KeyRegistry`] is attached, values whose keys the
//! registry's policy covers are sealed in AES-256-GCM envelopes before they
//! leave the process, and encrypted records are opened on the way back.

pub mod atomic;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod reencrypt;
pub mod transport;
pub mod types;

pub use atomic::AtomicOperation;
pub use client::KvClient;
pub use codec::{open_entry, seal_value, SealedValue};
pub use config::{ClientConfig, ConfigError, ACCESS_TOKEN_ENV, ENCRYPTION_KEY_ENV, ENDPOINT_ENV};
pub use error::{KvError, Result};
pub use reencrypt::ReencryptReport;
pub use transport::{KvTransport, TransportError, TransportErrorKind};
pub use types::{
    AtomicBatch, Check, CommitResult, Entry, ListOptions, ListPage, ListSelector, Mutation,
    RawEntry, RawListPage, SetOptions,
};

pub use kvstore_crypto::{
    export_key, import_key, CryptoError, EncryptedEnvelope, KeyMaterial, KeyPattern, KeyRegistry,
    KvKey,
};
