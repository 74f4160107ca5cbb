//! Key registry: registered keys, the active key, and the per-key encryption policy.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::CryptoError;
use crate::key_material::KeyMaterial;
use crate::key_path::{KeyPattern, KvKey};

#[derive(Default)]
struct RegistryState {
    keys: HashMap<String, Arc<KeyMaterial>>,
    active_kid: Option<String>,
    only: Vec<KeyPattern>,
    except: Vec<KeyPattern>,
}

impl RegistryState {
    fn active(&self) -> Option<&Arc<KeyMaterial>> {
        self.active_kid.as_ref().and_then(|kid| self.keys.get(kid))
    }
}

/// Keys available to a client, plus the `only`/`except` patterns that decide
/// which store keys get encrypted on write.
///
/// All state sits behind one `RwLock`, so readers never observe the key map
/// and the active id out of step. Decryption may use any registered key;
/// only the active key is used for new encryptions.
#[derive(Default)]
pub struct KeyRegistry {
    state: RwLock<RegistryState>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `material`. With `make_active`, it becomes the active key,
    /// replacing whichever key was active before.
    ///
    /// A kid that is already registered has its material replaced.
    pub fn add_key(&self, material: KeyMaterial, make_active: bool) -> Result<(), CryptoError> {
        if material.kid().is_empty() {
            return Err(CryptoError::InvalidKeyMaterial("kid is required"));
        }
        let kid = material.kid().to_string();
        let mut state = self.state.write();
        if state.keys.insert(kid.clone(), Arc::new(material)).is_some() {
            warn!(kid = %kid, "replaced existing key material");
        }
        if make_active {
            info!(kid = %kid, previous = ?state.active_kid, "active encryption key set");
            state.active_kid = Some(kid);
        } else {
            info!(kid = %kid, "key registered");
        }
        Ok(())
    }

    pub fn get_key(&self, kid: &str) -> Result<Arc<KeyMaterial>, CryptoError> {
        self.state
            .read()
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| CryptoError::KeyNotFound(kid.to_string()))
    }

    pub fn get_active_key(&self) -> Result<Arc<KeyMaterial>, CryptoError> {
        self.state
            .read()
            .active()
            .cloned()
            .ok_or(CryptoError::NoActiveKey)
    }

    pub fn active_kid(&self) -> Option<String> {
        let state = self.state.read();
        state.active().map(|m| m.kid().to_string())
    }

    /// Make an already registered key the active one.
    pub fn set_active(&self, kid: &str) -> Result<(), CryptoError> {
        let mut state = self.state.write();
        if !state.keys.contains_key(kid) {
            return Err(CryptoError::KeyNotFound(kid.to_string()));
        }
        info!(kid = %kid, previous = ?state.active_kid, "active encryption key set");
        state.active_kid = Some(kid.to_string());
        Ok(())
    }

    /// Remove a key. Removing the active key leaves no key active; there is
    /// no fallback to a previously active key.
    pub fn remove_key(&self, kid: &str) {
        let mut state = self.state.write();
        if state.keys.remove(kid).is_none() {
            return;
        }
        if state.active_kid.as_deref() == Some(kid) {
            warn!(kid = %kid, "active key removed; new values will be stored unencrypted");
            state.active_kid = None;
        } else {
            info!(kid = %kid, "key removed");
        }
    }

    /// Registered kids, sorted.
    pub fn kids(&self) -> Vec<String> {
        let mut kids: Vec<String> = self.state.read().keys.keys().cloned().collect();
        kids.sort();
        kids
    }

    pub fn len(&self) -> usize {
        self.state.read().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().keys.is_empty()
    }

    /// True when new values can be encrypted: at least one key and an active key.
    pub fn is_available(&self) -> bool {
        self.state.read().active().is_some()
    }

    pub fn add_only_patterns<I, P>(&self, patterns: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPattern>,
    {
        self.state
            .write()
            .only
            .extend(patterns.into_iter().map(Into::into));
    }

    pub fn add_except_patterns<I, P>(&self, patterns: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPattern>,
    {
        self.state
            .write()
            .except
            .extend(patterns.into_iter().map(Into::into));
    }

    /// Decide whether a value written under `key` must be encrypted.
    ///
    /// 1. No active key: false.
    /// 2. A non-empty `only` list must match.
    /// 3. Any `except` match vetoes.
    pub fn should_encrypt(&self, key: &KvKey) -> bool {
        self.encryption_key_for(key).is_some()
    }

    /// Active key to encrypt a value for `key` with, or `None` when policy
    /// leaves the value in plaintext. Policy and key are read under one lock.
    pub fn encryption_key_for(&self, key: &KvKey) -> Option<Arc<KeyMaterial>> {
        let state = self.state.read();
        let active = state.active()?;
        if !state.only.is_empty() && !state.only.iter().any(|p| p.matches(key)) {
            return None;
        }
        if state.except.iter().any(|p| p.matches(key)) {
            return None;
        }
        Some(Arc::clone(active))
    }
}

impl std::fmt::Debug for KeyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("KeyRegistry")
            .field("kids", &state.keys.keys().collect::<Vec<_>>())
            .field("active_kid", &state.active_kid)
            .field("only", &state.only.len())
            .field("except", &state.except.len())
            .finish()
    }
}
