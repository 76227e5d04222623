//! secrets::keychain_store
//!
//! Keychain-based secret storage using the OS keychain.
//!
//! # Platform Support
//!
//! This module uses the `keyring` crate which supports:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: Secret Service (via D-Bus)
//!
//! Each `(service, key)` pair becomes one keychain entry whose service name
//! is `<namespace>:<service>` and whose user is `key`. The default namespace
//! is `gitward`.
//!
//! # Feature Flag
//!
//! Only functional with the `keychain` feature. Without it the type exists
//! but every constructor fails with a provider error.

#[cfg(feature = "keychain")]
use keyring::Entry;

use super::traits::{SecretError, SecretStore};

#[cfg(feature = "keychain")]
#[derive(Debug)]
pub struct KeychainSecretStore {
    namespace: String,
}

#[cfg(feature = "keychain")]
impl KeychainSecretStore {
    /// Create a store in the `gitward` namespace.
    pub fn new() -> Result<Self, SecretError> {
        Ok(Self::with_namespace("gitward"))
    }

    /// Create a store with a custom namespace (tests use a per-process one).
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn entry(&self, service: &str, key: &str) -> Result<Entry, SecretError> {
        Entry::new(&format!("{}:{}", self.namespace, service), key)
            .map_err(|e| SecretError::ReadError(format!("cannot create keyring entry: {}", e)))
    }
}

#[cfg(feature = "keychain")]
impl SecretStore for KeychainSecretStore {
    fn get(&self, service: &str, key: &str) -> Result<Option<String>, SecretError> {
        match self.entry(service, key)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::Ambiguous(_)) => Err(SecretError::ReadError(
                "ambiguous keychain entry".to_string(),
            )),
            Err(e) => Err(SecretError::ReadError(format!(
                "cannot read from keychain: {}",
                e
            ))),
        }
    }

    fn set(&self, service: &str, key: &str, value: &str) -> Result<(), SecretError> {
        self.entry(service, key)?
            .set_password(value)
            .map_err(|e| SecretError::WriteError(format!("cannot write to keychain: {}", e)))
    }

    fn delete(&self, service: &str, key: &str) -> Result<(), SecretError> {
        match self.entry(service, key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecretError::DeleteError(format!(
                "cannot delete from keychain: {}",
                e
            ))),
        }
    }
}

#[cfg(not(feature = "keychain"))]
#[derive(Debug)]
pub struct KeychainSecretStore {
    _private: (),
}

#[cfg(not(feature = "keychain"))]
impl KeychainSecretStore {
    /// Always fails when compiled without the `keychain` feature.
    pub fn new() -> Result<Self, SecretError> {
        Err(SecretError::ProviderNotAvailable(
            "keychain support not enabled (compile with --features keychain)".into(),
        ))
    }
}

#[cfg(not(feature = "keychain"))]
impl SecretStore for KeychainSecretStore {
    fn get(&self, _service: &str, _key: &str) -> Result<Option<String>, SecretError> {
        Err(SecretError::ReadError("keychain not available".into()))
    }

    fn set(&self, _service: &str, _key: &str, _value: &str) -> Result<(), SecretError> {
        Err(SecretError::WriteError("keychain not available".into()))
    }

    fn delete(&self, _service: &str, _key: &str) -> Result<(), SecretError> {
        Err(SecretError::DeleteError("keychain not available".into()))
    }
}
