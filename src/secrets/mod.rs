//! secrets
//!
//! Credential storage for remote authentication.
//!
//! # Architecture
//!
//! Secrets are stored through the [`SecretStore`] trait, keyed by
//! `(service, key)`:
//!
//! - [`FileSecretStore`]: `~/.gitward/secrets.toml` (default)
//! - [`KeychainSecretStore`]: OS keychain (optional, feature-gated)
//! - [`MemorySecretStore`]: process-local, nothing persisted
//!
//! # Security
//!
//! - Secrets are **never** logged or included in error messages, events,
//!   status reports or analytics
//! - File store uses 0600 permissions on Unix
//! - File writes are atomic (temp file + rename)
//!
//! The transport only sees secrets through
//! [`crate::git::CredentialResolver`].

mod file_store;
mod keychain_store;
mod memory_store;
mod traits;

pub use file_store::FileSecretStore;
pub use keychain_store::KeychainSecretStore;
pub use memory_store::MemorySecretStore;
pub use traits::{SecretError, SecretStore};

use std::sync::Arc;

/// The default secret store provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Create a secret store by provider name.
///
/// # Providers
///
/// - `"file"` (default): [`FileSecretStore`]
/// - `"keychain"`: [`KeychainSecretStore`] (requires the `keychain` feature)
/// - `"memory"`: [`MemorySecretStore`]
///
/// # Errors
///
/// - Unknown provider name
/// - Keychain provider without `keychain` feature enabled
/// - Initialization errors from the store
pub fn create_store(provider: &str) -> Result<Arc<dyn SecretStore>, SecretError> {
    match provider {
        "file" => Ok(Arc::new(FileSecretStore::new()?)),
        "keychain" => Ok(Arc::new(KeychainSecretStore::new()?)),
        "memory" => Ok(Arc::new(MemorySecretStore::new())),
        other => Err(SecretError::ProviderNotAvailable(format!(
            "unknown secret provider: '{}' (valid: file, keychain, memory)",
            other
        ))),
    }
}
