//! secrets::traits
//!
//! Secret storage trait definition.
//!
//! # Design
//!
//! Secrets are addressed by `(service, key)`, e.g. `("github", "token")`.
//! The store treats both parts as opaque strings.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include secret values in error messages
//! - Use storage appropriate to the platform
//! - Be thread-safe (Send + Sync)

use thiserror::Error;

/// Errors from secret storage operations.
///
/// Messages name the service and key at most, never the value.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("failed to read secret: {0}")]
    ReadError(String),

    #[error("failed to write secret: {0}")]
    WriteError(String),

    #[error("failed to delete secret: {0}")]
    DeleteError(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Provider not available or not configured.
    #[error("secret provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// Trait for secret storage providers.
///
/// # Example
///
/// ```
/// use gitward::secrets::{MemorySecretStore, SecretStore};
///
/// let store = MemorySecretStore::new();
/// store.set("github", "token", "ghp_example").unwrap();
/// assert!(store.exists("github", "token").unwrap());
///
/// store.delete("github", "token").unwrap();
/// assert_eq!(store.get("github", "token").unwrap(), None);
/// ```
pub trait SecretStore: Send + Sync {
    /// Get a secret.
    ///
    /// Returns `Ok(None)` if nothing is stored under `(service, key)`.
    fn get(&self, service: &str, key: &str) -> Result<Option<String>, SecretError>;

    /// Set a secret, overwriting any existing value.
    fn set(&self, service: &str, key: &str, value: &str) -> Result<(), SecretError>;

    /// Delete a secret. Deleting a missing secret succeeds.
    fn delete(&self, service: &str, key: &str) -> Result<(), SecretError>;

    fn exists(&self, service: &str, key: &str) -> Result<bool, SecretError> {
        Ok(self.get(service, key)?.is_some())
    }
}
