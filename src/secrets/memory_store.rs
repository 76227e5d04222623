//! secrets::memory_store
//!
//! Process-local secret storage. Nothing touches disk; contents vanish with
//! the process. Used by tests and by the `memory` provider.

use std::collections::HashMap;
use std::sync::RwLock;

use super::traits::{SecretError, SecretStore};

#[derive(Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<(String, String), String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// Values stay out of Debug output.
impl std::fmt::Debug for MemorySecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.secrets.read().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("MemorySecretStore")
            .field("entries", &count)
            .finish()
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, service: &str, key: &str) -> Result<Option<String>, SecretError> {
        let secrets = self
            .secrets
            .read()
            .map_err(|_| SecretError::ReadError("memory store poisoned".into()))?;
        Ok(secrets
            .get(&(service.to_string(), key.to_string()))
            .cloned())
    }

    fn set(&self, service: &str, key: &str, value: &str) -> Result<(), SecretError> {
        self.secrets
            .write()
            .map_err(|_| SecretError::WriteError("memory store poisoned".into()))?
            .insert((service.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn delete(&self, service: &str, key: &str) -> Result<(), SecretError> {
        self.secrets
            .write()
            .map_err(|_| SecretError::DeleteError("memory store poisoned".into()))?
            .remove(&(service.to_string(), key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_and_delete() {
        let store = MemorySecretStore::new();
        store.set("github", "token", "abc").unwrap();
        assert_eq!(store.get("github", "token").unwrap(), Some("abc".into()));
        assert!(store.exists("github", "token").unwrap());

        store.delete("github", "token").unwrap();
        assert!(!store.exists("github", "token").unwrap());
    }

    #[test]
    fn debug_hides_values() {
        let store = MemorySecretStore::new();
        store.set("github", "token", "ghp_supersecret").unwrap();
        let dbg = format!("{store:?}");
        assert!(!dbg.contains("ghp_supersecret"));
        assert!(dbg.contains("entries: 1"));
    }
}
