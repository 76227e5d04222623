//! secrets::file_store
//!
//! File-based secret storage.
//!
//! # Security
//!
//! - Secrets are stored in `~/.gitward/secrets.toml`
//! - File permissions are set to 0600 on Unix (owner read/write only)
//! - All writes are atomic (write to temp file, then rename)
//! - Secrets are NEVER logged, printed, or included in error messages
//!
//! # Layout
//!
//! One table per service:
//!
//! ```toml
//! [github]
//! token = "..."
//! username = "..."
//! ```

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::traits::{SecretError, SecretStore};

type SecretsFile = BTreeMap<String, BTreeMap<String, String>>;

/// File-based secret storage. The default provider.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileSecretStore {
    /// Create a store at `~/.gitward/secrets.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, SecretError> {
        let path = crate::core::paths::user_secrets_path()
            .ok_or_else(|| SecretError::ReadError("cannot determine home directory".into()))?;
        Ok(Self::with_path(path))
    }

    /// Create a store at a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_secrets(&self) -> Result<SecretsFile, SecretError> {
        if !self.path.exists() {
            return Ok(SecretsFile::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read secrets file: {}", e)))?;

        // toml's error text can quote the offending line, so keep only the kind.
        toml::from_str(&content)
            .map_err(|_| SecretError::ReadError("cannot parse secrets file".into()))
    }

    /// Write secrets with atomic rename and 0600 permissions.
    fn write_secrets(&self, secrets: &SecretsFile) -> Result<(), SecretError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SecretError::WriteError(format!("cannot create directory: {}", e)))?;
        }

        let content = toml::to_string_pretty(secrets)
            .map_err(|_| SecretError::WriteError("cannot serialize secrets".into()))?;

        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| SecretError::WriteError(format!("cannot create temp file: {}", e)))?;

            // Restrict before any content lands on disk.
            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|e| SecretError::WriteError(format!("cannot set permissions: {}", e)))?;

            file.write_all(content.as_bytes())
                .map_err(|e| SecretError::WriteError(format!("cannot write secrets: {}", e)))?;
            file.sync_all()
                .map_err(|e| SecretError::WriteError(format!("cannot sync to disk: {}", e)))?;
        }

        fs::rename(&temp_path, &self.path)
            .map_err(|e| SecretError::WriteError(format!("cannot rename temp file: {}", e)))
    }

    /// Returns true if the file doesn't exist or has 0600 permissions.
    #[cfg(unix)]
    pub fn verify_permissions(&self) -> Result<bool, SecretError> {
        if !self.path.exists() {
            return Ok(true);
        }

        let metadata = fs::metadata(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read file metadata: {}", e)))?;

        Ok(metadata.permissions().mode() & 0o777 == 0o600)
    }

    #[cfg(not(unix))]
    pub fn verify_permissions(&self) -> Result<bool, SecretError> {
        Ok(true)
    }

    fn modify(&self, f: impl FnOnce(&mut SecretsFile)) -> Result<(), SecretError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut secrets = self.read_secrets()?;
        f(&mut secrets);
        self.write_secrets(&secrets)
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, service: &str, key: &str) -> Result<Option<String>, SecretError> {
        let secrets = self.read_secrets()?;
        Ok(secrets.get(service).and_then(|s| s.get(key)).cloned())
    }

    fn set(&self, service: &str, key: &str, value: &str) -> Result<(), SecretError> {
        self.modify(|secrets| {
            secrets
                .entry(service.to_string())
                .or_default()
                .insert(key.to_string(), value.to_string());
        })
    }

    fn delete(&self, service: &str, key: &str) -> Result<(), SecretError> {
        self.modify(|secrets| {
            if let Some(table) = secrets.get_mut(service) {
                table.remove(key);
                if table.is_empty() {
                    secrets.remove(service);
                }
            }
        })
    }
}
