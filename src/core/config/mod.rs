//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Gitward has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$GITWARD_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitward/config.toml`
//! 3. `~/.gitward/config.toml` (canonical write location)
//!
//! # Repo Config Location
//!
//! `<git_dir>/gitward/config.toml`, see [`RepoPaths::repo_config_path`].
//!
//! # Example
//!
//! ```no_run
//! use gitward::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//!
//! println!("Remote: {}", config.remote());
//! println!("Analytics TTL: {:?}", config.analytics_ttl());
//! ```

pub mod schema;

pub use schema::{
    AnalyticsConfig, CommitConfig, GlobalConfig, HistoryConfig, MonitorConfig, RepoConfig,
    SecretsConfig, SignaturePolicy,
};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::paths::RepoPaths;

/// Default number of commits kept in the recent-commits cache.
pub const DEFAULT_RECENT_LIMIT: usize = 10;
/// Default seconds between change polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;
/// Default seconds between full monitor passes.
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 30;
/// Default analytics freshness window.
pub const DEFAULT_ANALYTICS_TTL_SECS: u64 = 300;
/// Identity used when a commit has no usable author.
pub const DEFAULT_AUTHOR_NAME: &str = "Gitward User";
pub const DEFAULT_AUTHOR_EMAIL: &str = "gitward@local";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Files that were read, global first.
    pub sources: Vec<PathBuf>,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence automatically: repo config overrides
/// global config, which overrides built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub global: GlobalConfig,
    pub repo: Option<RepoConfig>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `repo` is provided, also loads its repo-scoped config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error.
    pub fn load(repo: Option<&RepoPaths>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_from(Self::find_global(), repo)
    }

    /// Load with an explicit global config path (or none).
    pub fn load_from(
        global_path: Option<PathBuf>,
        repo: Option<&RepoPaths>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut sources = Vec::new();

        let global = match global_path {
            Some(path) => {
                let config: GlobalConfig = read_toml(&path)?;
                sources.push(path);
                config
            }
            None => GlobalConfig::default(),
        };

        let repo_config = match repo.map(RepoPaths::repo_config_path) {
            Some(path) if path.exists() => {
                let config: RepoConfig = read_toml(&path)?;
                sources.push(path);
                Some(config)
            }
            _ => None,
        };

        global.validate()?;
        if let Some(ref r) = repo_config {
            r.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo: repo_config,
            },
            sources,
        })
    }

    /// Find the global config file in standard locations.
    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GITWARD_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("gitward/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".gitward/config.toml"))
            .filter(|path| path.exists())
    }

    /// Write repo config atomically.
    ///
    /// Creates parent directories if needed. Writes to a temp file, then renames.
    pub fn write_repo(repo: &RepoPaths, config: &RepoConfig) -> Result<PathBuf, ConfigError> {
        let path = repo.repo_config_path();
        write_toml_atomic(&path, config)?;
        Ok(path)
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Pick the repo value if set, else the global one.
    fn pick<S, T>(
        &self,
        repo: impl Fn(&RepoConfig) -> Option<&S>,
        global: impl Fn(&GlobalConfig) -> Option<&S>,
        field: impl Fn(&S) -> Option<T>,
    ) -> Option<T> {
        self.repo
            .as_ref()
            .and_then(&repo)
            .and_then(&field)
            .or_else(|| global(&self.global).and_then(&field))
    }

    /// Get the default remote name.
    ///
    /// Defaults to "origin".
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .or(self.global.remote.as_deref())
            .unwrap_or("origin")
    }

    /// Number of commits kept in the recent-commits cache.
    pub fn recent_limit(&self) -> usize {
        self.pick(|r| r.history.as_ref(), |g| g.history.as_ref(), |h| h.recent_limit)
            .unwrap_or(DEFAULT_RECENT_LIMIT)
    }

    pub fn poll_interval(&self) -> Duration {
        let secs = self
            .pick(|r| r.monitor.as_ref(), |g| g.monitor.as_ref(), |m| m.poll_interval_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    pub fn monitor_interval(&self) -> Duration {
        let secs = self
            .pick(|r| r.monitor.as_ref(), |g| g.monitor.as_ref(), |m| m.monitor_interval_secs)
            .unwrap_or(DEFAULT_MONITOR_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    pub fn analytics_ttl(&self) -> Duration {
        let secs = self
            .pick(|r| r.analytics.as_ref(), |g| g.analytics.as_ref(), |a| a.ttl_secs)
            .unwrap_or(DEFAULT_ANALYTICS_TTL_SECS);
        Duration::from_secs(secs)
    }

    /// Default commit identity as `(name, email)`.
    pub fn default_identity(&self) -> (String, String) {
        let name = self
            .pick(|r| r.commit.as_ref(), |g| g.commit.as_ref(), |c| c.default_name.clone())
            .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string());
        let email = self
            .pick(|r| r.commit.as_ref(), |g| g.commit.as_ref(), |c| c.default_email.clone())
            .unwrap_or_else(|| DEFAULT_AUTHOR_EMAIL.to_string());
        (name, email)
    }

    /// Whether staged content is scanned before each commit.
    ///
    /// Defaults to `true`.
    pub fn scan_secrets(&self) -> bool {
        self.pick(|r| r.commit.as_ref(), |g| g.commit.as_ref(), |c| c.scan_secrets)
            .unwrap_or(true)
    }

    pub fn signature_policy(&self) -> SignaturePolicy {
        self.pick(|r| r.commit.as_ref(), |g| g.commit.as_ref(), |c| c.signature_policy)
            .unwrap_or_default()
    }

    /// Get the secrets provider.
    ///
    /// Defaults to "file". Global scope only.
    pub fn secrets_provider(&self) -> &str {
        self.global
            .secrets
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or(crate::secrets::DEFAULT_PROVIDER)
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write_toml_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| ConfigError::WriteError { path, source }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err(path))?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    let temp_path = path.with_extension("toml.tmp");
    let mut file = fs::File::create(&temp_path).map_err(write_err(&temp_path))?;
    file.write_all(contents.as_bytes())
        .map_err(write_err(&temp_path))?;
    file.sync_all().map_err(write_err(&temp_path))?;

    fs::rename(&temp_path, path).map_err(write_err(path))?;
    Ok(())
}
