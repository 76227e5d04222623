//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$GITWARD_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/gitward/config.toml`
//! 3. `~/.gitward/config.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `.git/gitward/config.toml`. Every section except `[secrets]`
//! may appear in both scopes; repo values win.
//!
//! # Validation
//!
//! Config values are validated after parsing (e.g. intervals must be
//! positive, the default identity must not be blank).

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// [history]
/// recent_limit = 10
///
/// [monitor]
/// poll_interval_secs = 2
/// monitor_interval_secs = 30
///
/// [analytics]
/// ttl_secs = 300
///
/// [commit]
/// default_name = "Gitward User"
/// default_email = "gitward@local"
/// scan_secrets = true
/// signature_policy = "accept-all"
///
/// [secrets]
/// provider = "file"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default remote name
    pub remote: Option<String>,

    pub history: Option<HistoryConfig>,

    pub monitor: Option<MonitorConfig>,

    pub analytics: Option<AnalyticsConfig>,

    pub commit: Option<CommitConfig>,

    /// Secret storage settings
    pub secrets: Option<SecretsConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_remote(self.remote.as_deref())?;
        validate_sections(
            self.history.as_ref(),
            self.monitor.as_ref(),
            self.analytics.as_ref(),
            self.commit.as_ref(),
        )?;
        if let Some(secrets) = &self.secrets {
            secrets.validate()?;
        }
        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// remote = "upstream"
///
/// [commit]
/// signature_policy = "require-signed"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Remote name (default: "origin")
    pub remote: Option<String>,

    pub history: Option<HistoryConfig>,

    pub monitor: Option<MonitorConfig>,

    pub analytics: Option<AnalyticsConfig>,

    pub commit: Option<CommitConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_remote(self.remote.as_deref())?;
        validate_sections(
            self.history.as_ref(),
            self.monitor.as_ref(),
            self.analytics.as_ref(),
            self.commit.as_ref(),
        )
    }
}

fn validate_remote(remote: Option<&str>) -> Result<(), ConfigError> {
    if let Some(remote) = remote {
        if remote.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "remote cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_sections(
    history: Option<&HistoryConfig>,
    monitor: Option<&MonitorConfig>,
    analytics: Option<&AnalyticsConfig>,
    commit: Option<&CommitConfig>,
) -> Result<(), ConfigError> {
    if let Some(h) = history {
        h.validate()?;
    }
    if let Some(m) = monitor {
        m.validate()?;
    }
    if let Some(a) = analytics {
        a.validate()?;
    }
    if let Some(c) = commit {
        c.validate()?;
    }
    Ok(())
}

/// History settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Number of commits kept in the recent-commits cache
    pub recent_limit: Option<usize>,
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_limit == Some(0) {
            return Err(ConfigError::InvalidValue(
                "history.recent_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Scheduler intervals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Seconds between lightweight change polls
    pub poll_interval_secs: Option<u64>,

    /// Seconds between full monitor passes
    pub monitor_interval_secs: Option<u64>,
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_secs == Some(0) || self.monitor_interval_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "monitor intervals must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Analytics cache settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// Seconds a computed snapshot stays fresh
    pub ttl_secs: Option<u64>,
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "analytics.ttl_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Commit settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CommitConfig {
    /// Author name used when no author is given or it cannot be parsed
    pub default_name: Option<String>,

    /// Author email used alongside `default_name`
    pub default_email: Option<String>,

    /// Scan staged content for secrets before committing
    pub scan_secrets: Option<bool>,

    pub signature_policy: Option<SignaturePolicy>,
}

impl CommitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("default_name", &self.default_name),
            ("default_email", &self.default_email),
        ] {
            if let Some(v) = value {
                if v.trim().is_empty() || v.contains(['<', '>']) {
                    return Err(ConfigError::InvalidValue(format!(
                        "commit.{field} must be non-empty and cannot contain '<' or '>'"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// How commit signatures are judged when reading history.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SignaturePolicy {
    /// Every commit counts as verified.
    #[default]
    AcceptAll,
    /// Only commits carrying a signature count as verified.
    RequireSigned,
}

/// Secrets configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecretsConfig {
    /// Provider to use ("file", "keychain" or "memory")
    pub provider: Option<String>,
}

impl SecretsConfig {
    /// Valid secret providers.
    pub const VALID_PROVIDERS: &'static [&'static str] = &["file", "keychain", "memory"];

    /// Validate the secrets configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            if !Self::VALID_PROVIDERS.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid secrets provider '{}', must be one of: {}",
                    provider,
                    Self::VALID_PROVIDERS.join(", ")
                )));
            }
        }
        Ok(())
    }
}
