//! scan
//!
//! Commit-time secret scanning.
//!
//! - [`SecretScanner`] checks content against [`SecretRule`] patterns
//! - [`hook::install`] writes a pre-commit hook that runs the same checks

pub mod hook;
mod scanner;

pub use scanner::{Finding, SecretRule, SecretScanner};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid pattern for rule {rule}: {source}")]
    Pattern {
        rule: SecretRule,
        #[source]
        source: regex::Error,
    },

    #[error("failed to install hook at {path}: {source}")]
    Hook {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
