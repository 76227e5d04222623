//! core::types
//!
//! Strong types for identifiers that cross the service boundary.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (content hash)
//! - [`Fingerprint`] - Hash of observable repository state, used for drift detection
//!
//! Invalid values are rejected at construction time, so code holding one of
//! these types never has to re-validate it.
//!
//! # Examples
//!
//! ```
//! use gitward::core::types::{BranchName, Oid};
//!
//! let branch = BranchName::new("feature/my-branch").unwrap();
//! assert_eq!(branch.ref_name(), "refs/heads/feature/my-branch");
//!
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(oid.short(7), "abc123d");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// A validated Git branch name.
///
/// Follows `git check-ref-format --branch`: no empty names, no leading `.`
/// or `-`, no trailing `.lock` or `/`, no `..`, `@{`, `//`, whitespace,
/// control characters, or any of `~^:\?*[`, and not exactly `@`.
///
/// ```
/// use gitward::core::types::BranchName;
///
/// assert!(BranchName::new("user@feature").is_ok());
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    const FORBIDDEN_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
    const FORBIDDEN_SEQUENCES: [&'static str; 3] = ["..", "@{", "//"];

    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name).map_err(|reason| TypeError::InvalidBranchName(reason.into()))?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("branch name cannot be empty".into());
        }
        if name == "@" {
            return Err("branch name cannot be '@' (reserved)".into());
        }
        if let Some(c) = name.chars().next().filter(|c| *c == '.' || *c == '-') {
            return Err(format!("branch name cannot start with '{c}'"));
        }
        if name.ends_with('/') {
            return Err("branch name cannot end with '/'".into());
        }
        if let Some(seq) = Self::FORBIDDEN_SEQUENCES
            .iter()
            .find(|seq| name.contains(**seq))
        {
            return Err(format!("branch name cannot contain '{seq}'"));
        }
        if let Some(c) = name.chars().find(|c| Self::FORBIDDEN_CHARS.contains(c)) {
            return Err(format!("branch name cannot contain '{c}'"));
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return Err("branch name cannot contain control characters".into());
        }

        // Per-component rules; empty components were rejected by "//" above.
        for component in name.split('/').filter(|c| !c.is_empty()) {
            if component.starts_with('.') {
                return Err("path component cannot start with '.'".into());
            }
            if component.ends_with(".lock") {
                return Err("path component cannot end with '.lock'".into());
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The full local ref for this branch (`refs/heads/<name>`).
    pub fn ref_name(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256), normalized to lowercase hex.
///
/// This is the canonical identity of a commit: two [`crate::core::model::CommitRecord`]s
/// are the same commit iff their ids are equal.
///
/// ```
/// use gitward::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Length of the abbreviated id shown to users.
    pub const SHORT_LEN: usize = 7;

    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a 40 or 64 character hex id.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid("object id must be hexadecimal".into()));
        }
        Ok(Self(oid))
    }

    /// Get the first `len` characters (the whole id if `len` exceeds it).
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<git2::Oid> for Oid {
    fn from(oid: git2::Oid) -> Self {
        // git2 always renders lowercase hex of a valid length.
        Self(oid.to_string())
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash of the externally observable repository state.
///
/// The monitor compares fingerprints between ticks; a different fingerprint
/// means something changed on disk (a commit made by another tool, an edited
/// file, a branch switch) and cached state must be refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint from HEAD, the current branch and `(path, flags)` status pairs.
    ///
    /// Status pairs are sorted before hashing so enumeration order does not matter.
    pub fn compute(head: Option<&Oid>, branch: Option<&str>, status: &[(String, u16)]) -> Self {
        let mut sorted: Vec<_> = status.iter().collect();
        sorted.sort();

        let mut hasher = Sha256::new();
        hasher.update(head.map(Oid::as_str).unwrap_or("<unborn>").as_bytes());
        hasher.update(b"\0");
        hasher.update(branch.unwrap_or("<detached>").as_bytes());
        hasher.update(b"\n");
        for (path, bits) in sorted {
            hasher.update(path.as_bytes());
            hasher.update(b"\0");
            hasher.update(bits.to_le_bytes());
            hasher.update(b"\n");
        }

        Self(hex::encode(hasher.finalize()))
    }

    /// Get the fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
