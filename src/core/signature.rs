//! core::signature
//!
//! Commit identity parsing and signature policy.
//!
//! # Author specs
//!
//! Authors are given as `"Name <email>"`. An empty or malformed spec is not
//! an error: the commit falls back to the configured default identity.
//!
//! ```
//! use gitward::core::signature::Identity;
//!
//! let id = Identity::parse("Ada Lovelace <ada@example.com>").unwrap();
//! assert_eq!(id.name, "Ada Lovelace");
//! assert_eq!(id.email, "ada@example.com");
//!
//! assert!(Identity::parse("just a name").is_none());
//! ```
//!
//! # Verification
//!
//! [`SignatureVerifier`] decides the `verified` flag on each
//! [`CommitRecord`](crate::core::model::CommitRecord). It sees the raw
//! signature block (if the commit has one) and never touches the repository.

use crate::core::config::SignaturePolicy;
use crate::core::types::Oid;

/// A name/email pair used to build commit signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Parse `"Name <email>"`. Returns `None` if the spec is empty or malformed.
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        let open = spec.find('<')?;
        let rest = spec[open + 1..].strip_suffix('>')?;

        let name = spec[..open].trim();
        let email = rest.trim();
        if name.is_empty() || email.is_empty() || email.contains(['<', '>']) {
            return None;
        }

        Some(Self::new(name, email))
    }

    /// Parse `spec`, falling back to `default` when it is absent or malformed.
    pub fn parse_or(spec: Option<&str>, default: Identity) -> Self {
        spec.and_then(Self::parse).unwrap_or(default)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Decides whether a commit counts as verified.
pub trait SignatureVerifier: Send + Sync {
    /// `signature` is the commit's detached signature block, if it carries one.
    fn verify(&self, commit: &Oid, signature: Option<&str>) -> bool;
}

/// Every commit is verified.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl SignatureVerifier for AcceptAll {
    fn verify(&self, _commit: &Oid, _signature: Option<&str>) -> bool {
        true
    }
}

/// Only signed commits are verified.
///
/// This checks presence of a well-formed signature block. It does not
/// validate the signature against a keyring.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequireSigned;

impl RequireSigned {
    const ARMOR_HEADERS: [&'static str; 3] = [
        "-----BEGIN PGP SIGNATURE-----",
        "-----BEGIN SSH SIGNATURE-----",
        "-----BEGIN SIGNED MESSAGE-----",
    ];
}

impl SignatureVerifier for RequireSigned {
    fn verify(&self, _commit: &Oid, signature: Option<&str>) -> bool {
        signature.is_some_and(|sig| {
            let sig = sig.trim_start();
            Self::ARMOR_HEADERS.iter().any(|h| sig.starts_with(h))
        })
    }
}

/// Build the verifier for a configured policy.
pub fn verifier_for(policy: SignaturePolicy) -> Box<dyn SignatureVerifier> {
    match policy {
        SignaturePolicy::AcceptAll => Box::new(AcceptAll),
        SignaturePolicy::RequireSigned => Box::new(RequireSigned),
    }
}
