//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. All repository reads and
//! writes flow through [`Git`]. No other module should import `git2`.
//!
//! # Responsibilities
//!
//! - Repository open, init and clone
//! - Status enumeration and index updates
//! - Commit creation and history traversal
//! - Branch create/checkout/delete and merging
//! - Fetch, push and ahead/behind against upstream
//! - Transport credentials ([`auth`])
//!
//! # Invariants
//!
//! - Checkouts are always safe: local modifications are never overwritten
//! - A conflicting merge writes nothing
//! - Credentials are resolved lazily and never appear in URLs or errors

pub mod auth;
mod interface;

pub use auth::{redact_url, CredentialResolver, NoCredentials, StoreResolver};
pub use interface::{Git, GitError, MergeOutcome, RepoInfo, StagedFile};
