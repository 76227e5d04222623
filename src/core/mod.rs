//! core
//!
//! Core domain types and configuration for gitward.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, Fingerprint
//! - [`model`] - Status, commit and branch records
//! - [`signature`] - Author parsing and signature policy
//! - [`clock`] - Time source for TTL decisions
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Path routing for gitward files
//!
//! Nothing in `core` opens a repository; git access lives in [`crate::git`].

pub mod clock;
pub mod config;
pub mod model;
pub mod paths;
pub mod signature;
pub mod types;
