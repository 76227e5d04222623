//! Gitward - a repository state service with secret guarding
//!
//! Gitward keeps an observable model of one open Git repository: branch,
//! working tree status, recent history, and ahead/behind counts. Every
//! mutating operation (stage, commit, branch, merge, push, pull) goes
//! through the service, which refreshes derived state and emits events.
//! Commits are scanned for credentials before they are written, and a
//! pre-commit hook enforces the same rules for plain `git commit`.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to the service)
//! - [`service`] - [`service::RepositoryService`], the single entry point for repository operations
//! - [`core`] - Domain types, configuration, signatures, clocks, paths
//! - [`git`] - Single interface for all Git operations
//! - [`analytics`] - Background analytics with TTL caching
//! - [`scan`] - Secret detection and the pre-commit hook
//! - [`secrets`] - Credential storage abstraction
//!
//! # Invariants
//!
//! 1. Derived state always describes the currently open repository
//! 2. Results computed for a previous repository are never published
//! 3. Secret values never appear in logs, events, status, or error messages

pub mod analytics;
pub mod cli;
pub mod core;
pub mod git;
pub mod scan;
pub mod secrets;
pub mod service;
