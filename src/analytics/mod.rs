//! analytics
//!
//! Background-computed repository metrics with a staleness policy.
//!
//! # Architecture
//!
//! - [`AnalyticsProvider`]: async extension point that turns an
//!   [`AnalyticsInput`] into a metric map
//! - [`SummaryProvider`]: the built-in provider (counts and recency only)
//! - [`AnalyticsCache`]: owns the worker runtime, the current snapshot, and
//!   the TTL decision
//!
//! Providers never see the repository handle. They work from an
//! [`AnalyticsInput`] assembled from already-cached repository state, so a
//! slow provider cannot hold up repository operations.

mod cache;
mod provider;

pub use cache::{AnalyticsCache, AnalyticsView, ComputeOutcome};
pub use provider::SummaryProvider;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::core::model::{BranchRef, CommitRecord};

/// Metric name to value.
pub type Metrics = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("analytics computation cancelled")]
    Cancelled,

    #[error("analytics provider '{provider}' failed: {message}")]
    Failed { provider: String, message: String },

    /// The worker went away without reporting.
    #[error("analytics worker stopped unexpectedly")]
    WorkerLost,
}

/// Everything a provider may look at.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsInput {
    pub repo_path: PathBuf,
    pub current_branch: Option<String>,
    /// Newest first.
    pub recent_commits: Vec<CommitRecord>,
    pub branches: Vec<BranchRef>,
    pub ahead: usize,
    pub behind: usize,
}

/// A published result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub metrics: Metrics,
    pub computed_at: DateTime<Utc>,
}

/// Shared cancellation flag between the cache and a running worker.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancelled, for use with `?` in providers.
    pub fn check(&self) -> Result<(), AnalyticsError> {
        if self.is_cancelled() {
            Err(AnalyticsError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Computes metrics off the caller's thread.
///
/// Implementations should call [`CancelFlag::check`] between expensive
/// steps. A cancelled result is discarded regardless of what is returned.
#[async_trait::async_trait]
pub trait AnalyticsProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn compute(
        &self,
        input: &AnalyticsInput,
        cancel: &CancelFlag,
    ) -> Result<Metrics, AnalyticsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_flag_shared_between_clones() {
        let flag = CancelFlag::new();
        let worker = flag.clone();
        assert!(worker.check().is_ok());

        flag.cancel();
        assert!(worker.is_cancelled());
        assert!(matches!(worker.check(), Err(AnalyticsError::Cancelled)));
    }
}
