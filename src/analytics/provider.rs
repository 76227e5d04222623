//! analytics::provider
//!
//! The built-in summary provider.

use std::collections::HashSet;

use serde_json::json;

use super::{AnalyticsError, AnalyticsInput, AnalyticsProvider, CancelFlag, Metrics};
use crate::core::model::BranchKind;

/// Counts and recency over the cached repository state.
///
/// Metrics: `total_commits` (size of the recent list), `active_branch`,
/// `last_commit_time`, `branch_count`, `local_branch_count`,
/// `distinct_authors`, `merge_commits`, `ahead`, `behind`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryProvider;

#[async_trait::async_trait]
impl AnalyticsProvider for SummaryProvider {
    fn name(&self) -> &str {
        "summary"
    }

    async fn compute(
        &self,
        input: &AnalyticsInput,
        cancel: &CancelFlag,
    ) -> Result<Metrics, AnalyticsError> {
        cancel.check()?;

        let authors: HashSet<&str> = input
            .recent_commits
            .iter()
            .map(|c| c.author.email.as_str())
            .collect();
        let merges = input.recent_commits.iter().filter(|c| c.is_merge()).count();
        let local = input
            .branches
            .iter()
            .filter(|b| b.kind == BranchKind::Local)
            .count();
        let last_commit_time = input
            .recent_commits
            .first()
            .map(|c| c.committer.time.to_rfc3339());

        let mut metrics = Metrics::new();
        metrics.insert("total_commits".into(), json!(input.recent_commits.len()));
        metrics.insert("active_branch".into(), json!(input.current_branch));
        metrics.insert("last_commit_time".into(), json!(last_commit_time));
        metrics.insert("branch_count".into(), json!(input.branches.len()));
        metrics.insert("local_branch_count".into(), json!(local));
        metrics.insert("distinct_authors".into(), json!(authors.len()));
        metrics.insert("merge_commits".into(), json!(merges));
        metrics.insert("ahead".into(), json!(input.ahead));
        metrics.insert("behind".into(), json!(input.behind));

        cancel.check()?;
        Ok(metrics)
    }
}
