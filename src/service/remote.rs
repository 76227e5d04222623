//! service::remote
//!
//! Push and pull.
//!
//! # Phases
//!
//! ```text
//! gate -> snapshot (main lock) -> network (second handle) -> apply (main lock)
//! ```
//!
//! The network phase runs on its own handle opened at the same path, so
//! status and other reads stay responsive during a slow transfer. The apply
//! phase re-acquires the main lock and refuses to continue if the handle
//! generation moved on in the meantime.

use std::path::PathBuf;
use std::sync::MutexGuard;

use super::branch::merge_message;
use super::{OpenRepo, Operation, RepositoryService, ServiceError};
use crate::core::types::BranchName;
use crate::git::{Git, MergeOutcome};

/// What the network phase needs from the open repository.
struct RemoteTarget {
    root: PathBuf,
    generation: u64,
    remote: String,
    branch: BranchName,
}

impl RepositoryService {
    /// Push `branch` (default: current) to `remote` (default: configured).
    pub fn push(&self, remote: Option<&str>, branch: Option<&str>) -> Result<(), ServiceError> {
        let op = Operation::Push;
        let _gate = self.remote_gate();

        let result = self.remote_target(op, remote, branch).and_then(|target| {
            tracing::info!(remote = %target.remote, branch = %target.branch, "pushing");
            let net = Git::open(&target.root).map_err(ServiceError::git(op))?;
            net.push(&target.remote, &target.branch, self.resolver.as_ref())
                .map_err(ServiceError::git(op))?;

            self.apply(&target, |open| {
                self.refresh_locked(open).map_err(ServiceError::git(op))
            })?;
            Ok(target)
        });

        self.finish(op, result, |t| format!("pushed {} to {}", t.branch, t.remote))
            .map(|_| ())
    }

    /// Fetch `remote` and merge `refs/remotes/<remote>/<branch>` into HEAD.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::Fetch`] if the fetch fails; nothing is merged
    /// - [`ServiceError::PullMerge`] wrapping the merge failure
    pub fn pull(
        &self,
        remote: Option<&str>,
        branch: Option<&str>,
    ) -> Result<MergeOutcome, ServiceError> {
        let op = Operation::Pull;
        let _gate = self.remote_gate();

        let result = self.remote_target(op, remote, branch).and_then(|target| {
            tracing::info!(remote = %target.remote, branch = %target.branch, "pulling");
            let net = Git::open(&target.root).map_err(ServiceError::git(op))?;
            net.fetch(&target.remote, self.resolver.as_ref())
                .map_err(ServiceError::git(op))?;
            drop(net);

            let refname = format!("refs/remotes/{}/{}", target.remote, target.branch);
            let label = format!(
                "remote-tracking branch '{}/{}'",
                target.remote, target.branch
            );

            let outcome = self.apply(&target, |open| {
                let outcome = open
                    .git
                    .merge_ref(&refname, &label, &open.default_identity())
                    .map_err(|e| ServiceError::PullMerge {
                        source: Box::new(ServiceError::from_git(op, e)),
                    })?;
                self.refresh_locked(open).map_err(ServiceError::git(op))?;
                Ok(outcome)
            })?;
            Ok((label, outcome))
        });

        self.finish(op, result, |(label, outcome)| merge_message(label, outcome))
            .map(|(_, outcome)| outcome)
    }

    fn remote_gate(&self) -> MutexGuard<'_, ()> {
        self.remote_gate.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remote_target(
        &self,
        op: Operation,
        remote: Option<&str>,
        branch: Option<&str>,
    ) -> Result<RemoteTarget, ServiceError> {
        self.with_repo(|open| {
            let remote = remote
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| open.config.remote())
                .to_string();
            if !open.git.has_remote(&remote) {
                return Err(ServiceError::RemoteNotFound { remote });
            }

            let branch = match branch.filter(|b| !b.is_empty()) {
                Some(name) => name.to_string(),
                None => open
                    .git
                    .current_branch()
                    .map_err(ServiceError::git(op))?
                    .ok_or_else(|| ServiceError::Engine {
                        op,
                        message: "HEAD is detached; name a branch".to_string(),
                    })?,
            };

            Ok(RemoteTarget {
                root: open.paths.root().to_path_buf(),
                generation: open.generation,
                remote,
                branch: BranchName::new(branch)?,
            })
        })
    }

    /// Run `f` on the open repository if it is still the one `target` was
    /// taken from.
    fn apply<T>(
        &self,
        target: &RemoteTarget,
        f: impl FnOnce(&mut OpenRepo) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut guard = self.lock_repo();
        match guard.as_mut() {
            Some(open) if open.generation == target.generation => f(open),
            _ => {
                tracing::warn!(remote = %target.remote, "repository changed during remote operation");
                Err(ServiceError::Cancelled)
            }
        }
    }
}
