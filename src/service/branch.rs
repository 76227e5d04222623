//! service::branch
//!
//! Branch listing, creation, checkout, merge and deletion.
//!
//! Every mutation refreshes the derived state so branch lists, the current
//! branch and recent commits stay in step with the repository.

use super::{OpenRepo, Operation, RepositoryService, ServiceError};
use crate::core::model::BranchRef;
use crate::core::types::{BranchName, Oid};
use crate::git::MergeOutcome;

impl RepositoryService {
    /// Local and remote-tracking branches.
    pub fn branches(&self) -> Result<Vec<BranchRef>, ServiceError> {
        self.with_repo(|open| open.git.branches().map_err(ServiceError::git(Operation::Branches)))
    }

    /// Create `name` at `start_point` (any commit-ish) or HEAD.
    pub fn create_branch(&self, name: &str, start_point: Option<&str>) -> Result<Oid, ServiceError> {
        let op = Operation::CreateBranch;
        let result = self.with_repo(|open| {
            let branch = BranchName::new(name)?;
            let start = start_point.filter(|s| !s.is_empty());
            let oid = open
                .git
                .create_branch(&branch, start)
                .map_err(ServiceError::git(op))?;
            self.refresh_after(open, op)?;
            Ok(oid)
        });
        self.finish(op, result, |oid| {
            format!("created {name} at {}", oid.short(Oid::SHORT_LEN))
        })
    }

    /// Switch to `name`. Fails without touching anything if local changes
    /// would be overwritten.
    pub fn checkout_branch(&self, name: &str) -> Result<(), ServiceError> {
        let op = Operation::CheckoutBranch;
        let result = self.with_repo(|open| {
            let branch = BranchName::new(name)?;
            open.git
                .checkout_branch(&branch)
                .map_err(ServiceError::git(op))?;
            self.refresh_after(open, op)
        });
        self.finish(op, result, |_| format!("switched to {name}"))
    }

    /// Merge local branch `name` into HEAD.
    ///
    /// A conflicting merge creates no commit and leaves the working tree
    /// untouched.
    pub fn merge_branch(&self, name: &str) -> Result<MergeOutcome, ServiceError> {
        let op = Operation::MergeBranch;
        let result = self.with_repo(|open| {
            let branch = BranchName::new(name)?;
            let outcome = open
                .git
                .merge_ref(
                    &branch.ref_name(),
                    &format!("branch '{branch}'"),
                    &open.default_identity(),
                )
                .map_err(|e| match e {
                    crate::git::GitError::RefNotFound { .. } => ServiceError::BranchNotFound {
                        name: name.to_string(),
                    },
                    other => ServiceError::from_git(op, other),
                })?;
            self.refresh_after(open, op)?;
            Ok(outcome)
        });
        self.finish(op, result, |outcome| merge_message(name, outcome))
    }

    /// Delete local branch `name`. The checked-out branch cannot be deleted.
    pub fn delete_branch(&self, name: &str) -> Result<(), ServiceError> {
        let op = Operation::DeleteBranch;
        let result = self.with_repo(|open| {
            let branch = BranchName::new(name)?;
            open.git
                .delete_branch(&branch)
                .map_err(ServiceError::git(op))?;
            self.refresh_after(open, op)
        });
        self.finish(op, result, |_| format!("deleted {name}"))
    }

    fn refresh_after(&self, open: &mut OpenRepo, op: Operation) -> Result<(), ServiceError> {
        self.refresh_locked(open).map_err(ServiceError::git(op))
    }
}

pub(crate) fn merge_message(source: &str, outcome: &MergeOutcome) -> String {
    match outcome {
        MergeOutcome::UpToDate => format!("already up to date with {source}"),
        MergeOutcome::FastForward(oid) => {
            format!("fast-forwarded to {} ({source})", oid.short(Oid::SHORT_LEN))
        }
        MergeOutcome::Merged(oid) => {
            format!("merged {source} as {}", oid.short(Oid::SHORT_LEN))
        }
    }
}
