//! service::status
//!
//! Working tree classification and index updates.

use super::{OpenRepo, Operation, RepositoryService, ServiceError, ServiceEvent};
use crate::core::model::StatusSnapshot;

impl RepositoryService {
    /// Classify every changed path in the working tree and index.
    pub fn status(&self) -> Result<StatusSnapshot, ServiceError> {
        self.with_repo(|open| self.status_locked(open, Operation::Status))
    }

    /// Stage `path`. A path deleted from the working tree stages the deletion.
    pub fn stage_file(&self, path: &str) -> Result<(), ServiceError> {
        let op = Operation::StageFile;
        let result = self.with_repo(|open| {
            open.git.stage_path(path).map_err(ServiceError::git(op))?;
            self.status_locked(open, op).map(|_| ())
        });
        self.finish(op, result, |_| format!("staged {path}"))
    }

    /// Reset the index entry for `path` to HEAD.
    pub fn unstage_file(&self, path: &str) -> Result<(), ServiceError> {
        let op = Operation::UnstageFile;
        let result = self.with_repo(|open| {
            open.git.unstage_path(path).map_err(ServiceError::git(op))?;
            self.status_locked(open, op).map(|_| ())
        });
        self.finish(op, result, |_| format!("unstaged {path}"))
    }

    /// Compute status and fold it into the derived state.
    pub(crate) fn status_locked(
        &self,
        open: &mut OpenRepo,
        op: Operation,
    ) -> Result<StatusSnapshot, ServiceError> {
        let entries = open.git.status_entries().map_err(ServiceError::git(op))?;
        let snapshot = StatusSnapshot::from_entries(entries);

        {
            let mut state = self.write_state();
            state.has_changes = !snapshot.clean;
            state.modified_files = snapshot.modified_paths();
        }
        self.note_clean(open, snapshot.clean);
        Ok(snapshot)
    }

    /// Cheap poll: recompute only `clean` and report a flip.
    ///
    /// Returns true if the clean/dirty state changed.
    pub(crate) fn check_for_changes(&self, open: &mut OpenRepo) -> Result<bool, ServiceError> {
        let entries = open
            .git
            .status_entries()
            .map_err(ServiceError::git(Operation::Status))?;
        let clean = StatusSnapshot::from_entries(entries).clean;
        let flipped = open.clean.is_some_and(|prev| prev != clean);

        if flipped {
            self.write_state().has_changes = !clean;
        }
        self.note_clean(open, clean);
        Ok(flipped)
    }

    fn note_clean(&self, open: &mut OpenRepo, clean: bool) {
        let previous = open.clean.replace(clean);
        if previous.is_some_and(|prev| prev != clean) {
            tracing::debug!(clean, "working tree state flipped");
            self.emit(ServiceEvent::StatusChanged {
                has_changes: !clean,
            });
        }
    }
}
