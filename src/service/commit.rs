//! service::commit
//!
//! Commit creation, history, and staged-content scanning.
//!
//! # Commit phases
//!
//! 1. Resolve the author (`"Name <email>"`, else the configured identity)
//! 2. Scan staged text blobs for secrets when `commit.scan_secrets` is on
//! 3. Write the index as a tree and commit on top of HEAD
//! 4. Refresh recent commits and status
//!
//! A failure in phases 1-3 leaves HEAD where it was. Once the commit is
//! written the operation succeeds; a failed refresh is only logged.

use serde::Serialize;

use super::{OpenRepo, Operation, RepositoryService, ServiceError, ServiceEvent};
use crate::core::model::CommitRecord;
use crate::core::signature::Identity;
use crate::core::types::Oid;
use crate::scan::Finding;

/// Scanner findings for one staged file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedFindings {
    pub path: String,
    pub findings: Vec<Finding>,
}

impl RepositoryService {
    /// Commit the index.
    ///
    /// `author` is `"Name <email>"`; empty or malformed specs fall back to
    /// the configured identity. The committer is always the author.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::SecretDetected`] if scanning is enabled and a staged
    ///   file trips the scanner
    /// - [`ServiceError::Signature`], [`ServiceError::Write`],
    ///   [`ServiceError::Commit`] for the respective phase
    pub fn commit(&self, message: &str, author: Option<&str>) -> Result<Oid, ServiceError> {
        let op = Operation::Commit;
        let result = self.with_repo(|open| {
            let author = Identity::parse_or(author, open.default_identity());

            if open.config.scan_secrets() {
                let flagged: Vec<String> = self
                    .staged_findings(open)?
                    .into_iter()
                    .map(|f| f.path)
                    .collect();
                if !flagged.is_empty() {
                    return Err(ServiceError::SecretDetected { paths: flagged });
                }
            }

            let oid = open
                .git
                .commit_index(&author, &author, message)
                .map_err(ServiceError::git(op))?;

            let refreshed = self
                .refresh_commits(open, op)
                .and_then(|()| self.status_locked(open, op));
            if let Err(e) = refreshed {
                tracing::warn!(error = %e, "refresh after commit failed");
            }
            Ok(oid)
        });

        if result.is_ok() {
            let has_changes = self.has_changes();
            self.emit(ServiceEvent::StatusChanged { has_changes });
            self.emit(ServiceEvent::CommitsChanged);
        }
        self.finish(op, result, |oid| {
            format!("committed {}", oid.short(Oid::SHORT_LEN))
        })
    }

    /// Up to `limit` commits reachable from HEAD, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<CommitRecord>, ServiceError> {
        self.with_repo(|open| {
            open.git
                .history(limit, open.verifier.as_ref())
                .map_err(ServiceError::git(Operation::History))
        })
    }

    /// Scan every staged text blob. Only files with findings are returned.
    pub fn scan_staged(&self) -> Result<Vec<StagedFindings>, ServiceError> {
        self.with_repo(|open| self.staged_findings(open))
    }

    fn staged_findings(&self, open: &OpenRepo) -> Result<Vec<StagedFindings>, ServiceError> {
        let files = open
            .git
            .staged_files()
            .map_err(ServiceError::git(Operation::ScanStaged))?;

        Ok(files
            .into_iter()
            .filter_map(|file| {
                let content = String::from_utf8_lossy(&file.content);
                let findings = self.scanner.findings(&content);
                (!findings.is_empty()).then(|| StagedFindings {
                    path: file.path,
                    findings,
                })
            })
            .collect())
    }

    /// Reload the recent-commit list.
    pub(crate) fn refresh_commits(
        &self,
        open: &OpenRepo,
        op: Operation,
    ) -> Result<(), ServiceError> {
        let commits = open
            .git
            .history(open.config.recent_limit(), open.verifier.as_ref())
            .map_err(ServiceError::git(op))?;
        self.write_state().recent_commits = commits;
        Ok(())
    }
}
