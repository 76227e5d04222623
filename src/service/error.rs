//! service::error
//!
//! Service-level errors and the operation names they are reported under.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::types::TypeError;
use crate::git::GitError;
use crate::scan::ScanError;
use crate::secrets::SecretError;

/// Names of service operations, as they appear in reports and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    OpenRepository,
    InitRepository,
    CloneRepository,
    CloseRepository,
    Status,
    StageFile,
    UnstageFile,
    Commit,
    History,
    Push,
    Pull,
    Branches,
    CreateBranch,
    CheckoutBranch,
    MergeBranch,
    DeleteBranch,
    Refresh,
    ConfigureRemoteAuth,
    ScanStaged,
    InstallHook,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::OpenRepository => "open_repository",
            Operation::InitRepository => "init_repository",
            Operation::CloneRepository => "clone_repository",
            Operation::CloseRepository => "close_repository",
            Operation::Status => "status",
            Operation::StageFile => "stage_file",
            Operation::UnstageFile => "unstage_file",
            Operation::Commit => "commit",
            Operation::History => "history",
            Operation::Push => "push",
            Operation::Pull => "pull",
            Operation::Branches => "branches",
            Operation::CreateBranch => "create_branch",
            Operation::CheckoutBranch => "checkout_branch",
            Operation::MergeBranch => "merge_branch",
            Operation::DeleteBranch => "delete_branch",
            Operation::Refresh => "refresh",
            Operation::ConfigureRemoteAuth => "configure_remote_auth",
            Operation::ScanStaged => "scan_staged",
            Operation::InstallHook => "install_hook",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from [`RepositoryService`](super::RepositoryService) operations.
///
/// Messages never carry credential values.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no repository open")]
    NotOpen,

    /// Backend failure without a more specific variant.
    #[error("{op} failed: {message}")]
    Engine { op: Operation, message: String },

    #[error("failed to create signature: {message}")]
    Signature { message: String },

    #[error("failed to write tree: {message}")]
    Write { message: String },

    #[error("failed to create commit: {message}")]
    Commit { message: String },

    #[error("branch already exists: {name}")]
    BranchExists { name: String },

    #[error("branch not found: {name}")]
    BranchNotFound { name: String },

    #[error("branch is checked out: {name}")]
    BranchInUse { name: String },

    #[error("checkout would overwrite local changes: {message}")]
    CheckoutConflict { message: String },

    #[error("merge conflict in {}", paths.join(", "))]
    MergeConflict { paths: Vec<String> },

    #[error("remote not found: {remote}")]
    RemoteNotFound { remote: String },

    #[error("fetch from {remote} failed: {message}")]
    Fetch { remote: String, message: String },

    #[error("push to {remote} failed: {message}")]
    Push { remote: String, message: String },

    #[error("merge after fetch failed: {source}")]
    PullMerge {
        #[source]
        source: Box<ServiceError>,
    },

    #[error("possible secrets in staged files: {}", paths.join(", "))]
    SecretDetected { paths: Vec<String> },

    #[error("operation cancelled: repository was closed or replaced")]
    Cancelled,

    #[error("credential store error: {0}")]
    Credential(#[from] SecretError),

    #[error("failed to install hook at {path}: {source}")]
    Hook {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid name: {0}")]
    InvalidName(#[from] TypeError),

    #[error("scanner error: {0}")]
    Scan(ScanError),

    #[error("failed to start analytics runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ServiceError {
    /// Map a backend error onto the service taxonomy.
    ///
    /// `op` labels failures that have no dedicated variant.
    pub fn from_git(op: Operation, err: GitError) -> Self {
        match err {
            GitError::Signature { message } => ServiceError::Signature { message },
            GitError::WriteTree { message } => ServiceError::Write { message },
            GitError::Commit { message } => ServiceError::Commit { message },
            GitError::BranchExists { name } => ServiceError::BranchExists { name },
            GitError::BranchNotFound { name } => ServiceError::BranchNotFound { name },
            GitError::BranchInUse { name } => ServiceError::BranchInUse { name },
            GitError::CheckoutConflict { message } => ServiceError::CheckoutConflict { message },
            GitError::MergeConflict { paths } => ServiceError::MergeConflict { paths },
            GitError::RemoteNotFound { remote } => ServiceError::RemoteNotFound { remote },
            GitError::Fetch { remote, message } => ServiceError::Fetch { remote, message },
            GitError::Push { remote, message } => ServiceError::Push { remote, message },
            GitError::InvalidRefName { message } => {
                ServiceError::InvalidName(TypeError::InvalidBranchName(message))
            }
            other => ServiceError::Engine {
                op,
                message: other.to_string(),
            },
        }
    }

    /// Adapter for `map_err`.
    pub(crate) fn git(op: Operation) -> impl Fn(GitError) -> Self {
        move |err| Self::from_git(op, err)
    }
}

impl From<ScanError> for ServiceError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Hook { path, source } => ServiceError::Hook { path, source },
            other => ServiceError::Scan(other),
        }
    }
}
