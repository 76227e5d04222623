//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! gitward. Every repository read and write flows through [`Git`], which
//! returns crate types ([`Oid`], [`StatusEntry`], [`CommitRecord`],
//! [`BranchRef`]) and normalizes libgit2 failures into [`GitError`].
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants so the service layer can
//! map them onto its own taxonomy without string matching:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::BranchNotFound`] / [`GitError::BranchExists`] / [`GitError::BranchInUse`]
//! - [`GitError::CheckoutConflict`]: Checkout would overwrite local changes
//! - [`GitError::MergeConflict`]: In-memory merge produced conflicts
//! - [`GitError::Signature`] / [`GitError::WriteTree`] / [`GitError::Commit`]: commit phases
//! - [`GitError::Fetch`] / [`GitError::Push`]: transport phases
//!
//! # Example
//!
//! ```ignore
//! use gitward::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! for entry in git.status_entries()? {
//!     println!("{} {:?}", entry.path, entry.flags);
//! }
//! ```

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::auth::{self, redact_url, CredentialResolver};
use crate::core::model::{
    BranchKind, BranchRef, CommitRecord, Person, StatusEntry, StatusFlags,
};
use crate::core::signature::{Identity, SignatureVerifier};
use crate::core::types::{BranchName, Oid, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo { path: PathBuf },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    #[error("failed to initialize repository at {path}: {message}")]
    Init { path: PathBuf, message: String },

    /// Clone failed. `url` has any userinfo redacted.
    #[error("failed to clone {url}: {message}")]
    Clone { url: String, message: String },

    /// Requested ref or revision does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound { refname: String },

    #[error("path not found: {path}")]
    PathNotFound { path: String },

    /// HEAD has no commit yet.
    #[error("HEAD is unborn (no commits yet)")]
    UnbornHead,

    #[error("branch not found: {name}")]
    BranchNotFound { name: String },

    #[error("branch already exists: {name}")]
    BranchExists { name: String },

    #[error("branch is checked out: {name}")]
    BranchInUse { name: String },

    /// A safe checkout refused to overwrite local changes.
    #[error("checkout would overwrite local changes: {message}")]
    CheckoutConflict { message: String },

    /// Merging produced conflicts; nothing was written.
    #[error("merge conflict in {}", paths.join(", "))]
    MergeConflict { paths: Vec<String> },

    #[error("failed to build signature: {message}")]
    Signature { message: String },

    #[error("failed to write tree: {message}")]
    WriteTree { message: String },

    #[error("failed to create commit: {message}")]
    Commit { message: String },

    #[error("index error: {message}")]
    Index { message: String },

    #[error("remote not found: {remote}")]
    RemoteNotFound { remote: String },

    #[error("fetch from '{remote}' failed: {message}")]
    Fetch { remote: String, message: String },

    #[error("push to '{remote}' failed: {message}")]
    Push { remote: String, message: String },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid { oid: String },

    #[error("invalid ref name: {message}")]
    InvalidRefName { message: String },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal { message: String },
}

impl GitError {
    /// Create a GitError from a git2::Error with context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidRefName {
                message: format!("{}: {}", context, err.message()),
            },
            git2::ErrorCode::Conflict => GitError::CheckoutConflict {
                message: err.message().to_string(),
            },
            git2::ErrorCode::UnbornBranch => GitError::UnbornHead,
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    fn index(err: git2::Error) -> Self {
        GitError::Index {
            message: err.message().to_string(),
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// Information about a Git repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Path to .git directory
    pub git_dir: PathBuf,
    /// Path to working directory (`None` for bare repositories)
    pub work_dir: Option<PathBuf>,
    pub is_bare: bool,
}

/// A staged text blob, as it would be committed.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: String,
    pub content: Vec<u8>,
}

/// What a merge did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Nothing to merge.
    UpToDate,
    /// HEAD moved forward to the given commit.
    FastForward(Oid),
    /// A merge commit was created.
    Merged(Oid),
}

/// The Git interface.
///
/// This is the **single point of interaction** with Git. No other module
/// imports `git2` except [`super::auth`], which builds transport callbacks
/// for the remote methods here.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Create a new repository, creating `path` if it does not exist.
    pub fn init(path: &Path) -> Result<Self, GitError> {
        let init_err = |message: String| GitError::Init {
            path: path.to_path_buf(),
            message,
        };

        std::fs::create_dir_all(path).map_err(|e| init_err(e.to_string()))?;
        let repo = git2::Repository::init(path).map_err(|e| init_err(e.message().to_string()))?;

        Ok(Self { repo })
    }

    /// Clone `url` into `path`, authenticating through `resolver`.
    ///
    /// The URL is passed to the transport unchanged; errors and logs carry
    /// a redacted copy.
    pub fn clone(
        url: &str,
        path: &Path,
        resolver: &dyn CredentialResolver,
    ) -> Result<Self, GitError> {
        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(auth::remote_callbacks(resolver));

        let redacted = redact_url(url);
        let repo = git2::build::RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, path)
            .map_err(|e| GitError::Clone {
                message: e.message().replace(url, &redacted),
                url: redacted.clone(),
            })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Get repository information.
    pub fn info(&self) -> RepoInfo {
        RepoInfo {
            git_dir: self.repo.path().to_path_buf(),
            work_dir: self.repo.workdir().map(Path::to_path_buf),
            is_bare: self.repo.is_bare(),
        }
    }

    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    /// Make `path` relative to the working tree root.
    fn relative_path(&self, path: &str) -> Result<PathBuf, GitError> {
        let candidate = Path::new(path);
        if candidate.is_relative() {
            return Ok(candidate.to_path_buf());
        }

        candidate
            .strip_prefix(self.work_dir()?)
            .map(Path::to_path_buf)
            .map_err(|_| GitError::PathNotFound {
                path: path.to_string(),
            })
    }

    // =========================================================================
    // Working Tree Status
    // =========================================================================

    /// Enumerate every path that differs from HEAD, including untracked and
    /// ignored entries.
    pub fn status_entries(&self) -> Result<Vec<StatusEntry>, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(true)
            .recurse_ignored_dirs(false)
            .renames_head_to_index(true);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| GitError::from_git2(e, "status"))?;

        Ok(statuses
            .iter()
            .filter_map(|entry| {
                let path = entry.path()?.to_string();
                Some(StatusEntry::new(path, flags_from_git2(entry.status())))
            })
            .collect())
    }

    /// Stage a path. A path missing from the working tree stages its deletion.
    ///
    /// # Errors
    ///
    /// - [`GitError::PathNotFound`] if the path is neither on disk nor in the index
    pub fn stage_path(&self, path: &str) -> Result<(), GitError> {
        let rel = self.relative_path(path)?;
        let mut index = self.repo.index().map_err(GitError::index)?;

        if self.work_dir()?.join(&rel).exists() {
            index.add_path(&rel).map_err(GitError::index)?;
        } else if index.get_path(&rel, 0).is_some() {
            index.remove_path(&rel).map_err(GitError::index)?;
        } else {
            return Err(GitError::PathNotFound {
                path: path.to_string(),
            });
        }

        index.write().map_err(GitError::index)
    }

    /// Reset a path's index entry to HEAD, or drop it when HEAD is unborn.
    pub fn unstage_path(&self, path: &str) -> Result<(), GitError> {
        let rel = self.relative_path(path)?;

        match self.head_commit()? {
            Some(head) => self
                .repo
                .reset_default(Some(head.as_object()), [rel.as_path()])
                .map_err(GitError::index),
            None => {
                let mut index = self.repo.index().map_err(GitError::index)?;
                index.remove_path(&rel).map_err(GitError::index)?;
                index.write().map_err(GitError::index)
            }
        }
    }

    /// Text blobs that differ between HEAD and the index.
    ///
    /// Deleted and binary entries are skipped.
    pub fn staged_files(&self) -> Result<Vec<StagedFile>, GitError> {
        let head_tree = match self.head_commit()? {
            Some(commit) => Some(commit.tree()?),
            None => None,
        };
        let index = self.repo.index().map_err(GitError::index)?;
        let diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), Some(&index), None)?;

        let mut files = Vec::new();
        for delta in diff.deltas() {
            if delta.status() == git2::Delta::Deleted {
                continue;
            }
            let new_file = delta.new_file();
            if new_file.id().is_zero() {
                continue;
            }
            let blob = self.repo.find_blob(new_file.id())?;
            if blob.is_binary() {
                continue;
            }
            let path = new_file
                .path()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default();
            files.push(StagedFile {
                path,
                content: blob.content().to_vec(),
            });
        }

        Ok(files)
    }

    // =========================================================================
    // HEAD
    // =========================================================================

    fn head_commit(&self) -> Result<Option<git2::Commit<'_>>, GitError> {
        match self.repo.head() {
            Ok(head) => head
                .peel_to_commit()
                .map(Some)
                .map_err(|e| GitError::from_git2(e, "HEAD")),
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(GitError::from_git2(e, "HEAD")),
        }
    }

    /// HEAD commit id, `None` when unborn.
    pub fn head_oid(&self) -> Result<Option<Oid>, GitError> {
        Ok(self.head_commit()?.map(|c| Oid::from(c.id())))
    }

    /// Name of the branch HEAD points at, even when it has no commits yet.
    ///
    /// Returns `None` for a detached HEAD.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        let head = self
            .repo
            .find_reference("HEAD")
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        Ok(head
            .symbolic_target()
            .and_then(|target| target.strip_prefix("refs/heads/"))
            .map(str::to_string))
    }

    // =========================================================================
    // Commits
    // =========================================================================

    /// Commit the current index on top of HEAD and advance HEAD.
    ///
    /// The first commit of a repository has no parents.
    pub fn commit_index(
        &self,
        author: &Identity,
        committer: &Identity,
        message: &str,
    ) -> Result<Oid, GitError> {
        let author = signature(author)?;
        let committer = signature(committer)?;

        let write_err = |e: git2::Error| GitError::WriteTree {
            message: e.message().to_string(),
        };
        let mut index = self.repo.index().map_err(write_err)?;
        let tree_oid = index.write_tree().map_err(write_err)?;
        let tree = self.repo.find_tree(tree_oid).map_err(write_err)?;

        let parent = self.head_commit()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &author, &committer, message, &tree, &parents)
            .map_err(|e| GitError::Commit {
                message: e.message().to_string(),
            })?;

        Ok(Oid::from(oid))
    }

    /// Walk history from HEAD, newest first, returning at most `limit` commits.
    ///
    /// An unborn HEAD yields an empty list.
    pub fn history(
        &self,
        limit: usize,
        verifier: &dyn SignatureVerifier,
    ) -> Result<Vec<CommitRecord>, GitError> {
        if limit == 0 || self.head_commit()?.is_none() {
            return Ok(Vec::new());
        }

        let mut walk = self.repo.revwalk()?;
        walk.push_head()?;
        walk.set_sorting(git2::Sort::TIME)?;

        walk.take(limit)
            .map(|oid| -> Result<CommitRecord, GitError> {
                let commit = self.repo.find_commit(oid?)?;
                Ok(self.record(&commit, verifier))
            })
            .collect()
    }

    fn record(&self, commit: &git2::Commit<'_>, verifier: &dyn SignatureVerifier) -> CommitRecord {
        let id = Oid::from(commit.id());

        let signature = self
            .repo
            .extract_signature(&commit.id(), None)
            .ok()
            .and_then(|(sig, _)| sig.as_str().map(str::to_string));
        let verified = verifier.verify(&id, signature.as_deref());

        let message = commit.message().unwrap_or("").to_string();
        let summary = message.trim().lines().next().unwrap_or("").to_string();

        CommitRecord {
            short_id: id.short(Oid::SHORT_LEN).to_string(),
            author: person(&commit.author()),
            committer: person(&commit.committer()),
            parent_count: commit.parent_count(),
            parent_ids: commit.parent_ids().map(Oid::from).collect(),
            message,
            summary,
            verified,
            id,
        }
    }

    // =========================================================================
    // Branches
    // =========================================================================

    fn find_local(&self, name: &BranchName) -> Result<git2::Branch<'_>, GitError> {
        self.repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .map_err(|e| match e.code() {
                git2::ErrorCode::NotFound => GitError::BranchNotFound {
                    name: name.to_string(),
                },
                _ => GitError::from_git2(e, name.as_str()),
            })
    }

    /// List local and remote-tracking branches. Symbolic refs such as
    /// `origin/HEAD` are skipped.
    pub fn branches(&self) -> Result<Vec<BranchRef>, GitError> {
        let mut result = Vec::new();

        for item in self.repo.branches(None)? {
            let (branch, branch_type) = item?;
            if branch.get().kind() == Some(git2::ReferenceType::Symbolic) {
                continue;
            }
            let Some(name) = branch.name().ok().flatten() else {
                continue;
            };

            result.push(BranchRef {
                name: name.to_string(),
                kind: match branch_type {
                    git2::BranchType::Local => BranchKind::Local,
                    git2::BranchType::Remote => BranchKind::Remote,
                },
                is_current: branch.is_head(),
            });
        }

        Ok(result)
    }

    /// Create a local branch at `start_point` (any commit-ish) or HEAD.
    pub fn create_branch(
        &self,
        name: &BranchName,
        start_point: Option<&str>,
    ) -> Result<Oid, GitError> {
        if self
            .repo
            .find_branch(name.as_str(), git2::BranchType::Local)
            .is_ok()
        {
            return Err(GitError::BranchExists {
                name: name.to_string(),
            });
        }

        let target = match start_point {
            Some(spec) => self
                .repo
                .revparse_single(spec)
                .and_then(|obj| obj.peel_to_commit())
                .map_err(|e| GitError::from_git2(e, spec))?,
            None => self.head_commit()?.ok_or(GitError::UnbornHead)?,
        };

        self.repo
            .branch(name.as_str(), &target, false)
            .map_err(|e| GitError::from_git2(e, name.as_str()))?;

        Ok(Oid::from(target.id()))
    }

    /// Safely check out a local branch and point HEAD at it.
    pub fn checkout_branch(&self, name: &BranchName) -> Result<(), GitError> {
        let branch = self.find_local(name)?;
        let commit = branch.get().peel_to_commit()?;

        self.checkout_safe(commit.as_object())?;
        self.repo
            .set_head(&name.ref_name())
            .map_err(|e| GitError::from_git2(e, &name.ref_name()))
    }

    /// Delete a local branch. The checked-out branch cannot be deleted.
    pub fn delete_branch(&self, name: &BranchName) -> Result<(), GitError> {
        let mut branch = self.find_local(name)?;
        if branch.is_head() {
            return Err(GitError::BranchInUse {
                name: name.to_string(),
            });
        }
        branch
            .delete()
            .map_err(|e| GitError::from_git2(e, name.as_str()))
    }

    fn checkout_safe(&self, target: &git2::Object<'_>) -> Result<(), GitError> {
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe();
        self.repo
            .checkout_tree(target, Some(&mut checkout))
            .map_err(|e| GitError::from_git2(e, "checkout"))
    }

    /// Merge the commit at `refname` into HEAD.
    ///
    /// `label` names the source in the merge commit message
    /// (`Merge <label>`). On conflict nothing is written: no commit, no
    /// index change, no working tree change.
    pub fn merge_ref(
        &self,
        refname: &str,
        label: &str,
        committer: &Identity,
    ) -> Result<MergeOutcome, GitError> {
        let reference = self
            .repo
            .find_reference(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;
        let theirs = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, refname))?;
        let annotated = self.repo.reference_to_annotated_commit(&reference)?;
        let (analysis, _) = self.repo.merge_analysis(&[&annotated])?;
        let their_oid = Oid::from(theirs.id());

        if analysis.is_up_to_date() {
            return Ok(MergeOutcome::UpToDate);
        }

        if analysis.is_unborn() {
            let head = self.repo.find_reference("HEAD")?;
            let target = head.symbolic_target().ok_or(GitError::UnbornHead)?;
            self.checkout_safe(theirs.as_object())?;
            self.repo
                .reference(target, theirs.id(), true, &format!("merge {label}: initial"))?;
            return Ok(MergeOutcome::FastForward(their_oid));
        }

        if analysis.is_fast_forward() {
            self.checkout_safe(theirs.as_object())?;
            let mut head = self.repo.head()?;
            head.set_target(theirs.id(), &format!("merge {label}: fast-forward"))?;
            return Ok(MergeOutcome::FastForward(their_oid));
        }

        let ours = self.head_commit()?.ok_or(GitError::UnbornHead)?;
        let mut merged = self.repo.merge_commits(&ours, &theirs, None)?;

        if merged.has_conflicts() {
            let paths = merged
                .conflicts()?
                .filter_map(Result::ok)
                .filter_map(|c| c.our.or(c.their).or(c.ancestor))
                .map(|entry| String::from_utf8_lossy(&entry.path).into_owned())
                .collect();
            return Err(GitError::MergeConflict { paths });
        }

        let tree_oid = merged
            .write_tree_to(&self.repo)
            .map_err(|e| GitError::WriteTree {
                message: e.message().to_string(),
            })?;
        let tree = self.repo.find_tree(tree_oid)?;
        self.checkout_safe(tree.as_object())?;

        let sig = signature(committer)?;
        let oid = self
            .repo
            .commit(
                Some("HEAD"),
                &sig,
                &sig,
                &format!("Merge {label}"),
                &tree,
                &[&ours, &theirs],
            )
            .map_err(|e| GitError::Commit {
                message: e.message().to_string(),
            })?;

        Ok(MergeOutcome::Merged(Oid::from(oid)))
    }

    // =========================================================================
    // Remote Operations
    // =========================================================================

    pub fn has_remote(&self, name: &str) -> bool {
        self.repo.find_remote(name).is_ok()
    }

    fn find_remote(&self, name: &str) -> Result<git2::Remote<'_>, GitError> {
        self.repo
            .find_remote(name)
            .map_err(|_| GitError::RemoteNotFound {
                remote: name.to_string(),
            })
    }

    /// Fetch from `remote` using its configured refspecs.
    pub fn fetch(&self, remote: &str, resolver: &dyn CredentialResolver) -> Result<(), GitError> {
        let mut handle = self.find_remote(remote)?;

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(auth::remote_callbacks(resolver));

        handle
            .fetch::<&str>(&[], Some(&mut fetch_options), None)
            .map_err(|e| GitError::Fetch {
                remote: remote.to_string(),
                message: e.message().to_string(),
            })
    }

    /// Push `refs/heads/<branch>` to the same ref on `remote`.
    ///
    /// Per-ref rejections reported by the server fail the push.
    pub fn push(
        &self,
        remote: &str,
        branch: &BranchName,
        resolver: &dyn CredentialResolver,
    ) -> Result<(), GitError> {
        self.find_local(branch)?;
        let mut handle = self.find_remote(remote)?;
        let push_err = |message: String| GitError::Push {
            remote: remote.to_string(),
            message,
        };

        let rejected = RefCell::new(Vec::new());
        {
            let mut callbacks = auth::remote_callbacks(resolver);
            callbacks.push_update_reference(|refname, status| {
                if let Some(reason) = status {
                    rejected.borrow_mut().push(format!("{refname}: {reason}"));
                }
                Ok(())
            });

            let mut push_options = git2::PushOptions::new();
            push_options.remote_callbacks(callbacks);

            let refspec = format!("{0}:{0}", branch.ref_name());
            handle
                .push(&[refspec.as_str()], Some(&mut push_options))
                .map_err(|e| push_err(e.message().to_string()))?;
        }

        let rejected = rejected.into_inner();
        if !rejected.is_empty() {
            return Err(push_err(format!("rejected {}", rejected.join("; "))));
        }
        Ok(())
    }

    /// Commits `branch` has that its upstream lacks, and vice versa.
    ///
    /// The upstream is the configured one, else `refs/remotes/<remote>/<branch>`.
    /// Returns `(0, 0)` when either side does not exist.
    pub fn ahead_behind(&self, branch: &str, remote: &str) -> Result<(usize, usize), GitError> {
        let local = match self.repo.find_branch(branch, git2::BranchType::Local) {
            Ok(b) => b,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok((0, 0)),
            Err(e) => return Err(GitError::from_git2(e, branch)),
        };
        let Some(local_oid) = local.get().target() else {
            return Ok((0, 0));
        };

        let upstream_oid = match local.upstream() {
            Ok(upstream) => upstream.get().target(),
            Err(_) => self
                .repo
                .refname_to_id(&format!("refs/remotes/{remote}/{branch}"))
                .ok(),
        };

        match upstream_oid {
            Some(upstream) => Ok(self.repo.graph_ahead_behind(local_oid, upstream)?),
            None => Ok((0, 0)),
        }
    }
}

fn signature(identity: &Identity) -> Result<git2::Signature<'static>, GitError> {
    git2::Signature::now(&identity.name, &identity.email).map_err(|e| GitError::Signature {
        message: e.message().to_string(),
    })
}

fn person(sig: &git2::Signature<'_>) -> Person {
    Person {
        name: sig.name().unwrap_or("").to_string(),
        email: sig.email().unwrap_or("").to_string(),
        time: chrono::DateTime::from_timestamp(sig.when().seconds(), 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH),
    }
}

fn flags_from_git2(status: git2::Status) -> StatusFlags {
    let table = [
        (git2::Status::INDEX_NEW, StatusFlags::INDEX_NEW),
        (git2::Status::INDEX_MODIFIED, StatusFlags::INDEX_MODIFIED),
        (git2::Status::INDEX_DELETED, StatusFlags::INDEX_DELETED),
        (git2::Status::INDEX_RENAMED, StatusFlags::INDEX_RENAMED),
        (git2::Status::INDEX_TYPECHANGE, StatusFlags::INDEX_TYPECHANGE),
        (git2::Status::WT_NEW, StatusFlags::WT_NEW),
        (git2::Status::WT_MODIFIED, StatusFlags::WT_MODIFIED),
        (git2::Status::WT_DELETED, StatusFlags::WT_DELETED),
        (git2::Status::WT_RENAMED, StatusFlags::WT_RENAMED),
        (git2::Status::WT_TYPECHANGE, StatusFlags::WT_TYPECHANGE),
        (git2::Status::IGNORED, StatusFlags::IGNORED),
        (git2::Status::CONFLICTED, StatusFlags::CONFLICTED),
    ];

    table
        .into_iter()
        .filter(|(raw, _)| status.contains(*raw))
        .fold(StatusFlags::empty(), |acc, (_, flag)| acc | flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod git_error {
        use super::*;

        #[test]
        fn not_found_maps_to_ref_not_found() {
            let err = GitError::from_git2(
                git2::Error::new(
                    git2::ErrorCode::NotFound,
                    git2::ErrorClass::Reference,
                    "missing",
                ),
                "refs/heads/nope",
            );
            assert!(matches!(err, GitError::RefNotFound { refname } if refname == "refs/heads/nope"));
        }

        #[test]
        fn conflict_maps_to_checkout_conflict() {
            let err = GitError::from_git2(
                git2::Error::new(
                    git2::ErrorCode::Conflict,
                    git2::ErrorClass::Checkout,
                    "1 conflict prevents checkout",
                ),
                "checkout",
            );
            assert!(matches!(err, GitError::CheckoutConflict { .. }));
        }

        #[test]
        fn merge_conflict_lists_paths() {
            let err = GitError::MergeConflict {
                paths: vec!["a.txt".into(), "b.txt".into()],
            };
            assert_eq!(err.to_string(), "merge conflict in a.txt, b.txt");
        }

        #[test]
        fn type_error_converts() {
            let err: GitError = TypeError::InvalidOid("bad".into()).into();
            assert!(matches!(err, GitError::InvalidOid { .. }));
        }
    }

    mod status_flags {
        use super::*;

        #[test]
        fn maps_each_flag() {
            let flags = flags_from_git2(git2::Status::INDEX_MODIFIED | git2::Status::WT_MODIFIED);
            assert!(flags.contains(StatusFlags::INDEX_MODIFIED));
            assert!(flags.contains(StatusFlags::WT_MODIFIED));
            assert!(!flags.contains(StatusFlags::WT_NEW));
        }

        #[test]
        fn current_maps_to_empty() {
            assert!(flags_from_git2(git2::Status::CURRENT).is_empty());
        }

        #[test]
        fn ignored_and_conflicted() {
            assert_eq!(
                flags_from_git2(git2::Status::IGNORED),
                StatusFlags::IGNORED
            );
            assert_eq!(
                flags_from_git2(git2::Status::CONFLICTED),
                StatusFlags::CONFLICTED
            );
        }
    }

    mod person {
        use super::*;

        #[test]
        fn converts_signature_time() {
            let sig = git2::Signature::new("A", "a@b", &git2::Time::new(1_700_000_000, 0)).unwrap();
            let p = person(&sig);
            assert_eq!(p.name, "A");
            assert_eq!(p.time.timestamp(), 1_700_000_000);
        }
    }
}
