//! core::paths
//!
//! Path routing for files gitward reads or writes.
//!
//! Repository-scoped files live under the git directory:
//! - `<git_dir>/gitward/config.toml` - Repository configuration
//! - `<git_dir>/hooks/pre-commit` - Installed secret-scanning hook
//!
//! User-scoped files live under `~/.gitward/`:
//! - `config.toml` - Global configuration
//! - `secrets.toml` - File secret store
//!
//! # Example
//!
//! ```
//! use gitward::core::paths::RepoPaths;
//! use std::path::PathBuf;
//!
//! let paths = RepoPaths::new(PathBuf::from("/repo"), PathBuf::from("/repo/.git"));
//!
//! assert_eq!(
//!     paths.repo_config_path(),
//!     PathBuf::from("/repo/.git/gitward/config.toml")
//! );
//! assert_eq!(
//!     paths.pre_commit_hook_path(),
//!     PathBuf::from("/repo/.git/hooks/pre-commit")
//! );
//! ```

use std::path::{Path, PathBuf};

use crate::git::RepoInfo;

/// Locations derived from an open repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    /// Working tree root. For a bare repository this is the repository directory itself.
    pub root: PathBuf,

    /// The `.git` directory (or the bare repository directory).
    pub git_dir: PathBuf,
}

impl RepoPaths {
    pub fn new(root: PathBuf, git_dir: PathBuf) -> Self {
        Self { root, git_dir }
    }

    /// Build from the doorway's repository description.
    pub fn from_repo_info(info: &RepoInfo) -> Self {
        Self {
            root: info.work_dir.clone().unwrap_or_else(|| info.git_dir.clone()),
            git_dir: info.git_dir.clone(),
        }
    }

    // =========================================================================
    // Repo-scoped paths
    // =========================================================================

    /// `<git_dir>/gitward`
    pub fn repo_gitward_dir(&self) -> PathBuf {
        self.git_dir.join("gitward")
    }

    /// `<git_dir>/gitward/config.toml`
    pub fn repo_config_path(&self) -> PathBuf {
        self.repo_gitward_dir().join("config.toml")
    }

    /// `<git_dir>/hooks`
    pub fn hooks_dir(&self) -> PathBuf {
        self.git_dir.join("hooks")
    }

    /// `<git_dir>/hooks/pre-commit`
    pub fn pre_commit_hook_path(&self) -> PathBuf {
        self.hooks_dir().join("pre-commit")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

// =============================================================================
// User-scoped paths
// =============================================================================

/// `~/.gitward`, or `None` when no home directory is known.
pub fn user_gitward_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".gitward"))
}

/// `~/.gitward/secrets.toml`
pub fn user_secrets_path() -> Option<PathBuf> {
    user_gitward_dir().map(|dir| dir.join("secrets.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> RepoPaths {
        RepoPaths::new(PathBuf::from("/repo"), PathBuf::from("/repo/.git"))
    }

    #[test]
    fn repo_config_path() {
        assert_eq!(
            paths().repo_config_path(),
            PathBuf::from("/repo/.git/gitward/config.toml")
        );
    }

    #[test]
    fn hook_paths() {
        assert_eq!(paths().hooks_dir(), PathBuf::from("/repo/.git/hooks"));
        assert_eq!(
            paths().pre_commit_hook_path(),
            PathBuf::from("/repo/.git/hooks/pre-commit")
        );
    }

    #[test]
    fn from_repo_info_normal() {
        let info = RepoInfo {
            git_dir: PathBuf::from("/repo/.git"),
            work_dir: Some(PathBuf::from("/repo")),
            is_bare: false,
        };
        let paths = RepoPaths::from_repo_info(&info);
        assert_eq!(paths.root(), Path::new("/repo"));
        assert_eq!(paths.git_dir(), Path::new("/repo/.git"));
    }

    #[test]
    fn from_repo_info_bare_uses_git_dir_as_root() {
        let info = RepoInfo {
            git_dir: PathBuf::from("/srv/repo.git"),
            work_dir: None,
            is_bare: true,
        };
        let paths = RepoPaths::from_repo_info(&info);
        assert_eq!(paths.root(), Path::new("/srv/repo.git"));
    }

    #[test]
    fn user_secrets_under_gitward_dir() {
        if let (Some(dir), Some(file)) = (user_gitward_dir(), user_secrets_path()) {
            assert_eq!(file, dir.join("secrets.toml"));
        }
    }
}
