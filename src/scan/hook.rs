//! scan::hook
//!
//! Pre-commit hook installation.
//!
//! The installed script prefers `gitward scan --staged` when the binary is
//! on `PATH`. Without it, the script falls back to `git diff --cached`
//! piped through `grep -E` using the same patterns as [`SecretScanner`].
//!
//! [`SecretScanner`]: super::SecretScanner

use std::fs;
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::scanner::SecretRule;
use super::ScanError;
use crate::core::paths::RepoPaths;

/// Render the hook script.
pub fn script() -> String {
    let patterns = SecretRule::ALL
        .iter()
        .map(|rule| rule.pattern())
        .collect::<Vec<_>>()
        .join("|");

    format!(
        r#"#!/usr/bin/env bash
# Installed by gitward: blocks commits whose staged content looks like a secret.
if command -v gitward >/dev/null 2>&1; then
    exec gitward scan --staged
fi

if git diff --cached --no-color -U0 | grep -E '^\+' | grep -vE '^\+\+\+ ' | grep -qE '{patterns}'; then
    echo "gitward: possible secret in staged changes, commit blocked" >&2
    exit 1
fi
exit 0
"#
    )
}

/// Write `<git_dir>/hooks/pre-commit`, replacing any existing hook.
///
/// The file is made executable (0755) on Unix. Returns the hook path.
pub fn install(paths: &RepoPaths) -> Result<PathBuf, ScanError> {
    let hook_path = paths.pre_commit_hook_path();
    let hook_err = |source: std::io::Error| ScanError::Hook {
        path: hook_path.clone(),
        source,
    };

    fs::create_dir_all(paths.hooks_dir()).map_err(hook_err)?;
    fs::write(&hook_path, script()).map_err(hook_err)?;

    #[cfg(unix)]
    fs::set_permissions(&hook_path, fs::Permissions::from_mode(0o755)).map_err(hook_err)?;

    tracing::debug!(path = %hook_path.display(), "installed pre-commit hook");
    Ok(hook_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(temp: &TempDir) -> RepoPaths {
        RepoPaths::new(temp.path().to_path_buf(), temp.path().join(".git"))
    }

    #[test]
    fn script_embeds_every_pattern() {
        let script = script();
        assert!(script.starts_with("#!/usr/bin/env bash\n"));
        for rule in SecretRule::ALL {
            assert!(script.contains(rule.pattern()), "missing {}", rule);
        }
        assert!(script.contains("gitward scan --staged"));
    }

    #[test]
    fn install_creates_hooks_dir() {
        let temp = TempDir::new().unwrap();
        let path = install(&paths(&temp)).expect("install");
        assert_eq!(path, temp.path().join(".git/hooks/pre-commit"));
        assert_eq!(fs::read_to_string(&path).unwrap(), script());
    }

    #[test]
    fn install_overwrites_existing_hook() {
        let temp = TempDir::new().unwrap();
        let paths = paths(&temp);
        fs::create_dir_all(paths.hooks_dir()).unwrap();
        fs::write(paths.pre_commit_hook_path(), "#!/bin/sh\nexit 1\n").unwrap();

        install(&paths).expect("install");
        assert_eq!(
            fs::read_to_string(paths.pre_commit_hook_path()).unwrap(),
            script()
        );
    }

    #[cfg(unix)]
    #[test]
    fn installed_hook_is_executable() {
        let temp = TempDir::new().unwrap();
        let path = install(&paths(&temp)).expect("install");
        let mode = fs::metadata(path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
    }
}
