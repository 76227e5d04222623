//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Builds a [`RepositoryService`] from the loaded configuration
//! 2. Opens the repository at `--cwd` (or the working directory) if needed
//! 3. Calls one service operation and formats the result
//!
//! Handlers do NOT touch the repository directly.

mod analytics;
mod auth;
mod branch;
mod commit;
mod completion;
mod init;
mod log_cmd;
mod scan;
mod stage;
mod status;
mod sync;
mod watch;

pub use analytics::analytics;
pub use auth::auth;
pub use branch::branch;
pub use commit::commit;
pub use completion::completion;
pub use init::{clone, init};
pub use log_cmd::log;
pub use scan::{hook, scan};
pub use stage::{add, reset};
pub use status::status;
pub use sync::{pull, push};
pub use watch::watch;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::args::Command;
use crate::core::config::Config;
use crate::service::RepositoryService;

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub cwd: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

impl Context {
    /// `--cwd`, else the process working directory.
    pub fn dir(&self) -> Result<PathBuf> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("cannot determine working directory"),
        }
    }

    /// Resolve `path` against `--cwd`.
    pub fn resolve(&self, path: &std::path::Path) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.dir()?.join(path))
        }
    }

    /// Print `message` unless `--quiet`.
    pub fn say(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            println!("{message}");
        }
    }
}

/// Build a service from user configuration.
pub(crate) fn service() -> Result<RepositoryService> {
    let loaded = Config::load(None).context("failed to load configuration")?;
    RepositoryService::builder()
        .config(loaded.config)
        .build()
        .context("failed to start repository service")
}

/// Build a service and open the repository at the context directory.
pub(crate) fn open_service(ctx: &Context) -> Result<RepositoryService> {
    let svc = service()?;
    svc.open(ctx.dir()?)?;
    Ok(svc)
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init { path } => init(ctx, path.as_deref()),
        Command::Clone { url, path, token } => clone(ctx, &url, &path, token.as_deref()),
        Command::Status => status(ctx),
        Command::Log { limit } => log(ctx, limit),
        Command::Add { paths } => add(ctx, &paths),
        Command::Reset { paths } => reset(ctx, &paths),
        Command::Commit { message, author } => commit(ctx, &message, author.as_deref()),
        Command::Branch { command } => branch(ctx, command),
        Command::Push { remote, branch } => push(ctx, remote.as_deref(), branch.as_deref()),
        Command::Pull { remote, branch } => pull(ctx, remote.as_deref(), branch.as_deref()),
        Command::Scan { staged, file } => scan(ctx, staged, file.as_deref()),
        Command::Hook { command } => hook(ctx, command),
        Command::Auth {
            token,
            username,
            status,
            logout,
        } => auth(ctx, token.as_deref(), username.as_deref(), status, logout),
        Command::Analytics { force, wait } => analytics(ctx, force, wait),
        Command::Watch { ticks, interval_ms } => watch(ctx, ticks, interval_ms),
        Command::Completion { shell } => completion(shell),
    }
}
