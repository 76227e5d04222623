//! cli::commands::init
//!
//! `init` and `clone`.

use std::path::Path;

use anyhow::Result;
use serde_json::json;

use super::{print_json, service, Context};
use crate::git::redact_url;

/// Create a repository and install the pre-commit hook.
pub fn init(ctx: &Context, path: Option<&Path>) -> Result<()> {
    let target = match path {
        Some(p) => ctx.resolve(p)?,
        None => ctx.dir()?,
    };

    let svc = service()?;
    let root = svc.init(&target)?;

    if ctx.json {
        return print_json(&json!({ "path": root, "branch": svc.current_branch() }));
    }
    ctx.say(format!("Initialized repository in {}", root.display()));
    ctx.say("Installed pre-commit secret scan hook.");
    Ok(())
}

/// Clone `url` into `path`.
///
/// The token, if any, goes to the credential store and is never printed.
pub fn clone(ctx: &Context, url: &str, path: &Path, token: Option<&str>) -> Result<()> {
    let target = ctx.resolve(path)?;
    let svc = service()?;
    let root = svc.clone(url, &target, token)?;

    if ctx.json {
        return print_json(&json!({
            "url": redact_url(url),
            "path": root,
            "branch": svc.current_branch(),
        }));
    }
    ctx.say(format!("Cloned {} into {}", redact_url(url), root.display()));
    Ok(())
}
