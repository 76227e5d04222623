//! cli::commands::sync
//!
//! `push` and `pull`. Credentials come from the credential store
//! (see `gitward auth`); nothing here reads or prints them.

use anyhow::Result;

use super::{open_service, Context};

pub fn push(ctx: &Context, remote: Option<&str>, branch: Option<&str>) -> Result<()> {
    let svc = open_service(ctx)?;
    svc.push(remote, branch)?;

    let branch = branch
        .map(str::to_string)
        .or_else(|| svc.current_branch())
        .unwrap_or_default();
    ctx.say(format!("Pushed {branch}"));
    Ok(())
}

pub fn pull(ctx: &Context, remote: Option<&str>, branch: Option<&str>) -> Result<()> {
    let svc = open_service(ctx)?;
    let outcome = svc.pull(remote, branch)?;

    let source = match (remote, branch) {
        (Some(r), Some(b)) => format!("{r}/{b}"),
        (Some(r), None) => r.to_string(),
        _ => "upstream".to_string(),
    };
    ctx.say(crate::service::branch::merge_message(&source, &outcome));
    Ok(())
}
