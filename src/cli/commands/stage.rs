//! cli::commands::stage
//!
//! `add` and `reset`.

use anyhow::Result;

use super::{open_service, Context};

pub fn add(ctx: &Context, paths: &[String]) -> Result<()> {
    let svc = open_service(ctx)?;
    for path in paths {
        svc.stage_file(path)?;
        ctx.say(format!("staged {path}"));
    }
    Ok(())
}

pub fn reset(ctx: &Context, paths: &[String]) -> Result<()> {
    let svc = open_service(ctx)?;
    for path in paths {
        svc.unstage_file(path)?;
        ctx.say(format!("unstaged {path}"));
    }
    Ok(())
}
