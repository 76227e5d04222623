//! cli::commands::commit

use anyhow::Result;
use serde_json::json;

use super::{open_service, print_json, Context};
use crate::core::types::Oid;

pub fn commit(ctx: &Context, message: &str, author: Option<&str>) -> Result<()> {
    let svc = open_service(ctx)?;
    let oid = svc.commit(message, author)?;

    if ctx.json {
        return print_json(&json!({ "id": oid, "branch": svc.current_branch() }));
    }

    let summary = message.lines().next().unwrap_or("");
    match svc.current_branch() {
        Some(branch) => ctx.say(format!("[{branch} {}] {summary}", oid.short(Oid::SHORT_LEN))),
        None => ctx.say(format!("[{}] {summary}", oid.short(Oid::SHORT_LEN))),
    }
    Ok(())
}
