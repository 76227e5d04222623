//! cli::commands::log_cmd

use anyhow::Result;

use super::{open_service, print_json, Context};

/// Show up to `limit` commits from HEAD, newest first.
pub fn log(ctx: &Context, limit: usize) -> Result<()> {
    let svc = open_service(ctx)?;
    let commits = svc.history(limit)?;

    if ctx.json {
        return print_json(&commits);
    }

    if commits.is_empty() {
        ctx.say("No commits yet.");
        return Ok(());
    }

    for commit in &commits {
        let merge = if commit.is_merge() { " (merge)" } else { "" };
        let verified = if commit.verified { "" } else { " [unverified]" };
        println!(
            "{} {}{}{}  {} <{}>, {}",
            commit.short_id,
            commit.summary,
            merge,
            verified,
            commit.author.name,
            commit.author.email,
            commit.author.time.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}
