//! cli::commands::status

use anyhow::Result;
use serde_json::json;

use super::{open_service, print_json, Context};
use crate::core::model::{StatusEntry, StatusFlags};

pub fn status(ctx: &Context) -> Result<()> {
    let svc = open_service(ctx)?;
    let snapshot = svc.status()?;
    let state = svc.state();

    if ctx.json {
        return print_json(&json!({
            "branch": state.current_branch,
            "ahead": state.ahead,
            "behind": state.behind,
            "status": snapshot,
        }));
    }

    match &state.current_branch {
        Some(branch) => println!("On branch {branch}"),
        None => println!("HEAD detached"),
    }
    if state.ahead > 0 || state.behind > 0 {
        println!("Ahead {}, behind {}", state.ahead, state.behind);
    }

    if snapshot.clean {
        println!("Nothing to commit, working tree clean");
        return Ok(());
    }

    print_section("Staged", &snapshot.staged, index_label);
    print_section("Unstaged", &snapshot.unstaged, worktree_label);
    print_section("Untracked", &snapshot.untracked, |_| "new");
    Ok(())
}

fn print_section(title: &str, entries: &[StatusEntry], label: fn(StatusFlags) -> &'static str) {
    if entries.is_empty() {
        return;
    }
    println!("{title}:");
    for entry in entries {
        println!("  {:<10} {}", label(entry.flags), entry.path);
    }
}

fn index_label(flags: StatusFlags) -> &'static str {
    if flags.contains(StatusFlags::INDEX_NEW) {
        "new"
    } else if flags.contains(StatusFlags::INDEX_DELETED) {
        "deleted"
    } else if flags.contains(StatusFlags::INDEX_RENAMED) {
        "renamed"
    } else if flags.contains(StatusFlags::INDEX_TYPECHANGE) {
        "typechange"
    } else {
        "modified"
    }
}

fn worktree_label(flags: StatusFlags) -> &'static str {
    if flags.contains(StatusFlags::CONFLICTED) {
        "conflicted"
    } else if flags.contains(StatusFlags::WT_DELETED) {
        "deleted"
    } else if flags.contains(StatusFlags::WT_RENAMED) {
        "renamed"
    } else if flags.contains(StatusFlags::WT_TYPECHANGE) {
        "typechange"
    } else {
        "modified"
    }
}
