//! cli::commands::branch

use anyhow::Result;
use serde_json::json;

use super::{open_service, print_json, Context};
use crate::cli::args::BranchCommand;
use crate::core::model::BranchKind;
use crate::core::types::Oid;
use crate::service::RepositoryService;

pub fn branch(ctx: &Context, command: BranchCommand) -> Result<()> {
    let svc = open_service(ctx)?;

    match command {
        BranchCommand::List => list(ctx, &svc),
        BranchCommand::Create { name, start_point } => {
            let oid = svc.create_branch(&name, start_point.as_deref())?;
            if ctx.json {
                return print_json(&json!({ "branch": name, "target": oid }));
            }
            ctx.say(format!("Created {name} at {}", oid.short(Oid::SHORT_LEN)));
            Ok(())
        }
        BranchCommand::Checkout { name } => {
            svc.checkout_branch(&name)?;
            ctx.say(format!("Switched to {name}"));
            Ok(())
        }
        BranchCommand::Merge { name } => {
            let outcome = svc.merge_branch(&name)?;
            ctx.say(crate::service::branch::merge_message(&name, &outcome));
            Ok(())
        }
        BranchCommand::Delete { name } => {
            svc.delete_branch(&name)?;
            ctx.say(format!("Deleted {name}"));
            Ok(())
        }
    }
}

fn list(ctx: &Context, svc: &RepositoryService) -> Result<()> {
    let branches = svc.branches()?;
    if ctx.json {
        return print_json(&branches);
    }

    for b in branches {
        let marker = if b.is_current { "*" } else { " " };
        match b.kind {
            BranchKind::Local => println!("{marker} {}", b.name),
            BranchKind::Remote => println!("{marker} {} (remote)", b.name),
        }
    }
    Ok(())
}
