//! cli::commands::scan
//!
//! `scan` and `hook install`.
//!
//! `scan --staged` is what the installed pre-commit hook runs. Any finding
//! makes the command fail, which blocks the commit. Findings name the rule
//! and position only; matched text is never printed.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context as _, Result};

use super::{open_service, print_json, Context};
use crate::cli::args::HookCommand;
use crate::scan::SecretScanner;
use crate::service::StagedFindings;

pub fn scan(ctx: &Context, staged: bool, file: Option<&Path>) -> Result<()> {
    let results = if staged {
        open_service(ctx)?.scan_staged()?
    } else {
        let (label, content) = match file {
            Some(path) => {
                let path = ctx.resolve(path)?;
                let content = std::fs::read(&path)
                    .with_context(|| format!("cannot read {}", path.display()))?;
                (path.display().to_string(), content)
            }
            None => {
                let mut content = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut content)
                    .context("cannot read stdin")?;
                ("<stdin>".to_string(), content)
            }
        };

        let findings = SecretScanner::new()?.findings(&String::from_utf8_lossy(&content));
        if findings.is_empty() {
            Vec::new()
        } else {
            vec![StagedFindings {
                path: label,
                findings,
            }]
        }
    };

    report(ctx, &results)
}

fn report(ctx: &Context, results: &[StagedFindings]) -> Result<()> {
    if ctx.json {
        print_json(results)?;
    } else {
        for file in results {
            for finding in &file.findings {
                eprintln!("{}:{finding}", file.path);
            }
        }
    }

    if !results.is_empty() {
        let paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
        bail!("possible secrets in {}", paths.join(", "));
    }

    ctx.say("No secrets found.");
    Ok(())
}

pub fn hook(ctx: &Context, command: HookCommand) -> Result<()> {
    match command {
        HookCommand::Install => {
            let path = open_service(ctx)?.install_hook()?;
            ctx.say(format!("Installed {}", path.display()));
            Ok(())
        }
    }
}
