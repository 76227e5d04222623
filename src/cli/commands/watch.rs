//! cli::commands::watch
//!
//! Drives the service's monitor ticks and prints events as they arrive.

use std::time::{Duration, Instant};

use anyhow::Result;

use super::{open_service, Context};
use crate::service::ServiceEvent;

pub fn watch(ctx: &Context, ticks: Option<u64>, interval_ms: u64) -> Result<()> {
    let svc = open_service(ctx)?;
    let events = svc.subscribe();
    svc.start_monitoring();

    if let Some(path) = svc.current_repo() {
        ctx.say(format!("Watching {}", path.display()));
    }

    let interval = Duration::from_millis(interval_ms);
    let mut count = 0u64;
    while ticks.map_or(true, |limit| count < limit) {
        let outcome = svc.tick(Instant::now());
        tracing::debug!(?outcome, "tick");

        for event in events.try_iter() {
            print_event(ctx, &event)?;
        }

        count += 1;
        std::thread::sleep(interval);
    }

    svc.stop_monitoring();
    Ok(())
}

fn print_event(ctx: &Context, event: &ServiceEvent) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        ServiceEvent::RepositoryChanged { path: Some(p) } => println!("repository {}", p.display()),
        ServiceEvent::RepositoryChanged { path: None } => println!("repository closed"),
        ServiceEvent::CurrentBranchChanged { branch } => {
            println!("branch {}", branch.as_deref().unwrap_or("(detached)"))
        }
        ServiceEvent::StatusChanged { has_changes } => {
            println!("{}", if *has_changes { "dirty" } else { "clean" })
        }
        ServiceEvent::CommitsChanged => println!("commits changed"),
        ServiceEvent::OperationCompleted(report) => println!(
            "{} {}: {}",
            report.operation,
            if report.success { "ok" } else { "failed" },
            report.message
        ),
        ServiceEvent::AnalyticsReady => println!("analytics ready"),
        ServiceEvent::Invalidated { generation } => println!("invalidated (generation {generation})"),
    }
    Ok(())
}
