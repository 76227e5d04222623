//! cli::commands::analytics

use std::time::Duration;

use anyhow::{bail, Result};

use super::{open_service, print_json, Context};
use crate::analytics::AnalyticsView;

/// Compute analytics for the repository and print the snapshot.
pub fn analytics(ctx: &Context, force: bool, wait_secs: u64) -> Result<()> {
    let svc = open_service(ctx)?;
    // Opening already starts a forced computation; `force` restarts it only
    // if that one has finished.
    svc.compute_analytics(force)?;
    if !svc.wait_for_analytics(Duration::from_secs(wait_secs)) {
        bail!("analytics did not finish within {wait_secs}s");
    }

    let view = svc.analytics();
    if ctx.json {
        return print_json(&view);
    }

    match view {
        AnalyticsView::NotComputed => println!("No analytics available."),
        AnalyticsView::Ready { snapshot, .. } => {
            println!("Computed at {}", snapshot.computed_at.to_rfc3339());
            for (name, value) in &snapshot.metrics {
                println!("  {name:<20} {value}");
            }
        }
    }
    Ok(())
}
