//! Integration tests for analytics caching and background monitoring.

mod common;

use std::time::{Duration, Instant};

use common::{drain, TestRepo};

use gitward::analytics::{AnalyticsView, ComputeOutcome};
use gitward::service::{ServiceEvent, TickOutcome};

const WAIT: Duration = Duration::from_secs(10);

fn ready(repo: &TestRepo) -> (serde_json::Value, bool) {
    match repo.svc.analytics() {
        AnalyticsView::Ready { snapshot, stale, .. } => (
            serde_json::to_value(&snapshot.metrics).unwrap(),
            stale,
        ),
        AnalyticsView::NotComputed => panic!("analytics not computed"),
    }
}

fn repo_config_path(repo: &TestRepo) -> std::path::PathBuf {
    repo.root().join(".git/gitward/config.toml")
}

fn write_repo_config(repo: &TestRepo, toml: &str) {
    let path = repo_config_path(repo);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, toml).unwrap();
}

fn computed_at(repo: &TestRepo) -> chrono::DateTime<chrono::Utc> {
    match repo.svc.analytics() {
        AnalyticsView::Ready { snapshot, .. } => snapshot.computed_at,
        AnalyticsView::NotComputed => panic!("analytics not computed"),
    }
}

#[test]
fn open_computes_analytics() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "one\n", "first");
    repo.commit_file("a.txt", "two\n", "second");

    repo.svc.open(repo.root()).unwrap();
    assert!(repo.svc.wait_for_analytics(WAIT));

    let (metrics, stale) = ready(&repo);
    assert!(!stale);
    assert_eq!(metrics["total_commits"], 2);
    assert_eq!(metrics["active_branch"], repo.branch());
    assert_eq!(metrics["distinct_authors"], 1);
}

#[test]
fn fresh_snapshot_is_not_recomputed_until_ttl() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "x\n", "first");
    repo.svc.open(repo.root()).unwrap();
    assert!(repo.svc.wait_for_analytics(WAIT));
    repo.svc.analytics();

    let first = computed_at(&repo);

    assert_eq!(repo.svc.compute_analytics(false).unwrap(), ComputeOutcome::Skipped);
    assert!(repo.svc.wait_for_analytics(WAIT));
    assert_eq!(computed_at(&repo), first);

    repo.clock.advance(chrono::Duration::seconds(61));
    let (_, stale) = ready(&repo);
    assert!(stale);

    assert_eq!(repo.svc.compute_analytics(false).unwrap(), ComputeOutcome::Started);
    assert!(repo.svc.wait_for_analytics(WAIT));
    let (_, stale) = ready(&repo);
    assert!(!stale);
    assert!(computed_at(&repo) > first);
}

#[test]
fn forced_compute_ignores_ttl() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "x\n", "first");
    repo.svc.open(repo.root()).unwrap();
    assert!(repo.svc.wait_for_analytics(WAIT));
    repo.svc.analytics();

    repo.commit_file("b.txt", "y\n", "second");
    assert_eq!(repo.svc.compute_analytics(true).unwrap(), ComputeOutcome::Started);
    assert!(repo.svc.wait_for_analytics(WAIT));

    let (metrics, _) = ready(&repo);
    assert_eq!(metrics["total_commits"], 2);
}

#[test]
fn repository_config_overrides_ttl() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "x\n", "first");
    write_repo_config(&repo, "[analytics]\nttl_secs = 1\n");

    repo.svc.open(repo.root()).unwrap();
    assert!(repo.svc.wait_for_analytics(WAIT));
    repo.svc.analytics();

    repo.clock.advance(chrono::Duration::seconds(5));
    assert_eq!(repo.svc.compute_analytics(false).unwrap(), ComputeOutcome::Started);
    assert!(repo.svc.wait_for_analytics(WAIT));
}

#[test]
fn forced_compute_while_running_is_queued() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "x\n", "first");
    repo.svc.open(repo.root()).unwrap();

    // Either the open's worker is still running or it already finished.
    let outcome = repo.svc.compute_analytics(true).unwrap();
    assert!(matches!(outcome, ComputeOutcome::Queued | ComputeOutcome::Started));
    assert!(repo.svc.wait_for_analytics(WAIT));
    let (metrics, _) = ready(&repo);
    assert_eq!(metrics["total_commits"], 1);
}

#[test]
fn close_discards_analytics() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "x\n", "first");
    repo.svc.open(repo.root()).unwrap();
    assert!(repo.svc.wait_for_analytics(WAIT));

    repo.svc.close();
    assert!(matches!(repo.svc.analytics(), AnalyticsView::NotComputed));
}

// =============================================================================
// Monitoring
// =============================================================================

#[test]
fn tick_is_stopped_until_monitoring_starts() {
    let repo = TestRepo::new();
    assert_eq!(repo.svc.tick(Instant::now()), TickOutcome::Stopped);

    repo.svc.start_monitoring();
    assert!(repo.svc.is_monitoring());
    assert_eq!(repo.svc.tick(Instant::now()), TickOutcome::Idle);

    repo.svc.stop_monitoring();
    assert_eq!(repo.svc.tick(Instant::now()), TickOutcome::Stopped);
}

#[test]
fn poll_detects_external_edit() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "one\n", "first");
    repo.svc.start_monitoring();
    let events = repo.svc.subscribe();

    repo.write("a.txt", "edited outside\n");
    let outcome = repo.svc.tick(Instant::now() + Duration::from_secs(2));

    assert_eq!(outcome, TickOutcome::Polled { changed: true });
    assert!(repo.svc.has_changes());
    assert!(drain(&events)
        .iter()
        .any(|e| matches!(e, ServiceEvent::StatusChanged { has_changes: true })));
}

#[test]
fn monitor_detects_drift_and_refreshes() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "one\n", "first");
    repo.svc.refresh().unwrap();
    repo.svc.start_monitoring();

    assert_eq!(repo.svc.monitor_tick(), TickOutcome::Monitored { drift: false });

    // A commit made without the service.
    let raw = repo.raw();
    let sig = git2::Signature::now("Outside", "outside@example.com").unwrap();
    let tree = raw.find_tree(raw.index().unwrap().write_tree().unwrap()).unwrap();
    let parent = raw.head().unwrap().peel_to_commit().unwrap();
    raw.commit(Some("HEAD"), &sig, &sig, "outside", &tree, &[&parent])
        .unwrap();

    let outcome = repo.svc.tick(Instant::now() + Duration::from_secs(6));
    assert_eq!(outcome, TickOutcome::Monitored { drift: true });
    assert_eq!(repo.svc.recent_commits()[0].summary, "outside");
}

#[test]
fn repository_config_overrides_poll_interval() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", "one\n", "first");
    write_repo_config(&repo, "[monitor]\npoll_interval_secs = 4\nmonitor_interval_secs = 20\n");
    repo.svc.open(repo.root()).unwrap();
    repo.svc.start_monitoring();

    repo.write("a.txt", "edited outside\n");
    let now = Instant::now();
    assert_eq!(repo.svc.tick(now + Duration::from_secs(2)), TickOutcome::Idle);
    assert_eq!(
        repo.svc.tick(now + Duration::from_secs(4)),
        TickOutcome::Polled { changed: true }
    );

    // Without the file the global interval applies again.
    std::fs::remove_file(repo_config_path(&repo)).unwrap();
    repo.svc.open(repo.root()).unwrap();
    repo.svc.start_monitoring();
    assert_eq!(
        repo.svc.tick(Instant::now() + Duration::from_secs(2)),
        TickOutcome::Polled { changed: false }
    );
}

#[test]
fn tick_without_repository() {
    let repo = TestRepo::new();
    repo.svc.close();
    repo.svc.start_monitoring();

    assert_eq!(repo.svc.poll_tick(), TickOutcome::NoRepository);
}
