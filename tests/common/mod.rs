//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use gitward::core::clock::ManualClock;
use gitward::core::config::schema::{AnalyticsConfig, CommitConfig, GlobalConfig, MonitorConfig};
use gitward::core::config::Config;
use gitward::core::types::Oid;
use gitward::secrets::MemorySecretStore;
use gitward::service::{RepositoryService, ServiceEvent};

/// Configuration used by every fixture: fixed identity, short intervals.
pub fn test_config(scan_secrets: bool) -> Config {
    Config {
        global: GlobalConfig {
            commit: Some(CommitConfig {
                default_name: Some("Test User".to_string()),
                default_email: Some("test@example.com".to_string()),
                scan_secrets: Some(scan_secrets),
                ..Default::default()
            }),
            analytics: Some(AnalyticsConfig { ttl_secs: Some(60) }),
            monitor: Some(MonitorConfig {
                poll_interval_secs: Some(1),
                monitor_interval_secs: Some(5),
            }),
            ..Default::default()
        },
        repo: None,
    }
}

/// A service bound to a fresh repository in a temp directory.
pub struct TestRepo {
    pub dir: TempDir,
    pub svc: RepositoryService,
    pub store: Arc<MemorySecretStore>,
    pub clock: ManualClock,
    root: PathBuf,
}

impl TestRepo {
    pub fn new() -> Self {
        Self::with_config(test_config(true))
    }

    pub fn with_config(config: Config) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = Arc::new(MemorySecretStore::new());
        let clock = ManualClock::new();
        let svc = RepositoryService::builder()
            .config(config)
            .secret_store(store.clone())
            .clock(Arc::new(clock.clone()))
            .build()
            .expect("failed to build service");

        let root = svc.init(dir.path().join("repo")).expect("init failed");
        Self {
            dir,
            svc,
            store,
            clock,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Write, stage and commit one file through the service.
    pub fn commit_file(&self, rel: &str, content: &str, message: &str) -> Oid {
        self.write(rel, content);
        self.svc.stage_file(rel).expect("stage failed");
        self.svc.commit(message, None).expect("commit failed")
    }

    pub fn branch(&self) -> String {
        self.svc.current_branch().expect("no current branch")
    }

    /// A plain git2 handle for assertions the service does not expose.
    pub fn raw(&self) -> git2::Repository {
        git2::Repository::open(&self.root).expect("failed to open repo")
    }
}

/// Drain pending events from `rx`.
pub fn drain(rx: &crossbeam_channel::Receiver<ServiceEvent>) -> Vec<ServiceEvent> {
    rx.try_iter().collect()
}
