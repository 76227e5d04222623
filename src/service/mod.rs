//! service
//!
//! The repository state service.
//!
//! # Architecture
//!
//! [`RepositoryService`] owns at most one open repository handle and the
//! state derived from it:
//!
//! - Lifecycle: [`open`](RepositoryService::open),
//!   [`init`](RepositoryService::init), [`clone`](RepositoryService::clone),
//!   [`close`](RepositoryService::close)
//! - Working tree status ([`status`])
//! - Commits and history ([`commit`])
//! - Branches and merging ([`branch`])
//! - Push and pull ([`remote`])
//! - Externally driven polling ([`monitor`])
//!
//! # Concurrency
//!
//! The handle lives behind one mutex. Operations lock it for their duration.
//! Scheduler ticks only `try_lock` and report [`TickOutcome::Skipped`] when
//! the handle is busy.
//!
//! Network I/O runs on a second handle opened at the same path, so a slow
//! remote does not hold the main lock. Remote operations are serialized
//! among themselves by a separate gate. Before a remote operation touches
//! state again it checks the handle generation; a close or replacement in
//! the meantime turns the result into [`ServiceError::Cancelled`].
//!
//! Lock order is handle, then derived state. The derived-state lock is
//! never held while waiting on the handle.
//!
//! # Example
//!
//! ```no_run
//! use gitward::service::RepositoryService;
//!
//! let service = RepositoryService::builder().build()?;
//! service.init("/tmp/example")?;
//! std::fs::write("/tmp/example/a.txt", "hello\n")?;
//! service.stage_file("a.txt")?;
//! service.commit("first", None)?;
//! assert_eq!(service.history(1)?[0].summary, "first");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod branch;
pub mod commit;
mod error;
mod events;
pub mod monitor;
pub mod remote;
pub mod status;

pub use commit::StagedFindings;
pub use error::{Operation, ServiceError};
pub use events::{OperationReport, ServiceEvent};
pub use monitor::{MonitorSchedule, TickOutcome};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::Serialize;

use crate::analytics::{
    AnalyticsCache, AnalyticsInput, AnalyticsProvider, AnalyticsView, ComputeOutcome,
    SummaryProvider,
};
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::Config;
use crate::core::model::{BranchRef, CommitRecord, StatusSnapshot};
use crate::core::paths::RepoPaths;
use crate::core::signature::{self, Identity, SignatureVerifier};
use crate::core::types::Fingerprint;
use crate::git::{redact_url, CredentialResolver, Git, GitError, StoreResolver};
use crate::scan::{hook, SecretScanner};
use crate::secrets::{self, SecretStore};

use events::EventBus;

/// Observable state of the open repository.
///
/// Cleared when the repository is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoState {
    pub path: Option<PathBuf>,
    pub current_branch: Option<String>,
    pub has_changes: bool,
    /// Untracked and unstaged paths.
    pub modified_files: Vec<String>,
    /// Newest first, bounded by `history.recent_limit`.
    pub recent_commits: Vec<CommitRecord>,
    pub branches: Vec<BranchRef>,
    pub ahead: usize,
    pub behind: usize,
}

/// An open repository and everything tied to its lifetime.
pub(crate) struct OpenRepo {
    pub(crate) git: Git,
    pub(crate) paths: RepoPaths,
    pub(crate) config: Config,
    pub(crate) verifier: Box<dyn SignatureVerifier>,
    pub(crate) generation: u64,
    /// Last observed fingerprint, for drift detection.
    pub(crate) fingerprint: Option<Fingerprint>,
    /// Last observed `clean` value, for flip detection.
    pub(crate) clean: Option<bool>,
}

impl OpenRepo {
    fn new(git: Git, global: &Config, generation: u64) -> Self {
        let paths = RepoPaths::from_repo_info(&git.info());

        let config = match Config::load_from(None, Some(&paths)) {
            Ok(loaded) => Config {
                global: global.global.clone(),
                repo: loaded.config.repo,
            },
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable repository config");
                global.clone()
            }
        };

        Self {
            verifier: signature::verifier_for(config.signature_policy()),
            git,
            paths,
            config,
            generation,
            fingerprint: None,
            clean: None,
        }
    }

    pub(crate) fn default_identity(&self) -> Identity {
        let (name, email) = self.config.default_identity();
        Identity::new(name, email)
    }
}

/// Builder for [`RepositoryService`].
#[derive(Default)]
pub struct ServiceBuilder {
    config: Option<Config>,
    store: Option<Arc<dyn SecretStore>>,
    clock: Option<Arc<dyn Clock>>,
    provider: Option<Arc<dyn AnalyticsProvider>>,
}

impl ServiceBuilder {
    /// User-level configuration. Repository config is layered on at open.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Credential store. Defaults to the configured provider.
    pub fn secret_store(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Analytics provider. Defaults to [`SummaryProvider`].
    pub fn analytics_provider(mut self, provider: Arc<dyn AnalyticsProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn build(self) -> Result<RepositoryService, ServiceError> {
        let config = self.config.unwrap_or_default();
        let store = match self.store {
            Some(store) => store,
            None => secrets::create_store(config.secrets_provider())?,
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(SummaryProvider));

        let analytics = AnalyticsCache::new(provider, Arc::clone(&clock), config.analytics_ttl())
            .map_err(ServiceError::Runtime)?;

        Ok(RepositoryService {
            resolver: Arc::new(StoreResolver::new(Arc::clone(&store))),
            scanner: SecretScanner::new()?,
            monitor: Mutex::new(MonitorSchedule::from_config(&config)),
            store,
            analytics,
            config,
            repo: Mutex::new(None),
            state: RwLock::new(RepoState::default()),
            events: EventBus::default(),
            generation: AtomicU64::new(0),
            remote_gate: Mutex::new(()),
        })
    }
}

/// Facade over one repository at a time.
pub struct RepositoryService {
    config: Config,
    store: Arc<dyn SecretStore>,
    resolver: Arc<dyn CredentialResolver>,
    scanner: SecretScanner,
    analytics: AnalyticsCache,
    repo: Mutex<Option<OpenRepo>>,
    state: RwLock<RepoState>,
    events: EventBus,
    generation: AtomicU64,
    remote_gate: Mutex<()>,
    monitor: Mutex<MonitorSchedule>,
}

impl std::fmt::Debug for RepositoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryService")
            .field("repo", &self.current_repo())
            .field("generation", &self.generation())
            .finish()
    }
}

impl RepositoryService {
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::default()
    }

    // =========================================================================
    // Locking helpers
    // =========================================================================

    pub(crate) fn lock_repo(&self) -> MutexGuard<'_, Option<OpenRepo>> {
        self.repo.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn read_state(&self) -> std::sync::RwLockReadGuard<'_, RepoState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, RepoState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` against the open repository.
    pub(crate) fn with_repo<T>(
        &self,
        f: impl FnOnce(&mut OpenRepo) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut guard = self.lock_repo();
        let open = guard.as_mut().ok_or(ServiceError::NotOpen)?;
        f(open)
    }

    /// Emit the completion report for `op` and pass the result through.
    pub(crate) fn finish<T>(
        &self,
        op: Operation,
        result: Result<T, ServiceError>,
        success: impl FnOnce(&T) -> String,
    ) -> Result<T, ServiceError> {
        match &result {
            Ok(value) => {
                let message = success(value);
                tracing::info!(operation = %op, "{message}");
                self.events.report(op, true, message);
            }
            Err(e) => {
                tracing::warn!(operation = %op, error = %e, "operation failed");
                self.events.report(op, false, e.to_string());
            }
        }
        result
    }

    pub(crate) fn emit(&self, event: ServiceEvent) {
        self.events.emit(event);
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open the repository containing `path`.
    ///
    /// Any previously open repository is closed first. On success state is
    /// refreshed and analytics recomputed.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<PathBuf, ServiceError> {
        let path = path.as_ref();
        let op = Operation::OpenRepository;
        let result = self.replace_handle(op, || Git::open(path), |_| Ok(()));
        if result.is_ok() {
            self.compute_analytics(true).ok();
        }
        self.finish(op, result, |root| format!("opened {}", root.display()))
    }

    /// Create a repository at `path` (creating the directory if needed) and
    /// install the pre-commit hook.
    pub fn init(&self, path: impl AsRef<Path>) -> Result<PathBuf, ServiceError> {
        let path = path.as_ref();
        let op = Operation::InitRepository;
        let result = self.replace_handle(
            op,
            || Git::init(path),
            |paths| hook::install(paths).map(|_| ()).map_err(ServiceError::from),
        );
        self.finish(op, result, |root| format!("initialized {}", root.display()))
    }

    /// Clone `url` into `path`.
    ///
    /// A non-empty `token` is saved to the credential store before cloning
    /// and resolved from there by the transport.
    pub fn clone(
        &self,
        url: &str,
        path: impl AsRef<Path>,
        token: Option<&str>,
    ) -> Result<PathBuf, ServiceError> {
        let path = path.as_ref();
        let op = Operation::CloneRepository;
        tracing::info!(url = %redact_url(url), path = %path.display(), "cloning");

        let result = self
            .store_token(token)
            .and_then(|()| {
                self.replace_handle(op, || Git::clone(url, path, self.resolver.as_ref()), |_| Ok(()))
            });
        self.finish(op, result, |root| format!("cloned into {}", root.display()))
    }

    fn store_token(&self, token: Option<&str>) -> Result<(), ServiceError> {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => Ok(self
                .store
                .set(crate::git::auth::CREDENTIAL_SERVICE, crate::git::auth::TOKEN_KEY, token)?),
            None => Ok(()),
        }
    }

    /// Close the current handle, build a new one, and refresh.
    ///
    /// `setup` runs after the handle exists but before it is published; a
    /// failure there leaves the service closed.
    fn replace_handle(
        &self,
        op: Operation,
        make: impl FnOnce() -> Result<Git, GitError>,
        setup: impl FnOnce(&RepoPaths) -> Result<(), ServiceError>,
    ) -> Result<PathBuf, ServiceError> {
        let mut guard = self.lock_repo();
        self.close_locked(&mut guard);

        let git = make().map_err(ServiceError::git(op))?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut open = OpenRepo::new(git, &self.config, generation);
        setup(&open.paths)?;
        self.apply_config(&open.config);

        let root = open.paths.root().to_path_buf();
        self.write_state().path = Some(root.clone());
        if let Err(e) = self.refresh_locked(&mut open) {
            tracing::warn!(error = %e, "initial refresh failed");
        }
        *guard = Some(open);
        drop(guard);

        self.emit(ServiceEvent::RepositoryChanged {
            path: Some(root.clone()),
        });
        Ok(root)
    }

    /// Release the handle and clear all derived state.
    pub fn close(&self) {
        let mut guard = self.lock_repo();
        let was_open = self.close_locked(&mut guard);
        drop(guard);

        let message = if was_open {
            "repository closed"
        } else {
            "no repository was open"
        };
        self.events.report(Operation::CloseRepository, true, message);
    }

    fn close_locked(&self, guard: &mut MutexGuard<'_, Option<OpenRepo>>) -> bool {
        let Some(open) = guard.take() else {
            return false;
        };
        drop(open);

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.analytics.invalidate();
        self.apply_config(&self.config);
        *self.write_state() = RepoState::default();
        tracing::info!(generation, "repository closed");

        self.emit(ServiceEvent::Invalidated { generation });
        self.emit(ServiceEvent::RepositoryChanged { path: None });
        true
    }

    /// Point the analytics TTL and monitor intervals at `config`.
    fn apply_config(&self, config: &Config) {
        self.analytics.set_ttl(config.analytics_ttl());
        self.schedule().apply_config(config);
    }

    /// Handle generation. Changes whenever the handle is closed or replaced.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Recompute branch, commits, status and ahead/behind.
    pub fn refresh(&self) -> Result<(), ServiceError> {
        let op = Operation::Refresh;
        let result = self.with_repo(|open| self.refresh_locked(open).map_err(ServiceError::git(op)));
        self.finish(op, result, |_| "refreshed".to_string())
    }

    pub(crate) fn refresh_locked(&self, open: &mut OpenRepo) -> Result<(), GitError> {
        let git = &open.git;
        let branch = git.current_branch()?;
        let commits = git.history(open.config.recent_limit(), open.verifier.as_ref())?;
        let branches = git.branches()?;
        let snapshot = StatusSnapshot::from_entries(git.status_entries()?);
        let (ahead, behind) = match &branch {
            Some(name) => git.ahead_behind(name, open.config.remote())?,
            None => (0, 0),
        };
        let head = git.head_oid()?;

        open.fingerprint = Some(Fingerprint::compute(
            head.as_ref(),
            branch.as_deref(),
            &snapshot.flag_pairs(),
        ));
        open.clean = Some(snapshot.clean);

        let mut events = Vec::new();
        {
            let mut state = self.write_state();
            if state.current_branch != branch {
                events.push(ServiceEvent::CurrentBranchChanged {
                    branch: branch.clone(),
                });
            }
            if state.has_changes == snapshot.clean {
                events.push(ServiceEvent::StatusChanged {
                    has_changes: !snapshot.clean,
                });
            }
            let old_ids = state.recent_commits.iter().map(|c| &c.id);
            if !old_ids.eq(commits.iter().map(|c| &c.id)) {
                events.push(ServiceEvent::CommitsChanged);
            }

            state.path = Some(open.paths.root().to_path_buf());
            state.current_branch = branch;
            state.has_changes = !snapshot.clean;
            state.modified_files = snapshot.modified_paths();
            state.recent_commits = commits;
            state.branches = branches;
            state.ahead = ahead;
            state.behind = behind;
        }

        for event in events {
            self.emit(event);
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn subscribe(&self) -> crossbeam_channel::Receiver<ServiceEvent> {
        self.events.subscribe()
    }

    /// A copy of the derived state.
    pub fn state(&self) -> RepoState {
        self.read_state().clone()
    }

    pub fn is_open(&self) -> bool {
        self.lock_repo().is_some()
    }

    pub fn current_repo(&self) -> Option<PathBuf> {
        self.read_state().path.clone()
    }

    pub fn current_branch(&self) -> Option<String> {
        self.read_state().current_branch.clone()
    }

    pub fn has_changes(&self) -> bool {
        self.read_state().has_changes
    }

    pub fn modified_files(&self) -> Vec<String> {
        self.read_state().modified_files.clone()
    }

    pub fn recent_commits(&self) -> Vec<CommitRecord> {
        self.read_state().recent_commits.clone()
    }

    pub fn ahead(&self) -> usize {
        self.read_state().ahead
    }

    pub fn behind(&self) -> usize {
        self.read_state().behind
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    fn analytics_input(&self) -> AnalyticsInput {
        let state = self.read_state();
        AnalyticsInput {
            repo_path: state.path.clone().unwrap_or_default(),
            current_branch: state.current_branch.clone(),
            recent_commits: state.recent_commits.clone(),
            branches: state.branches.clone(),
            ahead: state.ahead,
            behind: state.behind,
        }
    }

    /// Request an analytics computation from cached state.
    ///
    /// Never touches the repository handle.
    pub fn compute_analytics(&self, force: bool) -> Result<ComputeOutcome, ServiceError> {
        if self.current_repo().is_none() {
            return Err(ServiceError::NotOpen);
        }
        Ok(self.analytics.compute(self.analytics_input(), force))
    }

    /// Publish any finished computation and return the current view.
    pub fn analytics(&self) -> AnalyticsView {
        self.publish_analytics();
        self.analytics.snapshot()
    }

    /// Block until no analytics worker is running, up to `timeout`.
    pub fn wait_for_analytics(&self, timeout: std::time::Duration) -> bool {
        let idle = self.analytics.wait_idle(timeout);
        self.publish_analytics();
        idle
    }

    pub(crate) fn publish_analytics(&self) {
        if self.analytics.poll() {
            self.emit(ServiceEvent::AnalyticsReady);
        }
    }

    // =========================================================================
    // Credentials and hooks
    // =========================================================================

    /// Persist remote credentials through the credential store.
    ///
    /// Works with or without an open repository.
    pub fn configure_remote_auth(
        &self,
        token: &str,
        username: Option<&str>,
    ) -> Result<(), ServiceError> {
        use crate::git::auth::{CREDENTIAL_SERVICE, TOKEN_KEY, USERNAME_KEY};

        let result = (|| -> Result<(), ServiceError> {
            self.store.set(CREDENTIAL_SERVICE, TOKEN_KEY, token)?;
            match username.filter(|u| !u.is_empty()) {
                Some(user) => self.store.set(CREDENTIAL_SERVICE, USERNAME_KEY, user)?,
                None => self.store.delete(CREDENTIAL_SERVICE, USERNAME_KEY)?,
            }
            Ok(())
        })();
        self.finish(Operation::ConfigureRemoteAuth, result, |_| {
            "remote credentials saved".to_string()
        })
    }

    /// (Re)install the pre-commit hook in the open repository.
    pub fn install_hook(&self) -> Result<PathBuf, ServiceError> {
        let result = self.with_repo(|open| Ok(hook::install(&open.paths)?));
        self.finish(Operation::InstallHook, result, |path| {
            format!("installed {}", path.display())
        })
    }
}
