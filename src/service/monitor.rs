//! service::monitor
//!
//! Externally driven polling.
//!
//! The service owns no timer. A driver (the `watch` command, a UI event
//! loop, a test) calls [`RepositoryService::tick`] with the current instant
//! and the [`MonitorSchedule`] decides what is due:
//!
//! - **poll** (every `monitor.poll_interval_secs`, default 2): has the
//!   working tree flipped between clean and dirty?
//! - **monitor** (every `monitor.monitor_interval_secs`, default 30):
//!   fingerprint comparison with a full refresh on drift, a non-forced
//!   analytics request, and publication of finished analytics
//!
//! Ticks never wait for the handle. If an operation holds it, the tick
//! returns [`TickOutcome::Skipped`] and the activity stays due.

use std::sync::TryLockError;
use std::time::{Duration, Instant};

use super::{RepositoryService, ServiceError};
use crate::core::config::Config;
use crate::core::model::StatusSnapshot;
use crate::core::types::Fingerprint;

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Monitoring is not started.
    Stopped,
    /// Nothing was due.
    Idle,
    /// No repository is open.
    NoRepository,
    /// The handle was busy; nothing ran.
    Skipped,
    /// A poll ran. `changed` is true on a clean/dirty flip.
    Polled { changed: bool },
    /// A monitor pass ran. `drift` is true if the fingerprint moved.
    Monitored { drift: bool },
}

/// Which activities are due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Due {
    pub poll: bool,
    pub monitor: bool,
}

/// Interval bookkeeping for [`RepositoryService::tick`].
#[derive(Debug, Clone)]
pub struct MonitorSchedule {
    poll_every: Duration,
    monitor_every: Duration,
    last_poll: Option<Instant>,
    last_monitor: Option<Instant>,
    running: bool,
}

impl MonitorSchedule {
    pub fn new(poll_every: Duration, monitor_every: Duration) -> Self {
        Self {
            poll_every,
            monitor_every,
            last_poll: None,
            last_monitor: None,
            running: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_interval(), config.monitor_interval())
    }

    /// Take intervals from `config`, keeping the running state.
    pub fn apply_config(&mut self, config: &Config) {
        self.poll_every = config.poll_interval();
        self.monitor_every = config.monitor_interval();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start counting from `now`. Nothing is due until an interval passes.
    pub fn start(&mut self, now: Instant) {
        self.running = true;
        self.last_poll = Some(now);
        self.last_monitor = Some(now);
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn due(&self, now: Instant) -> Due {
        if !self.running {
            return Due::default();
        }
        let elapsed = |last: Option<Instant>, every: Duration| {
            last.map_or(true, |t| now.saturating_duration_since(t) >= every)
        };
        Due {
            poll: elapsed(self.last_poll, self.poll_every),
            monitor: elapsed(self.last_monitor, self.monitor_every),
        }
    }

    pub fn mark_polled(&mut self, now: Instant) {
        self.last_poll = Some(now);
    }

    /// A monitor pass subsumes a poll.
    pub fn mark_monitored(&mut self, now: Instant) {
        self.last_monitor = Some(now);
        self.last_poll = Some(now);
    }
}

impl RepositoryService {
    pub(super) fn schedule(&self) -> std::sync::MutexGuard<'_, MonitorSchedule> {
        self.monitor.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn start_monitoring(&self) {
        self.schedule().start(Instant::now());
        tracing::debug!("monitoring started");
    }

    pub fn stop_monitoring(&self) {
        self.schedule().stop();
        tracing::debug!("monitoring stopped");
    }

    pub fn is_monitoring(&self) -> bool {
        self.schedule().is_running()
    }

    /// Run whatever is due at `now`.
    pub fn tick(&self, now: Instant) -> TickOutcome {
        let due = {
            let schedule = self.schedule();
            if !schedule.is_running() {
                return TickOutcome::Stopped;
            }
            schedule.due(now)
        };

        let outcome = if due.monitor {
            self.monitor_tick()
        } else if due.poll {
            self.poll_tick()
        } else {
            return TickOutcome::Idle;
        };

        match outcome {
            TickOutcome::Monitored { .. } => self.schedule().mark_monitored(now),
            TickOutcome::Polled { .. } | TickOutcome::NoRepository => {
                self.schedule().mark_polled(now)
            }
            _ => {}
        }
        outcome
    }

    /// Clean/dirty flip check. Does not wait for the handle.
    pub fn poll_tick(&self) -> TickOutcome {
        let mut guard = match self.repo.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return TickOutcome::Skipped,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
        };
        let Some(open) = guard.as_mut() else {
            return TickOutcome::NoRepository;
        };

        match self.check_for_changes(open) {
            Ok(changed) => TickOutcome::Polled { changed },
            Err(e) => {
                tracing::warn!(error = %e, "status poll failed");
                TickOutcome::Polled { changed: false }
            }
        }
    }

    /// Drift check, refresh on drift, and analytics upkeep. Does not wait
    /// for the handle.
    pub fn monitor_tick(&self) -> TickOutcome {
        let drift = {
            let mut guard = match self.repo.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::WouldBlock) => return TickOutcome::Skipped,
                Err(TryLockError::Poisoned(e)) => e.into_inner(),
            };
            let Some(open) = guard.as_mut() else {
                return TickOutcome::NoRepository;
            };

            match self.fingerprint(open) {
                Ok(current) if open.fingerprint.as_ref() == Some(&current) => false,
                Ok(_) => {
                    tracing::debug!("repository drifted, refreshing");
                    if let Err(e) = self.refresh_locked(open) {
                        tracing::warn!(error = %e, "refresh after drift failed");
                    }
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "fingerprint failed");
                    false
                }
            }
        };

        if let Err(e) = self.compute_analytics(false) {
            tracing::debug!(error = %e, "analytics not requested");
        }
        self.publish_analytics();
        TickOutcome::Monitored { drift }
    }

    fn fingerprint(&self, open: &super::OpenRepo) -> Result<Fingerprint, ServiceError> {
        let op = super::Operation::Refresh;
        let head = open.git.head_oid().map_err(ServiceError::git(op))?;
        let branch = open.git.current_branch().map_err(ServiceError::git(op))?;
        let snapshot =
            StatusSnapshot::from_entries(open.git.status_entries().map_err(ServiceError::git(op))?);
        Ok(Fingerprint::compute(
            head.as_ref(),
            branch.as_deref(),
            &snapshot.flag_pairs(),
        ))
    }
}
