//! analytics::cache
//!
//! The analytics snapshot and its worker.
//!
//! # Lifecycle
//!
//! ```text
//! compute() -> worker task on the owned runtime -> oneshot -> poll() publishes
//! ```
//!
//! Only the cache writes the snapshot. Workers hand their result back
//! through a `tokio::sync::oneshot` channel and the owner stamps it with its
//! clock when [`AnalyticsCache::poll`] picks it up.
//!
//! # Invariants
//!
//! - At most one worker in flight
//! - A snapshot younger than the TTL is not recomputed unless forced
//! - A failed or cancelled computation leaves the previous snapshot intact
//! - A result from before [`AnalyticsCache::invalidate`] is never published
//! - A forced request that arrives while a worker runs is queued and starts
//!   as soon as that worker's result is picked up
//!
//! Dropping the cache shuts its runtime down in the background, so a host
//! may drop it from inside its own async context.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;

use super::{AnalyticsError, AnalyticsInput, AnalyticsProvider, AnalyticsSnapshot, CancelFlag, Metrics};
use crate::core::clock::Clock;

/// What [`AnalyticsCache::compute`] decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeOutcome {
    /// Snapshot is fresh and the request was not forced.
    Skipped,
    /// A worker was started.
    Started,
    /// A worker is already running; nothing new was started.
    InFlight,
    /// A worker is running; a forced rerun starts once it finishes.
    Queued,
}

/// What a reader sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalyticsView {
    NotComputed,
    Ready {
        snapshot: AnalyticsSnapshot,
        /// Seconds since `computed_at`.
        #[serde(serialize_with = "serialize_age")]
        age: chrono::Duration,
        stale: bool,
    },
}

fn serialize_age<S: serde::Serializer>(age: &chrono::Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(age.num_seconds())
}

struct Pending {
    generation: u64,
    cancel: CancelFlag,
    receiver: oneshot::Receiver<Result<Metrics, AnalyticsError>>,
}

struct CacheState {
    snapshot: Option<AnalyticsSnapshot>,
    pending: Option<Pending>,
    /// Latest forced request received while `pending` was running.
    rerun: Option<AnalyticsInput>,
    generation: u64,
    ttl: chrono::Duration,
}

pub struct AnalyticsCache {
    /// `None` only while dropping.
    runtime: Option<tokio::runtime::Runtime>,
    provider: Arc<dyn AnalyticsProvider>,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState>,
}

impl std::fmt::Debug for AnalyticsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsCache")
            .field("provider", &self.provider.name())
            .field("ttl", &self.state().ttl)
            .finish()
    }
}

impl Drop for AnalyticsCache {
    fn drop(&mut self) {
        self.invalidate();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn ttl_from(ttl: Duration) -> chrono::Duration {
    chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365 * 100))
}

impl AnalyticsCache {
    /// Build a cache with its own worker runtime.
    ///
    /// # Errors
    ///
    /// Fails only if the runtime cannot be started.
    pub fn new(
        provider: Arc<dyn AnalyticsProvider>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("gitward-analytics")
            .enable_time()
            .build()?;

        Ok(Self {
            runtime: Some(runtime),
            provider,
            clock,
            state: Mutex::new(CacheState {
                snapshot: None,
                pending: None,
                rerun: None,
                generation: 0,
                ttl: ttl_from(ttl),
            }),
        })
    }

    /// Change the freshness window. Applies to the current snapshot too.
    pub fn set_ttl(&self, ttl: Duration) {
        self.state().ttl = ttl_from(ttl);
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_fresh(&self, state: &CacheState, computed_at: DateTime<Utc>) -> bool {
        self.clock.now() - computed_at < state.ttl
    }

    /// Start a computation unless the snapshot is still fresh.
    ///
    /// Never blocks on the computation itself.
    pub fn compute(&self, input: AnalyticsInput, force: bool) -> ComputeOutcome {
        let mut state = self.state();
        self.publish_finished(&mut state);

        if state.pending.is_some() {
            if force {
                state.rerun = Some(input);
                tracing::debug!("analytics running, forced rerun queued");
                return ComputeOutcome::Queued;
            }
            return ComputeOutcome::InFlight;
        }

        if !force {
            if let Some(snapshot) = &state.snapshot {
                if self.is_fresh(&state, snapshot.computed_at) {
                    tracing::debug!("analytics fresh, skipping");
                    return ComputeOutcome::Skipped;
                }
            }
        }

        if !self.spawn(&mut state, input) {
            return ComputeOutcome::Skipped;
        }
        tracing::debug!(provider = self.provider.name(), force, "analytics started");
        ComputeOutcome::Started
    }

    /// Start a worker for `input`. False once the runtime is gone.
    fn spawn(&self, state: &mut CacheState, input: AnalyticsInput) -> bool {
        let Some(runtime) = self.runtime.as_ref() else {
            return false;
        };

        let (sender, receiver) = oneshot::channel();
        let cancel = CancelFlag::new();
        let provider = Arc::clone(&self.provider);
        let worker_cancel = cancel.clone();

        runtime.spawn(async move {
            let result = provider.compute(&input, &worker_cancel).await;
            // The receiver is gone if the cache was invalidated meanwhile.
            let _ = sender.send(result);
        });

        state.pending = Some(Pending {
            generation: state.generation,
            cancel,
            receiver,
        });
        true
    }

    /// Publish a finished result, if any. Returns true if the snapshot changed.
    pub fn poll(&self) -> bool {
        let mut state = self.state();
        self.publish_finished(&mut state)
    }

    fn publish_finished(&self, state: &mut CacheState) -> bool {
        let Some(mut pending) = state.pending.take() else {
            return false;
        };

        let result = match pending.receiver.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => {
                state.pending = Some(pending);
                return false;
            }
            Err(oneshot::error::TryRecvError::Closed) => Err(AnalyticsError::WorkerLost),
        };

        let published = if pending.generation != state.generation || pending.cancel.is_cancelled() {
            false
        } else {
            match result {
                Ok(metrics) => {
                    state.snapshot = Some(AnalyticsSnapshot {
                        metrics,
                        computed_at: self.clock.now(),
                    });
                    tracing::debug!("analytics published");
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "analytics failed, keeping previous snapshot");
                    false
                }
            }
        };

        if let Some(input) = state.rerun.take() {
            if self.spawn(state, input) {
                tracing::debug!(provider = self.provider.name(), "queued analytics started");
            }
        }
        published
    }

    /// The current snapshot with its age. Never blocks on a worker.
    pub fn snapshot(&self) -> AnalyticsView {
        let state = self.state();
        match &state.snapshot {
            None => AnalyticsView::NotComputed,
            Some(snapshot) => {
                let age = self.clock.now() - snapshot.computed_at;
                AnalyticsView::Ready {
                    snapshot: snapshot.clone(),
                    age,
                    stale: age >= state.ttl,
                }
            }
        }
    }

    /// Whether a worker is running.
    pub fn in_flight(&self) -> bool {
        self.state().pending.is_some()
    }

    /// Drop the snapshot and abandon any running worker.
    pub fn invalidate(&self) {
        let mut state = self.state();
        if let Some(pending) = state.pending.take() {
            pending.cancel.cancel();
        }
        state.rerun = None;
        state.snapshot = None;
        state.generation += 1;
    }

    /// Poll until no worker is in flight or `timeout` passes.
    ///
    /// Returns true if the cache went idle. For callers with nothing better
    /// to do, such as a one-shot command.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.poll();
            if !self.in_flight() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and reports the count as its only metric.
    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl AnalyticsProvider for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn compute(
            &self,
            _input: &AnalyticsInput,
            cancel: &CancelFlag,
        ) -> Result<Metrics, AnalyticsError> {
            cancel.check()?;
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let mut m = Metrics::new();
            m.insert("calls".into(), serde_json::json!(n));
            Ok(m)
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl AnalyticsProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn compute(
            &self,
            _input: &AnalyticsInput,
            _cancel: &CancelFlag,
        ) -> Result<Metrics, AnalyticsError> {
            Err(AnalyticsError::Failed {
                provider: "failing".into(),
                message: "boom".into(),
            })
        }
    }

    /// Waits until cancelled.
    struct Blocking;

    #[async_trait::async_trait]
    impl AnalyticsProvider for Blocking {
        fn name(&self) -> &str {
            "blocking"
        }

        async fn compute(
            &self,
            _input: &AnalyticsInput,
            cancel: &CancelFlag,
        ) -> Result<Metrics, AnalyticsError> {
            while !cancel.is_cancelled() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            Err(AnalyticsError::Cancelled)
        }
    }

    /// Holds every call until the gate opens, then counts it.
    #[derive(Default)]
    struct Gated {
        open: std::sync::atomic::AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl AnalyticsProvider for Gated {
        fn name(&self) -> &str {
            "gated"
        }

        async fn compute(
            &self,
            _input: &AnalyticsInput,
            cancel: &CancelFlag,
        ) -> Result<Metrics, AnalyticsError> {
            while !self.open.load(Ordering::SeqCst) {
                cancel.check()?;
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let mut m = Metrics::new();
            m.insert("calls".into(), serde_json::json!(n));
            Ok(m)
        }
    }

    const TTL: Duration = Duration::from_secs(300);
    const WAIT: Duration = Duration::from_secs(10);

    fn cache_with(provider: Arc<dyn AnalyticsProvider>, clock: &ManualClock) -> AnalyticsCache {
        AnalyticsCache::new(provider, Arc::new(clock.clone()), TTL).expect("runtime")
    }

    fn computed_at(cache: &AnalyticsCache) -> DateTime<Utc> {
        match cache.snapshot() {
            AnalyticsView::Ready { snapshot, .. } => snapshot.computed_at,
            AnalyticsView::NotComputed => panic!("expected a snapshot"),
        }
    }

    #[test]
    fn starts_not_computed() {
        let clock = ManualClock::new();
        let cache = cache_with(Arc::new(Counting::default()), &clock);
        assert_eq!(cache.snapshot(), AnalyticsView::NotComputed);
    }

    #[test]
    fn publishes_after_poll() {
        let clock = ManualClock::new();
        let cache = cache_with(Arc::new(Counting::default()), &clock);

        assert_eq!(cache.compute(AnalyticsInput::default(), false), ComputeOutcome::Started);
        assert!(cache.wait_idle(WAIT));

        match cache.snapshot() {
            AnalyticsView::Ready { snapshot, stale, .. } => {
                assert_eq!(snapshot.metrics["calls"], serde_json::json!(1));
                assert_eq!(snapshot.computed_at, clock.now());
                assert!(!stale);
            }
            AnalyticsView::NotComputed => panic!("expected a snapshot"),
        }
    }

    #[test]
    fn fresh_snapshot_is_not_recomputed() {
        let clock = ManualClock::new();
        let cache = cache_with(Arc::new(Counting::default()), &clock);
        cache.compute(AnalyticsInput::default(), false);
        assert!(cache.wait_idle(WAIT));
        let first = computed_at(&cache);

        clock.advance(chrono::Duration::seconds(100));
        assert_eq!(cache.compute(AnalyticsInput::default(), false), ComputeOutcome::Skipped);
        assert_eq!(computed_at(&cache), first);
    }

    #[test]
    fn force_recomputes_within_ttl() {
        let clock = ManualClock::new();
        let cache = cache_with(Arc::new(Counting::default()), &clock);
        cache.compute(AnalyticsInput::default(), false);
        assert!(cache.wait_idle(WAIT));
        let first = computed_at(&cache);

        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(cache.compute(AnalyticsInput::default(), true), ComputeOutcome::Started);
        assert!(cache.wait_idle(WAIT));
        assert!(computed_at(&cache) > first);
    }

    #[test]
    fn expired_snapshot_recomputes_and_reports_stale() {
        let clock = ManualClock::new();
        let cache = cache_with(Arc::new(Counting::default()), &clock);
        cache.compute(AnalyticsInput::default(), false);
        assert!(cache.wait_idle(WAIT));
        let first = computed_at(&cache);

        clock.advance(chrono::Duration::seconds(301));
        assert!(matches!(cache.snapshot(), AnalyticsView::Ready { stale: true, .. }));

        assert_eq!(cache.compute(AnalyticsInput::default(), false), ComputeOutcome::Started);
        assert!(cache.wait_idle(WAIT));
        assert!(computed_at(&cache) > first);
    }

    #[test]
    fn failure_keeps_previous_snapshot() {
        let clock = ManualClock::new();
        let cache = cache_with(Arc::new(Failing), &clock);
        cache.compute(AnalyticsInput::default(), true);
        assert!(cache.wait_idle(WAIT));
        assert_eq!(cache.snapshot(), AnalyticsView::NotComputed);
    }

    #[test]
    fn second_compute_while_running_is_in_flight() {
        let clock = ManualClock::new();
        let cache = cache_with(Arc::new(Blocking), &clock);
        assert_eq!(cache.compute(AnalyticsInput::default(), true), ComputeOutcome::Started);
        assert_eq!(cache.compute(AnalyticsInput::default(), false), ComputeOutcome::InFlight);
        assert_eq!(cache.compute(AnalyticsInput::default(), true), ComputeOutcome::Queued);
        cache.invalidate();
        assert!(!cache.in_flight());
        assert!(cache.wait_idle(WAIT));
        assert_eq!(cache.snapshot(), AnalyticsView::NotComputed);
    }

    #[test]
    fn forced_request_during_run_is_rerun() {
        let clock = ManualClock::new();
        let gated = Arc::new(Gated::default());
        let cache = cache_with(gated.clone(), &clock);

        assert_eq!(cache.compute(AnalyticsInput::default(), true), ComputeOutcome::Started);
        let newer = AnalyticsInput {
            ahead: 3,
            ..AnalyticsInput::default()
        };
        assert_eq!(cache.compute(newer, true), ComputeOutcome::Queued);

        gated.open.store(true, Ordering::SeqCst);
        assert!(cache.wait_idle(WAIT));

        assert_eq!(gated.calls.load(Ordering::SeqCst), 2);
        match cache.snapshot() {
            AnalyticsView::Ready { snapshot, .. } => {
                assert_eq!(snapshot.metrics["calls"], serde_json::json!(2));
            }
            AnalyticsView::NotComputed => panic!("expected a snapshot"),
        }
    }

    #[test]
    fn set_ttl_changes_freshness() {
        let clock = ManualClock::new();
        let cache = cache_with(Arc::new(Counting::default()), &clock);
        cache.compute(AnalyticsInput::default(), false);
        assert!(cache.wait_idle(WAIT));

        cache.set_ttl(Duration::from_secs(1));
        clock.advance(chrono::Duration::seconds(5));
        assert!(matches!(cache.snapshot(), AnalyticsView::Ready { stale: true, .. }));
        assert_eq!(cache.compute(AnalyticsInput::default(), false), ComputeOutcome::Started);
        assert!(cache.wait_idle(WAIT));
    }

    #[tokio::test]
    async fn drop_inside_async_context() {
        let clock = ManualClock::new();
        let cache = cache_with(Arc::new(Blocking), &clock);
        assert_eq!(cache.compute(AnalyticsInput::default(), true), ComputeOutcome::Started);
        drop(cache);
    }

    #[test]
    fn invalidate_drops_snapshot() {
        let clock = ManualClock::new();
        let cache = cache_with(Arc::new(Counting::default()), &clock);
        cache.compute(AnalyticsInput::default(), false);
        assert!(cache.wait_idle(WAIT));

        cache.invalidate();
        assert_eq!(cache.snapshot(), AnalyticsView::NotComputed);
        assert_eq!(cache.compute(AnalyticsInput::default(), false), ComputeOutcome::Started);
    }

    #[test]
    fn view_serializes_age_in_seconds() {
        let clock = ManualClock::new();
        let cache = cache_with(Arc::new(Counting::default()), &clock);
        cache.compute(AnalyticsInput::default(), false);
        assert!(cache.wait_idle(WAIT));
        clock.advance(chrono::Duration::seconds(42));

        let json = serde_json::to_value(cache.snapshot()).unwrap();
        assert_eq!(json["state"], "ready");
        assert_eq!(json["age"], 42);
        assert_eq!(json["stale"], false);
    }
}
