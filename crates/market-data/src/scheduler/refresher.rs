//! Self-scheduling refresh loop.
//!
//! [`ScheduledRefresher`] runs a [`RefreshAction`] once immediately on
//! [`start`](ScheduledRefresher::start), then once per `period` until its
//! cancellation token fires. Every attempt goes through the shared
//! [`Throttle`]; a closed throttle skips the attempt instead of waiting.
//!
//! ```text
//!   Idle --start()--> Running --cancel / shutdown()--> Cancelled
//! ```
//!
//! Attempts never overlap: the next wait only begins after the action has
//! returned. Errors and panics from the action are logged and absorbed.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::throttle::Throttle;
use crate::errors::MarketDataError;

/// Default refresh cadence.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(10 * 60);

/// The work a [`ScheduledRefresher`] drives.
///
/// Implementations own their failure handling: call
/// [`Throttle::back_off`] when the remote side signals trouble. A returned
/// error is only logged by the scheduler.
#[async_trait]
pub trait RefreshAction: Send + Sync {
    async fn refresh(&self) -> Result<(), MarketDataError>;
}

/// Refresher lifecycle state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RefresherState {
    /// Constructed, not started.
    Idle,
    /// Loop is live.
    Running,
    /// Terminal. No further attempts will be made.
    Cancelled,
}

impl std::fmt::Display for RefresherState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

struct Inner {
    name: String,
    action: Arc<dyn RefreshAction>,
    period: Duration,
    throttle: Arc<Throttle>,
    cancel: CancellationToken,
    state: Mutex<RefresherState>,
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, RefresherState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Refresher state mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn set_state(&self, state: RefresherState) {
        *self.lock_state() = state;
    }

    /// One throttle-gated run of the action.
    async fn attempt(&self) {
        if self.cancel.is_cancelled() {
            return;
        }

        if !self.throttle.try_consume() {
            debug!("Refresher '{}': throttled, skipping cycle", self.name);
            return;
        }

        match AssertUnwindSafe(self.action.refresh()).catch_unwind().await {
            Ok(Ok(())) => debug!("Refresher '{}': cycle complete", self.name),
            Ok(Err(e)) => warn!("Refresher '{}': cycle failed: {}", self.name, e),
            Err(_) => error!("Refresher '{}': refresh action panicked", self.name),
        }
    }

    async fn run_loop(&self) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.period) => {}
            }
            self.attempt().await;
        }

        self.set_state(RefresherState::Cancelled);
        info!("Refresher '{}' stopped", self.name);
    }
}

/// Periodic, throttle-gated, single-flight driver for a [`RefreshAction`].
pub struct ScheduledRefresher {
    inner: Arc<Inner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ScheduledRefresher {
    /// Create an idle refresher.
    ///
    /// The refresher listens on a child of `cancel`: cancelling the parent
    /// stops it, while [`shutdown`](Self::shutdown) stops only this refresher.
    pub fn new(
        name: impl Into<String>,
        action: Arc<dyn RefreshAction>,
        period: Duration,
        throttle: Arc<Throttle>,
        cancel: &CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                action,
                period,
                throttle,
                cancel: cancel.child_token(),
                state: Mutex::new(RefresherState::Idle),
            }),
            task: Mutex::new(None),
        }
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| {
            warn!("Refresher task mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Start the loop.
    ///
    /// The first attempt and the periodic loop both run on a background task;
    /// this returns once the first attempt has finished. Dropping the returned
    /// future early leaves the loop running. Must be called from within a
    /// Tokio runtime.
    pub async fn start(&self) -> Result<(), MarketDataError> {
        {
            let mut state = self.inner.lock_state();
            if *state != RefresherState::Idle {
                return Err(MarketDataError::AlreadyStarted);
            }
            *state = RefresherState::Running;
        }

        info!(
            "Refresher '{}' started (period {:?})",
            self.inner.name, self.inner.period
        );
        let (first_done, first_done_rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            inner.attempt().await;
            let _ = first_done.send(());
            inner.run_loop().await
        });
        *self.lock_task() = Some(handle);

        // Err only if the task died before reporting; shutdown() surfaces that.
        let _ = first_done_rx.await;
        Ok(())
    }

    /// Cancel the loop and wait for the background task to finish.
    ///
    /// An in-flight action is allowed to complete first.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let handle = self.lock_task().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Refresher '{}' task failed: {}", self.inner.name, e);
            }
        }
        self.inner.set_state(RefresherState::Cancelled);
    }

    pub fn state(&self) -> RefresherState {
        *self.inner.lock_state()
    }

    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.inner.throttle
    }

    pub fn period(&self) -> Duration {
        self.inner.period
    }
}

impl Drop for ScheduledRefresher {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts invocations; optionally sleeps, fails, or panics on the first call.
    #[derive(Default)]
    struct CountingAction {
        started: AtomicUsize,
        finished: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        busy_for: Duration,
        fail: bool,
        panic_once: AtomicBool,
    }

    #[async_trait]
    impl RefreshAction for CountingAction {
        async fn refresh(&self) -> Result<(), MarketDataError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

            if self.panic_once.swap(false, Ordering::SeqCst) {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                panic!("boom");
            }
            if !self.busy_for.is_zero() {
                tokio::time::sleep(self.busy_for).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MarketDataError::HttpStatus {
                    provider: "TEST".to_string(),
                    status: 500,
                });
            }
            Ok(())
        }
    }

    fn open_throttle() -> Arc<Throttle> {
        Arc::new(Throttle::new(Duration::ZERO, Duration::ZERO))
    }

    fn refresher(
        action: Arc<CountingAction>,
        period_secs: u64,
        throttle: Arc<Throttle>,
        cancel: &CancellationToken,
    ) -> ScheduledRefresher {
        ScheduledRefresher::new(
            "test",
            action,
            Duration::from_secs(period_secs),
            throttle,
            cancel,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_runs_immediately() {
        let action = Arc::new(CountingAction::default());
        let cancel = CancellationToken::new();
        let refresher = refresher(action.clone(), 600, open_throttle(), &cancel);

        assert_eq!(refresher.state(), RefresherState::Idle);
        refresher.start().await.unwrap();

        assert_eq!(action.finished.load(Ordering::SeqCst), 1);
        assert_eq!(refresher.state(), RefresherState::Running);
        refresher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_once_per_period() {
        let action = Arc::new(CountingAction::default());
        let cancel = CancellationToken::new();
        let refresher = refresher(action.clone(), 60, open_throttle(), &cancel);

        refresher.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(150)).await;

        // t=0, t=60, t=120
        assert_eq!(action.finished.load(Ordering::SeqCst), 3);
        refresher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_throttle_skips_cycle() {
        let action = Arc::new(CountingAction::default());
        let cancel = CancellationToken::new();
        let throttle = Arc::new(Throttle::new(
            Duration::from_secs(100),
            Duration::from_secs(100),
        ));
        let refresher = refresher(action.clone(), 60, throttle, &cancel);

        refresher.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(250)).await;

        // t=0 runs, t=60 skipped, t=120 runs, t=180 skipped, t=240 runs
        assert_eq!(action.finished.load(Ordering::SeqCst), 3);
        refresher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_action_never_overlaps() {
        let action = Arc::new(CountingAction {
            busy_for: Duration::from_secs(90),
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        let refresher = refresher(action.clone(), 60, open_throttle(), &cancel);

        refresher.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(500)).await;

        // Starts at t=0, 150, 300, 450; each waits for the previous to finish.
        assert_eq!(action.started.load(Ordering::SeqCst), 4);
        assert_eq!(action.max_in_flight.load(Ordering::SeqCst), 1);
        refresher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_action_keeps_loop_alive() {
        let action = Arc::new(CountingAction {
            fail: true,
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        let refresher = refresher(action.clone(), 60, open_throttle(), &cancel);

        refresher.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(130)).await;

        assert_eq!(action.finished.load(Ordering::SeqCst), 3);
        assert_eq!(refresher.state(), RefresherState::Running);
        refresher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_action_keeps_loop_alive() {
        let action = Arc::new(CountingAction {
            panic_once: AtomicBool::new(true),
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        let refresher = refresher(action.clone(), 60, open_throttle(), &cancel);

        refresher.start().await.unwrap();
        assert_eq!(action.finished.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(70)).await;
        assert_eq!(action.finished.load(Ordering::SeqCst), 1);
        refresher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_stops_loop() {
        let action = Arc::new(CountingAction::default());
        let cancel = CancellationToken::new();
        let refresher = refresher(action.clone(), 60, open_throttle(), &cancel);

        refresher.start().await.unwrap();
        cancel.cancel();
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(action.finished.load(Ordering::SeqCst), 1);
        assert_eq!(refresher.state(), RefresherState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_leaves_parent_token_alone() {
        let action = Arc::new(CountingAction::default());
        let cancel = CancellationToken::new();
        let refresher = refresher(action.clone(), 60, open_throttle(), &cancel);

        refresher.start().await.unwrap();
        refresher.shutdown().await;

        assert_eq!(refresher.state(), RefresherState::Cancelled);
        assert!(!cancel.is_cancelled());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(action.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start_runs_nothing() {
        let action = Arc::new(CountingAction::default());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let refresher = refresher(action.clone(), 60, open_throttle(), &cancel);

        refresher.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(action.started.load(Ordering::SeqCst), 0);
        assert_eq!(refresher.state(), RefresherState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_rejected() {
        let action = Arc::new(CountingAction::default());
        let cancel = CancellationToken::new();
        let refresher = refresher(action, 60, open_throttle(), &cancel);

        refresher.start().await.unwrap();
        let err = refresher.start().await.unwrap_err();
        assert!(matches!(err, MarketDataError::AlreadyStarted));
        refresher.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_start_keeps_loop_running() {
        let action = Arc::new(CountingAction {
            busy_for: Duration::from_secs(90),
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        let refresher = refresher(action.clone(), 60, open_throttle(), &cancel);

        // Give up on start() while the first attempt is still busy.
        let started = tokio::time::timeout(Duration::from_secs(10), refresher.start()).await;
        assert!(started.is_err());
        assert_eq!(refresher.state(), RefresherState::Running);

        // First attempt finishes at t=90, the next one starts at t=150.
        tokio::time::sleep(Duration::from_secs(200)).await;
        assert_eq!(action.started.load(Ordering::SeqCst), 2);
        assert_eq!(action.finished.load(Ordering::SeqCst), 1);

        refresher.shutdown().await;
        assert_eq!(refresher.state(), RefresherState::Cancelled);
    }
}
