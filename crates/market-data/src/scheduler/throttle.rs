//! Minimum-spacing rate limiter with explicit back-off.
//!
//! A [`Throttle`] admits one action per `min_interval`. When the remote side
//! signals trouble, [`Throttle::back_off`] pushes the next admission out by
//! `backoff_interval`. The next-allowed instant only ever moves forward.
//!
//! Time is read from `tokio::time::Instant`, so tests can drive it with
//! `tokio::time::pause()` / `advance()`.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

/// Default spacing: the provider asks for no more than 10 requests per minute.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(12);

/// Default back-off after a transport failure.
pub const DEFAULT_BACKOFF_INTERVAL: Duration = Duration::from_secs(60);

/// Throttle configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Minimum delay between two permitted actions.
    pub min_interval: Duration,
    /// Delay applied from "now" when backing off.
    pub backoff_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            backoff_interval: DEFAULT_BACKOFF_INTERVAL,
        }
    }
}

/// Rate-limiting gate shared between a scheduler and the action it drives.
///
/// Thread-safe: every read-modify-write of the next-allowed instant happens
/// under one mutex.
#[derive(Debug)]
pub struct Throttle {
    config: ThrottleConfig,
    next_allowed: Mutex<Instant>,
}

impl Throttle {
    /// Create a throttle that permits immediately.
    pub fn new(min_interval: Duration, backoff_interval: Duration) -> Self {
        Self::with_config(ThrottleConfig {
            min_interval,
            backoff_interval,
        })
    }

    /// Create a throttle from a config.
    pub fn with_config(config: ThrottleConfig) -> Self {
        Self {
            config,
            next_allowed: Mutex::new(Instant::now()),
        }
    }

    /// Lock the next-allowed instant, recovering from poison if necessary.
    ///
    /// The guarded value is a plain instant, so a panic elsewhere cannot leave
    /// it half-written.
    fn lock_next_allowed(&self) -> MutexGuard<'_, Instant> {
        self.next_allowed.lock().unwrap_or_else(|poisoned| {
            warn!("Throttle mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Try to take the next slot without waiting.
    ///
    /// Returns true and moves the window to `now + min_interval` if the
    /// window is open; otherwise returns false and changes nothing.
    pub fn try_consume(&self) -> bool {
        let now = Instant::now();
        let mut next_allowed = self.lock_next_allowed();

        if now < *next_allowed {
            debug!(
                "Throttle: closed for another {:?}",
                next_allowed.duration_since(now)
            );
            return false;
        }

        *next_allowed = now + self.config.min_interval;
        true
    }

    /// Push the window out to at least `now + backoff_interval`.
    ///
    /// A window that is already further out is left alone.
    pub fn back_off(&self) {
        let target = Instant::now() + self.config.backoff_interval;
        let mut next_allowed = self.lock_next_allowed();

        if target > *next_allowed {
            *next_allowed = target;
        }
        debug!(
            "Throttle: backing off for {:?}",
            self.config.backoff_interval
        );
    }

    /// The instant at which the next action will be permitted.
    pub fn next_allowed(&self) -> Instant {
        *self.lock_next_allowed()
    }

    /// Time left until the window opens, zero if it is open.
    pub fn time_until_allowed(&self) -> Duration {
        self.next_allowed().saturating_duration_since(Instant::now())
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::with_config(ThrottleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn throttle() -> Throttle {
        Throttle::new(Duration::from_secs(10), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_throttle_permits_once() {
        let throttle = throttle();

        assert!(throttle.try_consume());
        assert!(!throttle.try_consume());
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_reopens_after_min_interval() {
        let throttle = throttle();
        assert!(throttle.try_consume());

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(!throttle.try_consume());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(throttle.try_consume());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refused_consume_leaves_state_unchanged() {
        let throttle = throttle();
        assert!(throttle.try_consume());
        let before = throttle.next_allowed();

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(!throttle.try_consume());
        assert_eq!(throttle.next_allowed(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_off_extends_window() {
        let throttle = throttle();
        assert!(throttle.try_consume());
        throttle.back_off();

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!throttle.try_consume());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(throttle.try_consume());
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_off_never_pulls_window_in() {
        // Back-off shorter than the spacing: the later window must win.
        let throttle = Throttle::new(Duration::from_secs(60), Duration::from_secs(5));
        assert!(throttle.try_consume());
        let before = throttle.next_allowed();

        throttle.back_off();
        assert_eq!(throttle.next_allowed(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_until_allowed() {
        let throttle = throttle();
        assert_eq!(throttle.time_until_allowed(), Duration::ZERO);

        throttle.back_off();
        assert_eq!(throttle.time_until_allowed(), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(45)).await;
        assert_eq!(throttle.time_until_allowed(), Duration::from_secs(15));
    }

    #[test]
    fn test_concurrent_consumers_get_one_slot() {
        let throttle = Arc::new(throttle());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let throttle = Arc::clone(&throttle);
                std::thread::spawn(move || throttle.try_consume())
            })
            .collect();

        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(granted, 1);
    }
}
