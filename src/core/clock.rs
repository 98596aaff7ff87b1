//! Clock abstraction
//!
//! Pacing and windowing go through a [`Clock`] so runs can use real time
//! (`TokioClock`) or a virtual clock (`ManualClock`) that advances instantly.
//! The virtual clock makes timing behavior reproducible in tests and is only
//! built with the `test-util` feature.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-util"))]
use parking_lot::Mutex;
#[cfg(any(test, feature = "test-util"))]
use std::sync::Arc;
use std::time::Duration;

/// Monotonic time source with a sleep primitive
#[async_trait]
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock was created
    fn now(&self) -> Duration;

    /// Suspend the caller for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Real time backed by `tokio::time`
#[derive(Debug, Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    /// Create a clock starting now
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock; `sleep` returns immediately after advancing time
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct ManualClock {
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

#[cfg(any(test, feature = "test-util"))]
impl ManualClock {
    /// Create a clock at virtual time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shareable clock handle
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Move virtual time forward
    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    /// Every duration passed to `sleep`, in call order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.elapsed.lock()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        self.advance(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_clock_advances_on_sleep() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.sleep(Duration::from_millis(200)).await;
        clock.advance(Duration::from_millis(50));

        assert_eq!(clock.now(), Duration::from_millis(250));
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(200)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_runtime_time() {
        let clock = TokioClock::new();
        clock.sleep(Duration::from_secs(3)).await;
        assert!(clock.now() >= Duration::from_secs(3));
    }
}
