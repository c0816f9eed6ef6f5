//! Clock abstraction for the reconnect delay.
//!
//! The recovery loop sleeps between probes; injecting the clock keeps
//! those tests deterministic. Production code uses `RealClock`.

use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

/// Source of delay between reconnect probes.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Sleeps for the specified duration.
    ///
    /// In production this maps to `tokio::time::sleep`; in tests it can
    /// return immediately while recording the request.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Production clock backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl RealClock {
    /// Creates a new real clock instance.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for RealClock {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Deterministic clock for tests.
///
/// Sleep calls return after a task yield and record what was requested,
/// so a test can assert how many probe delays elapsed and how long they
/// would have taken in total.
#[derive(Debug, Clone, Default)]
pub struct TestClock {
    slept_ns: Arc<AtomicU64>,
    sleep_calls: Arc<AtomicU64>,
}

impl TestClock {
    /// Creates a new test clock with no recorded sleeps.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total duration sleepers have asked for so far.
    pub fn slept(&self) -> Duration {
        Duration::from_nanos(self.slept_ns.load(Ordering::Acquire))
    }

    /// Number of sleep calls observed so far.
    pub fn sleep_count(&self) -> u64 {
        self.sleep_calls.load(Ordering::Acquire)
    }
}

impl Clock for TestClock {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let requested = u64::try_from(duration.as_nanos().min(u128::from(u64::MAX))).unwrap_or(0);
        self.slept_ns.fetch_add(requested, Ordering::AcqRel);
        self.sleep_calls.fetch_add(1, Ordering::AcqRel);
        Box::pin(tokio::task::yield_now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clock_records_each_sleep() {
        let clock = TestClock::new();

        clock.sleep(Duration::from_secs(2)).await;
        clock.sleep(Duration::from_secs(2)).await;

        assert_eq!(clock.sleep_count(), 2);
        assert_eq!(clock.slept(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_clock_clones_share_state() {
        let clock = TestClock::new();
        let observer = clock.clone();

        clock.sleep(Duration::from_millis(500)).await;

        assert_eq!(observer.sleep_count(), 1);
        assert_eq!(observer.slept(), Duration::from_millis(500));
    }
}
