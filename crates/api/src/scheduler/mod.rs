// Path: crates/api/src/scheduler/mod.rs

//! Defines the `Scheduler` capability that drives the polling loop.
//!
//! Injecting the clock and the sleep lets the call state machine be tested
//! against virtual time.

use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of wall-clock time and cooperative suspension.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// The current time as a duration since the Unix epoch.
    fn now(&self) -> Duration;

    /// Suspends the caller for `duration`. This is a cancellation point.
    async fn sleep(&self, duration: Duration);
}

/// Awaits `future` for at most `limit` of `scheduler` time. `None` means
/// the limit fired first; the future is dropped.
pub async fn within<F: Future>(
    scheduler: &dyn Scheduler,
    limit: Duration,
    future: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        output = future => Some(output),
        () = scheduler.sleep(limit) => None,
    }
}

/// The production scheduler: the system clock and `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_sleeps_on_the_runtime_clock() {
        let scheduler = TokioScheduler;
        let before = tokio::time::Instant::now();
        scheduler.sleep(Duration::from_secs(30)).await;
        assert!(before.elapsed() >= Duration::from_secs(30));
        assert!(scheduler.now() > Duration::from_secs(1_600_000_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_within_bounds_a_stalled_future() {
        let scheduler = TokioScheduler;
        let before = tokio::time::Instant::now();
        let stalled = within(&scheduler, Duration::from_secs(5), std::future::pending::<u8>()).await;
        assert_eq!(stalled, None);
        assert_eq!(before.elapsed(), Duration::from_secs(5));

        let ready = within(&scheduler, Duration::from_secs(5), async { 7u8 }).await;
        assert_eq!(ready, Some(7));
    }
}
