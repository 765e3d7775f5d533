// Path: crates/test_utils/src/scheduler.rs
//! A scheduler on virtual time.

use async_trait::async_trait;
use ica_api::scheduler::Scheduler;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct Clock {
    now: Duration,
    sleeps: Vec<Duration>,
}

/// Sleeping returns immediately and moves the clock forward by the requested
/// duration. Every sleep is recorded.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    clock: Mutex<Clock>,
}

impl ManualScheduler {
    pub fn new(start: Duration) -> Self {
        Self {
            clock: Mutex::new(Clock {
                now: start,
                sleeps: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Moves the clock forward without recording a sleep.
    pub fn advance(&self, by: Duration) {
        let mut clock = self.lock();
        clock.now = clock.now.saturating_add(by);
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.lock().sleeps.iter().sum()
    }
}

#[async_trait]
impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.lock().now
    }

    async fn sleep(&self, duration: Duration) {
        let mut clock = self.lock();
        clock.now = clock.now.saturating_add(duration);
        clock.sleeps.push(duration);
    }
}
