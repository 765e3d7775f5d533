// Path: crates/client/src/backoff.rs
//! Exponential backoff with jitter between polls.

use crate::options::CallOptions;
use rand::Rng;
use std::time::Duration;

/// Yields `base * 2^n` capped at `max`, each delay scaled by a random factor
/// in `[1 - jitter, 1 + jitter]` and capped again.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    jitter: f64,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, jitter: f64) -> Self {
        Self {
            base,
            max,
            jitter: jitter.clamp(0.0, 0.99),
            attempt: 0,
        }
    }

    pub fn from_options(options: &CallOptions) -> Self {
        Self::new(
            options.poll_base_interval,
            options.poll_max_interval,
            options.poll_jitter_ratio,
        )
    }

    /// The undithered delay of the current step.
    pub fn nominal(&self) -> Duration {
        let factor = 1u32.checked_shl(self.attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }

    pub fn next_delay<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Duration {
        let nominal = self.nominal();
        self.attempt = self.attempt.saturating_add(1);
        if self.jitter == 0.0 {
            return nominal;
        }
        let factor = 1.0 + rng.gen_range(-self.jitter..=self.jitter);
        // Out of range only when the product exceeds `Duration::MAX`.
        Duration::try_from_secs_f64(nominal.as_secs_f64() * factor)
            .unwrap_or(self.max)
            .min(self.max)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_delays_double_until_capped() {
        let mut backoff = Backoff::new(Duration::from_millis(500), Duration::from_secs(5), 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        let delays: Vec<u64> = (0..7)
            .map(|_| backoff.next_delay(&mut rng).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![500, 1000, 2000, 4000, 5000, 5000, 5000]);
        backoff.reset();
        assert_eq!(backoff.nominal(), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_within_ratio_and_cap() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let mut backoff = Backoff::new(Duration::from_millis(1000), Duration::from_millis(1100), 0.2);
            let first = backoff.next_delay(&mut rng);
            assert!(first >= Duration::from_millis(800), "{first:?}");
            assert!(first <= Duration::from_millis(1100), "{first:?}");
        }
    }

    #[test]
    fn test_huge_attempt_counts_do_not_overflow() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(60), 0.0);
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            backoff.next_delay(&mut rng);
        }
        assert_eq!(backoff.nominal(), Duration::from_secs(60));
    }

    #[test]
    fn test_jitter_on_an_unbounded_cap_saturates() {
        let mut backoff = Backoff::new(Duration::MAX, Duration::MAX, 0.99);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let delay = backoff.next_delay(&mut rng);
            assert!(delay > Duration::from_secs(u64::MAX / 1_000), "{delay:?}");
        }
    }
}
