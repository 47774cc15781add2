//! Retry policy with flat randomized backoff.
//!
//! Delivery failures are retried after a pause drawn uniformly at random
//! from a closed range, sampled fresh before each retry. There is no
//! exponential growth and no jitter decay; the observed upstream behavior
//! is a flat 5-20 second window on every attempt, so the policy keeps that
//! shape and exposes the bounds as configuration instead of literals.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry policy for email delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retries after the first attempt (total attempts is
    /// `max_retries + 1`).
    pub max_retries: u32,

    /// Lower bound of the backoff range, inclusive.
    pub backoff_min: Duration,

    /// Upper bound of the backoff range, inclusive.
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_min: Duration::from_millis(5_000),
            backoff_max: Duration::from_millis(20_000),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy, swapping the bounds if given in the wrong order.
    pub fn new(max_retries: u32, backoff_min: Duration, backoff_max: Duration) -> Self {
        if backoff_min <= backoff_max {
            Self { max_retries, backoff_min, backoff_max }
        } else {
            Self { max_retries, backoff_min: backoff_max, backoff_max: backoff_min }
        }
    }

    /// Total attempt budget, including the first attempt.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Samples a backoff duration uniformly from the closed range.
    ///
    /// Sampled fresh before each retry; samples are independent across
    /// attempts.
    pub fn sample_backoff(&self) -> Duration {
        let min_ms = u64::try_from(self.backoff_min.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.backoff_max.as_millis()).unwrap_or(u64::MAX);

        if min_ms >= max_ms {
            return self.backoff_min;
        }

        let mut rng = rand::rng();
        Duration::from_millis(rng.random_range(min_ms..=max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_observed_constants() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.max_attempts(), 6);
        assert_eq!(policy.backoff_min, Duration::from_millis(5_000));
        assert_eq!(policy.backoff_max, Duration::from_millis(20_000));
    }

    #[test]
    fn sampled_backoff_stays_in_closed_range() {
        let policy = RetryPolicy::default();

        for _ in 0..1_000 {
            let delay = policy.sample_backoff();
            assert!(delay >= policy.backoff_min, "delay below range: {delay:?}");
            assert!(delay <= policy.backoff_max, "delay above range: {delay:?}");
        }
    }

    #[test]
    fn samples_vary_across_attempts() {
        let policy = RetryPolicy::default();
        let mut seen = std::collections::HashSet::new();

        for _ in 0..200 {
            seen.insert(policy.sample_backoff().as_millis());
        }

        // A flat 15-second window sampled 200 times collapses to a single
        // value only if sampling is broken
        assert!(seen.len() > 1, "backoff sampling should vary");
    }

    #[test]
    fn degenerate_range_returns_fixed_delay() {
        let policy = RetryPolicy::new(3, Duration::from_secs(7), Duration::from_secs(7));
        assert_eq!(policy.sample_backoff(), Duration::from_secs(7));
    }

    #[test]
    fn swapped_bounds_are_normalized() {
        let policy = RetryPolicy::new(3, Duration::from_secs(20), Duration::from_secs(5));
        assert_eq!(policy.backoff_min, Duration::from_secs(5));
        assert_eq!(policy.backoff_max, Duration::from_secs(20));
    }
}
