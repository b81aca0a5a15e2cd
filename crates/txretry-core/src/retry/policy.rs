use rand::Rng;
use std::time::Duration;

/// Decision returned by the retry policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The retry budget is spent; give up.
    GiveUp,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy for serialization-failure retries.
///
/// `retry_attempts` counts retries *after* the first attempt, so a unit of
/// work is invoked at most `retry_attempts + 1` times in total. Supplied per
/// call site; never mutated by the retry loop.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Number of retries allowed after the first attempt.
    pub retry_attempts: u32,
    /// Upper bound on the computed backoff delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_attempts: 10,
            max_backoff: Duration::from_millis(30_000),
        }
    }
}

impl RetryPolicy {
    /// Decide what to do after the `attempt`-th failed attempt (1-based).
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt > self.retry_attempts {
            return RetryDecision::GiveUp;
        }
        RetryDecision::RetryAfter(self.backoff_delay(attempt))
    }

    /// Backoff before retry `attempt`: 2^attempt milliseconds plus up to a
    /// second of jitter, capped at `max_backoff`. Jitter desynchronizes
    /// concurrent retriers that aborted on the same conflict.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let jitter = rand::rng().random_range(0..=1000u64);
        Duration::from_millis(exp.saturating_add(jitter)).min(self.max_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_values() {
        let p = RetryPolicy::default();
        assert_eq!(p.retry_attempts, 10);
        assert_eq!(p.max_backoff, Duration::from_millis(30_000));
    }

    #[test]
    fn backoff_grows_with_attempt_and_carries_bounded_jitter() {
        let p = RetryPolicy {
            retry_attempts: 20,
            max_backoff: Duration::from_secs(3600),
        };
        for attempt in 1..=10u32 {
            let d = p.backoff_delay(attempt);
            let base = 1u64 << attempt;
            assert!(d >= Duration::from_millis(base), "attempt {}", attempt);
            assert!(d <= Duration::from_millis(base + 1000), "attempt {}", attempt);
        }
    }

    #[test]
    fn backoff_is_capped_at_max_backoff() {
        let p = RetryPolicy {
            retry_attempts: 200,
            max_backoff: Duration::from_millis(500),
        };
        for attempt in [1u32, 10, 30, 64, 200] {
            assert!(p.backoff_delay(attempt) <= p.max_backoff);
        }
    }

    #[test]
    fn huge_attempt_numbers_do_not_overflow() {
        let p = RetryPolicy {
            retry_attempts: u32::MAX,
            max_backoff: Duration::from_millis(100),
        };
        assert!(p.backoff_delay(u32::MAX) <= p.max_backoff);
    }

    #[test]
    fn decide_gives_up_only_past_the_budget() {
        let p = RetryPolicy {
            retry_attempts: 3,
            max_backoff: Duration::from_millis(10),
        };
        assert!(matches!(p.decide(1), RetryDecision::RetryAfter(_)));
        assert!(matches!(p.decide(3), RetryDecision::RetryAfter(_)));
        assert_eq!(p.decide(4), RetryDecision::GiveUp);
    }

    #[test]
    fn zero_retries_means_single_attempt() {
        let p = RetryPolicy {
            retry_attempts: 0,
            max_backoff: Duration::from_millis(10),
        };
        assert_eq!(p.decide(1), RetryDecision::GiveUp);
    }
}
