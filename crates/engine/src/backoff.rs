//! Exponential back-off with a ceiling.

use relay_common::config::RetryPolicy;

/// Delay in seconds to apply before retry number `attempts` (counting
/// failed retries so far): `min(base * 2^attempts, max)`.
///
/// `attempts = 0` is the initial enqueue delay, so the schedule for
/// base 10 / max 80 reads 10, 20, 40, 80, 80, ...
pub fn delay_for_attempt(policy: &RetryPolicy, attempts: u32) -> u64 {
    let factor = 2u64.saturating_pow(attempts);
    policy
        .base_delay_secs
        .saturating_mul(factor)
        .min(policy.max_delay_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base: u64, max: u64) -> RetryPolicy {
        RetryPolicy {
            base_delay_secs: base,
            max_delay_secs: max,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn test_doubling_schedule() {
        let policy = policy(10, 80);
        let delays: Vec<u64> = (0..4).map(|n| delay_for_attempt(&policy, n)).collect();
        assert_eq!(delays, vec![10, 20, 40, 80]);
    }

    #[test]
    fn test_capped_at_max_delay() {
        let policy = policy(10, 80);
        assert_eq!(delay_for_attempt(&policy, 10), 80);
        assert_eq!(delay_for_attempt(&policy, 63), 80);
    }

    #[test]
    fn test_monotonically_non_decreasing() {
        let policy = policy(7, 3600);
        let mut previous = 0;
        for attempts in 0..70 {
            let delay = delay_for_attempt(&policy, attempts);
            assert!(delay >= previous, "delay decreased at attempt {attempts}");
            assert!(delay <= policy.max_delay_secs);
            previous = delay;
        }
    }

    #[test]
    fn test_large_attempt_count_saturates() {
        let policy = policy(u64::MAX, u64::MAX);
        assert_eq!(delay_for_attempt(&policy, u32::MAX), u64::MAX);
    }
}
