//! Delay between restart attempts of one service.
//!
//! Only used when `services.restart_attempts` is above 1. A unit that fails
//! to come back is usually waiting on something (a port, the datastore), so
//! the wait doubles each time up to `restart_backoff_max_ms`.

use std::time::Duration;
use rand::Rng;

/// Delay before the restart attempt that follows failed attempt `attempt`
/// (1-based).
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Up to 10% jitter.
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        assert_eq!(calculate_backoff(0, 500, 5000), Duration::ZERO);

        let first = calculate_backoff(1, 500, 5000);
        assert!(first >= Duration::from_millis(500));
        assert!(first < Duration::from_millis(550));

        let second = calculate_backoff(2, 500, 5000);
        assert!(second >= Duration::from_millis(1000));

        let capped = calculate_backoff(20, 500, 5000);
        assert!(capped >= Duration::from_millis(5000));
        assert!(capped < Duration::from_millis(5500));
    }

    #[test]
    fn test_zero_base_means_no_wait() {
        assert_eq!(calculate_backoff(3, 0, 0), Duration::ZERO);
    }
}
