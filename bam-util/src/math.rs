//! Small numeric helpers used by the adaptive throttle and the client's
//! retry policy; kept dependency-free (no `num` crate) since every use site
//! is a two-line clamp or backoff computation.

use std::time::Duration;

/// Clamp `value` into `[min, max]`.
pub fn clamp_usize(value: usize, min: usize, max: usize) -> usize {
    value.clamp(min, max)
}

/// Exponential backoff with a cap, used by the client's transient-network
/// retry policy: `base * 2^attempt`, capped at `max`.
pub fn exponential_backoff(base: Duration, attempt: u32, max: Duration) -> Duration {
    let scaled = base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
    scaled.min(max)
}

/// Multiply a concurrency limit by a factor, rounding up so a factor > 1.0
/// always grows the limit by at least one slot, and clamp into `[min, max]`.
pub fn scale_limit(current: usize, factor: f64, min: usize, max: usize) -> usize {
    let scaled = (current as f64 * factor).ceil() as i64;
    let scaled = scaled.clamp(0, max as i64) as usize;
    scaled.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(10);
        assert_eq!(exponential_backoff(base, 0, max), Duration::from_secs(1));
        assert_eq!(exponential_backoff(base, 1, max), Duration::from_secs(2));
        assert_eq!(exponential_backoff(base, 2, max), Duration::from_secs(4));
        assert_eq!(exponential_backoff(base, 10, max), max);
    }

    #[test]
    fn scale_limit_respects_bounds() {
        assert_eq!(scale_limit(10, 1.2, 1, 50), 12);
        assert_eq!(scale_limit(45, 1.2, 1, 50), 50);
        assert_eq!(scale_limit(2, 0.8, 1, 50), 2);
        assert_eq!(scale_limit(1, 0.8, 1, 50), 1);
    }
}
