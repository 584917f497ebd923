//! Exponential retry delay with jitter.

use std::time::Duration;

/// Advisory exponential backoff.
///
/// For attempt `n` (1-indexed):
///
/// ```text
/// base_delay   = base * multiplier^(n - 1)
/// jittered     = base_delay + random(-jitter, +jitter) * base_delay
/// final_delay  = min(jittered, max_delay)
/// ```
///
/// The type only computes durations; callers decide whether to wait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryDelay {
    base: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: f64,
}

impl RetryDelay {
    /// Backoff starting at `base`, doubling each attempt, capped at 60s,
    /// with 10% jitter.
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }

    /// Cap every computed delay at `max_delay`.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Growth factor between attempts. Values below 1.0 are raised to 1.0.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Jitter factor, clamped to `0.0..=1.0`.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// The starting delay.
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Suggested wait before attempt `attempt + 1`, given `attempt` attempts
    /// have been made. An attempt of 0 is treated as 1.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_delay = self.base.as_secs_f64() * self.multiplier.powi(exponent);

        let jittered = if self.jitter > 0.0 {
            let jitter_amount = base_delay * self.jitter * (rand::random::<f64>() - 0.5) * 2.0;
            base_delay + jitter_amount
        } else {
            base_delay
        };

        let capped = jittered.min(self.max_delay.as_secs_f64()).max(0.0);
        Duration::from_secs_f64(capped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_growth() {
        let delay = RetryDelay::new(Duration::from_millis(500)).with_jitter(0.0);

        assert_eq!(delay.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(delay.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(delay.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(delay.delay_for_attempt(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_capped_at_max_delay() {
        let delay = RetryDelay::new(Duration::from_secs(1))
            .with_multiplier(10.0)
            .with_max_delay(Duration::from_secs(5))
            .with_jitter(0.0);

        for attempt in 1..40 {
            assert!(delay.delay_for_attempt(attempt) <= Duration::from_secs(5));
        }
        assert_eq!(delay.delay_for_attempt(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_range() {
        let delay = RetryDelay::new(Duration::from_secs(1)).with_jitter(0.5);

        for _ in 0..50 {
            let millis = delay.delay_for_attempt(1).as_millis();
            assert!(
                (500..=1500).contains(&millis),
                "Delay with 50% jitter should be in [500ms, 1500ms], got {}ms",
                millis
            );
        }
    }

    #[test]
    fn test_settings_clamped() {
        let delay = RetryDelay::new(Duration::from_millis(100))
            .with_jitter(3.0)
            .with_multiplier(0.2);
        assert_eq!(delay.jitter, 1.0);
        assert_eq!(delay.multiplier, 1.0);
        assert_eq!(delay.base(), Duration::from_millis(100));
    }

    #[test]
    fn test_zero_base_is_zero() {
        let delay = RetryDelay::new(Duration::ZERO);
        assert_eq!(delay.delay_for_attempt(5), Duration::ZERO);
    }
}
