//! Bounded retry with exponential backoff

use crate::config::RetryConfig;
use std::time::Duration;

/// Largest backoff, as a multiple of the base delay
const BACKOFF_MAX_FACTOR: u32 = 8;

/// How often to try an operation and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// A single attempt, no waiting
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Policy for detail fetches
    pub fn for_details(config: &RetryConfig) -> Self {
        Self::new(
            config.detail_attempts,
            Duration::from_millis(config.backoff_ms),
        )
    }

    /// Policy for next-page navigation
    pub fn for_advance(config: &RetryConfig) -> Self {
        Self::new(
            config.advance_attempts,
            Duration::from_millis(config.backoff_ms),
        )
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before retry number `retry` (0 = first retry)
    pub fn delay(&self, retry: u32) -> Duration {
        let growth = 1_u32 << retry.min(3);
        self.base_delay * growth.min(BACKOFF_MAX_FACTOR)
    }

    /// Sleeps before `attempt` (0-based); the first attempt never waits
    pub async fn pause_before(&self, attempt: u32) {
        if attempt > 0 {
            let delay = self.delay(attempt - 1);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_bounded_and_exponential() {
        let policy = RetryPolicy::new(5, Duration::from_millis(250));
        assert_eq!(policy.delay(0).as_millis(), 250);
        assert_eq!(policy.delay(1).as_millis(), 500);
        assert_eq!(policy.delay(2).as_millis(), 1000);
        assert_eq!(policy.delay(3).as_millis(), 2000);
        assert_eq!(policy.delay(10).as_millis(), 2000);
    }

    #[test]
    fn test_at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts(), 1);
        assert_eq!(RetryPolicy::once().attempts(), 1);
    }

    #[test]
    fn test_from_config() {
        let config = RetryConfig {
            detail_attempts: 3,
            advance_attempts: 1,
            backoff_ms: 100,
        };
        assert_eq!(RetryPolicy::for_details(&config).attempts(), 3);
        assert_eq!(RetryPolicy::for_advance(&config).attempts(), 1);
        assert_eq!(
            RetryPolicy::for_details(&config).delay(0),
            Duration::from_millis(100)
        );
    }
}
