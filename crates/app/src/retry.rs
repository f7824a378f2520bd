//! Bounded retry with exponential backoff.

use std::time::Duration;

use tracing::debug;

use crate::errors::CartError;

pub const DEFAULT_ATTEMPTS: u32 = 3;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `attempts` is the total number of tries, at least one.
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    pub fn attempts(self) -> u32 {
        self.attempts
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn delay(self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2_u32.saturating_pow(retry))
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts are used up.
    ///
    /// # Errors
    ///
    /// Returns the last error.
    pub async fn run<T, F, Fut>(self, mut operation: F) -> Result<T, CartError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CartError>>,
    {
        let mut attempt = 1;

        loop {
            match operation().await {
                Err(error) if error.is_retryable() && attempt < self.attempts => {
                    let delay = self.delay(attempt - 1);

                    debug!(attempt, ?delay, %error, "retrying");

                    tokio::time::sleep(delay).await;

                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_BASE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;
    use crate::test::network_error;

    #[test]
    fn delays_double() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay(0), Duration::from_millis(200));
        assert_eq!(policy.delay(1), Duration::from_millis(400));
        assert_eq!(policy.delay(2), Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_retryable_errors_until_exhausted() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<(), _> = RetryPolicy::default()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(network_error()) }
            })
            .await;

        assert!(matches!(result, Err(CartError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_first_success() {
        let calls = AtomicU32::new(0);

        let result = RetryPolicy::default()
            .run(|| {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Err(network_error())
                    } else {
                        Ok(call)
                    }
                }
            })
            .await;

        assert!(matches!(result, Ok(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = RetryPolicy::default()
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CartError::Unauthorized) }
            })
            .await;

        assert!(matches!(result, Err(CartError::Unauthorized)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
