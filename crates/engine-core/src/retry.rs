use crate::config::RetryConfig;
use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tracing::warn;

/// Whether a failed attempt should be run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// The error was not retriable and was returned on the spot.
    Fatal(E),
    /// Every attempt failed with a retriable error; holds the last one.
    AttemptsExceeded { attempts: usize, last: E },
}

/// Exponential backoff: attempt `n` (zero-based) waits `base * 2^n`, capped
/// at `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Runs `op` until it succeeds, fails with an error `classify` marks as
    /// `Stop`, or runs out of attempts.
    pub async fn run<F, Fut, T, E, C>(&self, mut op: F, classify: C) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> RetryDisposition,
        E: std::fmt::Display,
    {
        let mut attempt = 0;

        loop {
            let err = match op().await {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };

            if classify(&err) == RetryDisposition::Stop {
                return Err(RetryError::Fatal(err));
            }

            attempt += 1;
            if attempt >= self.max_attempts {
                return Err(RetryError::AttemptsExceeded {
                    attempts: attempt,
                    last: err,
                });
            }

            let delay = self.backoff_delay(attempt - 1);
            warn!(attempt, max_attempts = self.max_attempts, delay_ms = delay.as_millis() as u64, error = %err, "Retrying");
            sleep(delay).await;
        }
    }

    fn backoff_delay(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    fn classify(err: &&str) -> RetryDisposition {
        if err.starts_with("busy") {
            RetryDisposition::Retry
        } else {
            RetryDisposition::Stop
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicUsize::new(0);
        let result = fast(3)
            .run(
                || async {
                    match calls.fetch_add(1, Ordering::SeqCst) {
                        0 | 1 => Err("busy"),
                        _ => Ok(7),
                    }
                },
                classify,
            )
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fatal_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = fast(5)
            .run(
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("constraint")
                },
                classify,
            )
            .await;

        assert!(matches!(result, Err(RetryError::Fatal("constraint"))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let result: Result<(), _> = fast(2).run(|| async { Err("busy") }, classify).await;
        assert!(matches!(
            result,
            Err(RetryError::AttemptsExceeded { attempts: 2, .. })
        ));
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let policy = RetryPolicy::new(5, Duration::from_millis(50), Duration::from_millis(120));
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(50));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(120));
    }
}
