use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::RetryIf;

use crate::config::RetryConfig;
use crate::error::FetchError;

/// Bounded fixed-delay retry.
///
/// `max_attempts` counts the initial call, so the default of 3 allows two
/// retries. When attempts run out the last error is returned as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_secs(config.delay_secs))
    }

    fn strategy(&self) -> impl Iterator<Item = Duration> {
        FixedInterval::new(self.delay).take(self.max_attempts.saturating_sub(1))
    }

    /// Retry only on quota exhaustion.
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        self.run_if(op, FetchError::is_quota_exhausted).await
    }

    pub async fn run_if<T, E, F, Fut, P>(&self, mut op: F, mut retryable: P) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&E) -> bool,
    {
        let attempt = AtomicUsize::new(0);
        let max_attempts = self.max_attempts;
        let delay_secs = self.delay.as_secs_f64();

        let action = || {
            attempt.fetch_add(1, Ordering::Relaxed);
            op()
        };
        let condition = |err: &E| {
            let should_retry = retryable(err);
            let made = attempt.load(Ordering::Relaxed);
            if should_retry && made < max_attempts {
                tracing::warn!(
                    error = %err,
                    attempt = made,
                    max_attempts,
                    delay_secs,
                    "retryable failure, retrying after delay"
                );
            }
            should_retry
        };

        RetryIf::start(self.strategy(), action, condition).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::Instant;

    fn quota() -> FetchError {
        FetchError::QuotaExhausted("RESOURCE_EXHAUSTED".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::default();
        let started = Instant::now();

        let result = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(quota())
                    } else {
                        Ok("rows")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "rows");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::default();

        let result: Result<(), FetchError> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(quota())
                }
            })
            .await;

        assert!(result.unwrap_err().is_quota_exhausted());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_quota_error_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::default();
        let started = Instant::now();

        let result: Result<(), FetchError> = policy
            .run(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FetchError::Auth("invalid_grant".to_string()))
                }
            })
            .await;

        assert!(matches!(result, Err(FetchError::Auth(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_predicate() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::new(5, Duration::from_secs(1));

        let result: Result<(), FetchError> = policy
            .run_if(
                || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(FetchError::Transient("503".to_string()))
                    }
                },
                |e| matches!(e, FetchError::Transient(_)),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(60));
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.strategy().count(), 0);
    }
}
