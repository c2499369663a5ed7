//! Bounded retry with backoff for node-facing operations.

use std::future::Future;
use std::mem;
use std::time::Duration;

use crate::error::ClientError;

/// Backoff schedule for a [`Retrier`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total executions of the wrapped operation, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub start_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Option<Duration>,
    /// Factor applied to the delay after every failed attempt.
    pub backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            start_delay: Duration::from_millis(100),
            max_delay: Some(Duration::from_secs(10)),
            backoff_multiplier: 2.0,
        }
    }
}

/// Wraps node calls in a bounded retry loop with multiplicative backoff.
///
/// Injected at construction of every component that talks to the node so the
/// schedule is reproducible and testable in isolation.
#[derive(Debug, Clone, Default)]
pub struct Retrier {
    policy: RetryPolicy,
    excluded_errors: Vec<ClientError>,
}

impl Retrier {
    /// Creates a retrier with the given policy and no excluded errors.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            excluded_errors: Vec::new(),
        }
    }

    /// Errors matching any of these variants are surfaced immediately
    /// instead of retried.
    pub fn with_excluded_errors(mut self, errors: Vec<ClientError>) -> Self {
        self.excluded_errors = errors;
        self
    }

    /// Executes `operation` up to `max_attempts` times, sleeping between
    /// failed attempts. Returns the first success or the last error.
    pub async fn wrap<T, F, Fut>(&self, name: &str, mut operation: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.start_delay;
        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::debug!(name, attempt, ?delay, "execution started");
            match operation().await {
                Ok(value) => {
                    tracing::debug!(name, attempt, "execution succeeded");
                    return Ok(value);
                }
                Err(err) if self.is_excluded(&err) => return Err(err),
                Err(err) => {
                    tracing::warn!(name, attempt, %err, "execution failed");
                    if attempt >= attempts {
                        return Err(err);
                    }
                    tokio::time::sleep(delay).await;
                    delay = self.next_delay(delay);
                }
            }
        }
    }

    fn is_excluded(&self, err: &ClientError) -> bool {
        self.excluded_errors
            .iter()
            .any(|excluded| mem::discriminant(excluded) == mem::discriminant(err))
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        let next = delay.mul_f32(self.policy.backoff_multiplier);
        match self.policy.max_delay {
            Some(cap) if next > cap => cap,
            _ => next,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            start_delay: Duration::from_millis(10),
            max_delay: Some(Duration::from_millis(40)),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_two_failures() {
        let retrier = Retrier::new(quick_policy(3));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result = retrier
            .wrap("flaky", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ClientError::Transport("connection reset".into()))
                } else {
                    Ok(42u32)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_error_when_exhausted() {
        let retrier = Retrier::new(quick_policy(3));
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = retrier
            .wrap("dead", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::Transport("connection reset".into()))
            })
            .await;

        assert!(matches!(result, Err(ClientError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn excluded_error_stops_after_first_attempt() {
        let retrier = Retrier::new(quick_policy(5))
            .with_excluded_errors(vec![ClientError::NodeUnavailable(String::new())]);
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let result: Result<(), _> = retrier
            .wrap("excluded", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::NodeUnavailable("pool exhausted".into()))
            })
            .await;

        assert!(matches!(result, Err(ClientError::NodeUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delay_is_capped() {
        let retrier = Retrier::new(quick_policy(3));
        let delay = retrier.next_delay(Duration::from_millis(30));
        assert_eq!(delay, Duration::from_millis(40));

        let uncapped = Retrier::new(RetryPolicy {
            max_delay: None,
            ..quick_policy(3)
        });
        assert_eq!(
            uncapped.next_delay(Duration::from_millis(30)),
            Duration::from_millis(60)
        );
    }
}
