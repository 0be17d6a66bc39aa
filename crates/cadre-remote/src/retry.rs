//! Exponential backoff retry for remote operations.
//!
//! Retries fire on transport-level transient errors and on API responses
//! whose body matches a configured transient signature. Everything else
//! propagates immediately; retrying a 400 or a permissions failure only
//! delays the caller's error report.

use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{RemoteError, RemoteResult};

/// Response-body phrases that signal a transient server-side failure.
///
/// These are the upstream proxy's outage pages: the request may well succeed
/// on the next attempt even though the status and body look fatal.
pub const DEFAULT_TRANSIENT_PATTERNS: &[&str] = &[
    "a timeout occurred",
    "web server is down",
    "web server is returning an unknown error",
];

/// Compiled set of body patterns that mark an error response retryable.
#[derive(Debug, Clone)]
pub struct TransientTriggers {
    patterns: Vec<Regex>,
}

impl TransientTriggers {
    /// Compile a pattern set. Patterns are matched case-insensitively
    /// anywhere in the response body.
    pub fn new(patterns: &[&str]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Whether `body` matches any configured pattern.
    #[must_use]
    pub fn matches(&self, body: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(body))
    }
}

impl Default for TransientTriggers {
    fn default() -> Self {
        // The built-in patterns are plain phrases; compilation cannot fail.
        Self::new(DEFAULT_TRANSIENT_PATTERNS).expect("built-in patterns compile")
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Base delay in seconds for exponential backoff.
    pub base_delay_secs: u64,
    /// Maximum delay cap in seconds.
    pub max_delay_secs: u64,
    /// Body patterns that mark an API error response retryable.
    pub triggers: TransientTriggers,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_secs: 1,
            max_delay_secs: 60,
            triggers: TransientTriggers::default(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given retry count and base delay. The delay
    /// cap defaults to 60 seconds and the trigger set to the built-in
    /// transient phrases.
    #[must_use]
    pub fn new(max_retries: u32, base_delay_secs: u64) -> Self {
        Self {
            max_retries,
            base_delay_secs,
            max_delay_secs: 60,
            triggers: TransientTriggers::default(),
        }
    }

    /// Replace the transient-body trigger set.
    #[must_use]
    pub fn with_triggers(mut self, triggers: TransientTriggers) -> Self {
        self.triggers = triggers;
        self
    }

    /// Whether the error should be retried at the given attempt number.
    ///
    /// Transport-level transient errors (network, timeout, remote rate
    /// limiting) always qualify; API errors qualify only when their body
    /// matches a trigger pattern.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, error: &RemoteError) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        error.is_transient() || error.body().is_some_and(|body| self.triggers.matches(body))
    }

    /// Delay before the given attempt.
    ///
    /// A [`RemoteError::RateLimited`] carrying `retry_after_secs` is honored
    /// directly (capped at `max_delay_secs`); otherwise the delay is
    /// `min(base_delay_secs * 2^attempt, max_delay_secs)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, error: &RemoteError) -> Duration {
        let secs = if let RemoteError::RateLimited {
            retry_after_secs: Some(retry_after),
        } = error
        {
            (*retry_after).min(self.max_delay_secs)
        } else {
            let exponential = self
                .base_delay_secs
                .saturating_mul(2u64.saturating_pow(attempt));
            exponential.min(self.max_delay_secs)
        };
        Duration::from_secs(secs)
    }

    /// Execute an async operation with retry.
    ///
    /// The closure `f` is called repeatedly until it succeeds, a
    /// non-retryable error is encountered, or the retry budget runs out.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut f: F) -> RemoteResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = RemoteResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            "operation succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !self.should_retry(attempt, &error) {
                        if attempt >= self.max_retries {
                            warn!(
                                operation = operation_name,
                                attempts = attempt + 1,
                                error = %error,
                                "retry budget exhausted"
                            );
                            return Err(RemoteError::RetriesExhausted {
                                attempts: attempt + 1,
                                message: format!(
                                    "{operation_name} failed after {} attempt(s): {error}",
                                    attempt + 1
                                ),
                            });
                        }
                        // Non-retryable error, return immediately.
                        return Err(error);
                    }

                    let delay = self.delay_for(attempt, &error);
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_secs = delay.as_secs(),
                        error = %error,
                        "retrying after transient error"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay_secs, 1);
        assert_eq!(policy.max_delay_secs, 60);
    }

    #[test]
    fn test_transient_transport_errors_retry() {
        let policy = RetryPolicy::new(3, 1);

        assert!(policy.should_retry(0, &RemoteError::network("connection reset")));
        assert!(policy.should_retry(0, &RemoteError::Timeout { timeout_secs: 30 }));
        assert!(policy.should_retry(
            2,
            &RemoteError::RateLimited {
                retry_after_secs: None
            }
        ));
        assert!(!policy.should_retry(
            3, // at max
            &RemoteError::network("connection reset")
        ));
    }

    #[test]
    fn test_body_triggers_retry() {
        let policy = RetryPolicy::new(3, 1);

        assert!(policy.should_retry(0, &RemoteError::api(524, "A timeout occurred")));
        assert!(policy.should_retry(0, &RemoteError::api(521, "Web server is down")));
        assert!(policy.should_retry(
            0,
            &RemoteError::api(520, "The web server is returning an unknown error")
        ));
    }

    #[test]
    fn test_unrecognized_bodies_propagate() {
        let policy = RetryPolicy::new(3, 1);

        assert!(!policy.should_retry(0, &RemoteError::api(400, "bad payload")));
        assert!(!policy.should_retry(0, &RemoteError::api(403, "forbidden")));
        // A 5xx without a recognized transient signature is not retried.
        assert!(!policy.should_retry(0, &RemoteError::api(500, "internal server error")));
        assert!(!policy.should_retry(0, &RemoteError::not_found("member 'alice'")));
    }

    #[test]
    fn test_custom_triggers() {
        let triggers = TransientTriggers::new(&["temporarily unavailable"]).unwrap();
        let policy = RetryPolicy::new(3, 1).with_triggers(triggers);

        assert!(policy.should_retry(0, &RemoteError::api(503, "Temporarily Unavailable")));
        assert!(!policy.should_retry(0, &RemoteError::api(521, "web server is down")));
    }

    #[test]
    fn test_delay_exponential_backoff() {
        let policy = RetryPolicy::new(5, 1);
        let error = RemoteError::network("reset");

        assert_eq!(policy.delay_for(0, &error), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1, &error), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2, &error), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3, &error), Duration::from_secs(8));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay_secs: 1,
            max_delay_secs: 10,
            triggers: TransientTriggers::default(),
        };
        let error = RemoteError::network("reset");

        assert_eq!(policy.delay_for(5, &error), Duration::from_secs(10));
        assert_eq!(policy.delay_for(8, &error), Duration::from_secs(10));
    }

    #[test]
    fn test_delay_honors_retry_after() {
        let policy = RetryPolicy::new(5, 1);
        let error = RemoteError::RateLimited {
            retry_after_secs: Some(30),
        };

        assert_eq!(policy.delay_for(0, &error), Duration::from_secs(30));
        assert_eq!(policy.delay_for(3, &error), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_execute_succeeds_first_try() {
        let policy = RetryPolicy::new(3, 0);
        let result = policy
            .execute("test_op", || async { Ok::<_, RemoteError>(42) })
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_execute_succeeds_after_retries() {
        let policy = RetryPolicy::new(3, 0);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = policy
            .execute("test_op", move || {
                let counter = counter_clone.clone();
                async move {
                    let attempt = counter.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 {
                        Err(RemoteError::api(524, "a timeout occurred"))
                    } else {
                        Ok(99)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 99);
        assert_eq!(counter.load(Ordering::SeqCst), 3); // initial + 2 retries
    }

    #[tokio::test]
    async fn test_execute_non_retryable_fails_immediately() {
        let policy = RetryPolicy::new(3, 0);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: RemoteResult<()> = policy
            .execute("test_op", move || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(RemoteError::api(403, "forbidden"))
                }
            })
            .await;

        assert!(matches!(result, Err(RemoteError::Api { status: 403, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1); // only one attempt
    }

    #[tokio::test]
    async fn test_execute_retry_budget_exhausted() {
        let policy = RetryPolicy::new(2, 0);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: RemoteResult<()> = policy
            .execute("test_op", move || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(RemoteError::network("connection reset"))
                }
            })
            .await;

        match result {
            Err(RemoteError::RetriesExhausted { attempts, .. }) => {
                assert_eq!(attempts, 3); // 1 initial + 2 retries
            }
            other => panic!("expected RetriesExhausted, got: {other:?}"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_no_retries_policy() {
        let policy = RetryPolicy::new(0, 1);
        assert!(!policy.should_retry(0, &RemoteError::network("reset")));
    }
}
