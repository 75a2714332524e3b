//! Bounded retry with exponential backoff for upstream calls.
//!
//! Retry behavior is an explicit [`RetryPolicy`] passed to
//! [`call_with_retry`] together with the failing operation, not a wrapper
//! attached to the function. Failures self-classify through [`RetryClass`]:
//! transient ones (network, timeout, rate limit) are retried up to the
//! attempt budget, permanent ones (auth, malformed request) surface
//! immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::{AppError, ErrorKind};
use crate::observe::EventObserver;
use crate::result::AppResult;

/// Classification of a failure for retry purposes.
pub trait RetryClass {
    /// Whether another attempt could plausibly succeed.
    fn is_retryable(&self) -> bool;
}

/// Retry and backoff configuration for one upstream operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first call. Clamped to ≥ 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Multiplier applied per subsequent attempt.
    pub multiplier: f64,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Jitter as a fraction of the computed delay (`0.0` disables).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given failed attempt (1-based):
    /// `base_delay * multiplier^(attempt - 1)`, capped at `max_delay`,
    /// with uniform random jitter applied on top.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1) as f64;
        let mut delay = self.base_delay.as_secs_f64() * self.multiplier.powf(exp);
        delay = delay.min(self.max_delay.as_secs_f64());
        if self.jitter > 0.0 {
            let spread = rand::thread_rng().gen_range(-self.jitter..self.jitter);
            delay = (delay * (1.0 + spread)).max(0.0);
        }
        Duration::from_secs_f64(delay)
    }
}

/// Invoke `call` until it succeeds, its failure is permanent, or the
/// attempt budget is exhausted.
///
/// Each retry is reported to `observer` before the backoff wait. The wait
/// uses `tokio::time::sleep` and is cancel-safe: if the caller's future is
/// dropped mid-wait, no further attempts are made. Exhaustion surfaces as
/// [`ErrorKind::UpstreamUnavailable`] wrapping the last failure.
pub async fn call_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    observer: &dyn EventObserver,
    operation: &str,
    mut call: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryClass + Into<AppError> + std::error::Error + Send + Sync + 'static,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error: Option<E> = None;

    for attempt in 1..=max_attempts {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if !error.is_retryable() => return Err(error.into()),
            Err(error) => {
                if attempt < max_attempts {
                    let delay = policy.delay_for(attempt);
                    observer.on_retry(operation, attempt, max_attempts, delay, &error);
                    last_error = Some(error);
                    tokio::time::sleep(delay).await;
                } else {
                    last_error = Some(error);
                }
            }
        }
    }

    match last_error {
        Some(error) => Err(AppError::with_source(
            ErrorKind::UpstreamUnavailable,
            format!("'{operation}' failed after {max_attempts} attempts"),
            error,
        )),
        // Unreachable: max_attempts >= 1 means the loop ran at least once.
        None => Err(AppError::internal(format!(
            "'{operation}' produced no result"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::observe::TracingObserver;

    #[derive(Debug, thiserror::Error)]
    enum FakeError {
        #[error("connection reset")]
        Transient,
        #[error("bad credentials")]
        Permanent,
    }

    impl RetryClass for FakeError {
        fn is_retryable(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    impl From<FakeError> for AppError {
        fn from(err: FakeError) -> Self {
            AppError::with_source(ErrorKind::Internal, err.to_string(), err)
        }
    }

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(10),
            multiplier: 2.0,
            max_delay: Duration::from_millis(100),
            jitter: 0.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_call_is_invoked_exactly_max_attempts_times() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> =
            call_with_retry(&quick_policy(3), &TracingObserver, "sbdb", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::Transient) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamUnavailable);
        assert!(err.message.contains("3 attempts"));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry(&quick_policy(5), &TracingObserver, "cad", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(FakeError::Transient)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> =
            call_with_retry(&quick_policy(5), &TracingObserver, "sentry", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(FakeError::Permanent) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err().kind, ErrorKind::Internal);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_budget_is_clamped_to_at_least_one() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry(&quick_policy(0), &TracingObserver, "noop", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, FakeError>("done") }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_grows_exponentially_and_caps() {
        let policy = quick_policy(5);
        assert_eq!(policy.delay_for(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for(2), Duration::from_millis(20));
        assert_eq!(policy.delay_for(3), Duration::from_millis(40));
        assert_eq!(policy.delay_for(10), Duration::from_millis(100));
    }
}
