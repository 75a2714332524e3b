//! Event observer seam.
//!
//! Retry/backoff and commit/rollback events are reported to an injected
//! observer rather than logged inline, so deployments can route them to
//! their own telemetry. [`TracingObserver`] is the default implementation.

use std::fmt;
use std::time::Duration;

/// Receives retry and transaction lifecycle events.
///
/// All methods have no-op defaults; implementors override what they need.
pub trait EventObserver: Send + Sync {
    /// A retryable upstream failure occurred and the caller is about to
    /// wait `delay` before attempt `attempt + 1`.
    fn on_retry(
        &self,
        operation: &str,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        error: &dyn fmt::Display,
    ) {
        let _ = (operation, attempt, max_attempts, delay, error);
    }

    /// A unit-of-work scope committed.
    fn on_commit(&self, scope: &str) {
        let _ = scope;
    }

    /// A unit-of-work scope rolled back.
    fn on_rollback(&self, scope: &str) {
        let _ = scope;
    }
}

/// Observer that forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EventObserver for TracingObserver {
    fn on_retry(
        &self,
        operation: &str,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        error: &dyn fmt::Display,
    ) {
        tracing::warn!(
            operation,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            %error,
            "Upstream call failed, retrying"
        );
    }

    fn on_commit(&self, scope: &str) {
        tracing::debug!(scope, "Transaction committed");
    }

    fn on_rollback(&self, scope: &str) {
        tracing::debug!(scope, "Transaction rolled back");
    }
}
