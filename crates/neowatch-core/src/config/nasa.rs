//! NASA upstream API configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Settings for the three NASA upstream feeds (SBDB, CAD, Sentry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NasaConfig {
    /// SBDB query endpoint (orbital-elements catalog).
    #[serde(default = "default_sbdb_url")]
    pub sbdb_url: String,
    /// CAD endpoint (close-approach feed).
    #[serde(default = "default_cad_url")]
    pub cad_url: String,
    /// Sentry endpoint (impact-risk feed).
    #[serde(default = "default_sentry_url")]
    pub sentry_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Retry budget per fetch, including the first attempt.
    #[serde(default = "default_max_attempts")]
    pub retry_max_attempts: u32,
    /// Base backoff delay in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Backoff multiplier per attempt.
    #[serde(default = "default_multiplier")]
    pub retry_multiplier: f64,
    /// Upper bound on a single backoff delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Jitter fraction applied to each delay.
    #[serde(default = "default_jitter")]
    pub retry_jitter: f64,
}

impl NasaConfig {
    /// The retry policy these settings describe.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            multiplier: self.retry_multiplier,
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            jitter: self.retry_jitter,
        }
    }
}

impl Default for NasaConfig {
    fn default() -> Self {
        Self {
            sbdb_url: default_sbdb_url(),
            cad_url: default_cad_url(),
            sentry_url: default_sentry_url(),
            request_timeout_seconds: default_request_timeout(),
            user_agent: default_user_agent(),
            retry_max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_base_delay_ms(),
            retry_multiplier: default_multiplier(),
            retry_max_delay_ms: default_max_delay_ms(),
            retry_jitter: default_jitter(),
        }
    }
}

fn default_sbdb_url() -> String {
    "https://ssd-api.jpl.nasa.gov/sbdb_query.api".to_string()
}

fn default_cad_url() -> String {
    "https://ssd-api.jpl.nasa.gov/cad.api".to_string()
}

fn default_sentry_url() -> String {
    "https://ssd-api.jpl.nasa.gov/sentry.api".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    "NeoWatch/0.1".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_jitter() -> f64 {
    0.2
}
