//! Shared HTTP plumbing for the JPL SSD feeds.
//!
//! One [`NasaApiClient`] backs all three concrete clients: it owns the
//! `reqwest` client, classifies responses into retryable and terminal
//! failures, and routes every request through the configured retry policy.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value as Json;

use neowatch_core::config::NasaConfig;
use neowatch_core::error::{AppError, ErrorKind};
use neowatch_core::observe::EventObserver;
use neowatch_core::result::AppResult;
use neowatch_core::retry::{call_with_retry, RetryClass, RetryPolicy};

/// Failure modes of a single feed request.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}")]
    Upstream { url: String, status: StatusCode },
    #[error("rate limited by {url}")]
    RateLimited { url: String },
    #[error("{url} rejected credentials ({status})")]
    Auth { url: String, status: StatusCode },
    #[error("{url} rejected the request ({status})")]
    BadRequest { url: String, status: StatusCode },
    #[error("could not decode response from {url}: {detail}")]
    Decode { url: String, detail: String },
}

impl RetryClass for FetchError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Transport { .. }
                | FetchError::Upstream { .. }
                | FetchError::RateLimited { .. }
        )
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        let kind = match &err {
            FetchError::Transport { .. }
            | FetchError::Upstream { .. }
            | FetchError::RateLimited { .. } => ErrorKind::UpstreamUnavailable,
            FetchError::Auth { .. } => ErrorKind::Configuration,
            FetchError::BadRequest { .. } => ErrorKind::Internal,
            FetchError::Decode { .. } => ErrorKind::Serialization,
        };
        let message = err.to_string();
        AppError::with_source(kind, message, err)
    }
}

/// Map an HTTP status to the matching failure mode.
fn classify_status(url: &str, status: StatusCode) -> FetchError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        FetchError::RateLimited { url: url.into() }
    } else if status == StatusCode::REQUEST_TIMEOUT || status.is_server_error() {
        FetchError::Upstream {
            url: url.into(),
            status,
        }
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        FetchError::Auth {
            url: url.into(),
            status,
        }
    } else {
        FetchError::BadRequest {
            url: url.into(),
            status,
        }
    }
}

/// HTTP client shared by the SBDB, CAD, and Sentry feeds.
#[derive(Clone)]
pub struct NasaApiClient {
    http: reqwest::Client,
    policy: RetryPolicy,
    observer: Arc<dyn EventObserver>,
}

impl NasaApiClient {
    pub fn new(config: &NasaConfig, observer: Arc<dyn EventObserver>) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "failed to build HTTP client", e)
            })?;

        Ok(Self {
            http,
            policy: config.retry_policy(),
            observer,
        })
    }

    /// Fetch a JSON document, retrying transient failures per policy.
    pub async fn get_json(
        &self,
        operation: &str,
        url: &str,
        params: &[(&str, String)],
    ) -> AppResult<Json> {
        call_with_retry(&self.policy, self.observer.as_ref(), operation, || {
            self.request_once(url, params)
        })
        .await
    }

    async fn request_once(&self, url: &str, params: &[(&str, String)]) -> Result<Json, FetchError> {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.into(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(url, status));
        }

        response.json::<Json>().await.map_err(|e| FetchError::Decode {
            url: url.into(),
            detail: e.to_string(),
        })
    }
}

/// The positional `{"fields": [...], "data": [[...]]}` table format used by
/// the SBDB query and CAD endpoints.
pub(crate) struct FieldTable {
    fields: Vec<String>,
    rows: Vec<Vec<Json>>,
}

impl FieldTable {
    pub(crate) fn from_json(url: &str, payload: &Json) -> Result<Self, FetchError> {
        let fields = payload
            .get("fields")
            .and_then(Json::as_array)
            .ok_or_else(|| FetchError::Decode {
                url: url.into(),
                detail: "missing 'fields' array".into(),
            })?
            .iter()
            .filter_map(|f| f.as_str().map(str::to_owned))
            .collect();

        // An empty result set may omit 'data' entirely.
        let rows = payload
            .get("data")
            .and_then(Json::as_array)
            .map(|rows| {
                rows.iter()
                    .filter_map(|r| r.as_array().cloned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self { fields, rows })
    }

    pub(crate) fn column(&self, url: &str, name: &str) -> Result<usize, FetchError> {
        self.fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| FetchError::Decode {
                url: url.into(),
                detail: format!("missing '{name}' column"),
            })
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = &Vec<Json>> {
        self.rows.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Extract a trimmed, non-empty string from a cell.
pub(crate) fn cell_text(cell: Option<&Json>) -> Option<String> {
    let text = cell?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_owned())
    }
}

/// Extract a number from a cell; the feeds serialize most numerics as
/// strings.
pub(crate) fn cell_number(cell: Option<&Json>) -> Option<f64> {
    match cell? {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
