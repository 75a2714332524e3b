//! PostgreSQL pool settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;

/// Connection pool settings for the record store.
///
/// Only `url` has to be provided. Sizing and timeout defaults are tuned
/// for one sync worker plus a handful of interactive scopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    /// Upper bound on pooled connections.
    #[serde(default = "defaults::max_connections")]
    pub max_connections: u32,
    /// Connections kept warm while the pool is idle.
    #[serde(default = "defaults::min_connections")]
    pub min_connections: u32,
    /// How long an acquire may wait before failing, in seconds.
    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// How long an unused connection is retained, in seconds.
    #[serde(default = "defaults::idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    /// Translate these settings into sqlx pool options.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.connect_timeout())
            .idle_timeout(self.idle_timeout())
    }
}

mod defaults {
    pub(super) fn max_connections() -> u32 {
        10
    }

    pub(super) fn min_connections() -> u32 {
        2
    }

    pub(super) fn connect_timeout() -> u64 {
        10
    }

    pub(super) fn idle_timeout() -> u64 {
        300
    }
}
