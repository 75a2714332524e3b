//! Sync pipeline configuration.

use serde::{Deserialize, Serialize};

/// Settings for the feed-to-database sync pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How far ahead the close-approach window reaches, in days.
    #[serde(default = "default_window_days")]
    pub approach_window_days: u32,
    /// Maximum close-approach distance to request, in AU.
    #[serde(default = "default_max_distance")]
    pub max_approach_distance_au: f64,
    /// Optional cap on fetched asteroid records (None = full catalog).
    #[serde(default)]
    pub asteroid_limit: Option<u32>,
    /// Seconds between runs when the binary runs in loop mode.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            approach_window_days: default_window_days(),
            max_approach_distance_au: default_max_distance(),
            asteroid_limit: None,
            interval_seconds: default_interval(),
        }
    }
}

fn default_window_days() -> u32 {
    3_650
}

fn default_max_distance() -> f64 {
    0.05
}

fn default_interval() -> u64 {
    86_400
}
