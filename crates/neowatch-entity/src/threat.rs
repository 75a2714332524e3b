//! Impact-risk assessment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use neowatch_core::types::{Column, ColumnKind, Entity, TableSchema};

/// An impact-risk assessment for one object, from the Sentry feed.
///
/// `threat_level` is a label derived upstream; the persistence layer treats
/// it as an opaque string.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ThreatAssessment {
    /// Surrogate key, assigned by the store.
    pub id: i64,
    /// Designation of the assessed object. One assessment per object.
    pub designation: String,
    /// Threat bucket label (e.g., `"low"`, `"elevated"`).
    pub threat_level: Option<String>,
    /// Cumulative impact probability.
    pub impact_probability: Option<f64>,
    /// Cumulative Palermo scale value.
    pub palermo_scale: Option<f64>,
    /// Maximum Torino scale value.
    pub torino_scale: Option<f64>,
    /// Estimated impact energy in megatons.
    pub energy_megatons: Option<f64>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Static schema for the `threat_assessments` table.
pub static THREAT_ASSESSMENT_SCHEMA: TableSchema = TableSchema {
    table: "threat_assessments",
    columns: &[
        Column::required("id", ColumnKind::Integer),
        Column::required("designation", ColumnKind::Text),
        Column::optional("threat_level", ColumnKind::Text),
        Column::optional("impact_probability", ColumnKind::Float),
        Column::optional("palermo_scale", ColumnKind::Float),
        Column::optional("torino_scale", ColumnKind::Float),
        Column::optional("energy_megatons", ColumnKind::Float),
        Column::required("created_at", ColumnKind::Timestamp),
        Column::required("updated_at", ColumnKind::Timestamp),
    ],
    conflict_key: &["designation"],
};

impl Entity for ThreatAssessment {
    fn schema() -> &'static TableSchema {
        &THREAT_ASSESSMENT_SCHEMA
    }

    fn id(&self) -> i64 {
        self.id
    }
}
