//! Close-approach entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use neowatch_core::types::{Column, ColumnKind, Entity, TableSchema};

/// One close approach of an asteroid to Earth, from the CAD feed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CloseApproach {
    /// Surrogate key, assigned by the store.
    pub id: i64,
    /// Designation of the approaching object.
    pub designation: String,
    /// Time of closest approach.
    pub approach_time: DateTime<Utc>,
    /// Nominal approach distance in AU.
    pub distance_au: Option<f64>,
    /// Nominal approach distance in kilometers.
    pub distance_km: Option<f64>,
    /// Relative velocity at closest approach, km/s.
    pub velocity_km_s: Option<f64>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Static schema for the `close_approaches` table.
///
/// The conflict key is compound: one object can approach Earth many times,
/// but only once at a given instant.
pub static CLOSE_APPROACH_SCHEMA: TableSchema = TableSchema {
    table: "close_approaches",
    columns: &[
        Column::required("id", ColumnKind::Integer),
        Column::required("designation", ColumnKind::Text),
        Column::required("approach_time", ColumnKind::Timestamp),
        Column::optional("distance_au", ColumnKind::Float),
        Column::optional("distance_km", ColumnKind::Float),
        Column::optional("velocity_km_s", ColumnKind::Float),
        Column::required("created_at", ColumnKind::Timestamp),
        Column::required("updated_at", ColumnKind::Timestamp),
    ],
    conflict_key: &["designation", "approach_time"],
};

impl Entity for CloseApproach {
    fn schema() -> &'static TableSchema {
        &CLOSE_APPROACH_SCHEMA
    }

    fn id(&self) -> i64 {
        self.id
    }
}
