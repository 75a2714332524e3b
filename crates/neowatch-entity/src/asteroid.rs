//! Asteroid entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use neowatch_core::types::{Column, ColumnKind, Entity, TableSchema};

/// A near-Earth asteroid from the SBDB orbital catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Asteroid {
    /// Surrogate key, assigned by the store.
    pub id: i64,
    /// Primary designation (e.g., `"433"` or `"2024 YR4"`). Natural key.
    pub designation: String,
    /// Proper name, if the object has one (e.g., `"Eros"`).
    pub name: Option<String>,
    /// Absolute magnitude H.
    pub absolute_magnitude: Option<f64>,
    /// Estimated diameter in kilometers.
    pub estimated_diameter_km: Option<f64>,
    /// Geometric albedo.
    pub albedo: Option<f64>,
    /// Perihelion distance in AU.
    pub perihelion_au: Option<f64>,
    /// Aphelion distance in AU.
    pub aphelion_au: Option<f64>,
    /// Minimum orbit intersection distance with Earth, in AU.
    pub earth_moid_au: Option<f64>,
    /// Whether the object is a near-Earth object.
    pub is_neo: bool,
    /// Whether the object is classified as potentially hazardous.
    pub is_pha: bool,
    /// When the orbital elements were last refreshed upstream.
    pub last_orbit_update: Option<DateTime<Utc>>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Static schema for the `asteroids` table.
pub static ASTEROID_SCHEMA: TableSchema = TableSchema {
    table: "asteroids",
    columns: &[
        Column::required("id", ColumnKind::Integer),
        Column::required("designation", ColumnKind::Text),
        Column::optional("name", ColumnKind::Text),
        Column::optional("absolute_magnitude", ColumnKind::Float),
        Column::optional("estimated_diameter_km", ColumnKind::Float),
        Column::optional("albedo", ColumnKind::Float),
        Column::optional("perihelion_au", ColumnKind::Float),
        Column::optional("aphelion_au", ColumnKind::Float),
        Column::optional("earth_moid_au", ColumnKind::Float),
        Column::optional("is_neo", ColumnKind::Boolean),
        Column::optional("is_pha", ColumnKind::Boolean),
        Column::optional("last_orbit_update", ColumnKind::Timestamp),
        Column::required("created_at", ColumnKind::Timestamp),
        Column::required("updated_at", ColumnKind::Timestamp),
    ],
    conflict_key: &["designation"],
};

impl Entity for Asteroid {
    fn schema() -> &'static TableSchema {
        &ASTEROID_SCHEMA
    }

    fn id(&self) -> i64 {
        self.id
    }
}
