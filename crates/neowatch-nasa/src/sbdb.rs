//! Small-Body Database query client.
//!
//! Pulls the potentially-hazardous-asteroid catalog from `sbdb_query.api`
//! and normalizes each row into asteroid record data. The feed serializes
//! numerics as strings and omits unknown physical parameters, so every
//! field except the designation is treated as optional.

use chrono::NaiveDateTime;
use serde_json::Value as Json;

use neowatch_core::error::AppError;
use neowatch_core::result::AppResult;
use neowatch_core::types::RecordData;

use crate::client::{cell_number, cell_text, FieldTable, NasaApiClient};

const SBDB_FIELDS: &str = "pdes,name,H,diameter,albedo,q,ad,moid,neo,pha,soln_date";

pub struct SbdbClient {
    api: NasaApiClient,
    url: String,
}

impl SbdbClient {
    pub fn new(api: NasaApiClient, url: impl Into<String>) -> Self {
        Self {
            api,
            url: url.into(),
        }
    }

    /// Fetch the PHA catalog, normalized for the asteroids table.
    ///
    /// Rows without a designation are dropped rather than failing the
    /// whole feed.
    pub async fn fetch_asteroids(&self, limit: Option<u32>) -> AppResult<Vec<RecordData>> {
        let mut params = vec![
            ("fields", SBDB_FIELDS.to_owned()),
            ("sb-group", "pha".to_owned()),
        ];
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }

        let payload = self
            .api
            .get_json("sbdb.fetch_asteroids", &self.url, &params)
            .await?;
        let table = FieldTable::from_json(&self.url, &payload).map_err(AppError::from)?;

        let records = parse_catalog(&self.url, &table)?;
        tracing::info!(
            total = table.len(),
            kept = records.len(),
            "Fetched SBDB asteroid catalog"
        );
        Ok(records)
    }
}

fn parse_catalog(url: &str, table: &FieldTable) -> AppResult<Vec<RecordData>> {
    let des = table.column(url, "pdes").map_err(AppError::from)?;
    let name = table.column(url, "name").map_err(AppError::from)?;
    let h_mag = table.column(url, "H").map_err(AppError::from)?;
    let diameter = table.column(url, "diameter").map_err(AppError::from)?;
    let albedo = table.column(url, "albedo").map_err(AppError::from)?;
    let perihelion = table.column(url, "q").map_err(AppError::from)?;
    let aphelion = table.column(url, "ad").map_err(AppError::from)?;
    let moid = table.column(url, "moid").map_err(AppError::from)?;
    let neo = table.column(url, "neo").map_err(AppError::from)?;
    let pha = table.column(url, "pha").map_err(AppError::from)?;
    let soln_date = table.column(url, "soln_date").map_err(AppError::from)?;

    let mut records = Vec::with_capacity(table.len());
    for row in table.rows() {
        let Some(designation) = cell_text(row.get(des)) else {
            continue;
        };

        let mut data = RecordData::new()
            .set("designation", designation)
            .set("is_neo", flag(row.get(neo)))
            .set("is_pha", flag(row.get(pha)));

        if let Some(value) = cell_text(row.get(name)) {
            data.insert("name", value);
        }
        set_number(&mut data, "absolute_magnitude", row.get(h_mag));
        set_number(&mut data, "estimated_diameter_km", row.get(diameter));
        set_number(&mut data, "albedo", row.get(albedo));
        set_number(&mut data, "perihelion_au", row.get(perihelion));
        set_number(&mut data, "aphelion_au", row.get(aphelion));
        set_number(&mut data, "earth_moid_au", row.get(moid));
        if let Some(updated) = cell_text(row.get(soln_date)).and_then(|s| parse_solution_date(&s)) {
            data.insert("last_orbit_update", updated);
        }

        records.push(data);
    }
    Ok(records)
}

fn set_number(data: &mut RecordData, field: &str, cell: Option<&Json>) {
    if let Some(value) = cell_number(cell) {
        data.insert(field, value);
    }
}

fn flag(cell: Option<&Json>) -> bool {
    matches!(cell.and_then(Json::as_str), Some("Y") | Some("y"))
}

/// Orbit solution dates come as `YYYY-MM-DD HH:MM[:SS]`.
fn parse_solution_date(text: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M"))
        .ok()
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neowatch_core::types::Value;
    use serde_json::json;

    fn catalog_payload() -> Json {
        json!({
            "fields": ["pdes", "name", "H", "diameter", "albedo", "q", "ad",
                       "moid", "neo", "pha", "soln_date"],
            "count": "3",
            "data": [
                ["433", "Eros", "10.31", "16.84", "0.25", "1.133", "1.783",
                 "0.148", "Y", "N", "2024-01-12 06:24"],
                ["99942", "Apophis", "19.7", null, null, ".746", "1.099",
                 "0.000254", "Y", "Y", "2023-11-02 11:10:05"],
                [null, "orphan row", "20.0", null, null, null, null, null,
                 "N", "N", null]
            ]
        })
    }

    #[test]
    fn parses_and_normalizes_catalog_rows() {
        let payload = catalog_payload();
        let table = FieldTable::from_json("u", &payload).unwrap();
        let records = parse_catalog("u", &table).unwrap();

        // The row without a designation is dropped.
        assert_eq!(records.len(), 2);

        let eros = &records[0];
        assert_eq!(eros.get("designation"), Some(&Value::Text("433".into())));
        assert_eq!(eros.get("absolute_magnitude"), Some(&Value::Float(10.31)));
        assert_eq!(eros.get("is_neo"), Some(&Value::Boolean(true)));
        assert_eq!(eros.get("is_pha"), Some(&Value::Boolean(false)));
        assert!(matches!(
            eros.get("last_orbit_update"),
            Some(Value::Timestamp(_))
        ));

        let apophis = &records[1];
        assert_eq!(apophis.get("estimated_diameter_km"), None);
        assert_eq!(apophis.get("perihelion_au"), Some(&Value::Float(0.746)));
        assert_eq!(apophis.get("is_pha"), Some(&Value::Boolean(true)));
    }

    #[test]
    fn missing_catalog_column_is_an_error() {
        let payload = json!({"fields": ["pdes"], "data": []});
        let table = FieldTable::from_json("u", &payload).unwrap();
        assert!(parse_catalog("u", &table).is_err());
    }
}
