//! Close-approach data client.
//!
//! Queries `cad.api` for Earth approaches inside a date window and
//! distance ceiling, and normalizes each event into close-approach record
//! data. Distance in kilometers is derived from the AU figure.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as Json;

use neowatch_core::error::AppError;
use neowatch_core::result::AppResult;
use neowatch_core::types::RecordData;

use crate::client::{cell_number, cell_text, FieldTable, NasaApiClient};

const KM_PER_AU: f64 = 149_597_870.7;

pub struct CadClient {
    api: NasaApiClient,
    url: String,
}

impl CadClient {
    pub fn new(api: NasaApiClient, url: impl Into<String>) -> Self {
        Self {
            api,
            url: url.into(),
        }
    }

    /// Fetch Earth close approaches from today through `window_days` ahead,
    /// capped at `max_distance_au`.
    pub async fn fetch_approaches(
        &self,
        window_days: u32,
        max_distance_au: f64,
    ) -> AppResult<Vec<RecordData>> {
        let params = vec![
            ("date-min", Utc::now().format("%Y-%m-%d").to_string()),
            ("date-max", format!("+{window_days}")),
            ("dist-max", max_distance_au.to_string()),
            ("body", "Earth".to_owned()),
            ("sort", "date".to_owned()),
        ];

        let payload = self
            .api
            .get_json("cad.fetch_approaches", &self.url, &params)
            .await?;
        let table = FieldTable::from_json(&self.url, &payload).map_err(AppError::from)?;

        let records = parse_approaches(&self.url, &table)?;
        tracing::info!(
            total = table.len(),
            kept = records.len(),
            "Fetched close-approach feed"
        );
        Ok(records)
    }
}

fn parse_approaches(url: &str, table: &FieldTable) -> AppResult<Vec<RecordData>> {
    let des = table.column(url, "des").map_err(AppError::from)?;
    let cd = table.column(url, "cd").map_err(AppError::from)?;
    let dist = table.column(url, "dist").map_err(AppError::from)?;
    let v_rel = table.column(url, "v_rel").map_err(AppError::from)?;

    let mut records = Vec::with_capacity(table.len());
    for row in table.rows() {
        let Some(designation) = cell_text(row.get(des)) else {
            continue;
        };
        let Some(approach_time) = cell_text(row.get(cd)).and_then(|s| parse_approach_time(&s))
        else {
            continue;
        };

        let mut data = RecordData::new()
            .set("designation", designation)
            .set("approach_time", approach_time);

        if let Some(distance_au) = cell_number(row.get(dist)) {
            data.insert("distance_au", distance_au);
            data.insert("distance_km", distance_au * KM_PER_AU);
        }
        if let Some(velocity) = cell_number(row.get(v_rel)) {
            data.insert("velocity_km_s", velocity);
        }

        records.push(data);
    }
    Ok(records)
}

/// Approach times come as `YYYY-Mon-DD HH:MM`, occasionally with seconds.
fn parse_approach_time(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, "%Y-%b-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%b-%d %H:%M:%S"))
        .ok()
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use neowatch_core::types::Value;
    use serde_json::json;

    #[test]
    fn parses_approach_rows() {
        let payload = json!({
            "fields": ["des", "orbit_id", "jd", "cd", "dist", "v_rel", "h"],
            "count": "2",
            "data": [
                ["433", "659", "2461234.5", "2026-Jan-15 12:34", "0.0421", "5.93", "10.31"],
                ["99942", "197", "2461300.5", "not a date", "0.01", "7.42", "19.7"]
            ]
        });
        let table = FieldTable::from_json("u", &payload).unwrap();
        let records = parse_approaches("u", &table).unwrap();

        // The unparseable timestamp drops its row.
        assert_eq!(records.len(), 1);
        let event = &records[0];
        assert_eq!(event.get("designation"), Some(&Value::Text("433".into())));
        assert_eq!(event.get("distance_au"), Some(&Value::Float(0.0421)));
        match event.get("distance_km") {
            Some(Value::Float(km)) => assert!((km - 0.0421 * KM_PER_AU).abs() < 1.0),
            other => panic!("unexpected distance_km: {other:?}"),
        }
    }

    #[test]
    fn approach_time_formats() {
        let t = parse_approach_time("2026-Feb-03 07:05").unwrap();
        assert_eq!(t.hour(), 7);
        assert!(parse_approach_time("2026-Feb-03 07:05:30").is_some());
        assert!(parse_approach_time("2026-02-03").is_none());
    }
}
