//! Sentry impact-risk client.
//!
//! Queries `sentry.api` for every object with a non-zero cumulative impact
//! probability and normalizes each summary into threat-assessment record
//! data. Impact energy is estimated from the reported diameter and
//! velocity assuming a stony body; the threat level is bucketed from the
//! Palermo scale and stored as plain text.

use std::f64::consts::PI;

use serde_json::Value as Json;

use neowatch_core::result::AppResult;
use neowatch_core::types::RecordData;

use crate::client::NasaApiClient;

/// Stony-asteroid bulk density, kg/m^3.
const ASSUMED_DENSITY: f64 = 2000.0;
/// Joules per megaton of TNT.
const JOULES_PER_MEGATON: f64 = 4.184e15;

pub struct SentryClient {
    api: NasaApiClient,
    url: String,
}

impl SentryClient {
    pub fn new(api: NasaApiClient, url: impl Into<String>) -> Self {
        Self {
            api,
            url: url.into(),
        }
    }

    /// Fetch the current impact-risk list, normalized for the
    /// threat_assessments table.
    pub async fn fetch_impact_risks(&self) -> AppResult<Vec<RecordData>> {
        let params = vec![("ip-min", "1e-10".to_owned())];
        let payload = self
            .api
            .get_json("sentry.fetch_impact_risks", &self.url, &params)
            .await?;

        let records = parse_risks(&payload);
        tracing::info!(kept = records.len(), "Fetched Sentry impact-risk feed");
        Ok(records)
    }
}

fn parse_risks(payload: &Json) -> Vec<RecordData> {
    let Some(items) = payload.get("data").and_then(Json::as_array) else {
        return Vec::new();
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let Some(designation) = item
            .get("des")
            .and_then(Json::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            continue;
        };

        let palermo = field_number(item, "ps_max").or_else(|| field_number(item, "ps_cum"));
        let torino = field_number(item, "ts_max");
        let probability = field_number(item, "ip");
        let diameter_km = field_number(item, "diameter");
        let velocity_km_s = field_number(item, "v_inf");

        let mut data = RecordData::new().set("designation", designation);
        if let Some(ip) = probability {
            data.insert("impact_probability", ip);
        }
        if let Some(ps) = palermo {
            data.insert("palermo_scale", ps);
            data.insert("threat_level", threat_level(ps));
        }
        if let Some(ts) = torino {
            data.insert("torino_scale", ts);
        }
        if let (Some(d), Some(v)) = (diameter_km, velocity_km_s) {
            data.insert("energy_megatons", impact_energy_megatons(d, v));
        }

        records.push(data);
    }
    records
}

/// Sentry serializes numerics inconsistently across objects.
fn field_number(item: &Json, key: &str) -> Option<f64> {
    match item.get(key)? {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Palermo-scale buckets, stored as opaque text.
fn threat_level(palermo: f64) -> &'static str {
    if palermo >= 0.0 {
        "critical"
    } else if palermo >= -2.0 {
        "high"
    } else if palermo >= -4.0 {
        "moderate"
    } else {
        "low"
    }
}

/// Kinetic energy of a spherical stony body, in megatons of TNT.
fn impact_energy_megatons(diameter_km: f64, velocity_km_s: f64) -> f64 {
    let radius_m = diameter_km * 1000.0 / 2.0;
    let volume_m3 = (4.0 / 3.0) * PI * radius_m.powi(3);
    let mass_kg = ASSUMED_DENSITY * volume_m3;
    let velocity_m_s = velocity_km_s * 1000.0;
    0.5 * mass_kg * velocity_m_s * velocity_m_s / JOULES_PER_MEGATON
}
