//! # neowatch-nasa
//!
//! Clients for the three JPL SSD feeds NeoWatch ingests: the Small-Body
//! Database query API (orbital catalog), the close-approach data API, and
//! the Sentry impact-risk API. Each client normalizes its payload into
//! [`RecordData`](neowatch_core::types::RecordData) rows ready for bulk
//! upsert, and wraps every request in the configured retry policy.

pub mod cad;
pub mod client;
pub mod sbdb;
pub mod sentry;

pub use cad::CadClient;
pub use client::{FetchError, NasaApiClient};
pub use sbdb::SbdbClient;
pub use sentry::SentryClient;
