//! # neowatch-service
//!
//! Orchestration of the NASA feed synchronization: concurrent fetches,
//! one transactional write scope, one commit.

pub mod sync;

pub use sync::{SyncReport, SyncService, SyncSummary};
