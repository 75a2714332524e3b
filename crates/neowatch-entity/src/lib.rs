//! # neowatch-entity
//!
//! Domain entity models for NeoWatch. Every struct in this crate
//! represents a database table row; all entities derive `Debug`, `Clone`,
//! `Serialize`, `Deserialize`, and `sqlx::FromRow`, and bind a static
//! [`TableSchema`](neowatch_core::types::TableSchema) through the
//! [`Entity`](neowatch_core::types::Entity) trait.

pub mod approach;
pub mod asteroid;
pub mod threat;

pub use approach::CloseApproach;
pub use asteroid::Asteroid;
pub use threat::ThreatAssessment;
