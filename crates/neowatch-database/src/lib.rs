//! # neowatch-database
//!
//! PostgreSQL connection management, the schema-generic repository, and
//! the unit-of-work transaction scope for NeoWatch.

pub mod connection;
pub mod repository;
pub mod repositories;
pub mod uow;

pub use connection::DatabasePool;
pub use repository::{ConflictAction, Repository};
pub use uow::UnitOfWork;
