//! Core type definitions used across the NeoWatch workspace.

pub mod filter;
pub mod record;
pub mod schema;
pub mod value;

pub use filter::{CoercedFilter, Filter, FilterOp, FilterSet};
pub use record::RecordData;
pub use schema::{Column, ColumnKind, Entity, TableSchema};
pub use value::Value;
