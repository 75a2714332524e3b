//! # neowatch-core
//!
//! Core crate for NeoWatch. Contains configuration schemas, filter and
//! schema descriptor types, the retry policy, the event observer seam,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other NeoWatch crates.

pub mod config;
pub mod error;
pub mod observe;
pub mod result;
pub mod retry;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
