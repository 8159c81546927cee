//! # morphic-core
//!
//! Core crate for Morphic. Contains the storage traits, configuration
//! schemas, identifier validation, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Morphic crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
