//! Core traits defined in `morphic-core` and implemented by other crates.

pub mod backend;
pub mod record;

pub use backend::RecordBackend;
pub use record::Record;
