//! # morphic-storage
//!
//! Typed record storage for Morphic. A [`Storage`] persists records such as
//! preferences and users through a local backend (filesystem or memory),
//! keeps a moka read cache in front of it, and optionally mirrors every
//! change to the remote preferences server.
//!
//! Operations on the same identifier are serialized; operations on
//! different identifiers run concurrently.

pub mod backends;
pub mod cache;
pub mod keys;
pub mod manager;
pub mod storage;

pub use manager::BackendManager;
pub use cache::RecordCache;
pub use storage::{LoadStatus, Storage, require};
