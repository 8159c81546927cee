//! # morphic-entity
//!
//! Domain entity models for Morphic. Every struct in this crate is either
//! a storable record (`Preferences`, `User`) or a value object carried by
//! one (`PreferenceKey`, `PreferenceValue`, bar items). All entities derive
//! `Debug`, `Clone`, `Serialize`, and `Deserialize`.

pub mod bar;
pub mod preferences;
pub mod user;

pub use bar::{BarFeature, BarItem};
pub use preferences::{PreferenceKey, PreferenceValue, Preferences};
pub use user::User;
