//! Preference domain entities.

pub mod key;
pub mod model;
pub mod value;

pub use key::PreferenceKey;
pub use model::{DEFAULT_PREFERENCES_ID, Preferences};
pub use value::PreferenceValue;
