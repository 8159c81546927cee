//! Typed records that the storage layer knows how to persist.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::result::AppResult;

/// An identity-bearing entity that can be saved, loaded, and removed.
///
/// `KIND` scopes the identifier space: a `User` and a `Preferences` record
/// may share an identifier without colliding.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Storage scope for this record type (e.g. `"preferences"`).
    const KIND: &'static str;

    /// The identifier this record is stored under.
    fn identifier(&self) -> String;

    /// A record to return when nothing is stored under `identifier`.
    ///
    /// Returning `Some` means loads of that identifier never report
    /// "not found".
    fn fallback(_identifier: &str) -> Option<Self> {
        None
    }

    /// Check record-level invariants before saving or after decoding.
    fn validate(&self) -> AppResult<()> {
        Ok(())
    }
}
