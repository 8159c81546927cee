//! Storage key builders for all Morphic records.
//!
//! Centralising key construction keeps the `"<kind>/<identifier>"` layout
//! in one place for every backend.

/// Storage key for a record of `kind` with the given identifier.
pub fn record(kind: &str, identifier: &str) -> String {
    format!("{kind}/{identifier}")
}

/// Prefix shared by every key of `kind`.
pub fn kind_prefix(kind: &str) -> String {
    format!("{kind}/")
}

/// Recover the identifier from a key of `kind`.
pub fn identifier<'a>(kind: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(kind)?
        .strip_prefix('/')
        .filter(|id| !id.is_empty())
}
