//! Record identifier validation and storage key construction.

use crate::error::AppError;
use crate::result::AppResult;

/// Longest identifier accepted as a storage key component.
const MAX_IDENTIFIER_LEN: usize = 255;

/// Check that `identifier` is safe to use as a storage key component.
///
/// Identifiers end up as file names and URL path segments, so path
/// separators, a leading `.`, and control characters are rejected.
pub fn validate_identifier(identifier: &str) -> AppResult<()> {
    if identifier.is_empty() {
        return Err(AppError::validation("Identifier must not be empty"));
    }
    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(AppError::validation(format!(
            "Identifier exceeds {MAX_IDENTIFIER_LEN} bytes"
        )));
    }
    // Dot-prefixed names are reserved for temporary files.
    if identifier.starts_with('.') {
        return Err(AppError::validation(format!(
            "Identifier '{identifier}' must not start with '.'"
        )));
    }
    if identifier
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(AppError::validation(format!(
            "Identifier '{identifier}' contains a path separator or control character"
        )));
    }
    Ok(())
}
