//! Settings manager contract.

use std::fmt::Debug;

use async_trait::async_trait;

use morphic_core::result::AppResult;
use morphic_entity::{PreferenceKey, PreferenceValue};

/// Reads and writes the live value of individual settings.
///
/// Implementations report a key they cannot handle with
/// [`ErrorKind::Unsupported`](morphic_core::error::ErrorKind::Unsupported).
/// Every call may suspend on an OS round-trip.
#[async_trait]
pub trait SettingsManager: Send + Sync + Debug + 'static {
    /// The current value of `key`, or `None` when it cannot be read.
    async fn read_value(&self, key: &PreferenceKey) -> AppResult<Option<PreferenceValue>>;

    /// The hard-coded default of `key`, if one is declared.
    async fn default_value(&self, key: &PreferenceKey) -> AppResult<Option<PreferenceValue>>;

    /// Write `value` to `key`. `Ok(false)` means the system rejected it.
    async fn write_value(&self, key: &PreferenceKey, value: &PreferenceValue) -> AppResult<bool>;
}
