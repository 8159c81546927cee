//! Session context carrying the storage and settings collaborators.

use std::sync::Arc;

use morphic_core::config::SessionConfig;
use morphic_entity::{PreferenceKey, PreferenceValue, Preferences};
use morphic_storage::Storage;

use crate::apply::ApplySession;
use crate::capture::CaptureSession;
use crate::settings::{InMemorySettingsManager, SettingsManager};

/// Everything a session needs, constructed once and passed down.
///
/// Tests build one over in-memory storage and an in-memory settings
/// manager; the host binary builds one from configuration.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Record storage.
    pub storage: Storage,
    /// Live settings capability.
    pub settings: Arc<dyn SettingsManager>,
    /// Session tuning.
    pub config: SessionConfig,
}

impl SessionContext {
    /// Creates a new session context.
    pub fn new(storage: Storage, settings: Arc<dyn SettingsManager>, config: SessionConfig) -> Self {
        Self {
            storage,
            settings,
            config,
        }
    }

    /// A context over in-memory storage and the given settings manager.
    pub fn in_memory(settings: InMemorySettingsManager) -> Self {
        Self::new(
            Storage::in_memory(),
            Arc::new(settings),
            SessionConfig::default(),
        )
    }

    /// A capture session into `preferences`, tuned from configuration.
    pub fn capture(
        &self,
        preferences: Preferences,
        keys: impl IntoIterator<Item = PreferenceKey>,
    ) -> CaptureSession {
        CaptureSession::new(Arc::clone(&self.settings), preferences)
            .with_keys(keys)
            .call_timeout(self.config.call_timeout())
            .concurrency(self.config.capture_concurrency)
    }

    /// An apply session over `pairs`, tuned from configuration.
    pub fn apply(
        &self,
        pairs: impl IntoIterator<Item = (PreferenceKey, PreferenceValue)>,
    ) -> ApplySession {
        ApplySession::new(Arc::clone(&self.settings), pairs).call_timeout(self.config.call_timeout())
    }

    /// An apply session replaying every value of `preferences`.
    pub fn apply_preferences(&self, preferences: &Preferences) -> ApplySession {
        ApplySession::from_preferences(Arc::clone(&self.settings), preferences)
            .call_timeout(self.config.call_timeout())
    }
}
