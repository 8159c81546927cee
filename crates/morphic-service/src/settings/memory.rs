//! In-process settings manager.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tokio::sync::Mutex;
use tracing::debug;

use morphic_core::error::AppError;
use morphic_core::result::AppResult;
use morphic_entity::{PreferenceKey, PreferenceValue};

use super::keys;
use super::manager::SettingsManager;

/// State of one registered setting.
#[derive(Debug, Clone, PartialEq)]
struct Setting {
    default: Option<PreferenceValue>,
    current: Option<PreferenceValue>,
}

/// Settings manager holding every setting in memory.
///
/// Only registered keys are supported; anything else is reported as
/// unsupported. Keys can be marked as rejected to simulate the system
/// refusing a write, and a per-call latency can be injected. Clones share
/// state.
#[derive(Debug, Clone, Default)]
pub struct InMemorySettingsManager {
    settings: Arc<DashMap<PreferenceKey, Setting>>,
    rejected: Arc<DashSet<PreferenceKey>>,
    writes: Arc<Mutex<Vec<(PreferenceKey, PreferenceValue)>>>,
    latency: Duration,
}

impl InMemorySettingsManager {
    /// An empty manager that supports no keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager with every well-known key registered at its default.
    pub fn with_well_known() -> Self {
        let manager = Self::new();
        for (key, default) in keys::well_known() {
            manager.register(key, Some(default.clone()), Some(default));
        }
        manager
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Register `key` with a declared default and a current value.
    pub fn register(
        &self,
        key: PreferenceKey,
        default: Option<PreferenceValue>,
        current: Option<PreferenceValue>,
    ) {
        self.settings.insert(key, Setting { default, current });
    }

    /// Overwrite the current value of a registered key without logging a write.
    pub fn set_current(&self, key: &PreferenceKey, value: impl Into<PreferenceValue>) -> bool {
        match self.settings.get_mut(key) {
            Some(mut setting) => {
                setting.current = Some(value.into());
                true
            }
            None => false,
        }
    }

    /// Put back a previously observed current value, including "unset".
    pub(crate) fn replace_current(&self, key: &PreferenceKey, value: Option<PreferenceValue>) {
        if let Some(mut setting) = self.settings.get_mut(key) {
            setting.current = value;
        }
    }

    /// The current value of `key`.
    pub fn current(&self, key: &PreferenceKey) -> Option<PreferenceValue> {
        self.settings.get(key).and_then(|s| s.current.clone())
    }

    /// Make every write to `key` fail.
    pub fn reject(&self, key: PreferenceKey) {
        self.rejected.insert(key);
    }

    /// Successful and failed writes, in the order they were attempted.
    pub async fn writes(&self) -> Vec<(PreferenceKey, PreferenceValue)> {
        self.writes.lock().await.clone()
    }

    /// Current values of every registered key, keyed by `"<solution>.<preference>"`.
    pub fn snapshot(&self) -> BTreeMap<String, PreferenceValue> {
        self.settings
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .current
                    .clone()
                    .map(|value| (entry.key().to_string(), value))
            })
            .collect()
    }

    /// Restore current values from a snapshot. Unknown or malformed keys are skipped.
    pub fn restore(&self, snapshot: &BTreeMap<String, PreferenceValue>) -> usize {
        let mut restored = 0;
        for (raw, value) in snapshot {
            let Ok(key) = raw.parse::<PreferenceKey>() else {
                debug!(key = %raw, "Skipping malformed key in snapshot");
                continue;
            };
            if self.set_current(&key, value.clone()) {
                restored += 1;
            }
        }
        restored
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn unsupported(key: &PreferenceKey) -> AppError {
        AppError::unsupported(format!("No setting handler for '{key}'"))
    }
}

#[async_trait]
impl SettingsManager for InMemorySettingsManager {
    async fn read_value(&self, key: &PreferenceKey) -> AppResult<Option<PreferenceValue>> {
        self.simulate_latency().await;
        self.settings
            .get(key)
            .map(|s| s.current.clone())
            .ok_or_else(|| Self::unsupported(key))
    }

    async fn default_value(&self, key: &PreferenceKey) -> AppResult<Option<PreferenceValue>> {
        self.simulate_latency().await;
        self.settings
            .get(key)
            .map(|s| s.default.clone())
            .ok_or_else(|| Self::unsupported(key))
    }

    async fn write_value(&self, key: &PreferenceKey, value: &PreferenceValue) -> AppResult<bool> {
        self.simulate_latency().await;
        self.writes.lock().await.push((key.clone(), value.clone()));

        if !self.settings.contains_key(key) {
            return Err(Self::unsupported(key));
        }
        if self.rejected.contains(key) {
            debug!(key = %key, "Write rejected");
            return Ok(false);
        }
        self.set_current(key, value.clone());
        debug!(key = %key, value = %value, "Setting written");
        Ok(true)
    }
}
