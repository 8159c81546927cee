//! Capture session: read live settings into a preferences record.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use morphic_core::error::ErrorKind;
use morphic_entity::{PreferenceKey, PreferenceValue, Preferences};

use crate::settings::SettingsManager;

/// Default bound on a single settings manager call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// What happened to one key during capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureOutcome {
    /// The live value was written into the record.
    Captured,
    /// Omitted: the live value equals the declared default.
    EqualsDefault,
    /// Omitted: the settings manager does not know the key or has no value.
    Unresolved,
    /// Omitted: the settings manager reported an error.
    Failed,
    /// Omitted: the read did not finish within the call timeout.
    TimedOut,
}

impl CaptureOutcome {
    /// Whether the key ended up in the record.
    pub fn is_captured(&self) -> bool {
        matches!(self, Self::Captured)
    }
}

/// Result of a finished capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureReport {
    /// The populated record.
    pub preferences: Preferences,
    /// Per-key outcome, in the order the keys were supplied.
    pub outcomes: Vec<(PreferenceKey, CaptureOutcome)>,
    /// When the session finished.
    pub completed_at: DateTime<Utc>,
}

impl CaptureReport {
    /// Outcome recorded for `key`.
    pub fn outcome(&self, key: &PreferenceKey) -> Option<CaptureOutcome> {
        self.outcomes
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, outcome)| *outcome)
    }

    /// Number of keys written into the record.
    pub fn captured_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_captured()).count()
    }

    /// Keys left out of the record, with the reason.
    pub fn omitted(&self) -> impl Iterator<Item = &(PreferenceKey, CaptureOutcome)> {
        self.outcomes.iter().filter(|(_, o)| !o.is_captured())
    }
}

/// How one key resolved.
enum Resolution {
    Captured(PreferenceValue),
    Omitted(CaptureOutcome),
}

/// Reads a list of keys from a settings manager into a preferences record.
///
/// Reads run with bounded concurrency; their results are applied to the
/// record in the order the keys were supplied. An unreadable key is
/// omitted and never aborts the session.
#[derive(Debug)]
pub struct CaptureSession {
    settings: Arc<dyn SettingsManager>,
    preferences: Preferences,
    keys: Vec<PreferenceKey>,
    capture_default_values: bool,
    call_timeout: Duration,
    concurrency: usize,
}

impl CaptureSession {
    /// Create a session that captures into `preferences`.
    pub fn new(settings: Arc<dyn SettingsManager>, preferences: Preferences) -> Self {
        Self {
            settings,
            preferences,
            keys: Vec::new(),
            capture_default_values: false,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            concurrency: 1,
        }
    }

    /// Replace the key list.
    pub fn with_keys(mut self, keys: impl IntoIterator<Item = PreferenceKey>) -> Self {
        self.keys = keys.into_iter().collect();
        self
    }

    /// Append one key.
    pub fn add_key(&mut self, key: PreferenceKey) {
        self.keys.push(key);
    }

    /// Also write values that equal the setting's declared default.
    pub fn capture_default_values(mut self, capture: bool) -> Self {
        self.capture_default_values = capture;
        self
    }

    /// Bound each settings manager call.
    pub fn call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Number of keys read at once.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// The keys that will be captured.
    pub fn keys(&self) -> &[PreferenceKey] {
        &self.keys
    }

    /// Capture every key and return the populated record.
    pub async fn run(self) -> CaptureReport {
        let Self {
            settings,
            mut preferences,
            keys,
            capture_default_values,
            call_timeout,
            concurrency,
        } = self;

        let resolutions: Vec<(PreferenceKey, Resolution)> = stream::iter(keys)
            .map(|key| {
                let settings = Arc::clone(&settings);
                async move {
                    let resolution =
                        resolve(settings.as_ref(), &key, capture_default_values, call_timeout)
                            .await;
                    (key, resolution)
                }
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut outcomes = Vec::with_capacity(resolutions.len());
        for (key, resolution) in resolutions {
            let outcome = match resolution {
                Resolution::Captured(value) => {
                    preferences.set(key.clone(), value);
                    CaptureOutcome::Captured
                }
                Resolution::Omitted(outcome) => outcome,
            };
            outcomes.push((key, outcome));
        }

        let report = CaptureReport {
            preferences,
            outcomes,
            completed_at: Utc::now(),
        };
        info!(
            identifier = report.preferences.identifier(),
            keys = report.outcomes.len(),
            captured = report.captured_count(),
            "Capture session completed"
        );
        report
    }

    /// Run on the runtime and hand the report to `on_complete` exactly once.
    pub fn spawn<F>(self, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(CaptureReport) + Send + 'static,
    {
        tokio::spawn(async move {
            let report = self.run().await;
            on_complete(report);
        })
    }
}

async fn resolve(
    settings: &dyn SettingsManager,
    key: &PreferenceKey,
    capture_default_values: bool,
    call_timeout: Duration,
) -> Resolution {
    let live = match timeout(call_timeout, settings.read_value(key)).await {
        Ok(Ok(Some(value))) => value,
        Ok(Ok(None)) => {
            debug!(key = %key, "Setting has no readable value");
            return Resolution::Omitted(CaptureOutcome::Unresolved);
        }
        Ok(Err(e)) if e.kind == ErrorKind::Unsupported => {
            debug!(key = %key, "Setting is not supported");
            return Resolution::Omitted(CaptureOutcome::Unresolved);
        }
        Ok(Err(e)) => {
            warn!(key = %key, error = %e, "Failed to read setting");
            return Resolution::Omitted(CaptureOutcome::Failed);
        }
        Err(_) => {
            warn!(key = %key, timeout_ms = call_timeout.as_millis() as u64, "Reading setting timed out");
            return Resolution::Omitted(CaptureOutcome::TimedOut);
        }
    };

    if capture_default_values {
        return Resolution::Captured(live);
    }

    let default = match timeout(call_timeout, settings.default_value(key)).await {
        Ok(Ok(default)) => default,
        Ok(Err(e)) => {
            debug!(key = %key, error = %e, "No default available, capturing live value");
            None
        }
        Err(_) => {
            debug!(key = %key, "Default lookup timed out, capturing live value");
            None
        }
    };

    match default {
        Some(default) if default.matches(&live) => {
            debug!(key = %key, "Live value equals default, omitting");
            Resolution::Omitted(CaptureOutcome::EqualsDefault)
        }
        _ => Resolution::Captured(live),
    }
}
