//! Apply session: write an ordered list of values to the settings manager.
//!
//! The session is a small state machine:
//!
//! ```text
//! Pending -> InFlight(key) -> Recorded(key, outcome) -> InFlight(next) ... -> Done
//! ```
//!
//! Each write completes before the next begins. A failed write is recorded
//! and the queue keeps draining.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use morphic_core::error::ErrorKind;
use morphic_entity::{PreferenceKey, PreferenceValue, Preferences};

use crate::capture::DEFAULT_CALL_TIMEOUT;
use crate::settings::SettingsManager;

/// What happened to one pair during apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// The value was written.
    Applied,
    /// The system rejected the value or the write errored.
    Failed,
    /// The settings manager does not handle the key.
    Unsupported,
    /// The write did not finish within the call timeout.
    TimedOut,
}

impl ApplyOutcome {
    /// Whether the value was written.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Position of an apply session in its run.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyState {
    /// Nothing processed yet.
    Pending,
    /// A write to this key is outstanding.
    InFlight(PreferenceKey),
    /// The last write finished with this outcome.
    Recorded(PreferenceKey, ApplyOutcome),
    /// The queue is drained.
    Done,
}

/// Result of a drained apply session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Per-pair outcome, in processing order.
    pub outcomes: Vec<(PreferenceKey, ApplyOutcome)>,
    /// When the session finished.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ApplyReport {
    /// Outcome of the last write to `key`.
    pub fn outcome(&self, key: &PreferenceKey) -> Option<ApplyOutcome> {
        self.outcomes
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, outcome)| *outcome)
    }

    /// Keys in the order they were processed.
    pub fn order(&self) -> Vec<PreferenceKey> {
        self.outcomes.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Number of successful writes.
    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_applied()).count()
    }

    /// Whether every write succeeded.
    pub fn all_applied(&self) -> bool {
        self.outcomes.iter().all(|(_, o)| o.is_applied())
    }
}

/// Writes queued `(key, value)` pairs to a settings manager strictly in order.
#[derive(Debug)]
pub struct ApplySession {
    settings: Arc<dyn SettingsManager>,
    queue: VecDeque<(PreferenceKey, PreferenceValue)>,
    state: ApplyState,
    outcomes: Vec<(PreferenceKey, ApplyOutcome)>,
    call_timeout: Duration,
}

impl ApplySession {
    /// Create a session that applies `pairs` in the given order.
    pub fn new(
        settings: Arc<dyn SettingsManager>,
        pairs: impl IntoIterator<Item = (PreferenceKey, PreferenceValue)>,
    ) -> Self {
        Self {
            settings,
            queue: pairs.into_iter().collect(),
            state: ApplyState::Pending,
            outcomes: Vec::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Create a session that applies every value held by `preferences`.
    pub fn from_preferences(settings: Arc<dyn SettingsManager>, preferences: &Preferences) -> Self {
        Self::new(
            settings,
            preferences.iter().map(|(k, v)| (k.clone(), v.clone())),
        )
    }

    /// Bound each settings manager call.
    pub fn call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Append a pair to the end of the queue.
    pub fn add(&mut self, key: PreferenceKey, value: impl Into<PreferenceValue>) {
        self.queue.push_back((key, value.into()));
    }

    /// Insert a pair at the head of the queue.
    pub fn add_first(&mut self, key: PreferenceKey, value: impl Into<PreferenceValue>) {
        self.queue.push_front((key, value.into()));
    }

    /// Pairs not processed yet, head first.
    pub fn pending(&self) -> impl Iterator<Item = &(PreferenceKey, PreferenceValue)> {
        self.queue.iter()
    }

    /// Current state.
    pub fn state(&self) -> &ApplyState {
        &self.state
    }

    /// Whether the queue is drained.
    pub fn is_done(&self) -> bool {
        self.state == ApplyState::Done
    }

    /// Process the next pair, or move to `Done` when none remain.
    pub async fn step(&mut self) -> &ApplyState {
        if self.is_done() {
            return &self.state;
        }

        let Some((key, value)) = self.queue.pop_front() else {
            self.state = ApplyState::Done;
            return &self.state;
        };

        self.state = ApplyState::InFlight(key.clone());
        let outcome = self.write(&key, &value).await;
        self.outcomes.push((key.clone(), outcome));
        self.state = ApplyState::Recorded(key, outcome);
        &self.state
    }

    async fn write(&self, key: &PreferenceKey, value: &PreferenceValue) -> ApplyOutcome {
        match timeout(self.call_timeout, self.settings.write_value(key, value)).await {
            Ok(Ok(true)) => {
                debug!(key = %key, value = %value, "Applied setting");
                ApplyOutcome::Applied
            }
            Ok(Ok(false)) => {
                warn!(key = %key, value = %value, "Setting rejected the value");
                ApplyOutcome::Failed
            }
            Ok(Err(e)) if e.kind == ErrorKind::Unsupported => {
                warn!(key = %key, "Setting is not supported");
                ApplyOutcome::Unsupported
            }
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "Failed to apply setting");
                ApplyOutcome::Failed
            }
            Err(_) => {
                warn!(
                    key = %key,
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Applying setting timed out"
                );
                ApplyOutcome::TimedOut
            }
        }
    }

    /// Drain the queue and report every outcome.
    pub async fn run(mut self) -> ApplyReport {
        while !self.is_done() {
            self.step().await;
        }

        let report = ApplyReport {
            outcomes: self.outcomes,
            completed_at: Some(Utc::now()),
        };
        info!(
            pairs = report.outcomes.len(),
            applied = report.applied_count(),
            "Apply session completed"
        );
        report
    }

    /// Run on the runtime and hand the report to `on_complete` exactly once.
    pub fn spawn<F>(self, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(ApplyReport) + Send + 'static,
    {
        tokio::spawn(async move {
            let report = self.run().await;
            on_complete(report);
        })
    }
}
