//! Capture/apply session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings that govern how sessions talk to the settings manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Upper bound on a single settings manager read or write, in milliseconds.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_ms: u64,
    /// How many keys a capture session reads at once.
    #[serde(default = "default_capture_concurrency")]
    pub capture_concurrency: usize,
    /// Replay the user's preferences onto the system when the session opens.
    #[serde(default)]
    pub apply_on_open: bool,
    /// User to open the session with. `None` opens with the default record.
    #[serde(default)]
    pub user_id: Option<String>,
    /// JSON file backing the simulated settings manager.
    #[serde(default = "default_settings_state_path")]
    pub settings_state_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout(),
            capture_concurrency: default_capture_concurrency(),
            apply_on_open: false,
            user_id: None,
            settings_state_path: default_settings_state_path(),
        }
    }
}

impl SessionConfig {
    /// The per-call timeout as a [`Duration`].
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

fn default_call_timeout() -> u64 {
    5000
}

fn default_capture_concurrency() -> usize {
    4
}

fn default_settings_state_path() -> String {
    "./data/morphic/settings.json".to_string()
}
