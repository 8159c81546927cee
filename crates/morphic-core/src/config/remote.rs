//! Remote preferences server configuration.

use serde::{Deserialize, Serialize};

/// Connection settings for the remote preferences server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Whether records are synchronized with the remote server.
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the server, e.g. `https://morphic.example.org/`.
    #[serde(default)]
    pub endpoint: String,
    /// Token sent in the `X-Morphic-Auth-Token` header.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            auth_token: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}
