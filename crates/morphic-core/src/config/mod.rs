//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! an optional TOML file merged with `MORPHIC__`-prefixed environment
//! variables. Each sub-module represents a logical configuration section,
//! and every field has a default so an empty configuration is valid.

pub mod bar;
pub mod logging;
pub mod remote;
pub mod session;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::bar::BarConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::remote::RemoteConfig;
pub use self::session::SessionConfig;
pub use self::storage::{StorageCacheConfig, StorageConfig};

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Local record storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Remote preferences server settings.
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Capture/apply session settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Bar item definitions.
    #[serde(default)]
    pub bar: BarConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file and the environment.
    ///
    /// The file is optional; environment variables prefixed with
    /// `MORPHIC__` (e.g. `MORPHIC__SESSION__CALL_TIMEOUT_MS`) override it.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("MORPHIC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

fn default_true() -> bool {
    true
}
