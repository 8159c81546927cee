//! CLI command definitions and dispatch.

pub mod apply;
pub mod capture;
pub mod config;
pub mod prefs;
pub mod user;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use morphic_core::config::AppConfig;
use morphic_core::error::AppError;
use morphic_service::{SessionContext, StateFileSettingsManager};
use morphic_storage::Storage;

use crate::output::OutputFormat;

/// Morphic: accessibility preferences capture, apply, and storage
#[derive(Debug, Parser)]
#[command(name = "morphic", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Preferences record management
    Prefs(prefs::PrefsArgs),
    /// User management
    User(user::UserArgs),
    /// Capture live settings into a preferences record
    Capture(capture::CaptureArgs),
    /// Apply a preferences record to the live settings
    Apply(apply::ApplyArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Prefs(args) => prefs::execute(args, &self.config, self.format).await,
            Commands::User(args) => user::execute(args, &self.config, self.format).await,
            Commands::Capture(args) => capture::execute(args, &self.config, self.format).await,
            Commands::Apply(args) => apply::execute(args, &self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: open record storage from config
pub async fn open_storage(config: &AppConfig) -> Result<Storage, AppError> {
    tracing::debug!(
        provider = %config.storage.provider,
        data_root = %config.storage.data_root,
        remote = config.remote.enabled,
        "Opening storage"
    );
    Storage::from_config(config).await
}

/// Helper: build a session context over the configured storage and the
/// settings state file
pub async fn open_context(config: &AppConfig) -> Result<SessionContext, AppError> {
    let storage = open_storage(config).await?;
    let settings = StateFileSettingsManager::open(&config.session.settings_state_path).await?;
    Ok(SessionContext::new(
        storage,
        Arc::new(settings),
        config.session.clone(),
    ))
}
