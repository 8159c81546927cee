//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use morphic_core::error::AppError;
use morphic_core::traits::RecordBackend;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration and check that storage is reachable
    Validate,
    /// Generate a default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config/generated.toml")]
        output: String,
    },
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(config_path)?;
            if config.remote.auth_token.is_some() {
                config.remote.auth_token = Some("****".to_string());
            }
            match format {
                OutputFormat::Json => output::print_item(&config, format),
                OutputFormat::Table => {
                    output::print_kv("Storage provider", &config.storage.provider);
                    output::print_kv("Data root", &config.storage.data_root);
                    output::print_kv(
                        "Cache",
                        &format!(
                            "{} entries, {}s TTL",
                            config.storage.cache.max_capacity,
                            config.storage.cache.time_to_live_seconds
                        ),
                    );
                    output::print_kv(
                        "Remote",
                        if config.remote.enabled {
                            &config.remote.endpoint
                        } else {
                            "disabled"
                        },
                    );
                    output::print_kv(
                        "Call timeout",
                        &format!("{}ms", config.session.call_timeout_ms),
                    );
                    output::print_kv(
                        "Settings state",
                        &config.session.settings_state_path,
                    );
                    output::print_kv(
                        "Logging",
                        &format!("{} ({})", config.logging.level, config.logging.format),
                    );
                }
            }
        }
        ConfigCommand::Validate => match super::load_config(config_path) {
            Ok(config) => {
                let storage = super::open_storage(&config).await?;
                let healthy = storage.local().health_check().await?;
                output::print_success(&format!("Configuration '{config_path}' is valid"));
                output::print_kv("Storage", &config.storage.provider);
                output::print_kv("Storage healthy", &healthy.to_string());
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {e}"));
                return Err(e);
            }
        },
        ConfigCommand::Generate { output: out_path } => {
            let default_config = include_str!("../../../../config/default.toml");

            if let Some(parent) = std::path::Path::new(out_path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(out_path, default_config).await?;

            output::print_success(&format!("Default config written to '{out_path}'"));
        }
    }

    Ok(())
}
