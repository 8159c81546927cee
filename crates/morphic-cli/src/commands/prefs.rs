//! Preferences record CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use morphic_core::error::AppError;
use morphic_entity::{PreferenceKey, PreferenceValue, Preferences};
use morphic_storage::{LoadStatus, Storage, require};

use crate::output::{self, OutputFormat};

/// Arguments for preferences commands
#[derive(Debug, Args)]
pub struct PrefsArgs {
    /// Preferences subcommand
    #[command(subcommand)]
    pub command: PrefsCommand,
}

/// Preferences subcommands
#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// Show the values of a record
    Show {
        /// Record identifier
        #[arg(default_value = "__default__")]
        id: String,
    },
    /// Set one value, creating the record if needed
    Set {
        /// Record identifier
        id: String,
        /// Key as `<solution>.<preference>`
        key: String,
        /// Value: true/false, a number, or text
        value: String,
        /// Owning user for a newly created record
        #[arg(long)]
        user: Option<String>,
    },
    /// Remove one value from a record
    Unset {
        /// Record identifier
        id: String,
        /// Key as `<solution>.<preference>`
        key: String,
    },
    /// Delete a whole record
    Remove {
        /// Record identifier
        id: String,
    },
    /// List stored record identifiers
    List,
}

/// Preference value row for table output
#[derive(Debug, Serialize, Tabled)]
struct ValueRow {
    /// Setting key
    key: String,
    /// Value kind
    kind: String,
    /// Value
    value: String,
}

/// Record summary row for table output
#[derive(Debug, Serialize, Tabled)]
struct RecordRow {
    /// Record identifier
    identifier: String,
    /// Owning user
    user_id: String,
    /// Number of values
    values: usize,
}

/// Execute preferences commands
pub async fn execute(
    args: &PrefsArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let storage = super::open_storage(&config).await?;

    match &args.command {
        PrefsCommand::Show { id } => {
            let (status, prefs) = storage.load::<Preferences>(id).await;
            let prefs = require(status, prefs, id)?;
            match format {
                OutputFormat::Json => output::print_item(&prefs, format),
                OutputFormat::Table => {
                    output::print_kv("Identifier", prefs.identifier());
                    output::print_kv("User", prefs.user_id().unwrap_or("-"));
                    output::print_list(&value_rows(&prefs), format);
                }
            }
        }
        PrefsCommand::Set {
            id,
            key,
            value,
            user,
        } => {
            let key: PreferenceKey = key.parse()?;
            let value = PreferenceValue::parse_lossy(value);
            let mut prefs = load_or_create(&storage, id, user.clone()).await?;
            prefs.set(key.clone(), value.clone());
            save(&storage, &prefs).await?;
            output::print_success(&format!("Set {key} = {value} ({}) in '{id}'", value.kind()));
        }
        PrefsCommand::Unset { id, key } => {
            let key: PreferenceKey = key.parse()?;
            let (status, prefs) = storage.load::<Preferences>(id).await;
            let mut prefs = require(status, prefs, id)?;
            if prefs.remove(&key).is_none() {
                output::print_warning(&format!("'{id}' has no value for {key}"));
                return Ok(());
            }
            save(&storage, &prefs).await?;
            output::print_success(&format!("Removed {key} from '{id}'"));
        }
        PrefsCommand::Remove { id } => {
            let (status, _) = storage.remove(&Preferences::new(id.clone())).await;
            match status {
                LoadStatus::Success => output::print_success(&format!("Removed record '{id}'")),
                LoadStatus::NotFound => output::print_warning(&format!("No record '{id}' to remove")),
                LoadStatus::Failure => {
                    return Err(AppError::storage(format!("Failed to remove record '{id}'")));
                }
            }
        }
        PrefsCommand::List => {
            let mut rows = Vec::new();
            for id in storage.identifiers::<Preferences>().await? {
                if let (LoadStatus::Success, Some(prefs)) = storage.load::<Preferences>(&id).await {
                    rows.push(RecordRow {
                        identifier: id,
                        user_id: prefs.user_id().unwrap_or("-").to_string(),
                        values: prefs.len(),
                    });
                }
            }
            output::print_list(&rows, format);
        }
    }

    Ok(())
}

fn value_rows(prefs: &Preferences) -> Vec<ValueRow> {
    prefs
        .iter()
        .map(|(key, value)| ValueRow {
            key: key.to_string(),
            kind: value.kind().to_string(),
            value: value.to_string(),
        })
        .collect()
}

async fn load_or_create(
    storage: &Storage,
    id: &str,
    user: Option<String>,
) -> Result<Preferences, AppError> {
    match storage.load::<Preferences>(id).await {
        (LoadStatus::Success, Some(prefs)) => Ok(prefs),
        (LoadStatus::NotFound, _) => {
            let mut prefs = Preferences::new(id);
            prefs.set_user_id(user);
            Ok(prefs)
        }
        (status, prefs) => require(status, prefs, id),
    }
}

async fn save(storage: &Storage, prefs: &Preferences) -> Result<(), AppError> {
    if storage.save(prefs).await {
        Ok(())
    } else {
        Err(AppError::storage(format!(
            "Failed to save record '{}'",
            prefs.identifier()
        )))
    }
}
