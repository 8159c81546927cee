//! User management CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use morphic_core::error::AppError;
use morphic_entity::User;
use morphic_storage::{LoadStatus, require};

use crate::output::{self, OutputFormat};

/// Arguments for user commands
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user with a fresh preferences identifier
    Create {
        /// Given name
        #[arg(long)]
        first_name: Option<String>,
        /// Family name
        #[arg(long)]
        last_name: Option<String>,
        /// Email address
        #[arg(long)]
        email: Option<String>,
    },
    /// Show a user
    Show {
        /// User ID
        id: Uuid,
    },
    /// List all users
    List,
}

/// User display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// User ID
    id: String,
    /// Name
    name: String,
    /// Email
    email: String,
    /// Preferences record
    preferences_id: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.identifier.to_string(),
            name: user.full_name().unwrap_or_default(),
            email: user.email.clone().unwrap_or_default(),
            preferences_id: user.preferences_identifier().unwrap_or_default(),
        }
    }
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let storage = super::open_storage(&config).await?;

    match &args.command {
        UserCommand::Create {
            first_name,
            last_name,
            email,
        } => {
            let user = User {
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                email: email.clone(),
                ..User::new()
            };
            if !storage.save(&user).await {
                return Err(AppError::storage("Failed to save user"));
            }
            output::print_success(&format!("User '{}' created", user.identifier));
            output::print_item(&user, format);
        }
        UserCommand::Show { id } => {
            let id = id.to_string();
            let (status, user) = storage.load::<User>(&id).await;
            let user = require(status, user, &id)?;
            output::print_item(&user, format);
        }
        UserCommand::List => {
            let mut rows = Vec::new();
            for id in storage.identifiers::<User>().await? {
                if let (LoadStatus::Success, Some(user)) = storage.load::<User>(&id).await {
                    rows.push(UserRow::from(&user));
                }
            }
            output::print_list(&rows, format);
        }
    }

    Ok(())
}
