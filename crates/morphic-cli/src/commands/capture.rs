//! Capture CLI command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use morphic_core::error::AppError;
use morphic_entity::{PreferenceKey, Preferences};
use morphic_service::settings::keys;
use morphic_storage::{LoadStatus, require};

use crate::output::{self, OutputFormat};

/// Arguments for the capture command
#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// Record to capture into
    #[arg(long, default_value = "__default__")]
    pub prefs: String,
    /// Also record values that equal their defaults
    #[arg(long)]
    pub all_values: bool,
    /// Keys to capture; every well-known key when empty
    pub keys: Vec<String>,
}

/// Capture outcome row for table output
#[derive(Debug, Serialize, Tabled)]
struct OutcomeRow {
    /// Setting key
    key: String,
    /// Outcome
    outcome: String,
    /// Captured value
    value: String,
}

/// Execute the capture command
pub async fn execute(
    args: &CaptureArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let ctx = super::open_context(&config).await?;

    let keys: Vec<PreferenceKey> = if args.keys.is_empty() {
        keys::well_known().into_iter().map(|(key, _)| key).collect()
    } else {
        args.keys
            .iter()
            .map(|raw| raw.parse())
            .collect::<Result<_, _>>()?
    };

    let target = match ctx.storage.load::<Preferences>(&args.prefs).await {
        (LoadStatus::NotFound, _) => Preferences::new(args.prefs.clone()),
        (status, prefs) => require(status, prefs, &args.prefs)?,
    };

    let report = ctx
        .capture(target, keys)
        .capture_default_values(args.all_values)
        .run()
        .await;

    if !ctx.storage.save(&report.preferences).await {
        return Err(AppError::storage(format!(
            "Failed to save record '{}'",
            args.prefs
        )));
    }

    let rows: Vec<OutcomeRow> = report
        .outcomes
        .iter()
        .map(|(key, outcome)| OutcomeRow {
            key: key.to_string(),
            outcome: format!("{outcome:?}"),
            value: report
                .preferences
                .get(key)
                .filter(|_| outcome.is_captured())
                .map(ToString::to_string)
                .unwrap_or_default(),
        })
        .collect();
    output::print_list(&rows, format);
    output::print_success(&format!(
        "Captured {} of {} keys into '{}'",
        report.captured_count(),
        report.outcomes.len(),
        args.prefs
    ));
    Ok(())
}
