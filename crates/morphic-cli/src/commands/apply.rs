//! Apply CLI command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use morphic_core::error::AppError;
use morphic_entity::{PreferenceKey, PreferenceValue, Preferences};
use morphic_storage::require;

use crate::output::{self, OutputFormat};

/// Arguments for the apply command
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Record to apply
    #[arg(long, default_value = "__default__")]
    pub prefs: String,
    /// Apply a single `<key>=<value>` pair first, before the record
    #[arg(long = "first", value_name = "KEY=VALUE")]
    pub first: Vec<String>,
}

/// Apply outcome row for table output
#[derive(Debug, Serialize, Tabled)]
struct OutcomeRow {
    /// Processing order
    step: usize,
    /// Setting key
    key: String,
    /// Outcome
    outcome: String,
}

/// Execute the apply command
pub async fn execute(
    args: &ApplyArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let ctx = super::open_context(&config).await?;

    let (status, prefs) = ctx.storage.load::<Preferences>(&args.prefs).await;
    let prefs = require(status, prefs, &args.prefs)?;

    let mut session = ctx.apply_preferences(&prefs);
    for pair in args.first.iter().rev() {
        let (key, value) = parse_pair(pair)?;
        session.add_first(key, value);
    }
    let report = session.run().await;

    let rows: Vec<OutcomeRow> = report
        .outcomes
        .iter()
        .enumerate()
        .map(|(step, (key, outcome))| OutcomeRow {
            step: step + 1,
            key: key.to_string(),
            outcome: format!("{outcome:?}"),
        })
        .collect();
    output::print_list(&rows, format);

    if report.all_applied() {
        output::print_success(&format!("Applied '{}'", args.prefs));
    } else {
        output::print_warning(&format!(
            "Applied {} of {} values from '{}'",
            report.applied_count(),
            report.outcomes.len(),
            args.prefs
        ));
    }
    Ok(())
}

fn parse_pair(pair: &str) -> Result<(PreferenceKey, PreferenceValue), AppError> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| AppError::validation(format!("Expected KEY=VALUE, got '{pair}'")))?;
    Ok((key.parse()?, PreferenceValue::parse_lossy(value)))
}
