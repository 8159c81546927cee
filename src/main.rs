//! Morphic menu bar host.
//!
//! Wires storage, the settings manager, and the session together, loads the
//! bar items, and dispatches `<item> <segment>` presses read from stdin
//! until input closes or a shutdown signal arrives.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

use morphic_core::config::{AppConfig, LogFormat};
use morphic_core::error::AppError;
use morphic_entity::BarItem;
use morphic_service::bar::load_items;
use morphic_service::{
    ControlDispatcher, DispatchResult, Session, SessionContext, StateFileSettingsManager,
};
use morphic_storage::Storage;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Menu bar host failed");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("MORPHIC_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    AppConfig::load(&config_path)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Open the session and serve bar presses until shutdown
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Morphic menu bar v{}", env!("CARGO_PKG_VERSION"));

    let storage = Storage::from_config(&config).await?;
    let settings = StateFileSettingsManager::open(&config.session.settings_state_path).await?;
    let context = SessionContext::new(storage, Arc::new(settings), config.session.clone());
    let session = Session::new(context);

    let user_id = parse_user_id(config.session.user_id.as_deref());
    let mut events = session.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(?event, "Session event");
        }
    });

    session.open(user_id).await?;
    match session.user().await {
        Some(user) => tracing::info!(user_id = %user.identifier, "Signed in"),
        None => tracing::info!("No user signed in, using default preferences"),
    }

    let items = load_items(&config.bar).await?;
    describe_bar(&items);

    let dispatcher = ControlDispatcher::new(session.clone());
    tokio::select! {
        _ = serve_presses(&dispatcher, &items) => {
            tracing::info!("Press input closed");
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
        }
    }

    if !session.save_preferences().await {
        tracing::warn!("Preferences were not saved on shutdown");
    }
    tracing::info!("Morphic menu bar stopped");
    Ok(())
}

/// Read `<item index> <segment>` presses from stdin and dispatch them
async fn serve_presses(dispatcher: &ControlDispatcher, items: &[BarItem]) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read press input");
                return;
            }
        };
        let Some((index, segment)) = parse_press(&line) else {
            tracing::warn!(input = %line, "Expected '<item> <segment>'");
            continue;
        };

        match items.get(index) {
            Some(BarItem::Control(control)) => {
                match dispatcher.perform(control.feature, segment).await {
                    Ok(DispatchResult::Applied(report)) => tracing::info!(
                        feature = %control.feature,
                        applied = report.applied_count(),
                        total = report.outcomes.len(),
                        "Control applied"
                    ),
                    Ok(DispatchResult::HotKeyRequired(_)) => tracing::info!(
                        feature = %control.feature,
                        "Speak-selected-text hotkey must be sent"
                    ),
                    Ok(DispatchResult::Ignored) => {
                        tracing::debug!(feature = %control.feature, "Press ignored")
                    }
                    Err(e) => tracing::warn!(feature = %control.feature, error = %e, "Press rejected"),
                }
            }
            Some(BarItem::Link(link)) => match link.safe_url() {
                Some(url) => tracing::info!(url, "Open link"),
                None => tracing::warn!(label = %link.label, "Link has no openable URL"),
            },
            None => tracing::warn!(index, "No bar item at index"),
        }
    }
}

/// Parse `<item index> <segment>`
fn parse_press(line: &str) -> Option<(usize, usize)> {
    let mut parts = line.split_whitespace();
    let index = parts.next()?.parse().ok()?;
    let segment = parts.next().map_or(Ok(0), str::parse).ok()?;
    Some((index, segment))
}

/// Parse the configured user, ignoring malformed identifiers
fn parse_user_id(raw: Option<&str>) -> Option<Uuid> {
    let raw = raw?;
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(user_id = raw, error = %e, "Ignoring malformed user id");
            None
        }
    }
}

/// Log the bar layout the host would render
fn describe_bar(items: &[BarItem]) {
    for (index, item) in items.iter().enumerate() {
        match item {
            BarItem::Link(link) => tracing::info!(
                index,
                label = %link.label,
                url = link.safe_url().unwrap_or("-"),
                "Bar link"
            ),
            BarItem::Control(control) => tracing::info!(
                index,
                feature = %control.feature,
                segments = control.feature.segment_count(),
                "Bar control"
            ),
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
