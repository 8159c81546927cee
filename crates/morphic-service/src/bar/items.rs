//! Load the bar's item list.

use tokio::fs;
use tracing::info;

use morphic_core::config::BarConfig;
use morphic_core::error::{AppError, ErrorKind};
use morphic_core::result::AppResult;
use morphic_entity::BarItem;

/// Read the items configured in `config`. No configured file means no items.
pub async fn load_items(config: &BarConfig) -> AppResult<Vec<BarItem>> {
    let Some(path) = &config.items_path else {
        return Ok(Vec::new());
    };

    let json = fs::read_to_string(path).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Configuration,
            format!("Failed to read bar items: {path}"),
            e,
        )
    })?;
    let items = BarItem::parse_list(&json, config.skip_unknown)?;
    info!(path = %path, count = items.len(), "Loaded bar items");
    Ok(items)
}
