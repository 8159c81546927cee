//! Bar item configuration.

use serde::{Deserialize, Serialize};

/// Where the bar's item list comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BarConfig {
    /// JSON file holding the list of bar items.
    #[serde(default)]
    pub items_path: Option<String>,
    /// Skip items whose type is not understood instead of failing.
    #[serde(default = "super::default_true")]
    pub skip_unknown: bool,
}
