//! Bar item models and list parsing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use morphic_core::error::AppError;
use morphic_core::result::AppResult;

use super::feature::BarFeature;

/// URL schemes a link item is allowed to open.
const ALLOWED_LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// One entry on the bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BarItem {
    /// A button that opens a URL.
    Link(LinkItem),
    /// A segmented control bound to a system feature.
    Control(ControlItem),
}

/// A button that opens a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkItem {
    /// Button caption.
    #[serde(default)]
    pub label: String,
    /// Fill color as `#RRGGBB`.
    #[serde(default)]
    pub color: Option<String>,
    /// Icon name or URL.
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
    /// Target URL.
    #[serde(default)]
    pub url: Option<String>,
}

/// A segmented control bound to a system feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlItem {
    /// The feature operated by the control.
    #[serde(default)]
    pub feature: BarFeature,
}

impl LinkItem {
    /// Parse `color` into RGB components.
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        let hex = self.color.as_deref()?.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// The target URL, if present and using an allowed scheme.
    pub fn safe_url(&self) -> Option<&str> {
        let url = self.url.as_deref()?;
        let (scheme, rest) = url.split_once(':')?;
        let allowed = ALLOWED_LINK_SCHEMES
            .iter()
            .any(|s| s.eq_ignore_ascii_case(scheme));
        (allowed && !rest.is_empty()).then_some(url)
    }
}

impl BarItem {
    /// Parse a JSON array of bar items.
    ///
    /// Entries that are not objects or whose `type` is not understood are
    /// skipped when `skip_unknown` is set and rejected otherwise. A known
    /// type with malformed fields is always an error.
    pub fn parse_list(json: &str, skip_unknown: bool) -> AppResult<Vec<BarItem>> {
        let raw: Vec<Value> = serde_json::from_str(json)?;
        let mut items = Vec::with_capacity(raw.len());

        for (index, entry) in raw.into_iter().enumerate() {
            let kind = entry.get("type").and_then(Value::as_str);
            match kind {
                Some("link") | Some("control") => {
                    items.push(serde_json::from_value(entry)?);
                }
                _ if skip_unknown => continue,
                other => {
                    return Err(AppError::validation(format!(
                        "Bar item {index} has unsupported type {other:?}"
                    )));
                }
            }
        }

        Ok(items)
    }

    /// The feature, for control items.
    pub fn feature(&self) -> Option<BarFeature> {
        match self {
            Self::Control(control) => Some(control.feature),
            Self::Link(_) => None,
        }
    }
}
