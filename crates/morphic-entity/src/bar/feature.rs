//! Controls a bar item can host.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The system feature a control item operates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarFeature {
    /// Display zoom in/out.
    Resolution,
    /// Screen magnifier show/hide.
    Magnifier,
    /// Screen reader on/off.
    Reader,
    /// Read the selected text aloud.
    ReadSelected,
    /// Volume up/down/mute.
    Volume,
    /// Increased contrast on/off.
    Contrast,
    /// Night shift on/off.
    NightShift,
    /// Anything else; rendered as nothing.
    #[default]
    #[serde(other)]
    Unknown,
}

impl BarFeature {
    /// Number of segments the control shows.
    pub fn segment_count(&self) -> usize {
        match self {
            Self::Volume => 3,
            Self::ReadSelected => 1,
            Self::Unknown => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for BarFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolution => "resolution",
            Self::Magnifier => "magnifier",
            Self::Reader => "reader",
            Self::ReadSelected => "readselected",
            Self::Volume => "volume",
            Self::Contrast => "contrast",
            Self::NightShift => "nightshift",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
