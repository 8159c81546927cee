//! Preference key identifying a single setting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use morphic_core::error::AppError;

/// Identifies one setting: the solution that owns it and the preference name.
///
/// The textual form is `"<solution>.<preference>"`. Solutions are often
/// reverse-DNS names and keep their dots; a dot inside the preference name
/// is written as `\.` and a backslash in either part as `\\`, so the
/// separator is always the last unescaped dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreferenceKey {
    /// Owning solution, e.g. `"com.apple.macos.zoom"`.
    pub solution: String,
    /// Preference name within the solution, e.g. `"enabled"`.
    pub preference: String,
}

impl PreferenceKey {
    /// Create a key from its two components.
    pub fn new(solution: impl Into<String>, preference: impl Into<String>) -> Self {
        Self {
            solution: solution.into(),
            preference: preference.into(),
        }
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, part: &str, escape_dots: bool) -> fmt::Result {
    for c in part.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '.' if escape_dots => f.write_str("\\.")?,
            c => write!(f, "{c}")?,
        }
    }
    Ok(())
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, &self.solution, false)?;
        f.write_str(".")?;
        write_escaped(f, &self.preference, true)
    }
}

impl FromStr for PreferenceKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            AppError::serialization(format!(
                "Invalid preference key '{s}': expected '<solution>.<preference>'"
            ))
        };

        // Text before the last unescaped dot, and the segment after it.
        let mut solution = String::new();
        let mut current = String::new();
        let mut separated = false;
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => current.push(chars.next().ok_or_else(invalid)?),
                '.' => {
                    if separated {
                        solution.push('.');
                    }
                    solution.push_str(&current);
                    current.clear();
                    separated = true;
                }
                c => current.push(c),
            }
        }

        if !separated || solution.is_empty() || current.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            solution,
            preference: current,
        })
    }
}

impl Serialize for PreferenceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PreferenceKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
