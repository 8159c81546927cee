//! User entity model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use morphic_core::traits::Record;

/// A Morphic user and the preferences record they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier. Generated when absent from the decoded form.
    #[serde(rename = "id", default = "Uuid::new_v4")]
    pub identifier: Uuid,
    /// Identifier of the user's preferences record.
    #[serde(default)]
    pub preferences_id: Option<Uuid>,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Contact email address.
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// Create a brand-new user with fresh user and preferences identifiers.
    pub fn new() -> Self {
        Self {
            preferences_id: Some(Uuid::new_v4()),
            ..Self::with_identifier(Uuid::new_v4())
        }
    }

    /// Create a user known only by identifier. No preferences are linked.
    pub fn with_identifier(identifier: Uuid) -> Self {
        Self {
            identifier,
            preferences_id: None,
            first_name: None,
            last_name: None,
            email: None,
        }
    }

    /// The preferences record identifier as a storage identifier.
    pub fn preferences_identifier(&self) -> Option<String> {
        self.preferences_id.map(|id| id.to_string())
    }

    /// First and last name joined, when either is present.
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        }
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for User {
    const KIND: &'static str = "user";

    fn identifier(&self) -> String {
        self.identifier.to_string()
    }
}
