//! Events broadcast by a session.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A change observers of a [`Session`](super::Session) may react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The signed-in user changed. `None` after sign-out.
    UserChanged {
        /// The new user.
        user_id: Option<Uuid>,
    },
    /// The loaded preferences record changed or was replaced.
    PreferencesChanged {
        /// Identifier of the loaded record.
        identifier: String,
    },
}
