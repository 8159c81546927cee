//! User session: signed-in user, their preferences, and change events.

pub mod events;
pub mod service;

pub use events::SessionEvent;
pub use service::Session;
