//! Bar item loading and control dispatch.

pub mod dispatch;
pub mod items;

pub use dispatch::{ControlDispatcher, DispatchResult};
pub use items::load_items;
