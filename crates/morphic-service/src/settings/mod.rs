//! Settings managers: the capability that reads and writes live settings.

pub mod keys;
pub mod manager;
pub mod memory;
pub mod state_file;

pub use manager::SettingsManager;
pub use memory::InMemorySettingsManager;
pub use state_file::StateFileSettingsManager;
