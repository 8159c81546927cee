//! Bar item definitions.

pub mod feature;
pub mod item;

pub use feature::BarFeature;
pub use item::{BarItem, ControlItem, LinkItem};
