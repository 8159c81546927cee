//! Record backend implementations.

pub mod local;
pub mod memory;
#[cfg(feature = "remote")]
pub mod remote;

pub use local::LocalBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "remote")]
pub use remote::RemoteBackend;
