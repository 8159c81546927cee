//! # morphic-service
//!
//! Orchestration layer for Morphic. Sessions capture live settings into
//! preference records and replay records onto the system through a
//! [`SettingsManager`], persisting through `morphic-storage`.
//!
//! Services follow constructor injection: every dependency is carried by an
//! explicitly built [`SessionContext`] rather than process-wide state.

pub mod apply;
pub mod bar;
pub mod capture;
pub mod context;
pub mod session;
pub mod settings;
pub mod toggle;

pub use apply::{ApplyOutcome, ApplyReport, ApplySession, ApplyState};
pub use bar::{ControlDispatcher, DispatchResult};
pub use capture::{CaptureOutcome, CaptureReport, CaptureSession};
pub use context::SessionContext;
pub use session::{Session, SessionEvent};
pub use settings::{InMemorySettingsManager, SettingsManager, StateFileSettingsManager};
pub use toggle::FeatureToggle;
