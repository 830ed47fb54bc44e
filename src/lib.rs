//! demoforge: robot demonstration pipeline.
//!
//! This library records, resamples, converts and caches robot-control
//! demonstrations: time-indexed sequences of observations, rewards and
//! executed actions produced by stepping a control environment.

// Core modules
pub mod convert;
pub mod demo;
pub mod env;
pub mod error;
pub mod store;

// Re-export the primary pipeline types
pub use demo::{Demo, DemoRecorder, DemoStep, Metadata, ObservationMode};
pub use env::{ActionModeConfig, EnvRegistry, Environment, RobotSpec};
pub use store::{ArchiveFetcher, DemoStore};

// Re-export commonly used error types
pub use error::{ConversionError, DemoFileError, RegistryError, StoreError};
