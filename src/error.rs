//! Error types for demonstration pipeline operations.
//!
//! Defines error types for the major subsystems:
//! - Action-representation and frequency conversion
//! - Demonstration file encoding and decoding
//! - Environment/robot registry resolution
//! - Demonstration store retrieval and caching

use thiserror::Error;

/// Errors that can occur while converting a demonstration between
/// control frequencies or action representations.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("only demonstrations recorded at {canonical} Hz can be resampled, got {found} Hz")]
    NonCanonicalFrequency { canonical: u32, found: u32 },

    #[error("target frequency {target} Hz does not divide source frequency {source_freq} Hz")]
    NonIntegerRate { source_freq: u32, target: u32 },

    #[error("target frequency {target} Hz is above source frequency {source_freq} Hz")]
    UpsamplingUnsupported { source_freq: u32, target: u32 },

    #[error("no conversion defined from '{from}' to '{to}'")]
    UnsupportedActionMode { from: String, to: String },

    #[error("action layout ({layout} dims) does not match action space ({space} dims)")]
    LayoutMismatch { layout: usize, space: usize },

    #[error("action has {found} dims, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("environment '{env}' does not match demonstration recorded in '{demo}'")]
    EnvironmentMismatch { env: String, demo: String },

    #[error("environment error during replay: {0}")]
    Environment(String),
}

/// Errors that can occur while encoding or decoding a demonstration file.
#[derive(Debug, Error)]
pub enum DemoFileError {
    #[error("demonstration file not found: {0}")]
    FileNotFound(String),

    #[error("missing required key '{0}' in demonstration file")]
    MissingKey(String),

    #[error("column '{key}' holds {found} steps, expected {expected}")]
    LengthMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    #[error("corrupt column '{key}': {message}")]
    CorruptColumn { key: String, message: String },

    #[error("invalid metadata field '{field}': {message}")]
    InvalidMetadata { field: String, message: String },

    #[error("observation keys differ between steps: {0}")]
    RaggedObservations(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while resolving environments or robots by name.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("environment '{0}' not found in registry")]
    UnknownEnvironment(String),

    #[error("robot '{0}' not found in registry")]
    UnknownRobot(String),

    #[error("failed to construct environment '{name}': {message}")]
    ConstructionFailed { name: String, message: String },
}

/// Errors that can occur during demonstration store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no demonstrations found for key '{0}'")]
    NotFound(String),

    #[error("requested {requested} demonstrations, but only {found} available")]
    OverRequested { requested: usize, found: usize },

    #[error("archive fetch failed: {0}")]
    FetchFailed(String),

    #[error("invalid demonstration archive: {0}")]
    InvalidArchive(String),

    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("demonstration file error: {0}")]
    File(#[from] DemoFileError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
