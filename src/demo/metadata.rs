//! Demonstration metadata.
//!
//! Metadata is the addressing unit of the store: everything needed to
//! re-derive the key path, rebuild the recording environment and check
//! replay compatibility. Two demonstrations sharing a uuid are the same
//! recorded episode at possibly different observation richness or control
//! frequency.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::ObservationMode;
use crate::env::{ActionModeConfig, CameraConfig, Environment};
use crate::error::DemoFileError;

/// Timestamp format used in provenance metadata.
const DATE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Description of the environment a demonstration was recorded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentData {
    /// Task name, resolvable through the environment registry.
    pub env_name: String,
    /// Action convention the recorded actions follow.
    pub action_mode: ActionModeConfig,
    /// Cameras attached to the observation stream.
    pub cameras: Vec<CameraConfig>,
    /// Robot name, resolvable through the environment registry.
    pub robot_name: String,
}

impl EnvironmentData {
    /// Snapshot a live environment.
    pub fn from_env(env: &dyn Environment) -> Self {
        Self {
            env_name: env.name().to_string(),
            action_mode: env.action_mode().clone(),
            cameras: env.cameras().to_vec(),
            robot_name: env.robot().name.clone(),
        }
    }

    /// Unified description of the action mode, used as a store-key segment.
    pub fn action_mode_description(&self) -> String {
        self.action_mode.description()
    }

    /// Unified description of the cameras, used as a store-key segment in
    /// pixel mode.
    pub fn camera_description(&self) -> String {
        self.cameras
            .iter()
            .map(CameraConfig::describe)
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Demonstration metadata: addressing, provenance and replay parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub observation_mode: ObservationMode,
    pub environment_data: EnvironmentData,
    /// Episode seed; replaying the recorded actions from a reset at this
    /// seed reproduces the episode deterministically.
    pub seed: u64,
    /// Versions of tracked runtime dependencies at recording time. Used for
    /// compatibility warnings only.
    pub package_versions: BTreeMap<String, String>,
    pub date: String,
    /// Stable identity of the recorded episode, shared across lightweight,
    /// full and resampled variants.
    pub uuid: String,
}

impl Metadata {
    /// Create metadata for a fresh recording.
    pub fn new(
        observation_mode: ObservationMode,
        environment_data: EnvironmentData,
        seed: u64,
    ) -> Result<Self, DemoFileError> {
        if observation_mode == ObservationMode::Pixel && environment_data.cameras.is_empty() {
            return Err(DemoFileError::InvalidMetadata {
                field: "observation_mode".to_string(),
                message: "pixel observation mode requires cameras".to_string(),
            });
        }
        Ok(Self {
            observation_mode,
            environment_data,
            seed,
            package_versions: tracked_versions(),
            date: Utc::now().format(DATE_FORMAT).to_string(),
            uuid: Uuid::new_v4().simple().to_string(),
        })
    }

    /// Snapshot a live environment. The observation mode is derived from
    /// the camera configuration unless a lightweight recording is requested.
    pub fn from_env(env: &dyn Environment, lightweight: bool) -> Self {
        let observation_mode = if lightweight {
            ObservationMode::Lightweight
        } else if env.cameras().is_empty() {
            ObservationMode::State
        } else {
            ObservationMode::Pixel
        };
        Self {
            observation_mode,
            environment_data: EnvironmentData::from_env(env),
            seed: env.seed(),
            package_versions: tracked_versions(),
            date: Utc::now().format(DATE_FORMAT).to_string(),
            uuid: Uuid::new_v4().simple().to_string(),
        }
    }

    /// File name under the store key directory.
    pub fn filename(&self) -> String {
        format!("{}.{}", self.uuid, super::file::DEMO_SUFFIX)
    }

    /// Copy of this metadata addressing a different observation mode.
    /// Identity is preserved: the copy refers to the same episode.
    pub fn with_observation_mode(&self, mode: ObservationMode) -> Metadata {
        let mut copy = self.clone();
        copy.observation_mode = mode;
        copy
    }

    /// Take over the identity of a source recording. Used when a conversion
    /// produces a new representation of the same episode.
    pub fn inherit_identity(&mut self, source: &Metadata) {
        self.uuid = source.uuid.clone();
        self.seed = source.seed;
    }

    /// Metadata block for the demonstration file: every field individually
    /// JSON-encoded so single fields are decodable in isolation.
    pub fn encoded_fields(&self) -> Result<BTreeMap<String, String>, serde_json::Error> {
        let mut fields = BTreeMap::new();
        fields.insert(
            "observation_mode".to_string(),
            serde_json::to_string(&self.observation_mode)?,
        );
        fields.insert(
            "environment_data".to_string(),
            serde_json::to_string(&self.environment_data)?,
        );
        fields.insert("seed".to_string(), serde_json::to_string(&self.seed)?);
        fields.insert(
            "package_versions".to_string(),
            serde_json::to_string(&self.package_versions)?,
        );
        fields.insert("date".to_string(), serde_json::to_string(&self.date)?);
        fields.insert("uuid".to_string(), serde_json::to_string(&self.uuid)?);
        Ok(fields)
    }

    /// Decode a metadata block written by [`Metadata::encoded_fields`].
    pub fn from_encoded_fields(fields: &BTreeMap<String, String>) -> Result<Self, DemoFileError> {
        fn field<'a>(
            fields: &'a BTreeMap<String, String>,
            name: &str,
        ) -> Result<&'a str, DemoFileError> {
            fields
                .get(name)
                .map(String::as_str)
                .ok_or_else(|| DemoFileError::MissingKey(name.to_string()))
        }
        fn decode<T: serde::de::DeserializeOwned>(
            name: &str,
            raw: &str,
        ) -> Result<T, DemoFileError> {
            serde_json::from_str(raw).map_err(|e| DemoFileError::InvalidMetadata {
                field: name.to_string(),
                message: e.to_string(),
            })
        }

        let metadata = Self {
            observation_mode: decode("observation_mode", field(fields, "observation_mode")?)?,
            environment_data: decode("environment_data", field(fields, "environment_data")?)?,
            seed: decode("seed", field(fields, "seed")?)?,
            package_versions: decode("package_versions", field(fields, "package_versions")?)?,
            date: decode("date", field(fields, "date")?)?,
            uuid: decode("uuid", field(fields, "uuid")?)?,
        };
        metadata.check_package_versions();
        Ok(metadata)
    }

    /// Compare recorded dependency versions with the running ones, warning
    /// on mismatch. Replay stays possible but may be numerically unstable.
    pub fn check_package_versions(&self) {
        let current = tracked_versions();
        for (package, recorded) in &self.package_versions {
            match current.get(package) {
                Some(installed) if installed != recorded => {
                    tracing::warn!(
                        package = package.as_str(),
                        recorded = recorded.as_str(),
                        installed = installed.as_str(),
                        "installed version differs from the one stored in the \
                         demonstration; replay could be unstable"
                    );
                }
                None => {
                    tracing::warn!(
                        package = package.as_str(),
                        recorded = recorded.as_str(),
                        "tracked package is not present in this runtime"
                    );
                }
                _ => {}
            }
        }
    }
}

/// Versions of the runtime dependencies tracked for replay compatibility.
fn tracked_versions() -> BTreeMap<String, String> {
    let mut versions = BTreeMap::new();
    versions.insert(
        env!("CARGO_PKG_NAME").to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    versions
}
