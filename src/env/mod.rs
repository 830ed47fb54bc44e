//! Environment interface.
//!
//! The physics engine and task definitions live outside this crate; the
//! pipeline only needs a steppable environment with a deterministic seeded
//! reset and a bounded action space. This module defines that boundary plus
//! the robot/action-mode descriptors the transforms rely on.

pub mod action_mode;
pub mod kinematic;
pub mod layout;
pub mod registry;
pub mod robot;
pub mod space;

use std::collections::BTreeMap;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use action_mode::{ActionModeConfig, FloatingDof, DEFAULT_FLOATING_DOFS};
pub use kinematic::KinematicEnv;
pub use layout::ActionLayout;
pub use registry::{EnvRegistry, EnvRequest};
pub use robot::RobotSpec;
pub use space::ActionBounds;

/// The canonical recording frequency. Demonstrations are always recorded at
/// this rate and resampled downward from it.
pub const CONTROL_FREQUENCY_MAX: u32 = 500;

/// The lowest supported control frequency.
pub const CONTROL_FREQUENCY_MIN: u32 = 20;

/// Named observation arrays produced by an environment step.
pub type Observation = BTreeMap<String, Array1<f64>>;

/// Named auxiliary arrays attached to a step.
pub type Info = BTreeMap<String, Array1<f64>>;

/// Camera attached to the observation stream in pixel mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub name: String,
    pub resolution: (u32, u32),
}

impl CameraConfig {
    /// Short form used in store keys, e.g. `head_84x84`.
    pub fn describe(&self) -> String {
        format!("{}_{}x{}", self.name, self.resolution.0, self.resolution.1)
    }
}

/// Error produced by an environment while resetting or stepping.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct EnvError(pub String);

/// Result of one environment step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info,
}

/// A steppable robot-control environment.
///
/// Implementations encapsulate one physics world and one action space and
/// are not safe to share across threads; concurrent pipelines must use one
/// instance per worker.
pub trait Environment {
    /// Task name, used as a store-key segment.
    fn name(&self) -> &str;

    /// Reset to the episode start for `seed`. Re-running the same seed with
    /// the same action sequence must reproduce the same episode.
    fn reset(&mut self, seed: u64) -> Result<Observation, EnvError>;

    /// Apply one action and advance the world.
    fn step(&mut self, action: &Array1<f64>) -> Result<StepOutcome, EnvError>;

    /// Bounds of the action space at this environment's control frequency.
    fn action_bounds(&self) -> &ActionBounds;

    fn robot(&self) -> &RobotSpec;

    fn action_mode(&self) -> &ActionModeConfig;

    fn control_frequency(&self) -> u32;

    /// Cameras attached to the observation stream; empty in state mode.
    fn cameras(&self) -> &[CameraConfig];

    /// Seed of the current episode.
    fn seed(&self) -> u64;
}
