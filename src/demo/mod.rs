//! Demonstration data model.
//!
//! A demonstration is an ordered sequence of [`DemoStep`]s plus [`Metadata`]
//! describing the recording environment. The sequence is time order and is
//! never reordered or deduplicated. Lightweight demonstrations retain only
//! actions and episode-boundary flags; everything else is reconstructable by
//! replay.

pub mod file;
pub mod metadata;
pub mod recorder;
pub mod types;

use std::path::{Path, PathBuf};

use ndarray::Array1;

use crate::env::{Environment, Info, Observation, StepOutcome};
use crate::error::DemoFileError;

pub use metadata::{EnvironmentData, Metadata};
pub use recorder::DemoRecorder;
pub use types::{DemoStep, ObservationMode, ACTION_KEY, VISUAL_OBSERVATIONS_PREFIX};

/// An ordered recording of one environment episode.
#[derive(Debug, Clone)]
pub struct Demo {
    metadata: Metadata,
    steps: Vec<DemoStep>,
}

impl Demo {
    /// Wrap existing steps. If the metadata addresses lightweight mode, the
    /// steps are lightened so content and mode cannot disagree.
    pub fn new(metadata: Metadata, steps: Vec<DemoStep>) -> Self {
        let steps = if metadata.observation_mode == ObservationMode::Lightweight {
            steps.iter().map(DemoStep::lightened).collect()
        } else {
            steps
        };
        Self { metadata, steps }
    }

    /// Empty demonstration ready to record from `env`.
    pub fn from_env(env: &dyn Environment) -> Self {
        Self {
            metadata: Metadata::from_env(env, false),
            steps: Vec::new(),
        }
    }

    /// Empty lightweight demonstration ready to record from `env`.
    pub fn lightweight_from_env(env: &dyn Environment) -> Self {
        Self {
            metadata: Metadata::from_env(env, true),
            steps: Vec::new(),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn timesteps(&self) -> &[DemoStep] {
        &self.steps
    }

    /// Number of recorded steps.
    pub fn duration(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn seed(&self) -> u64 {
        self.metadata.seed
    }

    pub fn uuid(&self) -> &str {
        &self.metadata.uuid
    }

    pub fn is_lightweight(&self) -> bool {
        self.metadata.observation_mode == ObservationMode::Lightweight
    }

    /// Append one step. In lightweight mode the observation, reward and
    /// auxiliary info are dropped; only the action and flags are kept.
    pub fn add_timestep(
        &mut self,
        observation: Observation,
        reward: f64,
        termination: bool,
        truncation: bool,
        info: Info,
        action: Array1<f64>,
    ) {
        let step = if self.is_lightweight() {
            DemoStep::new(
                Observation::new(),
                None,
                termination,
                truncation,
                Info::new(),
                action,
            )
        } else {
            DemoStep::new(observation, Some(reward), termination, truncation, info, action)
        };
        self.steps.push(step);
    }

    /// Append one step from an environment outcome.
    pub fn record_outcome(&mut self, outcome: StepOutcome, action: Array1<f64>) {
        self.add_timestep(
            outcome.observation,
            outcome.reward,
            outcome.terminated,
            outcome.truncated,
            outcome.info,
            action,
        );
    }

    /// Duplicate the final step `count` times, e.g. to hold the last command
    /// past termination.
    pub fn add_termination_steps(&mut self, count: usize) {
        if let Some(last) = self.steps.last().cloned() {
            self.steps.extend(std::iter::repeat(last).take(count));
        }
    }

    /// Lightweight copy of this demonstration, sharing its identity.
    pub fn lighten(&self) -> Demo {
        Demo {
            metadata: self
                .metadata
                .with_observation_mode(ObservationMode::Lightweight),
            steps: self.steps.iter().map(DemoStep::lightened).collect(),
        }
    }

    /// Persist to `path`. See [`file`] for the on-disk format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<PathBuf, DemoFileError> {
        file::write_demo(self, path.as_ref())
    }

    /// Load from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Demo, DemoFileError> {
        file::read_demo(path.as_ref(), None)
    }

    /// Load from `path`, overriding the stored metadata.
    pub fn load_with_metadata(
        path: impl AsRef<Path>,
        metadata: Metadata,
    ) -> Result<Demo, DemoFileError> {
        file::read_demo(path.as_ref(), Some(metadata))
    }
}
