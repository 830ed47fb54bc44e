//! Demonstration step and observation-mode types.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::env::{Info, Observation};

/// Prefix identifying visual observation arrays.
pub const VISUAL_OBSERVATIONS_PREFIX: &str = "rgb";

/// Info key under which the executed action is persisted.
pub const ACTION_KEY: &str = "demo_action";

/// What payload a demonstration retains per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationMode {
    /// Proprioceptive state arrays only.
    State,
    /// State plus camera images.
    Pixel,
    /// Actions and episode-boundary flags only; observations and rewards
    /// are reconstructable by replay.
    Lightweight,
}

impl ObservationMode {
    /// Store-key segment for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationMode::State => "state",
            ObservationMode::Pixel => "pixel",
            ObservationMode::Lightweight => "lightweight",
        }
    }
}

/// One time-indexed record of a demonstration.
///
/// The action is the one executed to *reach* this step. It is held as f64
/// regardless of the environment's native dtype so repeated conversions do
/// not compound rounding error.
#[derive(Debug, Clone)]
pub struct DemoStep {
    pub observation: Observation,
    pub reward: Option<f64>,
    pub termination: bool,
    pub truncation: bool,
    pub info: Info,
    action: Array1<f64>,
}

impl DemoStep {
    pub fn new(
        observation: Observation,
        reward: Option<f64>,
        termination: bool,
        truncation: bool,
        info: Info,
        action: Array1<f64>,
    ) -> Self {
        Self {
            observation,
            reward,
            termination,
            truncation,
            info,
            action,
        }
    }

    /// The action executed to reach this step.
    pub fn executed_action(&self) -> &Array1<f64> {
        &self.action
    }

    pub fn set_executed_action(&mut self, action: Array1<f64>) {
        self.action = action;
    }

    /// Whether this step carries visual observations.
    pub fn has_visual_observations(&self) -> bool {
        self.observation
            .keys()
            .any(|key| key.to_lowercase().starts_with(VISUAL_OBSERVATIONS_PREFIX))
    }

    /// All visual observations of this step.
    pub fn visual_observations(&self) -> Observation {
        self.observation
            .iter()
            .filter(|(key, _)| key.to_lowercase().starts_with(VISUAL_OBSERVATIONS_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Copy retaining only the action and episode-boundary flags.
    pub fn lightened(&self) -> DemoStep {
        DemoStep {
            observation: Observation::new(),
            reward: None,
            termination: self.termination,
            truncation: self.truncation,
            info: Info::new(),
            action: self.action.clone(),
        }
    }
}
