//! Demonstration rehydration by replay.
//!
//! A lightweight demonstration carries enough to reproduce the episode: the
//! seed and the executed actions. Replaying them in a freshly reset
//! environment regenerates the full observation stream. The replayed
//! demonstration keeps the source identity, so it stays the same episode as
//! far as the store is concerned.

use tracing::debug;

use crate::demo::Demo;
use crate::env::Environment;
use crate::error::ConversionError;

/// Replay a demonstration's actions in `env` and record the outcome as a new
/// demonstration.
///
/// The environment must match the demonstration's task and action mode; it
/// is reset to the demonstration's seed before the first step.
pub fn replay_in_env(demo: &Demo, env: &mut dyn Environment) -> Result<Demo, ConversionError> {
    if env.name() != demo.metadata().environment_data.env_name {
        return Err(ConversionError::EnvironmentMismatch {
            env: env.name().to_string(),
            demo: demo.metadata().environment_data.env_name.clone(),
        });
    }
    if env.action_mode() != &demo.metadata().environment_data.action_mode {
        return Err(ConversionError::UnsupportedActionMode {
            from: demo.metadata().environment_data.action_mode_description(),
            to: env.action_mode().description(),
        });
    }

    env.reset(demo.seed())
        .map_err(|e| ConversionError::Environment(e.to_string()))?;

    let mut replayed = Demo::from_env(env);
    replayed.metadata_mut().inherit_identity(demo.metadata());
    for step in demo.timesteps() {
        let action = step.executed_action().clone();
        let outcome = env
            .step(&action)
            .map_err(|e| ConversionError::Environment(e.to_string()))?;
        replayed.record_outcome(outcome, action);
    }

    debug!(
        uuid = replayed.uuid(),
        steps = replayed.duration(),
        env = env.name(),
        "replayed demonstration"
    );
    Ok(replayed)
}
