//! Store key derivation.
//!
//! Every cached demonstration lives at a path derived purely from its
//! metadata, so two processes deriving a key for the same metadata always
//! agree without coordination:
//!
//! `[{robot}/]{env}/{action_mode}/{observation_mode}/[{cameras}/][{freq}hz/]{uuid}.json`
//!
//! The robot segment appears only when the robot differs from the
//! environment's default, the camera segment only in pixel mode, and the
//! frequency segment only for resampled demonstrations.

use std::path::{Path, PathBuf};

use crate::demo::{Metadata, ObservationMode};
use crate::env::CONTROL_FREQUENCY_MAX;

/// Collapse the canonical frequency to "unresampled".
pub fn normalize_frequency(frequency: Option<u32>) -> Option<u32> {
    frequency.filter(|&f| f != CONTROL_FREQUENCY_MAX)
}

/// Directory holding all demonstrations sharing `metadata`'s key.
pub fn demo_dir(
    root: &Path,
    metadata: &Metadata,
    frequency: Option<u32>,
    default_robot: &str,
) -> PathBuf {
    let mut path = root.to_path_buf();
    if metadata.environment_data.robot_name != default_robot {
        path.push(&metadata.environment_data.robot_name);
    }
    path.push(&metadata.environment_data.env_name);
    path.push(metadata.environment_data.action_mode_description());
    path.push(metadata.observation_mode.as_str());
    if metadata.observation_mode == ObservationMode::Pixel {
        path.push(metadata.environment_data.camera_description());
    }
    if let Some(freq) = normalize_frequency(frequency) {
        path.push(format!("{freq}hz"));
    }
    path
}

/// Full path of the demonstration file for `metadata`.
pub fn demo_path(
    root: &Path,
    metadata: &Metadata,
    frequency: Option<u32>,
    default_robot: &str,
) -> PathBuf {
    demo_dir(root, metadata, frequency, default_robot).join(metadata.filename())
}
