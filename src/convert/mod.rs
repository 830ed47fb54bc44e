//! Demonstration conversions.
//!
//! Three transforms, all preserving the demonstration's identity (uuid and
//! seed): control-frequency decimation, absolute/delta action representation
//! changes, and replay-based rehydration of lightweight recordings.

pub mod decimate;
pub mod delta;
pub mod replay;

pub use decimate::decimate;
pub use delta::{absolute_to_delta, clip_actions, delta_to_absolute};
pub use replay::replay_in_env;
