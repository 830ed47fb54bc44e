//! Robot descriptor: action-space geometry.
//!
//! The transforms never assume a specific robot; everything they need is
//! queryable from this descriptor (floating-base DOF count, limb joint
//! ranges, gripper count).

use serde::{Deserialize, Serialize};

use super::action_mode::{ActionModeConfig, FloatingDof};
use super::layout::ActionLayout;
use super::space::ActionBounds;

/// Gripper actuators are normalized to `[0, 1]` and never scaled.
pub const GRIPPER_RANGE: (f64, f64) = (0.0, 1.0);

/// Static description of a robot's actuation geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotSpec {
    /// Robot name used in store keys when it differs from the
    /// environment's default robot.
    pub name: String,
    /// Per-step delta bound for linear floating DOFs (x, y, z).
    pub base_linear_delta: f64,
    /// Per-step delta bound for the rotational floating DOF (rz).
    pub base_angular_delta: f64,
    /// Absolute control range per actuated limb joint. Also serves as the
    /// torque control range in torque mode.
    pub limb_joint_ranges: Vec<(f64, f64)>,
    /// Symmetric per-step delta bound shared by limb joints in delta mode.
    pub limb_delta_range: f64,
    /// Number of grippers, one action dimension per side.
    pub gripper_count: usize,
}

impl RobotSpec {
    /// Base/limb/gripper split of the action vector under `mode`.
    pub fn layout(&self, mode: &ActionModeConfig) -> ActionLayout {
        ActionLayout::new(
            mode.floating_dof_count(),
            self.limb_joint_ranges.len(),
            self.gripper_count,
        )
    }

    /// Action-space bounds under `mode`.
    ///
    /// `action_scale` widens the delta-native regions (floating base, and
    /// limbs in delta mode) for decimated control; absolute limb targets and
    /// gripper dimensions are never scaled.
    pub fn action_bounds(&self, mode: &ActionModeConfig, action_scale: f64) -> ActionBounds {
        let mut pairs: Vec<(f64, f64)> =
            Vec::with_capacity(self.layout(mode).dim());
        for dof in mode.floating_dofs() {
            let bound = match dof {
                FloatingDof::Rz => self.base_angular_delta,
                _ => self.base_linear_delta,
            };
            pairs.push((-bound * action_scale, bound * action_scale));
        }
        match mode.is_absolute() {
            Some(true) | None => pairs.extend(self.limb_joint_ranges.iter().copied()),
            Some(false) => {
                let bound = self.limb_delta_range * action_scale;
                pairs.extend(std::iter::repeat((-bound, bound)).take(self.limb_joint_ranges.len()));
            }
        }
        pairs.extend(std::iter::repeat(GRIPPER_RANGE).take(self.gripper_count));
        ActionBounds::from_pairs(&pairs)
    }
}
