//! Action-mode configuration.
//!
//! The original runtime dispatched on action-mode classes; here the set of
//! modes is a closed tagged variant with explicit capability queries, so
//! metadata can round-trip through files without reflective lookup.

use serde::{Deserialize, Serialize};

/// Degrees of freedom of the floating base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatingDof {
    X,
    Y,
    Z,
    Rz,
}

impl FloatingDof {
    /// Short name used in store keys and action-mode descriptions.
    pub fn as_str(&self) -> &'static str {
        match self {
            FloatingDof::X => "x",
            FloatingDof::Y => "y",
            FloatingDof::Z => "z",
            FloatingDof::Rz => "rz",
        }
    }
}

/// Floating DOFs enabled when none are specified explicitly.
pub const DEFAULT_FLOATING_DOFS: [FloatingDof; 3] = [FloatingDof::X, FloatingDof::Y, FloatingDof::Rz];

/// How action vectors are interpreted by an environment.
///
/// Floating-base dimensions are always delta position control and gripper
/// dimensions are always absolute, regardless of the mode; the
/// absolute/delta distinction applies to the limb dimensions only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionModeConfig {
    /// Limb joints are driven by position targets, either absolute or
    /// relative to the previous target.
    JointPosition {
        absolute: bool,
        floating_base: bool,
        floating_dofs: Vec<FloatingDof>,
    },
    /// Limb joints are driven by torque values.
    JointTorque {
        floating_base: bool,
        floating_dofs: Vec<FloatingDof>,
    },
}

impl ActionModeConfig {
    /// Joint-position mode with the default floating DOFs.
    pub fn joint_position(absolute: bool) -> Self {
        ActionModeConfig::JointPosition {
            absolute,
            floating_base: true,
            floating_dofs: DEFAULT_FLOATING_DOFS.to_vec(),
        }
    }

    /// Whether limb dimensions are absolute targets. `None` for modes
    /// without an absolute/delta distinction.
    pub fn is_absolute(&self) -> Option<bool> {
        match self {
            ActionModeConfig::JointPosition { absolute, .. } => Some(*absolute),
            ActionModeConfig::JointTorque { .. } => None,
        }
    }

    /// Whether the floating base is actuated through the action vector.
    pub fn floating_base(&self) -> bool {
        match self {
            ActionModeConfig::JointPosition { floating_base, .. }
            | ActionModeConfig::JointTorque { floating_base, .. } => *floating_base,
        }
    }

    /// Active floating DOFs, empty when the floating base is disabled.
    pub fn floating_dofs(&self) -> &[FloatingDof] {
        if !self.floating_base() {
            return &[];
        }
        match self {
            ActionModeConfig::JointPosition { floating_dofs, .. }
            | ActionModeConfig::JointTorque { floating_dofs, .. } => floating_dofs,
        }
    }

    /// Number of leading floating-base dimensions in the action vector.
    pub fn floating_dof_count(&self) -> usize {
        self.floating_dofs().len()
    }

    /// Flip the absolute/delta flag. No-op for modes without the
    /// distinction; used for conversion bookkeeping.
    pub fn set_absolute(&mut self, value: bool) {
        if let ActionModeConfig::JointPosition { absolute, .. } = self {
            *absolute = value;
        }
    }

    /// Unified description used as a store-key segment, e.g.
    /// `joint_position_floating_x_y_rz_absolute`.
    pub fn description(&self) -> String {
        let mut parts: Vec<String> = vec![self.mode_name().to_string()];
        if self.floating_base() {
            parts.push("floating".to_string());
            for dof in self.floating_dofs() {
                parts.push(dof.as_str().to_string());
            }
        }
        if let Some(absolute) = self.is_absolute() {
            parts.push(if absolute { "absolute" } else { "delta" }.to_string());
        }
        parts.join("_")
    }

    fn mode_name(&self) -> &'static str {
        match self {
            ActionModeConfig::JointPosition { .. } => "joint_position",
            ActionModeConfig::JointTorque { .. } => "joint_torque",
        }
    }
}
