//! Absolute / delta action representation conversion.
//!
//! Limb dimensions are rewritten against a running position accumulator;
//! floating-base and gripper dimensions are representation-independent and
//! pass through unchanged. Clipping remainders are carried into the next
//! step so the converted trajectory reaches the same final configuration.

use ndarray::Array1;

use crate::demo::Demo;
use crate::env::{ActionModeConfig, RobotSpec};
use crate::error::ConversionError;

/// Overheads below this magnitude are treated as exact.
const OVERHEAD_EPSILON: f64 = 1e-8;

fn has_overhead(overhead: &Array1<f64>) -> bool {
    overhead.iter().any(|v| v.abs() > OVERHEAD_EPSILON)
}

fn require_mode(
    mode: &ActionModeConfig,
    absolute: bool,
    target: &ActionModeConfig,
) -> Result<(), ConversionError> {
    if mode.is_absolute() != Some(absolute) {
        return Err(ConversionError::UnsupportedActionMode {
            from: mode.description(),
            to: target.description(),
        });
    }
    Ok(())
}

/// Convert a demonstration from absolute to delta joint-position actions.
///
/// The position accumulator starts at the joint-space origin, matching the
/// reset configuration the demonstration was recorded from.
pub fn absolute_to_delta(demo: &Demo, robot: &RobotSpec) -> Result<Demo, ConversionError> {
    let mode = demo.metadata().environment_data.action_mode.clone();
    let mut target = mode.clone();
    target.set_absolute(false);
    require_mode(&mode, true, &target)?;

    let layout = robot.layout(&target);
    let bounds = robot.action_bounds(&target, 1.0);
    layout.validate(bounds.dim())?;

    let mut overhead = bounds.zeros();
    let mut last = bounds.zeros();
    let mut steps = Vec::with_capacity(demo.duration());

    for substep in demo.timesteps() {
        if substep.executed_action().len() != layout.dim() {
            return Err(ConversionError::DimensionMismatch {
                expected: layout.dim(),
                found: substep.executed_action().len(),
            });
        }
        let requested = substep.executed_action() + &overhead;
        let mut delta = &requested - &last;
        // Base and grippers are representation-independent
        for dim in layout.base_range().chain(layout.gripper_range()) {
            delta[dim] = requested[dim];
        }
        let clipped = bounds.clip(&delta)?;
        overhead = &delta - &clipped;

        let mut step = substep.clone();
        if has_overhead(&overhead) {
            step.set_executed_action(clipped);
            last = &requested - &overhead;
        } else {
            overhead.fill(0.0);
            step.set_executed_action(delta);
            last = requested;
        }
        steps.push(step);
    }

    let mut metadata = demo.metadata().clone();
    metadata.environment_data.action_mode = target;
    Ok(Demo::new(metadata, steps))
}

/// Convert a demonstration from delta to absolute joint-position actions.
///
/// Inverse of [`absolute_to_delta`] up to bound saturation: limb deltas are
/// integrated from the joint-space origin and the running position is clipped
/// to the absolute action bounds.
pub fn delta_to_absolute(demo: &Demo, robot: &RobotSpec) -> Result<Demo, ConversionError> {
    let mode = demo.metadata().environment_data.action_mode.clone();
    let mut target = mode.clone();
    target.set_absolute(true);
    require_mode(&mode, false, &target)?;

    let layout = robot.layout(&target);
    let bounds = robot.action_bounds(&target, 1.0);
    layout.validate(bounds.dim())?;

    let mut position = bounds.zeros();
    let mut steps = Vec::with_capacity(demo.duration());

    for substep in demo.timesteps() {
        if substep.executed_action().len() != layout.dim() {
            return Err(ConversionError::DimensionMismatch {
                expected: layout.dim(),
                found: substep.executed_action().len(),
            });
        }
        let mut requested = substep.executed_action().clone();
        for dim in layout.limb_range() {
            requested[dim] += position[dim];
        }
        let clipped = bounds.clip(&requested)?;
        for dim in layout.limb_range() {
            position[dim] = clipped[dim];
        }

        let mut step = substep.clone();
        step.set_executed_action(clipped);
        steps.push(step);
    }

    let mut metadata = demo.metadata().clone();
    metadata.environment_data.action_mode = target;
    Ok(Demo::new(metadata, steps))
}

/// Clip every action to the robot's bounds at `action_scale`, carrying the
/// clipped-away remainder of each step into the next.
pub fn clip_actions(
    demo: &Demo,
    robot: &RobotSpec,
    action_scale: f64,
) -> Result<Demo, ConversionError> {
    let mode = demo.metadata().environment_data.action_mode.clone();
    let bounds = robot.action_bounds(&mode, action_scale);
    let layout = robot.layout(&mode);
    layout.validate(bounds.dim())?;

    let mut overhead = bounds.zeros();
    let mut steps = Vec::with_capacity(demo.duration());
    for substep in demo.timesteps() {
        if substep.executed_action().len() != layout.dim() {
            return Err(ConversionError::DimensionMismatch {
                expected: layout.dim(),
                found: substep.executed_action().len(),
            });
        }
        let requested = substep.executed_action() + &overhead;
        let clipped = bounds.clip(&requested)?;
        overhead = &requested - &clipped;

        let mut step = substep.clone();
        step.set_executed_action(clipped);
        steps.push(step);
    }

    Ok(Demo::new(demo.metadata().clone(), steps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{EnvironmentData, Metadata, ObservationMode};
    use crate::env::kinematic::{pointarm_spec, ENV_NAME};
    use crate::env::{Info, Observation};

    fn make_demo(mode: ActionModeConfig, actions: Vec<Array1<f64>>) -> Demo {
        let metadata = Metadata::new(
            ObservationMode::Lightweight,
            EnvironmentData {
                env_name: ENV_NAME.to_string(),
                action_mode: mode,
                cameras: vec![],
                robot_name: pointarm_spec().name,
            },
            0,
        )
        .expect("metadata");
        let mut demo = Demo::new(metadata, vec![]);
        for action in actions {
            demo.add_timestep(Observation::new(), 0.0, false, false, Info::new(), action);
        }
        demo
    }

    #[test]
    fn test_rejects_wrong_source_mode() {
        let robot = pointarm_spec();
        let dim = robot.layout(&ActionModeConfig::joint_position(false)).dim();
        let delta_demo = make_demo(
            ActionModeConfig::joint_position(false),
            vec![Array1::zeros(dim)],
        );
        assert!(matches!(
            absolute_to_delta(&delta_demo, &robot),
            Err(ConversionError::UnsupportedActionMode { .. })
        ));

        let absolute_demo = make_demo(
            ActionModeConfig::joint_position(true),
            vec![Array1::zeros(dim)],
        );
        assert!(matches!(
            delta_to_absolute(&absolute_demo, &robot),
            Err(ConversionError::UnsupportedActionMode { .. })
        ));
    }

    #[test]
    fn test_rejects_torque_mode() {
        let robot = pointarm_spec();
        let mode = ActionModeConfig::JointTorque {
            floating_base: true,
            floating_dofs: crate::env::action_mode::DEFAULT_FLOATING_DOFS.to_vec(),
        };
        let dim = robot.layout(&mode).dim();
        let demo = make_demo(mode, vec![Array1::zeros(dim)]);
        assert!(matches!(
            absolute_to_delta(&demo, &robot),
            Err(ConversionError::UnsupportedActionMode { .. })
        ));
    }

    #[test]
    fn test_deltas_sum_to_absolute_targets() {
        let robot = pointarm_spec();
        let mode = ActionModeConfig::joint_position(true);
        let layout = robot.layout(&mode);
        let limb = layout.limb_range().start;

        // Absolute targets walking one joint outward in small steps
        let mut actions = Vec::new();
        for i in 1..=5 {
            let mut action = Array1::zeros(layout.dim());
            action[limb] = 0.05 * i as f64;
            actions.push(action);
        }
        let demo = make_demo(mode, actions);
        let converted = absolute_to_delta(&demo, &robot).expect("conversion");
        assert!(!converted
            .metadata()
            .environment_data
            .action_mode
            .is_absolute()
            .unwrap_or(true));
        assert_eq!(converted.uuid(), demo.uuid());

        let total: f64 = converted
            .timesteps()
            .iter()
            .map(|step| step.executed_action()[limb])
            .sum();
        assert!((total - 0.25).abs() < 1e-12);
        for step in converted.timesteps() {
            assert!((step.executed_action()[limb] - 0.05).abs() < 1e-12);
        }
    }

    #[test]
    fn test_base_and_gripper_pass_through() {
        let robot = pointarm_spec();
        let mode = ActionModeConfig::joint_position(true);
        let layout = robot.layout(&mode);
        let mut action = Array1::zeros(layout.dim());
        action[0] = 0.01; // base x delta
        action[layout.gripper_range().start] = 1.0;
        let demo = make_demo(mode, vec![action.clone(), action.clone()]);

        let converted = absolute_to_delta(&demo, &robot).expect("conversion");
        for step in converted.timesteps() {
            assert_eq!(step.executed_action()[0], 0.01);
            assert_eq!(step.executed_action()[layout.gripper_range().start], 1.0);
        }
    }

    #[test]
    fn test_ramp_beyond_bound_saturates_deltas() {
        let robot = pointarm_spec();
        let mode = ActionModeConfig::joint_position(true);
        let layout = robot.layout(&mode);
        let limb = layout.limb_range().start;
        let bounds = robot.action_bounds(&ActionModeConfig::joint_position(false), 1.0);

        // Absolute targets rising by 0.12 per step against a per-step delta
        // bound of 0.1: every delta saturates and the shortfall is carried
        let mut actions = Vec::new();
        for i in 1..=4 {
            let mut action = Array1::zeros(layout.dim());
            action[limb] = 0.12 * i as f64;
            actions.push(action);
        }
        let demo = make_demo(mode, actions);

        let converted = absolute_to_delta(&demo, &robot).expect("conversion");
        for step in converted.timesteps() {
            assert!((step.executed_action()[limb] - 0.1).abs() < 1e-12);
            assert!(bounds.contains(step.executed_action(), 1e-12));
        }
    }

    #[test]
    fn test_delta_absolute_round_trip() {
        let robot = pointarm_spec();
        let mode = ActionModeConfig::joint_position(true);
        let layout = robot.layout(&mode);

        let mut actions = Vec::new();
        for i in 0..8 {
            let mut action = Array1::zeros(layout.dim());
            for (j, dim) in layout.limb_range().enumerate() {
                action[dim] = 0.04 * ((i + j) % 3) as f64;
            }
            actions.push(action);
        }
        let demo = make_demo(mode, actions);
        let delta = absolute_to_delta(&demo, &robot).expect("to delta");
        let back = delta_to_absolute(&delta, &robot).expect("to absolute");

        for (a, b) in back.timesteps().iter().zip(demo.timesteps()) {
            for dim in layout.limb_range() {
                assert!((a.executed_action()[dim] - b.executed_action()[dim]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_clip_actions_preserves_total_motion() {
        let robot = pointarm_spec();
        let mode = ActionModeConfig::joint_position(false);
        let layout = robot.layout(&mode);
        let limb = layout.limb_range().start;
        let bounds = robot.action_bounds(&mode, 1.0);

        let mut burst = Array1::zeros(layout.dim());
        burst[limb] = 0.25;
        let idle = Array1::zeros(layout.dim());
        let demo = make_demo(mode, vec![burst, idle.clone(), idle]);

        let clipped = clip_actions(&demo, &robot, 1.0).expect("clipping");
        for step in clipped.timesteps() {
            assert!(bounds.contains(step.executed_action(), 1e-12));
        }
        let total: f64 = clipped
            .timesteps()
            .iter()
            .map(|step| step.executed_action()[limb])
            .sum();
        assert!((total - 0.25).abs() < 1e-12);
    }
}
