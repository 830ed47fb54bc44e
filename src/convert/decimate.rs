//! Control-frequency resampling (decimation).
//!
//! Merges windows of `R = source / target` consecutive substeps into one
//! effective step. The clipped-away remainder of every window action is
//! carried into the next window as overhead, so repeated clipping near the
//! bounds never desynchronizes the replayed trajectory.

use crate::demo::{Demo, DemoStep};
use crate::env::{RobotSpec, CONTROL_FREQUENCY_MAX};
use crate::error::ConversionError;

/// Resample a demonstration recorded at `source_freq` down to `target_freq`.
///
/// Only the canonical maximum frequency is a valid source, and the target
/// must divide it. A rate of 1 is the identity transform.
pub fn decimate(
    demo: &Demo,
    target_freq: u32,
    source_freq: u32,
    robot: &RobotSpec,
) -> Result<Demo, ConversionError> {
    if source_freq != CONTROL_FREQUENCY_MAX {
        return Err(ConversionError::NonCanonicalFrequency {
            canonical: CONTROL_FREQUENCY_MAX,
            found: source_freq,
        });
    }
    if target_freq == 0 || target_freq > source_freq {
        return Err(ConversionError::UpsamplingUnsupported {
            source_freq,
            target: target_freq,
        });
    }
    if source_freq % target_freq != 0 {
        return Err(ConversionError::NonIntegerRate {
            source_freq,
            target: target_freq,
        });
    }

    let rate = (source_freq / target_freq) as usize;
    if rate == 1 {
        return Ok(demo.clone());
    }

    let mode = demo.metadata().environment_data.action_mode.clone();
    let bounds = robot.action_bounds(&mode, rate as f64);
    let layout = robot.layout(&mode);
    layout.validate(bounds.dim())?;

    let mut substeps: Vec<DemoStep> = demo.timesteps().to_vec();
    // Repeat the final step so the episode tail is windowed, not dropped
    let remainder = substeps.len() % rate;
    if remainder != 0 {
        if let Some(last) = substeps.last().cloned() {
            substeps.extend(std::iter::repeat(last).take(rate - remainder));
        }
    }

    let absolute = mode.is_absolute() == Some(true);
    let mut accumulated = bounds.zeros();
    let mut overhead = bounds.zeros();
    let mut decimated: Vec<DemoStep> = Vec::with_capacity(substeps.len() / rate);

    for (index, substep) in substeps.iter().enumerate() {
        let original = substep.executed_action();
        if original.len() != layout.dim() {
            return Err(ConversionError::DimensionMismatch {
                expected: layout.dim(),
                found: original.len(),
            });
        }
        accumulated += original;
        accumulated += &overhead;
        overhead.fill(0.0);

        if (index + 1) % rate == 0 {
            if absolute {
                // Absolute targets are not sums; average everything after
                // the delta-native floating base
                for dim in layout.post_base_range() {
                    accumulated[dim] /= rate as f64;
                }
            }
            // Grippers are bistable: take the last substep's command
            for dim in layout.gripper_range() {
                accumulated[dim] = original[dim];
            }
            let clipped = bounds.clip(&accumulated)?;
            overhead = &accumulated - &clipped;

            let mut step = substep.clone();
            step.set_executed_action(clipped);
            decimated.push(step);
            accumulated.fill(0.0);
        }
    }

    Ok(Demo::new(demo.metadata().clone(), decimated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{EnvironmentData, Metadata, ObservationMode};
    use crate::env::kinematic::{pointarm_spec, ENV_NAME};
    use crate::env::{ActionModeConfig, Info, Observation};
    use ndarray::Array1;

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

    fn constant_actions(count: usize, value: f64) -> Vec<Array1<f64>> {
        let dim = pointarm_spec().layout(&ActionModeConfig::joint_position(false)).dim();
        (0..count).map(|_| Array1::from_elem(dim, value)).collect()
    }

    #[test]
    fn test_rejects_non_canonical_source() {
        let demo = make_demo(ActionModeConfig::joint_position(false), constant_actions(10, 0.0));
        let result = decimate(&demo, 50, 250, &pointarm_spec());
        assert!(matches!(
            result,
            Err(ConversionError::NonCanonicalFrequency { .. })
        ));
    }

    #[test]
    fn test_rejects_non_integer_rate() {
        let demo = make_demo(ActionModeConfig::joint_position(false), constant_actions(10, 0.0));
        let result = decimate(&demo, 333, CONTROL_FREQUENCY_MAX, &pointarm_spec());
        assert!(matches!(result, Err(ConversionError::NonIntegerRate { .. })));
    }

    #[test]
    fn test_rate_one_is_identity() {
        let robot = pointarm_spec();
        // Action deliberately outside the per-step bounds: identity must
        // not clip
        let dim = robot.layout(&ActionModeConfig::joint_position(false)).dim();
        let demo = make_demo(
            ActionModeConfig::joint_position(false),
            vec![Array1::from_elem(dim, 100.0); 5],
        );
        let out = decimate(&demo, CONTROL_FREQUENCY_MAX, CONTROL_FREQUENCY_MAX, &robot)
            .expect("decimation");
        assert_eq!(out.duration(), 5);
        for (a, b) in out.timesteps().iter().zip(demo.timesteps()) {
            assert_eq!(a.executed_action(), b.executed_action());
        }
    }

    #[test]
    fn test_output_length_and_tail_padding() {
        let robot = pointarm_spec();
        let demo = make_demo(ActionModeConfig::joint_position(false), constant_actions(1003, 0.001));
        let out = decimate(&demo, 50, CONTROL_FREQUENCY_MAX, &robot).expect("decimation");
        // ceil(1003 / 10) = 101 windows
        assert_eq!(out.duration(), 101);
    }

    #[test]
    fn test_thousand_steps_500hz_to_50hz() {
        let robot = pointarm_spec();
        let mode = ActionModeConfig::joint_position(false);
        let layout = robot.layout(&mode);
        let mut actions = constant_actions(1000, 0.001);
        // Distinct gripper value per substep so take-last is observable
        for (i, action) in actions.iter_mut().enumerate() {
            for dim in layout.gripper_range() {
                action[dim] = (i % 10) as f64 / 10.0;
            }
        }
        let demo = make_demo(mode, actions);
        let out = decimate(&demo, 50, CONTROL_FREQUENCY_MAX, &robot).expect("decimation");
        assert_eq!(out.duration(), 100);
        for step in out.timesteps() {
            for dim in layout.gripper_range() {
                // Every 10th substep carries gripper value 0.9: take-last,
                // never an average
                assert_eq!(step.executed_action()[dim], 0.9);
            }
            for dim in layout.limb_range() {
                // Delta limbs are summed across the window
                assert!((step.executed_action()[dim] - 0.01).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_boundary_saturation_stays_bounded() {
        let robot = pointarm_spec();
        let mode = ActionModeConfig::joint_position(false);
        let bounds = robot.action_bounds(&mode, 10.0);
        // Every substep saturated at the per-step bound; sums exceed even
        // the scaled window bound
        let demo = make_demo(mode.clone(), constant_actions(100, 10.0));
        let out = decimate(&demo, 50, CONTROL_FREQUENCY_MAX, &robot).expect("decimation");
        for step in out.timesteps() {
            assert!(bounds.contains(step.executed_action(), 1e-9));
        }
    }

    #[test]
    fn test_overhead_carried_not_discarded() {
        let robot = pointarm_spec();
        let mode = ActionModeConfig::joint_position(false);
        let layout = robot.layout(&mode);
        let dim = layout.dim();
        // First window over-saturates one limb joint, second window is
        // idle; the carried overhead must surface in the second output
        let mut actions = vec![Array1::zeros(dim); 20];
        let limb = layout.limb_range().start;
        for action in actions.iter_mut().take(10) {
            action[limb] = 0.15;
        }
        let demo = make_demo(mode, actions);
        let out = decimate(&demo, 50, CONTROL_FREQUENCY_MAX, &robot).expect("decimation");
        // window bound is limb_delta_range * 10 = 1.0; requested 1.5
        assert!((out.timesteps()[0].executed_action()[limb] - 1.0).abs() < 1e-12);
        assert!((out.timesteps()[1].executed_action()[limb] - 0.5).abs() < 1e-12);
        // Total effect preserved
        let total: f64 = out
            .timesteps()
            .iter()
            .map(|step| step.executed_action()[limb])
            .sum();
        assert!((total - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_absolute_mode_averages_post_base_dims() {
        let robot = pointarm_spec();
        let mode = ActionModeConfig::joint_position(true);
        let layout = robot.layout(&mode);
        let dim = layout.dim();
        let mut actions = Vec::new();
        for _ in 0..10 {
            let mut action = Array1::zeros(dim);
            for d in layout.limb_range() {
                action[d] = 0.8;
            }
            actions.push(action);
        }
        let demo = make_demo(mode, actions);
        let out = decimate(&demo, 50, CONTROL_FREQUENCY_MAX, &robot).expect("decimation");
        assert_eq!(out.duration(), 1);
        for d in layout.limb_range() {
            // Ten identical absolute targets average back to the target
            assert!((out.timesteps()[0].executed_action()[d] - 0.8).abs() < 1e-12);
        }
    }
}
