//! Pure-kinematic integrator environment.
//!
//! A minimal, fully deterministic `Environment` used to exercise the
//! conversion pipeline: the floating base integrates delta commands, limb
//! joints follow position targets (absolute or delta) exactly, grippers
//! latch the last command. Replay equivalence properties are checked against
//! this environment because its dynamics are exact.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::action_mode::ActionModeConfig;
use super::layout::ActionLayout;
use super::registry::{EnvFactory, EnvRegistry, EnvRequest};
use super::robot::RobotSpec;
use super::space::ActionBounds;
use super::{
    CameraConfig, EnvError, Environment, Info, Observation, StepOutcome, CONTROL_FREQUENCY_MAX,
    CONTROL_FREQUENCY_MIN,
};
use crate::error::RegistryError;

/// Registry name of the builtin kinematic task.
pub const ENV_NAME: &str = "kinematic_reach";

/// Registry name of the builtin robot descriptor.
pub const ROBOT_NAME: &str = "pointarm";

/// Descriptor of the builtin two-gripper point arm.
pub fn pointarm_spec() -> RobotSpec {
    RobotSpec {
        name: ROBOT_NAME.to_string(),
        base_linear_delta: 0.02,
        base_angular_delta: 0.05,
        limb_joint_ranges: vec![(-1.5, 1.5); 4],
        limb_delta_range: 0.1,
        gripper_count: 2,
    }
}

/// Registry preloaded with the builtin environment and robot.
pub fn builtin_registry() -> EnvRegistry {
    let mut registry = EnvRegistry::new();
    registry.register_robot(pointarm_spec());
    let factory: EnvFactory = Box::new(|request| {
        KinematicEnv::new(request).map(|env| Box::new(env) as Box<dyn Environment>)
    });
    registry.register_env(ENV_NAME, ROBOT_NAME, factory);
    registry
}

/// Deterministic integrator environment over a three-region action vector.
pub struct KinematicEnv {
    name: String,
    robot: RobotSpec,
    mode: ActionModeConfig,
    cameras: Vec<CameraConfig>,
    control_frequency: u32,
    bounds: ActionBounds,
    layout: ActionLayout,
    base_pose: Array1<f64>,
    qpos: Array1<f64>,
    grippers: Array1<f64>,
    goal: Array1<f64>,
    seed: u64,
}

impl KinematicEnv {
    pub fn new(request: &EnvRequest) -> Result<Self, RegistryError> {
        let frequency = request.control_frequency;
        if !(CONTROL_FREQUENCY_MIN..=CONTROL_FREQUENCY_MAX).contains(&frequency)
            || CONTROL_FREQUENCY_MAX % frequency != 0
        {
            return Err(RegistryError::ConstructionFailed {
                name: request.env_name.clone(),
                message: format!(
                    "control frequency {frequency} Hz must divide {CONTROL_FREQUENCY_MAX} Hz \
                     and lie in {CONTROL_FREQUENCY_MIN}-{CONTROL_FREQUENCY_MAX}"
                ),
            });
        }
        let action_scale = (CONTROL_FREQUENCY_MAX / frequency) as f64;
        let bounds = request.robot.action_bounds(&request.action_mode, action_scale);
        let layout = request.robot.layout(&request.action_mode);
        Ok(Self {
            name: request.env_name.clone(),
            bounds,
            layout,
            base_pose: Array1::zeros(layout.base_dims()),
            qpos: Array1::zeros(request.robot.limb_joint_ranges.len()),
            grippers: Array1::zeros(request.robot.gripper_count),
            goal: Array1::zeros(request.robot.limb_joint_ranges.len()),
            robot: request.robot.clone(),
            mode: request.action_mode.clone(),
            cameras: request.cameras.clone(),
            control_frequency: frequency,
            seed: 0,
        })
    }

    fn observe(&self) -> Observation {
        let mut observation = Observation::new();
        observation.insert("proprioception_base".to_string(), self.base_pose.clone());
        observation.insert("proprioception_qpos".to_string(), self.qpos.clone());
        observation.insert("proprioception_grippers".to_string(), self.grippers.clone());
        observation.insert("goal".to_string(), self.goal.clone());
        for camera in &self.cameras {
            let pixels = (camera.resolution.0 * camera.resolution.1) as usize;
            let brightness = self.qpos.iter().map(|v| v.abs()).sum::<f64>();
            observation.insert(
                format!("rgb_{}", camera.name),
                Array1::from_elem(pixels, brightness),
            );
        }
        observation
    }

    fn reward(&self) -> f64 {
        let error: f64 = self
            .qpos
            .iter()
            .zip(self.goal.iter())
            .map(|(q, g)| (q - g).abs())
            .sum();
        -(error / self.qpos.len().max(1) as f64)
    }
}

impl Environment for KinematicEnv {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self, seed: u64) -> Result<Observation, EnvError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.seed = seed;
        self.base_pose.fill(0.0);
        // The arm always starts at the joint-space origin; only the goal is
        // randomized, so recorded action sequences replay exactly
        self.qpos.fill(0.0);
        self.grippers.fill(0.0);
        for (value, &(lo, hi)) in self.goal.iter_mut().zip(self.robot.limb_joint_ranges.iter()) {
            *value = rng.random_range(lo * 0.5..hi * 0.5);
        }
        Ok(self.observe())
    }

    fn step(&mut self, action: &Array1<f64>) -> Result<StepOutcome, EnvError> {
        if action.len() != self.layout.dim() {
            return Err(EnvError(format!(
                "action has {} dims, expected {}",
                action.len(),
                self.layout.dim()
            )));
        }
        let action = self
            .bounds
            .clip(action)
            .map_err(|e| EnvError(e.to_string()))?;

        for (i, dim) in self.layout.base_range().enumerate() {
            self.base_pose[i] += action[dim];
        }
        let absolute = self.mode.is_absolute().unwrap_or(false);
        for (i, dim) in self.layout.limb_range().enumerate() {
            let (lo, hi) = self.robot.limb_joint_ranges[i];
            let target = if absolute {
                action[dim]
            } else {
                self.qpos[i] + action[dim]
            };
            self.qpos[i] = target.clamp(lo, hi);
        }
        for (i, dim) in self.layout.gripper_range().enumerate() {
            self.grippers[i] = action[dim].clamp(0.0, 1.0);
        }

        Ok(StepOutcome {
            observation: self.observe(),
            reward: self.reward(),
            terminated: false,
            truncated: false,
            info: Info::new(),
        })
    }

    fn action_bounds(&self) -> &ActionBounds {
        &self.bounds
    }

    fn robot(&self) -> &RobotSpec {
        &self.robot
    }

    fn action_mode(&self) -> &ActionModeConfig {
        &self.mode
    }

    fn control_frequency(&self) -> u32 {
        self.control_frequency
    }

    fn cameras(&self) -> &[CameraConfig] {
        &self.cameras
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}
