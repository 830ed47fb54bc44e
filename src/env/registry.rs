//! Name-keyed environment and robot registry.
//!
//! Metadata stores environments and robots by name; this registry is the
//! explicit mapping that resolves those names back to live instances. It is
//! built once at process start and injected wherever resolution is needed;
//! there is no global lookup.

use std::collections::HashMap;

use super::action_mode::ActionModeConfig;
use super::robot::RobotSpec;
use super::{CameraConfig, Environment};
use crate::error::RegistryError;

/// Everything an environment factory needs to construct an instance.
#[derive(Debug, Clone)]
pub struct EnvRequest {
    pub env_name: String,
    pub robot: RobotSpec,
    pub action_mode: ActionModeConfig,
    pub cameras: Vec<CameraConfig>,
    pub control_frequency: u32,
}

/// Constructor for a named environment.
pub type EnvFactory =
    Box<dyn Fn(&EnvRequest) -> Result<Box<dyn Environment>, RegistryError> + Send + Sync>;

struct EnvEntry {
    factory: EnvFactory,
    default_robot: String,
}

/// Registry of environment factories and robot descriptors.
pub struct EnvRegistry {
    envs: HashMap<String, EnvEntry>,
    robots: HashMap<String, RobotSpec>,
}

impl EnvRegistry {
    pub fn new() -> Self {
        Self {
            envs: HashMap::new(),
            robots: HashMap::new(),
        }
    }

    /// Register an environment factory under `name`.
    ///
    /// `default_robot` is the robot the environment uses when none is
    /// requested explicitly; store keys only mention the robot when it
    /// differs from this default.
    pub fn register_env(
        &mut self,
        name: impl Into<String>,
        default_robot: impl Into<String>,
        factory: EnvFactory,
    ) {
        self.envs.insert(
            name.into(),
            EnvEntry {
                factory,
                default_robot: default_robot.into(),
            },
        );
    }

    pub fn register_robot(&mut self, spec: RobotSpec) {
        self.robots.insert(spec.name.clone(), spec);
    }

    /// Resolve a robot descriptor by name.
    pub fn robot(&self, name: &str) -> Result<&RobotSpec, RegistryError> {
        self.robots
            .get(name)
            .ok_or_else(|| RegistryError::UnknownRobot(name.to_string()))
    }

    /// Default robot name for a registered environment.
    pub fn default_robot(&self, env_name: &str) -> Result<&str, RegistryError> {
        self.envs
            .get(env_name)
            .map(|entry| entry.default_robot.as_str())
            .ok_or_else(|| RegistryError::UnknownEnvironment(env_name.to_string()))
    }

    /// Construct a fresh environment instance by name.
    pub fn build_env(
        &self,
        env_name: &str,
        robot_name: &str,
        action_mode: ActionModeConfig,
        cameras: Vec<CameraConfig>,
        control_frequency: u32,
    ) -> Result<Box<dyn Environment>, RegistryError> {
        let entry = self
            .envs
            .get(env_name)
            .ok_or_else(|| RegistryError::UnknownEnvironment(env_name.to_string()))?;
        let robot = self.robot(robot_name)?.clone();
        let request = EnvRequest {
            env_name: env_name.to_string(),
            robot,
            action_mode,
            cameras,
            control_frequency,
        };
        (entry.factory)(&request)
    }
}

impl Default for EnvRegistry {
    fn default() -> Self {
        Self::new()
    }
}
