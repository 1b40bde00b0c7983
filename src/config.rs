//! Configuration loading for waypoint runs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Result, RunnerError};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    pub library: LibraryConfig,
    pub connection: ConnectionConfig,
    pub setup: SetupConfig,
    pub motion: MotionConfig,
    pub waypoints: WaypointsConfig,
    pub limits: Option<PoseLimits>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
    pub path: PathBuf,
    /// Mode argument for the library's one-time init call
    pub init_mode: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub arm_model: ArmModel,
    pub recv_timeout_ms: u32,
}

/// Arm models recognised by the controller's connect call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmModel {
    Rm65,
    Rm75,
    Rml63i,
    Rml63ii,
    Eco65,
    Gen72,
}

impl ArmModel {
    /// Type code passed to the library's connect call.
    pub fn code(self) -> i32 {
        match self {
            ArmModel::Rm65 => 65,
            ArmModel::Rm75 => 75,
            ArmModel::Rml63i => 631,
            ArmModel::Rml63ii => 632,
            ArmModel::Eco65 => 651,
            ArmModel::Gen72 => 72,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetupConfig {
    pub tip_init_flag: i32,
    pub collision_stage: i32,
    pub collision_sensitivity: i32,
    /// Treat a failed setup call as fatal instead of logging it
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotionConfig {
    /// Percent of maximum joint speed
    pub velocity: u8,
    pub blend_radius: f32,
    pub blocking: bool,
    pub on_failure: FailurePolicy,
}

/// What to do with the remaining waypoints after a move is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Abort,
    Continue,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaypointsConfig {
    pub path: PathBuf,
}

/// Cartesian bounds every waypoint position must fall within.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PoseLimits {
    pub position_min: [f32; 3],
    pub position_max: [f32; 3],
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: Path::new("lib").join(libloading::library_filename("RM_Base")),
            init_mode: 0,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.18".to_string(),
            port: 8080,
            arm_model: ArmModel::Rm65,
            recv_timeout_ms: 200,
        }
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            tip_init_flag: 1,
            collision_stage: 1,
            collision_sensitivity: 1,
            required: false,
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            velocity: 20,
            blend_radius: 0.0,
            blocking: true,
            on_failure: FailurePolicy::Abort,
        }
    }
}

impl Default for WaypointsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/waypoints.json"),
        }
    }
}

impl RunnerConfig {
    /// Load a YAML config file.
    ///
    /// Relative library and waypoint paths are resolved against the
    /// directory containing the config file.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(config_path).map_err(|e| {
            RunnerError::Config(format!("Failed to read {}: {}", config_path.display(), e))
        })?;

        let mut config = Self::from_yaml_str(&contents)?;
        if let Some(base) = config_path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: RunnerConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        if self.library.path.is_relative() {
            self.library.path = base.join(&self.library.path);
        }
        if self.waypoints.path.is_relative() {
            self.waypoints.path = base.join(&self.waypoints.path);
        }
    }

    /// Check values the library would otherwise receive unchecked.
    pub fn validate(&self) -> Result<()> {
        let conn = &self.connection;
        if conn.host.trim().is_empty() {
            return Err(RunnerError::Config("connection.host is empty".to_string()));
        }
        if conn.host.contains('\0') {
            return Err(RunnerError::Config("connection.host contains a NUL byte".to_string()));
        }
        if conn.port == 0 {
            return Err(RunnerError::Config("connection.port must be non-zero".to_string()));
        }
        if conn.recv_timeout_ms == 0 || conn.recv_timeout_ms > i32::MAX as u32 {
            return Err(RunnerError::Config(format!(
                "connection.recv_timeout_ms out of range: {}",
                conn.recv_timeout_ms
            )));
        }

        let motion = &self.motion;
        if !(1..=100).contains(&motion.velocity) {
            return Err(RunnerError::Config(format!(
                "motion.velocity must be within 1..=100, got {}",
                motion.velocity
            )));
        }
        if !motion.blend_radius.is_finite() || motion.blend_radius < 0.0 {
            return Err(RunnerError::Config(format!(
                "motion.blend_radius must be a non-negative number, got {}",
                motion.blend_radius
            )));
        }

        if let Some(limits) = &self.limits {
            for axis in 0..3 {
                let (min, max) = (limits.position_min[axis], limits.position_max[axis]);
                if !min.is_finite() || !max.is_finite() {
                    return Err(RunnerError::Config(format!(
                        "limits: bounds for axis {} must be finite numbers, got [{}, {}]",
                        axis, min, max
                    )));
                }
                if min > max {
                    return Err(RunnerError::Config(format!(
                        "limits: position_min[{}] is greater than position_max[{}]",
                        axis, axis
                    )));
                }
            }
        }

        Ok(())
    }
}
