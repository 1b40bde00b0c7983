//! Waypoint Runner - drives a RealMan arm through a list of waypoints
//!
//! The vendor control library does the real work; this crate loads it,
//! opens one controller session, configures the arm and sends one blocking
//! joint-space move per waypoint in file order.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use waypoint_runner::{library, RunnerConfig, WaypointRunner, WaypointSet};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunnerConfig::load_from_path(Path::new("config/default_config.yaml"))?;
//!     let waypoints = WaypointSet::load(&config.waypoints.path)?;
//!
//!     let report = WaypointRunner::new(&config)
//!         .execute(&waypoints, |lib| library::acquire(&lib.path, lib.init_mode))?
//!         .into_result()?;
//!     println!("Moved through {} waypoints", report.completed.len());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **library**: process-wide native function table
//! - **ArmApi**: seam over the session-level library calls
//! - **Session**: owns one controller handle, closes it on every exit path
//! - **WaypointRunner**: validation and the run sequence
//! - **SimulatedArm**: in-process controller for dry runs and tests

pub mod arm;
pub mod config;
pub mod error;
pub mod library;
pub mod pose;
pub mod runner;
pub mod session;
pub mod simulated;
pub mod waypoints;

pub use arm::{ArmApi, STATUS_OK};
pub use config::{
    ArmModel, ConnectionConfig, FailurePolicy, LibraryConfig, MotionConfig, PoseLimits,
    RunnerConfig, SetupConfig, WaypointsConfig,
};
pub use error::{Result, RunnerError};
pub use library::NativeArmApi;
pub use pose::Pose;
pub use runner::{FailedMove, RunReport, WaypointRunner};
pub use session::{Session, SetupReport};
pub use simulated::{ArmCall, SimulatedArm};
pub use waypoints::{Waypoint, WaypointSet};
