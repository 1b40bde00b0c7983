//! Waypoint run orchestration
//!
//! Everything that can be checked offline (configuration, waypoint file,
//! position limits) is checked before the library is touched. After that
//! the run is strictly sequential: connect, configure, one blocking move per
//! waypoint in file order, close.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use crate::{
    arm::{ArmApi, STATUS_OK},
    config::{FailurePolicy, LibraryConfig, RunnerConfig},
    session::{Session, SetupReport},
    waypoints::WaypointSet,
    Result, RunnerError,
};

/// A move the controller rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedMove {
    pub label: String,
    pub code: i32,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub handle: i32,
    pub setup: SetupReport,
    pub completed: Vec<String>,
    pub failed: Vec<FailedMove>,
    /// Set when a rejected move ended the run under the abort policy
    pub aborted: bool,
    /// Set when the operator stopped the run before every waypoint was sent
    pub stopped: bool,
    pub close_status: i32,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.stopped
    }

    /// First rejected move as an error, if any.
    pub fn first_failure(&self) -> Option<RunnerError> {
        self.failed.first().map(|f| RunnerError::MotionCommand {
            label: f.label.clone(),
            code: f.code,
        })
    }

    /// The report itself if every move succeeded, otherwise the first rejected move.
    pub fn into_result(self) -> Result<Self> {
        match self.first_failure() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Drives one arm session through a waypoint set.
pub struct WaypointRunner<'a> {
    config: &'a RunnerConfig,
    stop: Option<&'a AtomicBool>,
}

impl<'a> WaypointRunner<'a> {
    pub fn new(config: &'a RunnerConfig) -> Self {
        Self { config, stop: None }
    }

    /// Check `stop` before each waypoint and end the run early once it is set.
    pub fn with_stop_signal(mut self, stop: &'a AtomicBool) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Validate, acquire the arm through `load`, then run.
    ///
    /// `load` is only called once the configuration and waypoints have been
    /// validated, and nothing is sent to the arm if it fails.
    pub fn execute<A, L>(&self, waypoints: &WaypointSet, load: L) -> Result<RunReport>
    where
        A: ArmApi,
        L: FnOnce(&LibraryConfig) -> Result<A>,
    {
        self.preflight(waypoints)?;
        let api = load(&self.config.library)?;
        self.run(api, waypoints)
    }

    /// Offline checks on configuration and waypoints.
    pub fn preflight(&self, waypoints: &WaypointSet) -> Result<()> {
        self.config.validate()?;
        if waypoints.is_empty() {
            return Err(RunnerError::DataFormat("no waypoints defined".to_string()));
        }
        if let Some(limits) = &self.config.limits {
            waypoints.check_limits(limits)?;
        }
        Ok(())
    }

    /// Connect, configure and move through `waypoints` with an acquired arm.
    pub fn run<A: ArmApi>(&self, api: A, waypoints: &WaypointSet) -> Result<RunReport> {
        let session = Session::connect(api, &self.config.connection)?;
        let mut report = RunReport {
            handle: session.handle(),
            setup: session.configure(&self.config.setup)?,
            ..RunReport::default()
        };

        let motion = &self.config.motion;
        let total = waypoints.len();
        for (index, waypoint) in waypoints.iter().enumerate() {
            if self.stop_requested() {
                warn!(
                    "Stop requested; skipping {} remaining waypoints",
                    total - index
                );
                report.stopped = true;
                break;
            }

            let code = session.move_to(waypoint.pose, motion);
            if code == STATUS_OK {
                info!(
                    "Moved to pose {} ({}/{}): {}",
                    waypoint.label,
                    index + 1,
                    total,
                    waypoint.pose
                );
                report.completed.push(waypoint.label.clone());
                continue;
            }

            error!("Move to pose {} failed with status {}", waypoint.label, code);
            report.failed.push(FailedMove {
                label: waypoint.label.clone(),
                code,
            });
            if motion.on_failure == FailurePolicy::Abort {
                warn!(
                    "Aborting run; skipping {} remaining waypoints",
                    total - index - 1
                );
                report.aborted = true;
                break;
            }
        }

        report.close_status = session.close();
        info!(
            "Run finished: {} moved, {} failed{}",
            report.completed.len(),
            report.failed.len(),
            if report.stopped { ", stopped early" } else { "" }
        );
        Ok(report)
    }

    fn stop_requested(&self) -> bool {
        self.stop.is_some_and(|s| s.load(Ordering::Relaxed))
    }
}
