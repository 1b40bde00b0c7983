//! Arm controller session
//!
//! A [`Session`] exists only for a non-negative handle, so holding one is
//! proof that connect succeeded. The handle is closed exactly once: by
//! [`Session::close`] on the normal path, or by `Drop` on any early return.

use serde::Serialize;
use std::ffi::CString;
use tracing::{debug, info, warn};

use crate::{
    arm::{ArmApi, STATUS_OK},
    config::{ConnectionConfig, MotionConfig, SetupConfig},
    pose::Pose,
    Result, RunnerError,
};

/// Outcome of the two device setup calls. `None` means success.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SetupReport {
    pub tip_init_error: Option<i32>,
    pub collision_stage_error: Option<i32>,
}

impl SetupReport {
    pub fn is_ok(&self) -> bool {
        self.tip_init_error.is_none() && self.collision_stage_error.is_none()
    }
}

pub struct Session<A: ArmApi> {
    api: A,
    handle: Option<i32>,
}

impl<A: ArmApi> Session<A> {
    /// Open a session with the controller.
    pub fn connect(api: A, config: &ConnectionConfig) -> Result<Self> {
        let host = CString::new(config.host.as_str())
            .map_err(|_| RunnerError::Config("connection.host contains a NUL byte".to_string()))?;
        let timeout = i32::try_from(config.recv_timeout_ms).map_err(|_| {
            RunnerError::Config(format!(
                "connection.recv_timeout_ms out of range: {}",
                config.recv_timeout_ms
            ))
        })?;

        info!(
            "Connecting to arm at {}:{} (model {:?})",
            config.host, config.port, config.arm_model
        );
        let handle = api.socket_start(
            &host,
            i32::from(config.port),
            config.arm_model.code(),
            timeout,
        );
        if handle < 0 {
            return Err(RunnerError::Connection {
                host: config.host.clone(),
                port: config.port,
                code: handle,
            });
        }

        info!("Connected to arm (handle {})", handle);
        Ok(Self {
            api,
            handle: Some(handle),
        })
    }

    pub fn handle(&self) -> i32 {
        // Only cleared by close(), which consumes the session.
        self.handle.unwrap_or(-1)
    }

    /// Initialise the tool frame and collision detection.
    ///
    /// Failures are logged and reported; they only become errors when
    /// `config.required` is set.
    pub fn configure(&self, config: &SetupConfig) -> Result<SetupReport> {
        let handle = self.handle();
        let mut report = SetupReport::default();

        let code = self.api.set_tip_init(handle, config.tip_init_flag);
        if code == STATUS_OK {
            info!("Tool center point initialised");
        } else {
            warn!("Set_Arm_Tip_Init failed with status {}", code);
            if config.required {
                return Err(RunnerError::Configuration {
                    call: "Set_Arm_Tip_Init",
                    code,
                });
            }
            report.tip_init_error = Some(code);
        }

        let code = self.api.set_collision_stage(
            handle,
            config.collision_stage,
            config.collision_sensitivity,
        );
        if code == STATUS_OK {
            info!(
                "Collision stage set (stage {}, sensitivity {})",
                config.collision_stage, config.collision_sensitivity
            );
        } else {
            warn!("Set_Collision_Stage failed with status {}", code);
            if config.required {
                return Err(RunnerError::Configuration {
                    call: "Set_Collision_Stage",
                    code,
                });
            }
            report.collision_stage_error = Some(code);
        }

        Ok(report)
    }

    /// Issue one move and return the controller's status code.
    pub fn move_to(&self, pose: Pose, motion: &MotionConfig) -> i32 {
        let code = self.api.movej_p(
            self.handle(),
            pose,
            motion.velocity,
            motion.blend_radius,
            motion.blocking,
        );
        debug!("Movej_P_Cmd {} returned {}", pose, code);
        code
    }

    /// Close the session and return the close call's status.
    pub fn close(mut self) -> i32 {
        self.release().unwrap_or(STATUS_OK)
    }

    fn release(&mut self) -> Option<i32> {
        let handle = self.handle.take()?;
        let code = self.api.socket_close(handle);
        if code == STATUS_OK {
            info!("Disconnected from arm");
        } else {
            warn!("Arm_Socket_Close returned {}", code);
        }
        Some(code)
    }
}

impl<A: ArmApi> Drop for Session<A> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            debug!("Closing arm session on early exit");
            let _ = self.release();
        }
    }
}
