//! In-process stand-in for the arm controller
//!
//! Records every call it receives and answers with configurable status
//! codes. Used for dry runs without hardware and throughout the tests.

use serde::Serialize;
use std::collections::VecDeque;
use std::ffi::CStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::{
    arm::{ArmApi, STATUS_OK},
    pose::Pose,
};

/// One call received by the simulated arm.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ArmCall {
    SocketStart {
        host: String,
        port: i32,
        arm_type: i32,
        recv_timeout_ms: i32,
    },
    SetTipInit {
        handle: i32,
        flag: i32,
    },
    SetCollisionStage {
        handle: i32,
        stage: i32,
        sensitivity: i32,
    },
    MovejP {
        handle: i32,
        pose: Pose,
        velocity: u8,
        radius: f32,
        block: bool,
    },
    SocketClose {
        handle: i32,
    },
}

#[derive(Debug)]
struct SimState {
    calls: Vec<ArmCall>,
    connect_result: i32,
    tip_init_status: i32,
    collision_status: i32,
    motion_statuses: VecDeque<i32>,
    close_status: i32,
    current_pose: Option<Pose>,
}

/// Simulated arm controller.
#[derive(Debug)]
pub struct SimulatedArm {
    state: Mutex<SimState>,
}

impl Default for SimulatedArm {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedArm {
    /// An arm that accepts every call, handing out session handle 1.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimState {
                calls: Vec::new(),
                connect_result: 1,
                tip_init_status: STATUS_OK,
                collision_status: STATUS_OK,
                motion_statuses: VecDeque::new(),
                close_status: STATUS_OK,
                current_pose: None,
            }),
        }
    }

    /// Value returned by the connect call; negative simulates a refused connection.
    pub fn with_connect_result(self, handle: i32) -> Self {
        self.lock().connect_result = handle;
        self
    }

    pub fn with_tip_init_status(self, status: i32) -> Self {
        self.lock().tip_init_status = status;
        self
    }

    pub fn with_collision_status(self, status: i32) -> Self {
        self.lock().collision_status = status;
        self
    }

    /// Statuses for successive move calls. Moves beyond the list succeed.
    pub fn with_motion_statuses(self, statuses: impl IntoIterator<Item = i32>) -> Self {
        self.lock().motion_statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_close_status(self, status: i32) -> Self {
        self.lock().close_status = status;
        self
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<ArmCall> {
        self.lock().calls.clone()
    }

    /// Poses of the move calls received so far, in order.
    pub fn commanded_poses(&self) -> Vec<Pose> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ArmCall::MovejP { pose, .. } => Some(*pose),
                _ => None,
            })
            .collect()
    }

    /// Last pose the arm reached successfully.
    pub fn current_pose(&self) -> Option<Pose> {
        self.lock().current_pose
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ArmApi for SimulatedArm {
    fn socket_start(&self, host: &CStr, port: i32, arm_type: i32, recv_timeout_ms: i32) -> i32 {
        let mut state = self.lock();
        state.calls.push(ArmCall::SocketStart {
            host: host.to_string_lossy().into_owned(),
            port,
            arm_type,
            recv_timeout_ms,
        });
        debug!("[sim] socket_start -> {}", state.connect_result);
        state.connect_result
    }

    fn set_tip_init(&self, handle: i32, flag: i32) -> i32 {
        let mut state = self.lock();
        state.calls.push(ArmCall::SetTipInit { handle, flag });
        state.tip_init_status
    }

    fn set_collision_stage(&self, handle: i32, stage: i32, sensitivity: i32) -> i32 {
        let mut state = self.lock();
        state.calls.push(ArmCall::SetCollisionStage {
            handle,
            stage,
            sensitivity,
        });
        state.collision_status
    }

    fn movej_p(&self, handle: i32, pose: Pose, velocity: u8, radius: f32, block: bool) -> i32 {
        let mut state = self.lock();
        state.calls.push(ArmCall::MovejP {
            handle,
            pose,
            velocity,
            radius,
            block,
        });
        let status = state.motion_statuses.pop_front().unwrap_or(STATUS_OK);
        if status == STATUS_OK {
            state.current_pose = Some(pose);
        }
        debug!("[sim] movej_p {} -> {}", pose, status);
        status
    }

    fn socket_close(&self, handle: i32) -> i32 {
        let mut state = self.lock();
        state.calls.push(ArmCall::SocketClose { handle });
        state.close_status
    }
}
