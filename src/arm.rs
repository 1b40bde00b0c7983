//! Arm control seam
//!
//! Session-level entry points of the vendor control library. The native
//! function table in [`crate::library`] and the in-process
//! [`crate::simulated::SimulatedArm`] both implement it, so the run logic
//! never knows which one it is driving.

use std::ffi::CStr;

use crate::pose::Pose;

/// Status code meaning success for every setup, motion and close call.
pub const STATUS_OK: i32 = 0;

/// Calls a connected arm accepts.
///
/// Arguments and return values mirror the vendor C ABI: handles are plain
/// integers (negative from `socket_start` means no connection) and every
/// other call returns a status code where `0` is success.
pub trait ArmApi {
    /// Open a session with the controller at `host:port`.
    fn socket_start(&self, host: &CStr, port: i32, arm_type: i32, recv_timeout_ms: i32) -> i32;

    /// Initialise the tool center point frame.
    fn set_tip_init(&self, handle: i32, flag: i32) -> i32;

    /// Configure collision detection.
    fn set_collision_stage(&self, handle: i32, stage: i32, sensitivity: i32) -> i32;

    /// Joint-space move to a Cartesian pose.
    fn movej_p(&self, handle: i32, pose: Pose, velocity: u8, radius: f32, block: bool) -> i32;

    /// Close the session.
    fn socket_close(&self, handle: i32) -> i32;
}

impl<A: ArmApi + ?Sized> ArmApi for &A {
    fn socket_start(&self, host: &CStr, port: i32, arm_type: i32, recv_timeout_ms: i32) -> i32 {
        (**self).socket_start(host, port, arm_type, recv_timeout_ms)
    }

    fn set_tip_init(&self, handle: i32, flag: i32) -> i32 {
        (**self).set_tip_init(handle, flag)
    }

    fn set_collision_stage(&self, handle: i32, stage: i32, sensitivity: i32) -> i32 {
        (**self).set_collision_stage(handle, stage, sensitivity)
    }

    fn movej_p(&self, handle: i32, pose: Pose, velocity: u8, radius: f32, block: bool) -> i32 {
        (**self).movej_p(handle, pose, velocity, radius, block)
    }

    fn socket_close(&self, handle: i32) -> i32 {
        (**self).socket_close(handle)
    }
}
