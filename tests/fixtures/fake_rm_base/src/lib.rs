//! Exports the arm control entry points with fixed answers and call counters.

use std::os::raw::{c_char, c_float, c_int};
use std::sync::atomic::{AtomicI32, Ordering};

#[repr(C)]
#[derive(Clone, Copy)]
pub struct Pose {
    pub px: f32,
    pub py: f32,
    pub pz: f32,
    pub rx: f32,
    pub ry: f32,
    pub rz: f32,
}

pub const SESSION_HANDLE: c_int = 3;

static INIT_CALLS: AtomicI32 = AtomicI32::new(0);
static LAST_INIT_MODE: AtomicI32 = AtomicI32::new(-1);
static LAST_PORT: AtomicI32 = AtomicI32::new(-1);
static LAST_VELOCITY: AtomicI32 = AtomicI32::new(-1);
// Millimetres, so the pose can be checked without float atomics.
static LAST_PZ_MM: AtomicI32 = AtomicI32::new(-1);
static CLOSE_CALLS: AtomicI32 = AtomicI32::new(0);

#[no_mangle]
pub extern "C" fn RM_API_Init(mode: c_int) -> c_int {
    INIT_CALLS.fetch_add(1, Ordering::SeqCst);
    LAST_INIT_MODE.store(mode, Ordering::SeqCst);
    0
}

#[no_mangle]
pub extern "C" fn Arm_Socket_Start(
    ip: *const c_char,
    port: c_int,
    _arm_type: c_int,
    _recv_timeout: c_int,
) -> c_int {
    if ip.is_null() {
        return -1;
    }
    LAST_PORT.store(port, Ordering::SeqCst);
    SESSION_HANDLE
}

#[no_mangle]
pub extern "C" fn Set_Arm_Tip_Init(handle: c_int, _flag: c_int) -> c_int {
    if handle == SESSION_HANDLE { 0 } else { 1 }
}

#[no_mangle]
pub extern "C" fn Set_Collision_Stage(handle: c_int, _stage: c_int, _sensitivity: c_int) -> c_int {
    if handle == SESSION_HANDLE { 0 } else { 1 }
}

#[no_mangle]
pub extern "C" fn Movej_P_Cmd(handle: c_int, pose: Pose, v: u8, _r: c_float, _block: bool) -> c_int {
    LAST_VELOCITY.store(c_int::from(v), Ordering::SeqCst);
    LAST_PZ_MM.store(pose.pz.round() as c_int, Ordering::SeqCst);
    if handle == SESSION_HANDLE { 0 } else { 1 }
}

#[no_mangle]
pub extern "C" fn Arm_Socket_Close(_handle: c_int) -> c_int {
    CLOSE_CALLS.fetch_add(1, Ordering::SeqCst);
    0
}

#[no_mangle]
pub extern "C" fn fake_init_calls() -> c_int {
    INIT_CALLS.load(Ordering::SeqCst)
}

#[no_mangle]
pub extern "C" fn fake_last_init_mode() -> c_int {
    LAST_INIT_MODE.load(Ordering::SeqCst)
}

#[no_mangle]
pub extern "C" fn fake_last_port() -> c_int {
    LAST_PORT.load(Ordering::SeqCst)
}

#[no_mangle]
pub extern "C" fn fake_last_velocity() -> c_int {
    LAST_VELOCITY.load(Ordering::SeqCst)
}

#[no_mangle]
pub extern "C" fn fake_last_pz_mm() -> c_int {
    LAST_PZ_MM.load(Ordering::SeqCst)
}

#[no_mangle]
pub extern "C" fn fake_close_calls() -> c_int {
    CLOSE_CALLS.load(Ordering::SeqCst)
}
