//! Native arm control library
//!
//! The vendor library is loaded once per process. All entry points are
//! resolved up front so a missing symbol fails at load time instead of
//! halfway through a run.

use libloading::Library;
use std::ffi::CStr;
use std::os::raw::{c_char, c_float, c_int};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::{debug, info, warn};

use crate::{arm::ArmApi, pose::Pose, Result, RunnerError};

type ApiInitFn = unsafe extern "C" fn(mode: c_int) -> c_int;
type SocketStartFn =
    unsafe extern "C" fn(ip: *const c_char, port: c_int, arm_type: c_int, recv_timeout: c_int) -> c_int;
type TipInitFn = unsafe extern "C" fn(handle: c_int, flag: c_int) -> c_int;
type CollisionStageFn = unsafe extern "C" fn(handle: c_int, stage: c_int, sensitivity: c_int) -> c_int;
type MovejPFn =
    unsafe extern "C" fn(handle: c_int, pose: Pose, v: u8, r: c_float, block: bool) -> c_int;
type SocketCloseFn = unsafe extern "C" fn(handle: c_int) -> c_int;

static LIBRARY: OnceLock<NativeArmApi> = OnceLock::new();
static LOADING: Mutex<()> = Mutex::new(());

/// Function table bound to a loaded control library.
pub struct NativeArmApi {
    path: PathBuf,
    api_init: ApiInitFn,
    socket_start: SocketStartFn,
    tip_init: TipInitFn,
    collision_stage: CollisionStageFn,
    movej_p: MovejPFn,
    socket_close: SocketCloseFn,
    // Keeps the function pointers above valid.
    _library: Library,
}

impl NativeArmApi {
    /// Load the library at `path` and resolve every entry point.
    fn load(path: &Path) -> Result<Self> {
        let load_err = |source| RunnerError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        };

        // SAFETY: loading runs the library's initialisers; the vendor library
        // is trusted, and each symbol type matches its C prototype.
        unsafe {
            let library = Library::new(path).map_err(load_err)?;
            let api_init = *library.get::<ApiInitFn>(b"RM_API_Init\0").map_err(load_err)?;
            let socket_start = *library
                .get::<SocketStartFn>(b"Arm_Socket_Start\0")
                .map_err(load_err)?;
            let tip_init = *library
                .get::<TipInitFn>(b"Set_Arm_Tip_Init\0")
                .map_err(load_err)?;
            let collision_stage = *library
                .get::<CollisionStageFn>(b"Set_Collision_Stage\0")
                .map_err(load_err)?;
            let movej_p = *library.get::<MovejPFn>(b"Movej_P_Cmd\0").map_err(load_err)?;
            let socket_close = *library
                .get::<SocketCloseFn>(b"Arm_Socket_Close\0")
                .map_err(load_err)?;

            Ok(Self {
                path: path.to_path_buf(),
                api_init,
                socket_start,
                tip_init,
                collision_stage,
                movej_p,
                socket_close,
                _library: library,
            })
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn init(&self, mode: i32) -> i32 {
        unsafe { (self.api_init)(mode) }
    }
}

/// Load and initialise the control library, once per process.
///
/// The first successful call loads `path` and runs the library's init call
/// with `init_mode`; later calls return the same table. A failed load leaves
/// nothing behind, so a later call may try again with another path.
pub fn acquire(path: &Path, init_mode: i32) -> Result<&'static NativeArmApi> {
    if let Some(api) = LIBRARY.get() {
        return Ok(already_loaded(api, path));
    }

    let _guard = LOADING.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(api) = LIBRARY.get() {
        return Ok(already_loaded(api, path));
    }

    let api = NativeArmApi::load(path)?;
    info!("Loaded arm library {}", path.display());
    let code = api.init(init_mode);
    debug!("RM_API_Init({}) returned {}", init_mode, code);

    Ok(LIBRARY.get_or_init(|| api))
}

fn already_loaded<'a>(api: &'a NativeArmApi, requested: &Path) -> &'a NativeArmApi {
    if api.path() != requested {
        warn!(
            "Arm library already loaded from {}; ignoring {}",
            api.path().display(),
            requested.display()
        );
    }
    api
}

impl ArmApi for NativeArmApi {
    fn socket_start(&self, host: &CStr, port: i32, arm_type: i32, recv_timeout_ms: i32) -> i32 {
        unsafe { (self.socket_start)(host.as_ptr(), port, arm_type, recv_timeout_ms) }
    }

    fn set_tip_init(&self, handle: i32, flag: i32) -> i32 {
        unsafe { (self.tip_init)(handle, flag) }
    }

    fn set_collision_stage(&self, handle: i32, stage: i32, sensitivity: i32) -> i32 {
        unsafe { (self.collision_stage)(handle, stage, sensitivity) }
    }

    fn movej_p(&self, handle: i32, pose: Pose, velocity: u8, radius: f32, block: bool) -> i32 {
        unsafe { (self.movej_p)(handle, pose, velocity, radius, block) }
    }

    fn socket_close(&self, handle: i32) -> i32 {
        unsafe { (self.socket_close)(handle) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_library_is_load_error() {
        let path = Path::new("/nonexistent/lib/libRM_Base.so");
        match acquire(path, 0) {
            Err(RunnerError::LibraryLoad { path: p, .. }) => assert_eq!(p, path),
            Err(other) => panic!("expected LibraryLoad, got {:?}", other),
            Ok(_) => panic!("nonexistent library loaded"),
        }
        assert!(LIBRARY.get().is_none());
    }

    #[test]
    fn test_non_library_file_is_load_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = acquire(file.path(), 0).err().expect("plain file loaded as library");
        assert_eq!(err.exit_code(), 2);
    }
}
