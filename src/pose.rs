//! Tool pose passed by value to the arm library

use serde::Serialize;
use std::fmt;

use crate::{Result, RunnerError};

/// Number of values describing a pose: three position, three rotation.
pub const POSE_LEN: usize = 6;

/// Target pose of the tool center point.
///
/// Layout matches the vendor `Pose` struct so it can cross the FFI by value.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Pose {
    pub px: f32,
    pub py: f32,
    pub pz: f32,
    pub rx: f32,
    pub ry: f32,
    pub rz: f32,
}

impl Pose {
    pub const fn new(px: f32, py: f32, pz: f32, rx: f32, ry: f32, rz: f32) -> Self {
        Self { px, py, pz, rx, ry, rz }
    }

    /// Build a pose from exactly six values.
    ///
    /// Values are narrowed to `f32`; anything that does not survive the
    /// narrowing as a finite number is rejected.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        if values.len() != POSE_LEN {
            return Err(RunnerError::DataFormat(format!(
                "expected {} pose values, got {}",
                POSE_LEN,
                values.len()
            )));
        }

        let mut narrowed = [0.0f32; POSE_LEN];
        for (i, (slot, &value)) in narrowed.iter_mut().zip(values).enumerate() {
            let v = value as f32;
            if !v.is_finite() {
                return Err(RunnerError::DataFormat(format!(
                    "pose value {} ({}) is not representable as f32",
                    i, value
                )));
            }
            *slot = v;
        }

        Ok(Self::from(narrowed))
    }

    pub fn position(&self) -> [f32; 3] {
        [self.px, self.py, self.pz]
    }

    pub fn rotation(&self) -> [f32; 3] {
        [self.rx, self.ry, self.rz]
    }

    pub fn to_array(&self) -> [f32; POSE_LEN] {
        [self.px, self.py, self.pz, self.rx, self.ry, self.rz]
    }
}

impl From<[f32; POSE_LEN]> for Pose {
    fn from(v: [f32; POSE_LEN]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5])
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}, {}, {}]",
            self.px, self.py, self.pz, self.rx, self.ry, self.rz
        )
    }
}
