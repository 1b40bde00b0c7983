//! Error types for waypoint runs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RunnerError>;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to load arm library {path}: {source}")]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("Connection to {host}:{port} failed (handle {code})")]
    Connection { host: String, port: u16, code: i32 },

    #[error("Device setup call {call} failed with status {code}")]
    Configuration { call: &'static str, code: i32 },

    #[error("Waypoint data error: {0}")]
    DataFormat(String),

    #[error("Waypoint validation error: {0}")]
    Validation(String),

    #[error("Move to waypoint '{label}' failed with status {code}")]
    MotionCommand { label: String, code: i32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RunnerError {
    /// Process exit status reported by the binary for this failure class.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunnerError::LibraryLoad { .. } => 2,
            RunnerError::Connection { .. } => 3,
            RunnerError::Config(_) | RunnerError::Yaml(_) => 4,
            RunnerError::DataFormat(_) | RunnerError::Validation(_) => 5,
            RunnerError::MotionCommand { .. } => 6,
            RunnerError::Configuration { .. } => 7,
        }
    }
}
