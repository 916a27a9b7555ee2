//! Host error types

use std::path::PathBuf;

use thiserror::Error;

use canicas_core::config::CalibrationError;
use canicas_core::motion::{MotionError, MoveError};
use canicas_core::safety::SafetyError;
use canicas_core::scheduler::{QueueError, RouteError, SequenceError};
use canicas_core::state::Screen;

/// Startup failures
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid calibration: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("invalid config: {0}")]
    Invalid(&'static str),

    #[error("serial port {port}: {source}")]
    Serial {
        port: String,
        source: serialport::Error,
    },

    #[error("failed to start {name} thread: {source}")]
    Thread {
        name: &'static str,
        source: std::io::Error,
    },
}

/// Refused operator requests
///
/// None of these change controller state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    #[error("not available on the {0} screen")]
    NotOnScreen(Screen),

    #[error("a job is still running")]
    JobRunning,

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error("invalid move: {0}")]
    Move(#[from] MoveError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Motion(#[from] MotionError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}
