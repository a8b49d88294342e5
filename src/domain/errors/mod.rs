// Domain errors - Typed failures for the segment editor

use thiserror::Error;

use crate::engine::EngineState;

/// Time range construction failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    /// Start or end was NaN or infinite
    #[error("time values must be finite (start: {start}, end: {end})")]
    NotFinite { start: f64, end: f64 },

    /// Start was before zero
    #[error("start ({start:.3}s) cannot be negative")]
    NegativeStart { start: f64 },

    /// End did not come after start
    #[error("end ({end:.3}s) must be after start ({start:.3}s)")]
    EndNotAfterStart { start: f64, end: f64 },

    /// End ran past the known media duration
    #[error("end ({end:.3}s) exceeds media duration ({duration:.3}s)")]
    PastDuration { end: f64, duration: f64 },
}

/// Still-frame capture failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// The frame source has not decoded a frame yet
    #[error("no decoded frame is available yet")]
    NoFrameAvailable,

    /// Rasterized pixels could not be encoded
    #[error("failed to encode thumbnail: {0}")]
    Encode(String),
}

/// Codec runtime bootstrap failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineLoadError {
    /// The runtime could not be fetched or started
    #[error("failed to fetch or start the codec runtime: {0}")]
    NetworkFailure(String),

    /// The host lacks a capability the runtime needs
    #[error("this environment cannot host the codec runtime: {0}")]
    UnsupportedEnvironment(String),

    /// The load task was torn down before it reported back
    #[error("engine load was interrupted")]
    Interrupted,
}

impl EngineLoadError {
    /// Message suitable for end users; never includes runtime output
    pub fn user_message(&self) -> &'static str {
        match self {
            EngineLoadError::UnsupportedEnvironment(_) => {
                "Video processing is not supported in this environment."
            }
            EngineLoadError::NetworkFailure(_) | EngineLoadError::Interrupted => {
                "The video processing engine could not be loaded. Please try again later."
            }
        }
    }
}

/// Trim job failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranscodeError {
    /// Requested bounds do not form a forward range
    #[error("invalid trim range: {start:.3}s - {end:.3}s")]
    InvalidRange { start: f64, end: f64 },

    /// Another trim is still processing
    #[error("a trim job is already in progress")]
    Busy,

    /// Engine has not finished loading
    #[error("engine is not ready (state: {0})")]
    NotReady(EngineState),

    /// Engine failed to load for this session
    #[error("engine is unavailable: {0}")]
    Unavailable(EngineLoadError),

    /// The runtime ran but did not produce output
    #[error("encoding failed: {reason}")]
    EncodeFailure { reason: String },

    /// The job was dropped before it reported back
    #[error("trim job was abandoned")]
    Abandoned,
}

/// Failures inside a codec runtime's sandbox
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Runtime was used before load or after release
    #[error("runtime is not loaded")]
    NotLoaded,

    /// Sandbox file name was rejected
    #[error("invalid sandbox file name: {0}")]
    InvalidFileName(String),

    /// Sandbox file does not exist
    #[error("sandbox file not found: {0}")]
    FileNotFound(String),

    /// I/O error
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
}
