//! Error handling module for segedit

use thiserror::Error;

use crate::adapters::MediaError;
use crate::app::SessionError;
use crate::config::ConfigError;
use crate::domain::errors::{CaptureError, EngineLoadError, RangeError, TranscodeError};
use crate::utils::time::TimeParseError;

/// Main error type for segedit operations
#[derive(Error, Debug)]
pub enum SegEditError {
    /// Rejected time range
    #[error("Invalid range: {0}")]
    Range(#[from] RangeError),

    /// Unparseable clock time
    #[error("Invalid time: {0}")]
    Time(#[from] TimeParseError),

    /// Thumbnail capture error
    #[error("Thumbnail capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// Codec runtime load error
    #[error("Trimming unavailable: {0}")]
    EngineLoad(#[from] EngineLoadError),

    /// Trim job error
    #[error("Trim failed: {0}")]
    Transcode(#[from] TranscodeError),

    /// Editor workflow error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Media decode or probe error
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for segedit operations
pub type SegEditResult<T> = std::result::Result<T, SegEditError>;
