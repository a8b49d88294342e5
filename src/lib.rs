//! segedit video segment editor library
//!
//! Marks start/end points against a playing video, accumulates a list of cuts,
//! captures still-frame thumbnails, and trims single ranges through a
//! re-encoding codec runtime.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ports;
pub mod thumbnail;
pub mod utils;

// Re-export commonly used types
pub use app::{CutListExport, EditorSession, SessionError, TrimExport, TrimTask};
pub use config::EditorConfig;
pub use domain::errors::{CaptureError, EngineLoadError, RangeError, TranscodeError};
pub use domain::model::{Cut, CutId, PlaybackState, SourceMedia, ThumbnailResult, TimeRange};
pub use engine::{EngineState, TranscodeEngine};
pub use error::{SegEditError, SegEditResult};

/// Initialize the segedit library
pub fn init() -> SegEditResult<()> {
    ffmpeg_next::init().map_err(adapters::MediaError::from)?;
    Ok(())
}
