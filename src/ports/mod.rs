// Ports - Interface definitions (contracts)

use async_trait::async_trait;
use image::RgbImage;
use tokio::sync::broadcast;

use crate::domain::errors::{EngineLoadError, RuntimeError};
use crate::domain::model::PlaybackState;

/// Notifications raised by a media element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    /// Playhead moved
    TimeUpdate(f64),
    /// Duration became known
    LoadedMetadata { duration: f64 },
    Played,
    Paused,
    /// Playback reached the end of the media
    Ended,
}

/// Port over an externally owned media element.
///
/// The element is the single source of truth for position and play/pause;
/// callers read state back instead of tracking it themselves.
pub trait PlaybackPort: Send {
    fn play(&mut self);

    fn pause(&mut self);

    /// Move the playhead; implementations clamp to the known duration
    fn seek(&mut self, time: f64);

    fn current_time(&self) -> f64;

    /// `None` until metadata has loaded
    fn duration(&self) -> Option<f64>;

    fn is_playing(&self) -> bool;

    /// Subscribe to element events
    fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent>;

    /// Snapshot of the element's state
    fn state(&self) -> PlaybackState {
        PlaybackState {
            current_time: self.current_time(),
            duration: self.duration(),
            is_playing: self.is_playing(),
        }
    }
}

/// Port over a live decoding surface
pub trait FrameSource {
    /// Native pixel size of the current frame; `(0, 0)` before the first decode
    fn intrinsic_size(&self) -> (u32, u32);

    /// Draw the frame visible now into `canvas`, which has the intrinsic size.
    /// Returns `false` when no frame could be drawn.
    fn draw_frame(&self, canvas: &mut RgbImage) -> bool;
}

/// Result of one runtime command
#[derive(Debug, Clone, Default)]
pub struct ExecOutcome {
    pub exit_code: i32,
    /// Raw diagnostic lines emitted by the runtime
    pub log: Vec<String>,
}

impl ExecOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Port for an embedded codec runtime with its own sandboxed filesystem
#[async_trait]
pub trait TranscodeRuntime: Send + Sync {
    /// Fetch and initialize the runtime
    async fn load(&self) -> Result<(), EngineLoadError>;

    /// Place a file in the runtime sandbox
    async fn write_file(&self, name: &str, data: &[u8]) -> Result<(), RuntimeError>;

    /// Run a codec command with the given arguments
    async fn exec(&self, args: &[String]) -> Result<ExecOutcome, RuntimeError>;

    /// Read a file back out of the sandbox
    async fn read_file(&self, name: &str) -> Result<Vec<u8>, RuntimeError>;

    /// Remove a sandbox file; missing files are not an error
    async fn delete_file(&self, name: &str) -> Result<(), RuntimeError>;

    /// Drop the loaded runtime and its sandbox
    async fn release(&self);
}
