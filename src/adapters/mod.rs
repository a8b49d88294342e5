// Adapters - External system implementations

pub mod ffmpeg_process;
pub mod headless_playback;
pub mod libav_media;

// Re-export adapters
pub use ffmpeg_process::FfmpegProcessRuntime;
pub use headless_playback::HeadlessPlayback;
pub use libav_media::{probe_duration, LibavFrameSource, MediaError, StagedMedia};
