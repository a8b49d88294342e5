// Domain models - Core types and data structures

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::RangeError;
use crate::utils::time::format_clock;

/// A forward span of media time, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct TimeRange {
    start: f64,
    end: f64,
}

/// Unchecked wire form of [`TimeRange`]
#[derive(Deserialize)]
struct RawRange {
    start: f64,
    end: f64,
}

impl TryFrom<RawRange> for TimeRange {
    type Error = RangeError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        TimeRange::new(raw.start, raw.end, None)
    }
}

impl TimeRange {
    /// Create a validated range; `duration` is checked only when known
    pub fn new(start: f64, end: f64, duration: Option<f64>) -> Result<Self, RangeError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(RangeError::NotFinite { start, end });
        }
        if start < 0.0 {
            return Err(RangeError::NegativeStart { start });
        }
        if end <= start {
            return Err(RangeError::EndNotAfterStart { start, end });
        }
        if let Some(duration) = duration.filter(|d| d.is_finite()) {
            if end > duration {
                return Err(RangeError::PastDuration { end, duration });
            }
        }

        Ok(Self { start, end })
    }

    /// Range covering a whole source of the given duration
    pub fn whole(duration: f64) -> Result<Self, RangeError> {
        Self::new(0.0, duration, Some(duration))
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length in seconds
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// True when `t` lies within `[start, end]`
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", format_clock(self.start), format_clock(self.end))
    }
}

/// Opaque identifier of a committed cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CutId(Uuid);

impl CutId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough for display; equality uses the full value.
        let simple = self.0.simple().to_string();
        write!(f, "{}", &simple[..9])
    }
}

/// A committed range owned by the cut list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cut {
    pub id: CutId,
    pub range: TimeRange,
}

impl Cut {
    /// Length of the cut in seconds
    pub fn length(&self) -> f64 {
        self.range.length()
    }

    /// Human-readable `m:ss - m:ss` label
    pub fn label(&self) -> String {
        self.range.to_string()
    }
}

/// Mirror of the media element's playback position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PlaybackState {
    pub current_time: f64,
    /// Unknown until metadata has loaded
    pub duration: Option<f64>,
    pub is_playing: bool,
}

/// Encoded still frame
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailResult {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// `data:` URL for previews
    pub encoded_preview_url: String,
    pub width: u32,
    pub height: u32,
    /// Playback position the frame was read at
    pub captured_at: f64,
}

/// Read-only source video shared by playback, capture and transcoding
#[derive(Debug, Clone)]
pub struct SourceMedia {
    bytes: Arc<[u8]>,
    mime_type: String,
    file_name: String,
}

impl SourceMedia {
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Load a source from disk, guessing the MIME type from its extension
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input.mp4".to_string());
        let mime_type = Self::guess_mime_type(&file_name);
        Ok(Self::new(bytes, mime_type, file_name))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Container extension, defaulting to mp4
    pub fn extension(&self) -> &str {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("mp4")
    }

    fn guess_mime_type(file_name: &str) -> &'static str {
        let ext = std::path::Path::new(file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "mov" => "video/quicktime",
            "webm" => "video/webm",
            "mkv" => "video/x-matroska",
            "avi" => "video/x-msvideo",
            _ => "video/mp4",
        }
    }
}

/// Encoder choices for trim jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeSettings {
    pub video_codec: String,
    /// Speed preset (ultrafast, fast, medium, slow, veryslow)
    pub preset: String,
    pub audio_codec: String,
    /// Constant rate factor (0-51); encoder default when unset
    pub crf: Option<u8>,
    /// Encoder threads; derived from CPU count when unset
    pub threads: Option<usize>,
    pub container: String,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "ultrafast".to_string(),
            audio_codec: "aac".to_string(),
            crf: None,
            threads: None,
            container: "mp4".to_string(),
        }
    }
}

impl EncodeSettings {
    /// Thread count to hand the encoder
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            // Leave headroom for playback and the UI.
            let optimal = (num_cpus::get() as f64 * 0.75).ceil() as usize;
            optimal.clamp(1, 16)
        })
    }

    /// MIME type of the produced container
    pub fn output_mime_type(&self) -> String {
        format!("video/{}", self.container)
    }
}
