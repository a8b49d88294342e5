//! Libav-backed media access: scoped staging of the source buffer, duration
//! probing, and a decoded-frame source for thumbnails.

use std::io::Write;
use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::media::Type;
use ffmpeg_next::software::scaling::{context::Context as Scaler, flag::Flags};
use ffmpeg_next::util::frame::video::Video;
use image::RgbImage;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::model::SourceMedia;
use crate::ports::FrameSource;

/// Media access failures
#[derive(Error, Debug)]
pub enum MediaError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// FFmpeg error
    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("no video stream in source")]
    NoVideoStream,

    #[error("no frame could be decoded at {time:.3}s")]
    NoFrame { time: f64 },

    #[error("source duration is unknown")]
    UnknownDuration,

    /// The staged copy was already revoked
    #[error("staged media has been revoked")]
    Revoked,
}

/// Private on-disk copy of a source buffer for decoders.
///
/// The copy lives until [`StagedMedia::revoke`] or drop, whichever comes first.
#[derive(Debug)]
pub struct StagedMedia {
    file: Option<NamedTempFile>,
}

impl StagedMedia {
    pub fn stage(source: &SourceMedia) -> Result<Self, MediaError> {
        let mut file = tempfile::Builder::new()
            .prefix("segedit-source-")
            .suffix(&format!(".{}", source.extension()))
            .tempfile()?;
        file.write_all(source.bytes())?;
        file.flush()?;
        debug!(path = %file.path().display(), bytes = source.len(), "source staged");
        Ok(Self { file: Some(file) })
    }

    pub fn path(&self) -> Result<&Path, MediaError> {
        self.file.as_ref().map(|f| f.path()).ok_or(MediaError::Revoked)
    }

    pub fn is_revoked(&self) -> bool {
        self.file.is_none()
    }

    /// Delete the staged copy now
    pub fn revoke(&mut self) {
        if let Some(file) = self.file.take() {
            let path = file.path().to_path_buf();
            match file.close() {
                Ok(()) => debug!(path = %path.display(), "staged source revoked"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove staged source"),
            }
        }
    }
}

impl Drop for StagedMedia {
    fn drop(&mut self) {
        self.revoke();
    }
}

/// Read the container duration in seconds
pub fn probe_duration(path: &Path) -> Result<f64, MediaError> {
    ffmpeg_next::init()?;
    let ictx = ffmpeg_next::format::input(&path)?;
    let duration = ictx.duration();
    if duration <= 0 {
        return Err(MediaError::UnknownDuration);
    }
    Ok(duration as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64)
}

/// Frame source that decodes the frame visible at a requested position
pub struct LibavFrameSource {
    media: StagedMedia,
    frame: Option<RgbImage>,
    frame_time: Option<f64>,
}

impl LibavFrameSource {
    pub fn open(source: &SourceMedia) -> Result<Self, MediaError> {
        ffmpeg_next::init()?;
        Ok(Self {
            media: StagedMedia::stage(source)?,
            frame: None,
            frame_time: None,
        })
    }

    /// Swap in a new source, revoking the previous staged copy
    pub fn replace_source(&mut self, source: &SourceMedia) -> Result<(), MediaError> {
        let staged = StagedMedia::stage(source)?;
        self.media.revoke();
        self.media = staged;
        self.frame = None;
        self.frame_time = None;
        Ok(())
    }

    /// Duration of the staged source
    pub fn duration(&self) -> Result<f64, MediaError> {
        probe_duration(self.media.path()?)
    }

    /// Position of the currently held frame
    pub fn frame_time(&self) -> Option<f64> {
        self.frame_time
    }

    /// Decode the frame visible at `time` and hold it as the current frame
    pub fn seek_frame(&mut self, time: f64) -> Result<(), MediaError> {
        let frame = decode_frame_at(self.media.path()?, time)?;
        info!(time, width = frame.width(), height = frame.height(), "frame decoded");
        self.frame = Some(frame);
        self.frame_time = Some(time);
        Ok(())
    }

    /// Release the staged source and any held frame
    pub fn close(&mut self) {
        self.frame = None;
        self.frame_time = None;
        self.media.revoke();
    }
}

impl FrameSource for LibavFrameSource {
    fn intrinsic_size(&self) -> (u32, u32) {
        self.frame.as_ref().map(|f| f.dimensions()).unwrap_or((0, 0))
    }

    fn draw_frame(&self, canvas: &mut RgbImage) -> bool {
        match &self.frame {
            Some(frame) if frame.dimensions() == canvas.dimensions() => {
                canvas.copy_from_slice(frame.as_raw());
                true
            }
            _ => false,
        }
    }
}

/// Last frame whose timestamp is at or before `time`
fn decode_frame_at(path: &Path, time: f64) -> Result<RgbImage, MediaError> {
    let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
    let mut ictx = ffmpeg_next::format::input(&path)?;

    let (stream_index, seconds_per_tick, mut decoder) = {
        let stream = ictx.streams().best(Type::Video).ok_or(MediaError::NoVideoStream)?;
        let time_base = stream.time_base();
        let seconds_per_tick = time_base.numerator() as f64 / time_base.denominator().max(1) as f64;
        let context = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        (stream.index(), seconds_per_tick, context.decoder().video()?)
    };

    let target = (time * ffmpeg_next::ffi::AV_TIME_BASE as f64) as i64;
    if target > 0 {
        // Lands on the keyframe before the target; decoding walks forward.
        ictx.seek(target, ..target)?;
    }

    let mut scaler = Scaler::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        Pixel::RGB24,
        decoder.width(),
        decoder.height(),
        Flags::BILINEAR,
    )?;

    let mut walker = FrameWalker {
        target: time,
        seconds_per_tick,
        previous: None,
    };

    for (stream, packet) in ictx.packets() {
        if stream.index() != stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        if let Some(frame) = walker.drain(&mut decoder, &mut scaler)? {
            return Ok(frame);
        }
    }

    decoder.send_eof()?;
    if let Some(frame) = walker.drain(&mut decoder, &mut scaler)? {
        return Ok(frame);
    }

    // Target at or past the last frame: the last frame stays visible.
    walker.previous.ok_or(MediaError::NoFrame { time })
}

struct FrameWalker {
    target: f64,
    seconds_per_tick: f64,
    previous: Option<RgbImage>,
}

impl FrameWalker {
    /// Pull decoded frames until one starts after the target
    fn drain(
        &mut self,
        decoder: &mut ffmpeg_next::decoder::Video,
        scaler: &mut Scaler,
    ) -> Result<Option<RgbImage>, MediaError> {
        let mut decoded = Video::empty();
        while decoder.receive_frame(&mut decoded).is_ok() {
            let mut rgb = Video::empty();
            scaler.run(&decoded, &mut rgb)?;
            let image = to_rgb_image(&rgb).ok_or(MediaError::NoFrame { time: self.target })?;

            let shown_at = decoded.timestamp().map(|ts| ts as f64 * self.seconds_per_tick);
            match shown_at {
                Some(at) if at > self.target + 1e-6 => {
                    return Ok(Some(self.previous.take().unwrap_or(image)));
                }
                _ => self.previous = Some(image),
            }
        }
        Ok(None)
    }
}

fn to_rgb_image(frame: &Video) -> Option<RgbImage> {
    let (width, height) = (frame.width(), frame.height());
    let stride = frame.stride(0);
    let row_bytes = width as usize * 3;
    let data = frame.data(0);

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(data.get(start..start + row_bytes)?);
    }
    RgbImage::from_raw(width, height, pixels)
}
