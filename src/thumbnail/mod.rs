//! Still-frame capture for thumbnails

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::{debug, warn};

use crate::config::ThumbnailConfig;
use crate::domain::errors::CaptureError;
use crate::domain::model::ThumbnailResult;
use crate::ports::FrameSource;

/// Default lossy quality factor (0, 1]
pub const DEFAULT_QUALITY: f32 = 0.8;

const JPEG_MIME: &str = "image/jpeg";

/// Rasterizes the current frame of a [`FrameSource`] to JPEG
#[derive(Debug, Clone)]
pub struct ThumbnailCapturer {
    quality: f32,
}

impl Default for ThumbnailCapturer {
    fn default() -> Self {
        Self::new(DEFAULT_QUALITY)
    }
}

impl ThumbnailCapturer {
    /// Quality is clamped into `(0, 1]`; non-finite values fall back to the default
    pub fn new(quality: f32) -> Self {
        let quality = if quality.is_finite() {
            quality.clamp(0.01, 1.0)
        } else {
            DEFAULT_QUALITY
        };
        Self { quality }
    }

    pub fn from_config(config: &ThumbnailConfig) -> Self {
        Self::new(config.quality)
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Encoder quality on the 1-100 scale
    fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Capture the frame visible now.
    ///
    /// Playback position is not touched; seek first if a specific frame is
    /// wanted. `at_time` is recorded on the result.
    pub fn capture(&self, source: &dyn FrameSource, at_time: f64) -> Result<ThumbnailResult, CaptureError> {
        let (width, height) = source.intrinsic_size();
        if width == 0 || height == 0 {
            debug!(at_time, "capture requested before a frame was decoded");
            return Err(CaptureError::NoFrameAvailable);
        }

        let mut canvas = RgbImage::new(width, height);
        if !source.draw_frame(&mut canvas) {
            return Err(CaptureError::NoFrameAvailable);
        }

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality())
            .encode_image(&canvas)
            .map_err(|e| {
                warn!(error = %e, "thumbnail encoding failed");
                CaptureError::Encode(e.to_string())
            })?;

        let encoded_preview_url = format!("data:{};base64,{}", JPEG_MIME, BASE64.encode(&bytes));
        debug!(width, height, bytes = bytes.len(), at_time, "thumbnail captured");

        Ok(ThumbnailResult {
            bytes,
            mime_type: JPEG_MIME.to_string(),
            encoded_preview_url,
            width,
            height,
            captured_at: at_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    struct Gradient {
        width: u32,
        height: u32,
    }

    impl FrameSource for Gradient {
        fn intrinsic_size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn draw_frame(&self, canvas: &mut RgbImage) -> bool {
            for (x, y, pixel) in canvas.enumerate_pixels_mut() {
                *pixel = Rgb([(x % 256) as u8, (y % 256) as u8, 128]);
            }
            true
        }
    }

    struct Undecoded;

    impl FrameSource for Undecoded {
        fn intrinsic_size(&self) -> (u32, u32) {
            (0, 0)
        }

        fn draw_frame(&self, _canvas: &mut RgbImage) -> bool {
            false
        }
    }

    #[test]
    fn test_capture_matches_intrinsic_dimensions() {
        let source = Gradient { width: 320, height: 180 };
        let thumb = ThumbnailCapturer::default().capture(&source, 12.5).unwrap();

        assert_eq!(thumb.mime_type, "image/jpeg");
        assert_eq!((thumb.width, thumb.height), (320, 180));
        assert_eq!(thumb.captured_at, 12.5);

        let decoded = image::load_from_memory(&thumb.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 180));
    }

    #[test]
    fn test_capture_preview_url_is_data_url() {
        let source = Gradient { width: 16, height: 16 };
        let thumb = ThumbnailCapturer::default().capture(&source, 0.0).unwrap();

        let payload = thumb
            .encoded_preview_url
            .strip_prefix("data:image/jpeg;base64,")
            .unwrap();
        assert_eq!(BASE64.decode(payload).unwrap(), thumb.bytes);
    }

    #[test]
    fn test_capture_without_frame_fails() {
        let result = ThumbnailCapturer::default().capture(&Undecoded, 3.0);
        assert_eq!(result, Err(CaptureError::NoFrameAvailable));
    }

    #[test]
    fn test_quality_is_clamped_and_mapped() {
        assert_eq!(ThumbnailCapturer::default().jpeg_quality(), 80);
        assert_eq!(ThumbnailCapturer::new(5.0).jpeg_quality(), 100);
        assert_eq!(ThumbnailCapturer::new(-1.0).jpeg_quality(), 1);
        assert_eq!(ThumbnailCapturer::new(f32::NAN).quality(), DEFAULT_QUALITY);
    }

    #[test]
    fn test_lower_quality_produces_smaller_output() {
        let source = Gradient { width: 256, height: 256 };
        let high = ThumbnailCapturer::new(1.0).capture(&source, 0.0).unwrap();
        let low = ThumbnailCapturer::new(0.1).capture(&source, 0.0).unwrap();
        assert!(low.bytes.len() < high.bytes.len());
    }
}
