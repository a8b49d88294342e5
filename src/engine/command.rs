//! Trim command construction for the codec runtime

use crate::domain::model::EncodeSettings;

/// Arguments for a frame-accurate cut of `[start, end)`.
///
/// The video stream is always re-encoded: stream copy can only cut on
/// keyframes and leaves arbitrary offsets broken or shifted.
pub fn trim_arguments(
    settings: &EncodeSettings,
    input_name: &str,
    output_name: &str,
    start: f64,
    end: f64,
) -> Vec<String> {
    let duration = end - start;

    let mut args = vec![
        "-i".to_string(),
        input_name.to_string(),
        "-ss".to_string(),
        format_seconds(start),
        "-t".to_string(),
        format_seconds(duration),
        "-c:v".to_string(),
        settings.video_codec.clone(),
        "-preset".to_string(),
        settings.preset.clone(),
    ];

    if let Some(crf) = settings.crf {
        args.push("-crf".to_string());
        args.push(crf.min(51).to_string());
    }

    args.push("-threads".to_string());
    args.push(settings.effective_threads().to_string());

    args.push("-c:a".to_string());
    args.push(settings.audio_codec.clone());

    if settings.container == "mp4" || settings.container == "mov" {
        args.push("-movflags".to_string());
        args.push("+faststart".to_string());
    }

    args.push(output_name.to_string());
    args
}

/// Millisecond precision without trailing noise
fn format_seconds(seconds: f64) -> String {
    let formatted = format!("{:.3}", seconds);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
