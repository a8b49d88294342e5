//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

use crate::config::EditorConfig;
use crate::utils::time::parse_clock;

/// Arguments for the cuts command
#[derive(Args, Debug)]
pub struct CutsArgs {
    /// Source video; its duration is probed when --duration is absent
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Media duration (seconds, M:SS or H:MM:SS)
    #[arg(short, long, value_parser = parse_seconds)]
    pub duration: Option<f64>,

    /// Cut range START-END; repeat for several cuts, in export order
    #[arg(short, long = "cut", value_name = "START-END", value_parser = parse_cut)]
    pub cuts: Vec<(f64, f64)>,

    /// Capture a thumbnail at this position (requires --input)
    #[arg(long, value_parser = parse_seconds, requires = "input")]
    pub thumbnail_at: Option<f64>,

    /// Write the captured thumbnail to this file
    #[arg(long, requires = "thumbnail_at")]
    pub thumbnail_out: Option<PathBuf>,

    /// Thumbnail JPEG quality (1-100)
    #[arg(long, value_parser = parse_quality)]
    pub thumbnail_quality: Option<u8>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl CutsArgs {
    pub fn apply_overrides(&self, config: &mut EditorConfig) {
        if let Some(quality) = self.thumbnail_quality {
            config.thumbnail.quality = f32::from(quality) / 100.0;
        }
    }
}

/// Arguments for the trim command
#[derive(Args, Debug)]
pub struct TrimArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Start time (seconds, M:SS or H:MM:SS)
    #[arg(short, long, value_parser = parse_seconds)]
    pub start: f64,

    /// End time (seconds, M:SS or H:MM:SS)
    #[arg(short, long, value_parser = parse_seconds)]
    pub end: f64,

    /// Output file path (default: <input>_trimmed.<container>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write a JPEG thumbnail taken at the start of the range
    #[arg(long)]
    pub thumbnail_out: Option<PathBuf>,

    /// Thumbnail JPEG quality (1-100)
    #[arg(long, value_parser = parse_quality)]
    pub thumbnail_quality: Option<u8>,

    /// Encoding preset
    #[arg(long)]
    pub preset: Option<String>,

    /// Constant Rate Factor (0-51)
    #[arg(long, value_parser = parse_crf)]
    pub crf: Option<u8>,

    /// Encoder threads (default: derived from CPU count)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Codec runtime executable
    #[arg(long)]
    pub ffmpeg: Option<String>,
}

impl TrimArgs {
    pub fn apply_overrides(&self, config: &mut EditorConfig) {
        if let Some(quality) = self.thumbnail_quality {
            config.thumbnail.quality = f32::from(quality) / 100.0;
        }
        if let Some(preset) = &self.preset {
            config.encode.preset = preset.clone();
        }
        if self.crf.is_some() {
            config.encode.crf = self.crf;
        }
        if self.threads.is_some() {
            config.encode.threads = self.threads;
        }
        if let Some(binary) = &self.ffmpeg {
            config.engine.binary = binary.clone();
        }
    }
}

fn parse_seconds(value: &str) -> Result<f64, String> {
    parse_clock(value).map_err(|e| e.to_string())
}

/// `START-END`, each side in any clock form
pub(crate) fn parse_cut(value: &str) -> Result<(f64, f64), String> {
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| format!("cut '{}' must look like START-END", value))?;
    Ok((parse_seconds(start)?, parse_seconds(end)?))
}

fn parse_quality(value: &str) -> Result<u8, String> {
    number_range(value, 1, 100)
}

fn parse_crf(value: &str) -> Result<u8, String> {
    number_range(value, 0, 51)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cut() {
        assert_eq!(parse_cut("10-25"), Ok((10.0, 25.0)));
        assert_eq!(parse_cut("1:30-2:05.5"), Ok((90.0, 125.5)));
        assert!(parse_cut("10").is_err());
        assert!(parse_cut("a-b").is_err());
    }

    #[test]
    fn test_quality_bounds() {
        assert_eq!(parse_quality("80"), Ok(80));
        assert!(parse_quality("0").is_err());
        assert!(parse_quality("101").is_err());
    }

    #[test]
    fn test_trim_overrides() {
        let args = TrimArgs {
            input: PathBuf::from("in.mp4"),
            start: 1.0,
            end: 2.0,
            output: None,
            thumbnail_out: None,
            thumbnail_quality: Some(50),
            preset: Some("veryfast".to_string()),
            crf: Some(28),
            threads: None,
            ffmpeg: Some("/usr/local/bin/ffmpeg".to_string()),
        };
        let mut config = EditorConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.thumbnail.quality, 0.5);
        assert_eq!(config.encode.preset, "veryfast");
        assert_eq!(config.encode.crf, Some(28));
        assert_eq!(config.encode.threads, None);
        assert_eq!(config.engine.binary, "/usr/local/bin/ffmpeg");
    }
}
