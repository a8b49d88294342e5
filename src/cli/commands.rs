//! Command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adapters::{probe_duration, FfmpegProcessRuntime, HeadlessPlayback, LibavFrameSource};
use crate::app::EditorSession;
use crate::cli::args::{CutsArgs, TrimArgs};
use crate::config::EditorConfig;
use crate::domain::model::{SourceMedia, ThumbnailResult, TimeRange};
use crate::engine::TranscodeEngine;
use crate::utils::format_file_size;
use crate::utils::time::format_clock;

/// JSON document printed by the cuts command
#[derive(Debug, Serialize)]
struct CutsReport {
    ranges: Vec<TimeRange>,
    thumbnail: Option<ThumbnailReport>,
}

#[derive(Debug, Serialize)]
struct ThumbnailReport {
    mime_type: String,
    width: u32,
    height: u32,
    captured_at: f64,
    data_url: String,
}

impl From<&ThumbnailResult> for ThumbnailReport {
    fn from(thumbnail: &ThumbnailResult) -> Self {
        Self {
            mime_type: thumbnail.mime_type.clone(),
            width: thumbnail.width,
            height: thumbnail.height,
            captured_at: thumbnail.captured_at,
            data_url: thumbnail.encoded_preview_url.clone(),
        }
    }
}

fn build_engine(config: &EditorConfig) -> TranscodeEngine {
    let runtime = FfmpegProcessRuntime::from_config(&config.engine);
    TranscodeEngine::new(Arc::new(runtime), config.encode.clone(), config.engine.log_capacity)
}

fn read_source(path: &Path) -> Result<SourceMedia> {
    if !path.exists() {
        return Err(anyhow!("Input file does not exist: {}", path.display()));
    }
    let source = SourceMedia::from_path(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    info!(file = source.file_name(), size = %format_file_size(source.len() as u64), "source loaded");
    Ok(source)
}

/// Mark one range against the playhead and commit it
fn mark_range(session: &mut EditorSession, start: f64, end: f64) -> Result<()> {
    let range = TimeRange::new(start, end, session.duration())
        .with_context(|| format!("Invalid cut {}-{}", start, end))?;
    session.clear_selection();
    session.seek(range.start());
    session.mark_start();
    session.seek(range.end());
    session.mark_end();
    Ok(())
}

fn capture_at(session: &mut EditorSession, source: &SourceMedia, at: f64) -> Result<()> {
    let mut frames = LibavFrameSource::open(source).context("Failed to stage source for decoding")?;
    session.seek(at);
    frames
        .seek_frame(at)
        .with_context(|| format!("Failed to decode a frame at {}", format_clock(at)))?;
    let thumbnail = session.capture_thumbnail(&frames).context("Failed to capture thumbnail")?;
    info!(width = thumbnail.width, height = thumbnail.height, at, "thumbnail captured");
    frames.close();
    Ok(())
}

fn write_thumbnail(session: &EditorSession, path: &Path) -> Result<()> {
    let thumbnail = session
        .thumbnail()
        .ok_or_else(|| anyhow!("No thumbnail was captured"))?;
    std::fs::write(path, &thumbnail.bytes)
        .with_context(|| format!("Failed to write thumbnail to {}", path.display()))?;
    info!(path = %path.display(), bytes = thumbnail.bytes.len(), "thumbnail written");
    Ok(())
}

/// Execute the cuts command
pub async fn cuts(args: CutsArgs, config: &EditorConfig) -> Result<()> {
    info!(cuts = args.cuts.len(), "starting cut list export");

    let source = match &args.input {
        Some(path) => read_source(path)?,
        None => SourceMedia::new(Vec::new(), "video/mp4", "untitled.mp4"),
    };

    let duration = match (args.duration, &args.input) {
        (Some(duration), _) => duration,
        (None, Some(path)) => probe_duration(path).context("Failed to probe media duration")?,
        (None, None) => return Err(anyhow!("Either --duration or --input is required")),
    };

    let playback = HeadlessPlayback::with_duration(duration);
    let mut session = EditorSession::open(source.clone(), Box::new(playback), build_engine(config), config);

    for &(start, end) in &args.cuts {
        mark_range(&mut session, start, end)?;
        let cut = session.commit_selection().context("Failed to commit cut")?;
        debug!(cut_id = %cut.id, label = %cut.label(), "cut committed");
    }

    if let Some(at) = args.thumbnail_at {
        capture_at(&mut session, &source, at)?;
        if let Some(path) = &args.thumbnail_out {
            write_thumbnail(&session, path)?;
        }
    }

    let export = session.export_cut_list()?;
    let report = CutsReport {
        ranges: export.ranges,
        thumbnail: export.thumbnail.as_ref().map(ThumbnailReport::from),
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("Failed to serialize cut list to JSON")?;
    println!("{}", json);

    session.close().await;
    info!("cut list export completed");
    Ok(())
}

/// Execute the trim command
pub async fn trim(args: TrimArgs, config: &EditorConfig) -> Result<()> {
    info!(input = %args.input.display(), start = args.start, end = args.end, "starting trim");

    let source = read_source(&args.input)?;
    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&args.input, &config.encode.container),
    };

    let playback = match probe_duration(&args.input) {
        Ok(duration) => HeadlessPlayback::with_duration(duration),
        Err(e) => {
            warn!(error = %e, "could not probe duration; range is checked by the encoder only");
            HeadlessPlayback::new()
        }
    };
    let mut session = EditorSession::open(source.clone(), Box::new(playback), build_engine(config), config);

    if let Err(e) = session.load_engine().wait().await {
        debug!(error = %e, "engine load failed");
        return Err(anyhow!("{} ({})", e.user_message(), e));
    }

    if args.thumbnail_out.is_some() {
        capture_at(&mut session, &source, args.start)?;
    }

    mark_range(&mut session, args.start, args.end)?;
    let export = match session.export_trim().await {
        Ok(export) => export,
        Err(e) => {
            for line in session.engine().diagnostics() {
                debug!(target: "segedit::engine::runtime", "{}", line);
            }
            session.close().await;
            return Err(e).context("Trim failed");
        }
    };

    std::fs::write(&output_path, &export.video)
        .with_context(|| format!("Failed to write output file {}", output_path.display()))?;
    if let Some(path) = &args.thumbnail_out {
        write_thumbnail(&session, path)?;
    }
    session.close().await;

    info!(
        output = %output_path.display(),
        size = %format_file_size(export.video.len() as u64),
        range = %export.range,
        "trim completed"
    );
    println!("{}", output_path.display());
    Ok(())
}

/// `<dir>/<stem>_trimmed.<container>` next to the input
fn default_output_path(input: &Path, container: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_trimmed.{}", stem, container))
}
