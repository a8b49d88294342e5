// Editor session - Orchestrates the cut-list and trim export workflows

use thiserror::Error;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::config::EditorConfig;
use crate::domain::cut_list::CutList;
use crate::domain::errors::{CaptureError, EngineLoadError, RangeError, TranscodeError};
use crate::domain::model::{Cut, CutId, PlaybackState, SourceMedia, ThumbnailResult, TimeRange};
use crate::domain::selection::{SelectionController, SelectionState};
use crate::engine::{EngineState, EngineTask, TranscodeEngine};
use crate::ports::{FrameSource, PlaybackEvent, PlaybackPort};
use crate::thumbnail::ThumbnailCapturer;


/// Pending single-range trim
pub type TrimTask = EngineTask<Vec<u8>, TranscodeError>;

/// Failures reported by editor operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Commit requested without both a start and an end
    #[error("selection needs both a start and an end")]
    SelectionIncomplete,

    #[error(transparent)]
    Range(#[from] RangeError),

    /// Media duration has not been reported yet
    #[error("media duration is not known yet")]
    DurationUnknown,

    /// Trim export requested without a selected range
    #[error("no range is selected for trimming")]
    NoRangeSelected,

    #[error("video processing engine is not ready (state: {0})")]
    EngineNotReady(EngineState),

    #[error("video processing is unavailable: {0}")]
    EngineUnavailable(EngineLoadError),

    #[error(transparent)]
    Transcode(TranscodeError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// The session has been closed
    #[error("editor session is closed")]
    Closed,
}

impl From<TranscodeError> for SessionError {
    fn from(err: TranscodeError) -> Self {
        match err {
            TranscodeError::NotReady(state) => SessionError::EngineNotReady(state),
            TranscodeError::Unavailable(load) => SessionError::EngineUnavailable(load),
            other => SessionError::Transcode(other),
        }
    }
}

/// Output of the cut-list workflow
#[derive(Debug, Clone, PartialEq)]
pub struct CutListExport {
    /// Insertion order; may overlap
    pub ranges: Vec<TimeRange>,
    pub thumbnail: Option<ThumbnailResult>,
}

/// Output of the single-range trim workflow
#[derive(Debug, Clone, PartialEq)]
pub struct TrimExport {
    pub video: Vec<u8>,
    pub mime_type: String,
    pub range: TimeRange,
    pub thumbnail: Option<ThumbnailResult>,
}

/// All editor state for one opened source.
///
/// Created when the editor opens on a source and torn down by [`close`] or
/// drop, which releases the codec runtime. After `close` the selection,
/// cut and playback operations are inert and the fallible ones return
/// [`SessionError::Closed`].
///
/// [`close`]: EditorSession::close
pub struct EditorSession {
    source: SourceMedia,
    playback: Box<dyn PlaybackPort>,
    events: broadcast::Receiver<PlaybackEvent>,
    selection: SelectionController,
    cuts: CutList,
    capturer: ThumbnailCapturer,
    thumbnail: Option<ThumbnailResult>,
    engine: TranscodeEngine,
    duration: Option<f64>,
    closed: bool,
}

impl EditorSession {
    pub fn open(
        source: SourceMedia,
        playback: Box<dyn PlaybackPort>,
        engine: TranscodeEngine,
        config: &EditorConfig,
    ) -> Self {
        let events = playback.subscribe();
        let duration = playback.duration();
        info!(
            file = source.file_name(),
            bytes = source.len(),
            duration = ?duration,
            "editor session opened"
        );
        Self {
            source,
            playback,
            events,
            selection: SelectionController::new(),
            cuts: CutList::new(),
            capturer: ThumbnailCapturer::from_config(&config.thumbnail),
            thumbnail: None,
            engine,
            duration,
            closed: false,
        }
    }

    pub fn source(&self) -> &SourceMedia {
        &self.source
    }

    pub fn engine(&self) -> &TranscodeEngine {
        &self.engine
    }

    /// Duration once metadata has loaded
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn playback_state(&self) -> PlaybackState {
        PlaybackState {
            duration: self.duration,
            ..self.playback.state()
        }
    }

    /// Apply pending media element events. Returns how many were handled.
    pub fn pump_playback_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.on_playback_event(event);
                    handled += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "playback events dropped");
                    self.resync_from_playback();
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        handled
    }

    fn on_playback_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::LoadedMetadata { duration } => {
                debug!(duration, "media metadata loaded");
                self.duration = Some(duration);
            }
            // Queued updates can be stale; the element holds the real position.
            PlaybackEvent::TimeUpdate(_) => self.guard_trim_window(),
            PlaybackEvent::Played | PlaybackEvent::Paused | PlaybackEvent::Ended => {}
        }
    }

    fn resync_from_playback(&mut self) {
        if let Some(duration) = self.playback.duration() {
            self.duration = Some(duration);
        }
        self.guard_trim_window();
    }

    /// Stop playback once it runs past the selected range
    fn guard_trim_window(&mut self) {
        if let Some((_, end)) = self.selection.state().range() {
            let time = self.playback.current_time();
            if time >= end && self.playback.is_playing() {
                debug!(time, end, "playback reached selection end");
                self.playback.pause();
            }
        }
    }

    /// Anchor the selection start at the playhead
    pub fn mark_start(&mut self) -> SelectionState {
        if self.closed {
            return self.selection.state();
        }
        let time = self.playback.current_time();
        self.selection.set_start(time)
    }

    /// Set the selection end at the playhead; ignored unless after the start
    pub fn mark_end(&mut self) -> SelectionState {
        if self.closed {
            return self.selection.state();
        }
        let time = self.playback.current_time();
        self.selection.set_end(time)
    }

    pub fn clear_selection(&mut self) -> SelectionState {
        self.selection.clear()
    }

    pub fn selection_state(&self) -> SelectionState {
        self.selection.state()
    }

    /// Live end for display while only a start is marked
    pub fn selection_preview_end(&self) -> Option<f64> {
        self.selection.preview_end(self.playback.current_time())
    }

    /// Move the completed selection into the cut list.
    ///
    /// A range rejected against the known duration leaves the selection in
    /// place so it can be adjusted.
    pub fn commit_selection(&mut self) -> Result<Cut, SessionError> {
        self.ensure_open()?;
        let (start, end) = self.selection.state().range().ok_or(SessionError::SelectionIncomplete)?;
        let range = TimeRange::new(start, end, self.duration)?;
        self.selection.commit();
        Ok(self.cuts.add(range))
    }

    /// Remove a cut; unknown ids are a no-op
    pub fn remove_cut(&mut self, id: CutId) -> Option<Cut> {
        if self.closed {
            return None;
        }
        self.cuts.remove(id)
    }

    pub fn cuts(&self) -> &[Cut] {
        self.cuts.list()
    }

    pub fn seek(&mut self, time: f64) {
        if self.closed {
            return;
        }
        self.playback.seek(time);
    }

    /// Seek to a fraction of the duration, as a timeline click does
    pub fn seek_fraction(&mut self, fraction: f64) -> Result<f64, SessionError> {
        self.ensure_open()?;
        let duration = self.duration.ok_or(SessionError::DurationUnknown)?;
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        let time = fraction * duration;
        self.playback.seek(time);
        Ok(time)
    }

    /// Pause if playing, otherwise resume. Returns whether playback is running.
    pub fn toggle_play(&mut self) -> bool {
        if self.playback.is_playing() {
            self.playback.pause();
        } else {
            self.resume();
        }
        self.playback.is_playing()
    }

    /// Start playback, first snapping back to the selection start when the
    /// playhead sits outside the selected range
    pub fn resume(&mut self) {
        if self.closed {
            return;
        }
        if let Some((start, end)) = self.selection.state().range() {
            let time = self.playback.current_time();
            if time < start || time >= end {
                debug!(time, start, "clamping playhead to selection start");
                self.playback.seek(start);
            }
        }
        self.playback.play();
    }

    /// Capture the frame visible now and keep it as the session thumbnail
    pub fn capture_thumbnail(&mut self, frames: &dyn FrameSource) -> Result<&ThumbnailResult, SessionError> {
        self.ensure_open()?;
        let at_time = self.playback.current_time();
        let thumbnail = self.capturer.capture(frames, at_time)?;
        Ok(self.thumbnail.insert(thumbnail))
    }

    pub fn thumbnail(&self) -> Option<&ThumbnailResult> {
        self.thumbnail.as_ref()
    }

    pub fn clear_thumbnail(&mut self) -> Option<ThumbnailResult> {
        self.thumbnail.take()
    }

    /// Start loading the codec runtime; only the trim workflow needs it
    pub fn load_engine(&self) -> EngineTask<(), EngineLoadError> {
        self.engine.load()
    }

    pub fn engine_state(&self) -> EngineState {
        self.engine.state()
    }

    /// Committed ranges, or the whole source when nothing was committed
    pub fn export_cut_list(&self) -> Result<CutListExport, SessionError> {
        self.ensure_open()?;
        let ranges = if self.cuts.is_empty() {
            let duration = self.duration.ok_or(SessionError::DurationUnknown)?;
            vec![TimeRange::whole(duration)?]
        } else {
            self.cuts.export_ranges()
        };
        info!(ranges = ranges.len(), thumbnail = self.thumbnail.is_some(), "cut list exported");
        Ok(CutListExport {
            ranges,
            thumbnail: self.thumbnail.clone(),
        })
    }

    /// Start trimming the selected range. Playback is paused first.
    pub fn start_trim_export(&mut self) -> Result<TrimTask, SessionError> {
        self.begin_trim().map(|(_, task)| task)
    }

    /// Trim the selected range and wait for the output
    pub async fn export_trim(&mut self) -> Result<TrimExport, SessionError> {
        let (range, task) = self.begin_trim()?;
        let video = task.wait().await?;
        info!(bytes = video.len(), %range, "trim exported");
        Ok(TrimExport {
            video,
            mime_type: self.engine.settings().output_mime_type(),
            range,
            thumbnail: self.thumbnail.clone(),
        })
    }

    fn begin_trim(&mut self) -> Result<(TimeRange, TrimTask), SessionError> {
        self.ensure_open()?;
        let (start, end) = self.selection.state().range().ok_or(SessionError::NoRangeSelected)?;
        let range = TimeRange::new(start, end, self.duration)?;

        match self.engine.state() {
            EngineState::Ready => {}
            EngineState::Failed(err) => return Err(SessionError::EngineUnavailable(err)),
            EngineState::Processing => return Err(SessionError::Transcode(TranscodeError::Busy)),
            other => return Err(SessionError::EngineNotReady(other)),
        }

        if self.playback.is_playing() {
            debug!("pausing playback before trim");
            self.playback.pause();
        }

        let task = self.engine.trim(&self.source, range.start(), range.end())?;
        Ok((range, task))
    }

    /// Release the codec runtime and drop all editor state
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.playback.pause();
        self.selection.clear();
        self.cuts.clear();
        self.thumbnail = None;
        self.engine.shutdown().await;
        info!(file = self.source.file_name(), "editor session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.closed {
            Err(SessionError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        if !self.closed {
            self.engine.shutdown_detached();
        }
    }
}
