// Headless playback adapter - Clock-driven media element without a display

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::trace;

use crate::ports::{PlaybackEvent, PlaybackPort};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct PlayerState {
    current_time: f64,
    duration: Option<f64>,
    playing: bool,
}

/// Media element that advances only when told to.
///
/// Clones share the same element, so a host can keep a handle to drive the
/// clock while an editor session owns another.
#[derive(Clone)]
pub struct HeadlessPlayback {
    state: Arc<Mutex<PlayerState>>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl Default for HeadlessPlayback {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlayback {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(PlayerState::default())),
            events,
        }
    }

    /// Element whose metadata is already loaded
    pub fn with_duration(duration: f64) -> Self {
        let playback = Self::new();
        playback.load_metadata(duration);
        playback
    }

    /// Report the media duration, as a metadata load would
    pub fn load_metadata(&self, duration: f64) {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        {
            let mut state = self.state.lock();
            state.duration = Some(duration);
            state.current_time = state.current_time.min(duration);
        }
        self.emit(PlaybackEvent::LoadedMetadata { duration });
    }

    /// Advance the clock by `dt` seconds while playing
    pub fn advance(&self, dt: f64) {
        let (time, ended) = {
            let mut state = self.state.lock();
            if !state.playing || !dt.is_finite() || dt <= 0.0 {
                return;
            }
            let mut next = state.current_time + dt;
            let mut ended = false;
            if let Some(duration) = state.duration {
                if next >= duration {
                    next = duration;
                    state.playing = false;
                    ended = true;
                }
            }
            state.current_time = next;
            (next, ended)
        };

        self.emit(PlaybackEvent::TimeUpdate(time));
        if ended {
            self.emit(PlaybackEvent::Ended);
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        trace!(?event, "playback event");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl PlaybackPort for HeadlessPlayback {
    fn play(&mut self) {
        let changed = {
            let mut state = self.state.lock();
            if let Some(duration) = state.duration {
                if state.current_time >= duration {
                    state.current_time = 0.0;
                }
            }
            let changed = !state.playing;
            state.playing = true;
            changed
        };
        if changed {
            self.emit(PlaybackEvent::Played);
        }
    }

    fn pause(&mut self) {
        let changed = {
            let mut state = self.state.lock();
            let changed = state.playing;
            state.playing = false;
            changed
        };
        if changed {
            self.emit(PlaybackEvent::Paused);
        }
    }

    fn seek(&mut self, time: f64) {
        let time = {
            let mut state = self.state.lock();
            let mut target = if time.is_finite() { time.max(0.0) } else { 0.0 };
            if let Some(duration) = state.duration {
                target = target.min(duration);
            }
            state.current_time = target;
            target
        };
        self.emit(PlaybackEvent::TimeUpdate(time));
    }

    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn duration(&self) -> Option<f64> {
        self.state.lock().duration
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}
