//! Selection controller: the in-progress start/end pair being marked against
//! the playhead.
//!
//! Transitions are synchronous and lenient. An end that does not come after the
//! start is ignored rather than reported, so scrubbing can continue uninterrupted.

use tracing::trace;

/// Raw pending selection
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Selection {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

/// Observable selection state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionState {
    Idle,
    StartSet { start: f64 },
    RangeSet { start: f64, end: f64 },
}

impl SelectionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, SelectionState::Idle)
    }

    /// Complete range, if one is set
    pub fn range(&self) -> Option<(f64, f64)> {
        match *self {
            SelectionState::RangeSet { start, end } => Some((start, end)),
            _ => None,
        }
    }
}

/// Tracks a single pending selection
#[derive(Debug, Default)]
pub struct SelectionController {
    selection: Selection,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn state(&self) -> SelectionState {
        match (self.selection.start, self.selection.end) {
            (Some(start), Some(end)) => SelectionState::RangeSet { start, end },
            (Some(start), None) => SelectionState::StartSet { start },
            // An end never survives without a start.
            (None, _) => SelectionState::Idle,
        }
    }

    /// Anchor the start at `t`, dropping a pending end that is no longer ahead of it
    pub fn set_start(&mut self, t: f64) -> SelectionState {
        self.selection.start = Some(t);
        if let Some(end) = self.selection.end {
            if end <= t {
                trace!(start = t, end, "dropping pending end behind new start");
                self.selection.end = None;
            }
        }
        self.state()
    }

    /// Set the end at `t`; ignored unless a start exists and `t` is after it
    pub fn set_end(&mut self, t: f64) -> SelectionState {
        match self.selection.start {
            Some(start) if t > start => self.selection.end = Some(t),
            _ => trace!(end = t, "ignoring end that does not follow start"),
        }
        self.state()
    }

    /// Discard the pending selection
    pub fn clear(&mut self) -> SelectionState {
        self.selection = Selection::default();
        SelectionState::Idle
    }

    /// Take the completed range and reset; `None` unless a full range is set
    pub fn commit(&mut self) -> Option<(f64, f64)> {
        let range = self.state().range()?;
        self.selection = Selection::default();
        Some(range)
    }

    /// End to display while only a start is set: the live playhead
    pub fn preview_end(&self, current_time: f64) -> Option<f64> {
        match self.state() {
            SelectionState::Idle => None,
            SelectionState::StartSet { .. } => Some(current_time),
            SelectionState::RangeSet { end, .. } => Some(end),
        }
    }
}
