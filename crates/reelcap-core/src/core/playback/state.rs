//! Playback state written by the engine and read back by the media element.

use serde::{Deserialize, Serialize};
use specta::Type;

use crate::core::TimeSec;

/// Playback position and transport state of the current source
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Playhead position in seconds
    pub current_time: TimeSec,
    /// Whether the media element should be playing
    pub is_playing: bool,
    /// A source was loaded but its metadata (duration) has not arrived yet
    pub duration_pending: bool,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewinds and pauses for a freshly loaded source
    pub fn rewind_for_new_source(&mut self) {
        self.current_time = 0.0;
        self.is_playing = false;
        self.duration_pending = true;
    }

    /// Returns to the empty state
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
