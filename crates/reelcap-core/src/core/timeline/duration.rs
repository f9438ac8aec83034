//! Duration Reconciler
//!
//! The edit timeline may run longer than the source media (trailing
//! freeze-frames, blank canvas) but never shorter than a configured floor.

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::{debug, warn};

use crate::core::{sanitize_time, TimeSec};

/// Default timeline floor in seconds
pub const DEFAULT_MIN_TIMELINE_DURATION: TimeSec = 10.0;

/// Derives the effective timeline length.
///
/// Invariant: `timeline_duration >= min_timeline_duration` at all times.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct DurationReconciler {
    video_duration: TimeSec,
    timeline_duration: TimeSec,
    min_timeline_duration: TimeSec,
}

impl DurationReconciler {
    /// Creates a reconciler with the given floor.
    ///
    /// A non-finite or negative floor falls back to
    /// [`DEFAULT_MIN_TIMELINE_DURATION`].
    pub fn new(min_timeline_duration: TimeSec) -> Self {
        let min = if min_timeline_duration.is_finite() && min_timeline_duration >= 0.0 {
            min_timeline_duration
        } else {
            warn!(
                "Invalid minimum timeline duration {}, using {}",
                min_timeline_duration, DEFAULT_MIN_TIMELINE_DURATION
            );
            DEFAULT_MIN_TIMELINE_DURATION
        };

        Self {
            video_duration: 0.0,
            timeline_duration: min,
            min_timeline_duration: min,
        }
    }

    /// Intrinsic length of the loaded media, 0 if none
    pub fn video_duration(&self) -> TimeSec {
        self.video_duration
    }

    /// Explicitly authored timeline length (already floored)
    pub fn timeline_duration(&self) -> TimeSec {
        self.timeline_duration
    }

    pub fn min_timeline_duration(&self) -> TimeSec {
        self.min_timeline_duration
    }

    /// Records the intrinsic media length. Does not touch the timeline length.
    pub fn set_video_duration(&mut self, seconds: TimeSec) {
        let seconds = sanitize_time(seconds);
        debug!("Video duration set to {:.3}s", seconds);
        self.video_duration = seconds;
    }

    /// Stores `max(requested, min_timeline_duration)`
    pub fn set_timeline_duration(&mut self, requested: TimeSec) {
        let requested = sanitize_time(requested);
        self.timeline_duration = requested.max(self.min_timeline_duration);
        debug!(
            "Timeline duration set to {:.3}s (requested {:.3}s)",
            self.timeline_duration, requested
        );
    }

    /// Grows the timeline to at least `seconds`, never shrinking it
    pub fn ensure_timeline_covers(&mut self, seconds: TimeSec) {
        let seconds = sanitize_time(seconds);
        if seconds > self.timeline_duration {
            self.set_timeline_duration(seconds);
        }
    }

    /// `max(timeline_duration, min_timeline_duration)`
    pub fn effective_duration(&self) -> TimeSec {
        self.timeline_duration.max(self.min_timeline_duration)
    }

    /// Clears the media length and drops the timeline back to the floor
    pub fn reset(&mut self) {
        self.video_duration = 0.0;
        self.timeline_duration = self.min_timeline_duration;
        debug!("Durations reset to floor {:.3}s", self.min_timeline_duration);
    }
}

impl Default for DurationReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TIMELINE_DURATION)
    }
}
