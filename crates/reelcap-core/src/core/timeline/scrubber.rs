//! Scrubber Interaction Model
//!
//! Maps pointer input on a horizontal track to playback positions and derives
//! the progress bar / handle geometry. Toolkit-agnostic: callers pass pointer
//! x-coordinates already translated into the track's local space.

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::trace;

use crate::core::{sanitize_time, TimeSec};

/// Element that received a pointer-down
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub enum PointerTarget {
    /// The track body
    Track,
    /// The draggable handle
    Handle,
}

/// Pointer input on the scrubber, x in track-local pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PointerEvent {
    Down { x: f64, target: PointerTarget },
    Move { x: f64 },
    Up { x: f64 },
    Click { x: f64 },
    /// Pointer capture lost (window blur, touch cancel)
    Cancel,
}

/// What the host should do with playback after an event
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScrubAction {
    None,
    Seek { time: TimeSec },
}

/// Render geometry of the progress bar
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    /// Played fraction in [0, 1]
    pub fraction: f64,
    /// Handle offset from the track's left edge, in pixels
    pub handle_offset_px: f64,
    /// False when there is no duration to show progress against
    pub visible: bool,
}

/// Drag state and geometry of a scrubber track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct ScrubberModel {
    track_width: f64,
    is_dragging: bool,
}

impl ScrubberModel {
    pub fn new(track_width: f64) -> Self {
        Self {
            track_width: finite_width(track_width),
            is_dragging: false,
        }
    }

    pub fn track_width(&self) -> f64 {
        self.track_width
    }

    /// Updates the track width after a layout change
    pub fn set_track_width(&mut self, width: f64) {
        self.track_width = finite_width(width);
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    /// Fraction of the track width at `x`, clamped to [0, 1].
    ///
    /// A zero-width track (not laid out yet) always yields 0.
    pub fn fraction_at(&self, x: f64) -> f64 {
        if self.track_width <= 0.0 || !x.is_finite() {
            return 0.0;
        }
        (x / self.track_width).clamp(0.0, 1.0)
    }

    /// Playback time under `x` for a timeline of `duration` seconds
    pub fn time_at(&self, x: f64, duration: TimeSec) -> TimeSec {
        self.fraction_at(x) * sanitize_time(duration)
    }

    /// Applies a pointer event and returns the resulting playback action
    pub fn handle(&mut self, event: PointerEvent, duration: TimeSec) -> ScrubAction {
        let action = match event {
            PointerEvent::Down {
                target: PointerTarget::Handle,
                ..
            } => {
                self.is_dragging = true;
                ScrubAction::None
            }
            PointerEvent::Down {
                target: PointerTarget::Track,
                ..
            } => ScrubAction::None,
            PointerEvent::Move { x } if self.is_dragging => ScrubAction::Seek {
                time: self.time_at(x, duration),
            },
            PointerEvent::Move { .. } => ScrubAction::None,
            PointerEvent::Up { .. } | PointerEvent::Cancel => {
                self.is_dragging = false;
                ScrubAction::None
            }
            // A drag owns the pointer until release
            PointerEvent::Click { .. } if self.is_dragging => ScrubAction::None,
            PointerEvent::Click { x } => ScrubAction::Seek {
                time: self.time_at(x, duration),
            },
        };

        trace!(?event, ?action, dragging = self.is_dragging, "scrubber event");
        action
    }

    /// Progress bar geometry for `current_time` on a `duration`-long timeline
    pub fn view(&self, current_time: TimeSec, duration: TimeSec) -> ProgressView {
        let fraction = progress_fraction(current_time, duration);
        ProgressView {
            fraction,
            handle_offset_px: fraction * self.track_width,
            visible: sanitize_time(duration) > 0.0,
        }
    }
}

fn finite_width(width: f64) -> f64 {
    if width.is_finite() && width > 0.0 {
        width
    } else {
        0.0
    }
}

/// `current_time / duration` clamped to [0, 1]; 0 when duration is 0
pub fn progress_fraction(current_time: TimeSec, duration: TimeSec) -> f64 {
    let duration = sanitize_time(duration);
    if duration == 0.0 {
        return 0.0;
    }
    (sanitize_time(current_time) / duration).clamp(0.0, 1.0)
}
