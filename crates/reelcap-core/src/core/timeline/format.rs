//! Time display formatting for playback controls.

use crate::core::{sanitize_time, TimeSec};

/// Shown instead of a time before any media has been loaded
pub const TIME_PLACEHOLDER: &str = "--:--";

/// Formats seconds as `MM:SS.cc`.
///
/// Returns [`TIME_PLACEHOLDER`] when no media is loaded and the position is
/// exactly zero. All components are floored, so the display never runs ahead
/// of the true elapsed time. Minutes are not wrapped into hours.
pub fn format_time(seconds: TimeSec, has_media: bool) -> String {
    if !has_media && seconds == 0.0 {
        return TIME_PLACEHOLDER.to_string();
    }

    let seconds = sanitize_time(seconds);
    let total_centis = (seconds * 100.0).floor() as u64;

    let minutes = total_centis / 6000;
    let secs = (total_centis / 100) % 60;
    let centis = total_centis % 100;

    format!("{:02}:{:02}.{:02}", minutes, secs, centis)
}
