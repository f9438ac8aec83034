//! Timeline Module
//!
//! Duration reconciliation between the loaded media and the edit timeline,
//! scrubber pointer handling, and time display formatting.

pub mod duration;
pub mod format;
pub mod scrubber;

pub use duration::{DurationReconciler, DEFAULT_MIN_TIMELINE_DURATION};
pub use format::{format_time, TIME_PLACEHOLDER};
pub use scrubber::{
    progress_fraction, PointerEvent, PointerTarget, ProgressView, ScrubAction, ScrubberModel,
};
