//! Playback Module
//!
//! Per-session playback state and the [`EditorSession`] context that owns it
//! together with the duration reconciler, scrubber and resource guard.

mod editor;
mod state;

pub use editor::*;
pub use state::*;
