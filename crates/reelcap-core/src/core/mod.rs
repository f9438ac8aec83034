//! Reelcap Core Engine
//!
//! Handles screen capture sessions, blob resource ownership, timeline
//! duration reconciliation and scrubber interaction.

pub mod capture;
pub mod playback;
pub mod resource;
pub mod settings;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
