//! Capture Platform Trait
//!
//! Defines the interface to the host's display capture and recorder
//! facilities (`getDisplayMedia` + `MediaRecorder` in a browser).
//! Implementations include the browser bridge and [`super::SimulatedPlatform`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use specta::Type;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::settings::CaptureSettings;
use crate::core::CoreError;

// =============================================================================
// Requests
// =============================================================================

/// Constraints for a display capture request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConstraints {
    /// Ideal frame rate
    pub frame_rate: u32,
    /// Draw the cursor into the capture
    pub cursor: bool,
    /// Capture audio (always false for screen recordings)
    pub audio: bool,
}

impl DisplayConstraints {
    pub fn from_settings(settings: &CaptureSettings) -> Self {
        Self {
            frame_rate: settings.frame_rate,
            cursor: settings.capture_cursor,
            audio: false,
        }
    }
}

/// Options for creating a recorder
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct RecorderOptions {
    /// Negotiated MIME type, `None` for the platform default
    pub mime_type: Option<String>,
    /// Chunk interval in milliseconds (0 = single chunk at stop)
    pub timeslice_ms: u32,
}

// =============================================================================
// Events
// =============================================================================

/// Event delivered by a recorder, in occurrence order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecorderEvent {
    /// Encoded media fragment (`dataavailable`)
    Chunk(Vec<u8>),
    /// The captured video track ended (user stopped sharing from OS chrome)
    TrackEnded,
    /// Recorder stopped; no further chunks follow
    Stopped,
    /// Transport-level failure
    Error(String),
}

// =============================================================================
// Errors
// =============================================================================

/// Failure reported by a platform adapter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("display capture is not available")]
    Unsupported,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("request cancelled by user")]
    Cancelled,

    #[error("{0}")]
    Transport(String),
}

impl From<PlatformError> for CoreError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Unsupported => CoreError::CaptureUnsupported,
            PlatformError::PermissionDenied(reason) => CoreError::PermissionDenied(reason),
            PlatformError::Cancelled => CoreError::UserCancelled,
            PlatformError::Transport(reason) => CoreError::CaptureFailed(reason),
        }
    }
}

// =============================================================================
// Platform Objects
// =============================================================================

/// A granted capture stream
pub trait MediaStream: Send {
    /// Platform identifier of the stream
    fn id(&self) -> String;

    /// Stops every track; the OS sharing indicator goes away
    fn stop_tracks(&mut self);
}

/// A running recorder attached to a stream
pub trait MediaRecorder: Send {
    /// MIME type the recorder actually produces
    fn mime_type(&self) -> String;

    /// Requests the recorder stop. A [`RecorderEvent::Stopped`] follows on
    /// the event channel once buffered data has been flushed.
    fn stop(&mut self) -> Result<(), PlatformError>;
}

/// Recorder plus the channel its events arrive on.
///
/// Adapters forward the stream's track-ended signal into the same channel
/// so the session consumes a single ordered event sequence.
pub struct RecorderHandle {
    pub recorder: Box<dyn MediaRecorder>,
    pub events: mpsc::UnboundedReceiver<RecorderEvent>,
}

// =============================================================================
// Platform Trait
// =============================================================================

/// Host display capture facilities
#[async_trait]
pub trait CapturePlatform: Send + Sync {
    /// Whether display capture exists at all
    fn supports_display_capture(&self) -> bool;

    /// Whether the recorder can produce `mime_type`
    fn is_mime_type_supported(&self, mime_type: &str) -> bool;

    /// Asks the user to pick a screen; resolves when the prompt is answered
    async fn request_display_media(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<Box<dyn MediaStream>, PlatformError>;

    /// Starts a recorder on a granted stream
    fn create_recorder(
        &self,
        stream: &mut dyn MediaStream,
        options: &RecorderOptions,
    ) -> Result<RecorderHandle, PlatformError>;
}
