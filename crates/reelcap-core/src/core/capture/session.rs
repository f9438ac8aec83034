//! Capture Session
//!
//! One recording attempt: the granted stream, its recorder, the recorder's
//! event channel and the chunks aggregated so far.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use specta::Type;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::platform::{MediaRecorder, MediaStream, PlatformError, RecorderEvent, RecorderHandle};
use crate::core::{MediaBlob, SessionId, TimeSec};

/// Capture controller status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub enum CaptureStatus {
    #[default]
    Idle,
    /// Waiting for the user to answer the permission prompt
    Requesting,
    Recording,
    Finalizing,
}

/// Serializable progress of the controller for UI polling
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSnapshot {
    pub status: CaptureStatus,
    pub session_id: Option<SessionId>,
    pub chunk_count: usize,
    pub byte_count: usize,
    /// RFC 3339 start time of the active session
    pub started_at: Option<String>,
    pub elapsed_sec: TimeSec,
}

impl CaptureSnapshot {
    pub fn idle(status: CaptureStatus) -> Self {
        Self {
            status,
            session_id: None,
            chunk_count: 0,
            byte_count: 0,
            started_at: None,
            elapsed_sec: 0.0,
        }
    }
}

/// Active recording
pub struct CaptureSession {
    id: SessionId,
    stream: Box<dyn MediaStream>,
    recorder: Box<dyn MediaRecorder>,
    pub(crate) events: mpsc::UnboundedReceiver<RecorderEvent>,
    chunks: Vec<Vec<u8>>,
    byte_count: usize,
    mime_type: String,
    started_at: DateTime<Utc>,
    stop_requested: bool,
    tracks_stopped: bool,
}

impl CaptureSession {
    pub fn new(stream: Box<dyn MediaStream>, handle: RecorderHandle) -> Self {
        let mime_type = handle.recorder.mime_type();
        Self {
            id: ulid::Ulid::new().to_string(),
            stream,
            recorder: handle.recorder,
            events: handle.events,
            chunks: Vec::new(),
            byte_count: 0,
            mime_type,
            started_at: Utc::now(),
            stop_requested: false,
            tracks_stopped: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn byte_count(&self) -> usize {
        self.byte_count
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Wall-clock seconds since the recorder started
    pub fn elapsed_sec(&self) -> TimeSec {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_milliseconds().max(0) as f64 / 1000.0
    }

    /// Appends a fragment in arrival order
    pub fn push_chunk(&mut self, chunk: Vec<u8>) {
        self.byte_count += chunk.len();
        self.chunks.push(chunk);
        debug!(
            "Session {} chunk #{} ({} bytes total)",
            self.id,
            self.chunks.len(),
            self.byte_count
        );
    }

    /// Asks the recorder to stop. Only the first call reaches the recorder.
    pub fn request_stop(&mut self) -> Result<bool, PlatformError> {
        if self.stop_requested {
            return Ok(false);
        }
        self.stop_requested = true;
        self.recorder.stop()?;
        Ok(true)
    }

    /// Stops the capture stream's tracks
    pub fn stop_tracks(&mut self) {
        if !self.tracks_stopped {
            self.stream.stop_tracks();
            self.tracks_stopped = true;
        }
    }

    /// Concatenates the aggregated chunks into one blob
    pub fn take_blob(&mut self) -> MediaBlob {
        let chunks = std::mem::take(&mut self.chunks);
        self.byte_count = 0;
        MediaBlob::concat(self.mime_type.clone(), chunks)
    }

    /// Throws away everything recorded so far and releases the stream
    pub fn discard(&mut self) {
        if !self.stop_requested {
            self.stop_requested = true;
            if let Err(e) = self.recorder.stop() {
                warn!("Failed to stop recorder of discarded session {}: {}", self.id, e);
            }
        }
        self.chunks.clear();
        self.byte_count = 0;
        self.stop_tracks();
    }

    pub fn snapshot(&self, status: CaptureStatus) -> CaptureSnapshot {
        CaptureSnapshot {
            status,
            session_id: Some(self.id.clone()),
            chunk_count: self.chunks.len(),
            byte_count: self.byte_count,
            started_at: Some(self.started_at.to_rfc3339()),
            elapsed_sec: self.elapsed_sec(),
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        // Never leave the OS sharing indicator on for a dead session.
        self.stop_tracks();
    }
}
