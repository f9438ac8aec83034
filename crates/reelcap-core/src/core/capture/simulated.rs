//! Simulated Capture Platform
//!
//! In-process [`CapturePlatform`] with a scripted permission outcome. The
//! recorder's event channel is driven through a [`SimulatedFeed`], which
//! stands in for the encoder (chunks) and the OS (track ended).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tracing::debug;

use super::platform::{
    CapturePlatform, DisplayConstraints, MediaRecorder, MediaStream, PlatformError,
    RecorderEvent, RecorderHandle, RecorderOptions,
};

/// Recorder MIME type when none was negotiated
pub const SIMULATED_DEFAULT_MIME: &str = "video/webm";

/// How the simulated permission prompt is answered
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimulatedOutcome {
    /// User picks a screen
    Grant,
    /// Browser or user policy refuses
    Deny(String),
    /// User closes the picker
    Cancel,
    /// No display capture on this platform
    Unsupported,
    /// The request itself fails
    Fail(String),
    /// Permission is granted but the recorder cannot start
    RecorderFails(String),
}

/// Test-side handle of the most recent recorder's event channel
#[derive(Clone, Debug)]
pub struct SimulatedFeed {
    tx: mpsc::UnboundedSender<RecorderEvent>,
}

impl SimulatedFeed {
    /// Emits an encoded chunk
    pub fn push_chunk(&self, data: impl Into<Vec<u8>>) -> bool {
        self.tx.send(RecorderEvent::Chunk(data.into())).is_ok()
    }

    /// Simulates the user pressing "Stop sharing" in the OS chrome
    pub fn end_track(&self) -> bool {
        self.tx.send(RecorderEvent::TrackEnded).is_ok()
    }

    /// Injects a transport failure
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        self.tx.send(RecorderEvent::Error(reason.into())).is_ok()
    }
}

struct SimulatedStream {
    id: String,
    stopped: Arc<AtomicBool>,
}

impl MediaStream for SimulatedStream {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn stop_tracks(&mut self) {
        debug!("Simulated stream {} tracks stopped", self.id);
        self.stopped.store(true, Ordering::SeqCst);
    }
}

struct SimulatedRecorder {
    tx: mpsc::UnboundedSender<RecorderEvent>,
    mime_type: String,
    final_chunk: Option<Vec<u8>>,
    stopped: bool,
}

impl MediaRecorder for SimulatedRecorder {
    fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    fn stop(&mut self) -> Result<(), PlatformError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;

        // Like a real recorder: flush buffered data, then signal stop.
        if let Some(chunk) = self.final_chunk.take() {
            self.tx
                .send(RecorderEvent::Chunk(chunk))
                .map_err(|_| PlatformError::Transport("recorder detached".to_string()))?;
        }
        self.tx
            .send(RecorderEvent::Stopped)
            .map_err(|_| PlatformError::Transport("recorder detached".to_string()))
    }
}

#[derive(Default)]
struct SimulatedState {
    feed: Option<SimulatedFeed>,
    last_stream_stopped: Option<Arc<AtomicBool>>,
    request_count: usize,
    last_options: Option<RecorderOptions>,
}

/// Scripted capture platform for tests and the headless CLI
pub struct SimulatedPlatform {
    outcome: SimulatedOutcome,
    supported_mime_types: Vec<String>,
    permission_gate: Option<Arc<Notify>>,
    final_chunk: Option<Vec<u8>>,
    state: Mutex<SimulatedState>,
}

impl SimulatedPlatform {
    /// Creates a platform that grants every request
    pub fn new() -> Self {
        Self {
            outcome: SimulatedOutcome::Grant,
            supported_mime_types: vec![
                "video/webm;codecs=vp9".to_string(),
                "video/webm".to_string(),
            ],
            permission_gate: None,
            final_chunk: None,
            state: Mutex::new(SimulatedState::default()),
        }
    }

    /// Sets the permission prompt outcome
    pub fn with_outcome(mut self, outcome: SimulatedOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Sets the MIME types the recorder accepts
    pub fn with_supported_mime_types<I, S>(mut self, mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_mime_types = mime_types.into_iter().map(Into::into).collect();
        self
    }

    /// Keeps the permission prompt open until `gate` is notified
    pub fn with_permission_gate(mut self, gate: Arc<Notify>) -> Self {
        self.permission_gate = Some(gate);
        self
    }

    /// Chunk flushed by the recorder when it is stopped
    pub fn with_final_chunk(mut self, chunk: impl Into<Vec<u8>>) -> Self {
        self.final_chunk = Some(chunk.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Feed of the most recently created recorder
    pub fn feed(&self) -> Option<SimulatedFeed> {
        self.lock().feed.clone()
    }

    /// Whether the most recently granted stream has been stopped
    pub fn tracks_stopped(&self) -> bool {
        self.lock()
            .last_stream_stopped
            .as_ref()
            .is_some_and(|stopped| stopped.load(Ordering::SeqCst))
    }

    /// Number of permission prompts shown
    pub fn request_count(&self) -> usize {
        self.lock().request_count
    }

    /// Options the most recent recorder was created with
    pub fn last_recorder_options(&self) -> Option<RecorderOptions> {
        self.lock().last_options.clone()
    }
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapturePlatform for SimulatedPlatform {
    fn supports_display_capture(&self) -> bool {
        self.outcome != SimulatedOutcome::Unsupported
    }

    fn is_mime_type_supported(&self, mime_type: &str) -> bool {
        self.supported_mime_types
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(mime_type))
    }

    async fn request_display_media(
        &self,
        constraints: &DisplayConstraints,
    ) -> Result<Box<dyn MediaStream>, PlatformError> {
        self.lock().request_count += 1;
        debug!("Simulated permission prompt ({:?})", constraints);

        if let Some(gate) = &self.permission_gate {
            gate.notified().await;
        }

        match &self.outcome {
            SimulatedOutcome::Grant | SimulatedOutcome::RecorderFails(_) => {
                let stopped = Arc::new(AtomicBool::new(false));
                self.lock().last_stream_stopped = Some(stopped.clone());
                Ok(Box::new(SimulatedStream {
                    id: format!("sim-stream-{}", ulid::Ulid::new()),
                    stopped,
                }))
            }
            SimulatedOutcome::Deny(reason) => Err(PlatformError::PermissionDenied(reason.clone())),
            SimulatedOutcome::Cancel => Err(PlatformError::Cancelled),
            SimulatedOutcome::Unsupported => Err(PlatformError::Unsupported),
            SimulatedOutcome::Fail(reason) => Err(PlatformError::Transport(reason.clone())),
        }
    }

    fn create_recorder(
        &self,
        _stream: &mut dyn MediaStream,
        options: &RecorderOptions,
    ) -> Result<RecorderHandle, PlatformError> {
        if let SimulatedOutcome::RecorderFails(reason) = &self.outcome {
            return Err(PlatformError::Transport(reason.clone()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let recorder = SimulatedRecorder {
            tx: tx.clone(),
            mime_type: options
                .mime_type
                .clone()
                .unwrap_or_else(|| SIMULATED_DEFAULT_MIME.to_string()),
            final_chunk: self.final_chunk.clone(),
            stopped: false,
        };

        let mut state = self.lock();
        state.feed = Some(SimulatedFeed { tx });
        state.last_options = Some(options.clone());

        Ok(RecorderHandle {
            recorder: Box::new(recorder),
            events: rx,
        })
    }
}
