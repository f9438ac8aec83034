//! Capture Session Controller
//!
//! Drives `Idle → Requesting → Recording → Finalizing → Idle`.
//!
//! Recorder output arrives as a channel of [`RecorderEvent`]s. The controller
//! consumes that channel either cooperatively ([`CaptureController::process_pending`])
//! or by awaiting it ([`CaptureController::run`]); in both cases the
//! Recording → Finalizing step happens in exactly one place.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use specta::Type;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::platform::{CapturePlatform, DisplayConstraints, RecorderEvent, RecorderOptions};
use super::session::{CaptureSession, CaptureSnapshot, CaptureStatus};
use crate::core::playback::EditorSession;
use crate::core::resource::{ResourceRef, ResourceRegistry};
use crate::core::settings::CaptureSettings;
use crate::core::{CoreError, CoreResult, SessionId, TimeSec};

// =============================================================================
// Results & Handles
// =============================================================================

/// A recording that made it into the playback slot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedCapture {
    pub session_id: SessionId,
    /// Playback reference created from the recording
    pub reference: ResourceRef,
    pub mime_type: String,
    pub chunk_count: usize,
    pub byte_count: usize,
    /// Wall-clock recording length; the media duration arrives with metadata
    pub recorded_sec: TimeSec,
}

/// Requests a stop of one specific session from outside the controller
#[derive(Clone, Debug)]
pub struct StopHandle {
    session_id: SessionId,
    tx: mpsc::UnboundedSender<SessionId>,
}

impl StopHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Requests the stop; returns false if the controller is gone
    pub fn stop(&self) -> bool {
        self.tx.send(self.session_id.clone()).is_ok()
    }
}

/// Resets the status to Idle unless committed; covers early returns and
/// a `start()` future dropped while the permission prompt is open.
struct StatusRollback<'a> {
    status: &'a watch::Sender<CaptureStatus>,
    armed: bool,
}

impl<'a> StatusRollback<'a> {
    fn new(status: &'a watch::Sender<CaptureStatus>) -> Self {
        Self {
            status,
            armed: true,
        }
    }

    fn commit(mut self, next: CaptureStatus) {
        self.armed = false;
        self.status.send_replace(next);
    }
}

impl Drop for StatusRollback<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.status.send_replace(CaptureStatus::Idle);
        }
    }
}

enum Wake {
    Stop(SessionId),
    Event(Option<RecorderEvent>),
}

// =============================================================================
// Controller
// =============================================================================

/// Screen capture state machine. One session at a time.
pub struct CaptureController<P: CapturePlatform> {
    platform: Arc<P>,
    settings: CaptureSettings,
    status: watch::Sender<CaptureStatus>,
    session: Option<CaptureSession>,
    stop_tx: mpsc::UnboundedSender<SessionId>,
    stop_rx: mpsc::UnboundedReceiver<SessionId>,
}

impl<P: CapturePlatform> CaptureController<P> {
    pub fn new(platform: Arc<P>, settings: CaptureSettings) -> Self {
        let (status, _) = watch::channel(CaptureStatus::Idle);
        let (stop_tx, stop_rx) = mpsc::unbounded_channel();
        Self {
            platform,
            settings,
            status,
            session: None,
            stop_tx,
            stop_rx,
        }
    }

    pub fn status(&self) -> CaptureStatus {
        *self.status.borrow()
    }

    /// Subscribes to status changes
    pub fn watch_status(&self) -> watch::Receiver<CaptureStatus> {
        self.status.subscribe()
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        match &self.session {
            Some(session) => session.snapshot(self.status()),
            None => CaptureSnapshot::idle(self.status()),
        }
    }

    /// Handle that can stop the active session while [`Self::run`] is awaiting
    pub fn stop_handle(&self) -> Option<StopHandle> {
        self.session.as_ref().map(|session| StopHandle {
            session_id: session.id().to_string(),
            tx: self.stop_tx.clone(),
        })
    }

    /// First configured MIME type the platform can record
    pub fn negotiate_mime_type(&self) -> Option<String> {
        let chosen = self
            .settings
            .mime_type_candidates
            .iter()
            .find(|candidate| self.platform.is_mime_type_supported(candidate))
            .cloned();

        if chosen.is_none() {
            warn!("No configured recorder MIME type is supported, using platform default");
        }
        chosen
    }

    /// Requests a screen capture stream and starts recording it.
    ///
    /// Stays in Requesting while the permission prompt is open. Any failure
    /// leaves the controller Idle without a session.
    pub async fn start(&mut self) -> CoreResult<SessionId> {
        let status = self.status();
        if status != CaptureStatus::Idle {
            warn!("Rejected capture start while {:?}", status);
            return Err(CoreError::SessionAlreadyActive);
        }

        let constraints = DisplayConstraints::from_settings(&self.settings);
        let options = RecorderOptions {
            mime_type: self.negotiate_mime_type(),
            timeslice_ms: self.settings.timeslice_ms,
        };
        let platform = Arc::clone(&self.platform);

        self.status.send_replace(CaptureStatus::Requesting);
        let rollback = StatusRollback::new(&self.status);

        if !platform.supports_display_capture() {
            warn!("Display capture is not supported on this platform");
            return Err(CoreError::CaptureUnsupported);
        }

        info!("Requesting display capture ({:?})", constraints);
        let mut stream = platform
            .request_display_media(&constraints)
            .await
            .map_err(|e| {
                warn!("Display capture request failed: {}", e);
                CoreError::from(e)
            })?;

        let handle = match platform.create_recorder(stream.as_mut(), &options) {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to create recorder for stream {}: {}", stream.id(), e);
                stream.stop_tracks();
                return Err(CoreError::CaptureFailed(e.to_string()));
            }
        };

        let stream_id = stream.id();
        let session = CaptureSession::new(stream, handle);
        let session_id = session.id().to_string();
        info!(
            "Recording session {} on stream {} ({}, timeslice {}ms)",
            session_id,
            stream_id,
            session.mime_type(),
            options.timeslice_ms
        );

        self.session = Some(session);
        rollback.commit(CaptureStatus::Recording);
        Ok(session_id)
    }

    /// Requests the recorder stop. Finalization follows on the recorder's
    /// stop event. Returns false when nothing is recording.
    pub fn stop(&mut self) -> CoreResult<bool> {
        if self.status() != CaptureStatus::Recording {
            debug!("Stop requested while {:?}, ignoring", self.status());
            return Ok(false);
        }
        self.request_stop()
    }

    fn request_stop(&mut self) -> CoreResult<bool> {
        let Some(session) = self.session.as_mut() else {
            return Ok(false);
        };

        match session.request_stop() {
            Ok(requested) => {
                if requested {
                    info!("Stop requested for session {}", session.id());
                }
                Ok(requested)
            }
            Err(e) => {
                let reason = format!("recorder refused to stop: {}", e);
                self.abort(&reason);
                Err(CoreError::CaptureFailed(reason))
            }
        }
    }

    /// Applies every event already queued without waiting.
    ///
    /// Returns the finalized capture if the recorder's stop event was among
    /// them.
    pub fn process_pending<R: ResourceRegistry>(
        &mut self,
        editor: &mut EditorSession<R>,
    ) -> CoreResult<Option<FinalizedCapture>> {
        while let Ok(session_id) = self.stop_rx.try_recv() {
            self.on_stop_request(session_id)?;
        }

        loop {
            let Some(session) = self.session.as_mut() else {
                return Ok(None);
            };

            let event = match session.events.try_recv() {
                Ok(event) => Some(event),
                Err(mpsc::error::TryRecvError::Empty) => return Ok(None),
                Err(mpsc::error::TryRecvError::Disconnected) => None,
            };

            if let Some(finalized) = self.on_event(event, editor)? {
                return Ok(Some(finalized));
            }
        }
    }

    /// Awaits recorder events until the active session is finalized
    pub async fn run<R: ResourceRegistry>(
        &mut self,
        editor: &mut EditorSession<R>,
    ) -> CoreResult<FinalizedCapture> {
        loop {
            let wake = {
                let Some(session) = self.session.as_mut() else {
                    return Err(CoreError::NoActiveSession);
                };
                let stop_rx = &mut self.stop_rx;

                tokio::select! {
                    biased;
                    Some(session_id) = stop_rx.recv() => Wake::Stop(session_id),
                    event = session.events.recv() => Wake::Event(event),
                }
            };

            match wake {
                Wake::Stop(session_id) => self.on_stop_request(session_id)?,
                Wake::Event(event) => {
                    if let Some(finalized) = self.on_event(event, editor)? {
                        return Ok(finalized);
                    }
                }
            }
        }
    }

    fn on_stop_request(&mut self, session_id: SessionId) -> CoreResult<()> {
        let is_current = self
            .session
            .as_ref()
            .is_some_and(|session| session.id() == session_id);

        if is_current {
            self.request_stop()?;
        } else {
            debug!("Ignoring stop request for stale session {}", session_id);
        }
        Ok(())
    }

    /// `None` means the recorder's channel closed
    fn on_event<R: ResourceRegistry>(
        &mut self,
        event: Option<RecorderEvent>,
        editor: &mut EditorSession<R>,
    ) -> CoreResult<Option<FinalizedCapture>> {
        let Some(session) = self.session.as_mut() else {
            return Err(CoreError::NoActiveSession);
        };

        match event {
            Some(RecorderEvent::Chunk(data)) => {
                // Recorders emit empty dataavailable events between slices
                if !data.is_empty() {
                    session.push_chunk(data);
                }
                Ok(None)
            }
            Some(RecorderEvent::TrackEnded) => {
                info!("Session {}: capture track ended", session.id());
                self.request_stop()?;
                Ok(None)
            }
            Some(RecorderEvent::Stopped) => self.finalize(editor).map(Some),
            Some(RecorderEvent::Error(reason)) => {
                self.abort(&reason);
                Err(CoreError::CaptureFailed(reason))
            }
            None => {
                let reason = "recorder event channel closed".to_string();
                self.abort(&reason);
                Err(CoreError::CaptureFailed(reason))
            }
        }
    }

    fn finalize<R: ResourceRegistry>(
        &mut self,
        editor: &mut EditorSession<R>,
    ) -> CoreResult<FinalizedCapture> {
        let Some(mut session) = self.session.take() else {
            return Err(CoreError::NoActiveSession);
        };
        self.status.send_replace(CaptureStatus::Finalizing);

        session.stop_tracks();
        let session_id = session.id().to_string();
        let mime_type = session.mime_type().to_string();
        let chunk_count = session.chunk_count();
        let recorded_sec = session.elapsed_sec();
        let blob = session.take_blob();
        drop(session);

        if blob.is_empty() {
            self.status.send_replace(CaptureStatus::Idle);
            warn!("Session {} produced no data, discarding", session_id);
            return Err(CoreError::CaptureFailed(
                "recording produced no data".to_string(),
            ));
        }

        let byte_count = blob.len();
        let installed = editor.install_capture(blob);
        self.status.send_replace(CaptureStatus::Idle);
        let reference = installed?;

        info!(
            "Session {} finalized: {} chunks, {} bytes -> {}",
            session_id,
            chunk_count,
            byte_count,
            reference.url()
        );

        Ok(FinalizedCapture {
            session_id,
            reference,
            mime_type,
            chunk_count,
            byte_count,
            recorded_sec,
        })
    }

    fn abort(&mut self, reason: &str) {
        if let Some(mut session) = self.session.take() {
            error!(
                "Session {} aborted after {} chunks: {}",
                session.id(),
                session.chunk_count(),
                reason
            );
            session.discard();
        }
        self.status.send_replace(CaptureStatus::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::capture::{SimulatedOutcome, SimulatedPlatform};
    use crate::core::resource::{InMemoryRegistry, Slot};
    use crate::core::settings::AppSettings;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn editor() -> (InMemoryRegistry, EditorSession<InMemoryRegistry>) {
        let registry = InMemoryRegistry::new();
        let editor = EditorSession::new(&AppSettings::default(), registry.clone());
        (registry, editor)
    }

    fn controller(platform: SimulatedPlatform) -> (Arc<SimulatedPlatform>, CaptureController<SimulatedPlatform>) {
        let platform = Arc::new(platform);
        let controller = CaptureController::new(platform.clone(), CaptureSettings::default());
        (platform, controller)
    }

    #[tokio::test]
    async fn test_start_moves_to_recording() {
        let (platform, mut controller) = controller(SimulatedPlatform::new());

        let session_id = controller.start().await.unwrap();

        assert_eq!(controller.status(), CaptureStatus::Recording);
        assert_eq!(controller.snapshot().session_id, Some(session_id));
        assert_eq!(platform.request_count(), 1);
    }

    #[tokio::test]
    async fn test_negotiates_first_supported_mime_type() {
        let platform = SimulatedPlatform::new().with_supported_mime_types(["video/webm;codecs=vp8"]);
        let (platform, mut controller) = controller(platform);

        controller.start().await.unwrap();

        let options = platform.last_recorder_options().unwrap();
        assert_eq!(options.mime_type.as_deref(), Some("video/webm;codecs=vp8"));
        assert_eq!(options.timeslice_ms, 1000);
    }

    #[tokio::test]
    async fn test_falls_back_to_platform_default_mime_type() {
        let platform = SimulatedPlatform::new().with_supported_mime_types(Vec::<String>::new());
        let (platform, mut controller) = controller(platform);
        let (_registry, mut editor) = editor();

        controller.start().await.unwrap();
        assert_eq!(platform.last_recorder_options().unwrap().mime_type, None);

        let feed = platform.feed().unwrap();
        feed.push_chunk(vec![1]);
        controller.stop().unwrap();
        let finalized = controller.process_pending(&mut editor).unwrap().unwrap();
        assert_eq!(finalized.mime_type, "video/webm");
    }

    #[tokio::test]
    async fn test_unsupported_platform() {
        let (platform, mut controller) =
            controller(SimulatedPlatform::new().with_outcome(SimulatedOutcome::Unsupported));

        let result = controller.start().await;

        assert!(matches!(result, Err(CoreError::CaptureUnsupported)));
        assert_eq!(controller.status(), CaptureStatus::Idle);
        assert_eq!(platform.request_count(), 0);
    }

    #[tokio::test]
    async fn test_permission_denied_returns_to_idle() {
        let (_platform, mut controller) = controller(
            SimulatedPlatform::new().with_outcome(SimulatedOutcome::Deny("NotAllowedError".into())),
        );

        let result = controller.start().await;

        assert!(matches!(result, Err(CoreError::PermissionDenied(_))));
        assert_eq!(controller.status(), CaptureStatus::Idle);
        assert!(controller.stop_handle().is_none());
    }

    #[tokio::test]
    async fn test_user_cancel_can_retry() {
        let (_platform, mut controller) =
            controller(SimulatedPlatform::new().with_outcome(SimulatedOutcome::Cancel));

        let err = controller.start().await.unwrap_err();
        assert!(matches!(err, CoreError::UserCancelled));
        assert!(err.is_recoverable());

        // Idle again, so a retry is accepted (and cancelled again)
        assert!(matches!(
            controller.start().await,
            Err(CoreError::UserCancelled)
        ));
    }

    #[tokio::test]
    async fn test_request_failure_reports_capture_failed() {
        let (_platform, mut controller) = controller(
            SimulatedPlatform::new().with_outcome(SimulatedOutcome::Fail("NotReadableError".into())),
        );

        let result = controller.start().await;

        assert!(matches!(result, Err(CoreError::CaptureFailed(reason)) if reason == "NotReadableError"));
        assert_eq!(controller.status(), CaptureStatus::Idle);
    }

    #[tokio::test]
    async fn test_recorder_failure_releases_stream() {
        let (platform, mut controller) = controller(
            SimulatedPlatform::new()
                .with_outcome(SimulatedOutcome::RecorderFails("no encoder".into())),
        );

        let result = controller.start().await;

        assert!(matches!(result, Err(CoreError::CaptureFailed(_))));
        assert_eq!(controller.status(), CaptureStatus::Idle);
        assert!(platform.tracks_stopped());
    }

    #[tokio::test]
    async fn test_stays_requesting_while_prompt_open() {
        let gate = Arc::new(Notify::new());
        let (_platform, mut controller) =
            controller(SimulatedPlatform::new().with_permission_gate(gate.clone()));
        let status = controller.watch_status();

        {
            let start = controller.start();
            tokio::pin!(start);

            let pending = tokio::time::timeout(Duration::from_millis(20), &mut start).await;
            assert!(pending.is_err());
            assert_eq!(*status.borrow(), CaptureStatus::Requesting);

            gate.notify_one();
            start.await.unwrap();
        }

        assert_eq!(controller.status(), CaptureStatus::Recording);
    }

    #[tokio::test]
    async fn test_abandoned_request_rolls_back_to_idle() {
        let gate = Arc::new(Notify::new());
        let (_platform, mut controller) =
            controller(SimulatedPlatform::new().with_permission_gate(gate));

        let abandoned = tokio::time::timeout(Duration::from_millis(20), controller.start()).await;

        assert!(abandoned.is_err());
        assert_eq!(controller.status(), CaptureStatus::Idle);
    }

    #[tokio::test]
    async fn test_start_while_recording_is_rejected() {
        let (platform, mut controller) = controller(SimulatedPlatform::new());
        let (_registry, mut editor) = editor();

        controller.start().await.unwrap();
        let feed = platform.feed().unwrap();
        feed.push_chunk(vec![1]);
        feed.push_chunk(vec![2]);
        controller.process_pending(&mut editor).unwrap();
        assert_eq!(controller.snapshot().chunk_count, 2);

        let result = controller.start().await;

        assert!(matches!(result, Err(CoreError::SessionAlreadyActive)));
        assert_eq!(controller.status(), CaptureStatus::Recording);
        assert_eq!(controller.snapshot().chunk_count, 2);
        assert_eq!(platform.request_count(), 1);
    }

    #[tokio::test]
    async fn test_track_ended_finalizes_three_chunks_in_order() {
        let (platform, mut controller) = controller(SimulatedPlatform::new());
        let (registry, mut editor) = editor();

        let previous = editor
            .load_file(crate::core::MediaBlob::new("video/mp4", vec![0xFF]))
            .unwrap();

        controller.start().await.unwrap();
        let feed = platform.feed().unwrap();
        feed.push_chunk(vec![1, 2]);
        feed.push_chunk(vec![3]);
        feed.push_chunk(vec![4, 5]);
        feed.end_track();

        let finalized = controller.run(&mut editor).await.unwrap();

        assert_eq!(controller.status(), CaptureStatus::Idle);
        assert_eq!(finalized.chunk_count, 3);
        assert_eq!(finalized.byte_count, 5);
        assert_eq!(
            registry.resolve(finalized.reference.url()).unwrap().data,
            vec![1, 2, 3, 4, 5]
        );
        assert_eq!(registry.created_count(), 2);
        assert_eq!(registry.revoked(), vec![previous.url().to_string()]);
        assert_eq!(
            editor.resources().current(Slot::Playback),
            Some(&finalized.reference)
        );
        assert!(platform.tracks_stopped());
    }

    #[tokio::test]
    async fn test_finalize_resets_playback() {
        let (platform, mut controller) = controller(SimulatedPlatform::new());
        let (_registry, mut editor) = editor();
        editor.load_file(crate::core::MediaBlob::new("video/mp4", vec![9])).unwrap();
        editor.on_metadata_loaded(30.0);
        editor.seek(12.0);

        controller.start().await.unwrap();
        platform.feed().unwrap().push_chunk(vec![1]);
        controller.stop().unwrap();
        controller.process_pending(&mut editor).unwrap().unwrap();

        assert_eq!(editor.playback().current_time, 0.0);
        assert!(editor.playback().duration_pending);
        assert_eq!(editor.durations().video_duration(), 0.0);
    }

    #[tokio::test]
    async fn test_stop_handle_stops_running_session() {
        let (platform, mut controller) =
            controller(SimulatedPlatform::new().with_final_chunk(vec![7, 7]));
        let (registry, mut editor) = editor();

        controller.start().await.unwrap();
        let handle = controller.stop_handle().unwrap();
        platform.feed().unwrap().push_chunk(vec![1]);

        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            handle.stop()
        });

        let finalized = controller.run(&mut editor).await.unwrap();
        assert!(stopper.await.unwrap());

        assert_eq!(finalized.chunk_count, 2);
        assert_eq!(
            registry.resolve(finalized.reference.url()).unwrap().data,
            vec![1, 7, 7]
        );
    }

    #[tokio::test]
    async fn test_stale_stop_handle_is_ignored() {
        let (platform, mut controller) = controller(SimulatedPlatform::new());
        let (_registry, mut editor) = editor();

        controller.start().await.unwrap();
        let stale = controller.stop_handle().unwrap();
        platform.feed().unwrap().push_chunk(vec![1]);
        controller.stop().unwrap();
        controller.process_pending(&mut editor).unwrap().unwrap();

        controller.start().await.unwrap();
        stale.stop();
        platform.feed().unwrap().push_chunk(vec![2]);
        assert!(controller.process_pending(&mut editor).unwrap().is_none());
        assert_eq!(controller.status(), CaptureStatus::Recording);
    }

    #[tokio::test]
    async fn test_transport_error_discards_chunks() {
        let (platform, mut controller) = controller(SimulatedPlatform::new());
        let (registry, mut editor) = editor();

        controller.start().await.unwrap();
        let feed = platform.feed().unwrap();
        feed.push_chunk(vec![1]);
        feed.push_chunk(vec![2]);
        feed.fail("encoder crashed");

        let result = controller.run(&mut editor).await;

        assert!(matches!(result, Err(CoreError::CaptureFailed(reason)) if reason == "encoder crashed"));
        assert_eq!(controller.status(), CaptureStatus::Idle);
        assert_eq!(controller.snapshot().chunk_count, 0);
        assert_eq!(registry.created_count(), 0);
        assert!(!editor.has_media());
        assert!(platform.tracks_stopped());
    }

    #[tokio::test]
    async fn test_empty_recording_is_discarded() {
        let (platform, mut controller) = controller(SimulatedPlatform::new());
        let (registry, mut editor) = editor();

        controller.start().await.unwrap();
        platform.feed().unwrap().push_chunk(Vec::new());
        controller.stop().unwrap();

        let result = controller.process_pending(&mut editor);

        assert!(matches!(result, Err(CoreError::CaptureFailed(_))));
        assert_eq!(controller.status(), CaptureStatus::Idle);
        assert_eq!(registry.created_count(), 0);
    }

    #[tokio::test]
    async fn test_reference_creation_failure_keeps_previous_source() {
        let registry = InMemoryRegistry::new().with_byte_limit(4);
        let mut editor = EditorSession::new(&AppSettings::default(), registry.clone());
        let previous = editor
            .load_file(crate::core::MediaBlob::new("video/mp4", vec![1, 2, 3]))
            .unwrap();
        editor.on_metadata_loaded(8.0);

        let (platform, mut controller) = controller(SimulatedPlatform::new());
        controller.start().await.unwrap();
        platform.feed().unwrap().push_chunk(vec![4, 5]);
        controller.stop().unwrap();

        let result = controller.process_pending(&mut editor);

        assert!(matches!(result, Err(CoreError::ResourceCreateFailed(_))));
        assert_eq!(controller.status(), CaptureStatus::Idle);
        assert_eq!(editor.resources().current(Slot::Playback), Some(&previous));
        assert!(!editor.playback().duration_pending);
        assert!(registry.revoked().is_empty());
        assert!(platform.tracks_stopped());
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let (_platform, mut controller) = controller(SimulatedPlatform::new());
        assert!(!controller.stop().unwrap());
        assert_eq!(controller.status(), CaptureStatus::Idle);
    }

    #[tokio::test]
    async fn test_run_without_session() {
        let (_platform, mut controller) = controller(SimulatedPlatform::new());
        let (_registry, mut editor) = editor();

        assert!(matches!(
            controller.run(&mut editor).await,
            Err(CoreError::NoActiveSession)
        ));
    }

    #[tokio::test]
    async fn test_repeated_recordings_keep_one_live_reference() {
        let (platform, mut controller) = controller(SimulatedPlatform::new());
        let (registry, mut editor) = editor();

        for i in 0..4u8 {
            controller.start().await.unwrap();
            platform.feed().unwrap().push_chunk(vec![i]);
            controller.stop().unwrap();
            controller.process_pending(&mut editor).unwrap().unwrap();
        }

        assert_eq!(registry.created_count(), 4);
        assert_eq!(registry.revoked().len(), 3);
        assert_eq!(registry.live_count(), 1);
    }
}
