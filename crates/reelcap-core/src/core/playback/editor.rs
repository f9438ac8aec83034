//! Editor Session
//!
//! Explicit context object for one editing session. Owns playback state,
//! timeline durations, the scrubber and the resource slots; anything that
//! reads or writes those receives the session instead of reaching for a
//! process-wide store.

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::{debug, info, warn};

use crate::core::resource::{ResourceGuard, ResourceRef, ResourceRegistry, Slot};
use crate::core::settings::AppSettings;
use crate::core::timeline::{
    format_time, DurationReconciler, PointerEvent, ProgressView, ScrubAction, ScrubberModel,
};
use crate::core::{sanitize_time, CoreResult, MediaBlob, TimeSec};

use super::PlaybackState;

/// Source for the background-image slot
#[derive(Clone, Debug, PartialEq)]
pub enum BackgroundSource {
    /// Local image data, turned into a revocable reference
    Blob(MediaBlob),
    /// Remote image, used as-is
    Url(String),
}

/// Serializable view of the session for the frontend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub playback: PlaybackState,
    pub source: Option<ResourceRef>,
    pub background: Option<ResourceRef>,
    pub video_duration: TimeSec,
    pub effective_duration: TimeSec,
    pub time_label: String,
    pub duration_label: String,
}

/// State of one editing session
pub struct EditorSession<R: ResourceRegistry> {
    playback: PlaybackState,
    durations: DurationReconciler,
    scrubber: ScrubberModel,
    resources: ResourceGuard<R>,
    seek_step: TimeSec,
}

impl<R: ResourceRegistry> EditorSession<R> {
    /// Creates a session configured from `settings`
    pub fn new(settings: &AppSettings, registry: R) -> Self {
        Self {
            playback: PlaybackState::new(),
            durations: DurationReconciler::new(settings.timeline.min_timeline_duration_sec),
            scrubber: ScrubberModel::new(0.0),
            resources: ResourceGuard::new(registry),
            seek_step: settings.playback.seek_step_sec,
        }
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn durations(&self) -> &DurationReconciler {
        &self.durations
    }

    pub fn scrubber(&self) -> &ScrubberModel {
        &self.scrubber
    }

    pub fn resources(&self) -> &ResourceGuard<R> {
        &self.resources
    }

    /// Whether the playback slot holds a source
    pub fn has_media(&self) -> bool {
        self.resources.current(Slot::Playback).is_some()
    }

    pub fn effective_duration(&self) -> TimeSec {
        self.durations.effective_duration()
    }

    // =========================================================================
    // Sources
    // =========================================================================

    /// Installs a finished recording as the playback source
    pub fn install_capture(&mut self, blob: MediaBlob) -> CoreResult<ResourceRef> {
        info!("Installing capture ({} bytes) as playback source", blob.len());
        self.install_source(blob)
    }

    /// Loads a user-selected local file as the playback source
    pub fn load_file(&mut self, blob: MediaBlob) -> CoreResult<ResourceRef> {
        info!("Loading local file ({}) as playback source", blob.mime_type);
        self.install_source(blob)
    }

    /// Uses a remote URL as the playback source.
    ///
    /// Loading the current source again changes nothing: the media element
    /// will not reload it, so no new metadata would clear a pending duration.
    pub fn load_external(&mut self, url: impl Into<String>) -> ResourceRef {
        let reference = ResourceRef::classify(url);
        if self.resources.current(Slot::Playback) == Some(&reference) {
            debug!("Playback source {} already loaded", reference.url());
            return reference;
        }

        self.resources
            .replace(Slot::Playback, Some(reference.clone()));
        self.on_new_source();
        reference
    }

    fn install_source(&mut self, blob: MediaBlob) -> CoreResult<ResourceRef> {
        let reference = self.resources.install(Slot::Playback, blob)?;
        self.on_new_source();
        Ok(reference)
    }

    /// The new source's length is unknown until its metadata arrives
    fn on_new_source(&mut self) {
        self.playback.rewind_for_new_source();
        self.durations.set_video_duration(0.0);
    }

    /// Sets or clears the background image
    pub fn set_background_image(
        &mut self,
        source: Option<BackgroundSource>,
    ) -> CoreResult<Option<ResourceRef>> {
        match source {
            Some(BackgroundSource::Blob(blob)) => {
                let reference = self.resources.install(Slot::BackgroundImage, blob)?;
                Ok(Some(reference))
            }
            Some(BackgroundSource::Url(url)) => {
                let reference = ResourceRef::classify(url);
                self.resources
                    .replace(Slot::BackgroundImage, Some(reference.clone()));
                Ok(Some(reference))
            }
            None => {
                self.resources.release(Slot::BackgroundImage);
                Ok(None)
            }
        }
    }

    /// Releases the playback source and resets durations to the floor
    pub fn clear(&mut self) {
        self.resources.release(Slot::Playback);
        self.durations.reset();
        self.playback.clear();
        info!("Editor session cleared");
    }

    // =========================================================================
    // Media Element Callbacks
    // =========================================================================

    /// Media element reported its duration.
    ///
    /// Recorder output without a duration header reports `Infinity`; that
    /// leaves the duration pending until a later callback has a real value.
    pub fn on_metadata_loaded(&mut self, duration: TimeSec) {
        let duration_sec = sanitize_time(duration);
        if duration_sec == 0.0 {
            warn!(
                "Metadata reported unusable duration {}, keeping duration pending",
                duration
            );
            return;
        }

        self.durations.set_video_duration(duration_sec);
        self.durations.ensure_timeline_covers(duration_sec);
        self.playback.duration_pending = false;
        debug!(
            "Metadata loaded: video {:.3}s, timeline {:.3}s",
            duration_sec,
            self.durations.effective_duration()
        );
    }

    /// Media element advanced its playhead during playback
    pub fn on_time_update(&mut self, current_time: TimeSec) {
        if self.scrubber.is_dragging() {
            // The drag owns the playhead
            return;
        }
        self.playback.current_time = self.clamp_time(current_time);
    }

    /// Media element reached its end
    pub fn on_ended(&mut self) {
        self.playback.is_playing = false;
    }

    // =========================================================================
    // Timeline Edits
    // =========================================================================

    /// Sets the authored timeline length (e.g. after adding trailing blocks)
    pub fn set_timeline_duration(&mut self, requested: TimeSec) {
        self.durations.set_timeline_duration(requested);
        self.playback.current_time = self.clamp_time(self.playback.current_time);
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Moves the playhead, clamped to the effective duration
    pub fn seek(&mut self, time: TimeSec) -> TimeSec {
        self.playback.current_time = self.clamp_time(time);
        self.playback.current_time
    }

    /// Moves the playhead by `steps` configured seek steps (negative = back)
    pub fn nudge(&mut self, steps: f64) -> TimeSec {
        self.seek(self.playback.current_time + steps * self.seek_step)
    }

    /// Starts playback if there is something to play
    pub fn play(&mut self) -> bool {
        if !self.has_media() {
            debug!("Ignoring play request without a source");
            return false;
        }
        self.playback.is_playing = true;
        true
    }

    pub fn pause(&mut self) {
        self.playback.is_playing = false;
    }

    /// Toggles playback and returns the new playing state
    pub fn toggle_playback(&mut self) -> bool {
        if self.playback.is_playing {
            self.pause();
            false
        } else {
            self.play()
        }
    }

    fn clamp_time(&self, time: TimeSec) -> TimeSec {
        sanitize_time(time).min(self.durations.effective_duration())
    }

    // =========================================================================
    // Scrubber
    // =========================================================================

    /// Updates the scrubber track width after layout
    pub fn set_track_width(&mut self, width: f64) {
        self.scrubber.set_track_width(width);
    }

    /// Routes a pointer event through the scrubber and seeks accordingly
    pub fn scrub(&mut self, event: PointerEvent) -> ScrubAction {
        let action = self.scrubber.handle(event, self.durations.effective_duration());
        if let ScrubAction::Seek { time } = action {
            self.seek(time);
        }
        action
    }

    /// Progress bar geometry for the current playhead
    pub fn progress_view(&self) -> ProgressView {
        self.scrubber.view(
            self.playback.current_time,
            self.durations.effective_duration(),
        )
    }

    // =========================================================================
    // Display
    // =========================================================================

    /// Playhead label, `--:--` at position 0 until the media length is known
    pub fn time_label(&self) -> String {
        format_time(self.playback.current_time, self.media_duration_known())
    }

    /// Media length label, `--:--` until a duration is known
    pub fn duration_label(&self) -> String {
        format_time(self.durations.video_duration(), self.media_duration_known())
    }

    /// A loaded source only counts for display once its metadata arrived
    fn media_duration_known(&self) -> bool {
        self.durations.video_duration() > 0.0
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            playback: self.playback.clone(),
            source: self.resources.current(Slot::Playback).cloned(),
            background: self.resources.current(Slot::BackgroundImage).cloned(),
            video_duration: self.durations.video_duration(),
            effective_duration: self.durations.effective_duration(),
            time_label: self.time_label(),
            duration_label: self.duration_label(),
        }
    }
}
