//! End-to-end capture flow against the simulated platform: record, finalize,
//! load metadata, scrub, then record again and check the old reference is gone.

use std::sync::Arc;

use reelcap_core::core::capture::{CaptureController, CaptureStatus, SimulatedPlatform};
use reelcap_core::core::playback::EditorSession;
use reelcap_core::core::resource::{InMemoryRegistry, Slot};
use reelcap_core::core::settings::{AppSettings, SettingsManager};
use reelcap_core::core::timeline::{PointerEvent, PointerTarget, ScrubAction};
use reelcap_core::CoreError;

#[tokio::test]
async fn test_record_scrub_and_rerecord() {
    let dir = tempfile::tempdir().unwrap();
    let manager = SettingsManager::new(dir.path());
    let settings: AppSettings = manager.load();

    let registry = InMemoryRegistry::new();
    let mut editor = EditorSession::new(&settings, registry.clone());
    let platform = Arc::new(SimulatedPlatform::new());
    let mut controller = CaptureController::new(platform.clone(), settings.capture.clone());

    assert_eq!(editor.time_label(), "--:--");
    assert_eq!(editor.effective_duration(), 10.0);

    // First recording, ended from the OS "Stop sharing" button
    controller.start().await.unwrap();
    let feed = platform.feed().unwrap();
    feed.push_chunk(vec![0x1A, 0x45]);
    feed.push_chunk(vec![0xDF]);
    feed.push_chunk(vec![0xA3]);
    feed.end_track();

    let first = controller.run(&mut editor).await.unwrap();
    assert_eq!(first.chunk_count, 3);
    assert_eq!(
        registry.resolve(first.reference.url()).unwrap().data,
        vec![0x1A, 0x45, 0xDF, 0xA3]
    );
    assert!(editor.playback().duration_pending);
    assert_eq!(editor.time_label(), "--:--");
    assert_eq!(editor.duration_label(), "--:--");

    // Recorder output reports Infinity before the real value arrives
    editor.on_metadata_loaded(f64::INFINITY);
    assert!(editor.playback().duration_pending);
    editor.on_metadata_loaded(14.5);
    assert!(!editor.playback().duration_pending);
    assert_eq!(editor.effective_duration(), 14.5);
    assert_eq!(editor.duration_label(), "00:14.50");

    // Drag the handle to the middle of a 200px track
    editor.set_track_width(200.0);
    editor.scrub(PointerEvent::Down {
        x: 180.0,
        target: PointerTarget::Handle,
    });
    let action = editor.scrub(PointerEvent::Move { x: 100.0 });
    assert_eq!(action, ScrubAction::Seek { time: 7.25 });
    editor.on_time_update(3.0);
    assert_eq!(editor.playback().current_time, 7.25);
    editor.scrub(PointerEvent::Up { x: 100.0 });
    assert_eq!(editor.time_label(), "00:07.25");

    let view = editor.progress_view();
    assert!(view.visible);
    assert_eq!(view.handle_offset_px, 100.0);

    // Second recording replaces the first and revokes its reference
    controller.start().await.unwrap();
    platform.feed().unwrap().push_chunk(vec![0x42]);
    assert!(controller.stop_handle().unwrap().stop());
    let second = controller.run(&mut editor).await.unwrap();

    assert_ne!(first.reference, second.reference);
    assert!(registry.resolve(first.reference.url()).is_none());
    assert_eq!(registry.revoked(), vec![first.reference.url().to_string()]);
    assert_eq!(registry.live_count(), 1);
    assert_eq!(editor.playback().current_time, 0.0);
    assert_eq!(editor.resources().current(Slot::Playback), Some(&second.reference));
    assert_eq!(controller.status(), CaptureStatus::Idle);

    // Closing the editor releases the last reference
    drop(editor);
    assert_eq!(registry.live_count(), 0);
}

#[tokio::test]
async fn test_failed_rerecord_keeps_previous_source() {
    let registry = InMemoryRegistry::new();
    let mut editor = EditorSession::new(&AppSettings::default(), registry.clone());
    let platform = Arc::new(SimulatedPlatform::new());
    let mut controller =
        CaptureController::new(platform.clone(), AppSettings::default().capture);

    controller.start().await.unwrap();
    platform.feed().unwrap().push_chunk(vec![1, 2, 3]);
    controller.stop().unwrap();
    let first = controller.process_pending(&mut editor).unwrap().unwrap();

    controller.start().await.unwrap();
    let feed = platform.feed().unwrap();
    feed.push_chunk(vec![9]);
    feed.fail("track muted");

    let err = controller.run(&mut editor).await.unwrap_err();
    assert!(matches!(err, CoreError::CaptureFailed(_)));

    assert_eq!(editor.resources().current(Slot::Playback), Some(&first.reference));
    assert_eq!(registry.live_count(), 1);
    assert!(registry.revoked().is_empty());
}
