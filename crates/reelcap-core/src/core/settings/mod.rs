//! Settings Persistence System
//!
//! Provides persistent engine settings with:
//! - Atomic file writes (temp file + rename)
//! - Schema validation with defaults
//! - Migration support for schema changes
//!
//! Storage location: {config_dir}/reelcap/settings.json

use serde::{Deserialize, Serialize};
use specta::Type;
use std::fs;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::timeline::DEFAULT_MIN_TIMELINE_DURATION;
use crate::core::{CoreError, CoreResult, TimeSec};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Application directory name under the platform config dir
pub const APP_DIR_NAME: &str = "reelcap";

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Screen capture settings
    #[serde(default)]
    pub capture: CaptureSettings,

    /// Timeline settings
    #[serde(default)]
    pub timeline: TimelineSettings,

    /// Playback control settings
    #[serde(default)]
    pub playback: PlaybackSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            capture: CaptureSettings::default(),
            timeline: TimelineSettings::default(),
            playback: PlaybackSettings::default(),
        }
    }
}

impl AppSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Bad values are corrected instead of rejected, so an old or hand-edited
    /// file never blocks recording.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.capture.mime_type_candidates = self
            .capture
            .mime_type_candidates
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if self.capture.mime_type_candidates.is_empty() {
            self.capture.mime_type_candidates = default_mime_type_candidates();
        }
        self.capture.timeslice_ms = self.capture.timeslice_ms.min(60_000);
        self.capture.frame_rate = self.capture.frame_rate.clamp(1, 120);
        // Capture is screen-only; the recorder never asks for audio.
        self.capture.include_audio = false;

        let floor = self.timeline.min_timeline_duration_sec;
        if !floor.is_finite() || floor < 0.0 {
            self.timeline.min_timeline_duration_sec = DEFAULT_MIN_TIMELINE_DURATION;
        } else {
            self.timeline.min_timeline_duration_sec = floor.min(3600.0);
        }

        self.playback.seek_step_sec = clamp_f64(self.playback.seek_step_sec, 0.01, 60.0);
    }
}

fn clamp_f64(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.clamp(min, max)
}

/// Screen capture settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSettings {
    /// Recorder container/codec preference, most preferred first
    #[serde(default = "default_mime_type_candidates")]
    pub mime_type_candidates: Vec<String>,

    /// Recorder chunk interval in milliseconds (0 = one chunk at stop)
    #[serde(default = "default_timeslice_ms")]
    pub timeslice_ms: u32,

    /// Requested capture frame rate
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,

    /// Draw the cursor into the capture
    #[serde(default = "default_true")]
    pub capture_cursor: bool,

    /// Always false after normalization
    #[serde(default)]
    pub include_audio: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            mime_type_candidates: default_mime_type_candidates(),
            timeslice_ms: default_timeslice_ms(),
            frame_rate: default_frame_rate(),
            capture_cursor: true,
            include_audio: false,
        }
    }
}

fn default_mime_type_candidates() -> Vec<String> {
    vec![
        "video/webm;codecs=vp9".to_string(),
        "video/webm;codecs=vp8".to_string(),
        "video/webm".to_string(),
        "video/mp4".to_string(),
    ]
}

fn default_timeslice_ms() -> u32 {
    1000
}

fn default_frame_rate() -> u32 {
    30
}

fn default_true() -> bool {
    true
}

/// Timeline settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSettings {
    /// The timeline never gets shorter than this, in seconds
    #[serde(default = "default_min_timeline_duration")]
    pub min_timeline_duration_sec: TimeSec,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            min_timeline_duration_sec: default_min_timeline_duration(),
        }
    }
}

fn default_min_timeline_duration() -> TimeSec {
    DEFAULT_MIN_TIMELINE_DURATION
}

/// Playback control settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Type)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Keyboard nudge step in seconds
    #[serde(default = "default_seek_step")]
    pub seek_step_sec: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            seek_step_sec: default_seek_step(),
        }
    }
}

fn default_seek_step() -> f64 {
    1.0
}

/// Platform default settings directory, if one exists
pub fn default_settings_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}

// =============================================================================
// Storage
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

/// Advisory lock on the settings directory, held until dropped
struct SettingsLock {
    file: fs::File,
}

impl SettingsLock {
    fn acquire(path: &Path, mode: LockMode) -> CoreResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| CoreError::Settings(format!("Cannot open {}: {}", path.display(), e)))?;

        let locked = match mode {
            LockMode::Shared => fs2::FileExt::lock_shared(&file),
            LockMode::Exclusive => fs2::FileExt::lock_exclusive(&file),
        };
        locked.map_err(|e| CoreError::Settings(format!("Cannot take {:?} lock: {}", mode, e)))?;

        Ok(Self { file })
    }
}

impl Drop for SettingsLock {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            warn!("Failed to release settings lock: {}", e);
        }
    }
}

/// Writes `content` to a sibling temp file, then renames it over `path`.
///
/// `fs::rename` replaces an existing target on Unix and Windows alike.
fn write_atomically(path: &Path, content: &str) -> CoreResult<()> {
    let temp_path = path.with_extension("json.tmp");

    let written = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(content.as_bytes())?;
        file.sync_all()
    });
    let replaced = written.and_then(|()| fs::rename(&temp_path, path));

    if let Err(e) = replaced {
        let _ = fs::remove_file(&temp_path);
        return Err(CoreError::Settings(format!(
            "Failed to write {}: {}",
            path.display(),
            e
        )));
    }
    Ok(())
}

/// Loads, saves and resets `settings.json` in one directory
pub struct SettingsManager {
    dir: PathBuf,
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager storing its file in `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            settings_path: dir.join(SETTINGS_FILE),
            dir,
        }
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    fn lock(&self, mode: LockMode) -> CoreResult<SettingsLock> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            CoreError::Settings(format!("Cannot create {}: {}", self.dir.display(), e))
        })?;
        SettingsLock::acquire(&self.dir.join(SETTINGS_LOCK_FILE), mode)
    }

    /// Load settings from disk, returning defaults if the file is missing or unreadable
    pub fn load(&self) -> AppSettings {
        match self.read() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    fn read(&self) -> CoreResult<AppSettings> {
        let _lock = self.lock(LockMode::Shared)?;

        let content = match fs::read_to_string(&self.settings_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Settings file not found, using defaults");
                return Ok(AppSettings::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut settings = serde_json::from_str::<AppSettings>(&content)?;
        if settings.version < SETTINGS_VERSION {
            // No schema changes yet; normalize() stamps the current version.
            info!(
                "Migrating settings from version {} to {}",
                settings.version, SETTINGS_VERSION
            );
        }
        settings.normalize();
        Ok(settings)
    }

    /// Normalizes and persists `settings`, returning what was written
    pub fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        let mut normalized = settings.clone();
        normalized.normalize();
        let content = serde_json::to_string_pretty(&normalized)?;

        let _lock = self.lock(LockMode::Exclusive)?;
        write_atomically(&self.settings_path, &content)?;

        info!("Settings saved to {}", self.settings_path.display());
        Ok(normalized)
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> CoreResult<AppSettings> {
        let _lock = self.lock(LockMode::Exclusive)?;

        match fs::remove_file(&self.settings_path) {
            Ok(()) => info!("Settings file deleted"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(AppSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();

        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.capture.mime_type_candidates[0], "video/webm;codecs=vp9");
        assert_eq!(settings.capture.timeslice_ms, 1000);
        assert!(!settings.capture.include_audio);
        assert_eq!(settings.timeline.min_timeline_duration_sec, 10.0);
    }

    #[test]
    fn test_normalize_corrects_bad_values() {
        let mut settings = AppSettings::default();
        settings.capture.mime_type_candidates = vec!["  ".to_string()];
        settings.capture.frame_rate = 0;
        settings.capture.timeslice_ms = 999_999;
        settings.capture.include_audio = true;
        settings.timeline.min_timeline_duration_sec = f64::NAN;
        settings.playback.seek_step_sec = -3.0;

        settings.normalize();

        assert_eq!(
            settings.capture.mime_type_candidates,
            default_mime_type_candidates()
        );
        assert_eq!(settings.capture.frame_rate, 1);
        assert_eq!(settings.capture.timeslice_ms, 60_000);
        assert!(!settings.capture.include_audio);
        assert_eq!(settings.timeline.min_timeline_duration_sec, 10.0);
        assert_eq!(settings.playback.seek_step_sec, 0.01);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "timeline": { "minTimelineDurationSec": 5.0 } }"#;
        let settings: AppSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.timeline.min_timeline_duration_sec, 5.0);
        assert_eq!(settings.capture, CaptureSettings::default());
        assert_eq!(settings.version, SETTINGS_VERSION);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path());

        assert_eq!(manager.load(), AppSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path());

        let mut settings = AppSettings::default();
        settings.timeline.min_timeline_duration_sec = 15.0;
        settings.capture.frame_rate = 60;

        manager.save(&settings).unwrap();
        let loaded = manager.load();

        assert_eq!(loaded.timeline.min_timeline_duration_sec, 15.0);
        assert_eq!(loaded.capture.frame_rate, 60);
        assert!(manager.settings_path().exists());
    }

    #[test]
    fn test_corrupt_file_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path());
        fs::write(manager.settings_path(), "{ not json").unwrap();

        assert_eq!(manager.load(), AppSettings::default());
    }

    #[test]
    fn test_save_replaces_existing_file_without_leftovers() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path().join("nested"));

        let mut settings = AppSettings::default();
        settings.playback.seek_step_sec = 2.0;
        manager.save(&settings).unwrap();
        settings.playback.seek_step_sec = 5.0;
        manager.save(&settings).unwrap();

        assert_eq!(manager.load().playback.seek_step_sec, 5.0);
        assert!(!manager.settings_path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_older_version_is_stamped_current() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path());
        fs::write(
            manager.settings_path(),
            r#"{ "version": 0, "playback": { "seekStepSec": 3.0 } }"#,
        )
        .unwrap();

        let settings = manager.load();

        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.playback.seek_step_sec, 3.0);
    }

    #[test]
    fn test_reset_without_file_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path());
        assert_eq!(manager.reset().unwrap(), AppSettings::default());
    }

    #[test]
    fn test_reset_deletes_file() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path());
        manager.save(&AppSettings::default()).unwrap();

        let settings = manager.reset().unwrap();

        assert_eq!(settings, AppSettings::default());
        assert!(!manager.settings_path().exists());
    }
}
