//! reelcap-cli - headless driver for the Reelcap capture engine
//!
//! Subcommands:
//! - `reelcap-cli record` - Run a simulated capture session end to end
//! - `reelcap-cli timeline <ops>...` - Apply duration operations and print the result
//! - `reelcap-cli scrub` - Map a pointer position on a track to a playback time
//! - `reelcap-cli format <seconds>` - Format seconds for display
//! - `reelcap-cli settings <show|path|reset>` - Inspect or reset persisted settings
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use reelcap_core::core::capture::{CaptureController, SimulatedOutcome, SimulatedPlatform};
use reelcap_core::core::playback::EditorSession;
use reelcap_core::core::resource::InMemoryRegistry;
use reelcap_core::core::settings::{default_settings_dir, AppSettings, SettingsManager};
use reelcap_core::core::timeline::{
    format_time, DurationReconciler, PointerEvent, ScrubberModel,
};

#[derive(Parser)]
#[command(name = "reelcap-cli")]
#[command(about = "Headless capture sessions and timeline tooling for Reelcap")]
#[command(version)]
struct Cli {
    /// Settings directory (defaults to the platform config directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Also write daily rolling logs to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record with the simulated platform and print the finalized capture
    Record {
        /// Number of chunks the recorder emits
        #[arg(short, long, default_value = "3")]
        chunks: usize,

        /// Bytes per chunk
        #[arg(long, default_value = "1024")]
        chunk_size: usize,

        /// How the recording ends
        #[arg(long, value_enum, default_value_t = EndBy::Stop)]
        end_by: EndBy,

        /// How the permission prompt is answered
        #[arg(long, value_enum, default_value_t = Outcome::Grant)]
        outcome: Outcome,

        /// Duration reported by the media element once the recording loads
        #[arg(long)]
        metadata_duration: Option<f64>,
    },

    /// Apply duration operations in order, e.g. `video=12 timeline=5 cover=20`
    Timeline {
        /// Operations: video=<sec>, timeline=<sec>, cover=<sec>, reset
        ops: Vec<TimelineOp>,

        /// Timeline floor (defaults to the configured minimum)
        #[arg(long)]
        min: Option<f64>,
    },

    /// Click a scrubber track and print the resulting seek
    Scrub {
        /// Track width in pixels
        #[arg(long)]
        width: f64,

        /// Pointer x relative to the track's left edge
        #[arg(long)]
        x: f64,

        /// Timeline duration in seconds
        #[arg(long)]
        duration: f64,
    },

    /// Format seconds as MM:SS.cc
    Format {
        seconds: f64,

        /// Format as if no media were loaded
        #[arg(long)]
        no_media: bool,
    },

    /// Inspect or reset persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the effective settings
    Show,
    /// Print the settings file location
    Path,
    /// Restore defaults and print them
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EndBy {
    /// Stop button in the app
    Stop,
    /// "Stop sharing" in the OS chrome
    TrackEnded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Outcome {
    Grant,
    Deny,
    Cancel,
    Unsupported,
    Fail,
}

impl From<Outcome> for SimulatedOutcome {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Grant => SimulatedOutcome::Grant,
            Outcome::Deny => SimulatedOutcome::Deny("NotAllowedError".to_string()),
            Outcome::Cancel => SimulatedOutcome::Cancel,
            Outcome::Unsupported => SimulatedOutcome::Unsupported,
            Outcome::Fail => SimulatedOutcome::Fail("NotReadableError".to_string()),
        }
    }
}

/// One step of the `timeline` subcommand
#[derive(Clone, Debug, PartialEq)]
enum TimelineOp {
    Video(f64),
    Timeline(f64),
    Cover(f64),
    Reset,
}

impl FromStr for TimelineOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "reset" {
            return Ok(TimelineOp::Reset);
        }

        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected <op>=<seconds> or reset, got '{}'", s))?;
        let seconds: f64 = value
            .parse()
            .map_err(|_| format!("invalid seconds '{}' in '{}'", value, s))?;

        match name {
            "video" => Ok(TimelineOp::Video(seconds)),
            "timeline" => Ok(TimelineOp::Timeline(seconds)),
            "cover" => Ok(TimelineOp::Cover(seconds)),
            other => Err(format!("unknown timeline operation '{}'", other)),
        }
    }
}

impl TimelineOp {
    fn apply(&self, durations: &mut DurationReconciler) {
        match *self {
            TimelineOp::Video(seconds) => durations.set_video_duration(seconds),
            TimelineOp::Timeline(seconds) => durations.set_timeline_duration(seconds),
            TimelineOp::Cover(seconds) => durations.ensure_timeline_covers(seconds),
            TimelineOp::Reset => durations.reset(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    reelcap_core::init_logging(cli.log_dir.as_deref());

    let manager = settings_manager(cli.config_dir)?;

    match cli.command {
        Commands::Record {
            chunks,
            chunk_size,
            end_by,
            outcome,
            metadata_duration,
        } => {
            let settings = manager.load();
            record(&settings, chunks, chunk_size, end_by, outcome, metadata_duration).await
        }
        Commands::Timeline { ops, min } => {
            let min = min.unwrap_or_else(|| manager.load().timeline.min_timeline_duration_sec);
            timeline(min, &ops)
        }
        Commands::Scrub { width, x, duration } => scrub(width, x, duration),
        Commands::Format { seconds, no_media } => {
            println!("{}", format_time(seconds, !no_media));
            Ok(())
        }
        Commands::Settings { action } => match action {
            SettingsAction::Show => print_json(&manager.load()),
            SettingsAction::Path => {
                println!("{}", manager.settings_path().display());
                Ok(())
            }
            SettingsAction::Reset => {
                let settings = manager.reset().context("Failed to reset settings")?;
                info!("Settings reset at {}", manager.settings_path().display());
                print_json(&settings)
            }
        },
    }
}

fn settings_manager(config_dir: Option<PathBuf>) -> Result<SettingsManager> {
    let dir = match config_dir {
        Some(dir) => dir,
        None => default_settings_dir()
            .context("No platform config directory available, pass --config-dir")?,
    };
    debug!("Using settings directory {}", dir.display());
    Ok(SettingsManager::new(dir))
}

async fn record(
    settings: &AppSettings,
    chunks: usize,
    chunk_size: usize,
    end_by: EndBy,
    outcome: Outcome,
    metadata_duration: Option<f64>,
) -> Result<()> {
    let platform = Arc::new(SimulatedPlatform::new().with_outcome(outcome.into()));
    let registry = InMemoryRegistry::new();
    let mut editor = EditorSession::new(settings, registry.clone());
    let mut controller = CaptureController::new(platform.clone(), settings.capture.clone());

    let session_id = controller
        .start()
        .await
        .context("Screen capture did not start")?;
    info!("Simulated recording {} started", session_id);

    let feed = platform
        .feed()
        .context("Simulated recorder exposed no event feed")?;
    for index in 0..chunks {
        feed.push_chunk(vec![(index % 256) as u8; chunk_size]);
    }

    match end_by {
        EndBy::Stop => {
            controller.stop()?;
        }
        EndBy::TrackEnded => {
            feed.end_track();
        }
    }

    let finalized = controller
        .run(&mut editor)
        .await
        .context("Recording could not be finalized")?;

    if let Some(duration) = metadata_duration {
        editor.on_metadata_loaded(duration);
    }

    print_json(&json!({
        "capture": finalized,
        "editor": editor.snapshot(),
        "liveReferences": registry.live_count(),
    }))
}

fn timeline(min: f64, ops: &[TimelineOp]) -> Result<()> {
    let mut durations = DurationReconciler::new(min);
    for op in ops {
        op.apply(&mut durations);
    }

    let effective = durations.effective_duration();
    print_json(&json!({
        "videoDuration": durations.video_duration(),
        "timelineDuration": durations.timeline_duration(),
        "minTimelineDuration": durations.min_timeline_duration(),
        "effectiveDuration": effective,
        "label": format_time(effective, true),
    }))
}

fn scrub(width: f64, x: f64, duration: f64) -> Result<()> {
    if !width.is_finite() || width <= 0.0 {
        bail!("Track width must be a positive number of pixels, got {}", width);
    }

    let mut scrubber = ScrubberModel::new(width);
    let action = scrubber.handle(PointerEvent::Click { x }, duration);
    let time = scrubber.time_at(x, duration);

    print_json(&json!({
        "action": action,
        "view": scrubber.view(time, duration),
        "label": format_time(time, true),
    }))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
