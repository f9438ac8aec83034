//! Reelcap Core Library
//!
//! Capture lifecycle and timeline synchronization engine for a browser-based
//! screen recorder and short-form video editor.
//!
//! The engine is platform-agnostic: screen capture and revocable object URLs
//! are reached through the [`core::capture::CapturePlatform`] and
//! [`core::resource::ResourceRegistry`] traits, so the same state machine runs
//! against a browser bridge, a native backend, or the bundled simulators.

pub mod core;

use std::path::Path;
use std::sync::OnceLock;

pub use crate::core::{CoreError, CoreResult};

// =============================================================================
// Logging
// =============================================================================

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initializes the global tracing subscriber.
///
/// Logs go to stderr, leaving stdout for command output, and additionally to
/// a daily rolling file when `log_dir` is given. The filter honours
/// `RUST_LOG` with an INFO default. Calling this more than once is harmless;
/// only the first call installs a subscriber.
pub fn init_logging(log_dir: Option<&Path>) {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let file_layer = log_dir.and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Failed to create log directory {}: {}", dir.display(), e);
            return None;
        }

        let file_appender = tracing_appender::rolling::daily(dir, "reelcap.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);

        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);

    // Avoid panics if already initialized (tests, embedding hosts).
    let _ = tracing::subscriber::set_global_default(subscriber);
}
