//! Reelcap Error Definitions
//!
//! Defines error types used throughout the engine.

use thiserror::Error;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Capture Errors
    // =========================================================================
    #[error("Screen capture is not supported on this platform")]
    CaptureUnsupported,

    #[error("Screen capture permission denied: {0}")]
    PermissionDenied(String),

    #[error("Screen capture cancelled by user")]
    UserCancelled,

    #[error("A capture session is already active")]
    SessionAlreadyActive,

    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    #[error("No active capture session")]
    NoActiveSession,

    // =========================================================================
    // Resource Errors
    // =========================================================================
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Failed to create resource reference: {0}")]
    ResourceCreateFailed(String),

    // =========================================================================
    // Settings Errors
    // =========================================================================
    #[error("Settings error: {0}")]
    Settings(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Convert to a user-friendly error message for the frontend
    pub fn to_ipc_error(&self) -> String {
        self.to_string()
    }

    /// Whether the user can simply try the same action again.
    ///
    /// `CaptureUnsupported` is terminal; `SessionAlreadyActive` is a caller
    /// bug, not something a retry fixes.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::PermissionDenied(_) | CoreError::UserCancelled | CoreError::CaptureFailed(_)
        )
    }
}
