//! Reelcap Core Type Definitions
//!
//! Defines fundamental types used throughout the engine.

use serde::{Deserialize, Serialize};
use specta::Type;

// =============================================================================
// ID Types
// =============================================================================

/// Capture session unique identifier (ULID)
pub type SessionId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Replaces NaN, infinities and negative values with zero.
///
/// Media elements report `NaN` before metadata and `Infinity` for some
/// recorder outputs; neither is a usable duration or position.
pub fn sanitize_time(value: TimeSec) -> TimeSec {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

// =============================================================================
// Binary Types
// =============================================================================

/// An in-memory binary object with its MIME type (a browser `Blob`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub struct MediaBlob {
    /// MIME type, e.g. `video/webm;codecs=vp9`
    pub mime_type: String,
    /// Raw bytes
    pub data: Vec<u8>,
}

impl MediaBlob {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Concatenates fragments in the given order into a single blob
    pub fn concat<I, B>(mime_type: impl Into<String>, parts: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut data = Vec::new();
        for part in parts {
            data.extend_from_slice(part.as_ref());
        }
        Self::new(mime_type, data)
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
