//! Resource Registry
//!
//! Abstraction over the host's revocable reference subsystem
//! (`URL.createObjectURL` / `URL.revokeObjectURL` in a browser).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::core::{CoreError, CoreResult, MediaBlob};

/// URL scheme of locally created, revocable references
pub const LOCAL_SCHEME: &str = "blob:";

/// Creates and revokes opaque references to in-memory blobs.
///
/// The engine never inspects the returned string beyond its scheme.
pub trait ResourceRegistry: Send {
    /// Creates a revocable reference to `blob`
    fn create(&self, blob: MediaBlob) -> CoreResult<String>;

    /// Revokes a reference previously returned by [`ResourceRegistry::create`]
    fn revoke(&self, reference: &str) -> CoreResult<()>;
}

// =============================================================================
// In-Memory Registry
// =============================================================================

#[derive(Debug, Default)]
struct RegistryInner {
    blobs: HashMap<String, MediaBlob>,
    created: usize,
    revoked: Vec<String>,
    byte_limit: Option<usize>,
}

impl RegistryInner {
    fn live_bytes(&self) -> usize {
        self.blobs.values().map(MediaBlob::len).sum()
    }
}

/// Registry that keeps blobs in process memory.
///
/// Used by the headless CLI and by tests. Clones share the same store, so a
/// test can hand one clone to a guard and inspect revocations through another.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the total size of live blobs; `create` fails beyond it
    pub fn with_byte_limit(self, limit: usize) -> Self {
        self.lock().byte_limit = Some(limit);
        self
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the blob behind a live reference
    pub fn resolve(&self, reference: &str) -> Option<MediaBlob> {
        self.lock().blobs.get(reference).cloned()
    }

    /// Number of references that have been created but not revoked
    pub fn live_count(&self) -> usize {
        self.lock().blobs.len()
    }

    /// Total size of the blobs behind live references
    pub fn live_bytes(&self) -> usize {
        self.lock().live_bytes()
    }

    /// Total number of references ever created
    pub fn created_count(&self) -> usize {
        self.lock().created
    }

    /// Revoked references, in revocation order
    pub fn revoked(&self) -> Vec<String> {
        self.lock().revoked.clone()
    }
}

impl ResourceRegistry for InMemoryRegistry {
    fn create(&self, blob: MediaBlob) -> CoreResult<String> {
        let reference = format!("{}reelcap/{}", LOCAL_SCHEME, ulid::Ulid::new());
        let mut inner = self.lock();
        if let Some(limit) = inner.byte_limit {
            let needed = inner.live_bytes() + blob.len();
            if needed > limit {
                return Err(CoreError::ResourceCreateFailed(format!(
                    "{} bytes would exceed the {} byte blob store limit",
                    needed, limit
                )));
            }
        }
        debug!(
            "Created object URL {} ({} bytes, {})",
            reference,
            blob.len(),
            blob.mime_type
        );
        inner.blobs.insert(reference.clone(), blob);
        inner.created += 1;
        Ok(reference)
    }

    fn revoke(&self, reference: &str) -> CoreResult<()> {
        let mut inner = self.lock();
        if inner.blobs.remove(reference).is_none() {
            return Err(CoreError::ResourceNotFound(reference.to_string()));
        }
        inner.revoked.push(reference.to_string());
        debug!("Revoked object URL {}", reference);
        Ok(())
    }
}
