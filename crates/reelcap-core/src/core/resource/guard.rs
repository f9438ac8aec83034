//! Resource Lifecycle Guard
//!
//! Tracks the single current reference per logical slot and revokes the
//! previous local reference before a new one takes its place.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use specta::Type;
use tracing::{debug, info, warn};

use super::registry::{ResourceRegistry, LOCAL_SCHEME};
use crate::core::{CoreResult, MediaBlob};

// =============================================================================
// Slot & Reference Types
// =============================================================================

/// Logical slot holding at most one live reference
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "camelCase")]
pub enum Slot {
    /// Source of the main video element
    Playback,
    /// Image drawn behind the video on the canvas
    BackgroundImage,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Playback => write!(f, "playback"),
            Slot::BackgroundImage => write!(f, "background-image"),
        }
    }
}

/// A media reference, classified by origin
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(tag = "kind", content = "url", rename_all = "camelCase")]
pub enum ResourceRef {
    /// Created locally from a blob; must be revoked
    Local(String),
    /// Remote or otherwise externally owned; never revoked
    External(String),
}

impl ResourceRef {
    /// Classifies a reference by its URL scheme
    pub fn classify(url: impl Into<String>) -> Self {
        let url = url.into();
        if url.starts_with(LOCAL_SCHEME) {
            Self::Local(url)
        } else {
            Self::External(url)
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Local(url) | Self::External(url) => url,
        }
    }

    pub fn is_revocable(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

// =============================================================================
// Guard
// =============================================================================

/// Owns the current reference of every slot.
///
/// All slot writes go through [`ResourceGuard::replace`] (or helpers built on
/// it), so a slot never has two live local references. Dropping the guard
/// revokes whatever local references are still current.
pub struct ResourceGuard<R: ResourceRegistry> {
    registry: R,
    slots: HashMap<Slot, ResourceRef>,
}

impl<R: ResourceRegistry> ResourceGuard<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            slots: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Returns the current reference of a slot
    pub fn current(&self, slot: Slot) -> Option<&ResourceRef> {
        self.slots.get(&slot)
    }

    /// Creates a local reference for `blob` and makes it current for `slot`
    pub fn install(&mut self, slot: Slot, blob: MediaBlob) -> CoreResult<ResourceRef> {
        let reference = ResourceRef::Local(self.registry.create(blob)?);
        self.replace(slot, Some(reference.clone()));
        Ok(reference)
    }

    /// Makes `next` the current reference of `slot`.
    ///
    /// A local reference previously held by the slot is revoked first. Passing
    /// the value that is already current is a no-op. Returns the reference that
    /// was displaced, if any.
    pub fn replace(&mut self, slot: Slot, next: Option<ResourceRef>) -> Option<ResourceRef> {
        if self.slots.get(&slot) == next.as_ref() {
            debug!("Slot {} already holds the requested reference", slot);
            return None;
        }

        let previous = self.slots.remove(&slot);
        if let Some(prev) = &previous {
            self.revoke(slot, prev);
        }

        if let Some(next) = next {
            info!("Slot {} now references {}", slot, next.url());
            self.slots.insert(slot, next);
        } else {
            debug!("Slot {} cleared", slot);
        }

        previous
    }

    /// Clears a slot, revoking its local reference
    pub fn release(&mut self, slot: Slot) -> Option<ResourceRef> {
        self.replace(slot, None)
    }

    /// Clears every slot
    pub fn release_all(&mut self) {
        let slots: Vec<Slot> = self.slots.keys().copied().collect();
        for slot in slots {
            self.release(slot);
        }
    }

    fn revoke(&self, slot: Slot, reference: &ResourceRef) {
        let ResourceRef::Local(url) = reference else {
            return;
        };

        // A stale reference that cannot be revoked leaks memory but must not
        // take the editor down with it.
        if let Err(e) = self.registry.revoke(url) {
            warn!("Failed to revoke {} reference {}: {}", slot, url, e);
        }
    }
}

impl<R: ResourceRegistry> Drop for ResourceGuard<R> {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl<R: ResourceRegistry> fmt::Debug for ResourceGuard<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGuard")
            .field("slots", &self.slots)
            .finish()
    }
}
