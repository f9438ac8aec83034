//! Resource Module
//!
//! Ownership of locally created, revocable object URLs.
//!
//! Every blob URL the engine creates lives in exactly one [`Slot`] of a
//! [`ResourceGuard`]. Replacing or clearing a slot revokes the previous local
//! reference, so repeated recordings never pile up unreleased blobs.

mod guard;
mod registry;

pub use guard::*;
pub use registry::*;
