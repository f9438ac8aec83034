//! Capture Module
//!
//! Screen capture from user gesture to a playable resource: the platform
//! abstraction, the per-recording session, the controller state machine and
//! a simulated platform for headless use.

mod controller;
mod platform;
mod session;
mod simulated;

pub use controller::*;
pub use platform::*;
pub use session::*;
pub use simulated::*;
