//! Orbmind Runtime — the event loop that serializes synthesis cycles
//!
//! Every input (cursor ticks, text queries, speech, status, purge) enters one
//! bounded queue. A single consumer owns the controller, so no two cycles
//! ever interleave.

pub mod cursor;
pub mod queue;

pub use cursor::{CursorSample, CursorTracker};
pub use queue::{OrbEvent, OrbHandle, OrbLoop, OrbOutput, RuntimeStatus};
