//! Orbmind — cognitive synthesis engine behind a floating assistant orb
//!
//! The binary speaks a JSON-lines protocol with its host over stdio. The
//! engine itself lives in the workspace crates:
//! - `orbmind-core`: stimulus vocabulary, modes, protocol, errors
//! - `orbmind-cognition`: the synthesis pipeline and its collaborators
//! - `orbmind-runtime`: the single-consumer event loop and cursor ticker

pub mod bridge;

pub use bridge::{pulse_message, Bridge, Dispatch};
