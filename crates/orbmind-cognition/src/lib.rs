//! Orbmind Cognition — the synthesis pipeline behind the orb
//!
//! Per stimulus:
//! - pattern memory (habit) records cursor quadrants and predicts the next one
//! - the necessity detector looks for dense, symmetric structure (intuition)
//! - the navigator keeps the orb at a comfortable distance (proprioception)
//! - beliefs feed the mode synthesizer, the convergence scorer rates the result
//! - the envelope builder wraps it all in an advisory-only report
//!
//! External collaborators (spatial index, shadow generator, crystallization
//! store, ambient field) are traits in `collaborators`, with in-process
//! reference implementations alongside.

pub mod belief;
pub mod collaborators;
pub mod config;
pub mod controller;
pub mod convergence;
pub mod envelope;
pub mod habit;
pub mod intuition;
pub mod proprioception;
pub mod synthesis;
pub mod thought;
pub mod verbal;

pub use belief::BeliefUpdater;
pub use collaborators::{
    CrystalStore, FieldBridge, FieldNode, FieldStats, PatternPrediction, Shadow, ShadowGenerator,
    Shadows, SpatialIndex,
};
pub use config::OrbConfig;
pub use controller::{OrbController, OrbStatus};
pub use envelope::CorrelationEnvelope;
pub use habit::{HabitTracker, Prediction, PredictionType};
pub use synthesis::{LogicState, ModeSynthesizer};
pub use thought::{Pulse, Synthesis, Thought, ThoughtRecord};
pub use verbal::VerbalCommand;
