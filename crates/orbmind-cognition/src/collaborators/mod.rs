//! External collaborators — consumed as black boxes through these traits
//!
//! - `SpatialIndex`: maps stimuli onto field nodes and reports live density
//! - `ShadowGenerator`: independent perspectives scoring one stimulus
//! - `CrystalStore`: persisted predictions and the lightning cache
//! - `FieldBridge`: optional ambient field statistics
//!
//! Every method may fail with `Error::CollaboratorUnavailable`; the controller
//! degrades to defaults instead of propagating.
//!
//! The submodules hold in-process reference implementations used by the
//! `orbmind` binary and the tests.

pub mod field;
pub mod grid;
pub mod perspectives;
pub mod vault;

pub use field::AmbientField;
pub use grid::GridIndex;
pub use perspectives::PerspectiveBench;
pub use vault::MemoryVault;

use crate::thought::ThoughtRecord;
use dashmap::DashMap;
use orbmind_core::{Quadrant, Result, Stimulus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::Hash;

// ---------------------------------------------------------------------------
// Spatial index
// ---------------------------------------------------------------------------

/// A node in the spatial index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    pub n: u64,
    /// Recursion depth
    pub k: u32,
    pub coordinates: Vec<f64>,
    pub adjacency_value: f64,
}

impl FieldNode {
    /// Placeholder used when the index cannot map a stimulus.
    pub fn origin(dimension: usize) -> Self {
        Self {
            n: 0,
            k: 0,
            coordinates: vec![0.0; dimension],
            adjacency_value: 0.0,
        }
    }

    pub fn node_id(&self) -> String {
        format!("NODE_{}_{}", self.n, self.k)
    }
}

pub trait SpatialIndex: Send + Sync {
    fn map_adjacency(&self, stimulus: &Stimulus) -> Result<FieldNode>;

    fn recursive_neighbors(&self, node: &FieldNode, radius: usize) -> Result<Vec<FieldNode>>;

    /// Fixed-dimension summary of a node set.
    fn thought_vector(&self, nodes: &[FieldNode]) -> Vec<f64>;

    fn dimension(&self) -> usize;

    /// Live node count.
    fn node_count(&self) -> usize;

    fn node_coordinates(&self) -> Vec<Vec<f64>>;

    /// Node count recorded at the last density breach, if the index tracks one.
    fn last_density_breach(&self) -> usize {
        0
    }

    /// Maintenance pass bounding node count. Returns how many nodes were removed.
    fn edge_cutter_purge(&self) -> usize;
}

// ---------------------------------------------------------------------------
// Shadow generator
// ---------------------------------------------------------------------------

fn full_reliability() -> f64 {
    1.0
}

/// One perspective's scored interpretation of a stimulus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub confidence: f64,
    #[serde(default = "full_reliability")]
    pub reliability: f64,
    #[serde(flatten)]
    pub detail: serde_json::Map<String, serde_json::Value>,
}

impl Shadow {
    pub fn new(confidence: f64) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
            reliability: 1.0,
            detail: serde_json::Map::new(),
        }
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability.clamp(0.0, 1.0);
        self
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.detail.insert(key.to_string(), value.into());
        self
    }
}

/// Perspective name → shadow.
pub type Shadows = BTreeMap<String, Shadow>;

pub trait ShadowGenerator: Send + Sync {
    fn generate_epistemic_shadow(&self, stimulus: &Stimulus) -> Result<Shadows>;
}

// ---------------------------------------------------------------------------
// Crystallization store
// ---------------------------------------------------------------------------

/// Derived prediction persisted per pattern key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternPrediction {
    pub pattern: String,
    pub frequency: f64,
    /// Last quadrant of the pattern itself, not a forecast.
    pub predicted_next: Quadrant,
    pub temporal_decay: f64,
}

pub trait CrystalStore: Send + Sync {
    /// Upsert a pattern prediction into the posteriori cache.
    fn crystallize_pattern(&self, key: &str, prediction: PatternPrediction) -> Result<()>;

    fn posteriori(&self, key: &str) -> Option<PatternPrediction>;

    /// Upsert the record of a completed cycle, keyed by its stimulus.
    fn crystallize_thought(&self, stimulus: &Stimulus, record: ThoughtRecord) -> Result<()>;

    /// Cached result for this stimulus, if one was crystallized.
    fn lightning_query(&self, stimulus: &Stimulus) -> Option<ThoughtRecord>;
}

// ---------------------------------------------------------------------------
// Ambient field bridge
// ---------------------------------------------------------------------------

/// Aggregate statistics from the ambient field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    #[serde(default)]
    pub renewal_pressure: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FieldStats {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Stateful across calls.
pub trait FieldBridge: Send + Sync {
    fn stimulus_to_field_stats(&self, stimulus: &Stimulus) -> Result<FieldStats>;
}

// ---------------------------------------------------------------------------
// Eviction
// ---------------------------------------------------------------------------

/// Remove the least recently touched half of `map`, ordered by `seq`.
/// Returns how many entries were removed.
pub(crate) fn cut_oldest_half<K, V>(map: &DashMap<K, V>, seq: impl Fn(&V) -> u64) -> usize
where
    K: Eq + Hash + Clone,
{
    let mut by_age: Vec<(u64, K)> = map.iter().map(|e| (seq(e.value()), e.key().clone())).collect();
    by_age.sort_unstable_by_key(|(s, _)| *s);
    let cut = by_age.len() / 2;
    for (_, key) in by_age.into_iter().take(cut) {
        map.remove(&key);
    }
    cut
}
