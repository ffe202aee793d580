//! Thought — the immutable product of one synthesis cycle
//!
//! A full cycle yields a [`Thought`]. A lightning bypass yields the
//! [`ThoughtRecord`] crystallized by an earlier cycle. Callers see both
//! through [`Synthesis`], which exposes the same read accessors either way.

use crate::collaborators::{FieldNode, FieldStats, Shadows};
use crate::envelope::{CorrelationEnvelope, Reflection};
use crate::habit::Prediction;
use crate::synthesis::LogicState;
use orbmind_core::{Mode, Verdict};
use serde::{Deserialize, Serialize};

/// Confidence above which a pulse is flagged deterministic.
const DETERMINISTIC_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialCoordinate {
    pub node_id: String,
    pub recursion_depth: u32,
    pub coordinates: Vec<f64>,
    pub adjacency_value: f64,
}

impl From<&FieldNode> for SpatialCoordinate {
    fn from(node: &FieldNode) -> Self {
        Self {
            node_id: node.node_id(),
            recursion_depth: node.k,
            coordinates: node.coordinates.clone(),
            adjacency_value: node.adjacency_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    shadows: Shadows,
    spatial: SpatialCoordinate,
    logic: LogicState,
    confidence: f64,
    gravity_stats: FieldStats,
    navigation_vector: [f64; 2],
    envelope: CorrelationEnvelope,
    timestamp: f64,
}

impl Thought {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        shadows: Shadows,
        spatial: SpatialCoordinate,
        logic: LogicState,
        confidence: f64,
        gravity_stats: FieldStats,
        navigation_vector: [f64; 2],
        envelope: CorrelationEnvelope,
        timestamp: f64,
    ) -> Self {
        Self {
            shadows,
            spatial,
            logic,
            confidence,
            gravity_stats,
            navigation_vector,
            envelope,
            timestamp,
        }
    }

    pub fn shadows(&self) -> &Shadows {
        &self.shadows
    }

    pub fn spatial(&self) -> &SpatialCoordinate {
        &self.spatial
    }

    pub fn logic(&self) -> &LogicState {
        &self.logic
    }

    pub fn mode(&self) -> Mode {
        self.logic.active_mode
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn gravity_stats(&self) -> &FieldStats {
        &self.gravity_stats
    }

    pub fn navigation_vector(&self) -> [f64; 2] {
        self.navigation_vector
    }

    pub fn envelope(&self) -> &CorrelationEnvelope {
        &self.envelope
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Mean shadow confidence, 0 with no shadows.
    pub fn epistemic_alignment(&self) -> f64 {
        if self.shadows.is_empty() {
            return 0.0;
        }
        self.shadows.values().map(|s| s.confidence).sum::<f64>() / self.shadows.len() as f64
    }

    pub fn pulse(&self) -> Pulse {
        Pulse {
            glow_intensity: self.confidence,
            cognitive_mode: self.mode(),
            spatial_coordinate: self.spatial.clone(),
            epistemic_alignment: self.epistemic_alignment(),
            deterministic: self.confidence > DETERMINISTIC_CONFIDENCE,
            predictive_intent: self.logic.inductive_prediction.clone(),
            jump_vector: self.logic.necessity_vector,
            navigation_vector: Some(self.navigation_vector),
            final_verdict: self.envelope.final_verdict,
            final_verdict_source: self.envelope.final_verdict_source.clone(),
        }
    }

    /// What the store keeps for later lightning queries.
    pub fn record(&self) -> ThoughtRecord {
        ThoughtRecord {
            predicate: self.pulse(),
            confidence: self.confidence,
            mode: self.mode(),
            field_density: self.logic.field_density,
            envelope: self.envelope.clone(),
            reflection: self.envelope.reflection.clone(),
        }
    }
}

/// Compact, UI-facing summary of a thought.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub glow_intensity: f64,
    pub cognitive_mode: Mode,
    pub spatial_coordinate: SpatialCoordinate,
    pub epistemic_alignment: f64,
    pub deterministic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictive_intent: Option<Prediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jump_vector: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation_vector: Option<[f64; 2]>,
    pub final_verdict: Verdict,
    pub final_verdict_source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThoughtRecord {
    pub predicate: Pulse,
    pub confidence: f64,
    pub mode: Mode,
    pub field_density: usize,
    pub envelope: CorrelationEnvelope,
    pub reflection: Reflection,
}

/// Result of `process_stimulus`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Synthesis {
    Thought(Box<Thought>),
    Cached(Box<ThoughtRecord>),
}

impl Synthesis {
    pub fn mode(&self) -> Mode {
        match self {
            Synthesis::Thought(t) => t.mode(),
            Synthesis::Cached(r) => r.mode,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Synthesis::Thought(t) => t.confidence(),
            Synthesis::Cached(r) => r.confidence,
        }
    }

    pub fn pulse(&self) -> Pulse {
        match self {
            Synthesis::Thought(t) => t.pulse(),
            Synthesis::Cached(r) => r.predicate.clone(),
        }
    }

    pub fn envelope(&self) -> &CorrelationEnvelope {
        match self {
            Synthesis::Thought(t) => t.envelope(),
            Synthesis::Cached(r) => &r.envelope,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Synthesis::Cached(_))
    }

    pub fn as_thought(&self) -> Option<&Thought> {
        match self {
            Synthesis::Thought(t) => Some(t),
            Synthesis::Cached(_) => None,
        }
    }
}
