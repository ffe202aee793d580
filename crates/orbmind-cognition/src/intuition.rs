//! Necessity detector — decides when structural signal warrants a jump
//!
//! A jump needs both a dense field and near-perfect bilateral symmetry among
//! node coordinates. The symmetry scan is O(n²) in live node count; the index
//! is expected to keep that count bounded through its purge policy.

use crate::collaborators::{FieldNode, SpatialIndex};
use crate::config::IntuitionConfig;
use orbmind_core::Stimulus;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NecessityReport {
    pub jump_triggered: bool,
    /// Centroid of all node coordinates (first two dimensions), set on a jump
    #[serde(skip_serializing_if = "Option::is_none")]
    pub necessity_vector: Option<[f64; 2]>,
    pub symmetry_score: f64,
    pub certainty: f64,
    pub field_density: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bypass_steps: Option<usize>,
}

pub struct IntuitiveRecognizer {
    config: IntuitionConfig,
    index: Arc<dyn SpatialIndex>,
}

impl IntuitiveRecognizer {
    pub fn new(config: IntuitionConfig, index: Arc<dyn SpatialIndex>) -> Self {
        Self { config, index }
    }

    pub fn check_necessity(&self, _stimulus: &Stimulus, _current: &FieldNode) -> NecessityReport {
        let density = self.index.node_count();
        let coords = self.index.node_coordinates();
        let symmetry = bilateral_symmetry(&coords, self.config.mirror_tolerance);

        if density > self.config.density_threshold && symmetry > self.config.symmetry_threshold {
            return NecessityReport {
                jump_triggered: true,
                necessity_vector: Some(centroid(&coords)),
                symmetry_score: symmetry,
                certainty: self.config.certainty,
                field_density: density,
                bypass_steps: Some(density / 10),
            };
        }
        NecessityReport {
            jump_triggered: false,
            necessity_vector: None,
            symmetry_score: symmetry,
            certainty: 0.0,
            field_density: density,
            bypass_steps: None,
        }
    }
}

/// Fraction of node pairs that mirror each other across the vertical axis.
pub fn bilateral_symmetry(coords: &[Vec<f64>], tolerance: f64) -> f64 {
    if coords.len() < 2 {
        return 0.0;
    }
    let mut mirrored = 0usize;
    for (i, a) in coords.iter().enumerate() {
        for b in &coords[i + 1..] {
            if a.len() >= 2
                && b.len() >= 2
                && (a[0] + b[0]).abs() < tolerance
                && (a[1] - b[1]).abs() < tolerance
            {
                mirrored += 1;
            }
        }
    }
    let pairs = coords.len() * (coords.len() - 1) / 2;
    mirrored as f64 / pairs as f64
}

/// Mean of the first two coordinates. (0, 0) for an empty field.
pub fn centroid(coords: &[Vec<f64>]) -> [f64; 2] {
    if coords.is_empty() {
        return [0.0, 0.0];
    }
    let mut acc = [0.0, 0.0];
    for c in coords {
        for (a, v) in acc.iter_mut().zip(c.iter()) {
            *a += v;
        }
    }
    let n = coords.len() as f64;
    [acc[0] / n, acc[1] / n]
}
