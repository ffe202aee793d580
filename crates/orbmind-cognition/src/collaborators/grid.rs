//! In-process spatial index over normalized stimulus coordinates
//!
//! Cursor stimuli land at their screen position scaled to [-1, 1]; text and
//! speech land at a content-hash-derived point. Revisiting a point deepens its
//! node instead of adding a new one. When the live count passes the configured
//! ceiling the index purges itself and remembers the breach for one mapping.

use super::{cut_oldest_half, FieldNode, SpatialIndex};
use crate::config::{FieldConfig, ScreenConfig};
use dashmap::DashMap;
use orbmind_core::{Result, Stimulus};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, info};

/// Coordinate distance covered by one unit of neighbor radius.
const NEIGHBOR_STEP: f64 = 0.1;
/// Velocity that maps to 1.0 on the third axis.
const VELOCITY_SCALE: f64 = 50.0;

struct Slot {
    seq: u64,
    visits: u32,
    node: FieldNode,
}

pub struct GridIndex {
    nodes: DashMap<u64, Slot>,
    dimension: usize,
    width: f64,
    height: f64,
    max_density: usize,
    seq: AtomicU64,
    last_breach: AtomicUsize,
}

impl GridIndex {
    pub fn new(field: &FieldConfig, screen: &ScreenConfig) -> Self {
        Self {
            nodes: DashMap::new(),
            dimension: field.dimension.max(2),
            width: screen.width,
            height: screen.height,
            max_density: field.max_field_density,
            seq: AtomicU64::new(0),
            last_breach: AtomicUsize::new(0),
        }
    }

    fn project(&self, stimulus: &Stimulus) -> Vec<f64> {
        let mut coords = vec![0.0; self.dimension];
        if stimulus.is_cursor() {
            coords[0] = normalize(stimulus.coordinates[0], self.width);
            coords[1] = normalize(stimulus.coordinates[1], self.height);
            if self.dimension > 2 {
                coords[2] = (stimulus.velocity / VELOCITY_SCALE).min(1.0);
            }
        } else {
            let digest = sha256(stimulus.content_str().as_bytes());
            let bytes = digest.as_ref();
            for (c, byte) in coords.iter_mut().zip(bytes.iter().cycle()) {
                *c = *byte as f64 / 255.0 * 2.0 - 1.0;
            }
        }
        coords.iter_mut().for_each(|c| *c = (*c * 100.0).round() / 100.0);
        coords
    }
}

impl SpatialIndex for GridIndex {
    fn map_adjacency(&self, stimulus: &Stimulus) -> Result<FieldNode> {
        self.last_breach.store(0, Ordering::SeqCst);
        let before = self.nodes.len();
        if before >= self.max_density {
            self.last_breach.store(before, Ordering::SeqCst);
            self.edge_cutter_purge();
        }

        let coordinates = self.project(stimulus);
        let key = coordinate_key(&coordinates);
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);

        let mut slot = self.nodes.entry(key).or_insert_with(|| Slot {
            seq,
            visits: 0,
            node: FieldNode {
                n: key,
                k: 0,
                coordinates: coordinates.clone(),
                adjacency_value: 0.0,
            },
        });
        slot.visits += 1;
        slot.seq = seq;
        slot.node.k = slot.visits - 1;
        slot.node.adjacency_value = 1.0 - 1.0 / (1.0 + slot.visits as f64);
        debug!("Mapped {} → {}", stimulus.kind.as_str(), slot.node.node_id());
        Ok(slot.node.clone())
    }

    fn recursive_neighbors(&self, node: &FieldNode, radius: usize) -> Result<Vec<FieldNode>> {
        let reach = radius as f64 * NEIGHBOR_STEP;
        let mut found: Vec<(f64, FieldNode)> = self
            .nodes
            .iter()
            .filter(|slot| slot.node.n != node.n)
            .filter_map(|slot| {
                let d = distance(&slot.node.coordinates, &node.coordinates);
                (d <= reach).then(|| (d, slot.node.clone()))
            })
            .collect();
        found.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(found.into_iter().map(|(_, n)| n).collect())
    }

    fn thought_vector(&self, nodes: &[FieldNode]) -> Vec<f64> {
        let mut acc = vec![0.0; self.dimension];
        if nodes.is_empty() {
            return acc;
        }
        for node in nodes {
            for (a, c) in acc.iter_mut().zip(&node.coordinates) {
                *a += c;
            }
        }
        let count = nodes.len() as f64;
        acc.iter_mut().for_each(|a| *a /= count);
        acc
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_coordinates(&self) -> Vec<Vec<f64>> {
        self.nodes.iter().map(|slot| slot.node.coordinates.clone()).collect()
    }

    fn last_density_breach(&self) -> usize {
        self.last_breach.load(Ordering::SeqCst)
    }

    /// Drop the least recently touched half.
    fn edge_cutter_purge(&self) -> usize {
        let total = self.nodes.len();
        let cut = cut_oldest_half(&self.nodes, |slot| slot.seq);
        info!("Edge-cutter purge removed {} of {} nodes", cut, total);
        cut
    }
}

fn normalize(v: f64, extent: f64) -> f64 {
    if extent <= 0.0 {
        return 0.0;
    }
    ((v / extent) * 2.0 - 1.0).clamp(-1.0, 1.0)
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn sha256(bytes: &[u8]) -> ring::digest::Digest {
    ring::digest::digest(&ring::digest::SHA256, bytes)
}

/// First 8 digest bytes of the centi-unit coordinates.
fn coordinate_key(coords: &[f64]) -> u64 {
    let mut bytes = Vec::with_capacity(coords.len() * 8);
    for c in coords {
        bytes.extend_from_slice(&((c * 100.0).round() as i64).to_le_bytes());
    }
    let mut key = [0u8; 8];
    key.copy_from_slice(&sha256(&bytes).as_ref()[..8]);
    u64::from_le_bytes(key)
}
