//! In-memory crystallization store
//!
//! Thoughts are keyed by stimulus fingerprint and bounded by capacity: once
//! the map outgrows it, the least recently written half is cut.

use super::{cut_oldest_half, CrystalStore, PatternPrediction};
use crate::config::MemoryConfig;
use crate::thought::ThoughtRecord;
use dashmap::DashMap;
use orbmind_core::{Result, Stimulus};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

struct Crystal {
    seq: u64,
    record: ThoughtRecord,
}

pub struct MemoryVault {
    /// Fingerprint (canonical stimulus JSON) → last record
    thoughts: DashMap<String, Crystal>,
    posteriori_cache: DashMap<String, PatternPrediction>,
    capacity: usize,
    seq: AtomicU64,
    lightning: bool,
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::with_capacity(MemoryConfig::default().thought_capacity)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            thoughts: DashMap::new(),
            posteriori_cache: DashMap::new(),
            capacity: capacity.max(1),
            seq: AtomicU64::new(0),
            lightning: true,
        }
    }

    /// A vault that persists but never answers lightning queries.
    pub fn without_lightning() -> Self {
        Self {
            lightning: false,
            ..Self::new()
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn thought_count(&self) -> usize {
        self.thoughts.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.posteriori_cache.len()
    }
}

impl CrystalStore for MemoryVault {
    fn crystallize_pattern(&self, key: &str, prediction: PatternPrediction) -> Result<()> {
        self.posteriori_cache.insert(key.to_string(), prediction);
        Ok(())
    }

    fn posteriori(&self, key: &str) -> Option<PatternPrediction> {
        self.posteriori_cache.get(key).map(|p| p.clone())
    }

    fn crystallize_thought(&self, stimulus: &Stimulus, record: ThoughtRecord) -> Result<()> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.thoughts
            .insert(stimulus.canonical_json(), Crystal { seq, record });
        if self.thoughts.len() > self.capacity {
            let cut = cut_oldest_half(&self.thoughts, |c| c.seq);
            debug!("Vault over capacity {}, evicted {} thoughts", self.capacity, cut);
        }
        Ok(())
    }

    fn lightning_query(&self, stimulus: &Stimulus) -> Option<ThoughtRecord> {
        if !self.lightning {
            return None;
        }
        self.thoughts
            .get(&stimulus.canonical_json())
            .map(|c| c.record.clone())
    }
}
