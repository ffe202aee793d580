//! Four deterministic perspectives scoring a stimulus
//!
//! - locke: empirical intensity (cursor velocity, query length)
//! - hume: repetition of the same content across calls
//! - kant: formal structure (screen centrality, symbolic tokens)
//! - spinoza: unity of the content (low character diversity)

use super::{cut_oldest_half, Shadow, ShadowGenerator, Shadows};
use crate::config::{MemoryConfig, ScreenConfig};
use dashmap::DashMap;
use orbmind_core::{Result, Stimulus};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub const PERSPECTIVES: [&str; 4] = ["locke", "hume", "kant", "spinoza"];

struct Seen {
    seq: u64,
    count: u32,
}

pub struct PerspectiveBench {
    width: f64,
    height: f64,
    /// Times each canonical stimulus has been scored
    seen: DashMap<String, Seen>,
    capacity: usize,
    seq: AtomicU64,
}

impl PerspectiveBench {
    pub fn new(screen: &ScreenConfig) -> Self {
        Self {
            width: screen.width,
            height: screen.height,
            seen: DashMap::new(),
            capacity: MemoryConfig::default().shadow_capacity,
            seq: AtomicU64::new(0),
        }
    }

    /// Remember at most `capacity` distinct stimuli for repetition scoring.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn tracked(&self) -> usize {
        self.seen.len()
    }

    fn locke(&self, stimulus: &Stimulus) -> Shadow {
        if stimulus.is_cursor() {
            let intensity = (stimulus.velocity / 50.0).min(1.0);
            Shadow::new(0.5 + 0.5 * intensity).with_detail("basis", "velocity")
        } else {
            let len = stimulus.content_str().chars().count() as f64;
            Shadow::new(0.5 + 0.4 * (len / 200.0).min(1.0)).with_detail("basis", "length")
        }
    }

    fn hume(&self, repeats: u32) -> Shadow {
        Shadow::new((0.4 + 0.1 * repeats as f64).min(0.95))
            .with_detail("basis", "repetition")
            .with_detail("repeats", repeats)
    }

    fn kant(&self, stimulus: &Stimulus) -> Shadow {
        if stimulus.is_cursor() {
            let dx = stimulus.coordinates[0] / self.width.max(1.0) - 0.5;
            let dy = stimulus.coordinates[1] / self.height.max(1.0) - 0.5;
            let off_center = ((dx * dx + dy * dy).sqrt() / 0.5_f64.hypot(0.5)).min(1.0);
            Shadow::new(0.9 - 0.4 * off_center).with_detail("basis", "centrality")
        } else {
            let tokens: Vec<&str> = stimulus.content_str().split_whitespace().collect();
            let formal = tokens
                .iter()
                .filter(|t| t.chars().all(|c| c.is_ascii_digit() || "+-*/=?<>()".contains(c)))
                .count();
            let ratio = if tokens.is_empty() { 0.0 } else { formal as f64 / tokens.len() as f64 };
            Shadow::new(0.55 + 0.35 * ratio).with_detail("basis", "structure")
        }
    }

    fn spinoza(&self, stimulus: &Stimulus) -> Shadow {
        let content = stimulus.content_str();
        if stimulus.is_cursor() || content.is_empty() {
            return Shadow::new(0.7).with_detail("basis", "unity");
        }
        let total = content.chars().count() as f64;
        let unique = content.chars().collect::<HashSet<_>>().len() as f64;
        Shadow::new(0.5 + 0.4 * (1.0 - unique / total)).with_detail("basis", "unity")
    }
}

impl ShadowGenerator for PerspectiveBench {
    fn generate_epistemic_shadow(&self, stimulus: &Stimulus) -> Result<Shadows> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let repeats = {
            let mut seen = self
                .seen
                .entry(stimulus.canonical_json())
                .or_insert(Seen { seq, count: 0 });
            let prior = seen.count;
            seen.count += 1;
            seen.seq = seq;
            prior
        };
        if self.seen.len() > self.capacity {
            let cut = cut_oldest_half(&self.seen, |s| s.seq);
            debug!("Perspective memory over capacity {}, forgot {} stimuli", self.capacity, cut);
        }

        let mut shadows = Shadows::new();
        shadows.insert("locke".into(), self.locke(stimulus));
        shadows.insert("hume".into(), self.hume(repeats));
        shadows.insert("kant".into(), self.kant(stimulus));
        shadows.insert("spinoza".into(), self.spinoza(stimulus));
        Ok(shadows)
    }
}
