//! Pattern memory — constant-conjunction tracker for cursor quadrants
//!
//! Keeps the last few observations in a ring buffer. Every time the buffer
//! holds a full pattern, the trailing quadrant sequence is counted locally and
//! a derived prediction is crystallized into the store's posteriori cache.
//! Predictions are read back from the store, never from the local counts.

use crate::collaborators::{CrystalStore, PatternPrediction};
use crate::config::{HabitConfig, ScreenConfig};
use orbmind_core::{Quadrant, Stimulus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, warn};

/// One discretized cursor sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub quadrant: Quadrant,
    pub coords: [f64; 2],
    pub velocity: f64,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictionType {
    QuadrantTransition,
    Unsure,
}

/// Inductive guess about the next discretized state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction_type: PredictionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Quadrant>,
    pub confidence: f64,
    pub vivacity: f64,
}

pub struct HabitTracker {
    config: HabitConfig,
    width: f64,
    height: f64,
    buffer: VecDeque<Observation>,
    /// Process-lifetime occurrence counts, never persisted
    pattern_counts: BTreeMap<String, u32>,
}

impl HabitTracker {
    pub fn new(config: HabitConfig, screen: &ScreenConfig) -> Self {
        let capacity = config.buffer_capacity.max(config.pattern_len).max(1);
        Self {
            config,
            width: screen.width,
            height: screen.height,
            buffer: VecDeque::with_capacity(capacity),
            pattern_counts: BTreeMap::new(),
        }
    }

    pub fn quadrant_of(&self, coords: [f64; 2]) -> Quadrant {
        Quadrant::from_coords(coords, self.width, self.height)
    }

    /// Record a cursor stimulus. Anything else is ignored and yields `None`.
    pub fn record_observation(
        &mut self,
        stimulus: &Stimulus,
        store: &dyn CrystalStore,
    ) -> Option<Observation> {
        if !stimulus.is_cursor() {
            return None;
        }
        let observation = Observation {
            quadrant: self.quadrant_of(stimulus.coordinates),
            coords: stimulus.coordinates,
            velocity: stimulus.velocity,
            timestamp: now_secs(),
        };

        if self.buffer.len() >= self.capacity() {
            self.buffer.pop_front();
        }
        self.buffer.push_back(observation.clone());

        if let Some(key) = self.pattern_key() {
            self.update_conjunction(&key, store);
        }
        Some(observation)
    }

    fn update_conjunction(&mut self, key: &str, store: &dyn CrystalStore) {
        let count = self.pattern_counts.entry(key.to_string()).or_insert(0);
        *count += 1;
        let count = *count;

        let Some(predicted_next) = key.rsplit('_').next().and_then(Quadrant::parse) else {
            return;
        };
        let prediction = PatternPrediction {
            pattern: key.to_string(),
            frequency: (count as f64 / self.config.frequency_divisor).min(1.0),
            predicted_next,
            temporal_decay: self.config.temporal_decay,
        };
        debug!("Pattern {} seen {} times", key, count);
        if let Err(e) = store.crystallize_pattern(&store_key(key), prediction) {
            warn!("Failed to crystallize pattern {}: {}", key, e);
        }
    }

    /// `None` until a full pattern is buffered, then always a prediction.
    pub fn predict_next(&self, store: &dyn CrystalStore) -> Option<Prediction> {
        let key = self.pattern_key()?;
        match store.posteriori(&store_key(&key)) {
            Some(cached) => Some(Prediction {
                prediction_type: PredictionType::QuadrantTransition,
                target: Some(cached.predicted_next),
                confidence: cached.frequency,
                vivacity: (cached.frequency * self.config.vivacity_gain).min(1.0),
            }),
            None => Some(Prediction {
                prediction_type: PredictionType::Unsure,
                target: None,
                confidence: self.config.unsure_confidence,
                vivacity: self.config.unsure_vivacity,
            }),
        }
    }

    /// Approximate traffic through a quadrant, in [0, 1].
    pub fn quadrant_heat(&self, quadrant: Quadrant) -> f64 {
        let hits: u32 = self
            .pattern_counts
            .iter()
            .filter(|(key, _)| key.split('_').any(|part| part == quadrant.as_str()))
            .map(|(_, count)| *count)
            .sum();
        (hits as f64 / self.config.heat_divisor).min(1.0)
    }

    /// Underscore-joined quadrants of the trailing pattern, once enough are buffered.
    pub fn pattern_key(&self) -> Option<String> {
        let len = self.config.pattern_len;
        if len == 0 || self.buffer.len() < len {
            return None;
        }
        let key = self
            .buffer
            .iter()
            .skip(self.buffer.len() - len)
            .map(|o| o.quadrant.as_str())
            .collect::<Vec<_>>()
            .join("_");
        Some(key)
    }

    pub fn occurrences(&self, key: &str) -> u32 {
        self.pattern_counts.get(key).copied().unwrap_or(0)
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.buffer.iter()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.pattern_counts.clear();
    }

    fn capacity(&self) -> usize {
        self.config.buffer_capacity.max(self.config.pattern_len).max(1)
    }
}

fn store_key(pattern: &str) -> String {
    format!("habit_{}", pattern)
}

fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
