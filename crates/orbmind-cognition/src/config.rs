//! Cognition configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level orb configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbConfig {
    /// Reference frame for quadrant splits and field mapping.
    pub screen: ScreenConfig,
    /// Pattern memory parameters.
    pub habit: HabitConfig,
    /// Necessity detector thresholds.
    pub intuition: IntuitionConfig,
    /// Proprioceptive navigation parameters.
    pub navigation: NavigationConfig,
    /// Spatial field thresholds (owned by the index, injected here).
    pub field: FieldConfig,
    /// Belief seeding and outcome feedback.
    pub beliefs: BeliefConfig,
    /// Correlation envelope diagnostics.
    pub envelope: EnvelopeConfig,
    /// Event loop parameters.
    pub runtime: RuntimeConfig,
    /// Cache bounds of the in-process reference collaborators.
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitConfig {
    /// Ring buffer capacity for recent observations.
    pub buffer_capacity: usize,
    /// Number of trailing quadrants forming a pattern key.
    pub pattern_len: usize,
    /// Occurrence count that maps to frequency 1.0.
    pub frequency_divisor: f64,
    pub temporal_decay: f64,
    /// Prediction confidence above which HABIT is chosen over GUARD_HABIT.
    pub habit_threshold: f64,
    /// Summed occurrence count that maps to heat 1.0.
    pub heat_divisor: f64,
    pub unsure_confidence: f64,
    pub unsure_vivacity: f64,
    pub vivacity_gain: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntuitionConfig {
    /// Live node count above which symmetry is considered.
    pub density_threshold: usize,
    pub symmetry_threshold: f64,
    /// Max |x1 + x2| and |y1 - y2| for two nodes to count as mirror images.
    pub mirror_tolerance: f64,
    pub certainty: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub start: [f64; 2],
    /// Inside this radius the orb is pushed away from the cursor.
    pub min_safe_distance: f64,
    /// Beyond this radius the orb drifts back toward the cursor.
    pub target_safe_distance: f64,
    pub attraction_gain: f64,
    pub attraction_scale: f64,
    pub heat_jitter_threshold: f64,
    pub density_repulsion: f64,
    /// Assumed seconds between physics updates.
    pub physics_dt: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Density at which GUARD is no longer an acceptable mode.
    pub purge_trigger_threshold: usize,
    pub max_field_density: usize,
    /// Node count above which an emergency purge is allowed.
    pub emergency_purge_floor: usize,
    pub neighbor_radius: usize,
    /// Coordinate dimension of the reference index.
    pub dimension: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedPrior {
    pub probability: f64,
    pub strength: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeliefConfig {
    pub habit_continues: SeedPrior,
    pub jump_necessary: SeedPrior,
    pub guard_sufficient: SeedPrior,
    pub seed_reliability: f64,
    pub habit_outcome_weight: f64,
    pub jump_outcome_weight: f64,
    pub guard_outcome_weight: f64,
    /// Fraction of the remaining distance a weight-1.0 outcome moves a prior.
    pub outcome_rate: f64,
    /// Prediction confidence an inductive guess needs to count as a habit success.
    pub habit_success_confidence: f64,
    pub shadow_prior: f64,
    pub shadow_strength: f64,
    /// Posterior above which a guarded mode is promoted to HABIT.
    pub habit_promotion: f64,
    /// Posterior above which any non-jump mode escalates to INTUITION_JUMP.
    pub jump_promotion: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// The three perspectives whose confidences feed the tension diagnostic.
    pub primary_perspectives: Vec<String>,
    pub entropy_threshold: f64,
    pub spread_threshold: f64,
    pub tension_entropy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Cursor ticker period in milliseconds.
    pub tick_ms: u64,
    pub queue_capacity: usize,
    pub output_capacity: usize,
    pub cursor_velocity_cap: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Crystallized thoughts kept for lightning queries. Past this the
    /// oldest half is cut, the same way the grid index purges.
    pub thought_capacity: usize,
    /// Distinct stimuli the perspective bench remembers for repetition.
    pub shadow_capacity: usize,
}

// ============================================================
// Defaults
// ============================================================

impl Default for ScreenConfig {
    fn default() -> Self {
        Self { width: 1920.0, height: 1080.0 }
    }
}

impl Default for HabitConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 5,
            pattern_len: 3,
            frequency_divisor: 10.0,
            temporal_decay: 0.95,
            habit_threshold: 0.35,
            heat_divisor: 100.0,
            unsure_confidence: 0.3,
            unsure_vivacity: 0.4,
            vivacity_gain: 1.2,
        }
    }
}

impl Default for IntuitionConfig {
    fn default() -> Self {
        Self { density_threshold: 50, symmetry_threshold: 0.9, mirror_tolerance: 0.2, certainty: 0.98 }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            start: [960.0, 540.0],
            min_safe_distance: 150.0,
            target_safe_distance: 250.0,
            attraction_gain: 0.5,
            attraction_scale: 1000.0,
            heat_jitter_threshold: 0.5,
            density_repulsion: 0.5,
            physics_dt: 0.1,
        }
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            purge_trigger_threshold: 800,
            max_field_density: 1000,
            emergency_purge_floor: 1000,
            neighbor_radius: 3,
            dimension: 8,
        }
    }
}

impl Default for SeedPrior {
    fn default() -> Self {
        Self { probability: 0.5, strength: 1.0 }
    }
}

impl Default for BeliefConfig {
    fn default() -> Self {
        Self {
            habit_continues: SeedPrior { probability: 0.5, strength: 1.2 },
            jump_necessary: SeedPrior { probability: 0.3, strength: 0.8 },
            guard_sufficient: SeedPrior { probability: 0.7, strength: 1.5 },
            seed_reliability: 0.01,
            habit_outcome_weight: 0.7,
            jump_outcome_weight: 0.6,
            guard_outcome_weight: 0.5,
            outcome_rate: 0.1,
            habit_success_confidence: 0.4,
            shadow_prior: 0.5,
            shadow_strength: 1.0,
            habit_promotion: 0.55,
            jump_promotion: 0.45,
        }
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            primary_perspectives: vec!["spinoza".into(), "kant".into(), "hume".into()],
            entropy_threshold: 1.0,
            spread_threshold: 0.2,
            tension_entropy: 0.9,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { tick_ms: 100, queue_capacity: 1024, output_capacity: 256, cursor_velocity_cap: 50.0 }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { thought_capacity: 2048, shadow_capacity: 4096 }
    }
}

// ============================================================
// Loading
// ============================================================

impl OrbConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {} — using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {} — using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Seed priors as (hypothesis, prior) pairs in a fixed order.
    pub fn seed_priors(&self) -> [(&'static str, &SeedPrior); 3] {
        [
            (crate::belief::HABIT_CONTINUES, &self.beliefs.habit_continues),
            (crate::belief::JUMP_NECESSARY, &self.beliefs.jump_necessary),
            (crate::belief::GUARD_SUFFICIENT, &self.beliefs.guard_sufficient),
        ]
    }
}
