//! Mode synthesizer — resolves one operating mode per cycle
//!
//! Rules apply in order and later rules override earlier ones:
//!
//! 1. necessity triggered → INTUITION_JUMP, stop
//! 2. inductive confidence above the habit threshold → HABIT, else GUARD_HABIT
//! 3. attach the three mode posteriors
//! 4. guarded mode at purge-trigger density → GUARD_HABIT
//! 5. density at 95% of the field ceiling → INTUITION_JUMP
//! 6. guarded mode with a strong habit posterior → HABIT
//! 7. strong jump posterior → INTUITION_JUMP
//!
//! With no inductive prediction at all, rule 2 leaves the mode at GUARD.

use crate::belief::{BeliefUpdater, GUARD_SUFFICIENT, HABIT_CONTINUES, JUMP_NECESSARY};
use crate::config::{BeliefConfig, FieldConfig, HabitConfig};
use crate::habit::Prediction;
use crate::intuition::NecessityReport;
use orbmind_core::{Mode, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posteriors {
    pub habit: f64,
    pub jump: f64,
    pub guard: f64,
}

/// Everything the synthesizer decided this cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicState {
    pub field_density: usize,
    pub active_mode: Mode,
    pub intuitive_jump_triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub necessity_vector: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certainty: Option<f64>,
    /// Measured bilateral symmetry, reported whether or not a jump fired.
    pub symmetry_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inductive_prediction: Option<Prediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vivacity: Option<f64>,
    pub custom_habit_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posteriors: Option<Posteriors>,
    /// Per-perspective persistence posteriors
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub epistemic_bayes: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub density_penalty: Option<f64>,
    /// GUARD survived a density breach. Should be unreachable.
    pub invariant_violation: bool,
}

impl LogicState {
    pub fn prediction_confidence(&self) -> f64 {
        self.inductive_prediction
            .as_ref()
            .map(|p| p.confidence)
            .unwrap_or(0.0)
    }
}

pub struct ModeSynthesizer {
    habit_threshold: f64,
    habit_promotion: f64,
    jump_promotion: f64,
    purge_trigger_threshold: usize,
    max_field_density: usize,
}

impl ModeSynthesizer {
    pub fn new(habit: &HabitConfig, beliefs: &BeliefConfig, field: &FieldConfig) -> Self {
        Self {
            habit_threshold: habit.habit_threshold,
            habit_promotion: beliefs.habit_promotion,
            jump_promotion: beliefs.jump_promotion,
            purge_trigger_threshold: field.purge_trigger_threshold,
            max_field_density: field.max_field_density,
        }
    }

    pub fn resolve(
        &self,
        necessity: &NecessityReport,
        inductive: Option<&Prediction>,
        beliefs: &BeliefUpdater,
        epistemic_bayes: BTreeMap<String, f64>,
        density: usize,
    ) -> Result<LogicState> {
        let mut state = LogicState {
            field_density: density,
            active_mode: Mode::Guard,
            symmetry_score: necessity.symmetry_score,
            ..LogicState::default()
        };

        // 1
        if necessity.jump_triggered {
            state.intuitive_jump_triggered = true;
            state.necessity_vector = necessity.necessity_vector;
            state.certainty = Some(necessity.certainty);
            state.active_mode = Mode::IntuitionJump;
            return Ok(state);
        }

        // 2
        if let Some(prediction) = inductive {
            let habitual = prediction.confidence > self.habit_threshold;
            state.inductive_prediction = Some(prediction.clone());
            state.vivacity = Some(prediction.vivacity);
            state.custom_habit_active = habitual;
            state.active_mode = if habitual { Mode::Habit } else { Mode::GuardHabit };
        }

        // 3
        let posteriors = Posteriors {
            habit: beliefs.posterior(HABIT_CONTINUES)?,
            jump: beliefs.posterior(JUMP_NECESSARY)?,
            guard: beliefs.posterior(GUARD_SUFFICIENT)?,
        };
        state.posteriors = Some(posteriors);
        state.epistemic_bayes = epistemic_bayes;

        // 4
        if state.active_mode.is_guarded() && density >= self.purge_trigger_threshold {
            state.active_mode = Mode::GuardHabit;
            state.density_penalty = Some(1.0);
            warn!("GUARD invalidated: density {} → forced GUARD_HABIT", density);
        }

        // 5
        if density as f64 >= self.max_field_density as f64 * 0.95
            && state.active_mode != Mode::IntuitionJump
        {
            state.active_mode = Mode::IntuitionJump;
            state.density_penalty = Some(1.5);
            warn!("Emergency jump: critical density {}", density);
        }

        // 6
        if state.active_mode.is_guarded() && posteriors.habit > self.habit_promotion {
            state.active_mode = Mode::Habit;
        }

        // 7
        if state.active_mode != Mode::IntuitionJump && posteriors.jump > self.jump_promotion {
            state.active_mode = Mode::IntuitionJump;
        }

        if density >= self.purge_trigger_threshold && state.active_mode == Mode::Guard {
            state.invariant_violation = true;
            error!("CRITICAL: GUARD survived density breach ({}), enforcement failed", density);
        }
        Ok(state)
    }
}
