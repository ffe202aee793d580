//! Convergence scorer — bounded confidence for one synthesis cycle

use crate::synthesis::LogicState;

const BASE: f64 = 0.85;
const JUMP_BONUS: f64 = 0.14;
const HABIT_BONUS: f64 = 0.08;
const PLURALITY_BONUS: f64 = 0.02;
/// Shadows needed for the plurality bonus
const PLURALITY: usize = 3;
const SIGNAL_GAIN: f64 = 0.001;
const SIGNAL_CAP: f64 = 0.02;
/// Confidence is never reported as fully certain.
pub const CEILING: f64 = 0.99;

/// Score from shadow count, resolved logic, and the neighborhood thought vector.
pub fn convergence_score(shadow_count: usize, logic: &LogicState, thought_vector: &[f64]) -> f64 {
    let mut score = BASE;
    if logic.intuitive_jump_triggered {
        score += JUMP_BONUS;
    } else if logic.custom_habit_active {
        score += HABIT_BONUS;
    }
    if shadow_count >= PLURALITY {
        score += PLURALITY_BONUS;
    }
    let magnitude: f64 = thought_vector
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| v.abs())
        .sum();
    score += (magnitude * SIGNAL_GAIN).min(SIGNAL_CAP);
    score.clamp(0.0, CEILING)
}
