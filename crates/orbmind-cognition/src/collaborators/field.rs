//! Ambient field — a decaying activity grid fed by cursor stimuli
//!
//! Each call steps the field once: every cell decays, a cursor stimulus
//! injects intensity at its mapped cell, and the mean activity is smoothed
//! into `renewal_pressure`.

use super::{FieldBridge, FieldStats};
use crate::config::ScreenConfig;
use orbmind_core::{Error, Result, Stimulus};
use std::sync::Mutex;

pub const FIELD_DIM: usize = 32;
const DECAY: f64 = 0.95;
/// EMA weight of the newest sample (~300ms at 10Hz)
const SMOOTHING: f64 = 0.2;
const ACTIVE_EPSILON: f64 = 1e-3;

struct FieldState {
    grid: Vec<f64>,
    smoothed: f64,
    step: u64,
}

pub struct AmbientField {
    width: f64,
    height: f64,
    state: Mutex<FieldState>,
}

impl AmbientField {
    pub fn new(screen: &ScreenConfig) -> Self {
        Self {
            width: screen.width,
            height: screen.height,
            state: Mutex::new(FieldState {
                grid: vec![0.0; FIELD_DIM * FIELD_DIM],
                smoothed: 0.0,
                step: 0,
            }),
        }
    }

    fn cell(&self, coords: [f64; 2]) -> (usize, usize) {
        let max = (FIELD_DIM - 1) as f64;
        let x = ((coords[0] / self.width) * max).clamp(0.0, max) as usize;
        let y = ((coords[1] / self.height) * max).clamp(0.0, max) as usize;
        (x, y)
    }
}

impl FieldBridge for AmbientField {
    fn stimulus_to_field_stats(&self, stimulus: &Stimulus) -> Result<FieldStats> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| Error::collaborator("ambient_field", e.to_string()))?;

        state.step += 1;
        state.grid.iter_mut().for_each(|v| *v *= DECAY);

        if stimulus.is_cursor() {
            let (x, y) = self.cell(stimulus.coordinates);
            let intensity = (stimulus.velocity / 10.0).min(1.0);
            let cell = &mut state.grid[y * FIELD_DIM + x];
            *cell = (*cell + intensity).min(1.0);
        }

        let total_energy: f64 = state.grid.iter().sum();
        let active_cells = state.grid.iter().filter(|v| **v > ACTIVE_EPSILON).count();
        let mean = total_energy / state.grid.len() as f64;
        state.smoothed = state.smoothed * (1.0 - SMOOTHING) + mean * SMOOTHING;

        let mut stats = FieldStats {
            renewal_pressure: state.smoothed,
            extra: serde_json::Map::new(),
        };
        stats.extra.insert("total_energy".into(), total_energy.into());
        stats.extra.insert("active_cells".into(), active_cells.into());
        stats.extra.insert("step".into(), state.step.into());
        Ok(stats)
    }
}
