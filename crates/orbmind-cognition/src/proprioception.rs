//! Proprioceptive navigator — the orb's sense of where it is and where to drift
//!
//! Forces, summed into one raw desire vector:
//! 1. cursor bubble: repel inside `min_safe_distance`, attract beyond
//!    `target_safe_distance`, nothing in between
//! 2. traffic: jitter scaled by habit heat when the orb loiters somewhere busy
//! 3. ambient density: push further from the cursor as the field heats up
//!
//! The vector is not capped here; the renderer owns magnitude limits.

use crate::config::NavigationConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MIN_DT: f64 = 1e-6;

pub struct Navigator {
    config: NavigationConfig,
    position: [f64; 2],
    velocity: [f64; 2],
    rng: StdRng,
}

impl Navigator {
    pub fn new(config: NavigationConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic jitter for reproducible runs.
    pub fn seeded(config: NavigationConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: NavigationConfig, rng: StdRng) -> Self {
        Self {
            position: config.start,
            velocity: [0.0, 0.0],
            config,
            rng,
        }
    }

    pub fn position(&self) -> [f64; 2] {
        self.position
    }

    pub fn velocity(&self) -> [f64; 2] {
        self.velocity
    }

    /// Move to `current`, deriving velocity over `dt` seconds.
    pub fn update_physics(&mut self, current: [f64; 2], dt: f64) {
        let dt = if dt > 0.0 { dt } else { MIN_DT };
        self.velocity = [
            (current[0] - self.position[0]) / dt,
            (current[1] - self.position[1]) / dt,
        ];
        self.position = current;
    }

    pub fn navigation_vector(&mut self, cursor: [f64; 2], habit_heat: f64, gravity_density: f64) -> [f64; 2] {
        let dx = cursor[0] - self.position[0];
        let dy = cursor[1] - self.position[1];
        let dist = dx.hypot(dy);
        if dist == 0.0 {
            return [0.0, 0.0];
        }

        let c = &self.config;
        let force = if dist < c.min_safe_distance {
            -(c.min_safe_distance - dist) / c.min_safe_distance
        } else if dist > c.target_safe_distance {
            c.attraction_gain * (dist - c.target_safe_distance) / c.attraction_scale
        } else {
            0.0
        };

        let (nx, ny) = (dx / dist, dy / dist);
        let mut nav = [nx * force, ny * force];

        if habit_heat > c.heat_jitter_threshold {
            nav[0] += (self.rng.gen::<f64>() - 0.5) * habit_heat;
            nav[1] += (self.rng.gen::<f64>() - 0.5) * habit_heat;
        }

        if gravity_density > 0.0 {
            nav[0] -= nx * gravity_density * c.density_repulsion;
            nav[1] -= ny * gravity_density * c.density_repulsion;
        }
        nav
    }
}
