//! Cursor velocity from successive position samples

use orbmind_core::Stimulus;
use std::time::Instant;

/// Shortest interval between samples, in seconds.
const MIN_DT: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorSample {
    pub x: f64,
    pub y: f64,
    pub velocity: f64,
}

impl CursorSample {
    pub fn to_stimulus(&self) -> Stimulus {
        Stimulus::cursor(self.x, self.y, self.velocity)
    }
}

pub struct CursorTracker {
    last: Option<(f64, f64, Instant)>,
    velocity_cap: f64,
}

impl CursorTracker {
    pub fn new(velocity_cap: f64) -> Self {
        Self {
            last: None,
            velocity_cap,
        }
    }

    pub fn sample(&mut self, x: f64, y: f64) -> CursorSample {
        self.sample_at(x, y, Instant::now())
    }

    /// The first sample has zero velocity.
    pub fn sample_at(&mut self, x: f64, y: f64, at: Instant) -> CursorSample {
        let velocity = match self.last {
            Some((px, py, prev)) => {
                let dt = at.saturating_duration_since(prev).as_secs_f64().max(MIN_DT);
                ((x - px).hypot(y - py) / dt).min(self.velocity_cap)
            }
            None => 0.0,
        };
        self.last = Some((x, y, at));
        CursorSample { x, y, velocity }
    }
}
