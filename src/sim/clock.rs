//! Round clock driven by simulated time, not the wall clock

use serde::{Deserialize, Serialize};

/// Accumulated-time slack so a round of N fixed ticks ends on tick N
const END_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClock {
    /// f64 keeps per-tick accumulation error negligible over a round
    elapsed: f64,
    duration: f64,
    terminal: bool,
}

impl SessionClock {
    pub fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration: f64::from(duration.max(0.0)),
            terminal: false,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    pub fn duration(&self) -> f32 {
        self.duration as f32
    }

    /// Seconds left, never negative
    pub fn remaining(&self) -> f32 {
        if self.terminal {
            return 0.0;
        }
        (self.duration - self.elapsed).max(0.0) as f32
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Add `dt` seconds; returns true on the one call that ends the round
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.terminal {
            return false;
        }
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += f64::from(dt);
        }
        if self.duration - self.elapsed <= END_EPSILON {
            self.elapsed = self.elapsed.max(self.duration);
            self.terminal = true;
            return true;
        }
        false
    }
}
