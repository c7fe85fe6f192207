//! Time-based difficulty curve
//!
//! Pacing is a pure function of elapsed round time: a piecewise-linear ramp
//! through ordered stages, flat past the last one.

use serde::{Deserialize, Serialize};

use crate::lerp;

/// One anchor point of the difficulty ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyStage {
    /// Elapsed seconds at which this stage's values apply exactly
    pub threshold: f32,
    /// Multiplier applied to a new item's base fall speed
    pub speed_multiplier: f32,
    /// Seconds between regular spawns
    pub spawn_interval: f32,
}

impl DifficultyStage {
    pub const fn new(threshold: f32, speed_multiplier: f32, spawn_interval: f32) -> Self {
        Self {
            threshold,
            speed_multiplier,
            spawn_interval,
        }
    }

    fn pacing(&self) -> Pacing {
        Pacing {
            speed_multiplier: self.speed_multiplier,
            spawn_interval: self.spawn_interval,
        }
    }
}

/// Standard four-stage ramp over a 60 second round
pub const STANDARD_STAGES: [DifficultyStage; 4] = [
    DifficultyStage::new(0.0, 1.3, 2.0),
    DifficultyStage::new(10.0, 1.5, 1.7),
    DifficultyStage::new(30.0, 1.8, 1.4),
    DifficultyStage::new(45.0, 2.1, 1.1),
];

/// Output of the curve for a given moment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pacing {
    pub speed_multiplier: f32,
    pub spawn_interval: f32,
}

impl Pacing {
    /// Used only if a curve has no stages at all
    pub const NEUTRAL: Pacing = Pacing {
        speed_multiplier: 1.0,
        spawn_interval: 2.0,
    };
}

/// Ordered stages, never mutated after construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifficultyCurve {
    stages: Vec<DifficultyStage>,
}

impl Default for DifficultyCurve {
    fn default() -> Self {
        Self {
            stages: STANDARD_STAGES.to_vec(),
        }
    }
}

impl DifficultyCurve {
    pub fn new(stages: Vec<DifficultyStage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[DifficultyStage] {
        &self.stages
    }

    /// Check stage ordering; returns a human-readable reason on failure
    pub fn validate(&self) -> Result<(), String> {
        if self.stages.is_empty() {
            return Err("difficulty curve needs at least one stage".to_string());
        }
        for stage in &self.stages {
            if !(stage.threshold.is_finite()
                && stage.speed_multiplier.is_finite()
                && stage.spawn_interval.is_finite())
            {
                return Err(format!("non-finite difficulty stage {stage:?}"));
            }
            // A stalled item would never leave the screen
            if stage.speed_multiplier <= 0.0 {
                return Err(format!(
                    "speed multiplier must be positive, got {}",
                    stage.speed_multiplier
                ));
            }
        }
        for pair in self.stages.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(format!(
                    "difficulty thresholds must strictly ascend ({} then {})",
                    pair[0].threshold, pair[1].threshold
                ));
            }
        }
        Ok(())
    }

    /// Pacing at `elapsed` seconds into the round
    ///
    /// Times before the first stage clamp to it; times at or past the last
    /// stage return the last stage unchanged. Exactly at a threshold the
    /// stage's own values come back with no interpolation error.
    pub fn sample(&self, elapsed: f32) -> Pacing {
        let (Some(first), Some(last)) = (self.stages.first(), self.stages.last()) else {
            return Pacing::NEUTRAL;
        };

        // NaN compares false everywhere; treat it as round start
        let elapsed = if elapsed.is_nan() { first.threshold } else { elapsed };

        if elapsed <= first.threshold {
            return first.pacing();
        }
        if elapsed >= last.threshold {
            return last.pacing();
        }

        // first.threshold < elapsed < last.threshold, so 1 <= idx < len
        let idx = self.stages.partition_point(|s| s.threshold <= elapsed);
        let lo = &self.stages[idx - 1];
        let hi = &self.stages[idx];

        let span = hi.threshold - lo.threshold;
        let factor = ((elapsed - lo.threshold) / span).clamp(0.0, 1.0);

        Pacing {
            speed_multiplier: lerp(lo.speed_multiplier, hi.speed_multiplier, factor),
            spawn_interval: lerp(lo.spawn_interval, hi.spawn_interval, factor),
        }
    }
}
