//! Data-driven round configuration
//!
//! One immutable `Tuning` is built before the round starts and handed to
//! every component that needs screen scaling or balance numbers.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};
use crate::sim::difficulty::DifficultyCurve;
use crate::sim::state::ItemKind;

/// Round configuration (screen geometry + balance)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Playfield size in pixels
    pub screen_width: f32,
    pub screen_height: f32,
    /// Size multiplier relative to the 1920x1080 reference
    pub scale_factor: f32,
    /// Ticks per second
    pub sim_rate: f32,
    /// Round length in seconds
    pub round_duration: f32,
    /// Combo grace window in seconds
    pub combo_window: f32,
    /// Chance a regular spawn is Good
    pub good_probability: f64,
    pub good_score: i64,
    pub bad_score: i64,
    pub special_score: i64,
    /// Random delay range for the next special spawn
    pub special_delay_min: f32,
    pub special_delay_max: f32,
    /// Delay before re-offering a missed special
    pub special_retry_delay: f32,
    /// Pacing over the round
    pub difficulty: DifficultyCurve,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            screen_width: REFERENCE_WIDTH,
            screen_height: REFERENCE_HEIGHT,
            scale_factor: 1.0,
            sim_rate: SIM_RATE,
            round_duration: ROUND_DURATION,
            combo_window: COMBO_WINDOW,
            good_probability: GOOD_PROBABILITY,
            good_score: GOOD_SCORE,
            bad_score: BAD_SCORE,
            special_score: SPECIAL_SCORE,
            special_delay_min: SPECIAL_DELAY_MIN,
            special_delay_max: SPECIAL_DELAY_MAX,
            special_retry_delay: SPECIAL_RETRY_DELAY,
            difficulty: DifficultyCurve::default(),
        }
    }
}

impl Tuning {
    /// Default balance for a given display size
    pub fn for_screen(width: f32, height: f32) -> Self {
        Self::default().with_screen(width, height)
    }

    /// Resize the playfield, rescaling sprites against the reference size
    pub fn with_screen(mut self, width: f32, height: f32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self.scale_factor = (width / REFERENCE_WIDTH).min(height / REFERENCE_HEIGHT);
        self
    }

    /// Fixed timestep matching `sim_rate`
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.sim_rate
    }

    /// Score awarded (or deducted) for catching an item of `kind`
    pub fn score_for(&self, kind: ItemKind) -> i64 {
        match kind {
            ItemKind::Good => self.good_score,
            ItemKind::Bad => self.bad_score,
            ItemKind::Special => self.special_score,
        }
    }

    /// Parse and validate a JSON tuning document (missing fields use defaults)
    pub fn from_json_str(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate a JSON tuning file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Reject configurations the simulation cannot run sensibly
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("screen_width", self.screen_width),
            ("screen_height", self.screen_height),
            ("scale_factor", self.scale_factor),
            ("sim_rate", self.sim_rate),
            ("round_duration", self.round_duration),
            ("combo_window", self.combo_window),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidTuning(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.good_probability) {
            return Err(Error::InvalidTuning(format!(
                "good_probability must be within [0, 1], got {}",
                self.good_probability
            )));
        }

        if !(self.special_delay_min >= 0.0 && self.special_delay_min < self.special_delay_max) {
            return Err(Error::InvalidTuning(format!(
                "special delay range [{}, {}) is empty",
                self.special_delay_min, self.special_delay_max
            )));
        }

        if !(self.special_retry_delay.is_finite() && self.special_retry_delay >= 0.0) {
            return Err(Error::InvalidTuning(format!(
                "special_retry_delay must be non-negative, got {}",
                self.special_retry_delay
            )));
        }

        self.difficulty.validate().map_err(Error::InvalidTuning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_screen_uses_smaller_axis() {
        let tuning = Tuning::for_screen(3840.0, 1080.0);
        assert!((tuning.scale_factor - 1.0).abs() < 1e-6);

        let tuning = Tuning::for_screen(960.0, 1080.0);
        assert!((tuning.scale_factor - 0.5).abs() < 1e-6);

        let tuning = Tuning {
            good_score: 20,
            ..Tuning::default()
        }
        .with_screen(1280.0, 720.0);
        assert_eq!(tuning.good_score, 20);
        assert!((tuning.scale_factor - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let tuning = Tuning::from_json_str(r#"{ "round_duration": 30.0, "bad_score": -20 }"#)
            .expect("valid tuning");
        assert_eq!(tuning.round_duration, 30.0);
        assert_eq!(tuning.bad_score, -20);
        assert_eq!(tuning.good_score, GOOD_SCORE);
        assert_eq!(tuning.difficulty, DifficultyCurve::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let tuning = Tuning {
            sim_rate: 0.0,
            ..Tuning::default()
        };
        assert!(matches!(tuning.validate(), Err(Error::InvalidTuning(_))));

        let tuning = Tuning {
            good_probability: 1.5,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_err());

        let tuning = Tuning {
            special_delay_min: 30.0,
            special_delay_max: 20.0,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_err());

        assert!(Tuning::from_json_str(r#"{ "difficulty": [] }"#).is_err());
        assert!(Tuning::from_json_str("not json").is_err());
    }

    #[test]
    fn test_score_for_kind() {
        let tuning = Tuning::default();
        assert_eq!(tuning.score_for(ItemKind::Good), 10);
        assert_eq!(tuning.score_for(ItemKind::Bad), -15);
        assert_eq!(tuning.score_for(ItemKind::Special), 50);
    }
}
