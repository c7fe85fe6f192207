//! Cake Catch - a timed catch-the-falling-items arcade round
//!
//! Core modules:
//! - `sim`: Simulation (difficulty, spawning, kinematics, collisions, combo, clock)
//! - `tuning`: Immutable round configuration (screen scaling, scores, pacing)
//! - `highscores`: Top-5 leaderboard collaborator
//! - `settings`: Persisted player preferences

pub mod error;
pub mod highscores;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{Error, Result};
pub use highscores::Leaderboard;
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Reference resolution all sizes are authored against
    pub const REFERENCE_WIDTH: f32 = 1920.0;
    pub const REFERENCE_HEIGHT: f32 = 1080.0;

    /// Fixed simulation rate (ticks per second, one tick per frame)
    pub const SIM_RATE: f32 = 30.0;
    /// Fixed simulation timestep
    pub const SIM_DT: f32 = 1.0 / SIM_RATE;

    /// Round length in seconds
    pub const ROUND_DURATION: f32 = 60.0;

    /// Combo grace window in seconds
    pub const COMBO_WINDOW: f32 = 4.0;

    /// Score values per item kind
    pub const GOOD_SCORE: i64 = 10;
    pub const BAD_SCORE: i64 = -15;
    pub const SPECIAL_SCORE: i64 = 50;

    /// Probability a regular spawn is a Good item (else Bad)
    pub const GOOD_PROBABILITY: f64 = 0.7;

    /// Fairness schedule for special items (seconds)
    pub const SPECIAL_DELAY_MIN: f32 = 20.0;
    pub const SPECIAL_DELAY_MAX: f32 = 30.0;
    pub const SPECIAL_RETRY_DELAY: f32 = 10.0;

    /// Sprite sizing relative to the reference resolution
    pub const ITEM_BASE_SIZE: f32 = 100.0;
    pub const SPECIAL_BASE_SIZE: f32 = 120.0;
    pub const SPRITE_SCALE: f32 = 1.35;

    /// Base fall speed range (pixels per tick at scale 1.0)
    pub const FALL_SPEED_MIN: f32 = 3.0;
    pub const FALL_SPEED_MAX: f32 = 6.0;

    /// Catcher plate
    pub const PLATE_BASE_WIDTH: f32 = 150.0;
    /// Plate art is 1124x222
    pub const PLATE_ASPECT: f32 = 1124.0 / 222.0;
    /// Distance from the bottom edge to the plate's top
    pub const PLATE_BOTTOM_OFFSET: f32 = 100.0;
    /// Fraction of the remaining distance covered per tick
    pub const PLATE_SMOOTHING: f32 = 0.2;
}

/// Linear interpolation between `start` and `end`
#[inline]
pub fn lerp(start: f32, end: f32, factor: f32) -> f32 {
    start + (end - start) * factor
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
