//! Round simulation module
//!
//! All gameplay logic lives here. This module must stay free of I/O:
//! - Fixed timestep only
//! - One injected RNG per session
//! - Stable iteration order (items in spawn order)
//! - No rendering, audio or tracking dependencies

pub mod clock;
pub mod collision;
pub mod combo;
pub mod difficulty;
pub mod spawn;
pub mod state;
pub mod tick;

pub use clock::SessionClock;
pub use collision::{Catch, resolve_catches, try_catch};
pub use combo::{ComboPhase, ComboTracker, ComboUpdate, Milestone};
pub use difficulty::{DifficultyCurve, DifficultyStage, Pacing, STANDARD_STAGES};
pub use spawn::{SpawnScheduler, SpecialSchedule, interval_to_ticks};
pub use state::{Catcher, EntityIds, Item, ItemKind, Rect};
pub use tick::{CatchEvent, GameSession, MilestoneEvent, TickResult, autopilot_target};
