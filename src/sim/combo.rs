//! Combo counter with a decaying grace window
//!
//! ```text
//! Idle --good/special--> Active(1, window)
//! Active --good/special--> Active(n+1, window)   timer resets, never accumulates
//! Active --bad--> Idle
//! Active --timer hits 0--> Idle
//! ```
//!
//! Milestones are edge-triggered on the catch that moves the count onto them.

use serde::{Deserialize, Serialize};

use super::state::ItemKind;

/// Combo thresholds that pay a one-time bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Milestone {
    Five,
    Ten,
}

impl Milestone {
    /// Milestone reached exactly at `count`, if any
    pub fn at_count(count: u32) -> Option<Self> {
        match count {
            5 => Some(Milestone::Five),
            10 => Some(Milestone::Ten),
            _ => None,
        }
    }

    pub fn count(self) -> u32 {
        match self {
            Milestone::Five => 5,
            Milestone::Ten => 10,
        }
    }

    pub fn bonus(self) -> i64 {
        match self {
            Milestone::Five => 10,
            Milestone::Ten => 30,
        }
    }

    /// Whether this milestone also fires the big celebration
    pub fn special_visual(self) -> bool {
        matches!(self, Milestone::Ten)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboPhase {
    Idle,
    Active,
}

/// Result of feeding one catch into the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboUpdate {
    /// Count after the catch
    pub count: u32,
    pub milestone: Option<Milestone>,
    /// An active combo was reset by this catch
    pub broken: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboTracker {
    count: u32,
    /// Seconds left in the window, 0 when idle
    timer: f32,
    max_window: f32,
    /// Set on reaching Ten, cleared by `take_special_visual`
    special_visual_pending: bool,
}

impl ComboTracker {
    pub fn new(max_window: f32) -> Self {
        Self {
            count: 0,
            timer: 0.0,
            max_window,
            special_visual_pending: false,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn max_window(&self) -> f32 {
        self.max_window
    }

    /// Remaining window as a fraction of the full window (for the HUD bar)
    pub fn timer_fraction(&self) -> f32 {
        if self.max_window > 0.0 {
            (self.timer / self.max_window).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn phase(&self) -> ComboPhase {
        if self.count > 0 {
            ComboPhase::Active
        } else {
            ComboPhase::Idle
        }
    }

    fn reset(&mut self) {
        self.count = 0;
        self.timer = 0.0;
    }

    /// Run the window down; returns true if the combo expired this call
    ///
    /// An active combo with no window left (a non-positive `max_window`)
    /// expires on the next call.
    pub fn decay(&mut self, dt: f32) -> bool {
        if self.count == 0 {
            return false;
        }
        self.timer -= dt.max(0.0);
        if self.timer <= 0.0 {
            log::debug!("Combo x{} expired", self.count);
            self.reset();
            return true;
        }
        false
    }

    /// Feed a catch of `kind`
    pub fn register_catch(&mut self, kind: ItemKind) -> ComboUpdate {
        if kind.extends_combo() {
            self.count += 1;
            self.timer = self.max_window.max(0.0);
            let milestone = Milestone::at_count(self.count);
            if let Some(m) = milestone {
                if m.special_visual() {
                    self.special_visual_pending = true;
                }
                log::info!("Combo milestone x{} (+{})", m.count(), m.bonus());
            }
            ComboUpdate {
                count: self.count,
                milestone,
                broken: false,
            }
        } else {
            let broken = self.count > 0;
            if broken {
                log::debug!("Combo x{} broken", self.count);
            }
            self.reset();
            ComboUpdate {
                count: 0,
                milestone: None,
                broken,
            }
        }
    }

    /// Consume the one-shot celebration trigger
    pub fn take_special_visual(&mut self) -> bool {
        std::mem::take(&mut self.special_visual_pending)
    }
}
