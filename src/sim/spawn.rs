//! Spawn scheduling
//!
//! Two independent streams:
//! - Regular: one Good/Bad item every `spawn_interval` (counted in ticks)
//! - Special: a fairness-guaranteed rare item. A missed special is re-offered
//!   after a fixed retry delay; a caught one (or an interval that passes
//!   quietly) rolls the schedule forward by a fresh random delay.
//!
//! The most recently offered special stays "pending" until it is caught or
//! leaves the screen, even after its interval has rolled forward. A slow
//! special missed late still earns a retry, never later than the interval
//! already scheduled. Catching or missing any other special has no effect on
//! the schedule.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::difficulty::Pacing;
use super::state::{EntityIds, Item, ItemKind};
use crate::tuning::Tuning;

/// Fairness schedule for special items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialSchedule {
    /// Elapsed time at which the next special is due
    pub next_spawn_time: f32,
    /// A special has been offered for the current interval
    pub spawned_this_interval: bool,
    /// The last offered special fell off-screen uncaught
    pub missed: bool,
    pub total_special_spawned: u32,
    /// ID of the last offered special, until it is caught or missed
    pub pending: Option<u32>,
}

/// Convert a spawn interval to whole ticks; non-positive means every tick
pub fn interval_to_ticks(interval_secs: f32, sim_rate: f32) -> u32 {
    if interval_secs > 0.0 && sim_rate > 0.0 {
        (interval_secs * sim_rate) as u32
    } else {
        0
    }
}

/// Decides when and what to spawn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnScheduler {
    /// Ticks since the last regular spawn
    regular_ticks: u32,
    special: SpecialSchedule,
    sim_rate: f32,
    good_probability: f64,
    delay_min: f32,
    delay_max: f32,
    retry_delay: f32,
}

impl SpawnScheduler {
    pub fn new(tuning: &Tuning, rng: &mut impl Rng) -> Self {
        let mut scheduler = Self {
            regular_ticks: 0,
            special: SpecialSchedule {
                next_spawn_time: 0.0,
                spawned_this_interval: false,
                missed: false,
                total_special_spawned: 0,
                pending: None,
            },
            sim_rate: tuning.sim_rate,
            good_probability: tuning.good_probability,
            delay_min: tuning.special_delay_min,
            delay_max: tuning.special_delay_max,
            retry_delay: tuning.special_retry_delay,
        };
        scheduler.special.next_spawn_time = scheduler.roll_delay(rng);
        log::debug!(
            "First special due at {:.2}s",
            scheduler.special.next_spawn_time
        );
        scheduler
    }

    pub fn special(&self) -> &SpecialSchedule {
        &self.special
    }

    #[cfg(test)]
    pub(crate) fn special_mut(&mut self) -> &mut SpecialSchedule {
        &mut self.special
    }

    fn roll_delay(&self, rng: &mut impl Rng) -> f32 {
        if self.delay_max > self.delay_min {
            rng.random_range(self.delay_min..self.delay_max)
        } else {
            self.delay_min
        }
    }

    /// Start a new interval `random delay` after `elapsed`
    fn roll_forward(&mut self, elapsed: f32, rng: &mut impl Rng) {
        self.special.next_spawn_time = elapsed + self.roll_delay(rng);
        self.special.spawned_this_interval = false;
        self.special.missed = false;
        self.special.pending = None;
    }

    /// Emit the items due this tick (special first, then regular)
    pub fn update(
        &mut self,
        elapsed: f32,
        pacing: Pacing,
        tuning: &Tuning,
        ids: &mut EntityIds,
        rng: &mut impl Rng,
    ) -> Vec<Item> {
        let mut spawned = Vec::new();

        // Interval passed with no catch and no miss: move on, but keep
        // tracking the special that is still falling
        if self.special.spawned_this_interval
            && elapsed >= self.special.next_spawn_time + self.retry_delay
        {
            self.special.next_spawn_time = elapsed + self.roll_delay(rng);
            self.special.spawned_this_interval = false;
            self.special.missed = false;
            log::info!(
                "Special interval lapsed, next special at {:.2}s",
                self.special.next_spawn_time
            );
        }

        if !self.special.spawned_this_interval && elapsed >= self.special.next_spawn_time {
            let item = Item::spawn(
                ids.next(),
                ItemKind::Special,
                pacing.speed_multiplier,
                tuning,
                rng,
            );
            self.special.spawned_this_interval = true;
            self.special.pending = Some(item.id);
            self.special.total_special_spawned += 1;
            log::info!(
                "Special #{} spawned at {:.2}s (retry: {})",
                self.special.total_special_spawned,
                elapsed,
                self.special.missed
            );
            spawned.push(item);
        }

        self.regular_ticks += 1;
        if self.regular_ticks >= interval_to_ticks(pacing.spawn_interval, self.sim_rate) {
            self.regular_ticks = 0;
            let kind = if rng.random::<f64>() < self.good_probability {
                ItemKind::Good
            } else {
                ItemKind::Bad
            };
            let item = Item::spawn(ids.next(), kind, pacing.speed_multiplier, tuning, rng);
            log::debug!("Spawned {:?} #{} at x={:.0}", kind, item.id, item.pos.x);
            spawned.push(item);
        }

        spawned
    }

    /// A special was caught; returns true if it was the pending one
    ///
    /// Catching the pending special always cancels any retry and reschedules
    /// from the catch time.
    pub fn on_special_caught(&mut self, id: u32, elapsed: f32, rng: &mut impl Rng) -> bool {
        if self.special.pending != Some(id) {
            return false;
        }
        self.roll_forward(elapsed, rng);
        log::info!(
            "Special caught, next special at {:.2}s",
            self.special.next_spawn_time
        );
        true
    }

    /// A special fell off-screen; returns true if it was the pending one
    ///
    /// The retry comes `retry_delay` after the miss. If the interval already
    /// rolled forward, the earlier of the two times wins.
    pub fn on_special_missed(&mut self, id: u32, elapsed: f32) -> bool {
        if self.special.pending != Some(id) {
            return false;
        }
        let retry_at = elapsed + self.retry_delay;
        self.special.next_spawn_time = if self.special.spawned_this_interval {
            retry_at
        } else {
            self.special.next_spawn_time.min(retry_at)
        };
        self.special.missed = true;
        self.special.spawned_this_interval = false;
        self.special.pending = None;
        log::info!(
            "Special missed, retry at {:.2}s",
            self.special.next_spawn_time
        );
        true
    }
}
