//! Round orchestration
//!
//! `GameSession::advance` runs one fixed step in this order:
//! clock -> combo decay -> pacing -> special spawn -> regular spawn
//! -> item kinematics + catches -> score/combo -> special miss -> prune.
//!
//! Combo decay runs before catches, so a catch on the tick the window would
//! have closed refreshes the combo instead of losing it, and that tick does
//! not report an expiry.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use super::clock::SessionClock;
use super::collision::{self, Catch};
use super::combo::{ComboTracker, Milestone};
use super::difficulty::Pacing;
use super::spawn::{SpawnScheduler, SpecialSchedule};
use super::state::{Catcher, EntityIds, Item, ItemKind, Rect};
use crate::tuning::Tuning;

/// Reported for every caught item
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CatchEvent {
    pub item_id: u32,
    pub kind: ItemKind,
    pub score_value: i64,
    pub position: Vec2,
    /// Combo count after this catch
    pub combo: u32,
    /// This catch reset an active combo
    pub combo_broken: bool,
}

/// Reported when a combo lands on a milestone
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MilestoneEvent {
    pub milestone: Milestone,
    pub bonus: i64,
    /// Fire the big celebration (once per crossing)
    pub special_visual: bool,
    pub position: Vec2,
}

/// Everything that happened during one `advance`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickResult {
    pub catches: Vec<CatchEvent>,
    pub milestones: Vec<MilestoneEvent>,
    /// The combo window ran out this tick
    pub combo_expired: bool,
    pub terminal: bool,
}

impl TickResult {
    fn terminal() -> Self {
        Self {
            terminal: true,
            ..Self::default()
        }
    }
}

/// One 60 second round
#[derive(Debug, Clone)]
pub struct GameSession<R: Rng = Pcg32> {
    tuning: Tuning,
    rng: R,
    clock: SessionClock,
    spawner: SpawnScheduler,
    combo: ComboTracker,
    items: Vec<Item>,
    ids: EntityIds,
    score: i64,
    pacing: Pacing,
    time_ticks: u64,
}

impl GameSession<Pcg32> {
    /// Start a round with a seeded PCG source
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        log::info!("Round starting with seed {}", seed);
        Self::with_rng(tuning, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> GameSession<R> {
    /// Start a round drawing all randomness from `rng`
    pub fn with_rng(tuning: Tuning, mut rng: R) -> Self {
        if let Err(e) = tuning.validate() {
            log::warn!("Starting round with {}", e);
        }
        let spawner = SpawnScheduler::new(&tuning, &mut rng);
        let pacing = tuning.difficulty.sample(0.0);
        Self {
            clock: SessionClock::new(tuning.round_duration),
            combo: ComboTracker::new(tuning.combo_window),
            spawner,
            items: Vec::new(),
            ids: EntityIds::default(),
            score: 0,
            pacing,
            time_ticks: 0,
            rng,
            tuning,
        }
    }

    /// Advance one tick with the catcher's current box
    pub fn advance(&mut self, dt: f32, catcher: Rect) -> TickResult {
        if self.clock.is_terminal() {
            return TickResult::terminal();
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if self.clock.advance(dt) {
            log::info!(
                "Round over after {} ticks, final score {}",
                self.time_ticks,
                self.score
            );
            return TickResult::terminal();
        }
        self.time_ticks += 1;

        let mut result = TickResult {
            combo_expired: self.combo.decay(dt),
            ..TickResult::default()
        };

        let elapsed = self.clock.elapsed();
        self.pacing = self.tuning.difficulty.sample(elapsed);

        let spawned = self.spawner.update(
            elapsed,
            self.pacing,
            &self.tuning,
            &mut self.ids,
            &mut self.rng,
        );
        self.items.extend(spawned);

        let mut catches = Vec::new();
        for item in &mut self.items {
            item.update(dt);
            if let Some(catch) = collision::try_catch(item, &catcher) {
                catches.push(catch);
            }
        }

        for catch in catches {
            self.apply_catch(catch, elapsed, &mut result);
        }
        if result.catches.iter().any(|c| c.kind.extends_combo()) {
            result.combo_expired = false;
        }

        let screen_height = self.tuning.screen_height;
        let missed: Vec<u32> = self
            .items
            .iter()
            .filter(|i| i.kind == ItemKind::Special && !i.caught && i.is_off_screen(screen_height))
            .map(|i| i.id)
            .collect();
        for id in missed {
            self.spawner.on_special_missed(id, elapsed);
        }

        self.items
            .retain(|i| !i.caught && !i.is_off_screen(screen_height));

        result
    }

    fn apply_catch(&mut self, catch: Catch, elapsed: f32, result: &mut TickResult) {
        self.score += catch.score_value;

        if catch.kind == ItemKind::Special {
            self.spawner
                .on_special_caught(catch.item_id, elapsed, &mut self.rng);
        }

        let update = self.combo.register_catch(catch.kind);
        log::debug!(
            "Caught {:?} #{} ({:+}), combo x{}",
            catch.kind,
            catch.item_id,
            catch.score_value,
            update.count
        );

        result.catches.push(CatchEvent {
            item_id: catch.item_id,
            kind: catch.kind,
            score_value: catch.score_value,
            position: catch.position,
            combo: update.count,
            combo_broken: update.broken,
        });

        if let Some(milestone) = update.milestone {
            self.score += milestone.bonus();
            result.milestones.push(MilestoneEvent {
                milestone,
                bonus: milestone.bonus(),
                special_visual: milestone.special_visual(),
                position: catch.position,
            });
        }
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn remaining_time(&self) -> f32 {
        self.clock.remaining()
    }

    pub fn elapsed_time(&self) -> f32 {
        self.clock.elapsed()
    }

    /// (count, remaining window fraction) for the HUD
    pub fn combo_state(&self) -> (u32, f32) {
        (self.combo.count(), self.combo.timer_fraction())
    }

    /// Consume the one-shot "combo 10" celebration trigger
    pub fn take_special_visual(&mut self) -> bool {
        self.combo.take_special_visual()
    }

    pub fn is_terminal(&self) -> bool {
        self.clock.is_terminal()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn special_schedule(&self) -> &SpecialSchedule {
        self.spawner.special()
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }
}

/// Demo steering: normalized x the plate should head for, if any
///
/// Chases the lowest Good/Special item still above the plate. With nothing
/// worth catching, sidesteps a Bad item about to land on the plate.
pub fn autopilot_target(items: &[Item], catcher: &Catcher, screen_width: f32) -> Option<f32> {
    if screen_width <= 0.0 {
        return None;
    }
    let plate = catcher.rect();
    let above = |i: &&Item| !i.caught && i.rect().top() < plate.bottom();
    let lowest = |a: &&Item, b: &&Item| a.pos.y.total_cmp(&b.pos.y);

    let prize = items
        .iter()
        .filter(above)
        .filter(|i| i.kind.extends_combo())
        .max_by(lowest);
    if let Some(prize) = prize {
        return Some(prize.center().x / screen_width);
    }

    let threat = items
        .iter()
        .filter(above)
        .filter(|i| i.kind == ItemKind::Bad)
        .filter(|i| i.rect().left() < plate.right() && i.rect().right() > plate.left())
        .max_by(lowest)?;

    // Step to whichever side has more room
    let dodge_x = if threat.center().x > screen_width / 2.0 {
        threat.rect().left() - plate.size.x
    } else {
        threat.rect().right() + plate.size.x
    };
    Some((dodge_x / screen_width).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    /// A catcher box far outside the playfield that never overlaps anything
    fn nowhere() -> Rect {
        Rect::new(-10_000.0, -10_000.0, 1.0, 1.0)
    }

    /// Session with no natural spawns so tests control every item
    fn quiet_session() -> GameSession {
        let mut session = GameSession::new(Tuning::default(), 42);
        session.spawner.special_mut().next_spawn_time = f32::INFINITY;
        session.tuning.difficulty = crate::sim::difficulty::DifficultyCurve::new(vec![
            crate::sim::difficulty::DifficultyStage::new(0.0, 1.0, 1_000.0),
        ]);
        session
    }

    /// Drop an item of `kind` straight onto the plate region
    fn drop_on_plate(session: &mut GameSession, kind: ItemKind) -> Rect {
        let id = session.ids.next();
        let item = Item::at(
            id,
            kind,
            Vec2::new(900.0, 950.0),
            Vec2::splat(100.0),
            1.0,
            &session.tuning,
        );
        let rect = item.rect();
        session.items.push(item);
        rect
    }

    #[test]
    fn test_five_goods_in_window_scores_sixty() {
        let mut session = quiet_session();
        let mut milestones = Vec::new();

        for _ in 0..5 {
            let plate = drop_on_plate(&mut session, ItemKind::Good);
            let result = session.advance(SIM_DT, plate);
            assert_eq!(result.catches.len(), 1);
            milestones.extend(result.milestones);
            // Well inside the 4 s window
            for _ in 0..30 {
                session.advance(SIM_DT, nowhere());
            }
        }

        assert_eq!(session.combo_state().0, 5);
        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones[0].milestone, Milestone::Five);
        assert_eq!(milestones[0].bonus, 10);
        assert_eq!(session.score(), 60);
    }

    #[test]
    fn test_good_then_bad_resets_combo() {
        let mut session = quiet_session();

        let plate = drop_on_plate(&mut session, ItemKind::Good);
        session.advance(SIM_DT, plate);
        assert_eq!(session.combo_state().0, 1);

        for _ in 0..30 {
            session.advance(SIM_DT, nowhere());
        }

        let plate = drop_on_plate(&mut session, ItemKind::Bad);
        let result = session.advance(SIM_DT, plate);
        assert!(result.catches[0].combo_broken);
        assert_eq!(session.combo_state(), (0, 0.0));
        assert_eq!(session.score(), -5);
    }

    #[test]
    fn test_combo_expires_without_catches() {
        let mut session = quiet_session();
        let plate = drop_on_plate(&mut session, ItemKind::Good);
        session.advance(SIM_DT, plate);

        let mut expired = 0;
        for _ in 0..150 {
            if session.advance(SIM_DT, nowhere()).combo_expired {
                expired += 1;
            }
        }
        assert_eq!(expired, 1);
        assert_eq!(session.combo_state().0, 0);
    }

    #[test]
    fn test_catch_on_expiry_tick_refreshes_combo() {
        let mut session = quiet_session();
        let plate = drop_on_plate(&mut session, ItemKind::Good);
        session.advance(SIM_DT, plate);

        // Run the window down to just under one tick
        while session.combo.timer() > SIM_DT * 1.5 {
            session.advance(SIM_DT, nowhere());
        }
        assert_eq!(session.combo_state().0, 1);

        // Large dt: decay would expire the combo, but decay runs first
        // and the catch restarts it within the same tick
        let plate = drop_on_plate(&mut session, ItemKind::Good);
        let result = session.advance(SIM_DT * 2.0, plate);
        assert!(!result.combo_expired);
        assert_eq!(result.catches[0].combo, 1);
        assert_eq!(session.combo.timer(), 4.0);
    }

    #[test]
    fn test_zero_combo_window_expires_next_tick() {
        let mut session = quiet_session();
        session.combo = ComboTracker::new(0.0);

        let plate = drop_on_plate(&mut session, ItemKind::Good);
        session.advance(SIM_DT, plate);
        assert_eq!(session.combo_state(), (1, 0.0));

        assert!(session.advance(SIM_DT, nowhere()).combo_expired);
        assert_eq!(session.combo_state().0, 0);
    }

    #[test]
    fn test_ten_combo_special_visual_once() {
        let mut session = quiet_session();
        let mut visuals = 0;
        let mut bonus = 0;
        for _ in 0..12 {
            let plate = drop_on_plate(&mut session, ItemKind::Good);
            let result = session.advance(SIM_DT, plate);
            for m in &result.milestones {
                bonus += m.bonus;
                if m.special_visual {
                    visuals += 1;
                }
            }
        }
        assert_eq!(visuals, 1);
        assert_eq!(bonus, 40);
        assert_eq!(session.score(), 12 * 10 + 40);
        assert!(session.take_special_visual());
        assert!(!session.take_special_visual());
    }

    #[test]
    fn test_simultaneous_catches_each_scored() {
        let mut session = quiet_session();
        drop_on_plate(&mut session, ItemKind::Good);
        drop_on_plate(&mut session, ItemKind::Special);
        let plate = drop_on_plate(&mut session, ItemKind::Bad);

        let result = session.advance(SIM_DT, plate);
        let kinds: Vec<_> = result.catches.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ItemKind::Good, ItemKind::Special, ItemKind::Bad]);
        assert_eq!(session.score(), 10 + 50 - 15);
        assert!(session.items().is_empty());
    }

    /// Let the first special fall untouched; returns (left screen at, retry spawned at)
    fn watch_missed_special(tuning: Tuning, seed: u64) -> (f32, f32) {
        let mut session = GameSession::new(tuning, seed);
        session.spawner.special_mut().next_spawn_time = 0.0;

        let mut missed_at = None;
        while !session.is_terminal() {
            session.advance(SIM_DT, nowhere());
            let schedule = session.special_schedule();
            if missed_at.is_none() && schedule.missed {
                assert_eq!(schedule.total_special_spawned, 1);
                missed_at = Some(session.elapsed_time());
            }
            if schedule.total_special_spawned == 2 {
                let missed_at = missed_at.expect("retry only follows a miss");
                return (missed_at, session.elapsed_time());
            }
        }
        panic!("seed {seed}: special was not retried (missed at {missed_at:?})");
    }

    #[test]
    fn test_missed_special_is_retried() {
        // Slowest specials take more than 10 s to clear a 1080p screen
        for seed in 0..6 {
            let (missed_at, retry_at) = watch_missed_special(Tuning::default(), seed);
            assert!(retry_at - missed_at <= 10.0 + 2.0 * SIM_DT, "seed {seed}");
            assert!(retry_at - missed_at >= 10.0 - SIM_DT, "seed {seed}");
        }
    }

    #[test]
    fn test_missed_special_is_retried_on_portrait_screen() {
        // Every special needs well over 10 s to fall 1920 px, so its
        // interval lapses before it leaves the screen
        let tuning = Tuning {
            special_delay_min: 25.0,
            ..Tuning::for_screen(1080.0, 1920.0)
        };
        for seed in [11, 12, 13] {
            let (missed_at, retry_at) = watch_missed_special(tuning.clone(), seed);
            assert!(missed_at > 10.0, "seed {seed}");
            assert!(retry_at - missed_at <= 10.0 + 2.0 * SIM_DT, "seed {seed}");
        }
    }

    #[test]
    fn test_caught_special_reschedules() {
        let mut session = quiet_session();
        session.spawner.special_mut().next_spawn_time = 0.0;
        session.advance(SIM_DT, nowhere());

        let special = session
            .items()
            .iter()
            .find(|i| i.kind == ItemKind::Special)
            .expect("special spawned")
            .rect();
        let result = session.advance(SIM_DT, Rect::new(special.left(), special.top(), special.size.x, special.size.y + 20.0));
        assert_eq!(result.catches[0].kind, ItemKind::Special);

        let schedule = session.special_schedule();
        assert!(!schedule.spawned_this_interval);
        assert!(!schedule.missed);
        assert!(schedule.next_spawn_time >= 20.0);
        assert_eq!(session.score(), 50);
    }

    #[test]
    fn test_round_terminates_once_and_freezes() {
        let mut session = GameSession::new(Tuning::default(), 3);
        let mut flips = 0;
        let mut last_terminal = false;
        let mut ticks = 0;
        for _ in 0..2000 {
            let result = session.advance(SIM_DT, nowhere());
            ticks += 1;
            if result.terminal && !last_terminal {
                flips += 1;
                assert!((1799..=1801).contains(&ticks), "ended on tick {ticks}");
            }
            last_terminal = result.terminal;
        }
        assert_eq!(flips, 1);
        assert_eq!(session.remaining_time(), 0.0);

        let score = session.score();
        let items = session.items().len();
        let ticks_run = session.time_ticks();
        let result = session.advance(SIM_DT, nowhere());
        assert!(result.terminal);
        assert!(result.catches.is_empty());
        assert_eq!(session.score(), score);
        assert_eq!(session.items().len(), items);
        assert_eq!(session.time_ticks(), ticks_run);
    }

    #[test]
    fn test_items_fall_and_are_pruned() {
        let mut session = GameSession::new(Tuning::default(), 9);
        let mut seen_items = false;
        for _ in 0..(30 * 20) {
            session.advance(SIM_DT, nowhere());
            seen_items |= !session.items().is_empty();
            for item in session.items() {
                assert!(!item.caught);
                assert!(item.pos.y <= 1080.0);
            }
        }
        assert!(seen_items);
        // Nothing caught, nothing scored
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_pacing_tracks_elapsed_time() {
        let mut session = GameSession::new(Tuning::default(), 5);
        for _ in 0..300 {
            session.advance(SIM_DT, nowhere());
        }
        let pacing = session.pacing();
        assert!((pacing.speed_multiplier - 1.5).abs() < 1e-3);
        assert!((pacing.spawn_interval - 1.7).abs() < 1e-3);
    }

    #[test]
    fn test_determinism() {
        // Two sessions with the same seed should produce identical results
        let mut a = GameSession::new(Tuning::default(), 99999);
        let mut b = GameSession::new(Tuning::default(), 99999);
        let mut catcher = Catcher::new(&Tuning::default());

        for tick in 0..900 {
            let target = Some(((tick as f32) * 0.01).sin() * 0.5 + 0.5);
            catcher.update_target(target);
            catcher.update();
            let ra = a.advance(SIM_DT, catcher.rect());
            let rb = b.advance(SIM_DT, catcher.rect());
            assert_eq!(ra, rb);
        }
        assert_eq!(a.score(), b.score());
        assert_eq!(a.items().len(), b.items().len());
    }

    #[test]
    fn test_autopilot_chases_lowest_prize() {
        let tuning = Tuning::default();
        let catcher = Catcher::new(&tuning);
        let items = vec![
            Item::at(1, ItemKind::Good, Vec2::new(100.0, 100.0), Vec2::splat(100.0), 1.0, &tuning),
            Item::at(2, ItemKind::Special, Vec2::new(1500.0, 600.0), Vec2::splat(100.0), 1.0, &tuning),
            Item::at(3, ItemKind::Bad, Vec2::new(900.0, 800.0), Vec2::splat(100.0), 1.0, &tuning),
        ];
        let target = autopilot_target(&items, &catcher, tuning.screen_width).expect("target");
        assert!((target - 1550.0 / 1920.0).abs() < 1e-6);
    }

    #[test]
    fn test_autopilot_dodges_bad() {
        let tuning = Tuning::default();
        let catcher = Catcher::new(&tuning);
        let items = vec![Item::at(
            1,
            ItemKind::Bad,
            Vec2::new(800.0, 700.0),
            Vec2::splat(100.0),
            1.0,
            &tuning,
        )];
        let target = autopilot_target(&items, &catcher, tuning.screen_width).expect("dodge");
        assert!(target * tuning.screen_width > 1020.0);

        assert_eq!(autopilot_target(&[], &catcher, tuning.screen_width), None);
    }
}
