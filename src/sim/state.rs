//! Entity types for the round: falling items and the catcher plate

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::tuning::Tuning;
use crate::{lerp, normalize_degrees};

/// Item categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Regular treat, extends the combo
    Good,
    /// Hazard, breaks the combo
    Bad,
    /// Rare high-value treat on the fairness schedule
    Special,
}

impl ItemKind {
    /// Whether catching this kind extends the combo
    pub fn extends_combo(self) -> bool {
        matches!(self, ItemKind::Good | ItemKind::Special)
    }

    fn base_size(self) -> f32 {
        match self {
            ItemKind::Special => SPECIAL_BASE_SIZE,
            _ => ITEM_BASE_SIZE,
        }
    }

    /// Spin ranges: (|angular velocity| deg/s, per-tick friction)
    ///
    /// Bad items tumble fast and keep spinning; specials turn slowly.
    fn spin_ranges(self) -> ((f32, f32), (f32, f32)) {
        match self {
            ItemKind::Good => ((40.0, 120.0), (0.985, 0.995)),
            ItemKind::Bad => ((150.0, 300.0), (0.995, 0.999)),
            ItemKind::Special => ((10.0, 40.0), (0.97, 0.985)),
        }
    }
}

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    pub fn left(&self) -> f32 {
        self.pos.x
    }

    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    pub fn top(&self) -> f32 {
        self.pos.y
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap: rectangles that only share an edge do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

/// Monotonic entity ID allocator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityIds {
    next_id: u32,
}

impl Default for EntityIds {
    fn default() -> Self {
        Self { next_id: 1 }
    }
}

impl EntityIds {
    pub fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// A falling item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub kind: ItemKind,
    /// Top-left corner of the unrotated sprite
    pub pos: Vec2,
    /// Unrotated sprite extents (also the collision box)
    pub size: Vec2,
    /// Fall distance per tick
    pub speed: f32,
    /// Degrees, kept in [0, 360)
    pub rotation: f32,
    /// Degrees per second
    pub angular_velocity: f32,
    /// Per-tick decay factor for `angular_velocity` (< 1)
    pub angular_friction: f32,
    pub caught: bool,
    pub score_value: i64,
}

impl Item {
    /// Roll a new item of `kind` just above the top edge
    pub fn spawn(
        id: u32,
        kind: ItemKind,
        speed_multiplier: f32,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) -> Self {
        let side = (kind.base_size() * tuning.scale_factor * SPRITE_SCALE).floor();

        // Keep a full sprite width of margin on both sides
        let min_x = side as i64;
        let max_x = ((tuning.screen_width - side) as i64).max(min_x);
        let x = rng.random_range(min_x..=max_x) as f32;

        let base_speed = rng.random_range(FALL_SPEED_MIN..FALL_SPEED_MAX) * tuning.scale_factor;

        let ((spin_min, spin_max), (friction_min, friction_max)) = kind.spin_ranges();
        let spin = rng.random_range(spin_min..spin_max);
        let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };

        Self {
            id,
            kind,
            pos: Vec2::new(x, -side),
            size: Vec2::splat(side),
            speed: base_speed * speed_multiplier,
            rotation: rng.random_range(0.0..360.0),
            angular_velocity: spin * direction,
            angular_friction: rng.random_range(friction_min..friction_max),
            caught: false,
            score_value: tuning.score_for(kind),
        }
    }

    /// Build an item at an explicit position with no spin
    pub fn at(id: u32, kind: ItemKind, pos: Vec2, size: Vec2, speed: f32, tuning: &Tuning) -> Self {
        Self {
            id,
            kind,
            pos,
            size,
            speed,
            rotation: 0.0,
            angular_velocity: 0.0,
            angular_friction: 1.0,
            caught: false,
            score_value: tuning.score_for(kind),
        }
    }

    /// Advance one tick
    ///
    /// Fall distance is per tick (tied to the fixed simulation rate); spin
    /// integrates over `dt` and decays geometrically.
    pub fn update(&mut self, dt: f32) {
        self.pos.y += self.speed;
        self.rotation = normalize_degrees(self.rotation + self.angular_velocity * dt);
        self.angular_velocity *= self.angular_friction;
    }

    /// Collision box (rotation never grows it)
    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// True once the item's top edge has passed the bottom of the screen
    pub fn is_off_screen(&self, screen_height: f32) -> bool {
        self.pos.y > screen_height
    }
}

/// The player's plate, steered by a normalized horizontal target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catcher {
    /// Horizontal center
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Where the plate is heading (pixels, already clamped)
    pub target_x: f32,
    screen_width: f32,
}

impl Catcher {
    pub fn new(tuning: &Tuning) -> Self {
        let width = (PLATE_BASE_WIDTH * tuning.scale_factor * SPRITE_SCALE).floor();
        let height = (width / PLATE_ASPECT).floor() * SPRITE_SCALE;
        let x = tuning.screen_width / 2.0;
        Self {
            x,
            y: tuning.screen_height - PLATE_BOTTOM_OFFSET,
            width,
            height,
            target_x: x,
            screen_width: tuning.screen_width,
        }
    }

    /// Feed a tracking sample in [0, 1]; `None` keeps the last target
    pub fn update_target(&mut self, normalized_x: Option<f32>) {
        let Some(nx) = normalized_x.filter(|v| v.is_finite()) else {
            return;
        };
        let half = self.width / 2.0;
        let target = nx.clamp(0.0, 1.0) * self.screen_width;
        self.target_x = target.clamp(half, (self.screen_width - half).max(half));
    }

    /// Ease toward the target
    pub fn update(&mut self) {
        self.x = lerp(self.x, self.target_x, PLATE_SMOOTHING);
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x - self.width / 2.0, self.y, self.width, self.height)
    }
}
