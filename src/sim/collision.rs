//! Catch detection between the plate and falling items
//!
//! Plain AABB overlap against the unrotated item box. An item is caught at
//! most once; every overlapping item in a tick is caught independently.

use glam::Vec2;

use super::state::{Item, ItemKind, Rect};

/// A single resolved catch, reported to the orchestrator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Catch {
    pub item_id: u32,
    pub kind: ItemKind,
    pub score_value: i64,
    /// Item center at the moment of the catch
    pub position: Vec2,
}

/// Mark `item` caught if it overlaps the catcher
pub fn try_catch(item: &mut Item, catcher: &Rect) -> Option<Catch> {
    if item.caught || !item.rect().intersects(catcher) {
        return None;
    }
    item.caught = true;
    Some(Catch {
        item_id: item.id,
        kind: item.kind,
        score_value: item.score_value,
        position: item.center(),
    })
}

/// Resolve every live item against the catcher, in item order
pub fn resolve_catches(items: &mut [Item], catcher: &Rect) -> Vec<Catch> {
    items
        .iter_mut()
        .filter_map(|item| try_catch(item, catcher))
        .collect()
}
