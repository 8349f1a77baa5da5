use bevy::math::Vec2;
use serde::Serialize;

use crate::animation::Animator;
use crate::components::{EntityId, Sprite, Tag};
use crate::geometry::Aabb;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CollectibleKind {
    Coin,
    Gem,
    Potion,
    Cherry,
}

impl CollectibleKind {
    pub fn tag(self) -> Tag {
        match self {
            CollectibleKind::Coin => Tag::Coin,
            CollectibleKind::Gem => Tag::Gem,
            CollectibleKind::Potion => Tag::Potion,
            CollectibleKind::Cherry => Tag::Cherry,
        }
    }

    /// Coin, gem and potion sit on the bottom edge of a placement rectangle;
    /// cherries are placed by their top-left corner.
    pub fn uses_drop_zone(self) -> bool {
        !matches!(self, CollectibleKind::Cherry)
    }
}

#[derive(Clone, Debug)]
pub struct Collectible {
    pub kind: CollectibleKind,
    pub anim: Animator,
}

impl Collectible {
    pub fn new(kind: CollectibleKind, anim: Animator) -> Self {
        Self { kind, anim }
    }

    /// Pickups spin at half the regular animation rate.
    pub fn update(&mut self, sprite: &mut Sprite, dt: f32) {
        sprite.frame = self.anim.advance(dt / 2.0);
    }
}

/// Bounds for a freshly placed pickup of `size`: top-left anchored at the
/// zone's top-left, then dropped so its bottom-left meets the zone's.
pub fn placement(zone: &Aabb, size: Vec2) -> Aabb {
    let mut bounds = Aabb::from_top_left(zone.top_left(), size);
    bounds.set_bottom_left(Vec2::new(zone.left(), zone.bottom()));
    bounds
}

/// Read-only view the player consumes against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickupView {
    pub id: EntityId,
    pub kind: CollectibleKind,
    pub bounds: Aabb,
}
