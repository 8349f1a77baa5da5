use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::collectible::Collectible;
use crate::enemy::{Enemy, EnemyKind};
use crate::geometry::Aabb;
use crate::player::Player;
use crate::portal::Portal;
use crate::projectile::{MuzzleFlash, Projectile};

/// Stable handle into the registry. Never reused within a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(pub u64);

/// Logical membership sets. An entity may belong to several at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    Render,
    Collectible,
    Projectile,
    Enemy,
    Portal,
}

impl Group {
    pub const ALL: [Group; 5] = [
        Group::Render,
        Group::Collectible,
        Group::Projectile,
        Group::Enemy,
        Group::Portal,
    ];
}

/// Opaque handle to a visual frame owned by the asset collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize)]
pub struct FrameId(pub u32);

/// Shared, read-only frame sequence.
pub type FrameSet = Arc<[FrameId]>;

pub fn frame_set(ids: impl IntoIterator<Item = u32>) -> FrameSet {
    ids.into_iter().map(FrameId).collect()
}

/// What a renderer should draw for an entity this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub struct Frame {
    pub id: FrameId,
    pub flip_x: bool,
    /// Mask rendering of `id` (solid silhouette, black keyed out).
    pub silhouette: bool,
}

impl Frame {
    pub fn plain(id: FrameId) -> Self {
        Self {
            id,
            flip_x: false,
            silhouette: false,
        }
    }

    pub fn flipped(mut self, flip_x: bool) -> Self {
        self.flip_x = flip_x;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

impl Facing {
    pub fn from_flip(flip: bool) -> Self {
        if flip {
            Facing::Left
        } else {
            Facing::Right
        }
    }

    pub fn sign(self) -> f32 {
        match self {
            Facing::Right => 1.0,
            Facing::Left => -1.0,
        }
    }

    pub fn is_left(self) -> bool {
        self == Facing::Left
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    pub bounds: Aabb,
    pub frame: Frame,
}

/// Per-frame timing handed to every update call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Simulated monotonic time after this frame's advance.
    pub now: Duration,
}

/// Flat behavior tag used for dispatch and cross-entity branch logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Tag {
    Player,
    Flyer,
    Crawler,
    Coin,
    Gem,
    Potion,
    Cherry,
    Projectile,
    MuzzleFlash,
    Portal,
}

/// Per-kind state carried next to the shared sprite.
#[derive(Debug)]
pub enum Body {
    Player(Box<Player>),
    Enemy(Enemy),
    Collectible(Collectible),
    Projectile(Projectile),
    MuzzleFlash(MuzzleFlash),
    Portal(Portal),
}

#[derive(Debug)]
pub struct SimEntity {
    pub id: EntityId,
    pub sprite: Sprite,
    pub body: Body,
}

impl SimEntity {
    pub fn tag(&self) -> Tag {
        match &self.body {
            Body::Player(_) => Tag::Player,
            Body::Enemy(enemy) => match enemy.kind() {
                EnemyKind::Flyer => Tag::Flyer,
                EnemyKind::Crawler => Tag::Crawler,
            },
            Body::Collectible(item) => item.kind.tag(),
            Body::Projectile(_) => Tag::Projectile,
            Body::MuzzleFlash(_) => Tag::MuzzleFlash,
            Body::Portal(_) => Tag::Portal,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.sprite.bounds
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.body {
            Body::Player(player) => Some(&**player),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.body {
            Body::Player(player) => Some(&mut **player),
            _ => None,
        }
    }

    pub fn as_enemy(&self) -> Option<&Enemy> {
        match &self.body {
            Body::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }

    pub fn as_collectible(&self) -> Option<&Collectible> {
        match &self.body {
            Body::Collectible(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_portal(&self) -> Option<&Portal> {
        match &self.body {
            Body::Portal(portal) => Some(portal),
            _ => None,
        }
    }
}
