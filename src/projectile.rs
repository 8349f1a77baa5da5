use std::time::Duration;

use bevy::math::Vec2;

use crate::components::{EntityId, Facing, Sprite};
use crate::config::ProjectileTuning;
use crate::geometry::Aabb;
use crate::timer::CooldownTimer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifetime {
    Live,
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    pub facing: Facing,
    pub speed: f32,
    /// Right edge of the level; despawn margins are measured from 0 and here.
    pub level_width: f32,
    pub margin: f32,
}

impl Projectile {
    pub fn new(facing: Facing, level_width: f32, tuning: &ProjectileTuning) -> Self {
        Self {
            facing,
            speed: tuning.speed,
            level_width,
            margin: tuning.despawn_margin,
        }
    }

    pub fn update(&self, sprite: &mut Sprite, dt: f32) -> Lifetime {
        sprite.bounds.translate(self.facing.sign() * self.speed * dt, 0.0);
        let x = sprite.bounds.left();
        if x < -self.margin || x > self.level_width + self.margin {
            Lifetime::Expired
        } else {
            Lifetime::Live
        }
    }
}

/// Short-lived flash glued to the shooter's leading edge.
#[derive(Debug)]
pub struct MuzzleFlash {
    pub owner: EntityId,
    /// Shooter facing when the flash was created.
    pub facing: Facing,
    y_offset: f32,
    timer: CooldownTimer,
}

impl MuzzleFlash {
    pub fn new(owner: EntityId, facing: Facing, tuning: &ProjectileTuning, now: Duration) -> Self {
        Self {
            owner,
            facing,
            y_offset: tuning.flash_y_offset,
            timer: CooldownTimer::from_millis(tuning.flash_lifetime_ms).autostart(now),
        }
    }

    /// Places `bounds` against the shooter's leading edge for `facing`.
    pub fn attach(bounds: &mut Aabb, shooter: &Aabb, facing: Facing, y_offset: f32) {
        let offset = Vec2::new(0.0, y_offset);
        if facing.is_left() {
            bounds.set_mid_right(shooter.mid_left() + offset);
        } else {
            bounds.set_mid_left(shooter.mid_right() + offset);
        }
    }

    /// `shooter` is the owner's current bounds and facing, or `None` once the
    /// owner is gone.
    pub fn update(
        &mut self,
        sprite: &mut Sprite,
        now: Duration,
        shooter: Option<(Aabb, Facing)>,
    ) -> Lifetime {
        if self.timer.update(now) {
            return Lifetime::Expired;
        }
        let Some((bounds, facing)) = shooter else {
            return Lifetime::Expired;
        };
        Self::attach(&mut sprite.bounds, &bounds, facing, self.y_offset);
        if facing != self.facing {
            return Lifetime::Expired;
        }
        Lifetime::Live
    }
}
