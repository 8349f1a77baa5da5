use std::time::Duration;

use bevy::math::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::animation::Animator;
use crate::collectible::{self, Collectible, CollectibleKind};
use crate::components::{frame_set, Body, EntityId, Frame, FrameSet, Group, Sprite};
use crate::config::{EnemyTuning, PlayerTuning, ProjectileTuning, SpawnerTuning};
use crate::enemy::Enemy;
use crate::geometry::Aabb;
use crate::player::{Player, ShotRequest};
use crate::portal::{Portal, PortalKind, PortalLinks};
use crate::projectile::{MuzzleFlash, Projectile};
use crate::registry::Registry;
use crate::timer::CooldownTimer;

/// Frame sequence plus the pixel size of its frames.
#[derive(Clone, Debug)]
pub struct SpriteSheet {
    pub frames: FrameSet,
    pub size: Vec2,
}

impl SpriteSheet {
    pub fn new(ids: impl IntoIterator<Item = u32>, width: f32, height: f32) -> Self {
        Self {
            frames: frame_set(ids),
            size: Vec2::new(width, height),
        }
    }

    pub fn animator(&self) -> Result<Animator, String> {
        Animator::new(self.frames.clone())
    }

    fn first_frame(&self) -> Result<Frame, String> {
        self.frames
            .first()
            .copied()
            .map(Frame::plain)
            .ok_or_else(|| "sprite sheet has no frames".to_string())
    }
}

/// Everything the asset collaborator hands the core: frame handles and sizes
/// per entity kind.
#[derive(Clone, Debug)]
pub struct FrameBank {
    pub player: SpriteSheet,
    pub flyer: SpriteSheet,
    pub crawler: SpriteSheet,
    pub coin: SpriteSheet,
    pub gem: SpriteSheet,
    pub potion: SpriteSheet,
    pub cherry: SpriteSheet,
    pub projectile: SpriteSheet,
    pub muzzle_flash: SpriteSheet,
    pub portal: SpriteSheet,
}

impl FrameBank {
    pub fn collectible(&self, kind: CollectibleKind) -> &SpriteSheet {
        match kind {
            CollectibleKind::Coin => &self.coin,
            CollectibleKind::Gem => &self.gem,
            CollectibleKind::Potion => &self.potion,
            CollectibleKind::Cherry => &self.cherry,
        }
    }
}

impl Default for FrameBank {
    /// Placeholder handles for headless runs.
    fn default() -> Self {
        Self {
            player: SpriteSheet::new(0..4, 48.0, 56.0),
            flyer: SpriteSheet::new(10..12, 56.0, 48.0),
            crawler: SpriteSheet::new(20..24, 48.0, 32.0),
            coin: SpriteSheet::new(30..36, 16.0, 16.0),
            gem: SpriteSheet::new(40..44, 24.0, 24.0),
            potion: SpriteSheet::new(50..59, 20.0, 28.0),
            cherry: SpriteSheet::new([60], 32.0, 32.0),
            projectile: SpriteSheet::new([70], 16.0, 8.0),
            muzzle_flash: SpriteSheet::new([71], 24.0, 16.0),
            portal: SpriteSheet::new([80], 64.0, 64.0),
        }
    }
}

pub fn spawn_player(
    reg: &mut Registry,
    bank: &FrameBank,
    position: Vec2,
    tuning: &PlayerTuning,
    portals: PortalLinks,
) -> Result<EntityId, String> {
    let anim = bank.player.animator()?;
    let sprite = Sprite {
        bounds: Aabb::from_top_left(position, bank.player.size),
        frame: anim.current(),
    };
    let player = Player::new(anim, tuning, portals);
    Ok(reg.spawn(sprite, Body::Player(Box::new(player)), &[Group::Render]))
}

pub fn spawn_flyer(
    reg: &mut Registry,
    bank: &FrameBank,
    position: Vec2,
    speed: f32,
    tuning: &EnemyTuning,
) -> Result<EntityId, String> {
    let anim = bank.flyer.animator()?;
    let sprite = Sprite {
        bounds: Aabb::from_top_left(position, bank.flyer.size),
        frame: anim.current(),
    };
    let body = Body::Enemy(Enemy::flyer(anim, speed, tuning));
    Ok(reg.spawn(sprite, body, &[Group::Render, Group::Enemy]))
}

/// Crawlers stand on the bottom edge of `patrol` and never leave it.
pub fn spawn_crawler(
    reg: &mut Registry,
    bank: &FrameBank,
    patrol: Aabb,
    speed: f32,
    tuning: &EnemyTuning,
) -> Result<EntityId, String> {
    let anim = bank.crawler.animator()?;
    let sprite = Sprite {
        bounds: collectible::placement(&patrol, bank.crawler.size),
        frame: anim.current(),
    };
    let body = Body::Enemy(Enemy::crawler(anim, patrol, speed, tuning));
    Ok(reg.spawn(sprite, body, &[Group::Render, Group::Enemy]))
}

/// Coins, gems and potions are dropped into `zone`; a cherry is placed by
/// the zone's top-left corner.
pub fn spawn_collectible(
    reg: &mut Registry,
    bank: &FrameBank,
    kind: CollectibleKind,
    zone: Aabb,
) -> Result<EntityId, String> {
    let sheet = bank.collectible(kind);
    let anim = sheet.animator()?;
    let bounds = if kind.uses_drop_zone() {
        collectible::placement(&zone, sheet.size)
    } else {
        Aabb::from_top_left(zone.top_left(), sheet.size)
    };
    let sprite = Sprite {
        bounds,
        frame: anim.current(),
    };
    let body = Body::Collectible(Collectible::new(kind, anim));
    Ok(reg.spawn(sprite, body, &[Group::Render, Group::Collectible]))
}

pub fn spawn_portal(
    reg: &mut Registry,
    bank: &FrameBank,
    kind: PortalKind,
    bounds: Aabb,
) -> Result<EntityId, String> {
    let sprite = Sprite {
        bounds,
        frame: bank.portal.first_frame()?,
    };
    Ok(reg.spawn(sprite, Body::Portal(Portal { kind }), &[Group::Render, Group::Portal]))
}

/// Projectile and flash created for one shot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShotSpawn {
    pub projectile: EntityId,
    pub flash: EntityId,
}

/// Creates the projectile for `shot` and the muzzle flash glued to the
/// shooter bounds recorded with it.
///
/// The projectile's top-left sits `muzzle_offset` ahead of the shot origin,
/// measured from its trailing edge when fired to the left.
pub fn spawn_shot(
    reg: &mut Registry,
    bank: &FrameBank,
    tuning: &ProjectileTuning,
    level_width: f32,
    owner: EntityId,
    shot: ShotRequest,
    now: Duration,
) -> Result<ShotSpawn, String> {
    let facing = shot.facing;
    let left = facing.is_left();

    let size = bank.projectile.size;
    let x = if left {
        shot.origin.x - tuning.muzzle_offset - size.x
    } else {
        shot.origin.x + tuning.muzzle_offset
    };
    let projectile_sprite = Sprite {
        bounds: Aabb::new(x, shot.origin.y, size.x, size.y),
        frame: bank.projectile.first_frame()?.flipped(left),
    };

    let mut flash_bounds = Aabb::from_top_left(shot.origin, bank.muzzle_flash.size);
    MuzzleFlash::attach(&mut flash_bounds, &shot.shooter, facing, tuning.flash_y_offset);
    let flash_sprite = Sprite {
        bounds: flash_bounds,
        frame: bank.muzzle_flash.first_frame()?.flipped(left),
    };

    let projectile = reg.spawn(
        projectile_sprite,
        Body::Projectile(Projectile::new(facing, level_width, tuning)),
        &[Group::Render, Group::Projectile],
    );
    let flash = reg.spawn(
        flash_sprite,
        Body::MuzzleFlash(MuzzleFlash::new(owner, facing, tuning, now)),
        &[Group::Render],
    );
    Ok(ShotSpawn { projectile, flash })
}

/// Where and how fast the next flyer enters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlyerSpawn {
    pub position: Vec2,
    pub speed: f32,
}

/// Periodic flyer waves entering from the right of the playable area.
#[derive(Debug)]
pub struct FlyerSpawner {
    timer: CooldownTimer,
    tuning: SpawnerTuning,
}

impl FlyerSpawner {
    pub fn new(tuning: SpawnerTuning, now: Duration) -> Self {
        Self {
            timer: CooldownTimer::from_millis(tuning.interval_ms)
                .repeating()
                .autostart(now),
            tuning,
        }
    }

    pub fn poll(&mut self, now: Duration, rng: &mut SmallRng) -> Option<FlyerSpawn> {
        if !self.timer.update(now) {
            return None;
        }
        let row = rng.gen_range(0..=self.tuning.max_row());
        let y = self.tuning.margin() + row as f32 * self.tuning.tile_size;
        let speed = rng.gen_range(self.tuning.speed_min..=self.tuning.speed_max);
        Some(FlyerSpawn {
            position: Vec2::new(self.tuning.spawn_x(), y),
            speed,
        })
    }
}

pub fn roll_crawler_speed(rng: &mut SmallRng, tuning: &EnemyTuning) -> f32 {
    rng.gen_range(tuning.crawler_speed_min..=tuning.crawler_speed_max)
}
