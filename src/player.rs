use std::time::Duration;

use bevy::log::debug;
use bevy::math::Vec2;
use serde::Serialize;

use crate::animation::Animator;
use crate::collectible::{CollectibleKind, PickupView};
use crate::components::{Facing, Sprite, Tick};
use crate::config::{PlayerTuning, RewardTable};
use crate::geometry::Aabb;
use crate::input::PlayerInput;
use crate::physics_core::{self, Axis, PhysicsCounters};
use crate::portal::{self, PortalLinks, ResolvedPortals, Teleport};
use crate::timer::CooldownTimer;

/// Counters read by the HUD and scoring collaborators.
///
/// `health` is only clamped where healing happens; damage may drive it below
/// zero, which is how death is signalled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    pub health: i32,
    pub coins: u32,
    pub total_coins: u32,
    pub diamonds: u32,
    pub total_diamonds: u32,
    pub cherries: u32,
    pub total_cherries: u32,
    pub health_pots: u32,
    pub total_health_pots: u32,
    pub kills: u32,
    pub points: u32,
}

impl PlayerStats {
    pub fn new(health: i32) -> Self {
        Self {
            health,
            ..Default::default()
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub fn level_complete(&self) -> bool {
        self.cherries == self.total_cherries && self.coins == self.total_coins
    }

    /// Stats for the next level: score and kills carry over, everything else
    /// starts fresh.
    pub fn carried_over(&self, health: i32) -> Self {
        Self {
            points: self.points,
            kills: self.kills,
            ..Self::new(health)
        }
    }

    pub fn record_total(&mut self, kind: CollectibleKind) {
        match kind {
            CollectibleKind::Coin => self.total_coins += 1,
            CollectibleKind::Gem => self.total_diamonds += 1,
            CollectibleKind::Potion => self.total_health_pots += 1,
            CollectibleKind::Cherry => self.total_cherries += 1,
        }
    }
}

#[derive(Debug)]
pub struct PlayerTimers {
    pub shoot: CooldownTimer,
    pub damage_window: CooldownTimer,
    pub potion_cooldown: CooldownTimer,
    pub health_regen: CooldownTimer,
    pub score_tick: CooldownTimer,
    pub teleport: CooldownTimer,
}

impl PlayerTimers {
    fn from_tuning(tuning: &PlayerTuning) -> Self {
        Self {
            shoot: CooldownTimer::from_millis(tuning.shoot_cooldown_ms),
            damage_window: CooldownTimer::from_millis(tuning.damage_window_ms),
            potion_cooldown: CooldownTimer::from_millis(tuning.potion_cooldown_ms),
            health_regen: CooldownTimer::from_millis(tuning.regen_tick_ms),
            score_tick: CooldownTimer::from_millis(tuning.score_tick_ms),
            teleport: CooldownTimer::from_millis(tuning.teleport_cooldown_ms),
        }
    }

    fn tick_all(&mut self, now: Duration) {
        for timer in [
            &mut self.shoot,
            &mut self.damage_window,
            &mut self.potion_cooldown,
            &mut self.health_regen,
            &mut self.score_tick,
            &mut self.teleport,
        ] {
            timer.update(now);
        }
    }
}

/// Request for the driver to spawn a projectile. Both the origin and the
/// shooter bounds are taken at input time, before this frame's move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShotRequest {
    pub origin: Vec2,
    pub shooter: Aabb,
    pub facing: Facing,
}

/// Read-only surroundings for one player update.
pub struct PlayerEnv<'a> {
    pub statics: &'a [Aabb],
    pub portals: ResolvedPortals,
    pub rewards: &'a RewardTable,
}

/// Everything a player update wants the world to know about.
#[derive(Debug, Default)]
pub struct PlayerReport {
    pub shot: Option<ShotRequest>,
    pub collected: Vec<PickupView>,
    pub teleports: Vec<Teleport>,
    /// Health right after a potion was drunk this frame.
    pub potion_used: Option<i32>,
}

#[derive(Debug)]
pub struct Player {
    pub stats: PlayerStats,
    pub input: PlayerInput,
    /// `x` is the discrete input direction, `y` the accumulated vertical
    /// displacement per frame.
    pub direction: Vec2,
    pub on_floor: bool,
    pub anim: Animator,
    pub timers: PlayerTimers,
    pub portals: PortalLinks,
    flip: bool,
    tuning: PlayerTuning,
}

impl Player {
    pub fn new(anim: Animator, tuning: &PlayerTuning, portals: PortalLinks) -> Self {
        Self {
            stats: PlayerStats::new(tuning.max_health),
            input: PlayerInput::default(),
            direction: Vec2::ZERO,
            on_floor: true,
            anim: anim.with_speed(tuning.animation_speed),
            timers: PlayerTimers::from_tuning(tuning),
            portals,
            flip: false,
            tuning: tuning.clone(),
        }
    }

    pub fn facing(&self) -> Facing {
        Facing::from_flip(self.flip)
    }

    pub fn update(
        &mut self,
        sprite: &mut Sprite,
        tick: Tick,
        env: &PlayerEnv,
        pickups: &mut Vec<PickupView>,
        counters: &mut PhysicsCounters,
    ) -> PlayerReport {
        let mut report = PlayerReport::default();

        self.timers.tick_all(tick.now);
        self.points_over_time(tick.now);
        self.heal_over_time(tick.now);

        self.apply_input(&sprite.bounds, tick.now, &mut report);
        self.consume_pickups(&sprite.bounds, pickups, env.rewards, &mut report.collected);

        self.move_body(&mut sprite.bounds, tick, env, counters, &mut report);
        self.on_floor = physics_core::compute_grounded(&sprite.bounds, env.statics, counters);
        self.animate(sprite, tick.dt);
        self.consume_pickups(&sprite.bounds, pickups, env.rewards, &mut report.collected);

        report
    }

    /// Subtracts `damage` unless the invulnerability window is open. Returns
    /// whether the damage landed.
    pub fn take_damage(&mut self, damage: i32, now: Duration) -> bool {
        if self.timers.damage_window.is_active() {
            return false;
        }
        self.stats.health -= damage;
        self.timers.damage_window.activate(now);
        true
    }

    pub fn use_health_potion(&mut self, now: Duration) -> bool {
        if self.stats.health_pots < 1 || self.timers.potion_cooldown.is_active() {
            return false;
        }
        self.stats.health_pots -= 1;
        if self.stats.health <= self.tuning.potion_full_heal_above {
            self.stats.health += self.tuning.potion_heal;
        } else {
            self.stats.health = self.tuning.max_health;
        }
        self.timers.potion_cooldown.activate(now);
        true
    }

    pub fn credit_kill(&mut self, rewards: &RewardTable) {
        self.stats.kills += 1;
        self.stats.points += rewards.kill_points;
    }

    fn points_over_time(&mut self, now: Duration) {
        if !self.timers.score_tick.is_active() {
            self.stats.points += self.tuning.passive_points;
            self.timers.score_tick.activate(now);
        }
    }

    fn heal_over_time(&mut self, now: Duration) {
        if self.stats.health < self.tuning.max_health && !self.timers.health_regen.is_active() {
            self.stats.health += self.tuning.regen_amount;
            self.timers.health_regen.activate(now);
        }
    }

    fn apply_input(&mut self, bounds: &Aabb, now: Duration, report: &mut PlayerReport) {
        let input = self.input;
        self.direction.x = physics_core::horizontal_direction(input.left, input.right);
        if input.jump && self.on_floor {
            self.direction.y = -self.tuning.jump_impulse;
        }
        if input.use_potion && self.use_health_potion(now) {
            report.potion_used = Some(self.stats.health);
        }
        if input.shoot && !self.timers.shoot.is_active() {
            report.shot = Some(ShotRequest {
                origin: bounds.center(),
                shooter: *bounds,
                facing: self.facing(),
            });
            self.timers.shoot.activate(now);
        }
    }

    /// Consumes every pickup overlapping `bounds`. Consumed views are taken
    /// out of `pickups`, so a second pass in the same frame cannot re-award.
    fn consume_pickups(
        &mut self,
        bounds: &Aabb,
        pickups: &mut Vec<PickupView>,
        rewards: &RewardTable,
        collected: &mut Vec<PickupView>,
    ) {
        pickups.retain(|pickup| {
            if !bounds.intersects(&pickup.bounds) {
                return true;
            }
            self.apply_reward(pickup.kind, rewards);
            debug!("[Sim] Player collected {:?} {:?}", pickup.kind, pickup.id);
            collected.push(*pickup);
            false
        });
    }

    fn apply_reward(&mut self, kind: CollectibleKind, rewards: &RewardTable) {
        let stats = &mut self.stats;
        if kind == CollectibleKind::Cherry {
            stats.cherries += 1;
            stats.points += rewards.cherry_points;
            stats.health = self.tuning.max_health;
        }
        if kind == CollectibleKind::Potion {
            // stored for later; drinking happens through use_health_potion
            stats.health_pots += 1;
            stats.points += rewards.potion_points;
        }
        // Gem and coin share one if/else chain: a pickup can score as at most
        // one of the two.
        if kind == CollectibleKind::Gem {
            stats.diamonds += 1;
            stats.points += rewards.gem_points;
        } else if kind == CollectibleKind::Coin {
            stats.coins += 1;
            stats.points += rewards.coin_points;
        }
    }

    fn move_body(
        &mut self,
        bounds: &mut Aabb,
        tick: Tick,
        env: &PlayerEnv,
        counters: &mut PhysicsCounters,
        report: &mut PlayerReport,
    ) {
        physics_core::step_horizontal(bounds, self.direction.x, self.tuning.speed, tick.dt);
        self.collide(bounds, Axis::Horizontal, tick.now, env, counters, report);

        physics_core::step_vertical(bounds, &mut self.direction.y, self.tuning.gravity, tick.dt);
        self.collide(bounds, Axis::Vertical, tick.now, env, counters, report);
    }

    /// Portals take priority over level geometry; a teleport skips static
    /// resolution for this axis.
    fn collide(
        &mut self,
        bounds: &mut Aabb,
        axis: Axis,
        now: Duration,
        env: &PlayerEnv,
        counters: &mut PhysicsCounters,
        report: &mut PlayerReport,
    ) {
        if !self.timers.teleport.is_active() {
            if let Some(hop) = portal::try_teleport(bounds, &env.portals) {
                debug!("[Sim] Player teleported via {:?} portal pair", hop.slot);
                self.timers.teleport.activate(now);
                report.teleports.push(hop);
                return;
            }
        }
        physics_core::resolve_axis(bounds, &mut self.direction, env.statics, axis, counters);
    }

    fn animate(&mut self, sprite: &mut Sprite, dt: f32) {
        if self.direction.x != 0.0 {
            self.anim.advance(dt);
            self.flip = self.direction.x < 0.0;
        } else {
            self.anim.set_frame_index(0.0);
        }
        if !self.on_floor {
            self.anim.set_frame_index(1.0);
        }
        sprite.frame = self.anim.current().flipped(self.flip);
    }
}
