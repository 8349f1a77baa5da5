use std::time::Duration;

use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::collectible::{CollectibleKind, PickupView};
use crate::components::{Body, EntityId, Facing, Group, SimEntity, Tag, Tick};
use crate::config::SimConfig;
use crate::enemy::EnemyPhase;
use crate::events::{EventBus, SimEvent};
use crate::geometry::Aabb;
use crate::input::PlayerInput;
use crate::interaction;
use crate::physics_core::PhysicsCounters;
use crate::player::{Player, PlayerEnv, PlayerStats};
use crate::portal::{PortalKind, PortalLinks, PortalPair, PortalSlot};
use crate::projectile::Lifetime;
use crate::registry::Registry;
use crate::spawn::{self, FlyerSpawner, FrameBank};

/// Monotonic simulated time. Nothing in the core reads a wall clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SimClock {
    now: Duration,
}

impl SimClock {
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn advance(&mut self, dt: f32) -> Tick {
        self.now += Duration::from_secs_f32(dt.max(0.0));
        Tick { dt, now: self.now }
    }
}

/// One level's worth of simulation state, stepped by `update`.
#[derive(Resource)]
pub struct SimWorld {
    clock: SimClock,
    registry: Registry,
    statics: Vec<Aabb>,
    config: SimConfig,
    bank: FrameBank,
    rng: SmallRng,
    pub events: EventBus,
    pub counters: PhysicsCounters,
    player: Option<EntityId>,
    /// Collectible totals recorded before the player existed.
    totals: PlayerStats,
    portal_links: PortalLinks,
    spawner: Option<FlyerSpawner>,
    level_width: f32,
    frame: u64,
}

impl SimWorld {
    pub fn new(config: SimConfig, bank: FrameBank) -> Self {
        let rng = SmallRng::seed_from_u64(config.seed);
        let level_width = config.spawner.spawn_x() + config.spawner.margin();
        Self {
            clock: SimClock::default(),
            registry: Registry::new(),
            statics: Vec::new(),
            config,
            bank,
            rng,
            events: EventBus::default(),
            counters: PhysicsCounters::default(),
            player: None,
            totals: PlayerStats::default(),
            portal_links: PortalLinks::default(),
            spawner: None,
            level_width,
            frame: 0,
        }
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn set_level_width(&mut self, width: f32) {
        self.level_width = width;
    }

    pub fn add_static(&mut self, bounds: Aabb) {
        self.statics.push(bounds);
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player
    }

    pub fn player(&self) -> Option<&Player> {
        self.player
            .and_then(|id| self.registry.get(id))
            .and_then(SimEntity::as_player)
    }

    fn player_mut(&mut self) -> Option<&mut Player> {
        self.player
            .and_then(|id| self.registry.get_mut(id))
            .and_then(SimEntity::as_player_mut)
    }

    pub fn player_stats(&self) -> Option<PlayerStats> {
        self.player().map(|p| p.stats)
    }

    pub fn player_bounds(&self) -> Option<Aabb> {
        self.player
            .and_then(|id| self.registry.get(id))
            .map(SimEntity::bounds)
    }

    pub fn level_complete(&self) -> bool {
        self.player().is_some_and(|p| p.stats.level_complete())
    }

    pub fn player_dead(&self) -> bool {
        self.player().is_some_and(|p| p.stats.is_dead())
    }

    pub fn set_player_input(&mut self, input: PlayerInput) {
        if let Some(player) = self.player_mut() {
            player.input = input;
        }
    }

    pub fn spawn_player(&mut self, position: Vec2) -> Result<EntityId, String> {
        if self.player.is_some() {
            return Err("level already has a player".to_string());
        }
        let id = spawn::spawn_player(
            &mut self.registry,
            &self.bank,
            position,
            &self.config.player,
            self.portal_links,
        )?;
        self.player = Some(id);
        let totals = self.totals;
        if let Some(player) = self.player_mut() {
            player.stats.total_coins = totals.total_coins;
            player.stats.total_diamonds = totals.total_diamonds;
            player.stats.total_health_pots = totals.total_health_pots;
            player.stats.total_cherries = totals.total_cherries;
        }
        info!("[Sim] Player spawned at ({:.0}, {:.0})", position.x, position.y);
        Ok(id)
    }

    /// Restores the score and kill count from the previous level.
    pub fn carry_over(&mut self, previous: &PlayerStats) {
        let max_health = self.config.player.max_health;
        if let Some(player) = self.player_mut() {
            let carried = previous.carried_over(max_health);
            player.stats.points = carried.points;
            player.stats.kills = carried.kills;
        }
    }

    pub fn spawn_flyer(&mut self, position: Vec2, speed: f32) -> Result<EntityId, String> {
        spawn::spawn_flyer(
            &mut self.registry,
            &self.bank,
            position,
            speed,
            &self.config.enemies,
        )
    }

    pub fn spawn_crawler(&mut self, patrol: Aabb) -> Result<EntityId, String> {
        let speed = spawn::roll_crawler_speed(&mut self.rng, &self.config.enemies);
        spawn::spawn_crawler(&mut self.registry, &self.bank, patrol, speed, &self.config.enemies)
    }

    /// Spawns a pickup and counts it towards the player's level totals.
    pub fn spawn_collectible(&mut self, kind: CollectibleKind, zone: Aabb) -> Result<EntityId, String> {
        let id = spawn::spawn_collectible(&mut self.registry, &self.bank, kind, zone)?;
        self.totals.record_total(kind);
        if let Some(player) = self.player_mut() {
            player.stats.record_total(kind);
        }
        Ok(id)
    }

    pub fn spawn_cherry(&mut self, position: Vec2) -> Result<EntityId, String> {
        let zone = Aabb::from_top_left(position, self.bank.cherry.size);
        self.spawn_collectible(CollectibleKind::Cherry, zone)
    }

    pub fn spawn_portal(&mut self, kind: PortalKind, bounds: Aabb) -> Result<EntityId, String> {
        spawn::spawn_portal(&mut self.registry, &self.bank, kind, bounds)
    }

    /// Links an entry/exit portal pair into `slot` for the player.
    pub fn link_portals(&mut self, slot: PortalSlot, entry: EntityId, exit: EntityId) -> Result<(), String> {
        self.expect_portal(entry, PortalKind::Entry)?;
        self.expect_portal(exit, PortalKind::Exit)?;
        let pair = Some(PortalPair { entry, exit });
        match slot {
            PortalSlot::Primary => self.portal_links.primary = pair,
            PortalSlot::Secondary => self.portal_links.secondary = pair,
        }
        let links = self.portal_links;
        if let Some(player) = self.player_mut() {
            player.portals = links;
        }
        Ok(())
    }

    fn expect_portal(&self, id: EntityId, kind: PortalKind) -> Result<(), String> {
        match self.registry.get(id).and_then(SimEntity::as_portal) {
            Some(portal) if portal.kind == kind => Ok(()),
            Some(portal) => Err(format!("{id:?} is a {:?} portal, expected {kind:?}", portal.kind)),
            None => Err(format!("{id:?} is not a portal")),
        }
    }

    pub fn enable_flyer_spawner(&mut self) {
        let now = self.clock.now();
        self.spawner = Some(FlyerSpawner::new(self.config.spawner.clone(), now));
        debug!("[Sim] Flyer spawner enabled");
    }

    /// Advances the world by `dt` seconds.
    ///
    /// Order: clock, wave spawner, each entity in spawn order, bullets vs
    /// enemies, enemies vs player, then removal of everything killed this
    /// frame.
    pub fn update(&mut self, dt: f32) -> Tick {
        let tick = self.clock.advance(dt);
        self.frame += 1;
        self.events.advance_frame();

        self.run_spawner(tick);

        for id in self.registry.ids(Group::Render) {
            if self.registry.is_pending(id) {
                continue;
            }
            let Some(tag) = self.registry.get(id).map(SimEntity::tag) else {
                continue;
            };
            match tag {
                Tag::Player => self.step_player(id, tick),
                Tag::MuzzleFlash => self.step_flash(id, tick),
                _ => self.step_entity(id, tick),
            }
        }

        interaction::projectiles_vs_enemies(
            &mut self.registry,
            self.player,
            &self.config.rewards,
            tick,
            &mut self.events,
        );
        if let Some(player) = self.player {
            interaction::enemies_vs_player(
                &mut self.registry,
                player,
                &self.config.enemies,
                tick,
                &mut self.events,
            );
        }

        self.registry.flush();
        tick
    }

    fn run_spawner(&mut self, tick: Tick) {
        let Some(spawner) = self.spawner.as_mut() else {
            return;
        };
        let Some(wave) = spawner.poll(tick.now, &mut self.rng) else {
            return;
        };
        if let Err(e) = self.spawn_flyer(wave.position, wave.speed) {
            warn!("[Sim] Flyer wave skipped: {}", e);
        }
    }

    fn pickup_views(&self) -> Vec<PickupView> {
        self.registry
            .ids(Group::Collectible)
            .into_iter()
            .filter(|id| !self.registry.is_pending(*id))
            .filter_map(|id| {
                let entity = self.registry.get(id)?;
                let item = entity.as_collectible()?;
                Some(PickupView {
                    id,
                    kind: item.kind,
                    bounds: entity.bounds(),
                })
            })
            .collect()
    }

    fn step_player(&mut self, id: EntityId, tick: Tick) {
        let Some(links) = self.registry.get(id).and_then(SimEntity::as_player).map(|p| p.portals) else {
            return;
        };
        let registry = &self.registry;
        let portals = links.resolve(|portal| registry.get(portal).map(SimEntity::bounds));
        let mut pickups = self.pickup_views();
        let env = PlayerEnv {
            statics: &self.statics,
            portals,
            rewards: &self.config.rewards,
        };

        let Some(entity) = self.registry.get_mut(id) else {
            return;
        };
        let SimEntity { sprite, body, .. } = entity;
        let Body::Player(player) = body else {
            return;
        };
        let report = player.update(sprite, tick, &env, &mut pickups, &mut self.counters);

        for pickup in &report.collected {
            self.registry.kill(pickup.id);
            self.events.emit(SimEvent::PickupCollected {
                pickup: pickup.id,
                item: pickup.kind,
            });
        }
        if let Some(health) = report.potion_used {
            self.events.emit(SimEvent::PotionUsed { health });
        }
        for hop in report.teleports {
            self.events.emit(SimEvent::Teleported {
                slot: hop.slot,
                from: hop.from,
            });
        }
        if let Some(shot) = report.shot {
            match spawn::spawn_shot(
                &mut self.registry,
                &self.bank,
                &self.config.projectiles,
                self.level_width,
                id,
                shot,
                tick.now,
            ) {
                Ok(spawned) => self.events.emit(SimEvent::ShotFired {
                    projectile: spawned.projectile,
                    flash: spawned.flash,
                }),
                Err(e) => warn!("[Sim] Shot dropped: {}", e),
            }
        }
    }

    fn step_flash(&mut self, id: EntityId, tick: Tick) {
        let Some(owner) = self.registry.get(id).and_then(|e| match &e.body {
            Body::MuzzleFlash(flash) => Some(flash.owner),
            _ => None,
        }) else {
            return;
        };
        let shooter: Option<(Aabb, Facing)> = self
            .registry
            .get(owner)
            .filter(|_| !self.registry.is_pending(owner))
            .and_then(|e| e.as_player().map(|p| (e.bounds(), p.facing())));

        let Some(SimEntity {
            sprite,
            body: Body::MuzzleFlash(flash),
            ..
        }) = self.registry.get_mut(id)
        else {
            return;
        };
        if flash.update(sprite, tick.now, shooter) == Lifetime::Expired {
            self.registry.kill(id);
        }
    }

    fn step_entity(&mut self, id: EntityId, tick: Tick) {
        let Some(entity) = self.registry.get_mut(id) else {
            return;
        };
        let SimEntity { sprite, body, .. } = entity;
        match body {
            Body::Enemy(enemy) => {
                if enemy.update(sprite, tick) == EnemyPhase::Removed {
                    self.registry.kill(id);
                    self.events.emit(SimEvent::EnemyRemoved { enemy: id });
                }
            }
            Body::Collectible(item) => item.update(sprite, tick.dt),
            Body::Projectile(shot) => {
                if shot.update(sprite, tick.dt) == Lifetime::Expired {
                    self.registry.kill(id);
                }
            }
            Body::Portal(_) | Body::Player(_) | Body::MuzzleFlash(_) => {}
        }
    }
}

/// Steps a `SimWorld` resource once per fixed tick with the current
/// `PlayerInput`.
pub struct SimPlugin;

impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<SimWorld>() {
            let config = app
                .world()
                .get_resource::<SimConfig>()
                .cloned()
                .unwrap_or_default();
            app.insert_resource(SimWorld::new(config, FrameBank::default()));
        }
        app.init_resource::<PlayerInput>()
            .add_systems(FixedUpdate, step_sim_world);
    }
}

fn step_sim_world(time: Res<Time<Fixed>>, input: Res<PlayerInput>, mut world: ResMut<SimWorld>) {
    world.set_player_input(*input);
    world.update(time.delta_secs());
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    const DT: f32 = 1.0 / 60.0;

    fn world() -> SimWorld {
        let mut w = SimWorld::new(SimConfig::default(), FrameBank::default());
        w.add_static(Aabb::new(-1000.0, 400.0, 6000.0, 64.0));
        w
    }

    fn run(w: &mut SimWorld, frames: u32) {
        for _ in 0..frames {
            w.update(DT);
        }
    }

    #[test]
    fn clock_advances_by_dt() {
        let mut clock = SimClock::default();
        let tick = clock.advance(0.25);
        assert_eq!(tick.now, Duration::from_millis(250));
        clock.advance(0.25);
        assert_eq!(clock.now(), Duration::from_millis(500));
    }

    #[test]
    fn totals_apply_to_a_player_spawned_later() {
        let mut w = world();
        w.spawn_collectible(CollectibleKind::Coin, Aabb::new(2000.0, 300.0, 32.0, 32.0))
            .expect("coin");
        w.spawn_cherry(Vec2::new(2100.0, 300.0)).expect("cherry");
        w.spawn_player(Vec2::new(0.0, 344.0)).expect("player");
        w.spawn_collectible(CollectibleKind::Gem, Aabb::new(2200.0, 300.0, 32.0, 32.0))
            .expect("gem");

        let stats = w.player_stats().expect("stats");
        assert_eq!(stats.total_coins, 1);
        assert_eq!(stats.total_cherries, 1);
        assert_eq!(stats.total_diamonds, 1);
        assert!(!w.level_complete());
    }

    #[test]
    fn second_player_is_rejected() {
        let mut w = world();
        w.spawn_player(Vec2::ZERO).expect("player");
        assert!(w.spawn_player(Vec2::ZERO).is_err());
    }

    #[test]
    fn collected_coin_leaves_every_group() {
        let mut w = world();
        let player = w.spawn_player(Vec2::new(100.0, 344.0)).expect("player");
        let coin = w
            .spawn_collectible(CollectibleKind::Coin, Aabb::new(110.0, 360.0, 32.0, 40.0))
            .expect("coin");
        w.update(DT);

        assert!(!w.registry().contains(coin));
        assert_eq!(w.registry().len(Group::Collectible), 0);
        assert_eq!(w.registry().ids(Group::Render), vec![player]);
        let stats = w.player_stats().expect("stats");
        assert_eq!(stats.coins, 1);
        assert_eq!(stats.points, 500);
        assert!(w.level_complete());
        assert!(w
            .events
            .recent
            .iter()
            .any(|r| r.event == SimEvent::PickupCollected { pickup: coin, item: CollectibleKind::Coin }));
    }

    #[test]
    fn shot_enemy_is_removed_after_death_timer() {
        let mut w = world();
        w.spawn_player(Vec2::new(100.0, 344.0)).expect("player");
        let crawler = w.spawn_crawler(Aabb::new(300.0, 336.0, 400.0, 64.0)).expect("crawler");
        w.set_player_input(PlayerInput {
            shoot: true,
            ..Default::default()
        });
        w.update(DT);
        w.set_player_input(PlayerInput::default());
        assert_eq!(w.registry().len(Group::Projectile), 1);

        let mut downed_at = None;
        for _ in 0..60 {
            w.update(DT);
            let dying = w
                .registry()
                .get(crawler)
                .and_then(SimEntity::as_enemy)
                .is_some_and(|e| e.is_dying());
            if dying {
                downed_at = Some(w.now());
                break;
            }
        }
        let downed_at = downed_at.expect("crawler was shot");
        assert_eq!(w.registry().len(Group::Projectile), 0);
        let stats = w.player_stats().expect("stats");
        assert_eq!(stats.kills, 1);
        assert_eq!(stats.points, 250);

        while w.now() < downed_at + Duration::from_millis(250) {
            w.update(DT);
        }
        assert!(!w.registry().contains(crawler));
        for group in Group::ALL {
            assert!(!w.registry().in_group(crawler, group));
        }
        assert!(w
            .events
            .recent
            .iter()
            .any(|r| r.event == SimEvent::EnemyRemoved { enemy: crawler }));
    }

    #[test]
    fn flyer_contact_costs_twenty_and_destroys_it() {
        let mut w = world();
        w.spawn_player(Vec2::new(100.0, 344.0)).expect("player");
        let flyer = w.spawn_flyer(Vec2::new(120.0, 350.0), 0.0).expect("flyer");
        w.update(DT);
        assert_eq!(w.player_stats().expect("stats").health, 80);
        let dying = w
            .registry()
            .get(flyer)
            .and_then(SimEntity::as_enemy)
            .is_some_and(|e| e.is_dying());
        assert!(dying);
        run(&mut w, 20);
        assert!(!w.registry().contains(flyer));
        assert_eq!(w.player_stats().expect("stats").health, 80);
    }

    #[test]
    fn muzzle_flash_expires_after_lifetime() {
        let mut w = world();
        w.spawn_player(Vec2::new(100.0, 344.0)).expect("player");
        w.set_player_input(PlayerInput {
            shoot: true,
            ..Default::default()
        });
        w.update(DT);
        w.set_player_input(PlayerInput::default());
        let flashes = |w: &SimWorld| w.registry().iter().filter(|e| e.tag() == Tag::MuzzleFlash).count();
        assert_eq!(flashes(&w), 1);
        run(&mut w, 10);
        assert_eq!(flashes(&w), 0);
    }

    #[test]
    fn flash_starts_against_bounds_before_the_move() {
        let mut w = world();
        w.spawn_player(Vec2::new(100.0, 344.0)).expect("player");
        let before = w.player_bounds().expect("bounds");
        w.set_player_input(PlayerInput {
            right: true,
            shoot: true,
            ..Default::default()
        });
        w.update(DT);
        let after = w.player_bounds().expect("bounds");
        assert!(after.right() > before.right());

        let flash = w
            .registry()
            .iter()
            .find(|e| e.tag() == Tag::MuzzleFlash)
            .expect("flash");
        assert_eq!(flash.bounds().mid_left(), before.mid_right() + Vec2::new(0.0, 8.0));
    }

    #[test]
    fn spawner_adds_flyers_every_interval() {
        let mut w = world();
        w.enable_flyer_spawner();
        run(&mut w, 61);
        assert_eq!(w.registry().len(Group::Enemy), 1);
        run(&mut w, 60);
        assert_eq!(w.registry().len(Group::Enemy), 2);
    }

    #[test]
    fn linking_checks_portal_kinds() {
        let mut w = world();
        let entry = w.spawn_portal(PortalKind::Entry, Aabb::new(0.0, 0.0, 64.0, 64.0)).expect("entry");
        let exit = w.spawn_portal(PortalKind::Exit, Aabb::new(500.0, 0.0, 64.0, 64.0)).expect("exit");
        assert!(w.link_portals(PortalSlot::Primary, exit, entry).is_err());
        w.link_portals(PortalSlot::Primary, entry, exit).expect("linked");
        w.spawn_player(Vec2::new(1000.0, 344.0)).expect("player");
        assert_eq!(
            w.player().expect("player").portals.primary,
            Some(PortalPair { entry, exit })
        );
    }

    #[test]
    fn carry_over_restores_points_and_kills() {
        let mut w = world();
        w.spawn_player(Vec2::ZERO).expect("player");
        let previous = PlayerStats {
            points: 900,
            kills: 4,
            coins: 7,
            ..PlayerStats::new(12)
        };
        w.carry_over(&previous);
        let stats = w.player_stats().expect("stats");
        assert_eq!((stats.points, stats.kills, stats.coins, stats.health), (900, 4, 0, 100));
    }

    #[test]
    fn plugin_steps_world_with_fixed_time() {
        let mut app = App::new();
        app.insert_resource(SimWorld::new(SimConfig::default(), FrameBank::default()));
        app.insert_resource(Time::<Fixed>::default());
        app.add_plugins(SimPlugin);
        app.world_mut()
            .resource_mut::<SimWorld>()
            .spawn_player(Vec2::ZERO)
            .expect("player");
        app.world_mut().insert_resource(PlayerInput {
            right: true,
            ..Default::default()
        });
        app.world_mut()
            .run_system_once(step_sim_world)
            .expect("step");
        let world = app.world().resource::<SimWorld>();
        assert_eq!(world.frame(), 1);
        assert!(world.player().expect("player").input.right);
    }
}
