use bevy::app::AppExit;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use sidescroller::collectible::CollectibleKind;
use sidescroller::config::SimConfig;
use sidescroller::geometry::Aabb;
use sidescroller::input::{InputPlugin, PlayerInput};
use sidescroller::portal::{PortalKind, PortalSlot};
use sidescroller::simulation::{self, SimulationRequest};
use sidescroller::spawn::FrameBank;
use sidescroller::world::{SimPlugin, SimWorld};

/// Fixed ticks the built-in demo runs before exiting.
const DEMO_FRAMES: u64 = 600;

fn run_scenario(path: &str) -> Result<String, String> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
    let request: SimulationRequest =
        serde_json::from_str(&contents).map_err(|e| format!("invalid scenario {path}: {e}"))?;
    let result = simulation::run_simulation(&request)?;
    serde_json::to_string_pretty(&result).map_err(|e| format!("cannot encode result: {e}"))
}

/// Small hand-made level: a floor, a wall, pickups, one crawler and a portal
/// pair, with flyer waves on.
fn demo_world(config: SimConfig) -> Result<SimWorld, String> {
    let mut world = SimWorld::new(config, FrameBank::default());
    world.add_static(Aabb::new(-200.0, 600.0, 4400.0, 64.0));
    world.add_static(Aabb::new(1800.0, 408.0, 64.0, 192.0));

    world.spawn_collectible(CollectibleKind::Coin, Aabb::new(400.0, 560.0, 32.0, 40.0))?;
    world.spawn_collectible(CollectibleKind::Potion, Aabb::new(700.0, 560.0, 32.0, 40.0))?;
    world.spawn_cherry(Vec2::new(2400.0, 560.0))?;
    world.spawn_crawler(Aabb::new(1000.0, 544.0, 500.0, 56.0))?;

    let entry = world.spawn_portal(PortalKind::Entry, Aabb::new(1600.0, 536.0, 64.0, 64.0))?;
    let exit = world.spawn_portal(PortalKind::Exit, Aabb::new(2200.0, 536.0, 64.0, 64.0))?;
    world.link_portals(PortalSlot::Primary, entry, exit)?;

    world.spawn_player(Vec2::new(100.0, 544.0))?;
    world.enable_flyer_spawner();
    Ok(world)
}

/// Holds right and fires every frame so the demo exercises movement,
/// pickups, shooting and the portal.
fn demo_driver(mut input: ResMut<PlayerInput>) {
    *input = PlayerInput {
        right: true,
        shoot: true,
        ..default()
    };
}

fn stop_after_demo(world: Res<SimWorld>, mut exit: EventWriter<AppExit>) {
    if world.frame() < DEMO_FRAMES {
        return;
    }
    if let Some(stats) = world.player_stats() {
        info!(
            "[Sim] Demo done after {} frames: health {}, points {}, kills {}, coins {}/{}",
            world.frame(),
            stats.health,
            stats.points,
            stats.kills,
            stats.coins,
            stats.total_coins
        );
    }
    info!(
        "[Sim] {} events recorded, {} dropped, {} collision checks",
        world.events.recent.len(),
        world.events.dropped_events,
        world.counters.collision_checks
    );
    exit.send(AppExit::Success);
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if let Some(pos) = args.iter().position(|a| a == "--simulate") {
        let Some(path) = args.get(pos + 1) else {
            eprintln!("[Sim] --simulate needs a scenario path");
            std::process::exit(2);
        };
        match run_scenario(path) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("[Sim] {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()));

    let config = SimConfig::load_startup();
    let world = match demo_world(config.clone()) {
        Ok(world) => world,
        Err(e) => {
            error!("[Sim] Demo level failed to build: {e}");
            std::process::exit(1);
        }
    };

    app.insert_resource(config)
        .insert_resource(world)
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .add_plugins(InputPlugin)
        .add_plugins(SimPlugin)
        .add_systems(PreUpdate, demo_driver)
        .add_systems(Update, stop_after_demo);

    info!("[Sim] Starting headless demo for {} fixed frames", DEMO_FRAMES);
    app.run();
}
