use bevy::log::info;
use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::collectible::CollectibleKind;
use crate::config::SimConfig;
use crate::events::EventRecord;
use crate::geometry::Aabb;
use crate::input::PlayerInput;
use crate::player::PlayerStats;
use crate::portal::{PortalKind, PortalSlot};
use crate::spawn::FrameBank;
use crate::world::SimWorld;

#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct RectDef {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl From<RectDef> for Aabb {
    fn from(r: RectDef) -> Self {
        Aabb::new(r.x, r.y, r.w, r.h)
    }
}

#[derive(Deserialize, Clone, Copy, Debug)]
pub struct FlyerDef {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
}

#[derive(Deserialize, Clone, Copy, Debug)]
pub struct PortalPairDef {
    pub entry: RectDef,
    pub exit: RectDef,
}

/// Level layout in world units. Pickup rectangles are drop zones; cherries
/// are positioned by their top-left corner.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct LevelDef {
    pub player: (f32, f32),
    pub level_width: Option<f32>,
    pub statics: Vec<RectDef>,
    pub coins: Vec<RectDef>,
    pub gems: Vec<RectDef>,
    pub potions: Vec<RectDef>,
    pub cherries: Vec<(f32, f32)>,
    pub crawlers: Vec<RectDef>,
    pub flyers: Vec<FlyerDef>,
    /// At most two pairs: primary then secondary.
    pub portals: Vec<PortalPairDef>,
    pub flyer_waves: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SimulationRequest {
    pub level: LevelDef,
    #[serde(default)]
    pub inputs: Vec<SimInput>,
    pub max_frames: u32,
    #[serde(default = "default_record_interval")]
    pub record_interval: u32,
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default)]
    pub config: Option<SimConfig>,
}

fn default_record_interval() -> u32 {
    1
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

#[derive(Deserialize, Clone, Debug)]
pub struct SimInput {
    pub frame: u32,
    pub action: String,
    /// Frames the action is held; zero means a single frame.
    #[serde(default)]
    pub duration: u32,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    LevelComplete,
    PlayerDead,
    Timeout,
}

#[derive(Serialize, Clone, Debug)]
pub struct SimulationResult {
    pub outcome: Outcome,
    pub frames_elapsed: u32,
    pub stats: PlayerStats,
    pub trace: Vec<TraceFrame>,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize, Clone, Debug)]
pub struct TraceFrame {
    pub frame: u32,
    pub x: f32,
    pub y: f32,
    pub vy: f32,
    pub grounded: bool,
    pub health: i32,
    pub points: u32,
}

/// Builds a world from a level definition.
pub fn build_world(level: &LevelDef, config: SimConfig) -> Result<SimWorld, String> {
    if level.portals.len() > 2 {
        return Err(format!(
            "a level holds at most two portal pairs, got {}",
            level.portals.len()
        ));
    }
    let mut world = SimWorld::new(config, FrameBank::default());
    if let Some(width) = level.level_width {
        world.set_level_width(width);
    }
    for rect in &level.statics {
        world.add_static((*rect).into());
    }
    for (pair, slot) in level.portals.iter().zip([PortalSlot::Primary, PortalSlot::Secondary]) {
        let entry = world.spawn_portal(PortalKind::Entry, pair.entry.into())?;
        let exit = world.spawn_portal(PortalKind::Exit, pair.exit.into())?;
        world.link_portals(slot, entry, exit)?;
    }
    let pickups = [
        (CollectibleKind::Coin, &level.coins),
        (CollectibleKind::Gem, &level.gems),
        (CollectibleKind::Potion, &level.potions),
    ];
    for (kind, zones) in pickups {
        for zone in zones {
            world.spawn_collectible(kind, (*zone).into())?;
        }
    }
    for (x, y) in &level.cherries {
        world.spawn_cherry(Vec2::new(*x, *y))?;
    }
    for patrol in &level.crawlers {
        world.spawn_crawler((*patrol).into())?;
    }
    for flyer in &level.flyers {
        world.spawn_flyer(Vec2::new(flyer.x, flyer.y), flyer.speed)?;
    }
    world.spawn_player(Vec2::new(level.player.0, level.player.1))?;
    if level.flyer_waves {
        world.enable_flyer_spawner();
    }
    Ok(world)
}

/// Expands timed actions into a per-frame input table.
fn input_table(request: &SimulationRequest) -> Result<Vec<PlayerInput>, String> {
    let mut table = vec![PlayerInput::default(); request.max_frames as usize];
    for input in &request.inputs {
        let duration = input.duration.max(1);
        let end = input.frame.saturating_add(duration).min(request.max_frames);
        for frame in input.frame..end {
            if !table[frame as usize].press(&input.action) {
                return Err(format!("unknown action '{}' at frame {}", input.action, input.frame));
            }
        }
    }
    Ok(table)
}

pub fn run_simulation(request: &SimulationRequest) -> Result<SimulationResult, String> {
    let config = request.config.clone().unwrap_or_default();
    let mut world = build_world(&request.level, config)?;
    let inputs = input_table(request)?;

    let mut trace = Vec::new();
    let mut outcome = Outcome::Timeout;
    let mut frames_elapsed = 0;

    for (frame, input) in (0..request.max_frames).zip(inputs) {
        world.set_player_input(input);
        world.update(request.dt);
        frames_elapsed = frame + 1;

        if request.record_interval > 0 && frame % request.record_interval == 0 {
            if let Some(entry) = trace_frame(&world, frame) {
                trace.push(entry);
            }
        }
        if world.player_dead() {
            outcome = Outcome::PlayerDead;
            break;
        }
        if world.level_complete() {
            outcome = Outcome::LevelComplete;
            break;
        }
    }

    let stats = world.player_stats().unwrap_or_default();
    info!(
        "[Sim] Simulation finished: {:?} after {} frames ({} points, {} kills)",
        outcome, frames_elapsed, stats.points, stats.kills
    );
    Ok(SimulationResult {
        outcome,
        frames_elapsed,
        stats,
        trace,
        events: world.events.recent.iter().cloned().collect(),
    })
}

fn trace_frame(world: &SimWorld, frame: u32) -> Option<TraceFrame> {
    let player = world.player()?;
    let bounds = world.player_bounds()?;
    Some(TraceFrame {
        frame,
        x: bounds.left(),
        y: bounds.top(),
        vy: player.direction.y,
        grounded: player.on_floor,
        health: player.stats.health,
        points: player.stats.points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> SimulationRequest {
        serde_json::from_str(json).expect("valid request")
    }

    #[test]
    fn walking_into_the_last_coin_completes_the_level() {
        let req = request(
            r#"{
                "level": {
                    "player": [0.0, 344.0],
                    "statics": [{ "x": -100.0, "y": 400.0, "w": 2000.0, "h": 64.0 }],
                    "coins": [{ "x": 300.0, "y": 360.0, "w": 32.0, "h": 40.0 }]
                },
                "inputs": [{ "frame": 0, "action": "right", "duration": 120 }],
                "max_frames": 240
            }"#,
        );
        let result = run_simulation(&req).expect("simulation");
        assert_eq!(result.outcome, Outcome::LevelComplete);
        assert_eq!(result.stats.coins, 1);
        assert_eq!(result.stats.points, 500);
        assert!(result.frames_elapsed < 120);
        assert!(result.trace.iter().all(|t| t.grounded));
    }

    #[test]
    fn idle_run_times_out_with_full_trace() {
        let req = request(
            r#"{
                "level": {
                    "player": [0.0, 344.0],
                    "statics": [{ "x": -100.0, "y": 400.0, "w": 2000.0, "h": 64.0 }],
                    "cherries": [[900.0, 300.0]]
                },
                "max_frames": 30,
                "record_interval": 10
            }"#,
        );
        let result = run_simulation(&req).expect("simulation");
        assert_eq!(result.outcome, Outcome::Timeout);
        assert_eq!(result.frames_elapsed, 30);
        assert_eq!(result.trace.len(), 3);
        assert_eq!(result.stats.total_cherries, 1);
    }

    #[test]
    fn crawler_contact_can_kill_the_player() {
        let req = request(
            r#"{
                "level": {
                    "player": [20.0, 344.0],
                    "statics": [{ "x": -100.0, "y": 400.0, "w": 2000.0, "h": 64.0 }],
                    "crawlers": [{ "x": 0.0, "y": 344.0, "w": 120.0, "h": 56.0 }],
                    "cherries": [[900.0, 300.0]]
                },
                "max_frames": 600,
                "config": { "player": { "max_health": 30 } }
            }"#,
        );
        let result = run_simulation(&req).expect("simulation");
        assert_eq!(result.outcome, Outcome::PlayerDead);
        assert!(result.stats.health <= 0);
    }

    #[test]
    fn unknown_action_is_rejected() {
        let req = request(
            r#"{
                "level": { "player": [0.0, 0.0] },
                "inputs": [{ "frame": 0, "action": "dash" }],
                "max_frames": 5
            }"#,
        );
        let err = run_simulation(&req).unwrap_err();
        assert!(err.contains("dash"));
    }

    #[test]
    fn too_many_portal_pairs_is_an_error() {
        let rect = RectDef {
            x: 0.0,
            y: 0.0,
            w: 64.0,
            h: 64.0,
        };
        let level = LevelDef {
            portals: vec![PortalPairDef { entry: rect, exit: rect }; 3],
            ..Default::default()
        };
        assert!(build_world(&level, SimConfig::default()).is_err());
    }
}
