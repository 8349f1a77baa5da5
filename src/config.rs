use bevy::log::{info, warn};
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

/// Tunable constants for the simulation core. Every field has a default, so a
/// config file only needs the values it overrides.
#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub player: PlayerTuning,
    pub enemies: EnemyTuning,
    pub projectiles: ProjectileTuning,
    pub spawner: SpawnerTuning,
    pub rewards: RewardTable,
    pub seed: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub speed: f32,
    pub gravity: f32,
    pub jump_impulse: f32,
    pub animation_speed: f32,
    pub max_health: i32,
    pub shoot_cooldown_ms: u64,
    pub damage_window_ms: u64,
    pub potion_cooldown_ms: u64,
    pub regen_tick_ms: u64,
    pub score_tick_ms: u64,
    pub teleport_cooldown_ms: u64,
    pub regen_amount: i32,
    pub passive_points: u32,
    pub potion_heal: i32,
    /// Above this health a potion restores `max_health` instead of `potion_heal`.
    pub potion_full_heal_above: i32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 400.0,
            gravity: 50.0,
            jump_impulse: 20.0,
            animation_speed: 10.0,
            max_health: 100,
            shoot_cooldown_ms: 300,
            damage_window_ms: 1500,
            potion_cooldown_ms: 2000,
            regen_tick_ms: 10_000,
            score_tick_ms: 300,
            teleport_cooldown_ms: 2000,
            regen_amount: 0,
            passive_points: 0,
            potion_heal: 50,
            potion_full_heal_above: 50,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub death_timer_ms: u64,
    pub animation_speed: f32,
    pub flyer_damage: i32,
    pub crawler_damage: i32,
    pub crawler_speed_min: f32,
    pub crawler_speed_max: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            death_timer_ms: 200,
            animation_speed: 10.0,
            flyer_damage: 20,
            crawler_damage: 25,
            crawler_speed_min: 160.0,
            crawler_speed_max: 200.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    pub speed: f32,
    pub despawn_margin: f32,
    pub muzzle_offset: f32,
    pub flash_lifetime_ms: u64,
    pub flash_y_offset: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            speed: 850.0,
            despawn_margin: 1000.0,
            muzzle_offset: 34.0,
            flash_lifetime_ms: 100,
            flash_y_offset: 8.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerTuning {
    pub interval_ms: u64,
    pub tile_size: f32,
    pub margin_tiles: u32,
    pub playable_width_tiles: u32,
    pub playable_height_tiles: u32,
    pub speed_min: f32,
    pub speed_max: f32,
}

impl SpawnerTuning {
    pub fn margin(&self) -> f32 {
        self.margin_tiles as f32 * self.tile_size
    }

    pub fn spawn_x(&self) -> f32 {
        self.margin() + self.playable_width_tiles as f32 * self.tile_size
    }

    /// Highest row index a flyer may spawn on (inclusive).
    pub fn max_row(&self) -> u32 {
        self.playable_height_tiles
    }
}

impl Default for SpawnerTuning {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            tile_size: 64.0,
            margin_tiles: 10,
            playable_width_tiles: 50,
            playable_height_tiles: 40,
            speed_min: 100.0,
            speed_max: 300.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTable {
    pub cherry_points: u32,
    pub potion_points: u32,
    pub gem_points: u32,
    pub coin_points: u32,
    pub kill_points: u32,
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            cherry_points: 1000,
            potion_points: 1000,
            gem_points: 10_000,
            coin_points: 500,
            kill_points: 250,
        }
    }
}

impl SimConfig {
    pub fn from_json(contents: &str) -> Result<Self, String> {
        serde_json::from_str(contents).map_err(|e| format!("invalid sim config: {e}"))
    }

    pub fn load(path: &str) -> Result<Self, String> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
        Self::from_json(&contents)
    }

    /// Reads `SIDESCROLLER_CONFIG` (default `sim.json`). A missing file means
    /// defaults; a malformed one is reported and also falls back to defaults.
    pub fn load_startup() -> Self {
        let path = std::env::var("SIDESCROLLER_CONFIG")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "sim.json".to_string());
        if !std::path::Path::new(&path).exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(cfg) => {
                info!("[Sim] Loaded config from {}", path);
                cfg
            }
            Err(e) => {
                warn!("[Sim] {}; using defaults", e);
                Self::default()
            }
        }
    }
}
