pub mod animation;
pub mod collectible;
pub mod components;
pub mod config;
pub mod enemy;
pub mod events;
pub mod geometry;
pub mod input;
pub mod interaction;
pub mod physics_core;
pub mod player;
pub mod portal;
pub mod projectile;
pub mod registry;
pub mod simulation;
pub mod spawn;
pub mod timer;
pub mod world;
