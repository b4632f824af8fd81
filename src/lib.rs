//! Dungeon Shooter - Simulation Core Library
//!
//! This crate provides the deterministic simulation logic for a top-down
//! roguelike dungeon shooter:
//! - Procedural level generation (rooms + L-shaped corridors on a tile grid)
//! - Weapon stat engine (ordered add/mul/set modifiers, clamped stat blocks)
//! - Steering AI (seek, obstacle avoidance, separation, IDLE/CHASE/ATTACK)
//! - Combat resolution (direct hits, piercing, area falloff, knockback)
//! - Simulation session (score, difficulty, kill rewards, spawning)
//! - Bevy plugin for hosts that run the core inside an ECS

pub mod combat;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod generation;
pub mod logging;
pub mod monster;
pub mod player;
pub mod session;
pub mod steering;
pub mod weapons;

pub use error::{CoreError, CoreResult};
