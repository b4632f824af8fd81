//! Centralized tuning constants for the simulation core.
//!
//! Defaults for the configurable structs in `config` are taken from here so
//! the numbers live in one place. Per-preset stats (weapons, enemies) stay in
//! their own modules.

// =====================================================
// Level generation
// =====================================================

/// Pixel-equivalent size of one tile
pub const TILE_SIZE: f32 = 32.0;

/// Default level dimensions in tiles
pub const DEFAULT_MAP_WIDTH: usize = 60;
pub const DEFAULT_MAP_HEIGHT: usize = 45;

/// Rooms requested per level
pub const ROOM_COUNT: usize = 20;

/// Room side length range (inclusive)
pub const ROOM_MIN_SIZE: usize = 5;
pub const ROOM_MAX_SIZE: usize = 10;

/// Placement attempts allowed per requested room
pub const ROOM_ATTEMPTS_PER_ROOM: usize = 50;

/// Upper bounds accepted by generation config validation
pub const MAX_GRID_CELLS: usize = 1 << 24;
pub const MAX_ROOM_COUNT: usize = 10_000;
pub const MAX_CORRIDOR_WIDTH: usize = 16;

/// Probability that room i (i >= 2) gets an extra corridor to an earlier room
pub const EXTRA_CORRIDOR_CHANCE: f64 = 0.5;

/// Corridor band width; the band spans +/- (width / 2) cells around the centerline
pub const CORRIDOR_WIDTH: usize = 2;

// =====================================================
// Steering
// =====================================================

/// Cells sampled ahead of an agent along its direct heading
pub const PROBE_CELLS: u32 = 3;

/// Distance in cells of the left/right avoidance probes
pub const SIDE_PROBE_CELLS: f32 = 2.0;

/// Weight of the direct heading when an obstacle is detected
pub const AVOID_DIRECT_WEIGHT: f32 = 0.3;

/// Weight of the avoidance heading when an obstacle is detected
pub const AVOID_DETOUR_WEIGHT: f32 = 0.7;

/// Fraction of the velocity error corrected per tick
pub const STEERING_SMOOTHING: f32 = 0.1;

/// Scale applied to the averaged separation vector
pub const SEPARATION_WEIGHT: f32 = 50.0;

/// Separation threshold as a multiple of agent size (diameter)
pub const SEPARATION_SIZE_FACTOR: f32 = 2.0;

// =====================================================
// AI
// =====================================================

/// Minimum time between honored state transitions
pub const AI_MIN_DWELL_MS: u64 = 100;

/// Time between enemy melee attacks
pub const AI_ATTACK_COOLDOWN_MS: u64 = 1000;

/// Default enemy detection radius
pub const AI_DETECTION_RANGE: f32 = 300.0;

/// Default enemy attack radius
pub const AI_ATTACK_RANGE: f32 = 40.0;

/// Chase speed multiplier over an archetype's base speed
pub const CHASE_SPEED_MULT: f32 = 1.8;

// =====================================================
// Combat
// =====================================================

/// Fraction of base damage lost at the edge of an explosion
pub const AREA_EDGE_FALLOFF: f32 = 0.5;

/// Knockback speed before resistance
pub const BASE_KNOCKBACK: f32 = 200.0;

/// Player invulnerability window after taking damage
pub const PLAYER_INVULNERABLE_MS: u64 = 500;

/// Extra lifetime granted to projectiles beyond their range travel time
pub const PROJECTILE_GRACE_MS: u64 = 1000;

// =====================================================
// Session
// =====================================================

/// Kills between module reward offers
pub const MODULE_REWARD_INTERVAL: u32 = 8;

/// Module presets offered per reward
pub const MODULE_REWARD_CHOICES: usize = 3;

/// Periodic enemy spawn interval
pub const ENEMY_SPAWN_INTERVAL_MS: u64 = 10_000;

/// Minimum time between difficulty increases
pub const DIFFICULTY_INTERVAL_MS: u64 = 30_000;

/// Initial enemies = BASE + PER_DIFFICULTY * difficulty
pub const INITIAL_ENEMIES_BASE: u32 = 5;
pub const INITIAL_ENEMIES_PER_DIFFICULTY: u32 = 2;

// =====================================================
// Player
// =====================================================

pub const PLAYER_SPEED: f32 = 200.0;
pub const PLAYER_MAX_HEALTH: f32 = 100.0;
pub const PLAYER_RADIUS: f32 = 16.0;

/// Distance from the player's center to the muzzle
pub const MUZZLE_OFFSET: f32 = 32.0;
