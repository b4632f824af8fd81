//! Per-tick steering for autonomous agents.
//!
//! Steering reads agent state and the static tile grid and returns a new
//! velocity. It never writes positions; integration belongs to the caller's
//! physics step.
//!
//! Pipeline for one agent:
//! 1. normalized heading toward the target
//! 2. probe the grid ahead; on a wall, blend in a perpendicular detour
//! 3. separation from nearby neighbors
//! 4. smooth toward the desired velocity and clamp to max speed

use bevy::math::Vec2;
use bevy::prelude::Component;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::constants::{
    AVOID_DETOUR_WEIGHT, AVOID_DIRECT_WEIGHT, PROBE_CELLS, SEPARATION_SIZE_FACTOR,
    SEPARATION_WEIGHT, SIDE_PROBE_CELLS, STEERING_SMOOTHING,
};
use crate::error::{CoreError, CoreResult};
use crate::generation::TileGrid;

/// Kinematic state of anything that steers
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radians, 0 = +x
    pub facing: f32,
    pub max_speed: f32,
    pub collision_radius: f32,
}

impl Agent {
    pub fn new(position: Vec2, max_speed: f32, collision_radius: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            facing: 0.0,
            max_speed,
            collision_radius,
        }
    }

    /// Diameter
    pub fn size(&self) -> f32 {
        self.collision_radius * 2.0
    }

    pub fn face(&mut self, target: Vec2) {
        let to_target = target - self.position;
        if to_target != Vec2::ZERO {
            self.facing = to_target.y.atan2(to_target.x);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Cells probed ahead along the direct heading
    pub probe_cells: u32,
    /// Distance in cells of the side probes
    pub side_probe_cells: f32,
    pub direct_weight: f32,
    pub avoid_weight: f32,
    /// Fraction of the velocity error corrected per tick
    pub smoothing: f32,
    pub separation_weight: f32,
    /// Separation threshold as a multiple of agent size
    pub separation_size_factor: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            probe_cells: PROBE_CELLS,
            side_probe_cells: SIDE_PROBE_CELLS,
            direct_weight: AVOID_DIRECT_WEIGHT,
            avoid_weight: AVOID_DETOUR_WEIGHT,
            smoothing: STEERING_SMOOTHING,
            separation_weight: SEPARATION_WEIGHT,
            separation_size_factor: SEPARATION_SIZE_FACTOR,
        }
    }
}

impl SteeringConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.probe_cells == 0 {
            return Err(invalid("probe_cells must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(invalid(format!("smoothing {} outside [0, 1]", self.smoothing)));
        }
        let non_negative = [
            ("side_probe_cells", self.side_probe_cells),
            ("direct_weight", self.direct_weight),
            ("avoid_weight", self.avoid_weight),
            ("separation_weight", self.separation_weight),
            ("separation_size_factor", self.separation_size_factor),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} {value} must be non-negative")));
            }
        }
        if self.direct_weight + self.avoid_weight <= 0.0 {
            return Err(invalid("avoidance weights cannot both be zero".into()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> CoreError {
    CoreError::InvalidConfiguration(msg)
}

/// Walk the probe cells ahead of `position` along `direction`.
///
/// Returns the detour heading when a wall is found, `None` when the way is
/// clear. Probe cells outside the grid are skipped. The side probes test
/// left `(-dy, dx)` then right `(dy, -dx)`; with both open the side is picked
/// by `rng`, with neither open the agent backs off.
pub fn probe_obstacle<R: Rng + ?Sized>(
    position: Vec2,
    direction: Vec2,
    grid: &TileGrid,
    config: &SteeringConfig,
    rng: &mut R,
) -> Option<Vec2> {
    let tile = grid.tile_size();
    let blocked = (1..=config.probe_cells).any(|i| {
        let (x, y) = grid.world_to_tile(position + direction * tile * i as f32);
        grid.is_wall(x, y)
    });
    if !blocked {
        return None;
    }

    let left = Vec2::new(-direction.y, direction.x);
    let right = Vec2::new(direction.y, -direction.x);
    let open = |side: Vec2| {
        let (x, y) = grid.world_to_tile(position + side * tile * config.side_probe_cells);
        grid.is_walkable(x, y)
    };

    let detour = match (open(left), open(right)) {
        (true, false) => left,
        (false, true) => right,
        (true, true) => {
            if rng.gen_bool(0.5) {
                left
            } else {
                right
            }
        }
        (false, false) => -direction,
    };
    Some(detour)
}

/// Average push away from neighbors closer than the separation threshold.
/// Neighbors at exactly the agent's position are ignored, so the agent's own
/// position may appear in `neighbors`.
pub fn separation(agent: &Agent, neighbors: &[Vec2], config: &SteeringConfig) -> Vec2 {
    let threshold = agent.size() * config.separation_size_factor;
    if threshold <= 0.0 {
        return Vec2::ZERO;
    }

    let mut sum = Vec2::ZERO;
    let mut count = 0u32;
    for &other in neighbors {
        let offset = agent.position - other;
        let d = offset.length();
        if d > 0.0 && d < threshold {
            sum += offset / d * ((threshold - d) / threshold);
            count += 1;
        }
    }
    if count > 0 {
        sum / count as f32
    } else {
        Vec2::ZERO
    }
}

/// Heading after obstacle avoidance; zero when the agent is on the target
pub fn move_direction<R: Rng + ?Sized>(
    agent: &Agent,
    target: Vec2,
    grid: &TileGrid,
    config: &SteeringConfig,
    rng: &mut R,
) -> Vec2 {
    let direct = (target - agent.position).normalize_or_zero();
    if direct == Vec2::ZERO {
        return direct;
    }
    match probe_obstacle(agent.position, direct, grid, config, rng) {
        Some(detour) => {
            (direct * config.direct_weight + detour * config.avoid_weight).normalize_or_zero()
        }
        None => direct,
    }
}

/// New velocity for one agent this tick. Magnitude never exceeds `max_speed`.
pub fn steer<R: Rng + ?Sized>(
    agent: &Agent,
    target: Vec2,
    grid: &TileGrid,
    neighbors: &[Vec2],
    config: &SteeringConfig,
    rng: &mut R,
) -> Vec2 {
    let max_speed = agent.max_speed.max(0.0);
    let heading = move_direction(agent, target, grid, config, rng);
    let desired = heading * max_speed;
    let push = separation(agent, neighbors, config);

    let velocity =
        agent.velocity + (desired - agent.velocity) * config.smoothing + push * config.separation_weight;
    if !velocity.is_finite() {
        return Vec2::ZERO;
    }
    velocity.clamp_length_max(max_speed)
}

/// Deterministic RNG stream for one agent on one tick
pub fn agent_rng(seed: u64, tick: u64, index: usize) -> Xoshiro256PlusPlus {
    let mut hasher = Sha3_256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(tick.to_le_bytes());
    hasher.update((index as u64).to_le_bytes());
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    Xoshiro256PlusPlus::seed_from_u64(u64::from_le_bytes(bytes))
}

/// Steer every agent toward `target` in parallel.
///
/// Neighbor positions are snapshotted before any agent is steered, and each
/// agent draws from its own `agent_rng` stream, so the result matches a
/// sequential loop over `steer` exactly.
pub fn steer_all(
    agents: &[Agent],
    target: Vec2,
    grid: &TileGrid,
    config: &SteeringConfig,
    seed: u64,
    tick: u64,
) -> Vec<Vec2> {
    let positions: Vec<Vec2> = agents.iter().map(|a| a.position).collect();
    agents
        .par_iter()
        .enumerate()
        .map(|(i, agent)| {
            let mut rng = agent_rng(seed, tick, i);
            steer(agent, target, grid, &positions, config, &mut rng)
        })
        .collect()
}
