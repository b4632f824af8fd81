pub mod dungeon;
pub mod grid;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::constants::{
    CORRIDOR_WIDTH, EXTRA_CORRIDOR_CHANCE, MAX_CORRIDOR_WIDTH, MAX_GRID_CELLS, MAX_ROOM_COUNT,
    ROOM_COUNT, ROOM_MAX_SIZE, ROOM_MIN_SIZE, TILE_SIZE,
};
use crate::error::{CoreError, CoreResult};

pub use dungeon::{generate, Corridor, CorridorKind, Dungeon, DungeonGenerator, Room};
pub use grid::{Tile, TileGrid};

/// Run seed - the root of every level generated during a run.
/// Level N of a run is always rebuilt from the same derived hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSeed {
    pub seed: u64,
}

impl Default for LevelSeed {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl LevelSeed {
    /// Deterministic level hash from run seed and level index
    pub fn level_hash(&self, level: u32) -> u64 {
        let mut hasher = Sha3_256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(level.to_le_bytes());
        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        u64::from_le_bytes(bytes)
    }
}

/// Tunable parameters for room placement and corridor carving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub room_count: usize,
    pub room_min_size: usize,
    pub room_max_size: usize,
    pub extra_corridor_chance: f64,
    pub corridor_width: usize,
    pub tile_size: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            room_count: ROOM_COUNT,
            room_min_size: ROOM_MIN_SIZE,
            room_max_size: ROOM_MAX_SIZE,
            extra_corridor_chance: EXTRA_CORRIDOR_CHANCE,
            corridor_width: CORRIDOR_WIDTH,
            tile_size: TILE_SIZE,
        }
    }
}

impl GenerationConfig {
    /// Check the parameters on their own (no map dimensions involved)
    pub fn validate(&self) -> CoreResult<()> {
        if self.room_count == 0 || self.room_count > MAX_ROOM_COUNT {
            return Err(invalid(format!(
                "room_count {} outside [1, {MAX_ROOM_COUNT}]",
                self.room_count
            )));
        }
        if self.room_min_size == 0 || self.room_min_size > self.room_max_size {
            return Err(invalid(format!(
                "room size range [{}, {}] is empty",
                self.room_min_size, self.room_max_size
            )));
        }
        if self.corridor_width == 0 || self.corridor_width > MAX_CORRIDOR_WIDTH {
            return Err(invalid(format!(
                "corridor_width {} outside [1, {MAX_CORRIDOR_WIDTH}]",
                self.corridor_width
            )));
        }
        if !(0.0..=1.0).contains(&self.extra_corridor_chance) {
            return Err(invalid(format!(
                "extra_corridor_chance {} outside [0, 1]",
                self.extra_corridor_chance
            )));
        }
        if !self.tile_size.is_finite() || self.tile_size <= 0.0 {
            return Err(invalid(format!("tile_size {} must be positive", self.tile_size)));
        }
        Ok(())
    }

    /// Check the parameters against a requested map size.
    /// The largest room plus a one-tile border must fit on both axes, and the
    /// grid may hold at most `MAX_GRID_CELLS` cells.
    pub fn validate_for(&self, width: usize, height: usize) -> CoreResult<()> {
        self.validate()?;
        match width.checked_mul(height) {
            Some(cells) if cells <= MAX_GRID_CELLS => {}
            _ => {
                return Err(invalid(format!(
                    "map {width}x{height} exceeds {MAX_GRID_CELLS} cells"
                )))
            }
        }
        let needed = self.room_max_size.saturating_add(2);
        if width < needed || height < needed {
            return Err(invalid(format!(
                "map {width}x{height} too small for rooms up to {} (need at least {needed}x{needed})",
                self.room_max_size
            )));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> CoreError {
    CoreError::InvalidConfiguration(msg.into())
}
