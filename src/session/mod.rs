//! Run-level game state: score, difficulty, kills, rewards, spawning.
//!
//! One `SimulationSession` per run. Timers are driven by the millisecond
//! clock passed into `tick`; the spawn timer stops advancing while a module
//! reward is being chosen or after game over.

use bevy::prelude::Resource;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::{
    DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH, DIFFICULTY_INTERVAL_MS, ENEMY_SPAWN_INTERVAL_MS,
    INITIAL_ENEMIES_BASE, INITIAL_ENEMIES_PER_DIFFICULTY, MODULE_REWARD_CHOICES,
    MODULE_REWARD_INTERVAL,
};
use crate::error::{CoreError, CoreResult};
use crate::generation::{Dungeon, DungeonGenerator, LevelSeed};
use crate::monster::{EnemyBundle, EnemyKind};
use crate::weapons::{all_modifier_presets, Modifier, Weapon};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub map_width: usize,
    pub map_height: usize,
    pub starting_difficulty: u32,
    pub module_reward_interval: u32,
    pub module_reward_choices: usize,
    pub enemy_spawn_interval_ms: u64,
    pub difficulty_interval_ms: u64,
    pub initial_enemies_base: u32,
    pub initial_enemies_per_difficulty: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            map_width: DEFAULT_MAP_WIDTH,
            map_height: DEFAULT_MAP_HEIGHT,
            starting_difficulty: 1,
            module_reward_interval: MODULE_REWARD_INTERVAL,
            module_reward_choices: MODULE_REWARD_CHOICES,
            enemy_spawn_interval_ms: ENEMY_SPAWN_INTERVAL_MS,
            difficulty_interval_ms: DIFFICULTY_INTERVAL_MS,
            initial_enemies_base: INITIAL_ENEMIES_BASE,
            initial_enemies_per_difficulty: INITIAL_ENEMIES_PER_DIFFICULTY,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.module_reward_interval == 0 {
            return Err(invalid("module_reward_interval must be at least 1"));
        }
        if self.module_reward_choices == 0 {
            return Err(invalid("module_reward_choices must be at least 1"));
        }
        if self.enemy_spawn_interval_ms == 0 {
            return Err(invalid("enemy_spawn_interval_ms must be positive"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> CoreError {
    CoreError::InvalidConfiguration(msg.into())
}

/// What the session timers decided this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTick {
    /// Periodic spawns due (more than one if the tick skipped intervals)
    pub spawns: u32,
    pub difficulty_increased: bool,
}

#[derive(Resource, Debug, Clone)]
pub struct SimulationSession {
    config: SessionConfig,
    run_seed: LevelSeed,
    rng: Xoshiro256PlusPlus,
    level: u32,
    score: u64,
    difficulty: u32,
    kill_count: u32,
    reward_offer: Option<Vec<Modifier>>,
    game_over: bool,
    last_tick_ms: Option<u64>,
    spawn_elapsed_ms: u64,
    last_difficulty_ms: u64,
}

impl SimulationSession {
    pub fn new(config: SessionConfig, run_seed: LevelSeed) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            difficulty: config.starting_difficulty,
            rng: Xoshiro256PlusPlus::seed_from_u64(run_seed.seed),
            config,
            run_seed,
            level: 0,
            score: 0,
            kill_count: 0,
            reward_offer: None,
            game_over: false,
            last_tick_ms: None,
            spawn_elapsed_ms: 0,
            last_difficulty_ms: 0,
        })
    }

    /// Back to a fresh run with the same config and seed
    pub fn reset(&mut self) {
        let config = self.config.clone();
        *self = Self {
            difficulty: config.starting_difficulty,
            rng: Xoshiro256PlusPlus::seed_from_u64(self.run_seed.seed),
            config,
            run_seed: self.run_seed,
            level: 0,
            score: 0,
            kill_count: 0,
            reward_offer: None,
            game_over: false,
            last_tick_ms: None,
            spawn_elapsed_ms: 0,
            last_difficulty_ms: 0,
        };
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn kill_count(&self) -> u32 {
        self.kill_count
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_rewarding(&self) -> bool {
        self.reward_offer.is_some()
    }

    pub fn reward_offer(&self) -> Option<&[Modifier]> {
        self.reward_offer.as_deref()
    }

    pub fn add_score(&mut self, points: u32) {
        self.score += u64::from(points);
    }

    /// Kills left until the next module reward. Reads 0 once the kill count
    /// lands on a reward boundary and stays there until the next counted kill.
    /// A fresh run reads the full interval.
    pub fn kills_until_reward(&self) -> u32 {
        let interval = self.config.module_reward_interval;
        let rem = self.kill_count % interval;
        match (self.kill_count, rem) {
            (0, _) => interval,
            (_, 0) => 0,
            _ => interval - rem,
        }
    }

    /// Count a kill. Kills during a reward choice or after game over are not
    /// counted. Opens and returns a module offer every `module_reward_interval`
    /// kills.
    pub fn record_kill(&mut self) -> Option<&[Modifier]> {
        if self.game_over || self.is_rewarding() {
            return None;
        }
        self.kill_count += 1;
        if self.kill_count % self.config.module_reward_interval != 0 {
            return None;
        }
        info!(kills = self.kill_count, "module reward due");
        let offer = self.roll_module_offer();
        self.reward_offer = Some(offer);
        self.reward_offer.as_deref()
    }

    /// Distinct module presets drawn by shuffle
    pub fn roll_module_offer(&mut self) -> Vec<Modifier> {
        let mut presets = all_modifier_presets();
        presets.shuffle(&mut self.rng);
        presets.truncate(self.config.module_reward_choices);
        presets
    }

    /// Install one of the offered modules on `weapon`, evicting the oldest
    /// module when the weapon is full. Returns the evicted module.
    pub fn accept_reward(&mut self, weapon: &mut Weapon, id: &str) -> CoreResult<Option<Modifier>> {
        let offer = self
            .reward_offer
            .as_ref()
            .ok_or_else(|| CoreError::NotFound("no module reward pending".into()))?;
        let chosen = offer
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("module {id} not in offer")))?;
        let evicted = weapon.install_replacing(chosen)?;
        self.reward_offer = None;
        Ok(evicted)
    }

    pub fn dismiss_reward(&mut self) {
        self.reward_offer = None;
    }

    pub fn end_game(&mut self) {
        if !self.game_over {
            info!(score = self.score, kills = self.kill_count, "game over");
        }
        self.game_over = true;
    }

    /// Advance the spawn and difficulty timers to `now_ms`
    pub fn tick(&mut self, now_ms: u64) -> SessionTick {
        let delta = self
            .last_tick_ms
            .map_or(0, |last| now_ms.saturating_sub(last));
        self.last_tick_ms = Some(now_ms);

        let mut out = SessionTick::default();
        if self.game_over || self.is_rewarding() {
            return out;
        }

        self.spawn_elapsed_ms += delta;
        while self.spawn_elapsed_ms >= self.config.enemy_spawn_interval_ms {
            self.spawn_elapsed_ms -= self.config.enemy_spawn_interval_ms;
            out.spawns += 1;
            if now_ms.saturating_sub(self.last_difficulty_ms) >= self.config.difficulty_interval_ms {
                self.difficulty += 1;
                self.last_difficulty_ms = now_ms;
                out.difficulty_increased = true;
                info!(difficulty = self.difficulty, "difficulty increased");
            }
        }
        out
    }

    pub fn initial_enemy_count(&self) -> u32 {
        self.config.initial_enemies_base + self.config.initial_enemies_per_difficulty * self.difficulty
    }

    /// Build the next level of the run from its derived seed
    pub fn next_level(&mut self, generator: &DungeonGenerator) -> CoreResult<Dungeon> {
        self.level += 1;
        let seed = self.run_seed.level_hash(self.level);
        generator.generate(self.config.map_width, self.config.map_height, seed)
    }

    /// Random archetype scaled to the current difficulty, placed in a random
    /// non-start room
    pub fn spawn_enemy(&mut self, dungeon: &Dungeon) -> CoreResult<EnemyBundle> {
        let position = dungeon.random_spawn_position(&mut self.rng)?;
        let kind = EnemyKind::random(&mut self.rng);
        Ok(kind.archetype().scaled(self.difficulty).spawn(position))
    }

    pub fn spawn_initial_enemies(&mut self, dungeon: &Dungeon) -> CoreResult<Vec<EnemyBundle>> {
        (0..self.initial_enemy_count())
            .map(|_| self.spawn_enemy(dungeon))
            .collect()
    }
}
