//! Enemy AI behavior.
//!
//! Three-state machine driven by distance to the target. Transitions are
//! rate-limited by a minimum dwell time so an enemy hovering at a range
//! boundary does not flicker between states.

use bevy::math::Vec2;
use bevy::prelude::Component;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::constants::{
    AI_ATTACK_COOLDOWN_MS, AI_ATTACK_RANGE, AI_DETECTION_RANGE, AI_MIN_DWELL_MS,
};
use crate::generation::TileGrid;
use crate::steering::{steer, Agent, SteeringConfig};

/// AI state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    #[default]
    Idle,
    Chase,
    Attack,
}

impl AiState {
    /// Label shown by debug overlays
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Chase => "CHASE",
            Self::Attack => "ATTACK",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub detection_range: f32,
    pub attack_range: f32,
    pub min_dwell_ms: u64,
    pub attack_cooldown_ms: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            detection_range: AI_DETECTION_RANGE,
            attack_range: AI_ATTACK_RANGE,
            min_dwell_ms: AI_MIN_DWELL_MS,
            attack_cooldown_ms: AI_ATTACK_COOLDOWN_MS,
        }
    }
}

impl AiConfig {
    /// State the distance alone asks for
    pub fn desired_state(&self, distance: f32) -> AiState {
        if distance <= self.attack_range {
            AiState::Attack
        } else if distance <= self.detection_range {
            AiState::Chase
        } else {
            AiState::Idle
        }
    }
}

/// What one AI tick decided
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiTick {
    pub state: AiState,
    pub velocity: Vec2,
    pub facing: f32,
    /// An attack landed this tick
    pub attacked: bool,
}

#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiBrain {
    pub config: AiConfig,
    state: AiState,
    last_transition_ms: Option<u64>,
    last_attack_ms: Option<u64>,
}

impl AiBrain {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            state: AiState::Idle,
            last_transition_ms: None,
            last_attack_ms: None,
        }
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    /// Move to the distance-selected state if the dwell time allows it
    pub fn update_state(&mut self, distance: f32, now_ms: u64) -> AiState {
        let wanted = self.config.desired_state(distance);
        if wanted == self.state {
            return self.state;
        }
        let dwell_ok = match self.last_transition_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.config.min_dwell_ms,
            None => true,
        };
        if dwell_ok {
            trace!(from = self.state.label(), to = wanted.label(), "ai transition");
            self.state = wanted;
            self.last_transition_ms = Some(now_ms);
        }
        self.state
    }

    fn try_attack(&mut self, now_ms: u64) -> bool {
        let ready = match self.last_attack_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.config.attack_cooldown_ms,
            None => true,
        };
        if ready {
            self.last_attack_ms = Some(now_ms);
        }
        ready
    }

    /// Run one tick against `target`.
    ///
    /// Chase steers through the grid; Idle and Attack stand still. Facing
    /// always points at the target.
    #[allow(clippy::too_many_arguments)]
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        now_ms: u64,
        agent: &Agent,
        target: Vec2,
        grid: &TileGrid,
        neighbors: &[Vec2],
        steering: &SteeringConfig,
        rng: &mut R,
    ) -> AiTick {
        let state = self.update_state(agent.position.distance(target), now_ms);

        let mut facing_agent = *agent;
        facing_agent.face(target);

        let (velocity, attacked) = match state {
            AiState::Idle => (Vec2::ZERO, false),
            AiState::Chase => (steer(agent, target, grid, neighbors, steering, rng), false),
            AiState::Attack => (Vec2::ZERO, self.try_attack(now_ms)),
        };

        AiTick {
            state,
            velocity,
            facing: facing_agent.facing,
            attacked,
        }
    }
}

impl Default for AiBrain {
    fn default() -> Self {
        Self::new(AiConfig::default())
    }
}
