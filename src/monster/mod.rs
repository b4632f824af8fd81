//! Enemy archetypes and spawning.
//!
//! Archetype = base stats per kind, scaled by the session difficulty at spawn
//! time. Each spawned enemy is an `Agent` driven by an `AiBrain`.

use bevy::math::Vec2;
use bevy::prelude::{Bundle, Component};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::Health;
use crate::constants::CHASE_SPEED_MULT;
use crate::steering::Agent;

pub mod ai;

pub use ai::{AiBrain, AiConfig, AiState, AiTick};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Grunt,   // baseline
    Brute,   // slow, tanky
    Runner,  // fast, fragile
    Stalker, // quick all-rounder
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [
        EnemyKind::Grunt,
        EnemyKind::Brute,
        EnemyKind::Runner,
        EnemyKind::Stalker,
    ];

    pub fn archetype(&self) -> EnemyArchetype {
        let (health, speed, damage, size, score) = match self {
            Self::Grunt => (30.0, 100.0, 10.0, 20.0, 10),
            Self::Brute => (50.0, 80.0, 15.0, 24.0, 20),
            Self::Runner => (20.0, 150.0, 8.0, 16.0, 15),
            Self::Stalker => (40.0, 120.0, 12.0, 22.0, 18),
        };
        EnemyArchetype {
            kind: *self,
            health,
            speed,
            damage,
            size,
            score,
            knockback_resistance: 0.5,
            ai: AiConfig::default(),
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Base stats for one kind of enemy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyArchetype {
    pub kind: EnemyKind,
    pub health: f32,
    /// Base speed; chasing runs at `CHASE_SPEED_MULT` times this
    pub speed: f32,
    /// Damage per melee attack
    pub damage: f32,
    /// Body diameter
    pub size: f32,
    pub score: u32,
    pub knockback_resistance: f32,
    pub ai: AiConfig,
}

impl EnemyArchetype {
    /// Health +20% and damage +10% per difficulty level
    pub fn scaled(&self, difficulty: u32) -> Self {
        let d = difficulty as f32;
        Self {
            health: self.health * (1.0 + d * 0.2),
            damage: self.damage * (1.0 + d * 0.1),
            ..self.clone()
        }
    }

    pub fn chase_speed(&self) -> f32 {
        self.speed * CHASE_SPEED_MULT
    }

    pub fn spawn(&self, position: Vec2) -> EnemyBundle {
        EnemyBundle {
            enemy: Enemy {
                kind: self.kind,
                damage: self.damage,
                score: self.score,
                knockback_resistance: self.knockback_resistance,
            },
            agent: Agent::new(position, self.chase_speed(), self.size / 2.0),
            health: Health::new(self.health),
            brain: AiBrain::new(self.ai.clone()),
        }
    }
}

/// Per-enemy stats that survive spawning
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub damage: f32,
    pub score: u32,
    pub knockback_resistance: f32,
}

#[derive(Bundle, Debug, Clone)]
pub struct EnemyBundle {
    pub enemy: Enemy,
    pub agent: Agent,
    pub health: Health,
    pub brain: AiBrain,
}
