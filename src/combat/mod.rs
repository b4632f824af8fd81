//! Damage resolution: direct hits, area falloff, knockback.
//!
//! Everything here is a pure function of stats and geometry. The caller owns
//! collision detection and feeds contacts in; results come back as damage
//! amounts or `DamageEvent`s for the renderer.

pub mod projectile;

use bevy::math::Vec2;
use bevy::prelude::{Component, Entity, Event};
use serde::{Deserialize, Serialize};

use crate::constants::{AREA_EDGE_FALLOFF, BASE_KNOCKBACK, PLAYER_INVULNERABLE_MS};
use crate::error::{CoreError, CoreResult};
use crate::weapons::EffectiveStats;

pub use projectile::{Contact, Explosion, Projectile};

/// Stable identifier for anything that can take damage
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityId(pub u64);

impl From<Entity> for EntityId {
    fn from(entity: Entity) -> Self {
        Self(entity.to_bits())
    }
}

/// Hit points with an optional invulnerability window after each hit
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    /// Window opened by each damaging hit; 0 disables it
    pub invulnerable_ms: u64,
    pub invulnerable_until: u64,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            invulnerable_ms: 0,
            invulnerable_until: 0,
        }
    }

    pub fn with_invulnerability(max: f32, window_ms: u64) -> Self {
        Self {
            invulnerable_ms: window_ms,
            ..Self::new(max)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn is_invulnerable(&self, now_ms: u64) -> bool {
        now_ms < self.invulnerable_until
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }

    /// Apply damage and return the amount actually removed.
    /// Hits inside the invulnerability window remove nothing.
    pub fn take_damage(&mut self, amount: f32, now_ms: u64) -> f32 {
        if self.is_invulnerable(now_ms) || !self.is_alive() {
            return 0.0;
        }
        let actual = amount.max(0.0).min(self.current);
        if actual <= 0.0 {
            return 0.0;
        }
        self.current -= actual;
        if self.invulnerable_ms > 0 {
            self.invulnerable_until = now_ms + self.invulnerable_ms;
        }
        actual
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageKind {
    Projectile,
    Explosion,
    Melee,
}

/// Damage dealt, for floating numbers and hit effects
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub target: EntityId,
    pub amount: f32,
    pub kind: DamageKind,
    pub position: Vec2,
}

/// Something that can be caught in an area effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaCandidate {
    pub id: EntityId,
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Knockback speed before resistance
    pub base_knockback: f32,
    pub player_invulnerable_ms: u64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            base_knockback: BASE_KNOCKBACK,
            player_invulnerable_ms: PLAYER_INVULNERABLE_MS,
        }
    }
}

impl CombatConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.base_knockback.is_finite() || self.base_knockback < 0.0 {
            return Err(CoreError::InvalidConfiguration(format!(
                "base_knockback {} must be non-negative",
                self.base_knockback
            )));
        }
        Ok(())
    }
}

/// Direct hit using the attacker's effective damage
pub fn apply_hit(attacker: &EffectiveStats, target: &mut Health, now_ms: u64) -> f32 {
    target.take_damage(attacker.stats.damage, now_ms)
}

/// Falloff damage at `distance` from the center, `None` outside the radius.
/// Full damage at the center, half at the edge, floored.
pub fn area_damage(base_damage: f32, radius: f32, distance: f32) -> Option<f32> {
    if radius <= 0.0 || distance.is_nan() || distance > radius {
        return None;
    }
    let multiplier = 1.0 - AREA_EDGE_FALLOFF * (distance.max(0.0) / radius);
    Some((base_damage * multiplier).floor())
}

/// Damage per candidate inside the radius, in candidate order
pub fn apply_area_effect(
    center: Vec2,
    radius: f32,
    base_damage: f32,
    candidates: &[AreaCandidate],
) -> Vec<(EntityId, f32)> {
    candidates
        .iter()
        .filter_map(|c| {
            area_damage(base_damage, radius, center.distance(c.position)).map(|d| (c.id, d))
        })
        .collect()
}

/// Velocity pushing the target away from the source
pub fn knockback_velocity(target: Vec2, source: Vec2, resistance: f32, base: f32) -> Vec2 {
    let direction = (target - source).normalize_or_zero();
    direction * base * (1.0 - resistance.clamp(0.0, 1.0))
}
