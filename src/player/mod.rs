//! Player character: movement, loadout, and firing.

use bevy::math::Vec2;
use bevy::prelude::Component;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::{Health, Projectile};
use crate::constants::{MUZZLE_OFFSET, PLAYER_MAX_HEALTH, PLAYER_RADIUS, PLAYER_SPEED};
use crate::error::{CoreError, CoreResult};
use crate::steering::Agent;
use crate::weapons::{Weapon, WeaponKind};

/// Held movement keys for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveInput {
    /// Raw direction with components in {-1, 0, 1}; y grows downward.
    /// When opposite keys are held the later check wins (down over up,
    /// right over left).
    pub fn axis(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up {
            dir.y = -1.0;
        }
        if self.down {
            dir.y = 1.0;
        }
        if self.left {
            dir.x = -1.0;
        }
        if self.right {
            dir.x = 1.0;
        }
        dir
    }
}

#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub agent: Agent,
    pub health: Health,
    pub speed: f32,
    loadout: Vec<Weapon>,
    current: usize,
}

impl Player {
    /// Player at `position` carrying every weapon preset, pistol drawn
    pub fn new(position: Vec2, invulnerable_ms: u64) -> Self {
        Self {
            agent: Agent::new(position, PLAYER_SPEED, PLAYER_RADIUS),
            health: Health::with_invulnerability(PLAYER_MAX_HEALTH, invulnerable_ms),
            speed: PLAYER_SPEED,
            loadout: WeaponKind::ALL.iter().map(|k| Weapon::from_kind(*k)).collect(),
            current: 0,
        }
    }

    pub fn weapons(&self) -> &[Weapon] {
        &self.loadout
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_weapon(&self) -> &Weapon {
        &self.loadout[self.current]
    }

    pub fn current_weapon_mut(&mut self) -> &mut Weapon {
        &mut self.loadout[self.current]
    }

    pub fn switch_weapon(&mut self, index: usize) -> CoreResult<&Weapon> {
        if index >= self.loadout.len() {
            return Err(CoreError::NotFound(format!(
                "weapon slot {index} (have {})",
                self.loadout.len()
            )));
        }
        self.current = index;
        Ok(&self.loadout[index])
    }

    /// Velocity for held keys. Diagonals are normalized to `speed`.
    pub fn movement_velocity(&self, input: MoveInput) -> Vec2 {
        input.axis().normalize_or_zero() * self.speed
    }

    /// Aim angle toward a world-space point, updating facing
    pub fn aim_at(&mut self, target: Vec2) -> f32 {
        self.agent.face(target);
        self.agent.facing
    }

    pub fn muzzle(&self, angle: f32) -> Vec2 {
        self.agent.position + Vec2::from_angle(angle) * MUZZLE_OFFSET
    }

    /// Fire the drawn weapon toward `target` from the muzzle.
    /// `None` while the weapon is cooling down.
    pub fn fire<R: Rng + ?Sized>(
        &mut self,
        now_ms: u64,
        target: Vec2,
        rng: &mut R,
    ) -> Option<Vec<Projectile>> {
        let angle = self.aim_at(target);
        let origin = self.muzzle(angle);
        self.current_weapon_mut().fire(now_ms, origin, angle, rng)
    }

    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PLAYER_INVULNERABLE_MS;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn player() -> Player {
        Player::new(Vec2::new(100.0, 100.0), PLAYER_INVULNERABLE_MS)
    }

    #[test]
    fn test_loadout_has_every_preset() {
        let p = player();
        let kinds: Vec<_> = p.weapons().iter().filter_map(|w| w.kind()).collect();
        assert_eq!(kinds, WeaponKind::ALL.to_vec());
        assert_eq!(p.current_weapon().kind(), Some(WeaponKind::Pistol));
    }

    #[test]
    fn test_switch_weapon() {
        let mut p = player();
        p.switch_weapon(5).unwrap();
        assert_eq!(p.current_weapon().kind(), Some(WeaponKind::RocketLauncher));
        assert!(matches!(p.switch_weapon(6), Err(CoreError::NotFound(_))));
        assert_eq!(p.current_index(), 5, "failed switch keeps weapon");
    }

    #[test]
    fn test_diagonal_movement_normalized() {
        let p = player();
        let v = p.movement_velocity(MoveInput {
            up: true,
            right: true,
            ..Default::default()
        });
        assert!((v.length() - PLAYER_SPEED).abs() < 1e-3);
        assert!(v.x > 0.0 && v.y < 0.0);
        assert_eq!(p.movement_velocity(MoveInput::default()), Vec2::ZERO);
    }

    #[test]
    fn test_fire_from_muzzle() {
        let mut p = player();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(2);
        let shots = p.fire(0, Vec2::new(300.0, 100.0), &mut rng).unwrap();
        assert_eq!(shots.len(), 1);
        assert!((shots[0].origin() - Vec2::new(132.0, 100.0)).length() < 1e-3);
        assert!(p.fire(100, Vec2::new(300.0, 100.0), &mut rng).is_none());
    }

    #[test]
    fn test_player_invulnerability() {
        let mut p = player();
        assert_eq!(p.health.take_damage(10.0, 0), 10.0);
        assert_eq!(p.health.take_damage(10.0, 200), 0.0);
        assert!(p.is_alive());
    }
}
