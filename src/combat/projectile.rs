//! Projectiles in flight and their contact rules.

use std::collections::HashSet;

use bevy::math::Vec2;
use bevy::prelude::Component;
use serde::{Deserialize, Serialize};

use super::{apply_area_effect, AreaCandidate, EntityId};
use crate::constants::PROJECTILE_GRACE_MS;
use crate::generation::TileGrid;
use crate::weapons::EffectiveStats;

/// Area blast centered where an explosive projectile detonated
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub center: Vec2,
    pub radius: f32,
    pub damage: f32,
}

impl Explosion {
    pub fn resolve(&self, candidates: &[AreaCandidate]) -> Vec<(EntityId, f32)> {
        apply_area_effect(self.center, self.radius, self.damage, candidates)
    }
}

/// Result of a projectile touching a target
#[derive(Debug, Clone, PartialEq)]
pub enum Contact {
    /// Projectile was already consumed
    Spent,
    /// Piercing projectile already went through this target
    AlreadyPierced,
    Direct { damage: f32, consumed: bool },
    Explode(Explosion),
}

#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    origin: Vec2,
    angle: f32,
    velocity: Vec2,
    damage: f32,
    size: f32,
    range: f32,
    piercing: bool,
    explosion_radius: Option<f32>,
    fired_at_ms: u64,
    lifetime_ms: u64,
    pierced: HashSet<EntityId>,
    spent: bool,
}

impl Projectile {
    /// Snapshot the firing weapon's stats into a new projectile
    pub fn from_stats(stats: &EffectiveStats, origin: Vec2, angle: f32, now_ms: u64) -> Self {
        let s = &stats.stats;
        let travel_ms = (s.range / s.projectile_speed * 1000.0) as u64;
        Self {
            origin,
            angle,
            velocity: Vec2::from_angle(angle) * s.projectile_speed,
            damage: s.damage,
            size: s.projectile_size,
            range: s.range,
            piercing: s.piercing,
            explosion_radius: stats.explosion(),
            fired_at_ms: now_ms,
            lifetime_ms: travel_ms + PROJECTILE_GRACE_MS,
            pierced: HashSet::new(),
            spent: false,
        }
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn damage(&self) -> f32 {
        self.damage
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn lifetime_ms(&self) -> u64 {
        self.lifetime_ms
    }

    pub fn is_piercing(&self) -> bool {
        self.piercing
    }

    pub fn is_spent(&self) -> bool {
        self.spent
    }

    pub fn has_pierced(&self, target: EntityId) -> bool {
        self.pierced.contains(&target)
    }

    /// Straight-line position after flying since it was fired
    pub fn position_at(&self, now_ms: u64) -> Vec2 {
        let elapsed = now_ms.saturating_sub(self.fired_at_ms) as f32 / 1000.0;
        self.origin + self.velocity * elapsed
    }

    /// Past its range from the origin or past its lifetime
    pub fn is_expired(&self, position: Vec2, now_ms: u64) -> bool {
        self.spent
            || position.distance(self.origin) > self.range
            || now_ms.saturating_sub(self.fired_at_ms) >= self.lifetime_ms
    }

    /// Left the playable area of the grid
    pub fn escaped(&self, position: Vec2, grid: &TileGrid) -> bool {
        let (x, y) = grid.world_to_tile(position);
        !grid.contains(x, y)
    }

    /// Resolve contact with a target at the projectile's current position
    pub fn contact(&mut self, target: EntityId, position: Vec2) -> Contact {
        if self.spent {
            return Contact::Spent;
        }
        if self.piercing && self.pierced.contains(&target) {
            return Contact::AlreadyPierced;
        }
        if let Some(explosion) = self.detonate(position) {
            return Contact::Explode(explosion);
        }
        if self.piercing {
            self.pierced.insert(target);
            Contact::Direct {
                damage: self.damage,
                consumed: false,
            }
        } else {
            self.spent = true;
            Contact::Direct {
                damage: self.damage,
                consumed: true,
            }
        }
    }

    /// Hit a wall. Always consumes; explosives still blow up.
    pub fn hit_wall(&mut self, position: Vec2) -> Option<Explosion> {
        if self.spent {
            return None;
        }
        let explosion = self.detonate(position);
        self.spent = true;
        explosion
    }

    fn detonate(&mut self, position: Vec2) -> Option<Explosion> {
        let radius = self.explosion_radius?;
        self.spent = true;
        Some(Explosion {
            center: position,
            radius,
            damage: self.damage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weapons::{Weapon, WeaponKind};

    fn shot(kind: WeaponKind) -> Projectile {
        let weapon = Weapon::from_kind(kind);
        Projectile::from_stats(weapon.effective(), Vec2::ZERO, 0.0, 0)
    }

    #[test]
    fn test_piercing_idempotent() {
        let mut p = shot(WeaponKind::Sniper);
        let target = EntityId(9);
        assert_eq!(
            p.contact(target, Vec2::ZERO),
            Contact::Direct { damage: 50.0, consumed: false }
        );
        assert_eq!(p.contact(target, Vec2::ZERO), Contact::AlreadyPierced);
        assert!(p.has_pierced(target));
        assert!(matches!(p.contact(EntityId(10), Vec2::ZERO), Contact::Direct { .. }));
    }

    #[test]
    fn test_plain_projectile_consumed() {
        let mut p = shot(WeaponKind::Pistol);
        assert_eq!(
            p.contact(EntityId(1), Vec2::ZERO),
            Contact::Direct { damage: 15.0, consumed: true }
        );
        assert_eq!(p.contact(EntityId(2), Vec2::ZERO), Contact::Spent);
    }

    #[test]
    fn test_rocket_explodes_on_contact() {
        let mut p = shot(WeaponKind::RocketLauncher);
        let at = Vec2::new(64.0, 0.0);
        let Contact::Explode(explosion) = p.contact(EntityId(1), at) else {
            panic!("rocket should explode");
        };
        assert_eq!(explosion.center, at);
        assert_eq!(explosion.radius, 100.0);
        assert!(p.is_spent());

        let victims = explosion.resolve(&[
            AreaCandidate { id: EntityId(1), position: at },
            AreaCandidate { id: EntityId(2), position: at + Vec2::new(100.0, 0.0) },
        ]);
        assert_eq!(victims, vec![(EntityId(1), 100.0), (EntityId(2), 50.0)]);
    }

    #[test]
    fn test_rocket_explodes_on_wall() {
        let mut p = shot(WeaponKind::RocketLauncher);
        assert!(p.hit_wall(Vec2::ZERO).is_some());
        assert!(p.hit_wall(Vec2::ZERO).is_none());

        let mut bullet = shot(WeaponKind::Pistol);
        assert!(bullet.hit_wall(Vec2::ZERO).is_none());
        assert!(bullet.is_spent());
    }

    #[test]
    fn test_lifetime_and_range() {
        let p = shot(WeaponKind::Pistol); // range 500, speed 700
        assert_eq!(p.lifetime_ms(), 714 + 1000);
        assert!(!p.is_expired(Vec2::new(400.0, 0.0), 100));
        assert!(p.is_expired(Vec2::new(501.0, 0.0), 100));
        assert!(p.is_expired(Vec2::new(10.0, 0.0), 1714));
    }

    #[test]
    fn test_escaped_grid() {
        let dungeon = crate::generation::generate(60, 45, 3).unwrap();
        let p = shot(WeaponKind::Pistol);
        assert!(!p.escaped(dungeon.start_position, &dungeon.grid));
        assert!(p.escaped(Vec2::new(-5.0, 10.0), &dungeon.grid));
        assert!(p.escaped(Vec2::new(60.0 * 32.0 + 1.0, 10.0), &dungeon.grid));
    }

    #[test]
    fn test_position_follows_flight() {
        let p = shot(WeaponKind::Pistol); // speed 700 along +x
        assert_eq!(p.position_at(0), Vec2::ZERO);
        assert!((p.position_at(500) - Vec2::new(350.0, 0.0)).length() < 1e-3);
        assert!(p.is_expired(p.position_at(800), 800), "flew past its range");
    }

    #[test]
    fn test_velocity_follows_angle() {
        let weapon = Weapon::from_kind(WeaponKind::Laser);
        let p = Projectile::from_stats(
            weapon.effective(),
            Vec2::ZERO,
            std::f32::consts::FRAC_PI_2,
            0,
        );
        assert!(p.velocity().x.abs() < 1e-3);
        assert!((p.velocity().y - 2000.0).abs() < 1e-2);
    }
}
