//! Ranged weapons: base stat presets, module slots, and firing.
//!
//! A weapon caches its effective stats and recomputes them whenever the
//! applied module list changes. Firing is gated on a millisecond clock passed
//! in by the caller.

pub mod modifiers;

use bevy::math::Vec2;
use bevy::prelude::Component;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::projectile::Projectile;
use crate::error::{CoreError, CoreResult};

pub use modifiers::{
    all_modifier_presets, modifier_preset, recompute, FlagStat, Modifier, NumericStat, Override,
    Rarity, StatAdjustment,
};

/// Weapon presets available to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    Pistol,
    MachineGun,
    Shotgun,
    Sniper,
    Laser,
    RocketLauncher,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 6] = [
        WeaponKind::Pistol,
        WeaponKind::MachineGun,
        WeaponKind::Shotgun,
        WeaponKind::Sniper,
        WeaponKind::Laser,
        WeaponKind::RocketLauncher,
    ];

    pub fn base_stats(&self) -> WeaponBaseStats {
        match self {
            Self::Pistol => pistol(),
            Self::MachineGun => machine_gun(),
            Self::Shotgun => shotgun(),
            Self::Sniper => sniper(),
            Self::Laser => laser(),
            Self::RocketLauncher => rocket_launcher(),
        }
    }
}

/// Every stat a modifier can read or write
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub damage: f32,
    /// Milliseconds between shots
    pub fire_interval: f32,
    pub projectile_speed: f32,
    pub projectile_size: f32,
    pub range: f32,
    /// Total cone in degrees
    pub spread: f32,
    pub projectile_count: f32,
    pub explosion_radius: f32,
    pub piercing: bool,
    pub auto_fire: bool,
    pub explosive: bool,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self {
            damage: 10.0,
            fire_interval: 300.0,
            projectile_speed: 600.0,
            projectile_size: 4.0,
            range: 500.0,
            spread: 0.0,
            projectile_count: 1.0,
            explosion_radius: 0.0,
            piercing: false,
            auto_fire: false,
            explosive: false,
        }
    }
}

impl StatBlock {
    pub fn get(&self, stat: NumericStat) -> f32 {
        match stat {
            NumericStat::Damage => self.damage,
            NumericStat::FireInterval => self.fire_interval,
            NumericStat::ProjectileSpeed => self.projectile_speed,
            NumericStat::ProjectileSize => self.projectile_size,
            NumericStat::Range => self.range,
            NumericStat::Spread => self.spread,
            NumericStat::ProjectileCount => self.projectile_count,
            NumericStat::ExplosionRadius => self.explosion_radius,
        }
    }

    pub fn get_mut(&mut self, stat: NumericStat) -> &mut f32 {
        match stat {
            NumericStat::Damage => &mut self.damage,
            NumericStat::FireInterval => &mut self.fire_interval,
            NumericStat::ProjectileSpeed => &mut self.projectile_speed,
            NumericStat::ProjectileSize => &mut self.projectile_size,
            NumericStat::Range => &mut self.range,
            NumericStat::Spread => &mut self.spread,
            NumericStat::ProjectileCount => &mut self.projectile_count,
            NumericStat::ExplosionRadius => &mut self.explosion_radius,
        }
    }

    pub fn flag(&self, flag: FlagStat) -> bool {
        match flag {
            FlagStat::Piercing => self.piercing,
            FlagStat::AutoFire => self.auto_fire,
            FlagStat::Explosive => self.explosive,
        }
    }

    pub fn set_flag(&mut self, flag: FlagStat, value: bool) {
        match flag {
            FlagStat::Piercing => self.piercing = value,
            FlagStat::AutoFire => self.auto_fire = value,
            FlagStat::Explosive => self.explosive = value,
        }
    }
}

/// Immutable weapon definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponBaseStats {
    pub name: String,
    pub stats: StatBlock,
    pub module_slots: usize,
}

/// Clamped stats after all modules are applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveStats {
    pub name: String,
    pub stats: StatBlock,
}

impl EffectiveStats {
    pub fn fire_interval_ms(&self) -> u64 {
        self.stats.fire_interval.round() as u64
    }

    /// Whole projectiles per shot. Fractional counts round up.
    pub fn projectile_count(&self) -> u32 {
        self.stats.projectile_count.ceil().max(1.0) as u32
    }

    /// Explosion radius when the weapon is explosive
    pub fn explosion(&self) -> Option<f32> {
        (self.stats.explosive && self.stats.explosion_radius > 0.0)
            .then_some(self.stats.explosion_radius)
    }
}

/// A weapon instance with its applied modules
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    kind: Option<WeaponKind>,
    base: WeaponBaseStats,
    modifiers: Vec<Modifier>,
    effective: EffectiveStats,
    last_fire_ms: Option<u64>,
}

impl Weapon {
    pub fn new(base: WeaponBaseStats) -> Self {
        let effective = recompute(&base, &[]);
        Self {
            kind: None,
            base,
            modifiers: Vec::new(),
            effective,
            last_fire_ms: None,
        }
    }

    pub fn from_kind(kind: WeaponKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::new(kind.base_stats())
        }
    }

    pub fn kind(&self) -> Option<WeaponKind> {
        self.kind
    }

    pub fn base(&self) -> &WeaponBaseStats {
        &self.base
    }

    pub fn effective(&self) -> &EffectiveStats {
        &self.effective
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn slot_capacity(&self) -> usize {
        self.base.module_slots
    }

    pub fn has_free_slot(&self) -> bool {
        self.modifiers.len() < self.base.module_slots
    }

    pub fn apply_modifier(&mut self, modifier: Modifier) -> CoreResult<&EffectiveStats> {
        if !self.has_free_slot() {
            return Err(CoreError::NoSlotAvailable {
                capacity: self.base.module_slots,
            });
        }
        self.modifiers.push(modifier);
        self.refresh();
        Ok(&self.effective)
    }

    /// Apply a module preset by id
    pub fn apply_preset(&mut self, id: &str) -> CoreResult<&EffectiveStats> {
        let modifier =
            modifier_preset(id).ok_or_else(|| CoreError::NotFound(format!("module preset {id}")))?;
        self.apply_modifier(modifier)
    }

    /// Remove every applied module with this id
    pub fn remove_modifier(&mut self, id: &str) -> CoreResult<&EffectiveStats> {
        let before = self.modifiers.len();
        self.modifiers.retain(|m| m.id != id);
        if self.modifiers.len() == before {
            return Err(CoreError::NotFound(format!("applied module {id}")));
        }
        self.refresh();
        Ok(&self.effective)
    }

    /// Install a module, evicting the oldest one (every instance of its id)
    /// when all slots are taken. Returns the evicted module.
    pub fn install_replacing(&mut self, modifier: Modifier) -> CoreResult<Option<Modifier>> {
        let mut evicted = None;
        if !self.has_free_slot() {
            if let Some(oldest) = self.modifiers.first().cloned() {
                self.remove_modifier(&oldest.id)?;
                evicted = Some(oldest);
            }
        }
        self.apply_modifier(modifier)?;
        Ok(evicted)
    }

    pub fn clear_modifiers(&mut self) {
        if self.modifiers.is_empty() {
            return;
        }
        self.modifiers.clear();
        self.refresh();
    }

    fn refresh(&mut self) {
        self.effective = recompute(&self.base, &self.modifiers);
    }

    pub fn can_fire(&self, now_ms: u64) -> bool {
        match self.last_fire_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.effective.fire_interval_ms(),
            None => true,
        }
    }

    /// Fraction of the fire interval elapsed since the last shot (HUD bar)
    pub fn cooldown_progress(&self, now_ms: u64) -> f32 {
        let Some(last) = self.last_fire_ms else {
            return 1.0;
        };
        let interval = self.effective.fire_interval_ms().max(1);
        (now_ms.saturating_sub(last) as f32 / interval as f32).min(1.0)
    }

    /// Try to fire. Returns `None` while on cooldown.
    ///
    /// Multiple projectiles are fanned evenly across the spread cone. A single
    /// projectile gets a random offset within half the cone either side.
    pub fn fire<R: Rng + ?Sized>(
        &mut self,
        now_ms: u64,
        origin: Vec2,
        aim: f32,
        rng: &mut R,
    ) -> Option<Vec<Projectile>> {
        if !self.can_fire(now_ms) {
            return None;
        }
        self.last_fire_ms = Some(now_ms);

        let count = self.effective.projectile_count();
        let spread = self.effective.stats.spread.to_radians();
        let projectiles = (0..count)
            .map(|i| {
                let angle = if count > 1 {
                    let step = spread / (count - 1) as f32;
                    aim - spread / 2.0 + step * i as f32
                } else if spread > 0.0 {
                    aim + rng.gen_range(-spread / 2.0..=spread / 2.0)
                } else {
                    aim
                };
                Projectile::from_stats(&self.effective, origin, angle, now_ms)
            })
            .collect();
        Some(projectiles)
    }
}

// =====================================================
// Weapon templates
// =====================================================

fn template(name: &str, module_slots: usize, stats: StatBlock) -> WeaponBaseStats {
    WeaponBaseStats {
        name: name.into(),
        stats,
        module_slots,
    }
}

pub fn pistol() -> WeaponBaseStats {
    template(
        "Pistol",
        2,
        StatBlock {
            damage: 15.0,
            fire_interval: 400.0,
            projectile_speed: 700.0,
            projectile_size: 5.0,
            spread: 2.0,
            ..Default::default()
        },
    )
}

pub fn machine_gun() -> WeaponBaseStats {
    template(
        "Machine Gun",
        3,
        StatBlock {
            damage: 8.0,
            fire_interval: 100.0,
            projectile_speed: 900.0,
            projectile_size: 4.0,
            spread: 8.0,
            auto_fire: true,
            ..Default::default()
        },
    )
}

pub fn shotgun() -> WeaponBaseStats {
    template(
        "Shotgun",
        2,
        StatBlock {
            damage: 12.0,
            fire_interval: 800.0,
            projectile_speed: 500.0,
            projectile_size: 4.0,
            projectile_count: 5.0,
            spread: 25.0,
            ..Default::default()
        },
    )
}

pub fn sniper() -> WeaponBaseStats {
    template(
        "Sniper",
        2,
        StatBlock {
            damage: 50.0,
            fire_interval: 1200.0,
            projectile_speed: 1500.0,
            projectile_size: 6.0,
            piercing: true,
            ..Default::default()
        },
    )
}

pub fn laser() -> WeaponBaseStats {
    template(
        "Laser",
        2,
        StatBlock {
            damage: 20.0,
            fire_interval: 200.0,
            projectile_speed: 2000.0,
            projectile_size: 3.0,
            spread: 1.0,
            piercing: true,
            ..Default::default()
        },
    )
}

pub fn rocket_launcher() -> WeaponBaseStats {
    template(
        "Rocket Launcher",
        1,
        StatBlock {
            damage: 100.0,
            fire_interval: 1500.0,
            projectile_speed: 400.0,
            projectile_size: 12.0,
            spread: 5.0,
            explosive: true,
            explosion_radius: 100.0,
            ..Default::default()
        },
    )
}
