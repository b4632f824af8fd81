//! Weapon modules and the stat recompute pipeline.
//!
//! Each applied modifier runs its own pass over the running stat block:
//! add deltas, then multiply factors, then overrides, then its optional
//! custom adjustment. Modifiers run in insertion order, so a later override
//! replaces everything before it. Clamping to the per-stat limits is the last
//! step and always runs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EffectiveStats, StatBlock, WeaponBaseStats, WeaponKind};

/// Numeric stats a modifier can touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericStat {
    Damage,
    FireInterval,
    ProjectileSpeed,
    ProjectileSize,
    Range,
    Spread,
    ProjectileCount,
    ExplosionRadius,
}

impl NumericStat {
    pub const ALL: [NumericStat; 8] = [
        NumericStat::Damage,
        NumericStat::FireInterval,
        NumericStat::ProjectileSpeed,
        NumericStat::ProjectileSize,
        NumericStat::Range,
        NumericStat::Spread,
        NumericStat::ProjectileCount,
        NumericStat::ExplosionRadius,
    ];

    /// Inclusive [min, max] every effective stat is clamped to
    pub fn limits(&self) -> (f32, f32) {
        match self {
            Self::Damage => (1.0, 999.0),
            Self::FireInterval => (60.0, 2000.0),
            Self::ProjectileSpeed => (100.0, 5000.0),
            Self::ProjectileSize => (2.0, 24.0),
            Self::Range => (100.0, 2000.0),
            Self::Spread => (0.0, 60.0),
            Self::ProjectileCount => (1.0, 20.0),
            Self::ExplosionRadius => (0.0, 400.0),
        }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        let (min, max) = self.limits();
        if value.is_nan() {
            min
        } else {
            value.clamp(min, max)
        }
    }
}

/// Boolean stats a modifier can override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagStat {
    Piercing,
    AutoFire,
    Explosive,
}

/// Absolute override of a single stat
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Override {
    Numeric(NumericStat, f32),
    Flag(FlagStat, bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
}

/// Procedural adjustment run after a modifier's add/mul/set pass
pub type StatAdjustment = fn(&mut StatBlock);

/// A named bundle of stat operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modifier {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    #[serde(default)]
    pub add: Vec<(NumericStat, f32)>,
    #[serde(default)]
    pub mul: Vec<(NumericStat, f32)>,
    #[serde(default)]
    pub set: Vec<Override>,
    #[serde(default)]
    pub recommended_for: Vec<WeaponKind>,
    #[serde(skip)]
    pub adjust: Option<StatAdjustment>,
}

impl Modifier {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rarity: Rarity::Common,
            add: Vec::new(),
            mul: Vec::new(),
            set: Vec::new(),
            recommended_for: Vec::new(),
            adjust: None,
        }
    }

    pub fn rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn add(mut self, stat: NumericStat, delta: f32) -> Self {
        self.add.push((stat, delta));
        self
    }

    pub fn mul(mut self, stat: NumericStat, factor: f32) -> Self {
        self.mul.push((stat, factor));
        self
    }

    pub fn set(mut self, stat: NumericStat, value: f32) -> Self {
        self.set.push(Override::Numeric(stat, value));
        self
    }

    pub fn set_flag(mut self, flag: FlagStat, value: bool) -> Self {
        self.set.push(Override::Flag(flag, value));
        self
    }

    pub fn adjust(mut self, adjustment: StatAdjustment) -> Self {
        self.adjust = Some(adjustment);
        self
    }

    pub fn recommend(mut self, kinds: &[WeaponKind]) -> Self {
        self.recommended_for.extend_from_slice(kinds);
        self
    }

    /// One application pass: add -> mul -> set -> custom
    pub fn apply_to(&self, stats: &mut StatBlock) {
        for &(stat, delta) in &self.add {
            *stats.get_mut(stat) += delta;
        }
        for &(stat, factor) in &self.mul {
            *stats.get_mut(stat) *= factor;
        }
        for op in &self.set {
            match *op {
                Override::Numeric(stat, value) => *stats.get_mut(stat) = value,
                Override::Flag(flag, value) => stats.set_flag(flag, value),
            }
        }
        if let Some(adjust) = self.adjust {
            adjust(stats);
        }
    }
}

/// Compose base stats with the applied modifiers into a fresh clamped snapshot
pub fn recompute(base: &WeaponBaseStats, modifiers: &[Modifier]) -> EffectiveStats {
    let mut stats = base.stats;
    for modifier in modifiers {
        modifier.apply_to(&mut stats);
    }
    debug!(
        weapon = %base.name,
        modifiers = modifiers.len(),
        "weapon stats recomputed"
    );
    EffectiveStats {
        name: base.name.clone(),
        stats: clamp(stats),
    }
}

/// Clamp every numeric stat to its limits
pub fn clamp(mut stats: StatBlock) -> StatBlock {
    for stat in NumericStat::ALL {
        let value = stats.get(stat);
        *stats.get_mut(stat) = stat.clamp(value);
    }
    stats
}

/// Look up a module preset by id
pub fn modifier_preset(id: &str) -> Option<Modifier> {
    all_modifier_presets().into_iter().find(|m| m.id == id)
}

/// Every module preset, in catalogue order
pub fn all_modifier_presets() -> Vec<Modifier> {
    use NumericStat::*;
    use WeaponKind::*;

    vec![
        Modifier::new("RAPID_COIL", "Rapid Coil")
            .add(FireInterval, -80.0)
            .add(Spread, 2.0)
            .recommend(&[Pistol, MachineGun, Laser]),
        Modifier::new("HEAVY_CALIBER", "Heavy Caliber")
            .rarity(Rarity::Rare)
            .add(Damage, 8.0)
            .add(ProjectileSize, 2.0)
            .add(FireInterval, 120.0)
            .recommend(&[Sniper, Shotgun]),
        Modifier::new("SPLIT_CHAMBER", "Split Chamber")
            .rarity(Rarity::Rare)
            .add(ProjectileCount, 2.0)
            .add(Spread, 8.0)
            .add(FireInterval, 150.0)
            .recommend(&[Shotgun, MachineGun]),
        Modifier::new("PIERCING_CORE", "Piercing Core")
            .set_flag(FlagStat::Piercing, true)
            .recommend(&[Sniper, Laser]),
        Modifier::new("LONG_BARREL", "Long Barrel")
            .add(Range, 300.0)
            .add(ProjectileSpeed, 200.0)
            .recommend(&[Sniper, Pistol]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pistol() -> WeaponBaseStats {
        WeaponKind::Pistol.base_stats()
    }

    #[test]
    fn test_no_modifiers_returns_base() {
        let base = pistol();
        let effective = recompute(&base, &[]);
        assert_eq!(effective.stats, base.stats);
        assert_eq!(effective.name, base.name);
    }

    #[test]
    fn test_set_then_add() {
        let base = pistol();
        let set = Modifier::new("s", "set").set(NumericStat::Damage, 10.0);
        let add = Modifier::new("a", "add").add(NumericStat::Damage, 5.0);

        let forward = recompute(&base, &[set.clone(), add.clone()]);
        assert_eq!(forward.stats.damage, 15.0);

        let reversed = recompute(&base, &[add, set]);
        assert_eq!(reversed.stats.damage, 10.0, "later override wins");
    }

    #[test]
    fn test_add_mul_set_order_within_modifier() {
        let base = pistol(); // damage 15
        let m = Modifier::new("m", "mixed")
            .mul(NumericStat::Damage, 2.0)
            .add(NumericStat::Damage, 5.0);
        // add runs before mul regardless of declaration order
        assert_eq!(recompute(&base, &[m]).stats.damage, 40.0);
    }

    #[test]
    fn test_multipliers_apply_in_sequence() {
        let base = pistol(); // fire interval 400
        let a = Modifier::new("a", "a").add(NumericStat::FireInterval, 100.0);
        let b = Modifier::new("b", "b").mul(NumericStat::FireInterval, 0.5);
        assert_eq!(recompute(&base, &[a.clone(), b.clone()]).stats.fire_interval, 250.0);
        assert_eq!(recompute(&base, &[b, a]).stats.fire_interval, 300.0);
    }

    #[test]
    fn test_clamp_fire_interval() {
        let mut base = pistol();
        base.stats.fire_interval = 300.0;
        let coil = Modifier::new("c", "coil").add(NumericStat::FireInterval, -80.0);
        let twice = recompute(&base, &[coil.clone(), coil.clone()]);
        assert_eq!(twice.stats.fire_interval, 140.0);

        let many = vec![coil; 5];
        assert_eq!(recompute(&base, &many).stats.fire_interval, 60.0);
    }

    #[test]
    fn test_clamp_cannot_be_bypassed() {
        let base = pistol();
        let huge = Modifier::new("h", "huge")
            .set(NumericStat::Damage, 1.0e9)
            .mul(NumericStat::ProjectileCount, 100.0)
            .adjust(|stats| stats.spread = -45.0);
        let effective = recompute(&base, &[huge]);
        assert_eq!(effective.stats.damage, 999.0);
        assert_eq!(effective.stats.projectile_count, 20.0);
        assert_eq!(effective.stats.spread, 0.0);
    }

    #[test]
    fn test_custom_adjustment_runs_after_set() {
        let base = pistol();
        let m = Modifier::new("x", "double tap")
            .set(NumericStat::Damage, 20.0)
            .adjust(|stats| stats.damage *= 3.0);
        assert_eq!(recompute(&base, &[m]).stats.damage, 60.0);
    }

    #[test]
    fn test_nan_clamps_to_min() {
        assert_eq!(NumericStat::Range.clamp(f32::NAN), 100.0);
        assert_eq!(NumericStat::Range.clamp(f32::INFINITY), 2000.0);
    }

    #[test]
    fn test_piercing_core_sets_flag() {
        let base = pistol();
        let core = modifier_preset("PIERCING_CORE").unwrap();
        assert!(!base.stats.piercing);
        assert!(recompute(&base, &[core]).stats.piercing);
    }

    #[test]
    fn test_presets_unique_ids() {
        let presets = all_modifier_presets();
        assert_eq!(presets.len(), 5);
        for (i, a) in presets.iter().enumerate() {
            assert!(presets[i + 1..].iter().all(|b| b.id != a.id));
        }
        assert!(modifier_preset("NOPE").is_none());
    }
}
