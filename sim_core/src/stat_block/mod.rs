//! StatBlock and PseudoStats - a combatant's derived statistics
//!
//! Both blocks are plain values owned by the combatant. Every mutation bumps
//! a version counter so callers can tell whether anything changed between two
//! observations. Auras only ever touch them through [`StatBlock::add`],
//! [`StatBlock::multiply`] and the pseudo stat equivalents, and undo their
//! change with the exact inverse operation.

use serde::Serialize;
use sim_types::{PseudoStat, Stat};

/// Dense stat sheet keyed by [`Stat`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatBlock {
    values: [f64; Stat::COUNT],
    version: u64,
}

impl Default for StatBlock {
    fn default() -> Self {
        StatBlock {
            values: [0.0; Stat::COUNT],
            version: 0,
        }
    }
}

impl StatBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stat: Stat) -> f64 {
        self.values[stat.index()]
    }

    pub fn add(&mut self, stat: Stat, amount: f64) {
        self.values[stat.index()] += amount;
        self.version += 1;
    }

    pub fn multiply(&mut self, stat: Stat, factor: f64) {
        self.values[stat.index()] *= factor;
        self.version += 1;
    }

    pub fn divide(&mut self, stat: Stat, factor: f64) {
        self.values[stat.index()] /= factor;
        self.version += 1;
    }

    pub fn set(&mut self, stat: Stat, value: f64) {
        self.values[stat.index()] = value;
        self.version += 1;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether every stat matches `other` within `tolerance` (versions ignored)
    pub fn approx_eq(&self, other: &StatBlock, tolerance: f64) -> bool {
        self.values
            .iter()
            .zip(other.values.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

/// Named multipliers and capability flags outside the stat sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PseudoStats {
    pub damage_dealt_multiplier: f64,
    pub damage_taken_multiplier: f64,
    pub threat_multiplier: f64,
    pub melee_speed_multiplier: f64,
    pub cast_speed_multiplier: f64,
    /// Has a shield equipped
    pub can_block: bool,
    pub can_parry: bool,
    version: u64,
}

impl Default for PseudoStats {
    fn default() -> Self {
        PseudoStats {
            damage_dealt_multiplier: 1.0,
            damage_taken_multiplier: 1.0,
            threat_multiplier: 1.0,
            melee_speed_multiplier: 1.0,
            cast_speed_multiplier: 1.0,
            can_block: false,
            can_parry: true,
            version: 0,
        }
    }
}

impl PseudoStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stat: PseudoStat) -> f64 {
        match stat {
            PseudoStat::DamageDealtMultiplier => self.damage_dealt_multiplier,
            PseudoStat::DamageTakenMultiplier => self.damage_taken_multiplier,
            PseudoStat::ThreatMultiplier => self.threat_multiplier,
            PseudoStat::MeleeSpeedMultiplier => self.melee_speed_multiplier,
            PseudoStat::CastSpeedMultiplier => self.cast_speed_multiplier,
        }
    }

    fn slot(&mut self, stat: PseudoStat) -> &mut f64 {
        match stat {
            PseudoStat::DamageDealtMultiplier => &mut self.damage_dealt_multiplier,
            PseudoStat::DamageTakenMultiplier => &mut self.damage_taken_multiplier,
            PseudoStat::ThreatMultiplier => &mut self.threat_multiplier,
            PseudoStat::MeleeSpeedMultiplier => &mut self.melee_speed_multiplier,
            PseudoStat::CastSpeedMultiplier => &mut self.cast_speed_multiplier,
        }
    }

    pub fn add(&mut self, stat: PseudoStat, amount: f64) {
        *self.slot(stat) += amount;
        self.version += 1;
    }

    pub fn multiply(&mut self, stat: PseudoStat, factor: f64) {
        *self.slot(stat) *= factor;
        self.version += 1;
    }

    pub fn divide(&mut self, stat: PseudoStat, factor: f64) {
        *self.slot(stat) /= factor;
        self.version += 1;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether every multiplier and flag matches `other` (versions ignored)
    pub fn approx_eq(&self, other: &PseudoStats, tolerance: f64) -> bool {
        [
            PseudoStat::DamageDealtMultiplier,
            PseudoStat::DamageTakenMultiplier,
            PseudoStat::ThreatMultiplier,
            PseudoStat::MeleeSpeedMultiplier,
            PseudoStat::CastSpeedMultiplier,
        ]
        .iter()
        .all(|stat| (self.get(*stat) - other.get(*stat)).abs() <= tolerance)
            && self.can_block == other.can_block
            && self.can_parry == other.can_parry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_block_mutation_bumps_version() {
        let mut block = StatBlock::new();
        assert_eq!(block.version(), 0);
        block.add(Stat::Strength, 10.0);
        block.multiply(Stat::Strength, 1.1);
        assert_eq!(block.version(), 2);
        assert!((block.get(Stat::Strength) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_multiply_then_divide_restores_value() {
        let original = {
            let mut block = StatBlock::new();
            block.set(Stat::AttackPower, 1234.5);
            block
        };
        let mut block = original.clone();
        block.multiply(Stat::AttackPower, 1.1);
        block.multiply(Stat::AttackPower, 0.25);
        block.divide(Stat::AttackPower, 1.1);
        block.divide(Stat::AttackPower, 0.25);
        assert!(block.approx_eq(&original, 1e-9));
        assert_ne!(block.version(), original.version());
    }

    #[test]
    fn test_pseudo_stats_defaults() {
        let pseudo = PseudoStats::new();
        assert!((pseudo.get(PseudoStat::DamageTakenMultiplier) - 1.0).abs() < f64::EPSILON);
        assert!(!pseudo.can_block);
        assert!(pseudo.can_parry);
    }

    #[test]
    fn test_pseudo_stats_compose_multiplicatively() {
        let mut pseudo = PseudoStats::new();
        pseudo.multiply(PseudoStat::DamageTakenMultiplier, 0.25);
        pseudo.multiply(PseudoStat::DamageTakenMultiplier, 1.1);
        assert!((pseudo.damage_taken_multiplier - 0.275).abs() < 1e-12);
        pseudo.divide(PseudoStat::DamageTakenMultiplier, 0.25);
        assert!((pseudo.damage_taken_multiplier - 1.1).abs() < 1e-12);
    }
}
