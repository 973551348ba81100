//! Attack table - single-roll, probability-weighted outcome selection
//!
//! Every attack in the engine is resolved through [`OutcomeTable::select`]:
//! one uniform draw in `[0, 1)` walks the categories in [`HitOutcome::ORDER`]
//! and lands in exactly one of them. A normal hit takes whatever probability
//! the other categories leave over.

use crate::config::constants;
use crate::SimError;
use sim_types::HitOutcome;

const TOLERANCE: f64 = 1e-9;

/// Probabilities over the mutually exclusive outcome categories
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeTable {
    chances: [f64; 7],
}

impl OutcomeTable {
    /// Build a table from (category, probability) pairs
    ///
    /// Repeated categories add up. [`HitOutcome::Hit`] may not be given: it
    /// always receives the remainder. Negative or non-finite probabilities and
    /// non-hit categories summing above 1.0 are errors, never clamped.
    pub fn new(entries: &[(HitOutcome, f64)]) -> Result<Self, SimError> {
        let mut chances = [0.0; 7];
        for &(outcome, value) in entries {
            if outcome == HitOutcome::Hit {
                return Err(SimError::config(
                    "the normal hit chance is the remainder and cannot be set",
                ));
            }
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidProbability { outcome, value });
            }
            chances[outcome.index()] += value;
        }
        let total: f64 = chances.iter().sum();
        if total > 1.0 + TOLERANCE {
            return Err(SimError::DegenerateOutcomeTable { total });
        }
        chances[HitOutcome::Hit.index()] = (1.0 - total).max(0.0);
        Ok(OutcomeTable { chances })
    }

    pub fn chance(&self, outcome: HitOutcome) -> f64 {
        self.chances[outcome.index()]
    }

    /// Map a draw in `[0, 1)` to its category
    pub fn select(&self, draw: f64) -> HitOutcome {
        let mut cumulative = 0.0;
        for outcome in HitOutcome::ORDER {
            cumulative += self.chances[outcome.index()];
            if draw < cumulative {
                return outcome;
            }
        }
        HitOutcome::Hit
    }
}

/// Which attack table to build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Auto attack: can glance, suffers the dual-wield miss penalty
    MeleeWhite,
    /// Special attack resolved with one roll for hit and crit
    MeleeSpecialHitAndCrit,
}

/// Offensive inputs of the table, as fractions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackerProfile {
    pub level: u32,
    pub hit_chance: f64,
    pub crit_chance: f64,
    pub dual_wielding: bool,
}

/// Defensive inputs of the table, as fractions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefenderProfile {
    pub level: u32,
    pub dodge: f64,
    pub parry: f64,
    pub block: f64,
    /// Defense skill; points above the attacker's weapon skill make it miss
    /// more and crit less
    pub defense: f64,
}

/// Weapon skill of an attacker at `level`
pub fn weapon_skill(level: u32) -> f64 {
    level as f64 * 5.0
}

/// Build the melee attack table for an attacker/defender pair
///
/// Crit is truncated to the space the other categories leave; everything
/// else must fit on its own or the table is degenerate.
pub fn melee_table(
    kind: OutcomeKind,
    attacker: &AttackerProfile,
    defender: &DefenderProfile,
) -> Result<OutcomeTable, SimError> {
    let combat = &constants().combat;
    let level_diff = defender.level.saturating_sub(attacker.level) as f64;
    let defense_bonus =
        (defender.defense - weapon_skill(attacker.level)).max(0.0) * combat.defense_per_point;

    let mut miss = combat.base_miss_chance + combat.miss_per_level * level_diff;
    if kind == OutcomeKind::MeleeWhite && attacker.dual_wielding {
        miss += combat.dual_wield_miss_penalty;
    }
    let miss = (miss + defense_bonus - attacker.hit_chance).max(0.0);

    let glance = match kind {
        OutcomeKind::MeleeWhite => combat.glance_base_chance + combat.glance_per_level * level_diff,
        OutcomeKind::MeleeSpecialHitAndCrit => 0.0,
    };

    let mut entries = vec![
        (HitOutcome::Miss, miss),
        (HitOutcome::Dodge, defender.dodge),
        (HitOutcome::Parry, defender.parry),
        (HitOutcome::Block, defender.block),
        (HitOutcome::Glance, glance),
    ];
    let before_crit: f64 = entries.iter().map(|(_, chance)| chance).sum();
    if before_crit > 1.0 + TOLERANCE {
        return Err(SimError::DegenerateOutcomeTable { total: before_crit });
    }

    let crit = (attacker.crit_chance - combat.crit_suppression_per_level * level_diff - defense_bonus).max(0.0);
    entries.push((HitOutcome::Crit, crit.min((1.0 - before_crit).max(0.0))));
    OutcomeTable::new(&entries)
}

/// Damage multiplier of a critical strike with `bonus` extra crit damage
pub fn crit_multiplier(bonus: f64) -> f64 {
    let base = constants().combat.base_crit_multiplier;
    1.0 + (base - 1.0) * (1.0 + bonus)
}
