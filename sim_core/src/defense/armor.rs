//! Armor mitigation for physical damage

use crate::config::constants;

/// Fraction of physical damage removed by `armor` against an attacker of `attacker_level`
///
/// Formula: armor / (armor + base + per_level * level), capped at `max_reduction`.
pub fn armor_reduction(armor: f64, attacker_level: u32) -> f64 {
    if armor <= 0.0 {
        return 0.0;
    }
    let armor_constants = &constants().armor;
    let divisor = armor + armor_constants.base + armor_constants.per_level * attacker_level as f64;
    (armor / divisor).min(armor_constants.max_reduction)
}

/// Physical damage remaining after armor
pub fn calculate_armor_mitigation(armor: f64, attacker_level: u32, damage: f64) -> f64 {
    damage * (1.0 - armor_reduction(armor, attacker_level))
}
