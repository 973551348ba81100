//! Shield Wall - defensive cooldown, 75% less damage taken

use crate::talents::WarriorTalents;
use sim_core::aura::{AuraConfig, AuraEffect, AuraId};
use sim_core::spell::{SpellConfig, SpellId};
use sim_core::{Combatant, SimError};
use sim_types::{ActionId, CooldownType, PseudoStat, SpellFlags, StanceMask};
use std::time::Duration;

pub const SHIELD_WALL: ActionId = ActionId::spell(871);

/// Damage taken multiplier while active
const DAMAGE_TAKEN: f64 = 0.25;
const COOLDOWN: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy)]
pub struct ShieldWall {
    pub spell: SpellId,
    pub aura: AuraId,
}

/// 10s, plus 3s/5s with Improved Shield Wall
pub fn shield_wall_duration(improved_shield_wall: u32) -> Duration {
    let bonus = [0, 3, 5][improved_shield_wall.min(2) as usize];
    Duration::from_secs(10 + bonus)
}

pub(crate) fn register_shield_wall(
    unit: &mut Combatant,
    talents: &WarriorTalents,
) -> Result<ShieldWall, SimError> {
    let aura = unit.register_aura(
        AuraConfig::new("Shield Wall")
            .with_action_id(SHIELD_WALL)
            .with_duration(shield_wall_duration(talents.improved_shield_wall))
            .with_effect(AuraEffect::MultiplyPseudoStat(PseudoStat::DamageTakenMultiplier, DAMAGE_TAKEN)),
    )?;

    let spell = unit.register_spell(
        SpellConfig::new("Shield Wall", SHIELD_WALL, move |sim, _, _| sim.activate_aura(aura))
            .with_flags(SpellFlags::APL | SpellFlags::DEFENSIVE)
            .with_stances(StanceMask::DEFENSIVE)
            .with_cooldown(COOLDOWN)
            .ignoring_haste()
            .with_cast_condition(|sim, _| sim.unit().pseudo().can_block),
    )?;
    unit.add_major_cooldown(spell, CooldownType::Survival)?;
    Ok(ShieldWall { spell, aura })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_by_rank() {
        assert_eq!(shield_wall_duration(0), Duration::from_secs(10));
        assert_eq!(shield_wall_duration(1), Duration::from_secs(13));
        assert_eq!(shield_wall_duration(2), Duration::from_secs(15));
    }

    #[test]
    fn test_registered_as_survival_cooldown() {
        let mut unit = Combatant::new("Warrior", 60);
        let shield_wall = register_shield_wall(&mut unit, &WarriorTalents::default()).unwrap();
        let survival: Vec<_> = unit.major_cooldowns().of_type(CooldownType::Survival).collect();
        assert_eq!(survival.len(), 1);
        assert_eq!(survival[0].spell, shield_wall.spell);

        let spell = unit.spell(shield_wall.spell).unwrap();
        assert!(spell.gcd.is_zero());
        assert_eq!(spell.cooldown.unwrap().duration, COOLDOWN);
        assert_eq!(spell.stances, StanceMask::DEFENSIVE);
    }
}
