//! Whirlwind - a normalized weapon strike against every target

use crate::talents::{WarriorRunes, WarriorTalents};
use sim_core::aura::AuraId;
use sim_core::combat::OutcomeKind;
use sim_core::spell::{SpellConfig, SpellId};
use sim_core::{Combatant, SimError, Simulation, TargetId};
use sim_types::{ActionId, ProcMask, SpellFlags, StanceMask};
use std::time::Duration;

pub const WHIRLWIND: ActionId = ActionId::spell(1680);
pub const WHIRLWIND_MH: ActionId = WHIRLWIND.with_tag(1);
pub const WHIRLWIND_OH: ActionId = WHIRLWIND.with_tag(2);

pub const MIN_LEVEL: u32 = 36;
const RAGE_COST: f64 = 25.0;
const COOLDOWN: Duration = Duration::from_secs(10);
const THREAT_MULTIPLIER: f64 = 1.25;

#[derive(Debug, Clone, Copy)]
pub struct Whirlwind {
    pub spell: SpellId,
    pub main_hand: SpellId,
    /// Present with Consumed by Rage while dual wielding
    pub off_hand: Option<SpellId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hand {
    Main,
    Off,
}

fn register_hit(unit: &mut Combatant, hand: Hand, talents: &WarriorTalents) -> Result<SpellId, SimError> {
    let (label, action_id, proc_mask) = match hand {
        Hand::Main => ("Whirlwind", WHIRLWIND_MH, ProcMask::MELEE_MH_SPECIAL),
        Hand::Off => ("Whirlwind (Off Hand)", WHIRLWIND_OH, ProcMask::MELEE_OH_SPECIAL),
    };
    unit.register_spell(
        SpellConfig::new(label, action_id, move |sim, spell, target| {
            let attack_power = sim.spell_attack_power(spell)?;
            let base = match hand {
                Hand::Main => sim.mh_normalized_weapon_damage(attack_power),
                Hand::Off => sim.oh_normalized_weapon_damage(attack_power),
            };
            sim.calc_and_deal_damage(spell, target, base, OutcomeKind::MeleeSpecialHitAndCrit)?;
            Ok(())
        })
        .with_flags(SpellFlags::PASSIVE)
        .with_proc_mask(proc_mask)
        .with_threat_multiplier(THREAT_MULTIPLIER)
        .with_bonus_coefficient(1.0)
        .with_crit_damage_bonus(talents.impale_bonus()),
    )
}

/// Register Whirlwind; below level 36 it is simply absent
pub(crate) fn register_whirlwind(
    unit: &mut Combatant,
    talents: &WarriorTalents,
    runes: &WarriorRunes,
    enrage: Option<AuraId>,
) -> Result<Option<Whirlwind>, SimError> {
    if unit.level() < MIN_LEVEL {
        return Ok(None);
    }

    let main_hand = register_hit(unit, Hand::Main, talents)?;
    let off_hand = if runes.consumed_by_rage && unit.is_dual_wielding() {
        Some(register_hit(unit, Hand::Off, talents)?)
    } else {
        None
    };

    let spell = unit.register_spell(
        SpellConfig::new("Whirlwind", WHIRLWIND, move |sim, _, _| {
            strike_all(sim, main_hand, off_hand, enrage)
        })
        .with_flags(SpellFlags::APL | SpellFlags::OFFENSIVE | SpellFlags::AOE)
        .with_proc_mask(ProcMask::MELEE_MH_SPECIAL)
        .with_stances(StanceMask::BERSERKER)
        .with_rage_cost(RAGE_COST)
        .with_default_gcd()
        .with_cooldown(COOLDOWN)
        .ignoring_haste(),
    )?;

    Ok(Some(Whirlwind {
        spell,
        main_hand,
        off_hand,
    }))
}

fn strike_all(
    sim: &mut Simulation,
    main_hand: SpellId,
    off_hand: Option<SpellId>,
    enrage: Option<AuraId>,
) -> Result<(), SimError> {
    let targets: Vec<TargetId> = sim.encounter().target_ids().collect();
    for target in targets {
        sim.cast_passive(main_hand, target)?;
        if let Some(off_hand) = off_hand {
            if enrage.is_some_and(|aura| sim.is_aura_active(aura)) {
                sim.cast_passive(off_hand, target)?;
            }
        }
    }
    Ok(())
}
