//! Battle, Defensive and Berserker stances
//!
//! Each stance is a permanent aura. Swapping expires the old stance aura,
//! drops rage above what Tactical Mastery keeps, and activates the new one.
//! All three swaps share one 1s cooldown.

use crate::talents::WarriorTalents;
use sim_core::aura::{AuraConfig, AuraEffect, AuraId, RefreshPolicy};
use sim_core::spell::{SpellConfig, SpellId};
use sim_core::{Combatant, SimError, Simulation};
use sim_types::{ActionId, PseudoStat, SpellFlags, Stance, Stat};
use std::time::Duration;

pub const BATTLE_STANCE: ActionId = ActionId::spell(2457);
pub const DEFENSIVE_STANCE: ActionId = ActionId::spell(71);
pub const BERSERKER_STANCE: ActionId = ActionId::spell(2458);

const STANCE_COOLDOWN: Duration = Duration::from_secs(1);

const STANCES: [(Stance, ActionId); 3] = [
    (Stance::Battle, BATTLE_STANCE),
    (Stance::Defensive, DEFENSIVE_STANCE),
    (Stance::Berserker, BERSERKER_STANCE),
];

fn stance_effects(stance: Stance) -> Vec<AuraEffect> {
    match stance {
        Stance::Battle => vec![AuraEffect::MultiplyPseudoStat(PseudoStat::ThreatMultiplier, 0.8)],
        Stance::Defensive => vec![
            AuraEffect::MultiplyPseudoStat(PseudoStat::ThreatMultiplier, 1.3),
            AuraEffect::MultiplyPseudoStat(PseudoStat::DamageDealtMultiplier, 0.9),
        ],
        Stance::Berserker => vec![
            AuraEffect::AddStat(Stat::MeleeCrit, 3.0),
            AuraEffect::MultiplyPseudoStat(PseudoStat::ThreatMultiplier, 0.8),
            AuraEffect::MultiplyPseudoStat(PseudoStat::DamageTakenMultiplier, 1.1),
        ],
        Stance::None => Vec::new(),
    }
}

/// Stance swap spells and the stance auras they toggle
#[derive(Debug, Clone, Copy)]
pub struct StanceSpells {
    spells: [(Stance, SpellId); 3],
    auras: [(Stance, AuraId); 3],
}

impl StanceSpells {
    pub fn spell(&self, stance: Stance) -> Option<SpellId> {
        self.spells.iter().find(|(s, _)| *s == stance).map(|(_, id)| *id)
    }

    pub fn aura(&self, stance: Stance) -> Option<AuraId> {
        self.auras.iter().find(|(s, _)| *s == stance).map(|(_, id)| *id)
    }
}

pub(crate) fn register_stances(
    unit: &mut Combatant,
    talents: &WarriorTalents,
) -> Result<StanceSpells, SimError> {
    let mut auras = Vec::with_capacity(STANCES.len());
    for (stance, action_id) in STANCES {
        let config = stance_effects(stance).into_iter().fold(
            AuraConfig::new(&stance.to_string())
                .with_action_id(action_id)
                .with_refresh(RefreshPolicy::Ignore),
            AuraConfig::with_effect,
        );
        auras.push((stance, unit.register_aura(config)?));
    }
    let auras: [(Stance, AuraId); 3] = [auras[0], auras[1], auras[2]];

    let cooldown = unit.new_timer(true);
    let rage_kept = talents.rage_kept_on_stance_swap();
    let mut spells = Vec::with_capacity(STANCES.len());
    for (stance, action_id) in STANCES {
        let spell = unit.register_spell(
            SpellConfig::new(&stance.to_string(), action_id, move |sim, _, _| {
                swap_stance(sim, stance, &auras, rage_kept)
            })
            .with_flags(SpellFlags::APL)
            .with_stances(sim_types::StanceMask::ANY.difference(stance.mask()))
            .with_shared_cooldown(cooldown, STANCE_COOLDOWN),
        )?;
        spells.push((stance, spell));
    }

    let battle = auras[0].1;
    unit.on_trial_start(move |sim| {
        sim.set_stance(Stance::Battle);
        sim.activate_aura(battle)
    });

    Ok(StanceSpells {
        spells: [spells[0], spells[1], spells[2]],
        auras,
    })
}

fn swap_stance(
    sim: &mut Simulation,
    to: Stance,
    auras: &[(Stance, AuraId); 3],
    rage_kept: f64,
) -> Result<(), SimError> {
    for (stance, aura) in auras {
        if *stance != to {
            sim.expire_aura(*aura)?;
        }
    }
    let lost = sim.truncate_rage(rage_kept);
    tracing::trace!(to = %to, lost, at = ?sim.now(), "stance swap");
    sim.set_stance(to);
    match auras.iter().find(|(stance, _)| *stance == to) {
        Some((_, aura)) => sim.activate_aura(*aura),
        None => Ok(()),
    }
}
