//! Flurry - faster auto attacks for three swings after a melee crit

use sim_core::aura::{AuraConfig, AuraEffect, AuraId};
use sim_core::combat::{ProcAction, ProcEvent, ProcTrigger};
use sim_core::{Combatant, SimError};
use sim_types::{ActionId, ProcMask, PseudoStat};
use std::time::Duration;

pub const FLURRY: ActionId = ActionId::spell(12974);

const DURATION: Duration = Duration::from_secs(15);
const CHARGES: u32 = 3;

pub fn flurry_speed(rank: u32) -> f64 {
    1.05 + 0.05 * rank as f64
}

/// Register the Flurry aura and its triggers; nothing without talent points
pub(crate) fn register_flurry(unit: &mut Combatant, rank: u32) -> Result<Option<AuraId>, SimError> {
    if rank == 0 {
        return Ok(None);
    }
    let aura = unit.register_aura(
        AuraConfig::new("Flurry")
            .with_action_id(FLURRY)
            .with_duration(DURATION)
            .with_charges(CHARGES)
            .with_effect(AuraEffect::MultiplyPseudoStat(PseudoStat::MeleeSpeedMultiplier, flurry_speed(rank))),
    )?;
    unit.add_proc_trigger(ProcTrigger::new(
        "Flurry",
        ProcEvent::Crit,
        ProcMask::MELEE,
        ProcAction::ActivateAura(aura),
    ))?;
    unit.add_proc_trigger(ProcTrigger::new(
        "Flurry (swing)",
        ProcEvent::Swing,
        ProcMask::MELEE_AUTO,
        ProcAction::ConsumeCharge(aura),
    ))?;
    Ok(Some(aura))
}
