//! Consumed by Rage - enrage when rage climbs past 80

use sim_core::aura::{AuraConfig, AuraEffect, AuraId};
use sim_core::combat::{ProcAction, ProcEvent, ProcTrigger};
use sim_core::{Combatant, SimError};
use sim_types::{ActionId, ProcMask, PseudoStat};
use std::time::Duration;

pub const ENRAGE: ActionId = ActionId::spell(425415);

pub const RAGE_THRESHOLD: f64 = 80.0;
const DAMAGE_DEALT: f64 = 1.1;
const DURATION: Duration = Duration::from_secs(12);
const CHARGES: u32 = 12;

/// Register the Enrage aura and the rage hook that triggers it
pub(crate) fn register_consumed_by_rage(unit: &mut Combatant) -> Result<AuraId, SimError> {
    let aura = unit.register_aura(
        AuraConfig::new("Enrage")
            .with_action_id(ENRAGE)
            .with_duration(DURATION)
            .with_charges(CHARGES)
            .with_effect(AuraEffect::MultiplyPseudoStat(PseudoStat::DamageDealtMultiplier, DAMAGE_DEALT)),
    )?;
    unit.add_proc_trigger(ProcTrigger::new(
        "Enrage",
        ProcEvent::Landed,
        ProcMask::MELEE,
        ProcAction::ConsumeCharge(aura),
    ))?;
    unit.on_rage_change(move |sim, before, after| {
        if before <= RAGE_THRESHOLD && after > RAGE_THRESHOLD {
            sim.activate_aura(aura)?;
        }
        Ok(())
    });
    Ok(aura)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{Encounter, Simulation, Target};

    fn sim() -> (Simulation, AuraId) {
        let mut unit = Combatant::new("Warrior", 60);
        let enrage = register_consumed_by_rage(&mut unit).unwrap();
        let encounter = Encounter::new(vec![Target::new("Dummy", 60)]);
        let sim = Simulation::new(unit, encounter, Duration::from_secs(60), 1, 0).unwrap();
        (sim, enrage)
    }

    #[test]
    fn test_enrage_on_crossing_threshold() {
        let (mut sim, enrage) = sim();
        sim.gain_rage(80.0).unwrap();
        assert!(!sim.is_aura_active(enrage));
        sim.gain_rage(1.0).unwrap();
        assert!(sim.is_aura_active(enrage));
        assert!((sim.unit().pseudo().damage_dealt_multiplier - 1.1).abs() < 1e-12);
        assert_eq!(sim.unit().aura(enrage).unwrap().charges(), Some(12));
    }

    #[test]
    fn test_staying_above_threshold_does_not_retrigger() {
        let (mut sim, enrage) = sim();
        sim.gain_rage(90.0).unwrap();
        sim.expire_aura(enrage).unwrap();
        sim.gain_rage(5.0).unwrap();
        assert!(!sim.is_aura_active(enrage));
    }
}
