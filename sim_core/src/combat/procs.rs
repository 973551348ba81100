//! Proc triggers - auras driven by swings, hits and crits

use crate::aura::AuraId;
use crate::sim::Simulation;
use crate::unit::Combatant;
use crate::SimError;
use sim_types::ProcMask;

/// What happened to an attack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcEvent {
    /// An auto attack swing started, before its outcome is rolled
    Swing,
    /// The attack connected
    Landed,
    /// The attack was a critical strike
    Crit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcAction {
    ActivateAura(AuraId),
    ConsumeCharge(AuraId),
}

impl ProcAction {
    fn aura(self) -> AuraId {
        match self {
            ProcAction::ActivateAura(aura) | ProcAction::ConsumeCharge(aura) => aura,
        }
    }
}

/// Run `action` whenever `event` happens on an attack matching `mask`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcTrigger {
    pub label: String,
    pub event: ProcEvent,
    pub mask: ProcMask,
    pub action: ProcAction,
}

impl ProcTrigger {
    pub fn new(label: &str, event: ProcEvent, mask: ProcMask, action: ProcAction) -> Self {
        ProcTrigger {
            label: label.to_string(),
            event,
            mask,
            action,
        }
    }
}

impl Combatant {
    pub fn add_proc_trigger(&mut self, trigger: ProcTrigger) -> Result<(), SimError> {
        if trigger.mask.is_empty() {
            return Err(SimError::config(format!(
                "proc trigger '{}' has an empty mask",
                trigger.label
            )));
        }
        self.aura(trigger.action.aura())?;
        self.proc_triggers.push(trigger);
        Ok(())
    }
}

impl Simulation {
    /// Run every trigger listening for `event` on an attack with `mask`
    pub(crate) fn fire_procs(&mut self, event: ProcEvent, mask: ProcMask) -> Result<(), SimError> {
        for index in 0..self.unit.proc_triggers.len() {
            let trigger = &self.unit.proc_triggers[index];
            let action = trigger.action;
            if trigger.event != event || !trigger.mask.intersects(mask) {
                continue;
            }
            match action {
                ProcAction::ActivateAura(aura) => self.activate_aura(aura)?,
                ProcAction::ConsumeCharge(aura) => self.consume_aura_charge(aura)?,
            }
        }
        Ok(())
    }
}
