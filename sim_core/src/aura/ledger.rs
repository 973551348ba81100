//! Activation, expiration, stacks and charges of registered auras

use super::{Aura, AuraConfig, AuraId, RefreshPolicy};
use crate::sim::{EventKind, Simulation};
use crate::unit::Combatant;
use crate::SimError;
use std::sync::Arc;
use std::time::Duration;

impl Combatant {
    /// Register a dormant aura
    pub fn register_aura(&mut self, config: AuraConfig) -> Result<AuraId, SimError> {
        config.validate()?;
        let id = AuraId(self.auras.len());
        tracing::debug!(unit = %self.name, aura = %config.label, "registered aura");
        self.auras.push(Aura::new(config));
        Ok(id)
    }

    pub fn aura(&self, id: AuraId) -> Result<&Aura, SimError> {
        self.auras.get(id.0).ok_or(SimError::UnknownAura(id.0))
    }

    /// First aura registered under `label`
    pub fn aura_by_label(&self, label: &str) -> Option<AuraId> {
        self.auras
            .iter()
            .position(|aura| aura.label() == label)
            .map(AuraId)
    }

    pub fn auras(&self) -> impl Iterator<Item = (AuraId, &Aura)> {
        self.auras.iter().enumerate().map(|(i, aura)| (AuraId(i), aura))
    }
}

impl Simulation {
    /// Activate an aura, or apply its refresh policy if it is already active
    pub fn activate_aura(&mut self, id: AuraId) -> Result<(), SimError> {
        if self.finished {
            return Ok(());
        }
        let now = self.now;
        let aura = self
            .unit
            .auras
            .get_mut(id.0)
            .ok_or(SimError::UnknownAura(id.0))?;
        let config = Arc::clone(&aura.config);

        if aura.active {
            match config.refresh {
                RefreshPolicy::Ignore => return Ok(()),
                RefreshPolicy::Refresh => {}
                RefreshPolicy::Stack { max_stacks } => {
                    if aura.stacks < max_stacks {
                        for effect in &config.effects {
                            effect.apply(&mut self.unit.stats, &mut self.unit.pseudo);
                        }
                        aura.stacks += 1;
                    }
                }
            }
            aura.charges = config.max_charges;
            if let Some(duration) = config.duration {
                aura.generation += 1;
                aura.expires_at = Some(now + duration);
                self.queue.schedule(
                    now + duration,
                    EventKind::AuraExpire {
                        aura: id,
                        generation: aura.generation,
                    },
                );
            }
            tracing::trace!(aura = %config.label, stacks = aura.stacks, at = ?now, "aura refreshed");
            return Ok(());
        }

        for effect in &config.effects {
            effect.apply(&mut self.unit.stats, &mut self.unit.pseudo);
        }
        aura.active = true;
        aura.stacks = 1;
        aura.charges = config.max_charges;
        aura.activated_at = now;
        aura.activations += 1;
        aura.expires_at = config.duration.map(|duration| now + duration);
        if let Some(expires_at) = aura.expires_at {
            self.queue.schedule(
                expires_at,
                EventKind::AuraExpire {
                    aura: id,
                    generation: aura.generation,
                },
            );
        }
        tracing::trace!(aura = %config.label, at = ?now, "aura gained");

        if let Some(hook) = &config.on_gain {
            hook(self, id)?;
        }
        Ok(())
    }

    /// Expire an aura now, undoing every applied stack. No-op when inactive.
    pub fn expire_aura(&mut self, id: AuraId) -> Result<(), SimError> {
        let now = self.now;
        let aura = self
            .unit
            .auras
            .get_mut(id.0)
            .ok_or(SimError::UnknownAura(id.0))?;
        if !aura.active {
            return Ok(());
        }
        let config = Arc::clone(&aura.config);

        for _ in 0..aura.stacks {
            for effect in config.effects.iter().rev() {
                effect.revert(&mut self.unit.stats, &mut self.unit.pseudo);
            }
        }
        aura.active = false;
        aura.stacks = 0;
        aura.charges = None;
        aura.expires_at = None;
        aura.generation += 1;
        aura.uptime += now.saturating_sub(aura.activated_at);
        tracing::trace!(aura = %config.label, at = ?now, "aura expired");

        if let Some(hook) = &config.on_expire {
            hook(self, id)?;
        }
        Ok(())
    }

    /// Remove a single stack, expiring the aura when it was the last one
    pub fn remove_aura_stack(&mut self, id: AuraId) -> Result<(), SimError> {
        let aura = self
            .unit
            .auras
            .get_mut(id.0)
            .ok_or(SimError::UnknownAura(id.0))?;
        if !aura.active {
            return Ok(());
        }
        if aura.stacks <= 1 {
            return self.expire_aura(id);
        }
        let config = Arc::clone(&aura.config);
        for effect in config.effects.iter().rev() {
            effect.revert(&mut self.unit.stats, &mut self.unit.pseudo);
        }
        aura.stacks -= 1;
        Ok(())
    }

    /// Use up one charge, expiring the aura when none are left.
    /// Auras without charges are unaffected.
    pub fn consume_aura_charge(&mut self, id: AuraId) -> Result<(), SimError> {
        let aura = self
            .unit
            .auras
            .get_mut(id.0)
            .ok_or(SimError::UnknownAura(id.0))?;
        if !aura.active {
            return Ok(());
        }
        let charges = aura.charges;
        match charges {
            Some(charges) if charges > 1 => {
                aura.charges = Some(charges - 1);
                Ok(())
            }
            Some(_) => self.expire_aura(id),
            None => Ok(()),
        }
    }

    pub(crate) fn handle_aura_expire(&mut self, id: AuraId, generation: u64) -> Result<(), SimError> {
        let aura = self.unit.aura(id)?;
        if aura.active && aura.generation == generation {
            self.expire_aura(id)?;
        }
        Ok(())
    }

    pub fn is_aura_active(&self, id: AuraId) -> bool {
        self.unit.aura(id).map(Aura::is_active).unwrap_or(false)
    }

    /// Time left on an active timed aura
    pub fn aura_remaining(&self, id: AuraId) -> Option<Duration> {
        let aura = self.unit.aura(id).ok()?;
        if !aura.active {
            return None;
        }
        aura.expires_at.map(|at| at.saturating_sub(self.now))
    }

    /// Expire every active aura so each activation is paired with one expiration
    pub(crate) fn expire_all_auras(&mut self) -> Result<(), SimError> {
        for index in 0..self.unit.auras.len() {
            self.expire_aura(AuraId(index))?;
        }
        Ok(())
    }
}
