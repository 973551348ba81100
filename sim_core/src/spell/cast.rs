//! Cast pipeline: legality, cost, GCD and cooldown, effects, metrics

use super::{Spell, SpellId};
use crate::config::constants;
use crate::sim::{EventKind, Simulation};
use crate::unit::TargetId;
use crate::SimError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Why a cast was declined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastDecline {
    /// Passive spells only run from inside other effects
    Passive,
    WrongStance,
    OnGcd,
    OnCooldown,
    NotEnoughRage,
    ConditionFailed,
}

impl fmt::Display for CastDecline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CastDecline::Passive => write!(f, "passive"),
            CastDecline::WrongStance => write!(f, "wrong stance"),
            CastDecline::OnGcd => write!(f, "on global cooldown"),
            CastDecline::OnCooldown => write!(f, "on cooldown"),
            CastDecline::NotEnoughRage => write!(f, "not enough rage"),
            CastDecline::ConditionFailed => write!(f, "cast condition failed"),
        }
    }
}

impl Simulation {
    /// Check legality without side effects
    ///
    /// Returns `Ok(None)` when the spell could be cast right now.
    pub fn cast_decline(
        &self,
        spell: SpellId,
        target: TargetId,
    ) -> Result<Option<CastDecline>, SimError> {
        let spell = self.unit.spell(spell)?;
        if self.encounter.target(target).is_none() {
            return Err(SimError::UnknownTarget(target.0));
        }
        Ok(self.legality(spell, target))
    }

    fn legality(&self, spell: &Spell, target: TargetId) -> Option<CastDecline> {
        if spell.is_passive() {
            return Some(CastDecline::Passive);
        }
        if !spell.stances.allows(self.unit.stance) {
            return Some(CastDecline::WrongStance);
        }
        if !spell.gcd.is_zero() && !self.unit.gcd.is_ready(self.now) {
            return Some(CastDecline::OnGcd);
        }
        if let Some(cooldown) = &spell.cooldown {
            let ready = self
                .unit
                .timers
                .get(cooldown.timer.0)
                .map(|timer| timer.is_ready(self.now))
                .unwrap_or(false);
            if !ready {
                return Some(CastDecline::OnCooldown);
            }
        }
        if !self.unit.rage.can_afford(spell.rage_cost) {
            return Some(CastDecline::NotEnoughRage);
        }
        if let Some(condition) = &spell.extra_cast_condition {
            if !condition(self, target) {
                return Some(CastDecline::ConditionFailed);
            }
        }
        None
    }

    /// Whether `try_cast` would succeed right now
    pub fn can_cast(&self, spell: SpellId, target: TargetId) -> bool {
        matches!(self.cast_decline(spell, target), Ok(None))
    }

    /// Cast a spell at `target`
    ///
    /// Returns `Ok(false)` without touching any state when the cast is not
    /// legal. Errors only come from unknown handles or from the spell's
    /// effects.
    pub fn try_cast(&mut self, spell_id: SpellId, target: TargetId) -> Result<bool, SimError> {
        let spell = Arc::clone(self.unit.spell(spell_id)?);
        if let Some(decline) = self.cast_decline(spell_id, target)? {
            tracing::trace!(spell = %spell.label, reason = %decline, at = ?self.now, "cast declined");
            return Ok(false);
        }

        if spell.rage_cost > 0.0 {
            let spent = self.unit.rage.spend(spell.rage_cost);
            debug_assert!(spent, "cast_decline let through an unaffordable {}", spell.label);
        }

        let now = self.now;
        if !spell.gcd.is_zero() {
            let haste = if spell.ignore_haste {
                1.0
            } else {
                self.unit.pseudo.cast_speed_multiplier
            };
            let floor = now + constants().gcd.min_gcd().min(spell.gcd);
            let mut ready = self.unit.gcd.start(now, spell.gcd, haste);
            if ready < floor {
                ready = self.unit.gcd.start(now, floor - now, 1.0);
            }
            self.queue.schedule(ready, EventKind::TimerReady);
        }
        if let Some(cooldown) = spell.cooldown {
            let timer = self
                .unit
                .timers
                .get_mut(cooldown.timer.0)
                .ok_or(SimError::UnknownTimer(cooldown.timer.0))?;
            let ready = timer.start(now, cooldown.duration, 1.0);
            self.queue.schedule(ready, EventKind::TimerReady);
        }

        tracing::trace!(spell = %spell.label, target = %target, at = ?now, "cast");
        (spell.apply_effects)(self, spell_id, target)?;

        if spell.counts_toward_metrics() {
            self.metrics.record_cast(spell.action_id, spell.rage_cost);
        }
        self.metrics.rage_spent += spell.rage_cost;
        Ok(true)
    }

    /// Run a passive spell's effects from inside another spell's effects
    ///
    /// Skips legality and costs; the parent cast already paid for it.
    pub fn cast_passive(&mut self, spell_id: SpellId, target: TargetId) -> Result<(), SimError> {
        let spell = Arc::clone(self.unit.spell(spell_id)?);
        if !spell.is_passive() {
            return Err(SimError::config(format!(
                "spell '{}' is not passive and must go through try_cast",
                spell.label
            )));
        }
        if self.encounter.target(target).is_none() {
            return Err(SimError::UnknownTarget(target.0));
        }
        (spell.apply_effects)(self, spell_id, target)?;
        if spell.counts_toward_metrics() {
            self.metrics.record_cast(spell.action_id, 0.0);
        }
        Ok(())
    }

    /// Time until a spell's cooldown is ready (zero without a cooldown)
    pub fn cooldown_remaining(&self, spell_id: SpellId) -> Result<Duration, SimError> {
        let spell = self.unit.spell(spell_id)?;
        match &spell.cooldown {
            Some(cooldown) => Ok(self.unit.timer(cooldown.timer)?.time_to_ready(self.now)),
            None => Ok(Duration::ZERO),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::rotation::IdleRotation;
    use crate::sim::Simulation;
    use crate::spell::{CastDecline, SpellConfig, SpellId};
    use crate::unit::{Combatant, Encounter, Target, TargetId};
    use crate::SimError;
    use sim_types::{ActionId, SpellFlags, Stance, StanceMask};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn sim_with(unit: Combatant) -> Simulation {
        let encounter = Encounter::new(vec![Target::new("Dummy", 60)]);
        Simulation::new(unit, encounter, Duration::from_secs(120), 7, 0).unwrap()
    }

    fn noop(_: &mut Simulation, _: SpellId, _: TargetId) -> Result<(), SimError> {
        Ok(())
    }

    #[test]
    fn test_cooldown_blocks_second_cast() {
        let mut unit = Combatant::new("Tester", 60);
        let spell = unit
            .register_spell(
                SpellConfig::new("Big Cooldown", ActionId::spell(1), noop)
                    .with_cooldown(Duration::from_secs(30)),
            )
            .unwrap();
        let mut sim = sim_with(unit);

        assert!(sim.try_cast(spell, TargetId(0)).unwrap());
        assert_eq!(
            sim.cast_decline(spell, TargetId(0)).unwrap(),
            Some(CastDecline::OnCooldown)
        );
        sim.run_until(Duration::from_millis(29_999), &mut IdleRotation).unwrap();
        assert!(!sim.try_cast(spell, TargetId(0)).unwrap());
        sim.run_until(Duration::from_secs(30), &mut IdleRotation).unwrap();
        assert!(sim.try_cast(spell, TargetId(0)).unwrap());
    }

    #[test]
    fn test_gcd_shared_and_opt_out() {
        let mut unit = Combatant::new("Tester", 60);
        let a = unit
            .register_spell(SpellConfig::new("A", ActionId::spell(1), noop).with_default_gcd())
            .unwrap();
        let b = unit
            .register_spell(SpellConfig::new("B", ActionId::spell(2), noop).with_default_gcd())
            .unwrap();
        let off_gcd = unit
            .register_spell(SpellConfig::new("C", ActionId::spell(3), noop))
            .unwrap();
        let mut sim = sim_with(unit);

        assert!(sim.try_cast(a, TargetId(0)).unwrap());
        assert_eq!(sim.cast_decline(b, TargetId(0)).unwrap(), Some(CastDecline::OnGcd));
        assert!(sim.can_cast(off_gcd, TargetId(0)));
        sim.run_until(Duration::from_millis(1500), &mut IdleRotation).unwrap();
        assert!(sim.can_cast(b, TargetId(0)));
    }

    #[test]
    fn test_illegal_cast_is_atomic() {
        static APPLIED: AtomicU32 = AtomicU32::new(0);

        let mut unit = Combatant::new("Tester", 60);
        let spell = unit
            .register_spell(
                SpellConfig::new("Costly", ActionId::spell(1), |_, _, _| {
                    APPLIED.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .with_rage_cost(30.0)
                .with_default_gcd()
                .with_cooldown(Duration::from_secs(10))
                .with_stances(StanceMask::BERSERKER),
            )
            .unwrap();
        let mut sim = sim_with(unit);
        sim.gain_rage(20.0).unwrap();
        sim.set_stance(Stance::Berserker);

        let rage_before = sim.unit().rage().current();
        let gcd_before = sim.unit().gcd().clone();
        assert!(!sim.try_cast(spell, TargetId(0)).unwrap());
        assert_eq!(sim.unit().rage().current(), rage_before);
        assert_eq!(sim.unit().gcd(), &gcd_before);
        assert_eq!(sim.cooldown_remaining(spell).unwrap(), Duration::ZERO);
        assert_eq!(APPLIED.load(Ordering::SeqCst), 0);

        sim.gain_rage(20.0).unwrap();
        sim.set_stance(Stance::Battle);
        assert_eq!(
            sim.cast_decline(spell, TargetId(0)).unwrap(),
            Some(CastDecline::WrongStance)
        );
        sim.set_stance(Stance::Berserker);
        assert!(sim.try_cast(spell, TargetId(0)).unwrap());
        assert!((sim.unit().rage().current() - 10.0).abs() < 1e-9);
        assert_eq!(APPLIED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cast_condition() {
        let mut unit = Combatant::new("Tester", 60);
        let spell = unit
            .register_spell(
                SpellConfig::new("Needs Shield", ActionId::spell(1), noop)
                    .with_cast_condition(|sim, _| sim.unit().pseudo().can_block),
            )
            .unwrap();
        let mut sim = sim_with(unit);
        assert_eq!(
            sim.cast_decline(spell, TargetId(0)).unwrap(),
            Some(CastDecline::ConditionFailed)
        );
        assert!(!sim.try_cast(spell, TargetId(0)).unwrap());
    }

    #[test]
    fn test_passive_spells_run_from_parent() {
        let mut unit = Combatant::new("Tester", 60);
        let hit = unit
            .register_spell(
                SpellConfig::new("Hit", ActionId::spell(1).with_tag(1), noop)
                    .with_flags(SpellFlags::PASSIVE),
            )
            .unwrap();
        let parent = unit
            .register_spell(SpellConfig::new("Parent", ActionId::spell(1), move |sim, _, _| {
                let targets: Vec<_> = sim.encounter().target_ids().collect();
                for target in targets {
                    sim.cast_passive(hit, target)?;
                }
                Ok(())
            }))
            .unwrap();
        let mut sim = sim_with(unit);

        assert_eq!(sim.cast_decline(hit, TargetId(0)).unwrap(), Some(CastDecline::Passive));
        assert!(sim.try_cast(parent, TargetId(0)).unwrap());
        let metrics = sim.metrics();
        assert_eq!(metrics.action(ActionId::spell(1)).unwrap().casts, 1);
        assert_eq!(metrics.action(ActionId::spell(1).with_tag(1)).unwrap().casts, 1);
    }

    #[test]
    fn test_unknown_target_is_an_error() {
        let mut unit = Combatant::new("Tester", 60);
        let spell = unit
            .register_spell(SpellConfig::new("A", ActionId::spell(1), noop))
            .unwrap();
        let mut sim = sim_with(unit);
        assert!(matches!(
            sim.try_cast(spell, TargetId(5)),
            Err(SimError::UnknownTarget(5))
        ));
    }
}
