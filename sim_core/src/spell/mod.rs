//! Spell registry - immutable action definitions
//!
//! A [`SpellConfig`] is turned into a [`Spell`] by [`Combatant::register_spell`],
//! which validates it and binds its cooldown to a timer. Registered spells are
//! never mutated again; all per-trial state lives in the combatant's timers,
//! rage pool and auras.

mod cast;

pub use cast::CastDecline;

use crate::config::constants;
use crate::sim::Simulation;
use crate::timer::{Timer, TimerId};
use crate::unit::{Combatant, TargetId};
use crate::SimError;
use sim_types::{ActionId, ProcMask, SpellFlags, SpellSchool, StanceMask};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Handle to a spell registered on a combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpellId(pub usize);

/// Effect function run after a successful cast
pub type ApplyEffects =
    Arc<dyn Fn(&mut Simulation, SpellId, TargetId) -> Result<(), SimError> + Send + Sync>;

/// Extra legality predicate evaluated without side effects
pub type CastCondition = Arc<dyn Fn(&Simulation, TargetId) -> bool + Send + Sync>;

/// How a spell's cooldown is bound to a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CooldownBinding {
    #[default]
    None,
    /// A private timer created at registration
    Own(Duration),
    /// A timer shared with other spells (e.g. stance swaps)
    Shared { timer: TimerId, duration: Duration },
}

/// A resolved cooldown: the timer it arms and for how long
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    pub timer: TimerId,
    pub duration: Duration,
}

/// Definition of a spell before registration
#[derive(Clone)]
pub struct SpellConfig {
    pub label: String,
    pub action_id: ActionId,
    pub school: SpellSchool,
    pub proc_mask: ProcMask,
    pub flags: SpellFlags,
    pub stances: StanceMask,
    pub rage_cost: f64,
    /// Global cooldown cost (zero opts out)
    pub gcd: Duration,
    pub cooldown: CooldownBinding,
    /// Global cooldown is not shortened by haste
    pub ignore_haste: bool,
    pub damage_multiplier: f64,
    pub threat_multiplier: f64,
    /// Scale applied to attack power in this spell's damage
    pub bonus_coefficient: f64,
    /// Additional critical strike damage, as a fraction of the base crit bonus
    pub crit_damage_bonus: f64,
    pub extra_cast_condition: Option<CastCondition>,
    apply_effects: ApplyEffects,
}

impl SpellConfig {
    pub fn new(
        label: &str,
        action_id: ActionId,
        apply_effects: impl Fn(&mut Simulation, SpellId, TargetId) -> Result<(), SimError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        SpellConfig {
            label: label.to_string(),
            action_id,
            school: SpellSchool::Physical,
            proc_mask: ProcMask::empty(),
            flags: SpellFlags::empty(),
            stances: StanceMask::ANY,
            rage_cost: 0.0,
            gcd: Duration::ZERO,
            cooldown: CooldownBinding::None,
            ignore_haste: false,
            damage_multiplier: 1.0,
            threat_multiplier: 1.0,
            bonus_coefficient: 0.0,
            crit_damage_bonus: 0.0,
            extra_cast_condition: None,
            apply_effects: Arc::new(apply_effects),
        }
    }

    pub fn with_school(mut self, school: SpellSchool) -> Self {
        self.school = school;
        self
    }

    pub fn with_proc_mask(mut self, proc_mask: ProcMask) -> Self {
        self.proc_mask = proc_mask;
        self
    }

    pub fn with_flags(mut self, flags: SpellFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_stances(mut self, stances: StanceMask) -> Self {
        self.stances = stances;
        self
    }

    pub fn with_rage_cost(mut self, cost: f64) -> Self {
        self.rage_cost = cost;
        self
    }

    pub fn with_gcd(mut self, gcd: Duration) -> Self {
        self.gcd = gcd;
        self
    }

    /// Use the engine's default global cooldown
    pub fn with_default_gcd(self) -> Self {
        let gcd = constants().gcd.default_gcd();
        self.with_gcd(gcd)
    }

    pub fn with_cooldown(mut self, duration: Duration) -> Self {
        self.cooldown = CooldownBinding::Own(duration);
        self
    }

    pub fn with_shared_cooldown(mut self, timer: TimerId, duration: Duration) -> Self {
        self.cooldown = CooldownBinding::Shared { timer, duration };
        self
    }

    pub fn ignoring_haste(mut self) -> Self {
        self.ignore_haste = true;
        self
    }

    pub fn with_damage_multiplier(mut self, multiplier: f64) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    pub fn with_threat_multiplier(mut self, multiplier: f64) -> Self {
        self.threat_multiplier = multiplier;
        self
    }

    pub fn with_bonus_coefficient(mut self, coefficient: f64) -> Self {
        self.bonus_coefficient = coefficient;
        self
    }

    pub fn with_crit_damage_bonus(mut self, bonus: f64) -> Self {
        self.crit_damage_bonus = bonus;
        self
    }

    pub fn with_cast_condition(
        mut self,
        condition: impl Fn(&Simulation, TargetId) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.extra_cast_condition = Some(Arc::new(condition));
        self
    }

    fn validate(&self) -> Result<(), String> {
        if self.stances.is_empty() {
            return Err("no stance allows this spell".to_string());
        }
        if !self.rage_cost.is_finite() || self.rage_cost < 0.0 {
            return Err(format!("invalid rage cost {}", self.rage_cost));
        }
        match self.cooldown {
            CooldownBinding::Own(duration) | CooldownBinding::Shared { duration, .. }
                if duration.is_zero() =>
            {
                return Err("cooldown duration must be positive".to_string());
            }
            _ => {}
        }
        if self.flags.contains(SpellFlags::PASSIVE)
            && (self.rage_cost > 0.0
                || !self.gcd.is_zero()
                || self.cooldown != CooldownBinding::None)
        {
            return Err("passive spells cannot have a cost, GCD or cooldown".to_string());
        }
        if self.flags.contains(SpellFlags::OFFENSIVE | SpellFlags::DEFENSIVE) {
            return Err("spell cannot be both offensive and defensive".to_string());
        }
        for (name, value) in [
            ("damage_multiplier", self.damage_multiplier),
            ("threat_multiplier", self.threat_multiplier),
            ("bonus_coefficient", self.bonus_coefficient),
            ("crit_damage_bonus", self.crit_damage_bonus),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number, got {}", name, value));
            }
        }
        Ok(())
    }
}

/// A registered, immutable action
#[derive(Clone)]
pub struct Spell {
    pub id: SpellId,
    pub label: String,
    pub action_id: ActionId,
    pub school: SpellSchool,
    pub proc_mask: ProcMask,
    pub flags: SpellFlags,
    pub stances: StanceMask,
    pub rage_cost: f64,
    pub gcd: Duration,
    pub cooldown: Option<Cooldown>,
    pub ignore_haste: bool,
    pub damage_multiplier: f64,
    pub threat_multiplier: f64,
    pub bonus_coefficient: f64,
    pub crit_damage_bonus: f64,
    pub extra_cast_condition: Option<CastCondition>,
    pub(crate) apply_effects: ApplyEffects,
}

impl Spell {
    pub fn is_passive(&self) -> bool {
        self.flags.contains(SpellFlags::PASSIVE)
    }

    pub fn counts_toward_metrics(&self) -> bool {
        !self.flags.contains(SpellFlags::NO_METRICS)
    }
}

impl fmt::Debug for Spell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spell")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("action_id", &self.action_id)
            .field("flags", &self.flags)
            .field("stances", &self.stances)
            .field("rage_cost", &self.rage_cost)
            .field("gcd", &self.gcd)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

impl Combatant {
    /// Create a timer, e.g. for a cooldown shared by several spells
    pub fn new_timer(&mut self, ignore_haste: bool) -> TimerId {
        let timer = if ignore_haste {
            Timer::ignoring_haste()
        } else {
            Timer::new()
        };
        self.timers.push(timer);
        TimerId(self.timers.len() - 1)
    }

    pub fn timer(&self, id: TimerId) -> Result<&Timer, SimError> {
        self.timers.get(id.0).ok_or(SimError::UnknownTimer(id.0))
    }

    /// Validate and store a spell definition
    pub fn register_spell(&mut self, config: SpellConfig) -> Result<SpellId, SimError> {
        config.validate().map_err(|message| {
            SimError::config(format!("spell '{}' ({}): {}", config.label, config.action_id, message))
        })?;
        if self.spell_index.contains_key(&config.action_id) {
            return Err(SimError::config(format!(
                "spell '{}': action {} is already registered",
                config.label, config.action_id
            )));
        }

        let cooldown = match config.cooldown {
            CooldownBinding::None => None,
            CooldownBinding::Own(duration) => Some(Cooldown {
                timer: self.new_timer(true),
                duration,
            }),
            CooldownBinding::Shared { timer, duration } => {
                self.timer(timer)?;
                Some(Cooldown { timer, duration })
            }
        };

        let id = SpellId(self.spells.len());
        tracing::debug!(unit = %self.name, spell = %config.label, action = %config.action_id, "registered spell");
        self.spell_index.insert(config.action_id, id);
        self.spells.push(Arc::new(Spell {
            id,
            label: config.label,
            action_id: config.action_id,
            school: config.school,
            proc_mask: config.proc_mask,
            flags: config.flags,
            stances: config.stances,
            rage_cost: config.rage_cost,
            gcd: config.gcd,
            cooldown,
            ignore_haste: config.ignore_haste,
            damage_multiplier: config.damage_multiplier,
            threat_multiplier: config.threat_multiplier,
            bonus_coefficient: config.bonus_coefficient,
            crit_damage_bonus: config.crit_damage_bonus,
            extra_cast_condition: config.extra_cast_condition,
            apply_effects: config.apply_effects,
        }));
        Ok(id)
    }

    pub fn spell(&self, id: SpellId) -> Result<&Arc<Spell>, SimError> {
        self.spells.get(id.0).ok_or(SimError::UnknownSpell(id.0))
    }

    pub fn spell_by_action(&self, action_id: ActionId) -> Option<SpellId> {
        self.spell_index.get(&action_id).copied()
    }

    /// Whether an action made it into the castable set
    pub fn has_spell(&self, action_id: ActionId) -> bool {
        self.spell_index.contains_key(&action_id)
    }

    pub fn spells(&self) -> impl Iterator<Item = &Arc<Spell>> {
        self.spells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_types::SpellFlags;

    fn noop(_: &mut Simulation, _: SpellId, _: TargetId) -> Result<(), SimError> {
        Ok(())
    }

    #[test]
    fn test_register_and_lookup() {
        let mut unit = Combatant::new("Tester", 60);
        let id = unit
            .register_spell(
                SpellConfig::new("Strike", ActionId::spell(1), noop)
                    .with_rage_cost(15.0)
                    .with_cooldown(Duration::from_secs(6)),
            )
            .unwrap();
        assert_eq!(unit.spell_by_action(ActionId::spell(1)), Some(id));
        let spell = unit.spell(id).unwrap();
        assert!(spell.cooldown.is_some());
        assert!(unit.timer(spell.cooldown.unwrap().timer).unwrap().ignores_haste());
    }

    #[test]
    fn test_duplicate_action_rejected() {
        let mut unit = Combatant::new("Tester", 60);
        unit.register_spell(SpellConfig::new("A", ActionId::spell(1), noop))
            .unwrap();
        let err = unit
            .register_spell(SpellConfig::new("B", ActionId::spell(1), noop))
            .unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
        // A different tag is a different action
        assert!(unit
            .register_spell(SpellConfig::new("B", ActionId::spell(1).with_tag(2), noop))
            .is_ok());
    }

    #[test]
    fn test_conflicting_requirements_rejected() {
        let mut unit = Combatant::new("Tester", 60);
        let no_stance = SpellConfig::new("A", ActionId::spell(1), noop).with_stances(StanceMask::empty());
        assert!(unit.register_spell(no_stance).is_err());

        let passive_with_cost = SpellConfig::new("B", ActionId::spell(2), noop)
            .with_flags(SpellFlags::PASSIVE)
            .with_rage_cost(10.0);
        assert!(unit.register_spell(passive_with_cost).is_err());

        let negative_cost = SpellConfig::new("C", ActionId::spell(3), noop).with_rage_cost(-1.0);
        assert!(unit.register_spell(negative_cost).is_err());

        let zero_cooldown =
            SpellConfig::new("D", ActionId::spell(4), noop).with_cooldown(Duration::ZERO);
        assert!(unit.register_spell(zero_cooldown).is_err());

        let unknown_timer = SpellConfig::new("E", ActionId::spell(5), noop)
            .with_shared_cooldown(TimerId(99), Duration::from_secs(1));
        assert!(matches!(
            unit.register_spell(unknown_timer),
            Err(SimError::UnknownTimer(99))
        ));
    }
}
