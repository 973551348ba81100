//! Combatant - the acting unit and everything registered to it

mod resource;
mod target;

pub use resource::Rage;
pub use target::{Encounter, Target, TargetAttack, TargetId};

use crate::aura::Aura;
use crate::combat::{AutoAttacks, ProcTrigger};
use crate::config::constants;
use crate::major_cooldown::MajorCooldownRegistry;
use crate::sim::Simulation;
use crate::spell::{Spell, SpellId};
use crate::stat_block::{PseudoStats, StatBlock};
use crate::timer::Timer;
use crate::SimError;
use sim_types::{ActionId, Build, OffHand, Stance, Stat};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Called after rage is gained, with the values before and after
pub type RageHook = Arc<dyn Fn(&mut Simulation, f64, f64) -> Result<(), SimError> + Send + Sync>;

/// Called once when a trial starts, before the first event
pub type StartHook = Arc<dyn Fn(&mut Simulation) -> Result<(), SimError> + Send + Sync>;

/// The acting unit of a trial
///
/// Built fresh for every trial: registration of spells, auras, timers and
/// hooks happens on the combatant before it is handed to a [`Simulation`].
pub struct Combatant {
    pub(crate) name: String,
    pub(crate) level: u32,
    pub(crate) stats: StatBlock,
    pub(crate) pseudo: PseudoStats,
    pub(crate) stance: Stance,
    pub(crate) rage: Rage,
    pub(crate) gcd: Timer,
    pub(crate) timers: Vec<Timer>,
    pub(crate) auras: Vec<Aura>,
    pub(crate) spells: Vec<Arc<Spell>>,
    pub(crate) spell_index: HashMap<ActionId, SpellId>,
    pub(crate) major_cooldowns: MajorCooldownRegistry,
    pub(crate) proc_triggers: Vec<ProcTrigger>,
    pub(crate) rage_hooks: Vec<RageHook>,
    pub(crate) start_hooks: Vec<StartHook>,
    pub(crate) auto_attacks: Option<AutoAttacks>,
    /// Attack power granted per point of strength
    pub ap_per_strength: f64,
    /// Agility per percent of melee crit
    pub crit_per_agility: f64,
}

impl Combatant {
    /// A bare combatant with empty stats and nothing registered
    pub fn new(name: &str, level: u32) -> Self {
        Combatant {
            name: name.to_string(),
            level,
            stats: StatBlock::new(),
            pseudo: PseudoStats::new(),
            stance: Stance::None,
            rage: Rage::new(constants().rage.max),
            gcd: Timer::new(),
            timers: Vec::new(),
            auras: Vec::new(),
            spells: Vec::new(),
            spell_index: HashMap::new(),
            major_cooldowns: MajorCooldownRegistry::new(),
            proc_triggers: Vec::new(),
            rage_hooks: Vec::new(),
            start_hooks: Vec::new(),
            auto_attacks: None,
            ap_per_strength: 2.0,
            crit_per_agility: 20.0,
        }
    }

    /// Create a combatant from a build: stats, shield, starting rage and
    /// auto attacks for the equipped weapons
    pub fn from_build(build: &Build) -> Result<Self, SimError> {
        let mut unit = Combatant::new(&build.name, build.level);
        for (stat, value) in &build.stats {
            unit.stats.add(*stat, *value);
        }
        if let Some(OffHand::Shield { armor, block_value }) = &build.off_hand {
            unit.stats.add(Stat::Armor, *armor);
            unit.stats.add(Stat::BlockValue, *block_value);
            unit.pseudo.can_block = true;
        }
        unit.rage.gain(build.starting_rage);
        unit.enable_auto_attacks(build.main_hand.clone(), build.off_hand_weapon().cloned())?;
        tracing::debug!(unit = %unit.name, level = unit.level, "combatant created from build");
        Ok(unit)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn stats(&self) -> &StatBlock {
        &self.stats
    }

    /// Mutable stats for setup; during a trial use auras instead
    pub fn stats_mut(&mut self) -> &mut StatBlock {
        &mut self.stats
    }

    pub fn pseudo(&self) -> &PseudoStats {
        &self.pseudo
    }

    pub fn pseudo_mut(&mut self) -> &mut PseudoStats {
        &mut self.pseudo
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }

    pub fn rage(&self) -> &Rage {
        &self.rage
    }

    pub fn gcd(&self) -> &Timer {
        &self.gcd
    }

    pub fn is_dual_wielding(&self) -> bool {
        self.auto_attacks
            .as_ref()
            .map(|autos| autos.off_hand.is_some())
            .unwrap_or(false)
    }

    /// Attack power including strength
    pub fn melee_attack_power(&self) -> f64 {
        self.stats.get(Stat::AttackPower) + self.stats.get(Stat::Strength) * self.ap_per_strength
    }

    /// Melee crit chance in percent including agility
    pub fn melee_crit_percent(&self) -> f64 {
        let from_agility = if self.crit_per_agility > 0.0 {
            self.stats.get(Stat::Agility) / self.crit_per_agility
        } else {
            0.0
        };
        self.stats.get(Stat::MeleeCrit) + from_agility
    }

    /// Register a callback run after rage is gained
    pub fn on_rage_change(
        &mut self,
        hook: impl Fn(&mut Simulation, f64, f64) -> Result<(), SimError> + Send + Sync + 'static,
    ) {
        self.rage_hooks.push(Arc::new(hook));
    }

    /// Register a callback run when the trial starts
    pub fn on_trial_start(
        &mut self,
        hook: impl Fn(&mut Simulation) -> Result<(), SimError> + Send + Sync + 'static,
    ) {
        self.start_hooks.push(Arc::new(hook));
    }
}

impl fmt::Debug for Combatant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combatant")
            .field("name", &self.name)
            .field("level", &self.level)
            .field("stance", &self.stance)
            .field("rage", &self.rage)
            .field("spells", &self.spells.len())
            .field("auras", &self.auras.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILD: &str = r#"
name = "Prot"
level = 60
starting_rage = 30.0

[stats]
strength = 100.0
agility = 200.0
attack_power = 500.0
melee_crit = 5.0

[main_hand]
min_damage = 100.0
max_damage = 200.0
speed = 2.5

[off_hand]
type = "shield"
armor = 2000.0
block_value = 50.0
"#;

    #[test]
    fn test_from_build() {
        let build = Build::from_toml_str(BUILD).unwrap();
        let unit = Combatant::from_build(&build).unwrap();
        assert!((unit.melee_attack_power() - 700.0).abs() < 1e-9);
        assert!((unit.melee_crit_percent() - 15.0).abs() < 1e-9);
        assert!((unit.stats().get(Stat::Armor) - 2000.0).abs() < 1e-9);
        assert!(unit.pseudo().can_block);
        assert!(!unit.is_dual_wielding());
        assert!((unit.rage().current() - 30.0).abs() < 1e-9);
    }
}
