//! warrior - Warrior class module for the combat simulator
//!
//! Registers the warrior's stances, Shield Wall, Whirlwind, the Consumed by
//! Rage enrage and Flurry on a [`Combatant`] built from a character
//! [`Build`], and provides a simple priority rotation and a [`Scenario`] for
//! the trial runner.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use warrior::{RotationOptions, WarriorScenario};
//! use sim_core::prelude::*;
//!
//! let config = SimConfig::load(Path::new("sim.toml"))?;
//! let build = Build::load(Path::new("build.toml"))?;
//! let scenario = WarriorScenario::new(build, config.clone(), RotationOptions::default());
//! let aggregate = TrialRunner::from_config(&config).run(&scenario)?;
//! ```

pub mod enrage;
pub mod flurry;
pub mod rotation;
pub mod shield_wall;
pub mod stances;
pub mod talents;
pub mod whirlwind;

pub use rotation::{PriorityRotation, RotationOptions};
pub use shield_wall::ShieldWall;
pub use stances::StanceSpells;
pub use talents::{WarriorRunes, WarriorTalents};
pub use whirlwind::Whirlwind;

use sim_core::aura::AuraId;
use sim_core::config::SimConfig;
use sim_core::sim::{Scenario, TrialSetup};
use sim_core::{Combatant, SimError};
use sim_types::{Build, Stat};

/// Strength to attack power for warriors
const AP_PER_STRENGTH: f64 = 2.0;
/// Agility per percent of melee crit
const AGILITY_PER_CRIT: f64 = 20.0;

/// Handles of everything registered on a warrior
#[derive(Debug, Clone, Copy)]
pub struct WarriorSpells {
    pub stances: StanceSpells,
    pub shield_wall: ShieldWall,
    /// Absent below level 36
    pub whirlwind: Option<Whirlwind>,
    /// Present with the Consumed by Rage rune
    pub enrage: Option<AuraId>,
    /// Present with points in Flurry
    pub flurry: Option<AuraId>,
}

/// A warrior combatant ready for one trial
#[derive(Debug)]
pub struct Warrior {
    pub combatant: Combatant,
    pub talents: WarriorTalents,
    pub runes: WarriorRunes,
    pub spells: WarriorSpells,
}

/// Create a combatant from `build` and register the warrior's abilities
pub fn register_warrior(build: &Build) -> Result<Warrior, SimError> {
    let talents = WarriorTalents::from_build(build)?;
    let runes = WarriorRunes::from_build(build)?;

    let mut combatant = Combatant::from_build(build)?;
    combatant.ap_per_strength = AP_PER_STRENGTH;
    combatant.crit_per_agility = AGILITY_PER_CRIT;

    let stances = stances::register_stances(&mut combatant, &talents)?;
    let shield_wall = shield_wall::register_shield_wall(&mut combatant, &talents)?;
    let enrage = if runes.consumed_by_rage {
        Some(enrage::register_consumed_by_rage(&mut combatant)?)
    } else {
        None
    };
    let flurry = flurry::register_flurry(&mut combatant, talents.flurry)?;
    let whirlwind = whirlwind::register_whirlwind(&mut combatant, &talents, &runes, enrage)?;

    tracing::debug!(
        name = %build.name,
        level = build.level,
        whirlwind = whirlwind.is_some(),
        off_hand_whirlwind = whirlwind.is_some_and(|ww| ww.off_hand.is_some()),
        "warrior registered"
    );
    Ok(Warrior {
        combatant,
        talents,
        runes,
        spells: WarriorSpells {
            stances,
            shield_wall,
            whirlwind,
            enrage,
            flurry,
        },
    })
}

/// Stats reported by default when computing stat weights
pub const EP_STATS: [Stat; 5] = [
    Stat::Strength,
    Stat::Agility,
    Stat::AttackPower,
    Stat::MeleeHit,
    Stat::MeleeCrit,
];

pub const EP_REFERENCE: Stat = Stat::AttackPower;

/// A warrior with a priority rotation against the configured roster
#[derive(Debug, Clone)]
pub struct WarriorScenario {
    pub build: Build,
    pub config: SimConfig,
    pub options: RotationOptions,
}

impl WarriorScenario {
    pub fn new(build: Build, config: SimConfig, options: RotationOptions) -> Self {
        WarriorScenario { build, config, options }
    }
}

impl Scenario for WarriorScenario {
    fn build_trial(&self, _trial: u64) -> Result<TrialSetup, SimError> {
        let warrior = register_warrior(&self.build)?;
        Ok(TrialSetup {
            combatant: warrior.combatant,
            encounter: self.config.encounter(),
            rotation: Box::new(PriorityRotation::new(warrior.spells, &self.options)),
        })
    }
}
