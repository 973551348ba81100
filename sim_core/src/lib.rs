//! sim_core - Action execution and effect engine for combat simulation
//!
//! This library provides:
//! - StatBlock / PseudoStats: the combatant's derived stats
//! - Timers: cooldown and global cooldown gates
//! - Aura ledger: timed, exactly reversible stat modifiers
//! - Spell registry and cast pipeline: legality, cost, GCD, effects
//! - Outcome and damage resolution: one draw per attack per target
//! - Notable cooldown registry for rotations
//! - Trial event loop, parallel trial runner, metrics and stat weights
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sim_core::prelude::*;
//!
//! let config = SimConfig::load(Path::new("sim.toml"))?;
//! let runner = TrialRunner::from_config(&config);
//! let aggregate = runner.run(&|trial| {
//!     let mut combatant = Combatant::new("Tester", 60);
//!     combatant.enable_auto_attacks(weapon, None)?;
//!     Ok(TrialSetup {
//!         combatant,
//!         encounter: config.encounter(),
//!         rotation: Box::new(IdleRotation),
//!     })
//! })?;
//! println!("{}", aggregate.to_json()?);
//! ```

pub mod aura;
pub mod combat;
pub mod config;
pub mod defense;
pub mod error;
pub mod major_cooldown;
pub mod metrics;
pub mod prelude;
pub mod rotation;
pub mod sim;
pub mod spell;
pub mod stat_block;
pub mod stat_weights;
pub mod timer;
pub mod unit;

// Core API - what most users need
pub use error::SimError;
pub use sim::{Simulation, TrialRunner, TrialSetup, Scenario};
pub use unit::{Combatant, Encounter, Target, TargetId};
pub use spell::{SpellConfig, SpellId, CastDecline};
pub use aura::{AuraConfig, AuraEffect, AuraId, RefreshPolicy};
pub use rotation::{IdleRotation, Rotation};
pub use metrics::{AggregateMetrics, TrialMetrics};

// Configuration
pub use config::{constants, init_constants, init_constants_default, SimConfig};

// Re-export the shared vocabulary
pub use sim_types::{ActionId, Build, HitOutcome, PseudoStat, Stance, Stat};
