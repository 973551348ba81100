//! Prelude module for convenient imports
//!
//! ```rust
//! use sim_core::prelude::*;
//! ```

// Engine
pub use crate::error::SimError;
pub use crate::sim::{trial_rng, Scenario, Simulation, TrialRunner, TrialSetup, WorkerPool};
pub use crate::rotation::{IdleRotation, Rotation};

// Combatant and roster
pub use crate::stat_block::{PseudoStats, StatBlock};
pub use crate::unit::{Combatant, Encounter, Rage, Target, TargetAttack, TargetId};

// Timers, auras and spells
pub use crate::timer::{Timer, TimerId};
pub use crate::aura::{Aura, AuraConfig, AuraEffect, AuraId, RefreshPolicy};
pub use crate::spell::{CastDecline, Spell, SpellConfig, SpellId};
pub use crate::major_cooldown::MajorCooldown;

// Combat
pub use crate::combat::{Hand, OutcomeKind, ProcAction, ProcEvent, ProcTrigger, SpellResult};

// Results
pub use crate::metrics::{ActionMetrics, AggregateMetrics, RunningStats, TrialMetrics};
pub use crate::stat_weights::{compute_stat_weights, StatWeight, StatWeights};

// Config
pub use crate::config::{constants, init_constants, init_constants_default, SimConfig};

// Re-exports from sim_types
pub use sim_types::{
    ActionId, Build, CooldownType, HitOutcome, ProcMask, PseudoStat, SpellFlags, SpellSchool,
    Stance, StanceMask, Stat, Weapon, WeaponKind,
};
