//! Combat system - attack tables, damage resolution, auto attacks and procs

mod auto_attack;
mod outcome;
mod procs;
mod resolution;

pub use auto_attack::{AutoAttacks, Hand, AUTO_ATTACK};
pub use outcome::{
    crit_multiplier, melee_table, AttackerProfile, DefenderProfile, OutcomeKind, OutcomeTable,
};
pub use procs::{ProcAction, ProcEvent, ProcTrigger};
pub use resolution::SpellResult;
