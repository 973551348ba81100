//! Engine error taxonomy
//!
//! Illegal casts are not errors: the cast pipeline reports them as a declined
//! cast. Everything here is either a setup-time configuration problem or a
//! violated invariant, and aborts the trial it happens in.

use sim_types::{ConfigError, HitOutcome};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid registration or scenario setup
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Outcome table is degenerate: non-hit categories sum to {total}")]
    DegenerateOutcomeTable { total: f64 },
    #[error("Outcome table has invalid probability {value} for {outcome}")]
    InvalidProbability { outcome: HitOutcome, value: f64 },
    #[error("Unknown spell: {0}")]
    UnknownSpell(usize),
    #[error("Unknown aura: {0}")]
    UnknownAura(usize),
    #[error("Unknown timer: {0}")]
    UnknownTimer(usize),
    #[error("Unknown target: {0}")]
    UnknownTarget(usize),
    #[error("Encounter has no targets")]
    EmptyRoster,
    #[error(transparent)]
    Build(#[from] ConfigError),
}

impl SimError {
    pub fn config(message: impl Into<String>) -> Self {
        SimError::Config(message.into())
    }
}
