//! sim_types - Shared vocabulary for the combat simulator
//!
//! Stat keys, stances, outcome categories, action identities and flags,
//! plus the character [`Build`] input and its TOML loading.

pub mod build;
pub mod types;

pub use build::{Build, OffHand, Weapon, WeaponKind, MAX_LEVEL};
pub use types::{
    ActionId, CooldownType, HitOutcome, ProcMask, PseudoStat, SpellFlags, SpellSchool, Stance,
    StanceMask, Stat,
};

use std::path::PathBuf;
use thiserror::Error;

/// Error loading a build or configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading '{path:?}': {error}")]
    Io {
        error: std::io::Error,
        path: Option<PathBuf>,
    },
    #[error("Parse error in '{path}': {error}")]
    Parse {
        error: toml::de::Error,
        path: PathBuf,
    },
    #[error("Validation error in '{path}': {message}")]
    Validation { message: String, path: PathBuf },
}
