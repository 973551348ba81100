//! Configuration loading: engine constants and simulation run settings

mod constants;
mod sim_config;

pub use constants::{
    constants, constants_initialized, ensure_constants_initialized, init_constants,
    init_constants_default, ArmorConstants, CombatConstants, EngineConstants, GcdConstants,
    RageConstants,
};
pub use sim_config::{SimConfig, TargetAttackConfig, TargetConfig};

use serde::de::DeserializeOwned;
use sim_types::ConfigError;
use std::path::{Path, PathBuf};

/// Read and deserialize a TOML file
pub(crate) fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        error: e,
        path: Some(path.to_path_buf()),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        error: e,
        path: path.to_path_buf(),
    })
}

/// Deserialize a TOML string (for testing and embedded defaults)
pub(crate) fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse {
        error: e,
        path: PathBuf::from("<inline>"),
    })
}
