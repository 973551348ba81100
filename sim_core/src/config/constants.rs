//! Engine constants configuration

use serde::{Deserialize, Serialize};
use sim_types::ConfigError;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Global engine constants instance
///
/// Written once before any trial starts and only read afterwards, so trials
/// running on different workers never observe a change.
static ENGINE_CONSTANTS: OnceLock<EngineConstants> = OnceLock::new();

/// Initialize the global engine constants from a TOML file
///
/// Returns error if already initialized or if loading fails.
pub fn init_constants(path: &Path) -> Result<(), ConfigError> {
    let constants = EngineConstants::load_from_path(path)?;
    ENGINE_CONSTANTS
        .set(constants)
        .map_err(|_| ConfigError::Validation {
            message: "EngineConstants already initialized".to_string(),
            path: path.to_path_buf(),
        })
}

/// Initialize the global engine constants with default values
pub fn init_constants_default() -> Result<(), ConfigError> {
    ENGINE_CONSTANTS
        .set(EngineConstants::default())
        .map_err(|_| ConfigError::Validation {
            message: "EngineConstants already initialized".to_string(),
            path: PathBuf::from("<default>"),
        })
}

/// Get a reference to the global engine constants
///
/// Falls back to the defaults when nothing was initialized explicitly.
pub fn constants() -> &'static EngineConstants {
    ENGINE_CONSTANTS.get_or_init(EngineConstants::default)
}

/// Check if constants have been initialized
pub fn constants_initialized() -> bool {
    ENGINE_CONSTANTS.get().is_some()
}

/// Ensure constants are initialized with defaults (idempotent, useful for tests)
pub fn ensure_constants_initialized() {
    ENGINE_CONSTANTS.get_or_init(EngineConstants::default);
}

/// Tunable engine constants
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConstants {
    #[serde(default)]
    pub combat: CombatConstants,
    #[serde(default)]
    pub armor: ArmorConstants,
    #[serde(default)]
    pub rage: RageConstants,
    #[serde(default)]
    pub gcd: GcdConstants,
}

impl EngineConstants {
    /// Load constants from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let constants: EngineConstants = super::load_toml(path)?;
        constants.validate().map_err(|message| ConfigError::Validation {
            message,
            path: path.to_path_buf(),
        })?;
        Ok(constants)
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.combat.base_crit_multiplier >= 1.0 && self.combat.base_crit_multiplier.is_finite()) {
            return Err("combat.base_crit_multiplier must be at least 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.combat.glance_multiplier) {
            return Err("combat.glance_multiplier must be within 0..=1".to_string());
        }
        if !(0.0..=0.01).contains(&self.combat.defense_per_point) {
            return Err("combat.defense_per_point must be within 0..=0.01".to_string());
        }
        if !(0.0..1.0).contains(&self.armor.max_reduction) {
            return Err("armor.max_reduction must be within 0..1".to_string());
        }
        if !(self.gcd.min_secs > 0.0 && self.gcd.min_secs <= self.gcd.default_secs) {
            return Err("gcd.min_secs must be positive and not above gcd.default_secs".to_string());
        }
        if Duration::try_from_secs_f64(self.gcd.default_secs).is_err() {
            return Err("gcd.default_secs is out of range".to_string());
        }
        if !(self.rage.max > 0.0 && self.rage.max.is_finite()) {
            return Err("rage.max must be positive".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConstants {
    /// Critical strike multiplier before bonus crit damage (2.0 = 200%)
    #[serde(default = "default_base_crit_multiplier")]
    pub base_crit_multiplier: f64,
    /// Damage multiplier of a glancing blow
    #[serde(default = "default_glance_multiplier")]
    pub glance_multiplier: f64,
    /// Glancing blow chance against a target of equal level
    #[serde(default = "default_glance_base")]
    pub glance_base_chance: f64,
    /// Additional glance chance per level the target is above the attacker
    #[serde(default = "default_glance_per_level")]
    pub glance_per_level: f64,
    /// Miss chance against a target of equal level
    #[serde(default = "default_base_miss")]
    pub base_miss_chance: f64,
    /// Additional miss chance per level the target is above the attacker
    #[serde(default = "default_miss_per_level")]
    pub miss_per_level: f64,
    /// Extra white-hit miss chance while dual wielding
    #[serde(default = "default_dual_wield_penalty")]
    pub dual_wield_miss_penalty: f64,
    /// Crit chance removed per level the target is above the attacker
    #[serde(default = "default_crit_suppression")]
    pub crit_suppression_per_level: f64,
    /// Damage multiplier of off-hand strikes
    #[serde(default = "default_off_hand_multiplier")]
    pub off_hand_multiplier: f64,
    /// Attack power per point of weapon DPS
    #[serde(default = "default_ap_per_dps")]
    pub attack_power_per_dps: f64,
    /// Miss chance added and crit chance removed per defense point above the attacker's weapon skill
    #[serde(default = "default_defense_per_point")]
    pub defense_per_point: f64,
}

impl Default for CombatConstants {
    fn default() -> Self {
        CombatConstants {
            base_crit_multiplier: default_base_crit_multiplier(),
            glance_multiplier: default_glance_multiplier(),
            glance_base_chance: default_glance_base(),
            glance_per_level: default_glance_per_level(),
            base_miss_chance: default_base_miss(),
            miss_per_level: default_miss_per_level(),
            dual_wield_miss_penalty: default_dual_wield_penalty(),
            crit_suppression_per_level: default_crit_suppression(),
            off_hand_multiplier: default_off_hand_multiplier(),
            attack_power_per_dps: default_ap_per_dps(),
            defense_per_point: default_defense_per_point(),
        }
    }
}

fn default_base_crit_multiplier() -> f64 {
    2.0
}
fn default_glance_multiplier() -> f64 {
    0.75
}
fn default_glance_base() -> f64 {
    0.10
}
fn default_glance_per_level() -> f64 {
    0.10
}
fn default_base_miss() -> f64 {
    0.05
}
fn default_miss_per_level() -> f64 {
    0.01
}
fn default_dual_wield_penalty() -> f64 {
    0.19
}
fn default_crit_suppression() -> f64 {
    0.01
}
fn default_off_hand_multiplier() -> f64 {
    0.5
}
fn default_ap_per_dps() -> f64 {
    14.0
}
fn default_defense_per_point() -> f64 {
    0.0004
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmorConstants {
    /// Formula: reduction = armor / (armor + base + per_level * attacker_level)
    #[serde(default = "default_armor_base")]
    pub base: f64,
    #[serde(default = "default_armor_per_level")]
    pub per_level: f64,
    /// Maximum fraction of physical damage armor can remove
    #[serde(default = "default_max_reduction")]
    pub max_reduction: f64,
}

impl Default for ArmorConstants {
    fn default() -> Self {
        ArmorConstants {
            base: default_armor_base(),
            per_level: default_armor_per_level(),
            max_reduction: default_max_reduction(),
        }
    }
}

fn default_armor_base() -> f64 {
    400.0
}
fn default_armor_per_level() -> f64 {
    85.0
}
fn default_max_reduction() -> f64 {
    0.75
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RageConstants {
    #[serde(default = "default_max_rage")]
    pub max: f64,
    /// Rage per conversion unit of damage dealt
    #[serde(default = "default_dealt_factor")]
    pub dealt_factor: f64,
    /// Rage per conversion unit of damage taken
    #[serde(default = "default_taken_factor")]
    pub taken_factor: f64,
}

impl Default for RageConstants {
    fn default() -> Self {
        RageConstants {
            max: default_max_rage(),
            dealt_factor: default_dealt_factor(),
            taken_factor: default_taken_factor(),
        }
    }
}

impl RageConstants {
    /// Level-dependent damage-to-rage conversion value
    pub fn conversion(&self, level: u32) -> f64 {
        let level = level as f64;
        0.0091107836 * level * level + 3.225598133 * level + 4.2652911
    }
}

fn default_max_rage() -> f64 {
    100.0
}
fn default_dealt_factor() -> f64 {
    7.5
}
fn default_taken_factor() -> f64 {
    2.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcdConstants {
    #[serde(default = "default_gcd")]
    pub default_secs: f64,
    /// Floor of the haste-scaled global cooldown
    #[serde(default = "default_min_gcd")]
    pub min_secs: f64,
}

impl Default for GcdConstants {
    fn default() -> Self {
        GcdConstants {
            default_secs: default_gcd(),
            min_secs: default_min_gcd(),
        }
    }
}

impl GcdConstants {
    pub fn default_gcd(&self) -> Duration {
        Duration::from_secs_f64(self.default_secs)
    }

    pub fn min_gcd(&self) -> Duration {
        Duration::from_secs_f64(self.min_secs)
    }
}

fn default_gcd() -> f64 {
    1.5
}
fn default_min_gcd() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_constants() {
        let constants = EngineConstants::default();
        assert!((constants.combat.base_crit_multiplier - 2.0).abs() < f64::EPSILON);
        assert!((constants.armor.per_level - 85.0).abs() < f64::EPSILON);
        assert_eq!(constants.gcd.default_gcd(), Duration::from_millis(1500));
    }

    #[test]
    fn test_rage_conversion_level_60() {
        let rage = RageConstants::default();
        // Roughly 230.6 at level 60
        assert!((rage.conversion(60) - 230.6).abs() < 0.1);
    }

    #[test]
    fn test_parse_partial_constants() {
        let toml = r#"
[combat]
base_crit_multiplier = 2.5

[gcd]
default_secs = 1.0
"#;

        let constants: EngineConstants = super::super::parse_toml(toml).unwrap();
        assert!((constants.combat.base_crit_multiplier - 2.5).abs() < f64::EPSILON);
        // Unspecified fields keep their defaults
        assert!((constants.combat.glance_multiplier - 0.75).abs() < f64::EPSILON);
        assert!((constants.rage.max - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_constants_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("constants.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"[combat]\nbase_crit_multiplier = 0.5\n").unwrap();

        let err = EngineConstants::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_non_finite_constants_rejected() {
        for toml in [
            "[combat]\nbase_crit_multiplier = nan\n",
            "[combat]\ndefense_per_point = nan\n",
            "[gcd]\ndefault_secs = 1e30\nmin_secs = 1.0\n",
            "[gcd]\nmin_secs = nan\n",
            "[rage]\nmax = inf\n",
        ] {
            let constants: EngineConstants = super::super::parse_toml(toml).unwrap();
            assert!(constants.validate().is_err(), "accepted {toml:?}");
        }
    }
}
