//! Simulation run settings and target roster

use crate::unit::{Encounter, Target, TargetAttack};
use serde::{Deserialize, Serialize};
use sim_types::{ConfigError, MAX_LEVEL};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for a batch of trials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of independent trials
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Base seed; trial `i` draws from stream `i` of this seed
    #[serde(default)]
    pub seed: u64,
    /// Simulated length of each trial in seconds
    #[serde(default = "default_duration")]
    pub duration_secs: f64,
    /// Worker threads (0 = one per CPU core)
    #[serde(default)]
    pub workers: usize,
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            iterations: default_iterations(),
            seed: 0,
            duration_secs: default_duration(),
            workers: 0,
            targets: default_targets(),
        }
    }
}

fn default_iterations() -> u64 {
    1000
}
fn default_duration() -> f64 {
    180.0
}
fn default_targets() -> Vec<TargetConfig> {
    vec![TargetConfig::default()]
}

/// One defendable unit in the roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_target_name")]
    pub name: String,
    #[serde(default = "default_target_level")]
    pub level: u32,
    #[serde(default = "default_target_armor")]
    pub armor: f64,
    /// Dodge chance in percent
    #[serde(default = "default_target_dodge")]
    pub dodge: f64,
    /// Parry chance in percent (0 when attacked from behind)
    #[serde(default)]
    pub parry: f64,
    /// Block chance in percent
    #[serde(default)]
    pub block: f64,
    #[serde(default)]
    pub block_value: f64,
    /// Optional melee swing against the combatant
    #[serde(default)]
    pub attack: Option<TargetAttackConfig>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        TargetConfig {
            name: default_target_name(),
            level: default_target_level(),
            armor: default_target_armor(),
            dodge: default_target_dodge(),
            parry: 0.0,
            block: 0.0,
            block_value: 0.0,
            attack: None,
        }
    }
}

fn default_target_name() -> String {
    "Target".to_string()
}
fn default_target_level() -> u32 {
    63
}
fn default_target_armor() -> f64 {
    3731.0
}
fn default_target_dodge() -> f64 {
    5.6
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetAttackConfig {
    /// Seconds between swings
    pub swing_secs: f64,
    pub min_damage: f64,
    pub max_damage: f64,
    /// Crit chance in percent
    #[serde(default = "default_target_crit")]
    pub crit: f64,
}

fn default_target_crit() -> f64 {
    5.0
}

impl SimConfig {
    /// Load run settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: SimConfig = super::load_toml(path)?;
        config.validate().map_err(|message| ConfigError::Validation {
            message,
            path: path.to_path_buf(),
        })?;
        Ok(config)
    }

    /// Parse run settings from a TOML string (for testing)
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = super::parse_toml(content)?;
        config.validate().map_err(|message| ConfigError::Validation {
            message,
            path: PathBuf::from("<inline>"),
        })?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if !is_positive_duration(self.duration_secs) {
            return Err(format!("duration_secs must be a positive duration, got {}", self.duration_secs));
        }
        if self.targets.is_empty() {
            return Err("at least one target is required".to_string());
        }
        for target in &self.targets {
            if target.level == 0 || target.level > MAX_LEVEL + 3 {
                return Err(format!("target '{}' has invalid level {}", target.name, target.level));
            }
            for (name, value) in [
                ("dodge", target.dodge),
                ("parry", target.parry),
                ("block", target.block),
            ] {
                if !(0.0..=100.0).contains(&value) {
                    return Err(format!("target '{}' {} must be a percentage", target.name, name));
                }
            }
            if !(is_non_negative(target.armor) && is_non_negative(target.block_value)) {
                return Err(format!("target '{}' has invalid armor or block value", target.name));
            }
            if let Some(attack) = &target.attack {
                if !is_positive_duration(attack.swing_secs) {
                    return Err(format!("target '{}' swing_secs must be a positive duration", target.name));
                }
                if !(is_non_negative(attack.min_damage)
                    && attack.max_damage.is_finite()
                    && attack.min_damage <= attack.max_damage)
                {
                    return Err(format!("target '{}' has an invalid damage range", target.name));
                }
                if !(0.0..=100.0).contains(&attack.crit) {
                    return Err(format!("target '{}' crit must be a percentage", target.name));
                }
            }
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs)
    }

    /// Build a fresh roster for one trial
    pub fn encounter(&self) -> Encounter {
        Encounter::new(
            self.targets
                .iter()
                .map(|config| {
                    let mut target = Target::new(&config.name, config.level);
                    target.armor = config.armor;
                    target.dodge = config.dodge;
                    target.parry = config.parry;
                    target.block = config.block;
                    target.block_value = config.block_value;
                    target.attack = config.attack.as_ref().map(|attack| TargetAttack {
                        swing: Duration::from_secs_f64(attack.swing_secs),
                        min_damage: attack.min_damage,
                        max_damage: attack.max_damage,
                        crit: attack.crit,
                    });
                    target
                })
                .collect(),
        )
    }
}

/// True when `secs` converts to a non-zero `Duration`
fn is_positive_duration(secs: f64) -> bool {
    Duration::try_from_secs_f64(secs).map_or(false, |duration| !duration.is_zero())
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimConfig::from_toml_str("").unwrap();
        assert_eq!(config.iterations, 1000);
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.targets[0].level, 63);
        assert_eq!(config.duration(), Duration::from_secs(180));
    }

    #[test]
    fn test_parse_roster() {
        let toml = r#"
iterations = 50
seed = 7
duration_secs = 60.0

[[targets]]
name = "Boss"
armor = 3731.0

[targets.attack]
swing_secs = 2.0
min_damage = 900.0
max_damage = 1100.0

[[targets]]
name = "Add"
level = 60
armor = 2000.0

[[targets]]
name = "Add 2"
level = 60
"#;
        let config = SimConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.targets.len(), 3);

        let encounter = config.encounter();
        assert_eq!(encounter.len(), 3);
        let boss = &encounter.targets()[0];
        assert_eq!(boss.attack.as_ref().unwrap().swing, Duration::from_secs(2));
        assert_eq!(encounter.targets()[2].level, 60);
    }

    #[test]
    fn test_empty_roster_rejected() {
        let err = SimConfig::from_toml_str("targets = []").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_bad_duration_rejected() {
        assert!(SimConfig::from_toml_str("duration_secs = 0.0").is_err());
        assert!(SimConfig::from_toml_str("duration_secs = nan").is_err());
        // Too long for a Duration
        assert!(SimConfig::from_toml_str("duration_secs = 1e30").is_err());
    }

    #[test]
    fn test_non_finite_target_attack_rejected() {
        let target = |attack: &str| {
            format!("[[targets]]\nname = \"Boss\"\n\n[targets.attack]\n{attack}\n")
        };
        for attack in [
            "swing_secs = 2.0\nmin_damage = nan\nmax_damage = 500.0",
            "swing_secs = 2.0\nmin_damage = 100.0\nmax_damage = nan",
            "swing_secs = 2.0\nmin_damage = 100.0\nmax_damage = inf",
            "swing_secs = nan\nmin_damage = 100.0\nmax_damage = 500.0",
            "swing_secs = 1e30\nmin_damage = 100.0\nmax_damage = 500.0",
            "swing_secs = 1e-12\nmin_damage = 100.0\nmax_damage = 500.0",
            "swing_secs = 2.0\nmin_damage = 100.0\nmax_damage = 500.0\ncrit = nan",
        ] {
            let err = SimConfig::from_toml_str(&target(attack)).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { .. }), "accepted {attack:?}");
        }

        let ok = target("swing_secs = 2.0\nmin_damage = 100.0\nmax_damage = 500.0");
        assert!(SimConfig::from_toml_str(&ok).is_ok());
    }

    #[test]
    fn test_nan_armor_rejected() {
        let toml = "[[targets]]\nname = \"Boss\"\narmor = nan\n";
        assert!(SimConfig::from_toml_str(toml).is_err());
    }
}
