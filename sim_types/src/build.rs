use crate::types::Stat;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Highest character level supported by the combat tables
pub const MAX_LEVEL: u32 = 60;

/// Weapon handedness, which decides the normalized swing speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    #[default]
    OneHand,
    TwoHand,
    Dagger,
}

impl WeaponKind {
    /// Speed used for normalized weapon damage, independent of the real swing speed
    pub fn normalized_speed(self) -> f64 {
        match self {
            WeaponKind::OneHand => 2.4,
            WeaponKind::TwoHand => 3.3,
            WeaponKind::Dagger => 1.7,
        }
    }
}

/// An equipped weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub min_damage: f64,
    pub max_damage: f64,
    /// Swing interval in seconds
    pub speed: f64,
    #[serde(default)]
    pub kind: WeaponKind,
}

impl Weapon {
    pub fn average_damage(&self) -> f64 {
        (self.min_damage + self.max_damage) / 2.0
    }
}

/// What is held in the off hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OffHand {
    Weapon(Weapon),
    Shield {
        #[serde(default)]
        armor: f64,
        #[serde(default)]
        block_value: f64,
    },
}

/// A character build: the read-only input a combatant is created from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub name: String,
    pub level: u32,
    /// Gear and buff stats, keyed by stat
    #[serde(default)]
    pub stats: BTreeMap<Stat, f64>,
    pub main_hand: Weapon,
    #[serde(default)]
    pub off_hand: Option<OffHand>,
    /// Talent name to rank
    #[serde(default)]
    pub talents: BTreeMap<String, u32>,
    /// Equipped rune names
    #[serde(default)]
    pub runes: BTreeSet<String>,
    #[serde(default)]
    pub starting_rage: f64,
}

impl Build {
    /// Load a build from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            error: e,
            path: Some(path.to_path_buf()),
        })?;

        let build: Build = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            error: e,
            path: path.to_path_buf(),
        })?;

        build.validate().map_err(|message| ConfigError::Validation {
            message,
            path: path.to_path_buf(),
        })?;

        Ok(build)
    }

    /// Parse a build from a TOML string (for testing)
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let path = PathBuf::from("<inline>");
        let build: Build = toml::from_str(content).map_err(|e| ConfigError::Parse {
            error: e,
            path: path.clone(),
        })?;
        build
            .validate()
            .map_err(|message| ConfigError::Validation { message, path })?;
        Ok(build)
    }

    fn validate(&self) -> Result<(), String> {
        if self.level == 0 || self.level > MAX_LEVEL {
            return Err(format!("level {} outside 1..={}", self.level, MAX_LEVEL));
        }
        validate_weapon("main_hand", &self.main_hand)?;
        match &self.off_hand {
            Some(OffHand::Weapon(weapon)) => validate_weapon("off_hand", weapon)?,
            Some(OffHand::Shield { armor, block_value }) => {
                if !(armor.is_finite() && *armor >= 0.0 && block_value.is_finite() && *block_value >= 0.0) {
                    return Err("shield armor and block_value must be finite and not negative".to_string());
                }
            }
            None => {}
        }
        if let Some((stat, value)) = self.stats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("stat {} has non-finite value {}", stat, value));
        }
        if !(self.starting_rage.is_finite() && self.starting_rage >= 0.0) {
            return Err("starting_rage must be finite and not negative".to_string());
        }
        Ok(())
    }

    /// Stat value from the build (0 if absent)
    pub fn stat(&self, stat: Stat) -> f64 {
        self.stats.get(&stat).copied().unwrap_or(0.0)
    }

    /// Talent rank (0 if not taken)
    pub fn talent(&self, name: &str) -> u32 {
        self.talents.get(name).copied().unwrap_or(0)
    }

    pub fn has_rune(&self, name: &str) -> bool {
        self.runes.contains(name)
    }

    pub fn is_dual_wielding(&self) -> bool {
        matches!(self.off_hand, Some(OffHand::Weapon(_)))
    }

    pub fn has_shield(&self) -> bool {
        matches!(self.off_hand, Some(OffHand::Shield { .. }))
    }

    pub fn off_hand_weapon(&self) -> Option<&Weapon> {
        match &self.off_hand {
            Some(OffHand::Weapon(weapon)) => Some(weapon),
            _ => None,
        }
    }
}

fn validate_weapon(slot: &str, weapon: &Weapon) -> Result<(), String> {
    if !(weapon.speed.is_finite() && weapon.speed > 0.0) {
        return Err(format!("{} speed must be positive", slot));
    }
    let finite = weapon.min_damage.is_finite() && weapon.max_damage.is_finite();
    if !finite || weapon.min_damage < 0.0 || weapon.min_damage > weapon.max_damage {
        return Err(format!(
            "{} damage range {}-{} is invalid",
            slot, weapon.min_damage, weapon.max_damage
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const FURY_BUILD: &str = r#"
name = "fury"
level = 60
runes = ["consumed_by_rage"]

[stats]
strength = 300.0
attack_power = 640.0
melee_crit = 5.0

[talents]
impale = 2
flurry = 5

[main_hand]
min_damage = 100.0
max_damage = 180.0
speed = 2.6

[off_hand]
type = "weapon"
min_damage = 80.0
max_damage = 140.0
speed = 2.5
"#;

    #[test]
    fn test_parse_dual_wield_build() {
        let build = Build::from_toml_str(FURY_BUILD).unwrap();
        assert_eq!(build.level, 60);
        assert!(build.is_dual_wielding());
        assert!(!build.has_shield());
        assert!(build.has_rune("consumed_by_rage"));
        assert_eq!(build.talent("impale"), 2);
        assert_eq!(build.talent("tactical_mastery"), 0);
        assert!((build.stat(Stat::Strength) - 300.0).abs() < f64::EPSILON);
        assert!((build.main_hand.average_damage() - 140.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_shield_build() {
        let toml = r#"
name = "prot"
level = 40

[main_hand]
min_damage = 50.0
max_damage = 90.0
speed = 2.0

[off_hand]
type = "shield"
armor = 1500.0
block_value = 40.0
"#;
        let build = Build::from_toml_str(toml).unwrap();
        assert!(build.has_shield());
        assert!(build.off_hand_weapon().is_none());
    }

    #[test]
    fn test_invalid_level_rejected() {
        let toml = FURY_BUILD.replace("level = 60", "level = 61");
        let err = Build::from_toml_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_invalid_weapon_rejected() {
        let toml = FURY_BUILD.replace("speed = 2.6", "speed = 0.0");
        assert!(Build::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_non_finite_weapon_rejected() {
        for (from, to) in [
            ("min_damage = 100.0", "min_damage = nan"),
            ("max_damage = 180.0", "max_damage = nan"),
            ("max_damage = 140.0", "max_damage = inf"),
            ("speed = 2.6", "speed = nan"),
            ("speed = 2.5", "speed = inf"),
        ] {
            let toml = FURY_BUILD.replace(from, to);
            let err = Build::from_toml_str(&toml).unwrap_err();
            assert!(matches!(err, ConfigError::Validation { .. }), "accepted {to}");
        }
    }

    #[test]
    fn test_nan_starting_rage_rejected() {
        let toml = FURY_BUILD.replace("runes = ", "starting_rage = nan\nrunes = ");
        assert!(Build::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fury.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(FURY_BUILD.as_bytes()).unwrap();

        let build = Build::load(&path).unwrap();
        assert_eq!(build.name, "fury");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Build::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
