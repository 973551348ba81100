//! Talent and rune selection read from a build

use sim_core::SimError;
use sim_types::Build;

pub const IMPALE: &str = "impale";
pub const IMPROVED_SHIELD_WALL: &str = "improved_shield_wall";
pub const TACTICAL_MASTERY: &str = "tactical_mastery";
pub const FLURRY: &str = "flurry";

pub const CONSUMED_BY_RAGE: &str = "consumed_by_rage";

/// Talent name and highest rank
const TALENTS: [(&str, u32); 4] = [
    (IMPALE, 2),
    (IMPROVED_SHIELD_WALL, 2),
    (TACTICAL_MASTERY, 5),
    (FLURRY, 5),
];

const RUNES: [&str; 1] = [CONSUMED_BY_RAGE];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarriorTalents {
    pub impale: u32,
    pub improved_shield_wall: u32,
    pub tactical_mastery: u32,
    pub flurry: u32,
}

impl WarriorTalents {
    /// Read and validate the talent ranks of a build
    pub fn from_build(build: &Build) -> Result<Self, SimError> {
        for (name, rank) in &build.talents {
            let max = TALENTS
                .iter()
                .find(|(talent, _)| talent == name)
                .map(|(_, max)| *max)
                .ok_or_else(|| SimError::config(format!("unknown warrior talent '{}'", name)))?;
            if *rank > max {
                return Err(SimError::config(format!(
                    "talent '{}' has rank {} but at most {} is allowed",
                    name, rank, max
                )));
            }
        }
        Ok(WarriorTalents {
            impale: build.talent(IMPALE),
            improved_shield_wall: build.talent(IMPROVED_SHIELD_WALL),
            tactical_mastery: build.talent(TACTICAL_MASTERY),
            flurry: build.talent(FLURRY),
        })
    }

    /// Extra critical strike damage from Impale
    pub fn impale_bonus(&self) -> f64 {
        0.1 * self.impale as f64
    }

    /// Rage kept through a stance change
    pub fn rage_kept_on_stance_swap(&self) -> f64 {
        5.0 * self.tactical_mastery as f64
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarriorRunes {
    pub consumed_by_rage: bool,
}

impl WarriorRunes {
    pub fn from_build(build: &Build) -> Result<Self, SimError> {
        if let Some(unknown) = build.runes.iter().find(|rune| !RUNES.contains(&rune.as_str())) {
            return Err(SimError::config(format!("unknown warrior rune '{}'", unknown)));
        }
        Ok(WarriorRunes {
            consumed_by_rage: build.has_rune(CONSUMED_BY_RAGE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(extra: &str) -> Build {
        let toml = format!(
            r#"
name = "Test"
level = 60
main_hand = {{ min_damage = 100.0, max_damage = 200.0, speed = 2.6 }}
{}
"#,
            extra
        );
        Build::from_toml_str(&toml).unwrap()
    }

    #[test]
    fn test_ranks_and_derived_values() {
        let build = build("[talents]\nimpale = 2\ntactical_mastery = 3\n");
        let talents = WarriorTalents::from_build(&build).unwrap();
        assert_eq!(talents.impale, 2);
        assert_eq!(talents.flurry, 0);
        assert!((talents.impale_bonus() - 0.2).abs() < 1e-12);
        assert!((talents.rage_kept_on_stance_swap() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_above_max_rejected() {
        let build = build("[talents]\nimproved_shield_wall = 3\n");
        assert!(matches!(WarriorTalents::from_build(&build), Err(SimError::Config(_))));
    }

    #[test]
    fn test_unknown_talent_and_rune_rejected() {
        assert!(WarriorTalents::from_build(&build("[talents]\ncleave = 1\n")).is_err());
        assert!(WarriorRunes::from_build(&build("runes = [\"blood_frenzy\"]\n")).is_err());
    }

    #[test]
    fn test_rune() {
        let runes = WarriorRunes::from_build(&build("runes = [\"consumed_by_rage\"]\n")).unwrap();
        assert!(runes.consumed_by_rage);
        assert!(!WarriorRunes::from_build(&build("")).unwrap().consumed_by_rage);
    }
}
