//! A simple priority rotation
//!
//! Fire survival cooldowns once their time has come (swapping stance for
//! them if that is all that stands in the way), otherwise sit in Berserker
//! stance and Whirlwind on cooldown.

use crate::WarriorSpells;
use serde::{Deserialize, Serialize};
use sim_core::rotation::Rotation;
use sim_core::spell::{CastDecline, SpellId};
use sim_core::{SimError, Simulation, TargetId};
use sim_types::{ConfigError, CooldownType, Stance};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Rotation settings, loadable from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationOptions {
    /// Use survival cooldowns (Shield Wall) from this many seconds in
    #[serde(default)]
    pub survival_at_secs: Option<f64>,
    /// Also compute stat weights in the command line runner
    #[serde(default)]
    pub stat_weights: bool,
}

impl RotationOptions {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            error: e,
            path: Some(path.to_path_buf()),
        })?;
        Self::parse(&content, path.to_path_buf())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, PathBuf::from("<inline>"))
    }

    fn parse(content: &str, path: PathBuf) -> Result<Self, ConfigError> {
        let options: RotationOptions = toml::from_str(content).map_err(|e| ConfigError::Parse {
            error: e,
            path: path.clone(),
        })?;
        if let Some(at) = options.survival_at_secs {
            if Duration::try_from_secs_f64(at).is_err() {
                return Err(ConfigError::Validation {
                    message: format!("survival_at_secs must be a non-negative number, got {}", at),
                    path,
                });
            }
        }
        Ok(options)
    }

    pub fn survival_at(&self) -> Option<Duration> {
        self.survival_at_secs.map(Duration::from_secs_f64)
    }
}

#[derive(Debug, Clone)]
pub struct PriorityRotation {
    spells: WarriorSpells,
    survival_at: Option<Duration>,
}

impl PriorityRotation {
    pub fn new(spells: WarriorSpells, options: &RotationOptions) -> Self {
        PriorityRotation {
            spells,
            survival_at: options.survival_at(),
        }
    }

    fn swap_to(&self, sim: &mut Simulation, stance: Stance) -> Result<bool, SimError> {
        if sim.unit().stance() == stance {
            return Ok(false);
        }
        match self.spells.stances.spell(stance) {
            Some(spell) => sim.try_cast(spell, TargetId::default()),
            None => Ok(false),
        }
    }

    /// Cast due survival cooldowns. Returns true while one is still waiting
    /// on a stance swap, so nothing swaps back in the meantime.
    fn survival_cooldowns(&self, sim: &mut Simulation) -> Result<bool, SimError> {
        let cooldowns: Vec<SpellId> = sim
            .unit()
            .major_cooldowns()
            .of_type(CooldownType::Survival)
            .map(|cooldown| cooldown.spell)
            .collect();
        let target = TargetId::default();
        let mut waiting = false;
        for spell in cooldowns {
            match sim.cast_decline(spell, target)? {
                None => {
                    sim.try_cast(spell, target)?;
                }
                Some(CastDecline::WrongStance) if castable_in_other_stance(sim, spell)? => {
                    let stances = sim.unit().spell(spell)?.stances;
                    let wanted = [Stance::Defensive, Stance::Battle, Stance::Berserker]
                        .into_iter()
                        .find(|stance| stances.allows(*stance));
                    if let Some(stance) = wanted {
                        self.swap_to(sim, stance)?;
                        if sim.try_cast(spell, target)? {
                            continue;
                        }
                        waiting = true;
                    }
                }
                Some(_) => {}
            }
        }
        Ok(waiting)
    }
}

/// Everything but the stance allows the cast
fn castable_in_other_stance(sim: &Simulation, spell: SpellId) -> Result<bool, SimError> {
    if sim.cooldown_remaining(spell)? > Duration::ZERO {
        return Ok(false);
    }
    let spell = sim.unit().spell(spell)?;
    if !sim.unit().rage().can_afford(spell.rage_cost) {
        return Ok(false);
    }
    Ok(spell
        .extra_cast_condition
        .as_ref()
        .map_or(true, |condition| condition(sim, TargetId::default())))
}

impl Rotation for PriorityRotation {
    fn act(&mut self, sim: &mut Simulation) -> Result<Option<Duration>, SimError> {
        if let Some(at) = self.survival_at {
            if sim.now() < at {
                // Wake up when survival cooldowns become due
                self.whirlwind(sim)?;
                return Ok(Some(at));
            }
            if self.survival_cooldowns(sim)? {
                return Ok(None);
            }
        }
        self.whirlwind(sim)?;
        Ok(None)
    }
}

impl PriorityRotation {
    fn whirlwind(&self, sim: &mut Simulation) -> Result<(), SimError> {
        let Some(whirlwind) = self.spells.whirlwind else {
            return Ok(());
        };
        self.swap_to(sim, Stance::Berserker)?;
        if sim.can_cast(whirlwind.spell, TargetId::default()) {
            sim.try_cast(whirlwind.spell, TargetId::default())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_parse() {
        let options = RotationOptions::from_toml_str("survival_at_secs = 30.0\nstat_weights = true").unwrap();
        assert_eq!(options.survival_at(), Some(Duration::from_secs(30)));
        assert!(options.stat_weights);
        assert_eq!(RotationOptions::from_toml_str("").unwrap(), RotationOptions::default());
    }

    #[test]
    fn test_negative_time_rejected() {
        let err = RotationOptions::from_toml_str("survival_at_secs = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(RotationOptions::from_toml_str("survival_at_secs = nan").is_err());
        assert!(RotationOptions::from_toml_str("survival_at_secs = 1e30").is_err());
    }
}
