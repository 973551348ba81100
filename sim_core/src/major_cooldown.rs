//! Notable cooldowns exposed to rotations
//!
//! Pure bookkeeping: the engine never reads this registry itself.

use crate::spell::SpellId;
use crate::unit::Combatant;
use crate::SimError;
use sim_types::CooldownType;

/// A high-impact spell and its category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MajorCooldown {
    pub spell: SpellId,
    pub kind: CooldownType,
}

#[derive(Debug, Clone, Default)]
pub struct MajorCooldownRegistry {
    entries: Vec<MajorCooldown>,
}

impl MajorCooldownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, spell: SpellId, kind: CooldownType) {
        self.entries.push(MajorCooldown { spell, kind });
    }

    pub fn all(&self) -> &[MajorCooldown] {
        &self.entries
    }

    pub fn of_type(&self, kind: CooldownType) -> impl Iterator<Item = &MajorCooldown> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    pub fn contains(&self, spell: SpellId) -> bool {
        self.entries.iter().any(|entry| entry.spell == spell)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Combatant {
    /// Expose a registered spell as a notable cooldown
    pub fn add_major_cooldown(&mut self, spell: SpellId, kind: CooldownType) -> Result<(), SimError> {
        let label = self.spell(spell)?.label.clone();
        if self.major_cooldowns.contains(spell) {
            return Err(SimError::config(format!(
                "spell '{}' is already a major cooldown",
                label
            )));
        }
        tracing::debug!(unit = %self.name, spell = %label, kind = ?kind, "registered major cooldown");
        self.major_cooldowns.add(spell, kind);
        Ok(())
    }

    pub fn major_cooldowns(&self) -> &MajorCooldownRegistry {
        &self.major_cooldowns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spell::SpellConfig;
    use sim_types::ActionId;

    #[test]
    fn test_registry_by_type() {
        let mut unit = Combatant::new("Tester", 60);
        let wall = unit
            .register_spell(SpellConfig::new("Wall", ActionId::spell(871), |_, _, _| Ok(())))
            .unwrap();
        let rage = unit
            .register_spell(SpellConfig::new("Rage", ActionId::spell(2687), |_, _, _| Ok(())))
            .unwrap();
        unit.add_major_cooldown(wall, CooldownType::Survival).unwrap();
        unit.add_major_cooldown(rage, CooldownType::Damage).unwrap();

        let survival: Vec<_> = unit.major_cooldowns().of_type(CooldownType::Survival).collect();
        assert_eq!(survival.len(), 1);
        assert_eq!(survival[0].spell, wall);
        assert!(unit.add_major_cooldown(wall, CooldownType::Survival).is_err());
        assert!(unit.add_major_cooldown(SpellId(42), CooldownType::Damage).is_err());
    }
}
