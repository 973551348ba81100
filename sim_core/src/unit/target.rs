//! Targets and the encounter roster

use std::fmt;
use std::time::Duration;

/// Index of a target in the encounter roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TargetId(pub usize);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// A periodic melee swing a target makes against the combatant
#[derive(Debug, Clone, PartialEq)]
pub struct TargetAttack {
    pub swing: Duration,
    pub min_damage: f64,
    pub max_damage: f64,
    /// Crit chance in percent
    pub crit: f64,
}

/// A defendable unit
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub level: u32,
    pub armor: f64,
    /// Dodge chance in percent
    pub dodge: f64,
    /// Parry chance in percent
    pub parry: f64,
    /// Block chance in percent
    pub block: f64,
    pub block_value: f64,
    /// Debuff slot for effects that raise the damage this target takes
    pub damage_taken_multiplier: f64,
    pub attack: Option<TargetAttack>,
}

impl Target {
    pub fn new(name: &str, level: u32) -> Self {
        Target {
            name: name.to_string(),
            level,
            armor: 0.0,
            dodge: 0.0,
            parry: 0.0,
            block: 0.0,
            block_value: 0.0,
            damage_taken_multiplier: 1.0,
            attack: None,
        }
    }
}

/// Ordered roster of targets for one trial
#[derive(Debug, Clone, Default)]
pub struct Encounter {
    targets: Vec<Target>,
}

impl Encounter {
    pub fn new(targets: Vec<Target>) -> Self {
        Encounter { targets }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Roster ids in roster order
    pub fn target_ids(&self) -> impl Iterator<Item = TargetId> {
        (0..self.targets.len()).map(TargetId)
    }

    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id.0)
    }

    pub fn target_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.targets.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_order() {
        let encounter = Encounter::new(vec![Target::new("A", 60), Target::new("B", 61)]);
        let ids: Vec<_> = encounter.target_ids().collect();
        assert_eq!(ids, vec![TargetId(0), TargetId(1)]);
        assert_eq!(encounter.target(TargetId(1)).unwrap().name, "B");
        assert!(encounter.target(TargetId(2)).is_none());
    }
}
