use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary and secondary stats tracked on a combatant's stat block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Strength,
    Agility,
    Stamina,
    AttackPower,
    /// Melee hit chance in percent
    MeleeHit,
    /// Melee crit chance in percent
    MeleeCrit,
    Armor,
    Defense,
    /// Dodge chance in percent
    Dodge,
    /// Parry chance in percent
    Parry,
    /// Block chance in percent
    Block,
    BlockValue,
}

impl Stat {
    pub const COUNT: usize = 12;

    /// Get all stat variants, in index order
    pub fn all() -> &'static [Stat] {
        &[
            Stat::Strength,
            Stat::Agility,
            Stat::Stamina,
            Stat::AttackPower,
            Stat::MeleeHit,
            Stat::MeleeCrit,
            Stat::Armor,
            Stat::Defense,
            Stat::Dodge,
            Stat::Parry,
            Stat::Block,
            Stat::BlockValue,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stat::Strength => write!(f, "Strength"),
            Stat::Agility => write!(f, "Agility"),
            Stat::Stamina => write!(f, "Stamina"),
            Stat::AttackPower => write!(f, "Attack Power"),
            Stat::MeleeHit => write!(f, "Melee Hit"),
            Stat::MeleeCrit => write!(f, "Melee Crit"),
            Stat::Armor => write!(f, "Armor"),
            Stat::Defense => write!(f, "Defense"),
            Stat::Dodge => write!(f, "Dodge"),
            Stat::Parry => write!(f, "Parry"),
            Stat::Block => write!(f, "Block"),
            Stat::BlockValue => write!(f, "Block Value"),
        }
    }
}

/// Multiplicative modifiers that are not part of the regular stat sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PseudoStat {
    DamageDealtMultiplier,
    DamageTakenMultiplier,
    ThreatMultiplier,
    MeleeSpeedMultiplier,
    CastSpeedMultiplier,
}

/// Discrete stance state of a combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    #[default]
    None,
    Battle,
    Defensive,
    Berserker,
}

impl Stance {
    /// The single-stance mask for this stance
    pub const fn mask(self) -> StanceMask {
        match self {
            Stance::None => StanceMask::NONE,
            Stance::Battle => StanceMask::BATTLE,
            Stance::Defensive => StanceMask::DEFENSIVE,
            Stance::Berserker => StanceMask::BERSERKER,
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stance::None => write!(f, "No Stance"),
            Stance::Battle => write!(f, "Battle Stance"),
            Stance::Defensive => write!(f, "Defensive Stance"),
            Stance::Berserker => write!(f, "Berserker Stance"),
        }
    }
}

bitflags! {
    /// Set of stances in which an action may be cast
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StanceMask: u8 {
        const NONE = 1 << 0;
        const BATTLE = 1 << 1;
        const DEFENSIVE = 1 << 2;
        const BERSERKER = 1 << 3;
        const ANY = Self::NONE.bits() | Self::BATTLE.bits() | Self::DEFENSIVE.bits() | Self::BERSERKER.bits();
    }
}

impl StanceMask {
    pub fn allows(self, stance: Stance) -> bool {
        self.contains(stance.mask())
    }
}

/// Mutually exclusive outcome categories of a single attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitOutcome {
    Miss,
    Dodge,
    Parry,
    Block,
    Glance,
    Crit,
    Hit,
}

impl HitOutcome {
    /// Fixed evaluation order of the attack table
    pub const ORDER: [HitOutcome; 7] = [
        HitOutcome::Miss,
        HitOutcome::Dodge,
        HitOutcome::Parry,
        HitOutcome::Block,
        HitOutcome::Glance,
        HitOutcome::Crit,
        HitOutcome::Hit,
    ];

    /// Whether the attack connected (and deals damage)
    pub fn landed(self) -> bool {
        !matches!(self, HitOutcome::Miss | HitOutcome::Dodge | HitOutcome::Parry)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for HitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitOutcome::Miss => write!(f, "Miss"),
            HitOutcome::Dodge => write!(f, "Dodge"),
            HitOutcome::Parry => write!(f, "Parry"),
            HitOutcome::Block => write!(f, "Block"),
            HitOutcome::Glance => write!(f, "Glance"),
            HitOutcome::Crit => write!(f, "Crit"),
            HitOutcome::Hit => write!(f, "Hit"),
        }
    }
}

/// Damage school of a spell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellSchool {
    #[default]
    Physical,
    Holy,
    Fire,
    Nature,
    Frost,
    Shadow,
    Arcane,
}

/// Category tag of a notable (major) cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownType {
    Damage,
    Survival,
    Threat,
    Mana,
}

/// Identity of an action, optionally tagged to tell variants apart
/// (e.g. main-hand and off-hand strikes of the same ability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionId {
    pub spell_id: u32,
    #[serde(default)]
    pub tag: i32,
}

impl ActionId {
    pub const fn spell(spell_id: u32) -> Self {
        ActionId { spell_id, tag: 0 }
    }

    pub const fn with_tag(self, tag: i32) -> Self {
        ActionId { spell_id: self.spell_id, tag }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tag == 0 {
            write!(f, "{}", self.spell_id)
        } else {
            write!(f, "{}-{}", self.spell_id, self.tag)
        }
    }
}

bitflags! {
    /// What kind of attack a hit was, for matching proc triggers
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProcMask: u16 {
        const MELEE_MH_AUTO = 1 << 0;
        const MELEE_OH_AUTO = 1 << 1;
        const MELEE_MH_SPECIAL = 1 << 2;
        const MELEE_OH_SPECIAL = 1 << 3;
        const SPELL_DAMAGE = 1 << 4;

        const MELEE_AUTO = Self::MELEE_MH_AUTO.bits() | Self::MELEE_OH_AUTO.bits();
        const MELEE_SPECIAL = Self::MELEE_MH_SPECIAL.bits() | Self::MELEE_OH_SPECIAL.bits();
        const MELEE = Self::MELEE_AUTO.bits() | Self::MELEE_SPECIAL.bits();
    }
}

bitflags! {
    /// Classification flags of a registered spell
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SpellFlags: u16 {
        /// May be chosen by a rotation
        const APL = 1 << 0;
        /// Only cast from inside another spell's effects
        const PASSIVE = 1 << 1;
        const OFFENSIVE = 1 << 2;
        const DEFENSIVE = 1 << 3;
        /// Hits every target in the roster
        const AOE = 1 << 4;
        /// Excluded from per-action metrics
        const NO_METRICS = 1 << 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_indices_are_dense() {
        for (i, stat) in Stat::all().iter().enumerate() {
            assert_eq!(stat.index(), i);
        }
        assert_eq!(Stat::all().len(), Stat::COUNT);
    }

    #[test]
    fn test_stance_mask() {
        let mask = StanceMask::BATTLE | StanceMask::BERSERKER;
        assert!(mask.allows(Stance::Battle));
        assert!(mask.allows(Stance::Berserker));
        assert!(!mask.allows(Stance::Defensive));
        assert!(!mask.allows(Stance::None));
        assert!(StanceMask::ANY.allows(Stance::None));
    }

    #[test]
    fn test_outcome_order_matches_index() {
        for (i, outcome) in HitOutcome::ORDER.iter().enumerate() {
            assert_eq!(outcome.index(), i);
        }
        assert!(!HitOutcome::Parry.landed());
        assert!(HitOutcome::Block.landed());
    }

    #[test]
    fn test_action_id_display() {
        assert_eq!(ActionId::spell(1680).to_string(), "1680");
        assert_eq!(ActionId::spell(1680).with_tag(2).to_string(), "1680-2");
    }
}
