//! Auto attacks and incoming target swings

use super::outcome::{
    crit_multiplier, melee_table, weapon_skill, AttackerProfile, DefenderProfile, OutcomeKind,
};
use super::procs::ProcEvent;
use super::resolution::SpellResult;
use crate::config::constants;
use crate::defense::calculate_armor_mitigation;
use crate::sim::{EventKind, Simulation};
use crate::spell::{SpellConfig, SpellId};
use crate::unit::{Combatant, TargetId};
use crate::SimError;
use rand::Rng;
use sim_types::{ActionId, HitOutcome, ProcMask, SpellFlags, Stat, Weapon};

pub const AUTO_ATTACK: ActionId = ActionId::spell(6603);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    MainHand,
    OffHand,
}

impl Hand {
    fn proc_mask(self) -> ProcMask {
        match self {
            Hand::MainHand => ProcMask::MELEE_MH_AUTO,
            Hand::OffHand => ProcMask::MELEE_OH_AUTO,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct WeaponSwing {
    pub(crate) weapon: Weapon,
    pub(crate) spell: SpellId,
}

/// Equipped weapons and the passive spells that swing them
#[derive(Debug, Clone)]
pub struct AutoAttacks {
    pub(crate) main_hand: WeaponSwing,
    pub(crate) off_hand: Option<WeaponSwing>,
}

impl Combatant {
    /// Equip weapons and register their swing spells
    pub fn enable_auto_attacks(
        &mut self,
        main_hand: Weapon,
        off_hand: Option<Weapon>,
    ) -> Result<(), SimError> {
        if self.auto_attacks.is_some() {
            return Err(SimError::config("auto attacks are already enabled"));
        }
        for weapon in std::iter::once(&main_hand).chain(off_hand.as_ref()) {
            let damage_ok = weapon.min_damage.is_finite()
                && weapon.max_damage.is_finite()
                && (0.0..=weapon.max_damage).contains(&weapon.min_damage);
            if !(weapon.speed.is_finite() && weapon.speed > 0.0 && damage_ok) {
                return Err(SimError::config(format!("invalid weapon for auto attacks: {:?}", weapon)));
            }
        }
        let main_spell = self.register_spell(
            SpellConfig::new("Auto Attack", AUTO_ATTACK.with_tag(1), |sim, _, target| {
                sim.white_swing(Hand::MainHand, target).map(|_| ())
            })
            .with_flags(SpellFlags::PASSIVE)
            .with_proc_mask(ProcMask::MELEE_MH_AUTO),
        )?;
        let off_hand = match off_hand {
            Some(weapon) => {
                let spell = self.register_spell(
                    SpellConfig::new("Auto Attack (Off Hand)", AUTO_ATTACK.with_tag(2), |sim, _, target| {
                        sim.white_swing(Hand::OffHand, target).map(|_| ())
                    })
                    .with_flags(SpellFlags::PASSIVE)
                    .with_proc_mask(ProcMask::MELEE_OH_AUTO),
                )?;
                Some(WeaponSwing { weapon, spell })
            }
            None => None,
        };
        self.auto_attacks = Some(AutoAttacks {
            main_hand: WeaponSwing {
                weapon: main_hand,
                spell: main_spell,
            },
            off_hand,
        });
        Ok(())
    }

    pub fn main_hand(&self) -> Option<&Weapon> {
        self.auto_attacks.as_ref().map(|autos| &autos.main_hand.weapon)
    }

    pub fn off_hand(&self) -> Option<&Weapon> {
        self.auto_attacks
            .as_ref()
            .and_then(|autos| autos.off_hand.as_ref())
            .map(|swing| &swing.weapon)
    }

    /// Avoidance and defense used when a target swings at this combatant
    pub fn defender_profile(&self) -> DefenderProfile {
        let stats = &self.stats;
        let pseudo = &self.pseudo;
        DefenderProfile {
            level: self.level,
            dodge: stats.get(Stat::Dodge) / 100.0,
            parry: if pseudo.can_parry { stats.get(Stat::Parry) / 100.0 } else { 0.0 },
            block: if pseudo.can_block { stats.get(Stat::Block) / 100.0 } else { 0.0 },
            defense: weapon_skill(self.level).max(stats.get(Stat::Defense)),
        }
    }

    fn weapon_swing(&self, hand: Hand) -> Option<&WeaponSwing> {
        let autos = self.auto_attacks.as_ref()?;
        match hand {
            Hand::MainHand => Some(&autos.main_hand),
            Hand::OffHand => autos.off_hand.as_ref(),
        }
    }
}

impl Simulation {
    /// Schedule the first swing of each equipped weapon
    pub(crate) fn start_auto_attacks(&mut self) {
        for hand in [Hand::MainHand, Hand::OffHand] {
            if self.unit.weapon_swing(hand).is_some() {
                self.queue.schedule(self.now, EventKind::AutoAttack { hand });
            }
        }
    }

    pub(crate) fn handle_auto_attack(&mut self, hand: Hand) -> Result<(), SimError> {
        let Some(swing) = self.unit.weapon_swing(hand).cloned() else {
            return Ok(());
        };
        self.fire_procs(ProcEvent::Swing, hand.proc_mask())?;
        self.cast_passive(swing.spell, TargetId(0))?;

        let speed = self.unit.pseudo.melee_speed_multiplier;
        let interval = std::time::Duration::from_secs_f64(swing.weapon.speed / speed.max(f64::EPSILON));
        self.queue.schedule(self.now + interval, EventKind::AutoAttack { hand });
        Ok(())
    }

    /// One white hit with `hand` against `target`, generating rage
    pub fn white_swing(&mut self, hand: Hand, target: TargetId) -> Result<SpellResult, SimError> {
        let swing = self
            .unit
            .weapon_swing(hand)
            .cloned()
            .ok_or_else(|| SimError::config(format!("no weapon equipped for {:?}", hand)))?;
        let combat = &constants().combat;
        let attack_power = self.unit.melee_attack_power();
        let weapon = &swing.weapon;
        let mut base = self.rng.gen_range(weapon.min_damage..=weapon.max_damage)
            + attack_power / combat.attack_power_per_dps * weapon.speed;
        if hand == Hand::OffHand {
            base *= combat.off_hand_multiplier;
        }

        let result = self.calc_and_deal_damage(swing.spell, target, base, OutcomeKind::MeleeWhite)?;
        if result.damage > 0.0 {
            let rage = &constants().rage;
            self.gain_rage(rage.dealt_factor * result.damage / rage.conversion(self.unit.level))?;
        }
        Ok(result)
    }

    /// Schedule the first swing of every target that attacks
    pub(crate) fn start_target_swings(&mut self) {
        let attackers: Vec<TargetId> = self
            .encounter
            .target_ids()
            .filter(|id| {
                self.encounter
                    .target(*id)
                    .map(|target| target.attack.is_some())
                    .unwrap_or(false)
            })
            .collect();
        for target in attackers {
            self.queue.schedule(self.now, EventKind::TargetSwing { target });
        }
    }

    /// Resolve a target's swing against the combatant
    pub(crate) fn handle_target_swing(&mut self, id: TargetId) -> Result<(), SimError> {
        let target = self.encounter.target(id).ok_or(SimError::UnknownTarget(id.0))?;
        let Some(attack) = target.attack.clone() else {
            return Ok(());
        };
        let target_level = target.level;

        let defender = self.unit.defender_profile();
        let attacker = AttackerProfile {
            level: target_level,
            hit_chance: 0.0,
            crit_chance: attack.crit / 100.0,
            dual_wielding: false,
        };
        let table = melee_table(OutcomeKind::MeleeSpecialHitAndCrit, &attacker, &defender)?;
        let outcome = self.roll_outcome(&table);

        if outcome.landed() {
            let roll = self.rng.gen_range(attack.min_damage..=attack.max_damage);
            let mut raw = calculate_armor_mitigation(self.unit.stats.get(Stat::Armor), target_level, roll);
            match outcome {
                HitOutcome::Crit => raw *= crit_multiplier(0.0),
                HitOutcome::Block => raw = (raw - self.unit.stats.get(Stat::BlockValue)).max(0.0),
                _ => {}
            }
            let taken = self.apply_incoming_damage(raw)?;
            tracing::trace!(target = %id, outcome = %outcome, taken, at = ?self.now, "target swing");
        }

        self.queue.schedule(self.now + attack.swing, EventKind::TargetSwing { target: id });
        Ok(())
    }
}
