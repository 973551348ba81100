//! Damage resolution - outcome roll, multiplier stack, threat and metrics

use super::outcome::{crit_multiplier, melee_table, AttackerProfile, DefenderProfile, OutcomeKind, OutcomeTable};
use super::procs::ProcEvent;
use crate::config::constants;
use crate::defense::calculate_armor_mitigation;
use crate::sim::Simulation;
use crate::spell::SpellId;
use crate::unit::TargetId;
use crate::SimError;
use rand::Rng;
use serde::Serialize;
use sim_types::{HitOutcome, SpellSchool, Stat};
use std::sync::Arc;

/// Result of one resolved attack against one target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpellResult {
    #[serde(skip)]
    pub target: TargetId,
    pub outcome: HitOutcome,
    pub damage: f64,
    pub threat: f64,
}

impl SpellResult {
    pub fn landed(&self) -> bool {
        self.outcome.landed()
    }
}

impl Simulation {
    /// The combatant's offensive table inputs
    pub fn attacker_profile(&self) -> AttackerProfile {
        AttackerProfile {
            level: self.unit.level,
            hit_chance: self.unit.stats.get(Stat::MeleeHit) / 100.0,
            crit_chance: self.unit.melee_crit_percent() / 100.0,
            dual_wielding: self.unit.is_dual_wielding(),
        }
    }

    /// A target's defensive table inputs
    pub fn defender_profile(&self, target: TargetId) -> Result<DefenderProfile, SimError> {
        let defender = self
            .encounter
            .target(target)
            .ok_or(SimError::UnknownTarget(target.0))?;
        Ok(DefenderProfile {
            level: defender.level,
            dodge: defender.dodge / 100.0,
            parry: defender.parry / 100.0,
            block: defender.block / 100.0,
            defense: 0.0,
        })
    }

    /// Draw once from the trial's stream and select a category
    pub fn roll_outcome(&mut self, table: &OutcomeTable) -> HitOutcome {
        self.outcome_rolls += 1;
        let draw: f64 = self.rng.gen();
        table.select(draw)
    }

    /// Attack power used by a spell's damage formula
    pub fn spell_attack_power(&self, spell: SpellId) -> Result<f64, SimError> {
        let spell = self.unit.spell(spell)?;
        Ok(self.unit.melee_attack_power() * spell.bonus_coefficient)
    }

    /// Main-hand weapon roll plus attack power at normalized speed
    pub fn mh_normalized_weapon_damage(&mut self, attack_power: f64) -> f64 {
        let Some(weapon) = self.unit.main_hand().cloned() else {
            return 0.0;
        };
        let roll = self.rng.gen_range(weapon.min_damage..=weapon.max_damage);
        roll + attack_power / constants().combat.attack_power_per_dps * weapon.kind.normalized_speed()
    }

    /// Off-hand weapon roll plus attack power at normalized speed, with the off-hand penalty
    pub fn oh_normalized_weapon_damage(&mut self, attack_power: f64) -> f64 {
        let Some(weapon) = self.unit.off_hand().cloned() else {
            return 0.0;
        };
        let combat = &constants().combat;
        let roll = self.rng.gen_range(weapon.min_damage..=weapon.max_damage);
        (roll + attack_power / combat.attack_power_per_dps * weapon.kind.normalized_speed())
            * combat.off_hand_multiplier
    }

    /// Resolve one attack of `spell` against `target` and deal its damage
    ///
    /// `base_damage` is the spell's raw damage before multipliers, armor and
    /// the outcome transform. One random draw selects the outcome.
    pub fn calc_and_deal_damage(
        &mut self,
        spell_id: SpellId,
        target: TargetId,
        base_damage: f64,
        kind: OutcomeKind,
    ) -> Result<SpellResult, SimError> {
        let spell = Arc::clone(self.unit.spell(spell_id)?);
        let defender = self
            .encounter
            .target(target)
            .ok_or(SimError::UnknownTarget(target.0))?;
        let (armor, block_value, taken_multiplier) = (
            defender.armor,
            defender.block_value,
            defender.damage_taken_multiplier,
        );

        let table = melee_table(kind, &self.attacker_profile(), &self.defender_profile(target)?)?;
        let outcome = self.roll_outcome(&table);

        let damage = if outcome.landed() {
            let mut damage = base_damage
                * spell.damage_multiplier
                * self.unit.pseudo.damage_dealt_multiplier
                * taken_multiplier;
            if spell.school == SpellSchool::Physical {
                damage = calculate_armor_mitigation(armor, self.unit.level, damage);
            }
            match outcome {
                HitOutcome::Block => (damage - block_value).max(0.0),
                HitOutcome::Glance => damage * constants().combat.glance_multiplier,
                HitOutcome::Crit => damage * crit_multiplier(spell.crit_damage_bonus),
                _ => damage,
            }
        } else {
            0.0
        };
        let threat = damage * spell.threat_multiplier * self.unit.pseudo.threat_multiplier;

        self.metrics.record_damage(damage, threat);
        if spell.counts_toward_metrics() {
            self.metrics.record_outcome(spell.action_id, outcome, damage, threat);
        }
        tracing::trace!(
            spell = %spell.label,
            target = %target,
            outcome = %outcome,
            damage,
            at = ?self.now,
            "resolved attack"
        );

        if outcome.landed() {
            self.fire_procs(ProcEvent::Landed, spell.proc_mask)?;
        }
        if outcome == HitOutcome::Crit {
            self.fire_procs(ProcEvent::Crit, spell.proc_mask)?;
        }

        Ok(SpellResult {
            target,
            outcome,
            damage,
            threat,
        })
    }

    /// Apply post-mitigation damage to the combatant
    ///
    /// Scales by the damage-taken multiplier, records it and converts it to
    /// rage. Returns the damage actually taken.
    pub fn apply_incoming_damage(&mut self, raw: f64) -> Result<f64, SimError> {
        let taken = raw.max(0.0) * self.unit.pseudo.damage_taken_multiplier;
        self.metrics.damage_taken += taken;
        if taken > 0.0 {
            let rage = &constants().rage;
            let amount = rage.taken_factor * taken / rage.conversion(self.unit.level);
            self.gain_rage(amount)?;
        }
        Ok(taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::{AuraConfig, AuraEffect};
    use crate::spell::SpellConfig;
    use crate::unit::{Combatant, Encounter, Target};
    use sim_types::{ActionId, PseudoStat, SpellFlags};
    use std::time::Duration;

    fn strike(damage_multiplier: f64) -> SpellConfig {
        SpellConfig::new("Strike", ActionId::spell(1), |_, _, _| Ok(()))
            .with_flags(SpellFlags::PASSIVE)
            .with_damage_multiplier(damage_multiplier)
            .with_threat_multiplier(2.0)
    }

    fn sim_with(unit: Combatant, targets: Vec<Target>) -> Simulation {
        Simulation::new(unit, Encounter::new(targets), Duration::from_secs(60), 3, 0).unwrap()
    }

    #[test]
    fn test_guaranteed_hit_damage_and_threat() {
        let mut unit = Combatant::new("Tester", 60);
        unit.stats_mut().set(Stat::MeleeHit, 5.0);
        let spell = unit.register_spell(strike(1.5)).unwrap();
        let mut sim = sim_with(unit, vec![Target::new("Dummy", 60)]);

        let result = sim
            .calc_and_deal_damage(spell, TargetId(0), 100.0, OutcomeKind::MeleeSpecialHitAndCrit)
            .unwrap();
        assert_eq!(result.outcome, HitOutcome::Hit);
        assert!((result.damage - 150.0).abs() < 1e-9);
        assert!((result.threat - 300.0).abs() < 1e-9);
        assert_eq!(sim.outcome_rolls(), 1);
    }

    #[test]
    fn test_multiplier_stack_and_armor() {
        let mut unit = Combatant::new("Tester", 60);
        unit.stats_mut().set(Stat::MeleeHit, 5.0);
        let spell = unit.register_spell(strike(1.0)).unwrap();
        let enrage = unit
            .register_aura(AuraConfig::new("Enrage").with_effect(AuraEffect::MultiplyPseudoStat(
                PseudoStat::DamageDealtMultiplier,
                1.1,
            )))
            .unwrap();
        let mut armored = Target::new("Armored", 60);
        armored.armor = 5500.0;
        let mut sim = sim_with(unit, vec![armored]);
        sim.activate_aura(enrage).unwrap();

        let result = sim
            .calc_and_deal_damage(spell, TargetId(0), 1000.0, OutcomeKind::MeleeSpecialHitAndCrit)
            .unwrap();
        // 5500 / (5500 + 400 + 5100) = 0.5
        assert!((result.damage - 550.0).abs() < 1e-9);
    }

    #[test]
    fn test_certain_crit_uses_bonus() {
        let mut unit = Combatant::new("Tester", 60);
        unit.stats_mut().set(Stat::MeleeHit, 5.0);
        unit.stats_mut().set(Stat::MeleeCrit, 100.0);
        let spell = unit
            .register_spell(strike(1.0).with_crit_damage_bonus(0.2))
            .unwrap();
        let mut sim = sim_with(unit, vec![Target::new("Dummy", 60)]);

        let result = sim
            .calc_and_deal_damage(spell, TargetId(0), 100.0, OutcomeKind::MeleeSpecialHitAndCrit)
            .unwrap();
        assert_eq!(result.outcome, HitOutcome::Crit);
        assert!((result.damage - 220.0).abs() < 1e-9);
    }

    #[test]
    fn test_certain_dodge_deals_nothing() {
        let mut unit = Combatant::new("Tester", 60);
        unit.stats_mut().set(Stat::MeleeHit, 5.0);
        let spell = unit.register_spell(strike(1.0)).unwrap();
        let mut dodger = Target::new("Dodger", 60);
        dodger.dodge = 100.0;
        let mut sim = sim_with(unit, vec![dodger]);

        let result = sim
            .calc_and_deal_damage(spell, TargetId(0), 100.0, OutcomeKind::MeleeSpecialHitAndCrit)
            .unwrap();
        assert_eq!(result.outcome, HitOutcome::Dodge);
        assert_eq!(result.damage, 0.0);
        assert_eq!(result.threat, 0.0);
    }

    #[test]
    fn test_incoming_damage_scaled_and_converted_to_rage() {
        let mut unit = Combatant::new("Tester", 60);
        let wall = unit
            .register_aura(AuraConfig::new("Wall").with_effect(AuraEffect::MultiplyPseudoStat(
                PseudoStat::DamageTakenMultiplier,
                0.25,
            )))
            .unwrap();
        let mut sim = sim_with(unit, vec![Target::new("Dummy", 60)]);
        sim.activate_aura(wall).unwrap();

        let taken = sim.apply_incoming_damage(100.0).unwrap();
        assert!((taken - 25.0).abs() < 1e-12);
        assert!((sim.metrics().damage_taken - 25.0).abs() < 1e-12);
        assert!(sim.unit().rage().current() > 0.0);
    }
}
