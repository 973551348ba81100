//! Per-trial metrics and their aggregate over a run
//!
//! A trial appends to its own [`TrialMetrics`] and never reads it back. The
//! runner folds finished trials into an [`AggregateMetrics`] in trial order;
//! every merge is a plain sum or a pairwise mean/variance update.

use serde::{Serialize, Serializer};
use sim_types::{ActionId, HitOutcome};
use std::collections::BTreeMap;
use std::time::Duration;

/// Totals for one action over one trial
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionMetrics {
    pub casts: u64,
    pub outcomes: BTreeMap<HitOutcome, u64>,
    pub damage: f64,
    pub threat: f64,
    pub resource_spent: f64,
}

impl ActionMetrics {
    /// Number of resolved attacks
    pub fn hits(&self) -> u64 {
        self.outcomes.values().sum()
    }

    pub fn outcome_count(&self, outcome: HitOutcome) -> u64 {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    fn merge(&mut self, other: &ActionMetrics) {
        self.casts += other.casts;
        for (outcome, count) in &other.outcomes {
            *self.outcomes.entry(*outcome).or_insert(0) += count;
        }
        self.damage += other.damage;
        self.threat += other.threat;
        self.resource_spent += other.resource_spent;
    }
}

/// Everything one trial recorded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialMetrics {
    duration_secs: f64,
    pub damage_dealt: f64,
    pub threat: f64,
    pub damage_taken: f64,
    pub rage_gained: f64,
    pub rage_spent: f64,
    /// Seconds each aura was active, by label
    pub aura_uptime: BTreeMap<String, f64>,
    #[serde(serialize_with = "serialize_actions")]
    pub actions: BTreeMap<ActionId, ActionMetrics>,
}

impl TrialMetrics {
    pub fn new(duration: Duration) -> Self {
        TrialMetrics {
            duration_secs: duration.as_secs_f64(),
            damage_dealt: 0.0,
            threat: 0.0,
            damage_taken: 0.0,
            rage_gained: 0.0,
            rage_spent: 0.0,
            aura_uptime: BTreeMap::new(),
            actions: BTreeMap::new(),
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn action(&self, action_id: ActionId) -> Option<&ActionMetrics> {
        self.actions.get(&action_id)
    }

    pub fn record_cast(&mut self, action_id: ActionId, cost: f64) {
        let action = self.actions.entry(action_id).or_default();
        action.casts += 1;
        action.resource_spent += cost;
    }

    pub fn record_outcome(&mut self, action_id: ActionId, outcome: HitOutcome, damage: f64, threat: f64) {
        let action = self.actions.entry(action_id).or_default();
        *action.outcomes.entry(outcome).or_insert(0) += 1;
        action.damage += damage;
        action.threat += threat;
    }

    /// Add to the trial totals (every resolved attack, metrics-exempt or not)
    pub fn record_damage(&mut self, damage: f64, threat: f64) {
        self.damage_dealt += damage;
        self.threat += threat;
    }

    pub fn record_uptime(&mut self, label: &str, uptime: Duration) {
        *self.aura_uptime.entry(label.to_string()).or_insert(0.0) += uptime.as_secs_f64();
    }

    pub fn dps(&self) -> f64 {
        per_second(self.damage_dealt, self.duration_secs)
    }

    pub fn tps(&self) -> f64 {
        per_second(self.threat, self.duration_secs)
    }

    pub fn dtps(&self) -> f64 {
        per_second(self.damage_taken, self.duration_secs)
    }
}

fn per_second(total: f64, secs: f64) -> f64 {
    if secs > 0.0 {
        total / secs
    } else {
        0.0
    }
}

/// JSON objects need string keys
fn serialize_actions<S: Serializer>(
    actions: &BTreeMap<ActionId, ActionMetrics>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(actions.iter().map(|(id, metrics)| (id.to_string(), metrics)))
}

/// Streaming mean and variance
///
/// Welford's update for single samples and Chan's pairwise formula for
/// merging two partial results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn merge(&mut self, other: &RunningStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let n = count as f64;
        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.count = count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample variance (0 with fewer than two samples)
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Standard error of the mean
    pub fn std_error(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.std_dev() / (self.count as f64).sqrt()
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Summary of a whole run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateMetrics {
    pub trials: u64,
    pub dps: RunningStats,
    pub tps: RunningStats,
    pub dtps: RunningStats,
    pub rage_gained: RunningStats,
    /// Per-action totals summed over every trial
    #[serde(serialize_with = "serialize_actions")]
    pub actions: BTreeMap<ActionId, ActionMetrics>,
    /// Summed active seconds per aura label
    pub aura_uptime_secs: BTreeMap<String, f64>,
    pub total_secs: f64,
}

impl AggregateMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one finished trial in
    pub fn add_trial(&mut self, trial: &TrialMetrics) {
        self.trials += 1;
        self.dps.push(trial.dps());
        self.tps.push(trial.tps());
        self.dtps.push(trial.dtps());
        self.rage_gained.push(trial.rage_gained);
        for (id, action) in &trial.actions {
            self.actions.entry(*id).or_default().merge(action);
        }
        for (label, secs) in &trial.aura_uptime {
            *self.aura_uptime_secs.entry(label.clone()).or_insert(0.0) += secs;
        }
        self.total_secs += trial.duration_secs;
    }

    /// Combine two partial aggregates
    pub fn merge(&mut self, other: &AggregateMetrics) {
        self.trials += other.trials;
        self.dps.merge(&other.dps);
        self.tps.merge(&other.tps);
        self.dtps.merge(&other.dtps);
        self.rage_gained.merge(&other.rage_gained);
        for (id, action) in &other.actions {
            self.actions.entry(*id).or_default().merge(action);
        }
        for (label, secs) in &other.aura_uptime_secs {
            *self.aura_uptime_secs.entry(label.clone()).or_insert(0.0) += secs;
        }
        self.total_secs += other.total_secs;
    }

    pub fn action(&self, action_id: ActionId) -> Option<&ActionMetrics> {
        self.actions.get(&action_id)
    }

    /// Fraction of simulated time `label` was active
    pub fn uptime(&self, label: &str) -> f64 {
        match self.aura_uptime_secs.get(label) {
            Some(secs) if self.total_secs > 0.0 => secs / self.total_secs,
            _ => 0.0,
        }
    }

    /// Mean casts of an action per trial
    pub fn casts_per_trial(&self, action_id: ActionId) -> f64 {
        match self.action(action_id) {
            Some(action) if self.trials > 0 => action.casts as f64 / self.trials as f64,
            _ => 0.0,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WHIRLWIND: ActionId = ActionId::spell(1680);

    #[test]
    fn test_trial_recording() {
        let mut trial = TrialMetrics::new(Duration::from_secs(10));
        trial.record_cast(WHIRLWIND, 25.0);
        trial.record_outcome(WHIRLWIND.with_tag(1), HitOutcome::Crit, 300.0, 375.0);
        trial.record_outcome(WHIRLWIND.with_tag(1), HitOutcome::Dodge, 0.0, 0.0);
        trial.record_damage(300.0, 375.0);

        assert_eq!(trial.action(WHIRLWIND).unwrap().casts, 1);
        assert!((trial.action(WHIRLWIND).unwrap().resource_spent - 25.0).abs() < 1e-12);
        let hits = trial.action(WHIRLWIND.with_tag(1)).unwrap();
        assert_eq!(hits.hits(), 2);
        assert_eq!(hits.outcome_count(HitOutcome::Crit), 1);
        assert_eq!(hits.outcome_count(HitOutcome::Miss), 0);
        assert!((trial.dps() - 30.0).abs() < 1e-12);
        assert!((trial.tps() - 37.5).abs() < 1e-12);
    }

    #[test]
    fn test_running_stats_known_values() {
        let mut stats = RunningStats::new();
        for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.push(value);
        }
        assert_eq!(stats.count(), 8);
        assert!((stats.mean() - 5.0).abs() < 1e-12);
        assert!((stats.variance() - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(stats.min(), 2.0);
        assert_eq!(stats.max(), 9.0);
    }

    #[test]
    fn test_single_sample_has_no_variance() {
        let mut stats = RunningStats::new();
        stats.push(3.0);
        assert_eq!(stats.variance(), 0.0);
        assert_eq!(RunningStats::new().std_error(), 0.0);
    }

    #[test]
    fn test_aggregate_uptime_and_json() {
        let mut a = TrialMetrics::new(Duration::from_secs(10));
        a.record_uptime("Enrage", Duration::from_secs(5));
        a.record_cast(WHIRLWIND, 25.0);
        let mut b = TrialMetrics::new(Duration::from_secs(10));
        b.record_uptime("Enrage", Duration::from_secs(10));

        let mut aggregate = AggregateMetrics::new();
        aggregate.add_trial(&a);
        aggregate.add_trial(&b);
        assert_eq!(aggregate.trials, 2);
        assert!((aggregate.uptime("Enrage") - 0.75).abs() < 1e-12);
        assert_eq!(aggregate.uptime("Flurry"), 0.0);
        assert!((aggregate.casts_per_trial(WHIRLWIND) - 0.5).abs() < 1e-12);

        let json = aggregate.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["trials"], 2);
        assert_eq!(value["actions"]["1680"]["casts"], 1);
    }

    #[test]
    fn test_partial_aggregates_merge_in_either_order() {
        let trials: Vec<TrialMetrics> = (0..6)
            .map(|i| {
                let mut trial = TrialMetrics::new(Duration::from_secs(60));
                trial.record_cast(WHIRLWIND, 25.0);
                let damage = 900.0 + 137.0 * i as f64;
                trial.record_outcome(WHIRLWIND.with_tag(1), HitOutcome::Hit, damage, damage);
                trial.record_damage(damage, damage);
                trial.record_uptime("Enrage", Duration::from_secs(i * 5));
                trial
            })
            .collect();

        let fold = |trials: &[TrialMetrics]| {
            let mut aggregate = AggregateMetrics::new();
            for trial in trials {
                aggregate.add_trial(trial);
            }
            aggregate
        };
        let sequential = fold(&trials);
        let (head, tail) = trials.split_at(2);

        let mut forward = fold(head);
        forward.merge(&fold(tail));
        let mut backward = fold(tail);
        backward.merge(&fold(head));

        for merged in [&forward, &backward] {
            assert_eq!(merged.trials, 6);
            assert_eq!(merged.action(WHIRLWIND).unwrap().casts, 6);
            assert_eq!(merged.action(WHIRLWIND.with_tag(1)).unwrap().hits(), 6);
            assert!((merged.total_secs - sequential.total_secs).abs() < 1e-9);
            assert!((merged.uptime("Enrage") - sequential.uptime("Enrage")).abs() < 1e-12);
            assert!((merged.dps.mean() - sequential.dps.mean()).abs() < 1e-9);
            assert!((merged.dps.variance() - sequential.dps.variance()).abs() < 1e-9);
            assert_eq!(merged.dps.min(), sequential.dps.min());
            assert_eq!(merged.dps.max(), sequential.dps.max());
        }
        // Merging into an empty aggregate copies the other side
        let mut empty = AggregateMetrics::new();
        empty.merge(&sequential);
        assert_eq!(empty, sequential);
    }

    proptest! {
        #[test]
        fn prop_merge_matches_sequential(
            left in proptest::collection::vec(-1000.0f64..1000.0, 0..40),
            right in proptest::collection::vec(-1000.0f64..1000.0, 0..40),
        ) {
            let mut sequential = RunningStats::new();
            let mut a = RunningStats::new();
            let mut b = RunningStats::new();
            for value in &left {
                sequential.push(*value);
                a.push(*value);
            }
            for value in &right {
                sequential.push(*value);
                b.push(*value);
            }
            a.merge(&b);
            prop_assert_eq!(a.count(), sequential.count());
            prop_assert!((a.mean() - sequential.mean()).abs() < 1e-6);
            prop_assert!((a.variance() - sequential.variance()).abs() < 1e-4 * (1.0 + sequential.variance()));
        }
    }
}
