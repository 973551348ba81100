//! Stat weights (EP values)
//!
//! Runs a baseline and one run per stat with a small stat bonus added to the
//! combatant. Every run uses the same seed, so the trials share their random
//! streams and the differences are not drowned in sampling noise.

use crate::metrics::AggregateMetrics;
use crate::sim::{Scenario, TrialRunner, TrialSetup};
use crate::SimError;
use serde::Serialize;
use sim_types::Stat;
use std::collections::BTreeMap;

/// Change in output per point of one stat
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatWeight {
    pub dps: f64,
    pub tps: f64,
    pub dtps: f64,
    /// DPS weight relative to the reference stat
    pub ep: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatWeights {
    pub reference: Stat,
    pub delta: f64,
    pub baseline_dps: f64,
    pub baseline_tps: f64,
    pub baseline_dtps: f64,
    pub weights: BTreeMap<Stat, StatWeight>,
}

impl StatWeights {
    pub fn weight(&self, stat: Stat) -> Option<&StatWeight> {
        self.weights.get(&stat)
    }
}

/// `scenario` with `amount` of `stat` added to every trial's combatant
struct WithStatBonus<'a, S: ?Sized> {
    scenario: &'a S,
    stat: Stat,
    amount: f64,
}

impl<S: Scenario + ?Sized> Scenario for WithStatBonus<'_, S> {
    fn build_trial(&self, trial: u64) -> Result<TrialSetup, SimError> {
        let mut setup = self.scenario.build_trial(trial)?;
        setup.combatant.stats_mut().add(self.stat, self.amount);
        Ok(setup)
    }
}

/// Weights of `stats` normalised to `reference`
pub fn compute_stat_weights<S: Scenario + ?Sized>(
    runner: &TrialRunner,
    scenario: &S,
    stats: &[Stat],
    delta: f64,
    reference: Stat,
) -> Result<StatWeights, SimError> {
    if !delta.is_finite() || delta == 0.0 {
        return Err(SimError::config(format!("stat weight delta must be non-zero, got {}", delta)));
    }
    tracing::info!(stats = stats.len(), delta, reference = ?reference, "computing stat weights");
    let baseline = runner.run(scenario)?;

    let mut stats_to_run: Vec<Stat> = stats.to_vec();
    if !stats_to_run.contains(&reference) {
        stats_to_run.push(reference);
    }
    let mut raw = BTreeMap::new();
    for stat in stats_to_run {
        let bonus = WithStatBonus {
            scenario,
            stat,
            amount: delta,
        };
        let run = runner.run(&bonus)?;
        raw.insert(stat, per_point(&baseline, &run, delta));
    }

    let reference_dps = raw.get(&reference).map(|w: &StatWeight| w.dps).unwrap_or(0.0);
    let weights = raw
        .into_iter()
        .filter(|(stat, _)| stats.contains(stat) || *stat == reference)
        .map(|(stat, mut weight)| {
            weight.ep = if reference_dps != 0.0 { weight.dps / reference_dps } else { 0.0 };
            (stat, weight)
        })
        .collect();

    Ok(StatWeights {
        reference,
        delta,
        baseline_dps: baseline.dps.mean(),
        baseline_tps: baseline.tps.mean(),
        baseline_dtps: baseline.dtps.mean(),
        weights,
    })
}

fn per_point(baseline: &AggregateMetrics, run: &AggregateMetrics, delta: f64) -> StatWeight {
    StatWeight {
        dps: (run.dps.mean() - baseline.dps.mean()) / delta,
        tps: (run.tps.mean() - baseline.tps.mean()) / delta,
        dtps: (run.dtps.mean() - baseline.dtps.mean()) / delta,
        ep: 0.0,
    }
}
