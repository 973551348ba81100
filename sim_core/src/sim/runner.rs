//! Trial runner - many independent trials, optionally in parallel
//!
//! Every trial gets a fresh combatant, roster and rotation from a
//! [`Scenario`] plus its own random stream, so trials share nothing mutable.
//! Results are collected in trial order and folded sequentially; the
//! aggregate is therefore identical for any worker count.

use super::Simulation;
use crate::config::SimConfig;
use crate::metrics::{AggregateMetrics, TrialMetrics};
use crate::rotation::Rotation;
use crate::unit::{Combatant, Encounter};
use crate::SimError;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::time::{Duration, Instant};

/// Everything one trial needs, built fresh per trial
pub struct TrialSetup {
    pub combatant: Combatant,
    pub encounter: Encounter,
    pub rotation: Box<dyn Rotation>,
}

/// Factory for trial setups; shared by every worker
pub trait Scenario: Sync {
    fn build_trial(&self, trial: u64) -> Result<TrialSetup, SimError>;
}

impl<F> Scenario for F
where
    F: Fn(u64) -> Result<TrialSetup, SimError> + Sync,
{
    fn build_trial(&self, trial: u64) -> Result<TrialSetup, SimError> {
        self(trial)
    }
}

/// How many worker threads run trials
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use the global rayon pool.
    pub workers: usize,
}

impl WorkerPool {
    pub fn with_workers(workers: usize) -> Self {
        WorkerPool { workers }
    }

    /// Run `f` on a pool of this size
    pub fn install<F, R>(&self, f: F) -> Result<R, SimError>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return Ok(f());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| SimError::config(format!("failed to build worker pool: {}", e)))?;
        Ok(pool.install(f))
    }
}

/// Runs a batch of trials and aggregates their metrics
#[derive(Debug, Clone)]
pub struct TrialRunner {
    pub iterations: u64,
    pub seed: u64,
    pub duration: Duration,
    pub pool: WorkerPool,
}

impl TrialRunner {
    pub fn new(iterations: u64, seed: u64, duration: Duration) -> Self {
        TrialRunner {
            iterations,
            seed,
            duration,
            pool: WorkerPool::default(),
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        TrialRunner::new(config.iterations, config.seed, config.duration())
            .with_workers(config.workers)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.pool = WorkerPool::with_workers(workers);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run one trial to completion
    pub fn run_trial<S: Scenario + ?Sized>(&self, scenario: &S, trial: u64) -> Result<TrialMetrics, SimError> {
        let TrialSetup {
            combatant,
            encounter,
            mut rotation,
        } = scenario.build_trial(trial)?;
        let mut sim = Simulation::new(combatant, encounter, self.duration, self.seed, trial)?;
        sim.run(rotation.as_mut())?;
        Ok(sim.into_metrics())
    }

    /// Run every trial on the worker pool
    ///
    /// The first failing trial (by index) aborts the run.
    pub fn run<S: Scenario + ?Sized>(&self, scenario: &S) -> Result<AggregateMetrics, SimError> {
        let started = Instant::now();
        tracing::info!(
            iterations = self.iterations,
            seed = self.seed,
            workers = self.pool.workers,
            duration = ?self.duration,
            "starting run"
        );
        let results: Vec<Result<TrialMetrics, SimError>> = self.pool.install(|| {
            (0..self.iterations)
                .into_par_iter()
                .map(|trial| self.run_trial(scenario, trial))
                .collect()
        })?;
        let aggregate = fold_results(results)?;
        tracing::info!(
            trials = aggregate.trials,
            dps = aggregate.dps.mean(),
            elapsed = ?started.elapsed(),
            "run finished"
        );
        Ok(aggregate)
    }

    /// Run every trial on the calling thread
    pub fn run_sequential<S: Scenario + ?Sized>(&self, scenario: &S) -> Result<AggregateMetrics, SimError> {
        let results = (0..self.iterations).map(|trial| self.run_trial(scenario, trial));
        fold_results(results)
    }
}

fn fold_results(
    results: impl IntoIterator<Item = Result<TrialMetrics, SimError>>,
) -> Result<AggregateMetrics, SimError> {
    let mut aggregate = AggregateMetrics::new();
    for (trial, result) in results.into_iter().enumerate() {
        let metrics = result.map_err(|e| {
            tracing::error!(trial, error = %e, "trial failed");
            e
        })?;
        aggregate.add_trial(&metrics);
    }
    Ok(aggregate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::IdleRotation;
    use crate::unit::Target;
    use sim_types::{Stat, Weapon, WeaponKind};

    fn scenario(_trial: u64) -> Result<TrialSetup, SimError> {
        let mut combatant = Combatant::new("Tester", 60);
        combatant.stats_mut().set(Stat::AttackPower, 1000.0);
        combatant.stats_mut().set(Stat::MeleeCrit, 10.0);
        combatant.enable_auto_attacks(
            Weapon {
                min_damage: 80.0,
                max_damage: 150.0,
                speed: 2.6,
                kind: WeaponKind::OneHand,
            },
            None,
        )?;
        Ok(TrialSetup {
            combatant,
            encounter: Encounter::new(vec![Target::new("Dummy", 63)]),
            rotation: Box::new(IdleRotation),
        })
    }

    fn runner() -> TrialRunner {
        TrialRunner::new(40, 1234, Duration::from_secs(60))
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = runner().run_sequential(&scenario).unwrap();
        let parallel = runner().with_workers(3).run(&scenario).unwrap();
        let global = runner().run(&scenario).unwrap();
        assert_eq!(sequential.trials, 40);
        assert_eq!(sequential, parallel);
        assert_eq!(sequential, global);
        assert!(sequential.dps.mean() > 0.0);
    }

    #[test]
    fn test_seed_changes_results() {
        let a = runner().run_sequential(&scenario).unwrap();
        let b = runner().with_seed(99).run_sequential(&scenario).unwrap();
        assert_ne!(a.dps.mean(), b.dps.mean());
    }

    #[test]
    fn test_first_failure_aborts_run() {
        let failing = |trial: u64| {
            if trial >= 7 {
                Err(SimError::config(format!("trial {} broke", trial)))
            } else {
                scenario(trial)
            }
        };
        let err = runner().with_workers(2).run(&failing).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: trial 7 broke");
    }

    #[test]
    fn test_from_config() {
        let config = SimConfig::from_toml_str("iterations = 12\nseed = 5\nworkers = 2\nduration_secs = 30.0").unwrap();
        let runner = TrialRunner::from_config(&config);
        assert_eq!(runner.iterations, 12);
        assert_eq!(runner.seed, 5);
        assert_eq!(runner.pool.workers, 2);
        assert_eq!(runner.duration, Duration::from_secs(30));
    }
}
