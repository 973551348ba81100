//! Simulation trial - the single-threaded event loop of one run
//!
//! A [`Simulation`] owns everything a trial mutates: the combatant, the
//! target roster, a private random stream and the metrics being collected.
//! Events are processed strictly in time order; events at the same instant
//! run aura expirations first, then timers and swings, and the rotation's
//! decision last.

mod events;
mod runner;

pub(crate) use events::{EventKind, EventQueue};
pub use runner::{Scenario, TrialRunner, TrialSetup, WorkerPool};

use crate::metrics::TrialMetrics;
use crate::rotation::Rotation;
use crate::unit::{Combatant, Encounter};
use crate::SimError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_types::Stance;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// One independent trial
pub struct Simulation {
    pub(crate) unit: Combatant,
    pub(crate) encounter: Encounter,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) now: Duration,
    pub(crate) duration: Duration,
    pub(crate) queue: EventQueue,
    pub(crate) metrics: TrialMetrics,
    pub(crate) outcome_rolls: u64,
    pub(crate) finished: bool,
    trial: u64,
    pending_decisions: BTreeSet<Duration>,
}

/// Random stream of trial `trial` under `seed`
pub fn trial_rng(seed: u64, trial: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(trial);
    rng
}

impl Simulation {
    /// Set up a trial and run the combatant's start hooks
    pub fn new(
        unit: Combatant,
        encounter: Encounter,
        duration: Duration,
        seed: u64,
        trial: u64,
    ) -> Result<Self, SimError> {
        if encounter.is_empty() {
            return Err(SimError::EmptyRoster);
        }
        if duration.is_zero() {
            return Err(SimError::config("trial duration must be positive"));
        }
        if let Some(target) = encounter
            .targets()
            .iter()
            .find(|target| target.attack.as_ref().is_some_and(|attack| attack.swing.is_zero()))
        {
            return Err(SimError::config(format!("target '{}' swings with a zero interval", target.name)));
        }

        let mut sim = Simulation {
            unit,
            encounter,
            rng: trial_rng(seed, trial),
            now: Duration::ZERO,
            duration,
            queue: EventQueue::new(),
            metrics: TrialMetrics::new(duration),
            outcome_rolls: 0,
            finished: false,
            trial,
            pending_decisions: BTreeSet::new(),
        };

        let hooks = sim.unit.start_hooks.clone();
        for hook in hooks {
            hook(&mut sim)?;
        }
        sim.start_auto_attacks();
        sim.start_target_swings();
        sim.schedule_decision(Duration::ZERO);
        tracing::debug!(trial, unit = %sim.unit.name, targets = sim.encounter.len(), "trial started");
        Ok(sim)
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time left until the trial ends
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.now)
    }

    pub fn trial(&self) -> u64 {
        self.trial
    }

    pub fn unit(&self) -> &Combatant {
        &self.unit
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    pub fn metrics(&self) -> &TrialMetrics {
        &self.metrics
    }

    /// Number of attack table rolls so far
    pub fn outcome_rolls(&self) -> u64 {
        self.outcome_rolls
    }

    /// The trial's private random stream, for effects that roll their own numbers
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Flip the stance flag only
    ///
    /// Stance auras, cooldowns and rage truncation belong to whichever
    /// spell performs the swap; call this from that spell's effect.
    pub fn set_stance(&mut self, stance: Stance) {
        tracing::trace!(from = %self.unit.stance, to = %stance, at = ?self.now, "stance change");
        self.unit.stance = stance;
    }

    /// Add rage and run the rage hooks
    pub fn gain_rage(&mut self, amount: f64) -> Result<(), SimError> {
        let before = self.unit.rage.current();
        let gained = self.unit.rage.gain(amount);
        if gained <= 0.0 {
            return Ok(());
        }
        self.metrics.rage_gained += gained;
        let after = self.unit.rage.current();
        for index in 0..self.unit.rage_hooks.len() {
            let hook = Arc::clone(&self.unit.rage_hooks[index]);
            hook(self, before, after)?;
        }
        Ok(())
    }

    /// Drop rage above `limit` (e.g. on a stance change)
    pub fn truncate_rage(&mut self, limit: f64) -> f64 {
        self.unit.rage.truncate(limit)
    }

    /// Ask for a rotation decision at `at` (deduplicated)
    pub fn schedule_decision(&mut self, at: Duration) {
        if self.pending_decisions.insert(at) {
            self.queue.schedule(at, EventKind::Decision);
        }
    }

    /// Process every event up to and including `until` (capped at the trial end)
    pub fn run_until(&mut self, until: Duration, rotation: &mut dyn Rotation) -> Result<(), SimError> {
        let until = until.min(self.duration);
        while let Some(at) = self.queue.peek_time() {
            if at > until || self.finished {
                break;
            }
            let Some(event) = self.queue.pop() else {
                break;
            };
            self.now = event.at;
            self.handle(event.kind, rotation)?;
        }
        if until > self.now {
            self.now = until;
        }
        Ok(())
    }

    fn handle(&mut self, kind: EventKind, rotation: &mut dyn Rotation) -> Result<(), SimError> {
        match kind {
            EventKind::Decision => {
                self.pending_decisions.remove(&self.now);
                if let Some(wake) = rotation.act(self)? {
                    if wake > self.now {
                        self.schedule_decision(wake);
                    }
                }
                return Ok(());
            }
            EventKind::AuraExpire { aura, generation } => self.handle_aura_expire(aura, generation)?,
            EventKind::TimerReady => {}
            EventKind::TargetSwing { target } => self.handle_target_swing(target)?,
            EventKind::AutoAttack { hand } => self.handle_auto_attack(hand)?,
        }
        self.schedule_decision(self.now);
        Ok(())
    }

    /// End the trial: expire every active aura and record uptimes
    pub fn finish(&mut self) -> Result<(), SimError> {
        if self.finished {
            return Ok(());
        }
        self.now = self.now.max(self.duration);
        self.finished = true;
        self.expire_all_auras()?;
        for aura in &self.unit.auras {
            if aura.activations() > 0 {
                self.metrics.record_uptime(aura.label(), aura.uptime());
            }
        }
        tracing::debug!(
            trial = self.trial,
            damage = self.metrics.damage_dealt,
            rolls = self.outcome_rolls,
            "trial finished"
        );
        Ok(())
    }

    /// Run the whole trial with `rotation`
    pub fn run(&mut self, rotation: &mut dyn Rotation) -> Result<(), SimError> {
        self.run_until(self.duration, rotation)?;
        self.finish()
    }

    pub fn into_metrics(self) -> TrialMetrics {
        self.metrics
    }

    pub(crate) fn pending_events(&self) -> usize {
        self.queue.len()
    }
}
