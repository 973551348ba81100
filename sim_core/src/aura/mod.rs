//! Aura ledger - timed, reversible modifiers on a combatant
//!
//! An aura is registered once at setup and stays dormant until something
//! activates it. Its stat changes are described as a list of [`AuraEffect`]s:
//! activation applies them in order and expiration undoes them in reverse
//! order with the exact inverse operation (subtract an add, divide out a
//! multiply). Non-stat side effects go in the optional `on_gain` and
//! `on_expire` hooks, which must undo each other the same way.
//!
//! What happens when an already active aura is activated again is fixed per
//! aura by its [`RefreshPolicy`].

mod ledger;

use crate::sim::Simulation;
use crate::stat_block::{PseudoStats, StatBlock};
use crate::SimError;
use sim_types::{ActionId, PseudoStat, Stat};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Handle to an aura registered on a combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuraId(pub usize);

/// Side-effect callback run when an aura is gained or expires
pub type AuraHook = Arc<dyn Fn(&mut Simulation, AuraId) -> Result<(), SimError> + Send + Sync>;

/// A single reversible stat operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuraEffect {
    AddStat(Stat, f64),
    MultiplyStat(Stat, f64),
    AddPseudoStat(PseudoStat, f64),
    MultiplyPseudoStat(PseudoStat, f64),
}

impl AuraEffect {
    pub(crate) fn apply(&self, stats: &mut StatBlock, pseudo: &mut PseudoStats) {
        match *self {
            AuraEffect::AddStat(stat, amount) => stats.add(stat, amount),
            AuraEffect::MultiplyStat(stat, factor) => stats.multiply(stat, factor),
            AuraEffect::AddPseudoStat(stat, amount) => pseudo.add(stat, amount),
            AuraEffect::MultiplyPseudoStat(stat, factor) => pseudo.multiply(stat, factor),
        }
    }

    pub(crate) fn revert(&self, stats: &mut StatBlock, pseudo: &mut PseudoStats) {
        match *self {
            AuraEffect::AddStat(stat, amount) => stats.add(stat, -amount),
            AuraEffect::MultiplyStat(stat, factor) => stats.divide(stat, factor),
            AuraEffect::AddPseudoStat(stat, amount) => pseudo.add(stat, -amount),
            AuraEffect::MultiplyPseudoStat(stat, factor) => pseudo.divide(stat, factor),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match *self {
            AuraEffect::AddStat(_, amount) | AuraEffect::AddPseudoStat(_, amount) => {
                if !amount.is_finite() {
                    return Err(format!("additive effect {} is not finite", amount));
                }
            }
            AuraEffect::MultiplyStat(_, factor) | AuraEffect::MultiplyPseudoStat(_, factor) => {
                if !factor.is_finite() || factor <= 0.0 {
                    return Err(format!("multiplicative effect {} must be positive", factor));
                }
            }
        }
        Ok(())
    }
}

/// Behaviour when an active aura is activated again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Restart the duration and restore charges; effects are not reapplied
    #[default]
    Refresh,
    /// Leave the running aura untouched
    Ignore,
    /// Apply the effects once more (up to `max_stacks`) and restart the duration
    Stack { max_stacks: u32 },
}

/// Immutable definition of an aura
#[derive(Clone)]
pub struct AuraConfig {
    pub label: String,
    pub action_id: Option<ActionId>,
    /// `None` for permanent auras that only end when removed
    pub duration: Option<Duration>,
    pub effects: Vec<AuraEffect>,
    pub refresh: RefreshPolicy,
    /// Charges granted on each activation or refresh
    pub max_charges: Option<u32>,
    pub on_gain: Option<AuraHook>,
    pub on_expire: Option<AuraHook>,
}

impl AuraConfig {
    pub fn new(label: &str) -> Self {
        AuraConfig {
            label: label.to_string(),
            action_id: None,
            duration: None,
            effects: Vec::new(),
            refresh: RefreshPolicy::default(),
            max_charges: None,
            on_gain: None,
            on_expire: None,
        }
    }

    pub fn with_action_id(mut self, action_id: ActionId) -> Self {
        self.action_id = Some(action_id);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_effect(mut self, effect: AuraEffect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_refresh(mut self, refresh: RefreshPolicy) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn with_charges(mut self, charges: u32) -> Self {
        self.max_charges = Some(charges);
        self
    }

    pub fn on_gain(
        mut self,
        hook: impl Fn(&mut Simulation, AuraId) -> Result<(), SimError> + Send + Sync + 'static,
    ) -> Self {
        self.on_gain = Some(Arc::new(hook));
        self
    }

    pub fn on_expire(
        mut self,
        hook: impl Fn(&mut Simulation, AuraId) -> Result<(), SimError> + Send + Sync + 'static,
    ) -> Self {
        self.on_expire = Some(Arc::new(hook));
        self
    }

    pub(crate) fn validate(&self) -> Result<(), SimError> {
        let fail = |message: String| SimError::config(format!("aura '{}': {}", self.label, message));
        if self.duration == Some(Duration::ZERO) {
            return Err(fail("duration must be positive".to_string()));
        }
        if let RefreshPolicy::Stack { max_stacks: 0 } = self.refresh {
            return Err(fail("max_stacks must be at least 1".to_string()));
        }
        if self.max_charges == Some(0) {
            return Err(fail("max_charges must be at least 1".to_string()));
        }
        for effect in &self.effects {
            effect.validate().map_err(fail)?;
        }
        Ok(())
    }
}

impl fmt::Debug for AuraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuraConfig")
            .field("label", &self.label)
            .field("action_id", &self.action_id)
            .field("duration", &self.duration)
            .field("effects", &self.effects)
            .field("refresh", &self.refresh)
            .field("max_charges", &self.max_charges)
            .field("on_gain", &self.on_gain.is_some())
            .field("on_expire", &self.on_expire.is_some())
            .finish()
    }
}

/// Per-trial state of a registered aura
#[derive(Debug, Clone)]
pub struct Aura {
    config: Arc<AuraConfig>,
    active: bool,
    stacks: u32,
    charges: Option<u32>,
    expires_at: Option<Duration>,
    /// Bumped whenever a scheduled expiration becomes stale
    generation: u64,
    activated_at: Duration,
    uptime: Duration,
    activations: u64,
}

impl Aura {
    pub(crate) fn new(config: AuraConfig) -> Self {
        Aura {
            config: Arc::new(config),
            active: false,
            stacks: 0,
            charges: None,
            expires_at: None,
            generation: 0,
            activated_at: Duration::ZERO,
            uptime: Duration::ZERO,
            activations: 0,
        }
    }

    pub fn config(&self) -> &AuraConfig {
        &self.config
    }

    pub fn label(&self) -> &str {
        &self.config.label
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    pub fn charges(&self) -> Option<u32> {
        self.charges
    }

    pub fn expires_at(&self) -> Option<Duration> {
        self.expires_at
    }

    /// Number of times the aura went from inactive to active
    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Total active time of finished activations
    pub fn uptime(&self) -> Duration {
        self.uptime
    }
}
