//! Decision logic seam
//!
//! The engine calls [`Rotation::act`] at every decision point. A rotation
//! polls legality with `can_cast`, casts with `try_cast`, and may ask to be
//! woken at a later time.

use crate::sim::Simulation;
use crate::SimError;
use std::time::Duration;

pub trait Rotation: Send {
    /// Act at the current time; return a time to be asked again, if any
    ///
    /// Decision points also occur after every timer, swing and aura event,
    /// so a wake request is only needed to act at a moment where nothing
    /// else happens.
    fn act(&mut self, sim: &mut Simulation) -> Result<Option<Duration>, SimError>;
}

/// Casts nothing; the combatant only auto attacks
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleRotation;

impl Rotation for IdleRotation {
    fn act(&mut self, _sim: &mut Simulation) -> Result<Option<Duration>, SimError> {
        Ok(None)
    }
}
