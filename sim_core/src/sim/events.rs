//! Time-ordered event queue of a trial

use crate::aura::AuraId;
use crate::combat::Hand;
use crate::unit::TargetId;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

/// Something scheduled to happen at a point in simulated time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EventKind {
    AuraExpire { aura: AuraId, generation: u64 },
    /// A cooldown or the GCD became ready
    TimerReady,
    TargetSwing { target: TargetId },
    AutoAttack { hand: Hand },
    /// The rotation gets to act
    Decision,
}

impl EventKind {
    /// Tie-break for events at the same instant; expirations come first and
    /// rotation decisions last
    fn priority(&self) -> u8 {
        match self {
            EventKind::AuraExpire { .. } => 0,
            EventKind::TimerReady => 1,
            EventKind::TargetSwing { .. } => 2,
            EventKind::AutoAttack { .. } => 3,
            EventKind::Decision => 4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Event {
    pub(crate) at: Duration,
    pub(crate) kind: EventKind,
    seq: u64,
}

impl Event {
    fn key(&self) -> (Duration, u8, u64) {
        (self.at, self.kind.priority(), self.seq)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Min-queue ordered by (time, priority, insertion order)
#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    heap: BinaryHeap<Reverse<Event>>,
    next_seq: u64,
}

impl EventQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn schedule(&mut self, at: Duration, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Event { at, kind, seq }));
    }

    pub(crate) fn peek_time(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(event)| event.at)
    }

    pub(crate) fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(event)| event)
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_then_priority_then_insertion() {
        let mut queue = EventQueue::new();
        let t = Duration::from_secs(1);
        queue.schedule(t, EventKind::Decision);
        queue.schedule(t, EventKind::AutoAttack { hand: Hand::MainHand });
        queue.schedule(Duration::ZERO, EventKind::Decision);
        queue.schedule(t, EventKind::AuraExpire { aura: AuraId(0), generation: 0 });
        queue.schedule(t, EventKind::AutoAttack { hand: Hand::OffHand });

        let order: Vec<_> = std::iter::from_fn(|| queue.pop()).map(|e| (e.at, e.kind)).collect();
        assert_eq!(
            order,
            vec![
                (Duration::ZERO, EventKind::Decision),
                (t, EventKind::AuraExpire { aura: AuraId(0), generation: 0 }),
                (t, EventKind::AutoAttack { hand: Hand::MainHand }),
                (t, EventKind::AutoAttack { hand: Hand::OffHand }),
                (t, EventKind::Decision),
            ]
        );
    }
}
