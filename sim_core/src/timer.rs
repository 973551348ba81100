//! Readiness gates for cooldowns and the global cooldown

use std::time::Duration;

/// Handle to a timer registered on a combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub usize);

/// A readiness gate armed until a point in simulated time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timer {
    ready_at: Duration,
    ignore_haste: bool,
}

impl Timer {
    /// A gate whose duration shrinks with haste
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate that always runs for its full duration
    pub fn ignoring_haste() -> Self {
        Timer {
            ready_at: Duration::ZERO,
            ignore_haste: true,
        }
    }

    pub fn ignores_haste(&self) -> bool {
        self.ignore_haste
    }

    /// Arm the gate until `now + duration`, scaled down by `haste` unless the
    /// gate ignores haste. Returns the time the gate becomes ready.
    pub fn start(&mut self, now: Duration, duration: Duration, haste: f64) -> Duration {
        let scaled = if self.ignore_haste || haste <= 0.0 || !haste.is_finite() {
            duration
        } else {
            duration.div_f64(haste)
        };
        self.ready_at = now + scaled;
        self.ready_at
    }

    pub fn is_ready(&self, now: Duration) -> bool {
        now >= self.ready_at
    }

    pub fn ready_at(&self) -> Duration {
        self.ready_at
    }

    /// Time left until ready (zero when ready)
    pub fn time_to_ready(&self, now: Duration) -> Duration {
        self.ready_at.saturating_sub(now)
    }

    /// Make the gate ready immediately
    pub fn reset(&mut self) {
        self.ready_at = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timer_is_ready() {
        let timer = Timer::new();
        assert!(timer.is_ready(Duration::ZERO));
    }

    #[test]
    fn test_start_and_ready() {
        let mut timer = Timer::new();
        let ready = timer.start(Duration::from_secs(5), Duration::from_secs(10), 1.0);
        assert_eq!(ready, Duration::from_secs(15));
        assert!(!timer.is_ready(Duration::from_secs(14)));
        assert!(timer.is_ready(Duration::from_secs(15)));
        assert_eq!(timer.time_to_ready(Duration::from_secs(12)), Duration::from_secs(3));
        assert_eq!(timer.time_to_ready(Duration::from_secs(20)), Duration::ZERO);
    }

    #[test]
    fn test_haste_scaling() {
        let mut timer = Timer::new();
        let ready = timer.start(Duration::ZERO, Duration::from_millis(1500), 1.5);
        assert_eq!(ready, Duration::from_millis(1000));

        let mut fixed = Timer::ignoring_haste();
        let ready = fixed.start(Duration::ZERO, Duration::from_millis(1500), 1.5);
        assert_eq!(ready, Duration::from_millis(1500));
    }

    #[test]
    fn test_reset() {
        let mut timer = Timer::ignoring_haste();
        timer.start(Duration::ZERO, Duration::from_secs(60), 1.0);
        timer.reset();
        assert!(timer.is_ready(Duration::from_secs(1)));
    }
}
