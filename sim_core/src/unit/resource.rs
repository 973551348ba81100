//! Rage resource pool

/// A capped rage pool
#[derive(Debug, Clone, PartialEq)]
pub struct Rage {
    current: f64,
    max: f64,
}

impl Rage {
    pub fn new(max: f64) -> Self {
        Rage { current: 0.0, max }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Add rage up to the cap, returning the amount actually gained
    pub fn gain(&mut self, amount: f64) -> f64 {
        if amount <= 0.0 {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    pub fn can_afford(&self, cost: f64) -> bool {
        self.current >= cost
    }

    /// Remove `cost` rage; returns false and leaves the pool untouched if unaffordable
    pub fn spend(&mut self, cost: f64) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.current -= cost;
        true
    }

    /// Drop any rage above `limit`, returning the amount lost
    pub fn truncate(&mut self, limit: f64) -> f64 {
        let limit = limit.max(0.0);
        if self.current <= limit {
            return 0.0;
        }
        let lost = self.current - limit;
        self.current = limit;
        lost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_is_capped() {
        let mut rage = Rage::new(100.0);
        assert!((rage.gain(70.0) - 70.0).abs() < f64::EPSILON);
        assert!((rage.gain(50.0) - 30.0).abs() < f64::EPSILON);
        assert!((rage.current() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_spend_is_atomic() {
        let mut rage = Rage::new(100.0);
        rage.gain(20.0);
        assert!(!rage.spend(25.0));
        assert!((rage.current() - 20.0).abs() < f64::EPSILON);
        assert!(rage.spend(20.0));
        assert_eq!(rage.current(), 0.0);
    }

    #[test]
    fn test_truncate() {
        let mut rage = Rage::new(100.0);
        rage.gain(60.0);
        assert!((rage.truncate(25.0) - 35.0).abs() < f64::EPSILON);
        assert_eq!(rage.truncate(50.0), 0.0);
    }
}
