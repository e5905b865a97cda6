//! Time management for the simulation
//!
//! A trial advances in whole days. Two days are special: the disaster day,
//! when the shock is injected, and the recovery start day, from which the
//! capacity loss of damaged firms starts to decay.

use serde::{Deserialize, Serialize};

/// Manages simulated days for one trial
///
/// # Example
/// ```
/// use disaster_simulator_core_rs::DayClock;
///
/// let mut clock = DayClock::new(365, 1, 5);
/// assert_eq!(clock.current_day(), 0);
/// assert!(!clock.is_disaster_day());
///
/// clock.advance_day();
/// assert!(clock.is_disaster_day());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayClock {
    /// Days elapsed since trial start
    current_day: usize,
    /// Number of days in the trial
    horizon_days: usize,
    /// Day on which the disaster strikes
    disaster_day: usize,
    /// First day on which damage decays
    recovery_start_day: usize,
}

impl DayClock {
    /// Create a new clock positioned on day 0
    ///
    /// # Panics
    /// Panics if `horizon_days` is zero
    pub fn new(horizon_days: usize, disaster_day: usize, recovery_start_day: usize) -> Self {
        assert!(horizon_days > 0, "horizon_days must be positive");
        Self {
            current_day: 0,
            horizon_days,
            disaster_day,
            recovery_start_day,
        }
    }

    /// Rebuild a clock at an arbitrary day (checkpoint restore)
    pub fn at_day(
        current_day: usize,
        horizon_days: usize,
        disaster_day: usize,
        recovery_start_day: usize,
    ) -> Self {
        let mut clock = Self::new(horizon_days, disaster_day, recovery_start_day);
        clock.current_day = current_day;
        clock
    }

    /// Advance time by one day
    pub fn advance_day(&mut self) {
        self.current_day += 1;
    }

    /// Current day (0-indexed)
    pub fn current_day(&self) -> usize {
        self.current_day
    }

    /// Number of days in the trial
    pub fn horizon_days(&self) -> usize {
        self.horizon_days
    }

    /// True once every day of the horizon has been simulated
    pub fn is_finished(&self) -> bool {
        self.current_day >= self.horizon_days
    }

    /// True on the day the disaster is injected
    pub fn is_disaster_day(&self) -> bool {
        self.current_day == self.disaster_day
    }

    /// True from the recovery start day onward
    pub fn recovery_active(&self) -> bool {
        self.current_day >= self.recovery_start_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "horizon_days must be positive")]
    fn test_zero_horizon_panics() {
        DayClock::new(0, 1, 5);
    }

    #[test]
    fn test_recovery_window() {
        let mut clock = DayClock::new(10, 1, 3);
        let mut active = Vec::new();
        while !clock.is_finished() {
            active.push(clock.recovery_active());
            clock.advance_day();
        }
        assert_eq!(active.iter().filter(|a| **a).count(), 7);
        assert!(!active[2]);
        assert!(active[3]);
    }
}
