//! Coarse pointer speed estimation.
//!
//! Speed is the pointer displacement between two samples taken at least
//! `sample_interval_ms` apart. It is a per-tick delta rather than a true
//! rate over elapsed time, which is all the damping decision needs.

use serde::{Deserialize, Serialize};

/// Minimum spacing between speed samples
pub const SAMPLE_INTERVAL_MS: u64 = 100;

/// Pointer speed tracker shared by every edit controller in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityTracker {
    sample_interval_ms: u64,
    current: (f64, f64),
    sampled: (f64, f64),
    speed: (f64, f64),
    last_sample_ms: Option<u64>,
}

impl VelocityTracker {
    pub fn new(sample_interval_ms: u64) -> Self {
        VelocityTracker {
            sample_interval_ms,
            current: (0.0, 0.0),
            sampled: (0.0, 0.0),
            speed: (0.0, 0.0),
            last_sample_ms: None,
        }
    }

    /// Feed a pointer position. Every position is remembered, but the speed
    /// only moves once more than `sample_interval_ms` has passed since the
    /// previous sample. The very first sample sets the baseline.
    pub fn record(&mut self, x: f64, y: f64, timestamp_ms: u64) {
        self.current = (x, y);

        match self.last_sample_ms {
            None => {
                self.sampled = self.current;
                self.last_sample_ms = Some(timestamp_ms);
            }
            Some(last) if timestamp_ms.saturating_sub(last) > self.sample_interval_ms => {
                self.speed = (self.current.0 - self.sampled.0, self.current.1 - self.sampled.1);
                self.sampled = self.current;
                self.last_sample_ms = Some(timestamp_ms);
            }
            Some(_) => {}
        }
    }

    /// Signed horizontal displacement of the last sample
    pub fn delta_x(&self) -> f64 {
        self.speed.0
    }

    /// Signed vertical displacement of the last sample
    pub fn delta_y(&self) -> f64 {
        self.speed.1
    }

    pub fn speed_x(&self) -> f64 {
        self.speed.0.abs()
    }

    pub fn speed_y(&self) -> f64 {
        self.speed.1.abs()
    }
}

impl Default for VelocityTracker {
    fn default() -> Self {
        Self::new(SAMPLE_INTERVAL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_is_baseline() {
        let mut tracker = VelocityTracker::default();
        tracker.record(400.0, 300.0, 1_000);
        assert_eq!(tracker.speed_x(), 0.0);
        assert_eq!(tracker.speed_y(), 0.0);
    }

    #[test]
    fn test_samples_respect_interval() {
        let mut tracker = VelocityTracker::default();
        tracker.record(0.0, 0.0, 0);

        // too soon: position remembered, speed untouched
        tracker.record(30.0, -10.0, 50);
        assert_eq!(tracker.speed_x(), 0.0);

        // exactly 100ms is still too soon
        tracker.record(40.0, -10.0, 100);
        assert_eq!(tracker.speed_x(), 0.0);

        tracker.record(50.0, -20.0, 101);
        assert_eq!(tracker.delta_x(), 50.0);
        assert_eq!(tracker.delta_y(), -20.0);
        assert_eq!(tracker.speed_y(), 20.0);

        // next sample measures from the previous sample, not from the start
        tracker.record(52.0, -20.0, 250);
        assert_eq!(tracker.speed_x(), 2.0);
        assert_eq!(tracker.speed_y(), 0.0);
    }
}
