//! Training-load metrics for a planned workout
//!
//! All calculations are pure functions of the [`Workout`] value. Power is
//! expressed in percent of the reference (threshold) power, so an interval at
//! 100% for one hour scores IF 1.0 and TSS 100.
//!
//! Duration-weighted averages are undefined for an empty workout: the
//! calculator returns `NaN` in that case and leaves display guards to callers
//! (see [`WorkoutMetrics::is_defined`]).

use crate::models::Workout;
use serde::{Deserialize, Serialize};

/// Sampling step for Normalized Power, in seconds
pub const SEGMENT_LENGTH: u32 = 10;

/// Threshold power in the percentage convention
pub const REFERENCE_POWER: f64 = 100.0;

/// Snapshot of every derived metric for one workout value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkoutMetrics {
    /// Total duration in seconds
    pub total_duration: u64,

    /// Time-weighted mean power (%)
    pub average_power: f64,

    /// Normalized Power (%)
    pub normalized_power: f64,

    /// Intensity Factor - normalized power over reference power
    pub intensity_factor: f64,

    /// Training Stress Score
    pub training_stress_score: f64,
}

impl WorkoutMetrics {
    /// False when the workout had no duration and the averages are NaN
    pub fn is_defined(&self) -> bool {
        self.average_power.is_finite()
            && self.normalized_power.is_finite()
            && self.intensity_factor.is_finite()
            && self.training_stress_score.is_finite()
    }

    /// `H:MM:SS` rendering of the total duration
    pub fn formatted_duration(&self) -> String {
        format_duration(self.total_duration)
    }
}

/// Core training-load calculation engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingLoadCalculator {
    /// Normalized Power sampling step in seconds
    pub segment_length: u32,

    /// Reference power (%) used for the Intensity Factor
    pub reference_power: f64,
}

impl Default for TrainingLoadCalculator {
    fn default() -> Self {
        TrainingLoadCalculator {
            segment_length: SEGMENT_LENGTH,
            reference_power: REFERENCE_POWER,
        }
    }
}

impl TrainingLoadCalculator {
    pub fn new(segment_length: u32, reference_power: f64) -> Self {
        TrainingLoadCalculator {
            segment_length,
            reference_power,
        }
    }

    /// Sum of interval durations in seconds, widened so long workouts cannot overflow
    pub fn total_duration(&self, workout: &Workout) -> u64 {
        workout.iter().map(|interval| u64::from(interval.duration)).sum()
    }

    /// Duration-weighted mean of each interval's mid-ramp power.
    /// NaN for a workout with zero total duration.
    pub fn average_power(&self, workout: &Workout) -> f64 {
        let weighted: f64 = workout
            .iter()
            .map(|interval| interval.average_power() * f64::from(interval.duration))
            .sum();
        weighted / self.total_duration(workout) as f64
    }

    /// Normalized Power: fourth root of the time-weighted mean of power^4.
    ///
    /// Each interval is cut into `segment_length` slices. A slice contributes
    /// the ramp value at its start offset raised to the fourth power, weighted
    /// by its length; a trailing partial slice is weighted by what remains.
    /// This samples the ramp rather than integrating it, so ramps come out
    /// slightly below the continuous value while steady intervals are exact.
    /// NaN for a workout with zero total duration.
    pub fn normalized_power(&self, workout: &Workout) -> f64 {
        let segment = self.segment_length.max(1);
        let mut weighted_sum = 0.0_f64;
        let mut weight_total = 0.0_f64;

        for interval in workout {
            let full_segments = interval.duration / segment;

            for i in 0..full_segments {
                let power = interval.power_at(f64::from(i * segment));
                weighted_sum += power.powi(4) * f64::from(segment);
                weight_total += f64::from(segment);
            }

            let remaining = interval.duration % segment;
            if remaining > 0 {
                let power = interval.power_at(f64::from(full_segments * segment));
                weighted_sum += power.powi(4) * f64::from(remaining);
                weight_total += f64::from(remaining);
            }
        }

        // sqrt of sqrt keeps the fourth root exact for perfect fourth powers
        (weighted_sum / weight_total).sqrt().sqrt()
    }

    /// IF = NP / reference power
    pub fn intensity_factor(&self, workout: &Workout) -> f64 {
        self.normalized_power(workout) / self.reference_power
    }

    /// TSS = IF² × duration in hours × 100
    pub fn training_stress_score(&self, workout: &Workout) -> f64 {
        let intensity_factor = self.intensity_factor(workout);
        let minutes = self.total_duration(workout) as f64 / 60.0;
        intensity_factor.powi(2) * minutes / 60.0 * 100.0
    }

    /// Total duration as `H:MM:SS`
    pub fn formatted_duration(&self, workout: &Workout) -> String {
        format_duration(self.total_duration(workout))
    }

    /// Compute every metric at once
    pub fn summarize(&self, workout: &Workout) -> WorkoutMetrics {
        let metrics = WorkoutMetrics {
            total_duration: self.total_duration(workout),
            average_power: self.average_power(workout),
            normalized_power: self.normalized_power(workout),
            intensity_factor: self.intensity_factor(workout),
            training_stress_score: self.training_stress_score(workout),
        };
        tracing::debug!(
            intervals = workout.len(),
            duration = metrics.total_duration,
            np = metrics.normalized_power,
            tss = metrics.training_stress_score,
            "workout metrics computed"
        );
        metrics
    }
}

/// Hours unpadded, minutes and seconds padded to two digits
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Interval, ShapeLimits};

    fn interval(start: u16, end: u16, duration: u32) -> Interval {
        Interval::with_shape(start, end, duration, &ShapeLimits::default())
    }

    fn workout(intervals: &[Interval]) -> Workout {
        intervals.iter().copied().collect()
    }

    #[test]
    fn test_single_steady_interval() {
        let calc = TrainingLoadCalculator::default();
        let w = workout(&[interval(100, 100, 300)]);

        assert_eq!(calc.total_duration(&w), 300);
        assert_eq!(calc.average_power(&w), 100.0);
        assert_eq!(calc.normalized_power(&w), 100.0);
        assert_eq!(calc.intensity_factor(&w), 1.0);

        let tss = calc.training_stress_score(&w);
        assert!((tss - 8.333_333).abs() < 1e-5, "tss = {}", tss);
        assert_eq!(calc.formatted_duration(&w), "0:05:00");
    }

    #[test]
    fn test_one_hour_at_threshold_scores_100() {
        let calc = TrainingLoadCalculator::default();
        let w = workout(&[interval(100, 100, 3600)]);
        assert!((calc.training_stress_score(&w) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_power_is_time_weighted() {
        let calc = TrainingLoadCalculator::default();
        let w = workout(&[interval(100, 100, 60), interval(50, 150, 180), interval(200, 200, 60)]);
        // (100*60 + 100*180 + 200*60) / 300
        assert_eq!(calc.average_power(&w), 120.0);
    }

    #[test]
    fn test_normalized_power_samples_ramp_at_segment_starts() {
        let calc = TrainingLoadCalculator::default();

        // samples at offsets 0 and 10 -> 100% and 150%
        let w = workout(&[interval(100, 200, 20)]);
        assert!((calc.normalized_power(&w) - 131.948_798_2).abs() < 1e-6);

        // partial trailing segment of 5s sampled at offset 10
        let w = workout(&[interval(100, 200, 15)]);
        assert!((calc.normalized_power(&w) - 134.150_444_1).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_power_rewards_variability() {
        let calc = TrainingLoadCalculator::default();
        let w = workout(&[interval(50, 50, 600), interval(150, 150, 600)]);
        assert_eq!(calc.average_power(&w), 100.0);
        assert!(calc.normalized_power(&w) > 100.0);
    }

    #[test]
    fn test_partial_segment_of_steady_interval_is_exact() {
        let calc = TrainingLoadCalculator::default();
        let w = workout(&[interval(87, 87, 25)]);
        assert_eq!(calc.normalized_power(&w), 87.0);
    }

    #[test]
    fn test_empty_workout_is_nan() {
        let calc = TrainingLoadCalculator::default();
        let w = Workout::new();

        assert_eq!(calc.total_duration(&w), 0);
        assert!(calc.average_power(&w).is_nan());
        assert!(calc.normalized_power(&w).is_nan());
        assert!(calc.intensity_factor(&w).is_nan());
        assert!(calc.training_stress_score(&w).is_nan());
        assert!(!calc.summarize(&w).is_defined());
        assert_eq!(calc.formatted_duration(&w), "0:00:00");
    }

    #[test]
    fn test_reference_power_scales_intensity() {
        let calc = TrainingLoadCalculator::new(10, 80.0);
        let w = workout(&[interval(100, 100, 3600)]);
        assert_eq!(calc.intensity_factor(&w), 1.25);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00:00");
        assert_eq!(format_duration(59), "0:00:59");
        assert_eq!(format_duration(3725), "1:02:05");
        assert_eq!(format_duration(36000), "10:00:00");
    }

    #[test]
    fn test_total_duration_does_not_overflow() {
        let calc = TrainingLoadCalculator::default();
        let w = workout(&[interval(100, 100, 3_000_000_000), interval(100, 100, 3_000_000_000)]);

        assert_eq!(calc.total_duration(&w), 6_000_000_000);
        assert_eq!(calc.formatted_duration(&w), "1666666:40:00");
        assert_eq!(calc.average_power(&w), 100.0);
    }

    #[test]
    fn test_summarize_matches_individual_metrics() {
        let calc = TrainingLoadCalculator::default();
        let w = workout(&[interval(60, 120, 600), interval(120, 120, 300)]);
        let metrics = calc.summarize(&w);

        assert!(metrics.is_defined());
        assert_eq!(metrics.total_duration, 900);
        assert_eq!(metrics.normalized_power, calc.normalized_power(&w));
        assert_eq!(metrics.training_stress_score, calc.training_stress_score(&w));
        assert_eq!(metrics.formatted_duration(), "0:15:00");
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_constant_interval_np_is_exact(
            power in 6u16..=200u16,
            duration in 9u32..20_000u32,
        ) {
            let calc = TrainingLoadCalculator::default();
            let w = workout(&[interval(power, power, duration)]);
            prop_assert_eq!(calc.normalized_power(&w), f64::from(power));
        }

        #[test]
        fn test_np_bounded_by_extremes(
            start in 6u16..=200u16,
            end in 6u16..=200u16,
            duration in 9u32..7200u32,
        ) {
            let calc = TrainingLoadCalculator::default();
            let w = workout(&[interval(start, end, duration)]);
            let np = calc.normalized_power(&w);
            let lo = f64::from(start.min(end));
            let hi = f64::from(start.max(end));
            prop_assert!(np >= lo - 1e-9 && np <= hi + 1e-9);
        }
    }
}
