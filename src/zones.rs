//! Power zone classification
//!
//! Seven bands over the reference-power percentage. Each band is closed at its
//! upper bound: 54% is still Recovery, 55% is Endurance.

use crate::metrics::SEGMENT_LENGTH;
use crate::models::Workout;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Training zones for planned power
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PowerZone {
    Recovery,
    Endurance,
    Tempo,
    SweetSpot,
    Threshold,
    VO2Max,
    Anaerobic,
}

impl PowerZone {
    pub const ALL: [PowerZone; 7] = [
        PowerZone::Recovery,
        PowerZone::Endurance,
        PowerZone::Tempo,
        PowerZone::SweetSpot,
        PowerZone::Threshold,
        PowerZone::VO2Max,
        PowerZone::Anaerobic,
    ];

    /// Inclusive upper bound in percent; `None` for the open-ended top zone
    pub fn upper_bound(&self) -> Option<f64> {
        match self {
            PowerZone::Recovery => Some(54.0),
            PowerZone::Endurance => Some(75.0),
            PowerZone::Tempo => Some(87.0),
            PowerZone::SweetSpot => Some(94.0),
            PowerZone::Threshold => Some(105.0),
            PowerZone::VO2Max => Some(120.0),
            PowerZone::Anaerobic => None,
        }
    }

    /// 1-based zone number
    pub fn number(&self) -> u8 {
        self.index() as u8 + 1
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|zone| zone == self).unwrap_or(Self::ALL.len() - 1)
    }

    /// Display color as a hex string
    pub fn color(&self) -> &'static str {
        match self {
            PowerZone::Recovery => "#808080",
            PowerZone::Endurance => "#006fff",
            PowerZone::Tempo => "#36bf00",
            PowerZone::SweetSpot => "#e6bf00",
            PowerZone::Threshold => "#e67300",
            PowerZone::VO2Max => "#e60b0b",
            PowerZone::Anaerobic => "#530066",
        }
    }

    /// Display color as RGB components
    pub fn rgb(&self) -> (u8, u8, u8) {
        let hex = &self.color()[1..];
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }

    /// Zone containing `percent`
    pub fn classify(percent: f64) -> PowerZone {
        Self::ALL
            .iter()
            .copied()
            .find(|zone| zone.upper_bound().map_or(true, |max| percent <= max))
            .unwrap_or(PowerZone::Anaerobic)
    }

    /// Every zone a ramp from `start` to `end` passes through, in ramp order.
    /// Descending ramps list zones from high to low.
    pub fn spanned(start: u16, end: u16) -> Vec<PowerZone> {
        let from = Self::classify(f64::from(start)).index();
        let to = Self::classify(f64::from(end)).index();

        if from <= to {
            Self::ALL[from..=to].to_vec()
        } else {
            Self::ALL[to..=from].iter().rev().copied().collect()
        }
    }
}

impl fmt::Display for PowerZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerZone::Recovery => write!(f, "Recovery"),
            PowerZone::Endurance => write!(f, "Endurance"),
            PowerZone::Tempo => write!(f, "Tempo"),
            PowerZone::SweetSpot => write!(f, "Sweet Spot"),
            PowerZone::Threshold => write!(f, "Threshold"),
            PowerZone::VO2Max => write!(f, "VO2 Max"),
            PowerZone::Anaerobic => write!(f, "Anaerobic"),
        }
    }
}

/// Seconds spent in each zone.
///
/// Ramps are sampled the same way Normalized Power samples them: every
/// `SEGMENT_LENGTH` slice is attributed to the zone of the ramp value at its
/// start.
pub fn time_in_zones(workout: &Workout) -> BTreeMap<PowerZone, u64> {
    let mut seconds: BTreeMap<PowerZone, u64> = BTreeMap::new();

    for interval in workout {
        if interval.is_steady() {
            *seconds.entry(PowerZone::classify(f64::from(interval.start_power))).or_default() += u64::from(interval.duration);
            continue;
        }

        let mut offset = 0;
        while offset < interval.duration {
            let slice = SEGMENT_LENGTH.min(interval.duration - offset);
            let zone = PowerZone::classify(interval.power_at(f64::from(offset)));
            *seconds.entry(zone).or_default() += u64::from(slice);
            offset += slice;
        }
    }

    seconds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Interval, ShapeLimits};

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(PowerZone::classify(54.0), PowerZone::Recovery);
        assert_eq!(PowerZone::classify(55.0), PowerZone::Endurance);
        assert_eq!(PowerZone::classify(75.0), PowerZone::Endurance);
        assert_eq!(PowerZone::classify(88.0), PowerZone::SweetSpot);
        assert_eq!(PowerZone::classify(100.0), PowerZone::Threshold);
        assert_eq!(PowerZone::classify(120.0), PowerZone::VO2Max);
        assert_eq!(PowerZone::classify(121.0), PowerZone::Anaerobic);
        assert_eq!(PowerZone::classify(1000.0), PowerZone::Anaerobic);
    }

    #[test]
    fn test_spanned_ascending_and_descending() {
        assert_eq!(PowerZone::spanned(100, 100), vec![PowerZone::Threshold]);
        assert_eq!(
            PowerZone::spanned(80, 110),
            vec![PowerZone::Tempo, PowerZone::SweetSpot, PowerZone::Threshold, PowerZone::VO2Max]
        );
        assert_eq!(
            PowerZone::spanned(110, 80),
            vec![PowerZone::VO2Max, PowerZone::Threshold, PowerZone::SweetSpot, PowerZone::Tempo]
        );
    }

    #[test]
    fn test_zone_numbers_and_colors() {
        assert_eq!(PowerZone::Recovery.number(), 1);
        assert_eq!(PowerZone::Anaerobic.number(), 7);
        assert_eq!(PowerZone::Endurance.rgb(), (0x00, 0x6f, 0xff));
        assert_eq!(PowerZone::SweetSpot.to_string(), "Sweet Spot");
    }

    #[test]
    fn test_time_in_zones() {
        let limits = ShapeLimits::default();
        let workout: Workout = vec![
            Interval::with_shape(50, 50, 600, &limits),
            Interval::with_shape(100, 100, 300, &limits),
            Interval::with_shape(50, 100, 15, &limits),
        ]
        .into_iter()
        .collect();

        let zones = time_in_zones(&workout);
        // slice at offset 10 is 50 + 50/15*10 = 83.3% -> Tempo
        assert_eq!(zones.get(&PowerZone::Recovery), Some(&610));
        assert_eq!(zones.get(&PowerZone::Tempo), Some(&5));
        assert_eq!(zones.get(&PowerZone::Threshold), Some(&300));
        assert_eq!(zones.values().sum::<u64>(), 915);
    }

    #[test]
    fn test_time_in_zones_long_workout() {
        let limits = ShapeLimits::default();
        let workout: Workout = vec![
            Interval::with_shape(100, 100, 3_000_000_000, &limits),
            Interval::with_shape(100, 100, 3_000_000_000, &limits),
        ]
        .into_iter()
        .collect();

        let zones = time_in_zones(&workout);
        assert_eq!(zones.get(&PowerZone::Threshold), Some(&6_000_000_000));
    }
}
