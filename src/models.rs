use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Size of an edit handle in screen units; the shape minimums derive from it
pub const HANDLE_SIZE: u16 = 3;

/// Lowest power percentage an interval may hold
pub const MIN_POWER: u16 = HANDLE_SIZE * 2;

/// Highest power percentage an interval may hold
pub const MAX_POWER: u16 = 200;

/// Shortest interval duration in seconds
pub const MIN_DURATION: u32 = HANDLE_SIZE as u32 * 3;

/// Power assigned to freshly created intervals (% of reference power)
pub const DEFAULT_POWER: u16 = 100;

/// Duration assigned to freshly created intervals (seconds)
pub const DEFAULT_DURATION: u32 = 5 * 60;

/// Opaque interval identifier, unique for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalId(Uuid);

impl IntervalId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        IntervalId(Uuid::new_v4())
    }
}

impl Default for IntervalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Domain bounds every interval shape is clamped into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeLimits {
    /// Inclusive lower bound for start/end power
    pub min_power: u16,

    /// Inclusive upper bound for start/end power
    pub max_power: u16,

    /// Inclusive lower bound for duration; there is no upper bound
    pub min_duration: u32,
}

impl ShapeLimits {
    /// Derive limits from the handle size the way the editor lays out its handles
    pub fn from_handle_size(handle_size: u16, max_power: u16) -> Self {
        ShapeLimits {
            min_power: handle_size.saturating_mul(2),
            max_power,
            min_duration: u32::from(handle_size) * 3,
        }
    }

    pub fn clamp_power(&self, power: i64) -> u16 {
        power.max(i64::from(self.min_power)).min(i64::from(self.max_power)) as u16
    }

    pub fn clamp_duration(&self, duration: i64) -> u32 {
        duration.max(i64::from(self.min_duration)).min(i64::from(u32::MAX)) as u32
    }

    pub fn clamp_shape(&self, shape: IntervalShape) -> IntervalShape {
        IntervalShape {
            start_power: self.clamp_power(i64::from(shape.start_power)),
            end_power: self.clamp_power(i64::from(shape.end_power)),
            duration: self.clamp_duration(i64::from(shape.duration)),
        }
    }

    /// Check whether a shape already satisfies the bounds
    pub fn contains(&self, shape: &IntervalShape) -> bool {
        let power_ok = |p: u16| p >= self.min_power && p <= self.max_power;
        power_ok(shape.start_power) && power_ok(shape.end_power) && shape.duration >= self.min_duration
    }
}

impl Default for ShapeLimits {
    fn default() -> Self {
        ShapeLimits {
            min_power: MIN_POWER,
            max_power: MAX_POWER,
            min_duration: MIN_DURATION,
        }
    }
}

/// The mutable part of an interval: everything except its identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalShape {
    /// Power at the start of the interval (% of reference power)
    pub start_power: u16,

    /// Power at the end of the interval (% of reference power)
    pub end_power: u16,

    /// Duration in seconds
    pub duration: u32,
}

impl Default for IntervalShape {
    fn default() -> Self {
        IntervalShape {
            start_power: DEFAULT_POWER,
            end_power: DEFAULT_POWER,
            duration: DEFAULT_DURATION,
        }
    }
}

/// One continuous power segment of a workout, ramping linearly from
/// `start_power` to `end_power` over `duration` seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// Stable identifier, assigned at creation and never reused
    pub id: IntervalId,

    /// Power at the start of the interval (% of reference power)
    pub start_power: u16,

    /// Power at the end of the interval (% of reference power)
    pub end_power: u16,

    /// Duration in seconds
    pub duration: u32,
}

impl Interval {
    /// Create a default 5 minute steady interval at 100% with a fresh id
    pub fn new() -> Self {
        Self::from_shape(IntervalShape::default())
    }

    /// Create an interval with a fresh id, clamping the shape into `limits`
    pub fn with_shape(start_power: u16, end_power: u16, duration: u32, limits: &ShapeLimits) -> Self {
        Self::from_shape(limits.clamp_shape(IntervalShape {
            start_power,
            end_power,
            duration,
        }))
    }

    fn from_shape(shape: IntervalShape) -> Self {
        Interval {
            id: IntervalId::new(),
            start_power: shape.start_power,
            end_power: shape.end_power,
            duration: shape.duration,
        }
    }

    pub fn shape(&self) -> IntervalShape {
        IntervalShape {
            start_power: self.start_power,
            end_power: self.end_power,
            duration: self.duration,
        }
    }

    /// Same identity, new shape
    pub fn reshaped(&self, shape: IntervalShape) -> Self {
        Interval {
            id: self.id,
            start_power: shape.start_power,
            end_power: shape.end_power,
            duration: shape.duration,
        }
    }

    /// Deep copy under a fresh identifier
    pub fn duplicate(&self) -> Self {
        Interval {
            id: IntervalId::new(),
            ..*self
        }
    }

    pub fn is_steady(&self) -> bool {
        self.start_power == self.end_power
    }

    /// Mean power of the linear ramp
    pub fn average_power(&self) -> f64 {
        (f64::from(self.start_power) + f64::from(self.end_power)) / 2.0
    }

    /// Instantaneous power `offset` seconds into the interval
    pub fn power_at(&self, offset: f64) -> f64 {
        let slope = (f64::from(self.end_power) - f64::from(self.start_power)) / f64::from(self.duration);
        slope * offset + f64::from(self.start_power)
    }

    /// Short caption such as `05:00 100%` or `10:30 80% 120%`
    pub fn label(&self) -> String {
        let mins = self.duration / 60;
        let secs = self.duration % 60;
        if self.is_steady() {
            format!("{:02}:{:02} {}%", mins, secs, self.start_power)
        } else {
            format!("{:02}:{:02} {}% {}%", mins, secs, self.start_power, self.end_power)
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordered collection of intervals making up one session.
///
/// Order is elapsed-time order. Every structural operation returns a new
/// `Workout` value and leaves `self` untouched, so holders can compare the
/// old and new value to detect change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    intervals: Vec<Interval>,
}

impl Workout {
    pub fn new() -> Self {
        Workout { intervals: Vec::new() }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn get(&self, id: IntervalId) -> Option<&Interval> {
        self.intervals.iter().find(|interval| interval.id == id)
    }

    pub fn position(&self, id: IntervalId) -> Option<usize> {
        self.intervals.iter().position(|interval| interval.id == id)
    }

    pub fn contains(&self, id: IntervalId) -> bool {
        self.position(id).is_some()
    }

    /// Append at the end
    pub fn append(&self, interval: Interval) -> Workout {
        self.insert_at(self.intervals.len(), interval)
    }

    /// Insert `interval` right after the entry with id `anchor`.
    ///
    /// A missing or unknown anchor inserts at the front.
    pub fn insert_after(&self, anchor: Option<IntervalId>, interval: Interval) -> Workout {
        let index = anchor
            .and_then(|id| self.position(id))
            .map_or(0, |position| position + 1);
        self.insert_at(index, interval)
    }

    fn insert_at(&self, index: usize, interval: Interval) -> Workout {
        if self.contains(interval.id) {
            tracing::warn!(id = %interval.id, "interval already present, insert ignored");
            return self.clone();
        }

        let mut intervals = self.intervals.clone();
        intervals.insert(index, interval);
        tracing::debug!(id = %interval.id, index, "interval inserted");
        Workout { intervals }
    }

    /// Copy the interval `id` under a fresh id and place the copy right after it.
    ///
    /// Returns the unchanged workout and `None` when `id` is unknown.
    pub fn duplicate(&self, id: IntervalId) -> (Workout, Option<IntervalId>) {
        let Some(position) = self.position(id) else {
            tracing::warn!(%id, "duplicate of unknown interval ignored");
            return (self.clone(), None);
        };

        let copy = self.intervals[position].duplicate();
        let mut intervals = self.intervals.clone();
        intervals.insert(position + 1, copy);
        tracing::debug!(source = %id, copy = %copy.id, "interval duplicated");
        (Workout { intervals }, Some(copy.id))
    }

    /// Remove the interval `id`.
    ///
    /// The second value is the id of the entry that preceded the removed one,
    /// which callers use as the next selection. It is `None` when the removed
    /// entry was first or `id` was not found.
    pub fn remove(&self, id: IntervalId) -> (Workout, Option<IntervalId>) {
        let Some(position) = self.position(id) else {
            tracing::warn!(%id, "removal of unknown interval ignored");
            return (self.clone(), None);
        };

        let fallback = position.checked_sub(1).map(|prev| self.intervals[prev].id);
        let mut intervals = self.intervals.clone();
        intervals.remove(position);
        tracing::debug!(%id, "interval removed");
        (Workout { intervals }, fallback)
    }

    /// Move the entry at `from` to `to`, shifting the entries in between.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range. Reorders come from the list UI
    /// which only hands out valid positions.
    pub fn reorder(&self, from: usize, to: usize) -> Workout {
        let len = self.intervals.len();
        assert!(from < len, "reorder source index {} out of range for {} intervals", from, len);
        assert!(to < len, "reorder destination index {} out of range for {} intervals", to, len);

        let mut intervals = self.intervals.clone();
        let moved = intervals.remove(from);
        intervals.insert(to, moved);
        tracing::debug!(from, to, "interval reordered");
        Workout { intervals }
    }

    /// Replace the entry `id` with `value`, keeping its position and its id.
    /// Unknown ids leave the workout unchanged.
    pub fn replace(&self, id: IntervalId, value: Interval) -> Workout {
        let Some(position) = self.position(id) else {
            tracing::warn!(%id, "replace of unknown interval ignored");
            return self.clone();
        };

        let mut intervals = self.intervals.clone();
        intervals[position] = Interval { id, ..value };
        Workout { intervals }
    }
}

impl<'a> IntoIterator for &'a Workout {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

impl FromIterator<Interval> for Workout {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        iter.into_iter().fold(Workout::new(), |workout, interval| workout.append(interval))
    }
}
