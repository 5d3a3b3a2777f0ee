//! Direct-manipulation editing of a single interval.
//!
//! An [`IntervalEditor`] owns a working copy of one interval and turns a
//! stream of pointer positions into shape changes. Four handles exist: the
//! width handle changes the duration, the start and end handles change one
//! power each, and the top handle moves both powers together.
//!
//! Deltas are accumulated against the shape the drag started from, so a
//! value pinned at a bound stays pinned until the pointer has travelled back
//! past the point where it hit the bound. Slow pointer movement is divided by
//! a damping factor, giving finer control than one unit per pixel.

use crate::models::{Interval, IntervalShape, ShapeLimits};
use serde::{Deserialize, Serialize};

pub mod velocity;

pub use velocity::VelocityTracker;

/// Which power(s) a height handle moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerSide {
    Start,
    End,
    Both,
}

/// The handle a drag was started on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    /// Horizontal drag on the right edge, changes the duration
    Width,
    /// Vertical drag on a power handle
    Power(PowerSide),
}

/// Velocity damping parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DragTuning {
    /// Below this per-sample speed a drag counts as slow
    pub speed_threshold: f64,

    /// Divisor for slow height drags
    pub height_damping: f64,

    /// Divisor for slow width drags; zoom factors above 1 are added to it
    pub width_damping: f64,
}

impl Default for DragTuning {
    fn default() -> Self {
        DragTuning {
            speed_threshold: 5.0,
            height_damping: 5.0,
            width_damping: 5.0,
        }
    }
}

impl DragTuning {
    /// Zoom only adds to the divisor above 1: at zoom 1.0 slow width drags divide by 5, not 6.
    fn width_divisor(&self, zoom: f64) -> f64 {
        if zoom > 1.0 {
            zoom + self.width_damping
        } else {
            self.width_damping
        }
    }
}

/// Per-drag state, present only between grab and release
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    handle: Handle,
    origin: IntervalShape,
    last_x: f64,
    last_y: f64,
    applied_delta: f64,
}

/// Round half up, so -0.5 goes to 0 and 0.5 goes to 1
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Edit controller for one interval
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalEditor {
    interval: Interval,
    limits: ShapeLimits,
    tuning: DragTuning,
    drag: Option<DragState>,
}

impl IntervalEditor {
    pub fn new(interval: Interval, limits: ShapeLimits, tuning: DragTuning) -> Self {
        IntervalEditor {
            interval,
            limits,
            tuning,
            drag: None,
        }
    }

    /// The full interval as currently shaped
    pub fn current_value(&self) -> Interval {
        self.interval
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn active_handle(&self) -> Option<Handle> {
        self.drag.map(|drag| drag.handle)
    }

    /// Start dragging `handle` from pointer position `(x, y)`
    pub fn on_grab(&mut self, handle: Handle, x: f64, y: f64) {
        self.drag = Some(DragState {
            handle,
            origin: self.interval.shape(),
            last_x: x,
            last_y: y,
            applied_delta: 0.0,
        });
        tracing::debug!(id = %self.interval.id, ?handle, "drag started");
    }

    /// Process one pointer move.
    ///
    /// `zoom` scales horizontal movement for the width handle and `velocity`
    /// must already include this move. Returns the updated interval when the
    /// shape changed, `None` when idle or when the move did not change it.
    pub fn on_move(&mut self, x: f64, y: f64, zoom: f64, velocity: &VelocityTracker) -> Option<Interval> {
        let tuning = self.tuning;
        let limits = self.limits;
        let drag = self.drag.as_mut()?;

        let (dx, dy) = (x - drag.last_x, y - drag.last_y);
        drag.last_x = x;
        drag.last_y = y;

        let origin = drag.origin;
        let shape = match drag.handle {
            Handle::Width => {
                let mut partial = dx * zoom;
                if velocity.speed_x() < tuning.speed_threshold {
                    partial /= tuning.width_divisor(zoom);
                }
                drag.applied_delta += partial;
                let applied = round_half_up(drag.applied_delta);

                IntervalShape {
                    duration: limits.clamp_duration(i64::from(origin.duration).saturating_add(applied)),
                    ..self.interval.shape()
                }
            }
            Handle::Power(side) => {
                let mut partial = dy;
                if velocity.speed_y() < tuning.speed_threshold {
                    partial /= tuning.height_damping;
                }
                drag.applied_delta += partial;
                let applied = round_half_up(drag.applied_delta);

                // screen y grows downwards, power grows upwards
                let shifted = |power: u16| limits.clamp_power(i64::from(power).saturating_sub(applied));
                let current = self.interval.shape();
                match side {
                    PowerSide::Start => IntervalShape {
                        start_power: shifted(origin.start_power),
                        ..current
                    },
                    PowerSide::End => IntervalShape {
                        end_power: shifted(origin.end_power),
                        ..current
                    },
                    PowerSide::Both => IntervalShape {
                        start_power: shifted(origin.start_power),
                        end_power: shifted(origin.end_power),
                        ..current
                    },
                }
            }
        };

        tracing::trace!(
            id = %self.interval.id,
            dx,
            dy,
            applied_delta = drag.applied_delta,
            "drag move"
        );

        if shape == self.interval.shape() {
            return None;
        }

        self.interval = self.interval.reshaped(shape);
        Some(self.interval)
    }

    /// End the drag. Applied changes are kept.
    pub fn on_release(&mut self) {
        if self.drag.take().is_some() {
            tracing::debug!(id = %self.interval.id, shape = ?self.interval.shape(), "drag released");
        }
    }
}
