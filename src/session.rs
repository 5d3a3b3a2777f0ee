//! The owning editing session.
//!
//! [`EditorSession`] holds the workout, the selection and the zoom factor,
//! routes pointer events to the edit controller of the interval being
//! dragged and publishes every change back into the workout. Metric
//! recomputation after drag edits is deferred by a trailing-edge
//! [`RecomputeDebouncer`]; structural changes recompute straight away.
//!
//! Time is injected as milliseconds on every call, so the session never
//! reads a clock of its own.

use std::path::Path;

use crate::config::AppConfig;
use crate::editor::velocity::VelocityTracker;
use crate::editor::{DragTuning, Handle, IntervalEditor};
use crate::error::{IntervalRsError, Result};
use crate::export::{export_mrc, export_to_path, CourseHeader, ExportOptions};
use crate::metrics::{TrainingLoadCalculator, WorkoutMetrics};
use crate::models::{Interval, IntervalId, IntervalShape, ShapeLimits, Workout};

/// Trailing-edge debounce: every notification pushes the deadline out again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeDebouncer {
    delay_ms: u64,
    deadline: Option<u64>,
}

impl RecomputeDebouncer {
    pub fn new(delay_ms: u64) -> Self {
        RecomputeDebouncer {
            delay_ms,
            deadline: None,
        }
    }

    /// Cancel any pending deadline and schedule a new one
    pub fn notify(&mut self, now_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(self.delay_ms));
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True exactly once per burst, when the quiet period has elapsed
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Single-threaded editing session over one workout
#[derive(Debug, Clone)]
pub struct EditorSession {
    workout: Workout,
    selected: Option<IntervalId>,
    zoom: f64,
    limits: ShapeLimits,
    default_shape: IntervalShape,
    tuning: DragTuning,
    calculator: TrainingLoadCalculator,
    header: CourseHeader,
    velocity: VelocityTracker,
    active: Option<IntervalEditor>,
    debouncer: RecomputeDebouncer,
    metrics: WorkoutMetrics,
}

impl EditorSession {
    /// Empty session configured from `config`
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_workout(config, Workout::new())
    }

    /// Session editing an existing workout, e.g. one read from a course file
    pub fn with_workout(config: &AppConfig, workout: Workout) -> Result<Self> {
        config
            .validate()
            .map_err(|err| IntervalRsError::Configuration(err.to_string()))?;

        let calculator = config.metrics.calculator();
        let metrics = calculator.summarize(&workout);

        let mut session = EditorSession {
            workout,
            selected: None,
            zoom: 1.0,
            limits: config.editor.limits(),
            default_shape: config.editor.default_shape(),
            tuning: config.drag.tuning(),
            calculator,
            header: config.export.header(),
            velocity: VelocityTracker::new(config.drag.sample_interval_ms),
            active: None,
            debouncer: RecomputeDebouncer::new(config.drag.debounce_ms),
            metrics,
        };
        session.set_zoom(config.editor.zoom)?;
        Ok(session)
    }

    pub fn workout(&self) -> &Workout {
        &self.workout
    }

    pub fn limits(&self) -> ShapeLimits {
        self.limits
    }

    pub fn selected(&self) -> Option<IntervalId> {
        self.selected
    }

    /// Select `id` if it is part of the workout
    pub fn select(&mut self, id: IntervalId) -> bool {
        if self.workout.contains(id) {
            self.selected = Some(id);
            true
        } else {
            tracing::warn!(%id, "selection of unknown interval ignored");
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Horizontal scale applied to width drags; must be positive and finite
    pub fn set_zoom(&mut self, zoom: f64) -> Result<()> {
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(IntervalRsError::Validation(format!(
                "zoom must be a positive number, got {}",
                zoom
            )));
        }
        self.zoom = zoom;
        Ok(())
    }

    pub fn header(&self) -> &CourseHeader {
        &self.header
    }

    pub fn set_header(&mut self, header: CourseHeader) {
        self.header = header;
    }

    /// Create an interval with the default shape right after the selection
    /// (at the front when nothing is selected) and select it
    pub fn add_interval(&mut self) -> IntervalId {
        let shape = self.default_shape;
        let interval = Interval::with_shape(shape.start_power, shape.end_power, shape.duration, &self.limits);

        self.workout = self.workout.insert_after(self.selected, interval);
        self.selected = Some(interval.id);
        self.recompute_now();
        interval.id
    }

    /// Insert an already shaped interval after the selection and select it
    pub fn insert_interval(&mut self, interval: Interval) -> IntervalId {
        let interval = interval.reshaped(self.limits.clamp_shape(interval.shape()));
        self.workout = self.workout.insert_after(self.selected, interval);
        if self.workout.contains(interval.id) {
            self.selected = Some(interval.id);
        }
        self.recompute_now();
        interval.id
    }

    /// Duplicate the selected interval and select the copy
    pub fn duplicate_selected(&mut self) -> Option<IntervalId> {
        let id = self.selected?;
        let (workout, copy) = self.workout.duplicate(id);
        self.workout = workout;
        if copy.is_some() {
            self.selected = copy;
            self.recompute_now();
        }
        copy
    }

    /// Delete the selected interval; the preceding interval becomes selected.
    /// Returns the id that was removed.
    pub fn delete_selected(&mut self) -> Option<IntervalId> {
        let id = self.selected?;
        if !self.workout.contains(id) {
            self.selected = None;
            return None;
        }

        if self.active.as_ref().map(|editor| editor.current_value().id) == Some(id) {
            self.active = None;
        }

        let (workout, fallback) = self.workout.remove(id);
        self.workout = workout;
        self.selected = fallback;
        self.recompute_now();
        Some(id)
    }

    /// Move the interval at `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    pub fn reorder(&mut self, from: usize, to: usize) {
        self.workout = self.workout.reorder(from, to);
        self.recompute_now();
    }

    /// Start dragging `handle` of interval `id`. Any drag already in progress
    /// is released first. Returns false when `id` is unknown.
    pub fn grab(&mut self, id: IntervalId, handle: Handle, x: f64, y: f64, now_ms: u64) -> bool {
        self.release();

        let Some(interval) = self.workout.get(id).copied() else {
            tracing::warn!(%id, "grab on unknown interval ignored");
            return false;
        };

        self.velocity.record(x, y, now_ms);
        let mut editor = IntervalEditor::new(interval, self.limits, self.tuning);
        editor.on_grab(handle, x, y);
        self.active = Some(editor);
        self.selected = Some(id);
        true
    }

    /// Feed a pointer position. The velocity tracker sees every move, drag or
    /// not. While dragging, a changed shape is published into the workout and
    /// schedules a debounced metric recompute.
    pub fn pointer_move(&mut self, x: f64, y: f64, now_ms: u64) -> Option<Interval> {
        self.velocity.record(x, y, now_ms);

        let editor = self.active.as_mut()?;
        let updated = editor.on_move(x, y, self.zoom, &self.velocity)?;

        self.workout = self.workout.replace(updated.id, updated);
        self.debouncer.notify(now_ms);
        Some(updated)
    }

    /// End the current drag, if any. Applied changes stay.
    pub fn release(&mut self) {
        if let Some(mut editor) = self.active.take() {
            editor.on_release();
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Let the debounce timer fire. Returns true when metrics were recomputed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if self.debouncer.poll(now_ms) {
            self.metrics = self.calculator.summarize(&self.workout);
            true
        } else {
            false
        }
    }

    pub fn has_pending_recompute(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Last computed metrics. May trail the workout while a recompute is pending.
    pub fn metrics(&self) -> WorkoutMetrics {
        self.metrics
    }

    /// Render the workout as a course file
    pub fn export(&self) -> String {
        export_mrc(&self.workout, &self.header)
    }

    pub fn export_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let options = ExportOptions {
            header: self.header.clone(),
            ..ExportOptions::default()
        };
        export_to_path(&self.workout, &options, path)?;
        Ok(())
    }

    fn recompute_now(&mut self) {
        self.debouncer.cancel();
        self.metrics = self.calculator.summarize(&self.workout);
    }
}
