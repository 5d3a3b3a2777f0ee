use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use intervalrs::editor::velocity::VelocityTracker;
use intervalrs::editor::{DragTuning, Handle, IntervalEditor};
use intervalrs::export::{export_mrc, CourseHeader};
use intervalrs::import::parse_mrc;
use intervalrs::metrics::TrainingLoadCalculator;
use intervalrs::models::{Interval, ShapeLimits, Workout};

/// Performance benchmarks for the workout engine
///
/// Metric recomputation runs after every settled drag, so it has to stay
/// cheap as workouts grow.

fn create_workout(size: usize) -> Workout {
    let limits = ShapeLimits::default();
    (0..size)
        .map(|i| {
            let start = 50 + (i % 7) as u16 * 20;
            let end = 60 + (i % 5) as u16 * 25;
            let duration = 120 + (i % 11) as u32 * 45;
            Interval::with_shape(start, end, duration, &limits)
        })
        .collect()
}

fn bench_training_load(c: &mut Criterion) {
    let calculator = TrainingLoadCalculator::default();
    let mut group = c.benchmark_group("Training Load");

    for &size in &[1, 10, 100, 1000] {
        let workout = create_workout(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("normalized_power", size), &workout, |b, workout| {
            b.iter(|| calculator.normalized_power(black_box(workout)));
        });
        group.bench_with_input(BenchmarkId::new("summarize", size), &workout, |b, workout| {
            b.iter(|| calculator.summarize(black_box(workout)));
        });
    }

    group.finish();
}

fn bench_course_files(c: &mut Criterion) {
    let header = CourseHeader::default();
    let limits = ShapeLimits::default();
    let mut group = c.benchmark_group("Course Files");

    for &size in &[10, 100, 1000] {
        let workout = create_workout(size);
        let text = export_mrc(&workout, &header);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("export", size), &workout, |b, workout| {
            b.iter(|| export_mrc(black_box(workout), &header));
        });
        group.bench_with_input(BenchmarkId::new("parse", size), &text, |b, text| {
            b.iter(|| parse_mrc(black_box(text), &limits));
        });
    }

    group.finish();
}

fn bench_drag(c: &mut Criterion) {
    let limits = ShapeLimits::default();
    let interval = Interval::with_shape(100, 100, 300, &limits);

    c.bench_function("drag_1000_moves", |b| {
        b.iter(|| {
            let mut editor = IntervalEditor::new(interval, limits, DragTuning::default());
            let mut velocity = VelocityTracker::default();
            editor.on_grab(Handle::Width, 0.0, 0.0);
            for step in 0..1000u64 {
                let x = (step % 200) as f64;
                velocity.record(x, 0.0, step * 16);
                black_box(editor.on_move(x, 0.0, 2.0, &velocity));
            }
            editor.on_release();
        });
    });
}

criterion_group!(benches, bench_training_load, bench_course_files, bench_drag);
criterion_main!(benches);
