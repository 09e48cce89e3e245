use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use liftrs::import::csv::{write_records, CsvImporter};
use liftrs::metrics::{self, OneRepMaxFormula};
use liftrs::overload::OverloadDetector;
use liftrs::trend;
use liftrs::{RecordStore, SeriesPoint, WorkoutRecord};

/// Performance benchmarks for the analytics core
///
/// Datasets simulate several exercises trained three times a week so that
/// per-date aggregation and regression costs scale with history length.

const EXERCISES: [&str; 6] = [
    "Squat",
    "Bench Press",
    "Deadlift",
    "Overhead Press",
    "Barbell Row",
    "Leg Curl",
];

fn create_training_history(sessions: usize) -> Vec<WorkoutRecord> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut records = Vec::with_capacity(sessions * EXERCISES.len());

    for session in 0..sessions {
        let date = start + Duration::days((session / 3 * 7 + session % 3 * 2) as i64);
        for (i, exercise) in EXERCISES.iter().enumerate() {
            let weight = 40.0 + 20.0 * i as f64 + 0.5 * session as f64;
            let reps = 5 + ((session + i) % 4) as u32;
            records.push(WorkoutRecord::new(date, *exercise, 3, reps, weight));
        }
    }

    records
}

fn create_series(points: usize) -> Vec<SeriesPoint> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    (0..points)
        .map(|i| {
            let noise = ((i * 7919) % 13) as f64 - 6.0;
            SeriesPoint::new(start + Duration::days(2 * i as i64), 100.0 + 0.3 * i as f64 + noise)
        })
        .collect()
}

fn bench_one_rep_max(c: &mut Criterion) {
    let mut group = c.benchmark_group("One Rep Max");

    for formula in OneRepMaxFormula::ALL {
        group.bench_with_input(
            BenchmarkId::new("estimate", formula),
            &formula,
            |b, formula| {
                b.iter(|| {
                    for reps in 1..=12 {
                        let _ = metrics::estimate_one_rep_max(black_box(100.0), reps, *formula);
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("Metrics");

    for &sessions in &[30, 150, 600] {
        let records = create_training_history(sessions);

        group.throughput(Throughput::Elements(records.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("volume_over_time", sessions),
            &records,
            |b, records| b.iter(|| metrics::volume_over_time(black_box(records), Some("squat"))),
        );
        group.bench_with_input(
            BenchmarkId::new("strength_progression", sessions),
            &records,
            |b, records| {
                b.iter(|| {
                    metrics::strength_progression(black_box(records), "Bench Press", OneRepMaxFormula::Epley)
                })
            },
        );
    }

    group.finish();
}

fn bench_overload(c: &mut Criterion) {
    let mut group = c.benchmark_group("Overload Detection");

    for &sessions in &[30, 150, 600] {
        let store = RecordStore::new(create_training_history(sessions));
        let detector = OverloadDetector::new();

        group.throughput(Throughput::Elements(store.len() as u64));
        group.bench_with_input(BenchmarkId::new("detect", sessions), &store, |b, store| {
            b.iter(|| detector.detect(black_box(store.records()), "Deadlift"))
        });
        group.bench_with_input(BenchmarkId::new("detect_all", sessions), &store, |b, store| {
            b.iter(|| detector.detect_all(black_box(store)))
        });
    }

    group.finish();
}

fn bench_trend(c: &mut Criterion) {
    let mut group = c.benchmark_group("Trend Analysis");

    for &points in &[10, 100, 1000] {
        let series = create_series(points);

        group.throughput(Throughput::Elements(points as u64));
        group.bench_with_input(BenchmarkId::new("linear_trend", points), &series, |b, series| {
            b.iter(|| trend::linear_trend(black_box(series)))
        });
        group.bench_with_input(BenchmarkId::new("moving_average", points), &series, |b, series| {
            b.iter(|| trend::moving_average(black_box(series), 7))
        });
    }

    group.finish();
}

fn bench_csv_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("CSV Import");
    let importer = CsvImporter::new();

    for &sessions in &[30, 300] {
        let records = create_training_history(sessions);
        let mut buffer = Vec::new();
        write_records(&records, &mut buffer).unwrap();

        group.throughput(Throughput::Bytes(buffer.len() as u64));
        group.bench_with_input(BenchmarkId::new("import_reader", sessions), &buffer, |b, buffer| {
            b.iter(|| importer.import_reader(black_box(buffer.as_slice())))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_one_rep_max,
    bench_metrics,
    bench_overload,
    bench_trend,
    bench_csv_import
);
criterion_main!(benches);
