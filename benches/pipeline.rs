//! Benchmarks for the generation and detection pipeline

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use urbansense::testdata::{inject_anomalies, mohali_roster, GeneratorConfig, SeriesGenerator};
use urbansense::{enrich, AnomalyDetector, DetectorConfig, Reading};

fn generate_test_data(days: i64) -> Vec<Reading> {
    let config = GeneratorConfig::new()
        .with_duration_days(days)
        .with_interval_minutes(5);
    let mut rng = StdRng::seed_from_u64(42);
    let mut readings = SeriesGenerator::default().generate(&config, &mohali_roster(), &mut rng);
    inject_anomalies(&mut readings, 0.02, &mut rng).unwrap();
    readings
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");

    let config = GeneratorConfig::new()
        .with_duration_days(1)
        .with_interval_minutes(5);
    let nodes = mohali_roster();
    group.throughput(Throughput::Elements((config.step_count() * nodes.len()) as u64));

    group.bench_function("generate_one_day", |b| {
        let generator = SeriesGenerator::default();
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(1);
            black_box(generator.generate(&config, &nodes, &mut rng))
        })
    });

    group.finish();
}

fn bench_enrich(c: &mut Criterion) {
    let mut group = c.benchmark_group("features");

    let readings = generate_test_data(1);
    group.throughput(Throughput::Elements(readings.len() as u64));

    group.bench_function("enrich_one_day", |b| {
        b.iter(|| black_box(enrich(&readings)))
    });

    group.finish();
}

fn bench_detector(c: &mut Criterion) {
    let mut group = c.benchmark_group("detector");
    group.sample_size(10);

    let readings = generate_test_data(7);
    let untrained = AnomalyDetector::new(DetectorConfig::default());
    let trained = untrained.fit(&readings).unwrap();
    group.throughput(Throughput::Elements(readings.len() as u64));

    group.bench_function("fit_one_week", |b| {
        b.iter(|| black_box(untrained.fit(&readings).unwrap()))
    });

    group.bench_function("score_one_week", |b| {
        b.iter(|| black_box(trained.score(&readings).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_generation, bench_enrich, bench_detector);
criterion_main!(benches);
