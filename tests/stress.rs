//! Stress tests for UrbanSense
//!
//! Run with: cargo test --release stress -- --ignored

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use urbansense::testdata::{generate_dataset, mohali_roster, GeneratorConfig};
use urbansense::*;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
#[ignore] // Run manually with --ignored
fn stress_test_month_at_five_minutes() {
    init_logging();
    let config = GeneratorConfig::new()
        .with_duration_days(30)
        .with_interval_minutes(5)
        .with_seed(42);

    let start = Instant::now();
    let mut dataset = generate_dataset(&config, &mohali_roster());
    let mut rng = StdRng::seed_from_u64(42);
    dataset.inject_anomalies(0.02, &mut rng).unwrap();
    let enriched = enrich(dataset.readings());
    let prepared = start.elapsed();

    let start = Instant::now();
    let detector = AnomalyDetector::default().fit(&enriched).unwrap();
    let summary = detector.evaluate(&enriched).unwrap();
    let elapsed = start.elapsed();

    let rate = enriched.len() as f64 / elapsed.as_secs_f64();
    println!("Prepared {} records in {:?}", enriched.len(), prepared);
    println!("Fit + evaluate in {:?} ({:.0} records/second)", elapsed, rate);
    println!(
        "Anomalies: {} ({:.2}%)",
        summary.anomaly_count,
        summary.anomaly_rate * 100.0
    );

    assert_eq!(enriched.len(), (30 * 288 + 1) * 5);
    assert!(
        (summary.anomaly_rate - 0.02).abs() < 0.005,
        "Anomaly rate should track contamination, got {:.4}",
        summary.anomaly_rate
    );
}

#[test]
#[ignore]
fn stress_test_repeated_scoring() {
    init_logging();
    let config = GeneratorConfig::new()
        .with_duration_days(7)
        .with_interval_minutes(5)
        .with_seed(7);
    let dataset = generate_dataset(&config, &mohali_roster());
    let detector = AnomalyDetector::default().fit(dataset.readings()).unwrap();

    let iterations = 10;
    let start = Instant::now();
    let mut flagged = 0;
    for _ in 0..iterations {
        flagged += detector
            .predict(dataset.readings())
            .unwrap()
            .iter()
            .filter(|a| **a)
            .count();
    }
    let elapsed = start.elapsed();
    let rate = (iterations * dataset.len()) as f64 / elapsed.as_secs_f64();

    println!("Scored {} records in {:?}", iterations * dataset.len(), elapsed);
    println!("Rate: {:.0} records/second", rate);

    assert!(flagged > 0);
    assert!(
        rate > 10_000.0,
        "Should score at least 10k records/s, got {:.0}",
        rate
    );
}
