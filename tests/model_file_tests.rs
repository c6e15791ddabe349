//! Integration tests for detector model files
//!
//! These tests verify the save/load roundtrip of the model and scaler
//! blobs and the rejection of damaged or mismatched files.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;
use urbansense::persistence::{MODEL_FILE, SCALER_FILE};
use urbansense::testdata::{mohali_roster, GeneratorConfig, SeriesGenerator};
use urbansense::*;

/// Helper to create a small trained detector and its training data
fn create_trained_detector() -> (AnomalyDetector, Vec<EnrichedReading>) {
    let config = GeneratorConfig::new().with_interval_minutes(60);
    let mut rng = StdRng::seed_from_u64(21);
    let readings = SeriesGenerator::default().generate(&config, &mohali_roster(), &mut rng);
    let enriched = enrich(&readings);

    let detector = AnomalyDetector::new(
        DetectorConfig::new()
            .with_estimators(40)
            .with_contamination(0.05)
            .with_seed(8),
    )
    .fit(&enriched)
    .unwrap();
    (detector, enriched)
}

#[test]
fn test_save_load_roundtrip() {
    let dir = tempdir().unwrap();
    let (detector, data) = create_trained_detector();

    let paths = save_detector(&detector, dir.path()).unwrap();
    assert_eq!(paths.model, dir.path().join(MODEL_FILE));
    assert_eq!(paths.scaler, dir.path().join(SCALER_FILE));

    let loaded = load_detector(dir.path()).unwrap();
    assert_eq!(loaded.config().seed, 8);
    assert_eq!(loaded.forest(), detector.forest());
    assert_eq!(loaded.scaler(), detector.scaler());
    assert_eq!(
        loaded.evaluate(&data).unwrap(),
        detector.evaluate(&data).unwrap()
    );
}

#[test]
fn test_corrupt_model_detection() {
    let dir = tempdir().unwrap();
    let (detector, _) = create_trained_detector();
    let paths = save_detector(&detector, dir.path()).unwrap();

    // Flip a byte inside the payload
    let mut data = std::fs::read(&paths.model).unwrap();
    let target = data.len() / 2;
    data[target] ^= 0xFF;
    std::fs::write(&paths.model, &data).unwrap();

    let err = load_detector(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        UrbanSenseError::ModelFile(ModelFileError::InvalidChecksum { .. })
    ));
}

#[test]
fn test_invalid_magic_bytes() {
    let dir = tempdir().unwrap();
    let (detector, _) = create_trained_detector();
    let paths = save_detector(&detector, dir.path()).unwrap();

    let mut data = std::fs::read(&paths.scaler).unwrap();
    data[0..4].copy_from_slice(b"BADM");
    std::fs::write(&paths.scaler, &data).unwrap();

    let err = load_detector(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        UrbanSenseError::ModelFile(ModelFileError::InvalidMagic { .. })
    ));
}

#[test]
fn test_swapped_blobs_rejected() {
    let dir = tempdir().unwrap();
    let (detector, _) = create_trained_detector();
    let paths = save_detector(&detector, dir.path()).unwrap();

    // Scaler blob where the model blob is expected
    std::fs::copy(&paths.scaler, &paths.model).unwrap();

    let err = load_detector(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        UrbanSenseError::ModelFile(ModelFileError::WrongKind { .. })
    ));
}

#[test]
fn test_missing_scaler_file() {
    let dir = tempdir().unwrap();
    let (detector, _) = create_trained_detector();
    let paths = save_detector(&detector, dir.path()).unwrap();
    std::fs::remove_file(&paths.scaler).unwrap();

    assert!(matches!(
        load_detector(dir.path()),
        Err(UrbanSenseError::Io(_))
    ));
}

#[test]
fn test_multiple_save_load_cycles() {
    let dir = tempdir().unwrap();
    let (mut detector, data) = create_trained_detector();
    let expected = detector.score(&data).unwrap();

    for i in 0..3 {
        let cycle_dir = dir.path().join(format!("cycle_{}", i));
        save_detector(&detector, &cycle_dir).unwrap();
        detector = load_detector(&cycle_dir).unwrap();
    }

    assert_eq!(detector.score(&data).unwrap(), expected);
}
