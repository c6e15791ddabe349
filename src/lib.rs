//! # UrbanSense
//!
//! Stress index and unsupervised anomaly detection for urban sensor networks.
//!
//! ## Key Features
//!
//! - **Feature engineering**: calendar features and a weighted 0-100 stress index
//! - **Standardization**: per-column scaling fitted once and reused
//! - **Isolation forest**: seeded, reproducible ensemble with a contamination threshold
//! - **Model files**: checksummed blobs for the forest and the scaler
//! - **Training runs**: load-or-generate, fit, evaluate and save in one call
//!
//! Synthetic data comes from the companion `urbansense-testdata` crate,
//! re-exported here as [`testdata`].
//!
//! ## Quick Start
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use urbansense::testdata::{inject_anomalies, mohali_roster, GeneratorConfig, SeriesGenerator};
//! use urbansense::{enrich, AnomalyDetector, DetectorConfig};
//!
//! // One day of hourly readings for the five-node roster
//! let config = GeneratorConfig::new().with_interval_minutes(60);
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut readings = SeriesGenerator::default().generate(&config, &mohali_roster(), &mut rng);
//! inject_anomalies(&mut readings, 0.1, &mut rng).unwrap();
//!
//! // Enrich, fit, evaluate
//! let enriched = enrich(&readings);
//! let detector = AnomalyDetector::new(DetectorConfig::new().with_contamination(0.1))
//!     .fit(&enriched)
//!     .unwrap();
//! let summary = detector.evaluate(&enriched).unwrap();
//! assert!(summary.anomaly_count > 0);
//! ```
//!
//! ## Modules
//!
//! - [`features`]: Calendar features and stress index
//! - [`scaler`]: Feature standardization
//! - [`forest`]: Isolation forest
//! - [`detector`]: Trainable anomaly detector
//! - [`persistence`]: Model blob files
//! - [`trainer`]: Training run orchestration

// Modules
pub mod config;
pub mod detector;
pub mod error;
pub mod features;
pub mod forest;
pub mod persistence;
pub mod scaler;
pub mod trainer;

/// Synthetic data generation
pub use urbansense_testdata as testdata;

// Re-exports for convenient access
pub use config::{Contamination, DetectorConfig, MaxSamples, TrainingConfig};
pub use detector::{AnomalyDetector, EvaluationSummary, FittedModel, ScoredReading};
pub use error::{ModelFileError, Result, UrbanSenseError};
pub use features::{
    enrich, is_peak_hour, load_enriched, save_enriched, stress_index, EnrichedReading,
    StressScores, ENRICHED_COLUMNS, HIGH_STRESS_THRESHOLD, PEAK_HOURS,
};
pub use forest::{average_path_length, IsolationForest, IsolationTree};
pub use persistence::{
    decode_blob, encode_blob, load_detector, save_detector, BlobKind, ModelPaths,
};
pub use scaler::{feature_matrix, ColumnStats, FeatureRow, StandardScaler, FEATURE_COLUMNS};
pub use trainer::{Trainer, TrainingReport};
pub use urbansense_testdata::{Dataset, Reading};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
