//! Training run orchestration.
//!
//! Loads the sensor dataset (generating a synthetic one when the file is
//! absent), enriches it, fits the detector, evaluates it on the training
//! batch and writes both model blobs.

use crate::config::TrainingConfig;
use crate::detector::{AnomalyDetector, EvaluationSummary, ScoredReading};
use crate::error::{Result, UrbanSenseError};
use crate::features::{enrich, EnrichedReading};
use crate::persistence::{save_detector, ModelPaths};
use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use urbansense_testdata::{generate_dataset, mohali_roster, Dataset, GeneratorConfig};

/// Outcome of one training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub total_records: usize,
    /// First and last timestamp of the training data.
    pub time_range: Option<(NaiveDateTime, NaiveDateTime)>,
    pub evaluation: EvaluationSummary,
    pub model_paths: ModelPaths,
}

/// Trains, evaluates and stores an anomaly detector.
#[derive(Debug)]
pub struct Trainer {
    config: TrainingConfig,
    detector: Option<AnomalyDetector>,
    data: Vec<EnrichedReading>,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            detector: None,
            data: Vec::new(),
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Detector fitted by the last [`Trainer::train`] call.
    pub fn detector(&self) -> Option<&AnomalyDetector> {
        self.detector.as_ref()
    }

    /// Enriched training data of the last run.
    pub fn data(&self) -> &[EnrichedReading] {
        &self.data
    }

    /// Generate a synthetic dataset with injected anomalies.
    pub fn generate_synthetic(&self) -> Result<Dataset> {
        let mut generator = GeneratorConfig::trailing_days(
            self.config.synthetic_days,
            self.config.interval_minutes,
        );
        if let Some(seed) = self.config.seed {
            generator = generator.with_seed(seed);
        }

        let mut dataset = generate_dataset(&generator, &mohali_roster());
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        let report = dataset.inject_anomalies(self.config.anomaly_rate, &mut rng)?;

        info!(
            "Generated {} synthetic records with {} injected anomalies",
            dataset.len(),
            report.len()
        );
        Ok(dataset)
    }

    /// Read the configured dataset. A missing file is replaced by a freshly
    /// generated one, written to the configured path first.
    pub fn load_data(&self) -> Result<Dataset> {
        let path = &self.config.data_path;
        match Dataset::from_csv(path) {
            Ok(dataset) => {
                info!("Loaded {} records from {}", dataset.len(), path.display());
                Ok(dataset)
            }
            Err(e) if e.is_missing() => {
                warn!(
                    "Data file not found: {}, generating synthetic training data",
                    path.display()
                );
                let dataset = self.generate_synthetic()?;
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                dataset.to_csv(path)?;
                Ok(Dataset::from_csv(path)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run a full training pass.
    pub fn train(&mut self) -> Result<TrainingReport> {
        let dataset = self.load_data()?;
        if dataset.is_empty() {
            return Err(UrbanSenseError::EmptyDataset { operation: "train" });
        }
        let time_range = dataset.time_range();
        if let Some((first, last)) = time_range {
            info!("Date range: {} to {}", first, last);
        }

        let data = enrich(dataset.readings());
        let detector = AnomalyDetector::new(self.config.detector.clone()).fit(&data)?;
        let evaluation = detector.evaluate(&data)?;

        info!(
            "Training complete: {} anomalies ({:.2}%), {} with stress above 80",
            evaluation.anomaly_count,
            evaluation.anomaly_rate * 100.0,
            evaluation.high_stress_anomalies
        );

        let model_paths = save_detector(&detector, &self.config.models_dir)?;
        let report = TrainingReport {
            total_records: data.len(),
            time_range,
            evaluation,
            model_paths,
        };

        self.detector = Some(detector);
        self.data = data;
        Ok(report)
    }

    /// The `n` highest-scoring predicted anomalies of the training data.
    pub fn evaluate_samples(&self, n: usize) -> Result<Vec<ScoredReading>> {
        let detector = self.detector.as_ref().ok_or(UrbanSenseError::NotFitted {
            operation: "evaluate samples",
        })?;
        detector.top_anomalies(&self.data, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use crate::persistence::load_detector;
    use tempfile::tempdir;

    fn config(root: &std::path::Path) -> TrainingConfig {
        TrainingConfig::new()
            .with_data_path(root.join("data/processed/sensors.csv"))
            .with_models_dir(root.join("models"))
            .with_synthetic_window(1, 60)
            .with_anomaly_rate(0.05)
            .with_seed(3)
            .with_detector(DetectorConfig::new().with_estimators(30).with_contamination(0.05))
    }

    #[test]
    fn test_missing_data_is_generated() {
        let dir = tempdir().unwrap();
        let trainer = Trainer::new(config(dir.path()));

        let dataset = trainer.load_data().unwrap();
        // 25 hourly steps, inclusive, for 5 nodes
        assert_eq!(dataset.len(), 125);
        assert!(trainer.config().data_path.exists());

        // Second call reads the written file
        let again = trainer.load_data().unwrap();
        assert_eq!(again.readings(), dataset.readings());
    }

    #[test]
    fn test_train_report_and_models() {
        let dir = tempdir().unwrap();
        let mut trainer = Trainer::new(config(dir.path()));
        let report = trainer.train().unwrap();

        assert_eq!(report.total_records, 125);
        assert_eq!(report.evaluation.total, 125);
        assert!(report.evaluation.anomaly_count > 0);
        assert!(report.time_range.is_some());
        assert!(report.model_paths.model.exists());
        assert!(report.model_paths.scaler.exists());
        assert!(trainer.detector().is_some());

        let loaded = load_detector(dir.path().join("models")).unwrap();
        let expected = trainer.detector().unwrap().predict(trainer.data()).unwrap();
        assert_eq!(loaded.predict(trainer.data()).unwrap(), expected);
    }

    #[test]
    fn test_evaluate_samples() {
        let dir = tempdir().unwrap();
        let mut trainer = Trainer::new(config(dir.path()));
        assert!(matches!(
            trainer.evaluate_samples(3),
            Err(UrbanSenseError::NotFitted { .. })
        ));

        trainer.train().unwrap();
        let samples = trainer.evaluate_samples(3).unwrap();
        assert!(!samples.is_empty() && samples.len() <= 3);
        assert!(samples.iter().all(|s| s.is_anomaly && s.anomaly_score > 0.0));
    }

    #[test]
    fn test_invalid_rate_surfaces() {
        let dir = tempdir().unwrap();
        let trainer = Trainer::new(config(dir.path()).with_anomaly_rate(1.5));
        assert!(matches!(
            trainer.load_data(),
            Err(UrbanSenseError::Injection(_))
        ));
    }
}
