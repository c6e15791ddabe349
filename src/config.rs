//! Detector and training configuration.

use crate::error::{Result, UrbanSenseError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Expected fraction of outliers, used to place the decision threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Contamination {
    /// Fixed threshold at score 0.5, as in Liu et al.
    Auto,
    /// Threshold at this quantile of the training scores, in (0, 0.5].
    Fraction(f64),
}

impl Contamination {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Contamination::Auto => Ok(()),
            Contamination::Fraction(f) if f > 0.0 && f <= 0.5 => Ok(()),
            Contamination::Fraction(f) => Err(UrbanSenseError::InvalidParameter {
                name: "contamination",
                reason: format!("{} is outside (0, 0.5]", f),
            }),
        }
    }
}

impl Default for Contamination {
    fn default() -> Self {
        Contamination::Fraction(0.02)
    }
}

/// Rows drawn to build each tree.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxSamples {
    /// `min(256, n)`.
    #[default]
    Auto,
    /// Absolute count, capped at `n`.
    Count(usize),
    /// Fraction of `n`, in (0, 1].
    Fraction(f64),
}

impl MaxSamples {
    /// Resolve against a batch of `n` rows. Always at least 1 for `n > 0`.
    pub fn resolve(&self, n: usize) -> usize {
        let count = match *self {
            MaxSamples::Auto => n.min(256),
            MaxSamples::Count(c) => c.min(n),
            MaxSamples::Fraction(f) => (f * n as f64) as usize,
        };
        count.clamp(1.min(n), n)
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            MaxSamples::Auto => Ok(()),
            MaxSamples::Count(c) if c > 0 => Ok(()),
            MaxSamples::Fraction(f) if f > 0.0 && f <= 1.0 => Ok(()),
            other => Err(UrbanSenseError::InvalidParameter {
                name: "max_samples",
                reason: format!("{:?} must be positive (fractions at most 1.0)", other),
            }),
        }
    }
}

/// Isolation forest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Number of trees in the ensemble.
    pub n_estimators: usize,
    /// Expected outlier fraction.
    pub contamination: Contamination,
    /// Rows per tree.
    pub max_samples: MaxSamples,
    /// Draw rows with replacement.
    pub bootstrap: bool,
    /// Seed for tree construction.
    pub seed: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            contamination: Contamination::default(),
            max_samples: MaxSamples::Auto,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl DetectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the contamination fraction.
    pub fn with_contamination(mut self, fraction: f64) -> Self {
        self.contamination = Contamination::Fraction(fraction);
        self
    }

    /// Set the number of trees.
    pub fn with_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Set rows per tree.
    pub fn with_max_samples(mut self, max_samples: MaxSamples) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Enable or disable bootstrap sampling.
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check every field.
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(UrbanSenseError::InvalidParameter {
                name: "n_estimators",
                reason: "must be at least 1".to_string(),
            });
        }
        self.contamination.validate()?;
        self.max_samples.validate()
    }
}

/// Training run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// CSV dataset to train on. Generated when absent.
    pub data_path: PathBuf,
    /// Directory receiving the model and scaler blobs.
    pub models_dir: PathBuf,
    /// Days of synthetic data generated when the dataset is missing.
    pub synthetic_days: i64,
    /// Interval of synthetic data, in minutes.
    pub interval_minutes: i64,
    /// Anomaly rate injected into synthetic data.
    pub anomaly_rate: f64,
    /// Seed for synthetic data. Entropy when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Detector settings.
    pub detector: DetectorConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/processed/mohali_sensor_data.csv"),
            models_dir: PathBuf::from("models"),
            synthetic_days: 30,
            interval_minutes: 5,
            anomaly_rate: 0.02,
            seed: None,
            detector: DetectorConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dataset path.
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Set the model output directory.
    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    /// Set the synthetic fallback window.
    pub fn with_synthetic_window(mut self, days: i64, interval_minutes: i64) -> Self {
        self.synthetic_days = days;
        self.interval_minutes = interval_minutes;
        self
    }

    /// Set the injected anomaly rate.
    pub fn with_anomaly_rate(mut self, rate: f64) -> Self {
        self.anomaly_rate = rate;
        self
    }

    /// Set the synthetic data seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set detector settings.
    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.n_estimators, 200);
        assert_eq!(config.max_samples, MaxSamples::Auto);
        assert!(config.bootstrap);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_training_defaults() {
        let config = TrainingConfig::default();
        assert_eq!(config.synthetic_days, 30);
        assert_eq!(config.interval_minutes, 5);
        assert!((config.anomaly_rate - 0.02).abs() < 1e-12);
        assert_eq!(config.detector.contamination, Contamination::Fraction(0.02));
    }

    #[test]
    fn test_contamination_range() {
        assert!(Contamination::Auto.validate().is_ok());
        assert!(Contamination::Fraction(0.5).validate().is_ok());
        assert!(Contamination::Fraction(0.0).validate().is_err());
        assert!(Contamination::Fraction(0.6).validate().is_err());
        assert!(DetectorConfig::new().with_estimators(0).validate().is_err());
    }

    #[test]
    fn test_max_samples_resolve() {
        assert_eq!(MaxSamples::Auto.resolve(120), 120);
        assert_eq!(MaxSamples::Auto.resolve(10_000), 256);
        assert_eq!(MaxSamples::Count(50).resolve(20), 20);
        assert_eq!(MaxSamples::Fraction(0.5).resolve(100), 50);
        assert_eq!(MaxSamples::Fraction(0.001).resolve(100), 1);
        assert_eq!(MaxSamples::Auto.resolve(0), 0);
        assert!(MaxSamples::Fraction(1.5).validate().is_err());
        assert!(MaxSamples::Count(0).validate().is_err());
    }

    #[test]
    fn test_config_serde() {
        let config = DetectorConfig::new().with_contamination(0.1);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: DetectorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.contamination, Contamination::Fraction(0.1));
    }
}
