//! Anomaly detector: standardization plus isolation forest.
//!
//! A detector starts untrained. [`AnomalyDetector::fit`] returns a new,
//! trained detector holding the fitted scaler and forest; the receiver is
//! left untouched. Every scoring operation on an untrained detector fails
//! with [`UrbanSenseError::NotFitted`].
//!
//! Model input is the four raw magnitudes only. Calendar features and the
//! stress index are not part of the input space.

use crate::config::DetectorConfig;
use crate::error::{Result, UrbanSenseError};
use crate::features::{EnrichedReading, HIGH_STRESS_THRESHOLD};
use crate::forest::IsolationForest;
use crate::scaler::{feature_matrix, FeatureRow, StandardScaler};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use urbansense_testdata::Reading;

/// Trained state: scaler statistics and the forest fitted on them.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub scaler: StandardScaler,
    pub forest: IsolationForest,
}

/// An enriched reading with its detector verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredReading {
    pub reading: EnrichedReading,
    pub is_anomaly: bool,
    /// Higher is more anomalous; positive for predicted anomalies.
    pub anomaly_score: f64,
}

/// Batch summary relating predictions to the stress index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total: usize,
    pub anomaly_count: usize,
    /// `anomaly_count / total`, 0 for an empty batch.
    pub anomaly_rate: f64,
    /// Mean stress index of predicted anomalies. `None` when there are none.
    pub avg_stress_anomaly: Option<f64>,
    /// Mean stress index of predicted normal records.
    pub avg_stress_normal: Option<f64>,
    /// Predicted anomalies with stress index above 80.
    pub high_stress_anomalies: usize,
}

/// Isolation-forest anomaly detector.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: DetectorConfig,
    model: Option<FittedModel>,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl AnomalyDetector {
    /// Untrained detector.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    /// Trained detector from previously fitted parts.
    pub fn from_parts(
        config: DetectorConfig,
        scaler: StandardScaler,
        forest: IsolationForest,
    ) -> Self {
        Self {
            config,
            model: Some(FittedModel { scaler, forest }),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Fitted scaler, if trained.
    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.model.as_ref().map(|m| &m.scaler)
    }

    /// Fitted forest, if trained.
    pub fn forest(&self) -> Option<&IsolationForest> {
        self.model.as_ref().map(|m| &m.forest)
    }

    /// Fit scaler and forest on `readings`, returning a trained detector
    /// with the same configuration.
    pub fn fit<R: AsRef<Reading>>(&self, readings: &[R]) -> Result<AnomalyDetector> {
        self.config.validate()?;
        if readings.is_empty() {
            return Err(UrbanSenseError::EmptyDataset { operation: "fit" });
        }

        let raw = feature_matrix(readings);
        let scaler = StandardScaler::fit(&raw)?;
        let scaled = scaler.transform(&raw);
        let forest = IsolationForest::fit(&scaled, &self.config)?;

        info!(
            "Detector fitted on {} records ({} trees, offset {:.4})",
            readings.len(),
            forest.n_trees(),
            forest.offset()
        );

        Ok(Self::from_parts(self.config.clone(), scaler, forest))
    }

    fn fitted(&self, operation: &'static str) -> Result<&FittedModel> {
        self.model
            .as_ref()
            .ok_or(UrbanSenseError::NotFitted { operation })
    }

    fn scaled<R: AsRef<Reading>>(model: &FittedModel, readings: &[R]) -> Vec<FeatureRow> {
        model.scaler.transform(&feature_matrix(readings))
    }

    /// Anomaly label per record.
    pub fn predict<R: AsRef<Reading>>(&self, readings: &[R]) -> Result<Vec<bool>> {
        let model = self.fitted("predict")?;
        Ok(model.forest.predict(&Self::scaled(model, readings)))
    }

    /// Anomaly score per record; higher is more anomalous.
    pub fn score<R: AsRef<Reading>>(&self, readings: &[R]) -> Result<Vec<f64>> {
        let model = self.fitted("score")?;
        Ok(model
            .forest
            .decision_function(&Self::scaled(model, readings))
            .into_iter()
            .map(|d| -d)
            .collect())
    }

    /// Attach label and score to every record.
    pub fn annotate(&self, readings: &[EnrichedReading]) -> Result<Vec<ScoredReading>> {
        let model = self.fitted("annotate")?;
        let decisions = model.forest.decision_function(&Self::scaled(model, readings));
        Ok(readings
            .iter()
            .zip(decisions)
            .map(|(r, d)| ScoredReading {
                reading: r.clone(),
                is_anomaly: d < 0.0,
                anomaly_score: -d,
            })
            .collect())
    }

    /// Predicted anomalies ordered by descending score, at most `n`.
    pub fn top_anomalies(
        &self,
        readings: &[EnrichedReading],
        n: usize,
    ) -> Result<Vec<ScoredReading>> {
        let mut anomalies: Vec<ScoredReading> = self
            .annotate(readings)?
            .into_iter()
            .filter(|s| s.is_anomaly)
            .collect();
        anomalies.sort_by(|a, b| b.anomaly_score.total_cmp(&a.anomaly_score));
        anomalies.truncate(n);
        Ok(anomalies)
    }

    /// Summarize predictions against the stress index.
    pub fn evaluate(&self, readings: &[EnrichedReading]) -> Result<EvaluationSummary> {
        let labels = self.predict(readings)?;

        let mut anomaly_stress = Vec::new();
        let mut normal_stress = Vec::new();
        for (reading, &is_anomaly) in readings.iter().zip(&labels) {
            if is_anomaly {
                anomaly_stress.push(reading.stress_index);
            } else {
                normal_stress.push(reading.stress_index);
            }
        }

        let total = readings.len();
        let anomaly_count = anomaly_stress.len();
        let summary = EvaluationSummary {
            total,
            anomaly_count,
            anomaly_rate: if total > 0 {
                anomaly_count as f64 / total as f64
            } else {
                0.0
            },
            avg_stress_anomaly: mean_stress(&anomaly_stress),
            avg_stress_normal: mean_stress(&normal_stress),
            high_stress_anomalies: anomaly_stress
                .iter()
                .filter(|&&s| s > HIGH_STRESS_THRESHOLD)
                .count(),
        };

        debug!(
            "Evaluated {} records: {} anomalies ({:.2}%)",
            summary.total,
            summary.anomaly_count,
            summary.anomaly_rate * 100.0
        );
        Ok(summary)
    }
}

fn mean_stress(values: &[u8]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
    }
}
