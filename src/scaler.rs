//! Feature standardization.

use crate::error::{Result, UrbanSenseError};
use serde::{Deserialize, Serialize};
use urbansense_testdata::{Dimension, Reading};

/// Number of model input features.
pub const N_FEATURES: usize = 4;

/// One model input row: noise, temperature, air quality, crowd density.
pub type FeatureRow = [f64; N_FEATURES];

/// Model input columns. Calendar features and the stress index are excluded.
pub const FEATURE_COLUMNS: [Dimension; N_FEATURES] = Dimension::ALL;

/// Extract the model input rows from a batch.
pub fn feature_matrix<R: AsRef<Reading>>(readings: &[R]) -> Vec<FeatureRow> {
    readings.iter().map(|r| r.as_ref().magnitudes()).collect()
}

/// Per-column statistics of one fitted feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub mean: f64,
    /// Population standard deviation; zero for a constant column.
    pub std: f64,
}

impl ColumnStats {
    fn standardize(&self, value: f64) -> f64 {
        if self.std > 0.0 {
            (value - self.mean) / self.std
        } else {
            0.0
        }
    }
}

/// Zero-mean, unit-variance scaler fitted on one batch.
///
/// Constant columns map to 0 for every input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: [ColumnStats; N_FEATURES],
    n_samples: usize,
}

impl StandardScaler {
    /// Fit on `rows`.
    pub fn fit(rows: &[FeatureRow]) -> Result<Self> {
        if rows.is_empty() {
            return Err(UrbanSenseError::EmptyDataset {
                operation: "fit scaler",
            });
        }

        let n = rows.len() as f64;
        let mut columns = [ColumnStats::default(); N_FEATURES];
        for (j, column) in columns.iter_mut().enumerate() {
            let mean = rows.iter().map(|r| r[j]).sum::<f64>() / n;
            let min = rows.iter().map(|r| r[j]).fold(f64::INFINITY, f64::min);
            let max = rows.iter().map(|r| r[j]).fold(f64::NEG_INFINITY, f64::max);

            let std = if max > min {
                (rows.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n).sqrt()
            } else {
                0.0
            };
            *column = ColumnStats { mean, std };
        }

        Ok(Self {
            columns,
            n_samples: rows.len(),
        })
    }

    /// Standardize one row with the fitted statistics.
    pub fn transform_row(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = [0.0; N_FEATURES];
        for (j, value) in out.iter_mut().enumerate() {
            *value = self.columns[j].standardize(row[j]);
        }
        out
    }

    /// Standardize a batch with the fitted statistics.
    pub fn transform(&self, rows: &[FeatureRow]) -> Vec<FeatureRow> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    /// Fitted statistics, in [`FEATURE_COLUMNS`] order.
    pub fn columns(&self) -> &[ColumnStats; N_FEATURES] {
        &self.columns
    }

    /// Rows seen by `fit`.
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }
}
