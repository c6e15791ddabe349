// UrbanSense Testdata - Dataset structures
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Dataset structures and I/O operations.
//!
//! Provides the [`Reading`] record, the [`Dataset`] table that holds them,
//! and CSV import/export with the canonical column set:
//!
//! ```text
//! timestamp,node_id,node_name,zone_type,noise,temperature,air_quality,crowd_density
//! ```

use crate::patterns::{Dimension, ZoneType};
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Canonical reading columns, in file order.
pub const READING_COLUMNS: [&str; 8] = [
    "timestamp",
    "node_id",
    "node_name",
    "zone_type",
    "noise",
    "temperature",
    "air_quality",
    "crowd_density",
];

/// Dataset error types.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The requested dataset file does not exist. Callers may recover by
    /// generating a fresh dataset.
    #[error("Dataset not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// The file holds a header but no records.
    #[error("Empty dataset")]
    Empty,
}

impl DatasetError {
    /// True for the recoverable missing-file condition.
    pub fn is_missing(&self) -> bool {
        matches!(self, DatasetError::Missing(_))
    }
}

/// One sensor record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub node_id: String,
    pub node_name: String,
    pub zone_type: ZoneType,
    pub noise: f64,
    pub temperature: f64,
    pub air_quality: f64,
    pub crowd_density: f64,
}

impl Reading {
    /// Value of one dimension.
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Noise => self.noise,
            Dimension::Temperature => self.temperature,
            Dimension::AirQuality => self.air_quality,
            Dimension::CrowdDensity => self.crowd_density,
        }
    }

    /// Mutable access to one dimension.
    pub fn get_mut(&mut self, dimension: Dimension) -> &mut f64 {
        match dimension {
            Dimension::Noise => &mut self.noise,
            Dimension::Temperature => &mut self.temperature,
            Dimension::AirQuality => &mut self.air_quality,
            Dimension::CrowdDensity => &mut self.crowd_density,
        }
    }

    /// The four magnitudes in canonical column order.
    pub fn magnitudes(&self) -> [f64; 4] {
        [
            self.noise,
            self.temperature,
            self.air_quality,
            self.crowd_density,
        ]
    }
}

impl AsRef<Reading> for Reading {
    fn as_ref(&self) -> &Reading {
        self
    }
}

/// Dataset metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Dataset name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Generation seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Sample interval in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<i64>,
    /// Number of records perturbed by anomaly injection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_anomalies: Option<usize>,
}

/// A table of readings ordered by time, then by roster order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    /// Records.
    pub readings: Vec<Reading>,
    /// Metadata.
    #[serde(default)]
    pub metadata: DatasetMetadata,
}

impl Dataset {
    /// Wrap a set of readings.
    pub fn new(readings: Vec<Reading>) -> Self {
        Self {
            readings,
            metadata: DatasetMetadata::default(),
        }
    }

    /// Set name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.metadata.name = Some(name.to_string());
        self
    }

    /// Get all readings.
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Mutable access for in-place stages such as anomaly injection.
    pub fn readings_mut(&mut self) -> &mut [Reading] {
        &mut self.readings
    }

    /// Consume into the underlying readings.
    pub fn into_readings(self) -> Vec<Reading> {
        self.readings
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// First and last timestamp.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.readings.iter().map(|r| r.timestamp).min()?;
        let last = self.readings.iter().map(|r| r.timestamp).max()?;
        Some((first, last))
    }

    /// Get one dimension as a column.
    pub fn column(&self, dimension: Dimension) -> Vec<f64> {
        self.readings.iter().map(|r| r.get(dimension)).collect()
    }

    /// Basic statistics for a dimension.
    pub fn stats(&self, dimension: Dimension) -> Option<SensorStats> {
        SensorStats::from_values(&self.column(dimension))
    }

    /// Statistics for every dimension.
    pub fn describe(&self) -> Vec<(Dimension, SensorStats)> {
        Dimension::ALL
            .iter()
            .filter_map(|d| self.stats(*d).map(|s| (*d, s)))
            .collect()
    }

    /// Export to CSV file.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        write_records(path, &self.readings)
    }

    /// Import from CSV file. A file with a header but no records is
    /// reported as [`DatasetError::Empty`].
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let readings: Vec<Reading> = read_records(path, &READING_COLUMNS)?;
        if readings.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self::new(readings))
    }
}

/// Write serializable records as CSV with a header row.
pub fn write_records<T: Serialize>(
    path: impl AsRef<Path>,
    records: &[T],
) -> Result<(), DatasetError> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    debug!(
        "Wrote {} records to {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(())
}

/// Read CSV records, checking the header for `required` columns first.
pub fn read_records<T: DeserializeOwned>(
    path: impl AsRef<Path>,
    required: &[&str],
) -> Result<Vec<T>, DatasetError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DatasetError::Missing(path.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(DatasetError::MissingColumn(column.to_string()));
        }
    }

    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

/// Basic statistics for a column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorStats {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SensorStats {
    /// Population statistics over `values`; `None` when empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count,
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }
}
