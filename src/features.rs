//! Feature engineering
//!
//! Calendar features and the stress index derived from raw readings.
//!
//! The stress index is a weighted composite of four bounded sub-scores:
//!
//! | Sub-score | Formula                         | Weight |
//! |-----------|---------------------------------|--------|
//! | noise     | `(noise - 40) / 60 * 100`       | 0.40   |
//! | temp      | `(temperature - 15) / 25 * 100` | 0.25   |
//! | aqi       | `air_quality / 150 * 100`       | 0.20   |
//! | crowd     | `crowd_density / 30 * 100`      | 0.15   |
//!
//! Each sub-score is clamped to `[0, 100]` and the rounded composite is
//! therefore an integer in `[0, 100]`.

use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};
use std::path::Path;
use urbansense_testdata::{read_records, write_records, DatasetError, Reading, ZoneType};

/// Hours counted as rush hours.
pub const PEAK_HOURS: [u32; 5] = [8, 9, 17, 18, 19];

/// Stress index above which an anomaly counts as high-stress.
pub const HIGH_STRESS_THRESHOLD: u8 = 80;

const NOISE_WEIGHT: f64 = 0.40;
const TEMP_WEIGHT: f64 = 0.25;
const AQI_WEIGHT: f64 = 0.20;
const CROWD_WEIGHT: f64 = 0.15;

/// The four stress sub-scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressScores {
    pub noise: f64,
    pub temperature: f64,
    pub air_quality: f64,
    pub crowd_density: f64,
}

impl StressScores {
    /// Sub-scores for raw magnitudes.
    pub fn new(noise: f64, temperature: f64, air_quality: f64, crowd_density: f64) -> Self {
        Self {
            noise: bounded((noise - 40.0) / 60.0 * 100.0),
            temperature: bounded((temperature - 15.0) / 25.0 * 100.0),
            air_quality: bounded(air_quality / 150.0 * 100.0),
            crowd_density: bounded(crowd_density / 30.0 * 100.0),
        }
    }

    /// Sub-scores for a reading.
    pub fn from_reading(reading: &Reading) -> Self {
        Self::new(
            reading.noise,
            reading.temperature,
            reading.air_quality,
            reading.crowd_density,
        )
    }

    /// Weighted, rounded composite.
    pub fn composite(&self) -> u8 {
        let weighted = NOISE_WEIGHT * self.noise
            + TEMP_WEIGHT * self.temperature
            + AQI_WEIGHT * self.air_quality
            + CROWD_WEIGHT * self.crowd_density;
        round_half_even(weighted).clamp(0.0, 100.0) as u8
    }
}

fn bounded(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Round to the nearest integer, ties to even.
fn round_half_even(value: f64) -> f64 {
    if (value - value.trunc()).abs() == 0.5 {
        2.0 * (value / 2.0).round()
    } else {
        value.round()
    }
}

/// Stress index of a reading, in `[0, 100]`.
pub fn stress_index(reading: &Reading) -> u8 {
    StressScores::from_reading(reading).composite()
}

/// Whether `hour` is a rush hour.
pub fn is_peak_hour(hour: u32) -> bool {
    PEAK_HOURS.contains(&hour)
}

/// A reading with derived calendar features and stress index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedReading {
    /// The unchanged source record.
    pub reading: Reading,
    /// Hour of day (0-23).
    pub hour: u32,
    /// Day of week, Monday = 0.
    pub day_of_week: u32,
    /// Calendar month (1-12).
    pub month: u32,
    pub is_peak_hour: bool,
    /// Saturday or Sunday.
    pub is_weekend: bool,
    /// Composite stress index (0-100).
    pub stress_index: u8,
}

impl EnrichedReading {
    /// Derive all features from `reading`.
    pub fn new(reading: Reading) -> Self {
        let ts = reading.timestamp;
        let hour = ts.hour();
        let day_of_week = ts.weekday().num_days_from_monday();
        let stress = stress_index(&reading);
        Self {
            hour,
            day_of_week,
            month: ts.month(),
            is_peak_hour: is_peak_hour(hour),
            is_weekend: day_of_week >= 5,
            stress_index: stress,
            reading,
        }
    }
}

impl AsRef<Reading> for EnrichedReading {
    fn as_ref(&self) -> &Reading {
        &self.reading
    }
}

/// Enrich every reading. Already-enriched input is recomputed from its
/// source reading, which yields identical features.
pub fn enrich<R: AsRef<Reading>>(readings: &[R]) -> Vec<EnrichedReading> {
    readings
        .iter()
        .map(|r| EnrichedReading::new(r.as_ref().clone()))
        .collect()
}

/// Enriched table columns, in file order.
pub const ENRICHED_COLUMNS: [&str; 14] = [
    "timestamp",
    "node_id",
    "node_name",
    "zone_type",
    "noise",
    "temperature",
    "air_quality",
    "crowd_density",
    "hour",
    "day_of_week",
    "month",
    "is_peak_hour",
    "is_weekend",
    "stress_index",
];

/// Flat row layout for tabular storage.
#[derive(Debug, Serialize, Deserialize)]
struct EnrichedRow {
    timestamp: chrono::NaiveDateTime,
    node_id: String,
    node_name: String,
    zone_type: ZoneType,
    noise: f64,
    temperature: f64,
    air_quality: f64,
    crowd_density: f64,
    hour: u32,
    day_of_week: u32,
    month: u32,
    is_peak_hour: u8,
    is_weekend: u8,
    stress_index: u8,
}

impl From<&EnrichedReading> for EnrichedRow {
    fn from(e: &EnrichedReading) -> Self {
        let r = &e.reading;
        Self {
            timestamp: r.timestamp,
            node_id: r.node_id.clone(),
            node_name: r.node_name.clone(),
            zone_type: r.zone_type,
            noise: r.noise,
            temperature: r.temperature,
            air_quality: r.air_quality,
            crowd_density: r.crowd_density,
            hour: e.hour,
            day_of_week: e.day_of_week,
            month: e.month,
            is_peak_hour: e.is_peak_hour as u8,
            is_weekend: e.is_weekend as u8,
            stress_index: e.stress_index,
        }
    }
}

impl From<EnrichedRow> for EnrichedReading {
    fn from(row: EnrichedRow) -> Self {
        Self {
            reading: Reading {
                timestamp: row.timestamp,
                node_id: row.node_id,
                node_name: row.node_name,
                zone_type: row.zone_type,
                noise: row.noise,
                temperature: row.temperature,
                air_quality: row.air_quality,
                crowd_density: row.crowd_density,
            },
            hour: row.hour,
            day_of_week: row.day_of_week,
            month: row.month,
            is_peak_hour: row.is_peak_hour != 0,
            is_weekend: row.is_weekend != 0,
            stress_index: row.stress_index,
        }
    }
}

/// Write an enriched table as CSV. Flags are stored as 0/1.
pub fn save_enriched(
    path: impl AsRef<Path>,
    readings: &[EnrichedReading],
) -> Result<(), DatasetError> {
    let rows: Vec<EnrichedRow> = readings.iter().map(EnrichedRow::from).collect();
    write_records(path, &rows)
}

/// Read an enriched table written by [`save_enriched`].
pub fn load_enriched(path: impl AsRef<Path>) -> Result<Vec<EnrichedReading>, DatasetError> {
    let rows: Vec<EnrichedRow> = read_records(path, &ENRICHED_COLUMNS)?;
    Ok(rows.into_iter().map(EnrichedReading::from).collect())
}
