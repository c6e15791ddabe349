// UrbanSense Testdata - Core generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Core dataset generation logic.
//!
//! Every reading is built the same way, per dimension:
//!
//! ```text
//! multiplier = diurnal[hour] * seasonal[season] * zone[node.zone]
//! raw        = node.base * multiplier * (1 + N(0, sigma))
//! value      = clamp(raw, range)
//! ```
//!
//! Noise and temperature are then rounded to one decimal, air quality and
//! crowd density truncated to whole numbers.

use crate::dataset::{Dataset, DatasetMetadata, Reading};
use crate::patterns::{Dimension, PatternModel};
use crate::roster::SensorNode;
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, Timelike};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relative standard deviation of the multiplicative noise term.
pub fn relative_noise(dimension: Dimension) -> f64 {
    match dimension {
        Dimension::Noise => 0.08,
        Dimension::Temperature => 0.03,
        Dimension::AirQuality => 0.12,
        Dimension::CrowdDensity => 0.15,
    }
}

/// Valid range of a freshly generated value.
pub fn generation_range(dimension: Dimension) -> (f64, f64) {
    match dimension {
        Dimension::Noise => (35.0, 100.0),
        Dimension::Temperature => (10.0, 45.0),
        Dimension::AirQuality => (20.0, 300.0),
        Dimension::CrowdDensity => (0.0, 40.0),
    }
}

/// Generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// First timestamp (inclusive).
    pub start_time: NaiveDateTime,
    /// Last timestamp (inclusive).
    pub end_time: NaiveDateTime,
    /// Step between timestamps in minutes.
    pub interval_minutes: i64,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let start_time = NaiveDate::from_ymd_opt(2024, 2, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            start_time,
            end_time: start_time + Duration::days(1),
            interval_minutes: 5,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator config.
    pub fn new() -> Self {
        Self::default()
    }

    /// A window of `days` ending now (local time).
    pub fn trailing_days(days: i64, interval_minutes: i64) -> Self {
        let end_time = Local::now().naive_local();
        Self {
            start_time: end_time - Duration::days(days),
            end_time,
            interval_minutes,
            seed: None,
        }
    }

    /// Set start timestamp.
    pub fn with_start_time(mut self, start_time: NaiveDateTime) -> Self {
        self.start_time = start_time;
        self
    }

    /// Set end timestamp.
    pub fn with_end_time(mut self, end_time: NaiveDateTime) -> Self {
        self.end_time = end_time;
        self
    }

    /// Set the end to `days` after the start.
    pub fn with_duration_days(mut self, days: i64) -> Self {
        self.end_time = self.start_time + Duration::days(days);
        self
    }

    /// Set sample interval in minutes.
    pub fn with_interval_minutes(mut self, minutes: i64) -> Self {
        self.interval_minutes = minutes;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of timestamps in `[start_time, end_time]`.
    ///
    /// Zero when the range is inverted or the interval is not positive.
    pub fn step_count(&self) -> usize {
        if self.interval_minutes <= 0 || self.end_time < self.start_time {
            return 0;
        }
        let span = (self.end_time - self.start_time).num_seconds();
        (span / (self.interval_minutes * 60)) as usize + 1
    }

    /// Timestamp of step `i`.
    pub fn timestamp(&self, step: usize) -> NaiveDateTime {
        self.start_time + Duration::minutes(self.interval_minutes * step as i64)
    }
}

/// Produces readings from the pattern tables and a node roster.
#[derive(Debug, Clone, Default)]
pub struct SeriesGenerator {
    model: PatternModel,
}

impl SeriesGenerator {
    /// Create a generator over the given tables.
    pub fn new(model: PatternModel) -> Self {
        Self { model }
    }

    /// The tables in use.
    pub fn model(&self) -> &PatternModel {
        &self.model
    }

    /// Generate every node at every step, ordered by time then roster order.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        config: &GeneratorConfig,
        nodes: &[SensorNode],
        rng: &mut R,
    ) -> Vec<Reading> {
        let steps = config.step_count();
        let mut readings = Vec::with_capacity(steps * nodes.len());

        for step in 0..steps {
            let timestamp = config.timestamp(step);
            for node in nodes {
                readings.push(self.sample(timestamp, node, rng));
            }
        }

        debug!(
            "Generated {} readings ({} steps x {} nodes)",
            readings.len(),
            steps,
            nodes.len()
        );
        readings
    }

    /// Generate a single reading for `node` at `timestamp`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        timestamp: NaiveDateTime,
        node: &SensorNode,
        rng: &mut R,
    ) -> Reading {
        let multipliers = self
            .model
            .combined(timestamp.hour(), timestamp.month(), node.zone);

        // Draw order is fixed: noise, temperature, air quality, crowd
        let mut values = [0.0; 4];
        for (slot, dimension) in values.iter_mut().zip(Dimension::ALL) {
            let z: f64 = rng.sample(StandardNormal);
            let mut raw = node.baseline(dimension)
                * multipliers.get(dimension)
                * (1.0 + relative_noise(dimension) * z);
            if dimension == Dimension::CrowdDensity {
                raw = raw.max(0.0);
            }
            let (min, max) = generation_range(dimension);
            *slot = raw.clamp(min, max);
        }

        Reading {
            timestamp,
            node_id: node.id.clone(),
            node_name: node.name.clone(),
            zone_type: node.zone,
            noise: round1(values[0]),
            temperature: round1(values[1]),
            air_quality: values[2].trunc(),
            crowd_density: values[3].trunc(),
        }
    }
}

/// Round to one decimal, correctly rounded from the exact binary value
/// with ties to even.
fn round1(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

/// Generate a dataset from configuration.
///
/// Seeds from `config.seed` when set, from entropy otherwise.
pub fn generate_dataset(config: &GeneratorConfig, nodes: &[SensorNode]) -> Dataset {
    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let readings = SeriesGenerator::default().generate(config, nodes, &mut rng);
    let mut dataset = Dataset::new(readings);
    dataset.metadata = DatasetMetadata {
        name: None,
        seed: config.seed,
        interval_minutes: Some(config.interval_minutes),
        injected_anomalies: None,
    };
    dataset
}
