// UrbanSense Testdata - Anomaly injection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Anomaly injection for testing anomaly detection systems.
//!
//! A fixed fraction of records is sampled without replacement and each one
//! receives exactly one perturbation of a single field. No label is written
//! into the record: detectors have to find the perturbed rows unsupervised.
//! The returned [`InjectionReport`] records what was changed.

use crate::dataset::{Dataset, Reading};
use crate::patterns::Dimension;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Injection error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InjectionError {
    #[error("Invalid anomaly rate {0}: must be within [0, 1]")]
    InvalidRate(f64),
}

/// Class of anomaly to inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// `noise <- min(100, noise * 1.5 + U(10, 20))`
    NoiseSpike,
    /// `temperature <- min(45, temperature * 1.2 + U(3, 6))`
    HeatWave,
    /// `air_quality <- min(400, air_quality * 1.8 + U(30, 60))`
    PollutionEvent,
    /// `crowd_density <- min(50, crowd_density * 2 + U(5, 15))`
    CrowdSurge,
}

impl AnomalyKind {
    /// All kinds, drawn from uniformly.
    pub const ALL: [AnomalyKind; 4] = [
        AnomalyKind::NoiseSpike,
        AnomalyKind::HeatWave,
        AnomalyKind::PollutionEvent,
        AnomalyKind::CrowdSurge,
    ];

    /// The field this kind rewrites.
    pub fn dimension(&self) -> Dimension {
        match self {
            AnomalyKind::NoiseSpike => Dimension::Noise,
            AnomalyKind::HeatWave => Dimension::Temperature,
            AnomalyKind::PollutionEvent => Dimension::AirQuality,
            AnomalyKind::CrowdSurge => Dimension::CrowdDensity,
        }
    }

    /// Ceiling applied after perturbation.
    ///
    /// Air quality and crowd density may exceed the generation range.
    pub fn ceiling(&self) -> f64 {
        match self {
            AnomalyKind::NoiseSpike => 100.0,
            AnomalyKind::HeatWave => 45.0,
            AnomalyKind::PollutionEvent => 400.0,
            AnomalyKind::CrowdSurge => 50.0,
        }
    }

    fn gain(&self) -> f64 {
        match self {
            AnomalyKind::NoiseSpike => 1.5,
            AnomalyKind::HeatWave => 1.2,
            AnomalyKind::PollutionEvent => 1.8,
            AnomalyKind::CrowdSurge => 2.0,
        }
    }

    fn offset_range(&self) -> (f64, f64) {
        match self {
            AnomalyKind::NoiseSpike => (10.0, 20.0),
            AnomalyKind::HeatWave => (3.0, 6.0),
            AnomalyKind::PollutionEvent => (30.0, 60.0),
            AnomalyKind::CrowdSurge => (5.0, 15.0),
        }
    }

    /// Perturbed value for `value`.
    pub fn perturb<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> f64 {
        let (low, high) = self.offset_range();
        let offset = rng.gen_range(low..high);
        (value * self.gain() + offset).min(self.ceiling())
    }

    /// Rewrite the targeted field of `reading`, returning the new value.
    pub fn apply<R: Rng + ?Sized>(&self, reading: &mut Reading, rng: &mut R) -> f64 {
        let field = reading.get_mut(self.dimension());
        *field = self.perturb(*field, rng);
        *field
    }
}

/// One perturbed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectedAnomaly {
    /// Position in the table.
    pub index: usize,
    pub kind: AnomalyKind,
    pub before: f64,
    pub after: f64,
}

/// Summary of an injection pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InjectionReport {
    /// Perturbed records, in sampling order.
    pub anomalies: Vec<InjectedAnomaly>,
}

impl InjectionReport {
    /// Number of perturbed records.
    pub fn len(&self) -> usize {
        self.anomalies.len()
    }

    /// True when nothing was injected.
    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    /// Number of records of a given kind.
    pub fn count(&self, kind: AnomalyKind) -> usize {
        self.anomalies.iter().filter(|a| a.kind == kind).count()
    }

    /// Indices of perturbed records.
    pub fn indices(&self) -> Vec<usize> {
        self.anomalies.iter().map(|a| a.index).collect()
    }
}

/// Number of records an injection pass at `rate` will touch.
pub fn anomaly_count(len: usize, rate: f64) -> Result<usize, InjectionError> {
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        return Err(InjectionError::InvalidRate(rate));
    }
    Ok((len as f64 * rate).floor() as usize)
}

/// Perturb `floor(len * rate)` distinct records in place.
pub fn inject_anomalies<R: Rng + ?Sized>(
    readings: &mut [Reading],
    rate: f64,
    rng: &mut R,
) -> Result<InjectionReport, InjectionError> {
    let count = anomaly_count(readings.len(), rate)?;
    let indices = rand::seq::index::sample(rng, readings.len(), count);

    let mut report = InjectionReport {
        anomalies: Vec::with_capacity(count),
    };
    for index in indices.iter() {
        let kind = AnomalyKind::ALL[rng.gen_range(0..AnomalyKind::ALL.len())];
        let reading = &mut readings[index];
        let before = reading.get(kind.dimension());
        let after = kind.apply(reading, rng);
        report.anomalies.push(InjectedAnomaly {
            index,
            kind,
            before,
            after,
        });
    }

    debug!(
        "Injected {} anomalies into {} readings (rate {})",
        report.len(),
        readings.len(),
        rate
    );
    Ok(report)
}

impl Dataset {
    /// Inject anomalies into this dataset, recording the count in metadata.
    pub fn inject_anomalies<R: Rng + ?Sized>(
        &mut self,
        rate: f64,
        rng: &mut R,
    ) -> Result<InjectionReport, InjectionError> {
        let report = inject_anomalies(self.readings_mut(), rate, rng)?;
        self.metadata.injected_anomalies = Some(report.len());
        Ok(report)
    }
}
