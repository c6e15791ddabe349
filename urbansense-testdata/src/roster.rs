// UrbanSense Testdata - Sensor roster
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sensor node descriptors.
//!
//! A [`SensorNode`] carries the baseline magnitudes the generator scales with
//! the pattern tables. [`mohali_roster`] returns the fixed five-node
//! deployment.

use crate::patterns::{Dimension, ZoneType};
use serde::{Deserialize, Serialize};

/// Immutable description of a deployed sensor node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorNode {
    /// Unique node identifier.
    pub id: String,
    /// Human readable location.
    pub name: String,
    /// Land use of the surrounding zone.
    pub zone: ZoneType,
    /// Baseline noise level (dB).
    pub base_noise: f64,
    /// Baseline temperature (°C).
    pub base_temp: f64,
    /// Baseline air quality index.
    pub base_aqi: f64,
    /// Baseline crowd density.
    pub base_crowd: f64,
}

impl SensorNode {
    /// Create a node with all baselines at zero.
    pub fn new(id: &str, name: &str, zone: ZoneType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            zone,
            base_noise: 0.0,
            base_temp: 0.0,
            base_aqi: 0.0,
            base_crowd: 0.0,
        }
    }

    /// Set the four baselines (noise, temperature, air quality, crowd).
    pub fn with_baselines(mut self, noise: f64, temp: f64, aqi: f64, crowd: f64) -> Self {
        self.base_noise = noise;
        self.base_temp = temp;
        self.base_aqi = aqi;
        self.base_crowd = crowd;
        self
    }

    /// Baseline for one dimension.
    pub fn baseline(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Noise => self.base_noise,
            Dimension::Temperature => self.base_temp,
            Dimension::AirQuality => self.base_aqi,
            Dimension::CrowdDensity => self.base_crowd,
        }
    }
}

/// The five-node Mohali deployment, in roster order.
pub fn mohali_roster() -> Vec<SensorNode> {
    vec![
        SensorNode::new("CP-MOH-01", "IT Park Sector 70", ZoneType::Commercial)
            .with_baselines(58.0, 28.0, 85.0, 12.0),
        SensorNode::new("CP-MOH-02", "Phase 11", ZoneType::Residential)
            .with_baselines(48.0, 27.0, 75.0, 6.0),
        SensorNode::new("CP-MOH-03", "Phase 7", ZoneType::Mixed)
            .with_baselines(52.0, 27.5, 80.0, 10.0),
        SensorNode::new("CP-MOH-04", "Sector 77", ZoneType::Residential)
            .with_baselines(45.0, 26.5, 72.0, 5.0),
        SensorNode::new("CP-MOH-05", "Phase 3B2", ZoneType::Commercial)
            .with_baselines(60.0, 28.5, 88.0, 15.0),
    ]
}
