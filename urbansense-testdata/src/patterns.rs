// UrbanSense Testdata - Multiplier patterns
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Multiplicative pattern tables for urban sensor data.
//!
//! Three independent factor sets shape every generated reading:
//!
//! - **Diurnal**: keyed by hour of day (0-23). Crowd and noise follow a
//!   bimodal rush-hour profile, temperature a single afternoon peak.
//! - **Seasonal**: keyed by [`Season`], derived from the calendar month.
//! - **Zone**: keyed by [`ZoneType`] (land use of the node).
//!
//! Each lookup yields a [`Multipliers`] value covering the four measured
//! [`Dimension`]s. The tables are hand-tuned for the Mohali/Chandigarh region
//! and are plain `const` data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four measured magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Sound level in dB.
    Noise,
    /// Air temperature in °C.
    Temperature,
    /// Air quality index.
    AirQuality,
    /// People per observed area.
    CrowdDensity,
}

impl Dimension {
    /// All dimensions, in canonical column order.
    pub const ALL: [Dimension; 4] = [
        Dimension::Noise,
        Dimension::Temperature,
        Dimension::AirQuality,
        Dimension::CrowdDensity,
    ];

    /// Column name used in tabular output.
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Noise => "noise",
            Dimension::Temperature => "temperature",
            Dimension::AirQuality => "air_quality",
            Dimension::CrowdDensity => "crowd_density",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Calendar season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Summer,
    Monsoon,
    PostMonsoon,
    Winter,
}

impl Season {
    /// Classify a calendar month (1-12).
    ///
    /// March-June is summer, July-September monsoon, October-November
    /// post-monsoon, everything else winter.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=6 => Season::Summer,
            7..=9 => Season::Monsoon,
            10 | 11 => Season::PostMonsoon,
            _ => Season::Winter,
        }
    }

    /// Label used in tabular output.
    pub fn label(&self) -> &'static str {
        match self {
            Season::Summer => "summer",
            Season::Monsoon => "monsoon",
            Season::PostMonsoon => "post_monsoon",
            Season::Winter => "winter",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shorthand for [`Season::from_month`].
pub fn classify_season(month: u32) -> Season {
    Season::from_month(month)
}

/// Land-use type of the zone a node is installed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    Commercial,
    Residential,
    Mixed,
}

impl ZoneType {
    /// Label used in tabular output.
    pub fn label(&self) -> &'static str {
        match self {
            ZoneType::Commercial => "commercial",
            ZoneType::Residential => "residential",
            ZoneType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A factor per dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    pub noise: f64,
    pub temperature: f64,
    pub air_quality: f64,
    pub crowd_density: f64,
}

impl Multipliers {
    /// Identity factors.
    pub const ONE: Multipliers = Multipliers::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(noise: f64, temperature: f64, air_quality: f64, crowd_density: f64) -> Self {
        Self {
            noise,
            temperature,
            air_quality,
            crowd_density,
        }
    }

    /// Element-wise product, `self` applied first.
    pub fn then(self, other: Multipliers) -> Self {
        Self {
            noise: self.noise * other.noise,
            temperature: self.temperature * other.temperature,
            air_quality: self.air_quality * other.air_quality,
            crowd_density: self.crowd_density * other.crowd_density,
        }
    }

    /// Factor for a single dimension.
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Noise => self.noise,
            Dimension::Temperature => self.temperature,
            Dimension::AirQuality => self.air_quality,
            Dimension::CrowdDensity => self.crowd_density,
        }
    }
}

/// Hour-of-day factors, one 24-entry row per dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiurnalTable {
    pub noise: [f64; 24],
    pub temperature: [f64; 24],
    pub air_quality: [f64; 24],
    pub crowd_density: [f64; 24],
}

/// Per-season factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTable {
    pub summer: Multipliers,
    pub monsoon: Multipliers,
    pub post_monsoon: Multipliers,
    pub winter: Multipliers,
}

/// Per-zone factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneTable {
    pub commercial: Multipliers,
    pub residential: Multipliers,
    pub mixed: Multipliers,
}

/// The complete set of multiplier tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternModel {
    pub diurnal: DiurnalTable,
    pub seasonal: SeasonalTable,
    pub zone: ZoneTable,
}

impl PatternModel {
    /// Regional profile for Mohali, Punjab.
    pub const MOHALI: PatternModel = PatternModel {
        diurnal: DiurnalTable {
            noise: [
                0.6, 0.5, 0.5, 0.5, 0.55, 0.65, 0.75, 0.85, 0.95, 1.0, 0.95, 0.9, 0.85, 0.85,
                0.9, 0.95, 1.0, 1.05, 1.1, 1.05, 0.95, 0.85, 0.75, 0.65,
            ],
            temperature: [
                0.85, 0.82, 0.80, 0.78, 0.77, 0.78, 0.82, 0.88, 0.93, 0.97, 1.0, 1.02, 1.05,
                1.08, 1.1, 1.08, 1.05, 1.0, 0.95, 0.92, 0.90, 0.88, 0.87, 0.86,
            ],
            air_quality: [
                0.85, 0.82, 0.80, 0.80, 0.82, 0.88, 0.95, 1.05, 1.1, 1.05, 0.95, 0.90, 0.88,
                0.90, 0.92, 0.95, 1.0, 1.08, 1.12, 1.1, 1.05, 0.98, 0.92, 0.88,
            ],
            crowd_density: [
                0.1, 0.08, 0.05, 0.05, 0.1, 0.2, 0.4, 0.6, 0.85, 1.0, 0.95, 0.85, 0.75, 0.8,
                0.85, 0.9, 0.95, 1.1, 1.15, 1.1, 0.9, 0.7, 0.5, 0.3,
            ],
        },
        seasonal: SeasonalTable {
            summer: Multipliers::new(1.0, 1.3, 0.9, 0.9),
            monsoon: Multipliers::new(0.95, 0.85, 0.7, 0.85),
            post_monsoon: Multipliers::new(1.0, 0.9, 1.3, 1.0),
            winter: Multipliers::new(1.0, 0.65, 1.5, 1.1),
        },
        zone: ZoneTable {
            commercial: Multipliers::new(1.2, 1.05, 1.1, 1.3),
            residential: Multipliers::new(0.85, 0.98, 0.95, 0.7),
            mixed: Multipliers::ONE,
        },
    };

    /// Hour-of-day factors. Hours wrap modulo 24.
    pub fn diurnal(&self, hour: u32) -> Multipliers {
        let h = (hour % 24) as usize;
        Multipliers::new(
            self.diurnal.noise[h],
            self.diurnal.temperature[h],
            self.diurnal.air_quality[h],
            self.diurnal.crowd_density[h],
        )
    }

    /// Seasonal factors.
    pub fn seasonal(&self, season: Season) -> Multipliers {
        match season {
            Season::Summer => self.seasonal.summer,
            Season::Monsoon => self.seasonal.monsoon,
            Season::PostMonsoon => self.seasonal.post_monsoon,
            Season::Winter => self.seasonal.winter,
        }
    }

    /// Zone factors.
    pub fn zone(&self, zone: ZoneType) -> Multipliers {
        match zone {
            ZoneType::Commercial => self.zone.commercial,
            ZoneType::Residential => self.zone.residential,
            ZoneType::Mixed => self.zone.mixed,
        }
    }

    /// Combined factors: diurnal, then seasonal, then zone.
    pub fn combined(&self, hour: u32, month: u32, zone: ZoneType) -> Multipliers {
        self.diurnal(hour)
            .then(self.seasonal(Season::from_month(month)))
            .then(self.zone(zone))
    }
}

impl Default for PatternModel {
    fn default() -> Self {
        Self::MOHALI
    }
}
