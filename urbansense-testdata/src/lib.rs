// UrbanSense Testdata - Synthetic urban sensor data
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # UrbanSense Testdata
//!
//! Layered synthetic time-series generator for a network of urban
//! environmental and crowd sensors.
//!
//! - **Pattern tables**: diurnal, seasonal and zone multipliers
//! - **Roster**: the fixed five-node Mohali deployment
//! - **Generator**: per-node, per-timestamp readings with multiplicative noise
//! - **Anomaly injection**: noise spikes, heat waves, pollution events, crowd surges
//! - **Dataset I/O**: CSV import/export and summary statistics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use urbansense_testdata::{generate_dataset, mohali_roster, GeneratorConfig};
//! use rand::SeedableRng;
//!
//! // One day at 5-minute resolution
//! let config = GeneratorConfig::new()
//!     .with_duration_days(1)
//!     .with_interval_minutes(5)
//!     .with_seed(42);
//!
//! let mut dataset = generate_dataset(&config, &mohali_roster());
//!
//! // Perturb 2% of the records
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! dataset.inject_anomalies(0.02, &mut rng).unwrap();
//!
//! dataset.to_csv("mohali_sensor_data.csv").unwrap();
//! ```

pub mod anomalies;
pub mod dataset;
pub mod generator;
pub mod patterns;
pub mod roster;

// Re-exports for convenience
pub use anomalies::{
    anomaly_count, inject_anomalies, AnomalyKind, InjectedAnomaly, InjectionError,
    InjectionReport,
};
pub use dataset::{
    read_records, write_records, Dataset, DatasetError, DatasetMetadata, Reading, SensorStats,
    READING_COLUMNS,
};
pub use generator::{
    generate_dataset, generation_range, relative_noise, GeneratorConfig, SeriesGenerator,
};
pub use patterns::{classify_season, Dimension, Multipliers, PatternModel, Season, ZoneType};
pub use roster::{mohali_roster, SensorNode};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
