//! Error types for UrbanSense
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;
use urbansense_testdata::{DatasetError, InjectionError};

/// Result type alias for UrbanSense operations
pub type Result<T> = std::result::Result<T, UrbanSenseError>;

/// Main error type for UrbanSense operations
#[derive(Error, Debug)]
pub enum UrbanSenseError {
    /// Predict, score or evaluate called before fit
    #[error("Detector is not fitted: call fit before {operation}")]
    NotFitted { operation: &'static str },

    /// Fit called on an empty batch
    #[error("Empty dataset: cannot {operation} on zero records")]
    EmptyDataset { operation: &'static str },

    /// Parameter outside its valid range
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Dataset load/save error
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Anomaly injection error
    #[error("Injection error: {0}")]
    Injection(#[from] InjectionError),

    /// Model file error
    #[error("Model file error: {0}")]
    ModelFile(#[from] ModelFileError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl UrbanSenseError {
    /// True when the error is the recoverable missing-dataset condition.
    pub fn is_missing_data(&self) -> bool {
        matches!(self, UrbanSenseError::Dataset(e) if e.is_missing())
    }
}

/// Errors reading or writing model blobs
#[derive(Error, Debug)]
pub enum ModelFileError {
    /// Wrong magic bytes
    #[error("Invalid magic: expected {expected:?}, got {actual:?}")]
    InvalidMagic { expected: [u8; 4], actual: [u8; 4] },

    /// Unsupported format version
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u32),

    /// Blob kind does not match the requested one
    #[error("Wrong blob kind: expected {expected}, got {actual}")]
    WrongKind { expected: u8, actual: u8 },

    /// Invalid checksum
    #[error("Invalid checksum: expected {expected:08x}, got {actual:08x}")]
    InvalidChecksum { expected: u32, actual: u32 },

    /// Buffer too short
    #[error("Buffer too short: need at least {needed} bytes, got {available}")]
    BufferTooShort { needed: usize, available: usize },

    /// Payload decodes but violates model invariants
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Payload encoding error
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),
}
