//! Model blob files.
//!
//! A trained detector is stored as two independent blobs, the forest and
//! the scaler. Both share one little-endian layout:
//!
//! ```text
//! ┌───────────────────────────────┐
//! │ Magic "URBS"         4 bytes  │
//! │ Format version       4 bytes  │
//! │ Blob kind            1 byte   │
//! │ Payload length       4 bytes  │
//! │ CRC-32               4 bytes  │
//! ├───────────────────────────────┤
//! │ JSON payload                  │
//! └───────────────────────────────┘
//! ```
//!
//! The checksum covers every byte except the checksum field itself.

use crate::config::DetectorConfig;
use crate::detector::AnomalyDetector;
use crate::error::{ModelFileError, Result, UrbanSenseError};
use crate::forest::IsolationForest;
use crate::scaler::StandardScaler;
use crc::{Crc, CRC_32_ISO_HDLC};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Magic bytes for model blobs
pub const MODEL_MAGIC: [u8; 4] = *b"URBS";

/// Current blob format version
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Header size in bytes
pub const MODEL_HEADER_SIZE: usize = 17;

/// File name of the forest blob inside a models directory
pub const MODEL_FILE: &str = "anomaly_model.bin";

/// File name of the scaler blob inside a models directory
pub const SCALER_FILE: &str = "anomaly_scaler.bin";

const CHECKSUM_OFFSET: usize = 13;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Content type of a blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlobKind {
    /// Detector configuration and fitted forest
    Forest = 1,
    /// Fitted scaler statistics
    Scaler = 2,
}

#[derive(Serialize)]
struct ForestPayloadRef<'a> {
    config: &'a DetectorConfig,
    forest: &'a IsolationForest,
}

#[derive(Deserialize)]
struct ForestPayload {
    config: DetectorConfig,
    forest: IsolationForest,
}

fn checksum(header: &[u8], payload: &[u8]) -> u32 {
    let mut digest = CRC32.digest();
    digest.update(&header[..CHECKSUM_OFFSET]);
    digest.update(payload);
    digest.finalize()
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

/// Serialize `value` into a blob of the given kind.
pub fn encode_blob<T: Serialize>(kind: BlobKind, value: &T) -> Result<Vec<u8>> {
    let payload = serde_json::to_vec(value).map_err(ModelFileError::from)?;

    let mut bytes = Vec::with_capacity(MODEL_HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&MODEL_MAGIC);
    bytes.extend_from_slice(&MODEL_FORMAT_VERSION.to_le_bytes());
    bytes.push(kind as u8);
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());

    let crc = checksum(&bytes, &payload);
    bytes.extend_from_slice(&crc.to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Verify and deserialize a blob of the given kind.
pub fn decode_blob<T: DeserializeOwned>(kind: BlobKind, data: &[u8]) -> Result<T> {
    if data.len() < MODEL_HEADER_SIZE {
        return Err(ModelFileError::BufferTooShort {
            needed: MODEL_HEADER_SIZE,
            available: data.len(),
        }
        .into());
    }

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&data[0..4]);
    if magic != MODEL_MAGIC {
        return Err(ModelFileError::InvalidMagic {
            expected: MODEL_MAGIC,
            actual: magic,
        }
        .into());
    }

    let version = read_u32(data, 4);
    if version != MODEL_FORMAT_VERSION {
        return Err(ModelFileError::UnsupportedVersion(version).into());
    }

    if data[8] != kind as u8 {
        return Err(ModelFileError::WrongKind {
            expected: kind as u8,
            actual: data[8],
        }
        .into());
    }

    let payload_len = read_u32(data, 9) as usize;
    let needed = MODEL_HEADER_SIZE + payload_len;
    if data.len() < needed {
        return Err(ModelFileError::BufferTooShort {
            needed,
            available: data.len(),
        }
        .into());
    }
    let payload = &data[MODEL_HEADER_SIZE..needed];

    let stored = read_u32(data, CHECKSUM_OFFSET);
    let computed = checksum(data, payload);
    if stored != computed {
        return Err(ModelFileError::InvalidChecksum {
            expected: stored,
            actual: computed,
        }
        .into());
    }

    let value = serde_json::from_slice(payload).map_err(ModelFileError::from)?;
    Ok(value)
}

/// Locations of the two blobs of a saved detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
}

impl ModelPaths {
    /// Standard file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join(MODEL_FILE),
            scaler: dir.join(SCALER_FILE),
        }
    }
}

/// Write both blobs of a trained detector into `dir`, creating it if needed.
pub fn save_detector(detector: &AnomalyDetector, dir: impl AsRef<Path>) -> Result<ModelPaths> {
    let (Some(scaler), Some(forest)) = (detector.scaler(), detector.forest()) else {
        return Err(UrbanSenseError::NotFitted { operation: "save" });
    };

    let paths = ModelPaths::in_dir(&dir);
    std::fs::create_dir_all(dir.as_ref())?;

    let model_blob = encode_blob(
        BlobKind::Forest,
        &ForestPayloadRef {
            config: detector.config(),
            forest,
        },
    )?;
    std::fs::write(&paths.model, model_blob)?;
    std::fs::write(&paths.scaler, encode_blob(BlobKind::Scaler, scaler)?)?;

    info!(
        "Saved detector to {} and {}",
        paths.model.display(),
        paths.scaler.display()
    );
    Ok(paths)
}

/// Rebuild a trained detector from the blobs in `dir`.
pub fn load_detector(dir: impl AsRef<Path>) -> Result<AnomalyDetector> {
    let paths = ModelPaths::in_dir(dir);
    let model: ForestPayload = decode_blob(BlobKind::Forest, &std::fs::read(&paths.model)?)?;
    let scaler: StandardScaler = decode_blob(BlobKind::Scaler, &std::fs::read(&paths.scaler)?)?;
    model.forest.validate()?;

    debug!(
        "Loaded detector with {} trees from {}",
        model.forest.n_trees(),
        paths.model.display()
    );
    Ok(AnomalyDetector::from_parts(model.config, scaler, model.forest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaler::FeatureRow;
    use tempfile::tempdir;

    fn trained() -> (AnomalyDetector, Vec<urbansense_testdata::Reading>) {
        use rand::rngs::StdRng;
        use rand::SeedableRng;
        use urbansense_testdata::{mohali_roster, GeneratorConfig, SeriesGenerator};

        let config = GeneratorConfig::default().with_interval_minutes(60);
        let mut rng = StdRng::seed_from_u64(11);
        let data = SeriesGenerator::default().generate(&config, &mohali_roster(), &mut rng);
        let detector = AnomalyDetector::new(DetectorConfig::new().with_estimators(25))
            .fit(&data)
            .unwrap();
        (detector, data)
    }

    #[test]
    fn test_blob_roundtrip() {
        let rows: Vec<FeatureRow> = vec![[1.0, 2.0, 3.0, 4.0], [2.0, 3.0, 5.0, 8.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let blob = encode_blob(BlobKind::Scaler, &scaler).unwrap();
        assert_eq!(&blob[0..4], b"URBS");
        assert_eq!(blob[8], BlobKind::Scaler as u8);

        let restored: StandardScaler = decode_blob(BlobKind::Scaler, &blob).unwrap();
        assert_eq!(restored, scaler);
    }

    #[test]
    fn test_corrupted_payload() {
        let blob = encode_blob(BlobKind::Scaler, &vec![1u32, 2, 3]).unwrap();
        let mut corrupted = blob.clone();
        let last = corrupted.len() - 2;
        corrupted[last] ^= 0x01;

        let err = decode_blob::<Vec<u32>>(BlobKind::Scaler, &corrupted).unwrap_err();
        assert!(matches!(
            err,
            UrbanSenseError::ModelFile(ModelFileError::InvalidChecksum { .. })
        ));
    }

    #[test]
    fn test_header_checks() {
        let blob = encode_blob(BlobKind::Forest, &42u8).unwrap();

        let mut bad_magic = blob.clone();
        bad_magic[0..4].copy_from_slice(b"BADM");
        assert!(matches!(
            decode_blob::<u8>(BlobKind::Forest, &bad_magic),
            Err(UrbanSenseError::ModelFile(ModelFileError::InvalidMagic { .. }))
        ));

        let mut bad_version = blob.clone();
        bad_version[4..8].copy_from_slice(&7u32.to_le_bytes());
        assert!(matches!(
            decode_blob::<u8>(BlobKind::Forest, &bad_version),
            Err(UrbanSenseError::ModelFile(ModelFileError::UnsupportedVersion(7)))
        ));

        assert!(matches!(
            decode_blob::<u8>(BlobKind::Scaler, &blob),
            Err(UrbanSenseError::ModelFile(ModelFileError::WrongKind { .. }))
        ));

        assert!(matches!(
            decode_blob::<u8>(BlobKind::Forest, &blob[..10]),
            Err(UrbanSenseError::ModelFile(ModelFileError::BufferTooShort { .. }))
        ));
        assert!(matches!(
            decode_blob::<u8>(BlobKind::Forest, &blob[..blob.len() - 1]),
            Err(UrbanSenseError::ModelFile(ModelFileError::BufferTooShort { .. }))
        ));
    }

    #[test]
    fn test_save_load_detector() {
        let (detector, data) = trained();
        let dir = tempdir().unwrap();
        let paths = save_detector(&detector, dir.path().join("models")).unwrap();
        assert!(paths.model.exists());
        assert!(paths.scaler.exists());

        let loaded = load_detector(dir.path().join("models")).unwrap();
        assert!(loaded.is_fitted());
        assert_eq!(loaded.config().n_estimators, 25);
        assert_eq!(loaded.scaler(), detector.scaler());
        assert_eq!(loaded.predict(&data).unwrap(), detector.predict(&data).unwrap());
        assert_eq!(loaded.score(&data).unwrap(), detector.score(&data).unwrap());
    }

    #[test]
    fn test_load_rejects_malformed_forest() {
        let (detector, _) = trained();
        let dir = tempdir().unwrap();
        let paths = save_detector(&detector, dir.path()).unwrap();

        // Well-formed, correctly checksummed payload whose root splits on
        // a feature that does not exist
        let payload = serde_json::json!({
            "config": detector.config(),
            "forest": {
                "trees": [{"nodes": [
                    {"Split": {"feature": 9, "threshold": 0.0, "left": 1, "right": 2}},
                    {"Leaf": {"size": 1}},
                    {"Leaf": {"size": 1}}
                ]}],
                "sample_size": 2,
                "offset": -0.5
            }
        });
        std::fs::write(&paths.model, encode_blob(BlobKind::Forest, &payload).unwrap()).unwrap();

        let err = load_detector(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            UrbanSenseError::ModelFile(ModelFileError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_save_untrained_fails() {
        let dir = tempdir().unwrap();
        let err = save_detector(&AnomalyDetector::default(), dir.path()).unwrap_err();
        assert!(matches!(err, UrbanSenseError::NotFitted { .. }));
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = tempdir().unwrap();
        let err = load_detector(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, UrbanSenseError::Io(_)));
    }
}
