use thiserror::Error;

use crate::container::ContainerKind;
use crate::crypto::EnvelopeError;

/// I/O or container-format failure, tagged with where it happened.
#[derive(Debug, Error)]
#[error("{kind} {location}: {source:#}")]
pub struct AdapterError {
    pub kind: ContainerKind,
    /// Location name, or `package` for whole-container open/save.
    pub location: &'static str,
    #[source]
    pub source: anyhow::Error,
}

impl AdapterError {
    pub fn new(kind: ContainerKind, location: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self { kind, location, source: source.into() }
    }

    pub fn package(kind: ContainerKind, source: impl Into<anyhow::Error>) -> Self {
        Self::new(kind, "package", source)
    }
}

/// Failure reasons surfaced by the engine.
/// - Messages aim to be stable; they end up in front-end responses.
#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("no watermark found")]
    NotFound,

    /// Checksum mismatch or a stored value that is not an envelope.
    #[error("watermark integrity check failed: {0}")]
    Integrity(String),

    /// Wrong password or corrupted ciphertext.
    #[error("watermark could not be decrypted")]
    Decrypt,

    /// Present locations hold different values.
    #[error("watermark locations disagree ({distinct} distinct values)")]
    Consistency { distinct: usize },

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("no location could be written ({attempted} attempted)")]
    NoLocationWritten { attempted: usize },

    #[error("watermark was sealed for {sealed}, not {actual}")]
    KindMismatch { sealed: ContainerKind, actual: ContainerKind },

    #[error("unsupported file type: {0}")]
    UnsupportedKind(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Sealing itself failed (RNG, KDF or serializer).
    #[error("sealing failed: {0}")]
    Seal(String),
}

impl From<EnvelopeError> for WatermarkError {
    fn from(e: EnvelopeError) -> Self {
        match e {
            EnvelopeError::Integrity(msg) => WatermarkError::Integrity(msg),
            EnvelopeError::Decrypt => WatermarkError::Decrypt,
            EnvelopeError::Config(msg) => WatermarkError::Config(msg),
            other => WatermarkError::Seal(other.to_string()),
        }
    }
}
