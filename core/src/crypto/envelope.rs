//! crypto/envelope.rs
//! Password-sealed envelope around a serializable value.
//!
//! Seal:
//!   value -> compact JSON -> compression frame -> AEAD(nonce) -> nonce || ct
//!   checksum = base64(SHA-256(nonce || ct))
//!
//! Open:
//!   checksum first (Integrity), then KDF -> AEAD -> frame -> JSON.
//!   Every failure past the checksum is reported as one `Decrypt`, so a wrong
//!   password and a corrupted body look the same to the caller.
//!
//! Wire form: `{"salt": b64, "data": b64(nonce || ct), "checksum": b64}`.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::compression::{compress_frame, decompress_frame, validate_level, CompressionCodec, CompressionError};
use crate::constants::{DEFAULT_KDF_ITERATIONS, MAGIC_WMK1, MIN_KDF_ITERATIONS, SALT_LEN};
use crate::crypto::aead::AeadImpl;
use crate::crypto::digest::{sha256_b64, verify_checksum};
use crate::crypto::kdf::derive_envelope_key;
use crate::crypto::nonce::{random_nonce_12, random_salt};
use crate::crypto::types::{CipherSuite, CryptoError, NONCE_LEN_12, TAG_LEN};
use crate::telemetry::{Stage, TelemetryCounters, TelemetryTimer};

#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Checksum mismatch or a wire string that is not an envelope.
    #[error("envelope integrity check failed: {0}")]
    Integrity(String),

    /// Wrong password or corrupted ciphertext. Deliberately carries no detail.
    #[error("envelope could not be decrypted")]
    Decrypt,

    #[error("invalid envelope config: {0}")]
    Config(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error("envelope serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Tunables for sealing. Opening must use the same `kdf_iterations` and `cipher`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub kdf_iterations: u32,
    pub cipher: CipherSuite,
    pub compression: CompressionCodec,
    pub compression_level: Option<i32>,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            cipher: CipherSuite::default(),
            compression: CompressionCodec::default(),
            compression_level: None,
        }
    }
}

impl EnvelopeConfig {
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(EnvelopeError::Config(format!(
                "kdf_iterations {} below minimum {}",
                self.kdf_iterations, MIN_KDF_ITERATIONS
            )));
        }
        validate_level(self.compression, self.compression_level)
            .map_err(|e| EnvelopeError::Config(e.to_string()))
    }
}

/// A sealed value. `checksum == base64(SHA-256(ciphertext))` for every
/// envelope produced by `Envelope::seal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireEnvelope", try_from = "WireEnvelope")]
pub struct EncryptedEnvelope {
    pub salt: [u8; SALT_LEN],
    /// `nonce || aead_output`
    pub ciphertext: Vec<u8>,
    pub checksum: String,
}

/// Persisted JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireEnvelope {
    pub salt: String,
    pub data: String,
    pub checksum: String,
}

impl From<EncryptedEnvelope> for WireEnvelope {
    fn from(env: EncryptedEnvelope) -> Self {
        Self {
            salt: B64.encode(env.salt),
            data: B64.encode(&env.ciphertext),
            checksum: env.checksum,
        }
    }
}

impl TryFrom<WireEnvelope> for EncryptedEnvelope {
    type Error = EnvelopeError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        let salt_bytes = B64
            .decode(&wire.salt)
            .map_err(|e| EnvelopeError::Integrity(format!("salt: {e}")))?;
        let salt: [u8; SALT_LEN] = salt_bytes.as_slice().try_into().map_err(|_| {
            EnvelopeError::Integrity(format!("salt length {} != {}", salt_bytes.len(), SALT_LEN))
        })?;
        let ciphertext = B64
            .decode(&wire.data)
            .map_err(|e| EnvelopeError::Integrity(format!("data: {e}")))?;
        Ok(Self { salt, ciphertext, checksum: wire.checksum })
    }
}

impl EncryptedEnvelope {
    /// Compact JSON wire string.
    pub fn to_wire(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(&WireEnvelope::from(self.clone()))?)
    }

    /// Parse a wire string. Anything that is not a well-formed envelope is an
    /// integrity failure.
    pub fn from_wire(s: &str) -> Result<Self, EnvelopeError> {
        let wire: WireEnvelope = serde_json::from_str(s)
            .map_err(|e| EnvelopeError::Integrity(format!("wire json: {e}")))?;
        Self::try_from(wire)
    }

    /// Checksum recomputed over the ciphertext matches the stored one.
    pub fn checksum_ok(&self) -> bool {
        verify_checksum(&self.ciphertext, &self.checksum)
    }
}

/// Seals and opens values under a fixed `EnvelopeConfig`.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    config: EnvelopeConfig,
}

impl Envelope {
    pub fn new(config: EnvelopeConfig) -> Result<Self, EnvelopeError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    pub fn seal<T: Serialize>(&self, value: &T, password: &str) -> Result<EncryptedEnvelope, EnvelopeError> {
        let mut timer = TelemetryTimer::new();
        let mut counters = TelemetryCounters::default();
        self.seal_timed(value, password, &mut timer, &mut counters)
    }

    /// Summary: `seal` that charges stage times and byte counts to the caller's telemetry.
    pub fn seal_timed<T: Serialize>(
        &self,
        value: &T,
        password: &str,
        timer: &mut TelemetryTimer,
        counters: &mut TelemetryCounters,
    ) -> Result<EncryptedEnvelope, EnvelopeError> {
        let cfg = &self.config;
        let plaintext = serde_json::to_vec(value)?;

        let frame = timer.time(Stage::Compress, || {
            compress_frame(cfg.compression, cfg.compression_level, &plaintext)
        })?;

        let salt = random_salt();
        let key = timer.time(Stage::Kdf, || {
            derive_envelope_key(password, &salt, cfg.kdf_iterations, cfg.cipher)
        })?;
        let aead = AeadImpl::from_suite(cfg.cipher, &key)?;

        let nonce = random_nonce_12();
        let sealed = timer.time(Stage::Encrypt, || aead.seal(&nonce, &MAGIC_WMK1, &frame))?;

        let mut ciphertext = Vec::with_capacity(NONCE_LEN_12 + sealed.len());
        ciphertext.extend_from_slice(&nonce);
        ciphertext.extend_from_slice(&sealed);
        let checksum = sha256_b64(&ciphertext);

        counters.add_envelope(plaintext.len(), frame.len(), ciphertext.len());
        debug!(
            cipher = ?cfg.cipher,
            codec = cfg.compression.name(),
            plaintext = plaintext.len(),
            framed = frame.len(),
            ciphertext = ciphertext.len(),
            "sealed envelope"
        );

        Ok(EncryptedEnvelope { salt, ciphertext, checksum })
    }

    pub fn open<T: DeserializeOwned>(&self, env: &EncryptedEnvelope, password: &str) -> Result<T, EnvelopeError> {
        let mut timer = TelemetryTimer::new();
        self.open_timed(env, password, &mut timer)
    }

    /// Summary: `open` with stage timing.
    ///
    /// Errors:
    /// - `Integrity` when the checksum does not match; nothing is decrypted.
    /// - `Decrypt` for any later failure.
    pub fn open_timed<T: DeserializeOwned>(
        &self,
        env: &EncryptedEnvelope,
        password: &str,
        timer: &mut TelemetryTimer,
    ) -> Result<T, EnvelopeError> {
        let cfg = &self.config;

        if !timer.time(Stage::Validate, || env.checksum_ok()) {
            return Err(EnvelopeError::Integrity("checksum mismatch".into()));
        }
        if env.ciphertext.len() < NONCE_LEN_12 + TAG_LEN {
            return Err(EnvelopeError::Decrypt);
        }

        let key = timer
            .time(Stage::Kdf, || derive_envelope_key(password, &env.salt, cfg.kdf_iterations, cfg.cipher))
            .map_err(|_| EnvelopeError::Decrypt)?;
        let aead = AeadImpl::from_suite(cfg.cipher, &key).map_err(|_| EnvelopeError::Decrypt)?;

        let (nonce, body) = env.ciphertext.split_at(NONCE_LEN_12);
        let frame = timer
            .time(Stage::Decrypt, || aead.open(nonce, &MAGIC_WMK1, body))
            .map_err(|_| EnvelopeError::Decrypt)?;
        let plaintext = timer
            .time(Stage::Decompress, || decompress_frame(&frame))
            .map_err(|_| EnvelopeError::Decrypt)?;

        serde_json::from_slice(&plaintext).map_err(|_| EnvelopeError::Decrypt)
    }
}

/// Seal `value` with the default configuration.
pub fn seal<T: Serialize>(value: &T, password: &str) -> Result<EncryptedEnvelope, EnvelopeError> {
    Envelope::default().seal(value, password)
}

/// Open `env` with the default configuration.
pub fn open<T: DeserializeOwned>(env: &EncryptedEnvelope, password: &str) -> Result<T, EnvelopeError> {
    Envelope::default().open(env, password)
}
