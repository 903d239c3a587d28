use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::cipher_ids;
use crate::utils::enum_name_or_hex;

/// Stable key and nonce sizes.
pub const KEY_LEN_32: usize = 32;

/// Standard 12-byte nonce length for AES-GCM and ChaCha20-Poly1305.
pub const NONCE_LEN_12: usize = 12;

/// Fixed AEAD tag length (bytes).
pub const TAG_LEN: usize = 16;

/// AEAD cipher suites.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherSuite {
    Aes256Gcm        = cipher_ids::AES256_GCM,
    Chacha20Poly1305 = cipher_ids::CHACHA20_POLY1305,
}

impl Default for CipherSuite {
    fn default() -> Self {
        CipherSuite::Aes256Gcm
    }
}

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Unsupported cipher suite ID.
    #[error("unsupported cipher suite: {}", cipher_label(.cipher_id))]
    UnsupportedCipher { cipher_id: u16 },

    /// Invalid key length provided to cipher.
    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidKeyLen { expected: usize, actual: usize },

    /// Nonce length mismatch (must be 12 bytes for supported ciphers).
    #[error("invalid nonce length: expected={expected}, actual={actual}")]
    InvalidNonceLen { expected: usize, actual: usize },

    /// Salt is invalid (all zeros).
    #[error("invalid salt: all zeros")]
    InvalidSalt,

    /// AEAD tag mismatch (authentication failure).
    #[error("AEAD tag mismatch")]
    TagMismatch,

    /// General derivation or runtime error with context.
    #[error("crypto failure: {0}")]
    Failure(String),
}

fn cipher_label(raw: &u16) -> String {
    enum_name_or_hex::<CipherSuite>(*raw)
}
