//! crypto/kdf.rs
//! Password-based key derivation for the watermark envelope.
//!
//! Design:
//! - PBKDF2-HMAC-SHA256(password, salt, iterations) -> 32-byte master key
//! - HKDF-Expand(master, info) -> AEAD key (32 bytes)
//!
//! Notes:
//! - The iteration count is the latency/security knob; it is taken from
//!   `EnvelopeConfig` and must match between seal and open.
//! - Info binds the envelope version and cipher suite, so the same password
//!   and salt never yield the same key for two different ciphers.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::constants::{MAGIC_WMK1, SALT_LEN};
use crate::crypto::nonce::validate_salt;
use crate::crypto::types::{CipherSuite, CryptoError, KEY_LEN_32};

#[inline]
/// Summary: Build HKDF 'info' binding envelope magic and cipher suite.
fn build_info(cipher: CipherSuite) -> Vec<u8> {
    let mut info = Vec::with_capacity(16);
    info.extend_from_slice(&MAGIC_WMK1);
    info.extend_from_slice(b"|aead|");
    info.extend_from_slice(&(cipher as u16).to_le_bytes());
    info
}

/// Summary: Stretch a password into a 32-byte master key with PBKDF2-HMAC-SHA256.
///
/// Errors:
/// - All-zero salt or zero iterations.
pub fn derive_master_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    iterations: u32,
) -> Result<[u8; KEY_LEN_32], CryptoError> {
    validate_salt(salt)?;
    if iterations == 0 {
        return Err(CryptoError::Failure("PBKDF2 iterations must be non-zero".into()));
    }

    let mut master = [0u8; KEY_LEN_32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut master);
    Ok(master)
}

/// Summary: Derive the AEAD key for `cipher` from a password and envelope salt.
/// Returns [u8;32].
///
/// Security notes:
/// - Never use the PBKDF2 output directly for AEAD; always expand.
pub fn derive_envelope_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    iterations: u32,
    cipher: CipherSuite,
) -> Result<[u8; KEY_LEN_32], CryptoError> {
    let master = derive_master_key(password, salt, iterations)?;

    let hk = Hkdf::<Sha256>::new(Some(salt), &master);
    let mut key = [0u8; KEY_LEN_32];
    hk.expand(&build_info(cipher), &mut key)
        .map_err(|_| CryptoError::Failure("HKDF expand failed (SHA-256)".into()))?;
    Ok(key)
}
