//! crypto/nonce.rs
//! Fresh salts and nonces.
//!
//! Design:
//! - Every seal draws a new 16-byte salt and a new 12-byte nonce from the OS RNG.
//! - The salt feeds PBKDF2, so every envelope is under a distinct key; the
//!   random nonce is kept anyway so a salt collision alone cannot repeat a
//!   (key, nonce) pair.
//!
//! Security notes:
//! - Do not accept all-zero salts. Validate before deriving.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::constants::SALT_LEN;
use crate::crypto::types::{CryptoError, NONCE_LEN_12};

/// Draw a fresh PBKDF2 salt.
pub fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    // An all-zero draw is rejected by validate_salt; retry instead of failing.
    loop {
        OsRng.fill_bytes(&mut salt);
        if validate_salt(&salt).is_ok() {
            return salt;
        }
    }
}

/// Draw a fresh 12-byte AEAD nonce.
pub fn random_nonce_12() -> [u8; NONCE_LEN_12] {
    let mut nonce = [0u8; NONCE_LEN_12];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Summary: Validate that salt is not all zeros.
#[inline]
pub fn validate_salt(salt: &[u8; SALT_LEN]) -> Result<(), CryptoError> {
    if salt.iter().all(|&b| b == 0) {
        return Err(CryptoError::InvalidSalt);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salts_are_fresh() {
        assert_ne!(random_salt(), random_salt());
    }

    #[test]
    fn zero_salt_is_rejected() {
        assert!(matches!(validate_salt(&[0u8; SALT_LEN]), Err(CryptoError::InvalidSalt)));
        assert!(validate_salt(&[1u8; SALT_LEN]).is_ok());
    }
}
