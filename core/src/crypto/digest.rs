use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use sha2::{Digest as _, Sha256};

use crate::constants::WATERMARK_ID_LEN;

/// Raw SHA-256 of `data`.
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Base64 (standard alphabet, padded) of SHA-256 over `data`.
/// This is the envelope `checksum` field.
pub fn sha256_b64(data: &[u8]) -> String {
    B64.encode(sha256(data))
}

/// Recompute the checksum over `data` and compare with `expected`.
///
/// The comparison runs over the decoded digest bytes; an `expected` that is not
/// valid base64 simply does not match.
pub fn verify_checksum(data: &[u8], expected: &str) -> bool {
    match B64.decode(expected) {
        Ok(bytes) if bytes.len() == 32 => {
            let actual = sha256(data);
            bytes.iter().zip(actual.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
        }
        Ok(_) => false,
        Err(_) => false,
    }
}

/// Short slot identifier: first eight lowercase hex chars of SHA-256(`data`).
pub fn watermark_id(data: &[u8]) -> String {
    let mut id = hex::encode(sha256(data));
    id.truncate(WATERMARK_ID_LEN);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn checksum_verifies_and_rejects() {
        let sum = sha256_b64(b"payload");
        assert!(verify_checksum(b"payload", &sum));
        assert!(!verify_checksum(b"payl0ad", &sum));
        assert!(!verify_checksum(b"payload", "not base64!"));
    }

    #[test]
    fn watermark_id_is_eight_hex_chars() {
        assert_eq!(watermark_id(b"abc"), "ba7816bf");
    }
}
