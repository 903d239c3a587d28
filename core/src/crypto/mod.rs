//! crypto/mod.rs
//! Password-derived authenticated envelope.
//!
//! Layers, bottom up:
//! - `nonce`: fresh salts and nonces from the OS RNG
//! - `kdf`: PBKDF2-HMAC-SHA256 master key, HKDF-expanded per cipher suite
//! - `aead`: AES-256-GCM / ChaCha20-Poly1305
//! - `digest`: SHA-256 checksum over the ciphertext
//! - `envelope`: seal/open and the `{salt, data, checksum}` wire form

pub mod types;
pub mod aead;
pub mod kdf;
pub mod nonce;
pub mod digest;
pub mod envelope;

pub use types::*;
pub use aead::*;
pub use kdf::*;
pub use nonce::*;
pub use digest::*;
pub use envelope::*;
