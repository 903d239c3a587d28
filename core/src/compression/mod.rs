//! compression/mod.rs
//! One-shot compression of the serialized watermark before encryption.
//!
//! Design notes:
//! - Every compressed blob is a self-describing frame:
//!   `[codec u16 LE][orig_len u32 LE][body][crc32(orig) u32 LE]`.
//! - The frame lives inside the ciphertext, so the codec choice never shows
//!   on the wire and `open` does not need to be told which codec was used.
//! - Registry resolves codec IDs to implementations.

pub mod constants;
pub mod types;
pub mod registry;
pub mod codecs;

pub use constants::*;
pub use types::*;
pub use registry::*;
