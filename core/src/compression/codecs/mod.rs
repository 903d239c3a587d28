//! compression/codecs/mod.rs
//! Codec bodies. Framing (length prefix, crc trailer) lives in the registry.

pub mod deflate;
pub mod lz4;
pub mod stored;
pub mod zstd;
