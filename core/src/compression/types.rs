//! compression/types.rs
//! Codec registry enum, error type and the codec traits.
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compression::constants::codec_ids;
use crate::utils::enum_name_or_hex;

/// Compression codec identifiers.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, TryFromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    Stored  = codec_ids::STORED,
    Zstd    = codec_ids::ZSTD,
    Lz4     = codec_ids::LZ4,
    Deflate = codec_ids::DEFLATE,
}

impl Default for CompressionCodec {
    /// zlib, as the first generation of watermarks used.
    fn default() -> Self {
        CompressionCodec::Deflate
    }
}

impl CompressionCodec {
    pub fn verify(raw: u16) -> Result<Self, CompressionError> {
        Self::try_from_primitive(raw).map_err(|_| CompressionError::UnsupportedCodec { codec_id: raw })
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressionCodec::Stored => "stored",
            CompressionCodec::Zstd => "zstd",
            CompressionCodec::Lz4 => "lz4",
            CompressionCodec::Deflate => "deflate",
        }
    }
}

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("unsupported compression codec: {}", codec_label(.codec_id))]
    UnsupportedCodec { codec_id: u16 },

    #[error("invalid compression level {level} for {codec}")]
    InvalidLevel { codec: &'static str, level: i32 },

    #[error("codec {codec} process failed: {msg}")]
    CodecProcessFailed { codec: &'static str, msg: String },

    #[error("compression frame truncated: {have} bytes, need at least {need}")]
    Truncated { have: usize, need: usize },

    #[error("declared plaintext too large: {have} > {max}")]
    TooLarge { have: usize, max: usize },

    #[error("decoded size {actual} != declared {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("crc32 mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

fn codec_label(raw: &u16) -> String {
    enum_name_or_hex::<CompressionCodec>(*raw)
}

pub trait Compressor: Send {
    /// Compress `input` into `out` (codec body only, no frame).
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CompressionError>;
}

pub trait Decompressor: Send {
    /// Decompress a codec body whose plaintext is exactly `orig_len` bytes.
    fn decompress_chunk(&mut self, input: &[u8], orig_len: usize, out: &mut Vec<u8>) -> Result<(), CompressionError>;
}
