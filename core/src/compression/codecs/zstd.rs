//! src/compression/codecs/zstd.rs
//!
//! Zstd block compressor/decompressor.
//!
//! Design notes:
//! - Uses the bulk API: the payload is small and always held in memory.
//! - Decompression capacity comes from the frame's declared length.

use crate::compression::types::{CompressionError, Compressor, Decompressor};

pub struct ZstdCompressor {
    level: i32,
}

impl ZstdCompressor {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Compressor for ZstdCompressor {
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CompressionError> {
        let compressed = zstd::bulk::compress(input, self.level)
            .map_err(|e| CompressionError::CodecProcessFailed { codec: "zstd", msg: e.to_string() })?;
        out.extend_from_slice(&compressed);
        Ok(())
    }
}

pub struct ZstdDecompressor;

impl Decompressor for ZstdDecompressor {
    fn decompress_chunk(&mut self, input: &[u8], orig_len: usize, out: &mut Vec<u8>) -> Result<(), CompressionError> {
        let decompressed = zstd::bulk::decompress(input, orig_len)
            .map_err(|e| CompressionError::CodecProcessFailed { codec: "zstd", msg: e.to_string() })?;
        out.extend_from_slice(&decompressed);
        Ok(())
    }
}
