//! codecs/lz4.rs
//! LZ4 block compressor/decompressor (deterministic, no levels).
use lz4_flex::block::{compress, decompress};

use crate::compression::types::{CompressionError, Compressor, Decompressor};

pub struct Lz4Compressor;

pub struct Lz4Decompressor;

impl Compressor for Lz4Compressor {
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CompressionError> {
        // The frame already carries the original length, so no size prefix here.
        out.extend_from_slice(&compress(input));
        Ok(())
    }
}

impl Decompressor for Lz4Decompressor {
    fn decompress_chunk(&mut self, input: &[u8], orig_len: usize, out: &mut Vec<u8>) -> Result<(), CompressionError> {
        let decompressed = decompress(input, orig_len)
            .map_err(|e| CompressionError::CodecProcessFailed {
                codec: "lz4",
                msg: e.to_string(),
            })?;
        out.extend_from_slice(&decompressed);
        Ok(())
    }
}
