//! codecs/stored.rs
//! Pass-through codec.

use crate::compression::types::{CompressionError, Compressor, Decompressor};

pub struct StoredCompressor;
pub struct StoredDecompressor;

impl Compressor for StoredCompressor {
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CompressionError> {
        out.extend_from_slice(input);
        Ok(())
    }
}

impl Decompressor for StoredDecompressor {
    fn decompress_chunk(&mut self, input: &[u8], orig_len: usize, out: &mut Vec<u8>) -> Result<(), CompressionError> {
        if input.len() != orig_len {
            return Err(CompressionError::LengthMismatch { expected: orig_len, actual: input.len() });
        }
        out.extend_from_slice(input);
        Ok(())
    }
}
