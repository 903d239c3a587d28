//! Deflate (zlib wrapper) via flate2.

use std::io::Read;
use std::io::Write;
use flate2::{Compression, write::ZlibEncoder, read::ZlibDecoder};

use crate::compression::types::{Compressor, Decompressor, CompressionError};

pub struct DeflateCompressor {
    level: Compression,
}

impl DeflateCompressor {
    pub fn new(level: i32) -> Self {
        let lvl = match level {
            0..=9 => Compression::new(level as u32),
            _ => Compression::default(),
        };
        Self { level: lvl }
    }
}

impl Compressor for DeflateCompressor {
    fn compress_chunk(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), CompressionError> {
        let mut enc = ZlibEncoder::new(Vec::new(), self.level);
        enc.write_all(input)
            .map_err(|e| CompressionError::CodecProcessFailed { codec: "deflate", msg: e.to_string() })?;
        let compressed = enc.finish()
            .map_err(|e| CompressionError::CodecProcessFailed { codec: "deflate", msg: e.to_string() })?;
        out.extend_from_slice(&compressed);
        Ok(())
    }
}

pub struct DeflateDecompressor;

impl Decompressor for DeflateDecompressor {
    fn decompress_chunk(&mut self, input: &[u8], orig_len: usize, out: &mut Vec<u8>) -> Result<(), CompressionError> {
        // Read one byte past the declared length so a lying prefix is caught
        // without inflating an unbounded stream.
        let mut dec = ZlibDecoder::new(input).take(orig_len as u64 + 1);
        let mut decompressed = Vec::with_capacity(orig_len);
        dec.read_to_end(&mut decompressed)
            .map_err(|e| CompressionError::CodecProcessFailed { codec: "deflate", msg: e.to_string() })?;

        if decompressed.len() != orig_len {
            return Err(CompressionError::LengthMismatch { expected: orig_len, actual: decompressed.len() });
        }
        out.extend_from_slice(&decompressed);
        Ok(())
    }
}
