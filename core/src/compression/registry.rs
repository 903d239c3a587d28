//! compression/registry.rs
//! Codec registry, factory functions and the frame wrapper.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::compression::codecs::{deflate, lz4, stored, zstd};
use crate::compression::constants::*;
use crate::compression::types::{CompressionCodec, CompressionError, Compressor, Decompressor};
use crate::utils::compute_checksum;

pub struct CodecInfo {
    pub name: &'static str,
    pub default_level: i32,
    pub level_range: Option<(i32, i32)>,
}

pub fn resolve(codec: CompressionCodec) -> CodecInfo {
    match codec {
        CompressionCodec::Stored =>
            CodecInfo { name: "stored", default_level: 0, level_range: None },
        CompressionCodec::Zstd =>
            CodecInfo { name: "zstd", default_level: DEFAULT_LEVEL_ZSTD, level_range: Some((1, 22)) },
        CompressionCodec::Lz4 =>
            CodecInfo { name: "lz4", default_level: 0, level_range: None },
        CompressionCodec::Deflate =>
            CodecInfo { name: "deflate", default_level: DEFAULT_LEVEL_DEFLATE, level_range: Some((0, 9)) },
    }
}

/// Summary: Check a requested level against the codec's accepted range.
/// Codecs without levels accept anything (the value is ignored).
pub fn validate_level(codec: CompressionCodec, level: Option<i32>) -> Result<(), CompressionError> {
    let info = resolve(codec);
    match (level, info.level_range) {
        (Some(l), Some((lo, hi))) if l < lo || l > hi =>
            Err(CompressionError::InvalidLevel { codec: info.name, level: l }),
        _ => Ok(()),
    }
}

pub fn create_compressor(codec: CompressionCodec, level: Option<i32>)
    -> Result<Box<dyn Compressor + Send>, CompressionError>
{
    validate_level(codec, level)?;
    let level = level.unwrap_or(resolve(codec).default_level);
    match codec {
        CompressionCodec::Stored => Ok(Box::new(stored::StoredCompressor)),
        CompressionCodec::Zstd => Ok(Box::new(zstd::ZstdCompressor::new(level))),
        CompressionCodec::Lz4 => Ok(Box::new(lz4::Lz4Compressor)),
        CompressionCodec::Deflate => Ok(Box::new(deflate::DeflateCompressor::new(level))),
    }
}

pub fn create_decompressor(codec: CompressionCodec) -> Box<dyn Decompressor + Send> {
    match codec {
        CompressionCodec::Stored => Box::new(stored::StoredDecompressor),
        CompressionCodec::Zstd => Box::new(zstd::ZstdDecompressor),
        CompressionCodec::Lz4 => Box::new(lz4::Lz4Decompressor),
        CompressionCodec::Deflate => Box::new(deflate::DeflateDecompressor),
    }
}

/// Summary: Compress `input` and wrap it in a self-describing frame.
/// `[codec u16 LE][orig_len u32 LE][body][crc32 u32 LE]`
pub fn compress_frame(
    codec: CompressionCodec,
    level: Option<i32>,
    input: &[u8],
) -> Result<Vec<u8>, CompressionError> {
    if input.len() > MAX_PLAINTEXT_LEN {
        return Err(CompressionError::TooLarge { have: input.len(), max: MAX_PLAINTEXT_LEN });
    }
    let mut compressor = create_compressor(codec, level)?;

    let mut out = Vec::with_capacity(FRAME_PREFIX_LEN + input.len() + FRAME_TRAILER_LEN);
    // Writes into a Vec cannot fail.
    let _ = out.write_u16::<LittleEndian>(codec as u16);
    let _ = out.write_u32::<LittleEndian>(input.len() as u32);
    compressor.compress_chunk(input, &mut out)?;
    let _ = out.write_u32::<LittleEndian>(compute_checksum(input));
    Ok(out)
}

/// Summary: Parse a frame produced by `compress_frame` and return the plaintext.
/// - Unknown codec ids, truncated frames, oversize claims and CRC mismatches all fail.
pub fn decompress_frame(frame: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let need = FRAME_PREFIX_LEN + FRAME_TRAILER_LEN;
    if frame.len() < need {
        return Err(CompressionError::Truncated { have: frame.len(), need });
    }

    let mut prefix = &frame[..FRAME_PREFIX_LEN];
    let codec_id = prefix.read_u16::<LittleEndian>()
        .map_err(|_| CompressionError::Truncated { have: frame.len(), need })?;
    let orig_len = prefix.read_u32::<LittleEndian>()
        .map_err(|_| CompressionError::Truncated { have: frame.len(), need })? as usize;
    let codec = CompressionCodec::verify(codec_id)?;

    if orig_len > MAX_PLAINTEXT_LEN {
        return Err(CompressionError::TooLarge { have: orig_len, max: MAX_PLAINTEXT_LEN });
    }

    let body = &frame[FRAME_PREFIX_LEN..frame.len() - FRAME_TRAILER_LEN];
    let mut trailer = &frame[frame.len() - FRAME_TRAILER_LEN..];
    let expected_crc = trailer.read_u32::<LittleEndian>()
        .map_err(|_| CompressionError::Truncated { have: frame.len(), need })?;

    let mut out = Vec::with_capacity(orig_len);
    create_decompressor(codec).decompress_chunk(body, orig_len, &mut out)?;

    if out.len() != orig_len {
        return Err(CompressionError::LengthMismatch { expected: orig_len, actual: out.len() });
    }
    let actual_crc = compute_checksum(&out);
    if actual_crc != expected_crc {
        return Err(CompressionError::ChecksumMismatch { expected: expected_crc, actual: actual_crc });
    }
    Ok(out)
}
