/// Stable codec IDs (u16) for the compression frame.
pub mod codec_ids {
    pub const STORED: u16  = 0x0000;
    pub const ZSTD: u16    = 0x0001;
    pub const LZ4: u16     = 0x0002;
    pub const DEFLATE: u16 = 0x0003;
}

/// Default compression levels (balanced).
pub const DEFAULT_LEVEL_ZSTD: i32 = 6;
pub const DEFAULT_LEVEL_DEFLATE: i32 = 6;

/// Frame layout sizes.
pub const FRAME_PREFIX_LEN: usize = 2 + 4; // codec id + orig_len
pub const FRAME_TRAILER_LEN: usize = 4;    // crc32

/// Sanity bound on the decompressed size. A watermark is a few hundred bytes;
/// anything claiming more than this is treated as corrupt.
pub const MAX_PLAINTEXT_LEN: usize = 1024 * 1024;
