//! constants.rs
//! Wire tags, defaults and code point tables shared by every layer.

/// Version tag bound into the HKDF `info` string.
/// "WMK1" = watermark envelope v1
pub const MAGIC_WMK1: [u8; 4] = *b"WMK1";

/// PBKDF2 salt length (bytes). Fresh per seal.
pub const SALT_LEN: usize = 16;

/// PBKDF2-HMAC-SHA256 rounds used when the config does not say otherwise.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;
/// Lower bound enforced by `EnvelopeConfig::validate`.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

/// Cipher suite identifiers (bound into the HKDF info string).
pub mod cipher_ids {
    pub const AES256_GCM: u16        = 0x0001;
    pub const CHACHA20_POLY1305: u16 = 0x0002;
}

/// Zero-width code points used by the built-in alphabets.
pub mod zero_width {
    pub const ZERO_WIDTH_SPACE: char         = '\u{200B}';
    pub const ZERO_WIDTH_NON_JOINER: char    = '\u{200C}';
    pub const ZERO_WIDTH_JOINER: char        = '\u{200D}';
    pub const WORD_JOINER: char              = '\u{2060}';
    pub const FUNCTION_APPLICATION: char     = '\u{2061}';
    pub const INVISIBLE_TIMES: char          = '\u{2062}';
    pub const INVISIBLE_SEPARATOR: char      = '\u{2063}';
    pub const INVISIBLE_PLUS: char           = '\u{2064}';
    pub const INHIBIT_SYMMETRIC_SWAPPING: char = '\u{206A}';
    pub const ACTIVATE_SYMMETRIC_SWAPPING: char = '\u{206B}';
}

/// Byte repeated at both ends of a framed text codeword ("11111111").
pub const DEFAULT_SENTINEL: u8 = 0xFF;

/// Marker interleaved by the property obfuscator.
pub const DEFAULT_OBFUSCATION_MARKER: char = zero_width::ZERO_WIDTH_SPACE;

/// Number of hex chars kept from SHA-256 for slot identifiers.
pub const WATERMARK_ID_LEN: usize = 8;

/// Relationship type linking the watermark part from the main document part.
pub const WATERMARK_REL_TYPE: &str = "http://schemas.custom.org/watermark";
/// Namespace of the custom XML parts written into OOXML packages.
pub const WATERMARK_XML_NS: &str = "http://schemas.custom.org/watermark/1.0";
