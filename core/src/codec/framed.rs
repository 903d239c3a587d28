//! codec/framed.rs
//! Sentinel-framed codeword appended to host text.
//!
//! Frame: `[sentinel][payload][sentinel]`, all as digits of one alphabet.
//! `reveal` searches digit-level (not group aligned) for the first and the
//! last sentinel, so any host text without conflicting code points works.

use crate::codec::alphabet::Alphabet;
use crate::codec::zero_width::{Decoded, ZeroWidthCodec};
use crate::constants::DEFAULT_SENTINEL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramedChannel {
    codec: ZeroWidthCodec,
    sentinel: u8,
}

impl Default for FramedChannel {
    fn default() -> Self {
        Self::new(Alphabet::binary(), DEFAULT_SENTINEL)
    }
}

impl FramedChannel {
    pub fn new(alphabet: Alphabet, sentinel: u8) -> Self {
        Self { codec: ZeroWidthCodec::new(alphabet), sentinel }
    }

    pub fn codec(&self) -> &ZeroWidthCodec {
        &self.codec
    }

    /// Framed codeword for `secret`, without host text.
    pub fn codeword(&self, secret: &[u8]) -> String {
        let mut framed = Vec::with_capacity(secret.len() + 2);
        framed.push(self.sentinel);
        framed.extend_from_slice(secret);
        framed.push(self.sentinel);
        self.codec.encode(&framed)
    }

    /// `text` followed by the framed codeword.
    pub fn conceal(&self, text: &str, secret: &[u8]) -> String {
        let mut out = String::from(text);
        out.push_str(&self.codeword(secret));
        out
    }

    /// Payload between the first and the last sentinel.
    ///
    /// Absent when a sentinel is missing, when both searches hit the same
    /// place or overlap, or when a group between them overflows.
    pub fn reveal(&self, text: &str) -> Option<Decoded> {
        let digits = self.codec.digits(text);
        let pat = self.codec.byte_digits(self.sentinel);

        let first = find(&digits, &pat)?;
        let last = rfind(&digits, &pat)?;
        let start = first + pat.len();
        if start > last {
            return None;
        }
        self.codec.bytes_from_digits(&digits[start..last])
    }

    /// `text` with every code point of this channel's alphabet removed.
    pub fn strip(&self, text: &str) -> String {
        self.codec.strip(text)
    }
}

fn find(hay: &[u8], pat: &[u8]) -> Option<usize> {
    if pat.is_empty() || hay.len() < pat.len() {
        return None;
    }
    hay.windows(pat.len()).position(|w| w == pat)
}

fn rfind(hay: &[u8], pat: &[u8]) -> Option<usize> {
    if pat.is_empty() || hay.len() < pat.len() {
        return None;
    }
    hay.windows(pat.len()).rposition(|w| w == pat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conceal_then_reveal() {
        let ch = FramedChannel::default();
        let out = ch.conceal("Dear team,\nsee attached.", b"k3y");
        assert!(out.starts_with("Dear team,\nsee attached."));
        let d = ch.reveal(&out).unwrap();
        assert_eq!(d.bytes, b"k3y");
        assert!(!d.lossy);
    }

    #[test]
    fn payload_full_of_sentinels() {
        let ch = FramedChannel::default();
        let out = ch.conceal("x", &[0xFF, 0xFF, 0x7F, 0xFE]);
        assert_eq!(ch.reveal(&out).unwrap().bytes, vec![0xFF, 0xFF, 0x7F, 0xFE]);
    }

    #[test]
    fn empty_secret_reveals_empty() {
        let ch = FramedChannel::default();
        assert_eq!(ch.reveal(&ch.conceal("abc", b"")).unwrap().bytes, Vec::<u8>::new());
    }

    #[test]
    fn single_sentinel_is_absent() {
        let ch = FramedChannel::default();
        let lone = ch.codec().encode(&[0xFF]);
        assert_eq!(ch.reveal(&format!("abc{lone}")), None);
        assert_eq!(ch.reveal("no codeword here"), None);
    }

    #[test]
    fn overlapping_sentinels_are_absent() {
        let ch = FramedChannel::default();
        // nine ones: first at 0, last at 1, they overlap
        let one = Alphabet::binary().symbol(1);
        let nine: String = std::iter::repeat(one).take(9).collect();
        assert_eq!(ch.reveal(&nine), None);
    }

    #[test]
    fn strip_removes_codeword() {
        let ch = FramedChannel::default();
        assert_eq!(ch.strip(&ch.conceal("body", b"s")), "body");
    }
}
