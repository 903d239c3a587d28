//! codec/zero_width.rs
//! Bytes as fixed-width base-k digit groups, most significant digit first.
//!
//! k=2 -> 8 digits/byte, k=4 -> 4, k=8 -> 3, k=16 -> 2.
//! Decoding keeps only the codec's own code points and ignores everything
//! else, so a codeword can be pulled out of arbitrary host text.

use std::ops::Range;

use crate::codec::alphabet::Alphabet;

/// Decoded bytes plus whether a trailing partial digit group was zero-padded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub bytes: Vec<u8>,
    pub lossy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroWidthCodec {
    alphabet: Alphabet,
}

impl ZeroWidthCodec {
    pub fn new(alphabet: Alphabet) -> Self {
        Self { alphabet }
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Digit values of one byte, most significant first.
    pub fn byte_digits(&self, byte: u8) -> Vec<u8> {
        let radix = self.alphabet.radix() as u32;
        let width = self.alphabet.digits_per_byte();
        let mut digits = vec![0u8; width];
        let mut v = byte as u32;
        for slot in digits.iter_mut().rev() {
            *slot = (v % radix) as u8;
            v /= radix;
        }
        digits
    }

    pub fn encode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len() * self.alphabet.digits_per_byte() * 3);
        for &b in bytes {
            for d in self.byte_digits(b) {
                out.push(self.alphabet.symbol(d));
            }
        }
        out
    }

    /// Alphabet digits found in `text`, in order. Other characters are skipped.
    pub fn digits(&self, text: &str) -> Vec<u8> {
        text.chars().filter_map(|c| self.alphabet.digit_of(c)).collect()
    }

    /// Group digits into bytes. A trailing partial group is padded with zero
    /// digits. `None` when any group exceeds 255.
    pub fn bytes_from_digits(&self, digits: &[u8]) -> Option<Decoded> {
        let radix = self.alphabet.radix() as u32;
        let width = self.alphabet.digits_per_byte();
        let lossy = digits.len() % width != 0;

        let mut bytes = Vec::with_capacity(digits.len() / width + 1);
        for group in digits.chunks(width) {
            let mut v: u32 = 0;
            for i in 0..width {
                v = v * radix + group.get(i).copied().unwrap_or(0) as u32;
            }
            bytes.push(u8::try_from(v).ok()?);
        }
        Some(Decoded { bytes, lossy })
    }

    /// Absent when `text` holds no alphabet code point or a group overflows.
    pub fn decode(&self, text: &str) -> Option<Decoded> {
        let digits = self.digits(text);
        if digits.is_empty() {
            return None;
        }
        self.bytes_from_digits(&digits)
    }

    /// Byte ranges of the maximal runs of alphabet code points in `text`.
    pub fn runs(&self, text: &str) -> Vec<Range<usize>> {
        let mut runs = Vec::new();
        let mut open: Option<usize> = None;
        for (i, c) in text.char_indices() {
            match (self.alphabet.contains(c), open) {
                (true, None) => open = Some(i),
                (false, Some(start)) => {
                    runs.push(start..i);
                    open = None;
                }
                _ => {}
            }
        }
        if let Some(start) = open {
            runs.push(start..text.len());
        }
        runs
    }

    /// Remove every code point of this codec's alphabet from `text`.
    pub fn strip(&self, text: &str) -> String {
        text.chars().filter(|c| !self.alphabet.contains(*c)).collect()
    }
}
