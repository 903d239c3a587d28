//! Marker interleaving for attribute values.
//!
//! Not a cipher: it only keeps the sealed wire string from reading as JSON in
//! a property dump. Always layered over the envelope.

use crate::constants::DEFAULT_OBFUSCATION_MARKER;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Obfuscator {
    marker: char,
}

impl Default for Obfuscator {
    fn default() -> Self {
        Self { marker: DEFAULT_OBFUSCATION_MARKER }
    }
}

impl Obfuscator {
    pub fn new(marker: char) -> Self {
        Self { marker }
    }

    pub fn marker(&self) -> char {
        self.marker
    }

    /// Marker before every even-indexed character.
    pub fn hide(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() * 2);
        for (i, c) in text.chars().enumerate() {
            if i % 2 == 0 {
                out.push(self.marker);
            }
            out.push(c);
        }
        out
    }

    /// Drop every marker.
    pub fn reveal(&self, text: &str) -> String {
        text.chars().filter(|&c| c != self.marker).collect()
    }
}
