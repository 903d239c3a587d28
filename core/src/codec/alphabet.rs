use thiserror::Error;

use crate::constants::zero_width::*;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlphabetError {
    #[error("alphabet size {0} not supported (expected 2, 4, 8 or 16)")]
    UnsupportedSize(usize),

    #[error("alphabet repeats code point {0:?}")]
    Duplicate(char),
}

/// Ordered set of distinct code points; position is the digit value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Vec<char>,
    digits_per_byte: usize,
}

impl Alphabet {
    pub fn new(symbols: &[char]) -> Result<Self, AlphabetError> {
        let digits_per_byte = match symbols.len() {
            2 => 8,
            4 => 4,
            8 => 3,
            16 => 2,
            n => return Err(AlphabetError::UnsupportedSize(n)),
        };
        for (i, c) in symbols.iter().enumerate() {
            if symbols[..i].contains(c) {
                return Err(AlphabetError::Duplicate(*c));
            }
        }
        Ok(Self { symbols: symbols.to_vec(), digits_per_byte })
    }

    /// `[U+200B, U+200D]`
    pub fn binary() -> Self {
        Self {
            symbols: vec![ZERO_WIDTH_SPACE, ZERO_WIDTH_JOINER],
            digits_per_byte: 8,
        }
    }

    /// `[U+200B, U+200C, U+200D, U+2060 .. U+2064]`
    pub fn octal() -> Self {
        Self {
            symbols: vec![
                ZERO_WIDTH_SPACE,
                ZERO_WIDTH_NON_JOINER,
                ZERO_WIDTH_JOINER,
                WORD_JOINER,
                FUNCTION_APPLICATION,
                INVISIBLE_TIMES,
                INVISIBLE_SEPARATOR,
                INVISIBLE_PLUS,
            ],
            digits_per_byte: 3,
        }
    }

    /// Octal alphabet sharing no code point with `binary()`, so both channels
    /// can live in one text.
    pub fn octal_disjoint() -> Self {
        Self {
            symbols: vec![
                ZERO_WIDTH_NON_JOINER,
                WORD_JOINER,
                FUNCTION_APPLICATION,
                INVISIBLE_TIMES,
                INVISIBLE_SEPARATOR,
                INVISIBLE_PLUS,
                INHIBIT_SYMMETRIC_SWAPPING,
                ACTIVATE_SYMMETRIC_SWAPPING,
            ],
            digits_per_byte: 3,
        }
    }

    #[inline]
    pub fn radix(&self) -> usize {
        self.symbols.len()
    }

    #[inline]
    pub fn digits_per_byte(&self) -> usize {
        self.digits_per_byte
    }

    #[inline]
    pub fn symbol(&self, digit: u8) -> char {
        self.symbols[digit as usize]
    }

    #[inline]
    pub fn digit_of(&self, c: char) -> Option<u8> {
        self.symbols.iter().position(|&s| s == c).map(|p| p as u8)
    }

    #[inline]
    pub fn contains(&self, c: char) -> bool {
        self.symbols.contains(&c)
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    /// No code point in common with `other`.
    pub fn is_disjoint(&self, other: &Alphabet) -> bool {
        !self.symbols.iter().any(|c| other.contains(*c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_match_constructor() {
        assert_eq!(Alphabet::new(Alphabet::binary().symbols()).unwrap(), Alphabet::binary());
        assert_eq!(Alphabet::new(Alphabet::octal().symbols()).unwrap(), Alphabet::octal());
        assert_eq!(
            Alphabet::new(Alphabet::octal_disjoint().symbols()).unwrap(),
            Alphabet::octal_disjoint()
        );
    }

    #[test]
    fn plain_text_alphabets_are_disjoint() {
        assert!(Alphabet::binary().is_disjoint(&Alphabet::octal_disjoint()));
        assert!(!Alphabet::binary().is_disjoint(&Alphabet::octal()));
    }

    #[test]
    fn rejects_bad_sizes_and_duplicates() {
        assert_eq!(Alphabet::new(&['a', 'b', 'c']), Err(AlphabetError::UnsupportedSize(3)));
        assert_eq!(Alphabet::new(&['a', 'a']), Err(AlphabetError::Duplicate('a')));
    }
}
