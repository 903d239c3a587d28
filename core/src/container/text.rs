//! container/text.rs
//! UTF-8 plain text carrier.
//!
//! Both locations encode the payload's UTF-8 bytes as zero-width code points:
//! - `trailing-codeword`: sentinel-framed binary codeword appended to the text
//! - `leading-codeword`: octal codeword (alphabet disjoint from the binary one)
//!   inserted after the first character
//!
//! Host text may itself contain alphabet code points (emoji ZWJ sequences,
//! ZWNJ in Persian or Indic scripts). Reads and rewrites only touch the
//! codeword span, never stray host code points:
//! - the trailing span is the last alphabet run holding a complete frame
//! - the leading codeword carries a 4-byte big-endian length prefix, so its
//!   span ends exactly where the prefix says

use std::ops::Range;

use anyhow::{anyhow, Context};
use tracing::warn;

use crate::codec::{Alphabet, FramedChannel, ZeroWidthCodec};
use crate::container::ContainerKind;
use crate::location::{Carrier, EmbeddingLocation};
use crate::types::AdapterError;

const LENGTH_PREFIX: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    text: String,
    trailing: FramedChannel,
    leading: ZeroWidthCodec,
}

/// Located codeword. `clean` is false when the codeword is cut short.
#[derive(Debug)]
struct Span {
    range: Range<usize>,
    bytes: Vec<u8>,
    clean: bool,
}

impl TextDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            trailing: FramedChannel::default(),
            leading: ZeroWidthCodec::new(Alphabet::octal_disjoint()),
        }
    }

    /// Custom channels. The two alphabets must not share a code point.
    pub fn with_channels(
        text: impl Into<String>,
        trailing: FramedChannel,
        leading: ZeroWidthCodec,
    ) -> Result<Self, AdapterError> {
        if !trailing.codec().alphabet().is_disjoint(leading.alphabet()) {
            return Err(AdapterError::package(
                ContainerKind::PlainText,
                anyhow!("trailing and leading alphabets overlap"),
            ));
        }
        Ok(Self { text: text.into(), trailing, leading })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AdapterError> {
        let text = std::str::from_utf8(bytes)
            .context("text is not UTF-8")
            .map_err(|e| AdapterError::package(ContainerKind::PlainText, e))?;
        Ok(Self::new(text))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AdapterError> {
        Ok(self.text.as_bytes().to_vec())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text with both codeword spans removed. Host code points stay.
    pub fn visible_text(&self) -> String {
        let mut spans: Vec<Range<usize>> =
            [self.trailing_span(), self.leading_span()].into_iter().flatten().map(|s| s.range).collect();
        spans.sort_by_key(|r| std::cmp::Reverse(r.start));

        let mut text = self.text.clone();
        for range in spans {
            text.replace_range(range, "");
        }
        text
    }

    /// Last alphabet run that holds a frame. A run may start with host digits
    /// (a ZWJ right before the codeword), so the first few start offsets are tried.
    fn trailing_span(&self) -> Option<Span> {
        let codec = self.trailing.codec();
        let width = codec.alphabet().digits_per_byte();

        for run in codec.runs(&self.text).into_iter().rev() {
            let run_text = &self.text[run.clone()];
            let mut damaged = None;
            for (offset, _) in run_text.char_indices().take(width) {
                let Some(decoded) = self.trailing.reveal(&run_text[offset..]) else {
                    continue;
                };
                if decoded.bytes.is_empty() {
                    continue;
                }
                let range = run.start + offset..run.end;
                if !decoded.lossy {
                    return Some(Span { range, bytes: decoded.bytes, clean: true });
                }
                damaged.get_or_insert(Span { range, bytes: decoded.bytes, clean: false });
            }
            if damaged.is_some() {
                return damaged;
            }
        }
        None
    }

    /// Where a leading codeword goes in `host`: after the first character,
    /// or at the very start when the host is only a trailing codeword.
    fn leading_offset(&self, host: &str) -> usize {
        match host.chars().next() {
            Some(c) if !self.trailing.codec().alphabet().contains(c) => c.len_utf8(),
            _ => 0,
        }
    }

    fn leading_span(&self) -> Option<Span> {
        let runs = self.leading.runs(&self.text);
        let first = self.text.chars().next().map_or(0, char::len_utf8);

        let mut damaged = None;
        for start in [0, first] {
            let Some(run) = runs.iter().find(|r| r.start <= start && start < r.end) else {
                continue;
            };
            if start == 0 && run.start != 0 {
                continue;
            }
            match self.parse_leading(start, run.end) {
                Some(span) if span.clean => return Some(span),
                Some(span) => {
                    damaged.get_or_insert(span);
                }
                None => {}
            }
        }
        damaged
    }

    /// Length-prefixed codeword starting at byte `start`, bounded by `run_end`.
    fn parse_leading(&self, start: usize, run_end: usize) -> Option<Span> {
        let width = self.leading.alphabet().digits_per_byte();
        let region = &self.text[start..run_end];
        let digits = self.leading.digits(region);
        let prefix_digits = LENGTH_PREFIX * width;
        if digits.len() < prefix_digits {
            return None;
        }

        let prefix = self.leading.bytes_from_digits(&digits[..prefix_digits])?;
        let len = u32::from_be_bytes(prefix.bytes.try_into().ok()?) as usize;
        let total = len.checked_add(LENGTH_PREFIX)?.checked_mul(width)?;

        if total <= digits.len() {
            let end = region.char_indices().nth(total).map_or(region.len(), |(i, _)| i);
            let decoded = self.leading.bytes_from_digits(&digits[prefix_digits..total])?;
            return Some(Span { range: start..start + end, bytes: decoded.bytes, clean: true });
        }
        let decoded = self.leading.bytes_from_digits(&digits[prefix_digits..])?;
        Some(Span { range: start..run_end, bytes: decoded.bytes, clean: false })
    }
}

impl Carrier for TextDocument {
    fn kind(&self) -> ContainerKind {
        ContainerKind::PlainText
    }

    fn locations(&self) -> Vec<Box<dyn EmbeddingLocation<Self>>> {
        vec![Box::new(TrailingCodeword), Box::new(LeadingCodeword)]
    }
}

/// A damaged or non-UTF-8 codeword is still a present value, so a tampered
/// location disagrees with the others instead of dropping out.
fn span_payload(location: &str, span: Span) -> Option<String> {
    if span.bytes.is_empty() {
        return None;
    }
    if !span.clean {
        warn!(location, "truncated codeword");
    }
    Some(match String::from_utf8(span.bytes) {
        Ok(s) => s,
        Err(e) => {
            warn!(location, "codeword does not decode to UTF-8");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    })
}

struct TrailingCodeword;

impl EmbeddingLocation<TextDocument> for TrailingCodeword {
    fn name(&self) -> &'static str {
        "trailing-codeword"
    }

    fn write(&self, doc: &mut TextDocument, payload: &str) -> Result<(), AdapterError> {
        let mut host = doc.text.clone();
        if let Some(span) = doc.trailing_span() {
            host.replace_range(span.range, "");
        }
        doc.text = doc.trailing.conceal(&host, payload.as_bytes());
        Ok(())
    }

    fn read(&self, doc: &TextDocument) -> Result<Option<String>, AdapterError> {
        Ok(doc.trailing_span().and_then(|span| span_payload(self.name(), span)))
    }
}

struct LeadingCodeword;

impl EmbeddingLocation<TextDocument> for LeadingCodeword {
    fn name(&self) -> &'static str {
        "leading-codeword"
    }

    fn write(&self, doc: &mut TextDocument, payload: &str) -> Result<(), AdapterError> {
        let len = u32::try_from(payload.len())
            .context("payload too long for a leading codeword")
            .map_err(|e| AdapterError::new(ContainerKind::PlainText, self.name(), e))?;
        let mut framed = Vec::with_capacity(LENGTH_PREFIX + payload.len());
        framed.extend_from_slice(&len.to_be_bytes());
        framed.extend_from_slice(payload.as_bytes());

        let mut host = doc.text.clone();
        if let Some(span) = doc.leading_span() {
            host.replace_range(span.range, "");
        }
        let split = doc.leading_offset(&host);
        host.insert_str(split, &doc.leading.encode(&framed));
        doc.text = host;
        Ok(())
    }

    fn read(&self, doc: &TextDocument) -> Result<Option<String>, AdapterError> {
        Ok(doc.leading_span().and_then(|span| span_payload(self.name(), span)))
    }
}
