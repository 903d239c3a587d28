//! container/mod.rs
//! Container adapters: open, save, and expose ordered embedding locations.
//!
//! - `ContainerKind`: closed set of supported kinds, routed by file extension
//! - `Container`: one opened document of any kind
//! - per-kind carriers in `word`, `presentation`, `pdf`, `text`

pub mod xml;
pub mod ooxml;
pub mod word;
pub mod presentation;
pub mod pdf;
pub mod text;

use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{AdapterError, WatermarkError};
use crate::utils::extension_lowercase;

pub use pdf::PdfDocument;
pub use presentation::PresentationDocument;
pub use text::TextDocument;
pub use word::WordDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    #[serde(rename = "word")]
    WordProcessing,
    Presentation,
    Pdf,
    #[serde(rename = "text")]
    PlainText,
}

impl ContainerKind {
    pub const ALL: [ContainerKind; 4] = [
        ContainerKind::WordProcessing,
        ContainerKind::Presentation,
        ContainerKind::Pdf,
        ContainerKind::PlainText,
    ];

    /// Case-insensitive; only `docx`, `pptx`, `pdf` and `txt` are accepted.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(ContainerKind::WordProcessing),
            "pptx" => Some(ContainerKind::Presentation),
            "pdf" => Some(ContainerKind::Pdf),
            "txt" => Some(ContainerKind::PlainText),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, WatermarkError> {
        extension_lowercase(path)
            .as_deref()
            .and_then(Self::from_extension)
            .ok_or_else(|| WatermarkError::UnsupportedKind(path.display().to_string()))
    }

    pub fn extension(self) -> &'static str {
        match self {
            ContainerKind::WordProcessing => "docx",
            ContainerKind::Presentation => "pptx",
            ContainerKind::Pdf => "pdf",
            ContainerKind::PlainText => "txt",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerKind::WordProcessing => "word",
            ContainerKind::Presentation => "presentation",
            ContainerKind::Pdf => "pdf",
            ContainerKind::PlainText => "text",
        };
        f.write_str(name)
    }
}

/// One opened document.
#[derive(Debug, Clone)]
pub enum Container {
    Word(WordDocument),
    Presentation(PresentationDocument),
    Pdf(PdfDocument),
    PlainText(TextDocument),
}

impl Container {
    pub fn kind(&self) -> ContainerKind {
        match self {
            Container::Word(_) => ContainerKind::WordProcessing,
            Container::Presentation(_) => ContainerKind::Presentation,
            Container::Pdf(_) => ContainerKind::Pdf,
            Container::PlainText(_) => ContainerKind::PlainText,
        }
    }

    pub fn from_bytes(kind: ContainerKind, bytes: &[u8]) -> Result<Self, AdapterError> {
        Ok(match kind {
            ContainerKind::WordProcessing => Container::Word(WordDocument::from_bytes(bytes)?),
            ContainerKind::Presentation => Container::Presentation(PresentationDocument::from_bytes(bytes)?),
            ContainerKind::Pdf => Container::Pdf(PdfDocument::from_bytes(bytes)?),
            ContainerKind::PlainText => Container::PlainText(TextDocument::from_bytes(bytes)?),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AdapterError> {
        match self {
            Container::Word(d) => d.to_bytes(),
            Container::Presentation(d) => d.to_bytes(),
            Container::Pdf(d) => d.to_bytes(),
            Container::PlainText(d) => d.to_bytes(),
        }
    }

    /// Route by extension, then parse.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WatermarkError> {
        let path = path.as_ref();
        let kind = ContainerKind::from_path(path)?;
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading {}", path.display()))
            .map_err(|e| AdapterError::package(kind, e))?;
        debug!(%kind, len = bytes.len(), "opened container");
        Ok(Self::from_bytes(kind, &bytes)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AdapterError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes)
            .with_context(|| format!("writing {}", path.display()))
            .map_err(|e| AdapterError::package(self.kind(), e))?;
        debug!(kind = %self.kind(), len = bytes.len(), "saved container");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_extension() {
        assert_eq!(ContainerKind::from_path(Path::new("a/Report.DOCX")).unwrap(), ContainerKind::WordProcessing);
        assert_eq!(ContainerKind::from_path(Path::new("deck.pptx")).unwrap(), ContainerKind::Presentation);
        assert!(matches!(
            ContainerKind::from_path(Path::new("legacy.ppt")),
            Err(WatermarkError::UnsupportedKind(_))
        ));
        assert!(ContainerKind::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn kind_serializes_as_short_tag() {
        assert_eq!(serde_json::to_string(&ContainerKind::PlainText).unwrap(), "\"text\"");
        for kind in ContainerKind::ALL {
            assert_eq!(kind.to_string(), serde_json::to_value(kind).unwrap().as_str().unwrap());
            assert_eq!(ContainerKind::from_extension(kind.extension()), Some(kind));
        }
    }

    #[test]
    fn garbage_bytes_are_adapter_errors() {
        for kind in [ContainerKind::WordProcessing, ContainerKind::Presentation, ContainerKind::Pdf] {
            let err = Container::from_bytes(kind, b"definitely not a document").unwrap_err();
            assert_eq!(err.kind, kind);
        }
        assert!(Container::from_bytes(ContainerKind::PlainText, &[0xff, 0xfe, 0x00]).is_err());
    }
}
