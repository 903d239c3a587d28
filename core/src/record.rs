//! record.rs
//! The value hidden in a document and the metadata sealed next to it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::container::ContainerKind;

/// The only fields that cross the trust boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatermarkRecord {
    pub content: String,
    pub user: String,
}

impl WatermarkRecord {
    pub fn new(content: impl Into<String>, user: impl Into<String>) -> Self {
        Self { content: content.into(), user: user.into() }
    }
}

/// Sealed together with the record; optional on extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub kind: ContainerKind,
}

impl EnvelopeMetadata {
    pub fn now(kind: ContainerKind, origin: Option<String>) -> Self {
        Self { timestamp: Utc::now(), origin, kind }
    }
}

/// Plaintext of an envelope: `{"content", "user", "meta"?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedWatermark {
    #[serde(flatten)]
    pub record: WatermarkRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<EnvelopeMetadata>,
}

impl SealedWatermark {
    pub fn new(record: WatermarkRecord, meta: Option<EnvelopeMetadata>) -> Self {
        Self { record, meta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_record_parses_without_meta() {
        let sealed: SealedWatermark =
            serde_json::from_str(r#"{"content":"secret-note","user":"alice"}"#).unwrap();
        assert_eq!(sealed.record, WatermarkRecord::new("secret-note", "alice"));
        assert!(sealed.meta.is_none());
    }

    #[test]
    fn meta_is_nested_and_origin_skipped_when_absent() {
        let sealed = SealedWatermark::new(
            WatermarkRecord::new("c", "u"),
            Some(EnvelopeMetadata::now(ContainerKind::Pdf, None)),
        );
        let v: serde_json::Value = serde_json::to_value(&sealed).unwrap();
        assert_eq!(v["content"], "c");
        assert_eq!(v["meta"]["kind"], "pdf");
        assert!(v["meta"].get("origin").is_none());
    }
}
