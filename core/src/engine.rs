//! engine.rs
//! Redundant multi-location embedding and cross-validated extraction.
//!
//! Embed:
//!   payload = obfuscate(seal(record + meta).to_wire()), written to every location.
//!   A failing location is logged and skipped; zero writes is an error.
//!
//! Extract:
//!   read every location, reveal each value, then
//!   - no value        -> absent
//!   - one distinct    -> accepted
//!   - more than one   -> Consistency
//!
//! The engine keeps no state between calls and is `Send + Sync`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::DEFAULT_OBFUSCATION_MARKER;
use crate::container::{Container, ContainerKind};
use crate::crypto::{watermark_id, EncryptedEnvelope, Envelope, EnvelopeConfig};
use crate::location::Carrier;
use crate::obfuscate::Obfuscator;
use crate::record::{EnvelopeMetadata, SealedWatermark, WatermarkRecord};
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::WatermarkError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub envelope: EnvelopeConfig,
    /// Interleaved into every stored value. Must not be ASCII.
    pub marker: char,
    /// Originating address sealed into the metadata, if known.
    pub origin: Option<String>,
    /// Seal `{timestamp, origin, kind}` next to the record.
    pub stamp_metadata: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            envelope: EnvelopeConfig::default(),
            marker: DEFAULT_OBFUSCATION_MARKER,
            origin: None,
            stamp_metadata: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), WatermarkError> {
        self.envelope.validate()?;
        // The wire string is ASCII JSON/base64; an ASCII marker would eat it.
        if self.marker.is_ascii() {
            return Err(WatermarkError::Config(format!(
                "obfuscation marker {:?} must not be ASCII",
                self.marker
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationFailure {
    pub location: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedReport {
    pub kind: ContainerKind,
    /// Short id of the stored payload, identical in every written location.
    pub watermark_id: String,
    pub written: Vec<&'static str>,
    pub failed: Vec<LocationFailure>,
    pub telemetry: TelemetrySnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    pub kind: ContainerKind,
    pub envelope: Option<EncryptedEnvelope>,
    pub present: Vec<&'static str>,
    pub absent: Vec<&'static str>,
    pub failed: Vec<LocationFailure>,
    pub telemetry: TelemetrySnapshot,
}

/// A watermark that opened under the given password and matches its container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verified {
    #[serde(flatten)]
    pub record: WatermarkRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<EnvelopeMetadata>,
}

#[derive(Debug, Clone)]
pub struct WatermarkEngine {
    config: EngineConfig,
    envelope: Envelope,
    obfuscator: Obfuscator,
}

impl Default for WatermarkEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            envelope: Envelope::default(),
            obfuscator: Obfuscator::default(),
        }
    }
}

impl WatermarkEngine {
    pub fn new(config: EngineConfig) -> Result<Self, WatermarkError> {
        config.validate()?;
        Ok(Self {
            envelope: Envelope::new(config.envelope.clone())?,
            obfuscator: Obfuscator::new(config.marker),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Seal `record`, obfuscate the wire form, and write it to every location of `carrier`.
    ///
    /// Errors:
    /// - `NoLocationWritten` when every location failed
    /// - `Seal` when the envelope could not be produced
    pub fn embed<C: Carrier>(
        &self,
        carrier: &mut C,
        record: &WatermarkRecord,
        password: &str,
    ) -> Result<EmbedReport, WatermarkError> {
        let kind = carrier.kind();
        let mut timer = TelemetryTimer::new();
        let mut counters = TelemetryCounters::default();

        let meta = self
            .config
            .stamp_metadata
            .then(|| EnvelopeMetadata::now(kind, self.config.origin.clone()));
        let sealed = SealedWatermark::new(record.clone(), meta);
        let envelope = self.envelope.seal_timed(&sealed, password, &mut timer, &mut counters)?;
        let payload = self.obfuscator.hide(&envelope.to_wire()?);
        let id = watermark_id(payload.as_bytes());

        let locations = carrier.locations();
        let mut written = Vec::with_capacity(locations.len());
        let mut failed = Vec::new();
        for loc in &locations {
            let result = timer.time(Stage::Write, || loc.write(carrier, &payload));
            counters.add_write(result.is_ok());
            match result {
                Ok(()) => {
                    counters.add_payload(payload.chars().count());
                    debug!(%kind, location = loc.name(), "location written");
                    written.push(loc.name());
                }
                Err(e) => {
                    warn!(%kind, location = loc.name(), error = %e, "skipping location");
                    failed.push(LocationFailure { location: loc.name(), error: e.to_string() });
                }
            }
        }

        if written.is_empty() {
            return Err(WatermarkError::NoLocationWritten { attempted: locations.len() });
        }

        timer.finish();
        info!(%kind, watermark_id = %id, written = written.len(), failed = failed.len(), "embedded watermark");
        Ok(EmbedReport {
            kind,
            watermark_id: id,
            written,
            failed,
            telemetry: TelemetrySnapshot::from(&counters, &timer),
        })
    }

    /// Read and cross-validate every location, with per-location outcomes.
    pub fn extract_report<C: Carrier>(&self, carrier: &C) -> Result<ExtractReport, WatermarkError> {
        let kind = carrier.kind();
        let mut timer = TelemetryTimer::new();
        let mut counters = TelemetryCounters::default();

        let mut present = Vec::new();
        let mut absent = Vec::new();
        let mut failed = Vec::new();
        let mut distinct: Vec<String> = Vec::new();

        for loc in carrier.locations() {
            match timer.time(Stage::Read, || loc.read(carrier)) {
                Ok(Some(raw)) => {
                    counters.add_read(Some(true));
                    debug!(%kind, location = loc.name(), "location present");
                    present.push(loc.name());
                    let value = self.obfuscator.reveal(&raw);
                    if !distinct.contains(&value) {
                        distinct.push(value);
                    }
                }
                Ok(None) => {
                    counters.add_read(Some(false));
                    debug!(%kind, location = loc.name(), "location empty");
                    absent.push(loc.name());
                }
                Err(e) => {
                    counters.add_read(None);
                    warn!(%kind, location = loc.name(), error = %e, "skipping unreadable location");
                    failed.push(LocationFailure { location: loc.name(), error: e.to_string() });
                }
            }
        }

        if distinct.len() > 1 {
            warn!(%kind, distinct = distinct.len(), "locations disagree");
            return Err(WatermarkError::Consistency { distinct: distinct.len() });
        }

        let envelope = match distinct.pop() {
            Some(wire) => Some(timer.time(Stage::Validate, || EncryptedEnvelope::from_wire(&wire))?),
            None => None,
        };

        timer.finish();
        Ok(ExtractReport {
            kind,
            envelope,
            present,
            absent,
            failed,
            telemetry: TelemetrySnapshot::from(&counters, &timer),
        })
    }

    /// The accepted envelope, or `None` when no location holds a value.
    pub fn extract<C: Carrier>(&self, carrier: &C) -> Result<Option<EncryptedEnvelope>, WatermarkError> {
        Ok(self.extract_report(carrier)?.envelope)
    }

    fn open(&self, envelope: &EncryptedEnvelope, password: &str) -> Result<SealedWatermark, WatermarkError> {
        Ok(self.envelope.open(envelope, password)?)
    }

    pub fn extract_record<C: Carrier>(
        &self,
        carrier: &C,
        password: &str,
    ) -> Result<Option<WatermarkRecord>, WatermarkError> {
        match self.extract(carrier)? {
            Some(envelope) => Ok(Some(self.open(&envelope, password)?.record)),
            None => Ok(None),
        }
    }

    /// Extract, open, and check the sealed kind against the carrier.
    pub fn verify<C: Carrier>(&self, carrier: &C, password: &str) -> Result<Verified, WatermarkError> {
        let kind = carrier.kind();
        let envelope = self.extract(carrier)?.ok_or(WatermarkError::NotFound)?;
        let sealed = self.open(&envelope, password)?;

        if let Some(meta) = &sealed.meta {
            if meta.kind != kind {
                return Err(WatermarkError::KindMismatch { sealed: meta.kind, actual: kind });
            }
        }

        info!(%kind, "verified watermark");
        Ok(Verified { record: sealed.record, meta: sealed.meta })
    }

    pub fn embed_container(
        &self,
        container: &mut Container,
        record: &WatermarkRecord,
        password: &str,
    ) -> Result<EmbedReport, WatermarkError> {
        match container {
            Container::Word(d) => self.embed(d, record, password),
            Container::Presentation(d) => self.embed(d, record, password),
            Container::Pdf(d) => self.embed(d, record, password),
            Container::PlainText(d) => self.embed(d, record, password),
        }
    }

    pub fn extract_container(&self, container: &Container) -> Result<Option<EncryptedEnvelope>, WatermarkError> {
        match container {
            Container::Word(d) => self.extract(d),
            Container::Presentation(d) => self.extract(d),
            Container::Pdf(d) => self.extract(d),
            Container::PlainText(d) => self.extract(d),
        }
    }

    pub fn verify_container(&self, container: &Container, password: &str) -> Result<Verified, WatermarkError> {
        match container {
            Container::Word(d) => self.verify(d, password),
            Container::Presentation(d) => self.verify(d, password),
            Container::Pdf(d) => self.verify(d, password),
            Container::PlainText(d) => self.verify(d, password),
        }
    }

    /// Open `input`, embed, save to `output`. `input` is never modified
    /// unless it is also `output`.
    pub fn embed_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        record: &WatermarkRecord,
        password: &str,
    ) -> Result<EmbedReport, WatermarkError> {
        let mut container = Container::open(input)?;
        let report = self.embed_container(&mut container, record, password)?;
        container.save(output)?;
        Ok(report)
    }

    pub fn verify_file(&self, path: impl AsRef<Path>, password: &str) -> Result<Verified, WatermarkError> {
        let container = Container::open(path)?;
        self.verify_container(&container, password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_marker_is_rejected() {
        let cfg = EngineConfig { marker: 'x', ..Default::default() };
        assert!(matches!(WatermarkEngine::new(cfg), Err(WatermarkError::Config(_))));
    }

    #[test]
    fn weak_kdf_is_a_config_error() {
        let mut cfg = EngineConfig::default();
        cfg.envelope.kdf_iterations = 10;
        assert!(matches!(cfg.validate(), Err(WatermarkError::Config(_))));
    }

    #[test]
    fn config_from_partial_json() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"origin":"10.0.0.7"}"#).unwrap();
        assert_eq!(cfg.origin.as_deref(), Some("10.0.0.7"));
        assert_eq!(cfg.marker, DEFAULT_OBFUSCATION_MARKER);
        assert!(cfg.stamp_metadata);
    }

    #[test]
    fn engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WatermarkEngine>();
    }
}
