//! container/word.rs
//! WordprocessingML (.docx) carrier.
//!
//! Locations, in order:
//! - `style-rsid`: JSON `{rsid, data}` in a `w:rsid` attribute on the Normal style
//! - `related-part`: a `customXml/itemN.xml` part linked from the main document part
//! - `custom-xml`: a `customXml/itemN.xml` part with `watermark:data` and `watermark:hash`
//!
//! Both custom XML locations are found by their root element and namespace,
//! and a new one takes the first free `itemN` name. Custom XML parts already
//! in the document stay untouched.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{WATERMARK_REL_TYPE, WATERMARK_XML_NS};
use crate::container::ooxml::{relative_target, OoxmlPackage};
use crate::container::{xml, ContainerKind};
use crate::crypto::{sha256, watermark_id};
use crate::location::{at, Carrier, EmbeddingLocation};
use crate::types::AdapterError;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const CUSTOM_XML_PREFIX: &str = "customXml/item";
const XML_CONTENT_TYPE: &str = "application/xml";

#[derive(Debug, Clone)]
pub struct WordDocument {
    package: OoxmlPackage,
}

impl WordDocument {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AdapterError> {
        let package = OoxmlPackage::from_bytes(bytes).map_err(|e| AdapterError::package(ContainerKind::WordProcessing, e))?;
        if !package.has_part(DOCUMENT_PART) {
            return Err(AdapterError::package(
                ContainerKind::WordProcessing,
                anyhow!("missing {DOCUMENT_PART}"),
            ));
        }
        Ok(Self { package })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AdapterError> {
        self.package.to_bytes().map_err(|e| AdapterError::package(ContainerKind::WordProcessing, e))
    }

    pub fn package(&self) -> &OoxmlPackage {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut OoxmlPackage {
        &mut self.package
    }
}

impl Carrier for WordDocument {
    fn kind(&self) -> ContainerKind {
        ContainerKind::WordProcessing
    }

    fn locations(&self) -> Vec<Box<dyn EmbeddingLocation<Self>>> {
        vec![Box::new(StyleRsid), Box::new(RelatedPart), Box::new(CustomXml)]
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RsidValue {
    rsid: String,
    data: String,
}

/// Start tag of the Normal paragraph style, falling back to the default paragraph style.
fn normal_style(styles: &str) -> Option<xml::TagSpan> {
    let tags = xml::find_all_start_tags(styles, "w:style");
    tags.iter()
        .copied()
        .find(|t| xml::tag_attr(t.as_str(styles), "w:styleId").as_deref() == Some("Normal"))
        .or_else(|| {
            tags.iter().copied().find(|t| {
                let tag = t.as_str(styles);
                xml::tag_attr(tag, "w:type").as_deref() == Some("paragraph")
                    && matches!(xml::tag_attr(tag, "w:default").as_deref(), Some("1") | Some("true"))
            })
        })
}

struct StyleRsid;

impl StyleRsid {
    fn write_inner(doc: &mut WordDocument, payload: &str) -> Result<()> {
        let styles = doc.package.xml(STYLES_PART)?;
        let span = normal_style(&styles).ok_or_else(|| anyhow!("no Normal style"))?;
        let value = serde_json::to_string(&RsidValue {
            rsid: watermark_id(payload.as_bytes()),
            data: payload.to_string(),
        })?;
        doc.package.set_xml(STYLES_PART, xml::set_attr_at(&styles, span, "w:rsid", &value));
        Ok(())
    }

    fn read_inner(doc: &WordDocument) -> Result<Option<String>> {
        let Some(styles) = doc.package.xml_opt(STYLES_PART)? else {
            return Ok(None);
        };
        let Some(span) = normal_style(&styles) else {
            return Ok(None);
        };
        let Some(raw) = xml::tag_attr(span.as_str(&styles), "w:rsid") else {
            return Ok(None);
        };
        let value: RsidValue = serde_json::from_str(&raw).context("w:rsid is not a watermark value")?;
        Ok(Some(value.data))
    }
}

impl EmbeddingLocation<WordDocument> for StyleRsid {
    fn name(&self) -> &'static str {
        "style-rsid"
    }

    fn write(&self, doc: &mut WordDocument, payload: &str) -> Result<(), AdapterError> {
        at(ContainerKind::WordProcessing, self.name(), Self::write_inner(doc, payload))
    }

    fn read(&self, doc: &WordDocument) -> Result<Option<String>, AdapterError> {
        at(ContainerKind::WordProcessing, self.name(), Self::read_inner(doc))
    }
}

struct RelatedPart;

/// Whether the first `root` element of `body` binds `ns_attr` to the watermark namespace.
fn has_watermark_root(body: &str, root: &str, ns_attr: &str) -> bool {
    xml::find_start_tag(body, root, 0)
        .and_then(|tag| xml::tag_attr(tag.as_str(body), ns_attr))
        .is_some_and(|ns| ns == WATERMARK_XML_NS)
}

fn free_custom_xml_part(pkg: &OoxmlPackage) -> String {
    pkg.free_part_name(CUSTOM_XML_PREFIX)
}

/// First custom XML part whose root is `root` in the watermark namespace.
fn find_custom_xml_part(pkg: &OoxmlPackage, root: &str, ns_attr: &str) -> Result<Option<String>> {
    let candidates: Vec<String> = pkg
        .part_names()
        .filter(|name| name.starts_with(CUSTOM_XML_PREFIX) && name.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    for name in candidates {
        if let Some(body) = pkg.xml_opt(&name)? {
            if has_watermark_root(&body, root, ns_attr) {
                return Ok(Some(name));
            }
        }
    }
    Ok(None)
}

impl RelatedPart {
    /// The linked watermark part, if the document already has one.
    fn linked_part(pkg: &OoxmlPackage) -> Result<Option<String>> {
        let Some(part) = pkg.related_part(DOCUMENT_PART, WATERMARK_REL_TYPE)? else {
            return Ok(None);
        };
        let owned = pkg.xml_opt(&part)?.is_some_and(|body| has_watermark_root(&body, "watermark", "xmlns"));
        Ok(owned.then_some(part))
    }

    fn write_inner(doc: &mut WordDocument, payload: &str) -> Result<()> {
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<watermark xmlns=\"{}\"><data>{}</data></watermark>",
            WATERMARK_XML_NS,
            xml::escape(payload)
        );
        let pkg = &mut doc.package;
        let part = match Self::linked_part(pkg)? {
            Some(part) => part,
            None => free_custom_xml_part(pkg),
        };
        pkg.set_xml(&part, body);
        pkg.ensure_default_content_type("xml", XML_CONTENT_TYPE)?;
        pkg.add_relationship(DOCUMENT_PART, WATERMARK_REL_TYPE, &relative_target(DOCUMENT_PART, &part))?;
        Ok(())
    }

    fn read_inner(doc: &WordDocument) -> Result<Option<String>> {
        let Some(part) = doc.package.related_part(DOCUMENT_PART, WATERMARK_REL_TYPE)? else {
            return Ok(None);
        };
        let Some(body) = doc.package.xml_opt(&part)? else {
            return Err(anyhow!("relationship points at missing part {part}"));
        };
        Ok(xml::element_text(&body, "data").filter(|s| !s.is_empty()))
    }
}

impl EmbeddingLocation<WordDocument> for RelatedPart {
    fn name(&self) -> &'static str {
        "related-part"
    }

    fn write(&self, doc: &mut WordDocument, payload: &str) -> Result<(), AdapterError> {
        at(ContainerKind::WordProcessing, self.name(), Self::write_inner(doc, payload))
    }

    fn read(&self, doc: &WordDocument) -> Result<Option<String>, AdapterError> {
        at(ContainerKind::WordProcessing, self.name(), Self::read_inner(doc))
    }
}

struct CustomXml;

const SETTINGS_ROOT: &str = "watermark:settings";
const SETTINGS_NS_ATTR: &str = "xmlns:watermark";

impl CustomXml {
    fn write_inner(doc: &mut WordDocument, payload: &str) -> Result<()> {
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<watermark:settings xmlns:watermark=\"{}\"><watermark:data>{}</watermark:data><watermark:hash>{}</watermark:hash></watermark:settings>",
            WATERMARK_XML_NS,
            xml::escape(payload),
            hex::encode(sha256(payload.as_bytes()))
        );
        let pkg = &mut doc.package;
        let part = match find_custom_xml_part(pkg, SETTINGS_ROOT, SETTINGS_NS_ATTR)? {
            Some(part) => part,
            None => free_custom_xml_part(pkg),
        };
        pkg.set_xml(&part, body);
        pkg.ensure_default_content_type("xml", XML_CONTENT_TYPE)?;
        Ok(())
    }

    /// A stale `watermark:hash` is logged, and the data is still returned so
    /// a changed value shows up as a disagreement between locations.
    fn read_inner(doc: &WordDocument) -> Result<Option<String>> {
        let Some(part) = find_custom_xml_part(&doc.package, SETTINGS_ROOT, SETTINGS_NS_ATTR)? else {
            return Ok(None);
        };
        let body = doc.package.xml(&part)?;
        let Some(data) = xml::element_text(&body, "watermark:data").filter(|s| !s.is_empty()) else {
            return Ok(None);
        };
        if let Some(hash) = xml::element_text(&body, "watermark:hash") {
            if !hash.eq_ignore_ascii_case(&hex::encode(sha256(data.as_bytes()))) {
                warn!(part = %part, "watermark:hash does not match watermark:data");
            }
        }
        Ok(Some(data))
    }
}

impl EmbeddingLocation<WordDocument> for CustomXml {
    fn name(&self) -> &'static str {
        "custom-xml"
    }

    fn write(&self, doc: &mut WordDocument, payload: &str) -> Result<(), AdapterError> {
        at(ContainerKind::WordProcessing, self.name(), Self::write_inner(doc, payload))
    }

    fn read(&self, doc: &WordDocument) -> Result<Option<String>, AdapterError> {
        at(ContainerKind::WordProcessing, self.name(), Self::read_inner(doc))
    }
}
