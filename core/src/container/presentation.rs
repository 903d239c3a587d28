//! container/presentation.rs
//! PresentationML (.pptx) carrier.
//!
//! Locations, in order:
//! - `core-comments`: `dc:description` in `docProps/core.xml`
//! - `slide-layouts`: `customData` attribute on every slide layout root
//! - `notes`: body text of the first slide's notes page, created on write
//!   (with a notes master when the deck has none) if the slide has no notes

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::container::ooxml::{relative_target, OoxmlPackage};
use crate::container::{xml, ContainerKind};
use crate::crypto::watermark_id;
use crate::location::{at, Carrier, EmbeddingLocation};
use crate::types::AdapterError;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const CORE_PART: &str = "docProps/core.xml";
const LAYOUT_PREFIX: &str = "ppt/slideLayouts/slideLayout";
const NOTES_SLIDE_STEM: &str = "ppt/notesSlides/notesSlide";
const NOTES_MASTER_STEM: &str = "ppt/notesMasters/notesMaster";

const CORE_PROPS_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const CORE_PROPS_CT: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const NOTES_SLIDE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
const NOTES_MASTER_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
const SLIDE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const THEME_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
const NOTES_SLIDE_CT: &str = "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
const NOTES_MASTER_CT: &str = "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml";

const PML_DECL: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n"
);
const PML_NS: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#
);
const GROUP_SHAPE: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr/>"#
);
const BODY_PLACEHOLDER: &str = concat!(
    r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Notes Placeholder 1"/>"#,
    r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr>"#,
    r#"<p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p/></p:txBody></p:sp>"#
);

const EMPTY_CORE: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
    r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
    r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"></cp:coreProperties>"#
);

#[derive(Debug, Clone)]
pub struct PresentationDocument {
    package: OoxmlPackage,
}

impl PresentationDocument {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AdapterError> {
        let package = OoxmlPackage::from_bytes(bytes).map_err(|e| AdapterError::package(ContainerKind::Presentation, e))?;
        if !package.has_part(PRESENTATION_PART) {
            return Err(AdapterError::package(
                ContainerKind::Presentation,
                anyhow!("missing {PRESENTATION_PART}"),
            ));
        }
        Ok(Self { package })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AdapterError> {
        self.package.to_bytes().map_err(|e| AdapterError::package(ContainerKind::Presentation, e))
    }

    pub fn package(&self) -> &OoxmlPackage {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut OoxmlPackage {
        &mut self.package
    }

    /// Slide layout parts ordered by layout number.
    fn layout_parts(&self) -> Vec<String> {
        let mut layouts: Vec<(u32, String)> = self
            .package
            .part_names()
            .filter_map(|n| {
                let num = n.strip_prefix(LAYOUT_PREFIX)?.strip_suffix(".xml")?.parse().ok()?;
                Some((num, n.to_string()))
            })
            .collect();
        layouts.sort();
        layouts.into_iter().map(|(_, n)| n).collect()
    }

    /// Part name of the first slide in presentation order.
    fn first_slide(&self) -> Result<Option<String>> {
        let pres = self.package.xml(PRESENTATION_PART)?;
        let Some(slide_id) = xml::find_start_tag(&pres, "p:sldId", 0) else {
            return Ok(None);
        };
        let rid = xml::tag_attr(slide_id.as_str(&pres), "r:id").ok_or_else(|| anyhow!("p:sldId without r:id"))?;
        self.package.part_by_rel_id(PRESENTATION_PART, &rid)
    }

    /// Notes page of the first slide, if it has one. Fails when there is no slide.
    fn first_notes(&self) -> Result<Option<String>> {
        let slide = self.first_slide()?.ok_or_else(|| anyhow!("presentation has no slides"))?;
        self.package.related_part(&slide, NOTES_SLIDE_REL)
    }

    /// Notes page of the first slide, created when missing.
    fn ensure_first_notes(&mut self) -> Result<String> {
        let slide = self.first_slide()?.ok_or_else(|| anyhow!("presentation has no slides"))?;
        if let Some(part) = self.package.related_part(&slide, NOTES_SLIDE_REL)? {
            return Ok(part);
        }
        let master = self.ensure_notes_master()?;

        let pkg = &mut self.package;
        let part = pkg.free_part_name(NOTES_SLIDE_STEM);
        pkg.set_xml(
            &part,
            format!(
                "{PML_DECL}<p:notes {PML_NS}><p:cSld><p:spTree>{GROUP_SHAPE}{BODY_PLACEHOLDER}</p:spTree></p:cSld>\
                 <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>"
            ),
        );
        pkg.ensure_override_content_type(&part, NOTES_SLIDE_CT)?;
        pkg.add_relationship(&part, NOTES_MASTER_REL, &relative_target(&part, &master))?;
        pkg.add_relationship(&part, SLIDE_REL, &relative_target(&part, &slide))?;
        pkg.add_relationship(&slide, NOTES_SLIDE_REL, &relative_target(&slide, &part))?;
        debug!(slide = %slide, notes = %part, "created notes page");
        Ok(part)
    }

    /// The deck's notes master. A missing one is created, registered in
    /// `p:notesMasterIdLst`, and linked to the deck's theme when there is one.
    fn ensure_notes_master(&mut self) -> Result<String> {
        if let Some(master) = self.package.related_part(PRESENTATION_PART, NOTES_MASTER_REL)? {
            return Ok(master);
        }
        let theme = self.package.related_part(PRESENTATION_PART, THEME_REL)?;

        let pkg = &mut self.package;
        let master = pkg.free_part_name(NOTES_MASTER_STEM);
        pkg.set_xml(
            &master,
            format!(
                "{PML_DECL}<p:notesMaster {PML_NS}><p:cSld><p:spTree>{GROUP_SHAPE}{BODY_PLACEHOLDER}</p:spTree></p:cSld>\
                 <p:clrMap bg1=\"lt1\" tx1=\"dk1\" bg2=\"lt2\" tx2=\"dk2\" accent1=\"accent1\" accent2=\"accent2\" \
                 accent3=\"accent3\" accent4=\"accent4\" accent5=\"accent5\" accent6=\"accent6\" hlink=\"hlink\" \
                 folHlink=\"folHlink\"/></p:notesMaster>"
            ),
        );
        pkg.ensure_override_content_type(&master, NOTES_MASTER_CT)?;
        if let Some(theme) = theme {
            pkg.add_relationship(&master, THEME_REL, &relative_target(&master, &theme))?;
        }
        let rid = pkg.add_relationship(PRESENTATION_PART, NOTES_MASTER_REL, &relative_target(PRESENTATION_PART, &master))?;

        // notesMasterIdLst sits before handoutMasterIdLst and sldIdLst
        let pres = pkg.xml(PRESENTATION_PART)?;
        let list = format!(
            r#"<p:notesMasterIdLst><p:notesMasterId r:id="{}"/></p:notesMasterIdLst>"#,
            xml::escape(&rid)
        );
        let edited = xml::insert_before(&pres, "<p:handoutMasterIdLst", &list)
            .or_else(|| xml::insert_before(&pres, "<p:sldIdLst", &list))
            .ok_or_else(|| anyhow!("{PRESENTATION_PART} has no p:sldIdLst"))?;
        pkg.set_xml(PRESENTATION_PART, edited);
        Ok(master)
    }
}

impl Carrier for PresentationDocument {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Presentation
    }

    fn locations(&self) -> Vec<Box<dyn EmbeddingLocation<Self>>> {
        vec![Box::new(CoreComments), Box::new(SlideLayouts), Box::new(Notes)]
    }
}

struct CoreComments;

impl CoreComments {
    fn write_inner(doc: &mut PresentationDocument, payload: &str) -> Result<()> {
        let pkg = &mut doc.package;
        let core = match pkg.xml_opt(CORE_PART)? {
            Some(core) => core,
            None => {
                pkg.ensure_override_content_type(CORE_PART, CORE_PROPS_CT)?;
                pkg.add_relationship("", CORE_PROPS_REL, CORE_PART)?;
                EMPTY_CORE.to_string()
            }
        };
        let edited = match xml::set_element_text(&core, "dc:description", payload) {
            Some(edited) => edited,
            None => xml::insert_before(
                &core,
                "</cp:coreProperties>",
                &format!("<dc:description>{}</dc:description>", xml::escape(payload)),
            )
            .ok_or_else(|| anyhow!("{CORE_PART} has no </cp:coreProperties>"))?,
        };
        pkg.set_xml(CORE_PART, edited);
        Ok(())
    }

    fn read_inner(doc: &PresentationDocument) -> Result<Option<String>> {
        let Some(core) = doc.package.xml_opt(CORE_PART)? else {
            return Ok(None);
        };
        Ok(xml::element_text(&core, "dc:description").filter(|s| !s.is_empty()))
    }
}

impl EmbeddingLocation<PresentationDocument> for CoreComments {
    fn name(&self) -> &'static str {
        "core-comments"
    }

    fn write(&self, doc: &mut PresentationDocument, payload: &str) -> Result<(), AdapterError> {
        at(ContainerKind::Presentation, self.name(), Self::write_inner(doc, payload))
    }

    fn read(&self, doc: &PresentationDocument) -> Result<Option<String>, AdapterError> {
        at(ContainerKind::Presentation, self.name(), Self::read_inner(doc))
    }
}

struct SlideLayouts;

impl SlideLayouts {
    fn write_inner(doc: &mut PresentationDocument, payload: &str) -> Result<()> {
        let layouts = doc.layout_parts();
        if layouts.is_empty() {
            return Err(anyhow!("presentation has no slide layouts"));
        }
        for part in layouts {
            let layout = doc.package.xml(&part)?;
            let root = xml::find_start_tag(&layout, "p:sldLayout", 0)
                .ok_or_else(|| anyhow!("{part} has no p:sldLayout root"))?;
            let tagged = xml::set_attr_at(&layout, root, "customData", payload);
            // per-layout identifier
            let root = xml::find_start_tag(&tagged, "p:sldLayout", 0)
                .ok_or_else(|| anyhow!("{part} lost its root"))?;
            let id = watermark_id(format!("{payload}{part}").as_bytes());
            doc.package.set_xml(&part, xml::set_attr_at(&tagged, root, "customDataId", &id));
        }
        Ok(())
    }

    fn read_inner(doc: &PresentationDocument) -> Result<Option<String>> {
        for part in doc.layout_parts() {
            let layout = doc.package.xml(&part)?;
            let Some(root) = xml::find_start_tag(&layout, "p:sldLayout", 0) else {
                continue;
            };
            if let Some(value) = xml::tag_attr(root.as_str(&layout), "customData").filter(|v| !v.is_empty()) {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

impl EmbeddingLocation<PresentationDocument> for SlideLayouts {
    fn name(&self) -> &'static str {
        "slide-layouts"
    }

    fn write(&self, doc: &mut PresentationDocument, payload: &str) -> Result<(), AdapterError> {
        at(ContainerKind::Presentation, self.name(), Self::write_inner(doc, payload))
    }

    fn read(&self, doc: &PresentationDocument) -> Result<Option<String>, AdapterError> {
        at(ContainerKind::Presentation, self.name(), Self::read_inner(doc))
    }
}

/// Range of the body placeholder's `p:txBody` inner markup.
fn notes_body(notes: &str) -> Option<std::ops::Range<usize>> {
    let mut pos = 0;
    while let Some(ph) = xml::find_start_tag(notes, "p:ph", pos) {
        pos = ph.end;
        if xml::tag_attr(ph.as_str(notes), "type").as_deref() == Some("body") {
            let (inner, _) = xml::element_inner(notes, "p:txBody", ph.end)?;
            return Some(inner);
        }
    }
    None
}

struct Notes;

impl Notes {
    fn write_inner(doc: &mut PresentationDocument, payload: &str) -> Result<()> {
        let part = doc.ensure_first_notes()?;
        let notes = doc.package.xml(&part)?;
        let body = notes_body(&notes).ok_or_else(|| anyhow!("{part} has no body placeholder"))?;

        // Keep bodyPr/lstStyle, replace every paragraph.
        let inner = &notes[body.clone()];
        let keep = match xml::find_start_tag(inner, "a:p", 0) {
            Some(p) => p.start,
            None => inner.len(),
        };
        let paragraph = format!(
            "<a:p><a:r><a:rPr lang=\"en-US\" dirty=\"0\"/><a:t>{}</a:t></a:r></a:p>",
            xml::escape(payload)
        );
        let edited = format!(
            "{}{}{}{}",
            &notes[..body.start],
            &inner[..keep],
            paragraph,
            &notes[body.end..]
        );
        doc.package.set_xml(&part, edited);
        Ok(())
    }

    fn read_inner(doc: &PresentationDocument) -> Result<Option<String>> {
        let Some(part) = doc.first_notes()? else {
            return Ok(None);
        };
        let notes = doc.package.xml(&part)?;
        let Some(body) = notes_body(&notes) else {
            return Ok(None);
        };
        let inner = &notes[body];

        let mut paragraphs = Vec::new();
        let mut pos = 0;
        while let Some((p, after)) = xml::element_inner(inner, "a:p", pos) {
            let para = &inner[p];
            let mut text = String::new();
            let mut tpos = 0;
            while let Some((t, t_after)) = xml::element_inner(para, "a:t", tpos) {
                text.push_str(&xml::unescape(&para[t]));
                tpos = t_after;
            }
            paragraphs.push(text);
            pos = after;
        }
        let text = paragraphs.join("\n");
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

impl EmbeddingLocation<PresentationDocument> for Notes {
    fn name(&self) -> &'static str {
        "notes"
    }

    fn write(&self, doc: &mut PresentationDocument, payload: &str) -> Result<(), AdapterError> {
        at(ContainerKind::Presentation, self.name(), Self::write_inner(doc, payload))
    }

    fn read(&self, doc: &PresentationDocument) -> Result<Option<String>, AdapterError> {
        at(ContainerKind::Presentation, self.name(), Self::read_inner(doc))
    }
}
