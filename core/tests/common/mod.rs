//! Shared fixtures: minimal documents of every kind and an in-memory carrier.
#![allow(dead_code)]

use std::io::{Cursor, Write};

use lopdf::{Dictionary, Document, Object, Stream};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use watermark_core::container::ContainerKind;
use watermark_core::location::{Carrier, EmbeddingLocation};
use watermark_core::types::AdapterError;

pub const CONTENT: &str = "secret-note";
pub const USER: &str = "alice";
pub const PASSWORD: &str = "pw123";
pub const WRONG_PASSWORD: &str = "wrong";

fn zip_parts(parts: &[(&str, String)]) -> Vec<u8> {
    let mut w = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in parts {
        w.start_file(*name, SimpleFileOptions::default()).unwrap();
        w.write_all(body.as_bytes()).unwrap();
    }
    w.finish().unwrap().into_inner()
}

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub fn docx_bytes() -> Vec<u8> {
    docx_with(Vec::new(), "")
}

/// Bibliography source list stored the way Word stores citations.
pub const BIBLIOGRAPHY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?><b:Sources xmlns:b="http://schemas.openxmlformats.org/officeDocument/2006/bibliography" SelectedStyle="/APA.XSL"><b:Source><b:Tag>Knu84</b:Tag><b:Title>Literate Programming</b:Title></b:Source></b:Sources>"#;

/// Document whose `customXml/item1.xml` already holds a bibliography.
pub fn docx_with_bibliography_bytes() -> Vec<u8> {
    docx_with(
        vec![("customXml/item1.xml", BIBLIOGRAPHY_XML.to_string())],
        r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/customXml" Target="../customXml/item1.xml"/>"#,
    )
}

fn docx_with(extra_parts: Vec<(&'static str, String)>, extra_doc_rels: &str) -> Vec<u8> {
    let mut parts = vec![
        (
            "[Content_Types].xml",
            format!(
                r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#
            ),
        ),
        (
            "_rels/.rels",
            format!(
                r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#
            ),
        ),
        (
            "word/document.xml",
            format!(
                r#"{XML_DECL}<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Quarterly report</w:t></w:r></w:p></w:body></w:document>"#
            ),
        ),
        (
            "word/styles.xml",
            format!(
                r#"{XML_DECL}<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style></w:styles>"#
            ),
        ),
        (
            "word/_rels/document.xml.rels",
            format!(
                r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>{extra_doc_rels}</Relationships>"#
            ),
        ),
    ];
    parts.extend(extra_parts);
    zip_parts(&parts)
}

const P_NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

/// Deck with one slide and two layouts. `with_notes` adds a notes page to the slide.
pub fn pptx_bytes(with_notes: bool) -> Vec<u8> {
    let slide_rels = if with_notes {
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide1.xml"/>"#
    } else {
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#
    };

    let mut parts = vec![
        (
            "[Content_Types].xml",
            format!(
                r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#
            ),
        ),
        (
            "_rels/.rels",
            format!(
                r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#
            ),
        ),
        (
            "docProps/core.xml",
            format!(
                r#"{XML_DECL}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Roadmap</dc:title></cp:coreProperties>"#
            ),
        ),
        (
            "ppt/presentation.xml",
            format!(r#"{XML_DECL}<p:presentation {P_NS}><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst></p:presentation>"#),
        ),
        (
            "ppt/_rels/presentation.xml.rels",
            format!(
                r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/></Relationships>"#
            ),
        ),
        (
            "ppt/slides/slide1.xml",
            format!(r#"{XML_DECL}<p:sld {P_NS}><p:cSld><p:spTree/></p:cSld></p:sld>"#),
        ),
        (
            "ppt/slides/_rels/slide1.xml.rels",
            format!(r#"{XML_DECL}<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{slide_rels}</Relationships>"#),
        ),
        (
            "ppt/slideLayouts/slideLayout1.xml",
            format!(r#"{XML_DECL}<p:sldLayout {P_NS} preserve="1"><p:cSld name="Title Slide"/></p:sldLayout>"#),
        ),
        (
            "ppt/slideLayouts/slideLayout2.xml",
            format!(r#"{XML_DECL}<p:sldLayout {P_NS}><p:cSld name="Blank"/></p:sldLayout>"#),
        ),
    ];

    if with_notes {
        parts.push((
            "ppt/notesSlides/notesSlide1.xml",
            format!(
                r#"{XML_DECL}<p:notes {P_NS}><p:cSld><p:spTree><p:sp><p:nvSpPr><p:cNvPr id="2" name="Notes Placeholder 1"/><p:cNvSpPr/><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>Speaker notes</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:notes>"#
            ),
        ));
    }

    zip_parts(&parts)
}

fn name(n: &str) -> Object {
    Object::Name(n.as_bytes().to_vec())
}

/// Two-page PDF without any metadata stream.
pub fn pdf_bytes() -> Vec<u8> {
    pdf_with(None)
}

/// XMP packet with a title and a creator tool but no description.
pub const TITLED_XMP: &str = concat!(
    "<?xpacket begin='' id='W5M0MpCehiHzreSzNTczkc9d'?>",
    "<x:xmpmeta xmlns:x='adobe:ns:meta/'><rdf:RDF xmlns:rdf='http://www.w3.org/1999/02/22-rdf-syntax-ns#'>",
    "<rdf:Description rdf:about='' xmlns:dc='http://purl.org/dc/elements/1.1/'>",
    "<dc:title><rdf:Alt><rdf:li xml:lang='x-default'>Annual Report</rdf:li></rdf:Alt></dc:title></rdf:Description>",
    "<rdf:Description rdf:about='' xmlns:xmp='http://ns.adobe.com/xap/1.0/'><xmp:CreatorTool>Writer</xmp:CreatorTool></rdf:Description>",
    "</rdf:RDF></x:xmpmeta><?xpacket end='w'?>"
);

/// Same two pages, with `TITLED_XMP` as the catalog's metadata stream.
pub fn pdf_with_xmp_bytes() -> Vec<u8> {
    pdf_with(Some(TITLED_XMP))
}

fn pdf_with(xmp: Option<&str>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..2 {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), b"BT ET".to_vec()));
        let mut page = Dictionary::new();
        page.set("Type", name("Page"));
        page.set("Parent", Object::Reference(pages_id));
        page.set("Contents", Object::Reference(content_id));
        page.set(
            "MediaBox",
            Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(595), Object::Integer(842)]),
        );
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages = Dictionary::new();
    pages.set("Type", name("Pages"));
    pages.set("Count", Object::Integer(kids.len() as i64));
    pages.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", name("Catalog"));
    catalog.set("Pages", Object::Reference(pages_id));
    if let Some(xmp) = xmp {
        let mut meta = Dictionary::new();
        meta.set("Type", name("Metadata"));
        meta.set("Subtype", name("XML"));
        catalog.set("Metadata", Object::Reference(doc.add_object(Stream::new(meta, xmp.as_bytes().to_vec()))));
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

pub fn txt_bytes() -> Vec<u8> {
    "Meeting notes\nShip on Friday.\n".as_bytes().to_vec()
}

pub fn fixture(kind: ContainerKind) -> Vec<u8> {
    match kind {
        ContainerKind::WordProcessing => docx_bytes(),
        ContainerKind::Presentation => pptx_bytes(true),
        ContainerKind::Pdf => pdf_bytes(),
        ContainerKind::PlainText => txt_bytes(),
    }
}

// -----------------------------------------------------------------------------
// In-memory carrier
// -----------------------------------------------------------------------------

/// Three named slots; any slot can be told to fail.
#[derive(Debug, Clone)]
pub struct MemoryCarrier {
    pub kind: ContainerKind,
    pub slots: Vec<Option<String>>,
    pub broken: Vec<bool>,
}

pub const SLOT_NAMES: [&str; 3] = ["slot-a", "slot-b", "slot-c"];

impl MemoryCarrier {
    pub fn new(kind: ContainerKind) -> Self {
        Self { kind, slots: vec![None; 3], broken: vec![false; 3] }
    }

    pub fn with_broken(kind: ContainerKind, broken: [bool; 3]) -> Self {
        Self { kind, slots: vec![None; 3], broken: broken.to_vec() }
    }
}

struct Slot(usize);

impl EmbeddingLocation<MemoryCarrier> for Slot {
    fn name(&self) -> &'static str {
        SLOT_NAMES[self.0]
    }

    fn write(&self, c: &mut MemoryCarrier, payload: &str) -> Result<(), AdapterError> {
        if c.broken[self.0] {
            return Err(AdapterError::new(c.kind, self.name(), anyhow::anyhow!("slot is read-only")));
        }
        c.slots[self.0] = Some(payload.to_string());
        Ok(())
    }

    fn read(&self, c: &MemoryCarrier) -> Result<Option<String>, AdapterError> {
        if c.broken[self.0] {
            return Err(AdapterError::new(c.kind, self.name(), anyhow::anyhow!("slot is unreadable")));
        }
        Ok(c.slots[self.0].clone())
    }
}

impl Carrier for MemoryCarrier {
    fn kind(&self) -> ContainerKind {
        self.kind
    }

    fn locations(&self) -> Vec<Box<dyn EmbeddingLocation<Self>>> {
        (0..3).map(|i| Box::new(Slot(i)) as Box<dyn EmbeddingLocation<Self>>).collect()
    }
}
