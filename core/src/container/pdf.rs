//! container/pdf.rs
//! PDF carrier on top of `lopdf`.
//!
//! Locations, in order:
//! - `xmp-metadata`: `<dc:description>` in the catalog's XMP `/Metadata` stream;
//!   an existing packet keeps its other properties
//! - `catalog`: `/WatermarkData << /WatermarkID /Data >>` in the document catalog
//! - `page-structure`: the same dictionary on every page
//!
//! Strings are stored as raw UTF-8 literal strings.

use anyhow::{anyhow, Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::container::{xml, ContainerKind};
use crate::crypto::watermark_id;
use crate::location::{at, Carrier, EmbeddingLocation};
use crate::types::AdapterError;

const WATERMARK_KEY: &[u8] = b"WatermarkData";

#[derive(Debug, Clone)]
pub struct PdfDocument {
    doc: Document,
}

impl PdfDocument {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AdapterError> {
        let doc = Document::load_mem(bytes)
            .context("not a PDF")
            .map_err(|e| AdapterError::package(ContainerKind::Pdf, e))?;
        if doc.trailer.has(b"Encrypt") {
            return Err(AdapterError::package(ContainerKind::Pdf, anyhow!("encrypted PDFs are not supported")));
        }
        Ok(Self { doc })
    }

    pub fn from_document(doc: Document) -> Self {
        Self { doc }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AdapterError> {
        let mut out = Vec::new();
        // save_to rewrites the xref table, so it needs its own copy.
        self.doc
            .clone()
            .save_to(&mut out)
            .context("writing PDF")
            .map_err(|e| AdapterError::package(ContainerKind::Pdf, e))?;
        Ok(out)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    fn catalog_id(&self) -> Result<ObjectId> {
        Ok(self.doc.trailer.get(b"Root")?.as_reference()?)
    }

    fn catalog(&self) -> Result<&Dictionary> {
        Ok(self.doc.get_object(self.catalog_id()?)?.as_dict()?)
    }

    fn catalog_mut(&mut self) -> Result<&mut Dictionary> {
        let id = self.catalog_id()?;
        Ok(self.doc.get_object_mut(id)?.as_dict_mut()?)
    }

    /// Follow one level of indirection.
    fn resolve<'a>(&'a self, obj: &'a Object) -> Result<&'a Object> {
        match obj {
            Object::Reference(id) => Ok(self.doc.get_object(*id)?),
            other => Ok(other),
        }
    }

    /// `/Data` of a `/WatermarkData` entry in `dict`, if any.
    fn watermark_data(&self, dict: &Dictionary) -> Result<Option<String>> {
        let Ok(entry) = dict.get(WATERMARK_KEY) else {
            return Ok(None);
        };
        let wm = self.resolve(entry)?.as_dict().context("/WatermarkData is not a dictionary")?;
        let Ok(data) = wm.get(b"Data") else {
            return Ok(None);
        };
        let bytes = self.resolve(data)?.as_str().context("/Data is not a string")?;
        let text = String::from_utf8(bytes.to_vec()).context("/Data is not UTF-8")?;
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

fn watermark_dict(payload: &str) -> Dictionary {
    let mut wm = Dictionary::new();
    wm.set("WatermarkID", Object::string_literal(watermark_id(payload.as_bytes())));
    wm.set("Data", Object::string_literal(payload.as_bytes().to_vec()));
    wm
}

/// `rdf:Description` carrying only `dc:description`, for an existing packet.
fn xmp_description(payload: &str) -> String {
    format!(
        "<rdf:Description rdf:about='' xmlns:dc='http://purl.org/dc/elements/1.1/'><dc:description>{}</dc:description></rdf:Description>",
        xml::escape(payload)
    )
}

fn xmp_packet(payload: &str) -> String {
    format!(
        concat!(
            "<?xpacket begin='' id='{id}'?>\n",
            "<x:xmpmeta xmlns:x='adobe:ns:meta/'>\n",
            "  <rdf:RDF xmlns:rdf='http://www.w3.org/1999/02/22-rdf-syntax-ns#'>\n",
            "    <rdf:Description rdf:about='' xmlns:dc='http://purl.org/dc/elements/1.1/'>\n",
            "      <dc:description>{data}</dc:description>\n",
            "    </rdf:Description>\n",
            "  </rdf:RDF>\n",
            "</x:xmpmeta>\n",
            "<?xpacket end='r'?>"
        ),
        id = watermark_id(payload.as_bytes()),
        data = xml::escape(payload)
    )
}

fn stream_text(stream: &Stream) -> Result<String> {
    let bytes = if stream.dict.has(b"Filter") {
        stream.decompressed_content().context("undecodable metadata stream")?
    } else {
        stream.content.clone()
    };
    String::from_utf8(bytes).context("metadata stream is not UTF-8")
}

impl Carrier for PdfDocument {
    fn kind(&self) -> ContainerKind {
        ContainerKind::Pdf
    }

    fn locations(&self) -> Vec<Box<dyn EmbeddingLocation<Self>>> {
        vec![Box::new(XmpMetadata), Box::new(Catalog), Box::new(PageStructure)]
    }
}

struct XmpMetadata;

impl XmpMetadata {
    fn metadata_stream_id(doc: &PdfDocument) -> Result<Option<ObjectId>> {
        match doc.catalog()?.get(b"Metadata") {
            Ok(obj) => Ok(Some(obj.as_reference().context("/Metadata is not an indirect stream")?)),
            Err(_) => Ok(None),
        }
    }

    fn write_inner(doc: &mut PdfDocument, payload: &str) -> Result<()> {
        if let Some(id) = Self::metadata_stream_id(doc)? {
            let stream = doc.doc.get_object_mut(id)?.as_stream_mut()?;
            let existing = stream_text(stream)?;
            let xmp = match xml::set_element_text(&existing, "dc:description", payload) {
                Some(edited) => edited,
                None => xml::insert_before(&existing, "</rdf:RDF>", &xmp_description(payload))
                    .unwrap_or_else(|| xmp_packet(payload)),
            };
            stream.dict.remove(b"Filter");
            stream.dict.remove(b"DecodeParms");
            stream.set_content(xmp.into_bytes());
            return Ok(());
        }

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Metadata".to_vec()));
        dict.set("Subtype", Object::Name(b"XML".to_vec()));
        let id = doc.doc.add_object(Stream::new(dict, xmp_packet(payload).into_bytes()));
        doc.catalog_mut()?.set("Metadata", Object::Reference(id));
        Ok(())
    }

    fn read_inner(doc: &PdfDocument) -> Result<Option<String>> {
        let Some(id) = Self::metadata_stream_id(doc)? else {
            return Ok(None);
        };
        let xmp = stream_text(doc.doc.get_object(id)?.as_stream()?)?;
        let Some((inner, _)) = xml::element_inner(&xmp, "dc:description", 0) else {
            return Ok(None);
        };
        let raw = &xmp[inner];
        // A structured rdf:Alt description was not written by this slot.
        if raw.is_empty() || raw.contains('<') {
            return Ok(None);
        }
        Ok(Some(xml::unescape(raw)))
    }
}

impl EmbeddingLocation<PdfDocument> for XmpMetadata {
    fn name(&self) -> &'static str {
        "xmp-metadata"
    }

    fn write(&self, doc: &mut PdfDocument, payload: &str) -> Result<(), AdapterError> {
        at(ContainerKind::Pdf, self.name(), Self::write_inner(doc, payload))
    }

    fn read(&self, doc: &PdfDocument) -> Result<Option<String>, AdapterError> {
        at(ContainerKind::Pdf, self.name(), Self::read_inner(doc))
    }
}

struct Catalog;

impl EmbeddingLocation<PdfDocument> for Catalog {
    fn name(&self) -> &'static str {
        "catalog"
    }

    fn write(&self, doc: &mut PdfDocument, payload: &str) -> Result<(), AdapterError> {
        let result = doc
            .catalog_mut()
            .map(|catalog| catalog.set(WATERMARK_KEY.to_vec(), Object::Dictionary(watermark_dict(payload))));
        at(ContainerKind::Pdf, self.name(), result)
    }

    fn read(&self, doc: &PdfDocument) -> Result<Option<String>, AdapterError> {
        let result = doc.catalog().and_then(|catalog| doc.watermark_data(catalog));
        at(ContainerKind::Pdf, self.name(), result)
    }
}

struct PageStructure;

impl PageStructure {
    fn write_inner(doc: &mut PdfDocument, payload: &str) -> Result<()> {
        let pages: Vec<ObjectId> = doc.doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(anyhow!("document has no pages"));
        }
        let wm = watermark_dict(payload);
        for id in pages {
            doc.doc
                .get_object_mut(id)?
                .as_dict_mut()
                .with_context(|| format!("page {id:?} is not a dictionary"))?
                .set(WATERMARK_KEY.to_vec(), Object::Dictionary(wm.clone()));
        }
        Ok(())
    }

    fn read_inner(doc: &PdfDocument) -> Result<Option<String>> {
        for id in doc.doc.get_pages().into_values() {
            let page = doc.doc.get_object(id)?.as_dict()?;
            if let Some(value) = doc.watermark_data(page)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

impl EmbeddingLocation<PdfDocument> for PageStructure {
    fn name(&self) -> &'static str {
        "page-structure"
    }

    fn write(&self, doc: &mut PdfDocument, payload: &str) -> Result<(), AdapterError> {
        at(ContainerKind::Pdf, self.name(), Self::write_inner(doc, payload))
    }

    fn read(&self, doc: &PdfDocument) -> Result<Option<String>, AdapterError> {
        at(ContainerKind::Pdf, self.name(), Self::read_inner(doc))
    }
}
