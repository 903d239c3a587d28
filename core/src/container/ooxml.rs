//! container/ooxml.rs
//! OPC package (zip of XML parts) shared by the Word and Presentation adapters.
//!
//! Parts are kept in archive order and written back in that order, so an
//! untouched part round-trips byte-identical (modulo zip compression).

use std::io::{Cursor, Read, Write};

use anyhow::{anyhow, Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::container::xml;

pub const CONTENT_TYPES: &str = "[Content_Types].xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

#[derive(Debug, Clone, Default)]
pub struct OoxmlPackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl OoxmlPackage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).context("not a zip package")?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).with_context(|| format!("zip entry {i}"))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data).with_context(|| format!("reading {name}"))?;
            parts.push((name, data));
        }
        if !parts.iter().any(|(n, _)| n == CONTENT_TYPES) {
            return Err(anyhow!("missing {CONTENT_TYPES}"));
        }
        Ok(Self { parts })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            writer.start_file(name.as_str(), options).with_context(|| format!("writing {name}"))?;
            writer.write_all(data)?;
        }
        Ok(writer.finish().context("finishing zip")?.into_inner())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.iter().find(|(n, _)| n == name).map(|(_, d)| d.as_slice())
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Part as UTF-8 text, `None` when the part does not exist.
    pub fn xml_opt(&self, name: &str) -> Result<Option<String>> {
        match self.part(name) {
            Some(bytes) => Ok(Some(
                String::from_utf8(bytes.to_vec()).with_context(|| format!("{name} is not UTF-8"))?,
            )),
            None => Ok(None),
        }
    }

    /// Part as UTF-8 text; a missing part is an error.
    pub fn xml(&self, name: &str) -> Result<String> {
        self.xml_opt(name)?.ok_or_else(|| anyhow!("missing part {name}"))
    }

    /// Insert or replace a part.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some((_, d)) => *d = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    pub fn set_xml(&mut self, name: &str, xml: String) {
        self.set_part(name, xml.into_bytes());
    }

    /// Relationships declared by `source` (`""` for the package root).
    pub fn relationships(&self, source: &str) -> Result<Vec<Relationship>> {
        let Some(rels) = self.xml_opt(&rels_path(source))? else {
            return Ok(Vec::new());
        };
        Ok(xml::find_all_start_tags(&rels, "Relationship")
            .into_iter()
            .filter_map(|span| {
                let tag = span.as_str(&rels);
                Some(Relationship {
                    id: xml::tag_attr(tag, "Id")?,
                    rel_type: xml::tag_attr(tag, "Type")?,
                    target: xml::tag_attr(tag, "Target")?,
                })
            })
            .collect())
    }

    /// Part name targeted by the first relationship of `rel_type` from `source`.
    pub fn related_part(&self, source: &str, rel_type: &str) -> Result<Option<String>> {
        Ok(self
            .relationships(source)?
            .into_iter()
            .find(|r| r.rel_type == rel_type)
            .map(|r| resolve_target(source, &r.target)))
    }

    /// Part name targeted by relationship `id` from `source`.
    pub fn part_by_rel_id(&self, source: &str, id: &str) -> Result<Option<String>> {
        Ok(self
            .relationships(source)?
            .into_iter()
            .find(|r| r.id == id)
            .map(|r| resolve_target(source, &r.target)))
    }

    /// First `{stem}{n}.xml` (n from 1) that is not a part yet.
    pub fn free_part_name(&self, stem: &str) -> String {
        let mut n = 1usize;
        loop {
            let name = format!("{stem}{n}.xml");
            if !self.has_part(&name) {
                return name;
            }
            n += 1;
        }
    }

    /// Link `source` to `target` with `rel_type`, reusing an identical link.
    /// Returns the relationship id.
    pub fn add_relationship(&mut self, source: &str, rel_type: &str, target: &str) -> Result<String> {
        let existing = self.relationships(source)?;
        if let Some(r) = existing.iter().find(|r| r.rel_type == rel_type && r.target == target) {
            return Ok(r.id.clone());
        }

        let mut n = existing.len() + 1;
        let id = loop {
            let candidate = format!("rId{n}");
            if !existing.iter().any(|r| r.id == candidate) {
                break candidate;
            }
            n += 1;
        };

        let path = rels_path(source);
        let rels = self.xml_opt(&path)?.unwrap_or_else(|| {
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "\n",
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#
            )
            .to_string()
        });
        let fragment = format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            xml::escape(&id),
            xml::escape(rel_type),
            xml::escape(target)
        );
        let edited = xml::insert_before(&rels, "</Relationships>", &fragment)
            .ok_or_else(|| anyhow!("{path} has no </Relationships>"))?;
        self.set_xml(&path, edited);
        Ok(id)
    }

    /// Make sure `[Content_Types].xml` maps `ext` to a content type.
    pub fn ensure_default_content_type(&mut self, ext: &str, content_type: &str) -> Result<()> {
        let types = self.xml(CONTENT_TYPES)?;
        let known = xml::find_all_start_tags(&types, "Default")
            .into_iter()
            .any(|s| xml::tag_attr(s.as_str(&types), "Extension").is_some_and(|e| e.eq_ignore_ascii_case(ext)));
        if known {
            return Ok(());
        }
        let fragment = format!(
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            xml::escape(ext),
            xml::escape(content_type)
        );
        let edited = xml::insert_before(&types, "</Types>", &fragment)
            .ok_or_else(|| anyhow!("{CONTENT_TYPES} has no </Types>"))?;
        self.set_xml(CONTENT_TYPES, edited);
        Ok(())
    }

    /// Make sure `[Content_Types].xml` has an override for `part`.
    pub fn ensure_override_content_type(&mut self, part: &str, content_type: &str) -> Result<()> {
        let types = self.xml(CONTENT_TYPES)?;
        let part_name = format!("/{part}");
        let known = xml::find_all_start_tags(&types, "Override")
            .into_iter()
            .any(|s| xml::tag_attr(s.as_str(&types), "PartName").as_deref() == Some(part_name.as_str()));
        if known {
            return Ok(());
        }
        let fragment = format!(
            r#"<Override PartName="{}" ContentType="{}"/>"#,
            xml::escape(&part_name),
            xml::escape(content_type)
        );
        let edited = xml::insert_before(&types, "</Types>", &fragment)
            .ok_or_else(|| anyhow!("{CONTENT_TYPES} has no </Types>"))?;
        self.set_xml(CONTENT_TYPES, edited);
        Ok(())
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`; `""` -> `_rels/.rels`.
pub fn rels_path(source: &str) -> String {
    match source.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{source}.rels"),
    }
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(source: &str, target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        return abs.to_string();
    }
    let mut segments: Vec<&str> = match source.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Target of `part` as written in a relationship from `source`.
pub fn relative_target(source: &str, part: &str) -> String {
    let from: Vec<&str> = match source.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let to: Vec<&str> = part.split('/').collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut segments = vec![".."; from.len() - common];
    segments.extend_from_slice(&to[common..]);
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rels_paths() {
        assert_eq!(rels_path("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_path(""), "_rels/.rels");
    }

    #[test]
    fn targets_resolve_relative_to_source() {
        assert_eq!(resolve_target("word/document.xml", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("ppt/presentation.xml", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("", "docProps/core.xml"), "docProps/core.xml");
        assert_eq!(resolve_target("ppt/slides/slide1.xml", "/ppt/notesSlides/n.xml"), "ppt/notesSlides/n.xml");
    }

    #[test]
    fn relative_targets_resolve_back() {
        for (source, part) in [
            ("ppt/slides/slide1.xml", "ppt/notesSlides/notesSlide1.xml"),
            ("ppt/notesSlides/notesSlide1.xml", "ppt/slides/slide1.xml"),
            ("ppt/presentation.xml", "ppt/notesMasters/notesMaster1.xml"),
            ("word/document.xml", "customXml/item3.xml"),
            ("", "docProps/core.xml"),
        ] {
            let target = relative_target(source, part);
            assert_eq!(resolve_target(source, &target), part, "{source} -> {target}");
        }
        assert_eq!(relative_target("ppt/slides/slide1.xml", "ppt/notesSlides/notesSlide1.xml"), "../notesSlides/notesSlide1.xml");
    }
}
