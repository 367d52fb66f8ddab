//! DOCX package container.
//!
//! A DOCX file is a zip archive of XML parts plus media. The package keeps
//! every entry in memory in archive order, and only re-serializes the whole
//! archive on save, so a run that aborts mid-reconciliation never touches the
//! on-disk target.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::docx::xml::XmlNode;
use crate::error::{Error, Result};

const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const NUMBERING_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
const NUMBERING_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";

/// An in-memory DOCX archive.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    /// Open a DOCX file, reading every entry into memory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Open a DOCX archive from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let mut content = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut content)?;
            parts.push((entry.name().to_string(), content));
        }
        Ok(Self { parts })
    }

    /// Raw bytes of a part, if present.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Check if a part exists.
    pub fn has_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Parse a part as XML and return its root element.
    pub fn part_xml(&self, name: &str) -> Result<XmlNode> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))?;
        let text = String::from_utf8_lossy(data);
        XmlNode::parse(&text)
    }

    /// Replace a part's content, appending the part if it does not exist.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        if let Some(entry) = self.parts.iter_mut().find(|(n, _)| n == name) {
            entry.1 = data;
        } else {
            self.parts.push((name.to_string(), data));
        }
    }

    /// Serialize an XML root back into a part.
    pub fn set_part_xml(&mut self, name: &str, root: &XmlNode) {
        self.set_part(name, root.to_document_string().into_bytes());
    }

    /// Add an image to `word/media/`, registering its content type and a
    /// relationship from the main document part. Returns the relationship id
    /// to reference from drawing markup.
    pub fn add_image(&mut self, data: Vec<u8>, extension: &str, content_type: &str) -> Result<String> {
        self.ensure_default_content_type(extension, content_type)?;

        let index = 1 + self
            .parts
            .iter()
            .filter(|(n, _)| n.starts_with("word/media/"))
            .count();
        let media_name = format!("word/media/image_sync{}.{}", index, extension);
        self.set_part(&media_name, data);

        let target = media_name.trim_start_matches("word/").to_string();
        self.add_document_relationship(IMAGE_REL_TYPE, &target)
    }

    /// Append a relationship to `word/_rels/document.xml.rels`, creating the
    /// rels part when absent. Returns the new relationship id.
    fn add_document_relationship(&mut self, rel_type: &str, target: &str) -> Result<String> {
        let rels_name = "word/_rels/document.xml.rels";
        let mut root = if self.has_part(rels_name) {
            self.part_xml(rels_name)?
        } else {
            XmlNode::new("Relationships").with_attr("xmlns", RELS_NS)
        };

        let max_id = root
            .children_named("Relationship")
            .filter_map(|r| r.attr("Id"))
            .filter_map(|id| id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        let rel_id = format!("rId{}", max_id + 1);

        root.push(
            XmlNode::new("Relationship")
                .with_attr("Id", rel_id.clone())
                .with_attr("Type", rel_type)
                .with_attr("Target", target),
        );
        self.set_part_xml(rels_name, &root);
        Ok(rel_id)
    }

    /// Make sure `[Content_Types].xml` declares a default mapping for the
    /// given file extension.
    fn ensure_default_content_type(&mut self, extension: &str, content_type: &str) -> Result<()> {
        let mut root = self.part_xml("[Content_Types].xml")?;
        let present = root
            .children_named("Default")
            .any(|d| d.attr("Extension") == Some(extension));
        if !present {
            root.push(
                XmlNode::new("Default")
                    .with_attr("Extension", extension)
                    .with_attr("ContentType", content_type),
            );
            self.set_part_xml("[Content_Types].xml", &root);
        }
        Ok(())
    }

    /// Register a freshly created `word/numbering.xml` part: relationship
    /// from the main document plus its content-type override.
    pub(crate) fn register_numbering_part(&mut self) -> Result<()> {
        self.add_document_relationship(NUMBERING_REL_TYPE, "numbering.xml")?;
        self.ensure_override_content_type("/word/numbering.xml", NUMBERING_CONTENT_TYPE)
    }

    /// Make sure `[Content_Types].xml` declares an override for a part.
    fn ensure_override_content_type(&mut self, part_name: &str, content_type: &str) -> Result<()> {
        let mut root = self.part_xml("[Content_Types].xml")?;
        let present = root
            .children_named("Override")
            .any(|o| o.attr("PartName") == Some(part_name));
        if !present {
            root.push(
                XmlNode::new("Override")
                    .with_attr("PartName", part_name)
                    .with_attr("ContentType", content_type),
            );
            self.set_part_xml("[Content_Types].xml", &root);
        }
        Ok(())
    }

    /// Serialize the whole archive to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }
        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }

    /// Write the archive to disk in a single write.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }
}
