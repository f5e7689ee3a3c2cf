//! The parsed document root.

use super::element::Element;
use super::paragraph::Paragraph;
use super::section::{Note, Section};
use super::style::StyleTables;
use crate::common::{FileFormat, Metadata, Result};
use base64::Engine;
use bytes::Bytes;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

/// An embedded binary payload such as a picture or an OLE object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    /// Format-local key: `BIN0001` for legacy files, the manifest id for HWPX
    pub id: String,
    pub file_name: String,
    pub extension: String,
    #[serde(serialize_with = "serialize_base64")]
    pub data: Bytes,
}

impl Asset {
    /// MIME type guessed from the extension.
    pub fn mime_type(&self) -> &'static str {
        match self.extension.to_ascii_lowercase().as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "tif" | "tiff" => "image/tiff",
            "wmf" => "image/wmf",
            "emf" => "image/emf",
            "svg" => "image/svg+xml",
            "mp4" => "video/mp4",
            _ => "application/octet-stream",
        }
    }
}

fn serialize_base64<S: Serializer>(data: &Bytes, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(data))
}

/// A document decoded from either container format.
///
/// Built once per parse. Editing layers may mutate paragraphs and tables in
/// place; table row and column edits should go through the [`Table`](super::Table)
/// helpers so spans stay consistent.
///
/// # Examples
///
/// ```rust,no_run
/// use hwpdoc::Document;
///
/// let doc = Document::open("report.hwp")?;
/// println!("{} sections", doc.sections.len());
/// println!("{}", doc.text());
/// # Ok::<(), hwpdoc::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub format: FileFormat,
    /// Version string of the source container, e.g. `5.1.0.1`
    pub version: String,
    pub metadata: Metadata,
    pub sections: Vec<Section>,
    pub assets: BTreeMap<String, Asset>,
    pub notes: Vec<Note>,
    pub styles: StyleTables,
}

impl Document {
    /// An empty document of the given format.
    pub fn new(format: FileFormat) -> Self {
        Self {
            format,
            version: String::new(),
            metadata: Metadata::default(),
            sections: Vec::new(),
            assets: BTreeMap::new(),
            notes: Vec::new(),
            styles: StyleTables::default(),
        }
    }

    /// Read and parse a file, detecting the format from its signature.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Parse an in-memory buffer with default options.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        crate::document::parse(bytes)
    }

    /// Plain text of all sections, sections separated by a blank line.
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .map(Section::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Top-level paragraphs of every section in order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.sections.iter().flat_map(Section::paragraphs)
    }

    /// Every top-level element of every section in order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.sections.iter().flat_map(|s| s.elements.iter())
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.get(id)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_text_and_json() {
        let mut doc = Document::new(FileFormat::Hwpx);
        let mut s0 = Section::new(0);
        s0.elements.push(Element::Paragraph(Paragraph::with_text("첫째")));
        let mut s1 = Section::new(1);
        s1.elements.push(Element::Paragraph(Paragraph::with_text("둘째")));
        doc.sections = vec![s0, s1];
        doc.assets.insert(
            "image1".to_string(),
            Asset {
                id: "image1".to_string(),
                file_name: "image1.png".to_string(),
                extension: "png".to_string(),
                data: Bytes::from_static(b"abc"),
            },
        );

        assert_eq!(doc.text(), "첫째\n\n둘째");
        assert_eq!(doc.paragraphs().count(), 2);

        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(json["format"], "hwpx");
        assert_eq!(json["assets"]["image1"]["data"], "YWJj");
        assert_eq!(json["sections"][1]["elements"][0]["type"], "paragraph");
        assert_eq!(doc.asset("image1").map(Asset::mime_type), Some("image/png"));
    }
}
