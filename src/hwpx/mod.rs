//! HWPX (OWPML) documents.
//!
//! An HWPX file is a ZIP package of XML parts. Section parts are read with a
//! balanced-tag scanner rather than a DOM: paragraphs, runs and objects are
//! located as byte spans and decoded in document order, so nested tables and
//! text boxes never leak their paragraphs into the enclosing section.
//!
//! # Example
//!
//! ```rust,no_run
//! use hwpdoc::{ParseOptions, hwpx};
//!
//! let bytes = std::fs::read("report.hwpx")?;
//! let doc = hwpx::decode(&bytes, &ParseOptions::default())?;
//! println!("{}", doc.text());
//! # Ok::<(), hwpdoc::Error>(())
//! ```

pub mod attrs;
pub mod header;
pub mod package;
pub mod paragraph;
pub mod scanner;
pub mod section;
pub mod shape;
pub mod table;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use header::parse_header;
pub use package::{HwpxPackage, ManifestItem};
pub use section::decode_section;
pub use writer::{HwpxWriter, replace_paragraph_text};

use crate::common::{FileFormat, Result};
use crate::model::{Asset, Document};
use crate::options::ParseOptions;
use bytes::Bytes;
use package::BIN_DATA_DIR;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HwpxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error("unexpected mimetype: {0}")]
    InvalidMimeType(String),

    #[error("package declares encrypted entries")]
    Encrypted,
}

impl From<zip::result::ZipError> for HwpxError {
    fn from(err: zip::result::ZipError) -> Self {
        HwpxError::Zip(err.to_string())
    }
}

/// Decode an HWPX package held in memory.
///
/// The header is parsed first since every section resolves its style
/// references against it; sections are then decoded independently.
pub fn decode(bytes: &[u8], options: &ParseOptions) -> Result<Document> {
    let package = HwpxPackage::open(bytes.to_vec())?;
    let styles = parse_header(&package.header_xml()?);
    let parts = package.sections(options.max_sections)?;

    let decoded: Vec<_> = if options.parallel_sections {
        parts
            .par_iter()
            .enumerate()
            .map(|(index, xml)| decode_section(xml, index, &styles, options.include_line_segments))
            .collect()
    } else {
        parts
            .iter()
            .enumerate()
            .map(|(index, xml)| decode_section(xml, index, &styles, options.include_line_segments))
            .collect()
    };

    let mut doc = Document::new(FileFormat::Hwpx);
    doc.version = package.version()?.unwrap_or_default();
    doc.metadata = package.metadata()?;
    for (section, notes) in decoded {
        doc.sections.push(section);
        doc.notes.extend(notes);
    }
    if options.load_assets {
        load_assets(&package, &mut doc)?;
    }
    doc.styles = styles;
    Ok(doc)
}

fn load_assets(package: &HwpxPackage, doc: &mut Document) -> Result<()> {
    for item in package.manifest()? {
        if !item.href.starts_with(BIN_DATA_DIR) {
            continue;
        }
        let Some(data) = package.read_opt(&item.href)? else {
            tracing::trace!(href = %item.href, "manifest item missing from package");
            continue;
        };
        let asset = Asset {
            id: item.id.clone(),
            file_name: item.file_name().to_string(),
            extension: item.extension(),
            data: Bytes::from(data),
        };
        doc.assets.insert(item.id, asset);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::package::{CONTENT_ENTRY, HEADER_ENTRY, MANIFEST_ENTRY, VERSION_ENTRY, section_entry};
    use super::test_support::*;
    use super::*;

    const VERSION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><hv:HCFVersion xmlns:hv="http://www.hancom.co.kr/hwpml/2011/version" tagetApplication="WORDPROCESSOR" major="5" minor="1" micro="1" buildNumber="0"/>"#;

    const CONTENT_HPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?><opf:package xmlns:opf="http://www.idpf.org/2007/opf/" xmlns:dc="http://purl.org/dc/elements/1.1/"><opf:metadata><opf:title>보고서</opf:title><dc:creator>홍길동</dc:creator></opf:metadata><opf:manifest><opf:item id="header" href="Contents/header.xml" media-type="application/xml"/><opf:item id="image1" href="BinData/image1.png" media-type="image/png" isEmbeded="1"/><opf:item id="gone" href="BinData/gone.jpg" media-type="image/jpeg"/></opf:manifest></opf:package>"#;

    fn full_package() -> Vec<u8> {
        PackageBuilder::new()
            .entry(VERSION_ENTRY, VERSION_XML)
            .entry(HEADER_ENTRY, HEADER_XML)
            .entry(CONTENT_ENTRY, CONTENT_HPF)
            .entry(&section_entry(0), section_xml(&para("첫 구역")))
            .entry(&section_entry(1), section_xml(&para("둘째 구역")))
            .entry("BinData/image1.png", b"\x89PNG")
            .build()
    }

    #[test]
    fn test_decode_document() {
        let doc = decode(&full_package(), &ParseOptions::default()).unwrap();
        assert_eq!(doc.format, FileFormat::Hwpx);
        assert_eq!(doc.version, "5.1.1.0");
        assert_eq!(doc.metadata.title.as_deref(), Some("보고서"));
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[1].index, 1);
        assert_eq!(doc.text(), "첫 구역\n\n둘째 구역");
        assert_eq!(doc.styles.char_styles.len(), 2);

        let limited = decode(&full_package(), &ParseOptions::new().with_max_sections(Some(1))).unwrap();
        assert_eq!(limited.sections.len(), 1);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sections: Vec<String> = (0..6).map(|i| para(&format!("section {}", i))).collect();
        let bytes = hwpx_file(&sections);
        let sequential = decode(&bytes, &ParseOptions::default()).unwrap();
        let parallel = decode(&bytes, &ParseOptions::new().with_parallel_sections(true)).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(parallel.sections.len(), 6);
    }

    #[test]
    fn test_assets() {
        let doc = decode(&full_package(), &ParseOptions::default()).unwrap();
        assert_eq!(doc.assets.len(), 1);
        let asset = doc.asset("image1").unwrap();
        assert_eq!(asset.file_name, "image1.png");
        assert_eq!(asset.extension, "png");
        assert_eq!(&asset.data[..], b"\x89PNG");

        let doc = decode(&full_package(), &ParseOptions::new().with_assets(false)).unwrap();
        assert!(doc.assets.is_empty());
    }

    #[test]
    fn test_rejected_packages() {
        let wrong = PackageBuilder::with_mimetype("application/zip")
            .entry(HEADER_ENTRY, HEADER_XML)
            .entry(&section_entry(0), section_xml(&para("x")))
            .build();
        assert!(matches!(
            decode(&wrong, &ParseOptions::default()),
            Err(crate::Error::InvalidFormat(_))
        ));

        let manifest = r#"<odf:manifest xmlns:odf="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0"><odf:file-entry odf:full-path="Contents/section0.xml"><odf:encryption-data odf:checksum-type="SHA1"/></odf:file-entry></odf:manifest>"#;
        let encrypted = PackageBuilder::new()
            .entry(HEADER_ENTRY, HEADER_XML)
            .entry(&section_entry(0), section_xml(&para("x")))
            .entry(MANIFEST_ENTRY, manifest)
            .build();
        assert!(matches!(
            decode(&encrypted, &ParseOptions::default()),
            Err(crate::Error::Encrypted(_))
        ));
    }

    #[test]
    fn test_missing_first_section() {
        let bytes = PackageBuilder::new().entry(HEADER_ENTRY, HEADER_XML).build();
        assert!(matches!(
            decode(&bytes, &ParseOptions::default()),
            Err(crate::Error::ComponentNotFound(_))
        ));
    }
}
