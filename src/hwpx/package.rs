//! The HWPX ZIP package: entry access, manifest, metadata and version.
//!
//! Layout of a package:
//! - `mimetype`: `application/hwp+zip`, stored first
//! - `version.xml`: format version of the writer
//! - `Contents/header.xml`: style tables
//! - `Contents/section{N}.xml`: one body part per section
//! - `Contents/content.hpf`: OPF manifest and document metadata
//! - `BinData/*`: pictures and embedded objects
//! - `META-INF/manifest.xml`: encryption declarations

use super::HwpxError;
use super::attrs::Attrs;
use crate::common::Metadata;
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::cell::RefCell;
use std::io::{Cursor, Read};
use zip::ZipArchive;

pub const MIMETYPE: &str = "application/hwp+zip";
pub const MIMETYPE_ENTRY: &str = "mimetype";
pub const VERSION_ENTRY: &str = "version.xml";
pub const HEADER_ENTRY: &str = "Contents/header.xml";
pub const CONTENT_ENTRY: &str = "Contents/content.hpf";
pub const MANIFEST_ENTRY: &str = "META-INF/manifest.xml";
pub const BIN_DATA_DIR: &str = "BinData/";

#[inline]
pub fn section_entry(index: usize) -> String {
    format!("Contents/section{}.xml", index)
}

/// One `<opf:item>` of `content.hpf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: Option<String>,
}

impl ManifestItem {
    /// Lower-case extension of the referenced entry.
    pub fn extension(&self) -> String {
        self.href
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }

    pub fn file_name(&self) -> &str {
        self.href.rsplit('/').next().unwrap_or(&self.href)
    }
}

/// An opened package.
///
/// Opening validates the mimetype and rejects packages that declare
/// encrypted entries; everything else is read on demand.
pub struct HwpxPackage {
    archive: RefCell<ZipArchive<Cursor<Vec<u8>>>>,
}

impl HwpxPackage {
    pub fn open(bytes: Vec<u8>) -> Result<Self, HwpxError> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        let package = Self {
            archive: RefCell::new(archive),
        };
        package.check_mimetype()?;
        package.check_encryption()?;
        Ok(package)
    }

    fn check_mimetype(&self) -> Result<(), HwpxError> {
        match self.read_string_opt(MIMETYPE_ENTRY)? {
            Some(found) if found.trim() != MIMETYPE => {
                Err(HwpxError::InvalidMimeType(found.trim().to_string()))
            },
            Some(_) => Ok(()),
            None => {
                tracing::debug!("package has no mimetype entry");
                Ok(())
            },
        }
    }

    fn check_encryption(&self) -> Result<(), HwpxError> {
        match self.read_string_opt(MANIFEST_ENTRY)? {
            Some(xml) if declares_encryption(&xml)? => Err(HwpxError::Encrypted),
            _ => Ok(()),
        }
    }

    /// Give up the package, keeping the validated archive.
    pub(crate) fn into_archive(self) -> ZipArchive<Cursor<Vec<u8>>> {
        self.archive.into_inner()
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.archive.borrow_mut().by_name(name).is_ok()
    }

    pub fn entry_names(&self) -> Vec<String> {
        self.archive
            .borrow()
            .file_names()
            .map(str::to_string)
            .collect()
    }

    /// Read an entry, or `None` when the package does not contain it.
    pub fn read_opt(&self, name: &str) -> Result<Option<Vec<u8>>, HwpxError> {
        let mut archive = self.archive.borrow_mut();
        let mut file = match archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>, HwpxError> {
        self.read_opt(name)?
            .ok_or_else(|| HwpxError::EntryNotFound(name.to_string()))
    }

    fn read_string_opt(&self, name: &str) -> Result<Option<String>, HwpxError> {
        self.read_opt(name)?.map(|data| into_text(name, data)).transpose()
    }

    /// Read a UTF-8 entry, dropping a leading byte order mark.
    pub fn read_string(&self, name: &str) -> Result<String, HwpxError> {
        into_text(name, self.read(name)?)
    }

    pub fn header_xml(&self) -> Result<String, HwpxError> {
        self.read_string(HEADER_ENTRY)
    }

    /// Section parts in order, stopping at the first missing or unreadable
    /// index.
    ///
    /// `Contents/section0.xml` is mandatory.
    pub fn sections(&self, max: Option<usize>) -> Result<Vec<String>, HwpxError> {
        let mut sections = Vec::new();
        let limit = max.unwrap_or(usize::MAX);
        while sections.len() < limit {
            let name = section_entry(sections.len());
            match self.read_string_opt(&name) {
                Ok(Some(xml)) => sections.push(xml),
                Ok(None) if sections.is_empty() => return Err(HwpxError::EntryNotFound(name)),
                Ok(None) => break,
                Err(e) if sections.is_empty() => return Err(e),
                Err(e) => {
                    tracing::warn!(entry = %name, error = %e, "unreadable section part ends enumeration");
                    break;
                },
            }
        }
        tracing::trace!(count = sections.len(), "read section parts");
        Ok(sections)
    }

    /// Items of the OPF manifest; empty when `content.hpf` is absent.
    pub fn manifest(&self) -> Result<Vec<ManifestItem>, HwpxError> {
        match self.read_string_opt(CONTENT_ENTRY)? {
            Some(xml) => parse_manifest(&xml),
            None => Ok(Vec::new()),
        }
    }

    pub fn metadata(&self) -> Result<Metadata, HwpxError> {
        match self.read_string_opt(CONTENT_ENTRY)? {
            Some(xml) => parse_metadata(&xml),
            None => Ok(Metadata::default()),
        }
    }

    /// Writer version from `version.xml` as `major.minor.micro.build`.
    pub fn version(&self) -> Result<Option<String>, HwpxError> {
        match self.read_string_opt(VERSION_ENTRY)? {
            Some(xml) => Ok(parse_version(&xml)),
            None => Ok(None),
        }
    }
}

fn into_text(name: &str, data: Vec<u8>) -> Result<String, HwpxError> {
    let mut text = String::from_utf8(data)
        .map_err(|e| HwpxError::Xml(format!("{} is not UTF-8: {}", name, e)))?;
    if text.starts_with('\u{FEFF}') {
        text.drain(..'\u{FEFF}'.len_utf8());
    }
    Ok(text)
}

fn xml_error(e: quick_xml::Error) -> HwpxError {
    HwpxError::Xml(format!("XML parsing error: {}", e))
}

fn declares_encryption(manifest: &str) -> Result<bool, HwpxError> {
    let mut reader = Reader::from_str(manifest);
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"encryption-data" => {
                return Ok(true);
            },
            Event::Eof => return Ok(false),
            _ => {},
        }
    }
}

fn parse_manifest(content: &str) -> Result<Vec<ManifestItem>, HwpxError> {
    let mut reader = Reader::from_str(content);
    let mut items = Vec::new();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"item" => {
                let attrs = Attrs::from_start(&e);
                match (attrs.string("id"), attrs.string("href")) {
                    (Some(id), Some(href)) => items.push(ManifestItem {
                        id,
                        href,
                        media_type: attrs.string("media-type"),
                    }),
                    _ => tracing::trace!("manifest item without id or href"),
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }
    Ok(items)
}

fn read_text(reader: &mut Reader<&[u8]>) -> Result<Option<String>, HwpxError> {
    let mut raw = String::new();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Text(e) => {
                raw.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            },
            Event::GeneralRef(e) => {
                raw.push('&');
                raw.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
                raw.push(';');
            },
            Event::End(_) | Event::Eof => break,
            _ => {},
        }
    }
    let text = crate::common::xml::unescape_xml(raw.trim()).into_owned();
    Ok((!text.is_empty()).then_some(text))
}

pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    [
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

/// Fold the `<opf:metadata>` block into [`Metadata`].
///
/// Properties are either dedicated elements (`opf:title`, `opf:language`)
/// or `<opf:meta name="…">` entries.
fn parse_metadata(content: &str) -> Result<Metadata, HwpxError> {
    let mut reader = Reader::from_str(content);
    let mut metadata = Metadata::default();
    let mut in_metadata = false;
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"metadata" => in_metadata = true,
                _ if !in_metadata => {},
                b"title" => metadata.title = read_text(&mut reader)?,
                b"language" => metadata.language = read_text(&mut reader)?,
                b"creator" => metadata.author = read_text(&mut reader)?,
                b"subject" => metadata.subject = read_text(&mut reader)?,
                b"description" => metadata.description = read_text(&mut reader)?,
                b"meta" => {
                    let name = Attrs::from_start(&e).string("name").unwrap_or_default();
                    let value = read_text(&mut reader)?;
                    match name.as_str() {
                        "creator" => metadata.author = value,
                        "subject" => metadata.subject = value,
                        "description" => metadata.description = value,
                        "keyword" => metadata.keywords = value,
                        "lastsaveby" => metadata.last_modified_by = value,
                        "CreatedDate" => metadata.created = value.as_deref().and_then(parse_datetime),
                        "ModifiedDate" => metadata.modified = value.as_deref().and_then(parse_datetime),
                        other => tracing::trace!(name = other, "metadata entry ignored"),
                    }
                },
                _ => {},
            },
            Event::End(e) if e.local_name().as_ref() == b"metadata" => break,
            Event::Eof => break,
            _ => {},
        }
    }
    Ok(metadata)
}

fn parse_version(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"HCFVersion" => {
                let attrs = Attrs::from_start(&e);
                let part = |name| attrs.u32(name).unwrap_or(0);
                return Some(format!(
                    "{}.{}.{}.{}",
                    part("major"),
                    part("minor"),
                    part("micro"),
                    part("buildNumber")
                ));
            },
            Ok(Event::Eof) | Err(_) => return None,
            _ => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    const CONTENT_HPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opf:package xmlns:opf="http://www.idpf.org/2007/opf/">
  <opf:metadata>
    <opf:title>보고서</opf:title>
    <opf:language>ko</opf:language>
    <opf:meta name="creator" content="text">홍길동</opf:meta>
    <opf:meta name="keyword" content="text">a &amp; b</opf:meta>
    <opf:meta name="CreatedDate" content="text">2024-03-01T09:30:00Z</opf:meta>
    <opf:meta name="subject" content="text"/>
  </opf:metadata>
  <opf:manifest>
    <opf:item id="header" href="Contents/header.xml" media-type="application/xml"/>
    <opf:item id="image1" href="BinData/image1.png" media-type="image/png" isEmbeded="1"/>
  </opf:manifest>
</opf:package>"#;

    #[test]
    fn test_manifest_and_metadata() {
        let bytes = PackageBuilder::new()
            .entry(CONTENT_ENTRY, CONTENT_HPF)
            .entry(HEADER_ENTRY, HEADER_XML)
            .entry(&section_entry(0), section_xml(""))
            .build();
        let package = HwpxPackage::open(bytes).unwrap();

        let items = package.manifest().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id, "image1");
        assert_eq!(items[1].extension(), "png");
        assert_eq!(items[1].file_name(), "image1.png");

        let metadata = package.metadata().unwrap();
        assert_eq!(metadata.title.as_deref(), Some("보고서"));
        assert_eq!(metadata.author.as_deref(), Some("홍길동"));
        assert_eq!(metadata.keywords.as_deref(), Some("a & b"));
        assert_eq!(metadata.language.as_deref(), Some("ko"));
        assert_eq!(metadata.subject, None);
        assert_eq!(
            metadata.created.map(|d| d.to_rfc3339()),
            Some("2024-03-01T09:30:00+00:00".to_string())
        );
    }

    #[test]
    fn test_sections_stop_at_gap() {
        let bytes = PackageBuilder::new()
            .entry(HEADER_ENTRY, HEADER_XML)
            .entry(&section_entry(0), section_xml(""))
            .entry(&section_entry(1), section_xml(""))
            .entry(&section_entry(3), section_xml(""))
            .build();
        let package = HwpxPackage::open(bytes).unwrap();
        assert_eq!(package.sections(None).unwrap().len(), 2);
        assert_eq!(package.sections(Some(1)).unwrap().len(), 1);
        assert!(package.has_entry(HEADER_ENTRY));
        assert!(package.entry_names().iter().any(|n| n == "mimetype"));
    }

    #[test]
    fn test_unreadable_section_ends_enumeration() {
        let bytes = PackageBuilder::new()
            .entry(HEADER_ENTRY, HEADER_XML)
            .entry(&section_entry(0), section_xml(""))
            .entry(&section_entry(1), b"\xFF\xFE<hs:sec/>")
            .entry(&section_entry(2), section_xml(""))
            .build();
        let package = HwpxPackage::open(bytes).unwrap();
        assert_eq!(package.sections(None).unwrap().len(), 1);

        let broken_first = PackageBuilder::new()
            .entry(HEADER_ENTRY, HEADER_XML)
            .entry(&section_entry(0), b"\xC3\x28")
            .build();
        let package = HwpxPackage::open(broken_first).unwrap();
        assert!(matches!(package.sections(None), Err(HwpxError::Xml(_))));
    }

    #[test]
    fn test_missing_first_section() {
        let bytes = PackageBuilder::new().entry(HEADER_ENTRY, HEADER_XML).build();
        let package = HwpxPackage::open(bytes).unwrap();
        assert!(matches!(
            package.sections(None),
            Err(HwpxError::EntryNotFound(name)) if name == "Contents/section0.xml"
        ));
    }

    #[test]
    fn test_wrong_mimetype_rejected() {
        let bytes = PackageBuilder::with_mimetype("application/epub+zip").build();
        assert!(matches!(
            HwpxPackage::open(bytes),
            Err(HwpxError::InvalidMimeType(m)) if m == "application/epub+zip"
        ));
    }

    #[test]
    fn test_encrypted_manifest_rejected() {
        let manifest = r#"<odf:manifest xmlns:odf="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0">
  <odf:file-entry odf:full-path="Contents/section0.xml" odf:media-type="application/xml">
    <odf:encryption-data odf:checksum-type="SHA1"/>
  </odf:file-entry>
</odf:manifest>"#;
        let bytes = PackageBuilder::new().entry(MANIFEST_ENTRY, manifest).build();
        assert!(matches!(HwpxPackage::open(bytes), Err(HwpxError::Encrypted)));
    }

    #[test]
    fn test_version() {
        let version = r#"<?xml version="1.0"?><hv:HCFVersion xmlns:hv="x" major="5" minor="1" micro="1" buildNumber="0"/>"#;
        let bytes = PackageBuilder::new().entry(VERSION_ENTRY, version).build();
        let package = HwpxPackage::open(bytes).unwrap();
        assert_eq!(package.version().unwrap().as_deref(), Some("5.1.1.0"));
        assert_eq!(parse_version("<x/>"), None);
    }

    #[test]
    fn test_bom_stripped() {
        let data = "\u{FEFF}<a/>".as_bytes().to_vec();
        assert_eq!(into_text("x", data).unwrap(), "<a/>");
    }
}
