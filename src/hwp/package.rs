//! Stream access for a legacy HWP compound file.

use super::HwpError;
use super::header::FileHeader;
use crate::ole::{CompoundFile, OleError, OleMetadata};
use std::io::Read;

pub const FILE_HEADER_STREAM: &str = "FileHeader";
pub const DOC_INFO_STREAM: &str = "DocInfo";
pub const BODY_TEXT_STORAGE: &str = "BodyText";
pub const BIN_DATA_STORAGE: &str = "BinData";

/// Decompress a raw deflate stream (no zlib header).
pub fn inflate_raw(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len().saturating_mul(4));
    flate2::read::DeflateDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// Inflate a stream when `compressed`, falling back to the stored bytes if
/// they do not decompress.
fn maybe_inflate(data: Vec<u8>, compressed: bool, stream: &str) -> Vec<u8> {
    if !compressed {
        return data;
    }
    match inflate_raw(&data) {
        Ok(inflated) => inflated,
        Err(e) => {
            tracing::warn!(stream, error = %e, "stream does not inflate, using stored bytes");
            data
        },
    }
}

/// An opened legacy document: the compound file plus its validated header.
#[derive(Debug)]
pub struct HwpPackage {
    cfb: CompoundFile,
    header: FileHeader,
}

impl HwpPackage {
    /// Open a compound file and validate its `FileHeader`.
    pub fn open(bytes: Vec<u8>) -> Result<Self, HwpError> {
        let cfb = CompoundFile::from_bytes(bytes)?;
        let raw = cfb.open_stream(&[FILE_HEADER_STREAM]).map_err(|e| match e {
            OleError::StreamNotFound(s) => HwpError::StreamNotFound(s),
            other => HwpError::Ole(other),
        })?;
        let header = FileHeader::parse(&raw)?;
        Ok(Self { cfb, header })
    }

    #[inline]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Read a mandatory stream, inflating it when the document is compressed.
    pub fn stream(&self, path: &[&str]) -> Result<Vec<u8>, HwpError> {
        let data = self.cfb.open_stream(path).map_err(|e| match e {
            OleError::StreamNotFound(s) => HwpError::StreamNotFound(s),
            other => HwpError::Ole(other),
        })?;
        Ok(maybe_inflate(data, self.header.is_compressed(), &path.join("/")))
    }

    pub fn doc_info(&self) -> Result<Vec<u8>, HwpError> {
        self.stream(&[DOC_INFO_STREAM])
    }

    /// Read `BodyText/Section0..` in order until a stream is missing or
    /// unreadable.
    ///
    /// `Section0` is mandatory.
    pub fn sections(&self, limit: Option<usize>) -> Result<Vec<Vec<u8>>, HwpError> {
        let mut sections = Vec::new();
        for index in 0.. {
            if limit.is_some_and(|max| index >= max) {
                break;
            }
            let name = format!("Section{}", index);
            match self.stream(&[BODY_TEXT_STORAGE, &name]) {
                Ok(data) => sections.push(data),
                Err(HwpError::StreamNotFound(path)) => {
                    if index == 0 {
                        return Err(HwpError::StreamNotFound(path));
                    }
                    tracing::debug!(sections = index, "end of section streams");
                    break;
                },
                Err(e) if index == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(section = index, error = %e, "unreadable section stream ends enumeration");
                    break;
                },
            }
        }
        Ok(sections)
    }

    /// Read an embedded binary item. Returns `None` when the stream is absent.
    pub fn bin_data(&self, name: &str, compressed: bool) -> Option<Vec<u8>> {
        match self.cfb.open_stream(&[BIN_DATA_STORAGE, name]) {
            Ok(data) => Some(maybe_inflate(data, compressed, name)),
            Err(e) => {
                tracing::debug!(name, error = %e, "binary item not readable");
                None
            },
        }
    }

    pub fn summary(&self) -> OleMetadata {
        self.cfb.summary_metadata()
    }

    /// Names of all streams, for diagnostics.
    pub fn stream_names(&self) -> Vec<String> {
        self.cfb.list_streams().into_iter().map(|p| p.join("/")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::header::FileFlags;
    use super::super::test_support::{deflate, file_header};
    use super::*;
    use crate::ole::builder::CompoundBuilder;

    #[test]
    fn test_inflate_raw() {
        let payload = "압축된 본문".repeat(20);
        let packed = deflate(payload.as_bytes());
        assert_eq!(inflate_raw(&packed).unwrap(), payload.as_bytes());
    }

    #[test]
    fn test_compressed_streams_and_fallback() {
        let bytes = CompoundBuilder::new()
            .stream(&["FileHeader"], &file_header(FileFlags::COMPRESSED))
            .stream(&["DocInfo"], &deflate(b"docinfo"))
            .stream(&["BodyText", "Section0"], &deflate(b"s0"))
            .stream(&["BodyText", "Section1"], &deflate(b"s1"))
            .stream(&["BinData", "BIN0001.png"], b"\xFF\xFFraw")
            .build();
        let package = HwpPackage::open(bytes).unwrap();
        assert_eq!(package.doc_info().unwrap(), b"docinfo");
        assert_eq!(package.sections(None).unwrap(), vec![b"s0".to_vec(), b"s1".to_vec()]);
        assert_eq!(package.sections(Some(1)).unwrap().len(), 1);
        // stored bytes that are not a deflate stream come back unchanged
        assert_eq!(package.bin_data("BIN0001.png", true).unwrap(), b"\xFF\xFFraw");
        assert!(package.bin_data("BIN0002.png", false).is_none());
        assert!(package.stream_names().iter().any(|n| n == "BodyText/Section1"));
    }

    #[test]
    fn test_missing_section_zero() {
        let bytes = CompoundBuilder::new()
            .stream(&["FileHeader"], &file_header(FileFlags::empty()))
            .stream(&["DocInfo"], b"")
            .build();
        let package = HwpPackage::open(bytes).unwrap();
        assert!(matches!(package.sections(None), Err(HwpError::StreamNotFound(_))));
    }

    #[test]
    fn test_unreadable_section_ends_enumeration() {
        let mut bytes = CompoundBuilder::new()
            .stream(&["FileHeader"], &file_header(FileFlags::empty()))
            .stream(&["DocInfo"], b"")
            .stream(&["BodyText", "Section0"], b"s0")
            .stream(&["BodyText", "Section1"], b"s1")
            .build();
        // point Section1's directory entry at a sector outside the mini FAT
        let name: Vec<u8> = "Section1".encode_utf16().flat_map(u16::to_le_bytes).collect();
        let entry = bytes.windows(name.len()).position(|w| w == name.as_slice()).unwrap();
        bytes[entry + 116..entry + 120].copy_from_slice(&0x00FF_FFFFu32.to_le_bytes());

        let package = HwpPackage::open(bytes).unwrap();
        assert!(matches!(
            package.stream(&["BodyText", "Section1"]),
            Err(HwpError::Ole(_))
        ));
        assert_eq!(package.sections(None).unwrap(), vec![b"s0".to_vec()]);
    }

    #[test]
    fn test_missing_file_header() {
        let bytes = CompoundBuilder::new().stream(&["DocInfo"], b"").build();
        assert!(matches!(HwpPackage::open(bytes), Err(HwpError::StreamNotFound(_))));
    }
}
