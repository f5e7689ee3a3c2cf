//! File format detection utilities.
//!
//! Detection is signature based: the compound-file magic selects the legacy
//! decoder and the ZIP local-header magic selects the XML package decoder.
//! Only the first few bytes are inspected.

pub mod types;

pub use types::FileFormat;

use crate::common::{Error, Result};
use std::path::Path;

/// Compound File Binary signature.
pub const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// ZIP local file header signature.
pub const ZIP_SIGNATURE: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Detect the container format from the leading bytes of a file.
///
/// # Examples
///
/// ```
/// use hwpdoc::common::detection::{detect_file_format_from_bytes, FileFormat};
/// assert_eq!(detect_file_format_from_bytes(b"PK\x03\x04rest"), Some(FileFormat::Hwpx));
/// assert_eq!(detect_file_format_from_bytes(b"plain text"), None);
/// ```
pub fn detect_file_format_from_bytes(bytes: &[u8]) -> Option<FileFormat> {
    if bytes.starts_with(&CFB_SIGNATURE) {
        Some(FileFormat::Hwp)
    } else if bytes.starts_with(&ZIP_SIGNATURE) {
        Some(FileFormat::Hwpx)
    } else {
        None
    }
}

/// Detect the container format, failing with [`Error::NotHwpFile`] when
/// neither signature matches.
pub fn require_file_format(bytes: &[u8]) -> Result<FileFormat> {
    detect_file_format_from_bytes(bytes).ok_or(Error::NotHwpFile)
}

/// Detect the container format of a file on disk.
pub fn detect_file_format<P: AsRef<Path>>(path: P) -> Result<FileFormat> {
    use std::io::Read;

    let mut header = [0u8; 8];
    let mut file = std::fs::File::open(path)?;
    let read = file.read(&mut header)?;
    require_file_format(&header[..read])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_signatures() {
        let mut cfb = CFB_SIGNATURE.to_vec();
        cfb.extend_from_slice(&[0u8; 16]);
        assert_eq!(detect_file_format_from_bytes(&cfb), Some(FileFormat::Hwp));
        assert_eq!(
            detect_file_format_from_bytes(&ZIP_SIGNATURE),
            Some(FileFormat::Hwpx)
        );
        assert!(matches!(
            require_file_format(b"\x00\x01"),
            Err(Error::NotHwpFile)
        ));
        assert!(matches!(require_file_format(&[]), Err(Error::NotHwpFile)));
    }

    #[test]
    fn test_detect_from_path() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&ZIP_SIGNATURE).unwrap();
        file.flush().unwrap();
        assert_eq!(detect_file_format(file.path()).unwrap(), FileFormat::Hwpx);
    }
}
