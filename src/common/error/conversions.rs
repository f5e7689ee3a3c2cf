//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::common::binary::BinaryError;

impl From<BinaryError> for Error {
    fn from(err: BinaryError) -> Self {
        Error::Corrupted(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Other(format!("JSON serialization failed: {}", err))
    }
}

#[cfg(feature = "hwp")]
impl From<crate::ole::OleError> for Error {
    fn from(err: crate::ole::OleError) -> Self {
        match err {
            crate::ole::OleError::Io(e) => Error::Io(e),
            crate::ole::OleError::InvalidFormat(s) => Error::InvalidFormat(s),
            crate::ole::OleError::InvalidData(s) => Error::InvalidFormat(s),
            crate::ole::OleError::NotOleFile => Error::NotHwpFile,
            crate::ole::OleError::CorruptedFile(s) => Error::Corrupted(s),
            crate::ole::OleError::StreamNotFound(s) => Error::ComponentNotFound(s),
        }
    }
}

#[cfg(feature = "hwp")]
impl From<crate::hwp::HwpError> for Error {
    fn from(err: crate::hwp::HwpError) -> Self {
        match err {
            crate::hwp::HwpError::Ole(e) => Error::from(e),
            crate::hwp::HwpError::InvalidSignature => {
                Error::InvalidFormat("FileHeader signature mismatch".to_string())
            },
            crate::hwp::HwpError::Encrypted(s) => Error::Encrypted(s),
            crate::hwp::HwpError::StreamNotFound(s) => Error::ComponentNotFound(s),
            crate::hwp::HwpError::Corrupted(s) => Error::Corrupted(s),
        }
    }
}

#[cfg(feature = "hwpx")]
impl From<crate::hwpx::HwpxError> for Error {
    fn from(err: crate::hwpx::HwpxError) -> Self {
        match err {
            crate::hwpx::HwpxError::Io(e) => Error::Io(e),
            crate::hwpx::HwpxError::Zip(s) => Error::ZipError(s),
            crate::hwpx::HwpxError::Xml(s) => Error::XmlError(s),
            crate::hwpx::HwpxError::EntryNotFound(s) => Error::ComponentNotFound(s),
            crate::hwpx::HwpxError::InvalidMimeType(s) => {
                Error::InvalidFormat(format!("unexpected mimetype: {}", s))
            },
            crate::hwpx::HwpxError::Encrypted => {
                Error::Encrypted("package declares encrypted entries".to_string())
            },
        }
    }
}

#[cfg(feature = "hwpx")]
impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipError(err.to_string())
    }
}
