//! The `FileHeader` stream: signature, version and property flags.

use super::HwpError;
use crate::common::binary::read_u32_le;
use bitflags::bitflags;
use std::fmt;

/// Signature at the start of the `FileHeader` stream
pub const SIGNATURE: &[u8] = b"HWP Document File";

bitflags! {
    /// Document property bits of the file header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FileFlags: u32 {
        /// Section and DocInfo streams are raw-deflate compressed
        const COMPRESSED = 0x0001;
        /// Password protected
        const PASSWORD = 0x0002;
        /// Distribution document; body lives encrypted in `ViewText`
        const DISTRIBUTION = 0x0004;
        const SCRIPT = 0x0008;
        /// DRM protected
        const DRM = 0x0010;
        const XML_TEMPLATE = 0x0020;
        const HISTORY = 0x0040;
        const SIGNATURE = 0x0080;
        const CERT_ENCRYPTED = 0x0100;
        const CERT_DRM = 0x0400;
        const CCL = 0x0800;
    }
}

/// Format version `MM.nn.PP.rr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(pub u32);

impl Version {
    pub const fn new(major: u8, minor: u8, build: u8, revision: u8) -> Self {
        Self(
            ((major as u32) << 24) | ((minor as u32) << 16) | ((build as u32) << 8) | revision as u32,
        )
    }

    #[inline]
    pub fn major(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0.to_be_bytes();
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub version: Version,
    pub flags: FileFlags,
}

impl FileHeader {
    /// Decode and validate the header.
    ///
    /// Password, DRM and distribution documents are rejected as encrypted.
    pub fn parse(data: &[u8]) -> Result<Self, HwpError> {
        if data.len() < 40 || !data.starts_with(SIGNATURE) {
            return Err(HwpError::InvalidSignature);
        }
        let version = Version(read_u32_le(data, 32).map_err(|e| HwpError::Corrupted(e.to_string()))?);
        let flags = FileFlags::from_bits_retain(
            read_u32_le(data, 36).map_err(|e| HwpError::Corrupted(e.to_string()))?,
        );

        let header = Self { version, flags };
        if let Some(reason) = header.encryption() {
            return Err(HwpError::Encrypted(reason.to_string()));
        }
        if version.major() != 5 {
            tracing::warn!(%version, "unexpected format version, decoding anyway");
        }
        Ok(header)
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.flags.contains(FileFlags::COMPRESSED)
    }

    fn encryption(&self) -> Option<&'static str> {
        if self.flags.contains(FileFlags::PASSWORD) {
            Some("password protected")
        } else if self.flags.intersects(FileFlags::DRM | FileFlags::CERT_DRM) {
            Some("DRM protected")
        } else if self.flags.intersects(FileFlags::DISTRIBUTION | FileFlags::CERT_ENCRYPTED) {
            Some("distribution document")
        } else {
            None
        }
    }
}
