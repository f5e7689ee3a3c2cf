//! Unified error types for the hwpdoc library.
use thiserror::Error;

/// Main error type for hwpdoc operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input matches neither container signature
    #[error("Not a valid HWP or HWPX file")]
    NotHwpFile,

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Password-protected or DRM-protected document
    #[error("Encrypted document: {0}")]
    Encrypted(String),

    /// Mandatory stream or package entry not found
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// Corrupted or malformed file
    #[error("Corrupted file: {0}")]
    Corrupted(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type for hwpdoc operations.
pub type Result<T> = std::result::Result<T, Error>;
