//! Common types, traits, and utilities shared across formats.
//!
//! This module provides the byte readers, error types, unit conversions,
//! metadata and format detection used by both the legacy binary decoder and
//! the XML package decoder.

// Submodule declarations
pub mod binary;
pub mod detection;
pub mod error;
pub mod metadata;
pub mod unit;
pub mod xml;

// Re-exports for convenience
pub use detection::{FileFormat, detect_file_format, detect_file_format_from_bytes};
pub use error::{Error, Result};
pub use metadata::Metadata;
