//! Format-agnostic entry points.
//!
//! The container is detected from its leading signature and handed to the
//! matching decoder. Both decoders produce the same [`Document`] model, so
//! callers never need to know which format they opened.
//!
//! # Example
//!
//! ```rust,no_run
//! use hwpdoc::{ParseOptions, parse_with_options};
//!
//! let bytes = std::fs::read("report.hwpx")?;
//! let doc = parse_with_options(&bytes, &ParseOptions::new().with_parallel_sections(true))?;
//! for paragraph in doc.paragraphs() {
//!     println!("{}", paragraph.text());
//! }
//! # Ok::<(), hwpdoc::Error>(())
//! ```

use crate::common::detection::require_file_format;
use crate::common::{FileFormat, Result};
use crate::model::Document;
use crate::options::ParseOptions;

/// Parse a document with default options.
pub fn parse(bytes: &[u8]) -> Result<Document> {
    parse_with_options(bytes, &ParseOptions::default())
}

/// Parse a document, detecting legacy or XML format from the signature.
pub fn parse_with_options(bytes: &[u8], options: &ParseOptions) -> Result<Document> {
    let format = require_file_format(bytes)?;
    tracing::debug!(?format, len = bytes.len(), "parsing document");
    match format {
        FileFormat::Hwp => decode_hwp(bytes, options),
        FileFormat::Hwpx => decode_hwpx(bytes, options),
    }
}

#[cfg(feature = "hwp")]
fn decode_hwp(bytes: &[u8], options: &ParseOptions) -> Result<Document> {
    crate::hwp::decode(bytes, options)
}

#[cfg(not(feature = "hwp"))]
fn decode_hwp(_bytes: &[u8], _options: &ParseOptions) -> Result<Document> {
    Err(crate::common::Error::Unsupported(
        "legacy documents require the `hwp` feature".to_string(),
    ))
}

#[cfg(feature = "hwpx")]
fn decode_hwpx(bytes: &[u8], options: &ParseOptions) -> Result<Document> {
    crate::hwpx::decode(bytes, options)
}

#[cfg(not(feature = "hwpx"))]
fn decode_hwpx(_bytes: &[u8], _options: &ParseOptions) -> Result<Document> {
    Err(crate::common::Error::Unsupported(
        "HWPX documents require the `hwpx` feature".to_string(),
    ))
}
