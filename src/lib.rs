//! hwpdoc - A Rust library for decoding Hancom word-processor documents
//!
//! Two container formats decode into one document model:
//!
//! - **HWP 5.x**: a compound binary file of raw-deflate record streams
//! - **HWPX**: a ZIP package of OWPML XML parts
//!
//! The model keeps paragraphs, runs, tables, drawing objects, notes and memos
//! in document order, with style references resolved against the style
//! tables of the same document.
//!
//! # Features
//!
//! - **hwp** (default): legacy binary documents
//! - **hwpx** (default): XML packages, including paragraph text write-back
//!
//! # Example - Reading any document
//!
//! ```no_run
//! use hwpdoc::Document;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = Document::open("report.hwp")?;
//! println!("{}", doc.text());
//!
//! for section in &doc.sections {
//!     println!("page {}x{}", section.page.width, section.page.height);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Tuning the decode
//!
//! ```no_run
//! use hwpdoc::{ParseOptions, parse_with_options};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("large.hwpx")?;
//! let options = ParseOptions::new()
//!     .with_assets(false)
//!     .with_parallel_sections(true);
//! let doc = parse_with_options(&bytes, &options)?;
//! println!("{}", doc.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Editing an HWPX file
//!
//! ```no_run
//! use hwpdoc::hwpx::HwpxWriter;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("form.hwpx")?;
//! let mut doc = hwpdoc::parse(&bytes)?;
//! if let Some(paragraph) = doc.sections[0].elements[0].as_paragraph_mut() {
//!     paragraph.set_text("채워 넣은 값");
//! }
//!
//! let mut writer = HwpxWriter::new(bytes)?;
//! writer.apply_document(&doc)?;
//! std::fs::write("form-filled.hwpx", writer.finish()?)?;
//! # Ok(())
//! # }
//! ```

/// Shared byte readers, errors, units, metadata and format detection
pub mod common;

/// Format-agnostic parse entry points
pub mod document;

/// The unified document model
pub mod model;

/// Decode options
pub mod options;

/// Compound file (OLE2) container access
#[cfg(feature = "hwp")]
pub mod ole;

/// Legacy HWP 5.x decoder
#[cfg(feature = "hwp")]
pub mod hwp;

/// HWPX package decoder and writer
#[cfg(feature = "hwpx")]
pub mod hwpx;

pub use common::{Error, FileFormat, Metadata, Result};
pub use document::{parse, parse_with_options};
pub use model::{Asset, Cell, Document, Element, Paragraph, Row, Run, RunKind, Section, StyleTables, Table};
pub use options::ParseOptions;
