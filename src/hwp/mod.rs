//! Legacy HWP 5.x binary documents.
//!
//! A legacy document is a compound file holding several record streams:
//! - **FileHeader**: signature, version and property flags
//! - **DocInfo**: style tables and the binary item list
//! - **BodyText/Section{N}**: one record stream per section
//! - **BinData/BIN{XXXX}.{ext}**: embedded pictures and OLE objects
//! - **\x05HwpSummaryInformation**: document metadata
//!
//! Streams are raw-deflate compressed when the header says so.
//!
//! # Example
//!
//! ```rust,no_run
//! use hwpdoc::{ParseOptions, hwp};
//!
//! let bytes = std::fs::read("report.hwp")?;
//! let doc = hwp::decode(&bytes, &ParseOptions::default())?;
//! println!("{} sections", doc.sections.len());
//! # Ok::<(), hwpdoc::Error>(())
//! ```

pub mod control;
pub mod doc_info;
pub mod header;
pub mod package;
pub mod record;
pub mod section;
pub mod shape;
pub mod tags;
pub mod text;

#[cfg(test)]
pub(crate) mod test_support;

pub use doc_info::{BinItem, BinKind, DocInfo, parse_doc_info};
pub use header::{FileFlags, FileHeader, Version};
pub use package::HwpPackage;
pub use record::{Record, RecordIter};
pub use section::{SectionContext, decode_section};

use crate::common::{FileFormat, Result};
use crate::model::{Asset, Document};
use crate::ole::OleError;
use crate::options::ParseOptions;
use bytes::Bytes;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HwpError {
    #[error("OLE error: {0}")]
    Ole(#[from] OleError),

    #[error("not an HWP document: FileHeader signature mismatch")]
    InvalidSignature,

    #[error("encrypted document: {0}")]
    Encrypted(String),

    #[error("stream not found: {0}")]
    StreamNotFound(String),

    #[error("corrupted document: {0}")]
    Corrupted(String),
}

/// Decode a legacy document held in memory.
///
/// All streams are read before any section is decoded; sections are decoded
/// on the rayon pool when [`ParseOptions::parallel_sections`] is set.
pub fn decode(bytes: &[u8], options: &ParseOptions) -> Result<Document> {
    let package = HwpPackage::open(bytes.to_vec())?;
    let info = parse_doc_info(&package.doc_info()?);
    let streams = package.sections(options.max_sections)?;
    if let Some(declared) = info.section_count
        && declared as usize != streams.len()
        && options.max_sections.is_none()
    {
        tracing::debug!(declared, found = streams.len(), "section count mismatch");
    }

    let ctx = SectionContext {
        info: &info,
        include_line_segments: options.include_line_segments,
    };
    let decoded: Vec<_> = if options.parallel_sections {
        streams
            .par_iter()
            .enumerate()
            .map(|(index, data)| decode_section(data, index, &ctx))
            .collect()
    } else {
        streams
            .iter()
            .enumerate()
            .map(|(index, data)| decode_section(data, index, &ctx))
            .collect()
    };

    let mut doc = Document::new(FileFormat::Hwp);
    doc.version = package.header().version.to_string();
    doc.metadata = package.summary().into();
    for (section, notes) in decoded {
        doc.sections.push(section);
        doc.notes.extend(notes);
    }
    if options.load_assets {
        load_assets(&package, &info, &mut doc);
    }
    doc.styles = info.styles;
    Ok(doc)
}

fn load_assets(package: &HwpPackage, info: &DocInfo, doc: &mut Document) {
    let compressed = package.header().is_compressed();
    for item in &info.bin_items {
        if item.kind == BinKind::Link {
            tracing::trace!(path = ?item.link_path, "linked binary item not embedded");
            continue;
        }
        let file_name = item.stream_name();
        let Some(data) = package.bin_data(&file_name, item.is_compressed(compressed)) else {
            continue;
        };
        let id = item.key();
        doc.assets.insert(
            id.clone(),
            Asset {
                id,
                file_name,
                extension: item.extension.clone(),
                data: Bytes::from(data),
            },
        );
    }
}
