//! Record and container builders for legacy fixtures.

use super::header::{FileFlags, SIGNATURE};
use super::tags;
use crate::ole::builder::CompoundBuilder;
use std::io::Write;

/// Encode one record, using the extended size field for large payloads.
pub(crate) fn record(tag: u16, level: u16, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 8);
    let base = (tag as u32 & 0x3FF) | ((level as u32 & 0x3FF) << 10);
    if data.len() >= 0xFFF {
        out.extend_from_slice(&(base | (0xFFF << 20)).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    } else {
        out.extend_from_slice(&(base | ((data.len() as u32) << 20)).to_le_bytes());
    }
    out.extend_from_slice(data);
    out
}

/// A 256-byte `FileHeader` for version 5.1.0.1.
pub(crate) fn file_header(flags: FileFlags) -> Vec<u8> {
    let mut out = vec![0u8; 256];
    out[..SIGNATURE.len()].copy_from_slice(SIGNATURE);
    out[32..36].copy_from_slice(&0x0501_0001u32.to_le_bytes());
    out[36..40].copy_from_slice(&flags.bits().to_le_bytes());
    out
}

pub(crate) fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub(crate) fn units_bytes(units: &[u16]) -> Vec<u8> {
    units.iter().flat_map(|u| u.to_le_bytes()).collect()
}

/// Length-prefixed UTF-16 string as stored in records.
pub(crate) fn hwp_string(s: &str) -> Vec<u8> {
    let units: Vec<u16> = s.encode_utf16().collect();
    let mut out = (units.len() as u16).to_le_bytes().to_vec();
    out.extend(units_bytes(&units));
    out
}

/// Text units of `s` followed by the paragraph break.
pub(crate) fn text_units(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(13)).collect()
}

/// Eight-unit extended control carrying `id` in its placeholder units.
pub(crate) fn control_units(code: u16, id: u32) -> [u16; 8] {
    [code, (id & 0xFFFF) as u16, (id >> 16) as u16, 0, 0, 0, 0, code]
}

/// Eight-unit tab: width in units 1..3, leader code in unit 3.
pub(crate) fn tab_units(width: u32, leader: u8) -> [u16; 8] {
    [9, (width & 0xFFFF) as u16, (width >> 16) as u16, leader as u16, 0, 0, 0, 9]
}

pub(crate) fn para_header(nchars: u32, para_shape: u16, char_shape_count: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(24);
    out.extend_from_slice(&nchars.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&para_shape.to_le_bytes());
    out.push(0); // style
    out.push(0); // break type
    out.extend_from_slice(&char_shape_count.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

pub(crate) fn char_shape_markers(markers: &[(u32, u32)]) -> Vec<u8> {
    markers
        .iter()
        .flat_map(|(pos, id)| pos.to_le_bytes().into_iter().chain(id.to_le_bytes()))
        .collect()
}

/// Control header payload: the id followed by `body`.
pub(crate) fn ctrl_header(id: u32, body: &[u8]) -> Vec<u8> {
    let mut out = id.to_le_bytes().to_vec();
    out.extend_from_slice(body);
    out
}

/// Common object properties following the control id.
pub(crate) fn object_common(treat_as_char: bool, width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(treat_as_char as u32).to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes()); // vertical offset
    out.extend_from_slice(&0i32.to_le_bytes()); // horizontal offset
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes()); // z-order
    out.extend_from_slice(&[0u8; 8]); // outer margins
    out.extend_from_slice(&7u32.to_le_bytes()); // instance id
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // empty description
    out
}

/// Shape component payload: ids, offsets, 3000x1500 size, no render
/// pairs, a red 33-unit line and no fill.
pub(crate) fn shape_component(id: u32, top_level: bool) -> Vec<u8> {
    let mut out = id.to_le_bytes().to_vec();
    if top_level {
        out.extend_from_slice(&id.to_le_bytes());
    }
    out.extend_from_slice(&100i32.to_le_bytes());
    out.extend_from_slice(&200i32.to_le_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&3000u32.to_le_bytes());
    out.extend_from_slice(&1500u32.to_le_bytes());
    out.extend_from_slice(&[0u8; 14]);
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&[0u8; 48]);
    out.extend_from_slice(&0x0000_00FFu32.to_le_bytes());
    out.extend_from_slice(&33i32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.push(0);
    out.extend_from_slice(&0u32.to_le_bytes());
    out
}

pub(crate) fn table_record(rows: u16, cols: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&rows.to_le_bytes());
    out.extend_from_slice(&cols.to_le_bytes());
    out.extend_from_slice(&0i16.to_le_bytes());
    out.extend_from_slice(&[0u8; 8]);
    for _ in 0..rows {
        out.extend_from_slice(&cols.to_le_bytes());
    }
    out.extend_from_slice(&1u16.to_le_bytes());
    out
}

pub(crate) fn cell_list_header(col: u16, row: u16, col_span: u16, row_span: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&1u32.to_le_bytes()); // paragraph count
    out.extend_from_slice(&0u32.to_le_bytes()); // list attributes
    for v in [col, row, col_span, row_span] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out.extend_from_slice(&1000u32.to_le_bytes());
    out.extend_from_slice(&500u32.to_le_bytes());
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(&1u16.to_le_bytes());
    out
}

pub(crate) fn list_header() -> Vec<u8> {
    let mut out = 1u32.to_le_bytes().to_vec();
    out.extend_from_slice(&0u32.to_le_bytes());
    out
}

/// Append a plain paragraph (header, text, one char shape) at `level`.
pub(crate) fn push_paragraph(stream: &mut Vec<u8>, level: u16, text: &str) {
    let units = text_units(text);
    stream.extend(record(tags::PARA_HEADER, level, &para_header(units.len() as u32, 0, 1)));
    stream.extend(record(tags::PARA_TEXT, level + 1, &units_bytes(&units)));
    stream.extend(record(tags::PARA_CHAR_SHAPE, level + 1, &char_shape_markers(&[(0, 0)])));
}

/// Minimal DocInfo: one character shape, one paragraph shape.
pub(crate) fn minimal_doc_info() -> Vec<u8> {
    let mut out = Vec::new();
    let mut char_shape = vec![0u8; 74];
    char_shape[42..46].copy_from_slice(&1000i32.to_le_bytes());
    char_shape[46..50].copy_from_slice(&0x2u32.to_le_bytes()); // bold
    char_shape[60..64].copy_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    out.extend(record(tags::CHAR_SHAPE, 0, &char_shape));
    out.extend(record(tags::PARA_SHAPE, 0, &vec![0u8; 54]));
    out
}

/// Uncompressed legacy file holding `doc_info` and the given section streams.
pub(crate) fn hwp_file(doc_info: &[u8], sections: &[Vec<u8>]) -> Vec<u8> {
    let mut builder = CompoundBuilder::new()
        .stream(&["FileHeader"], &file_header(FileFlags::empty()))
        .stream(&["DocInfo"], doc_info);
    for (i, section) in sections.iter().enumerate() {
        let name = format!("Section{}", i);
        builder = builder.stream(&["BodyText", &name], section);
    }
    builder.build()
}
