use super::consts::*;
use super::file::{CompoundFile, OleError};
use crate::common::binary::{read_i16_le, read_i32_le, read_u16_le, read_u32_le, utf16_units};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Stream holding the document summary of a legacy HWP file
pub const HWP_SUMMARY_STREAM: &str = "\u{0005}HwpSummaryInformation";

/// Standard OLE summary stream, used as a fallback
pub const SUMMARY_STREAM: &str = "\u{0005}SummaryInformation";

/// Properties extracted from a summary information property set.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OleMetadata {
    pub codepage: Option<u32>,
    pub title: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub keywords: Option<String>,
    pub comments: Option<String>,
    pub last_saved_by: Option<String>,
    pub revision_number: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub last_saved_time: Option<DateTime<Utc>>,
    pub num_pages: Option<u32>,
}

/// Property value types
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    I2(i16),
    I4(i32),
    UI2(u16),
    UI4(u32),
    Bool(bool),
    Lpstr(String),
    Lpwstr(String),
    Filetime(u64),
    Empty,
}

impl CompoundFile {
    /// Read the summary property set, preferring the HWP-specific stream.
    ///
    /// A missing or malformed stream yields empty metadata.
    pub fn summary_metadata(&self) -> OleMetadata {
        let mut metadata = OleMetadata::default();
        for stream in [HWP_SUMMARY_STREAM, SUMMARY_STREAM] {
            if let Ok(data) = self.open_stream(&[stream]) {
                match parse_property_stream(&data) {
                    Ok(props) => {
                        extract_summary_info(&mut metadata, &props);
                        break;
                    },
                    Err(e) => tracing::debug!(stream, error = %e, "unreadable property set"),
                }
            }
        }
        metadata
    }
}

/// Parse the first section of a property set stream ([MS-OLEPS]).
pub fn parse_property_stream(data: &[u8]) -> Result<HashMap<u32, PropertyValue>, OleError> {
    if data.len() < 48 {
        return Err(OleError::InvalidFormat(
            "Property stream too short".to_string(),
        ));
    }

    // 28-byte header, then (FMTID, offset) pairs; the first offset sits at 44
    let section_offset = read_u32_le(data, 44)? as usize;
    let num_props = read_u32_le(data, section_offset.saturating_add(4))
        .map_err(|_| OleError::InvalidFormat("Invalid section offset".to_string()))?;

    let mut entries = Vec::new();
    for i in 0..num_props.min(1000) as usize {
        let at = section_offset + 8 + i * 8;
        let (Ok(prop_id), Ok(value_offset)) = (read_u32_le(data, at), read_u32_le(data, at + 4))
        else {
            break;
        };
        entries.push((prop_id, section_offset.saturating_add(value_offset as usize)));
    }

    // The code page decides how VT_LPSTR values are decoded
    let codepage = entries
        .iter()
        .find(|(id, _)| *id == PID_CODEPAGE)
        .and_then(|&(_, at)| read_u16_le(data, at + 4).ok());

    let mut properties = HashMap::new();
    for (prop_id, value_offset) in entries {
        let Ok(prop_type) = read_u16_le(data, value_offset) else {
            continue;
        };
        if let Ok(value) = parse_property_value(data, value_offset + 4, prop_type, codepage) {
            properties.insert(prop_id, value);
        }
    }

    Ok(properties)
}

fn parse_property_value(
    data: &[u8],
    offset: usize,
    prop_type: u16,
    codepage: Option<u16>,
) -> Result<PropertyValue, OleError> {
    let value = match prop_type {
        VT_I2 => PropertyValue::I2(read_i16_le(data, offset)?),
        VT_I4 => PropertyValue::I4(read_i32_le(data, offset)?),
        VT_UI2 => PropertyValue::UI2(read_u16_le(data, offset)?),
        VT_UI4 => PropertyValue::UI4(read_u32_le(data, offset)?),
        VT_BOOL => PropertyValue::Bool(read_u16_le(data, offset)? != 0),
        VT_LPSTR => {
            let len = read_u32_le(data, offset)? as usize;
            let raw = data
                .get(offset + 4..offset + 4 + len)
                .ok_or_else(|| OleError::InvalidFormat("String overflow".to_string()))?;
            PropertyValue::Lpstr(decode_codepage_string(raw, codepage))
        },
        VT_LPWSTR => {
            let chars = read_u32_le(data, offset)? as usize;
            let raw = data
                .get(offset + 4..offset + 4 + chars * 2)
                .ok_or_else(|| OleError::InvalidFormat("String overflow".to_string()))?;
            let units: Vec<u16> = utf16_units(raw).into_iter().take_while(|&u| u != 0).collect();
            PropertyValue::Lpwstr(String::from_utf16_lossy(&units))
        },
        VT_FILETIME => {
            let low = read_u32_le(data, offset)? as u64;
            let high = read_u32_le(data, offset + 4)? as u64;
            PropertyValue::Filetime(low | (high << 32))
        },
        _ => PropertyValue::Empty,
    };
    Ok(value)
}

/// Decode an 8-bit property string through its declared code page.
///
/// Korean documents declare code page 949; anything unknown falls back to
/// lossy UTF-8.
fn decode_codepage_string(raw: &[u8], codepage: Option<u16>) -> String {
    let raw = match raw.iter().position(|&b| b == 0) {
        Some(end) => &raw[..end],
        None => raw,
    };
    let encoding = match codepage {
        Some(CP_UTF16) => {
            let units = utf16_units(raw);
            return String::from_utf16_lossy(&units).trim_end_matches('\0').to_string();
        },
        Some(949) => Some(encoding_rs::EUC_KR),
        Some(932) => Some(encoding_rs::SHIFT_JIS),
        Some(936) => Some(encoding_rs::GBK),
        Some(1252) => Some(encoding_rs::WINDOWS_1252),
        Some(65001) => Some(encoding_rs::UTF_8),
        _ => None,
    };
    match encoding {
        Some(enc) => enc.decode_without_bom_handling(raw).0.into_owned(),
        None => String::from_utf8_lossy(raw).into_owned(),
    }
}

/// Convert a Windows FILETIME (100ns ticks since 1601-01-01) to UTC.
pub fn filetime_to_datetime(filetime: u64) -> Option<DateTime<Utc>> {
    const TICKS_PER_SECOND: u64 = 10_000_000;
    const EPOCH_DIFFERENCE_SECS: i64 = 11_644_473_600;
    if filetime == 0 {
        return None;
    }
    let secs = (filetime / TICKS_PER_SECOND) as i64 - EPOCH_DIFFERENCE_SECS;
    let nanos = ((filetime % TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

fn extract_summary_info(metadata: &mut OleMetadata, props: &HashMap<u32, PropertyValue>) {
    match props.get(&PID_CODEPAGE) {
        Some(PropertyValue::UI2(v)) => metadata.codepage = Some(*v as u32),
        Some(PropertyValue::I2(v)) => metadata.codepage = Some(*v as u16 as u32),
        _ => {},
    }
    metadata.title = props.get(&2).and_then(extract_string);
    metadata.subject = props.get(&3).and_then(extract_string);
    metadata.author = props.get(&4).and_then(extract_string);
    metadata.keywords = props.get(&5).and_then(extract_string);
    metadata.comments = props.get(&6).and_then(extract_string);
    metadata.last_saved_by = props.get(&8).and_then(extract_string);
    metadata.revision_number = props.get(&9).and_then(extract_string);
    if let Some(PropertyValue::Filetime(v)) = props.get(&12) {
        metadata.create_time = filetime_to_datetime(*v);
    }
    if let Some(PropertyValue::Filetime(v)) = props.get(&13) {
        metadata.last_saved_time = filetime_to_datetime(*v);
    }
    match props.get(&14) {
        Some(PropertyValue::I4(v)) if *v >= 0 => metadata.num_pages = Some(*v as u32),
        Some(PropertyValue::UI4(v)) => metadata.num_pages = Some(*v),
        _ => {},
    }
}

fn extract_string(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::Lpstr(s) | PropertyValue::Lpwstr(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
