//! Fixed-layout control records: object placement, tables, cells, page and
//! column definitions, fields, notes and paragraph side records.

use super::tags;
use crate::common::binary::{ByteCursor, read_i16_le, read_i32_le, read_u16_le, read_u32_le};
use crate::model::{
    Cell, ColumnDef, ColumnKind, Color, Equation, FieldKind, FormControl, FormKind, LineSegment,
    Margins, ObjectProps, PageApply, PageDef, VerticalAlign,
};

use super::text::Highlight;

/// Range tag kind carrying a highlight color in its data bits
const RANGE_TAG_HIGHLIGHT: u32 = 2;

/// Control id at the start of a `CTRL_HEADER` payload.
#[inline]
pub fn ctrl_id(data: &[u8]) -> Option<u32> {
    read_u32_le(data, 0).ok()
}

/// Common object properties following the control id of tables, drawing
/// objects, equations and form controls.
pub fn decode_object(data: &[u8]) -> ObjectProps {
    let mut c = ByteCursor::at(data, 4);
    let mut props = ObjectProps::default();
    let Ok(attr) = c.u32() else {
        return props;
    };
    props.treat_as_char = attr & 0x1 != 0;
    props.y = c.i32().unwrap_or(0);
    props.x = c.i32().unwrap_or(0);
    props.width = c.u32().unwrap_or(0);
    props.height = c.u32().unwrap_or(0);
    props.z_order = c.i32().unwrap_or(0);
    props.outer_margins = Margins {
        left: c.i16().unwrap_or(0) as i32,
        right: c.i16().unwrap_or(0) as i32,
        top: c.i16().unwrap_or(0) as i32,
        bottom: c.i16().unwrap_or(0) as i32,
    };
    props.instance_id = c.u32().unwrap_or(0);
    c.skip(4);
    props.description = c.utf16_string().ok().filter(|s| !s.is_empty());
    props
}

/// The `TABLE` record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableInfo {
    pub rows: u16,
    pub cols: u16,
    pub cell_spacing: u32,
    pub inner_margins: Margins,
    pub border_fill_id: Option<u32>,
    pub repeat_header: bool,
}

pub fn decode_table(data: &[u8]) -> Option<TableInfo> {
    let attr = read_u32_le(data, 0).ok()?;
    let rows = read_u16_le(data, 4).ok()?;
    let cols = read_u16_le(data, 6).ok()?;
    let margin = |k: usize| read_i16_le(data, 10 + k * 2).unwrap_or(0) as i32;
    let border_at = 18 + rows as usize * 2;
    Some(TableInfo {
        rows,
        cols,
        cell_spacing: read_i16_le(data, 8).unwrap_or(0).max(0) as u32,
        inner_margins: Margins {
            left: margin(0),
            right: margin(1),
            top: margin(2),
            bottom: margin(3),
        },
        border_fill_id: read_u16_le(data, border_at).ok().filter(|&id| id > 0).map(u32::from),
        repeat_header: attr & 0x4 != 0,
    })
}

/// A cell's `LIST_HEADER`: the address (when present) and an empty cell.
pub fn decode_cell(data: &[u8]) -> (Option<(u32, u32)>, Cell) {
    let mut cell = Cell::default();
    if let Ok(attr) = read_u32_le(data, 4) {
        cell.vertical_align = VerticalAlign::from_code((attr >> 5) & 0x3);
    }
    let (Ok(col), Ok(row)) = (read_u16_le(data, 8), read_u16_le(data, 10)) else {
        tracing::debug!(len = data.len(), "cell list header without address");
        return (None, cell);
    };
    cell.col_span = read_u16_le(data, 12).unwrap_or(1).max(1) as u32;
    cell.row_span = read_u16_le(data, 14).unwrap_or(1).max(1) as u32;
    cell.width = read_u32_le(data, 16).unwrap_or(0);
    cell.height = read_u32_le(data, 20).unwrap_or(0);
    let margin = |k: usize| read_u16_le(data, 24 + k * 2).unwrap_or(0) as i32;
    cell.margins = Margins {
        left: margin(0),
        right: margin(1),
        top: margin(2),
        bottom: margin(3),
    };
    cell.border_fill_id = read_u16_le(data, 32).ok().filter(|&id| id > 0).map(u32::from);
    (Some((row as u32, col as u32)), cell)
}

pub fn decode_page_def(data: &[u8]) -> Option<PageDef> {
    let v = |k: usize| read_u32_le(data, k * 4);
    Some(PageDef {
        width: v(0).ok()?,
        height: v(1).ok()?,
        margins: Margins {
            left: v(2).ok()? as i32,
            right: v(3).ok()? as i32,
            top: v(4).ok()? as i32,
            bottom: v(5).ok()? as i32,
        },
        header_margin: v(6).ok()?,
        footer_margin: v(7).ok()?,
        gutter: v(8).ok()?,
        landscape: v(9).map(|attr| attr & 0x1 != 0).unwrap_or(false),
    })
}

/// Column definition carried by a `cold` control header.
pub fn decode_column_def(data: &[u8]) -> Option<ColumnDef> {
    let attr = read_u16_le(data, 4).ok()? as u32;
    Some(ColumnDef {
        count: (((attr >> 2) & 0xFF) as u16).max(1),
        gap: read_u16_le(data, 6).unwrap_or(0) as u32,
        kind: ColumnKind::from_code(attr & 0x3),
        same_width: attr & (1 << 12) != 0,
    })
}

/// Page selection of a `head`/`foot` control.
pub fn decode_header_footer(data: &[u8]) -> PageApply {
    read_u32_le(data, 4).map(PageApply::from_code).unwrap_or_default()
}

/// Stored number of a `fn  `/`en  ` control; zero means "not recorded".
pub fn decode_note_number(data: &[u8]) -> Option<u32> {
    read_u32_le(data, 4).ok().filter(|&n| n > 0)
}

/// Field kind and command string of a `%xxx` control.
pub fn decode_field(id: u32, data: &[u8]) -> (FieldKind, String) {
    let kind = FieldKind::from_ctrl_id(&tags::ctrl_name(id));
    let command = ByteCursor::at(data, 9).utf16_string().unwrap_or_default();
    (kind, command)
}

pub fn decode_line_segments(data: &[u8]) -> Vec<LineSegment> {
    data.chunks_exact(36)
        .map(|chunk| {
            let i = |k: usize| read_i32_le(chunk, k * 4).unwrap_or(0);
            LineSegment {
                text_start: i(0) as u32,
                vertical_pos: i(1),
                line_height: i(2),
                text_height: i(3),
                baseline_gap: i(4),
                line_spacing: i(5),
                column_start: i(6),
                segment_width: i(7),
                flags: i(8) as u32,
            }
        })
        .collect()
}

/// Sorted `(position, char shape id)` markers of a `PARA_CHAR_SHAPE` record.
pub fn decode_char_shape_markers(data: &[u8]) -> Vec<(u32, u32)> {
    let mut markers: Vec<(u32, u32)> = data
        .chunks_exact(8)
        .filter_map(|chunk| Some((read_u32_le(chunk, 0).ok()?, read_u32_le(chunk, 4).ok()?)))
        .collect();
    markers.sort_by_key(|&(pos, _)| pos);
    markers
}

/// Highlight ranges among the `PARA_RANGE_TAG` entries.
pub fn decode_highlights(data: &[u8]) -> Vec<Highlight> {
    data.chunks_exact(12)
        .filter_map(|chunk| {
            let start = read_u32_le(chunk, 0).ok()?;
            let end = read_u32_le(chunk, 4).ok()?;
            let tag = read_u32_le(chunk, 8).ok()?;
            if tag >> 24 != RANGE_TAG_HIGHLIGHT || end <= start {
                return None;
            }
            Some(Highlight {
                start,
                end,
                color: Color::from_colorref(tag & 0x00FF_FFFF)?,
            })
        })
        .collect()
}

/// The `EQEDIT` record.
pub fn decode_equation(object: ObjectProps, data: &[u8]) -> Equation {
    let mut c = ByteCursor::at(data, 4);
    let script = c.utf16_string().unwrap_or_default();
    let base_size = c.u32().unwrap_or(0);
    let color = c.u32().ok().and_then(Color::from_colorref);
    c.skip(2);
    let version = c.utf16_string().ok().filter(|s| !s.is_empty());
    let font = c.utf16_string().ok().filter(|s| !s.is_empty());
    Equation {
        object,
        script,
        base_size,
        color,
        version,
        font,
    }
}

/// The `FORM_OBJECT` record: two type ids, then a property string of
/// `Key:type:length:value` entries.
pub fn decode_form(object: ObjectProps, data: &[u8]) -> FormControl {
    let mut c = ByteCursor::at(data, 8);
    let props = c
        .u32()
        .ok()
        .and_then(|len| c.bytes(len as usize * 2).ok())
        .map(crate::common::binary::parse_utf16le_string)
        .unwrap_or_default();
    let kind = form_property(&props, "Type")
        .map(|t| FormKind::from_legacy_type(&t))
        .unwrap_or_default();
    FormControl {
        object,
        kind,
        name: form_property(&props, "Name"),
        caption: form_property(&props, "Caption"),
        value: form_property(&props, "Value").or_else(|| form_property(&props, "Text")),
    }
}

/// Look up `key` in a form property string such as `Name:wstring:4:Btn1 `.
fn form_property(props: &str, key: &str) -> Option<String> {
    let mut search = 0;
    while let Some(found) = props[search..].find(key) {
        let start = search + found;
        search = start + key.len();
        let at_boundary = start == 0 || !props[..start].ends_with(|c: char| c.is_alphanumeric());
        let Some(rest) = props[search..].strip_prefix(':') else {
            continue;
        };
        if !at_boundary {
            continue;
        }
        let mut parts = rest.splitn(3, ':');
        let (Some(_ty), Some(len), Some(value)) = (parts.next(), parts.next(), parts.next()) else {
            return None;
        };
        let len = atoi_simd::parse::<usize>(len.as_bytes()).ok()?;
        let value: String = value.chars().take(len).collect();
        return (!value.is_empty()).then_some(value);
    }
    None
}
