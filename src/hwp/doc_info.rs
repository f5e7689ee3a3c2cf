//! DocInfo stream: the ID-keyed style tables and the binary item list.
//!
//! Records are dispatched by tag into one table per kind. IDs follow the
//! encounter order; border fills, numberings, bullets and binary items are
//! 1-based, everything else 0-based. Fonts are grouped per language using
//! the counts of the `ID_MAPPINGS` record. A record shorter than its kind's
//! fixed part is skipped.

use super::record::RecordIter;
use super::tags;
use crate::common::binary::{ByteCursor, read_i32_le, read_u16_le, read_u32_le};
use crate::model::{
    Alignment, BorderFill, BorderLine, Bullet, CharStyle, Color, Fill, Font, FontSlot,
    HeadingKind, Language, LineShape, LineSpacingUnit, MemoShape, Numbering, ParaHead, ParaStyle,
    Shadow, StyleDef, StyleKind, StyleTables, Strikeout, TabDef, TabKind, TabStop, Underline,
    UnderlineKind,
};

pub const CHAR_SHAPE_MIN: usize = 72;
pub const PARA_SHAPE_MIN: usize = 42;
pub const BORDER_FILL_MIN: usize = 32;

/// Border widths in millimetres indexed by the stored width code.
const BORDER_WIDTH_MM: [f64; 16] = [
    0.1, 0.12, 0.15, 0.2, 0.25, 0.3, 0.4, 0.5, 0.6, 0.7, 1.0, 1.5, 2.0, 3.0, 4.0, 5.0,
];

/// Number format names shared with the HWPX `numFormat` attribute.
const NUMBER_FORMATS: [&str; 17] = [
    "DIGIT",
    "CIRCLED_DIGIT",
    "ROMAN_CAPITAL",
    "ROMAN_SMALL",
    "LATIN_CAPITAL",
    "LATIN_SMALL",
    "CIRCLED_LATIN_CAPITAL",
    "CIRCLED_LATIN_SMALL",
    "HANGUL_SYLLABLE",
    "CIRCLED_HANGUL_SYLLABLE",
    "HANGUL_JAMO",
    "CIRCLED_HANGUL_JAMO",
    "HANGUL_PHONETIC",
    "IDEOGRAPH",
    "CIRCLED_IDEOGRAPH",
    "DECAGON_CIRCLE",
    "DECAGON_CIRCLE_HANJA",
];

pub(crate) fn number_format_name(code: u32) -> String {
    NUMBER_FORMATS
        .get(code as usize)
        .copied()
        .unwrap_or("DIGIT")
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinKind {
    Link,
    #[default]
    Embedding,
    Storage,
}

/// Per-item compression override of a binary item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinCompression {
    /// Follow the document's compression flag
    #[default]
    Default,
    Compress,
    Store,
}

/// One `BIN_DATA` record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BinItem {
    pub kind: BinKind,
    pub compression: BinCompression,
    /// Storage id naming the `BinData/BIN{id:04X}.{ext}` stream
    pub storage_id: u16,
    pub extension: String,
    /// Link target for externally linked items
    pub link_path: Option<String>,
}

impl BinItem {
    /// Asset key, e.g. `BIN0001`.
    pub fn key(&self) -> String {
        format!("BIN{:04X}", self.storage_id)
    }

    pub fn stream_name(&self) -> String {
        format!("BIN{:04X}.{}", self.storage_id, self.extension)
    }

    pub fn is_compressed(&self, document_compressed: bool) -> bool {
        match self.compression {
            BinCompression::Default => document_compressed,
            BinCompression::Compress => true,
            BinCompression::Store => false,
        }
    }
}

/// Everything decoded from the DocInfo stream.
#[derive(Debug, Clone, Default)]
pub struct DocInfo {
    pub styles: StyleTables,
    /// Binary items in record order; index `i` has 1-based id `i + 1`
    pub bin_items: Vec<BinItem>,
    pub section_count: Option<u16>,
}

impl DocInfo {
    /// Asset key for a 1-based binary item id.
    pub fn bin_key(&self, id: u16) -> Option<String> {
        (id as usize)
            .checked_sub(1)
            .and_then(|i| self.bin_items.get(i))
            .map(BinItem::key)
    }
}

/// Decode the DocInfo record stream.
pub fn parse_doc_info(data: &[u8]) -> DocInfo {
    let mut info = DocInfo::default();
    let mut font_counts = [0u32; 7];
    let mut faces_seen = 0u32;
    let mut char_id = 0u32;
    let mut para_id = 0u32;
    let mut tab_id = 0u32;
    let mut style_id = 0u32;
    let mut memo_shape_id = 0u32;

    for rec in RecordIter::new(data) {
        let data = rec.data;
        match rec.tag {
            tags::DOCUMENT_PROPERTIES => {
                info.section_count = read_u16_le(data, 0).ok();
            },
            tags::ID_MAPPINGS => {
                for (i, count) in font_counts.iter_mut().enumerate() {
                    *count = read_i32_le(data, 4 + i * 4).unwrap_or(0).max(0) as u32;
                }
            },
            tags::BIN_DATA => {
                // Keep the 1-based numbering aligned even for unreadable records
                info.bin_items.push(decode_bin_item(data).unwrap_or_default());
            },
            tags::FACE_NAME => {
                let (lang, id) = font_slot_for(faces_seen, &font_counts);
                faces_seen += 1;
                match decode_face_name(data) {
                    Some(font) => {
                        info.styles.fonts.entry(lang).or_default().insert(id, font);
                    },
                    None => tracing::debug!(len = data.len(), "undersized FACE_NAME record"),
                }
            },
            tags::BORDER_FILL => {
                let id = info.styles.border_fills.len() as u32 + 1;
                let fill = decode_border_fill(data).unwrap_or_else(|| {
                    tracing::debug!(len = data.len(), "undersized BORDER_FILL record");
                    BorderFill::default()
                });
                info.styles.border_fills.insert(id, fill);
            },
            tags::CHAR_SHAPE => {
                match decode_char_shape(data) {
                    Some(style) => {
                        info.styles.char_styles.insert(char_id, style);
                    },
                    None => tracing::debug!(len = data.len(), "undersized CHAR_SHAPE record"),
                }
                char_id += 1;
            },
            tags::TAB_DEF => {
                if let Some(tab) = decode_tab_def(data) {
                    info.styles.tab_defs.insert(tab_id, tab);
                }
                tab_id += 1;
            },
            tags::NUMBERING => {
                let id = info.styles.numberings.len() as u32 + 1;
                info.styles.numberings.insert(id, decode_numbering(data));
            },
            tags::BULLET => {
                let id = info.styles.bullets.len() as u32 + 1;
                info.styles.bullets.insert(id, decode_bullet(data));
            },
            tags::PARA_SHAPE => {
                match decode_para_shape(data) {
                    Some(style) => {
                        info.styles.para_styles.insert(para_id, style);
                    },
                    None => tracing::debug!(len = data.len(), "undersized PARA_SHAPE record"),
                }
                para_id += 1;
            },
            tags::STYLE => {
                if let Some(style) = decode_style(data) {
                    info.styles.styles.insert(style_id, style);
                }
                style_id += 1;
            },
            tags::MEMO_SHAPE => {
                if let Some(shape) = decode_memo_shape(data) {
                    info.styles.memo_shapes.insert(memo_shape_id, shape);
                }
                memo_shape_id += 1;
            },
            other => tracing::trace!(tag = other, "DocInfo record ignored"),
        }
    }

    info.styles.resolve_font_faces();
    info
}

/// Language group and per-language id of the `n`-th face name record.
fn font_slot_for(n: u32, counts: &[u32; 7]) -> (Language, u32) {
    let mut start = 0;
    for (lang, &count) in Language::ALL.iter().zip(counts) {
        if n < start + count {
            return (*lang, n - start);
        }
        start += count;
    }
    // Without usable counts everything lands in the Hangul group
    (Language::Hangul, n - start)
}

fn decode_bin_item(data: &[u8]) -> Option<BinItem> {
    let mut c = ByteCursor::new(data);
    let attr = c.u16().ok()?;
    let kind = match attr & 0xF {
        0 => BinKind::Link,
        2 => BinKind::Storage,
        _ => BinKind::Embedding,
    };
    let compression = match (attr >> 4) & 0x3 {
        1 => BinCompression::Compress,
        2 => BinCompression::Store,
        _ => BinCompression::Default,
    };
    let mut item = BinItem {
        kind,
        compression,
        ..Default::default()
    };
    match kind {
        BinKind::Link => {
            let absolute = c.utf16_string().ok()?;
            let relative = c.utf16_string().unwrap_or_default();
            item.link_path = Some(if absolute.is_empty() { relative } else { absolute });
        },
        BinKind::Embedding | BinKind::Storage => {
            item.storage_id = c.u16().ok()?;
            if kind == BinKind::Embedding {
                item.extension = c.utf16_string().unwrap_or_default().to_ascii_lowercase();
            }
        },
    }
    Some(item)
}

fn decode_face_name(data: &[u8]) -> Option<Font> {
    let mut c = ByteCursor::new(data);
    let attr = c.u8().ok()?;
    let name = c.utf16_string().ok()?;
    let mut font = Font {
        name,
        ..Default::default()
    };
    if attr & 0x80 != 0 {
        c.skip(1);
        font.alternate = c.utf16_string().ok().filter(|s| !s.is_empty());
    }
    if attr & 0x40 != 0 {
        c.skip(10);
    }
    if attr & 0x20 != 0 {
        font.default_name = c.utf16_string().ok().filter(|s| !s.is_empty());
    }
    Some(font)
}

fn border_line(c: &mut ByteCursor<'_>) -> Option<BorderLine> {
    let shape = c.u8().ok()?;
    let width = c.u8().ok()?;
    let color = c.u32().ok()?;
    Some(BorderLine {
        shape: LineShape::from_border_code(shape),
        width_mm: BORDER_WIDTH_MM[(width as usize).min(BORDER_WIDTH_MM.len() - 1)],
        color: Color::from_colorref(color),
    })
}

pub(crate) fn decode_border_fill(data: &[u8]) -> Option<BorderFill> {
    if data.len() < BORDER_FILL_MIN {
        return None;
    }
    let mut c = ByteCursor::new(data);
    let attr = c.u16().ok()?;
    let mut fill = BorderFill {
        three_d: attr & 0x1 != 0,
        shadow: attr & 0x2 != 0,
        left: border_line(&mut c)?,
        right: border_line(&mut c)?,
        top: border_line(&mut c)?,
        bottom: border_line(&mut c)?,
        diagonal: border_line(&mut c)?,
        fills: Vec::new(),
    };
    fill.fills = decode_fill(&mut c);
    Some(fill)
}

/// Fill description shared by border fills and drawing objects.
pub(crate) fn decode_fill(c: &mut ByteCursor<'_>) -> Vec<Fill> {
    let mut fills = Vec::new();
    let Ok(kind) = c.u32() else {
        return fills;
    };
    if kind & 0x1 != 0 {
        let (Ok(background), Ok(pattern_color), Ok(pattern)) = (c.u32(), c.u32(), c.i32()) else {
            return fills;
        };
        fills.push(Fill::Solid {
            background: Color::from_colorref(background),
            pattern_color: Color::from_colorref(pattern_color),
            pattern: (pattern >= 0).then_some(pattern),
        });
    }
    if kind & 0x4 != 0 {
        let Some(gradient) = decode_gradient(c) else {
            return fills;
        };
        fills.push(gradient);
    }
    if kind & 0x2 != 0 {
        let mode = c.u8().unwrap_or(0);
        c.skip(3); // brightness, contrast, effect
        if let Ok(bin_id) = c.u16() {
            fills.push(Fill::Image {
                bin_id: format!("BIN{:04X}", bin_id),
                mode: image_fill_mode(mode).to_string(),
            });
        }
    }
    fills
}

fn decode_gradient(c: &mut ByteCursor<'_>) -> Option<Fill> {
    let gradient_kind = c.i16().ok()? as i32;
    let angle = c.i16().ok()? as i32;
    let center_x = c.i16().ok()? as i32;
    let center_y = c.i16().ok()? as i32;
    c.skip(2); // step
    let count = c.i16().ok()?.clamp(0, 64) as usize;
    if count > 2 {
        c.skip(count * 4);
    }
    let colors = (0..count)
        .map_while(|_| c.u32().ok())
        .filter_map(Color::from_colorref)
        .collect();
    Some(Fill::Gradient {
        gradient_kind,
        angle,
        center_x,
        center_y,
        colors,
    })
}

fn image_fill_mode(code: u8) -> &'static str {
    match code {
        0 => "TILE",
        1 => "TILE_HORZ_TOP",
        2 => "TILE_HORZ_BOTTOM",
        3 => "TILE_VERT_LEFT",
        4 => "TILE_VERT_RIGHT",
        5 => "TOTAL",
        6 => "CENTER",
        7 => "CENTER_TOP",
        8 => "CENTER_BOTTOM",
        9 => "LEFT_CENTER",
        10 => "LEFT_TOP",
        11 => "LEFT_BOTTOM",
        12 => "RIGHT_CENTER",
        13 => "RIGHT_TOP",
        14 => "RIGHT_BOTTOM",
        15 => "ZOOM",
        _ => "TOTAL",
    }
}

/// Decode a `CHAR_SHAPE` record.
///
/// Layout: seven u16 font ids, seven u8 ratios, seven i8 spacings, seven u8
/// relative sizes, seven i8 offsets, i32 base size, u32 attributes, two i8
/// shadow gaps, then text, underline, shade and shadow COLORREFs, the
/// border fill id and (newer files) the strikeout color.
pub(crate) fn decode_char_shape(data: &[u8]) -> Option<CharStyle> {
    if data.len() < CHAR_SHAPE_MIN {
        return None;
    }
    let mut style = CharStyle::default();
    for i in 0..7 {
        style.fonts[i] = FontSlot {
            font_id: read_u16_le(data, i * 2).ok()?,
            face: None,
            ratio: data[14 + i],
            spacing: data[21 + i] as i8,
            relative_size: data[28 + i],
            offset: data[35 + i] as i8,
        };
    }
    style.base_size = read_i32_le(data, 42).ok()?;
    let attr = read_u32_le(data, 46).ok()?;
    let shadow_x = data[50] as i8;
    let shadow_y = data[51] as i8;
    let text_color = read_u32_le(data, 52).ok()?;
    let underline_color = read_u32_le(data, 56).ok()?;
    let shade_color = read_u32_le(data, 60).ok()?;
    let shadow_color = read_u32_le(data, 64).ok()?;

    style.italic = attr & 0x1 != 0;
    style.bold = attr & 0x2 != 0;
    let underline_kind = match (attr >> 2) & 0x3 {
        0 => None,
        2 => Some(UnderlineKind::Center),
        3 => Some(UnderlineKind::Top),
        _ => Some(UnderlineKind::Bottom),
    };
    style.underline = underline_kind.map(|kind| Underline {
        kind,
        shape: LineShape::from_char_shape_code(((attr >> 4) & 0xF) as u8),
        color: Color::from_colorref(underline_color),
    });
    style.outline = (attr >> 8) & 0x7 != 0;
    style.shadow = match (attr >> 11) & 0x3 {
        0 => None,
        kind => Some(Shadow {
            continuous: kind == 2,
            offset_x: shadow_x,
            offset_y: shadow_y,
            color: Color::from_colorref(shadow_color),
        }),
    };
    style.emboss = attr & (1 << 13) != 0;
    style.engrave = attr & (1 << 14) != 0;
    style.superscript = attr & (1 << 15) != 0;
    style.subscript = attr & (1 << 16) != 0;
    if (attr >> 18) & 0x7 != 0 {
        let color = read_u32_le(data, 70).ok().unwrap_or(text_color);
        style.strikeout = Some(Strikeout {
            shape: LineShape::from_char_shape_code(((attr >> 26) & 0xF) as u8),
            color: Color::from_colorref(color),
        });
    }
    style.text_color = Color::from_colorref(text_color);
    // White shading is the "no shade" default
    style.shade_color = Color::from_colorref(shade_color).filter(|c| *c != Color::rgb(255, 255, 255));
    style.border_fill_id = read_u16_le(data, 68).ok().filter(|&id| id > 0).map(u32::from);
    Some(style)
}

/// Decode a `PARA_SHAPE` record.
pub(crate) fn decode_para_shape(data: &[u8]) -> Option<ParaStyle> {
    if data.len() < PARA_SHAPE_MIN {
        return None;
    }
    let attr = read_u32_le(data, 0).ok()?;
    let heading = HeadingKind::from_code((attr >> 23) & 0x3);
    let heading_id = read_u16_le(data, 30).ok()? as u32;

    // Files from 5.0.2.5 on carry the line spacing kind and value separately
    let (line_spacing_unit, line_spacing) = match (read_u32_le(data, 46), read_u32_le(data, 50)) {
        (Ok(attr3), Ok(value)) => (LineSpacingUnit::from_code(attr3 & 0x1F), value as i32),
        _ => (
            LineSpacingUnit::from_code(attr & 0x3),
            read_i32_le(data, 24).ok()?,
        ),
    };

    Some(ParaStyle {
        alignment: Alignment::from_code((attr >> 2) & 0x7),
        margin_left: read_i32_le(data, 4).ok()?,
        margin_right: read_i32_le(data, 8).ok()?,
        indent: read_i32_le(data, 12).ok()?,
        spacing_before: read_i32_le(data, 16).ok()?,
        spacing_after: read_i32_le(data, 20).ok()?,
        line_spacing,
        line_spacing_unit,
        widow_orphan: attr & (1 << 16) != 0,
        keep_with_next: attr & (1 << 17) != 0,
        keep_lines: attr & (1 << 18) != 0,
        page_break_before: attr & (1 << 19) != 0,
        heading,
        heading_id: (heading != HeadingKind::None && heading_id > 0).then_some(heading_id),
        outline_level: (heading != HeadingKind::None).then(|| ((attr >> 25) & 0x7) as u8 + 1),
        tab_def_id: Some(read_u16_le(data, 28).ok()? as u32),
        border_fill_id: read_u16_le(data, 32).ok().filter(|&id| id > 0).map(u32::from),
    })
}

fn decode_tab_def(data: &[u8]) -> Option<TabDef> {
    let mut c = ByteCursor::new(data);
    let attr = c.u32().ok()?;
    let count = c.i32().ok()?.clamp(0, 256) as usize;
    let stops = (0..count)
        .map_while(|_| {
            let position = c.i32().ok()?;
            let kind = c.u8().ok()?;
            let leader = c.u8().ok()?;
            c.skip(2);
            Some(TabStop {
                position,
                kind: TabKind::from_code(kind),
                leader: LineShape::from_border_code(leader),
            })
        })
        .collect();
    Some(TabDef {
        auto_tab_left: attr & 0x1 != 0,
        auto_tab_right: attr & 0x2 != 0,
        stops,
    })
}

/// Paragraph head info: u32 attributes, two i16 widths, u32 char shape id.
fn decode_para_head(c: &mut ByteCursor<'_>, level: u8) -> Option<ParaHead> {
    let attr = c.u32().ok()?;
    c.skip(4);
    let char_shape = c.u32().ok()?;
    Some(ParaHead {
        level,
        start: 1,
        number_format: number_format_name((attr >> 5) & 0xF),
        template: String::new(),
        // 0xFFFFFFFF means "same as the paragraph"
        char_style_id: (char_shape != u32::MAX).then_some(char_shape),
    })
}

fn decode_numbering(data: &[u8]) -> Numbering {
    let mut c = ByteCursor::new(data);
    let mut levels = Vec::with_capacity(7);
    for level in 1..=7u8 {
        let Some(mut head) = decode_para_head(&mut c, level) else {
            break;
        };
        match c.utf16_string() {
            Ok(template) => head.template = template,
            Err(_) => {
                levels.push(head);
                break;
            },
        }
        levels.push(head);
    }
    let start = c.u16().map(u32::from).unwrap_or(1);
    for head in levels.iter_mut() {
        head.start = c.u32().unwrap_or(start);
    }
    Numbering { start, levels }
}

fn decode_bullet(data: &[u8]) -> Bullet {
    let mut c = ByteCursor::new(data);
    let head = decode_para_head(&mut c, 1);
    let char = c
        .u16()
        .ok()
        .and_then(|u| char::from_u32(u as u32))
        .map(String::from)
        .unwrap_or_default();
    let image_id = c.i32().unwrap_or(0);
    Bullet {
        char,
        use_image: image_id > 0,
        char_style_id: head.and_then(|h| h.char_style_id),
    }
}

fn decode_style(data: &[u8]) -> Option<StyleDef> {
    let mut c = ByteCursor::new(data);
    let name = c.utf16_string().ok()?;
    let english = c.utf16_string().ok()?;
    let attr = c.u8().ok()?;
    let next = c.u8().ok()?;
    c.skip(2); // language id
    let para_shape = c.u16().ok()?;
    let char_shape = c.u16().ok()?;
    Some(StyleDef {
        name,
        english_name: (!english.is_empty()).then_some(english),
        kind: if attr & 0x7 == 1 {
            StyleKind::Character
        } else {
            StyleKind::Paragraph
        },
        para_style_id: Some(para_shape as u32),
        char_style_id: Some(char_shape as u32),
        next_style_id: Some(next as u32),
    })
}

fn decode_memo_shape(data: &[u8]) -> Option<MemoShape> {
    let mut c = ByteCursor::new(data);
    let width = c.u32().ok()?;
    let line_shape = c.u8().ok()?;
    c.skip(1);
    let line_color = c.u32().ok()?;
    let fill_color = c.u32().ok()?;
    let active_color = c.u32().ok()?;
    Some(MemoShape {
        width,
        line_shape: LineShape::from_border_code(line_shape),
        line_color: Color::from_colorref(line_color),
        fill_color: Color::from_colorref(fill_color),
        active_color: Color::from_colorref(active_color),
    })
}
