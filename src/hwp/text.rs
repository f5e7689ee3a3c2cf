//! Paragraph text decoding and run assembly.
//!
//! `PARA_TEXT` holds UTF-16 units. Units below `0x20` are controls:
//!
//! - char controls take one unit (line break, paragraph break, hyphen,
//!   non-breaking and fixed-width spaces),
//! - inline controls (tab, field end, ...) take eight units,
//! - extended controls (tables, shapes, notes, fields, ...) take eight
//!   units and each pairs with the next `CTRL_HEADER` of the paragraph.
//!
//! Character positions count units, so the unit after an eight-unit control
//! sits at the control's position plus eight.

use crate::common::binary::utf16_units;
use crate::model::{
    CharStyle, Color, FieldKind, LineShape, NoteKind, Run, StyleTables, hyperlink_target,
};
use smallvec::SmallVec;

/// Units occupied by an inline or extended control
pub const CONTROL_WIDTH: u32 = 8;

pub const LINE_BREAK: u16 = 10;
pub const PARA_BREAK: u16 = 13;
pub const TAB: u16 = 9;
pub const FIELD_END: u16 = 4;
pub const FIELD_BEGIN: u16 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum TextItem {
    Char(char),
    Tab { width: u32, leader: LineShape },
    /// Extended control; `ctrl` is the id found in the placeholder units
    Control { code: u16, ctrl: u32 },
    FieldEnd,
}

#[inline]
fn is_extended(code: u16) -> bool {
    matches!(code, 1..=3 | 11 | 12 | 14..=18 | 21..=23)
}

#[inline]
fn is_inline(code: u16) -> bool {
    matches!(code, 4..=9 | 19 | 20)
}

/// Decode a `PARA_TEXT` payload into positioned items.
///
/// Decoding stops at the paragraph break or at the end of the payload.
pub fn decode_para_text(data: &[u8]) -> Vec<(u32, TextItem)> {
    let units = utf16_units(data);
    let mut items = Vec::with_capacity(units.len());
    let mut i = 0usize;
    while i < units.len() {
        let pos = i as u32;
        let unit = units[i];
        if unit >= 0x20 {
            let (ch, width) = decode_scalar(&units[i..]);
            items.push((pos, TextItem::Char(ch)));
            i += width;
            continue;
        }
        if is_extended(unit) || is_inline(unit) {
            let placeholder = |k: usize| units.get(i + k).copied().unwrap_or(0);
            match unit {
                TAB => items.push((
                    pos,
                    TextItem::Tab {
                        width: placeholder(1) as u32 | ((placeholder(2) as u32) << 16),
                        leader: LineShape::from_border_code((placeholder(3) & 0xFF) as u8),
                    },
                )),
                FIELD_END => items.push((pos, TextItem::FieldEnd)),
                code if is_extended(code) => items.push((
                    pos,
                    TextItem::Control {
                        code,
                        ctrl: ((placeholder(2) as u32) << 16) | placeholder(1) as u32,
                    },
                )),
                _ => {},
            }
            i += CONTROL_WIDTH as usize;
            continue;
        }
        match unit {
            PARA_BREAK => break,
            LINE_BREAK => items.push((pos, TextItem::Char('\n'))),
            24 => items.push((pos, TextItem::Char('\u{AD}'))),
            30 => items.push((pos, TextItem::Char('\u{A0}'))),
            31 => items.push((pos, TextItem::Char('\u{2007}'))),
            _ => {},
        }
        i += 1;
    }
    items
}

/// Decode one scalar, pairing surrogates. Unpaired surrogates become U+FFFD.
fn decode_scalar(units: &[u16]) -> (char, usize) {
    let first = units[0];
    if (0xD800..0xDC00).contains(&first)
        && let Some(&second) = units.get(1)
        && (0xDC00..0xE000).contains(&second)
    {
        let code = 0x10000 + (((first as u32) - 0xD800) << 10) + ((second as u32) - 0xDC00);
        return (char::from_u32(code).unwrap_or('\u{FFFD}'), 2);
    }
    (char::from_u32(first as u32).unwrap_or('\u{FFFD}'), 1)
}

/// Character shape applying at `pos`: the last marker starting at or before it.
///
/// # Examples
///
/// ```
/// use hwpdoc::hwp::text::resolve_char_shape;
/// let markers = [(0, 10), (5, 11), (9, 12)];
/// assert_eq!(resolve_char_shape(&markers, 7), Some(11));
/// assert_eq!(resolve_char_shape(&markers, 9), Some(12));
/// ```
pub fn resolve_char_shape(markers: &[(u32, u32)], pos: u32) -> Option<u32> {
    let idx = markers.partition_point(|&(start, _)| start <= pos);
    idx.checked_sub(1).map(|i| markers[i].1)
}

/// Information about an extended control needed while assembling runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ParaControl {
    Field {
        kind: FieldKind,
        command: String,
        /// Section-local memo id for memo fields
        memo_id: Option<u32>,
    },
    Note {
        kind: NoteKind,
        number: u32,
    },
    Other,
}

/// Highlighted character range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight {
    pub start: u32,
    pub end: u32,
    pub color: Color,
}

pub struct RunContext<'a> {
    pub styles: &'a StyleTables,
    /// Sorted `(position, char shape id)` markers
    pub markers: &'a [(u32, u32)],
    pub highlights: &'a [Highlight],
    /// Extended controls of the paragraph in order
    pub controls: &'a [ParaControl],
}

#[derive(Debug, Clone, PartialEq, Default)]
struct RunKey {
    style_id: Option<u32>,
    highlight: Option<Color>,
    hyperlink: Option<String>,
    memo_id: Option<u32>,
}

enum OpenField {
    Hyperlink,
    Memo,
    Plain,
}

struct RunBuilder<'a> {
    ctx: &'a RunContext<'a>,
    runs: Vec<Run>,
    text: String,
    key: RunKey,
    hyperlink: Option<String>,
    memo_id: Option<u32>,
}

impl<'a> RunBuilder<'a> {
    fn style(&self, id: Option<u32>) -> Option<CharStyle> {
        id.and_then(|id| self.ctx.styles.char_style(id)).cloned()
    }

    fn key_at(&self, pos: u32) -> RunKey {
        RunKey {
            style_id: resolve_char_shape(self.ctx.markers, pos),
            highlight: self
                .ctx
                .highlights
                .iter()
                .find(|h| h.start <= pos && pos < h.end)
                .map(|h| h.color),
            hyperlink: self.hyperlink.clone(),
            memo_id: self.memo_id,
        }
    }

    fn decorate(&self, mut run: Run, key: &RunKey) -> Run {
        run.set_style(key.style_id, self.style(key.style_id));
        run.highlight = key.highlight;
        run.hyperlink = key.hyperlink.clone();
        run.memo_id = key.memo_id;
        run
    }

    fn flush(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        let run = self.decorate(Run::text(text), &self.key.clone());
        self.runs.push(run);
    }

    fn push_char(&mut self, pos: u32, ch: char) {
        let key = self.key_at(pos);
        if key != self.key {
            self.flush();
            self.key = key;
        }
        self.text.push(ch);
    }

    fn push_special(&mut self, pos: u32, run: Run) {
        self.flush();
        let key = self.key_at(pos);
        let run = self.decorate(run, &key);
        self.key = key;
        self.runs.push(run);
    }
}

/// Assemble runs from decoded text items.
///
/// A paragraph without visible text yields one empty run carrying the first
/// character shape.
pub fn build_runs(items: &[(u32, TextItem)], ctx: &RunContext<'_>) -> Vec<Run> {
    let mut b = RunBuilder {
        ctx,
        runs: Vec::new(),
        text: String::new(),
        key: RunKey::default(),
        hyperlink: None,
        memo_id: None,
    };
    b.key = b.key_at(0);
    let mut controls = ctx.controls.iter();
    let mut open_fields: SmallVec<[OpenField; 4]> = SmallVec::new();

    for (pos, item) in items {
        let pos = *pos;
        match item {
            TextItem::Char(ch) => b.push_char(pos, *ch),
            TextItem::Tab { width, leader } => b.push_special(pos, Run::tab(*width, *leader)),
            TextItem::FieldEnd => match open_fields.pop() {
                Some(OpenField::Hyperlink) => {
                    b.flush();
                    b.hyperlink = None;
                },
                Some(OpenField::Memo) => {
                    b.flush();
                    b.memo_id = None;
                },
                Some(OpenField::Plain) | None => {},
            },
            TextItem::Control { code, .. } => {
                let control = controls.next();
                match (code, control) {
                    (_, Some(ParaControl::Note { kind, number })) => {
                        b.push_special(pos, Run::note_ref(*kind, *number));
                    },
                    (
                        &FIELD_BEGIN,
                        Some(ParaControl::Field {
                            kind,
                            command,
                            memo_id,
                        }),
                    ) => match kind {
                        FieldKind::Hyperlink => {
                            b.flush();
                            b.hyperlink = Some(hyperlink_target(command));
                            open_fields.push(OpenField::Hyperlink);
                        },
                        FieldKind::Memo => {
                            b.flush();
                            b.memo_id = *memo_id;
                            open_fields.push(OpenField::Memo);
                        },
                        other => {
                            b.push_special(pos, Run::field(other.clone(), command.clone()));
                            open_fields.push(OpenField::Plain);
                        },
                    },
                    (&FIELD_BEGIN, _) => open_fields.push(OpenField::Plain),
                    _ => {},
                }
            },
        }
    }
    b.flush();

    if b.runs.is_empty() {
        let key = b.key_at(0);
        let run = b.decorate(Run::default(), &key);
        b.runs.push(run);
    }
    b.runs
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{control_units, tab_units, text_units, units_bytes};
    use super::*;
    use crate::model::RunKind;

    fn styles_with(ids: &[u32]) -> StyleTables {
        let mut styles = StyleTables::new();
        for &id in ids {
            styles.char_styles.insert(
                id,
                CharStyle {
                    base_size: 1000 + id as i32,
                    ..Default::default()
                },
            );
        }
        styles
    }

    fn ctx<'a>(
        styles: &'a StyleTables,
        markers: &'a [(u32, u32)],
        controls: &'a [ParaControl],
    ) -> RunContext<'a> {
        RunContext {
            styles,
            markers,
            highlights: &[],
            controls,
        }
    }

    #[test]
    fn test_char_shape_overlay() {
        let markers = [(0, 1), (5, 2), (9, 3)];
        assert_eq!(resolve_char_shape(&markers, 7), Some(2));
        assert_eq!(resolve_char_shape(&markers, 0), Some(1));
        assert_eq!(resolve_char_shape(&markers, 100), Some(3));
        assert_eq!(resolve_char_shape(&[(3, 1)], 0), None);
        assert_eq!(resolve_char_shape(&[], 0), None);
    }

    #[test]
    fn test_plain_text_single_run() {
        let items = decode_para_text(&units_bytes(&text_units("AB")));
        let styles = styles_with(&[0]);
        let runs = build_runs(&items, &ctx(&styles, &[(0, 0)], &[]));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "AB");
        assert_eq!(runs[0].char_style_id, Some(0));
        assert_eq!(runs[0].style.as_ref().map(|s| s.base_size), Some(1000));
    }

    #[test]
    fn test_tab_width_and_position() {
        let mut units: Vec<u16> = "A".encode_utf16().collect();
        units.extend(tab_units(4000, 3));
        units.extend(text_units("B"));
        let items = decode_para_text(&units_bytes(&units));
        assert_eq!(
            items[1],
            (
                1,
                TextItem::Tab {
                    width: 4000,
                    leader: LineShape::Dot
                }
            )
        );
        // the character after the tab sits eight units further
        assert_eq!(items[2], (9, TextItem::Char('B')));

        let styles = StyleTables::new();
        let runs = build_runs(&items, &ctx(&styles, &[], &[]));
        assert_eq!(runs.len(), 3);
        assert_eq!(
            runs[1].kind,
            RunKind::Tab {
                width: 4000,
                leader: LineShape::Dot
            }
        );
        assert_eq!(runs[1].text, "\t");
    }

    #[test]
    fn test_runs_split_at_markers() {
        let items = decode_para_text(&units_bytes(&text_units("Hello World")));
        let styles = styles_with(&[1, 2]);
        let runs = build_runs(&items, &ctx(&styles, &[(0, 1), (6, 2)], &[]));
        let texts: Vec<_> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["Hello ", "World"]);
        assert_eq!(runs[1].char_style_id, Some(2));
    }

    #[test]
    fn test_char_controls() {
        let units = [0x41, LINE_BREAK, 24, 30, 31, 0x42, PARA_BREAK, 0x43];
        let items = decode_para_text(&units_bytes(&units));
        let text: String = items
            .iter()
            .filter_map(|(_, item)| match item {
                TextItem::Char(c) => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(text, "A\n\u{AD}\u{A0}\u{2007}B");
    }

    #[test]
    fn test_surrogate_pairs_count_two_units() {
        let items = decode_para_text(&units_bytes(&text_units("😀x")));
        assert_eq!(items[0], (0, TextItem::Char('😀')));
        assert_eq!(items[1], (2, TextItem::Char('x')));
    }

    #[test]
    fn test_hyperlink_and_note_controls() {
        let mut units: Vec<u16> = Vec::new();
        units.extend(control_units(FIELD_BEGIN, 0));
        units.extend("link".encode_utf16());
        units.extend(control_units(FIELD_END, 0));
        units.extend(control_units(17, 0));
        units.extend(text_units("."));
        let items = decode_para_text(&units_bytes(&units));

        let controls = [
            ParaControl::Field {
                kind: FieldKind::Hyperlink,
                command: "https\\://example.com;1;0;0;".to_string(),
                memo_id: None,
            },
            ParaControl::Note {
                kind: NoteKind::Footnote,
                number: 1,
            },
        ];
        let styles = StyleTables::new();
        let runs = build_runs(&items, &ctx(&styles, &[], &controls));
        assert_eq!(runs[0].text, "link");
        assert_eq!(runs[0].hyperlink.as_deref(), Some("https://example.com"));
        assert!(runs[1].is_note_ref());
        assert_eq!(runs[1].hyperlink, None);
        assert_eq!(runs[2].text, ".");
    }

    #[test]
    fn test_memo_field_tags_runs() {
        let mut units: Vec<u16> = "a".encode_utf16().collect();
        units.extend(control_units(FIELD_BEGIN, 0));
        units.extend("bc".encode_utf16());
        units.extend(control_units(FIELD_END, 0));
        units.extend(text_units("d"));
        let items = decode_para_text(&units_bytes(&units));
        let controls = [ParaControl::Field {
            kind: FieldKind::Memo,
            command: String::new(),
            memo_id: Some(0),
        }];
        let styles = StyleTables::new();
        let runs = build_runs(&items, &ctx(&styles, &[], &controls));
        let tagged: Vec<_> = runs.iter().map(|r| (r.text.as_str(), r.memo_id)).collect();
        assert_eq!(tagged, [("a", None), ("bc", Some(0)), ("d", None)]);
    }

    #[test]
    fn test_empty_paragraph_has_one_run() {
        let styles = styles_with(&[4]);
        let runs = build_runs(&[], &ctx(&styles, &[(0, 4)], &[]));
        assert_eq!(runs.len(), 1);
        assert!(runs[0].text.is_empty());
        assert_eq!(runs[0].char_style_id, Some(4));
    }

    #[test]
    fn test_highlight_ranges_split_runs() {
        let items = decode_para_text(&units_bytes(&text_units("abcd")));
        let styles = StyleTables::new();
        let highlights = [Highlight {
            start: 1,
            end: 3,
            color: Color::rgb(255, 255, 0),
        }];
        let context = RunContext {
            styles: &styles,
            markers: &[],
            highlights: &highlights,
            controls: &[],
        };
        let runs = build_runs(&items, &context);
        let texts: Vec<_> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["a", "bc", "d"]);
        assert_eq!(runs[1].highlight, Some(Color::rgb(255, 255, 0)));
    }
}
