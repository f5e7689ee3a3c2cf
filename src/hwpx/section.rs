//! Section part decoder.
//!
//! Decoding runs in five steps:
//! 1. side-channel subtrees (memo groups, note bodies, headers and footers)
//!    are cut out and replaced with `<hp:sideRef idx="N"/>` placeholders;
//! 2. paragraph and object spans are extracted with the balanced scanner;
//! 3. paragraphs starting inside an object are left to that object;
//! 4. the remaining spans are sorted by offset;
//! 5. each span is decoded by the sub-decoder for its tag.
//!
//! Placeholders are resolved where the run scanner meets them, so notes are
//! numbered in reading order and headers land next to their paragraph.

use super::attrs::{Attrs, leaf_text};
use super::package::parse_datetime;
use super::scanner::{TagSpan, extract_balanced_matching, extract_balanced_tags};
use super::shape::is_object_tag;
use crate::model::{Element, Memo, Note, Paragraph, Section, StyleTables};
use chrono::{DateTime, Utc};

pub(crate) const SIDE_REF: &str = "hp:sideRef";

/// Subtrees decoded out of band.
#[inline]
pub(crate) fn is_side_channel(name: &str) -> bool {
    matches!(
        name,
        "hp:memogroup" | "hp:footNote" | "hp:endNote" | "hp:header" | "hp:footer"
    )
}

/// Paragraphs at the top level of a paragraph list, in document order.
///
/// Paragraphs inside objects and side channels belong to those. The
/// decoder and [`HwpxWriter`](super::HwpxWriter) share this so a
/// paragraph's `source_index` addresses the same span on both sides.
pub(crate) fn top_level_paragraphs(xml: &str) -> Vec<TagSpan> {
    let barriers = extract_balanced_matching(xml, |n| is_object_tag(n) || is_side_channel(n));
    extract_balanced_tags(xml, "hp:p")
        .into_iter()
        .filter(|p| {
            let nested = barriers.iter().any(|b| b.strictly_contains(p.start));
            if nested {
                tracing::trace!(offset = p.start, "paragraph nested in an object");
            }
            !nested
        })
        .collect()
}

/// A stripped side-channel subtree.
#[derive(Debug)]
pub(crate) struct SideChannel {
    pub(crate) name: String,
    /// The whole element, markup included; taken when decoded
    pub(crate) xml: Option<String>,
}

/// Cut side channels out of `xml`.
pub(crate) fn strip_side_channels(xml: &str) -> (String, Vec<SideChannel>) {
    let spans = extract_balanced_matching(xml, is_side_channel);
    let mut out = String::with_capacity(xml.len());
    let mut side = Vec::with_capacity(spans.len());
    let mut last = 0;
    for span in spans {
        out.push_str(&xml[last..span.start]);
        out.push_str(&format!(r#"<{} idx="{}"/>"#, SIDE_REF, side.len()));
        side.push(SideChannel {
            name: span.name(xml).to_string(),
            xml: Some(span.as_str(xml).to_string()),
        });
        last = span.end;
    }
    out.push_str(&xml[last..]);
    (out, side)
}

/// Author and time carried by one `MEMO` field, in encounter order.
#[derive(Debug, Default)]
pub(crate) struct MemoField {
    pub(crate) author: Option<String>,
    pub(crate) timestamp: Option<DateTime<Utc>>,
    /// Memo body held by the field itself
    pub(crate) paragraphs: Vec<Paragraph>,
}

enum Block {
    Paragraph(u32, TagSpan),
    Object(TagSpan),
}

impl Block {
    fn start(&self) -> usize {
        match self {
            Block::Paragraph(_, span) | Block::Object(span) => span.start,
        }
    }
}

/// Per-section decoding state.
///
/// The paragraph, table and shape sub-decoders are `impl` blocks on this
/// type in their own modules.
pub(crate) struct SectionDecoder<'a> {
    pub(crate) styles: &'a StyleTables,
    pub(crate) include_line_segments: bool,
    pub(crate) section: Section,
    pub(crate) notes: Vec<Note>,
    pub(crate) side: Vec<SideChannel>,
    pub(crate) footnotes: u32,
    pub(crate) endnotes: u32,
    pub(crate) memo_fields: Vec<MemoField>,
    page_seen: bool,
}

impl<'a> SectionDecoder<'a> {
    pub(crate) fn new(index: usize, styles: &'a StyleTables, include_line_segments: bool) -> Self {
        Self {
            styles,
            include_line_segments,
            section: Section::new(index),
            notes: Vec::new(),
            side: Vec::new(),
            footnotes: 0,
            endnotes: 0,
            memo_fields: Vec::new(),
            page_seen: false,
        }
    }

    /// Decode a paragraph list: a section body, cell, caption or note body.
    ///
    /// `body` numbers the top-level paragraphs with their `source_index`.
    pub(crate) fn decode_blocks(&mut self, xml: &str, body: bool) -> Vec<Element> {
        let paragraphs = top_level_paragraphs(xml);
        let objects = extract_balanced_matching(xml, is_object_tag);

        let mut blocks: Vec<Block> = paragraphs
            .iter()
            .enumerate()
            .map(|(i, span)| Block::Paragraph(i as u32, *span))
            .chain(
                objects
                    .iter()
                    .filter(|o| !paragraphs.iter().any(|p| p.strictly_contains(o.start)))
                    .map(|o| Block::Object(*o)),
            )
            .collect();
        blocks.sort_by_key(Block::start);

        let mut out = Vec::with_capacity(blocks.len());
        for block in blocks {
            match block {
                Block::Paragraph(index, span) => {
                    let anchored: Vec<TagSpan> = objects
                        .iter()
                        .filter(|o| span.strictly_contains(o.start))
                        .copied()
                        .collect();
                    let source_index = body.then_some(index);
                    self.decode_paragraph(xml, &span, &anchored, source_index, &mut out);
                },
                Block::Object(span) => out.extend(self.decode_object(xml, &span)),
            }
        }
        out
    }

    /// Elements of the first `hp:subList` in `xml`, with an empty paragraph
    /// standing in for an empty list.
    pub(crate) fn decode_sub_list(&mut self, xml: &str) -> Vec<Element> {
        let mut elements = match super::scanner::first_tag(xml, "hp:subList") {
            Some(list) => self.decode_blocks(list.inner(xml), false),
            None => Vec::new(),
        };
        if elements.is_empty() {
            elements.push(Element::Paragraph(Paragraph::empty()));
        }
        elements
    }

    /// Page geometry from `hp:pagePr`; the first one in the section wins.
    pub(crate) fn apply_page(&mut self, sec_pr: &str) {
        if self.page_seen {
            return;
        }
        let Some(page_pr) = super::scanner::first_tag(sec_pr, "hp:pagePr") else {
            return;
        };
        self.page_seen = true;
        let attrs = Attrs::parse(page_pr.open_tag(sec_pr));
        let page = &mut self.section.page;
        page.width = attrs.u32("width").unwrap_or(page.width);
        page.height = attrs.u32("height").unwrap_or(page.height);
        page.landscape = attrs.get("landscape") == Some("NARROWLY");
        if let Some(margin) = super::scanner::first_tag(page_pr.inner(sec_pr), "hp:margin") {
            let m = Attrs::parse(margin.open_tag(page_pr.inner(sec_pr)));
            page.margins.left = m.i32("left").unwrap_or(page.margins.left);
            page.margins.right = m.i32("right").unwrap_or(page.margins.right);
            page.margins.top = m.i32("top").unwrap_or(page.margins.top);
            page.margins.bottom = m.i32("bottom").unwrap_or(page.margins.bottom);
            page.header_margin = m.u32("header").unwrap_or(page.header_margin);
            page.footer_margin = m.u32("footer").unwrap_or(page.footer_margin);
            page.gutter = m.u32("gutter").unwrap_or(page.gutter);
        }
    }

    /// Build memos from the stripped memo groups and fill in what the
    /// `MEMO` fields know about them.
    fn collect_memos(&mut self) {
        let groups: Vec<String> = self
            .side
            .iter_mut()
            .filter(|s| s.name == "hp:memogroup")
            .filter_map(|s| s.xml.take())
            .collect();
        for group in groups {
            for memo in extract_balanced_tags(&group, "hp:memo") {
                let attrs = Attrs::parse(memo.open_tag(&group));
                let inner = memo.inner(&group);
                let list = super::scanner::first_tag(inner, "hp:paraList")
                    .or_else(|| super::scanner::first_tag(inner, "hp:subList"));
                let paragraphs = match list {
                    Some(list) => into_paragraphs(self.decode_blocks(list.inner(inner), false)),
                    None => Vec::new(),
                };
                let id = self.section.memos.len() as u32;
                self.section.memos.push(Memo {
                    id,
                    memo_shape_id: attrs.u32("memoShapeIDRef"),
                    paragraphs,
                    ..Default::default()
                });
            }
        }

        for (k, field) in std::mem::take(&mut self.memo_fields).into_iter().enumerate() {
            match self.section.memos.get_mut(k) {
                Some(memo) => {
                    memo.author = field.author;
                    memo.timestamp = field.timestamp;
                },
                None if !field.paragraphs.is_empty() => {
                    let id = self.section.memos.len() as u32;
                    self.section.memos.push(Memo {
                        id,
                        author: field.author,
                        timestamp: field.timestamp,
                        paragraphs: field.paragraphs,
                        ..Default::default()
                    });
                },
                None => tracing::trace!(field = k, "memo field without a memo"),
            }
        }
    }

    fn finish(mut self) -> (Section, Vec<Note>) {
        self.collect_memos();
        for side in &self.side {
            if side.xml.is_some() {
                tracing::trace!(tag = %side.name, "side channel never referenced");
            }
        }
        self.section.fill_if_empty();
        self.section.link_memos();
        (self.section, self.notes)
    }
}

/// Memo author and creation time from a field's parameter list.
pub(crate) fn memo_field(params: &str) -> MemoField {
    MemoField {
        author: string_param(params, "Author"),
        timestamp: string_param(params, "CreateDateTime").and_then(|s| parse_datetime(s.trim())),
        paragraphs: Vec::new(),
    }
}

/// Value of `<hp:stringParam name="…">` inside a field's parameters.
pub(crate) fn string_param(xml: &str, name: &str) -> Option<String> {
    extract_balanced_tags(xml, "hp:stringParam")
        .into_iter()
        .find(|p| Attrs::parse(p.open_tag(xml)).get("name") == Some(name))
        .and_then(|p| leaf_text(p.inner(xml)).ok().flatten())
}

pub(crate) fn into_paragraphs(elements: Vec<Element>) -> Vec<Paragraph> {
    elements
        .into_iter()
        .filter_map(|e| match e {
            Element::Paragraph(p) => Some(p),
            other => {
                tracing::trace!(kind = other.kind(), "object dropped from paragraph-only list");
                None
            },
        })
        .collect()
}

/// Decode one `Contents/section{index}.xml` part into a section and the
/// notes referenced from it.
pub fn decode_section(
    xml: &str,
    index: usize,
    styles: &StyleTables,
    include_line_segments: bool,
) -> (Section, Vec<Note>) {
    let resolved = super::scanner::resolve_switches(xml);
    let (body, side) = strip_side_channels(&resolved);
    let mut decoder = SectionDecoder::new(index, styles, include_line_segments);
    decoder.side = side;
    let elements = decoder.decode_blocks(&body, true);
    decoder.section.elements = elements;
    let (section, notes) = decoder.finish();
    tracing::debug!(
        section = index,
        elements = section.elements.len(),
        notes = notes.len(),
        memos = section.memos.len(),
        "decoded section"
    );
    (section, notes)
}

#[cfg(test)]
mod tests {
    use super::super::header::parse_header;
    use super::super::test_support::*;
    use super::*;
    use crate::model::{NoteKind, RunKind};

    fn decode(body: &str) -> (Section, Vec<Note>) {
        let styles = parse_header(HEADER_XML);
        decode_section(&section_xml(body), 0, &styles, true)
    }

    #[test]
    fn test_strip_side_channels() {
        let xml = "<a><hp:footNote><hp:p/></hp:footNote>x<hp:memogroup/></a>";
        let (body, side) = strip_side_channels(xml);
        assert_eq!(body, r#"<a><hp:sideRef idx="0"/>x<hp:sideRef idx="1"/></a>"#);
        assert_eq!(side[0].name, "hp:footNote");
        assert_eq!(side[1].xml.as_deref(), Some("<hp:memogroup/>"));
    }

    #[test]
    fn test_paragraphs_in_order() {
        let (section, notes) = decode(&format!("{}{}", para("하나"), para("둘")));
        assert!(notes.is_empty());
        let texts: Vec<_> = section.paragraphs().map(Paragraph::text).collect();
        assert_eq!(texts, ["하나", "둘"]);
        let first = section.elements[0].as_paragraph().unwrap();
        assert_eq!(first.source_index, Some(0));
        assert_eq!(first.style_name.as_deref(), Some("바탕글"));
        assert!(first.style.is_some());
    }

    #[test]
    fn test_empty_section_gets_paragraph() {
        let (section, _) = decode("");
        assert_eq!(section.elements.len(), 1);
        assert_eq!(section.text(), "");
    }

    #[test]
    fn test_page_and_columns() {
        let run = concat!(
            r#"<hp:secPr id="" textDirection="HORIZONTAL"><hp:pagePr landscape="NARROWLY" width="84188" height="59528" gutterType="LEFT_ONLY">"#,
            r#"<hp:margin header="1000" footer="1100" gutter="0" left="2000" right="2100" top="3000" bottom="3100"/></hp:pagePr></hp:secPr>"#,
            r#"<hp:ctrl><hp:colPr id="" type="BALANCED_NEWSPAPER" layout="LEFT" colCount="2" sameSz="1" sameGap="850"/></hp:ctrl>"#,
            r#"<hp:t>본문</hp:t>"#,
        );
        let (section, _) = decode(&para_with(run));
        assert!(section.page.landscape);
        assert_eq!(section.page.width, 84188);
        assert_eq!(section.page.margins.left, 2000);
        assert_eq!(section.page.footer_margin, 1100);
        let columns = section.columns.as_ref().unwrap();
        assert_eq!(columns.count, 2);
        assert_eq!(columns.gap, 850);
        assert_eq!(section.text(), "본문");
    }

    #[test]
    fn test_footnote_side_channel() {
        let run = format!(
            r#"<hp:t>본문</hp:t><hp:ctrl><hp:footNote number="1" instId="7"><hp:subList>{}</hp:subList></hp:footNote></hp:ctrl><hp:t>뒤</hp:t>"#,
            para("각주 내용")
        );
        let (section, notes) = decode(&para_with(&run));
        assert_eq!(section.elements.len(), 1);
        let p = section.elements[0].as_paragraph().unwrap();
        assert_eq!(p.text(), "본문뒤");
        let marker = p
            .runs
            .iter()
            .find(|r| {
                matches!(
                    r.kind,
                    RunKind::NoteRef {
                        note: NoteKind::Footnote,
                        number: 1
                    }
                )
            })
            .unwrap();
        assert!(marker.style.as_ref().is_some_and(|s| s.superscript));
        assert_eq!(marker.char_style_id, Some(0));
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].text(), "각주 내용");
        // the note body paragraph is not a body paragraph
        assert_eq!(section.paragraphs().count(), 1);
    }

    #[test]
    fn test_header_follows_its_paragraph() {
        let run = format!(
            r#"<hp:ctrl><hp:header id="1" applyPageType="EVEN"><hp:subList>{}</hp:subList></hp:header></hp:ctrl><hp:t>본문</hp:t>"#,
            para("머리말")
        );
        let (section, _) = decode(&para_with(&run));
        let kinds: Vec<_> = section.elements.iter().map(Element::kind).collect();
        assert_eq!(kinds, ["paragraph", "header"]);
        match &section.elements[1] {
            Element::Header(h) => {
                assert_eq!(h.apply_to, crate::model::PageApply::Even);
                assert_eq!(h.elements[0].text(), "머리말");
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_memos_link_by_order() {
        let field = concat!(
            r#"<hp:ctrl><hp:fieldBegin id="1" type="MEMO" name="" editable="1"><hp:parameters cnt="2">"#,
            r#"<hp:stringParam name="Author">홍길동</hp:stringParam><hp:stringParam name="CreateDateTime">2024-03-01 09:30:00</hp:stringParam>"#,
            r#"</hp:parameters></hp:fieldBegin></hp:ctrl><hp:t>표시</hp:t><hp:ctrl><hp:fieldEnd beginIDRef="1"/></hp:ctrl><hp:t> 나머지</hp:t>"#,
        );
        let body = format!(
            r#"{}<hp:memogroup><hp:memo id="m0" memoShapeIDRef="0"><hp:paraList>{}</hp:paraList></hp:memo></hp:memogroup>"#,
            para_with(field),
            para("메모 내용")
        );
        let (section, _) = decode(&body);
        assert_eq!(section.memos.len(), 1);
        let memo = &section.memos[0];
        assert_eq!(memo.author.as_deref(), Some("홍길동"));
        assert_eq!(memo.linked_text, "표시");
        assert_eq!(memo.memo_shape_id, Some(0));
        assert!(memo.timestamp.is_some());
        assert_eq!(memo.paragraphs[0].text(), "메모 내용");
        assert_eq!(section.text(), "표시 나머지");
    }
}
