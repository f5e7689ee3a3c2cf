//! Paragraph and run decoding.
//!
//! A run's content is scanned left to right. Character data is only taken
//! inside `hp:t`; inline markers (tabs, breaks, special spaces, highlight
//! pens, field brackets, side-channel placeholders) turn into text or state
//! changes as they are met. Objects anchored in the paragraph are skipped
//! here and decoded separately.

use super::attrs::Attrs;
use super::scanner::{RawTag, TagKind, TagSpan, children, direct_child, element_at, first_tag, tags};
use super::section::{SIDE_REF, SectionDecoder, memo_field, string_param};
use super::shape::is_object_tag;
use crate::common::xml::unescape_xml;
use crate::model::{
    CharStyle, Color, ColumnDef, ColumnKind, Element, FieldKind, HeaderFooter, LineSegment,
    LineShape, Note, NoteKind, PageApply, Paragraph, Run, StyleTables, hyperlink_target,
};
use smallvec::SmallVec;

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

/// Accumulates runs; consecutive text with the same key is merged.
struct RunAssembler<'s> {
    styles: &'s StyleTables,
    runs: Vec<Run>,
    text: String,
    key: RunKey,
    /// Key applying to the next text
    state: RunKey,
    fields: SmallVec<[OpenField; 4]>,
}

impl<'s> RunAssembler<'s> {
    fn new(styles: &'s StyleTables) -> Self {
        Self {
            styles,
            runs: Vec::new(),
            text: String::new(),
            key: RunKey::default(),
            state: RunKey::default(),
            fields: SmallVec::new(),
        }
    }

    fn style(&self, id: Option<u32>) -> Option<CharStyle> {
        id.and_then(|id| self.styles.char_style(id)).cloned()
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

    fn push_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.state != self.key {
            self.flush();
            self.key = self.state.clone();
        }
        self.text.push_str(s);
    }

    fn push_special(&mut self, run: Run) {
        self.flush();
        self.key = self.state.clone();
        let run = self.decorate(run, &self.key.clone());
        self.runs.push(run);
    }

    fn begin_field(&mut self, kind: FieldKind, command: String, memo_id: Option<u32>) {
        match kind {
            FieldKind::Hyperlink => {
                self.state.hyperlink = Some(hyperlink_target(&command));
                self.fields.push(OpenField::Hyperlink);
            },
            FieldKind::Memo => {
                self.state.memo_id = memo_id;
                self.fields.push(OpenField::Memo);
            },
            other => {
                self.push_special(Run::field(other, command));
                self.fields.push(OpenField::Plain);
            },
        }
    }

    fn end_field(&mut self) {
        match self.fields.pop() {
            Some(OpenField::Hyperlink) => self.state.hyperlink = None,
            Some(OpenField::Memo) => self.state.memo_id = None,
            Some(OpenField::Plain) | None => {},
        }
    }

    /// Finished runs; an empty paragraph keeps one empty run with the
    /// first character style.
    fn finish(mut self, first_style: Option<u32>) -> Vec<Run> {
        self.flush();
        if self.runs.is_empty() {
            let key = RunKey {
                style_id: first_style,
                ..Default::default()
            };
            let run = self.decorate(Run::default(), &key);
            self.runs.push(run);
        }
        self.runs
    }
}

/// Tab leader given either as a border line code or as a line type name.
fn tab_leader(attrs: &Attrs) -> LineShape {
    match attrs.get("leader") {
        None => LineShape::None,
        Some(value) => match atoi_simd::parse::<u8>(value.trim().as_bytes()) {
            Ok(code) => LineShape::from_border_code(code),
            Err(_) => LineShape::from_hwpx_name(value),
        },
    }
}

fn line_segment(attrs: &Attrs) -> LineSegment {
    LineSegment {
        text_start: attrs.u32("textpos").unwrap_or(0),
        vertical_pos: attrs.i32("vertpos").unwrap_or(0),
        line_height: attrs.i32("vertsize").unwrap_or(0),
        text_height: attrs.i32("textheight").unwrap_or(0),
        baseline_gap: attrs.i32("baseline").unwrap_or(0),
        line_spacing: attrs.i32("spacing").unwrap_or(0),
        column_start: attrs.i32("horzpos").unwrap_or(0),
        segment_width: attrs.i32("horzsize").unwrap_or(0),
        flags: attrs.u32("flags").unwrap_or(0),
    }
}

fn column_def(attrs: &Attrs) -> ColumnDef {
    ColumnDef {
        count: attrs.u32("colCount").map_or(1, |n| n.clamp(1, u16::MAX as u32) as u16),
        gap: attrs.u32("sameGap").unwrap_or(0),
        kind: attrs
            .get("type")
            .map_or(ColumnKind::Newspaper, ColumnKind::from_hwpx_name),
        same_width: attrs.flag("sameSz"),
    }
}

impl SectionDecoder<'_> {
    /// Decode one top-level paragraph and its anchored objects into `out`.
    ///
    /// The paragraph is emitted unless it only anchors objects; the objects
    /// follow it in offset order.
    pub(crate) fn decode_paragraph(
        &mut self,
        xml: &str,
        span: &TagSpan,
        anchored: &[TagSpan],
        source_index: Option<u32>,
        out: &mut Vec<Element>,
    ) {
        let attrs = Attrs::parse(span.open_tag(xml));
        let mut assembler = RunAssembler::new(self.styles);
        let mut extras: Vec<(usize, Element)> = Vec::new();
        let mut first_style = None;

        for run in children(xml, span, "hp:run") {
            let style_id = Attrs::parse(run.open_tag(xml)).u32("charPrIDRef");
            first_style = first_style.or(style_id);
            assembler.state.style_id = style_id;
            self.scan_run(run.inner(xml), run.content_start, &mut assembler, &mut extras);
        }

        let para_shape = attrs.u32("paraPrIDRef");
        let style = attrs.u32("styleIDRef");
        let line_segments = if self.include_line_segments {
            direct_child(span.inner(xml), "hp:linesegarray")
                .map(|array| {
                    let inner = array.inner(span.inner(xml));
                    tags(inner)
                        .filter(|t| t.name == "hp:lineseg" && t.kind != TagKind::Close)
                        .map(|t| line_segment(&Attrs::parse(&inner[t.start..t.end])))
                        .collect()
                })
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let paragraph = Paragraph {
            runs: assembler.finish(first_style),
            para_style_id: para_shape,
            style: para_shape.and_then(|id| self.styles.para_style(id)).cloned(),
            style_id: style,
            style_name: style
                .and_then(|id| self.styles.style(id))
                .map(|s| s.name.clone()),
            page_break: attrs.flag("pageBreak"),
            column_break: attrs.flag("columnBreak"),
            line_segments,
            source_index,
        };

        for object in anchored {
            if let Some(element) = self.decode_object(xml, object) {
                extras.push((object.start, element));
            }
        }
        extras.sort_by_key(|(offset, _)| *offset);

        if extras.is_empty() || paragraph.has_visible_content() {
            out.push(Element::Paragraph(paragraph));
        }
        out.extend(extras.into_iter().map(|(_, element)| element));
    }

    /// Scan the content of one `hp:run`. `base` is the absolute offset of
    /// `content` so side-channel elements keep their document position.
    fn scan_run(
        &mut self,
        content: &str,
        base: usize,
        assembler: &mut RunAssembler<'_>,
        extras: &mut Vec<(usize, Element)>,
    ) {
        let mut in_text = 0usize;
        let mut last = 0;
        let mut iter = tags(content);
        while let Some(tag) = iter.next() {
            if in_text > 0 && tag.start > last {
                assembler.push_str(&unescape_xml(&content[last..tag.start]));
            }
            last = tag.end;

            match (tag.name, tag.kind) {
                ("hp:t", TagKind::Open) => in_text += 1,
                ("hp:t", TagKind::Close) => in_text = in_text.saturating_sub(1),
                ("hp:tab", TagKind::Open | TagKind::Empty) => {
                    let attrs = Attrs::parse(&content[tag.start..tag.end]);
                    assembler.push_special(Run::tab(attrs.u32("width").unwrap_or(0), tab_leader(&attrs)));
                },
                ("hp:lineBreak", TagKind::Open | TagKind::Empty) => assembler.push_str("\n"),
                ("hp:hyphen", TagKind::Open | TagKind::Empty) => assembler.push_str("\u{AD}"),
                ("hp:nbSpace", TagKind::Open | TagKind::Empty) => assembler.push_str("\u{A0}"),
                ("hp:fwSpace", TagKind::Open | TagKind::Empty) => assembler.push_str("\u{2007}"),
                ("hp:markpenBegin", TagKind::Open | TagKind::Empty) => {
                    assembler.state.highlight = Attrs::parse(&content[tag.start..tag.end]).color("color");
                },
                ("hp:markpenEnd", TagKind::Open | TagKind::Empty) => assembler.state.highlight = None,
                ("hp:fieldBegin", TagKind::Open | TagKind::Empty) => {
                    let Some(span) = element_at(content, &tag) else {
                        break;
                    };
                    self.begin_field(content, &span, assembler);
                    iter.seek(span.end);
                    last = span.end;
                },
                ("hp:fieldEnd", TagKind::Open | TagKind::Empty) => assembler.end_field(),
                ("hp:secPr", TagKind::Open) => {
                    let Some(span) = element_at(content, &tag) else {
                        break;
                    };
                    self.apply_page(span.as_str(content));
                    iter.seek(span.end);
                    last = span.end;
                },
                ("hp:colPr", TagKind::Open | TagKind::Empty) => {
                    if self.section.columns.is_none() {
                        self.section.columns = Some(column_def(&Attrs::parse(&content[tag.start..tag.end])));
                    }
                },
                ("hp:dutmal", TagKind::Open) => {
                    let Some(span) = element_at(content, &tag) else {
                        break;
                    };
                    let inner = span.inner(content);
                    if let Some(main) = first_tag(inner, "hp:mainText") {
                        assembler.push_str(&unescape_xml(main.inner(inner)));
                    }
                    iter.seek(span.end);
                    last = span.end;
                },
                (SIDE_REF, TagKind::Empty) => {
                    self.resolve_side_ref(&tag, content, base, assembler, extras);
                },
                (name, TagKind::Open) if is_object_tag(name) => {
                    // decoded by the caller from its own span
                    let Some(span) = element_at(content, &tag) else {
                        break;
                    };
                    iter.seek(span.end);
                    last = span.end;
                },
                _ => {},
            }
        }
    }

    fn begin_field(&mut self, content: &str, span: &TagSpan, assembler: &mut RunAssembler<'_>) {
        let attrs = Attrs::parse(span.open_tag(content));
        let kind = FieldKind::from_hwpx_type(attrs.get("type").unwrap_or_default());
        let params = span.inner(content);
        let command = string_param(params, "Command").unwrap_or_default();
        let memo_id = (kind == FieldKind::Memo).then(|| {
            let mut field = memo_field(params);
            if first_tag(params, "hp:subList").is_some() {
                field.paragraphs = super::section::into_paragraphs(self.decode_sub_list(params));
            }
            self.memo_fields.push(field);
            self.memo_fields.len() as u32 - 1
        });
        assembler.begin_field(kind, command, memo_id);
    }

    fn resolve_side_ref(
        &mut self,
        tag: &RawTag<'_>,
        content: &str,
        base: usize,
        assembler: &mut RunAssembler<'_>,
        extras: &mut Vec<(usize, Element)>,
    ) {
        let Some(idx) = Attrs::parse(&content[tag.start..tag.end]).u32("idx") else {
            return;
        };
        let Some(side) = self.side.get_mut(idx as usize) else {
            tracing::trace!(idx, "dangling side-channel placeholder");
            return;
        };
        if side.name == "hp:memogroup" {
            return;
        }
        let (Some(xml), name) = (side.xml.take(), side.name.clone()) else {
            return;
        };
        let Some(root) = first_tag(&xml, &name) else {
            return;
        };
        let attrs = Attrs::parse(root.open_tag(&xml));
        let elements = self.decode_sub_list(root.inner(&xml));

        match name.as_str() {
            "hp:footNote" | "hp:endNote" => {
                let kind = if name == "hp:footNote" {
                    self.footnotes += 1;
                    NoteKind::Footnote
                } else {
                    self.endnotes += 1;
                    NoteKind::Endnote
                };
                let counter = match kind {
                    NoteKind::Footnote => self.footnotes,
                    NoteKind::Endnote => self.endnotes,
                };
                let number = attrs.u32("number").filter(|n| *n > 0).unwrap_or(counter);
                self.notes.push(Note {
                    kind,
                    number,
                    section: self.section.index,
                    elements,
                });
                assembler.push_special(Run::note_ref(kind, number));
            },
            "hp:header" | "hp:footer" => {
                let area = HeaderFooter {
                    apply_to: attrs
                        .get("applyPageType")
                        .map_or(PageApply::Both, PageApply::from_hwpx_name),
                    elements,
                };
                let element = if name == "hp:header" {
                    Element::Header(area)
                } else {
                    Element::Footer(area)
                };
                extras.push((base + tag.start, element));
            },
            other => tracing::trace!(tag = other, "unhandled side channel"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::header::parse_header;
    use super::super::section::decode_section;
    use super::super::test_support::*;
    use crate::model::{Element, FieldKind, LineShape, RunKind, Section};

    fn decode(body: &str) -> Section {
        let styles = parse_header(HEADER_XML);
        decode_section(&section_xml(body), 0, &styles, true).0
    }

    fn first_paragraph(section: &Section) -> &crate::model::Paragraph {
        section.elements[0].as_paragraph().unwrap()
    }

    #[test]
    fn test_runs_split_on_style() {
        let body = concat!(
            r#"<hp:p id="0" paraPrIDRef="0" styleIDRef="0"><hp:run charPrIDRef="0"><hp:t>보통 </hp:t></hp:run>"#,
            r#"<hp:run charPrIDRef="1"><hp:t>굵게</hp:t></hp:run><hp:run charPrIDRef="1"><hp:t>!</hp:t></hp:run></hp:p>"#,
        );
        let section = decode(body);
        let p = first_paragraph(&section);
        assert_eq!(p.runs.len(), 2);
        assert_eq!(p.runs[0].text, "보통 ");
        assert_eq!(p.runs[1].text, "굵게!");
        assert!(p.runs[1].style.as_ref().is_some_and(|s| s.bold));
        assert_eq!(p.runs[1].char_style_id, Some(1));
    }

    #[test]
    fn test_inline_markers() {
        let run = r#"<hp:t>a<hp:tab width="4000" leader="3" type="1"/>b<hp:lineBreak/>c<hp:nbSpace/>d<hp:hyphen/>e &amp; f</hp:t>"#;
        let section = decode(&para_with(run));
        let p = first_paragraph(&section);
        assert_eq!(p.text(), "a\tb\nc\u{A0}d\u{AD}e & f");
        let tab = p.runs.iter().find(|r| r.is_tab()).unwrap();
        assert_eq!(
            tab.kind,
            RunKind::Tab {
                width: 4000,
                leader: LineShape::Dot
            }
        );
    }

    #[test]
    fn test_highlight_and_hyperlink() {
        let run = concat!(
            r##"<hp:t><hp:markpenBegin color="#FFFF00"/>칠함<hp:markpenEnd/> 보통</hp:t>"##,
            r#"<hp:ctrl><hp:fieldBegin id="5" type="HYPERLINK" name=""><hp:parameters cnt="1">"#,
            r#"<hp:stringParam name="Command">https\://example.com/a;1;0;0;</hp:stringParam></hp:parameters></hp:fieldBegin></hp:ctrl>"#,
            r#"<hp:t>링크</hp:t><hp:ctrl><hp:fieldEnd beginIDRef="5"/></hp:ctrl><hp:t>끝</hp:t>"#,
        );
        let section = decode(&para_with(run));
        let p = first_paragraph(&section);
        assert_eq!(p.text(), "칠함 보통링크끝");
        assert_eq!(p.runs[0].highlight, crate::model::Color::from_hex("#FFFF00"));
        assert_eq!(p.runs[1].highlight, None);
        let link = p.runs.iter().find(|r| r.text == "링크").unwrap();
        assert_eq!(link.hyperlink.as_deref(), Some("https://example.com/a"));
        assert_eq!(p.runs.last().unwrap().hyperlink, None);
    }

    #[test]
    fn test_other_field_kept_as_run() {
        let run = concat!(
            r#"<hp:ctrl><hp:fieldBegin id="1" type="CLICK_HERE"><hp:parameters cnt="1">"#,
            r#"<hp:stringParam name="Command">Direction:입력</hp:stringParam></hp:parameters></hp:fieldBegin></hp:ctrl>"#,
            r#"<hp:t>여기</hp:t><hp:ctrl><hp:fieldEnd beginIDRef="1"/></hp:ctrl>"#,
        );
        let section = decode(&para_with(run));
        let p = first_paragraph(&section);
        assert_eq!(
            p.runs[0].kind,
            RunKind::Field {
                field: FieldKind::ClickHere,
                command: "Direction:입력".to_string()
            }
        );
        assert_eq!(p.text(), "여기");
    }

    #[test]
    fn test_empty_paragraph_keeps_style() {
        let body = r#"<hp:p paraPrIDRef="0" styleIDRef="0"><hp:run charPrIDRef="1"/></hp:p>"#;
        let section = decode(body);
        let p = first_paragraph(&section);
        assert_eq!(p.runs.len(), 1);
        assert_eq!(p.runs[0].text, "");
        assert_eq!(p.runs[0].char_style_id, Some(1));
    }

    #[test]
    fn test_line_segments() {
        let body = concat!(
            r#"<hp:p paraPrIDRef="0" styleIDRef="0"><hp:run charPrIDRef="0"><hp:t>x</hp:t></hp:run>"#,
            r#"<hp:linesegarray><hp:lineseg textpos="0" vertpos="0" vertsize="1000" textheight="1000" baseline="850" spacing="600" horzpos="0" horzsize="42520" flags="393216"/></hp:linesegarray></hp:p>"#,
        );
        let styles = parse_header(HEADER_XML);
        let (section, _) = decode_section(&section_xml(body), 0, &styles, true);
        let seg = first_paragraph(&section).line_segments[0];
        assert_eq!(seg.baseline_gap, 850);
        assert_eq!(seg.segment_width, 42520);
        assert_eq!(seg.flags, 393216);

        let (section, _) = decode_section(&section_xml(body), 0, &styles, false);
        assert!(first_paragraph(&section).line_segments.is_empty());
    }

    #[test]
    fn test_object_only_paragraph_is_skipped() {
        let run = concat!(
            r#"<hp:pic id="3" zOrder="1"><hp:sz width="1000" height="500"/><hp:pos treatAsChar="1"/>"#,
            r#"<hc:img binaryItemIDRef="image1" bright="0" contrast="0"/></hp:pic><hp:t/>"#,
        );
        let section = decode(&format!("{}{}", para_with(run), para("다음")));
        let kinds: Vec<_> = section.elements.iter().map(Element::kind).collect();
        assert_eq!(kinds, ["image", "paragraph"]);
        assert_eq!(section.elements[1].as_paragraph().unwrap().source_index, Some(1));
    }

    #[test]
    fn test_text_paragraph_precedes_its_objects() {
        let run = concat!(
            r#"<hp:t>앞</hp:t><hp:line id="1"><hc:startPt x="0" y="0"/><hc:endPt x="100" y="50"/></hp:line>"#,
            r#"<hp:t>뒤</hp:t>"#,
        );
        let section = decode(&para_with(run));
        let kinds: Vec<_> = section.elements.iter().map(Element::kind).collect();
        assert_eq!(kinds, ["paragraph", "line"]);
        assert_eq!(section.elements[0].text(), "앞뒤");
    }
}
