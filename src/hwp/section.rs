//! Section stream decoder.
//!
//! The record stream has no close markers. Each open scope is a typed frame
//! on a stack whose bottom is the section body; a record that is not nested
//! deeper than the top frame closes it, and the closed frame hands its
//! result to the frame below.
//!
//! Frames and what closes them:
//!
//! | frame       | opened by                          | closed by                               |
//! |-------------|------------------------------------|-----------------------------------------|
//! | list        | `LIST_HEADER`, `MEMO_LIST`         | lower level, or same level but not a paragraph |
//! | control     | `CTRL_HEADER`                      | same or lower level                     |
//! | component   | `SHAPE_COMPONENT`                  | same or lower level                     |

use super::control::{
    TableInfo, ctrl_id, decode_cell, decode_char_shape_markers, decode_column_def, decode_equation,
    decode_field, decode_form, decode_header_footer, decode_highlights, decode_line_segments,
    decode_note_number, decode_object, decode_page_def, decode_table,
};
use super::doc_info::DocInfo;
use super::record::{Record, RecordIter};
use super::shape::{Component, decode_component};
use super::tags;
use super::text::{Highlight, ParaControl, RunContext, TextItem, build_runs, decode_para_text};
use crate::common::binary::{read_u8, read_u16_le};
use crate::model::{
    Cell, Element, Equation, FieldKind, FormControl, HeaderFooter, LineSegment, Memo, Note,
    NoteKind, ObjectProps, PageApply, Paragraph, Section, Table, TableGrid, UnknownObject,
};

/// Read-only inputs shared by every section decode of one document.
#[derive(Debug, Clone, Copy)]
pub struct SectionContext<'a> {
    pub info: &'a DocInfo,
    pub include_line_segments: bool,
}

#[derive(Debug)]
enum ListPurpose {
    Body,
    Cell {
        address: Option<(u32, u32)>,
        cell: Cell,
    },
    Caption,
    DrawText,
    /// Header, footer or note body
    Content,
    Memo,
    Discard,
}

/// A paragraph whose records are still arriving.
#[derive(Debug, Default)]
struct ParaBuilder {
    para_shape: u16,
    style: u8,
    page_break: bool,
    column_break: bool,
    items: Vec<(u32, TextItem)>,
    markers: Vec<(u32, u32)>,
    line_segments: Vec<LineSegment>,
    highlights: Vec<Highlight>,
    controls: Vec<ParaControl>,
    /// Objects anchored in this paragraph, emitted right after it
    objects: Vec<Element>,
    source_index: Option<u32>,
}

impl ParaBuilder {
    fn from_header(data: &[u8], source_index: Option<u32>) -> Self {
        let breaks = read_u8(data, 11).unwrap_or(0);
        Self {
            para_shape: read_u16_le(data, 8).unwrap_or(0),
            style: read_u8(data, 10).unwrap_or(0),
            page_break: breaks & 0x4 != 0,
            column_break: breaks & 0x8 != 0,
            source_index,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct ListFrame {
    /// `None` while a memo list waits for its `LIST_HEADER`
    level: Option<u16>,
    purpose: ListPurpose,
    para: Option<ParaBuilder>,
    elements: Vec<Element>,
}

impl ListFrame {
    fn new(level: Option<u16>, purpose: ListPurpose) -> Self {
        Self {
            level,
            purpose,
            para: None,
            elements: Vec::new(),
        }
    }
}

#[derive(Debug)]
enum ControlKind {
    Table {
        info: Option<TableInfo>,
        grid: Option<TableGrid>,
    },
    Shape(Option<Element>),
    HeaderFooter {
        footer: bool,
        apply_to: PageApply,
        elements: Vec<Element>,
    },
    Note {
        kind: NoteKind,
        number: u32,
        elements: Vec<Element>,
    },
    SectionDef,
    Equation(Option<Equation>),
    Form(Option<FormControl>),
    Other,
}

#[derive(Debug)]
struct ControlFrame {
    level: u16,
    id: u32,
    object: ObjectProps,
    caption: Vec<Paragraph>,
    kind: ControlKind,
}

#[derive(Debug)]
struct ComponentFrame {
    level: u16,
    component: Component,
}

#[derive(Debug)]
enum Frame {
    List(ListFrame),
    Control(ControlFrame),
    Component(ComponentFrame),
}

impl Frame {
    fn closes_on(&self, rec: &Record<'_>) -> bool {
        match self {
            Frame::List(list) => match list.level {
                None => rec.tag != tags::LIST_HEADER,
                Some(level) => {
                    rec.level < level
                        || (rec.level == level && rec.tag != tags::PARA_HEADER)
                        || (matches!(list.purpose, ListPurpose::Memo) && rec.tag == tags::MEMO_LIST)
                },
            },
            Frame::Control(control) => rec.level <= control.level,
            Frame::Component(frame) => rec.level <= frame.level,
        }
    }
}

/// Turn a finished paragraph into elements: the paragraph itself, unless it
/// only anchors objects, followed by its objects.
fn flush_paragraph(ctx: &SectionContext<'_>, para: ParaBuilder, out: &mut Vec<Element>) {
    let styles = &ctx.info.styles;
    let runs = build_runs(
        &para.items,
        &RunContext {
            styles,
            markers: &para.markers,
            highlights: &para.highlights,
            controls: &para.controls,
        },
    );
    let para_shape = para.para_shape as u32;
    let style = para.style as u32;
    let paragraph = Paragraph {
        runs,
        para_style_id: Some(para_shape),
        style: styles.para_style(para_shape).cloned(),
        style_id: Some(style),
        style_name: styles.style(style).map(|s| s.name.clone()),
        page_break: para.page_break,
        column_break: para.column_break,
        line_segments: para.line_segments,
        source_index: para.source_index,
    };
    if para.objects.is_empty() || paragraph.has_visible_content() {
        out.push(Element::Paragraph(paragraph));
    }
    out.extend(para.objects);
}

fn into_paragraphs(elements: Vec<Element>) -> Vec<Paragraph> {
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

struct SectionDecoder<'a> {
    ctx: &'a SectionContext<'a>,
    section: Section,
    notes: Vec<Note>,
    stack: Vec<Frame>,
    body_paragraphs: u32,
    footnotes: u32,
    endnotes: u32,
    memo_fields: u32,
}

impl<'a> SectionDecoder<'a> {
    fn new(index: usize, ctx: &'a SectionContext<'a>) -> Self {
        Self {
            ctx,
            section: Section::new(index),
            notes: Vec::new(),
            stack: vec![Frame::List(ListFrame::new(Some(0), ListPurpose::Body))],
            body_paragraphs: 0,
            footnotes: 0,
            endnotes: 0,
            memo_fields: 0,
        }
    }

    fn feed(&mut self, rec: &Record<'_>) {
        while self.stack.len() > 1 && self.stack.last().is_some_and(|f| f.closes_on(rec)) {
            self.pop();
        }
        match self.stack.last() {
            Some(Frame::List(_)) => self.list_record(rec),
            Some(Frame::Control(_)) => self.control_record(rec),
            Some(Frame::Component(_)) => self.component_record(rec),
            None => {},
        }
    }

    fn list_mut(&mut self) -> Option<&mut ListFrame> {
        match self.stack.last_mut() {
            Some(Frame::List(list)) => Some(list),
            _ => None,
        }
    }

    fn list_record(&mut self, rec: &Record<'_>) {
        let include_line_segments = self.ctx.include_line_segments;
        match rec.tag {
            tags::LIST_HEADER => match self.list_mut() {
                Some(list) if list.level.is_none() => list.level = Some(rec.level),
                _ => tracing::trace!(level = rec.level, "stray list header"),
            },
            tags::PARA_HEADER => self.start_paragraph(rec),
            tags::PARA_TEXT | tags::PARA_CHAR_SHAPE | tags::PARA_LINE_SEG | tags::PARA_RANGE_TAG => {
                let Some(para) = self.list_mut().and_then(|l| l.para.as_mut()) else {
                    tracing::trace!(tag = rec.tag, "paragraph record outside a paragraph");
                    return;
                };
                match rec.tag {
                    tags::PARA_TEXT => para.items = decode_para_text(rec.data),
                    tags::PARA_CHAR_SHAPE => para.markers = decode_char_shape_markers(rec.data),
                    tags::PARA_LINE_SEG if include_line_segments => {
                        para.line_segments = decode_line_segments(rec.data)
                    },
                    tags::PARA_RANGE_TAG => para.highlights = decode_highlights(rec.data),
                    _ => {},
                }
            },
            tags::CTRL_HEADER => self.open_control(rec),
            tags::MEMO_LIST => self.stack.push(Frame::List(ListFrame::new(None, ListPurpose::Memo))),
            other => tracing::trace!(tag = other, level = rec.level, "record ignored in list"),
        }
    }

    fn start_paragraph(&mut self, rec: &Record<'_>) {
        let source_index = (self.stack.len() == 1).then(|| {
            self.body_paragraphs += 1;
            self.body_paragraphs - 1
        });
        let ctx = self.ctx;
        let para = ParaBuilder::from_header(rec.data, source_index);
        if let Some(list) = self.list_mut()
            && let Some(previous) = list.para.replace(para)
        {
            flush_paragraph(ctx, previous, &mut list.elements);
        }
    }

    fn open_control(&mut self, rec: &Record<'_>) {
        let Some(id) = ctrl_id(rec.data) else {
            tracing::debug!(len = rec.data.len(), "undersized control header");
            return;
        };
        let data = rec.data;
        let (para_control, kind) = match id {
            tags::CTRL_TABLE => (ParaControl::Other, ControlKind::Table { info: None, grid: None }),
            tags::CTRL_GSO => (ParaControl::Other, ControlKind::Shape(None)),
            tags::CTRL_HEADER_AREA | tags::CTRL_FOOTER_AREA => (
                ParaControl::Other,
                ControlKind::HeaderFooter {
                    footer: id == tags::CTRL_FOOTER_AREA,
                    apply_to: decode_header_footer(data),
                    elements: Vec::new(),
                },
            ),
            tags::CTRL_FOOTNOTE | tags::CTRL_ENDNOTE => {
                let (kind, counter) = if id == tags::CTRL_FOOTNOTE {
                    self.footnotes += 1;
                    (NoteKind::Footnote, self.footnotes)
                } else {
                    self.endnotes += 1;
                    (NoteKind::Endnote, self.endnotes)
                };
                let number = decode_note_number(data).unwrap_or(counter);
                (
                    ParaControl::Note { kind, number },
                    ControlKind::Note {
                        kind,
                        number,
                        elements: Vec::new(),
                    },
                )
            },
            tags::CTRL_SECTION_DEF => (ParaControl::Other, ControlKind::SectionDef),
            tags::CTRL_COLUMN_DEF => {
                if self.section.columns.is_none() {
                    self.section.columns = decode_column_def(data);
                }
                (ParaControl::Other, ControlKind::Other)
            },
            tags::CTRL_EQUATION => (ParaControl::Other, ControlKind::Equation(None)),
            tags::CTRL_FORM => (ParaControl::Other, ControlKind::Form(None)),
            id if tags::is_field(id) => {
                let (kind, command) = decode_field(id, data);
                let memo_id = (kind == FieldKind::Memo).then(|| {
                    self.memo_fields += 1;
                    self.memo_fields - 1
                });
                (
                    ParaControl::Field {
                        kind,
                        command,
                        memo_id,
                    },
                    ControlKind::Other,
                )
            },
            _ => (ParaControl::Other, ControlKind::Other),
        };
        let object = match kind {
            ControlKind::Table { .. }
            | ControlKind::Shape(_)
            | ControlKind::Equation(_)
            | ControlKind::Form(_) => decode_object(data),
            _ => ObjectProps::default(),
        };

        match self.list_mut().and_then(|l| l.para.as_mut()) {
            Some(para) => para.controls.push(para_control),
            None => tracing::trace!(ctrl = %tags::ctrl_name(id), "control outside a paragraph"),
        }
        self.stack.push(Frame::Control(ControlFrame {
            level: rec.level,
            id,
            object,
            caption: Vec::new(),
            kind,
        }));
    }

    fn control_record(&mut self, rec: &Record<'_>) {
        let Some(Frame::Control(control)) = self.stack.last_mut() else {
            return;
        };
        let opened = match (&mut control.kind, rec.tag) {
            (ControlKind::Table { info, grid }, tags::TABLE) => {
                match decode_table(rec.data) {
                    Some(table) => {
                        *grid = Some(TableGrid::new(table.rows as u32, table.cols as u32));
                        *info = Some(table);
                    },
                    None => tracing::debug!(len = rec.data.len(), "undersized table record"),
                }
                None
            },
            (ControlKind::Table { grid, .. }, tags::LIST_HEADER) => Some(match grid {
                None => ListPurpose::Caption,
                Some(grid) if grid.is_full() => {
                    tracing::debug!("cell beyond the table grid ignored");
                    ListPurpose::Discard
                },
                Some(_) => {
                    let (address, cell) = decode_cell(rec.data);
                    ListPurpose::Cell { address, cell }
                },
            }),
            (ControlKind::Shape(_), tags::SHAPE_COMPONENT) => {
                let frame = ComponentFrame {
                    level: rec.level,
                    component: decode_component(rec.data, true),
                };
                self.stack.push(Frame::Component(frame));
                return;
            },
            (ControlKind::SectionDef, tags::PAGE_DEF) => {
                match decode_page_def(rec.data) {
                    Some(page) => self.section.page = page,
                    None => tracing::debug!(len = rec.data.len(), "undersized page definition"),
                }
                None
            },
            (ControlKind::Equation(equation), tags::EQEDIT) => {
                *equation = Some(decode_equation(ObjectProps::default(), rec.data));
                None
            },
            (ControlKind::Form(form), tags::FORM_OBJECT) => {
                *form = Some(decode_form(ObjectProps::default(), rec.data));
                None
            },
            (ControlKind::HeaderFooter { .. } | ControlKind::Note { .. }, tags::LIST_HEADER | tags::PARA_HEADER) => {
                Some(ListPurpose::Content)
            },
            (ControlKind::Other | ControlKind::SectionDef, tags::LIST_HEADER | tags::PARA_HEADER) => {
                Some(ListPurpose::Discard)
            },
            (_, tags::LIST_HEADER | tags::PARA_HEADER) => Some(ListPurpose::Caption),
            (_, tag) => {
                tracing::trace!(tag, ctrl = %tags::ctrl_name(control.id), "record ignored in control");
                None
            },
        };

        if let Some(purpose) = opened {
            self.stack.push(Frame::List(ListFrame::new(Some(rec.level), purpose)));
            // lists without a header start directly with a paragraph
            if rec.tag == tags::PARA_HEADER {
                self.start_paragraph(rec);
            }
        }
    }

    fn component_record(&mut self, rec: &Record<'_>) {
        let Some(Frame::Component(frame)) = self.stack.last_mut() else {
            return;
        };
        match rec.tag {
            tags::SHAPE_COMPONENT => {
                let child = ComponentFrame {
                    level: rec.level,
                    component: decode_component(rec.data, false),
                };
                self.stack.push(Frame::Component(child));
            },
            tags::LIST_HEADER | tags::PARA_HEADER => {
                self.stack
                    .push(Frame::List(ListFrame::new(Some(rec.level), ListPurpose::DrawText)));
                if rec.tag == tags::PARA_HEADER {
                    self.start_paragraph(rec);
                }
            },
            tag => frame.component.apply_record(tag, rec.data),
        }
    }

    fn pop(&mut self) {
        match self.stack.pop() {
            Some(Frame::List(list)) => self.close_list(list),
            Some(Frame::Control(control)) => self.close_control(control),
            Some(Frame::Component(frame)) => {
                let info = self.ctx.info;
                let element = frame.component.into_element(&|id| info.bin_key(id));
                self.deliver(element);
            },
            None => {},
        }
    }

    fn close_list(&mut self, list: ListFrame) {
        let ctx = self.ctx;
        let ListFrame {
            purpose,
            para,
            mut elements,
            ..
        } = list;
        if let Some(para) = para {
            flush_paragraph(ctx, para, &mut elements);
        }
        match purpose {
            ListPurpose::Body => self.section.elements.extend(elements),
            ListPurpose::Cell { address, mut cell } => {
                if elements.is_empty() {
                    elements.push(Element::Paragraph(Paragraph::empty()));
                }
                cell.elements = elements;
                cell.border_fill = cell
                    .border_fill_id
                    .and_then(|id| ctx.info.styles.border_fill(id))
                    .cloned();
                match self.stack.last_mut() {
                    Some(Frame::Control(ControlFrame {
                        kind: ControlKind::Table { grid: Some(grid), .. },
                        ..
                    })) => {
                        grid.place(address, cell);
                    },
                    _ => tracing::debug!("cell list outside a table"),
                }
            },
            ListPurpose::Caption => match self.stack.last_mut() {
                Some(Frame::Control(control)) => control.caption.extend(into_paragraphs(elements)),
                _ => tracing::trace!("caption outside a control"),
            },
            ListPurpose::DrawText => match self.stack.last_mut() {
                Some(Frame::Component(frame)) => frame.component.text.extend(into_paragraphs(elements)),
                _ => tracing::trace!("drawing text outside a shape"),
            },
            ListPurpose::Content => {
                if elements.is_empty() {
                    elements.push(Element::Paragraph(Paragraph::empty()));
                }
                match self.stack.last_mut() {
                    Some(Frame::Control(ControlFrame {
                        kind:
                            ControlKind::HeaderFooter { elements: target, .. }
                            | ControlKind::Note { elements: target, .. },
                        ..
                    })) => target.extend(elements),
                    _ => tracing::trace!("content list outside a header, footer or note"),
                }
            },
            ListPurpose::Memo => {
                let id = self.section.memos.len() as u32;
                self.section.memos.push(Memo {
                    id,
                    paragraphs: into_paragraphs(elements),
                    ..Default::default()
                });
            },
            ListPurpose::Discard => tracing::trace!(elements = elements.len(), "list discarded"),
        }
    }

    fn close_control(&mut self, control: ControlFrame) {
        let ControlFrame {
            id,
            mut object,
            caption,
            kind,
            ..
        } = control;
        object.caption = caption;
        let element = match kind {
            ControlKind::Table {
                info: Some(info),
                grid: Some(grid),
            } => Some(Element::Table(Box::new(Table {
                object,
                row_count: grid.rows(),
                col_count: grid.cols(),
                cell_spacing: info.cell_spacing,
                inner_margins: info.inner_margins,
                repeat_header: info.repeat_header,
                border_fill_id: info.border_fill_id,
                border_fill: info
                    .border_fill_id
                    .and_then(|id| self.ctx.info.styles.border_fill(id))
                    .cloned(),
                rows: grid.finish(),
            }))),
            ControlKind::Table { .. } => {
                tracing::debug!("table control without a table record");
                None
            },
            ControlKind::Shape(element) => {
                let mut element = element.unwrap_or_else(|| {
                    Element::UnknownObject(UnknownObject {
                        ctrl_id: tags::ctrl_name(id),
                        ..Default::default()
                    })
                });
                if let Some(slot) = element.object_mut() {
                    *slot = object;
                }
                Some(element)
            },
            ControlKind::HeaderFooter {
                footer,
                apply_to,
                elements,
            } => {
                let area = HeaderFooter { apply_to, elements };
                Some(if footer {
                    Element::Footer(area)
                } else {
                    Element::Header(area)
                })
            },
            ControlKind::Note {
                kind,
                number,
                elements,
            } => {
                self.notes.push(Note {
                    kind,
                    number,
                    section: self.section.index,
                    elements,
                });
                None
            },
            ControlKind::Equation(equation) => {
                let mut equation = equation.unwrap_or_default();
                equation.object = object;
                Some(Element::Equation(equation))
            },
            ControlKind::Form(form) => {
                let mut form = form.unwrap_or_default();
                form.object = object;
                Some(Element::FormControl(form))
            },
            ControlKind::SectionDef | ControlKind::Other => None,
        };
        if let Some(element) = element {
            self.deliver(element);
        }
    }

    /// Hand a finished object to the frame below it.
    fn deliver(&mut self, element: Element) {
        match self.stack.last_mut() {
            Some(Frame::List(list)) => match list.para.as_mut() {
                Some(para) => para.objects.push(element),
                None => list.elements.push(element),
            },
            Some(Frame::Component(frame)) => frame.component.children.push(element),
            Some(Frame::Control(ControlFrame {
                kind: ControlKind::Shape(slot),
                ..
            })) => *slot = Some(element),
            Some(Frame::Control(control)) => {
                tracing::debug!(ctrl = %tags::ctrl_name(control.id), kind = element.kind(), "object dropped");
            },
            None => {},
        }
    }

    fn finish(mut self) -> (Section, Vec<Note>) {
        while !self.stack.is_empty() {
            self.pop();
        }
        self.section.fill_if_empty();
        self.section.link_memos();
        (self.section, self.notes)
    }
}

/// Decode one `BodyText/Section{index}` stream into a section and the notes
/// referenced from it.
pub fn decode_section(data: &[u8], index: usize, ctx: &SectionContext<'_>) -> (Section, Vec<Note>) {
    let mut decoder = SectionDecoder::new(index, ctx);
    for rec in RecordIter::new(data) {
        decoder.feed(&rec);
    }
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
