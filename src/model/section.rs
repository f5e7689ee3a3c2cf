//! Sections, page geometry, memos, and notes.

use super::element::{Element, elements_text};
use super::paragraph::{NoteKind, Paragraph};
use super::shape::Margins;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Page geometry in HWPUNIT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageDef {
    pub width: u32,
    pub height: u32,
    pub margins: Margins,
    pub header_margin: u32,
    pub footer_margin: u32,
    pub gutter: u32,
    pub landscape: bool,
}

impl Default for PageDef {
    /// A4 portrait with the editor's default 30/20/15/15 mm margins.
    fn default() -> Self {
        Self {
            width: 59528,
            height: 84188,
            margins: Margins {
                left: 8504,
                right: 8504,
                top: 5668,
                bottom: 4252,
            },
            header_margin: 4252,
            footer_margin: 4252,
            gutter: 0,
            landscape: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Newspaper,
    Balanced,
    Parallel,
}

impl ColumnKind {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => ColumnKind::Balanced,
            2 => ColumnKind::Parallel,
            _ => ColumnKind::Newspaper,
        }
    }

    pub fn from_hwpx_name(name: &str) -> Self {
        match name {
            "BALANCED_NEWSPAPER" => ColumnKind::Balanced,
            "PARALLEL" => ColumnKind::Parallel,
            _ => ColumnKind::Newspaper,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub count: u16,
    /// Gap between columns in HWPUNIT
    pub gap: u32,
    pub kind: ColumnKind,
    pub same_width: bool,
}

impl Default for ColumnDef {
    fn default() -> Self {
        Self {
            count: 1,
            gap: 0,
            kind: ColumnKind::Newspaper,
            same_width: true,
        }
    }
}

/// A review memo anchored to a span of body text.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Memo {
    /// Sequential per section, referenced by [`Run::memo_id`](super::Run::memo_id)
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo_shape_id: Option<u32>,
    pub paragraphs: Vec<Paragraph>,
    /// Text of the body runs carrying this memo's id
    pub linked_text: String,
}

/// A footnote or endnote body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub kind: NoteKind,
    pub number: u32,
    /// Index of the section holding the reference marker
    pub section: usize,
    pub elements: Vec<Element>,
}

impl Note {
    pub fn text(&self) -> String {
        elements_text(&self.elements)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Section {
    pub index: usize,
    pub page: PageDef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnDef>,
    pub elements: Vec<Element>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub memos: Vec<Memo>,
}

impl Section {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Plain text of the body, one line per element.
    pub fn text(&self) -> String {
        elements_text(&self.elements)
    }

    /// Top-level paragraphs in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.elements.iter().filter_map(Element::as_paragraph)
    }

    /// Ensure the body holds at least one paragraph-bearing element.
    pub(crate) fn fill_if_empty(&mut self) {
        if self.elements.is_empty() {
            self.elements.push(Element::Paragraph(Paragraph::empty()));
        }
    }

    /// Fill every memo's `linked_text` from the runs referencing it.
    pub(crate) fn link_memos(&mut self) {
        if self.memos.is_empty() {
            return;
        }
        let mut linked = vec![String::new(); self.memos.len()];
        collect_memo_text(&self.elements, &self.memos, &mut linked);
        for (memo, text) in self.memos.iter_mut().zip(linked) {
            memo.linked_text = text;
        }
    }
}

fn collect_memo_text(elements: &[Element], memos: &[Memo], out: &mut [String]) {
    for element in elements {
        match element {
            Element::Paragraph(p) => {
                for run in &p.runs {
                    let Some(id) = run.memo_id else { continue };
                    if let Some(slot) = memos.iter().position(|m| m.id == id) {
                        out[slot].push_str(run.plain_text());
                    }
                }
            },
            Element::Table(t) => {
                for cell in t.cells() {
                    collect_memo_text(&cell.elements, memos, out);
                }
            },
            Element::Container(c) => collect_memo_text(&c.children, memos, out),
            _ => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Run;

    #[test]
    fn test_link_memos() {
        let mut run = Run::text("linked");
        run.memo_id = Some(0);
        let mut section = Section::new(0);
        section.elements.push(Element::Paragraph(Paragraph {
            runs: vec![Run::text("before "), run],
            ..Default::default()
        }));
        section.memos.push(Memo::default());
        section.link_memos();
        assert_eq!(section.memos[0].linked_text, "linked");
    }

    #[test]
    fn test_fill_if_empty() {
        let mut section = Section::new(2);
        section.fill_if_empty();
        assert_eq!(section.elements.len(), 1);
        assert_eq!(section.text(), "");
        assert!(!section.page.landscape);
    }
}
