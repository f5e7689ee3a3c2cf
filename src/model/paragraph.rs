//! Paragraphs and runs.

use super::style::{CharStyle, Color, LineShape, ParaStyle};
use serde::Serialize;

/// Footnote or endnote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    Footnote,
    Endnote,
}

/// Kind of a field control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Hyperlink,
    Memo,
    ClickHere,
    Bookmark,
    Date,
    DocDate,
    Path,
    CrossRef,
    MailMerge,
    Formula,
    Summary,
    UserInfo,
    Other(String),
}

impl FieldKind {
    /// Classify a legacy field control id such as `%hlk`.
    pub fn from_ctrl_id(id: &str) -> Self {
        match id {
            "%hlk" => FieldKind::Hyperlink,
            "%%me" => FieldKind::Memo,
            "%clk" => FieldKind::ClickHere,
            "%bmk" => FieldKind::Bookmark,
            "%dte" => FieldKind::Date,
            "%ddt" => FieldKind::DocDate,
            "%pat" => FieldKind::Path,
            "%xrf" => FieldKind::CrossRef,
            "%mmg" => FieldKind::MailMerge,
            "%fmu" => FieldKind::Formula,
            "%smr" => FieldKind::Summary,
            "%usr" => FieldKind::UserInfo,
            other => FieldKind::Other(other.trim().to_string()),
        }
    }

    /// Classify an HWPX `fieldBegin` `type` attribute.
    pub fn from_hwpx_type(kind: &str) -> Self {
        match kind {
            "HYPERLINK" => FieldKind::Hyperlink,
            "MEMO" => FieldKind::Memo,
            "CLICK_HERE" => FieldKind::ClickHere,
            "BOOKMARK" => FieldKind::Bookmark,
            "DATE" => FieldKind::Date,
            "DOC_DATE" => FieldKind::DocDate,
            "PATH" => FieldKind::Path,
            "CROSSREF" => FieldKind::CrossRef,
            "MAILMERGE" => FieldKind::MailMerge,
            "FORMULA" => FieldKind::Formula,
            "SUMMARY" => FieldKind::Summary,
            "USER_INFO" => FieldKind::UserInfo,
            other => FieldKind::Other(other.to_string()),
        }
    }
}

/// What a run represents besides its text.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunKind {
    #[default]
    Text,
    Tab {
        /// Tab width in HWPUNIT
        width: u32,
        leader: LineShape,
    },
    Field {
        field: FieldKind,
        command: String,
    },
    /// Back-reference to a footnote or endnote, rendered as a superscript number
    NoteRef {
        note: NoteKind,
        number: u32,
    },
}

/// A span of text sharing one character style.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Run {
    pub text: String,
    pub kind: RunKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_style_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<CharStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo_id: Option<u32>,
}

impl Run {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn tab(width: u32, leader: LineShape) -> Self {
        Self {
            text: "\t".to_string(),
            kind: RunKind::Tab { width, leader },
            ..Default::default()
        }
    }

    pub fn note_ref(note: NoteKind, number: u32) -> Self {
        Self {
            text: number.to_string(),
            kind: RunKind::NoteRef { note, number },
            ..Default::default()
        }
    }

    pub fn field(field: FieldKind, command: impl Into<String>) -> Self {
        Self {
            kind: RunKind::Field {
                field,
                command: command.into(),
            },
            ..Default::default()
        }
    }

    #[inline]
    pub fn with_style(mut self, id: Option<u32>, style: Option<CharStyle>) -> Self {
        self.set_style(id, style);
        self
    }

    /// Attach a character style. Note back-references are always raised to
    /// superscript, on top of the surrounding style or a default one.
    pub fn set_style(&mut self, id: Option<u32>, style: Option<CharStyle>) {
        self.char_style_id = id;
        self.style = style;
        if self.is_note_ref() {
            let style = self.style.get_or_insert_with(CharStyle::default);
            style.superscript = true;
            style.subscript = false;
        }
    }

    #[inline]
    pub fn is_tab(&self) -> bool {
        matches!(self.kind, RunKind::Tab { .. })
    }

    #[inline]
    pub fn is_note_ref(&self) -> bool {
        matches!(self.kind, RunKind::NoteRef { .. })
    }

    /// Text contributing to plain-text extraction; note markers are skipped.
    pub fn plain_text(&self) -> &str {
        match self.kind {
            RunKind::NoteRef { .. } | RunKind::Field { .. } => "",
            _ => &self.text,
        }
    }
}

/// Extract the link target from a hyperlink field command.
///
/// Commands look like `http\://example.com;1;0;0;`: `\` escapes the next
/// character and the first unescaped `;` ends the target.
pub fn hyperlink_target(command: &str) -> String {
    let mut out = String::with_capacity(command.len());
    let mut chars = command.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            },
            ';' => break,
            _ => out.push(ch),
        }
    }
    out
}

/// Per-line layout hint recorded by the authoring application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LineSegment {
    pub text_start: u32,
    pub vertical_pos: i32,
    pub line_height: i32,
    pub text_height: i32,
    pub baseline_gap: i32,
    pub line_spacing: i32,
    pub column_start: i32,
    pub segment_width: i32,
    pub flags: u32,
}

/// A paragraph of runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub para_style_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ParaStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,
    pub page_break: bool,
    pub column_break: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_segments: Vec<LineSegment>,
    /// Position of the source paragraph among the section's top-level paragraphs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_index: Option<u32>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A paragraph holding one empty run.
    pub fn empty() -> Self {
        Self {
            runs: vec![Run::default()],
            ..Default::default()
        }
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run::text(text)],
            ..Default::default()
        }
    }

    /// Concatenated text of all runs, without note markers.
    pub fn text(&self) -> String {
        self.runs.iter().map(Run::plain_text).collect()
    }

    /// Whether any run carries visible text or a tab.
    pub fn has_visible_content(&self) -> bool {
        self.runs
            .iter()
            .any(|r| r.is_tab() || r.is_note_ref() || !r.text.is_empty())
    }

    /// Replace the paragraph text with a single run, keeping the first run's style.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let mut run = self
            .runs
            .iter()
            .find(|r| matches!(r.kind, RunKind::Text))
            .cloned()
            .unwrap_or_default();
        run.text = text.into();
        run.kind = RunKind::Text;
        self.runs = vec![run];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_text_skips_markers() {
        let para = Paragraph {
            runs: vec![
                Run::text("본문"),
                Run::note_ref(NoteKind::Footnote, 1),
                Run::tab(4000, LineShape::None),
                Run::text("끝"),
            ],
            ..Default::default()
        };
        assert_eq!(para.text(), "본문\t끝");
        assert!(para.has_visible_content());
        assert!(!Paragraph::empty().has_visible_content());
    }

    #[test]
    fn test_note_ref_is_superscript() {
        let marker = Run::note_ref(NoteKind::Endnote, 2).with_style(Some(1), None);
        assert!(marker.style.as_ref().is_some_and(|s| s.superscript));

        let sub = CharStyle {
            subscript: true,
            bold: true,
            ..Default::default()
        };
        let marker = Run::note_ref(NoteKind::Footnote, 1).with_style(Some(1), Some(sub.clone()));
        let style = marker.style.unwrap();
        assert!(style.superscript && !style.subscript && style.bold);

        let plain = Run::text("x").with_style(Some(1), Some(sub));
        assert!(!plain.style.unwrap().superscript);
    }

    #[test]
    fn test_set_text_keeps_style() {
        let mut para = Paragraph {
            runs: vec![
                Run::text("a").with_style(Some(3), None),
                Run::text("b").with_style(Some(4), None),
            ],
            ..Default::default()
        };
        para.set_text("new");
        assert_eq!(para.runs.len(), 1);
        assert_eq!(para.runs[0].char_style_id, Some(3));
        assert_eq!(para.text(), "new");
    }

    #[test]
    fn test_field_kind_mapping() {
        assert_eq!(FieldKind::from_ctrl_id("%hlk"), FieldKind::Hyperlink);
        assert_eq!(FieldKind::from_hwpx_type("CLICK_HERE"), FieldKind::ClickHere);
        assert_eq!(
            FieldKind::from_ctrl_id("%zzz"),
            FieldKind::Other("%zzz".to_string())
        );
    }

    #[test]
    fn test_run_json_shape() {
        let json = serde_json::to_value(Run::tab(800, LineShape::Dot)).unwrap();
        assert_eq!(json["kind"]["kind"], "tab");
        assert_eq!(json["kind"]["width"], 800);
        assert_eq!(json["kind"]["leader"], "dot");
    }

    #[test]
    fn test_hyperlink_target_unescapes() {
        assert_eq!(hyperlink_target("http\\://a.b/c\\;d;1;0"), "http://a.b/c;d");
        assert_eq!(hyperlink_target(""), "");
    }
}
