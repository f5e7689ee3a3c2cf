//! Paragraph text write-back into an HWPX package.
//!
//! Only literal text is rewritten. Every entry that was not edited is copied
//! byte for byte, compressed data included.

use super::HwpxError;
use super::header::parse_header;
use super::package::{HEADER_ENTRY, HwpxPackage, section_entry};
use super::scanner::{TagSpan, children, direct_child, direct_children};
use super::section::{decode_section, top_level_paragraphs};
use crate::common::xml::escape_xml;
use crate::model::Document;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Replace the text of the `index`-th top-level paragraph of a section part.
///
/// The first `hp:t` of the paragraph receives `text` (escaped) and later
/// ones are emptied, so run structure and character styles survive. Tabs
/// and newlines in `text` become `hp:tab` and `hp:lineBreak` markup; tabs
/// reuse the first tab element the paragraph already had.
/// Returns `None` when the section has no such paragraph.
pub fn replace_paragraph_text(section_xml: &str, index: usize, text: &str) -> Option<String> {
    let paragraph = *top_level_paragraphs(section_xml).get(index)?;
    let runs = children(section_xml, &paragraph, "hp:run");
    let texts: Vec<TagSpan> = runs
        .iter()
        .flat_map(|run| {
            direct_children(run.inner(section_xml), "hp:t")
                .into_iter()
                .map(|t| t.shifted(run.content_start))
        })
        .collect();

    let tab = texts
        .iter()
        .find_map(|t| {
            let inner = t.inner(section_xml);
            direct_child(inner, "hp:tab").map(|tab| tab.as_str(inner))
        })
        .unwrap_or(DEFAULT_TAB);
    let markup = text_markup(text, tab);
    // (start, end, replacement) in ascending order
    let mut edits: Vec<(usize, usize, String)> = Vec::with_capacity(texts.len().max(1));
    match (texts.first(), runs.first()) {
        (Some(_), _) => {
            for (i, t) in texts.iter().enumerate() {
                let content = if i == 0 { markup.as_str() } else { "" };
                edits.push((t.start, t.end, format!("<hp:t>{}</hp:t>", content)));
            }
        },
        (None, Some(run)) => {
            edits.push(fill_element(section_xml, run, "hp:run", &format!("<hp:t>{}</hp:t>", markup)));
        },
        (None, None) => {
            let run = format!(r#"<hp:run charPrIDRef="0"><hp:t>{}</hp:t></hp:run>"#, markup);
            edits.push(fill_element(section_xml, &paragraph, "hp:p", &run));
        },
    }

    let mut out = String::with_capacity(section_xml.len() + markup.len());
    let mut last = 0;
    for (start, end, replacement) in edits {
        out.push_str(&section_xml[last..start]);
        out.push_str(&replacement);
        last = end;
    }
    out.push_str(&section_xml[last..]);
    Some(out)
}

const DEFAULT_TAB: &str = "<hp:tab/>";

/// `hp:t` content for plain text: escaped, with `tab` markup for each tab
/// and a line break element for each newline.
fn text_markup(text: &str, tab: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<hp:lineBreak/>");
        }
        for (j, piece) in line.split('\t').enumerate() {
            if j > 0 {
                out.push_str(tab);
            }
            out.push_str(&escape_xml(piece));
        }
    }
    out
}

/// Edit inserting `content` at the start of an element, expanding a
/// self-closing tag into an open/close pair.
fn fill_element(xml: &str, span: &TagSpan, name: &str, content: &str) -> (usize, usize, String) {
    if span.is_self_closing() {
        let open = span.open_tag(xml);
        let head = open.trim_end_matches('>').trim_end_matches('/').trim_end();
        (span.start, span.end, format!("{}>{}</{}>", head, content, name))
    } else {
        (span.content_start, span.content_start, content.to_string())
    }
}

/// Edits the text of an existing package and writes a new one.
///
/// ```rust,no_run
/// use hwpdoc::hwpx::HwpxWriter;
///
/// let bytes = std::fs::read("report.hwpx")?;
/// let mut writer = HwpxWriter::new(bytes)?;
/// writer.set_paragraph_text(0, 0, "새 제목")?;
/// std::fs::write("report-edited.hwpx", writer.finish()?)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct HwpxWriter {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    /// Rewritten section parts by entry name
    edits: BTreeMap<String, String>,
}

impl HwpxWriter {
    /// Open a package for editing; fails like [`decode`](super::decode) on
    /// a wrong mimetype or an encrypted package.
    pub fn new(bytes: Vec<u8>) -> Result<Self, HwpxError> {
        Ok(Self {
            archive: HwpxPackage::open(bytes)?.into_archive(),
            edits: BTreeMap::new(),
        })
    }

    fn read_entry(&mut self, name: &str) -> Result<String, HwpxError> {
        if let Some(xml) = self.edits.get(name) {
            return Ok(xml.clone());
        }
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(HwpxError::EntryNotFound(name.to_string()));
            },
            Err(e) => return Err(e.into()),
        };
        let mut xml = String::new();
        file.read_to_string(&mut xml)?;
        Ok(xml.trim_start_matches('\u{feff}').to_string())
    }

    /// Replace the text of one top-level paragraph of one section.
    pub fn set_paragraph_text(&mut self, section: usize, paragraph: usize, text: &str) -> Result<(), HwpxError> {
        let name = section_entry(section);
        let xml = self.read_entry(&name)?;
        let updated = replace_paragraph_text(&xml, paragraph, text)
            .ok_or_else(|| HwpxError::EntryNotFound(format!("{}: paragraph {}", name, paragraph)))?;
        tracing::trace!(section, paragraph, "paragraph text replaced");
        self.edits.insert(name, updated);
        Ok(())
    }

    /// Write back every top-level paragraph of `doc` whose text differs from
    /// the package. Returns the number of paragraphs rewritten.
    ///
    /// Paragraphs are matched by their `source_index`; paragraphs added by
    /// an editor (without one) are not written.
    pub fn apply_document(&mut self, doc: &Document) -> Result<usize, HwpxError> {
        let styles = parse_header(&self.read_entry(HEADER_ENTRY)?);
        let mut written = 0;
        for section in &doc.sections {
            let xml = self.read_entry(&section_entry(section.index))?;
            let (original, _) = decode_section(&xml, section.index, &styles, false);
            let before: BTreeMap<u32, String> = original
                .paragraphs()
                .filter_map(|p| p.source_index.map(|i| (i, p.text())))
                .collect();
            for paragraph in section.paragraphs() {
                let Some(index) = paragraph.source_index else {
                    continue;
                };
                let text = paragraph.text();
                if before.get(&index) == Some(&text) {
                    continue;
                }
                self.set_paragraph_text(section.index, index as usize, &text)?;
                written += 1;
            }
        }
        tracing::debug!(written, "applied document text");
        Ok(written)
    }

    /// Serialize the package. Entries keep their order; edited section parts
    /// are deflated, all others are copied raw.
    pub fn finish(mut self) -> Result<Vec<u8>, HwpxError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for i in 0..self.archive.len() {
            let file = self.archive.by_index_raw(i)?;
            let name = file.name().to_string();
            match self.edits.remove(&name) {
                Some(xml) => {
                    drop(file);
                    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
                    writer.start_file(name.as_str(), options)?;
                    writer.write_all(xml.as_bytes())?;
                },
                None => writer.raw_copy_file(file)?,
            }
        }
        Ok(writer.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::options::ParseOptions;

    #[test]
    fn test_replace_keeps_runs_and_escapes() {
        let body = format!(
            "{}{}",
            para("first"),
            r#"<hp:p paraPrIDRef="0"><hp:run charPrIDRef="1"><hp:t>a</hp:t></hp:run><hp:run charPrIDRef="0"><hp:t>b<hp:tab width="10"/>c</hp:t></hp:run></hp:p>"#
        );
        let xml = section_xml(&body);
        let out = replace_paragraph_text(&xml, 1, "x < y").unwrap();
        assert!(out.contains(r#"<hp:run charPrIDRef="1"><hp:t>x &lt; y</hp:t></hp:run><hp:run charPrIDRef="0"><hp:t></hp:t></hp:run>"#));
        assert!(out.contains("<hp:t>first</hp:t>"));
        assert!(replace_paragraph_text(&xml, 2, "z").is_none());
    }

    #[test]
    fn test_tabs_and_line_breaks_written_as_markup() {
        let xml = section_xml(&para_with(r#"<hp:t>a<hp:tab width="4000" leader="3" type="1"/>b</hp:t>"#));
        let out = replace_paragraph_text(&xml, 0, "a\tb!\nc").unwrap();
        assert!(out.contains(r#"<hp:t>a<hp:tab width="4000" leader="3" type="1"/>b!<hp:lineBreak/>c</hp:t>"#));

        let styles = parse_header(HEADER_XML);
        let (section, _) = decode_section(&out, 0, &styles, false);
        let paragraph = section.paragraphs().next().unwrap();
        assert_eq!(paragraph.text(), "a\tb!\nc");
        let tabs: Vec<_> = paragraph.runs.iter().filter(|r| r.is_tab()).collect();
        assert_eq!(tabs.len(), 1);
        assert!(matches!(tabs[0].kind, crate::model::RunKind::Tab { width: 4000, .. }));

        let plain = section_xml(&para("x"));
        let out = replace_paragraph_text(&plain, 0, "1\t2").unwrap();
        assert!(out.contains("<hp:t>1<hp:tab/>2</hp:t>"));
    }

    #[test]
    fn test_replace_in_paragraph_without_text() {
        let xml = section_xml(r#"<hp:p paraPrIDRef="0"/><hp:p><hp:run charPrIDRef="0"/></hp:p>"#);
        let out = replace_paragraph_text(&xml, 0, "new").unwrap();
        assert!(out.contains(r#"<hp:p paraPrIDRef="0"><hp:run charPrIDRef="0"><hp:t>new</hp:t></hp:run></hp:p>"#));
        let out = replace_paragraph_text(&out, 1, "two").unwrap();
        assert!(out.contains(r#"<hp:run charPrIDRef="0"><hp:t>two</hp:t></hp:run>"#));
    }

    #[test]
    fn test_cell_paragraphs_are_not_counted() {
        let body = format!(
            r#"<hp:p><hp:run><hp:tbl rowCnt="1" colCnt="1"><hp:tr><hp:tc><hp:subList>{}</hp:subList></hp:tc></hp:tr></hp:tbl><hp:t/></hp:run></hp:p>{}"#,
            para("cell"),
            para("after")
        );
        let xml = section_xml(&body);
        let out = replace_paragraph_text(&xml, 1, "edited").unwrap();
        assert!(out.contains("<hp:t>cell</hp:t>"));
        assert!(out.contains("<hp:t>edited</hp:t>"));
    }

    #[test]
    fn test_round_trip_through_document() {
        let bytes = hwpx_file(&[format!("{}{}", para("하나"), para("둘"))]);
        let mut doc = super::super::decode(&bytes, &ParseOptions::default()).unwrap();
        doc.sections[0].elements[1]
            .as_paragraph_mut()
            .unwrap()
            .set_text("바뀐 둘");

        let mut writer = HwpxWriter::new(bytes.clone()).unwrap();
        assert_eq!(writer.apply_document(&doc).unwrap(), 1);
        let edited = writer.finish().unwrap();

        let reparsed = super::super::decode(&edited, &ParseOptions::default()).unwrap();
        assert_eq!(reparsed.text(), "하나\n바뀐 둘");
        assert_eq!(reparsed.styles, doc.styles);
    }

    #[test]
    fn test_set_paragraph_text_errors() {
        let bytes = hwpx_file(&[para("x")]);
        let mut writer = HwpxWriter::new(bytes).unwrap();
        assert!(matches!(
            writer.set_paragraph_text(0, 3, "y"),
            Err(HwpxError::EntryNotFound(_))
        ));
        assert!(matches!(
            writer.set_paragraph_text(4, 0, "y"),
            Err(HwpxError::EntryNotFound(_))
        ));
    }
}
