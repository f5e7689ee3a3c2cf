//! The tagged union of section content.

use super::paragraph::Paragraph;
use super::shape::*;
use super::table::Table;
use serde::Serialize;

/// One structural element of a section, cell, or container.
///
/// Elements are always kept in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Paragraph(Paragraph),
    Table(Box<Table>),
    Image(Image),
    Line(Line),
    Rect(Rect),
    Ellipse(Ellipse),
    Arc(Arc),
    Polygon(Polygon),
    Curve(Curve),
    ConnectLine(ConnectLine),
    TextBox(TextBox),
    HorizontalRule(HorizontalRule),
    Container(Container),
    Equation(Equation),
    Ole(OleObject),
    TextArt(TextArt),
    UnknownObject(UnknownObject),
    FormControl(FormControl),
    Header(HeaderFooter),
    Footer(HeaderFooter),
    Video(Video),
    Chart(Chart),
}

impl Element {
    /// Short lowercase name of the variant, matching its serialized tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Element::Paragraph(_) => "paragraph",
            Element::Table(_) => "table",
            Element::Image(_) => "image",
            Element::Line(_) => "line",
            Element::Rect(_) => "rect",
            Element::Ellipse(_) => "ellipse",
            Element::Arc(_) => "arc",
            Element::Polygon(_) => "polygon",
            Element::Curve(_) => "curve",
            Element::ConnectLine(_) => "connect_line",
            Element::TextBox(_) => "text_box",
            Element::HorizontalRule(_) => "horizontal_rule",
            Element::Container(_) => "container",
            Element::Equation(_) => "equation",
            Element::Ole(_) => "ole",
            Element::TextArt(_) => "text_art",
            Element::UnknownObject(_) => "unknown_object",
            Element::FormControl(_) => "form_control",
            Element::Header(_) => "header",
            Element::Footer(_) => "footer",
            Element::Video(_) => "video",
            Element::Chart(_) => "chart",
        }
    }

    /// Plain text carried by the element.
    ///
    /// Tables yield tab-separated cells, text-bearing shapes yield their
    /// drawing text, equations their script. Purely graphical objects are empty.
    pub fn text(&self) -> String {
        match self {
            Element::Paragraph(p) => p.text(),
            Element::Table(t) => t.text(),
            Element::TextBox(b) => paragraphs_text(&b.paragraphs),
            Element::Ellipse(e) => paragraphs_text(&e.text),
            Element::Polygon(p) => paragraphs_text(&p.text),
            Element::Container(c) => c
                .children
                .iter()
                .map(Element::text)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            Element::Equation(e) => e.script.clone(),
            Element::TextArt(a) => a.text.clone(),
            Element::FormControl(f) => f.caption.clone().unwrap_or_default(),
            Element::Header(h) | Element::Footer(h) => elements_text(&h.elements),
            _ => String::new(),
        }
    }

    #[inline]
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Element::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    #[inline]
    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Element::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    #[inline]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Element::Table(t) => Some(t),
            _ => None,
        }
    }

    #[inline]
    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Element::Table(t) => Some(t),
            _ => None,
        }
    }

    #[inline]
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Element::Paragraph(_))
    }

    /// Placement of a drawing object; `None` for paragraphs and headers/footers.
    pub fn object(&self) -> Option<&ObjectProps> {
        Some(match self {
            Element::Table(t) => &t.object,
            Element::Image(e) => &e.object,
            Element::Line(e) => &e.object,
            Element::Rect(e) => &e.object,
            Element::Ellipse(e) => &e.object,
            Element::Arc(e) => &e.object,
            Element::Polygon(e) => &e.object,
            Element::Curve(e) => &e.object,
            Element::ConnectLine(e) => &e.object,
            Element::TextBox(e) => &e.object,
            Element::HorizontalRule(e) => &e.object,
            Element::Container(e) => &e.object,
            Element::Equation(e) => &e.object,
            Element::Ole(e) => &e.object,
            Element::TextArt(e) => &e.object,
            Element::UnknownObject(e) => &e.object,
            Element::FormControl(e) => &e.object,
            Element::Video(e) => &e.object,
            Element::Chart(e) => &e.object,
            Element::Paragraph(_) | Element::Header(_) | Element::Footer(_) => return None,
        })
    }

    /// Mutable placement, used to attach captions once they are decoded.
    pub fn object_mut(&mut self) -> Option<&mut ObjectProps> {
        Some(match self {
            Element::Table(t) => &mut t.object,
            Element::Image(e) => &mut e.object,
            Element::Line(e) => &mut e.object,
            Element::Rect(e) => &mut e.object,
            Element::Ellipse(e) => &mut e.object,
            Element::Arc(e) => &mut e.object,
            Element::Polygon(e) => &mut e.object,
            Element::Curve(e) => &mut e.object,
            Element::ConnectLine(e) => &mut e.object,
            Element::TextBox(e) => &mut e.object,
            Element::HorizontalRule(e) => &mut e.object,
            Element::Container(e) => &mut e.object,
            Element::Equation(e) => &mut e.object,
            Element::Ole(e) => &mut e.object,
            Element::TextArt(e) => &mut e.object,
            Element::UnknownObject(e) => &mut e.object,
            Element::FormControl(e) => &mut e.object,
            Element::Video(e) => &mut e.object,
            Element::Chart(e) => &mut e.object,
            Element::Paragraph(_) | Element::Header(_) | Element::Footer(_) => return None,
        })
    }
}

impl From<Paragraph> for Element {
    fn from(p: Paragraph) -> Self {
        Element::Paragraph(p)
    }
}

impl From<Table> for Element {
    fn from(t: Table) -> Self {
        Element::Table(Box::new(t))
    }
}

pub(crate) fn paragraphs_text(paragraphs: &[Paragraph]) -> String {
    paragraphs
        .iter()
        .map(Paragraph::text)
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn elements_text(elements: &[Element]) -> String {
    elements
        .iter()
        .map(Element::text)
        .collect::<Vec<_>>()
        .join("\n")
}
