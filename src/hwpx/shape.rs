//! Drawing objects and embedded controls of section XML.

use super::attrs::{Attrs, leaf_text};
use super::header::parse_fill_brush;
use super::scanner::{TagSpan, direct_child, direct_children, extract_balanced_matching, first_tag};
use super::section::{SectionDecoder, into_paragraphs};
use crate::model::{
    Arc, ArcKind, Chart, ConnectLine, Container, Curve, CurveSegment, Element, Ellipse, Equation,
    FormControl, FormKind, HorizontalRule, Image, Line, LineShape, Margins, ObjectProps,
    OleObject, Paragraph, Point, Polygon, Rect, ShapeStyle, TextArt, TextBox, UnknownObject,
    Video, VideoSource,
};
use phf::phf_map;

/// Object kinds, keyed by element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ObjectTag {
    Table,
    Picture,
    Line,
    Rect,
    Ellipse,
    Arc,
    Polygon,
    Curve,
    ConnectLine,
    Container,
    Equation,
    Ole,
    TextArt,
    Video,
    Chart,
    Form,
}

static OBJECT_TAGS: phf::Map<&'static str, ObjectTag> = phf_map! {
    "hp:tbl" => ObjectTag::Table,
    "hp:pic" => ObjectTag::Picture,
    "hp:line" => ObjectTag::Line,
    "hp:rect" => ObjectTag::Rect,
    "hp:ellipse" => ObjectTag::Ellipse,
    "hp:arc" => ObjectTag::Arc,
    "hp:polygon" => ObjectTag::Polygon,
    "hp:curve" => ObjectTag::Curve,
    "hp:connectLine" => ObjectTag::ConnectLine,
    "hp:container" => ObjectTag::Container,
    "hp:equation" => ObjectTag::Equation,
    "hp:ole" => ObjectTag::Ole,
    "hp:textart" => ObjectTag::TextArt,
    "hp:video" => ObjectTag::Video,
    "hp:chart" => ObjectTag::Chart,
    "hp:btn" => ObjectTag::Form,
    "hp:radioBtn" => ObjectTag::Form,
    "hp:checkBtn" => ObjectTag::Form,
    "hp:comboBox" => ObjectTag::Form,
    "hp:edit" => ObjectTag::Form,
    "hp:listBox" => ObjectTag::Form,
    "hp:scrollBar" => ObjectTag::Form,
};

#[inline]
pub(crate) fn object_tag(name: &str) -> Option<ObjectTag> {
    OBJECT_TAGS.get(name).copied()
}

#[inline]
pub(crate) fn is_object_tag(name: &str) -> bool {
    OBJECT_TAGS.contains_key(name)
}

/// Connector routing names in the order of their legacy codes.
const CONNECTOR_TYPES: [&str; 9] = [
    "STRAIGHT_NOARROW",
    "STRAIGHT_ONEWAY",
    "STRAIGHT_BOTH",
    "STROKE_NOARROW",
    "STROKE_ONEWAY",
    "STROKE_BOTH",
    "ARC_NOARROW",
    "ARC_ONEWAY",
    "ARC_BOTH",
];

fn point(inner: &str, tag: &str) -> Point {
    direct_child(inner, tag)
        .map(|span| {
            let attrs = Attrs::parse(span.open_tag(inner));
            Point::new(attrs.i32("x").unwrap_or(0), attrs.i32("y").unwrap_or(0))
        })
        .unwrap_or_default()
}

fn child_attrs(inner: &str, tag: &str) -> Option<Attrs> {
    direct_child(inner, tag).map(|span| Attrs::parse(span.open_tag(inner)))
}

fn margins(attrs: &Attrs) -> Margins {
    Margins {
        left: attrs.i32("left").unwrap_or(0),
        right: attrs.i32("right").unwrap_or(0),
        top: attrs.i32("top").unwrap_or(0),
        bottom: attrs.i32("bottom").unwrap_or(0),
    }
}

pub(crate) fn child_margins(inner: &str, tag: &str) -> Margins {
    child_attrs(inner, tag).map(|a| margins(&a)).unwrap_or_default()
}

fn shape_style(inner: &str) -> ShapeStyle {
    let line = child_attrs(inner, "hp:lineShape");
    ShapeStyle {
        line_color: line.as_ref().and_then(|a| a.color("color")),
        line_width: line.as_ref().and_then(|a| a.i32("width")).unwrap_or(0),
        line_shape: line
            .as_ref()
            .and_then(|a| a.get("style"))
            .map_or(LineShape::Solid, LineShape::from_hwpx_name),
        fill: direct_child(inner, "hc:fillBrush")
            .and_then(|brush| parse_fill_brush(brush.inner(inner)).into_iter().next()),
    }
}

/// Signed picture adjustment, clamped to the legacy byte range.
fn adjustment(attrs: &Attrs, name: &str) -> i8 {
    attrs
        .i32(name)
        .map_or(0, |v| v.clamp(i8::MIN as i32, i8::MAX as i32) as i8)
}

impl SectionDecoder<'_> {
    /// Decode the object element at `span`; `None` for objects that carry
    /// nothing usable.
    pub(crate) fn decode_object(&mut self, xml: &str, span: &TagSpan) -> Option<Element> {
        let name = span.name(xml);
        let Some(tag) = object_tag(name) else {
            return Some(Element::UnknownObject(UnknownObject {
                ctrl_id: name.to_string(),
                ..Default::default()
            }));
        };
        if tag == ObjectTag::Table {
            return Some(self.decode_table(xml, span));
        }

        let inner = span.inner(xml);
        let attrs = Attrs::parse(span.open_tag(xml));
        let object = self.object_props(inner, &attrs);
        let style = shape_style(inner);
        let element = match tag {
            ObjectTag::Picture => {
                let img = child_attrs(inner, "hc:img").unwrap_or_default();
                Element::Image(Image {
                    object,
                    bin_id: img.string("binaryItemIDRef"),
                    brightness: adjustment(&img, "bright"),
                    contrast: adjustment(&img, "contrast"),
                    style,
                })
            },
            ObjectTag::Line => {
                let line = Line {
                    object,
                    start: point(inner, "hc:startPt"),
                    end: point(inner, "hc:endPt"),
                    style,
                };
                if line.is_horizontal() {
                    Element::HorizontalRule(HorizontalRule {
                        object: line.object,
                        style: line.style,
                    })
                } else {
                    Element::Line(line)
                }
            },
            ObjectTag::Rect => {
                let text = self.draw_text(inner);
                if text.is_empty() {
                    Element::Rect(Rect {
                        object,
                        corner_ratio: attrs.u32("ratio").map_or(0, |r| r.min(100) as u8),
                        corners: [
                            point(inner, "hc:pt0"),
                            point(inner, "hc:pt1"),
                            point(inner, "hc:pt2"),
                            point(inner, "hc:pt3"),
                        ],
                        style,
                    })
                } else {
                    Element::TextBox(TextBox {
                        object,
                        style,
                        paragraphs: text,
                    })
                }
            },
            ObjectTag::Ellipse => Element::Ellipse(Ellipse {
                object,
                center: point(inner, "hc:center"),
                axis1: point(inner, "hc:ax1"),
                axis2: point(inner, "hc:ax2"),
                style,
                text: self.draw_text(inner),
            }),
            ObjectTag::Arc => Element::Arc(Arc {
                object,
                kind: attrs.get("type").map_or(ArcKind::Normal, ArcKind::from_hwpx_name),
                center: point(inner, "hc:center"),
                axis1: point(inner, "hc:ax1"),
                axis2: point(inner, "hc:ax2"),
                style,
            }),
            ObjectTag::Polygon => Element::Polygon(Polygon {
                object,
                points: direct_children(inner, "hc:pt")
                    .iter()
                    .map(|pt| {
                        let a = Attrs::parse(pt.open_tag(inner));
                        Point::new(a.i32("x").unwrap_or(0), a.i32("y").unwrap_or(0))
                    })
                    .collect(),
                style,
                text: self.draw_text(inner),
            }),
            ObjectTag::Curve => {
                let mut points = Vec::new();
                let mut segments = Vec::new();
                for seg in direct_children(inner, "hp:seg") {
                    let a = Attrs::parse(seg.open_tag(inner));
                    if points.is_empty() {
                        points.push(Point::new(a.i32("x1").unwrap_or(0), a.i32("y1").unwrap_or(0)));
                    }
                    points.push(Point::new(a.i32("x2").unwrap_or(0), a.i32("y2").unwrap_or(0)));
                    segments.push(match a.get("type") {
                        Some("CURVE") => CurveSegment::Curve,
                        _ => CurveSegment::Line,
                    });
                }
                Element::Curve(Curve {
                    object,
                    points,
                    segments,
                    style,
                })
            },
            ObjectTag::ConnectLine => Element::ConnectLine(ConnectLine {
                object,
                start: point(inner, "hp:startPt"),
                end: point(inner, "hp:endPt"),
                connector: attrs
                    .get("type")
                    .and_then(|t| CONNECTOR_TYPES.iter().position(|c| *c == t))
                    .unwrap_or(0) as u32,
                style,
            }),
            ObjectTag::Container => {
                let children = extract_balanced_matching(inner, is_object_tag)
                    .iter()
                    .filter_map(|child| self.decode_object(inner, child))
                    .collect();
                Element::Container(Container { object, children })
            },
            ObjectTag::Equation => Element::Equation(Equation {
                object,
                script: direct_child(inner, "hp:script")
                    .and_then(|s| leaf_text(s.inner(inner)).ok().flatten())
                    .unwrap_or_default(),
                base_size: attrs.u32("baseUnit").unwrap_or(0),
                color: attrs.color("textColor"),
                version: attrs.string("version"),
                font: attrs.string("font"),
            }),
            ObjectTag::Ole => {
                let extent = child_attrs(inner, "hc:extent").unwrap_or_default();
                Element::Ole(OleObject {
                    object,
                    bin_id: attrs.string("binaryItemIDRef"),
                    extent_x: extent.i32("x").unwrap_or(0),
                    extent_y: extent.i32("y").unwrap_or(0),
                })
            },
            ObjectTag::TextArt => Element::TextArt(TextArt {
                object,
                text: attrs.get("text").unwrap_or_default().to_string(),
                font: child_attrs(inner, "hp:textartPr").and_then(|a| a.string("fontName")),
                style,
            }),
            ObjectTag::Video => {
                let source = match (attrs.get("videotype"), attrs.string("fileIDRef"), attrs.string("tag")) {
                    (Some("Web"), _, Some(tag)) => VideoSource::Web { tag },
                    (_, Some(bin_id), _) => VideoSource::Local { bin_id },
                    _ => VideoSource::Unknown,
                };
                Element::Video(Video {
                    object,
                    source,
                    thumbnail_bin_id: attrs.string("imageIDRef"),
                })
            },
            ObjectTag::Chart => Element::Chart(Chart {
                object,
                chart_id: attrs.string("chartIDRef"),
            }),
            ObjectTag::Form => Element::FormControl(FormControl {
                object,
                kind: FormKind::from_hwpx_tag(name),
                name: attrs.string("name"),
                caption: attrs.string("caption"),
                value: attrs.string("value").or_else(|| {
                    direct_child(inner, "hp:text").and_then(|t| leaf_text(t.inner(inner)).ok().flatten())
                }),
            }),
            ObjectTag::Table => return None,
        };
        Some(element)
    }

    /// Placement shared by tables, pictures, shapes and controls.
    pub(crate) fn object_props(&mut self, inner: &str, attrs: &Attrs) -> ObjectProps {
        let size = child_attrs(inner, "hp:sz").unwrap_or_default();
        let pos = child_attrs(inner, "hp:pos").unwrap_or_default();
        ObjectProps {
            instance_id: attrs.u32("id").unwrap_or(0),
            treat_as_char: pos.flag("treatAsChar"),
            x: pos.i32("horzOffset").unwrap_or(0),
            y: pos.i32("vertOffset").unwrap_or(0),
            width: size.u32("width").unwrap_or(0),
            height: size.u32("height").unwrap_or(0),
            z_order: attrs.i32("zOrder").unwrap_or(0),
            outer_margins: child_margins(inner, "hp:outMargin"),
            description: direct_child(inner, "hp:shapeComment")
                .and_then(|c| leaf_text(c.inner(inner)).ok().flatten()),
            caption: match direct_child(inner, "hp:caption") {
                Some(caption) => self.list_paragraphs(caption.inner(inner)),
                None => Vec::new(),
            },
        }
    }

    /// Paragraphs of the `hp:drawText` of a shape.
    fn draw_text(&mut self, inner: &str) -> Vec<Paragraph> {
        match direct_child(inner, "hp:drawText") {
            Some(text) => self.list_paragraphs(text.inner(inner)),
            None => Vec::new(),
        }
    }

    fn list_paragraphs(&mut self, xml: &str) -> Vec<Paragraph> {
        match first_tag(xml, "hp:subList") {
            Some(list) => into_paragraphs(self.decode_blocks(list.inner(xml), false)),
            None => Vec::new(),
        }
    }
}
