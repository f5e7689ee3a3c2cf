//! Drawing object components (`SHAPE_COMPONENT` and its kind records).

use super::doc_info::decode_fill;
use super::tags;
use crate::common::binary::ByteCursor;
use crate::model::{
    Arc, ArcKind, Chart, Color, ConnectLine, Container, Curve, CurveSegment, Element, Ellipse,
    HorizontalRule, Image, Line, LineShape, ObjectProps, OleObject, Paragraph, Point, Polygon,
    Rect, ShapeStyle, TextArt, TextBox, UnknownObject, Video, VideoSource,
};

/// Shape payload read from the kind record that follows the component.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ComponentData {
    #[default]
    Empty,
    Line {
        start: Point,
        end: Point,
        connector: u32,
    },
    Rect {
        ratio: u8,
        corners: [Point; 4],
    },
    Ellipse {
        center: Point,
        axis1: Point,
        axis2: Point,
    },
    Arc {
        kind: ArcKind,
        center: Point,
        axis1: Point,
        axis2: Point,
    },
    Polygon(Vec<Point>),
    Curve {
        points: Vec<Point>,
        segments: Vec<CurveSegment>,
    },
    Picture {
        bin_id: u16,
        brightness: i8,
        contrast: i8,
    },
    Ole {
        bin_id: u16,
        extent_x: i32,
        extent_y: i32,
    },
    TextArt {
        text: String,
        font: Option<String>,
    },
    Video {
        local_bin: Option<u16>,
        web_tag: Option<String>,
        thumbnail: Option<u16>,
    },
}

/// One decoded shape component, possibly a container of further components.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Component {
    pub id: u32,
    /// Placement derived from the component's own offset and size
    pub object: ObjectProps,
    pub style: ShapeStyle,
    pub data: ComponentData,
    /// Drawing text
    pub text: Vec<Paragraph>,
    pub children: Vec<Element>,
}

fn point(c: &mut ByteCursor<'_>) -> Point {
    Point::new(c.i32().unwrap_or(0), c.i32().unwrap_or(0))
}

/// Decode a `SHAPE_COMPONENT` record.
///
/// A top-level component repeats its control id; a component nested in a
/// container stores it once.
pub fn decode_component(data: &[u8], top_level: bool) -> Component {
    let mut c = ByteCursor::new(data);
    let mut component = Component {
        id: c.u32().unwrap_or(0),
        ..Default::default()
    };
    if top_level {
        c.skip(4);
    }
    component.object.x = c.i32().unwrap_or(0);
    component.object.y = c.i32().unwrap_or(0);
    c.skip(4); // group level, local version
    c.skip(8); // initial size
    component.object.width = c.u32().unwrap_or(0);
    component.object.height = c.u32().unwrap_or(0);
    c.skip(4 + 2 + 8); // flip attributes, rotation angle and center

    // render matrices: translation, then a scale/rotation pair per entry
    let pairs = c.u16().unwrap_or(0) as usize;
    c.skip(48 + pairs * 96);

    if component.id != tags::SHAPE_CONTAINER && c.remaining() >= 13 {
        let color = c.u32().unwrap_or(0);
        let width = c.i32().unwrap_or(0);
        let attr = c.u32().unwrap_or(0);
        c.skip(1); // outline style
        component.style = ShapeStyle {
            line_color: Color::from_colorref(color),
            line_width: width,
            line_shape: LineShape::from_border_code((attr & 0x3F) as u8),
            fill: decode_fill(&mut c).into_iter().next(),
        };
    }
    component
}

impl Component {
    /// Apply the kind record that belongs to this component.
    pub fn apply_record(&mut self, tag: u16, data: &[u8]) {
        let mut c = ByteCursor::new(data);
        self.data = match tag {
            tags::SHAPE_COMPONENT_LINE => ComponentData::Line {
                start: point(&mut c),
                end: point(&mut c),
                connector: c.u32().unwrap_or(0),
            },
            tags::SHAPE_COMPONENT_RECTANGLE => ComponentData::Rect {
                ratio: c.u8().unwrap_or(0),
                corners: [point(&mut c), point(&mut c), point(&mut c), point(&mut c)],
            },
            tags::SHAPE_COMPONENT_ELLIPSE => {
                c.skip(4);
                ComponentData::Ellipse {
                    center: point(&mut c),
                    axis1: point(&mut c),
                    axis2: point(&mut c),
                }
            },
            tags::SHAPE_COMPONENT_ARC => ComponentData::Arc {
                kind: ArcKind::from_code((c.u32().unwrap_or(0) & 0xFF) as u8),
                center: point(&mut c),
                axis1: point(&mut c),
                axis2: point(&mut c),
            },
            tags::SHAPE_COMPONENT_POLYGON => {
                let count = c.i32().unwrap_or(0).clamp(0, (data.len() / 8) as i32);
                ComponentData::Polygon((0..count).map(|_| point(&mut c)).collect())
            },
            tags::SHAPE_COMPONENT_CURVE => {
                let count = c.i32().unwrap_or(0).clamp(0, (data.len() / 8) as i32) as usize;
                let points: Vec<Point> = (0..count).map(|_| point(&mut c)).collect();
                let segments = (1..count)
                    .map_while(|_| c.u8().ok())
                    .map(|kind| if kind == 1 { CurveSegment::Curve } else { CurveSegment::Line })
                    .collect();
                ComponentData::Curve { points, segments }
            },
            tags::SHAPE_COMPONENT_PICTURE => {
                // border color, width and attributes, four corners, crop, margins
                c.skip(68);
                let brightness = c.i8().unwrap_or(0);
                let contrast = c.i8().unwrap_or(0);
                c.skip(1); // effect
                ComponentData::Picture {
                    bin_id: c.u16().unwrap_or(0),
                    brightness,
                    contrast,
                }
            },
            tags::SHAPE_COMPONENT_OLE => {
                c.skip(4);
                let extent_x = c.i32().unwrap_or(0);
                let extent_y = c.i32().unwrap_or(0);
                ComponentData::Ole {
                    bin_id: c.u16().unwrap_or(0),
                    extent_x,
                    extent_y,
                }
            },
            tags::SHAPE_COMPONENT_TEXTART => {
                let text = c.utf16_string().unwrap_or_default();
                c.skip(32); // text frame corners
                ComponentData::TextArt {
                    text,
                    font: c.utf16_string().ok().filter(|s| !s.is_empty()),
                }
            },
            tags::VIDEO_DATA => match c.i32().unwrap_or(-1) {
                0 => ComponentData::Video {
                    local_bin: c.u16().ok(),
                    web_tag: None,
                    thumbnail: c.u16().ok().filter(|&id| id > 0),
                },
                1 => ComponentData::Video {
                    local_bin: None,
                    web_tag: c.utf16_string().ok(),
                    thumbnail: c.u16().ok().filter(|&id| id > 0),
                },
                other => {
                    tracing::debug!(kind = other, "unknown video source");
                    ComponentData::Video {
                        local_bin: None,
                        web_tag: None,
                        thumbnail: None,
                    }
                },
            },
            // containers list their child ids; the children follow as records
            tags::SHAPE_COMPONENT_CONTAINER | tags::CHART_DATA | tags::SHAPE_COMPONENT_UNKNOWN => return,
            other => {
                tracing::trace!(tag = other, "record ignored inside shape component");
                return;
            },
        };
    }

    /// Convert into a model element, mapping 1-based binary ids to asset keys.
    pub fn into_element(self, bin_key: &impl Fn(u16) -> Option<String>) -> Element {
        let Component {
            id,
            object,
            style,
            data,
            text,
            children,
        } = self;
        if !text.is_empty() && !matches!(id, tags::SHAPE_RECT | tags::SHAPE_ELLIPSE | tags::SHAPE_POLYGON) {
            tracing::debug!(shape = %tags::ctrl_name(id), "drawing text dropped");
        }
        match (id, data) {
            (tags::SHAPE_CONTAINER, _) => Element::Container(Container { object, children }),
            (tags::SHAPE_CONNECT_LINE, ComponentData::Line { start, end, connector }) => {
                Element::ConnectLine(ConnectLine {
                    object,
                    start,
                    end,
                    connector,
                    style,
                })
            },
            (tags::SHAPE_LINE, ComponentData::Line { start, end, .. }) => {
                let line = Line {
                    object,
                    start,
                    end,
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
            (tags::SHAPE_RECT, data) if !text.is_empty() => {
                if !matches!(data, ComponentData::Rect { .. } | ComponentData::Empty) {
                    tracing::debug!("unexpected rectangle payload");
                }
                Element::TextBox(TextBox {
                    object,
                    style,
                    paragraphs: text,
                })
            },
            (tags::SHAPE_RECT, ComponentData::Rect { ratio, corners }) => Element::Rect(Rect {
                object,
                corner_ratio: ratio,
                corners,
                style,
            }),
            (tags::SHAPE_ELLIPSE, ComponentData::Ellipse { center, axis1, axis2 }) => {
                Element::Ellipse(Ellipse {
                    object,
                    center,
                    axis1,
                    axis2,
                    style,
                    text,
                })
            },
            (tags::SHAPE_ARC, ComponentData::Arc {
                kind,
                center,
                axis1,
                axis2,
            }) => Element::Arc(Arc {
                object,
                kind,
                center,
                axis1,
                axis2,
                style,
            }),
            (tags::SHAPE_POLYGON, ComponentData::Polygon(points)) => Element::Polygon(Polygon {
                object,
                points,
                style,
                text,
            }),
            (tags::SHAPE_CURVE, ComponentData::Curve { points, segments }) => Element::Curve(Curve {
                object,
                points,
                segments,
                style,
            }),
            (tags::SHAPE_PICTURE, ComponentData::Picture {
                bin_id,
                brightness,
                contrast,
            }) => Element::Image(Image {
                object,
                bin_id: bin_key(bin_id),
                brightness,
                contrast,
                style,
            }),
            (tags::SHAPE_OLE, ComponentData::Ole {
                bin_id,
                extent_x,
                extent_y,
            }) => Element::Ole(OleObject {
                object,
                bin_id: bin_key(bin_id),
                extent_x,
                extent_y,
            }),
            (tags::SHAPE_TEXTART, ComponentData::TextArt { text, font }) => {
                Element::TextArt(TextArt {
                    object,
                    text,
                    font,
                    style,
                })
            },
            (tags::SHAPE_VIDEO, ComponentData::Video {
                local_bin,
                web_tag,
                thumbnail,
            }) => {
                let source = match (local_bin.and_then(bin_key), web_tag) {
                    (Some(bin_id), _) => VideoSource::Local { bin_id },
                    (None, Some(tag)) => VideoSource::Web { tag },
                    (None, None) => VideoSource::Unknown,
                };
                Element::Video(Video {
                    object,
                    source,
                    thumbnail_bin_id: thumbnail.and_then(bin_key),
                })
            },
            (tags::SHAPE_CHART, _) => Element::Chart(Chart {
                object,
                chart_id: None,
            }),
            (id, _) => {
                tracing::debug!(shape = %tags::ctrl_name(id), "unrecognized shape component");
                Element::UnknownObject(UnknownObject {
                    object,
                    ctrl_id: tags::ctrl_name(id),
                })
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::shape_component as component_record;
    use super::*;

    fn points(values: &[(i32, i32)]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|(x, y)| x.to_le_bytes().into_iter().chain(y.to_le_bytes()))
            .collect()
    }

    fn keys(id: u16) -> Option<String> {
        (id > 0).then(|| format!("BIN{:04X}", id))
    }

    #[test]
    fn test_decode_component_header() {
        let component = decode_component(&component_record(tags::SHAPE_LINE, true), true);
        assert_eq!(component.id, tags::SHAPE_LINE);
        assert_eq!((component.object.x, component.object.y), (100, 200));
        assert_eq!((component.object.width, component.object.height), (3000, 1500));
        assert_eq!(component.style.line_color, Some(Color::rgb(255, 0, 0)));
        assert_eq!(component.style.line_width, 33);
        assert_eq!(component.style.fill, None);

        let nested = decode_component(&component_record(tags::SHAPE_RECT, false), false);
        assert_eq!(nested.id, tags::SHAPE_RECT);
        assert_eq!(nested.object.width, 3000);
    }

    #[test]
    fn test_flat_line_becomes_rule() {
        let mut component = decode_component(&component_record(tags::SHAPE_LINE, true), true);
        component.apply_record(tags::SHAPE_COMPONENT_LINE, &points(&[(0, 50), (3000, 50)]));
        assert!(matches!(component.clone().into_element(&keys), Element::HorizontalRule(_)));

        component.apply_record(tags::SHAPE_COMPONENT_LINE, &points(&[(0, 0), (3000, 50)]));
        assert!(matches!(component.into_element(&keys), Element::Line(_)));
    }

    #[test]
    fn test_rect_with_text_is_text_box() {
        let mut component = decode_component(&component_record(tags::SHAPE_RECT, true), true);
        let mut rect = vec![20u8];
        rect.extend(points(&[(0, 0), (10, 0), (10, 10), (0, 10)]));
        component.apply_record(tags::SHAPE_COMPONENT_RECTANGLE, &rect);
        match component.clone().into_element(&keys) {
            Element::Rect(r) => {
                assert_eq!(r.corner_ratio, 20);
                assert_eq!(r.corners[2], Point::new(10, 10));
            },
            other => panic!("expected rect, got {}", other.kind()),
        }

        component.text = vec![Paragraph::with_text("상자")];
        let element = component.into_element(&keys);
        assert_eq!(element.kind(), "text_box");
        assert_eq!(element.text(), "상자");
    }

    #[test]
    fn test_picture_bin_id() {
        let mut component = decode_component(&component_record(tags::SHAPE_PICTURE, true), true);
        let mut pic = vec![0u8; 68];
        pic.push(10);
        pic.push(0xF6);
        pic.push(0);
        pic.extend_from_slice(&2u16.to_le_bytes());
        component.apply_record(tags::SHAPE_COMPONENT_PICTURE, &pic);
        match component.into_element(&keys) {
            Element::Image(image) => {
                assert_eq!(image.bin_id.as_deref(), Some("BIN0002"));
                assert_eq!((image.brightness, image.contrast), (10, -10));
            },
            other => panic!("expected image, got {}", other.kind()),
        }
    }

    #[test]
    fn test_polygon_and_curve() {
        let mut component = decode_component(&component_record(tags::SHAPE_POLYGON, true), true);
        let mut data = 3i32.to_le_bytes().to_vec();
        data.extend(points(&[(0, 0), (5, 0), (0, 5)]));
        component.apply_record(tags::SHAPE_COMPONENT_POLYGON, &data);
        match component.into_element(&keys) {
            Element::Polygon(p) => assert_eq!(p.points.len(), 3),
            other => panic!("expected polygon, got {}", other.kind()),
        }

        let mut component = decode_component(&component_record(tags::SHAPE_CURVE, true), true);
        data.extend_from_slice(&[1, 0]);
        component.apply_record(tags::SHAPE_COMPONENT_CURVE, &data);
        match component.into_element(&keys) {
            Element::Curve(c) => assert_eq!(c.segments, vec![CurveSegment::Curve, CurveSegment::Line]),
            other => panic!("expected curve, got {}", other.kind()),
        }
    }

    #[test]
    fn test_unknown_component() {
        let component = decode_component(&tags::ctrl_id(b"$zzz").to_le_bytes(), false);
        match component.into_element(&keys) {
            Element::UnknownObject(u) => assert_eq!(u.ctrl_id, "$zzz"),
            other => panic!("expected unknown object, got {}", other.kind()),
        }
    }
}
