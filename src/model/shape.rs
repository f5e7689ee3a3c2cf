//! Drawing objects and embedded controls.

use super::element::Element;
use super::paragraph::Paragraph;
use super::style::{Color, Fill, LineShape};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Margins {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

/// Placement shared by every floating or inline object.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ObjectProps {
    pub instance_id: u32,
    /// Laid out as a character inside its paragraph
    pub treat_as_char: bool,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub z_order: i32,
    pub outer_margins: Margins,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub caption: Vec<Paragraph>,
}

/// Outline and fill of a drawing object.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ShapeStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_color: Option<Color>,
    pub line_width: i32,
    pub line_shape: LineShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Image {
    pub object: ObjectProps,
    /// Asset key of the picture data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_id: Option<String>,
    pub brightness: i8,
    pub contrast: i8,
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Line {
    pub object: ObjectProps,
    pub start: Point,
    pub end: Point,
    pub style: ShapeStyle,
}

impl Line {
    /// A line with no vertical extent, rendered as a horizontal rule.
    #[inline]
    pub fn is_horizontal(&self) -> bool {
        self.start.y == self.end.y
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Rect {
    pub object: ObjectProps,
    /// Corner rounding in percent
    pub corner_ratio: u8,
    pub corners: [Point; 4],
    pub style: ShapeStyle,
}

/// A rectangle carrying drawing text.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TextBox {
    pub object: ObjectProps,
    pub style: ShapeStyle,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HorizontalRule {
    pub object: ObjectProps,
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Ellipse {
    pub object: ObjectProps,
    pub center: Point,
    pub axis1: Point,
    pub axis2: Point,
    pub style: ShapeStyle,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<Paragraph>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcKind {
    #[default]
    Normal,
    Pie,
    Chord,
}

impl ArcKind {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ArcKind::Pie,
            2 => ArcKind::Chord,
            _ => ArcKind::Normal,
        }
    }

    pub fn from_hwpx_name(name: &str) -> Self {
        match name {
            "PIE" => ArcKind::Pie,
            "CHORD" => ArcKind::Chord,
            _ => ArcKind::Normal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Arc {
    pub object: ObjectProps,
    pub kind: ArcKind,
    pub center: Point,
    pub axis1: Point,
    pub axis2: Point,
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Polygon {
    pub object: ObjectProps,
    pub points: Vec<Point>,
    pub style: ShapeStyle,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<Paragraph>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveSegment {
    Line,
    Curve,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Curve {
    pub object: ObjectProps,
    pub points: Vec<Point>,
    pub segments: Vec<CurveSegment>,
    pub style: ShapeStyle,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConnectLine {
    pub object: ObjectProps,
    pub start: Point,
    pub end: Point,
    /// Connector routing (straight, stroke, arc and their arrowed forms)
    pub connector: u32,
    pub style: ShapeStyle,
}

/// Grouped drawing objects.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Container {
    pub object: ObjectProps,
    pub children: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Equation {
    pub object: ObjectProps,
    /// Equation script in the editor's own notation
    pub script: String,
    /// Base font size in HWPUNIT
    pub base_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OleObject {
    pub object: ObjectProps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_id: Option<String>,
    pub extent_x: i32,
    pub extent_y: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TextArt {
    pub object: ObjectProps,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    pub style: ShapeStyle,
}

/// Object whose control id is not understood; kept so document order is intact.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UnknownObject {
    pub object: ObjectProps,
    pub ctrl_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    PushButton,
    RadioButton,
    CheckBox,
    ComboBox,
    Edit,
    ListBox,
    ScrollBar,
    #[default]
    Unknown,
}

impl FormKind {
    pub fn from_hwpx_tag(tag: &str) -> Self {
        match tag {
            "hp:btn" => FormKind::PushButton,
            "hp:radioBtn" => FormKind::RadioButton,
            "hp:checkBtn" => FormKind::CheckBox,
            "hp:comboBox" => FormKind::ComboBox,
            "hp:edit" => FormKind::Edit,
            "hp:listBox" => FormKind::ListBox,
            "hp:scrollBar" => FormKind::ScrollBar,
            _ => FormKind::Unknown,
        }
    }

    /// Map the `Type` property of a legacy form object.
    pub fn from_legacy_type(name: &str) -> Self {
        match name {
            "PushButton" => FormKind::PushButton,
            "RadioButton" => FormKind::RadioButton,
            "CheckBox" => FormKind::CheckBox,
            "ComboBox" => FormKind::ComboBox,
            "Edit" => FormKind::Edit,
            "ListBox" => FormKind::ListBox,
            "ScrollBar" => FormKind::ScrollBar,
            _ => FormKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FormControl {
    pub object: ObjectProps,
    pub kind: FormKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum VideoSource {
    /// Embedded video data
    Local { bin_id: String },
    /// Web video referenced by its embed tag
    Web { tag: String },
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Video {
    pub object: ObjectProps,
    pub source: VideoSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_bin_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Chart {
    pub object: ObjectProps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_id: Option<String>,
}

/// Pages a header or footer applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageApply {
    #[default]
    Both,
    Even,
    Odd,
}

impl PageApply {
    pub fn from_code(code: u32) -> Self {
        match code & 0x3 {
            1 => PageApply::Even,
            2 => PageApply::Odd,
            _ => PageApply::Both,
        }
    }

    pub fn from_hwpx_name(name: &str) -> Self {
        match name {
            "EVEN" => PageApply::Even,
            "ODD" => PageApply::Odd,
            _ => PageApply::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HeaderFooter {
    pub apply_to: PageApply,
    pub elements: Vec<Element>,
}
