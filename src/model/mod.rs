//! Unified document model shared by the HWP and HWPX decoders.
//!
//! Every type derives `serde::Serialize` so a parsed [`Document`] can be
//! projected to JSON without any extra mapping.

mod document;
mod element;
mod paragraph;
mod section;
mod shape;
mod style;
mod table;

pub use crate::common::Metadata;
pub use document::{Asset, Document};
pub use element::Element;
pub use paragraph::{FieldKind, LineSegment, NoteKind, Paragraph, Run, RunKind, hyperlink_target};
pub use section::{ColumnDef, ColumnKind, Memo, Note, PageDef, Section};
pub use shape::{
    Arc, ArcKind, Chart, ConnectLine, Container, Curve, CurveSegment, Ellipse, Equation,
    FormControl, FormKind, HeaderFooter, HorizontalRule, Image, Line, Margins, ObjectProps,
    OleObject, PageApply, Point, Polygon, Rect, ShapeStyle, TextArt, TextBox, UnknownObject,
    Video, VideoSource,
};
pub use style::{
    Alignment, BorderFill, BorderLine, Bullet, CharStyle, Color, Fill, Font, FontSlot, HeadingKind,
    Language, LineShape, LineSpacingUnit, MemoShape, Numbering, ParaHead, ParaStyle, Shadow,
    StyleDef, StyleKind, StyleTables, Strikeout, TabDef, TabKind, TabStop, Underline,
    UnderlineKind,
};
pub use table::{Cell, MAX_GRID_POSITIONS, Row, Table, TableGrid, VerticalAlign};
