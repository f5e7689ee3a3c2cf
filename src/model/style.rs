//! Style tables and the resolved style records they hold.
//!
//! Both decoders fill one [`StyleTables`] value before any section is
//! decoded. IDs are format-local: the legacy decoder assigns them by
//! encounter order, the XML decoder reads them from `id` attributes.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// 24-bit RGB color.
///
/// Serializes as `"#RRGGBB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Decode a Windows COLORREF (`0x00BBGGRR`).
    ///
    /// `0xFFFFFFFF` is the "no color" sentinel and yields `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hwpdoc::model::Color;
    /// assert_eq!(Color::from_colorref(0x000000FF), Some(Color::rgb(255, 0, 0)));
    /// assert_eq!(Color::from_colorref(0xFFFFFFFF), None);
    /// ```
    pub fn from_colorref(value: u32) -> Option<Self> {
        if value == 0xFFFF_FFFF {
            return None;
        }
        Some(Self {
            r: (value & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: ((value >> 16) & 0xFF) as u8,
        })
    }

    /// Parse `#RRGGBB` (or `#AARRGGBB`, alpha ignored). `none` yields `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hwpdoc::model::Color;
    /// assert_eq!(Color::from_hex("#00FF80"), Some(Color::rgb(0, 255, 128)));
    /// assert_eq!(Color::from_hex("none"), None);
    /// ```
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#')?;
        let hex = match hex.len() {
            6 => hex,
            8 => &hex[2..],
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Script groups that carry their own font selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Hangul,
    Latin,
    Hanja,
    Japanese,
    Other,
    Symbol,
    User,
}

impl Language {
    /// All languages in on-disk slot order.
    pub const ALL: [Language; 7] = [
        Language::Hangul,
        Language::Latin,
        Language::Hanja,
        Language::Japanese,
        Language::Other,
        Language::Symbol,
        Language::User,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Map an HWPX `lang` attribute or per-language attribute name.
    pub fn from_hwpx_name(name: &str) -> Option<Self> {
        let lang = match name.to_ascii_uppercase().as_str() {
            "HANGUL" => Language::Hangul,
            "LATIN" => Language::Latin,
            "HANJA" => Language::Hanja,
            "JAPANESE" => Language::Japanese,
            "OTHER" => Language::Other,
            "SYMBOL" => Language::Symbol,
            "USER" => Language::User,
            _ => return None,
        };
        Some(lang)
    }
}

/// Per-language font selection inside a character style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FontSlot {
    pub font_id: u16,
    /// Face name resolved through the font table of the slot's language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<String>,
    /// Width ratio in percent
    pub ratio: u8,
    /// Letter spacing in percent
    pub spacing: i8,
    /// Relative size in percent
    pub relative_size: u8,
    /// Vertical offset in percent
    pub offset: i8,
}

impl Default for FontSlot {
    fn default() -> Self {
        Self {
            font_id: 0,
            face: None,
            ratio: 100,
            spacing: 0,
            relative_size: 100,
            offset: 0,
        }
    }
}

/// Line shape shared by underlines, strikeouts, borders and tab leaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineShape {
    None,
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
    LongDash,
    Circle,
    Double,
    ThinThick,
    ThickThin,
    ThinThickThin,
    Wave,
    DoubleWave,
}

impl LineShape {
    const SOLID_BASED: [LineShape; 13] = [
        LineShape::Solid,
        LineShape::Dash,
        LineShape::Dot,
        LineShape::DashDot,
        LineShape::DashDotDot,
        LineShape::LongDash,
        LineShape::Circle,
        LineShape::Double,
        LineShape::ThinThick,
        LineShape::ThickThin,
        LineShape::ThinThickThin,
        LineShape::Wave,
        LineShape::DoubleWave,
    ];

    /// Decode a character-shape line code, where 0 is a solid line.
    pub fn from_char_shape_code(code: u8) -> Self {
        Self::SOLID_BASED
            .get(code as usize)
            .copied()
            .unwrap_or(LineShape::Solid)
    }

    /// Decode a border or leader line code, where 0 is no line.
    pub fn from_border_code(code: u8) -> Self {
        match code {
            0 => LineShape::None,
            n => Self::SOLID_BASED
                .get(n as usize - 1)
                .copied()
                .unwrap_or(LineShape::Solid),
        }
    }

    /// Decode an HWPX line type name such as `DASH_DOT` or `SLIM_THICK`.
    pub fn from_hwpx_name(name: &str) -> Self {
        match name {
            "NONE" => LineShape::None,
            "SOLID" => LineShape::Solid,
            "DASH" => LineShape::Dash,
            "DOT" => LineShape::Dot,
            "DASH_DOT" => LineShape::DashDot,
            "DASH_DOT_DOT" => LineShape::DashDotDot,
            "LONG_DASH" => LineShape::LongDash,
            "CIRCLE" => LineShape::Circle,
            "DOUBLE_SLIM" | "DOUBLE" => LineShape::Double,
            "SLIM_THICK" => LineShape::ThinThick,
            "THICK_SLIM" => LineShape::ThickThin,
            "SLIM_THICK_SLIM" => LineShape::ThinThickThin,
            "WAVE" => LineShape::Wave,
            "DOUBLE_WAVE" => LineShape::DoubleWave,
            _ => LineShape::Solid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnderlineKind {
    #[default]
    Bottom,
    Center,
    Top,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Underline {
    pub kind: UnderlineKind,
    pub shape: LineShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Strikeout {
    pub shape: LineShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shadow {
    /// Continuous (true) or discrete (false) shadow
    pub continuous: bool,
    pub offset_x: i8,
    pub offset_y: i8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

/// Resolved character style.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CharStyle {
    /// Font slots in [`Language::ALL`] order
    pub fonts: [FontSlot; 7],
    /// Base size in hundredths of a point
    pub base_size: i32,
    pub bold: bool,
    pub italic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<Underline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikeout: Option<Strikeout>,
    pub superscript: bool,
    pub subscript: bool,
    pub emboss: bool,
    pub engrave: bool,
    pub outline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shade_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_fill_id: Option<u32>,
}

impl CharStyle {
    #[inline]
    pub fn font(&self, lang: Language) -> &FontSlot {
        &self.fonts[lang.index()]
    }

    /// Base size in points.
    #[inline]
    pub fn size_pt(&self) -> f64 {
        crate::common::unit::hwpunit_to_pt(self.base_size as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Justify,
    Left,
    Right,
    Center,
    Distribute,
    Divide,
}

impl Alignment {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Alignment::Left,
            2 => Alignment::Right,
            3 => Alignment::Center,
            4 => Alignment::Distribute,
            5 => Alignment::Divide,
            _ => Alignment::Justify,
        }
    }

    pub fn from_hwpx_name(name: &str) -> Self {
        match name {
            "LEFT" => Alignment::Left,
            "RIGHT" => Alignment::Right,
            "CENTER" => Alignment::Center,
            "DISTRIBUTE" => Alignment::Distribute,
            "DISTRIBUTE_SPACE" => Alignment::Divide,
            _ => Alignment::Justify,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSpacingUnit {
    /// Percentage of the font height
    #[default]
    Percent,
    /// Fixed line height in HWPUNIT
    Fixed,
    /// Space between lines in HWPUNIT
    BetweenLines,
    /// Minimum line height in HWPUNIT
    AtLeast,
}

impl LineSpacingUnit {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => LineSpacingUnit::Fixed,
            2 => LineSpacingUnit::BetweenLines,
            3 => LineSpacingUnit::AtLeast,
            _ => LineSpacingUnit::Percent,
        }
    }

    pub fn from_hwpx_name(name: &str) -> Self {
        match name {
            "FIXED" => LineSpacingUnit::Fixed,
            "BETWEEN_LINES" => LineSpacingUnit::BetweenLines,
            "AT_LEAST" => LineSpacingUnit::AtLeast,
            _ => LineSpacingUnit::Percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingKind {
    #[default]
    None,
    Outline,
    Number,
    Bullet,
}

impl HeadingKind {
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => HeadingKind::Outline,
            2 => HeadingKind::Number,
            3 => HeadingKind::Bullet,
            _ => HeadingKind::None,
        }
    }

    pub fn from_hwpx_name(name: &str) -> Self {
        match name {
            "OUTLINE" => HeadingKind::Outline,
            "NUMBER" => HeadingKind::Number,
            "BULLET" => HeadingKind::Bullet,
            _ => HeadingKind::None,
        }
    }
}

/// Resolved paragraph style.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParaStyle {
    pub alignment: Alignment,
    pub margin_left: i32,
    pub margin_right: i32,
    /// First-line indent; negative values are hanging indents
    pub indent: i32,
    pub spacing_before: i32,
    pub spacing_after: i32,
    pub line_spacing: i32,
    pub line_spacing_unit: LineSpacingUnit,
    pub keep_with_next: bool,
    pub keep_lines: bool,
    pub page_break_before: bool,
    pub widow_orphan: bool,
    pub heading: HeadingKind,
    /// Numbering or bullet id referenced by the heading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_id: Option<u32>,
    /// Outline level 1..=7 when the paragraph takes part in numbering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_def_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_fill_id: Option<u32>,
}

impl ParaStyle {
    #[inline]
    pub fn is_hanging(&self) -> bool {
        self.indent < 0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BorderLine {
    pub shape: LineShape,
    /// Width in millimetres
    pub width_mm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fill {
    Solid {
        #[serde(skip_serializing_if = "Option::is_none")]
        background: Option<Color>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pattern_color: Option<Color>,
        /// Hatch pattern; `None` for a plain fill
        #[serde(skip_serializing_if = "Option::is_none")]
        pattern: Option<i32>,
    },
    Gradient {
        gradient_kind: i32,
        angle: i32,
        center_x: i32,
        center_y: i32,
        colors: Vec<Color>,
    },
    Image {
        bin_id: String,
        mode: String,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BorderFill {
    pub three_d: bool,
    pub shadow: bool,
    pub left: BorderLine,
    pub right: BorderLine,
    pub top: BorderLine,
    pub bottom: BorderLine,
    pub diagonal: BorderLine,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fills: Vec<Fill>,
}

/// Font face entry of one language group.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Font {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TabKind {
    #[default]
    Left,
    Right,
    Center,
    Decimal,
}

impl TabKind {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => TabKind::Right,
            2 => TabKind::Center,
            3 => TabKind::Decimal,
            _ => TabKind::Left,
        }
    }

    pub fn from_hwpx_name(name: &str) -> Self {
        match name {
            "RIGHT" => TabKind::Right,
            "CENTER" => TabKind::Center,
            "DECIMAL" => TabKind::Decimal,
            _ => TabKind::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TabStop {
    pub position: i32,
    pub kind: TabKind,
    pub leader: LineShape,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TabDef {
    pub auto_tab_left: bool,
    pub auto_tab_right: bool,
    pub stops: Vec<TabStop>,
}

/// Format of one numbering level.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParaHead {
    pub level: u8,
    pub start: u32,
    /// Number format code (digits, circled digits, Hangul syllables, ...)
    pub number_format: String,
    /// Template such as `^1.`
    pub template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_style_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Numbering {
    pub start: u32,
    pub levels: Vec<ParaHead>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Bullet {
    pub char: String,
    pub use_image: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_style_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MemoShape {
    pub width: u32,
    pub line_shape: LineShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_color: Option<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKind {
    #[default]
    Paragraph,
    Character,
}

/// Named style (e.g. "바탕글", "개요 1").
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StyleDef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub english_name: Option<String>,
    pub kind: StyleKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub para_style_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_style_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_style_id: Option<u32>,
}

/// ID-keyed style records for one parsed document.
///
/// Built once per parse before any section decode and shared read-only by
/// every section decoder.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StyleTables {
    pub char_styles: BTreeMap<u32, CharStyle>,
    pub para_styles: BTreeMap<u32, ParaStyle>,
    pub border_fills: BTreeMap<u32, BorderFill>,
    pub fonts: BTreeMap<Language, BTreeMap<u32, Font>>,
    pub tab_defs: BTreeMap<u32, TabDef>,
    pub numberings: BTreeMap<u32, Numbering>,
    pub bullets: BTreeMap<u32, Bullet>,
    pub memo_shapes: BTreeMap<u32, MemoShape>,
    pub styles: BTreeMap<u32, StyleDef>,
}

impl StyleTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill every character style's per-language face names from the font tables.
    ///
    /// Called once after all tables are populated; unresolved font ids keep
    /// `face == None`.
    pub fn resolve_font_faces(&mut self) {
        let fonts = &self.fonts;
        for style in self.char_styles.values_mut() {
            for lang in Language::ALL {
                let slot = &mut style.fonts[lang.index()];
                slot.face = fonts
                    .get(&lang)
                    .and_then(|group| group.get(&(slot.font_id as u32)))
                    .map(|font| font.name.clone());
            }
        }
    }

    pub fn char_style(&self, id: u32) -> Option<&CharStyle> {
        let style = self.char_styles.get(&id);
        if style.is_none() {
            tracing::trace!(id, "unresolved character style id");
        }
        style
    }

    pub fn para_style(&self, id: u32) -> Option<&ParaStyle> {
        let style = self.para_styles.get(&id);
        if style.is_none() {
            tracing::trace!(id, "unresolved paragraph style id");
        }
        style
    }

    pub fn border_fill(&self, id: u32) -> Option<&BorderFill> {
        self.border_fills.get(&id)
    }

    pub fn style(&self, id: u32) -> Option<&StyleDef> {
        self.styles.get(&id)
    }

    pub fn font(&self, lang: Language, id: u32) -> Option<&Font> {
        self.fonts.get(&lang).and_then(|group| group.get(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_conversions() {
        let c = Color::from_colorref(0x00336699).unwrap();
        assert_eq!(c, Color::rgb(0x99, 0x66, 0x33));
        assert_eq!(c.to_hex(), "#996633");
        assert_eq!(Color::from_hex("#FF996633"), Some(c));
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"#996633\"");
    }

    #[test]
    fn test_line_shape_codes() {
        assert_eq!(LineShape::from_char_shape_code(0), LineShape::Solid);
        assert_eq!(LineShape::from_char_shape_code(2), LineShape::Dot);
        assert_eq!(LineShape::from_border_code(0), LineShape::None);
        assert_eq!(LineShape::from_border_code(1), LineShape::Solid);
        assert_eq!(LineShape::from_border_code(3), LineShape::Dot);
        assert_eq!(LineShape::from_hwpx_name("SLIM_THICK"), LineShape::ThinThick);
    }

    #[test]
    fn test_resolve_font_faces() {
        let mut tables = StyleTables::new();
        tables.fonts.entry(Language::Hangul).or_default().insert(
            1,
            Font {
                name: "함초롬바탕".to_string(),
                ..Default::default()
            },
        );
        let mut style = CharStyle::default();
        style.fonts[Language::Hangul.index()].font_id = 1;
        style.fonts[Language::Latin.index()].font_id = 9;
        tables.char_styles.insert(0, style);

        tables.resolve_font_faces();
        let resolved = tables.char_style(0).unwrap();
        assert_eq!(
            resolved.font(Language::Hangul).face.as_deref(),
            Some("함초롬바탕")
        );
        assert_eq!(resolved.font(Language::Latin).face, None);
        assert!(tables.char_style(5).is_none());
    }

    #[test]
    fn test_para_style_hanging() {
        let style = ParaStyle {
            indent: -2000,
            ..Default::default()
        };
        assert!(style.is_hanging());
        assert!(!ParaStyle::default().is_hanging());
    }
}
