//! Style tables from `Contents/header.xml`.
//!
//! Every table entry carries its own `id` attribute; entries without one are
//! skipped. `hp:switch` blocks are resolved to their `hp:default` branch
//! before any element is read.

use super::attrs::{Attrs, leaf_text};
use super::scanner::{TagSpan, children, extract_balanced_tags, first_tag, resolve_switches};
use crate::common::unit::parse_length_mm;
use crate::model::{
    Alignment, BorderFill, BorderLine, Bullet, CharStyle, Color, Fill, Font, HeadingKind,
    Language, LineShape, LineSpacingUnit, MemoShape, Numbering, ParaHead, ParaStyle, Shadow,
    StyleDef, StyleKind, StyleTables, Strikeout, TabDef, TabKind, TabStop, Underline,
    UnderlineKind,
};

/// `charPrIDRef` value meaning "no character style".
const NO_CHAR_STYLE: u32 = u32::MAX;

/// Build the style tables of one document.
pub fn parse_header(xml: &str) -> StyleTables {
    let resolved = resolve_switches(xml);
    let xml = resolved.as_ref();
    let mut tables = StyleTables::new();

    for face in extract_balanced_tags(xml, "hh:fontface") {
        let Some(lang) = Attrs::parse(face.open_tag(xml))
            .get("lang")
            .and_then(Language::from_hwpx_name)
        else {
            continue;
        };
        let group = tables.fonts.entry(lang).or_default();
        for font in children(xml, &face, "hh:font") {
            if let Some((id, attrs)) = with_id(xml, &font) {
                group.insert(id, parse_font(font.inner(xml), &attrs));
            }
        }
    }
    for (id, span, attrs) in entries(xml, "hh:borderFill") {
        tables.border_fills.insert(id, parse_border_fill(span.inner(xml), &attrs));
    }
    for (id, span, attrs) in entries(xml, "hh:charPr") {
        tables.char_styles.insert(id, parse_char_style(span.inner(xml), &attrs));
    }
    for (id, span, attrs) in entries(xml, "hh:tabPr") {
        tables.tab_defs.insert(id, parse_tab_def(span.inner(xml), &attrs));
    }
    for (id, span, attrs) in entries(xml, "hh:numbering") {
        let levels = extract_balanced_tags(span.inner(xml), "hh:paraHead")
            .iter()
            .map(|head| parse_para_head(span.inner(xml), head))
            .collect();
        tables.numberings.insert(
            id,
            Numbering {
                start: attrs.u32("start").unwrap_or(0),
                levels,
            },
        );
    }
    for (id, span, attrs) in entries(xml, "hh:bullet") {
        let head = first_tag(span.inner(xml), "hh:paraHead")
            .map(|head| Attrs::parse(head.open_tag(span.inner(xml))));
        tables.bullets.insert(
            id,
            Bullet {
                char: attrs.get("char").unwrap_or_default().to_string(),
                use_image: attrs.flag("useImage"),
                char_style_id: head.and_then(|h| char_style_ref(&h)),
            },
        );
    }
    for (id, span, attrs) in entries(xml, "hh:paraPr") {
        tables.para_styles.insert(id, parse_para_style(span.inner(xml), &attrs));
    }
    for (id, _, attrs) in entries(xml, "hh:style") {
        tables.styles.insert(id, parse_style_def(&attrs));
    }
    for (id, _, attrs) in entries(xml, "hh:memoPr") {
        tables.memo_shapes.insert(
            id,
            MemoShape {
                width: attrs.u32("width").unwrap_or(0),
                line_shape: attrs
                    .get("lineType")
                    .map_or(LineShape::Solid, LineShape::from_hwpx_name),
                line_color: attrs.color("lineColor"),
                fill_color: attrs.color("fillColor"),
                active_color: attrs.color("activeColor"),
            },
        );
    }

    tables.resolve_font_faces();
    tracing::debug!(
        char_styles = tables.char_styles.len(),
        para_styles = tables.para_styles.len(),
        border_fills = tables.border_fills.len(),
        styles = tables.styles.len(),
        "parsed header"
    );
    tables
}

fn with_id(xml: &str, span: &TagSpan) -> Option<(u32, Attrs)> {
    let attrs = Attrs::parse(span.open_tag(xml));
    match attrs.u32("id") {
        Some(id) => Some((id, attrs)),
        None => {
            tracing::trace!(tag = span.name(xml), "table entry without id skipped");
            None
        },
    }
}

fn entries(xml: &str, tag: &str) -> Vec<(u32, TagSpan, Attrs)> {
    extract_balanced_tags(xml, tag)
        .into_iter()
        .filter_map(|span| with_id(xml, &span).map(|(id, attrs)| (id, span, attrs)))
        .collect()
}

/// Attributes of the first `tag` child of `xml`.
fn child_attrs(xml: &str, tag: &str) -> Option<Attrs> {
    first_tag(xml, tag).map(|span| Attrs::parse(span.open_tag(xml)))
}

fn char_style_ref(attrs: &Attrs) -> Option<u32> {
    attrs.u32("charPrIDRef").filter(|&id| id != NO_CHAR_STYLE)
}

fn lang_attr(lang: Language) -> &'static str {
    match lang {
        Language::Hangul => "hangul",
        Language::Latin => "latin",
        Language::Hanja => "hanja",
        Language::Japanese => "japanese",
        Language::Other => "other",
        Language::Symbol => "symbol",
        Language::User => "user",
    }
}

fn parse_font(inner: &str, attrs: &Attrs) -> Font {
    Font {
        name: attrs.get("face").unwrap_or_default().to_string(),
        alternate: child_attrs(inner, "hh:substFont").and_then(|a| a.string("face")),
        default_name: None,
    }
}

fn border_line(attrs: Option<Attrs>) -> BorderLine {
    let Some(attrs) = attrs else {
        return BorderLine {
            shape: LineShape::None,
            ..Default::default()
        };
    };
    BorderLine {
        shape: attrs
            .get("type")
            .map_or(LineShape::None, LineShape::from_hwpx_name),
        width_mm: attrs.get("width").and_then(parse_length_mm).unwrap_or(0.0),
        color: attrs.color("color"),
    }
}

fn parse_border_fill(inner: &str, attrs: &Attrs) -> BorderFill {
    BorderFill {
        three_d: attrs.flag("threeD"),
        shadow: attrs.flag("shadow"),
        left: border_line(child_attrs(inner, "hh:leftBorder")),
        right: border_line(child_attrs(inner, "hh:rightBorder")),
        top: border_line(child_attrs(inner, "hh:topBorder")),
        bottom: border_line(child_attrs(inner, "hh:bottomBorder")),
        diagonal: border_line(child_attrs(inner, "hh:diagonal")),
        fills: first_tag(inner, "hc:fillBrush")
            .map(|brush| parse_fill_brush(brush.inner(inner)))
            .unwrap_or_default(),
    }
}

fn hatch_code(name: &str) -> Option<i32> {
    let code = match name {
        "HORIZONTAL" => 0,
        "VERTICAL" => 1,
        "BACK_SLASH" => 2,
        "SLASH" => 3,
        "CROSS" => 4,
        "CROSS_DIAGONAL" => 5,
        _ => return None,
    };
    Some(code)
}

fn gradient_code(name: &str) -> i32 {
    match name {
        "RADIAL" => 2,
        "CONICAL" => 3,
        "SQUARE" => 4,
        _ => 1,
    }
}

/// Decode the content of an `hc:fillBrush` element.
///
/// Shared by border fills and drawing objects.
pub(crate) fn parse_fill_brush(inner: &str) -> Vec<Fill> {
    let mut fills = Vec::new();
    if let Some(brush) = child_attrs(inner, "hc:winBrush") {
        fills.push(Fill::Solid {
            background: brush.color("faceColor"),
            pattern_color: brush.color("hatchColor"),
            pattern: brush.get("hatchStyle").and_then(hatch_code),
        });
    }
    if let Some(grad) = first_tag(inner, "hc:gradation") {
        let attrs = Attrs::parse(grad.open_tag(inner));
        let colors = extract_balanced_tags(grad.inner(inner), "hc:color")
            .iter()
            .filter_map(|c| Attrs::parse(c.open_tag(grad.inner(inner))).color("value"))
            .collect();
        fills.push(Fill::Gradient {
            gradient_kind: attrs.get("type").map_or(1, gradient_code),
            angle: attrs.i32("angle").unwrap_or(0),
            center_x: attrs.i32("centerX").unwrap_or(0),
            center_y: attrs.i32("centerY").unwrap_or(0),
            colors,
        });
    }
    if let Some(img) = first_tag(inner, "hc:imgBrush") {
        let mode = Attrs::parse(img.open_tag(inner))
            .string("mode")
            .unwrap_or_else(|| "TILE".to_string());
        if let Some(bin_id) = child_attrs(img.inner(inner), "hc:img").and_then(|a| a.string("binaryItemIDRef")) {
            fills.push(Fill::Image { bin_id, mode });
        }
    }
    fills
}

fn parse_char_style(inner: &str, attrs: &Attrs) -> CharStyle {
    let mut style = CharStyle {
        base_size: attrs.i32("height").unwrap_or(1000),
        text_color: attrs.color("textColor"),
        // White shading is the "no shade" default
        shade_color: attrs
            .color("shadeColor")
            .filter(|c| *c != Color::rgb(255, 255, 255)),
        border_fill_id: attrs.u32("borderFillIDRef"),
        ..Default::default()
    };

    let per_lang = |tag: &str| child_attrs(inner, tag);
    if let Some(refs) = per_lang("hh:fontRef") {
        for lang in Language::ALL {
            style.fonts[lang.index()].font_id = refs.u32(lang_attr(lang)).unwrap_or(0) as u16;
        }
    }
    if let Some(ratio) = per_lang("hh:ratio") {
        for lang in Language::ALL {
            style.fonts[lang.index()].ratio = ratio.u32(lang_attr(lang)).unwrap_or(100).min(255) as u8;
        }
    }
    if let Some(spacing) = per_lang("hh:spacing") {
        for lang in Language::ALL {
            style.fonts[lang.index()].spacing = spacing.i32(lang_attr(lang)).unwrap_or(0).clamp(-128, 127) as i8;
        }
    }
    if let Some(size) = per_lang("hh:relSz") {
        for lang in Language::ALL {
            style.fonts[lang.index()].relative_size = size.u32(lang_attr(lang)).unwrap_or(100).min(255) as u8;
        }
    }
    if let Some(offset) = per_lang("hh:offset") {
        for lang in Language::ALL {
            style.fonts[lang.index()].offset = offset.i32(lang_attr(lang)).unwrap_or(0).clamp(-128, 127) as i8;
        }
    }

    style.bold = first_tag(inner, "hh:bold").is_some();
    style.italic = first_tag(inner, "hh:italic").is_some();
    style.emboss = first_tag(inner, "hh:emboss").is_some();
    style.engrave = first_tag(inner, "hh:engrave").is_some();
    style.superscript = first_tag(inner, "hh:supscript").is_some();
    style.subscript = first_tag(inner, "hh:subscript").is_some();
    style.outline = per_lang("hh:outline").is_some_and(|a| a.get("type").is_some_and(|t| t != "NONE"));

    style.underline = per_lang("hh:underline").and_then(|a| {
        let kind = match a.get("type")? {
            "BOTTOM" => UnderlineKind::Bottom,
            "CENTER" => UnderlineKind::Center,
            "TOP" => UnderlineKind::Top,
            _ => return None,
        };
        Some(Underline {
            kind,
            shape: a.get("shape").map_or(LineShape::Solid, LineShape::from_hwpx_name),
            color: a.color("color"),
        })
    });
    style.strikeout = per_lang("hh:strikeout").and_then(|a| {
        let shape = LineShape::from_hwpx_name(a.get("shape")?);
        (shape != LineShape::None).then(|| Strikeout {
            shape,
            color: a.color("color"),
        })
    });
    style.shadow = per_lang("hh:shadow").and_then(|a| {
        let continuous = match a.get("type")? {
            "CONTINUOUS" => true,
            "DROP" => false,
            _ => return None,
        };
        Some(Shadow {
            continuous,
            offset_x: a.i32("offsetX").unwrap_or(0).clamp(-128, 127) as i8,
            offset_y: a.i32("offsetY").unwrap_or(0).clamp(-128, 127) as i8,
            color: a.color("color"),
        })
    });
    style
}

fn parse_tab_def(inner: &str, attrs: &Attrs) -> TabDef {
    TabDef {
        auto_tab_left: attrs.flag("autoTabLeft"),
        auto_tab_right: attrs.flag("autoTabRight"),
        stops: extract_balanced_tags(inner, "hh:tabItem")
            .iter()
            .map(|item| {
                let a = Attrs::parse(item.open_tag(inner));
                TabStop {
                    position: a.i32("pos").unwrap_or(0),
                    kind: a.get("type").map_or(TabKind::Left, TabKind::from_hwpx_name),
                    leader: a.get("leader").map_or(LineShape::None, LineShape::from_hwpx_name),
                }
            })
            .collect(),
    }
}

fn parse_para_head(xml: &str, head: &TagSpan) -> ParaHead {
    let attrs = Attrs::parse(head.open_tag(xml));
    ParaHead {
        level: attrs.u32("level").unwrap_or(0).min(255) as u8,
        start: attrs.u32("start").unwrap_or(1),
        number_format: attrs.get("numFormat").unwrap_or("DIGIT").to_string(),
        template: leaf_text(head.inner(xml)).ok().flatten().unwrap_or_default(),
        char_style_id: char_style_ref(&attrs),
    }
}

/// Margin values are either `hc:*` children with a `value` attribute or,
/// in older writers, attributes of `hh:margin` itself.
fn margin_value(margin: &str, margin_attrs: &Attrs, child: &str, attr: &str) -> i32 {
    child_attrs(margin, child)
        .and_then(|a| a.i32("value"))
        .or_else(|| margin_attrs.i32(attr))
        .unwrap_or(0)
}

fn parse_para_style(inner: &str, attrs: &Attrs) -> ParaStyle {
    let mut style = ParaStyle {
        tab_def_id: attrs.u32("tabPrIDRef"),
        ..Default::default()
    };
    if let Some(align) = child_attrs(inner, "hh:align") {
        style.alignment = align
            .get("horizontal")
            .map_or(Alignment::Justify, Alignment::from_hwpx_name);
    }
    if let Some(heading) = child_attrs(inner, "hh:heading") {
        style.heading = heading
            .get("type")
            .map_or(HeadingKind::None, HeadingKind::from_hwpx_name);
        if style.heading != HeadingKind::None {
            style.heading_id = heading.u32("idRef").filter(|&id| id > 0);
            style.outline_level = Some(heading.u32("level").unwrap_or(0).min(6) as u8 + 1);
        }
    }
    if let Some(breaks) = child_attrs(inner, "hh:breakSetting") {
        style.widow_orphan = breaks.flag("widowOrphan");
        style.keep_with_next = breaks.flag("keepWithNext");
        style.keep_lines = breaks.flag("keepLines");
        style.page_break_before = breaks.flag("pageBreakBefore");
    }
    if let Some(margin) = first_tag(inner, "hh:margin") {
        let content = margin.inner(inner);
        let margin_attrs = Attrs::parse(margin.open_tag(inner));
        style.indent = margin_value(content, &margin_attrs, "hc:intent", "indent");
        style.margin_left = margin_value(content, &margin_attrs, "hc:left", "left");
        style.margin_right = margin_value(content, &margin_attrs, "hc:right", "right");
        style.spacing_before = margin_value(content, &margin_attrs, "hc:prev", "prev");
        style.spacing_after = margin_value(content, &margin_attrs, "hc:next", "next");
    }
    if let Some(spacing) = child_attrs(inner, "hh:lineSpacing") {
        style.line_spacing_unit = spacing
            .get("type")
            .map_or(LineSpacingUnit::Percent, LineSpacingUnit::from_hwpx_name);
        style.line_spacing = spacing.i32("value").unwrap_or(160);
    }
    if let Some(border) = child_attrs(inner, "hh:border") {
        style.border_fill_id = border.u32("borderFillIDRef");
    }
    style
}

fn parse_style_def(attrs: &Attrs) -> StyleDef {
    StyleDef {
        name: attrs.get("name").unwrap_or_default().to_string(),
        english_name: attrs.string("engName"),
        kind: match attrs.get("type") {
            Some("CHAR") => StyleKind::Character,
            _ => StyleKind::Paragraph,
        },
        para_style_id: attrs.u32("paraPrIDRef"),
        char_style_id: char_style_ref(attrs),
        next_style_id: attrs.u32("nextStyleIDRef"),
    }
}
