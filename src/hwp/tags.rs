//! Record tag ids and control ids of the legacy record streams.

/// First tag id of the document format
const HWPTAG_BEGIN: u16 = 0x10;

// DocInfo stream
pub const DOCUMENT_PROPERTIES: u16 = HWPTAG_BEGIN;
pub const ID_MAPPINGS: u16 = HWPTAG_BEGIN + 1;
pub const BIN_DATA: u16 = HWPTAG_BEGIN + 2;
pub const FACE_NAME: u16 = HWPTAG_BEGIN + 3;
pub const BORDER_FILL: u16 = HWPTAG_BEGIN + 4;
pub const CHAR_SHAPE: u16 = HWPTAG_BEGIN + 5;
pub const TAB_DEF: u16 = HWPTAG_BEGIN + 6;
pub const NUMBERING: u16 = HWPTAG_BEGIN + 7;
pub const BULLET: u16 = HWPTAG_BEGIN + 8;
pub const PARA_SHAPE: u16 = HWPTAG_BEGIN + 9;
pub const STYLE: u16 = HWPTAG_BEGIN + 10;
pub const MEMO_SHAPE: u16 = HWPTAG_BEGIN + 76;

// BodyText sections
pub const PARA_HEADER: u16 = HWPTAG_BEGIN + 50;
pub const PARA_TEXT: u16 = HWPTAG_BEGIN + 51;
pub const PARA_CHAR_SHAPE: u16 = HWPTAG_BEGIN + 52;
pub const PARA_LINE_SEG: u16 = HWPTAG_BEGIN + 53;
pub const PARA_RANGE_TAG: u16 = HWPTAG_BEGIN + 54;
pub const CTRL_HEADER: u16 = HWPTAG_BEGIN + 55;
pub const LIST_HEADER: u16 = HWPTAG_BEGIN + 56;
pub const PAGE_DEF: u16 = HWPTAG_BEGIN + 57;
pub const FOOTNOTE_SHAPE: u16 = HWPTAG_BEGIN + 58;
pub const PAGE_BORDER_FILL: u16 = HWPTAG_BEGIN + 59;
pub const SHAPE_COMPONENT: u16 = HWPTAG_BEGIN + 60;
pub const TABLE: u16 = HWPTAG_BEGIN + 61;
pub const SHAPE_COMPONENT_LINE: u16 = HWPTAG_BEGIN + 62;
pub const SHAPE_COMPONENT_RECTANGLE: u16 = HWPTAG_BEGIN + 63;
pub const SHAPE_COMPONENT_ELLIPSE: u16 = HWPTAG_BEGIN + 64;
pub const SHAPE_COMPONENT_ARC: u16 = HWPTAG_BEGIN + 65;
pub const SHAPE_COMPONENT_POLYGON: u16 = HWPTAG_BEGIN + 66;
pub const SHAPE_COMPONENT_CURVE: u16 = HWPTAG_BEGIN + 67;
pub const SHAPE_COMPONENT_OLE: u16 = HWPTAG_BEGIN + 68;
pub const SHAPE_COMPONENT_PICTURE: u16 = HWPTAG_BEGIN + 69;
pub const SHAPE_COMPONENT_CONTAINER: u16 = HWPTAG_BEGIN + 70;
pub const CTRL_DATA: u16 = HWPTAG_BEGIN + 71;
pub const EQEDIT: u16 = HWPTAG_BEGIN + 72;
pub const SHAPE_COMPONENT_TEXTART: u16 = HWPTAG_BEGIN + 74;
pub const FORM_OBJECT: u16 = HWPTAG_BEGIN + 75;
pub const MEMO_LIST: u16 = HWPTAG_BEGIN + 77;
pub const CHART_DATA: u16 = HWPTAG_BEGIN + 79;
pub const VIDEO_DATA: u16 = HWPTAG_BEGIN + 82;
pub const SHAPE_COMPONENT_UNKNOWN: u16 = HWPTAG_BEGIN + 99;

/// Build a four-character control id the way the format stores it.
///
/// The id is written as a little-endian `u32` whose big-endian bytes spell
/// the name, so `'tbl '` is `0x74626C20`.
pub const fn ctrl_id(name: &[u8; 4]) -> u32 {
    ((name[0] as u32) << 24) | ((name[1] as u32) << 16) | ((name[2] as u32) << 8) | name[3] as u32
}

/// Render a control id back to its four-character name.
pub fn ctrl_name(id: u32) -> String {
    id.to_be_bytes().iter().map(|&b| b as char).collect()
}

pub const CTRL_TABLE: u32 = ctrl_id(b"tbl ");
pub const CTRL_GSO: u32 = ctrl_id(b"gso ");
pub const CTRL_EQUATION: u32 = ctrl_id(b"eqed");
pub const CTRL_FORM: u32 = ctrl_id(b"form");
pub const CTRL_SECTION_DEF: u32 = ctrl_id(b"secd");
pub const CTRL_COLUMN_DEF: u32 = ctrl_id(b"cold");
pub const CTRL_HEADER_AREA: u32 = ctrl_id(b"head");
pub const CTRL_FOOTER_AREA: u32 = ctrl_id(b"foot");
pub const CTRL_FOOTNOTE: u32 = ctrl_id(b"fn  ");
pub const CTRL_ENDNOTE: u32 = ctrl_id(b"en  ");
pub const CTRL_HIDDEN_COMMENT: u32 = ctrl_id(b"tcmt");
pub const FIELD_HYPERLINK: u32 = ctrl_id(b"%hlk");
pub const FIELD_MEMO: u32 = ctrl_id(b"%%me");

// Shape component ids
pub const SHAPE_LINE: u32 = ctrl_id(b"$lin");
pub const SHAPE_RECT: u32 = ctrl_id(b"$rec");
pub const SHAPE_ELLIPSE: u32 = ctrl_id(b"$ell");
pub const SHAPE_ARC: u32 = ctrl_id(b"$arc");
pub const SHAPE_POLYGON: u32 = ctrl_id(b"$pol");
pub const SHAPE_CURVE: u32 = ctrl_id(b"$cur");
pub const SHAPE_PICTURE: u32 = ctrl_id(b"$pic");
pub const SHAPE_OLE: u32 = ctrl_id(b"$ole");
pub const SHAPE_CONTAINER: u32 = ctrl_id(b"$con");
pub const SHAPE_CONNECT_LINE: u32 = ctrl_id(b"$col");
pub const SHAPE_TEXTART: u32 = ctrl_id(b"$tat");
pub const SHAPE_VIDEO: u32 = ctrl_id(b"$vid");
pub const SHAPE_CHART: u32 = ctrl_id(b"$cht");

/// Whether the control id names a field (`%xxx`).
#[inline]
pub fn is_field(id: u32) -> bool {
    (id >> 24) as u8 == b'%'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctrl_id_round_trip() {
        assert_eq!(CTRL_TABLE, 0x7462_6C20);
        assert_eq!(ctrl_name(CTRL_FOOTNOTE), "fn  ");
        assert!(is_field(FIELD_HYPERLINK));
        assert!(!is_field(CTRL_GSO));
    }

    #[test]
    fn test_tag_values() {
        assert_eq!(PARA_HEADER, 0x42);
        assert_eq!(MEMO_SHAPE, 0x5C);
        assert_eq!(MEMO_LIST, 0x5D);
        assert_eq!(SHAPE_COMPONENT_UNKNOWN, 0x73);
    }
}
