//! Attribute and leaf-text access for scanned element spans.

use super::HwpxError;
use crate::common::xml::unescape_xml;
use crate::model::Color;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;

/// Attributes of one opening tag, values unescaped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs {
    entries: SmallVec<[(String, String); 8]>,
}

impl Attrs {
    /// Parse the attributes of an opening (or self-closing) tag.
    ///
    /// Malformed attributes end the list; whatever was read before is kept.
    pub fn parse(open_tag: &str) -> Self {
        let mut reader = Reader::from_str(open_tag);
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => Self::from_start(&e),
            _ => Self::default(),
        }
    }

    pub fn from_start(e: &BytesStart<'_>) -> Self {
        let mut entries = SmallVec::new();
        for attr in e.attributes() {
            let Ok(attr) = attr else {
                tracing::trace!("malformed attribute");
                break;
            };
            let (Ok(key), Ok(value)) = (
                std::str::from_utf8(attr.key.as_ref()),
                std::str::from_utf8(&attr.value),
            ) else {
                continue;
            };
            entries.push((key.to_string(), unescape_xml(value).into_owned()));
        }
        Self { entries }
    }

    /// Value of an attribute by qualified name (`id`, `hp:required-namespace`).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.get(name).filter(|v| !v.is_empty()).map(str::to_string)
    }

    pub fn u32(&self, name: &str) -> Option<u32> {
        self.get(name)
            .and_then(|v| atoi_simd::parse::<u32>(v.trim().as_bytes()).ok())
    }

    pub fn i32(&self, name: &str) -> Option<i32> {
        self.get(name)
            .and_then(|v| atoi_simd::parse::<i32>(v.trim().as_bytes()).ok())
    }

    /// `1`/`true` are set, anything else (or absence) is not.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some("1" | "true"))
    }

    pub fn color(&self, name: &str) -> Option<Color> {
        self.get(name).and_then(Color::from_hex)
    }
}

/// Unescaped character data of a leaf element's content, or `None` when it
/// holds no text.
///
/// ```
/// use hwpdoc::hwpx::attrs::leaf_text;
/// assert_eq!(leaf_text("a &amp; b").unwrap().as_deref(), Some("a & b"));
/// assert_eq!(leaf_text("  ").unwrap(), None);
/// ```
pub fn leaf_text(content: &str) -> Result<Option<String>, HwpxError> {
    let mut reader = Reader::from_str(content);
    let mut raw = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                let text = std::str::from_utf8(e.as_ref())
                    .map_err(|e| HwpxError::Xml(format!("invalid UTF-8 in text: {}", e)))?;
                raw.push_str(text);
            },
            Ok(Event::CData(e)) => {
                let text = std::str::from_utf8(e.as_ref())
                    .map_err(|e| HwpxError::Xml(format!("invalid UTF-8 in CDATA: {}", e)))?;
                // CDATA is literal; escape so the final unescape restores it.
                raw.push_str(&crate::common::xml::escape_xml(text));
            },
            Ok(Event::GeneralRef(e)) => {
                raw.push('&');
                raw.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
                raw.push(';');
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(HwpxError::Xml(format!("XML parsing error: {}", e))),
            _ => {},
        }
    }
    let text = unescape_xml(&raw).into_owned();
    if text.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attrs_typed_access() {
        let attrs = Attrs::parse(
            r##"<hp:tbl rowCnt="2" colCnt=" 3" treatAsChar="1" name="a&amp;b" textColor="#FF0000" off="-5">"##,
        );
        assert_eq!(attrs.u32("rowCnt"), Some(2));
        assert_eq!(attrs.u32("colCnt"), Some(3));
        assert_eq!(attrs.i32("off"), Some(-5));
        assert!(attrs.flag("treatAsChar"));
        assert!(!attrs.flag("missing"));
        assert_eq!(attrs.get("name"), Some("a&b"));
        assert_eq!(attrs.color("textColor"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(attrs.u32("name"), None);
    }

    #[test]
    fn test_self_closing_and_empty() {
        let attrs = Attrs::parse(r#"<hp:tab width="4000" leader="0"/>"#);
        assert_eq!(attrs.u32("width"), Some(4000));
        assert_eq!(Attrs::parse("not a tag").get("x"), None);
        assert_eq!(Attrs::parse(r#"<a v=""/>"#).string("v"), None);
    }

    #[test]
    fn test_leaf_text() {
        assert_eq!(leaf_text("x &lt; y").unwrap().as_deref(), Some("x < y"));
        assert_eq!(leaf_text("<![CDATA[a<b]]>").unwrap().as_deref(), Some("a<b"));
        assert_eq!(leaf_text("").unwrap(), None);
    }
}
