//! Depth-tracked element extraction over raw XML text.
//!
//! Section XML nests the same element inside itself (tables in table cells,
//! containers in containers), so spans are found by counting opening and
//! closing tags of one exact name rather than by a full tree parse.
//! quick-xml is only applied to the small open-tag slices these spans expose.

use memchr::{memchr, memmem};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Open,
    Close,
    Empty,
}

/// One markup tag found by [`tags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTag<'a> {
    pub name: &'a str,
    pub kind: TagKind,
    /// Offset of `<`
    pub start: usize,
    /// Offset just past `>`
    pub end: usize,
}

/// Byte range of one balanced element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan {
    pub start: usize,
    pub end: usize,
    /// Start of the element content (end of the opening tag)
    pub content_start: usize,
    /// End of the element content (start of the closing tag)
    pub content_end: usize,
}

impl TagSpan {
    #[inline]
    pub fn as_str<'a>(&self, xml: &'a str) -> &'a str {
        &xml[self.start..self.end]
    }

    #[inline]
    pub fn open_tag<'a>(&self, xml: &'a str) -> &'a str {
        &xml[self.start..self.content_start]
    }

    #[inline]
    pub fn inner<'a>(&self, xml: &'a str) -> &'a str {
        &xml[self.content_start..self.content_end]
    }

    /// Qualified element name taken from the opening tag.
    pub fn name<'a>(&self, xml: &'a str) -> &'a str {
        let open = &xml[self.start + 1..self.content_start];
        let len = open
            .bytes()
            .position(|b| b.is_ascii_whitespace() || b == b'/' || b == b'>')
            .unwrap_or(open.len());
        &open[..len]
    }

    #[inline]
    pub fn is_self_closing(&self) -> bool {
        self.content_start == self.end
    }

    /// Whether `offset` lies strictly inside this span.
    #[inline]
    pub fn strictly_contains(&self, offset: usize) -> bool {
        offset > self.start && offset < self.end
    }

    #[inline]
    pub fn shifted(self, by: usize) -> Self {
        Self {
            start: self.start + by,
            end: self.end + by,
            content_start: self.content_start + by,
            content_end: self.content_end + by,
        }
    }
}

/// Iterator over the markup tags of an XML fragment.
///
/// Comments, CDATA sections, processing instructions and declarations are
/// skipped. Quoted attribute values may contain `>`.
pub struct Tags<'a> {
    xml: &'a str,
    pos: usize,
}

#[inline]
pub fn tags(xml: &str) -> Tags<'_> {
    Tags { xml, pos: 0 }
}

impl<'a> Tags<'a> {
    /// Continue scanning from `pos`, typically the end of an element
    /// found with [`element_at`].
    #[inline]
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.xml.len());
    }

    /// Skip past `terminator`, or to the end of input when it never appears.
    fn skip_past(&mut self, from: usize, terminator: &[u8]) {
        let bytes = self.xml.as_bytes();
        self.pos = match memmem::find(&bytes[from..], terminator) {
            Some(i) => from + i + terminator.len(),
            None => bytes.len(),
        };
    }
}

fn tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote = None;
    for (i, &b) in bytes[from..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {},
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(from + i),
                _ => {},
            },
        }
    }
    None
}

impl<'a> Iterator for Tags<'a> {
    type Item = RawTag<'a>;

    fn next(&mut self) -> Option<RawTag<'a>> {
        let bytes = self.xml.as_bytes();
        loop {
            if self.pos >= bytes.len() {
                return None;
            }
            let lt = self.pos + memchr(b'<', &bytes[self.pos..])?;
            let rest = &bytes[lt + 1..];
            if rest.starts_with(b"!--") {
                self.skip_past(lt + 4, b"-->");
                continue;
            }
            if rest.starts_with(b"![CDATA[") {
                self.skip_past(lt + 9, b"]]>");
                continue;
            }
            if rest.starts_with(b"?") || rest.starts_with(b"!") {
                self.skip_past(lt + 1, b">");
                continue;
            }

            let closing = rest.first() == Some(&b'/');
            let name_start = lt + 1 + usize::from(closing);
            let Some(gt) = tag_end(bytes, name_start) else {
                self.pos = bytes.len();
                return None;
            };
            self.pos = gt + 1;
            let name_end = bytes[name_start..gt]
                .iter()
                .position(|b| b.is_ascii_whitespace() || *b == b'/')
                .map_or(gt, |p| name_start + p);
            if name_end == name_start {
                continue;
            }
            let kind = if closing {
                TagKind::Close
            } else if bytes[gt - 1] == b'/' {
                TagKind::Empty
            } else {
                TagKind::Open
            };
            return Some(RawTag {
                name: &self.xml[name_start..name_end],
                kind,
                start: lt,
                end: gt + 1,
            });
        }
    }
}

/// Extract every outermost element whose name satisfies `matches`.
///
/// Depth is counted on the name of the element that opened the current span,
/// so other matching names nested inside it are part of that span.
pub fn extract_balanced_matching(xml: &str, matches: impl Fn(&str) -> bool) -> Vec<TagSpan> {
    let mut spans = Vec::new();
    let mut open: Option<(&str, usize, usize)> = None;
    let mut depth = 0usize;

    for tag in tags(xml) {
        match open {
            None => {
                if !matches(tag.name) {
                    continue;
                }
                match tag.kind {
                    TagKind::Empty => spans.push(TagSpan {
                        start: tag.start,
                        end: tag.end,
                        content_start: tag.end,
                        content_end: tag.end,
                    }),
                    TagKind::Open => {
                        open = Some((tag.name, tag.start, tag.end));
                        depth = 1;
                    },
                    TagKind::Close => {},
                }
            },
            Some((name, start, content_start)) => {
                if tag.name != name {
                    continue;
                }
                match tag.kind {
                    TagKind::Open => depth += 1,
                    TagKind::Close => {
                        depth -= 1;
                        if depth == 0 {
                            spans.push(TagSpan {
                                start,
                                end: tag.end,
                                content_start,
                                content_end: tag.start,
                            });
                            open = None;
                        }
                    },
                    TagKind::Empty => {},
                }
            },
        }
    }
    if let Some((name, start, _)) = open {
        tracing::trace!(tag = name, offset = start, "unclosed element dropped");
    }
    spans
}

/// Extract every outermost `<tag …>…</tag>` (or `<tag/>`) element.
///
/// ```
/// use hwpdoc::hwpx::scanner::extract_balanced_tags;
///
/// let xml = "<hp:tbl><hp:tbl></hp:tbl></hp:tbl><hp:tblPr/>";
/// let spans = extract_balanced_tags(xml, "hp:tbl");
/// assert_eq!(spans.len(), 1);
/// assert_eq!(spans[0].as_str(xml), "<hp:tbl><hp:tbl></hp:tbl></hp:tbl>");
/// ```
pub fn extract_balanced_tags(xml: &str, tag: &str) -> Vec<TagSpan> {
    extract_balanced_matching(xml, |name| name == tag)
}

/// First outermost `tag` element of `xml`.
pub fn first_tag(xml: &str, tag: &str) -> Option<TagSpan> {
    let mut open: Option<(usize, usize)> = None;
    let mut depth = 0usize;
    for t in tags(xml) {
        if t.name != tag {
            continue;
        }
        match (t.kind, open) {
            (TagKind::Empty, None) => {
                return Some(TagSpan {
                    start: t.start,
                    end: t.end,
                    content_start: t.end,
                    content_end: t.end,
                });
            },
            (TagKind::Open, None) => {
                open = Some((t.start, t.end));
                depth = 1;
            },
            (TagKind::Open, Some(_)) => depth += 1,
            (TagKind::Close, Some((start, content_start))) => {
                depth -= 1;
                if depth == 0 {
                    return Some(TagSpan {
                        start,
                        end: t.end,
                        content_start,
                        content_end: t.start,
                    });
                }
            },
            _ => {},
        }
    }
    None
}

/// The element opened by `tag`, or `None` when it is never closed.
pub fn element_at(xml: &str, tag: &RawTag<'_>) -> Option<TagSpan> {
    match tag.kind {
        TagKind::Empty => Some(TagSpan {
            start: tag.start,
            end: tag.end,
            content_start: tag.end,
            content_end: tag.end,
        }),
        TagKind::Open => first_tag(&xml[tag.start..], tag.name).map(|span| span.shifted(tag.start)),
        TagKind::Close => None,
    }
}

/// `tag` elements that are immediate children of the fragment root level.
///
/// Unlike [`extract_balanced_tags`] this never descends into other elements,
/// so the `hp:sz` of a nested table is not mistaken for its parent's.
pub fn direct_children(xml: &str, tag: &str) -> Vec<TagSpan> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut iter = tags(xml);
    while let Some(t) = iter.next() {
        match t.kind {
            TagKind::Open if depth == 0 && t.name == tag => match element_at(xml, &t) {
                Some(span) => {
                    iter.seek(span.end);
                    out.push(span);
                },
                None => break,
            },
            TagKind::Open => depth += 1,
            TagKind::Close => depth = depth.saturating_sub(1),
            TagKind::Empty if depth == 0 && t.name == tag => {
                if let Some(span) = element_at(xml, &t) {
                    out.push(span);
                }
            },
            TagKind::Empty => {},
        }
    }
    out
}

pub fn direct_child(xml: &str, tag: &str) -> Option<TagSpan> {
    direct_children(xml, tag).into_iter().next()
}

/// Outermost `tag` elements inside the content of `parent`, in absolute offsets.
pub fn children(xml: &str, parent: &TagSpan, tag: &str) -> Vec<TagSpan> {
    extract_balanced_tags(parent.inner(xml), tag)
        .into_iter()
        .map(|span| span.shifted(parent.content_start))
        .collect()
}

/// Replace every `hp:switch` element with the content of its `hp:default`
/// branch, dropping the `hp:case` alternatives.
pub fn resolve_switches(xml: &str) -> Cow<'_, str> {
    let spans = extract_balanced_tags(xml, "hp:switch");
    if spans.is_empty() {
        return Cow::Borrowed(xml);
    }
    let mut out = String::with_capacity(xml.len());
    let mut last = 0;
    for span in spans {
        out.push_str(&xml[last..span.start]);
        let inner = span.inner(xml);
        let default = extract_balanced_matching(inner, |n| n == "hp:case" || n == "hp:default")
            .into_iter()
            .find(|branch| branch.name(inner) == "hp:default");
        if let Some(branch) = default {
            out.push_str(&resolve_switches(branch.inner(inner)));
        }
        last = span.end;
    }
    out.push_str(&xml[last..]);
    Cow::Owned(out)
}
