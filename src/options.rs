/// Options controlling how much of a document is decoded.
///
/// # Examples
///
/// ```rust
/// use hwpdoc::ParseOptions;
///
/// let options = ParseOptions::new()
///     .with_assets(false)
///     .with_parallel_sections(true)
///     .with_max_sections(Some(1));
/// assert!(!options.load_assets);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Load embedded pictures and OLE payloads into `Document::assets`
    pub load_assets: bool,
    /// Decode sections on the rayon thread pool
    pub parallel_sections: bool,
    /// Keep the per-line layout hints stored with each paragraph
    pub include_line_segments: bool,
    /// Stop after this many sections
    pub max_sections: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            load_assets: true,
            parallel_sections: false,
            include_line_segments: true,
            max_sections: None,
        }
    }
}

impl ParseOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_assets(mut self, load: bool) -> Self {
        self.load_assets = load;
        self
    }

    /// Decode sections in parallel. Results are still gathered in section order.
    #[inline]
    pub fn with_parallel_sections(mut self, parallel: bool) -> Self {
        self.parallel_sections = parallel;
        self
    }

    #[inline]
    pub fn with_line_segments(mut self, include: bool) -> Self {
        self.include_line_segments = include;
        self
    }

    #[inline]
    pub fn with_max_sections(mut self, max: Option<usize>) -> Self {
        self.max_sections = max;
        self
    }

    /// Number of sections to decode out of `available`.
    #[inline]
    pub(crate) fn section_limit(&self, available: usize) -> usize {
        self.max_sections.map_or(available, |max| max.min(available))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_default() {
        let options = ParseOptions::default();
        assert!(options.load_assets);
        assert!(!options.parallel_sections);
        assert!(options.include_line_segments);
        assert_eq!(options.max_sections, None);
        assert_eq!(options.section_limit(4), 4);
    }

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .with_line_segments(false)
            .with_max_sections(Some(2));
        assert!(!options.include_line_segments);
        assert_eq!(options.section_limit(5), 2);
        assert_eq!(options.section_limit(1), 1);
    }
}
