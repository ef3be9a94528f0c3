//! Rendering options and configuration.

use std::ops::RangeInclusive;

use super::JsonFormat;
use crate::assemble::parse_ranges;
use crate::error::Result;

/// Options shared by all format serializers.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Emit paragraph styles (bold, italic, size, font, color); when false,
    /// every paragraph is written with default styling
    pub preserve_styles: bool,

    /// Spreadsheet layout
    pub sheet_mode: SheetMode,

    /// JSON layout
    pub json_format: JsonFormat,

    /// Page selection
    pub page_selection: PageSelection,

    /// Heading text for each page; `{page}` is replaced by the page number
    pub page_heading: String,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable style fidelity.
    pub fn with_styles(mut self, preserve: bool) -> Self {
        self.preserve_styles = preserve;
        self
    }

    /// Set the spreadsheet layout.
    pub fn with_sheet_mode(mut self, mode: SheetMode) -> Self {
        self.sheet_mode = mode;
        self
    }

    /// Set the JSON layout.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Set specific page range.
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.page_selection = PageSelection::Range(range);
        self
    }

    /// Set the per-page heading template.
    pub fn with_page_heading(mut self, template: impl Into<String>) -> Self {
        self.page_heading = template.into();
        self
    }

    /// Heading text for page `number`.
    pub fn heading_for(&self, number: u32) -> String {
        self.page_heading.replace("{page}", &number.to_string())
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            preserve_styles: false,
            sheet_mode: SheetMode::PerPage,
            json_format: JsonFormat::Pretty,
            page_selection: PageSelection::All,
            page_heading: "Page {page}".to_string(),
        }
    }
}

/// Spreadsheet layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetMode {
    /// One worksheet per page
    #[default]
    PerPage,
    /// A single worksheet; each page starts with a bold header row
    Single,
}

/// Page selection for rendering.
#[derive(Debug, Clone, Default)]
pub enum PageSelection {
    /// Render all pages
    #[default]
    All,
    /// Render a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Render several ranges of pages (inclusive, 1-indexed)
    Ranges(Vec<RangeInclusive<u32>>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Ranges(ranges) => ranges.iter().any(|r| r.contains(&page)),
        }
    }

    /// Parse a page selection such as `"1-10"`, `"1,3,5,7-"` or `"all"`.
    ///
    /// Uses the same grammar as split ranges, with an open end running to
    /// the last page. Page 0 and inverted parts are range errors.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let mut ranges: Vec<RangeInclusive<u32>> = parse_ranges(s, u32::MAX as usize)?
            .into_iter()
            .map(|r| (r.start as u32 + 1)..=(r.end as u32 + 1))
            .collect();
        if ranges.len() == 1 {
            return Ok(PageSelection::Range(ranges.remove(0)));
        }
        Ok(PageSelection::Ranges(ranges))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_render_options_builder() {
        let options = RenderOptions::new()
            .with_styles(true)
            .with_sheet_mode(SheetMode::Single)
            .with_json_format(JsonFormat::Compact);

        assert!(options.preserve_styles);
        assert_eq!(options.sheet_mode, SheetMode::Single);
        assert_eq!(options.json_format, JsonFormat::Compact);
    }

    #[test]
    fn test_heading_for() {
        let options = RenderOptions::default();
        assert_eq!(options.heading_for(4), "Page 4");
        let options = options.with_page_heading("Seite {page}");
        assert_eq!(options.heading_for(2), "Seite 2");
    }

    #[test]
    fn test_page_selection_includes() {
        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Ranges(vec![1..=1, 3..=3]);
        assert!(pages.includes(3));
        assert!(!pages.includes(2));
    }

    #[test]
    fn test_page_selection_parse() {
        assert!(matches!(PageSelection::parse("all").unwrap(), PageSelection::All));
        assert!(matches!(PageSelection::parse("  ").unwrap(), PageSelection::All));
        match PageSelection::parse("1-10").unwrap() {
            PageSelection::Range(range) => assert_eq!(range, 1..=10),
            other => panic!("Expected Range variant, got {:?}", other),
        }

        let selection = PageSelection::parse("7,1,3,5-7,10").unwrap();
        for page in [1, 3, 5, 6, 7, 10] {
            assert!(selection.includes(page), "page {}", page);
        }
        for page in [2, 4, 8, 9, 11] {
            assert!(!selection.includes(page), "page {}", page);
        }
    }

    #[test]
    fn test_page_selection_open_end_stays_compact() {
        match PageSelection::parse("3-").unwrap() {
            PageSelection::Range(range) => {
                assert_eq!(*range.start(), 3);
                assert_eq!(*range.end(), u32::MAX);
            }
            other => panic!("Expected Range variant, got {:?}", other),
        }
        match PageSelection::parse("1-4000000000,9").unwrap() {
            PageSelection::Ranges(ranges) => assert_eq!(ranges.len(), 2),
            other => panic!("Expected Ranges variant, got {:?}", other),
        }
    }

    #[test]
    fn test_page_selection_errors() {
        for bad in ["x-2", "5-3", "0", "2,0-0", "1,,x"] {
            let err = PageSelection::parse(bad).unwrap_err();
            assert!(matches!(err, Error::Range(_)), "{:?} should be a range error", bad);
        }
    }
}
