//! Extraction options and configuration.

/// Placeholder text for pages of a degraded document. `{page}` is replaced by
/// the 1-based page number.
pub const DEFAULT_PLACEHOLDER: &str = "page {page} of document";

/// Options for building a structured document from source bytes.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// How tabular lines are recognised
    pub table_detection: TableDetection,

    /// How page text is split into paragraphs
    pub paragraph_split: ParagraphSplit,

    /// Normalize extracted text to Unicode NFC
    pub normalize_unicode: bool,

    /// Structure pages in parallel
    pub parallel: bool,

    /// Placeholder template for degraded pages
    pub placeholder: String,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set table detection mode.
    pub fn with_table_detection(mut self, mode: TableDetection) -> Self {
        self.table_detection = mode;
        self
    }

    /// Disable table detection; every line stays in paragraph flow.
    pub fn without_tables(mut self) -> Self {
        self.table_detection = TableDetection::Disabled;
        self
    }

    /// Set paragraph split mode.
    pub fn with_paragraph_split(mut self, mode: ParagraphSplit) -> Self {
        self.paragraph_split = mode;
        self
    }

    /// Enable or disable NFC normalization.
    pub fn with_normalize_unicode(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the degraded-page placeholder template.
    pub fn with_placeholder(mut self, template: impl Into<String>) -> Self {
        self.placeholder = template.into();
        self
    }

    /// Render the placeholder for one page.
    pub fn placeholder_for(&self, page: u32) -> String {
        self.placeholder.replace("{page}", &page.to_string())
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            table_detection: TableDetection::Whitespace,
            paragraph_split: ParagraphSplit::Auto,
            normalize_unicode: true,
            parallel: true,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// Table detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableDetection {
    /// Lines with tabs or runs of spaces are table rows
    #[default]
    Whitespace,
    /// No table detection
    Disabled,
}

/// Paragraph boundary strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParagraphSplit {
    /// Blank lines when the page has any, otherwise every line
    #[default]
    Auto,
    /// Blank lines only; single newlines stay inside a paragraph
    BlankLines,
    /// Every non-empty line is a paragraph
    Lines,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_options_builder() {
        let options = ExtractOptions::new()
            .without_tables()
            .with_paragraph_split(ParagraphSplit::Lines)
            .with_normalize_unicode(false)
            .sequential();

        assert_eq!(options.table_detection, TableDetection::Disabled);
        assert_eq!(options.paragraph_split, ParagraphSplit::Lines);
        assert!(!options.normalize_unicode);
        assert!(!options.parallel);
    }

    #[test]
    fn test_placeholder() {
        let options = ExtractOptions::default();
        assert_eq!(options.placeholder_for(3), "page 3 of document");

        let options = options.with_placeholder("[{page}]");
        assert_eq!(options.placeholder_for(12), "[12]");
    }
}
