//! Content extractor: source bytes to structured document.

use rayon::prelude::*;
use unicode_normalization::UnicodeNormalization;

use crate::detect::SourceFormat;
use crate::error::Result;
use crate::info::{load_pdf, page_size, read_metadata, DEFAULT_PAGE_SIZE};
use crate::model::{Document, Metadata, Page, PageMapping, Paragraph};

use super::options::{ExtractOptions, ParagraphSplit, TableDetection};
use super::pages::assign_pages;
use super::source::{plain_text_page_count, PdfTextSource, PlainTextSource, TextSource};
use super::table::{NoTables, Segment, TableClassifier, WhitespaceTableClassifier};

/// Minimum gap (in spaces) separating text columns on one line.
const COLUMN_GAP: usize = 4;
/// Average segment length above which gapped lines read as columns, not cells.
const COLUMN_MIN_SEGMENT_CHARS: usize = 15;

/// Builds a [`Document`] from source bytes.
pub struct ContentExtractor {
    options: ExtractOptions,
    classifier: Box<dyn TableClassifier>,
    pdf_source: Box<dyn TextSource>,
}

impl ContentExtractor {
    /// Create an extractor with the classifier named by `options`.
    pub fn new(options: ExtractOptions) -> Self {
        let classifier: Box<dyn TableClassifier> = match options.table_detection {
            TableDetection::Whitespace => Box::new(WhitespaceTableClassifier::new()),
            TableDetection::Disabled => Box::new(NoTables),
        };
        Self {
            options,
            classifier,
            pdf_source: Box::new(PdfTextSource),
        }
    }

    /// Replace the table classifier.
    pub fn with_classifier(mut self, classifier: impl TableClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Replace the text source used for PDF input.
    pub fn with_text_source(mut self, source: impl TextSource + 'static) -> Self {
        self.pdf_source = Box::new(source);
        self
    }

    /// Get the extraction options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract a document, resolving the format from a hint (extension,
    /// file name or MIME type).
    pub fn extract(&self, data: &[u8], format_hint: &str) -> Result<Document> {
        let format = SourceFormat::from_hint(format_hint)?;
        self.extract_format(data, format)
    }

    /// Extract a document of a known format.
    ///
    /// Text-extraction failures produce a degraded document; only an
    /// unreadable page structure is an error.
    pub fn extract_format(&self, data: &[u8], format: SourceFormat) -> Result<Document> {
        match format {
            SourceFormat::Pdf => self.extract_pdf(data),
            SourceFormat::PlainText => self.extract_plain_text(data),
        }
    }

    fn extract_pdf(&self, data: &[u8]) -> Result<Document> {
        let pdf = load_pdf(data)?;
        let sizes: Vec<(f32, f32)> = pdf
            .get_pages()
            .values()
            .map(|&id| page_size(&pdf, id))
            .collect();

        let mut metadata = read_metadata(&pdf);
        metadata.page_count = sizes.len() as u32;
        drop(pdf);

        log::info!("extracting {} PDF pages", sizes.len());
        let text = self.pdf_source.extract_text(data);
        Ok(self.build(text, metadata, &sizes))
    }

    fn extract_plain_text(&self, data: &[u8]) -> Result<Document> {
        let text = PlainTextSource.extract_text(data)?;
        let total = plain_text_page_count(&text) as usize;
        let metadata = Metadata {
            page_count: total as u32,
            ..Default::default()
        };
        Ok(self.build(Ok(text), metadata, &vec![DEFAULT_PAGE_SIZE; total]))
    }

    fn build(&self, text: Result<String>, metadata: Metadata, sizes: &[(f32, f32)]) -> Document {
        let mut document = Document::new();
        document.metadata = metadata;

        let text = match text {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                log::warn!("text extraction produced no text; returning placeholder pages");
                return self.degraded(document, sizes);
            }
            Err(e) => {
                log::warn!("text extraction failed: {}; returning placeholder pages", e);
                return self.degraded(document, sizes);
            }
        };

        let text = if self.options.normalize_unicode {
            text.nfc().collect::<String>()
        } else {
            text
        };

        let (page_texts, mapping) = assign_pages(&text, sizes.len());
        if mapping == PageMapping::Proportional {
            log::info!("no reliable page markers; page boundaries are approximate");
        }
        document.page_mapping = mapping;

        let build_page = |(idx, page_text): (usize, &String)| {
            let (width, height) = sizes[idx];
            self.structure_page(idx as u32 + 1, width, height, page_text)
        };
        document.pages = if self.options.parallel {
            page_texts.par_iter().enumerate().map(build_page).collect()
        } else {
            page_texts.iter().enumerate().map(build_page).collect()
        };

        document
    }

    fn degraded(&self, mut document: Document, sizes: &[(f32, f32)]) -> Document {
        document.degraded = true;
        document.page_mapping = PageMapping::Placeholder;
        document.pages = sizes
            .iter()
            .enumerate()
            .map(|(idx, &(width, height))| {
                let number = idx as u32 + 1;
                let mut page = Page::new(number, width, height);
                page.add_paragraph(Paragraph::with_text(self.options.placeholder_for(number)));
                page
            })
            .collect();
        document
    }

    fn structure_page(&self, number: u32, width: f32, height: f32, text: &str) -> Page {
        let mut page = Page::new(number, width, height);
        page.column_count = estimate_columns(text);

        let segments = self.classifier.classify(text);
        let mode = match self.options.paragraph_split {
            ParagraphSplit::Auto => {
                let has_blank = segments.iter().any(|s| match s {
                    Segment::Prose(p) => has_blank_line(p),
                    Segment::Table(_) => false,
                });
                if has_blank {
                    ParagraphSplit::BlankLines
                } else {
                    ParagraphSplit::Lines
                }
            }
            explicit => explicit,
        };

        for segment in segments {
            match segment {
                Segment::Prose(prose) => {
                    for paragraph in split_paragraphs(&prose, mode) {
                        page.add_paragraph(Paragraph::with_text(paragraph));
                    }
                }
                Segment::Table(table) => page.add_table(table),
            }
        }

        page
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}

fn has_blank_line(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().collect();
    lines
        .iter()
        .enumerate()
        .any(|(i, l)| l.trim().is_empty() && i > 0 && i + 1 < lines.len())
}

fn split_paragraphs(text: &str, mode: ParagraphSplit) -> Vec<String> {
    match mode {
        ParagraphSplit::Lines => text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        _ => {
            let mut paragraphs = Vec::new();
            let mut current: Vec<&str> = Vec::new();
            for line in text.lines() {
                if line.trim().is_empty() {
                    if !current.is_empty() {
                        paragraphs.push(current.join("\n"));
                        current.clear();
                    }
                } else {
                    current.push(line.trim_end());
                }
            }
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
            }
            paragraphs
        }
    }
}

/// Best-effort text column count.
///
/// A page reads as multi-column when most of its lines hold long text runs
/// separated by wide gaps, all with the same number of runs.
fn estimate_columns(text: &str) -> u8 {
    let gap = " ".repeat(COLUMN_GAP);
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() < 3 {
        return 1;
    }

    let mut counts = std::collections::HashMap::new();
    for line in &lines {
        let runs: Vec<&str> = line
            .split(gap.as_str())
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .collect();
        if runs.len() < 2 {
            continue;
        }
        let avg = runs.iter().map(|r| r.chars().count()).sum::<usize>() / runs.len();
        if avg >= COLUMN_MIN_SEGMENT_CHARS {
            *counts.entry(runs.len()).or_insert(0usize) += 1;
        }
    }

    counts
        .into_iter()
        .max_by_key(|&(columns, hits)| (hits, columns))
        .filter(|&(_, hits)| hits * 2 > lines.len())
        .map_or(1, |(columns, _)| columns.min(u8::MAX as usize) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct FixedText(&'static str);

    impl TextSource for FixedText {
        fn extract_text(&self, _data: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_plain_text_pages_from_form_feeds() {
        let extractor = ContentExtractor::default();
        let doc = extractor
            .extract(b"First page\x0CSecond page\n\nMore text", "txt")
            .unwrap();

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_mapping, PageMapping::Markers);
        assert_eq!(doc.pages[0].paragraphs[0].text, "First page");
        assert_eq!(doc.pages[1].paragraphs.len(), 2);
        assert_eq!(doc.metadata.page_count, 2);
    }

    #[test]
    fn test_blank_line_paragraphs_keep_single_newlines() {
        let extractor = ContentExtractor::default();
        let doc = extractor
            .extract(b"line one\nline two\n\nsecond para", "text/plain")
            .unwrap();
        let paragraphs: Vec<&str> = doc.pages[0]
            .paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(paragraphs, vec!["line one\nline two", "second para"]);
    }

    #[test]
    fn test_lines_become_paragraphs_without_blank_lines() {
        let extractor = ContentExtractor::default();
        let doc = extractor.extract(b"alpha\nbeta\ngamma", "txt").unwrap();
        assert_eq!(doc.pages[0].paragraphs.len(), 3);
    }

    #[test]
    fn test_table_lines_removed_from_paragraphs() {
        let extractor = ContentExtractor::default();
        let doc = extractor
            .extract(b"Staff\nName\t\tAge\t\tCity\nBob\t\t30\t\tNYC", "txt")
            .unwrap();
        let page = &doc.pages[0];
        assert_eq!(page.tables.len(), 1);
        assert_eq!(page.tables[0].rows[0].cells.len(), 3);
        assert_eq!(page.tables[0].rows[1].cells.len(), 3);
        assert_eq!(page.paragraphs.len(), 1);
        assert_eq!(page.paragraphs[0].text, "Staff");
    }

    #[test]
    fn test_tables_disabled() {
        let extractor = ContentExtractor::new(ExtractOptions::new().without_tables());
        let doc = extractor
            .extract(b"Name\t\tAge\nBob\t\t30", "txt")
            .unwrap();
        assert!(doc.pages[0].tables.is_empty());
        assert_eq!(doc.pages[0].paragraphs.len(), 2);
    }

    #[test]
    fn test_empty_text_degrades() {
        let extractor = ContentExtractor::default();
        let doc = extractor.extract(b"\x0C\x0C  ", "txt").unwrap();
        assert!(doc.degraded);
        assert_eq!(doc.page_mapping, PageMapping::Placeholder);
        assert_eq!(doc.page_count(), 3);
        for page in &doc.pages {
            assert_eq!(page.paragraphs.len(), 1);
            assert!(page.tables.is_empty());
            assert_eq!(
                page.paragraphs[0].text,
                format!("page {} of document", page.number)
            );
        }
    }

    #[test]
    fn test_unsupported_hint() {
        let extractor = ContentExtractor::default();
        let err = extractor.extract(b"whatever", "odt").unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_unreadable_pdf_is_input_error() {
        let extractor = ContentExtractor::default().with_text_source(FixedText("text"));
        let err = extractor.extract(b"%PDF-1.7 truncated", "pdf").unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_nfc_normalization() {
        let extractor = ContentExtractor::default();
        let doc = extractor.extract("cafe\u{301}".as_bytes(), "txt").unwrap();
        assert_eq!(doc.pages[0].paragraphs[0].text, "caf\u{e9}");

        let raw = ContentExtractor::new(ExtractOptions::new().with_normalize_unicode(false));
        let doc = raw.extract("cafe\u{301}".as_bytes(), "txt").unwrap();
        assert_eq!(doc.pages[0].paragraphs[0].text, "cafe\u{301}");
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let text = b"one\x0Ctwo\x0Cthree\x0Cfour";
        let parallel = ContentExtractor::default().extract(text, "txt").unwrap();
        let sequential = ContentExtractor::new(ExtractOptions::new().sequential())
            .extract(text, "txt")
            .unwrap();
        assert_eq!(parallel.plain_text(), sequential.plain_text());
        let numbers: Vec<u32> = parallel.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_estimate_columns() {
        let two_columns = "The first column carries    the second column carries\n\
                           long running prose text    that continues on the right\n\
                           and keeps going down the    page in parallel columns";
        assert_eq!(estimate_columns(two_columns), 2);
        assert_eq!(estimate_columns("a\nb\nc"), 1);
        assert_eq!(estimate_columns("Name    Age\nBob    30\nAmy    41"), 1);
    }
}
