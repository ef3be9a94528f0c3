//! Content extraction.
//!
//! Turns source bytes into a [`Document`](crate::model::Document): a whole
//! document text pass, page-boundary inference, paragraph splitting and
//! table detection.

mod extractor;
mod options;
mod pages;
mod source;
mod table;

pub use extractor::ContentExtractor;
pub use options::{ExtractOptions, ParagraphSplit, TableDetection, DEFAULT_PLACEHOLDER};
pub use pages::assign_pages;
pub use source::{plain_text_page_count, PdfTextSource, PlainTextSource, TextSource, PAGE_BREAK};
pub use table::{NoTables, Segment, TableClassifier, WhitespaceTableClassifier};
