//! Whole-document text sources.

use crate::error::{Error, Result};

/// Page-break marker emitted between pages.
pub const PAGE_BREAK: char = '\x0C';

/// A general text-extraction pass over a whole document.
///
/// Implementations return the document text; pages may be separated by
/// [`PAGE_BREAK`] markers when the source knows where they are.
pub trait TextSource: Send + Sync {
    /// Extract the full text of `data`.
    fn extract_text(&self, data: &[u8]) -> Result<String>;
}

/// Text extraction for PDF bytes backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextSource;

impl TextSource for PdfTextSource {
    fn extract_text(&self, data: &[u8]) -> Result<String> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(data)?;
        log::debug!("pdf-extract returned {} page texts", pages.len());

        let mut text = String::new();
        for (idx, page) in pages.iter().enumerate() {
            if idx > 0 {
                text.push(PAGE_BREAK);
            }
            text.push_str(page);
        }
        Ok(text)
    }
}

/// Text source for UTF-8 plain text; form feeds already mark page breaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn extract_text(&self, data: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::Input(format!("text is not valid UTF-8: {}", e)))?;
        Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
    }
}

/// Number of pages in plain text: form-feed separated sections, at least one.
pub fn plain_text_page_count(text: &str) -> u32 {
    let sections = text.split(PAGE_BREAK).count();
    // A trailing form feed closes the last page rather than opening a new one.
    let trailing = text.ends_with(PAGE_BREAK) && sections > 1;
    (sections - usize::from(trailing)).max(1) as u32
}
