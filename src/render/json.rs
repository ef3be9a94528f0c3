//! JSON rendering.
//!
//! The output is the document model itself, restricted to the selected
//! pages. `page_mapping` and `degraded` travel with it, and
//! `approximate_pages` flags output whose page boundaries were guessed, so
//! consumers need not know which mappings are exact. The extra key is
//! ignored when the JSON is read back into a [`Document`].

use serde::Serialize;

use super::{selected_pages, RenderOptions};
use crate::error::{Error, Result};
use crate::model::{Document, Metadata, Page, PageMapping};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

#[derive(Serialize)]
struct DocumentView<'a> {
    metadata: &'a Metadata,
    pages: Vec<&'a Page>,
    page_mapping: PageMapping,
    degraded: bool,
    approximate_pages: bool,
}

impl<'a> DocumentView<'a> {
    fn new(doc: &'a Document, options: &RenderOptions) -> Self {
        Self {
            metadata: &doc.metadata,
            pages: selected_pages(doc, options),
            page_mapping: doc.page_mapping,
            degraded: doc.degraded,
            approximate_pages: doc.page_mapping.is_approximate(),
        }
    }
}

/// Convert the selected pages of a document to JSON.
pub fn to_json(doc: &Document, options: &RenderOptions) -> Result<String> {
    let view = DocumentView::new(doc, options);
    let result = match options.json_format {
        JsonFormat::Pretty => serde_json::to_string_pretty(&view),
        JsonFormat::Compact => serde_json::to_string(&view),
    };

    result.map_err(|e| Error::Serialization(format!("JSON serialization error: {}", e)))
}
